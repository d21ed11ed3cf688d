//! Command dispatch

use std::io;

use clap::CommandFactory;
use clap_complete::generate;
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::application::services::PickerService;
use crate::application::Intent;
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, Settings};
use crate::domain::{AssetId, LocationId};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;
use crate::tree_traits::TreeNodeConvert;

pub async fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Tree { expand, asset }) => cmd_tree(cli, asset, expand).await,
        Some(Commands::Relocate {
            asset,
            path,
            justification,
        }) => cmd_relocate(cli, asset, path, justification).await,
        Some(Commands::Config { command }) => cmd_config(cli, command),
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        None => Err(CliError::Usage(
            "no command given, see `locpick --help`".into(),
        )),
    }
}

fn load_settings(cli: &Cli) -> CliResult<Settings> {
    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(fixture) = &cli.fixture {
        settings.fixture = Some(fixture.clone());
    }
    Ok(settings)
}

fn container(cli: &Cli) -> CliResult<ServiceContainer> {
    Ok(ServiceContainer::from_fixture(load_settings(cli)?)?)
}

#[instrument(skip(cli))]
async fn cmd_tree(cli: &Cli, asset: &str, expand: &[String]) -> CliResult<()> {
    let container = container(cli)?;
    let service = container.picker_service(AssetId::new(asset));
    service.mount().await?;

    for id in expand {
        let id = LocationId::new(id.as_str());
        if !service.with_picker(|p| p.forest().contains(&id)) {
            return Err(CliError::InvalidArgs(format!(
                "unknown location: {id} (expand its parent first)"
            )));
        }
        if service.with_picker(|p| p.is_expanded(&id)) {
            continue;
        }
        service.dispatch(Intent::Toggle(id)).await?;
    }

    output::info(&service.with_picker(|p| p.to_tree_string()));
    Ok(())
}

#[instrument(skip(cli))]
async fn cmd_relocate(cli: &Cli, asset: &str, path: &str, justification: &str) -> CliResult<()> {
    let container = container(cli)?;
    let service = container.picker_service(AssetId::new(asset));
    service.mount().await?;

    let segments: Vec<&str> = path
        .split('/')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    walk_path(&service, &segments).await?;

    service
        .dispatch(Intent::EditJustification(justification.to_string()))
        .await?;
    let breadcrumb = service.with_picker(|p| p.selected_path().iter().map(|n| &n.label).join(" / "));
    output::header(&format!("Relocating {asset}"));
    output::detail(&breadcrumb);

    match service.dispatch(Intent::Submit).await? {
        Some(receipt) => {
            output::success(&receipt.message);
            Ok(())
        }
        None => Err(CliError::Usage("relocation did not complete".into())),
    }
}

/// Expand every branch along `segments` and select the final leaf.
async fn walk_path(service: &PickerService, segments: &[&str]) -> CliResult<LocationId> {
    let mut parent: Option<LocationId> = None;

    for (i, segment) in segments.iter().enumerate() {
        let found = service.with_picker(|p| {
            let candidates = match &parent {
                None => p.forest().roots().collect::<Vec<_>>(),
                Some(id) => p.forest().children(id),
            };
            candidates
                .into_iter()
                .find(|n| n.id.as_str() == *segment || n.label == *segment)
                .map(|n| (n.id.clone(), n.is_branch))
        });
        let scope = parent.as_ref().map_or("top level".to_string(), |id| id.to_string());
        let (id, is_branch) = found.ok_or_else(|| {
            CliError::InvalidArgs(format!("no location '{segment}' under {scope}"))
        })?;
        debug!("walk_path: {} -> {}", segment, id);

        if i + 1 == segments.len() {
            if is_branch {
                return Err(CliError::InvalidArgs(format!(
                    "'{segment}' is a branch; assets can only be moved to a leaf"
                )));
            }
            service.dispatch(Intent::Select(id.clone())).await?;
            return Ok(id);
        }

        if !is_branch {
            return Err(CliError::InvalidArgs(format!(
                "'{segment}' is a leaf and has no children"
            )));
        }
        if !service.with_picker(|p| p.is_expanded(&id)) {
            service.dispatch(Intent::Toggle(id.clone())).await?;
        }
        parent = Some(id);
    }

    Err(CliError::InvalidArgs("empty location path".into()))
}

fn cmd_config(cli: &Cli, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = load_settings(cli)?;
            output::info(&settings.to_toml()?);
            Ok(())
        }
        ConfigCommands::Init { force } => {
            let path = global_config_path()
                .ok_or_else(|| CliError::Usage("cannot determine config directory".into()))?;
            if path.exists() && !force {
                return Err(CliError::Usage(format!(
                    "config already exists: {} (use --force to overwrite)",
                    path.display()
                )));
            }
            if let Some(dir) = path.parent() {
                std::fs::create_dir_all(dir)
                    .map_err(|e| InfraError::io(format!("create {}", dir.display()), e))?;
            }
            std::fs::write(&path, Settings::template())
                .map_err(|e| InfraError::io(format!("write {}", path.display()), e))?;
            output::action("Created", &path.display());
            Ok(())
        }
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => {
                    let state = if path.exists() { "exists" } else { "not found" };
                    output::info(&format!("global: {} ({state})", path.display()));
                }
                None => output::warning("global config directory unavailable"),
            }
            if let Some(path) = &cli.config {
                output::info(&format!("local: {}", path.display()));
            }
            Ok(())
        }
    }
}
