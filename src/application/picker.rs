//! Expansion/selection controller
//!
//! The picker is a deterministic reducer: user intents and completions of remote
//! calls go in as [`Msg`]s, and whenever a remote call is needed it comes back out
//! as an [`Effect`] for the caller to run. No I/O happens here, so the whole state
//! machine can be driven from tests without a runtime.
//!
//! Per branch: `collapsed -> expanding -> expanded`, `expanded -> collapsed` on
//! toggle, `expanding -> collapsed` when the fetch fails. Per leaf: at most one is
//! selected; selecting another replaces it.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::application::gate::SubmissionGate;
use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{
    AssetId, ClassifiedLocation, FetchError, Forest, LocationId, LocationNode, NodeStore,
    RelocationReceipt, RelocationRequest, VisibleRow,
};

/// Stamp attached to every fetch; a completion is applied only while its
/// ticket is still the current one for that request.
pub type Ticket = u64;

/// What the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Load (or reload) the top-level locations
    LoadRoots,
    Toggle(LocationId),
    /// Select a leaf; on a branch this toggles instead
    Select(LocationId),
    EditJustification(String),
    Submit,
    DismissNotice,
}

/// Result of an [`Effect`] coming back in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    RootsLoaded {
        ticket: Ticket,
        result: Result<Vec<ClassifiedLocation>, FetchError>,
    },
    ChildrenLoaded {
        id: LocationId,
        ticket: Ticket,
        result: Result<Vec<ClassifiedLocation>, FetchError>,
    },
    RelocationSettled {
        result: Result<RelocationReceipt, FetchError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    Intent(Intent),
    Completion(Completion),
}

impl From<Intent> for Msg {
    fn from(intent: Intent) -> Self {
        Msg::Intent(intent)
    }
}

impl From<Completion> for Msg {
    fn from(completion: Completion) -> Self {
        Msg::Completion(completion)
    }
}

/// Remote call the caller must perform and report back as a [`Completion`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FetchRoots { ticket: Ticket },
    FetchChildren { id: LocationId, ticket: Ticket },
    Relocate(RelocationRequest),
}

/// Outcome of one [`Picker::update`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Idle,
    Run(Effect),
    Relocated(RelocationReceipt),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Fetch,
    Validation,
    Submission,
}

/// Last error surfaced to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    fn from_error(err: &ApplicationError) -> Self {
        let kind = match err {
            ApplicationError::Domain(_) => NoticeKind::Validation,
            ApplicationError::Submission { .. } | ApplicationError::SubmissionInFlight => {
                NoticeKind::Submission
            }
            ApplicationError::Fetch(_) | ApplicationError::Config { .. } => NoticeKind::Fetch,
        };
        Self {
            kind,
            message: err.to_string(),
        }
    }
}

/// Picker state: the forest plus the side tables keyed by location id.
#[derive(Debug, Clone)]
pub struct Picker {
    asset: AssetId,
    store: NodeStore,
    /// Branches currently showing their children
    expanded: HashSet<LocationId>,
    /// Branches with a children fetch in flight, with that fetch's ticket
    loading: HashMap<LocationId, Ticket>,
    roots_loading: Option<Ticket>,
    selected: Option<LocationId>,
    gate: SubmissionGate,
    next_ticket: Ticket,
    notice: Option<Notice>,
}

impl Picker {
    pub fn new(asset: AssetId, max_justification_len: usize) -> Self {
        Self {
            asset,
            store: NodeStore::new(),
            expanded: HashSet::new(),
            loading: HashMap::new(),
            roots_loading: None,
            selected: None,
            gate: SubmissionGate::new(max_justification_len),
            next_ticket: 0,
            notice: None,
        }
    }

    pub fn asset(&self) -> &AssetId {
        &self.asset
    }

    pub fn forest(&self) -> &Forest {
        self.store.forest()
    }

    pub fn snapshot(&self) -> Arc<Forest> {
        self.store.snapshot()
    }

    pub fn expanded(&self) -> &HashSet<LocationId> {
        &self.expanded
    }

    pub fn is_expanded(&self, id: &LocationId) -> bool {
        self.expanded.contains(id)
    }

    pub fn is_loading(&self, id: &LocationId) -> bool {
        self.loading.contains_key(id)
    }

    pub fn roots_loading(&self) -> bool {
        self.roots_loading.is_some()
    }

    pub fn selected(&self) -> Option<&LocationId> {
        self.selected.as_ref()
    }

    pub fn selected_node(&self) -> Option<&LocationNode> {
        self.selected.as_ref().and_then(|id| self.forest().get(id))
    }

    /// Breadcrumb from the top-level ancestor down to the selected leaf.
    pub fn selected_path(&self) -> Vec<&LocationNode> {
        self.selected
            .as_ref()
            .map(|id| self.forest().path(id))
            .unwrap_or_default()
    }

    pub fn justification(&self) -> &str {
        self.gate.justification()
    }

    pub fn submitting(&self) -> bool {
        self.gate.in_flight()
    }

    pub fn can_submit(&self) -> bool {
        self.gate.can_submit(self.selected.as_ref())
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn visible_rows(&self) -> Vec<VisibleRow<'_>> {
        self.forest().visible_rows(&self.expanded)
    }

    /// Apply one message. Errors are also recorded as the current [`Notice`].
    #[instrument(level = "debug", skip(self))]
    pub fn update(&mut self, msg: Msg) -> ApplicationResult<Step> {
        match msg {
            Msg::Intent(Intent::LoadRoots) => Ok(self.load_roots()),
            Msg::Intent(Intent::Toggle(id)) => Ok(self.toggle(id)),
            Msg::Intent(Intent::Select(id)) => Ok(self.select(id)),
            Msg::Intent(Intent::EditJustification(text)) => {
                self.gate.set_justification(text);
                Ok(Step::Idle)
            }
            Msg::Intent(Intent::Submit) => self.submit(),
            Msg::Intent(Intent::DismissNotice) => {
                self.notice = None;
                Ok(Step::Idle)
            }
            Msg::Completion(Completion::RootsLoaded { ticket, result }) => {
                self.roots_loaded(ticket, result)
            }
            Msg::Completion(Completion::ChildrenLoaded { id, ticket, result }) => {
                self.children_loaded(id, ticket, result)
            }
            Msg::Completion(Completion::RelocationSettled { result }) => {
                self.relocation_settled(result)
            }
        }
    }

    fn issue_ticket(&mut self) -> Ticket {
        self.next_ticket += 1;
        self.next_ticket
    }

    fn surface(&mut self, err: ApplicationError) -> ApplicationError {
        warn!("{}", err);
        self.notice = Some(Notice::from_error(&err));
        err
    }

    fn load_roots(&mut self) -> Step {
        let ticket = self.issue_ticket();
        self.roots_loading = Some(ticket);
        // Child fetches started against the old forest become stale
        self.loading.clear();
        self.notice = None;
        Step::Run(Effect::FetchRoots { ticket })
    }

    fn roots_loaded(
        &mut self,
        ticket: Ticket,
        result: Result<Vec<ClassifiedLocation>, FetchError>,
    ) -> ApplicationResult<Step> {
        if self.roots_loading != Some(ticket) {
            debug!("stale roots result dropped: ticket {}", ticket);
            return Ok(Step::Idle);
        }
        self.roots_loading = None;
        self.expanded.clear();
        self.loading.clear();
        self.selected = None;
        match result {
            Ok(roots) => {
                self.store.set_roots(roots);
                Ok(Step::Idle)
            }
            Err(e) => {
                self.store.clear();
                Err(self.surface(e.into()))
            }
        }
    }

    fn toggle(&mut self, id: LocationId) -> Step {
        let (is_branch, loaded) = match self.forest().get(&id) {
            Some(node) => (node.is_branch, node.children_loaded()),
            None => {
                warn!("toggle on unknown location ignored: {}", id);
                return Step::Idle;
            }
        };
        if !is_branch {
            debug!("toggle on leaf ignored: {}", id);
            return Step::Idle;
        }
        if self.loading.contains_key(&id) {
            debug!("toggle ignored, fetch in flight: {}", id);
            return Step::Idle;
        }
        if self.expanded.remove(&id) {
            debug!("collapsed {}", id);
            return Step::Idle;
        }
        if loaded {
            debug!("expanded {} from cache", id);
            self.expanded.insert(id);
            return Step::Idle;
        }
        let ticket = self.issue_ticket();
        self.loading.insert(id.clone(), ticket);
        Step::Run(Effect::FetchChildren { id, ticket })
    }

    fn children_loaded(
        &mut self,
        id: LocationId,
        ticket: Ticket,
        result: Result<Vec<ClassifiedLocation>, FetchError>,
    ) -> ApplicationResult<Step> {
        if self.loading.get(&id) != Some(&ticket) {
            debug!("stale children of {} dropped: ticket {}", id, ticket);
            return Ok(Step::Idle);
        }
        self.loading.remove(&id);
        match result {
            Ok(children) => {
                self.store.merge_children(&id, children);
                if self.forest().contains(&id) {
                    debug!("expanded {}", id);
                    self.expanded.insert(id);
                }
                self.retain_valid_selection();
                Ok(Step::Idle)
            }
            Err(e) => Err(self.surface(e.into())),
        }
    }

    fn retain_valid_selection(&mut self) {
        let keep = self.selected.as_ref().map_or(true, |id| {
            self.forest().get(id).is_some_and(|node| !node.is_branch)
        });
        if !keep {
            self.selected = None;
        }
    }

    fn select(&mut self, id: LocationId) -> Step {
        let is_branch = match self.forest().get(&id) {
            Some(node) => node.is_branch,
            None => {
                warn!("select on unknown location ignored: {}", id);
                return Step::Idle;
            }
        };
        if is_branch {
            return self.toggle(id);
        }
        debug!("selected {}", id);
        self.selected = Some(id);
        Step::Idle
    }

    fn submit(&mut self) -> ApplicationResult<Step> {
        if self.gate.in_flight() {
            warn!("submit rejected: relocation already in flight");
            return Err(ApplicationError::SubmissionInFlight);
        }
        match self.gate.begin(&self.asset, self.selected.as_ref()) {
            Ok(request) => Ok(Step::Run(Effect::Relocate(request))),
            Err(e) => Err(self.surface(e.into())),
        }
    }

    fn relocation_settled(
        &mut self,
        result: Result<RelocationReceipt, FetchError>,
    ) -> ApplicationResult<Step> {
        if !self.gate.in_flight() {
            debug!("relocation result without pending submission dropped");
            return Ok(Step::Idle);
        }
        let message = match result {
            Ok(receipt) if receipt.success => {
                self.gate.settle(true);
                self.selected = None;
                self.notice = None;
                debug!("relocation accepted: {}", receipt.message);
                return Ok(Step::Relocated(receipt));
            }
            Ok(receipt) => receipt.message,
            Err(e) => e.message,
        };
        self.gate.settle(false);
        Err(self.surface(ApplicationError::Submission { message }))
    }
}
