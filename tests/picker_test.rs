//! Tests for the picker reducer, driven message by message without a runtime.

use rstest::rstest;

use locpick::application::{
    ApplicationError, Completion, Effect, Intent, NoticeKind, Picker, Step, Ticket,
};
use locpick::domain::{
    AssetId, ClassifiedLocation, DomainError, FetchError, LocationId, RelocationReceipt,
};
use locpick::util::testing;

#[ctor::ctor]
fn init() {
    testing::init_test_setup();
}

fn id(s: &str) -> LocationId {
    LocationId::from(s)
}

fn run(picker: &mut Picker, intent: Intent) -> Step {
    picker.update(intent.into()).expect("intent accepted")
}

fn expect_children_fetch(step: Step, expected: &str) -> Ticket {
    match step {
        Step::Run(Effect::FetchChildren { id, ticket }) if id.as_str() == expected => ticket,
        other => panic!("expected children fetch for {expected}, got {other:?}"),
    }
}

fn mounted(roots: Vec<ClassifiedLocation>) -> Picker {
    let mut picker = Picker::new(AssetId::from("PUMP-7"), 500);
    let ticket = match run(&mut picker, Intent::LoadRoots) {
        Step::Run(Effect::FetchRoots { ticket }) => ticket,
        other => panic!("expected roots fetch, got {other:?}"),
    };
    let step = picker
        .update(
            Completion::RootsLoaded {
                ticket,
                result: Ok(roots),
            }
            .into(),
        )
        .unwrap();
    assert_eq!(step, Step::Idle);
    picker
}

fn plant_roots() -> Vec<ClassifiedLocation> {
    vec![
        ClassifiedLocation::leaf("A", "Annex"),
        ClassifiedLocation::branch("B", "Building B"),
    ]
}

/// Roots `A, B`, then B expanded with two leaf children `C, D`.
fn expanded_plant() -> Picker {
    let mut picker = mounted(plant_roots());
    let ticket = expect_children_fetch(run(&mut picker, Intent::Toggle(id("B"))), "B");
    assert!(picker.is_loading(&id("B")));
    let step = picker
        .update(
            Completion::ChildrenLoaded {
                id: id("B"),
                ticket,
                result: Ok(vec![
                    ClassifiedLocation::leaf("C", "Line 1"),
                    ClassifiedLocation::leaf("D", "Line 2"),
                ]),
            }
            .into(),
        )
        .unwrap();
    assert_eq!(step, Step::Idle);
    picker
}

fn outline(picker: &Picker) -> Vec<(usize, String)> {
    picker
        .forest()
        .iter()
        .map(|(depth, node)| (depth, node.id.to_string()))
        .collect()
}

// ============================================================
// Expansion and submission
// ============================================================

#[test]
fn given_unloaded_branch_when_expanded_then_children_merged_in_order() {
    let picker = expanded_plant();

    assert_eq!(
        outline(&picker),
        vec![
            (0, "A".to_string()),
            (0, "B".to_string()),
            (1, "C".to_string()),
            (1, "D".to_string()),
        ]
    );
    assert_eq!(picker.expanded().len(), 1);
    assert!(picker.is_expanded(&id("B")));
    assert!(!picker.is_loading(&id("B")));
    assert!(picker.notice().is_none());
}

#[test]
fn given_selected_leaf_when_selecting_another_then_first_deselected() {
    let mut picker = expanded_plant();

    assert_eq!(run(&mut picker, Intent::Select(id("C"))), Step::Idle);
    assert_eq!(picker.selected(), Some(&id("C")));

    run(&mut picker, Intent::Select(id("D")));
    assert_eq!(picker.selected(), Some(&id("D")));

    // idempotent
    run(&mut picker, Intent::Select(id("D")));
    assert_eq!(picker.selected(), Some(&id("D")));
}

#[test]
fn given_children_fetch_failure_when_expanding_then_node_stays_collapsed() {
    let mut picker = mounted(plant_roots());
    let before = picker.snapshot();

    let ticket = expect_children_fetch(run(&mut picker, Intent::Toggle(id("B"))), "B");
    let err = picker
        .update(
            Completion::ChildrenLoaded {
                id: id("B"),
                ticket,
                result: Err(FetchError::new("location service timed out")),
            }
            .into(),
        )
        .unwrap_err();

    assert!(matches!(err, ApplicationError::Fetch(_)));
    assert_eq!(*picker.snapshot(), *before);
    assert!(!picker.forest().get(&id("B")).unwrap().children_loaded());
    assert!(!picker.is_expanded(&id("B")));
    assert!(!picker.is_loading(&id("B")));
    let notice = picker.notice().expect("error surfaced");
    assert_eq!(notice.kind, NoticeKind::Fetch);
    assert!(notice.message.contains("location service timed out"));

    // retry issues a new fetch
    expect_children_fetch(run(&mut picker, Intent::Toggle(id("B"))), "B");
}

#[test]
fn given_failing_registry_when_submitting_then_form_is_preserved() {
    let mut picker = expanded_plant();
    run(&mut picker, Intent::Select(id("C")));
    run(&mut picker, Intent::EditJustification(String::new()));
    assert!(!picker.can_submit());

    run(&mut picker, Intent::EditJustification("moved to line 2".into()));
    assert!(picker.can_submit());

    let request = match run(&mut picker, Intent::Submit) {
        Step::Run(Effect::Relocate(request)) => request,
        other => panic!("expected relocation, got {other:?}"),
    };
    assert_eq!(request.asset, AssetId::from("PUMP-7"));
    assert_eq!(request.location, id("C"));
    assert_eq!(request.justification, "moved to line 2");

    let err = picker
        .update(
            Completion::RelocationSettled {
                result: Err(FetchError::new("registry unavailable")),
            }
            .into(),
        )
        .unwrap_err();

    assert_eq!(
        err,
        ApplicationError::Submission {
            message: "registry unavailable".into()
        }
    );
    assert_eq!(picker.selected(), Some(&id("C")));
    assert_eq!(picker.justification(), "moved to line 2");
    assert!(!picker.submitting());
    assert!(picker.can_submit());
    let notice = picker.notice().expect("error surfaced");
    assert_eq!(notice.kind, NoticeKind::Submission);
    assert!(notice.message.contains("registry unavailable"));
}

#[test]
fn given_pending_submission_when_submitting_again_then_only_one_relocation_issued() {
    let mut picker = expanded_plant();
    run(&mut picker, Intent::Select(id("C")));
    run(&mut picker, Intent::EditJustification("moved".into()));

    assert!(matches!(
        run(&mut picker, Intent::Submit),
        Step::Run(Effect::Relocate(_))
    ));
    assert!(picker.submitting());
    assert!(!picker.can_submit());

    let second = picker.update(Intent::Submit.into());
    assert_eq!(second, Err(ApplicationError::SubmissionInFlight));
    assert!(picker.submitting());
}

// ============================================================
// Guards
// ============================================================

#[test]
fn given_leaf_when_toggled_then_never_expanded_or_loading() {
    let mut picker = expanded_plant();
    for leaf in ["A", "C"] {
        assert_eq!(run(&mut picker, Intent::Toggle(id(leaf))), Step::Idle);
        assert!(!picker.is_expanded(&id(leaf)));
        assert!(!picker.is_loading(&id(leaf)));
    }
}

#[test]
fn given_branch_when_selected_then_selection_unchanged_and_branch_toggles() {
    let mut picker = expanded_plant();
    run(&mut picker, Intent::Select(id("C")));

    // B is expanded: select routes to toggle and collapses it
    assert_eq!(run(&mut picker, Intent::Select(id("B"))), Step::Idle);
    assert_eq!(picker.selected(), Some(&id("C")));
    assert!(!picker.is_expanded(&id("B")));

    run(&mut picker, Intent::Select(id("B")));
    assert_eq!(picker.selected(), Some(&id("C")));
    assert!(picker.is_expanded(&id("B")));
}

#[test]
fn given_loaded_branch_when_recollapsed_and_reexpanded_then_no_fetch() {
    let mut picker = expanded_plant();
    let before = picker.snapshot();

    for _ in 0..3 {
        assert_eq!(run(&mut picker, Intent::Toggle(id("B"))), Step::Idle);
        assert!(!picker.is_expanded(&id("B")));
        assert_eq!(run(&mut picker, Intent::Toggle(id("B"))), Step::Idle);
        assert!(picker.is_expanded(&id("B")));
    }
    assert_eq!(*picker.snapshot(), *before);
}

#[test]
fn given_fetch_in_flight_when_toggled_again_then_ignored() {
    let mut picker = mounted(plant_roots());
    expect_children_fetch(run(&mut picker, Intent::Toggle(id("B"))), "B");

    assert_eq!(run(&mut picker, Intent::Toggle(id("B"))), Step::Idle);
    assert_eq!(run(&mut picker, Intent::Select(id("B"))), Step::Idle);
    assert!(picker.is_loading(&id("B")));
    assert!(!picker.is_expanded(&id("B")));
}

#[test]
fn given_branch_with_empty_children_when_loaded_then_kind_never_changes() {
    let mut picker = mounted(plant_roots());
    let ticket = expect_children_fetch(run(&mut picker, Intent::Toggle(id("B"))), "B");
    picker
        .update(
            Completion::ChildrenLoaded {
                id: id("B"),
                ticket,
                result: Ok(vec![]),
            }
            .into(),
        )
        .unwrap();

    let node = picker.forest().get(&id("B")).unwrap();
    assert!(node.is_branch);
    assert!(node.children_loaded());
    assert_eq!(node.child_count(), 0);
    assert!(picker.is_expanded(&id("B")));

    // confirmed-empty counts as cached
    run(&mut picker, Intent::Toggle(id("B")));
    assert_eq!(run(&mut picker, Intent::Toggle(id("B"))), Step::Idle);
    assert!(picker.is_expanded(&id("B")));
    assert_eq!(run(&mut picker, Intent::Select(id("B"))), Step::Idle);
    assert_eq!(picker.selected(), None);
}

#[test]
fn given_unknown_location_when_toggled_or_selected_then_ignored() {
    let mut picker = expanded_plant();
    assert_eq!(run(&mut picker, Intent::Toggle(id("Z"))), Step::Idle);
    assert_eq!(run(&mut picker, Intent::Select(id("Z"))), Step::Idle);
    assert_eq!(picker.selected(), None);
    assert!(!picker.is_loading(&id("Z")));
}

#[rstest]
#[case(None, "moved", DomainError::NoLocationSelected)]
#[case(Some("C"), "", DomainError::EmptyJustification)]
#[case(Some("C"), "  \n\t ", DomainError::EmptyJustification)]
fn given_incomplete_form_when_submitting_then_validation_error_and_no_call(
    #[case] selected: Option<&str>,
    #[case] justification: &str,
    #[case] expected: DomainError,
) {
    let mut picker = expanded_plant();
    if let Some(leaf) = selected {
        run(&mut picker, Intent::Select(id(leaf)));
    }
    run(&mut picker, Intent::EditJustification(justification.into()));
    assert!(!picker.can_submit());

    let err = picker.update(Intent::Submit.into()).unwrap_err();

    assert_eq!(err, ApplicationError::Domain(expected));
    assert!(err.is_validation());
    assert!(!picker.submitting());
    assert_eq!(picker.notice().map(|n| n.kind), Some(NoticeKind::Validation));
}

#[test]
fn given_justification_over_limit_when_submitting_then_rejected() {
    let mut picker = Picker::new(AssetId::from("PUMP-7"), 10);
    let ticket = match run(&mut picker, Intent::LoadRoots) {
        Step::Run(Effect::FetchRoots { ticket }) => ticket,
        other => panic!("unexpected {other:?}"),
    };
    picker
        .update(
            Completion::RootsLoaded {
                ticket,
                result: Ok(vec![ClassifiedLocation::leaf("A", "Annex")]),
            }
            .into(),
        )
        .unwrap();
    run(&mut picker, Intent::Select(id("A")));
    run(&mut picker, Intent::EditJustification("x".repeat(11)));

    assert!(!picker.can_submit());
    assert_eq!(
        picker.update(Intent::Submit.into()),
        Err(ApplicationError::Domain(DomainError::JustificationTooLong {
            max: 10
        }))
    );
}

#[test]
fn given_accepted_relocation_when_settled_then_local_state_cleared() {
    let mut picker = expanded_plant();
    run(&mut picker, Intent::Select(id("D")));
    run(&mut picker, Intent::EditJustification("moved".into()));
    run(&mut picker, Intent::Submit);

    let receipt = RelocationReceipt::accepted("asset PUMP-7 relocated to D");
    let step = picker
        .update(
            Completion::RelocationSettled {
                result: Ok(receipt.clone()),
            }
            .into(),
        )
        .unwrap();

    assert_eq!(step, Step::Relocated(receipt));
    assert_eq!(picker.selected(), None);
    assert_eq!(picker.justification(), "");
    assert!(!picker.submitting());
    assert!(!picker.can_submit());
}

#[test]
fn given_refused_relocation_when_settled_then_submission_error_with_registry_message() {
    let mut picker = expanded_plant();
    run(&mut picker, Intent::Select(id("D")));
    run(&mut picker, Intent::EditJustification("moved".into()));
    run(&mut picker, Intent::Submit);

    let err = picker
        .update(
            Completion::RelocationSettled {
                result: Ok(RelocationReceipt::rejected("asset is locked")),
            }
            .into(),
        )
        .unwrap_err();

    assert_eq!(
        err,
        ApplicationError::Submission {
            message: "asset is locked".into()
        }
    );
    assert_eq!(picker.selected(), Some(&id("D")));
    assert_eq!(picker.justification(), "moved");
}

#[test]
fn given_no_pending_submission_when_relocation_settles_then_ignored() {
    let mut picker = expanded_plant();
    let step = picker
        .update(
            Completion::RelocationSettled {
                result: Ok(RelocationReceipt::accepted("late")),
            }
            .into(),
        )
        .unwrap();
    assert_eq!(step, Step::Idle);
}

// ============================================================
// Generation stamps
// ============================================================

#[test]
fn given_roots_reloaded_when_old_children_arrive_then_they_are_discarded() {
    let mut picker = mounted(plant_roots());
    let stale = expect_children_fetch(run(&mut picker, Intent::Toggle(id("B"))), "B");

    let roots_ticket = match run(&mut picker, Intent::LoadRoots) {
        Step::Run(Effect::FetchRoots { ticket }) => ticket,
        other => panic!("unexpected {other:?}"),
    };
    assert!(!picker.is_loading(&id("B")));
    assert!(picker.roots_loading());

    let step = picker
        .update(
            Completion::ChildrenLoaded {
                id: id("B"),
                ticket: stale,
                result: Ok(vec![ClassifiedLocation::leaf("C", "Line 1")]),
            }
            .into(),
        )
        .unwrap();
    assert_eq!(step, Step::Idle);
    assert!(!picker.forest().contains(&id("C")));
    assert!(!picker.is_expanded(&id("B")));

    picker
        .update(
            Completion::RootsLoaded {
                ticket: roots_ticket,
                result: Ok(plant_roots()),
            }
            .into(),
        )
        .unwrap();
    assert!(!picker.roots_loading());
    // a fresh expand goes back to the network
    let fresh = expect_children_fetch(run(&mut picker, Intent::Toggle(id("B"))), "B");
    assert_ne!(fresh, stale);
}

#[test]
fn given_two_root_loads_when_first_arrives_late_then_only_latest_applies() {
    let mut picker = Picker::new(AssetId::from("PUMP-7"), 500);
    let first = match run(&mut picker, Intent::LoadRoots) {
        Step::Run(Effect::FetchRoots { ticket }) => ticket,
        other => panic!("unexpected {other:?}"),
    };
    let second = match run(&mut picker, Intent::LoadRoots) {
        Step::Run(Effect::FetchRoots { ticket }) => ticket,
        other => panic!("unexpected {other:?}"),
    };

    picker
        .update(
            Completion::RootsLoaded {
                ticket: second,
                result: Ok(vec![ClassifiedLocation::leaf("NEW", "New")]),
            }
            .into(),
        )
        .unwrap();
    picker
        .update(
            Completion::RootsLoaded {
                ticket: first,
                result: Ok(vec![ClassifiedLocation::leaf("OLD", "Old")]),
            }
            .into(),
        )
        .unwrap();

    assert!(picker.forest().contains(&id("NEW")));
    assert!(!picker.forest().contains(&id("OLD")));
}

// ============================================================
// Roots and notices
// ============================================================

#[test]
fn given_root_fetch_failure_when_loaded_then_forest_empty_and_notice_shown() {
    let mut picker = expanded_plant();
    run(&mut picker, Intent::Select(id("C")));
    let ticket = match run(&mut picker, Intent::LoadRoots) {
        Step::Run(Effect::FetchRoots { ticket }) => ticket,
        other => panic!("unexpected {other:?}"),
    };

    let err = picker
        .update(
            Completion::RootsLoaded {
                ticket,
                result: Err(FetchError::new("HTTP 503")),
            }
            .into(),
        )
        .unwrap_err();

    assert_eq!(err, ApplicationError::Fetch(FetchError::new("HTTP 503")));
    assert!(picker.forest().is_empty());
    assert!(picker.expanded().is_empty());
    assert_eq!(picker.selected(), None);
    assert_eq!(picker.notice().map(|n| n.kind), Some(NoticeKind::Fetch));

    run(&mut picker, Intent::DismissNotice);
    assert!(picker.notice().is_none());
}

#[test]
fn given_roots_reloaded_when_applied_then_auxiliary_state_cleared() {
    let mut picker = expanded_plant();
    run(&mut picker, Intent::Select(id("C")));
    let ticket = match run(&mut picker, Intent::LoadRoots) {
        Step::Run(Effect::FetchRoots { ticket }) => ticket,
        other => panic!("unexpected {other:?}"),
    };
    picker
        .update(
            Completion::RootsLoaded {
                ticket,
                result: Ok(plant_roots()),
            }
            .into(),
        )
        .unwrap();

    assert!(picker.expanded().is_empty());
    assert_eq!(picker.selected(), None);
    assert_eq!(picker.forest().len(), 2);
    assert!(!picker.forest().get(&id("B")).unwrap().children_loaded());
}

#[test]
fn given_selected_leaf_when_reading_path_then_breadcrumb_from_root() {
    let mut picker = expanded_plant();
    run(&mut picker, Intent::Select(id("D")));

    let labels: Vec<_> = picker
        .selected_path()
        .iter()
        .map(|n| n.label.as_str())
        .collect();
    assert_eq!(labels, vec!["Building B", "Line 2"]);
    assert_eq!(picker.selected_node().map(|n| n.label.as_str()), Some("Line 2"));

    let rows: Vec<_> = picker
        .visible_rows()
        .iter()
        .map(|row| (row.depth, row.node.id.to_string()))
        .collect();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[3], (1, "D".to_string()));
}
