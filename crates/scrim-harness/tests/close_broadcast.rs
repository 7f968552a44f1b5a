#![forbid(unsafe_code)]

//! Integration tests: close-all broadcast, completion slot, and a simulated
//! modal host driving the full cycle.

use scrim_harness::{Call, CallLog, CompletionProbe, ModalHost, ModalPhase};
use scrim_modal::{ModalCoordinator, ModalVisibility};
use std::cell::RefCell;
use std::rc::Rc;

// ============================================================================
// Broadcast order
// ============================================================================

#[test]
fn nested_modals_unwind_from_the_top() {
    let modals = ModalCoordinator::new();
    let log = CallLog::new();
    let _a = modals.register(log.handler("A"));
    let _b = modals.register(log.handler("B"));
    let _c = modals.register(log.handler("C"));

    let done = CompletionProbe::new();
    modals.close_all_with(done.completion(), false);

    assert_eq!(
        log.calls(),
        vec![
            Call { modal: "C", is_navigating: false },
            Call { modal: "B", is_navigating: false },
            Call { modal: "A", is_navigating: false },
        ]
    );
    assert_eq!(done.count(), 0);

    modals.on_modal_did_close();
    assert_eq!(done.count(), 1);
}

#[test]
fn unregister_in_the_middle_keeps_relative_order() {
    let modals = ModalCoordinator::new();
    let log = CallLog::new();
    let _a = modals.register(log.handler("A"));
    let b = modals.register(log.handler("B"));
    let _c = modals.register(log.handler("C"));
    b.unregister();
    let _d = modals.register(log.handler("D"));

    modals.close_all(|| {});
    assert_eq!(log.names(), vec!["D", "C", "A"]);
    assert!(log.calls().iter().all(|c| c.is_navigating));
}

#[test]
fn teardown_unregister_without_checking_state() {
    let modals = ModalCoordinator::new();
    let log = CallLog::new();
    let a = modals.register(log.handler("A"));

    // Component unmounts twice (e.g. effect cleanup plus explicit close).
    a.unregister();
    a.unregister();

    modals.close_all(|| {});
    assert!(log.calls().is_empty());
}

// ============================================================================
// Completion slot
// ============================================================================

#[test]
fn last_close_request_wins() {
    let modals = ModalCoordinator::new();
    let first = CompletionProbe::new();
    let second = CompletionProbe::new();

    modals.close_all(first.completion());
    modals.close_all(second.completion());
    modals.on_modal_did_close();
    modals.on_modal_did_close();

    assert_eq!(first.count(), 0, "superseded completion must never run");
    assert_eq!(second.count(), 1);
}

#[test]
fn superseded_completion_is_dropped_not_leaked() {
    let modals = ModalCoordinator::new();
    let token = Rc::new(());
    let held = Rc::clone(&token);
    modals.close_all(move || drop(held));
    assert_eq!(Rc::strong_count(&token), 2);

    modals.close_all(|| {});
    assert_eq!(Rc::strong_count(&token), 1);
}

#[test]
fn did_close_before_any_request_is_harmless() {
    let modals = ModalCoordinator::new();
    modals.on_modal_did_close();
    modals.on_modal_did_close();
    assert!(!modals.has_pending_completion());
}

// ============================================================================
// Simulated host
// ============================================================================

#[test]
fn host_full_cycle_runs_completion_after_last_transition() {
    let modals = ModalCoordinator::new();
    let host = ModalHost::new(modals.clone());
    host.open("report");
    host.open("confirm");
    assert!(modals.is_modal_visible());
    assert_eq!(modals.handler_count(), 2);

    let done = CompletionProbe::new();
    modals.close_all(done.completion());
    assert_eq!(host.phase("report"), Some(ModalPhase::Closing));
    assert_eq!(host.phase("confirm"), Some(ModalPhase::Closing));
    assert_eq!(host.close_navigating("confirm"), Some(true));
    assert_eq!(done.count(), 0);

    host.finish_transitions();
    assert_eq!(done.count(), 1);
    assert_eq!(host.mounted(), 0);
    assert!(modals.is_empty(), "guards unregister on unmount");
    assert!(!modals.is_modal_visible());
}

#[test]
fn host_alert_pending_flag_clears_when_open_finishes() {
    let modals = ModalCoordinator::new();
    let host = ModalHost::new(modals.clone());

    host.open_alert("delete-expense");
    assert!(modals.will_alert_modal_become_visible());
    assert!(!modals.is_modal_visible());
    assert_eq!(host.phase("delete-expense"), Some(ModalPhase::Opening));

    host.finish_transitions();
    assert_eq!(
        modals.visibility().get(),
        ModalVisibility {
            is_visible: true,
            will_alert_modal_become_visible: false,
        }
    );
}

#[test]
fn host_second_close_request_replaces_first_completion() {
    let modals = ModalCoordinator::new();
    let host = ModalHost::new(modals.clone());
    host.open("members");

    let logout = CompletionProbe::new();
    let navigate = CompletionProbe::new();
    modals.close_all(logout.completion());
    modals.close_all_with(navigate.completion(), false);
    assert_eq!(host.close_navigating("members"), Some(false));

    host.finish_transitions();
    assert_eq!(logout.count(), 0);
    assert_eq!(navigate.count(), 1);
}

#[test]
fn visibility_observers_follow_host() {
    let modals = ModalCoordinator::new();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let s = Rc::clone(&seen);
    let _sub = modals.subscribe_visibility(move |v| s.borrow_mut().push(v.is_visible));

    let host = ModalHost::new(modals.clone());
    host.open("a");
    host.open("b");
    modals.close_all(|| {});
    host.finish_transitions();

    assert_eq!(*seen.borrow(), vec![true, false]);
}

#[test]
fn host_close_during_alert_open_clears_pending_flag() {
    let modals = ModalCoordinator::new();
    let host = ModalHost::new(modals.clone());

    host.open_alert("delete-expense");
    assert!(modals.will_alert_modal_become_visible());

    let done = CompletionProbe::new();
    modals.close_all(done.completion());
    assert_eq!(host.phase("delete-expense"), Some(ModalPhase::Closing));

    host.finish_transitions();
    assert_eq!(host.mounted(), 0);
    assert_eq!(done.count(), 1);
    assert_eq!(modals.visibility().get(), ModalVisibility::default());
}

#[test]
fn close_request_from_completion_is_dropped_with_the_slot() {
    let modals = ModalCoordinator::new();
    let host = ModalHost::new(modals.clone());
    host.open("report");

    let chained = CompletionProbe::new();
    let next = chained.completion();
    let m = modals.clone();
    modals.close_all(move || m.close_all(next));
    host.finish_transitions();

    assert!(!modals.has_pending_completion());
    modals.on_modal_did_close();
    assert_eq!(chained.count(), 0);
}
