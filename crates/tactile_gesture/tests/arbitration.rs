//! End-to-end arbitration tests on a touch surface

use std::sync::{Arc, Mutex};

use tactile_core::{
    millis, AxisAction, AxisEvent, GestureConfig, GestureError, RecognizerId, RecognizerState,
    TouchEvent, TouchId, TouchPhase,
};
use tactile_gesture::{
    FingerTracker, FingerWindow, GestureDetector, LongPressDetector, NoticeKind, PanDetector,
    PanDirection, Response, TapDetector, TouchSurface,
};

/// Detector answering from a fixed script
#[derive(Debug, Clone)]
struct Scripted {
    window: FingerWindow,
    rules: Vec<(TouchPhase, Option<TouchId>, Response)>,
    accepted: Arc<Mutex<Vec<TouchId>>>,
}

impl Scripted {
    fn new() -> Self {
        Self {
            window: FingerWindow::single(),
            rules: Vec::new(),
            accepted: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn on(mut self, phase: TouchPhase, response: Response) -> Self {
        self.rules.push((phase, None, response));
        self
    }

    fn on_touch_id(mut self, phase: TouchPhase, id: TouchId, response: Response) -> Self {
        self.rules.push((phase, Some(id), response));
        self
    }

    fn fingers(mut self, min: usize, max: usize) -> Self {
        self.window = FingerWindow::new(min, max);
        self
    }
}

impl GestureDetector for Scripted {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn finger_window(&self) -> FingerWindow {
        self.window
    }

    fn on_touch(&mut self, _fingers: &FingerTracker, event: &TouchEvent) -> Response {
        self.rules
            .iter()
            .find(|(phase, id, _)| *phase == event.phase && id.map_or(true, |id| id == event.id))
            .map(|(_, _, response)| *response)
            .unwrap_or(Response::Continue)
    }

    fn on_accepted(&mut self, touch_id: TouchId) {
        self.accepted.lock().unwrap().push(touch_id);
    }

    fn reset(&mut self) {}
}

fn surface() -> TouchSurface {
    TouchSurface::new(GestureConfig::default())
}

fn has_notice(surface: &TouchSurface, id: RecognizerId, kind: NoticeKind) -> bool {
    surface
        .notices()
        .iter()
        .any(|notice| notice.recognizer == id && notice.kind == kind)
}

fn count_notices(surface: &TouchSurface, id: RecognizerId, kind: NoticeKind) -> usize {
    surface
        .notices()
        .iter()
        .filter(|notice| notice.recognizer == id && notice.kind == kind)
        .count()
}

#[test]
fn test_tap_beats_long_press() {
    let config = GestureConfig::default();
    let mut surface = TouchSurface::new(config.clone());
    let tap = surface.insert(TapDetector::new(&config)).unwrap();
    let press = surface.insert(LongPressDetector::new(&config)).unwrap();
    let group = surface.exclusive(&[tap, press]).unwrap();
    surface.add_candidate(1, group).unwrap();

    surface.handle_touch(&TouchEvent::down(1, 10.0, 10.0, 0));
    surface.handle_touch(&TouchEvent::up(1, 10.0, 10.0, millis(100)));

    assert!(has_notice(&surface, tap, NoticeKind::Accepted));
    assert!(has_notice(&surface, press, NoticeKind::Rejected));
    assert!(!has_notice(&surface, press, NoticeKind::Accepted));
    // The ledger cleared and everything is ready for the next cycle
    assert!(surface.referee().is_empty());
    assert_eq!(surface.state(tap), Some(RecognizerState::Ready));
    assert_eq!(surface.state(group), Some(RecognizerState::Ready));
}

#[test]
fn test_long_press_wins_at_deadline() {
    let config = GestureConfig::default();
    let mut surface = TouchSurface::new(config.clone());
    let tap = surface.insert(TapDetector::new(&config)).unwrap();
    let press = surface.insert(LongPressDetector::new(&config)).unwrap();
    let group = surface.exclusive(&[tap, press]).unwrap();
    surface.add_candidate(1, group).unwrap();

    surface.handle_touch(&TouchEvent::down(1, 10.0, 10.0, 0));
    surface.advance_to(millis(400));
    assert_eq!(surface.state(press), Some(RecognizerState::Detecting));

    surface.advance_to(millis(600));
    assert_eq!(surface.state(press), Some(RecognizerState::Accepted));
    assert_eq!(surface.state(tap), Some(RecognizerState::Rejected));
    assert_eq!(surface.winner(1), Some(group));
    assert_eq!(surface.active_child(group), Some(press));

    surface.handle_touch(&TouchEvent::up(1, 10.0, 10.0, millis(900)));
    assert_eq!(surface.state(press), Some(RecognizerState::Ready));
}

#[test]
fn test_tie_break_follows_registration_order() {
    let mut surface = surface();
    let a = surface
        .insert(Scripted::new().fingers(1, 2).on_touch_id(TouchPhase::Move, 2, Response::ACCEPT))
        .unwrap();
    let b = surface.insert(Scripted::new().fingers(1, 2)).unwrap();
    let c = surface
        .insert(Scripted::new().fingers(1, 2).on_touch_id(TouchPhase::Move, 1, Response::ACCEPT))
        .unwrap();
    let group = surface.exclusive(&[a, b, c]).unwrap();
    surface.add_candidate(1, group).unwrap();
    surface.add_candidate(2, group).unwrap();

    surface.begin_flush();
    surface.handle_touch(&TouchEvent::down(1, 0.0, 0.0, 0));
    surface.handle_touch(&TouchEvent::down(2, 50.0, 0.0, 0));
    // C asks first, A second: A still wins
    surface.handle_touch(&TouchEvent::moved(1, 5.0, 0.0, millis(10)));
    surface.handle_touch(&TouchEvent::moved(2, 55.0, 0.0, millis(10)));
    assert_eq!(surface.state(c), Some(RecognizerState::Detecting));
    surface.end_flush();

    assert_eq!(surface.state(a), Some(RecognizerState::Accepted));
    assert_eq!(surface.state(b), Some(RecognizerState::Rejected));
    assert_eq!(surface.state(c), Some(RecognizerState::Rejected));
    assert_eq!(surface.winner(1), Some(group));
    assert_eq!(surface.winner(2), Some(group));
}

#[test]
fn test_pending_blocks_later_accept() {
    let mut surface = surface();
    let a = surface
        .insert(
            Scripted::new()
                .on(TouchPhase::Down, Response::PENDING)
                .on(TouchPhase::Up, Response::REJECT),
        )
        .unwrap();
    let b = surface
        .insert(Scripted::new().on(TouchPhase::Move, Response::ACCEPT))
        .unwrap();
    let group = surface.exclusive(&[a, b]).unwrap();
    surface.add_candidate(1, group).unwrap();

    surface.handle_touch(&TouchEvent::down(1, 0.0, 0.0, 0));
    surface.handle_touch(&TouchEvent::moved(1, 10.0, 0.0, millis(10)));
    assert_eq!(surface.state(a), Some(RecognizerState::Pending));
    assert_eq!(surface.state(b), Some(RecognizerState::Pending));
    assert_eq!(surface.state(group), Some(RecognizerState::Pending));
    assert_eq!(surface.winner(1), None);

    surface.handle_touch(&TouchEvent::up(1, 10.0, 0.0, millis(20)));
    assert!(has_notice(&surface, a, NoticeKind::Rejected));
    assert!(has_notice(&surface, b, NoticeKind::Accepted));
}

#[test]
fn test_detecting_member_does_not_block() {
    let mut surface = surface();
    let a = surface.insert(Scripted::new()).unwrap();
    let b = surface
        .insert(Scripted::new().on(TouchPhase::Move, Response::ACCEPT))
        .unwrap();
    let group = surface.exclusive(&[a, b]).unwrap();
    surface.add_candidate(1, group).unwrap();

    surface.handle_touch(&TouchEvent::down(1, 0.0, 0.0, 0));
    surface.handle_touch(&TouchEvent::moved(1, 10.0, 0.0, millis(10)));
    assert_eq!(surface.state(b), Some(RecognizerState::Accepted));
    assert_eq!(surface.state(a), Some(RecognizerState::Rejected));
}

#[test]
fn test_group_fails_when_every_child_fails() {
    let mut surface = surface();
    let a = surface
        .insert(Scripted::new().on(TouchPhase::Move, Response::REJECT))
        .unwrap();
    let b = surface
        .insert(Scripted::new().on(TouchPhase::Move, Response::REJECT))
        .unwrap();
    let group = surface.exclusive(&[a, b]).unwrap();
    surface.add_candidate(1, group).unwrap();

    surface.handle_touch(&TouchEvent::down(1, 0.0, 0.0, 0));
    surface.handle_touch(&TouchEvent::moved(1, 10.0, 0.0, millis(10)));
    assert_eq!(surface.state(group), Some(RecognizerState::Rejected));
    assert!(has_notice(&surface, group, NoticeKind::Rejected));
    assert_eq!(surface.winner(1), None);
}

#[test]
fn test_repeated_accept_is_noop() {
    let mut surface = surface();
    let script = Scripted::new()
        .on(TouchPhase::Down, Response::ACCEPT)
        .on(TouchPhase::Move, Response::ACCEPT);
    let accepted = script.accepted.clone();
    let a = surface.insert(script).unwrap();
    surface.add_candidate(1, a).unwrap();

    surface.handle_touch(&TouchEvent::down(1, 0.0, 0.0, 0));
    surface.handle_touch(&TouchEvent::moved(1, 1.0, 0.0, millis(10)));
    surface.handle_touch(&TouchEvent::moved(1, 2.0, 0.0, millis(20)));

    assert_eq!(count_notices(&surface, a, NoticeKind::Accepted), 1);
    assert_eq!(*accepted.lock().unwrap(), vec![1]);
}

#[test]
fn test_unknown_touch_is_ignored() {
    let mut surface = surface();
    let a = surface
        .insert(Scripted::new().on(TouchPhase::Down, Response::ACCEPT))
        .unwrap();
    surface.add_candidate(1, a).unwrap();

    assert!(!surface.handle_touch(&TouchEvent::down(9, 0.0, 0.0, 0)));
    assert!(surface.notices().is_empty());
    assert_eq!(surface.state(a), Some(RecognizerState::Ready));
}

#[test]
fn test_full_finger_window_ignores_extra_down() {
    let mut surface = surface();
    let a = surface.insert(Scripted::new()).unwrap();
    surface.add_candidate(1, a).unwrap();
    surface.add_candidate(2, a).unwrap();

    assert!(surface.handle_touch(&TouchEvent::down(1, 0.0, 0.0, 0)));
    assert!(!surface.handle_touch(&TouchEvent::down(2, 5.0, 0.0, 0)));
    assert_eq!(surface.tracked(a).as_slice(), &[1]);
}

#[test]
fn test_accept_waits_for_minimum_fingers() {
    let mut surface = surface();
    let a = surface
        .insert(Scripted::new().fingers(2, 2).on(TouchPhase::Down, Response::ACCEPT))
        .unwrap();
    surface.add_candidate(1, a).unwrap();
    surface.add_candidate(2, a).unwrap();

    surface.handle_touch(&TouchEvent::down(1, 0.0, 0.0, 0));
    assert_eq!(surface.state(a), Some(RecognizerState::Detecting));

    surface.handle_touch(&TouchEvent::down(2, 40.0, 0.0, millis(5)));
    assert_eq!(surface.state(a), Some(RecognizerState::Accepted));
}

#[test]
fn test_cancel_terminates_accepted_gesture() {
    let mut surface = surface();
    let a = surface
        .insert(Scripted::new().on(TouchPhase::Down, Response::ACCEPT))
        .unwrap();
    let b = surface.insert(Scripted::new()).unwrap();
    surface.add_candidate(1, a).unwrap();
    surface.add_candidate(1, b).unwrap();

    surface.handle_touch(&TouchEvent::down(1, 0.0, 0.0, 0));
    assert_eq!(surface.state(a), Some(RecognizerState::Accepted));

    surface.handle_touch(&TouchEvent::cancel(1, millis(30)));
    assert!(has_notice(&surface, a, NoticeKind::Cancelled));
    assert!(surface.tracked(a).is_empty());
    assert!(surface.tracked(b).is_empty());
    assert!(!surface.referee().contains(1));
    assert_eq!(surface.state(a), Some(RecognizerState::Ready));
}

#[test]
fn test_cancel_rejects_undecided_candidates() {
    let mut surface = surface();
    let a = surface.insert(Scripted::new()).unwrap();
    surface.add_candidate(1, a).unwrap();

    surface.handle_touch(&TouchEvent::down(1, 0.0, 0.0, 0));
    surface.cancel(1);
    assert!(has_notice(&surface, a, NoticeKind::Rejected));
    assert!(!has_notice(&surface, a, NoticeKind::Cancelled));
    assert_eq!(surface.state(a), Some(RecognizerState::Ready));
}

#[test]
fn test_replace_children_mid_gesture() {
    let mut surface = surface();
    let old = surface
        .insert(Scripted::new().on(TouchPhase::Down, Response::PENDING))
        .unwrap();
    let new = surface.insert(Scripted::new()).unwrap();
    let group = surface.exclusive(&[old]).unwrap();
    surface.add_candidate(1, group).unwrap();

    surface.handle_touch(&TouchEvent::down(1, 0.0, 0.0, 0));
    assert_eq!(surface.state(group), Some(RecognizerState::Pending));

    surface.replace_children(group, &[new]).unwrap();
    assert_eq!(surface.state(group), Some(RecognizerState::Detecting));
    assert_eq!(surface.state(old), Some(RecognizerState::Ready));
    assert_eq!(surface.node(old).unwrap().group(), None);
    assert_eq!(surface.winner(1), None);
    assert!(!surface.referee().scope(1).unwrap().has_pending());

    // The new child picks the touch up on its next move
    surface.handle_touch(&TouchEvent::moved(1, 3.0, 0.0, millis(10)));
    assert_eq!(surface.tracked(new).as_slice(), &[1]);
    assert_eq!(surface.state(new), Some(RecognizerState::Detecting));
}

#[test]
fn test_replace_with_no_children_rejects_active_group() {
    let mut surface = surface();
    let a = surface.insert(Scripted::new()).unwrap();
    let group = surface.exclusive(&[a]).unwrap();
    surface.add_candidate(1, group).unwrap();
    surface.handle_touch(&TouchEvent::down(1, 0.0, 0.0, 0));

    surface.replace_children(group, &[]).unwrap();
    assert_eq!(surface.state(group), Some(RecognizerState::Rejected));
}

#[test]
fn test_parallel_children_win_together() {
    let mut surface = surface();
    let a = surface
        .insert(Scripted::new().fingers(1, 2).on_touch_id(TouchPhase::Move, 1, Response::ACCEPT))
        .unwrap();
    let b = surface
        .insert(Scripted::new().fingers(1, 2).on_touch_id(TouchPhase::Move, 2, Response::ACCEPT))
        .unwrap();
    let group = surface.parallel(&[a, b]).unwrap();
    surface.add_candidate(1, group).unwrap();
    surface.add_candidate(2, group).unwrap();

    surface.handle_touch(&TouchEvent::down(1, 0.0, 0.0, 0));
    surface.handle_touch(&TouchEvent::down(2, 50.0, 0.0, 0));
    surface.handle_touch(&TouchEvent::moved(1, 5.0, 0.0, millis(10)));
    assert_eq!(surface.state(a), Some(RecognizerState::Accepted));
    assert_eq!(surface.state(group), Some(RecognizerState::Accepted));
    assert_eq!(surface.state(b), Some(RecognizerState::Detecting));

    surface.handle_touch(&TouchEvent::moved(2, 60.0, 0.0, millis(20)));
    assert_eq!(surface.state(b), Some(RecognizerState::Accepted));
}

#[test]
fn test_sequence_long_press_then_pan() {
    let config = GestureConfig::default();
    let mut surface = TouchSurface::new(config.clone());
    let press = surface.insert(LongPressDetector::new(&config)).unwrap();
    let pan = surface.insert(PanDetector::new(&config)).unwrap();
    let group = surface.sequence(&[press, pan]).unwrap();
    surface.add_candidate(1, group).unwrap();

    surface.handle_touch(&TouchEvent::down(1, 0.0, 0.0, 0));
    surface.advance_to(millis(600));
    assert_eq!(surface.state(press), Some(RecognizerState::Pending));
    assert_eq!(surface.state(group), Some(RecognizerState::Pending));
    assert_eq!(surface.active_child(group), Some(pan));
    assert_eq!(surface.tracked(pan).as_slice(), &[1]);

    surface.handle_touch(&TouchEvent::moved(1, 20.0, 0.0, millis(700)));
    assert_eq!(surface.state(group), Some(RecognizerState::Accepted));
    assert_eq!(surface.state(press), Some(RecognizerState::Accepted));
    assert_eq!(surface.state(pan), Some(RecognizerState::Accepted));
}

#[test]
fn test_sequence_times_out_between_steps() {
    let config = GestureConfig::default();
    let mut surface = TouchSurface::new(config.clone());
    let first = surface.insert(TapDetector::new(&config)).unwrap();
    let second = surface.insert(TapDetector::new(&config)).unwrap();
    let group = surface.sequence(&[first, second]).unwrap();
    surface.add_candidate(1, group).unwrap();

    surface.handle_touch(&TouchEvent::down(1, 0.0, 0.0, 0));
    surface.handle_touch(&TouchEvent::up(1, 0.0, 0.0, millis(50)));
    assert_eq!(surface.state(first), Some(RecognizerState::Pending));
    assert!(surface.tracked(second).is_empty());
    // Waiting for the next step keeps the ledger open
    assert!(surface.referee().contains(1));

    surface.advance_to(millis(500));
    assert!(has_notice(&surface, group, NoticeKind::Rejected));
    assert!(has_notice(&surface, first, NoticeKind::Rejected));
    assert!(surface.referee().is_empty());
}

#[test]
fn test_double_tap_across_touches() {
    let config = GestureConfig::default();
    let mut surface = TouchSurface::new(config.clone());
    let double = surface.insert(TapDetector::new(&config).with_count(2)).unwrap();
    let single = surface.insert(TapDetector::new(&config)).unwrap();
    let group = surface.exclusive(&[double, single]).unwrap();

    surface.add_candidate(1, group).unwrap();
    surface.handle_touch(&TouchEvent::down(1, 0.0, 0.0, 0));
    surface.handle_touch(&TouchEvent::up(1, 0.0, 0.0, millis(50)));
    assert_eq!(surface.state(double), Some(RecognizerState::Pending));
    assert_eq!(surface.state(single), Some(RecognizerState::Pending));

    surface.add_candidate(2, group).unwrap();
    surface.handle_touch(&TouchEvent::down(2, 2.0, 0.0, millis(150)));
    surface.handle_touch(&TouchEvent::up(2, 2.0, 0.0, millis(200)));

    assert!(has_notice(&surface, double, NoticeKind::Accepted));
    assert!(has_notice(&surface, single, NoticeKind::Rejected));
    assert!(!has_notice(&surface, single, NoticeKind::Accepted));
    assert!(surface.referee().is_empty());
}

#[test]
fn test_single_tap_wins_when_double_tap_times_out() {
    let config = GestureConfig::default();
    let mut surface = TouchSurface::new(config.clone());
    let double = surface.insert(TapDetector::new(&config).with_count(2)).unwrap();
    let single = surface.insert(TapDetector::new(&config)).unwrap();
    let group = surface.exclusive(&[double, single]).unwrap();

    surface.add_candidate(1, group).unwrap();
    surface.handle_touch(&TouchEvent::down(1, 0.0, 0.0, 0));
    surface.handle_touch(&TouchEvent::up(1, 0.0, 0.0, millis(50)));

    surface.advance_to(millis(400));
    assert!(has_notice(&surface, double, NoticeKind::Rejected));
    assert!(has_notice(&surface, single, NoticeKind::Accepted));
}

#[test]
fn test_nested_groups_settle_inner_first() {
    let config = GestureConfig::default();
    let mut surface = TouchSurface::new(config.clone());
    let tap = surface.insert(TapDetector::new(&config)).unwrap();
    let press = surface.insert(LongPressDetector::new(&config)).unwrap();
    let inner = surface.exclusive(&[tap, press]).unwrap();
    let pan = surface.insert(PanDetector::new(&config)).unwrap();
    let outer = surface.exclusive(&[inner, pan]).unwrap();
    surface.add_candidate(1, outer).unwrap();

    surface.handle_touch(&TouchEvent::down(1, 0.0, 0.0, 0));
    surface.handle_touch(&TouchEvent::moved(1, 30.0, 0.0, millis(40)));

    assert_eq!(surface.state(pan), Some(RecognizerState::Accepted));
    assert_eq!(surface.state(inner), Some(RecognizerState::Rejected));
    assert_eq!(surface.state(tap), Some(RecognizerState::Rejected));
    assert_eq!(surface.state(press), Some(RecognizerState::Rejected));
    assert_eq!(surface.active_child(outer), Some(pan));
}

#[test]
fn test_independent_candidates_share_one_winner() {
    let config = GestureConfig::default();
    let mut surface = TouchSurface::new(config.clone());
    // Inner node first, as hit testing reports it
    let tap = surface.insert(TapDetector::new(&config)).unwrap();
    let pan = surface.insert(PanDetector::new(&config)).unwrap();
    surface.add_candidate(1, tap).unwrap();
    surface.add_candidate(1, pan).unwrap();

    surface.handle_touch(&TouchEvent::down(1, 0.0, 0.0, 0));
    surface.handle_touch(&TouchEvent::moved(1, 30.0, 0.0, millis(30)));
    assert_eq!(surface.winner(1), Some(pan));
    assert_eq!(surface.state(tap), Some(RecognizerState::Rejected));
}

#[test]
fn test_removing_pending_child_unblocks_sibling() {
    let mut surface = surface();
    let a = surface
        .insert(Scripted::new().on(TouchPhase::Down, Response::PENDING))
        .unwrap();
    let b = surface
        .insert(Scripted::new().on(TouchPhase::Move, Response::ACCEPT))
        .unwrap();
    let group = surface.exclusive(&[a, b]).unwrap();
    surface.add_candidate(1, group).unwrap();

    surface.handle_touch(&TouchEvent::down(1, 0.0, 0.0, 0));
    surface.handle_touch(&TouchEvent::moved(1, 10.0, 0.0, millis(10)));
    assert_eq!(surface.state(b), Some(RecognizerState::Pending));

    surface.remove(a).unwrap();
    assert!(!surface.contains(a));
    assert_eq!(surface.state(b), Some(RecognizerState::Accepted));
    assert_eq!(surface.group(group).unwrap().children(), &[b]);
    assert!(matches!(surface.remove(a), Err(GestureError::UnknownRecognizer(_))));
}

#[test]
fn test_pending_claim_delays_clear() {
    let mut surface = surface();
    let a = surface
        .insert(Scripted::new().on(TouchPhase::Down, Response::PENDING))
        .unwrap();
    surface.add_candidate(1, a).unwrap();

    surface.handle_touch(&TouchEvent::down(1, 0.0, 0.0, 0));
    surface.handle_touch(&TouchEvent::up(1, 0.0, 0.0, millis(10)));
    assert!(surface.referee().contains(1));
    assert!(!surface.clear(1));

    // Resetting the recognizer withdraws its claim
    surface.reset_recognizer(a).unwrap();
    surface.advance_to(millis(20));
    assert!(surface.referee().is_empty());
    assert_eq!(surface.state(a), Some(RecognizerState::Ready));
}

#[test]
fn test_scroll_axis_pans() {
    let config = GestureConfig::default();
    let mut surface = TouchSurface::new(config.clone());
    let pan = surface
        .insert(PanDetector::new(&config).with_direction(PanDirection::Vertical))
        .unwrap();
    surface.add_candidate(5, pan).unwrap();

    surface.handle_axis(&AxisEvent::new(5, AxisAction::Begin, 10.0, 10.0, 0));
    let step = AxisEvent::new(5, AxisAction::Update, 10.0, 10.0, millis(16)).with_scroll(0.0, 4.0);
    surface.handle_axis(&step);
    assert_eq!(surface.state(pan), Some(RecognizerState::Detecting));
    surface.handle_axis(&step);
    assert_eq!(surface.state(pan), Some(RecognizerState::Accepted));
}

#[test]
fn test_building_errors() {
    let mut surface = surface();
    let a = surface.insert(Scripted::new()).unwrap();
    let inner = surface.exclusive(&[a]).unwrap();
    let outer = surface.exclusive(&[inner]).unwrap();

    assert!(matches!(
        surface.add_candidate(1, a),
        Err(GestureError::AlreadyGrouped(_))
    ));
    assert!(matches!(
        surface.replace_children(inner, &[outer]),
        Err(GestureError::CyclicGroup { .. })
    ));
    assert!(matches!(
        surface.replace_children(a, &[]),
        Err(GestureError::NotAGroup(_))
    ));
    assert!(matches!(
        surface.exclusive(&[a, a]),
        Err(GestureError::DuplicateChild(_))
    ));
    assert!(matches!(
        surface.insert(Scripted::new().fingers(1, 11)),
        Err(GestureError::InvalidFingerWindow { .. })
    ));
}

#[test]
fn test_reset_recognizer_is_idempotent() {
    let mut surface = surface();
    let a = surface.insert(Scripted::new()).unwrap();
    assert!(surface.reset_recognizer(a).is_ok());
    assert!(surface.reset_recognizer(a).is_ok());
    assert_eq!(surface.state(a), Some(RecognizerState::Ready));
    assert!(surface.notices().is_empty());
}

#[test]
fn test_regrouping_moves_child() {
    let mut surface = surface();
    let a = surface.insert(Scripted::new()).unwrap();
    let b = surface.insert(Scripted::new()).unwrap();
    let first = surface.exclusive(&[a, b]).unwrap();
    let second = surface.parallel(&[a]).unwrap();

    assert_eq!(surface.node(a).unwrap().group(), Some(second));
    assert_eq!(surface.group(first).unwrap().children(), &[b]);
}

#[test]
fn test_shared_candidate_waits_for_every_touch() {
    let mut surface = surface();
    let first = surface
        .insert(
            Scripted::new()
                .on(TouchPhase::Down, Response::PENDING)
                .on(TouchPhase::Move, Response::ACCEPT),
        )
        .unwrap();
    let shared = surface
        .insert(Scripted::new().fingers(1, 2).on_touch_id(TouchPhase::Move, 2, Response::ACCEPT))
        .unwrap();
    surface.add_candidate(1, first).unwrap();
    surface.add_candidate(1, shared).unwrap();
    surface.add_candidate(2, shared).unwrap();

    surface.handle_touch(&TouchEvent::down(1, 0.0, 0.0, 0));
    surface.handle_touch(&TouchEvent::down(2, 50.0, 0.0, millis(5)));
    surface.handle_touch(&TouchEvent::moved(2, 60.0, 0.0, millis(10)));
    // Touch 2 alone would commit it, touch 1 is still blocked
    assert_eq!(surface.state(first), Some(RecognizerState::Pending));
    assert_eq!(surface.state(shared), Some(RecognizerState::Pending));
    assert_eq!(surface.winner(1), None);
    assert_eq!(surface.winner(2), None);
    assert!(!has_notice(&surface, shared, NoticeKind::Accepted));

    surface.handle_touch(&TouchEvent::moved(1, 5.0, 0.0, millis(20)));
    assert_eq!(surface.state(first), Some(RecognizerState::Accepted));
    assert_eq!(surface.state(shared), Some(RecognizerState::Rejected));
    assert_eq!(surface.winner(1), Some(first));
    assert_eq!(surface.winner(2), None);
    assert!(!has_notice(&surface, shared, NoticeKind::Accepted));
    assert!(!has_notice(&surface, shared, NoticeKind::Cancelled));
}

#[test]
fn test_shared_candidate_wins_every_touch_once_unblocked() {
    let mut surface = surface();
    let first = surface
        .insert(
            Scripted::new()
                .on(TouchPhase::Down, Response::PENDING)
                .on(TouchPhase::Move, Response::REJECT),
        )
        .unwrap();
    let shared = surface
        .insert(Scripted::new().fingers(1, 2).on_touch_id(TouchPhase::Move, 2, Response::ACCEPT))
        .unwrap();
    surface.add_candidate(1, first).unwrap();
    surface.add_candidate(1, shared).unwrap();
    surface.add_candidate(2, shared).unwrap();

    surface.handle_touch(&TouchEvent::down(1, 0.0, 0.0, 0));
    surface.handle_touch(&TouchEvent::down(2, 50.0, 0.0, millis(5)));
    surface.handle_touch(&TouchEvent::moved(2, 60.0, 0.0, millis(10)));
    assert_eq!(surface.winner(2), None);

    surface.handle_touch(&TouchEvent::moved(1, 5.0, 0.0, millis(20)));
    assert_eq!(surface.state(first), Some(RecognizerState::Rejected));
    assert_eq!(surface.state(shared), Some(RecognizerState::Accepted));
    assert_eq!(surface.winner(1), Some(shared));
    assert_eq!(surface.winner(2), Some(shared));
    assert_eq!(count_notices(&surface, shared, NoticeKind::Accepted), 1);
}

#[test]
fn test_simultaneous_deadlines_follow_group_order() {
    let config = GestureConfig::default();
    let mut surface = TouchSurface::new(config.clone());
    let a = surface.insert(LongPressDetector::new(&config)).unwrap();
    let b = surface.insert(LongPressDetector::new(&config)).unwrap();
    // Registered in the group in the opposite order of insertion
    let group = surface.exclusive(&[b, a]).unwrap();
    surface.add_candidate(1, group).unwrap();

    surface.handle_touch(&TouchEvent::down(1, 0.0, 0.0, 0));
    surface.advance_to(millis(2000));
    assert_eq!(surface.state(b), Some(RecognizerState::Accepted));
    assert_eq!(surface.state(a), Some(RecognizerState::Rejected));
    assert_eq!(surface.active_child(group), Some(b));
    assert_eq!(surface.winner(1), Some(group));
}

#[test]
fn test_losing_after_acceptance_is_a_cancel() {
    let mut surface = surface();
    let a = surface
        .insert(Scripted::new().on(TouchPhase::Down, Response::ACCEPT))
        .unwrap();
    let group = surface.exclusive(&[a]).unwrap();
    surface.add_candidate(1, group).unwrap();

    surface.handle_touch(&TouchEvent::down(1, 0.0, 0.0, 0));
    assert_eq!(surface.state(group), Some(RecognizerState::Accepted));

    surface.remove(a).unwrap();
    assert_eq!(surface.state(group), Some(RecognizerState::Rejected));
    assert!(has_notice(&surface, group, NoticeKind::Cancelled));
    assert!(!has_notice(&surface, group, NoticeKind::Rejected));
}

#[test]
fn test_cancel_releases_nested_children() {
    let mut surface = surface();
    let a = surface
        .insert(Scripted::new().on(TouchPhase::Down, Response::ACCEPT))
        .unwrap();
    let b = surface.insert(Scripted::new()).unwrap();
    let inner = surface.exclusive(&[a, b]).unwrap();
    let c = surface.insert(Scripted::new()).unwrap();
    let outer = surface.parallel(&[inner, c]).unwrap();
    surface.add_candidate(1, outer).unwrap();

    surface.handle_touch(&TouchEvent::down(1, 0.0, 0.0, 0));
    assert_eq!(surface.state(a), Some(RecognizerState::Accepted));
    assert_eq!(surface.tracked(c).as_slice(), &[1]);

    surface.handle_touch(&TouchEvent::cancel(1, millis(30)));
    for id in [outer, inner, a, b, c] {
        assert!(surface.tracked(id).is_empty());
        assert_eq!(surface.state(id), Some(RecognizerState::Ready));
    }
    assert!(has_notice(&surface, a, NoticeKind::Cancelled));
    assert!(has_notice(&surface, inner, NoticeKind::Cancelled));
    assert!(has_notice(&surface, c, NoticeKind::Rejected));
    assert!(surface.referee().is_empty());
}

#[test]
fn test_reconcile_keeps_equivalent_children_in_flight() {
    let config = GestureConfig::default();
    let mut surface = TouchSurface::new(config.clone());
    let tap = surface.insert(TapDetector::new(&config)).unwrap();
    let press = surface.insert(LongPressDetector::new(&config)).unwrap();
    let group = surface.exclusive(&[tap, press]).unwrap();
    surface.add_candidate(1, group).unwrap();

    surface.handle_touch(&TouchEvent::down(1, 0.0, 0.0, 0));
    surface.advance_to(millis(100));

    // The same tree, rebuilt
    let tap_again = surface.insert(TapDetector::new(&config)).unwrap();
    let press_again = surface.insert(LongPressDetector::new(&config)).unwrap();
    let children = surface
        .reconcile_children(group, &[tap_again, press_again])
        .unwrap();
    assert_eq!(children, vec![tap, press]);
    assert!(!surface.contains(tap_again));
    assert!(!surface.contains(press_again));
    assert_eq!(surface.tracked(press).as_slice(), &[1]);

    surface.advance_to(millis(600));
    assert_eq!(surface.state(press), Some(RecognizerState::Accepted));

    // A different tree replaces the children
    let pan = surface.insert(PanDetector::new(&config)).unwrap();
    let children = surface.reconcile_children(group, &[tap, pan]).unwrap();
    assert_eq!(children, vec![tap, pan]);
    assert_eq!(surface.state(press), Some(RecognizerState::Ready));
    assert_eq!(surface.node(press).unwrap().group(), None);
    assert_eq!(surface.group(group).unwrap().children(), &[tap, pan]);
}

#[test]
fn test_reconcile_compares_settings() {
    let config = GestureConfig::default();
    let mut surface = TouchSurface::new(config.clone());
    let single = surface.insert(TapDetector::new(&config)).unwrap();
    let group = surface.exclusive(&[single]).unwrap();

    let double = surface.insert(TapDetector::new(&config).with_count(2)).unwrap();
    let children = surface.reconcile_children(group, &[double]).unwrap();
    assert_eq!(children, vec![double]);
    assert!(surface.contains(single));
    assert_eq!(surface.node(single).unwrap().group(), None);
}
