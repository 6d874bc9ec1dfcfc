//! Touch surface
//!
//! [`TouchSurface`] owns every recognizer of one input surface in an arena,
//! the [`GestureReferee`] arbitrating between hit-test candidates, and the
//! queue of [`GestureNotice`]s describing outcomes. It is the explicit
//! context object of the engine: there is no global state, and every
//! operation runs to completion on the caller's thread.
//!
//! # Flush batches
//!
//! Events delivered between [`TouchSurface::begin_flush`] and
//! [`TouchSurface::end_flush`] form one batch. Accept requests raised inside
//! a batch are only recorded and are committed at the end of the batch in
//! registration order, so the winner does not depend on the order in which
//! recognizers happened to see the events. [`TouchSurface::handle_touch`]
//! called outside a batch wraps the single event in its own batch.
//!
//! # Time
//!
//! The surface has no timers. Deadlines (long press, multi-tap gaps,
//! sequence timeouts) fire when [`TouchSurface::advance_to`] is called or
//! when an event with a later timestamp arrives.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use smallvec::SmallVec;
use tactile_core::{
    AxisEvent, GestureConfig, GestureDisposal, GestureError, RecognizerId, RecognizerState,
    Result, StateEvent, Timestamp, TouchEvent, TouchId, TouchIds, TouchPhase,
};

use crate::contest::Verdict;
use crate::detector::{GestureDetector, Response};
use crate::fingers::{FingerTracker, FingerWindow};
use crate::group::{Children, GestureGroup, GroupPolicy};
use crate::recognizer::{NodeKind, RecognizerNode};
use crate::referee::GestureReferee;

/// Kind of outcome reported for a recognizer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Accepted,
    Rejected,
    Pending,
    /// An accepted gesture was terminated early
    Cancelled,
}

/// Outcome notification for the widget owning a recognizer
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GestureNotice {
    pub recognizer: RecognizerId,
    pub touch_ids: TouchIds,
    pub kind: NoticeKind,
}

/// Event on its way through the recognizer tree
#[derive(Clone, Copy, Debug)]
pub(crate) enum Input<'a> {
    Touch(&'a TouchEvent),
    Axis(&'a AxisEvent),
}

impl Input<'_> {
    pub(crate) fn id(&self) -> TouchId {
        match self {
            Input::Touch(event) => event.id,
            Input::Axis(event) => event.id,
        }
    }

    pub(crate) fn phase(&self) -> TouchPhase {
        match self {
            Input::Touch(event) => event.phase,
            Input::Axis(event) => event.action.touch_phase(),
        }
    }

    fn time(&self) -> Timestamp {
        match self {
            Input::Touch(event) => event.time,
            Input::Axis(event) => event.time,
        }
    }

    /// The event as seen by finger tracking
    fn touch(&self) -> TouchEvent {
        match self {
            Input::Touch(event) => **event,
            Input::Axis(event) => event.as_touch(),
        }
    }
}

/// Recognizers, arbitration and outcomes of one input surface
#[derive(Debug)]
pub struct TouchSurface {
    config: GestureConfig,
    nodes: SlotMap<RecognizerId, RecognizerNode>,
    referee: GestureReferee,
    notices: Vec<GestureNotice>,
    flushing: bool,
    /// Identifier whose UP/CANCEL is being delivered
    lifting: Option<TouchId>,
    now: Timestamp,
}

impl Default for TouchSurface {
    fn default() -> Self {
        Self::new(GestureConfig::default())
    }
}

impl TouchSurface {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            nodes: SlotMap::with_key(),
            referee: GestureReferee::new(),
            notices: Vec::new(),
            flushing: false,
            lifting: None,
            now: 0,
        }
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    // =========================================================================
    // Building the recognizer tree
    // =========================================================================

    /// Register a leaf recognizer
    pub fn insert<D: GestureDetector + 'static>(&mut self, detector: D) -> Result<RecognizerId> {
        self.insert_boxed(Box::new(detector))
    }

    pub fn insert_boxed(&mut self, detector: Box<dyn GestureDetector>) -> Result<RecognizerId> {
        let window = detector.finger_window();
        window.validate(self.config.max_fingers)?;
        let fingers = FingerTracker::new(window, self.config.velocity_smoothing);
        let id = self
            .nodes
            .insert(RecognizerNode::new(NodeKind::Detector(detector), fingers));
        tracing::trace!("Registered {} recognizer {:?}", self.name(id).unwrap_or("?"), id);
        Ok(id)
    }

    /// Register a group over existing recognizers
    ///
    /// Children are re-parented: a child that belonged to another group
    /// leaves it (an implicit rejection there) and a child registered as a
    /// referee candidate is withdrawn from the referee.
    pub fn insert_group(
        &mut self,
        policy: GroupPolicy,
        children: &[RecognizerId],
    ) -> Result<RecognizerId> {
        self.check_children(None, children)?;
        let window = FingerWindow::new(1, self.config.max_fingers);
        let fingers = FingerTracker::new(window, self.config.velocity_smoothing);
        let id = self.nodes.insert(RecognizerNode::new(
            NodeKind::Group(GestureGroup::new(policy, children)),
            fingers,
        ));
        for &child in children {
            self.adopt(id, child);
        }
        tracing::debug!("Registered {} group with {} children", policy.name(), children.len());
        Ok(id)
    }

    pub fn exclusive(&mut self, children: &[RecognizerId]) -> Result<RecognizerId> {
        self.insert_group(GroupPolicy::Exclusive, children)
    }

    pub fn parallel(&mut self, children: &[RecognizerId]) -> Result<RecognizerId> {
        self.insert_group(GroupPolicy::Parallel, children)
    }

    pub fn sequence(&mut self, children: &[RecognizerId]) -> Result<RecognizerId> {
        self.insert_group(GroupPolicy::Sequence, children)
    }

    /// Unregister a recognizer and its whole subtree
    ///
    /// Removal counts as a rejection for the group or ledgers it was part of.
    pub fn remove(&mut self, id: RecognizerId) -> Result<()> {
        let node = self.nodes.get(id).ok_or(GestureError::UnknownRecognizer(id))?;
        if let Some(group) = node.group {
            self.detach_child(group, id);
        }
        self.withdraw_candidate(id);
        self.referee.forget(id);

        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.nodes.remove(next) {
                if let NodeKind::Group(group) = node.kind {
                    stack.extend(group.children().iter().copied());
                }
            }
        }
        tracing::debug!("Removed recognizer {:?}", id);
        Ok(())
    }

    /// Swap the children of a group, possibly mid-gesture
    ///
    /// Old children are reset and detached. Outcomes the group already
    /// committed are withdrawn; identifiers still active are offered to the
    /// new children on their next MOVE. An active group left without
    /// children fails.
    pub fn replace_children(&mut self, group: RecognizerId, children: &[RecognizerId]) -> Result<()> {
        let node = self
            .nodes
            .get(group)
            .ok_or(GestureError::UnknownRecognizer(group))?;
        let old: Children = node
            .as_group()
            .ok_or(GestureError::NotAGroup(group))?
            .children()
            .iter()
            .copied()
            .collect();
        self.check_children(Some(group), children)?;

        for &child in &old {
            self.reset_subtree(child);
            if !children.contains(&child) {
                if let Some(node) = self.nodes.get_mut(child) {
                    node.group = None;
                }
            }
        }
        for &child in children {
            if !old.contains(&child) {
                self.adopt(group, child);
            }
        }

        let Some(node) = self.nodes.get_mut(group) else {
            return Ok(());
        };
        let active_touches = node.fingers.ids();
        if let Some(state) = node.as_group_mut() {
            state.set_children(children, &active_touches);
        }
        let reopened = node.transition(StateEvent::Reopen);
        let parent = node.group;
        let active = node.state != RecognizerState::Ready;
        if reopened {
            self.reopen_upward(group, parent);
        }
        tracing::debug!(
            "Replaced {} children with {} (active touches {:?})",
            old.len(),
            children.len(),
            active_touches
        );

        if active && children.is_empty() {
            self.adjudicate(group, GestureDisposal::Reject);
        }
        Ok(())
    }

    /// Swap a group's children unless the new ones describe the same tree
    ///
    /// When every new child matches the old child at the same position (same
    /// gesture and settings, groups compared child by child) the old children
    /// stay in place with their in-flight progress and the unused new ones
    /// are removed from the surface. Anything else falls back to
    /// [`replace_children`](Self::replace_children). Returns the children the
    /// group ends up with.
    pub fn reconcile_children(
        &mut self,
        group: RecognizerId,
        children: &[RecognizerId],
    ) -> Result<Vec<RecognizerId>> {
        let node = self
            .nodes
            .get(group)
            .ok_or(GestureError::UnknownRecognizer(group))?;
        let old: Vec<RecognizerId> = node
            .as_group()
            .ok_or(GestureError::NotAGroup(group))?
            .children()
            .to_vec();
        self.check_children(Some(group), children)?;

        let keeps = old.len() == children.len()
            && old.iter().zip(children).all(|(&kept, &new)| {
                kept == new || (!self.is_ancestor(group, new) && self.equivalent(kept, new))
            });
        if !keeps {
            self.replace_children(group, children)?;
            return Ok(children.to_vec());
        }
        for (&kept, &new) in old.iter().zip(children) {
            if kept != new {
                self.remove(new)?;
            }
        }
        tracing::debug!("Kept {} equivalent children of group {:?}", old.len(), group);
        Ok(old)
    }

    /// Two recognizer trees match the same gestures with the same settings
    fn equivalent(&self, a: RecognizerId, b: RecognizerId) -> bool {
        let (Some(a), Some(b)) = (self.nodes.get(a), self.nodes.get(b)) else {
            return false;
        };
        match (&a.kind, &b.kind) {
            (NodeKind::Detector(a), NodeKind::Detector(b)) => a.same_gesture(&**b),
            (NodeKind::Group(a), NodeKind::Group(b)) => {
                a.policy() == b.policy()
                    && a.children().len() == b.children().len()
                    && a
                        .children()
                        .iter()
                        .zip(b.children())
                        .all(|(&x, &y)| x != y && self.equivalent(x, y))
            }
            _ => false,
        }
    }

    fn check_children(&self, group: Option<RecognizerId>, children: &[RecognizerId]) -> Result<()> {
        for (idx, &child) in children.iter().enumerate() {
            if !self.nodes.contains_key(child) {
                return Err(GestureError::UnknownRecognizer(child));
            }
            if children[..idx].contains(&child) {
                return Err(GestureError::DuplicateChild(child));
            }
            if let Some(group) = group {
                if child == group || self.is_ancestor(child, group) {
                    return Err(GestureError::CyclicGroup { group, child });
                }
            }
        }
        Ok(())
    }

    /// True if `ancestor` contains `id`, directly or further up
    fn is_ancestor(&self, ancestor: RecognizerId, id: RecognizerId) -> bool {
        let mut next = self.nodes.get(id).and_then(|node| node.group);
        while let Some(group) = next {
            if group == ancestor {
                return true;
            }
            next = self.nodes.get(group).and_then(|node| node.group);
        }
        false
    }

    /// Point a child's back-reference at `group`
    fn adopt(&mut self, group: RecognizerId, child: RecognizerId) {
        let previous = self.nodes.get(child).and_then(|node| node.group);
        if let Some(previous) = previous.filter(|previous| *previous != group) {
            self.detach_child(previous, child);
        }
        if self.referee.is_member(child) {
            tracing::debug!("Recognizer {:?} joins a group; leaving the referee", child);
            self.withdraw_candidate(child);
            self.referee.forget(child);
        }
        self.reset_subtree(child);
        if let Some(node) = self.nodes.get_mut(child) {
            node.group = Some(group);
        }
    }

    /// Take a child out of its group as an implicit rejection
    fn detach_child(&mut self, group: RecognizerId, child: RecognizerId) {
        let sequence_running = self.group(group).is_some_and(|state| {
            state.policy() == GroupPolicy::Sequence && state.children().contains(&child)
        }) && self.state(group).is_some_and(|state| state.is_undecided());

        if let Some(state) = self.group_mut(group) {
            state.remove_child(child);
        }
        if let Some(node) = self.nodes.get_mut(child) {
            node.group = None;
        }

        if sequence_running {
            self.adjudicate(group, GestureDisposal::Reject);
            return;
        }
        if self.group(group).is_some_and(|state| state.policy() == GroupPolicy::Exclusive) {
            // The removed child may have blocked a later request
            self.settle_exclusive(group);
        }
        self.check_all_failed(group);
    }

    /// Withdraw a top-level candidate's claims from every ledger
    fn withdraw_candidate(&mut self, id: RecognizerId) {
        let mut verdicts = Vec::new();
        self.referee.retire(id, self.flushing, &mut verdicts);
        self.apply_verdicts(verdicts);
    }

    /// Forget the group's committed outcome in whatever arbitrates it
    fn reopen_upward(&mut self, id: RecognizerId, parent: Option<RecognizerId>) {
        match parent {
            Some(parent) => {
                if let Some(state) = self.group_mut(parent) {
                    state.contest.reopen(id);
                    if state.active == Some(id) {
                        state.active = None;
                    }
                }
            }
            None => self.referee.reopen(id),
        }
    }

    // =========================================================================
    // Referee
    // =========================================================================

    /// Register a hit-test candidate for a touch identifier
    ///
    /// Returns false when it was already registered for that identifier.
    pub fn add_candidate(&mut self, touch_id: TouchId, id: RecognizerId) -> Result<bool> {
        let node = self.nodes.get(id).ok_or(GestureError::UnknownRecognizer(id))?;
        if node.group.is_some() {
            return Err(GestureError::AlreadyGrouped(id));
        }
        Ok(self.referee.add_candidate(touch_id, id))
    }

    /// Commit the winner of a touch identifier now, if it is unblocked
    pub fn resolve(&mut self, touch_id: TouchId) {
        let mut verdicts = Vec::new();
        self.referee.resolve(touch_id, &mut verdicts);
        self.apply_verdicts(verdicts);
    }

    /// Release the ledger of an ended touch identifier
    ///
    /// Delayed (returns false) while some candidate still holds an
    /// undecided claim; it is retried after every batch and every
    /// [`advance_to`](Self::advance_to).
    pub fn clear(&mut self, touch_id: TouchId) -> bool {
        let Some(scope) = self.referee.scope(touch_id) else {
            return false;
        };
        if !scope.is_ended() {
            tracing::trace!("Touch {} still active, not clearing", touch_id);
            return false;
        }
        if scope.has_pending() {
            tracing::debug!("Delaying clear of touch {}: claims pending", touch_id);
            return false;
        }
        let mut verdicts = Vec::new();
        let Some(members) = self.referee.remove(touch_id, &mut verdicts) else {
            return false;
        };
        // Members still competing for another identifier keep their standing
        verdicts.retain(|verdict| match verdict {
            Verdict::Reject(id) => !self.referee.is_member(*id),
            _ => false,
        });
        self.apply_verdicts(verdicts);
        for id in members {
            if !self.referee.is_member(id) {
                self.reset_subtree(id);
            }
        }
        tracing::trace!("Cleared touch {}", touch_id);
        true
    }

    fn clear_ended(&mut self) {
        for touch_id in self.referee.clearable() {
            self.clear(touch_id);
        }
    }

    pub fn referee(&self) -> &GestureReferee {
        &self.referee
    }

    /// Committed winner of a touch identifier
    pub fn winner(&self, touch_id: TouchId) -> Option<RecognizerId> {
        self.referee.winner(touch_id)
    }

    // =========================================================================
    // Input
    // =========================================================================

    /// Open a flush batch
    pub fn begin_flush(&mut self) {
        if self.flushing {
            return;
        }
        self.flushing = true;
        for node in self.nodes.values_mut() {
            if let NodeKind::Detector(detector) = &mut node.kind {
                detector.on_flush_begin();
            }
        }
    }

    /// Close a flush batch and commit every accept request it raised
    pub fn end_flush(&mut self) {
        if !self.flushing {
            return;
        }
        // Deepest groups first, so their requests reach the parents
        // while the batch is still open
        for group in self.groups_post_order() {
            if self.group(group).is_some_and(|state| state.policy() == GroupPolicy::Exclusive) {
                self.settle_exclusive(group);
            }
        }
        self.flushing = false;

        let mut verdicts = Vec::new();
        self.referee.resolve_all(&mut verdicts);
        self.apply_verdicts(verdicts);

        for node in self.nodes.values_mut() {
            if let NodeKind::Detector(detector) = &mut node.kind {
                detector.on_flush_end();
            }
        }
        self.clear_ended();
    }

    pub fn is_flushing(&self) -> bool {
        self.flushing
    }

    /// Deliver a touch event to the candidates of its identifier
    ///
    /// Returns true if some recognizer is interested in the event. Events
    /// for identifiers with no candidates are ignored.
    pub fn handle_touch(&mut self, event: &TouchEvent) -> bool {
        self.handle_input(Input::Touch(event))
    }

    /// Deliver an axis (scroll or pinch) event
    pub fn handle_axis(&mut self, event: &AxisEvent) -> bool {
        self.handle_input(Input::Axis(event))
    }

    /// Terminate a touch identifier immediately
    ///
    /// Accepted candidates get a [`NoticeKind::Cancelled`], undecided ones
    /// are rejected, and no recognizer keeps tracking the identifier.
    pub fn cancel(&mut self, touch_id: TouchId) {
        self.cancel_touch(touch_id);
        if !self.flushing {
            self.clear_ended();
        }
    }

    /// Move the clock forward, firing due deadlines
    ///
    /// Outside a flush batch the deadlines fire in a batch of their own, so
    /// detectors whose timers expire together are settled in registration
    /// order.
    pub fn advance_to(&mut self, now: Timestamp) {
        self.now = self.now.max(now);
        if self.flushing {
            self.fire_deadlines(now);
            return;
        }
        self.begin_flush();
        self.fire_deadlines(now);
        self.end_flush();
    }

    pub fn now(&self) -> Timestamp {
        self.now
    }

    fn handle_input(&mut self, input: Input<'_>) -> bool {
        if self.flushing {
            return self.dispatch(input);
        }
        // Timers that expired before this event win over it
        self.advance_to(input.time());
        self.begin_flush();
        let interested = self.dispatch(input);
        self.end_flush();
        interested
    }

    fn dispatch(&mut self, input: Input<'_>) -> bool {
        let touch_id = input.id();
        let phase = input.phase();
        let Some(scope) = self.referee.scope(touch_id) else {
            tracing::debug!("Ignoring {:?} for touch {}: no candidates", phase, touch_id);
            return false;
        };
        if phase == TouchPhase::Down && scope.is_ended() {
            tracing::warn!("Touch {} pressed again before its last gesture cleared", touch_id);
        }
        let members: SmallVec<[RecognizerId; 4]> = scope.members().collect();

        self.now = self.now.max(input.time());
        self.fire_deadlines(input.time());

        if phase == TouchPhase::Cancel {
            self.cancel_touch(touch_id);
            return false;
        }

        if phase.is_end() {
            self.lifting = Some(touch_id);
        }
        let mut interested = false;
        for id in members {
            interested |= self.route(id, input);
        }
        self.lifting = None;

        if phase == TouchPhase::Up {
            self.referee.mark_ended(touch_id);
        }
        interested
    }

    pub(crate) fn lifting(&self) -> Option<TouchId> {
        self.lifting
    }

    /// Deliver an event to one recognizer
    pub(crate) fn route(&mut self, id: RecognizerId, input: Input<'_>) -> bool {
        let touch = input.touch();
        let Some(node) = self.nodes.get_mut(id) else {
            return false;
        };

        if touch.phase == TouchPhase::Down {
            if !node.fingers.press(&touch) {
                tracing::trace!(
                    "{} ignores touch {}: already tracked or finger window full",
                    node.name(),
                    touch.id
                );
                return false;
            }
            node.transition(StateEvent::Track);
        } else if !node.fingers.update(&touch) {
            return false;
        }

        if node.state == RecognizerState::Rejected {
            if touch.phase.is_end() {
                self.release_subtree(id, touch.id);
            }
            return false;
        }

        let is_group = matches!(node.kind, NodeKind::Group(_));
        let interested = if is_group {
            self.route_group(id, input)
        } else {
            self.route_detector(id, input)
        };

        if touch.phase.is_end() {
            if let Some(node) = self.nodes.get_mut(id) {
                node.fingers.release(touch.id);
            }
        } else if touch.phase == TouchPhase::Down && !interested {
            self.withdraw_finger(id, touch.id);
        }
        interested
    }

    fn route_detector(&mut self, id: RecognizerId, input: Input<'_>) -> bool {
        let Some(node) = self.nodes.get_mut(id) else {
            return false;
        };
        let RecognizerNode { fingers, kind, .. } = node;
        let NodeKind::Detector(detector) = kind else {
            return false;
        };
        let response = match input {
            Input::Touch(event) => detector.on_touch(fingers, event),
            Input::Axis(event) => detector.on_axis(fingers, event),
        };
        match response {
            Response::Ignore => false,
            Response::Continue => true,
            Response::Dispose(disposal) => {
                self.adjudicate(id, disposal);
                self.state(id) != Some(RecognizerState::Rejected)
            }
        }
    }

    /// Undo the press of a finger the recognizer did not want
    fn withdraw_finger(&mut self, id: RecognizerId, touch_id: TouchId) {
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        node.fingers.withdraw(touch_id);
        if node.fingers.is_empty() && node.state == RecognizerState::Detecting {
            node.reset_local();
        }
    }

    fn release_subtree(&mut self, id: RecognizerId, touch_id: TouchId) {
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            let Some(node) = self.nodes.get_mut(next) else {
                continue;
            };
            node.fingers.release(touch_id);
            if let Some(group) = node.as_group_mut() {
                group.forget_touch(touch_id);
                stack.extend(group.children().iter().copied());
            }
        }
    }

    fn fire_deadlines(&mut self, now: Timestamp) {
        let mut due: SmallVec<[(Timestamp, RecognizerId); 4]> = self
            .nodes
            .iter()
            .filter_map(|(id, node)| node.deadline().map(|deadline| (deadline, id)))
            .filter(|(deadline, _)| *deadline <= now)
            .collect();
        // Earliest first; accepts raised here are settled when the batch ends
        due.sort_by_key(|(deadline, _)| *deadline);

        for (_, id) in due {
            let Some(node) = self.nodes.get_mut(id) else {
                continue;
            };
            // Earlier deadlines may have settled this one already
            if !node.deadline().is_some_and(|deadline| deadline <= now) {
                continue;
            }
            let RecognizerNode { fingers, kind, .. } = node;
            let response = match kind {
                NodeKind::Detector(detector) => detector.on_deadline(fingers, now),
                NodeKind::Group(group) => {
                    group.expire();
                    tracing::debug!("Sequence timed out waiting for its next step");
                    Response::REJECT
                }
            };
            if let Response::Dispose(disposal) = response {
                self.adjudicate(id, disposal);
            }
        }
    }

    fn cancel_touch(&mut self, touch_id: TouchId) {
        let mut ignored = Vec::new();
        let Some(members) = self.referee.remove(touch_id, &mut ignored) else {
            tracing::debug!("Cancel for unknown touch {}", touch_id);
            return;
        };
        for &id in &members {
            self.terminate(id);
        }
        for node in self.nodes.values_mut() {
            node.fingers.release(touch_id);
            if let Some(group) = node.as_group_mut() {
                group.forget_touch(touch_id);
            }
        }
        for &id in &members {
            self.withdraw_candidate(id);
        }
        for &id in &members {
            if !self.referee.is_member(id) {
                self.reset_subtree(id);
            }
        }
        tracing::debug!("Cancelled touch {} for {} candidates", touch_id, members.len());
    }

    /// Force a recognizer out of the current cycle
    fn terminate(&mut self, id: RecognizerId) {
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        if node.state != RecognizerState::Accepted {
            self.reject(id);
            return;
        }
        node.transition(StateEvent::Reject);
        let touch_ids = node.fingers.cycle_ids();
        let children: Children = match &mut node.kind {
            NodeKind::Detector(detector) => {
                for &touch_id in &touch_ids {
                    detector.on_rejected(touch_id);
                }
                Children::new()
            }
            NodeKind::Group(group) => group.children().iter().copied().collect(),
        };
        self.notify(id, touch_ids, NoticeKind::Cancelled);
        for child in children {
            self.terminate(child);
        }
    }

    // =========================================================================
    // Arbitration
    // =========================================================================

    /// Upward path: a recognizer asks for a decision about itself
    pub(crate) fn adjudicate(&mut self, id: RecognizerId, disposal: GestureDisposal) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        match (node.state, disposal) {
            (RecognizerState::Ready | RecognizerState::Rejected, _) => return,
            (RecognizerState::Accepted, GestureDisposal::Accept | GestureDisposal::Pending) => return,
            (RecognizerState::Pending, GestureDisposal::Pending) => return,
            _ => {}
        }
        let window = node.fingers.window();
        if disposal != GestureDisposal::Reject && node.fingers.peak() < window.min {
            tracing::trace!(
                "{} wants {:?} with {} of {} fingers; keeps detecting",
                node.name(),
                disposal,
                node.fingers.peak(),
                window.min
            );
            return;
        }
        let touch_ids = node.fingers.cycle_ids();
        let parent = node.group;
        tracing::debug!("{} reports {:?} for touches {:?}", node.name(), disposal, touch_ids);

        match parent {
            Some(group) => self.batch_adjudicate(group, &touch_ids, id, disposal),
            None => {
                let mut verdicts = Vec::new();
                if !self.referee.submit(id, disposal, self.flushing, &mut verdicts) {
                    // Standalone recognizer: nothing to compete with
                    verdicts.push(match disposal {
                        GestureDisposal::Accept => Verdict::Accept(id),
                        GestureDisposal::Reject => Verdict::Reject(id),
                        GestureDisposal::Pending => Verdict::Pending(id),
                    });
                }
                self.apply_verdicts(verdicts);
            }
        }
    }

    fn apply_verdicts(&mut self, verdicts: Vec<Verdict>) {
        for verdict in verdicts {
            match verdict {
                Verdict::Accept(id) => self.accept(id),
                Verdict::Reject(id) => self.reject(id),
                Verdict::Pending(id) => self.pend(id),
            }
        }
    }

    /// Downward path: the recognizer won
    pub(crate) fn accept(&mut self, id: RecognizerId) {
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        if !node.transition(StateEvent::Accept) {
            return;
        }
        let touch_ids = node.fingers.cycle_ids();
        let (winners, losers) = match &mut node.kind {
            NodeKind::Detector(detector) => {
                for &touch_id in &touch_ids {
                    detector.on_accepted(touch_id);
                }
                (Children::new(), Children::new())
            }
            NodeKind::Group(group) => group.on_accepted(),
        };
        self.notify(id, touch_ids, NoticeKind::Accepted);
        for child in losers {
            self.reject(child);
        }
        for child in winners {
            self.accept(child);
        }
    }

    /// Downward path: the recognizer lost; a group takes its children along
    ///
    /// An accepted recognizer losing after the fact is cancelled instead.
    pub(crate) fn reject(&mut self, id: RecognizerId) {
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        if node.state == RecognizerState::Accepted {
            self.terminate(id);
            return;
        }
        if !node.transition(StateEvent::Reject) {
            return;
        }
        let touch_ids = node.fingers.cycle_ids();
        let children: Children = match &mut node.kind {
            NodeKind::Detector(detector) => {
                for &touch_id in &touch_ids {
                    detector.on_rejected(touch_id);
                }
                Children::new()
            }
            NodeKind::Group(group) => group.children().iter().copied().collect(),
        };
        self.notify(id, touch_ids, NoticeKind::Rejected);
        for child in children {
            self.reject(child);
        }
    }

    /// Downward path: the recognizer waits for others
    pub(crate) fn pend(&mut self, id: RecognizerId) {
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        if !node.transition(StateEvent::Pend) {
            return;
        }
        let touch_ids = node.fingers.cycle_ids();
        let children = match &mut node.kind {
            NodeKind::Detector(detector) => {
                for &touch_id in &touch_ids {
                    detector.on_pending(touch_id);
                }
                Children::new()
            }
            NodeKind::Group(group) => group.on_pending(),
        };
        self.notify(id, touch_ids, NoticeKind::Pending);
        for child in children {
            self.pend(child);
        }
    }

    fn notify(&mut self, recognizer: RecognizerId, touch_ids: TouchIds, kind: NoticeKind) {
        tracing::debug!(
            "{} {:?} for touches {:?}",
            self.name(recognizer).unwrap_or("?"),
            kind,
            touch_ids
        );
        self.notices.push(GestureNotice {
            recognizer,
            touch_ids,
            kind,
        });
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Return one recognizer and its subtree to READY
    ///
    /// Claims it still held are withdrawn as rejections. A no-op on a
    /// recognizer that is already idle.
    pub fn reset_recognizer(&mut self, id: RecognizerId) -> Result<()> {
        let node = self.nodes.get(id).ok_or(GestureError::UnknownRecognizer(id))?;
        if node.state == RecognizerState::Ready && node.fingers.is_empty() {
            return Ok(());
        }
        match node.group {
            Some(group) => {
                let flushing = self.flushing;
                let mut verdicts = Vec::new();
                if let Some(state) = self.group_mut(group) {
                    state.contest.retire(id, flushing, &mut verdicts);
                    state.drop_contender(id);
                }
                self.apply_group_verdicts(group, verdicts);
                self.reset_subtree(id);
                self.check_all_failed(group);
            }
            None => {
                self.withdraw_candidate(id);
                self.reset_subtree(id);
            }
        }
        Ok(())
    }

    /// Drop every ledger and return all recognizers to READY
    pub fn reset(&mut self) {
        self.referee.clear();
        self.flushing = false;
        self.lifting = None;
        for node in self.nodes.values_mut() {
            node.reset_local();
        }
        tracing::debug!("Touch surface reset");
    }

    fn reset_subtree(&mut self, id: RecognizerId) {
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            let Some(node) = self.nodes.get_mut(next) else {
                continue;
            };
            if let Some(group) = node.as_group() {
                stack.extend(group.children().iter().copied());
            }
            node.reset_local();
        }
    }

    /// Groups reachable from the referee, children before parents
    fn groups_post_order(&self) -> Vec<RecognizerId> {
        let mut order = Vec::new();
        let mut seen = FxHashSet::default();
        for root in self.referee.candidates() {
            self.collect_groups(root, &mut seen, &mut order);
        }
        order
    }

    fn collect_groups(
        &self,
        id: RecognizerId,
        seen: &mut FxHashSet<RecognizerId>,
        order: &mut Vec<RecognizerId>,
    ) {
        if !seen.insert(id) {
            return;
        }
        let Some(group) = self.group(id) else {
            return;
        };
        for &child in group.children() {
            self.collect_groups(child, seen, order);
        }
        order.push(id);
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Take the outcome notices raised so far
    pub fn drain_notices(&mut self) -> Vec<GestureNotice> {
        std::mem::take(&mut self.notices)
    }

    pub fn notices(&self) -> &[GestureNotice] {
        &self.notices
    }

    pub fn contains(&self, id: RecognizerId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn node(&self, id: RecognizerId) -> Option<&RecognizerNode> {
        self.nodes.get(id)
    }

    pub fn state(&self, id: RecognizerId) -> Option<RecognizerState> {
        self.nodes.get(id).map(RecognizerNode::state)
    }

    pub fn name(&self, id: RecognizerId) -> Option<&'static str> {
        self.nodes.get(id).map(RecognizerNode::name)
    }

    /// Identifiers a recognizer currently tracks
    pub fn tracked(&self, id: RecognizerId) -> TouchIds {
        self.nodes
            .get(id)
            .map(|node| node.fingers.ids())
            .unwrap_or_default()
    }

    pub fn tracks(&self, id: RecognizerId, touch_id: TouchId) -> bool {
        self.nodes
            .get(id)
            .is_some_and(|node| node.fingers.contains(touch_id))
    }

    pub fn group(&self, id: RecognizerId) -> Option<&GestureGroup> {
        self.nodes.get(id).and_then(RecognizerNode::as_group)
    }

    pub(crate) fn group_mut(&mut self, id: RecognizerId) -> Option<&mut GestureGroup> {
        self.nodes.get_mut(id).and_then(RecognizerNode::as_group_mut)
    }

    /// Exclusive winner or running sequence step of a group
    pub fn active_child(&self, group: RecognizerId) -> Option<RecognizerId> {
        self.group(group).and_then(GestureGroup::active_child)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
