//! Gesture groups
//!
//! A group is a recognizer composed of child recognizers and a combination
//! policy:
//!
//! - [`GroupPolicy::Exclusive`]: at most one child wins
//! - [`GroupPolicy::Parallel`]: any number of children win together
//! - [`GroupPolicy::Sequence`]: children must succeed one after another
//!
//! Children report their disposals to the group (`batch_adjudicate`), which
//! decides among them and reports its own disposal to its parent group or to
//! the referee. Final outcomes flow back down when the parent decides.

mod exclusive;
mod parallel;
mod sequence;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tactile_core::{
    GestureDisposal, RecognizerId, RecognizerState, Timestamp, TouchEvent, TouchId, TouchPhase,
};

use crate::contest::{Contest, Standing};
use crate::surface::{Input, TouchSurface};

pub(crate) type Children = SmallVec<[RecognizerId; 4]>;

/// Combination policy of a group
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupPolicy {
    Exclusive,
    Parallel,
    Sequence,
}

impl GroupPolicy {
    pub const fn name(self) -> &'static str {
        match self {
            GroupPolicy::Exclusive => "exclusive",
            GroupPolicy::Parallel => "parallel",
            GroupPolicy::Sequence => "sequence",
        }
    }
}

/// Per-policy bookkeeping
#[derive(Clone, Debug)]
pub(crate) enum PolicyState {
    Exclusive,
    Parallel {
        /// Children waiting for the group to be accepted
        requested: Children,
    },
    Sequence {
        current: usize,
        /// Children that already succeeded, in order
        completed: Children,
        /// Latest time the next step may begin
        deadline: Option<Timestamp>,
    },
}

impl PolicyState {
    fn new(policy: GroupPolicy) -> Self {
        match policy {
            GroupPolicy::Exclusive => PolicyState::Exclusive,
            GroupPolicy::Parallel => PolicyState::Parallel {
                requested: Children::new(),
            },
            GroupPolicy::Sequence => PolicyState::Sequence {
                current: 0,
                completed: Children::new(),
                deadline: None,
            },
        }
    }

    fn policy(&self) -> GroupPolicy {
        match self {
            PolicyState::Exclusive => GroupPolicy::Exclusive,
            PolicyState::Parallel { .. } => GroupPolicy::Parallel,
            PolicyState::Sequence { .. } => GroupPolicy::Sequence,
        }
    }
}

/// Composite recognizer state
#[derive(Clone, Debug)]
pub struct GestureGroup {
    children: Children,
    /// Standing of each child; arbitrates for exclusive groups
    pub(crate) contest: Contest,
    /// Children still interested in each touch identifier
    pub(crate) contention: FxHashMap<TouchId, Children>,
    /// Winning child of an exclusive group
    pub(crate) active: Option<RecognizerId>,
    pub(crate) policy: PolicyState,
}

impl GestureGroup {
    pub(crate) fn new(policy: GroupPolicy, children: &[RecognizerId]) -> Self {
        Self {
            children: children.iter().copied().collect(),
            contest: Contest::new(children.iter().copied()),
            contention: FxHashMap::default(),
            active: None,
            policy: PolicyState::new(policy),
        }
    }

    pub fn policy(&self) -> GroupPolicy {
        self.policy.policy()
    }

    /// Children in registration order
    pub fn children(&self) -> &[RecognizerId] {
        &self.children
    }

    /// Exclusive winner, or the running step of a sequence
    pub fn active_child(&self) -> Option<RecognizerId> {
        match &self.policy {
            PolicyState::Exclusive => self.active,
            PolicyState::Parallel { .. } => None,
            PolicyState::Sequence { current, .. } => self.children.get(*current).copied(),
        }
    }

    /// Children still interested in a touch identifier
    pub fn contenders(&self, touch_id: TouchId) -> &[RecognizerId] {
        self.contention
            .get(&touch_id)
            .map(|children| children.as_slice())
            .unwrap_or(&[])
    }

    pub(crate) fn deadline(&self) -> Option<Timestamp> {
        match &self.policy {
            PolicyState::Sequence { deadline, .. } => *deadline,
            _ => None,
        }
    }

    /// Clear an expired deadline
    pub(crate) fn expire(&mut self) {
        if let PolicyState::Sequence { deadline, .. } = &mut self.policy {
            *deadline = None;
        }
    }

    /// Forget all arbitration progress, keeping the children
    pub(crate) fn reset(&mut self) {
        self.contest = Contest::new(self.children.iter().copied());
        self.contention.clear();
        self.active = None;
        self.policy = PolicyState::new(self.policy());
    }

    /// Swap the child list; active identifiers are offered to the new children
    pub(crate) fn set_children(&mut self, children: &[RecognizerId], active_touches: &[TouchId]) {
        self.children = children.iter().copied().collect();
        self.reset();
        for &touch_id in active_touches {
            self.contention.insert(touch_id, self.children.clone());
        }
    }

    /// Take a child out of the group for good
    pub(crate) fn remove_child(&mut self, child: RecognizerId) {
        self.children.retain(|id| *id != child);
        self.contest.remove(child);
        self.drop_contender(child);
        if self.active == Some(child) {
            self.active = None;
        }
        match &mut self.policy {
            PolicyState::Exclusive => {}
            PolicyState::Parallel { requested } => requested.retain(|id| *id != child),
            PolicyState::Sequence {
                current, completed, ..
            } => {
                completed.retain(|id| *id != child);
                *current = (*current).min(self.children.len());
            }
        }
    }

    /// The child no longer competes for any identifier
    pub(crate) fn drop_contender(&mut self, child: RecognizerId) {
        for contenders in self.contention.values_mut() {
            contenders.retain(|id| *id != child);
        }
    }

    pub(crate) fn forget_touch(&mut self, touch_id: TouchId) {
        self.contention.remove(&touch_id);
    }

    /// Children that can no longer win make the whole group fail
    pub(crate) fn all_failed(&self) -> bool {
        match &self.policy {
            // A sequence cannot skip a step
            PolicyState::Sequence { .. } => match self.active_child() {
                Some(current) => self.contest.standing(current) == Some(Standing::Rejected),
                None => self.children.is_empty(),
            },
            _ => self.contest.all_rejected(),
        }
    }

    /// Children to accept and to reject once the group itself is accepted
    pub(crate) fn on_accepted(&self) -> (Children, Children) {
        match &self.policy {
            PolicyState::Exclusive => {
                let winners: Children = self.active.into_iter().collect();
                let losers = self
                    .children
                    .iter()
                    .copied()
                    .filter(|id| Some(*id) != self.active)
                    .collect();
                (winners, losers)
            }
            PolicyState::Parallel { requested } => (requested.clone(), Children::new()),
            PolicyState::Sequence { completed, .. } => (completed.clone(), Children::new()),
        }
    }

    /// Children that wait with the group while it is pending
    pub(crate) fn on_pending(&self) -> Children {
        match &self.policy {
            PolicyState::Exclusive => self.active.into_iter().collect(),
            PolicyState::Parallel { requested } => requested.clone(),
            PolicyState::Sequence { .. } => Children::new(),
        }
    }
}

impl TouchSurface {
    /// Children that receive an event routed to `group`
    fn group_targets(&self, group: RecognizerId, touch_id: TouchId, phase: TouchPhase) -> Children {
        let Some(group) = self.group(group) else {
            return Children::new();
        };
        match &group.policy {
            PolicyState::Sequence { .. } => group.active_child().into_iter().collect(),
            _ => {
                if let Some(active) = group.active {
                    return std::iter::once(active).collect();
                }
                match phase {
                    TouchPhase::Down => group.contest.contenders().collect(),
                    _ => group.contention.get(&touch_id).cloned().unwrap_or_default(),
                }
            }
        }
    }

    /// Forward one event to the children of a group
    pub(crate) fn route_group(&mut self, id: RecognizerId, input: Input<'_>) -> bool {
        let touch_id = input.id();
        let phase = input.phase();

        if self.group(id).is_some_and(|group| group.children().is_empty()) {
            tracing::debug!("Empty gesture group rejects touch {}", touch_id);
            self.adjudicate(id, GestureDisposal::Reject);
            return false;
        }

        let targets = self.group_targets(id, touch_id, phase);
        let mut interested = Children::new();
        for child in targets {
            if let Input::Touch(event) = input {
                if phase == TouchPhase::Move && !self.tracks(child, touch_id) {
                    // Adopted after a child swap: detection starts from this event
                    let down = event.with_phase(TouchPhase::Down);
                    if !self.route(child, Input::Touch(&down)) {
                        continue;
                    }
                }
            }
            if self.route(child, input) {
                interested.push(child);
            }
        }

        let flushing = self.is_flushing();
        let mut idle = Children::new();
        if phase == TouchPhase::Down {
            // Children that never took part are out of this cycle
            for child in self.group_targets(id, touch_id, phase) {
                let untouched = self
                    .node(child)
                    .is_some_and(|node| node.state() == RecognizerState::Ready);
                if !interested.contains(&child) && untouched {
                    idle.push(child);
                }
            }
        }

        let mut verdicts = Vec::new();
        if let Some(group) = self.group_mut(id) {
            match phase {
                TouchPhase::Down | TouchPhase::Move => {
                    group.contention.insert(touch_id, interested.clone());
                }
                TouchPhase::Up | TouchPhase::Cancel => {
                    group.contention.remove(&touch_id);
                }
            }
            if let PolicyState::Sequence { deadline, .. } = &mut group.policy {
                if phase == TouchPhase::Down {
                    *deadline = None;
                }
            }
            for child in &idle {
                group.contest.retire(*child, flushing, &mut verdicts);
            }
        }
        if !verdicts.is_empty() {
            self.apply_group_verdicts(id, verdicts);
        }
        if !idle.is_empty() {
            self.check_all_failed(id);
        }

        !interested.is_empty()
    }

    /// Upward disposal from a child (`BatchAdjudicate`)
    pub(crate) fn batch_adjudicate(
        &mut self,
        group: RecognizerId,
        touch_ids: &[TouchId],
        child: RecognizerId,
        disposal: GestureDisposal,
    ) {
        let Some(policy) = self.group(group).map(GestureGroup::policy) else {
            return;
        };
        tracing::trace!(
            "{:?} group settles {:?} from child for touches {:?}",
            policy,
            disposal,
            touch_ids
        );
        match policy {
            GroupPolicy::Exclusive => self.exclusive_adjudicate(group, child, disposal),
            GroupPolicy::Parallel => self.parallel_adjudicate(group, child, disposal),
            GroupPolicy::Sequence => self.sequence_adjudicate(group, child, disposal),
        }
    }

    /// Apply child verdicts produced by a group's contest
    pub(crate) fn apply_group_verdicts(
        &mut self,
        group: RecognizerId,
        verdicts: Vec<crate::contest::Verdict>,
    ) {
        match self.group(group).map(GestureGroup::policy) {
            Some(GroupPolicy::Exclusive) => self.apply_exclusive_verdicts(group, verdicts),
            Some(_) => {
                for verdict in verdicts {
                    if let crate::contest::Verdict::Reject(child) = verdict {
                        self.reject(child);
                    }
                }
            }
            None => {}
        }
    }

    /// Report REJECT upward once no child can win
    pub(crate) fn check_all_failed(&mut self, group: RecognizerId) {
        if self.group(group).is_some_and(GestureGroup::all_failed) {
            tracing::debug!("Every child of group {:?} failed", group);
            self.adjudicate(group, GestureDisposal::Reject);
        }
    }

    /// Replay the fingers a group holds as DOWN events to one child
    pub(crate) fn replay_fingers(&mut self, group: RecognizerId, child: RecognizerId) -> bool {
        let lifting = self.lifting();
        let downs: SmallVec<[TouchEvent; 4]> = match self.node(group) {
            Some(node) => node
                .fingers()
                .tracks()
                .filter(|(id, _)| Some(*id) != lifting)
                .map(|(id, track)| {
                    TouchEvent::down(
                        id,
                        track.last.position.x,
                        track.last.position.y,
                        track.last.time,
                    )
                })
                .collect(),
            None => return false,
        };
        let mut started = false;
        for down in &downs {
            started |= self.route(child, Input::Touch(down));
        }
        started
    }
}
