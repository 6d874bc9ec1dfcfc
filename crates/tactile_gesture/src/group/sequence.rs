//! Sequence groups: children must succeed one after another.
//!
//! Only the running step receives input. A step that succeeds before the
//! last one is held pending and the next step starts, either from the fingers
//! still down or from the next DOWN, which must arrive within the configured
//! sequence timeout. The group is accepted when the last step succeeds and
//! fails as soon as any step fails.

use tactile_core::{GestureDisposal, RecognizerId, RecognizerState};

use super::PolicyState;
use crate::surface::TouchSurface;

impl TouchSurface {
    pub(crate) fn sequence_adjudicate(
        &mut self,
        group: RecognizerId,
        child: RecognizerId,
        disposal: GestureDisposal,
    ) {
        match disposal {
            GestureDisposal::Reject => {
                if let Some(state) = self.group_mut(group) {
                    let mut ignored = Vec::new();
                    state.contest.retire(child, true, &mut ignored);
                }
                self.reject(child);
                self.adjudicate(group, GestureDisposal::Reject);
            }
            GestureDisposal::Pending => {
                self.pend(child);
                self.adjudicate(group, GestureDisposal::Pending);
            }
            GestureDisposal::Accept => self.complete_step(group, child),
        }
    }

    fn complete_step(&mut self, group: RecognizerId, child: RecognizerId) {
        let Some(state) = self.group_mut(group) else {
            return;
        };
        if state.active_child() != Some(child) {
            tracing::trace!("Ignoring accept from a sequence step that is not running");
            return;
        }
        let steps = state.children().len();
        let PolicyState::Sequence {
            current, completed, ..
        } = &mut state.policy
        else {
            return;
        };
        completed.push(child);

        if *current + 1 >= steps {
            match self.state(group) {
                Some(RecognizerState::Accepted) => self.accept(child),
                Some(RecognizerState::Rejected) | None => self.reject(child),
                Some(_) => {
                    self.adjudicate(group, GestureDisposal::Accept);
                    if self.state(group) == Some(RecognizerState::Pending) {
                        self.pend(child);
                    }
                }
            }
            return;
        }

        *current += 1;
        let step = *current;
        let next = state.active_child();
        tracing::debug!("Sequence step {} of {} succeeded", step, steps);
        self.pend(child);
        self.adjudicate(group, GestureDisposal::Pending);

        let Some(next) = next else {
            return;
        };
        if self.state(group) == Some(RecognizerState::Rejected) {
            return;
        }
        if !self.replay_fingers(group, next) {
            let deadline = self.now() + self.config().sequence_timeout();
            if let Some(state) = self.group_mut(group) {
                if let PolicyState::Sequence { deadline: slot, .. } = &mut state.policy {
                    *slot = Some(deadline);
                }
            }
        }
    }
}
