//! Parallel groups: every child that matches wins.
//!
//! The first child accept makes the group ask its parent for acceptance;
//! children accepting after that are accepted straight away. The group only
//! fails when every child has failed.

use tactile_core::{GestureDisposal, RecognizerId, RecognizerState};

use super::PolicyState;
use crate::surface::TouchSurface;

impl TouchSurface {
    pub(crate) fn parallel_adjudicate(
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
                    state.drop_contender(child);
                    if let PolicyState::Parallel { requested } = &mut state.policy {
                        requested.retain(|id| *id != child);
                    }
                }
                self.reject(child);
                self.check_all_failed(group);
            }
            GestureDisposal::Pending => {
                self.pend(child);
                self.adjudicate(group, GestureDisposal::Pending);
            }
            GestureDisposal::Accept => match self.state(group) {
                Some(RecognizerState::Accepted) => self.accept(child),
                Some(RecognizerState::Rejected) | None => self.reject(child),
                Some(_) => {
                    if let Some(state) = self.group_mut(group) {
                        if let PolicyState::Parallel { requested } = &mut state.policy {
                            if !requested.contains(&child) {
                                requested.push(child);
                            }
                        }
                    }
                    self.adjudicate(group, GestureDisposal::Accept);
                    if self.state(group) == Some(RecognizerState::Pending) {
                        self.pend(child);
                    }
                }
            },
        }
    }
}
