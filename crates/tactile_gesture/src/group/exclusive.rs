//! Exclusive groups: at most one child wins.
//!
//! Children compete through the group's [`Contest`](crate::contest::Contest)
//! in registration order. Once a child is committed it becomes the active
//! child, every other child is rejected and the group asks its own parent for
//! acceptance on the winner's behalf.

use tactile_core::{GestureDisposal, RecognizerId, RecognizerState};

use crate::contest::Verdict;
use crate::surface::TouchSurface;

impl TouchSurface {
    pub(crate) fn exclusive_adjudicate(
        &mut self,
        group: RecognizerId,
        child: RecognizerId,
        disposal: GestureDisposal,
    ) {
        let flushing = self.is_flushing();
        let mut verdicts = Vec::new();
        match self.group_mut(group) {
            Some(state) => state.contest.submit(child, disposal, flushing, &mut verdicts),
            None => return,
        }
        self.apply_exclusive_verdicts(group, verdicts);
    }

    /// Commit every accept request held by the group's contest
    pub(crate) fn settle_exclusive(&mut self, group: RecognizerId) {
        let mut verdicts = Vec::new();
        match self.group_mut(group) {
            Some(state) => state.contest.settle(&mut verdicts),
            None => return,
        }
        if !verdicts.is_empty() {
            self.apply_exclusive_verdicts(group, verdicts);
        }
    }

    pub(crate) fn apply_exclusive_verdicts(&mut self, group: RecognizerId, verdicts: Vec<Verdict>) {
        for verdict in verdicts {
            match verdict {
                Verdict::Reject(child) => {
                    if let Some(state) = self.group_mut(group) {
                        state.drop_contender(child);
                    }
                    self.reject(child);
                }
                Verdict::Pending(child) => {
                    if self.state(group) == Some(RecognizerState::Rejected) {
                        self.reject(child);
                        continue;
                    }
                    self.pend(child);
                    self.adjudicate(group, GestureDisposal::Pending);
                }
                Verdict::Accept(child) => {
                    if let Some(state) = self.group_mut(group) {
                        state.active = Some(child);
                    }
                    tracing::debug!("Exclusive group commits {}", self.name(child).unwrap_or("?"));
                    match self.state(group) {
                        Some(RecognizerState::Accepted) => self.accept(child),
                        Some(RecognizerState::Rejected) | None => self.reject(child),
                        // The child waits for the parent's verdict on the group
                        Some(_) => {
                            self.adjudicate(group, GestureDisposal::Accept);
                            if self.state(group) == Some(RecognizerState::Pending) {
                                self.pend(child);
                            }
                        }
                    }
                }
            }
        }
        self.check_all_failed(group);
    }
}
