//! Gesture referee
//!
//! Per-touch-identifier ledgers guaranteeing a single winner across all
//! top-level candidates of an identifier, whichever groups they belong to.
//! Groups keep exclusivity among their own children; the referee keeps it
//! between independent hit-test candidates such as nested nodes.

use indexmap::IndexMap;
use smallvec::SmallVec;
use tactile_core::{GestureDisposal, RecognizerId, TouchId};

use crate::contest::{Contest, Standing, Verdict};

/// Ledger for one touch identifier
#[derive(Clone, Debug, Default)]
pub struct GestureScope {
    contest: Contest,
    ended: bool,
}

impl GestureScope {
    pub fn members(&self) -> impl Iterator<Item = RecognizerId> + '_ {
        self.contest.members()
    }

    pub fn standing(&self, id: RecognizerId) -> Option<Standing> {
        self.contest.standing(id)
    }

    pub fn winner(&self) -> Option<RecognizerId> {
        self.contest.winner()
    }

    /// The identifier went up or was cancelled
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Undecided claims keep the ledger alive after the identifier ends
    pub fn has_pending(&self) -> bool {
        self.contest.has_pending()
    }
}

/// All ledgers of one touch surface, in identifier arrival order
#[derive(Debug, Default)]
pub struct GestureReferee {
    scopes: IndexMap<TouchId, GestureScope>,
}

impl GestureReferee {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a candidate, creating the ledger on first use
    pub fn add_candidate(&mut self, touch_id: TouchId, id: RecognizerId) -> bool {
        let scope = self.scopes.entry(touch_id).or_default();
        if scope.ended {
            tracing::debug!("Touch {} reused before its ledger cleared", touch_id);
            scope.ended = false;
        }
        scope.contest.join(id)
    }

    pub fn scope(&self, touch_id: TouchId) -> Option<&GestureScope> {
        self.scopes.get(&touch_id)
    }

    pub fn contains(&self, touch_id: TouchId) -> bool {
        self.scopes.contains_key(&touch_id)
    }

    /// Touch identifiers with a live ledger
    pub fn touches(&self) -> SmallVec<[TouchId; 4]> {
        self.scopes.keys().copied().collect()
    }

    /// Touch identifiers whose ledger lists `id`
    pub fn touches_of(&self, id: RecognizerId) -> SmallVec<[TouchId; 4]> {
        self.scopes
            .iter()
            .filter(|(_, scope)| scope.contest.contains(id))
            .map(|(touch_id, _)| *touch_id)
            .collect()
    }

    /// Every distinct candidate, in first-registration order
    pub fn candidates(&self) -> SmallVec<[RecognizerId; 8]> {
        let mut all: SmallVec<[RecognizerId; 8]> = SmallVec::new();
        for scope in self.scopes.values() {
            for id in scope.members() {
                if !all.contains(&id) {
                    all.push(id);
                }
            }
        }
        all
    }

    pub fn is_member(&self, id: RecognizerId) -> bool {
        self.scopes.values().any(|scope| scope.contest.contains(id))
    }

    pub fn winner(&self, touch_id: TouchId) -> Option<RecognizerId> {
        self.scopes.get(&touch_id).and_then(GestureScope::winner)
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Submit a candidate's disposal to every ledger listing it
    ///
    /// Returns false when the candidate is not registered anywhere.
    pub fn submit(
        &mut self,
        id: RecognizerId,
        disposal: GestureDisposal,
        defer: bool,
        out: &mut Vec<Verdict>,
    ) -> bool {
        let mut member = false;
        let mut lost = false;
        for scope in self.scopes.values_mut() {
            if scope.contest.contains(id) {
                member = true;
                scope.contest.submit(id, disposal, true, out);
                lost |= scope.contest.standing(id) == Some(Standing::Rejected);
            }
        }
        if lost {
            // Losing one identifier loses them all
            self.drop_loser(id);
        }
        if member && !defer {
            self.settle(None, out);
        }
        member
    }

    /// Finalize the winner of one identifier
    pub fn resolve(&mut self, touch_id: TouchId, out: &mut Vec<Verdict>) {
        if self.scopes.contains_key(&touch_id) {
            self.settle(Some(touch_id), out);
        }
    }

    pub fn resolve_all(&mut self, out: &mut Vec<Verdict>) {
        self.settle(None, out);
    }

    /// Commit every candidate that all of its ledgers agree on
    ///
    /// A candidate listed for several identifiers only wins once no earlier
    /// pending member blocks it in any of them; until then its request is
    /// reported as pending.
    fn settle(&mut self, only: Option<TouchId>, out: &mut Vec<Verdict>) {
        while let Some(id) = self.next_commit(only) {
            let start = out.len();
            for scope in self.scopes.values_mut() {
                if scope.contest.contains(id) {
                    scope.contest.commit(id, out);
                }
            }
            let losers: SmallVec<[RecognizerId; 4]> = out[start..]
                .iter()
                .filter_map(|verdict| match verdict {
                    Verdict::Reject(loser) => Some(*loser),
                    _ => None,
                })
                .collect();
            for loser in losers {
                self.drop_loser(loser);
            }
            // One accept per candidate, whatever the number of ledgers
            let mut seen = false;
            let mut idx = start;
            while idx < out.len() {
                if out[idx] == Verdict::Accept(id) {
                    if seen {
                        out.remove(idx);
                        continue;
                    }
                    seen = true;
                }
                idx += 1;
            }
        }

        let mut blocked: SmallVec<[RecognizerId; 4]> = SmallVec::new();
        for scope in self.scopes.values() {
            for id in scope.contest.requested() {
                if !blocked.contains(&id) {
                    blocked.push(id);
                }
            }
        }
        out.extend(blocked.into_iter().map(Verdict::Pending));
    }

    fn next_commit(&self, only: Option<TouchId>) -> Option<RecognizerId> {
        self.scopes
            .iter()
            .filter(|(touch_id, _)| only.map_or(true, |only| only == **touch_id))
            .filter_map(|(_, scope)| scope.contest.choice())
            .find(|id| self.agreed(*id))
    }

    /// Every ledger listing the candidate would commit it
    fn agreed(&self, id: RecognizerId) -> bool {
        self.scopes
            .values()
            .filter(|scope| scope.contest.contains(id))
            .all(|scope| scope.contest.choice() == Some(id))
    }

    /// Mark a candidate rejected in every ledger, silently
    fn drop_loser(&mut self, id: RecognizerId) {
        let mut ignored = Vec::new();
        for scope in self.scopes.values_mut() {
            scope.contest.retire(id, true, &mut ignored);
        }
    }

    pub fn mark_ended(&mut self, touch_id: TouchId) {
        if let Some(scope) = self.scopes.get_mut(&touch_id) {
            scope.ended = true;
        }
    }

    /// Ended ledgers with no undecided claim
    pub fn clearable(&self) -> SmallVec<[TouchId; 4]> {
        self.scopes
            .iter()
            .filter(|(_, scope)| scope.ended && !scope.has_pending())
            .map(|(touch_id, _)| *touch_id)
            .collect()
    }

    /// Take a ledger out, rejecting members that never got an outcome
    pub fn remove(
        &mut self,
        touch_id: TouchId,
        out: &mut Vec<Verdict>,
    ) -> Option<SmallVec<[RecognizerId; 4]>> {
        let mut scope = self.scopes.shift_remove(&touch_id)?;
        scope.contest.reject_undecided(out);
        Some(scope.contest.members().collect())
    }

    /// Withdraw a candidate from every ledger as a silent rejection
    pub fn retire(&mut self, id: RecognizerId, defer: bool, out: &mut Vec<Verdict>) {
        if !self.is_member(id) {
            return;
        }
        self.drop_loser(id);
        if !defer {
            self.settle(None, out);
        }
    }

    /// Forget a candidate entirely
    pub fn forget(&mut self, id: RecognizerId) {
        for scope in self.scopes.values_mut() {
            scope.contest.remove(id);
        }
    }

    /// Clear a candidate's committed outcome in every ledger
    ///
    /// Rivals rejected by an earlier commit stay rejected.
    pub fn reopen(&mut self, id: RecognizerId) {
        for scope in self.scopes.values_mut() {
            scope.contest.reopen(id);
        }
    }

    /// Drop every ledger
    pub fn clear(&mut self) {
        self.scopes.clear();
    }
}
