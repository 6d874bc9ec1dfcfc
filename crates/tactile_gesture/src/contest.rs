//! Ordered arbitration ledger
//!
//! A [`Contest`] holds the members competing for the same input, in
//! registration order, with each member's standing. Exclusive groups run one
//! contest over their children and the referee runs one per touch identifier.
//!
//! Rules:
//! - the first member (in registration order) holding an accept request wins,
//!   unless an earlier member is `Pending`, which blocks everything after it;
//! - `Detecting` members never block;
//! - once a winner is committed every other member is rejected;
//! - while deferring (inside a flush batch) accept requests are only recorded,
//!   so the outcome does not depend on call order within the batch.

use smallvec::SmallVec;
use tactile_core::{GestureDisposal, RecognizerId};

/// Standing of one member
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Standing {
    Detecting,
    /// Reported a pending match
    Pending,
    /// Asked to accept, waiting for commit
    Requested,
    Accepted,
    Rejected,
}

/// Decision to apply to a member
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Accept(RecognizerId),
    Reject(RecognizerId),
    Pending(RecognizerId),
}

#[derive(Clone, Debug, Default)]
pub struct Contest {
    members: SmallVec<[(RecognizerId, Standing); 4]>,
}

impl Contest {
    pub fn new(members: impl IntoIterator<Item = RecognizerId>) -> Self {
        Self {
            members: members
                .into_iter()
                .map(|id| (id, Standing::Detecting))
                .collect(),
        }
    }

    /// Append a member; false if already present
    pub fn join(&mut self, id: RecognizerId) -> bool {
        if self.contains(id) {
            return false;
        }
        self.members.push((id, Standing::Detecting));
        true
    }

    pub fn contains(&self, id: RecognizerId) -> bool {
        self.position(id).is_some()
    }

    pub fn standing(&self, id: RecognizerId) -> Option<Standing> {
        self.position(id).map(|idx| self.members[idx].1)
    }

    pub fn members(&self) -> impl Iterator<Item = RecognizerId> + '_ {
        self.members.iter().map(|(id, _)| *id)
    }

    /// Members not yet rejected, in registration order
    pub fn contenders(&self) -> impl Iterator<Item = RecognizerId> + '_ {
        self.members
            .iter()
            .filter(|(_, standing)| *standing != Standing::Rejected)
            .map(|(id, _)| *id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn winner(&self) -> Option<RecognizerId> {
        self.members
            .iter()
            .find(|(_, standing)| *standing == Standing::Accepted)
            .map(|(id, _)| *id)
    }

    /// True when no member can win any more (also for an empty contest)
    pub fn all_rejected(&self) -> bool {
        self.members
            .iter()
            .all(|(_, standing)| *standing == Standing::Rejected)
    }

    /// Some member holds an unresolved claim
    pub fn has_pending(&self) -> bool {
        self.members
            .iter()
            .any(|(_, standing)| matches!(standing, Standing::Pending | Standing::Requested))
    }

    /// Record a disposal reported by a member
    pub fn submit(
        &mut self,
        id: RecognizerId,
        disposal: GestureDisposal,
        defer: bool,
        out: &mut Vec<Verdict>,
    ) {
        let Some(idx) = self.position(id) else {
            return;
        };
        let standing = self.members[idx].1;
        match (standing, disposal) {
            (Standing::Rejected, _) => {}
            (Standing::Accepted, GestureDisposal::Accept | GestureDisposal::Pending) => {}
            (_, GestureDisposal::Reject) => {
                self.members[idx].1 = Standing::Rejected;
                out.push(Verdict::Reject(id));
                if !defer {
                    self.settle(out);
                }
            }
            (Standing::Requested | Standing::Pending, GestureDisposal::Pending) => {}
            (_, GestureDisposal::Pending) => {
                self.members[idx].1 = Standing::Pending;
                out.push(Verdict::Pending(id));
            }
            (_, GestureDisposal::Accept) => {
                if self.winner().is_some() {
                    // A late claim after the commit loses
                    self.members[idx].1 = Standing::Rejected;
                    out.push(Verdict::Reject(id));
                    return;
                }
                self.members[idx].1 = Standing::Requested;
                if !defer {
                    self.settle(out);
                }
            }
        }
    }

    /// Commit the first unblocked accept request, if any
    pub fn settle(&mut self, out: &mut Vec<Verdict>) {
        if self.winner().is_some() {
            return;
        }
        match self.choice() {
            Some(id) => self.commit(id, out),
            // Blocked requests wait as pending
            None => out.extend(self.requested().map(Verdict::Pending)),
        }
    }

    /// The member [`settle`](Self::settle) would commit
    ///
    /// None once a winner exists or while an earlier `Pending` member blocks.
    pub fn choice(&self) -> Option<RecognizerId> {
        if self.winner().is_some() {
            return None;
        }
        for (id, standing) in &self.members {
            match standing {
                Standing::Rejected | Standing::Detecting => continue,
                Standing::Pending => return None,
                Standing::Requested => return Some(*id),
                Standing::Accepted => return None,
            }
        }
        None
    }

    /// Members holding an accept request that has not been committed
    pub fn requested(&self) -> impl Iterator<Item = RecognizerId> + '_ {
        self.members
            .iter()
            .filter(|(_, standing)| *standing == Standing::Requested)
            .map(|(id, _)| *id)
    }

    /// Make `id` the winner and reject everyone else still in
    pub fn commit(&mut self, id: RecognizerId, out: &mut Vec<Verdict>) {
        if !self.contains(id) {
            return;
        }
        for (member, standing) in self.members.iter_mut() {
            if *member == id {
                *standing = Standing::Accepted;
            } else if *standing != Standing::Rejected {
                *standing = Standing::Rejected;
                out.push(Verdict::Reject(*member));
            }
        }
        out.push(Verdict::Accept(id));
    }

    /// Mark a member rejected without a verdict for it, then re-settle
    pub fn retire(&mut self, id: RecognizerId, defer: bool, out: &mut Vec<Verdict>) {
        let Some(idx) = self.position(id) else {
            return;
        };
        if self.members[idx].1 == Standing::Rejected {
            return;
        }
        self.members[idx].1 = Standing::Rejected;
        if !defer {
            self.settle(out);
        }
    }

    /// Drop a member entirely
    pub fn remove(&mut self, id: RecognizerId) -> bool {
        let Some(idx) = self.position(id) else {
            return false;
        };
        self.members.remove(idx);
        true
    }

    /// Clear a member's outcome so it competes again
    pub fn reopen(&mut self, id: RecognizerId) {
        if let Some(idx) = self.position(id) {
            self.members[idx].1 = Standing::Detecting;
        }
    }

    /// Reject every member that has no outcome yet
    pub fn reject_undecided(&mut self, out: &mut Vec<Verdict>) {
        for (id, standing) in &mut self.members {
            if !matches!(standing, Standing::Accepted | Standing::Rejected) {
                *standing = Standing::Rejected;
                out.push(Verdict::Reject(*id));
            }
        }
    }

    fn position(&self, id: RecognizerId) -> Option<usize> {
        self.members.iter().position(|(member, _)| *member == id)
    }
}
