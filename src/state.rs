//! Per-call run state
//!
//! Built fresh by every council call and dropped when the call returns.
//! Members only ever see `&RunState`; all mutation goes through actions.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::trace;

use crate::ledger::Ledger;
use crate::member::{Handle, MemberId};

pub struct RunState<A, L: Ledger> {
    args: A,
    /// Every member this call knows about, registered or enqueued
    roster: FxHashMap<MemberId, Handle<A, L>>,
    pending: FxHashSet<MemberId>,
    /// Pick order for pending members. May hold ids that already left
    /// `pending`; those are skipped when popped.
    queue: Vec<MemberId>,
    dependency_stack: Vec<MemberId>,
    partial_result: L,
}

impl<A, L: Ledger> RunState<A, L> {
    pub(crate) fn new<'m>(args: A, members: impl IntoIterator<Item = &'m Handle<A, L>>) -> Self
    where
        A: 'm,
        L: 'm,
    {
        let mut roster = FxHashMap::default();
        let mut pending = FxHashSet::default();
        let mut queue = Vec::new();
        for handle in members {
            if pending.insert(handle.id()) {
                queue.push(handle.id());
            }
            roster.insert(handle.id(), handle.clone());
        }
        Self {
            args,
            roster,
            pending,
            queue,
            dependency_stack: Vec::new(),
            partial_result: L::default(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_result(args: A, partial_result: L) -> Self {
        Self {
            args,
            roster: FxHashMap::default(),
            pending: FxHashSet::default(),
            queue: Vec::new(),
            dependency_stack: Vec::new(),
            partial_result,
        }
    }

    /// The value the council was called with
    pub fn args(&self) -> &A {
        &self.args
    }

    pub fn partial_result(&self) -> &L {
        &self.partial_result
    }

    /// Members not yet run in this call (no particular order)
    pub fn pending(&self) -> impl Iterator<Item = MemberId> + '_ {
        self.pending.iter().copied()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, member: MemberId) -> bool {
        self.pending.contains(&member)
    }

    /// Postponed members, bottom first. The last one runs next.
    pub fn dependency_stack(&self) -> &[MemberId] {
        &self.dependency_stack
    }

    /// Pick the next member: top of the dependency stack, otherwise any
    /// pending member. `None` once both are empty.
    pub(crate) fn next_member(&mut self) -> Option<Handle<A, L>> {
        let id = match self.dependency_stack.pop() {
            Some(id) => id,
            None => self.pop_pending()?,
        };
        let handle = self.roster.get(&id).cloned();
        debug_assert!(handle.is_some(), "{id} scheduled but missing from the roster");
        handle
    }

    fn pop_pending(&mut self) -> Option<MemberId> {
        while let Some(id) = self.queue.pop() {
            if self.pending.remove(&id) {
                return Some(id);
            }
        }
        None
    }

    pub(crate) fn push_dependency(&mut self, member: MemberId) {
        self.dependency_stack.push(member);
    }

    /// Remove `member` from pending. `false` if it was not there.
    pub(crate) fn take_pending(&mut self, member: MemberId) -> bool {
        self.pending.remove(&member)
    }

    pub(crate) fn enqueue(&mut self, handle: Handle<A, L>) {
        let id = handle.id();
        if self.dependency_stack.contains(&id) {
            trace!(member = %id, "already postponed, not enqueued");
            return;
        }
        self.roster.entry(id).or_insert(handle);
        if self.pending.insert(id) {
            self.queue.push(id);
        }
    }

    pub(crate) fn result_mut(&mut self) -> &mut L {
        &mut self.partial_result
    }

    pub(crate) fn into_result(self) -> L {
        self.partial_result
    }
}
