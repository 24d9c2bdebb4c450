//! The council: a set of members invoked together as one call
//!
//! ```text
//! call(args)
//!   └─ RunState { pending = all members, stack = [], result = empty }
//!        loop:
//!          member  = stack.pop() or pending.pop()   (none left → done)
//!          outcome = member.call(args, &state)
//!          action  = outcome, or default-wrap of a plain value
//!          proceed = action.apply(member, &mut state)
//!          proceed == false → stop, keep result
//! ```
//!
//! Calls take `&self`, so the member set cannot change while a call runs.
//! Concurrent calls from several threads only share the member set.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::{debug, instrument};

use crate::config::CouncilConfig;
use crate::decorate::{self, Decorator};
use crate::error::CouncilError;
use crate::ledger::{Ledger, MapLedger};
use crate::member::{FnMember, Handle, Member, MemberId, Outcome};
use crate::state::RunState;
use crate::trace::{CallTrace, TraceKind};

/// Council collecting plain values into a list
pub type ListCouncil<A, T> = Council<A, Vec<T>>;

/// Council collecting `(key, value)` pairs, first writer wins
pub type MapCouncil<A, K, V> = Council<A, MapLedger<K, V>>;

pub struct Council<A, L: Ledger> {
    config: CouncilConfig,
    members: FxHashMap<MemberId, Handle<A, L>>,
    /// Template decorators, applied to every member at registration
    decorators: Vec<Decorator<A, L>>,
}

/// Proof of a temporary membership; [`Ticket::leave`] removes the member.
#[derive(Debug)]
#[must_use = "the member stays registered until the ticket is used to leave"]
pub struct Ticket {
    member: MemberId,
}

impl Ticket {
    pub fn member(&self) -> MemberId {
        self.member
    }

    pub fn leave<A: 'static, L: Ledger + 'static>(
        self,
        council: &mut Council<A, L>,
    ) -> Result<(), CouncilError> {
        council.remove(self.member)
    }
}

impl<A: 'static, L: Ledger + 'static> Council<A, L> {
    pub fn new() -> Self {
        Self::with_config(CouncilConfig::default())
    }

    pub fn with_config(config: CouncilConfig) -> Self {
        Self {
            config,
            members: FxHashMap::default(),
            decorators: Vec::new(),
        }
    }

    /// Set the template decorators applied to every member added from now on.
    pub fn with_decorators(mut self, decorators: impl IntoIterator<Item = Decorator<A, L>>) -> Self {
        self.decorators = decorators.into_iter().collect();
        self
    }

    pub fn config(&self) -> &CouncilConfig {
        &self.config
    }

    // ═══════════════════════════════════════════════════════════════
    // Registration
    // ═══════════════════════════════════════════════════════════════

    pub fn add<M: Member<A, L> + 'static>(&mut self, member: M) -> MemberId {
        self.add_with(member, std::iter::empty())
    }

    /// Add a member wrapped in its own decorators (inside the template ones).
    pub fn add_with<M: Member<A, L> + 'static>(
        &mut self,
        member: M,
        decorators: impl IntoIterator<Item = Decorator<A, L>>,
    ) -> MemberId {
        let own: Vec<Decorator<A, L>> = decorators.into_iter().collect();
        let inner: Arc<dyn Member<A, L>> = Arc::new(member);
        let wrapped = decorate::apply(decorate::apply(inner, &own), &self.decorators);

        let handle = Handle::from_arc(wrapped);
        let id = handle.id();
        debug!(council = %self.config.name, member = %id, name = handle.name(), "member added");
        self.members.insert(id, handle);
        id
    }

    pub fn add_fn<F>(&mut self, name: &str, func: F) -> MemberId
    where
        F: Fn(&A, &RunState<A, L>) -> anyhow::Result<Outcome<A, L>> + Send + Sync + 'static,
    {
        self.add(FnMember::new(name, func))
    }

    pub fn add_fn_with<F>(
        &mut self,
        name: &str,
        func: F,
        decorators: impl IntoIterator<Item = Decorator<A, L>>,
    ) -> MemberId
    where
        F: Fn(&A, &RunState<A, L>) -> anyhow::Result<Outcome<A, L>> + Send + Sync + 'static,
    {
        self.add_with(FnMember::new(name, func), decorators)
    }

    pub fn remove(&mut self, member: MemberId) -> Result<(), CouncilError> {
        match self.members.remove(&member) {
            Some(handle) => {
                debug!(council = %self.config.name, member = %member, name = handle.name(), "member removed");
                Ok(())
            }
            None => Err(CouncilError::NotAMember { member }),
        }
    }

    /// Add a member until the returned ticket is used to leave.
    pub fn join<M: Member<A, L> + 'static>(&mut self, member: M) -> Ticket {
        Ticket {
            member: self.add(member),
        }
    }

    pub fn contains(&self, member: MemberId) -> bool {
        self.members.contains_key(&member)
    }

    pub fn member_ids(&self) -> impl Iterator<Item = MemberId> + '_ {
        self.members.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    // ═══════════════════════════════════════════════════════════════
    // Invocation
    // ═══════════════════════════════════════════════════════════════

    pub fn call(&self, args: A) -> Result<L::Output, CouncilError> {
        self.run(args, None).map(L::finish)
    }

    /// Like [`call`](Self::call), also returning the trace of the call.
    pub fn call_traced(&self, args: A) -> Result<(L::Output, CallTrace), CouncilError> {
        let mut trace = CallTrace::new();
        let result = self.run(args, Some(&mut trace))?;
        Ok((result.finish(), trace))
    }

    /// Call, then post-process the whole result.
    pub fn call_then<R>(&self, args: A, then: impl FnOnce(L::Output) -> R) -> Result<R, CouncilError> {
        self.call(args).map(then)
    }

    #[instrument(skip_all, fields(council = %self.config.name, members = self.members.len()))]
    fn run(&self, args: A, mut trace: Option<&mut CallTrace>) -> Result<L, CouncilError> {
        let mut state = RunState::new(args, self.members.values());
        note(&mut trace, TraceKind::CallStarted { members: self.members.len() });

        let mut invocations = 0usize;
        while let Some(handle) = state.next_member() {
            if let Some(limit) = self.config.max_invocations {
                if invocations >= limit {
                    return Err(CouncilError::InvocationLimit { limit });
                }
            }
            invocations += 1;

            let id = handle.id();
            debug!(member = %id, name = handle.name(), "invoking member");
            note(&mut trace, TraceKind::MemberInvoked { member: id, name: handle.name().to_string() });

            let action = handle
                .call(state.args(), &state)
                .map_err(|err| CouncilError::from_member(id, handle.name(), err))?
                .into_action()?;

            let described = trace.is_some().then(|| action.describe());
            let proceed = action.apply(id, &mut state)?;
            if let Some(action) = described {
                note(&mut trace, TraceKind::ActionApplied { member: id, action, proceed });
            }

            if !proceed {
                debug!(member = %id, "member stopped the call");
                note(&mut trace, TraceKind::CallStopped { member: id });
                break;
            }
        }

        note(
            &mut trace,
            TraceKind::CallCompleted { invocations, result_len: state.partial_result().len() },
        );
        debug!(invocations, "call finished");
        Ok(state.into_result())
    }
}

fn note(trace: &mut Option<&mut CallTrace>, kind: TraceKind) {
    if let Some(trace) = trace {
        trace.record(kind);
    }
}

impl<A, T> Council<A, Vec<T>>
where
    A: 'static,
    T: PartialEq + fmt::Debug + 'static,
{
    /// Call and fold the collected values, starting from `init`.
    pub fn fold<B>(&self, args: A, init: B, f: impl FnMut(B, T) -> B) -> Result<B, CouncilError> {
        self.call_then(args, |values| values.into_iter().fold(init, f))
    }

    /// Call and reduce the collected values. `None` if nothing was collected.
    pub fn reduce(&self, args: A, f: impl FnMut(T, T) -> T) -> Result<Option<T>, CouncilError> {
        self.call_then(args, |values| values.into_iter().reduce(f))
    }
}

impl<A: 'static, L: Ledger + 'static> Default for Council<A, L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, L: Ledger> fmt::Debug for Council<A, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Council")
            .field("name", &self.config.name)
            .field("members", &self.members.len())
            .field("decorators", &self.decorators.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;

    type Words = ListCouncil<u32, String>;

    #[test]
    fn empty_council_returns_empty_result() {
        let council = Words::new();
        assert!(council.call(1).unwrap().is_empty());
    }

    #[test]
    fn plain_values_are_collected() {
        let mut council = Words::new();
        council.add_fn("a", |x, _| Ok(Outcome::value(format!("a{x}"))));
        council.add_fn("b", |x, _| Ok(Outcome::value(format!("b{x}"))));

        let mut result = council.call(1).unwrap();
        result.sort();
        assert_eq!(result, vec!["a1", "b1"]);
    }

    #[test]
    fn remove_unknown_member_fails() {
        let mut council = Words::new();
        let id = council.add_fn("a", |_, _| Ok(Action::Continue.into()));
        council.remove(id).unwrap();
        assert!(matches!(council.remove(id), Err(CouncilError::NotAMember { member }) if member == id));
    }

    #[test]
    fn ticket_leave_removes_member() {
        let mut council = Words::new();
        let ticket = council.join(FnMember::new("temp", |_: &u32, _: &RunState<u32, Vec<String>>| {
            Ok(Outcome::value("temp".to_string()))
        }));
        assert_eq!(council.call(0).unwrap(), vec!["temp"]);

        let id = ticket.member();
        ticket.leave(&mut council).unwrap();
        assert!(!council.contains(id));
        assert!(council.call(0).unwrap().is_empty());
    }

    #[test]
    fn member_error_aborts_call() {
        let mut council = Words::new();
        council.add_fn("fails", |_, _| anyhow::bail!("member exploded"));
        let err = council.call(0).unwrap_err();
        assert!(matches!(err, CouncilError::MemberFailed { ref name, .. } if name == "fails"));
    }

    #[test]
    fn invocation_limit_stops_runaway_enqueue() {
        let mut council = Words::with_config(CouncilConfig::named("loop").with_max_invocations(5));
        council.add(Recur);
        let err = council.call(0).unwrap_err();
        assert!(matches!(err, CouncilError::InvocationLimit { limit: 5 }));
    }

    /// Enqueues a fresh copy of itself forever
    struct Recur;

    impl Member<u32, Vec<String>> for Recur {
        fn call(&self, _: &u32, _: &RunState<u32, Vec<String>>) -> anyhow::Result<Outcome<u32, Vec<String>>> {
            Ok(Action::enqueue([Handle::new(Recur)]).into())
        }
    }

    #[test]
    fn call_then_post_processes() {
        let mut council = Words::new();
        council.add_fn("a", |x, _| Ok(Outcome::value(x.to_string())));
        let joined = council.call_then(42, |values| values.concat()).unwrap();
        assert_eq!(joined, "42");
    }

    #[test]
    fn fold_and_reduce() {
        let mut council: ListCouncil<i64, i64> = Council::new();
        council.add_fn("x", |x, _| Ok(Outcome::value(*x)));
        council.add_fn("x2", |x, _| Ok(Outcome::value(x * 2)));
        council.add_fn("x3", |x, _| Ok(Outcome::value(x * 3)));

        assert_eq!(council.fold(2, 100, |acc, v| acc + v).unwrap(), 112);
        assert_eq!(council.reduce(2, |a, b| a.max(b)).unwrap(), Some(6));
        assert_eq!(ListCouncil::<i64, i64>::new().reduce(2, |a, b| a + b).unwrap(), None);
    }

    #[test]
    fn debug_shows_name_and_size() {
        let mut council = Words::with_config(CouncilConfig::named("debug-me"));
        council.add_fn("a", |_, _| Ok(Action::Continue.into()));
        let repr = format!("{council:?}");
        assert!(repr.contains("debug-me"));
        assert!(repr.contains("members: 1"));
    }
}
