//! Member decorators
//!
//! A decorator wraps a member into another member. Councils apply them at
//! registration: first the per-member list, then the council-wide template.
//! Within a list, the first decorator is the outermost wrapper.

use std::sync::Arc;

use crate::action::Action;
use crate::ledger::Ledger;
use crate::member::{Member, MemberId, Outcome};
use crate::state::RunState;

pub type Decorator<A, L> =
    Arc<dyn Fn(Arc<dyn Member<A, L>>) -> Arc<dyn Member<A, L>> + Send + Sync>;

type Predicate<L> = Arc<dyn Fn(&<L as Ledger>::Value) -> bool + Send + Sync>;

/// Wrap `member` with `decorators`, first decorator outermost.
pub fn apply<A, L: Ledger>(
    member: Arc<dyn Member<A, L>>,
    decorators: &[Decorator<A, L>],
) -> Arc<dyn Member<A, L>> {
    decorators
        .iter()
        .rev()
        .fold(member, |inner, decorator| decorator(inner))
}

/// Run only once `dependency` has run (if it is still pending).
pub fn after<A: 'static, L: Ledger + 'static>(dependency: MemberId) -> Decorator<A, L> {
    Arc::new(move |inner: Arc<dyn Member<A, L>>| {
        Arc::new(AlwaysAfter { inner, dependency }) as Arc<dyn Member<A, L>>
    })
}

/// Run after every member still pending.
///
/// The members it waits for run in registration order.
pub fn last<A: 'static, L: Ledger + 'static>() -> Decorator<A, L> {
    Arc::new(|inner: Arc<dyn Member<A, L>>| Arc::new(AlwaysLast { inner }) as Arc<dyn Member<A, L>>)
}

/// A plain value matching `predicate` is collected, then the call stops.
pub fn break_when<A, L, F>(predicate: F) -> Decorator<A, L>
where
    A: 'static,
    L: Ledger + 'static,
    F: Fn(&L::Value) -> bool + Send + Sync + 'static,
{
    let predicate: Predicate<L> = Arc::new(predicate);
    Arc::new(move |inner: Arc<dyn Member<A, L>>| {
        Arc::new(BreakWhen {
            inner,
            predicate: Arc::clone(&predicate),
        }) as Arc<dyn Member<A, L>>
    })
}

/// A plain value matching `predicate` is dropped.
pub fn continue_when<A, L, F>(predicate: F) -> Decorator<A, L>
where
    A: 'static,
    L: Ledger + 'static,
    F: Fn(&L::Value) -> bool + Send + Sync + 'static,
{
    let predicate: Predicate<L> = Arc::new(predicate);
    Arc::new(move |inner: Arc<dyn Member<A, L>>| {
        Arc::new(ContinueWhen {
            inner,
            predicate: Arc::clone(&predicate),
        }) as Arc<dyn Member<A, L>>
    })
}

struct AlwaysAfter<A, L: Ledger> {
    inner: Arc<dyn Member<A, L>>,
    dependency: MemberId,
}

impl<A, L: Ledger> Member<A, L> for AlwaysAfter<A, L> {
    fn call(&self, args: &A, state: &RunState<A, L>) -> anyhow::Result<Outcome<A, L>> {
        if state.is_pending(self.dependency) {
            return Ok(Action::after(self.dependency).into());
        }
        self.inner.call(args, state)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

struct AlwaysLast<A, L: Ledger> {
    inner: Arc<dyn Member<A, L>>,
}

impl<A, L: Ledger> Member<A, L> for AlwaysLast<A, L> {
    fn call(&self, args: &A, state: &RunState<A, L>) -> anyhow::Result<Outcome<A, L>> {
        if state.pending_len() > 0 {
            // highest id pushed first, so the earliest registered runs first
            let mut waiting: Vec<MemberId> = state.pending().collect();
            waiting.sort_unstable_by(|a, b| b.cmp(a));
            return Ok(Action::postpone(waiting)?.into());
        }
        self.inner.call(args, state)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

struct BreakWhen<A, L: Ledger> {
    inner: Arc<dyn Member<A, L>>,
    predicate: Predicate<L>,
}

impl<A, L: Ledger> Member<A, L> for BreakWhen<A, L> {
    fn call(&self, args: &A, state: &RunState<A, L>) -> anyhow::Result<Outcome<A, L>> {
        match self.inner.call(args, state)? {
            Outcome::Value(value) if (self.predicate)(&value) => {
                let collect = Action::Append(vec![L::admit(value)?]);
                Ok(collect.and(Action::Break).into())
            }
            other => Ok(other),
        }
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

struct ContinueWhen<A, L: Ledger> {
    inner: Arc<dyn Member<A, L>>,
    predicate: Predicate<L>,
}

impl<A, L: Ledger> Member<A, L> for ContinueWhen<A, L> {
    fn call(&self, args: &A, state: &RunState<A, L>) -> anyhow::Result<Outcome<A, L>> {
        match self.inner.call(args, state)? {
            Outcome::Value(value) if (self.predicate)(&value) => Ok(Action::Continue.into()),
            other => Ok(other),
        }
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
