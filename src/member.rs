//! Members: the units of work a council invokes
//!
//! A member is identified by its [`MemberId`], never by what it does. Two
//! members wrapping the same closure are still two members.

use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::error::CouncilError;
use crate::ledger::Ledger;
use crate::state::RunState;

static NEXT_MEMBER_ID: AtomicU64 = AtomicU64::new(1);

/// Stable, process-unique handle for a member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(pub(crate) u64);

impl MemberId {
    fn next() -> Self {
        Self(NEXT_MEMBER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a member hands back to the engine
pub enum Outcome<A, L: Ledger> {
    /// A plain value, wrapped by the ledger's default-wrap
    Value(L::Value),
    /// An explicit action
    Directive(Action<A, L>),
}

impl<A, L: Ledger> Outcome<A, L> {
    pub fn value(value: L::Value) -> Self {
        Self::Value(value)
    }

    /// `None` opts out of contributing (Continue), `Some` is a plain value.
    pub fn from_option(value: Option<L::Value>) -> Self {
        match value {
            Some(v) => Self::Value(v),
            None => Self::Directive(Action::Continue),
        }
    }

    /// Resolve to an action, applying the default-wrap to plain values.
    pub fn into_action(self) -> Result<Action<A, L>, CouncilError> {
        match self {
            Self::Value(v) => Ok(Action::Append(vec![L::admit(v)?])),
            Self::Directive(action) => Ok(action),
        }
    }

    pub fn is_directive(&self) -> bool {
        matches!(self, Self::Directive(_))
    }
}

impl<A, L: Ledger> From<Action<A, L>> for Outcome<A, L> {
    fn from(action: Action<A, L>) -> Self {
        Self::Directive(action)
    }
}

impl<A, L: Ledger> fmt::Debug for Outcome<A, L>
where
    L::Value: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Self::Directive(a) => f.debug_tuple("Directive").field(a).finish(),
        }
    }
}

/// A unit of work.
///
/// `args` is the value the council was called with. `state` is the live run
/// state, read-only: the only way to change it is through the returned
/// [`Outcome`].
pub trait Member<A, L: Ledger>: Send + Sync {
    fn call(&self, args: &A, state: &RunState<A, L>) -> anyhow::Result<Outcome<A, L>>;

    /// Label used in logs and traces
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// A member together with its identity
pub struct Handle<A, L: Ledger> {
    id: MemberId,
    member: Arc<dyn Member<A, L>>,
}

impl<A, L: Ledger> Handle<A, L> {
    pub fn new<M>(member: M) -> Self
    where
        M: Member<A, L> + 'static,
    {
        Self::from_arc(Arc::new(member))
    }

    pub fn from_arc(member: Arc<dyn Member<A, L>>) -> Self {
        Self {
            id: MemberId::next(),
            member,
        }
    }

    pub fn id(&self) -> MemberId {
        self.id
    }

    pub fn name(&self) -> &str {
        self.member.name()
    }

    pub(crate) fn call(&self, args: &A, state: &RunState<A, L>) -> anyhow::Result<Outcome<A, L>> {
        self.member.call(args, state)
    }
}

impl<A, L: Ledger> Clone for Handle<A, L> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            member: Arc::clone(&self.member),
        }
    }
}

impl<A, L: Ledger> fmt::Debug for Handle<A, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("id", &self.id)
            .field("name", &self.member.name())
            .finish()
    }
}

/// Adapts a closure into a [`Member`]
pub struct FnMember<A, L, F> {
    name: String,
    func: F,
    _marker: PhantomData<fn(&A) -> L>,
}

impl<A, L, F> FnMember<A, L, F>
where
    L: Ledger,
    F: Fn(&A, &RunState<A, L>) -> anyhow::Result<Outcome<A, L>> + Send + Sync,
{
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
            _marker: PhantomData,
        }
    }
}

impl<A, L, F> Member<A, L> for FnMember<A, L, F>
where
    L: Ledger,
    F: Fn(&A, &RunState<A, L>) -> anyhow::Result<Outcome<A, L>> + Send + Sync,
{
    fn call(&self, args: &A, state: &RunState<A, L>) -> anyhow::Result<Outcome<A, L>> {
        (self.func)(args, state)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
