//! Member actions
//!
//! An action is what a member returns to steer the call instead of (or in
//! addition to) contributing a value. The set is closed; composition goes
//! through [`Action::Joined`].
//!
//! Every action, once applied, answers one question: should the call go on?

use std::fmt;

use tracing::trace;

use crate::error::CouncilError;
use crate::ledger::Ledger;
use crate::member::{Handle, MemberId};
use crate::state::RunState;

/// Non-empty list of members to wait for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitFor(Vec<MemberId>);

impl WaitFor {
    pub fn new(members: impl IntoIterator<Item = MemberId>) -> Result<Self, CouncilError> {
        let members: Vec<MemberId> = members.into_iter().collect();
        if members.is_empty() {
            return Err(CouncilError::contract("must specify a member to wait for"));
        }
        Ok(Self(members))
    }

    pub fn one(member: MemberId) -> Self {
        Self(vec![member])
    }

    pub fn members(&self) -> &[MemberId] {
        &self.0
    }
}

pub enum Action<A, L: Ledger> {
    /// Contribute nothing
    Continue,
    /// Stop the call, keeping what has been collected
    Break,
    /// Run the listed members first, then run the current member again
    Postpone(WaitFor),
    /// Add members to this call's pending set
    Enqueue(Vec<Handle<A, L>>),
    /// Append every entry of every group
    Extend(Vec<Vec<L::Entry>>),
    /// Append entries as-is (the default-wrap of a plain value)
    Append(Vec<L::Entry>),
    /// Remove entries by equality
    RemoveResult(Vec<L::Entry>),
    /// Remove entries by position, negative positions wrap around
    PopResult(Vec<isize>),
    ClearResult,
    /// Apply every part in order
    Joined(Vec<Action<A, L>>),
}

impl<A, L: Ledger> Action<A, L> {
    pub fn postpone(members: impl IntoIterator<Item = MemberId>) -> Result<Self, CouncilError> {
        Ok(Self::Postpone(WaitFor::new(members)?))
    }

    /// Postpone until a single member has run
    pub fn after(member: MemberId) -> Self {
        Self::Postpone(WaitFor::one(member))
    }

    pub fn enqueue(members: impl IntoIterator<Item = Handle<A, L>>) -> Self {
        Self::Enqueue(members.into_iter().collect())
    }

    pub fn append(entries: impl IntoIterator<Item = L::Entry>) -> Self {
        Self::Append(entries.into_iter().collect())
    }

    pub fn pop(indices: impl IntoIterator<Item = isize>) -> Self {
        Self::PopResult(indices.into_iter().collect())
    }

    /// Compose two actions; see [`combine`].
    pub fn and(self, other: Self) -> Self {
        combine(self, other)
    }

    /// Compose with a plain value, wrapped through the ledger's default-wrap.
    pub fn and_value(self, value: L::Value) -> Result<Self, CouncilError> {
        Ok(combine(self, Self::Append(vec![L::admit(value)?])))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Continue => "continue",
            Self::Break => "break",
            Self::Postpone(_) => "postpone",
            Self::Enqueue(_) => "enqueue",
            Self::Extend(_) => "extend",
            Self::Append(_) => "append",
            Self::RemoveResult(_) => "remove_result",
            Self::PopResult(_) => "pop_result",
            Self::ClearResult => "clear_result",
            Self::Joined(_) => "joined",
        }
    }

    /// Short description for traces, e.g. `joined[append,break]`
    pub fn describe(&self) -> String {
        match self {
            Self::Joined(parts) => {
                let inner: Vec<String> = parts.iter().map(Self::describe).collect();
                format!("joined[{}]", inner.join(","))
            }
            other => other.kind().to_string(),
        }
    }

    /// Apply the action on behalf of `current`. Returns whether the call
    /// should continue.
    pub(crate) fn apply(
        self,
        current: MemberId,
        state: &mut RunState<A, L>,
    ) -> Result<bool, CouncilError> {
        match self {
            Self::Continue => Ok(true),
            Self::Break => Ok(false),
            Self::Postpone(wait_for) => {
                state.push_dependency(current);
                for dependency in wait_for.0 {
                    if !state.take_pending(dependency) {
                        return Err(CouncilError::DependencyUnavailable {
                            dependency,
                            member: current,
                        });
                    }
                    state.push_dependency(dependency);
                }
                Ok(true)
            }
            Self::Enqueue(handles) => {
                for handle in handles {
                    state.enqueue(handle);
                }
                Ok(true)
            }
            Self::Extend(groups) => {
                for entry in groups.into_iter().flatten() {
                    state.result_mut().record(entry);
                }
                Ok(true)
            }
            Self::Append(entries) => {
                for entry in entries {
                    state.result_mut().record(entry);
                }
                Ok(true)
            }
            Self::RemoveResult(entries) => {
                for entry in entries {
                    if !state.result_mut().retract(&entry) {
                        return Err(CouncilError::ResultNotFound {
                            value: format!("{entry:?}"),
                        });
                    }
                }
                Ok(true)
            }
            Self::PopResult(indices) => {
                pop_positions(state.result_mut(), &indices)?;
                Ok(true)
            }
            Self::ClearResult => {
                state.result_mut().clear();
                Ok(true)
            }
            Self::Joined(parts) => {
                // every part runs, even after one asks to stop
                let mut proceed = true;
                for part in parts {
                    proceed &= part.apply(current, state)?;
                }
                Ok(proceed)
            }
        }
    }
}

/// Remove entries by index, highest effective position first.
///
/// Valid indices lie in `-len..len`; negative ones count from the end, so
/// `-1` and `len - 1` name the same entry. Every index is checked against
/// the length before anything is removed. Two indices naming the same entry
/// fail like a second pop of a shrunk result would.
fn pop_positions<L: Ledger>(ledger: &mut L, indices: &[isize]) -> Result<(), CouncilError> {
    let len = ledger.len();
    let signed_len = len as isize;

    let mut positions = Vec::with_capacity(indices.len());
    for &index in indices {
        if index >= signed_len || index < -signed_len {
            return Err(CouncilError::ResultIndexOutOfRange { index, len });
        }
        positions.push((index.rem_euclid(signed_len) as usize, index));
    }
    positions.sort_unstable_by(|a, b| b.0.cmp(&a.0));

    if let Some(i) = positions.windows(2).position(|w| w[0].0 == w[1].0) {
        let index = positions[i + 1].1;
        return Err(CouncilError::ResultIndexOutOfRange { index, len: len - (i + 1) });
    }

    trace!(?positions, "popping result positions");
    for (position, _) in positions {
        ledger.remove_at(position);
    }
    Ok(())
}

/// Compose two actions into one [`Action::Joined`].
///
/// Joined operands are flattened, so composition never nests.
pub fn combine<A, L: Ledger>(first: Action<A, L>, second: Action<A, L>) -> Action<A, L> {
    match (first, second) {
        (Action::Joined(mut left), Action::Joined(right)) => {
            left.extend(right);
            Action::Joined(left)
        }
        (Action::Joined(mut left), other) => {
            left.push(other);
            Action::Joined(left)
        }
        (other, Action::Joined(right)) => {
            let mut parts = Vec::with_capacity(right.len() + 1);
            parts.push(other);
            parts.extend(right);
            Action::Joined(parts)
        }
        (left, right) => Action::Joined(vec![left, right]),
    }
}

impl<A, L: Ledger> fmt::Debug for Action<A, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Continue => f.write_str("Continue"),
            Self::Break => f.write_str("Break"),
            Self::Postpone(w) => f.debug_tuple("Postpone").field(&w.members()).finish(),
            Self::Enqueue(h) => f.debug_tuple("Enqueue").field(h).finish(),
            Self::Extend(g) => f.debug_tuple("Extend").field(g).finish(),
            Self::Append(e) => f.debug_tuple("Append").field(e).finish(),
            Self::RemoveResult(e) => f.debug_tuple("RemoveResult").field(e).finish(),
            Self::PopResult(i) => f.debug_tuple("PopResult").field(i).finish(),
            Self::ClearResult => f.write_str("ClearResult"),
            Self::Joined(p) => f.debug_tuple("Joined").field(p).finish(),
        }
    }
}
