//! Call trace
//!
//! Optional, append-only record of what happened during one council call:
//! which member ran, what it returned, and why the call ended. Owned by the
//! call that produced it.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CouncilError;
use crate::member::MemberId;

/// Single entry in a call trace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEvent {
    /// Monotonic sequence number within the call
    pub seq: u64,
    /// Time since the call started (µs)
    pub elapsed_us: u64,
    pub kind: TraceKind,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TraceKind {
    CallStarted {
        members: usize,
    },
    MemberInvoked {
        member: MemberId,
        name: String,
    },
    ActionApplied {
        member: MemberId,
        action: String,
        proceed: bool,
    },
    /// A member's action asked the call to stop
    CallStopped {
        member: MemberId,
    },
    CallCompleted {
        invocations: usize,
        result_len: usize,
    },
}

impl TraceKind {
    pub fn member(&self) -> Option<MemberId> {
        match self {
            Self::MemberInvoked { member, .. }
            | Self::ActionApplied { member, .. }
            | Self::CallStopped { member } => Some(*member),
            Self::CallStarted { .. } | Self::CallCompleted { .. } => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CallTrace {
    events: Vec<TraceEvent>,
    start: Instant,
}

impl CallTrace {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            start: Instant::now(),
        }
    }

    pub(crate) fn record(&mut self, kind: TraceKind) {
        let seq = self.events.len() as u64;
        self.events.push(TraceEvent {
            seq,
            elapsed_us: self.start.elapsed().as_micros() as u64,
            kind,
        });
    }

    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    pub fn for_member(&self, member: MemberId) -> Vec<&TraceEvent> {
        self.events
            .iter()
            .filter(|e| e.kind.member() == Some(member))
            .collect()
    }

    /// Members in the order they were invoked (repeats included)
    pub fn invocation_order(&self) -> Vec<MemberId> {
        self.events
            .iter()
            .filter_map(|e| match &e.kind {
                TraceKind::MemberInvoked { member, .. } => Some(*member),
                _ => None,
            })
            .collect()
    }

    pub fn stopped_by(&self) -> Option<MemberId> {
        self.events.iter().find_map(|e| match e.kind {
            TraceKind::CallStopped { member } => Some(member),
            _ => None,
        })
    }

    pub fn to_json(&self) -> Result<Value, CouncilError> {
        Ok(serde_json::to_value(&self.events)?)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl Default for CallTrace {
    fn default() -> Self {
        Self::new()
    }
}
