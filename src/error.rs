//! Error types with fix suggestions

use thiserror::Error;

use crate::member::MemberId;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

/// Everything that can abort a council call.
///
/// None of these are retried or recovered inside the engine. A call that
/// fails discards its run state, including any partial result.
#[derive(Error, Debug)]
pub enum CouncilError {
    // ─────────────────────────────────────────────────────────────
    // Member contract errors (COUNCIL-001 to COUNCIL-004)
    // ─────────────────────────────────────────────────────────────
    #[error("COUNCIL-001: Contract violation: {reason}")]
    ContractViolation { reason: String },

    #[error("COUNCIL-002: Member {name} ({member}) failed: {source}")]
    MemberFailed {
        member: MemberId,
        name: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    #[error("COUNCIL-003: Member {member} cannot wait for {dependency}: dependency not pending")]
    DependencyUnavailable {
        dependency: MemberId,
        member: MemberId,
    },

    #[error("COUNCIL-004: Invocation limit of {limit} reached")]
    InvocationLimit { limit: usize },

    // ─────────────────────────────────────────────────────────────
    // Result errors (COUNCIL-010 to COUNCIL-011)
    // ─────────────────────────────────────────────────────────────
    #[error("COUNCIL-010: Value {value} not present in the result")]
    ResultNotFound { value: String },

    #[error("COUNCIL-011: Cannot pop index {index} from a result of length {len}")]
    ResultIndexOutOfRange { index: isize, len: usize },

    // ─────────────────────────────────────────────────────────────
    // Registry errors (COUNCIL-020)
    // ─────────────────────────────────────────────────────────────
    #[error("COUNCIL-020: {member} is not a member of this council")]
    NotAMember { member: MemberId },

    // ─────────────────────────────────────────────────────────────
    // Configuration
    // ─────────────────────────────────────────────────────────────
    #[error("Config parse error: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CouncilError {
    pub(crate) fn contract(reason: impl Into<String>) -> Self {
        Self::ContractViolation {
            reason: reason.into(),
        }
    }

    /// Wrap an error raised by a member.
    ///
    /// A `CouncilError` raised from inside a member (for example by a
    /// decorator applying the default-wrap) is surfaced as itself.
    pub(crate) fn from_member(member: MemberId, name: &str, err: anyhow::Error) -> Self {
        match err.downcast::<CouncilError>() {
            Ok(inner) => inner,
            Err(other) => Self::MemberFailed {
                member,
                name: name.to_string(),
                source: other.into(),
            },
        }
    }
}

impl FixSuggestion for CouncilError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            CouncilError::ContractViolation { .. } => Some(
                "Check what the member returns: map councils expect a key/value pair, Postpone needs at least one member",
            ),
            CouncilError::MemberFailed { .. } => None,
            CouncilError::DependencyUnavailable { .. } => Some(
                "Only postpone on members that are still pending (not run, not already postponed)",
            ),
            CouncilError::InvocationLimit { .. } => {
                Some("Raise max_invocations or check for members that enqueue each other forever")
            }
            CouncilError::ResultNotFound { .. } => {
                Some("Only remove values that an earlier member contributed")
            }
            CouncilError::ResultIndexOutOfRange { .. } => {
                Some("Pop indices must lie in -len..len and name distinct entries")
            }
            CouncilError::NotAMember { .. } => Some("Use the MemberId returned by add()"),
            CouncilError::Config(_) => Some("Check YAML syntax: indentation and quoting"),
            CouncilError::Io(_) => Some("Check file path and permissions"),
            CouncilError::Json(_) => Some("Trace and result values must serialize to JSON"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_code() {
        let err = CouncilError::ResultIndexOutOfRange { index: -1, len: 0 };
        assert_eq!(
            err.to_string(),
            "COUNCIL-011: Cannot pop index -1 from a result of length 0"
        );
    }

    #[test]
    fn member_error_is_wrapped() {
        let err = CouncilError::from_member(MemberId(7), "flaky", anyhow::anyhow!("boom"));
        match err {
            CouncilError::MemberFailed { member, name, source } => {
                assert_eq!(member, MemberId(7));
                assert_eq!(name, "flaky");
                assert_eq!(source.to_string(), "boom");
            }
            other => panic!("expected MemberFailed, got {other:?}"),
        }
    }

    #[test]
    fn council_error_from_member_is_unwrapped() {
        let raised = anyhow::Error::from(CouncilError::contract("not a pair"));
        let err = CouncilError::from_member(MemberId(1), "m", raised);
        assert!(matches!(err, CouncilError::ContractViolation { .. }));
    }

    #[test]
    fn suggestions_exist_for_engine_errors() {
        let err = CouncilError::DependencyUnavailable {
            dependency: MemberId(2),
            member: MemberId(1),
        };
        assert!(err.fix_suggestion().is_some());
        assert!(err.to_string().contains("#2"));
    }

    #[test]
    fn contract_suggestion_covers_every_cause() {
        let err = CouncilError::contract("must specify a member to wait for");
        let fix = err.fix_suggestion().unwrap();
        assert!(fix.contains("key/value pair"));
        assert!(fix.contains("Postpone"));
    }

    #[test]
    fn json_error_converts() {
        let raw = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = CouncilError::from(raw);
        assert!(err.to_string().starts_with("JSON error:"));
        assert!(err.fix_suggestion().is_some());
    }
}
