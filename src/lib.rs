//! Council - pluggable aggregation engine
//!
//! A council invokes a set of independent members as one call. Each member
//! returns either a plain value, which is collected, or an [`Action`] that
//! reshapes the rest of the call: postpone until other members ran, enqueue
//! extra members, edit the collected result, or stop early.

pub mod action;
pub mod config;
pub mod council;
pub mod decorate;
pub mod error;
pub mod ledger;
pub mod member;
pub mod state;
pub mod trace;

pub use action::{combine, Action, WaitFor};
pub use config::CouncilConfig;
pub use council::{Council, ListCouncil, MapCouncil, Ticket};
pub use decorate::Decorator;
pub use error::{CouncilError, FixSuggestion};
pub use ledger::{IntoPair, Ledger, MapLedger};
pub use member::{FnMember, Handle, Member, MemberId, Outcome};
pub use state::RunState;
pub use trace::{CallTrace, TraceEvent, TraceKind};
