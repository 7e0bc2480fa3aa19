//! Core domain logic for shift compliance checks.
//!
//! This crate contains the pure analysis over agent presence timelines:
//! - Grouping: splitting a fetched event stream into per-agent timelines
//! - Session reconstruction: turning `online`/`invisible` transitions into sessions
//! - Shift windows: mapping a session onto the odd-hour scheduling grid
//! - Classification: flagging late, too-early and early-leave sessions

mod analysis;
pub mod group;
pub mod presence;
pub mod session;
pub mod shift;
pub mod violation;

pub use analysis::{Analysis, analyze};
pub use group::{AgentTimeline, group_by_agent};
pub use presence::{AgentId, PresenceEvent, PresenceStatus, TimeRange, TimeRangeError};
pub use session::{Session, reconstruct_sessions};
pub use shift::{ComplianceConfig, ComplianceConfigError, ShiftWindow, round_down_to_odd_hour};
pub use violation::{Violation, ViolationKind, classify};
