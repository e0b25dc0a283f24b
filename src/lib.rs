//! saltnorm: Salt state results and minion logs to a Sal checkin report.
//!
//! ```text
//! state return ──► normalizer ──► results file ──┐
//!                                                ├──► checkin ──► Sal
//! minion log ────► parsers::minion ──────────────┘
//! ```
//!
//! The `return` stage runs right after a highstate; the `checkin` stage runs
//! during Sal's checkin and adds the log messages of that run's process.

pub mod checkin;
pub mod config;
pub mod error;
pub mod facts;
pub mod normalizer;
pub mod output;
pub mod parsers;
pub mod returner;
pub mod timestamp;
pub mod types;

pub use types::{CheckinReport, ManagedItem, Message, MessageType, Status};
