//! Subcommand implementations for `fj`.

pub mod inspect;
pub mod lower;

pub use inspect::{inspect_command, InspectArgs};
pub use lower::{lower_command, LowerArgs, LowerSummary};
