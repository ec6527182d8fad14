//! Command handlers.
//!
//! Each handler receives the [`CliContext`](crate::CliContext) and the
//! arguments of its subcommand.

#[cfg(feature = "local-audio")]
pub mod devices;
pub mod speak;
#[cfg(feature = "local-audio")]
pub mod talk;
pub mod transcribe;
