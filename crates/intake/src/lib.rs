//! A project-intake assistant: it reads a short project description, asks
//! one focused follow-up question at a time and ends with a consolidated
//! summary.
//!
//! The crate includes a CLI tool for using in the terminal. The interview
//! flow and the preset agent panels can also be used as a library.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod interview;
mod panels;

pub use interview::{Interview, QuestionStyle, ROUNDS};
pub use panels::{default_panel, specialist_panel};

/// Re-exports of [`intake_core`] crate.
pub mod core {
    pub use intake_core::*;
}
