//! An abstraction layer for chat-completion backends.
//!
//! This crate establishes a unified protocol for the intake engine to
//! talk to any supported LLM, so that the conversation logic can switch
//! between backends (or a scripted fake in tests) without modification.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that the implementors should adhere to.

#![deny(missing_docs)]

mod error;
mod provider;
mod request;
mod response;

pub use error::*;
pub use provider::*;
pub use request::*;
pub use response::*;
