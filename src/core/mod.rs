//! Core domain models for the sequencer
//!
//! This module defines the data structures the execution engine works on:
//! steps, the step queue, events and handlers, state, errors, and
//! configuration.

pub mod config;
pub mod error;
pub mod event;
pub mod queue;
pub mod script;
pub mod state;
pub mod step;

pub use error::*;
pub use event::*;
pub use queue::*;
pub use state::*;
pub use step::*;
