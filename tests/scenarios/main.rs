//! Scenario-based tests for the sequencer

mod helpers;

mod chaining;
mod extension;
mod failure_handling;
