//! Background job scheduling.
//!
//! Runs the periodic processing pass that delivers due automation events
//! when `[jobs]` is enabled in the configuration.

pub mod scheduler;

pub use scheduler::ProcessingScheduler;
