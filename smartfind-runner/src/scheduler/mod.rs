//! Scheduler layer
//!
//! Drives scan cycles on a fixed interval and carries the agent's memory
//! (seen listings, login failures, heartbeat) from one cycle to the next.

pub mod poller;

pub use poller::{CycleStatus, ScanPoller};
