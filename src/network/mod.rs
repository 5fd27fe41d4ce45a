//! Point discovery and polling
//!
//! The controller turns the panel's address space into a list of live
//! points, then re-queries that list on a fixed period.

mod discovery;

pub use self::discovery::{Controller, ControllerConfig, PointReport};
