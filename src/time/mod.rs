//! Timing primitives
//!
//! The discovery/polling loop and the transport's reply timeout are both
//! driven by the same non-blocking [`Clock`].

mod clock;

pub use self::clock::Clock;
