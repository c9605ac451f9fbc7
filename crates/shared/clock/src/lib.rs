//! Live Data Clock Infrastructure
//!
//! Provides time abstractions for production and tests:
//!
//! - `SystemClock`: wall-clock time
//! - `ManualClock`: frozen time that only moves when told to, so that
//!   subscription expiry can be tested without sleeping
//!
//! ## Usage
//!
//! ```ignore
//! use livedata_clock::{Clock, ManualClock};
//! use chrono::Duration;
//!
//! let clock = ManualClock::new(None);
//! let before = clock.now();
//! clock.advance(Duration::minutes(5));
//! assert_eq!(clock.now() - before, Duration::minutes(5));
//! ```

mod manual;
mod system;

pub use manual::ManualClock;
pub use system::SystemClock;

// Re-export the Clock trait for convenience
pub use livedata_ports::Clock;
