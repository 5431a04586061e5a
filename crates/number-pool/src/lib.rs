//! Leasable phone number pool.
//!
//! Numbers enter the pool as available, are claimed under an exclusive
//! lease while being watched for an OTP, and are either released back
//! (no OTP inside the window) or retired permanently (OTP confirmed).

mod error;
mod pool;
mod types;

pub use error::PoolError;
pub use pool::{MemoryPool, NumberPool};
pub use types::Number;
