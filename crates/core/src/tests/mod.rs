//! Test harnesses shared with downstream crates
//!
//! Enabled for this crate's own tests and, through the `tests` feature, for
//! crates that provide their own [`StorageTier`](crate::StorageTier).


pub use storage::StorageTierTestSuite;
