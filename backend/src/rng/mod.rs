//! Deterministic random number generation
//!
//! Uses xorshift64* for fast, deterministic random number generation.
//! All randomness in the generator and analyzer goes through this module.

mod xorshift;

pub use xorshift::{RngManager, SharedRng};
