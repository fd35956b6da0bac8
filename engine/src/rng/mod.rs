//! Deterministic random number generation
//!
//! Uses the xorshift64* algorithm. Stochastic generators each own an
//! explicitly seeded `RngManager`.

mod xorshift;

pub use xorshift::RngManager;
