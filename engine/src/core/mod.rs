//! Core time primitives

pub mod clock;
