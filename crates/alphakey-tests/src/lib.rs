//! Integration test crate for AlphaKey.
//!
//! This crate exists solely to hold cross-crate integration tests.
//! It depends on every alphakey library crate to verify they work together.

#[cfg(test)]
mod formats;

#[cfg(test)]
mod pipeline;
