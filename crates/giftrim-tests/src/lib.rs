//! Integration test crate for GifTrim.
//!
//! This crate exists solely to hold cross-crate integration tests.
//! It depends on every giftrim library crate to verify they work together.

#[cfg(test)]
mod pipeline;

#[cfg(test)]
mod history;

#[cfg(test)]
mod capture;
