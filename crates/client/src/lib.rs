//! Client code for tailr.
//!
//! This crate provides the HTTP client for the external generative backend
//! and implements `tailr_core::Generator` on top of it.

pub mod messages;

pub use messages::{GenerationClient, GenerationConfig, GenerationError};
