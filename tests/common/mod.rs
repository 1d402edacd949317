//! Integration test common infrastructure.
//!
//! Provides a recording chat client, a standard community fixture, and
//! helpers for building inbound messages.

pub mod client;
pub mod community;

#[allow(unused_imports)]
pub use client::{Call, MockClient};
#[allow(unused_imports)]
pub use community::*;
