//! Common test infrastructure
//!
//! This module provides all the infrastructure needed for end-to-end tests:
//! stub external services (catalog, chat completion, TTS) and a TestServer
//! that wires the real app against them. Tests should only import from this
//! module, not from internal submodules.
#![allow(dead_code)]

mod client;
mod constants;
mod server;
mod stubs;

// Public API - this is what tests import
pub use client::TestClient;
pub use constants::*;
pub use server::TestServer;
pub use stubs::{StubBehavior, StubServer, StubTrack};
