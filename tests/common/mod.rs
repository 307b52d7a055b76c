//! Common test utilities
//!
//! This module is shared across all integration tests

pub mod fixtures;
pub mod transport;

#[allow(unused_imports)]
pub use fixtures::{group_message, private_message, salary, TestEnvironment};
#[allow(unused_imports)]
pub use transport::{RecordingTransport, SentReply};
