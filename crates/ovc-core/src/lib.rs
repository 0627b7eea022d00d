//! # ovc-core
//!
//! Core types and plumbing for talking to a SimpliVity OmniStack Virtual
//! Controller (OVC).
//!
//! This crate owns everything below the resource layer: the shared bearer-token
//! session, the HTTP transport with its single refresh-and-retry policy, and the
//! task poller that turns an asynchronous server-side operation into a single
//! awaited result.
//!
//! ## Modules
//!
//! - [`error`] - Error taxonomy shared by every layer
//! - [`id`] - Strongly-typed identifiers for OVC resources
//! - [`config`] - Serializable client configuration
//! - [`de`] - Serde helpers for null-tolerant decoding
//! - [`client`] - HTTP client settings, poll policy and protocol constants
//! - [`query`] - Query string construction for list endpoints
//! - [`session`] - Bearer token storage and password-grant refresh
//! - [`transport`] - Request execution and status classification
//! - [`task`] - Task model and the completion poller

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod de;
pub mod error;
pub mod id;
pub mod query;
pub mod session;
pub mod task;
pub mod transport;

// Re-export commonly used types
pub use error::{Error, Result};
pub use tokio_util::sync::CancellationToken;
