//! GitLab infrastructure adapter for scm-bridge.
//!
//! Implements the [`scm::ScmAdapter`] port against the GitLab v4 REST API.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** This crate must not contain domain rules. Address
//! grammar, status and permission tables, and checkout-script synthesis come
//! from [`scm`]; this crate supplies GitLab paths, payload shapes and the
//! resilience wrapper around the network.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`config`] | `GitLabConfig`, `BreakerConfig` |
//! | [`transport`] | `Transport` port, `ReqwestTransport` |
//! | [`breaker`] | `CircuitBreaker` state machine |
//! | [`client`] | `ResilientClient`: breaker + response classification |
//! | [`api`] | Endpoint paths and response DTOs |
//! | [`hooks`] | Webhook normalization |
//! | [`adapter`] | `GitLabScm` |
//! | `fake` | `FakeTransport` (feature `test-support`) |

pub mod adapter;
pub mod api;
pub mod breaker;
pub mod client;
pub mod config;
pub mod hooks;
pub mod transport;

#[cfg(any(test, feature = "test-support"))]
mod fake;

pub use adapter::GitLabScm;
pub use breaker::{CircuitBreaker, Outcome, Permit};
pub use client::{ApiResponse, CallId, ResilientClient};
pub use config::{BreakerConfig, GitLabConfig};
pub use transport::{
    ApiRequest, HttpMethod, RawResponse, ReqwestTransport, ResponseBody, Transport,
    TransportError,
};

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeTransport;
