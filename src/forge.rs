//! Interface to the Gitea API used by the release workflow.
//!
//! The orchestrator only talks to the [`traits::Forge`] trait, which keeps
//! HTTP concerns inside [`gitea`] and lets tests substitute a mock.

/// Connection configuration and forge constants.
pub mod config;

/// Gitea and Forgejo API client implementation.
pub mod gitea;

/// Normalized request and response types.
pub mod request;

/// Forge abstraction used by the orchestrator.
pub mod traits;
