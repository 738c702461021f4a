//! Fabroku - deploy client for the Fabroku platform
//!
//! Authenticates against the platform, checks that a project ships the
//! files its buildpacks need, triggers redeploys, and follows them until
//! they finish. Also diagnoses the GitHub webhook used for commit statuses.
//!
//! - [`deploy`]: app resolution, verification gate, trigger, and polling
//! - [`api`]: authenticated HTTP client for the platform
//! - [`git`]: local remote detection and URL normalization
//! - [`verify`]: required deployment files per app type
//! - [`login`]: local OAuth callback listener

pub mod api;
pub mod commands;
pub mod config;
pub mod deploy;
pub mod error;
pub mod git;
pub mod login;
pub mod shared;
pub mod ui;
pub mod verify;
