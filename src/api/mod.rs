//! Client for the Fabroku platform API

mod client;
mod error;

pub use client::{ApiClient, DeployApi, REQUEST_TIMEOUT};
pub use error::ApiError;
