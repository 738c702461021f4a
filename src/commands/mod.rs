//! Subcommand implementations
//!
//! Each command renders its own output and returns a [`CliError`] (wrapped
//! in `anyhow`) for anything that must end the process with a failure.

use crate::api::ApiClient;
use crate::config::Session;
use crate::error::CliError;

mod apps;
mod deploy;
mod login;
mod verify;
mod webhook;
mod whoami;

pub use apps::{apps, filter_by_project};
pub use deploy::deploy;
pub use login::{login, logout};
pub use verify::verify;
pub use webhook::webhook;
pub use whoami::whoami;

/// API client for a session that holds a token
pub fn authenticated_client(session: &Session) -> Result<ApiClient, CliError> {
    if !session.is_authenticated() {
        return Err(CliError::AuthenticationRequired);
    }
    Ok(ApiClient::new(session)?)
}
