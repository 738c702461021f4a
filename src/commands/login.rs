use anyhow::{Context, Result};
use colored::Colorize;

use crate::config::ConfigStore;
use crate::login::{CALLBACK_TIMEOUT, CallbackOutcome, CallbackServer, login_url};

/// `fabroku login`
pub async fn login(store: &ConfigStore, api_url: Option<&str>) -> Result<()> {
    let session = store.load()?;

    if session.is_authenticated() {
        let again = dialoguer::Confirm::new()
            .with_prompt("You are already logged in. Log in again?")
            .default(false)
            .interact()
            .context("Failed to read confirmation")?;
        if !again {
            return Ok(());
        }
    }

    let base_url = api_url.unwrap_or(&session.api_url).to_string();
    let server = CallbackServer::bind().await?;
    let url = login_url(&base_url, server.port())?;

    println!("\nOpening the browser to authenticate...");
    println!("   URL: {}", url.as_str().dimmed());
    println!("   Waiting for the callback on port {}...\n", server.port());

    if let Err(e) = open::that(url.as_str()) {
        tracing::warn!(error = %e, "Failed to open browser");
        println!("   Could not open a browser; open the URL above manually.\n");
    }

    match server.wait(CALLBACK_TIMEOUT).await? {
        Some(CallbackOutcome::Authenticated { token, user }) => {
            let saved = store.set_credentials(&token, &user, Some(&base_url))?;
            tracing::info!(user = %user, api_url = %saved.api_url, "Logged in");
            println!("✓ Authenticated as {}", user.green().bold());
            println!("   Token saved to {}\n", store.path().display());
        }
        Some(CallbackOutcome::Rejected { error, message }) => {
            println!("{}", format!("✗ Error: {}: {}", error, message).red());
        }
        None => {
            println!(
                "{}",
                format!(
                    "✗ Timeout: authentication was not completed within {} minutes.",
                    CALLBACK_TIMEOUT.as_secs() / 60
                )
                .red()
            );
        }
    }

    Ok(())
}

/// `fabroku logout`
pub fn logout(store: &ConfigStore) -> Result<()> {
    if !store.load()?.is_authenticated() {
        println!("You are not logged in.");
        return Ok(());
    }

    store.clear_credentials()?;
    println!("Session ended.");
    Ok(())
}
