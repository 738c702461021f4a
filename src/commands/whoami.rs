use anyhow::Result;
use colored::Colorize;

use super::authenticated_client;
use crate::config::Session;

/// `fabroku whoami`
///
/// Only a missing local token fails; a rejected token is reported but not fatal.
pub async fn whoami(session: &Session) -> Result<()> {
    let api = authenticated_client(session)?;

    println!(
        "\nLogged in as: {}",
        session.user.as_deref().unwrap_or("?").green().bold()
    );
    println!("   API: {}", session.api_url.dimmed());

    match api.current_user().await {
        Ok(user) => {
            println!("   Email: {}", user.email.as_deref().unwrap_or("-"));
            if user.is_fabric {
                println!("   Fabric member");
            }
            if user.is_superuser {
                println!("   Administrator");
            }
            println!("{}", "   ✓ Token valid\n".green());
        }
        Err(e) if e.is_unauthorized() => {
            println!("{}", "   ✗ Token expired or invalid\n".red());
        }
        Err(e) => {
            tracing::debug!(error = %e, "Token check failed");
            println!("{}", format!("   ⚠  Could not verify: {}\n", e).yellow());
        }
    }

    Ok(())
}
