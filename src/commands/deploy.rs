use anyhow::Result;
use colored::Colorize;

use super::authenticated_client;
use crate::config::Session;
use crate::deploy::{DeployOptions, Deployer};
use crate::ui::{DASHBOARD_URL, TerminalReporter};
use crate::verify::FileGate;

/// `fabroku deploy`
pub async fn deploy(session: &Session, options: DeployOptions) -> Result<()> {
    let api = authenticated_client(session)?;
    let gate = FileGate;
    let mut reporter = TerminalReporter::new();

    let report = Deployer::new(&api, &gate)
        .run(&options, &mut reporter)
        .await?;

    if !report.waited {
        println!("\n   {}", no_wait_hint());
        return Ok(());
    }

    println!("{}", "\n✓ Deploy completed successfully!".green().bold());
    if let Some(url) = report.app.public_url() {
        println!("   {}", url.cyan());
    }

    Ok(())
}

// There is no status command; re-running `deploy` would queue another redeploy.
fn no_wait_hint() -> String {
    format!(
        "Deploy queued. Follow its progress in the dashboard: {}",
        DASHBOARD_URL.dimmed()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_wait_hint_points_to_dashboard() {
        colored::control::set_override(false);
        let hint = no_wait_hint();
        assert!(hint.contains(DASHBOARD_URL));
        assert!(!hint.contains("fabroku deploy"));
    }
}
