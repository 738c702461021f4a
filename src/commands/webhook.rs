use anyhow::Result;
use colored::Colorize;

use super::authenticated_client;
use crate::api::{ApiClient, DeployApi};
use crate::config::Session;
use crate::error::CliError;
use crate::shared::{Check, SetupStatus, WebhookChecks};

/// `fabroku webhook`
pub async fn webhook(session: &Session, app_id: Option<&str>, setup: bool, test: bool) -> Result<()> {
    let api = authenticated_client(session)?;

    let Some(app_id) = app_id else {
        return list_apps(&api).await;
    };

    println!(
        "{}",
        format!("\nWebhook diagnosis - App #{}\n", app_id).cyan().bold()
    );

    let diag = api.diagnose_webhook(app_id).await.map_err(CliError::from)?;

    println!(
        "{} {} ({})",
        "App:".bold(),
        diag.app.name,
        diag.app.git.as_deref().unwrap_or("N/A")
    );
    println!("{} {}", "Branch:".bold(), diag.app.branch.as_deref().unwrap_or("-"));
    println!(
        "{} {}",
        "Webhook URL:".bold(),
        diag.webhook_url.as_deref().unwrap_or("-")
    );
    println!();

    let checks = &diag.checks;
    render_check("Public BACKEND_URL", &checks.backend_url_public);
    render_check("Your git_token", &checks.user_git_token);
    render_check("Project token", &checks.project_git_token);
    render_check("Parseable git URL", &checks.git_url_parseable);
    if let Some(check) = &checks.webhook_exists {
        render_check("Webhook on GitHub", check);
    }
    if let Some(check) = &checks.last_commit {
        render_check("Last commit", check);
        if let Some(sha) = &check.sha {
            println!("    {} {}", "SHA:".dimmed(), sha);
        }
    }
    println!();

    if checks.all_ok() {
        println!(
            "{} If the status still does not show up, check the worker logs on the server.",
            "✓ Everything looks OK!".green().bold()
        );
    } else {
        render_suggestions(checks);
        if checks.needs_webhook_repair() {
            setup_webhook(&api, app_id).await;
        }
    }

    if setup {
        println!();
        setup_webhook(&api, app_id).await;
    }

    if test {
        println!();
        test_commit_status(&api, app_id).await;
    }

    Ok(())
}

async fn list_apps(api: &ApiClient) -> Result<()> {
    println!("{}", "Fetching apps...".cyan());
    let apps = api.list_apps().await.map_err(CliError::from)?;

    if apps.is_empty() {
        println!("{}", "No apps found.".yellow());
        return Ok(());
    }

    println!("{}", "\nYour apps:".bold());
    for app in &apps {
        println!(
            "  {} - {} ({})",
            app.id.cyan(),
            app.name,
            app.git.as_deref().unwrap_or("no git")
        );
    }
    println!("{}", "\nUse: fabroku webhook <app_id>  to diagnose".dimmed());
    Ok(())
}

fn render_check(label: &str, check: &Check) {
    let icon = if check.ok { "✓".green() } else { "✗".red() };
    println!(
        "  {} {}: {}",
        icon,
        label.bold(),
        check.message.as_deref().unwrap_or("")
    );

    if !check.ok
        && let Some(value) = &check.value
    {
        println!("    {} {}", "Current value:".dimmed(), value);
    }
    if let Some(expected) = &check.expected_url {
        println!("    {} {}", "Expected URL:".dimmed(), expected);
    }
    if !check.all_hooks.is_empty() {
        println!("    {}", "Webhooks on the repo:".dimmed());
        for hook in &check.all_hooks {
            let active = if hook.active {
                "active".green()
            } else {
                "inactive".red()
            };
            println!("      - ID {}: {} [{}]", hook.id, hook.url, active);
        }
    }
    if !check.fabroku_statuses.is_empty() {
        println!("    {}", "Latest fabroku/deploy statuses:".dimmed());
        for status in &check.fabroku_statuses {
            let state = match status.state.as_str() {
                "success" => status.state.green(),
                "pending" => status.state.yellow(),
                _ => status.state.red(),
            };
            println!(
                "      - {} {} ({})",
                state, status.description, status.created_at
            );
        }
    }
}

fn render_suggestions(checks: &WebhookChecks) {
    println!("{}", "⚠ Problems found:".yellow().bold());

    if !checks.backend_url_public.ok {
        println!(
            "{}",
            "  → BACKEND_URL points to localhost. Set the BACKEND_URL environment variable to the backend's public URL."
                .yellow()
        );
    }
    if !checks.user_git_token.ok {
        println!(
            "{}",
            "  → Log in to Fabroku again to get a valid GitHub token.".yellow()
        );
    }
    if !checks.project_git_token.ok {
        println!(
            "{}",
            "  → No project member has a GitHub token. At least one member must log in.".yellow()
        );
    }
    if checks.needs_webhook_repair() {
        println!(
            "{}",
            "  → Webhook not found. Creating it automatically...".yellow()
        );
    }
    if let Some(last_commit) = &checks.last_commit
        && !last_commit.ok
        && let Some(message) = &last_commit.message
    {
        println!("{}", format!("  → {}", message).yellow());
    }
}

/// Create the webhook; failures are reported, never fatal
async fn setup_webhook(api: &ApiClient, app_id: &str) {
    println!("{}", "Configuring webhook...".cyan());

    let result = match api.setup_webhook(app_id).await {
        Ok(result) => result,
        Err(e) => {
            println!("{}", format!("Failed to create webhook: {}", e).red());
            return;
        }
    };

    let hook_id = result.hook_id.as_deref().unwrap_or("-");
    match result.outcome() {
        SetupStatus::Created => {
            println!("{}", "✓ Webhook created successfully!".green().bold());
            println!(
                "{}",
                format!("  URL: {}", result.webhook_url.as_deref().unwrap_or("-")).dimmed()
            );
            println!("{}", format!("  Hook ID: {}", hook_id).dimmed());
        }
        SetupStatus::AlreadyExists => {
            println!("{}", "✓ Webhook is already configured.".green());
            println!("{}", format!("  Hook ID: {}", hook_id).dimmed());
        }
        SetupStatus::Other => println!("{}", format!("Status: {}", result.status).yellow()),
    }
}

/// Exercise commit-status creation; failures are reported, never fatal
async fn test_commit_status(api: &ApiClient, app_id: &str) {
    println!("{}", "Testing commit status...\n".cyan().bold());

    let result = match api.test_commit_status(app_id).await {
        Ok(result) => result,
        Err(e) => {
            println!("{}", format!("Error: {}", e).red());
            return;
        }
    };

    println!(
        "{}",
        format!("  Repo: {}", result.repo_name.as_deref().unwrap_or("-")).dimmed()
    );
    println!(
        "{}",
        format!("  Token: {}", result.token_preview.as_deref().unwrap_or("-")).dimmed()
    );
    println!();

    if let Some(check) = &result.repo_access {
        render_check("Repository access", check);
        if !check.ok {
            print_step_error(check);
            return;
        }
    }

    if let Some(check) = &result.branch_access {
        render_check("Branch access", check);
        if let Some(sha) = &check.sha {
            println!("{}", format!("    SHA: {}", sha).dimmed());
        }
        if !check.ok {
            print_step_error(check);
            return;
        }
    }

    if let Some(check) = &result.create_status {
        render_check("Create commit status", check);
        if check.ok {
            println!(
                "{}",
                "\n  ✓ Commit status works! The check showed up on GitHub.".green().bold()
            );
            println!(
                "{}",
                "  (The test status was created as 'success' to leave the commit clean)".dimmed()
            );
        } else {
            print_step_error(check);
            if let Some(message) = &check.message {
                println!("{}", format!("  {}", message).yellow());
            }
        }
    }

    if let Some(error) = &result.unexpected_error {
        println!("{}", format!("\n  Unexpected error: {}", error).red());
    }
}

fn print_step_error(check: &Check) {
    println!(
        "{}",
        format!("\n  Error: {}", check.error.as_deref().unwrap_or("unknown")).red()
    );
}
