use anyhow::Result;
use colored::{Color, Colorize};

use super::authenticated_client;
use crate::api::DeployApi;
use crate::config::Session;
use crate::error::CliError;
use crate::shared::{App, AppStatus};

/// Keep only the apps of `project` (compared as text)
pub fn filter_by_project(apps: Vec<App>, project: Option<&str>) -> Vec<App> {
    match project {
        Some(project) => apps
            .into_iter()
            .filter(|app| app.project.as_deref() == Some(project))
            .collect(),
        None => apps,
    }
}

fn status_color(status: AppStatus) -> Color {
    match status {
        AppStatus::Running => Color::Green,
        AppStatus::Stopped | AppStatus::Error => Color::Red,
        AppStatus::Starting | AppStatus::Stopping => Color::Yellow,
        AppStatus::Deploying => Color::Cyan,
        AppStatus::Deleting => Color::Magenta,
        AppStatus::Restarting => Color::Blue,
        AppStatus::Unknown => Color::White,
    }
}

/// `fabroku apps`
pub async fn apps(session: &Session, project: Option<&str>) -> Result<()> {
    let api = authenticated_client(session)?;
    let apps = api.list_apps().await.map_err(CliError::from)?;
    let apps = filter_by_project(apps, project);

    if apps.is_empty() {
        println!("\nNo apps found.");
        if let Some(project) = project {
            println!("   (filtered by project: {})", project);
        }
        return Ok(());
    }

    println!();
    println!(
        "{}{}{}{}{}",
        format!("{:<6}", "ID").dimmed(),
        format!("{:<25}", "Name").dimmed(),
        format!("{:<14}", "Status").dimmed(),
        format!("{:<30}", "Domain").dimmed(),
        "Project".dimmed()
    );
    println!("{}", "─".repeat(85).dimmed());

    for app in &apps {
        let status = app.status.unwrap_or(AppStatus::Stopped);
        println!(
            "{:<6}{:<25}{}{:<30}{}",
            app.id,
            app.name,
            format!("{:<14}", status.label()).color(status_color(status)),
            app.domain.as_deref().unwrap_or("-"),
            app.project.as_deref().unwrap_or("")
        );
    }

    println!("\nTotal: {} app(s)\n", apps.len());
    Ok(())
}
