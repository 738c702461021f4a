//! Terminal rendering: progress bar, workflow milestones, error messages

use std::io::Write;

use colored::Colorize;

use crate::api::ApiError;
use crate::deploy::{DeployReporter, ProgressSink};
use crate::error::{CliError, ResolutionFailure};
use crate::git::GitIdentity;
use crate::shared::{App, DeployTask, StatusSnapshot};
use crate::verify::{FileState, VerifyReport};

/// Cells in the progress bar
pub const BAR_WIDTH: usize = 20;

/// Dashboard where new apps are created
pub const DASHBOARD_URL: &str = "https://fabroku.fabricadesoftware.ifc.edu.br";

/// Filled and empty cell counts for a percent
pub fn bar_cells(percent: u32) -> (usize, usize) {
    let percent = percent.min(100) as f64;
    let filled = ((percent / 100.0) * BAR_WIDTH as f64).round() as usize;
    (filled, BAR_WIDTH - filled)
}

/// `[█████░░░░░]  50%`
pub fn progress_bar(percent: u32) -> String {
    let (filled, empty) = bar_cells(percent);
    format!(
        "[{}{}] {:>3}%",
        "█".repeat(filled).green(),
        "░".repeat(empty).dimmed(),
        percent.min(100)
    )
}

pub fn command(text: &str) -> colored::ColoredString {
    text.bold()
}

/// Renders the deploy workflow on stdout
#[derive(Debug, Default)]
pub struct TerminalReporter {
    progress_open: bool,
}

impl TerminalReporter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressSink for TerminalReporter {
    fn update(&mut self, snapshot: &StatusSnapshot) {
        let mut stdout = std::io::stdout().lock();
        // \x1b[K clears leftovers of a longer previous message
        let _ = write!(
            stdout,
            "\r   {} {}\x1b[K",
            progress_bar(snapshot.percent()),
            snapshot.status
        );
        let _ = stdout.flush();
        self.progress_open = true;
    }

    fn finish(&mut self) {
        if self.progress_open {
            println!();
            self.progress_open = false;
        }
    }
}

impl DeployReporter for TerminalReporter {
    fn repository_detected(&mut self, identity: &GitIdentity) {
        println!("\nRepository detected: {}", identity.remote_url.cyan());
        if let Some(branch) = &identity.branch {
            println!("   Branch: {}", branch.cyan());
        }
    }

    fn app_selected(&mut self, app: &App) {
        let status = app
            .status
            .map(|s| s.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        println!("\nApp: {} ({})", app.name.bold(), status.dimmed());
    }

    fn verified(&mut self, report: &VerifyReport) {
        println!("{}", "\n── File verification ──".dimmed());
        render_verify_report(report, false);
        if report.passed() {
            println!("{}", "   ✓ Deploy files OK\n".green());
        }
    }

    fn triggering(&mut self, app: &App) {
        println!("{}", "── Deploy ──".dimmed());
        println!("   Triggering redeploy of {}...", app.name.bold());
    }

    fn triggered(&mut self, _app: &App, task: &DeployTask) {
        println!(
            "   Deploy started! {}",
            format!("(task: {}...)", task.short_id()).dimmed()
        );
    }

    fn polling(&mut self) {
        println!("{}", "   Following progress...\n".dimmed());
    }
}

/// Print the per-file result of a verification
///
/// `summary` adds the closing verdict used by the `verify` command.
pub fn render_verify_report(report: &VerifyReport, summary: bool) {
    println!("\nChecking: {}\n", report.dir.display().to_string().bold());

    let Some(app_type) = report.app_type else {
        println!("{}", "⚠  Could not detect the application type.".yellow());
        println!(
            "   Use {} or {}\n",
            command("--type frontend"),
            command("--type backend")
        );
        return;
    };

    println!("Detected type: {}", app_type.title().cyan().bold());
    println!("   {}\n", app_type.description());

    for file in &report.files {
        match file.state {
            FileState::Present => println!("  {} {}", "✓".green(), file.name),
            FileState::Missing => {
                println!("  {} {} - {}", "✗".red(), file.name, "missing".dimmed())
            }
            FileState::Generated => {
                println!("  {} {} - {}", "✗".red(), file.name, "missing".dimmed());
                println!("     {} Generated with default content", "→".yellow());
            }
        }
    }
    println!();

    if !summary {
        return;
    }

    if report.missing() == 0 {
        println!("{}", "Project ready for deploy!\n".green());
    } else if report.generated() > 0 {
        println!("{}", format!("{} file(s) generated.", report.generated()).yellow());
        if report.remaining() > 0 {
            println!(
                "{}",
                format!("   {} file(s) must be created manually.", report.remaining()).red()
            );
        } else {
            println!("{}", "Project ready for deploy!\n".green());
        }
    } else {
        println!(
            "{}",
            format!("⚠  {} file(s) missing for deploy.", report.missing()).yellow()
        );
    }
}

fn login_hint() {
    println!("   Use: {}", command("fabroku login"));
}

fn apps_hint() {
    println!("   Use {} to list your apps.", command("fabroku apps"));
}

/// Print the user-facing message for a failed command
pub fn report_error(err: &anyhow::Error) {
    match err.downcast_ref::<CliError>() {
        Some(cli) => report_cli_error(cli),
        None => println!("{}", format!("✗ {:#}", err).red()),
    }
}

fn report_cli_error(err: &CliError) {
    match err {
        CliError::AuthenticationRequired => println!("{}", "✗ You need to log in first.".red()),
        CliError::Api(api) => report_api_error(api),
        CliError::Resolution(ResolutionFailure::AppNotFound(ident)) => {
            println!("{}", format!("✗ App \"{}\" not found.", ident).red());
            apps_hint();
        }
        CliError::Resolution(ResolutionFailure::NoRepository(_)) => {
            println!(
                "{}",
                "✗ Could not detect a git repository in this directory.".red()
            );
            println!("   Make sure you are at the root of a git repository,");
            println!(
                "   or use {} to choose the app.",
                command("fabroku deploy --app <name>")
            );
        }
        CliError::Resolution(ResolutionFailure::NoMatchingApp(_)) => {
            println!("{}", "\n✗ No app found for this repository.".red());
            apps_hint();
            println!("   Or create a new app in the dashboard: {}", DASHBOARD_URL.dimmed());
        }
        CliError::VerificationFailed { .. } => {
            println!(
                "{}",
                "\n✗ Verification failed. Fix the problems before deploying.".red()
            );
            println!(
                "   Use {} to generate the missing files.",
                command("fabroku verify --fix")
            );
        }
        CliError::DeployConflict(detail) => println!("{}", format!("\n⚠  {}", detail).yellow()),
        CliError::DeployRejected(detail) => println!("{}", format!("\n✗ {}", detail).red()),
        CliError::DeployFailed(detail) | CliError::PollTimeout(detail) => {
            println!("{}", format!("\n✗ Deploy failed: {}", detail).red())
        }
        CliError::Io(e) => println!("{}", format!("✗ {}", e).red()),
    }

    if err.needs_login() {
        login_hint();
    }
}

fn report_api_error(err: &ApiError) {
    if err.is_unauthorized() {
        println!("{}", "✗ Token expired or invalid. Log in again.".red());
    } else {
        println!("{}", format!("✗ API error: {}", err).red());
    }
}
