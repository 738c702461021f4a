use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fabroku::commands;
use fabroku::config::ConfigStore;
use fabroku::deploy::DeployOptions;
use fabroku::verify::AppType;

#[derive(Parser)]
#[command(name = "fabroku")]
#[command(about = "Deploy client for the Fabroku platform")]
#[command(version)]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Authenticate with the platform through GitHub
    Login {
        /// Base URL of the Fabroku API
        #[arg(long, value_name = "URL")]
        api_url: Option<String>,
    },
    /// End the CLI session
    Logout,
    /// Check that the project has the files required for deploy
    Verify {
        /// Project directory
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,
        /// Application type (detected when omitted)
        #[arg(short = 't', long = "type", value_enum)]
        app_type: Option<AppType>,
        /// Generate missing files with default content
        #[arg(long)]
        fix: bool,
    },
    /// List your apps
    Apps {
        /// Only show apps of this project id
        #[arg(short, long)]
        project: Option<String>,
    },
    /// Trigger a redeploy and follow its progress
    Deploy {
        /// App name or id (detected from the git remote when omitted)
        #[arg(short, long)]
        app: Option<String>,
        /// Project directory
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,
        /// Skip the deployment file check
        #[arg(long)]
        skip_verify: bool,
        /// Return once the deploy is queued
        #[arg(long)]
        no_wait: bool,
    },
    /// Show the authenticated user
    Whoami,
    /// Diagnose and configure the GitHub webhook of an app
    Webhook {
        /// App id (lists apps when omitted)
        app_id: Option<String>,
        /// Create or recreate the webhook
        #[arg(long)]
        setup: bool,
        /// Check that commit statuses can be created
        #[arg(long)]
        test: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "fabroku=debug"
    } else {
        "fabroku=warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "Command failed");
            fabroku::ui::report_error(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command) -> anyhow::Result<()> {
    let store = ConfigStore::from_env()?;

    match command {
        Command::Login { api_url } => commands::login(&store, api_url.as_deref()).await,
        Command::Logout => commands::logout(&store),
        Command::Verify { dir, app_type, fix } => commands::verify(&dir, app_type, fix).await,
        Command::Apps { project } => {
            let session = store.load()?;
            commands::apps(&session, project.as_deref()).await
        }
        Command::Deploy {
            app,
            dir,
            skip_verify,
            no_wait,
        } => {
            let session = store.load()?;
            let options = DeployOptions {
                app,
                dir,
                skip_verify,
                wait: !no_wait,
            };
            commands::deploy(&session, options).await
        }
        Command::Whoami => {
            let session = store.load()?;
            commands::whoami(&session).await
        }
        Command::Webhook {
            app_id,
            setup,
            test,
        } => {
            let session = store.load()?;
            commands::webhook(&session, app_id.as_deref(), setup, test).await
        }
    }
}
