use std::path::Path;

use anyhow::Result;

use crate::error::CliError;
use crate::ui;
use crate::verify::{AppType, verify_dir};

/// `fabroku verify`
pub async fn verify(dir: &Path, app_type: Option<AppType>, fix: bool) -> Result<()> {
    let report = verify_dir(dir, app_type, fix).await.map_err(CliError::from)?;
    ui::render_verify_report(&report, true);

    if report.passed() {
        Ok(())
    } else {
        Err(CliError::VerificationFailed { dir: report.dir }.into())
    }
}
