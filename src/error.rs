use std::path::PathBuf;

use crate::api::ApiError;

/// Why no single app could be selected for a command
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionFailure {
    /// `--app` matched neither a name nor an id
    #[error("app \"{0}\" not found")]
    AppNotFound(String),

    /// No `--app` and the directory has no usable `origin` remote
    #[error("no git repository detected in {}", .0.display())]
    NoRepository(PathBuf),

    /// The local remote is not linked to any app
    #[error("no app matches repository {0}")]
    NoMatchingApp(String),
}

/// Errors that end a command with a non-zero exit status
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("not logged in")]
    AuthenticationRequired,

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Resolution(#[from] ResolutionFailure),

    /// Required deployment files are missing
    #[error("verification failed for {}", .dir.display())]
    VerificationFailed { dir: PathBuf },

    /// The platform refused the redeploy because one is already in progress (HTTP 409)
    #[error("{0}")]
    DeployConflict(String),

    /// The platform rejected the redeploy request (HTTP 400)
    #[error("{0}")]
    DeployRejected(String),

    /// The remote task reached FAILURE
    #[error("deploy failed: {0}")]
    DeployFailed(String),

    #[error("{0}")]
    PollTimeout(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Whether the user should run `fabroku login` again
    pub fn needs_login(&self) -> bool {
        match self {
            CliError::AuthenticationRequired => true,
            CliError::Api(e) => e.is_unauthorized(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_needs_login() {
        assert!(CliError::AuthenticationRequired.needs_login());
        assert!(
            CliError::Api(ApiError::Status {
                status: 401,
                detail: "expired".to_string()
            })
            .needs_login()
        );
        assert!(
            !CliError::Api(ApiError::Status {
                status: 500,
                detail: "boom".to_string()
            })
            .needs_login()
        );
        assert!(!CliError::PollTimeout("slow".to_string()).needs_login());
    }

    #[test]
    fn test_resolution_messages() {
        let err = CliError::from(ResolutionFailure::AppNotFound("web".to_string()));
        assert_eq!(err.to_string(), "app \"web\" not found");

        let err = ResolutionFailure::NoRepository(PathBuf::from("/tmp/site"));
        assert_eq!(err.to_string(), "no git repository detected in /tmp/site");
    }
}
