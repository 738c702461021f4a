//! Pre-deploy check for the files the platform's buildpacks need
//!
//! Frontend (static SPA): `.buildpacks`, `.static`, `static.json`
//! Backend (Python):      `Procfile`, `requirements.txt`, `runtime.txt`

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use derive_more::Display;

/// Kind of application, which decides the required files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, clap::ValueEnum)]
pub enum AppType {
    /// SPA/static application (Vue, React, ...)
    #[display("frontend")]
    Frontend,
    /// Python application (Django, Flask, ...)
    #[display("backend")]
    Backend,
}

impl AppType {
    pub fn title(&self) -> &'static str {
        match self {
            AppType::Frontend => "FrontEnd",
            AppType::Backend => "BackEnd",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            AppType::Frontend => "SPA/static application (Vue, React, etc.)",
            AppType::Backend => "Python application (Django, Flask, etc.)",
        }
    }

    /// Files this kind of app must ship
    pub fn required_files(&self) -> &'static [RequiredFile] {
        match self {
            AppType::Frontend => FRONTEND_FILES,
            AppType::Backend => BACKEND_FILES,
        }
    }
}

/// A deployment file and the content `--fix` writes for it
#[derive(Debug)]
pub struct RequiredFile {
    pub name: &'static str,
    pub description: &'static str,
    /// `None` when the file cannot be generated
    pub template: Option<&'static str>,
}

const STATIC_JSON: &str = r#"{
  "root": "dist/",
  "clean_urls": true,
  "routes": {
    "/**": "index.html"
  },
  "headers": {
    "/**": {
      "Cache-Control": "public, max-age=0, must-revalidate"
    },
    "/assets/**": {
      "Cache-Control": "public, max-age=31536000, immutable"
    }
  }
}
"#;

const FRONTEND_FILES: &[RequiredFile] = &[
    RequiredFile {
        name: ".buildpacks",
        description: "Buildpacks used for the static deploy",
        template: Some(
            "https://github.com/heroku/heroku-buildpack-nodejs\nhttps://github.com/dokku/buildpack-nginx\n",
        ),
    },
    RequiredFile {
        name: ".static",
        description: "Marks the build as static",
        template: Some(""),
    },
    RequiredFile {
        name: "static.json",
        description: "Static server configuration (SPA routes)",
        template: Some(STATIC_JSON),
    },
];

const BACKEND_FILES: &[RequiredFile] = &[
    RequiredFile {
        name: "Procfile",
        description: "Command that starts the server",
        template: Some("web: gunicorn config.wsgi --bind 0.0.0.0:$PORT\n"),
    },
    RequiredFile {
        name: "requirements.txt",
        description: "Python dependencies",
        template: None,
    },
    RequiredFile {
        name: "runtime.txt",
        description: "Python version used for the deploy",
        template: Some("python-3.13.2\n"),
    },
];

const BACKEND_MARKERS: &[&str] = &[
    "manage.py",
    "requirements.txt",
    "setup.py",
    "pyproject.toml",
    "Pipfile",
];

/// Guess the app type from the directory contents
pub async fn detect_app_type(dir: &Path) -> Option<AppType> {
    if dir.join("package.json").exists() {
        // A Node backend declares itself in the Procfile
        if let Ok(procfile) = tokio::fs::read_to_string(dir.join("Procfile")).await
            && (procfile.contains("node") || procfile.contains("npm"))
        {
            return Some(AppType::Backend);
        }
        return Some(AppType::Frontend);
    }

    if BACKEND_MARKERS.iter().any(|m| dir.join(m).exists()) {
        return Some(AppType::Backend);
    }

    None
}

/// State of one required file after the check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileState {
    Present,
    Missing,
    /// Was missing and `--fix` wrote the default content
    Generated,
}

#[derive(Debug, Clone)]
pub struct FileCheck {
    pub name: &'static str,
    pub description: &'static str,
    pub state: FileState,
}

/// Outcome of verifying one directory
#[derive(Debug, Clone)]
pub struct VerifyReport {
    pub dir: PathBuf,
    /// `None` when the type could not be detected
    pub app_type: Option<AppType>,
    pub files: Vec<FileCheck>,
}

impl VerifyReport {
    pub fn missing(&self) -> usize {
        self.count(FileState::Missing) + self.count(FileState::Generated)
    }

    pub fn generated(&self) -> usize {
        self.count(FileState::Generated)
    }

    /// Files still absent after any fixes
    pub fn remaining(&self) -> usize {
        self.count(FileState::Missing)
    }

    pub fn passed(&self) -> bool {
        self.app_type.is_some() && self.remaining() == 0
    }

    fn count(&self, state: FileState) -> usize {
        self.files.iter().filter(|f| f.state == state).count()
    }
}

/// Check `dir` for its required files, generating the missing ones when `fix` is set
pub async fn verify_dir(
    dir: &Path,
    forced_type: Option<AppType>,
    fix: bool,
) -> std::io::Result<VerifyReport> {
    let dir = std::path::absolute(dir)?;

    let app_type = match forced_type {
        Some(t) => Some(t),
        None => detect_app_type(&dir).await,
    };

    let Some(app_type) = app_type else {
        tracing::debug!(dir = %dir.display(), "Could not detect app type");
        return Ok(VerifyReport {
            dir,
            app_type: None,
            files: Vec::new(),
        });
    };

    let mut files = Vec::new();
    for required in app_type.required_files() {
        let path = dir.join(required.name);
        let state = if path.exists() {
            FileState::Present
        } else if let (true, Some(template)) = (fix, required.template) {
            tokio::fs::write(&path, template).await?;
            tracing::info!(file = %path.display(), "Generated missing deploy file");
            FileState::Generated
        } else {
            FileState::Missing
        };

        files.push(FileCheck {
            name: required.name,
            description: required.description,
            state,
        });
    }

    Ok(VerifyReport {
        dir,
        app_type: Some(app_type),
        files,
    })
}

/// Pass/fail check run before a deploy is triggered
#[async_trait]
pub trait VerificationGate: Send + Sync {
    async fn verify(&self, dir: &Path) -> std::io::Result<VerifyReport>;
}

/// Gate backed by [`verify_dir`] with auto-detected type and no fixes
#[derive(Debug, Clone, Copy, Default)]
pub struct FileGate;

#[async_trait]
impl VerificationGate for FileGate {
    async fn verify(&self, dir: &Path) -> std::io::Result<VerifyReport> {
        verify_dir(dir, None, false).await
    }
}
