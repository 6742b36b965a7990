use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::AppError;

/// Repository holding the breaking-change documents.
pub const DEFAULT_REPO_URL: &str = "https://github.com/Microsoft/dotnet-apiport/";
pub const DEFAULT_OUTPUT_PATH: &str = "apiport.json";
/// Directory of the documents, relative to the repository root.
pub const DEFAULT_DOCS_DIR: &str = "docs/BreakingChanges";
/// File stem of the template document, which is never converted.
pub const DEFAULT_TEMPLATE_NAME: &str = "! Template";

/// What to do with a document that does not follow the template.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum MalformedPolicy {
    /// Stop the whole run at the first malformed document.
    #[default]
    Abort,
    /// Log a warning and leave the document out of the output.
    Skip,
}

impl FromStr for MalformedPolicy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(Self::Abort),
            "skip" => Ok(Self::Skip),
            other => Err(AppError::Config(format!(
                "invalid malformed-document policy `{other}` (expected `abort` or `skip`)"
            ))),
        }
    }
}

/// Conversion settings, assembled from the command line and the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Location of the document repository, anything `git clone` accepts.
    pub repo_url: String,
    /// Destination of the JSON output.
    pub output_path: PathBuf,
    /// Documents directory relative to the checkout root.
    pub docs_dir: PathBuf,
    /// File stem of the template document to skip.
    pub template_name: String,
    pub on_malformed: MalformedPolicy,
    /// Git executable used for the checkout.
    pub git_bin: String,
    /// Branch or tag to check out instead of the default branch.
    pub branch: Option<String>,
    /// Shallow clone depth.
    pub depth: Option<u32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            repo_url: DEFAULT_REPO_URL.to_string(),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            docs_dir: PathBuf::from(DEFAULT_DOCS_DIR),
            template_name: DEFAULT_TEMPLATE_NAME.to_string(),
            on_malformed: MalformedPolicy::default(),
            git_bin: "git".to_string(),
            branch: None,
            depth: None,
        }
    }
}

impl Config {
    /// Apply overrides from environment variables.
    ///
    /// Optional:
    /// - `APIPORT2JSON_DOCS_DIR`: documents directory relative to the checkout root
    /// - `APIPORT2JSON_TEMPLATE`: file stem of the template document
    /// - `APIPORT2JSON_ON_MALFORMED`: `abort` or `skip`
    /// - `GIT_BIN`: git executable
    pub fn with_env(self) -> Result<Self, AppError> {
        self.with_vars(|name| std::env::var(name).ok())
    }

    fn with_vars(mut self, var: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        if let Some(docs_dir) = var("APIPORT2JSON_DOCS_DIR") {
            self.docs_dir = PathBuf::from(docs_dir);
        }
        if let Some(template) = var("APIPORT2JSON_TEMPLATE") {
            self.template_name = template;
        }
        if let Some(policy) = var("APIPORT2JSON_ON_MALFORMED") {
            self.on_malformed = policy.parse()?;
        }
        if let Some(git_bin) = var("GIT_BIN") {
            self.git_bin = git_bin;
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.repo_url.trim().is_empty() {
            return Err(AppError::Config("repository url must not be empty".to_string()));
        }
        if self.output_path.as_os_str().is_empty() {
            return Err(AppError::Config("output path must not be empty".to_string()));
        }
        if self.docs_dir.is_absolute() {
            return Err(AppError::Config(format!(
                "documents directory must be relative to the repository root, got {}",
                self.docs_dir.display()
            )));
        }
        if self.git_bin.trim().is_empty() {
            return Err(AppError::Config("GIT_BIN must not be empty".to_string()));
        }
        if self.depth == Some(0) {
            return Err(AppError::Config("clone depth must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Returns the documents directory inside a checkout rooted at `root`.
    pub fn documents_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.docs_dir)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn with(vars: &[(&str, &str)]) -> Result<Config, AppError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::default().with_vars(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = with(&[]).unwrap();
        assert_eq!(config.repo_url, DEFAULT_REPO_URL);
        assert_eq!(config.output_path, PathBuf::from("apiport.json"));
        assert_eq!(config.template_name, "! Template");
        assert_eq!(config.on_malformed, MalformedPolicy::Abort);
        assert_eq!(
            config.documents_dir(Path::new("/tmp/repo")),
            PathBuf::from("/tmp/repo/docs/BreakingChanges")
        );
    }

    #[test]
    fn test_env_overrides() {
        let config = with(&[
            ("APIPORT2JSON_DOCS_DIR", "docs/Changes"),
            ("APIPORT2JSON_TEMPLATE", "TEMPLATE"),
            ("APIPORT2JSON_ON_MALFORMED", "Skip"),
            ("GIT_BIN", "/usr/local/bin/git"),
        ])
        .unwrap();
        assert_eq!(config.docs_dir, PathBuf::from("docs/Changes"));
        assert_eq!(config.template_name, "TEMPLATE");
        assert_eq!(config.on_malformed, MalformedPolicy::Skip);
        assert_eq!(config.git_bin, "/usr/local/bin/git");
    }

    #[test]
    fn test_invalid_values_are_config_errors() {
        let err = with(&[("APIPORT2JSON_ON_MALFORMED", "ignore")]).unwrap_err();
        assert!(matches!(err, AppError::Config(_)), "{err}");

        let err = with(&[("APIPORT2JSON_DOCS_DIR", "/abs/docs")]).unwrap_err();
        assert!(matches!(err, AppError::Config(_)), "{err}");

        let config = Config {
            depth: Some(0),
            ..Config::default()
        };
        assert!(config.with_vars(|_| None).is_err());
    }
}
