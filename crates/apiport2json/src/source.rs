/// Document source for the breaking-change markdown files.
///
/// Checks the documentation repository out into a scoped temporary directory and lists
/// the markdown documents to convert.
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;
use tracing::{debug, info, warn};

use crate::error::AppError;

/// Anything able to produce a working tree for a repository location.
pub trait DocumentSource {
    fn checkout(&self, url: &str) -> Result<Checkout, AppError>;
}

/// A working tree living inside a temporary directory.
///
/// The directory is removed by [`Checkout::release`], or on drop if the checkout is
/// never released explicitly.
#[derive(Debug)]
pub struct Checkout {
    dir: TempDir,
    root: PathBuf,
}

impl Checkout {
    /// Wrap a working tree rooted at `root`, which must live inside `dir`.
    pub fn new(dir: TempDir, root: PathBuf) -> Self {
        Self { dir, root }
    }

    /// Root of the working tree.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Recursively delete the temporary directory.
    ///
    /// Failures are logged and otherwise ignored.
    pub fn release(self) {
        let path = self.dir.path().to_path_buf();
        match self.dir.close() {
            Ok(()) => debug!(path = %path.display(), "removed checkout directory"),
            Err(e) => warn!(
                path = %path.display(),
                error = %e,
                "failed to remove checkout directory"
            ),
        }
    }
}

/// Create an empty temporary directory for a checkout.
pub fn temp_workspace() -> Result<TempDir, AppError> {
    tempfile::Builder::new()
        .prefix("apiport2json-")
        .tempdir()
        .map_err(|e| AppError::Source(format!("failed to create temporary directory: {e}")))
}

/// Clones repositories with the `git` executable.
#[derive(Debug, Clone)]
pub struct GitSource {
    git_bin: String,
    branch: Option<String>,
    depth: Option<u32>,
}

impl Default for GitSource {
    fn default() -> Self {
        Self::new("git")
    }
}

impl GitSource {
    pub fn new(git_bin: impl Into<String>) -> Self {
        Self {
            git_bin: git_bin.into(),
            branch: None,
            depth: None,
        }
    }

    /// Check out `branch` (a branch or tag name) instead of the default branch.
    pub fn with_branch(mut self, branch: Option<String>) -> Self {
        self.branch = branch;
        self
    }

    /// Limit the clone to the last `depth` commits.
    pub fn with_depth(mut self, depth: Option<u32>) -> Self {
        self.depth = depth;
        self
    }

    fn clone_into(&self, url: &str, dest: &Path) -> Result<(), AppError> {
        let mut cmd = Command::new(&self.git_bin);
        cmd.arg("clone").arg("--quiet");
        if let Some(depth) = self.depth {
            cmd.arg("--depth").arg(depth.to_string());
        }
        if let Some(branch) = &self.branch {
            cmd.arg("--branch").arg(branch);
        }
        cmd.arg(url).arg(dest);

        let output = cmd
            .output()
            .map_err(|e| AppError::Git(format!("failed to run {} clone: {e}", self.git_bin)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::Git(format!(
                "git clone of {url} failed: {}",
                stderr.trim()
            )));
        }

        Ok(())
    }
}

impl DocumentSource for GitSource {
    fn checkout(&self, url: &str) -> Result<Checkout, AppError> {
        let dir = temp_workspace()?;
        let root = dir.path().join("repo");
        info!(url, destination = %root.display(), "cloning document repository");
        // On failure `dir` is dropped here, which removes the partial clone.
        self.clone_into(url, &root)?;
        Ok(Checkout::new(dir, root))
    }
}

/// List the markdown documents directly inside `dir`, sorted by file name.
///
/// The document whose file stem equals `template_name` is skipped.
pub fn list_documents(dir: &Path, template_name: &str) -> Result<Vec<PathBuf>, AppError> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| AppError::Source(format!("failed to list {}: {e}", dir.display())))?;

    let mut documents = Vec::new();
    for entry in entries {
        let entry = entry
            .map_err(|e| AppError::Source(format!("failed to list {}: {e}", dir.display())))?;
        let path = entry.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("md") {
            continue;
        }
        if path.file_stem().and_then(|s| s.to_str()) == Some(template_name) {
            debug!(path = %path.display(), "skipping template document");
            continue;
        }
        documents.push(path);
    }

    documents.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), "## 1: x\n").unwrap();
    }

    #[test]
    fn test_list_documents_skips_template_and_other_files() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "b.md");
        touch(dir.path(), "! Template.md");
        touch(dir.path(), "a.md");
        touch(dir.path(), "README.txt");
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        touch(&dir.path().join("nested"), "c.md");

        let documents = list_documents(dir.path(), "! Template").unwrap();
        let names: Vec<_> = documents
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.md", "b.md"]);
    }

    #[test]
    fn test_list_documents_missing_directory() {
        let dir = TempDir::new().unwrap();
        let err = list_documents(&dir.path().join("docs"), "! Template").unwrap_err();
        assert!(matches!(err, AppError::Source(_)));
    }

    #[test]
    fn test_release_removes_directory() {
        let dir = temp_workspace().unwrap();
        let path = dir.path().to_path_buf();
        std::fs::create_dir_all(path.join("repo/docs")).unwrap();
        touch(&path.join("repo/docs"), "a.md");

        let checkout = Checkout::new(dir, path.join("repo"));
        assert!(checkout.root().exists());
        checkout.release();
        assert!(!path.exists());
    }

    #[test]
    fn test_missing_git_binary_is_git_error() {
        let source = GitSource::new("definitely-not-a-git-binary");
        let err = source.checkout("https://example.invalid/repo.git").err().unwrap();
        assert!(matches!(err, AppError::Git(_)), "{err}");
    }

    #[test]
    fn test_clone_local_repository() {
        let git_available = Command::new("git")
            .arg("--version")
            .output()
            .is_ok_and(|o| o.status.success());
        if !git_available {
            eprintln!("skipping test_clone_local_repository: git not available");
            return;
        }

        let origin = TempDir::new().unwrap();
        let git = |args: &[&str]| {
            let status = Command::new("git")
                .args(["-c", "user.name=test", "-c", "user.email=test@example.com"])
                .args(args)
                .current_dir(origin.path())
                .output()
                .unwrap()
                .status;
            assert!(status.success(), "git {args:?} failed");
        };
        git(&["init", "--quiet"]);
        std::fs::create_dir_all(origin.path().join("docs/BreakingChanges")).unwrap();
        touch(&origin.path().join("docs/BreakingChanges"), "Example.md");
        git(&["add", "."]);
        git(&["commit", "--quiet", "-m", "initial"]);

        let url = origin.path().to_string_lossy().into_owned();
        let checkout = GitSource::default().checkout(&url).unwrap();
        let documents =
            list_documents(&checkout.root().join("docs/BreakingChanges"), "! Template").unwrap();
        assert_eq!(documents.len(), 1);
        checkout.release();

        let err = GitSource::default()
            .checkout(&origin.path().join("missing").to_string_lossy())
            .err()
            .unwrap();
        assert!(matches!(err, AppError::Git(_)), "{err}");
    }
}
