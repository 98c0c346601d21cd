/// Workspace Manager
///
/// Every invocation gets its own freshly created temporary directory. The
/// path is passed explicitly to every stage; the judge never changes the
/// process working directory. The directory is removed when the
/// [`Workspace`] is dropped unless retention was requested.
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

pub struct Workspace {
    dir: Option<TempDir>,
    path: PathBuf,
}

impl Workspace {
    /// Create a uniquely named directory under `root` (or the system temp dir).
    pub fn create(root: Option<&Path>) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("judge-");

        let dir = match root {
            Some(root) => {
                fs::create_dir_all(root)
                    .with_context(|| format!("Failed to create workspace root {}", root.display()))?;
                builder.tempdir_in(root)
            }
            None => builder.tempdir(),
        }
        .context("Failed to create workspace directory")?;

        let path = dir.path().to_path_buf();
        debug!(workspace = %path.display(), "Workspace created");

        Ok(Self { dir: Some(dir), path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the submitted source under its language-specific file name.
    pub fn write_source(&self, file_name: &str, code: &str) -> Result<PathBuf> {
        let source_path = self.path.join(file_name);
        fs::write(&source_path, code)
            .with_context(|| format!("Failed to write source file {}", source_path.display()))?;
        Ok(source_path)
    }

    /// Leave the directory on disk after the invocation (debugging aid).
    pub fn retain(&mut self) {
        if let Some(dir) = self.dir.take() {
            let path = dir.keep();
            info!(workspace = %path.display(), "Workspace retained");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspaces_are_unique() {
        let a = Workspace::create(None).unwrap();
        let b = Workspace::create(None).unwrap();
        assert_ne!(a.path(), b.path());
        assert!(a.path().is_dir());
        assert!(fs::read_dir(a.path()).unwrap().next().is_none());
    }

    #[test]
    fn test_write_source() {
        let ws = Workspace::create(None).unwrap();
        let path = ws.write_source("solution.py", "print(42)\n").unwrap();
        assert_eq!(path, ws.path().join("solution.py"));
        assert_eq!(fs::read_to_string(path).unwrap(), "print(42)\n");
    }

    #[test]
    fn test_removed_on_drop() {
        let ws = Workspace::create(None).unwrap();
        let path = ws.path().to_path_buf();
        drop(ws);
        assert!(!path.exists());
    }

    #[test]
    fn test_retained_workspace_survives_drop() {
        let root = tempfile::tempdir().unwrap();
        let mut ws = Workspace::create(Some(root.path())).unwrap();
        let path = ws.path().to_path_buf();
        ws.retain();
        drop(ws);
        assert!(path.is_dir());
        assert!(path.starts_with(root.path()));
    }

    #[test]
    fn test_unwritable_root_fails() {
        let root = tempfile::tempdir().unwrap();
        let blocker = root.path().join("file");
        fs::write(&blocker, "x").unwrap();
        assert!(Workspace::create(Some(&blocker.join("nested"))).is_err());
    }
}
