//! The transform-stage contract shared by all asset classes.

use std::fmt;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Base-name prefix marking a file as an includable fragment. Partials are
/// never transformed into standalone outputs.
pub const PARTIAL_MARKER: char = '_';

/// One category of source files sharing a source root, destination root,
/// and compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetClass {
    Markup,
    Styles,
    Scripts,
}

impl AssetClass {
    pub fn as_str(self) -> &'static str {
        match self {
            AssetClass::Markup => "markup",
            AssetClass::Styles => "styles",
            AssetClass::Scripts => "scripts",
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single source file that failed its class-specific compilation.
///
/// Compile errors are captured and logged by the owning stage; they never
/// escape the stage boundary.
#[derive(Debug, thiserror::Error)]
#[error("{}: {message}", path.display())]
pub struct CompileError {
    pub path: PathBuf,
    pub message: String,
}

impl CompileError {
    pub fn new(path: &Path, message: impl Into<String>) -> Self {
        Self {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }
}

/// Errors that stop a whole stage before any per-file work happens.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error("source directory not found: {}", .0.display())]
    MissingSource(PathBuf),

    #[error("failed to prepare output directory: {0}")]
    Io(#[from] std::io::Error),
}

/// Outcome of one stage run. Per-file failures have already been logged by
/// the time the summary is returned.
#[derive(Debug, Clone, Copy)]
pub struct StageSummary {
    pub class: AssetClass,
    pub written: usize,
    pub failed: usize,
}

impl StageSummary {
    pub fn new(class: AssetClass) -> Self {
        Self {
            class,
            written: 0,
            failed: 0,
        }
    }
}

/// The generic stage contract: walk the class's sources, transform each
/// file, write one destination file per input, and keep going past per-file
/// failures.
pub trait TransformStage {
    fn class(&self) -> AssetClass;

    /// Runs the stage to completion. Only infrastructure problems (missing
    /// source root, unwritable destination root) surface as errors;
    /// individual compile failures are logged and counted.
    fn run(&self) -> impl std::future::Future<Output = Result<StageSummary, StageError>>;
}

/// Whether a file is an includable fragment rather than a renderable source.
pub fn is_partial(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with(PARTIAL_MARKER))
}

/// Collect the files under `root` with the given extension, skipping
/// partials. Sorted for deterministic processing order.
pub(crate) fn discover_sources(root: &Path, ext: &str) -> Result<Vec<PathBuf>, StageError> {
    if !root.is_dir() {
        return Err(StageError::MissingSource(root.to_path_buf()));
    }

    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();

        if !path.is_file() {
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some(ext) {
            continue;
        }
        if is_partial(path) {
            continue;
        }

        files.push(path.to_path_buf());
    }

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn partial_detection_looks_at_base_name_only() {
        assert!(is_partial(Path::new("src/common/_head.j2")));
        assert!(!is_partial(Path::new("src/_common/head.j2")));
        assert!(!is_partial(Path::new("src/views/index.j2")));
    }

    #[test]
    fn discovery_skips_partials_and_foreign_extensions() {
        let temp = tempdir().unwrap();
        let root = temp.path();

        fs::create_dir_all(root.join("nested")).unwrap();
        fs::write(root.join("index.j2"), "").unwrap();
        fs::write(root.join("_draft.j2"), "").unwrap();
        fs::write(root.join("notes.txt"), "").unwrap();
        fs::write(root.join("nested/about.j2"), "").unwrap();

        let found = discover_sources(root, "j2").unwrap();

        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|p| p.extension().unwrap() == "j2"));
        assert!(!found.iter().any(|p| is_partial(p)));
    }

    #[test]
    fn discovery_errors_on_missing_root() {
        let temp = tempdir().unwrap();

        let result = discover_sources(&temp.path().join("absent"), "j2");

        assert!(matches!(result, Err(StageError::MissingSource(_))));
    }
}
