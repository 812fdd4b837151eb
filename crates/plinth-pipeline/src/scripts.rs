//! Scripts transform stage: pass-through copy with identity source maps.
//!
//! Scripts ship as authored. Concatenation and minification are deliberate
//! non-features of this pipeline.

use std::fs;
use std::path::{Path, PathBuf};

use crate::maps;
use crate::paths::{AssetPaths, Paths};
use crate::stage::{
    discover_sources, AssetClass, CompileError, StageError, StageSummary, TransformStage,
};

/// Extension of script sources.
pub const SCRIPT_EXT: &str = "js";

pub struct ScriptsStage {
    paths: AssetPaths,
}

impl ScriptsStage {
    pub fn new(paths: &Paths) -> Self {
        Self {
            paths: paths.scripts.clone(),
        }
    }

    fn copy(&self, source: &Path) -> Result<PathBuf, CompileError> {
        let rel = source
            .strip_prefix(&self.paths.src)
            .unwrap_or(source)
            .to_path_buf();

        let raw = fs::read(source).map_err(|e| CompileError::new(source, e.to_string()))?;
        // Output is normalized to UTF-8 whatever the input encoding was.
        let content = String::from_utf8_lossy(&raw).into_owned();

        let map_json = maps::identity_map(&maps::slashed(&rel), &content)
            .map_err(|msg| CompileError::new(source, msg))?;

        let out = self.paths.dest.join(&rel);
        if let Some(parent) = out.parent() {
            fs::create_dir_all(parent).map_err(|e| CompileError::new(source, e.to_string()))?;
        }

        let footer = format!(
            "\n//# sourceMappingURL={}\n",
            maps::map_url(&self.paths.map, &rel)
        );
        fs::write(&out, content + &footer)
            .map_err(|e| CompileError::new(source, e.to_string()))?;

        let map_out = self.paths.dest.join(maps::map_sibling(&self.paths.map, &rel));
        if let Some(parent) = map_out.parent() {
            fs::create_dir_all(parent).map_err(|e| CompileError::new(source, e.to_string()))?;
        }
        fs::write(&map_out, map_json).map_err(|e| CompileError::new(source, e.to_string()))?;

        Ok(out)
    }
}

impl TransformStage for ScriptsStage {
    fn class(&self) -> AssetClass {
        AssetClass::Scripts
    }

    async fn run(&self) -> Result<StageSummary, StageError> {
        let sources = discover_sources(&self.paths.src, SCRIPT_EXT)?;
        fs::create_dir_all(&self.paths.dest)?;

        let mut summary = StageSummary::new(self.class());

        for source in sources {
            match self.copy(&source) {
                Ok(out) => {
                    tracing::debug!("copied {}", out.display());
                    summary.written += 1;
                }
                Err(e) => {
                    tracing::error!("scripts: {e}");
                    summary.failed += 1;
                }
            }
        }

        Ok(summary)
    }
}
