//! Markup transform stage: templates to rendered pages.

use std::fs;
use std::path::{Path, PathBuf};

use minijinja::{path_loader, Environment};

use crate::paths::{MarkupPaths, Paths};
use crate::stage::{
    discover_sources, AssetClass, CompileError, StageError, StageSummary, TransformStage,
};

/// Extension of markup template sources.
pub const TEMPLATE_EXT: &str = "j2";
/// Extension given to rendered pages.
pub const PAGE_EXT: &str = "html";

/// Renders every non-partial template under the views root to a mirrored
/// `.html` path under the destination root.
///
/// The template loader is rooted at the markup source root, one level above
/// `views`, so pages can include shared fragments such as
/// `common/_head.j2`. Pages establish their own rendering context, at
/// minimum a `page` map whose `body_class` field lets fragments branch per
/// page.
pub struct MarkupStage {
    paths: MarkupPaths,
}

impl MarkupStage {
    pub fn new(paths: &Paths) -> Self {
        Self {
            paths: paths.markup.clone(),
        }
    }

    fn environment(&self) -> Environment<'static> {
        let mut env = Environment::new();
        env.set_loader(path_loader(&self.paths.src));
        env
    }

    fn render_page(
        &self,
        env: &Environment<'static>,
        source: &Path,
    ) -> Result<PathBuf, CompileError> {
        let name = template_name(source.strip_prefix(&self.paths.src).unwrap_or(source));
        let template = env
            .get_template(&name)
            .map_err(|e| CompileError::new(source, e.to_string()))?;

        let html = template
            .render(minijinja::context! {})
            .map_err(|e| CompileError::new(source, e.to_string()))?;

        let rel = source.strip_prefix(&self.paths.views).unwrap_or(source);
        let out = self.paths.dest.join(rel).with_extension(PAGE_EXT);

        if let Some(parent) = out.parent() {
            fs::create_dir_all(parent).map_err(|e| CompileError::new(source, e.to_string()))?;
        }
        // Rendered output is always written as UTF-8.
        fs::write(&out, html).map_err(|e| CompileError::new(source, e.to_string()))?;

        Ok(out)
    }
}

impl TransformStage for MarkupStage {
    fn class(&self) -> AssetClass {
        AssetClass::Markup
    }

    async fn run(&self) -> Result<StageSummary, StageError> {
        let sources = discover_sources(&self.paths.views, TEMPLATE_EXT)?;
        fs::create_dir_all(&self.paths.dest)?;

        let env = self.environment();
        let mut summary = StageSummary::new(self.class());

        for source in sources {
            match self.render_page(&env, &source) {
                Ok(out) => {
                    tracing::debug!("rendered {}", out.display());
                    summary.written += 1;
                }
                Err(e) => {
                    tracing::error!("markup: {e}");
                    summary.failed += 1;
                }
            }
        }

        Ok(summary)
    }
}

/// Template name for the loader: the path relative to the markup source
/// root, with forward slashes.
fn template_name(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
