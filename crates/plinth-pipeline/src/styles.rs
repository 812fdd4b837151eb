//! Styles transform stage: SCSS to vendor-prefixed CSS with source maps.

use std::fs;
use std::path::{Path, PathBuf};

use lightningcss::printer::PrinterOptions;
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use parcel_sourcemap::SourceMap;

use crate::maps;
use crate::paths::{AssetPaths, Paths};
use crate::stage::{
    discover_sources, AssetClass, CompileError, StageError, StageSummary, TransformStage,
};

/// Extension of style sources.
pub const STYLE_EXT: &str = "scss";
/// Extension of compiled output.
pub const CSS_EXT: &str = "css";

/// Browser matrix the prefixer targets. Old enough that flexbox and friends
/// still receive their vendor-prefixed spellings.
fn browser_targets() -> Targets {
    Targets::from(Browsers {
        chrome: Some(30 << 16),
        ie: Some(10 << 16),
        safari: Some(6 << 16),
        ios_saf: Some(7 << 16),
        ..Browsers::default()
    })
}

/// Compiles every non-partial `.scss` under the source root to a mirrored
/// `.css` under the destination root, plus a map file in the side `maps`
/// directory. Partials (`_`-prefixed) participate only through `@use` and
/// `@import`.
pub struct StylesStage {
    paths: AssetPaths,
}

impl StylesStage {
    pub fn new(paths: &Paths) -> Self {
        Self {
            paths: paths.styles.clone(),
        }
    }

    fn compile(&self, source: &Path) -> Result<PathBuf, CompileError> {
        let rel = source
            .strip_prefix(&self.paths.src)
            .unwrap_or(source)
            .with_extension(CSS_EXT);

        let css = grass::from_path(source, &grass::Options::default())
            .map_err(|e| CompileError::new(source, e.to_string()))?;

        let mut map = SourceMap::new("/");
        let filename = maps::slashed(&rel.with_extension(STYLE_EXT));
        let prefixed =
            prefix(&css, &filename, &mut map).map_err(|msg| CompileError::new(source, msg))?;

        let out = self.paths.dest.join(&rel);
        if let Some(parent) = out.parent() {
            fs::create_dir_all(parent).map_err(|e| CompileError::new(source, e.to_string()))?;
        }

        let footer = format!(
            "\n/*# sourceMappingURL={} */\n",
            maps::map_url(&self.paths.map, &rel)
        );
        fs::write(&out, prefixed + &footer)
            .map_err(|e| CompileError::new(source, e.to_string()))?;

        let map_out = self.paths.dest.join(maps::map_sibling(&self.paths.map, &rel));
        if let Some(parent) = map_out.parent() {
            fs::create_dir_all(parent).map_err(|e| CompileError::new(source, e.to_string()))?;
        }
        let map_json = map.to_json(None).map_err(|e| CompileError::new(source, e.to_string()))?;
        fs::write(&map_out, map_json).map_err(|e| CompileError::new(source, e.to_string()))?;

        Ok(out)
    }
}

impl TransformStage for StylesStage {
    fn class(&self) -> AssetClass {
        AssetClass::Styles
    }

    async fn run(&self) -> Result<StageSummary, StageError> {
        let sources = discover_sources(&self.paths.src, STYLE_EXT)?;
        fs::create_dir_all(&self.paths.dest)?;

        let mut summary = StageSummary::new(self.class());

        for source in sources {
            match self.compile(&source) {
                Ok(out) => {
                    tracing::debug!("compiled {}", out.display());
                    summary.written += 1;
                }
                Err(e) => {
                    tracing::error!("styles: {e}");
                    summary.failed += 1;
                }
            }
        }

        Ok(summary)
    }
}

/// Run compiled CSS through lightningcss: vendor prefixes for the target
/// matrix, printed with an external source map.
fn prefix(css: &str, filename: &str, map: &mut SourceMap) -> Result<String, String> {
    let mut stylesheet = StyleSheet::parse(
        css,
        ParserOptions {
            filename: filename.to_string(),
            ..ParserOptions::default()
        },
    )
    .map_err(|e| e.to_string())?;

    stylesheet
        .minify(MinifyOptions {
            targets: browser_targets(),
            ..MinifyOptions::default()
        })
        .map_err(|e| e.to_string())?;

    let printed = stylesheet
        .to_css(PrinterOptions {
            targets: browser_targets(),
            source_map: Some(map),
            ..PrinterOptions::default()
        })
        .map_err(|e| e.to_string())?;

    Ok(printed.code)
}
