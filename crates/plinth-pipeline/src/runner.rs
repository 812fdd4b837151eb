//! Stage runner: executes the transform stages and aggregates outcomes.

use crate::markup::MarkupStage;
use crate::paths::Paths;
use crate::scripts::ScriptsStage;
use crate::stage::{AssetClass, StageError, StageSummary, TransformStage};
use crate::styles::StylesStage;

/// Outcome of a full pipeline run.
#[derive(Debug)]
pub struct RunReport {
    pub summaries: Vec<StageSummary>,
}

impl RunReport {
    pub fn written(&self) -> usize {
        self.summaries.iter().map(|s| s.written).sum()
    }

    pub fn failed(&self) -> usize {
        self.summaries.iter().map(|s| s.failed).sum()
    }
}

/// Runs the stage for one asset class.
pub async fn run_class(paths: &Paths, class: AssetClass) -> Result<StageSummary, StageError> {
    match class {
        AssetClass::Markup => MarkupStage::new(paths).run().await,
        AssetClass::Styles => StylesStage::new(paths).run().await,
        AssetClass::Scripts => ScriptsStage::new(paths).run().await,
    }
}

/// Executes the three transform stages. The stages share no data, so they
/// run concurrently; `run_all` resolves only once every stage has settled.
pub struct Runner {
    paths: Paths,
}

impl Runner {
    pub fn new(paths: Paths) -> Self {
        Self { paths }
    }

    /// Never fails: a stage that cannot run at all is logged and reported
    /// as zero files written, and the remaining stages still complete.
    pub async fn run_all(&self) -> RunReport {
        let (markup, styles, scripts) = tokio::join!(
            run_class(&self.paths, AssetClass::Markup),
            run_class(&self.paths, AssetClass::Styles),
            run_class(&self.paths, AssetClass::Scripts),
        );

        let summaries = [
            (AssetClass::Markup, markup),
            (AssetClass::Styles, styles),
            (AssetClass::Scripts, scripts),
        ]
        .into_iter()
        .map(|(class, result)| settle(class, result))
        .collect();

        RunReport { summaries }
    }
}

fn settle(class: AssetClass, result: Result<StageSummary, StageError>) -> StageSummary {
    match result {
        Ok(summary) => {
            tracing::info!(
                "{class}: {} written, {} failed",
                summary.written,
                summary.failed
            );
            summary
        }
        Err(e) => {
            tracing::error!("{class} stage did not run: {e}");
            StageSummary::new(class)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn write(path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[tokio::test]
    async fn builds_all_three_classes() {
        let temp = tempdir().unwrap();
        let paths = Paths::rooted(temp.path());

        write(&paths.markup.views.join("index.j2"), "<main>hi</main>");
        write(&paths.styles.src.join("app.scss"), ".a { color: red; }\n");
        write(&paths.scripts.src.join("main.js"), "// entry\n");

        let report = Runner::new(paths.clone()).run_all().await;

        assert_eq!(report.written(), 3);
        assert_eq!(report.failed(), 0);
        assert!(paths.markup.dest.join("index.html").exists());
        assert!(paths.styles.dest.join("app.css").exists());
        assert!(paths.scripts.dest.join("main.js").exists());
    }

    #[tokio::test]
    async fn a_missing_source_root_does_not_sink_the_run() {
        let temp = tempdir().unwrap();
        let paths = Paths::rooted(temp.path());

        // Only scripts exist; markup and styles roots are absent.
        write(&paths.scripts.src.join("main.js"), "// entry\n");

        let report = Runner::new(paths.clone()).run_all().await;

        assert_eq!(report.summaries.len(), 3);
        assert_eq!(report.written(), 1);
        assert!(paths.scripts.dest.join("main.js").exists());
    }
}
