//! Asset pipeline for plinth sites.
//!
//! Provides the per-asset-class transform stages (markup, styles, scripts),
//! the runner that executes them, and the one-shot starter-tree scaffold.

pub mod markup;
mod maps;
pub mod paths;
pub mod runner;
pub mod scaffold;
pub mod scripts;
pub mod stage;
pub mod styles;

pub use paths::Paths;
pub use runner::{run_class, RunReport, Runner};
pub use stage::{AssetClass, CompileError, StageError, StageSummary, TransformStage};
