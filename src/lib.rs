//! Generates the example xlsx template used by the document service: a
//! header row, `${...}` placeholders and named ranges for the fill step.

pub mod address;
pub mod config;
pub mod layout;
pub mod report;
pub mod writer;

use anyhow::{Context, Result};
use tracing::debug;

pub use config::OutputConfig;
pub use report::Report;

/// Builds the example layout and writes it under `config`.
pub fn generate(config: &OutputConfig) -> Result<Report> {
    let layout = layout::example().context("无法构建模板布局")?;
    let path = config.output_path();
    debug!(path = %path.display(), "writing example template");
    writer::write_layout(&layout, &path)?;
    Ok(Report::new(&path, &layout))
}

pub fn run() -> Result<()> {
    let report = generate(&OutputConfig::default())?;
    print!("{report}");
    Ok(())
}
