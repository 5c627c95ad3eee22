use std::fmt;
use std::path::{Path, PathBuf};

use crate::layout::TemplateLayout;

/// Endpoints of the document service that consume the template.
pub const NEXT_STEPS: [&str; 2] = [
    "POST /api/documents/fill-excel",
    "POST /api/documents/verify-excel",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedRangeLine {
    pub name: String,
    pub target: String,
    pub description: String,
}

/// Summary printed after the template is saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub path: PathBuf,
    pub ranges: Vec<NamedRangeLine>,
}

impl Report {
    pub fn new(path: &Path, layout: &TemplateLayout) -> Self {
        let ranges = layout
            .named_ranges()
            .iter()
            .map(|range| NamedRangeLine {
                name: range.name.clone(),
                target: range.target.target.to_string(),
                description: range.description.clone(),
            })
            .collect();
        Report {
            path: path.to_path_buf(),
            ranges,
        }
    }

    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![format!("✓ Created: {}", self.path.display())];
        for range in &self.ranges {
            lines.push(format!(
                "  - Named range '{}' -> {} ({})",
                range.name, range.target, range.description
            ));
        }
        lines.push(String::new());
        lines.push("Next: call the API endpoints:".to_string());
        for (i, endpoint) in NEXT_STEPS.iter().enumerate() {
            lines.push(format!("  {}. {endpoint}", i + 1));
        }
        lines
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.lines() {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}
