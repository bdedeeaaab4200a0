// Tue Jan 15 2026 - Alex

use crate::diff::comparison::{DifferenceSeverity, TypeComparator, TypeDiff};
use crate::registry::SnapshotModel;
use serde::Serialize;
use std::fmt;
use std::io::Write;
use std::path::Path;

/// Every type diff between two snapshots
#[derive(Debug, Clone, Serialize)]
pub struct DiffReport {
    pub title: String,
    pub old_snapshot: String,
    pub new_snapshot: String,
    /// Types present in both snapshots that changed
    pub changed: Vec<TypeDiff>,
    pub added_types: Vec<String>,
    pub removed_types: Vec<String>,
    /// Types that could not be compared, with the reason
    pub incomparable: Vec<(String, String)>,
    pub summary: DiffSummary,
}

impl DiffReport {
    pub fn new(old_snapshot: &str, new_snapshot: &str) -> Self {
        Self {
            title: format!("Diff Report: {} -> {}", old_snapshot, new_snapshot),
            old_snapshot: old_snapshot.to_string(),
            new_snapshot: new_snapshot.to_string(),
            changed: Vec::new(),
            added_types: Vec::new(),
            removed_types: Vec::new(),
            incomparable: Vec::new(),
            summary: DiffSummary::default(),
        }
    }

    /// Compares every type the two models share, in the new model's order.
    pub fn between(old: &SnapshotModel, new: &SnapshotModel, comparator: &TypeComparator) -> Self {
        let mut report = Self::new(&old.id, &new.id);

        for (qualified, after) in &new.types {
            let before = match old.get(qualified) {
                Some(before) => before,
                None => {
                    report.added_types.push(qualified.clone());
                    continue;
                }
            };
            match comparator.compare(before, after) {
                Ok(mut diff) if !diff.is_empty() => {
                    diff.old_snapshot = old.id.clone();
                    diff.new_snapshot = new.id.clone();
                    report.add_diff(diff);
                }
                Ok(_) => report.summary.types_unchanged += 1,
                Err(e) => report.incomparable.push((qualified.clone(), e.to_string())),
            }
        }

        report.removed_types = old
            .types
            .keys()
            .filter(|qualified| new.get(qualified).is_none())
            .cloned()
            .collect();
        report.summary.types_added = report.added_types.len();
        report.summary.types_removed = report.removed_types.len();
        report
    }

    pub fn add_diff(&mut self, diff: TypeDiff) {
        self.summary.types_changed += 1;
        self.summary.breaking_changes += diff.breaking_changes().len();
        self.changed.push(diff);
    }

    pub fn has_breaking_changes(&self) -> bool {
        self.summary.breaking_changes > 0 || !self.removed_types.is_empty() || !self.incomparable.is_empty()
    }

    /// Export to specified format
    pub fn export(&self, format: ReportFormat) -> String {
        match format {
            ReportFormat::Text => self.to_text(),
            ReportFormat::Markdown => self.to_markdown(),
            ReportFormat::Json => self.to_json(),
        }
    }

    fn to_text(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("{}\n", self.title));
        output.push_str(&"=".repeat(self.title.len()));
        output.push_str("\n\n");

        output.push_str("Summary\n-------\n");
        output.push_str(&format!("{}\n", self.summary));

        for diff in &self.changed {
            output.push_str(&format!("{}\n", diff.qualified));
            output.push_str(&"-".repeat(diff.qualified.len()));
            output.push('\n');
            for change in &diff.differences {
                output.push_str(&format!("  [{}] {}\n", change.severity(), change));
            }
            output.push('\n');
        }

        if !self.added_types.is_empty() {
            output.push_str(&format!("Added types: {}\n", self.added_types.join(", ")));
        }
        if !self.removed_types.is_empty() {
            output.push_str(&format!("Removed types: {}\n", self.removed_types.join(", ")));
        }
        for (qualified, reason) in &self.incomparable {
            output.push_str(&format!("Not compared: {} ({})\n", qualified, reason));
        }

        output
    }

    fn to_markdown(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("# {}\n\n", self.title));
        output.push_str("## Summary\n\n");
        output.push_str(&format!("- **Types Changed:** {}\n", self.summary.types_changed));
        output.push_str(&format!("- **Types Unchanged:** {}\n", self.summary.types_unchanged));
        output.push_str(&format!("- **Types Added:** {}\n", self.summary.types_added));
        output.push_str(&format!("- **Types Removed:** {}\n", self.summary.types_removed));
        output.push_str(&format!("- **Breaking Changes:** {}\n\n", self.summary.breaking_changes));

        for diff in &self.changed {
            output.push_str(&format!("## `{}`\n\n", diff.qualified));
            output.push_str("| Severity | Change |\n");
            output.push_str("|----------|--------|\n");
            for change in &diff.differences {
                let marker = match change.severity() {
                    DifferenceSeverity::Breaking => "**BREAKING**".to_string(),
                    other => other.to_string(),
                };
                output.push_str(&format!("| {} | {} |\n", marker, change));
            }
            output.push('\n');
        }

        if !self.removed_types.is_empty() {
            output.push_str("## Removed Types\n\n");
            for qualified in &self.removed_types {
                output.push_str(&format!("- `{}`\n", qualified));
            }
            output.push('\n');
        }

        output
    }

    fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
    }

    /// Write report to file
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P, format: ReportFormat) -> std::io::Result<()> {
        let content = self.export(format);
        let mut file = std::fs::File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

impl fmt::Display for DiffReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_text())
    }
}

/// Summary of diff
#[derive(Debug, Clone, Default, Serialize)]
pub struct DiffSummary {
    pub types_changed: usize,
    pub types_unchanged: usize,
    pub types_added: usize,
    pub types_removed: usize,
    pub breaking_changes: usize,
}

impl fmt::Display for DiffSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Changed: {}", self.types_changed)?;
        writeln!(f, "Unchanged: {}", self.types_unchanged)?;
        writeln!(f, "Added: {}", self.types_added)?;
        writeln!(f, "Removed: {}", self.types_removed)?;
        if self.breaking_changes > 0 {
            writeln!(f, "Breaking changes: {}", self.breaking_changes)?;
        }
        Ok(())
    }
}

/// Report output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Markdown,
    Json,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Text => "txt",
            ReportFormat::Markdown => "md",
            ReportFormat::Json => "json",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::pipeline::{analyze_snapshot, SourceText};

    fn model(id: &str, source: &str) -> SnapshotModel {
        analyze_snapshot(id, &[SourceText::new("game.hpp", source)], &Config::default().with_parallel(false))
    }

    #[test]
    fn test_report_between_snapshots() {
        let old = model("v1", "struct A { int x; }; struct B { int y; }; enum class C { P, Q };");
        let new = model("v2", "struct A { int x; int z; }; enum class C { P, Q }; struct D {};");
        let report = DiffReport::between(&old, &new, &TypeComparator::new());

        assert_eq!(report.changed.len(), 1);
        assert_eq!(report.changed[0].qualified, "A");
        assert_eq!(report.changed[0].old_snapshot, "v1");
        assert_eq!(report.added_types, vec!["D"]);
        assert_eq!(report.removed_types, vec!["B"]);
        assert_eq!(report.summary.types_unchanged, 1);
        assert!(report.has_breaking_changes());
    }

    #[test]
    fn test_export_formats() {
        let old = model("v1", "struct A { int x; };");
        let new = model("v2", "struct A { float x; };");
        let report = DiffReport::between(&old, &new, &TypeComparator::new());

        let text = report.export(ReportFormat::Text);
        assert!(text.contains("[BREAKING] Type changed: x: int -> float"));

        let markdown = report.export(ReportFormat::Markdown);
        assert!(markdown.contains("## `A`"));

        let json = report.export(ReportFormat::Json);
        assert!(json.contains("\"old_snapshot\": \"v1\""));
        assert!(json.contains("\"field_type_changed\""));
    }

    #[test]
    fn test_write_to_file() {
        let old = model("v1", "enum class E { A, B };");
        let new = model("v2", "enum class E { A };");
        let report = DiffReport::between(&old, &new, &TypeComparator::new());
        let path = std::env::temp_dir().join(format!("decl-model-report-{}.{}", std::process::id(), ReportFormat::Markdown.extension()));
        report.write_to_file(&path, ReportFormat::Markdown).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(written, report.export(ReportFormat::Markdown));
        assert!(written.contains("## `E`"));
    }
}
