//! Inspection reports
//!
//! Describes how a document would be classified, in summary, JSON or
//! Markdown form.

use std::path::Path;

use serde::Serialize;

use crate::classifier::{ClassifyStats, classify_lines};
use crate::layout::Layout;
use crate::metadata::{self, MetadataEntry, SlicerInfo};
use crate::sections::Section;

#[derive(Debug, Clone, Serialize)]
pub struct SectionCount {
    pub section: Section,
    pub lines: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct InspectReport {
    pub file: String,
    pub layout: Layout,
    pub needs_conversion: bool,
    pub slicer: Option<SlicerInfo>,
    pub estimated_time: Option<String>,
    /// Line counts in target order
    pub sections: Vec<SectionCount>,
    pub stats: ClassifyStats,
    pub metadata: Vec<MetadataEntry>,
}

impl InspectReport {
    pub fn build(file: &Path, content: &str) -> Self {
        let layout = Layout::detect(content);
        let classification = classify_lines(content);

        let sections = Section::TARGET_ORDER
            .iter()
            .map(|&section| SectionCount {
                section,
                lines: classification.buckets.len(section),
            })
            .collect();
        let metadata_text = classification.buckets.text(Section::Metadata);
        let slicer = metadata::slicer_info(&classification.buckets.text(Section::Header));
        let estimated_time = metadata::estimated_time(&metadata_text);
        let metadata = metadata::entries(&metadata_text);

        Self {
            file: file.display().to_string(),
            layout,
            needs_conversion: layout.needs_conversion(),
            slicer,
            estimated_time,
            sections,
            stats: classification.stats,
            metadata,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_markdown(&self) -> String {
        let mut lines = vec![
            "# G-code Layout Report".to_string(),
            String::new(),
            format!("**File**: {}", self.file),
            format!("**Layout**: {}", self.layout),
            format!(
                "**Needs conversion**: {}",
                if self.needs_conversion { "yes" } else { "no" }
            ),
        ];
        if let Some(slicer) = &self.slicer {
            lines.push(format!("**Slicer**: {slicer}"));
        }
        if let Some(eta) = &self.estimated_time {
            lines.push(format!("**Estimated time**: {eta}"));
        }
        lines.extend([
            String::new(),
            "## Sections".to_string(),
            "| Section | Lines |".to_string(),
            "|---------|-------|".to_string(),
        ]);
        for count in &self.sections {
            lines.push(format!("| {} | {} |", count.section, count.lines));
        }
        lines.push(format!("| *discarded* | {} |", self.stats.discarded()));
        lines.push(String::new());

        if !self.metadata.is_empty() {
            lines.push("## Metadata".to_string());
            lines.push(String::new());
            for entry in &self.metadata {
                lines.push(format!("- **{}**: {}", entry.key, entry.value));
            }
            lines.push(String::new());
        }

        lines.join("\n")
    }

    pub fn to_summary(&self) -> String {
        let mut out = format!("Layout of {}: {}\n", self.file, self.layout);
        if let Some(slicer) = &self.slicer {
            out.push_str(&format!("Slicer: {slicer}\n"));
        }
        if let Some(eta) = &self.estimated_time {
            out.push_str(&format!("Estimated time: {eta}\n"));
        }
        out.push('\n');
        for count in &self.sections {
            out.push_str(&format!("  {:<11} {}\n", count.section.as_str(), count.lines));
        }
        out.push_str("  ─────────────\n");
        out.push_str(&format!("  {:<11} {}\n", "discarded", self.stats.discarded()));
        out.push_str(&format!("  {:<11} {}\n", "total", self.stats.lines));

        if !self.metadata.is_empty() {
            out.push_str("\nMetadata:\n");
            for entry in &self.metadata {
                out.push_str(&format!("  {} = {}\n", entry.key, entry.value));
            }
        }

        out.push('\n');
        if self.needs_conversion {
            out.push_str("Conversion needed: metadata trails the executable block");
        } else {
            out.push_str("[OK] No conversion needed");
        }
        out
    }
}
