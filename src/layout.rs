//! Document layout detection
//!
//! Identifies which slicer produced a G-code document, and whether it is still
//! in the OrcaSlicer layout that needs restructuring.

use serde::Serialize;

use crate::classifier::{EXECUTABLE_BLOCK_END, HEADER_BLOCK_START, THUMBNAIL_BLOCK_START};

/// Known G-code layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// OrcaSlicer output: metadata trails the executable block
    OrcaSlicer,
    /// Orca-FlashForge output, or a document that was already restructured
    OrcaFlashForge,
    /// FlashPrint (`;generated by ffslicer`)
    FlashPrint,
    /// Legacy binary-headed GX file
    LegacyGx,
    Unknown,
}

impl Layout {
    /// Detect the layout from the first line and the presence of the
    /// executable-end marker.
    pub fn detect(content: &str) -> Self {
        let first_line = content.split('\n').next().unwrap_or("").trim();

        if first_line.starts_with(";generated by ffslicer") {
            Layout::FlashPrint
        } else if first_line.starts_with("xgcode 1.0") {
            Layout::LegacyGx
        } else if first_line.starts_with(HEADER_BLOCK_START)
            || first_line.starts_with(THUMBNAIL_BLOCK_START)
            || first_line.starts_with("; thumbnail begin")
        {
            if has_executable_end(content) {
                Layout::OrcaSlicer
            } else {
                Layout::OrcaFlashForge
            }
        } else {
            Layout::Unknown
        }
    }

    /// Only OrcaSlicer output carries trailing metadata that must be moved.
    pub fn needs_conversion(self) -> bool {
        matches!(self, Layout::OrcaSlicer)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Layout::OrcaSlicer => "OrcaSlicer",
            Layout::OrcaFlashForge => "Orca-FlashForge",
            Layout::FlashPrint => "FlashPrint",
            Layout::LegacyGx => "Legacy GX",
            Layout::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Layout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn has_executable_end(content: &str) -> bool {
    content
        .split('\n')
        .any(|line| line.trim() == EXECUTABLE_BLOCK_END)
}
