//! Reassembly of classified sections into the Orca-FlashForge layout
//!
//! Sections are emitted as header, metadata, config, thumbnail, executable.
//! Whitespace-only sections are skipped. Every emitted section except the
//! executable one is followed by a single blank separator line.

use crate::classifier::classify;
use crate::sections::{ClassifiedSections, Section};

/// Concatenate the five sections in target order.
pub fn reassemble(
    header: &str,
    metadata: &str,
    config: &str,
    thumbnail: &str,
    executable: &str,
) -> String {
    let mut parts: Vec<&str> = Vec::with_capacity(9);

    for block in [header, metadata, config, thumbnail] {
        if !block.trim().is_empty() {
            parts.push(block);
            parts.push("");
        }
    }

    if !executable.trim().is_empty() {
        parts.push(executable);
    }

    parts.join("\n")
}

/// [`reassemble`] over an already classified document.
pub fn reassemble_sections(sections: &ClassifiedSections) -> String {
    reassemble(
        sections.get(Section::Header),
        sections.get(Section::Metadata),
        sections.get(Section::Config),
        sections.get(Section::Thumbnail),
        sections.get(Section::Executable),
    )
}

/// Classify and reassemble a whole document in one call.
pub fn restructure(content: &str) -> String {
    reassemble_sections(&classify(content))
}
