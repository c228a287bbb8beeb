//! Section buckets and their text form
//!
//! A G-code document is partitioned into five named buckets. While the
//! classifier runs, buckets borrow lines from the input; once it is done they
//! are serialized into one newline-joined string per section.

use serde::Serialize;

/// The five document sections a line can be classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    /// `; HEADER_BLOCK_START` .. `; HEADER_BLOCK_END`
    Header,
    /// Embedded preview image data
    Thumbnail,
    /// The instruction stream itself
    Executable,
    /// Filament usage, ETA and similar `key = value` comments
    Metadata,
    /// `; CONFIG_BLOCK_START` .. `; CONFIG_BLOCK_END`
    Config,
}

impl Section {
    /// Order in which sections are emitted in the Orca-FlashForge layout.
    pub const TARGET_ORDER: [Section; 5] = [
        Section::Header,
        Section::Metadata,
        Section::Config,
        Section::Thumbnail,
        Section::Executable,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Section::Header => "header",
            Section::Thumbnail => "thumbnail",
            Section::Executable => "executable",
            Section::Metadata => "metadata",
            Section::Config => "config",
        }
    }

    fn index(self) -> usize {
        match self {
            Section::Header => 0,
            Section::Thumbnail => 1,
            Section::Executable => 2,
            Section::Metadata => 3,
            Section::Config => 4,
        }
    }
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Split a document into lines on `'\n'`.
///
/// Unlike [`str::lines`], a trailing newline produces a final empty line and
/// `'\r'` is kept, so joining the result with `'\n'` gives back the input.
pub fn split_lines(content: &str) -> impl Iterator<Item = &str> {
    content.split('\n')
}

/// Append-only line buckets borrowing from the source document.
#[derive(Debug, Default, Clone)]
pub struct SectionBuckets<'a> {
    buckets: [Vec<&'a str>; 5],
}

impl<'a> SectionBuckets<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, section: Section, line: &'a str) {
        self.buckets[section.index()].push(line);
    }

    /// Lines of a section in original document order
    pub fn lines(&self, section: Section) -> &[&'a str] {
        &self.buckets[section.index()]
    }

    pub fn len(&self, section: Section) -> usize {
        self.buckets[section.index()].len()
    }

    /// Total number of lines held across all sections
    pub fn total_lines(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    /// Newline-join of a section's lines; empty string when the bucket is empty.
    pub fn text(&self, section: Section) -> String {
        self.lines(section).join("\n")
    }

    pub fn into_sections(self) -> ClassifiedSections {
        ClassifiedSections {
            header: self.text(Section::Header),
            thumbnail: self.text(Section::Thumbnail),
            executable: self.text(Section::Executable),
            metadata: self.text(Section::Metadata),
            config: self.text(Section::Config),
        }
    }
}

/// Owned text of every section, as produced by the classifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassifiedSections {
    pub header: String,
    pub thumbnail: String,
    pub executable: String,
    pub metadata: String,
    pub config: String,
}

impl ClassifiedSections {
    pub fn get(&self, section: Section) -> &str {
        match section {
            Section::Header => &self.header,
            Section::Thumbnail => &self.thumbnail,
            Section::Executable => &self.executable,
            Section::Metadata => &self.metadata,
            Section::Config => &self.config,
        }
    }

    /// A section counts as empty when it holds nothing but whitespace.
    pub fn is_empty(&self, section: Section) -> bool {
        self.get(section).trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_lines_keeps_trailing_empty_line() {
        let lines: Vec<&str> = split_lines("G1 X1\nG1 X2\n").collect();
        assert_eq!(lines, vec!["G1 X1", "G1 X2", ""]);
        assert_eq!(lines.join("\n"), "G1 X1\nG1 X2\n");
    }

    #[test]
    fn test_split_lines_keeps_carriage_returns() {
        let lines: Vec<&str> = split_lines("; HEADER_BLOCK_START\r\nG28\r\n").collect();
        assert_eq!(lines, vec!["; HEADER_BLOCK_START\r", "G28\r", ""]);
    }

    #[test]
    fn test_buckets_preserve_insertion_order() {
        let mut buckets = SectionBuckets::new();
        buckets.push(Section::Executable, "G28");
        buckets.push(Section::Header, ";hi");
        buckets.push(Section::Executable, "G1 X1");

        assert_eq!(buckets.lines(Section::Executable), &["G28", "G1 X1"]);
        assert_eq!(buckets.len(Section::Header), 1);
        assert_eq!(buckets.len(Section::Config), 0);
        assert_eq!(buckets.total_lines(), 3);
        assert_eq!(buckets.text(Section::Executable), "G28\nG1 X1");
    }

    #[test]
    fn test_into_sections_empty_buckets_are_empty_strings() {
        let mut buckets = SectionBuckets::new();
        buckets.push(Section::Metadata, "; total layers count = 2");

        let sections = buckets.into_sections();
        assert_eq!(sections.metadata, "; total layers count = 2");
        assert_eq!(sections.header, "");
        assert_eq!(sections.thumbnail, "");
        assert_eq!(sections.executable, "");
        assert_eq!(sections.config, "");
    }

    #[test]
    fn test_whitespace_only_section_is_empty() {
        let sections = ClassifiedSections {
            executable: "\n  \n".to_string(),
            ..Default::default()
        };
        assert!(sections.is_empty(Section::Executable));
        assert!(sections.is_empty(Section::Header));
    }

    #[test]
    fn test_target_order() {
        let names: Vec<&str> = Section::TARGET_ORDER.iter().map(|s| s.as_str()).collect();
        assert_eq!(
            names,
            vec!["header", "metadata", "config", "thumbnail", "executable"]
        );
    }
}
