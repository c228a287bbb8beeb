//! Line classifier for OrcaSlicer G-code
//!
//! Performs a single forward pass over the document and assigns each line to
//! one of the five [`Section`]s. Routing is an ordered list of guarded rules:
//! for every line the first rule whose guard holds updates the parser state
//! and decides where the line goes. Marker rules come first, then the
//! routing rules for ordinary lines.
//!
//! Marker detection compares the trimmed line; the original line (including
//! any indentation or `'\r'`) is what lands in the bucket.

use serde::Serialize;

use crate::sections::{ClassifiedSections, Section, SectionBuckets, split_lines};

pub const HEADER_BLOCK_START: &str = "; HEADER_BLOCK_START";
pub const HEADER_BLOCK_END: &str = "; HEADER_BLOCK_END";
pub const CONFIG_BLOCK_START: &str = "; CONFIG_BLOCK_START";
pub const CONFIG_BLOCK_END: &str = "; CONFIG_BLOCK_END";
pub const THUMBNAIL_BLOCK_START: &str = "; THUMBNAIL_BLOCK_START";
pub const THUMBNAIL_BEGIN: &str = "thumbnail begin";
pub const THUMBNAIL_END: &str = "thumbnail end";
pub const EXECUTABLE_BLOCK_END: &str = "; EXECUTABLE_BLOCK_END";

/// Substrings that qualify a trailing comment as metadata (besides `=`).
pub const METADATA_KEYWORDS: [&str; 3] = ["filament used", "estimated", "total"];

/// Which delimited block the scan is currently inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveBlock {
    Header,
    Config,
    #[default]
    Unknown,
    /// Entered at `; EXECUTABLE_BLOCK_END` and never left
    Metadata,
}

/// State carried across lines during one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParserState {
    pub block: ActiveBlock,
    pub in_thumbnail: bool,
    pub executable_started: bool,
    pub executable_ended: bool,
}

/// Why a line was left out of every bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    /// The `; EXECUTABLE_BLOCK_END` marker itself
    ExecutableEndMarker,
    /// Trailing line after the executable block that is not a metadata comment
    MetadataFilter,
    /// Line outside any block after the executable block ended, claimed by no rule
    AfterExecutable,
}

/// Outcome of applying a rule to a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Append(Section),
    Discard(DiscardReason),
}

/// Line counts gathered during classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClassifyStats {
    /// Number of lines in the input (a trailing newline counts as a final empty line)
    pub lines: usize,
    pub discarded_marker: usize,
    pub discarded_metadata: usize,
    pub discarded_after_executable: usize,
}

impl ClassifyStats {
    pub fn discarded(&self) -> usize {
        self.discarded_marker + self.discarded_metadata + self.discarded_after_executable
    }

    fn record(&mut self, reason: DiscardReason) {
        match reason {
            DiscardReason::ExecutableEndMarker => self.discarded_marker += 1,
            DiscardReason::MetadataFilter => self.discarded_metadata += 1,
            DiscardReason::AfterExecutable => self.discarded_after_executable += 1,
        }
    }
}

/// Buckets borrowed from the input, plus the counts of what was dropped.
#[derive(Debug, Clone)]
pub struct Classification<'a> {
    pub buckets: SectionBuckets<'a>,
    pub stats: ClassifyStats,
    pub state: ParserState,
}

impl Classification<'_> {
    pub fn into_sections(self) -> ClassifiedSections {
        self.buckets.into_sections()
    }
}

/// A guarded routing rule.
struct Rule {
    name: &'static str,
    applies: fn(&ParserState, &str) -> bool,
    update: fn(&mut ParserState),
    route: fn(&str) -> Route,
}

static RULES: &[Rule] = &[
    // Structural markers
    Rule {
        name: "header_start",
        applies: |_, line| line == HEADER_BLOCK_START,
        update: |state| state.block = ActiveBlock::Header,
        route: |_| Route::Append(Section::Header),
    },
    Rule {
        name: "header_end",
        applies: |_, line| line == HEADER_BLOCK_END,
        update: |state| state.block = ActiveBlock::Unknown,
        route: |_| Route::Append(Section::Header),
    },
    Rule {
        name: "config_start",
        applies: |_, line| line == CONFIG_BLOCK_START,
        update: |state| state.block = ActiveBlock::Config,
        route: |_| Route::Append(Section::Config),
    },
    Rule {
        name: "config_end",
        applies: |_, line| line == CONFIG_BLOCK_END,
        update: |state| state.block = ActiveBlock::Unknown,
        route: |_| Route::Append(Section::Config),
    },
    Rule {
        name: "thumbnail_block_start",
        applies: |_, line| line == THUMBNAIL_BLOCK_START,
        update: |state| state.in_thumbnail = true,
        route: |_| Route::Append(Section::Thumbnail),
    },
    Rule {
        name: "thumbnail_begin",
        applies: |_, line| line.contains(THUMBNAIL_BEGIN),
        update: |state| state.in_thumbnail = true,
        route: |_| Route::Append(Section::Thumbnail),
    },
    Rule {
        name: "thumbnail_end",
        applies: |_, line| line.contains(THUMBNAIL_END),
        update: |state| state.in_thumbnail = false,
        route: |_| Route::Append(Section::Thumbnail),
    },
    Rule {
        name: "executable_end",
        applies: |_, line| line == EXECUTABLE_BLOCK_END,
        update: |state| {
            state.executable_ended = true;
            state.block = ActiveBlock::Metadata;
        },
        route: |_| Route::Discard(DiscardReason::ExecutableEndMarker),
    },
    // Ordinary lines
    Rule {
        name: "in_header",
        applies: |state, _| state.block == ActiveBlock::Header,
        update: |_| {},
        route: |_| Route::Append(Section::Header),
    },
    Rule {
        name: "in_config",
        applies: |state, _| state.block == ActiveBlock::Config,
        update: |_| {},
        route: |_| Route::Append(Section::Config),
    },
    Rule {
        name: "in_thumbnail",
        applies: |state, _| state.in_thumbnail,
        update: |_| {},
        route: |_| Route::Append(Section::Thumbnail),
    },
    Rule {
        name: "trailing_metadata",
        applies: |state, _| state.executable_ended && state.block == ActiveBlock::Metadata,
        update: |_| {},
        route: |line| {
            if is_metadata_line(line) {
                Route::Append(Section::Metadata)
            } else {
                Route::Discard(DiscardReason::MetadataFilter)
            }
        },
    },
    Rule {
        name: "first_instruction",
        applies: |state, line| {
            !state.executable_started && !line.is_empty() && !line.starts_with(';')
        },
        update: |state| state.executable_started = true,
        route: |_| Route::Append(Section::Executable),
    },
    Rule {
        name: "executable_body",
        applies: |state, _| state.executable_started && !state.executable_ended,
        update: |_| {},
        route: |_| Route::Append(Section::Executable),
    },
    Rule {
        name: "before_executable",
        applies: |state, _| state.block == ActiveBlock::Unknown && !state.executable_ended,
        update: |_| {},
        route: |_| Route::Append(Section::Executable),
    },
];

/// Whether a trimmed line after `; EXECUTABLE_BLOCK_END` belongs in the metadata section.
///
/// The line must be a comment and either contain `=` or one of
/// [`METADATA_KEYWORDS`].
pub fn is_metadata_line(trimmed: &str) -> bool {
    trimmed.starts_with(';')
        && (trimmed.contains('=') || METADATA_KEYWORDS.iter().any(|kw| trimmed.contains(kw)))
}

/// Classify a document into its five sections.
///
/// Never fails: a document without markers ends up entirely in the
/// executable section.
pub fn classify(content: &str) -> ClassifiedSections {
    classify_lines(content).into_sections()
}

/// Classify a document, keeping the borrowed buckets and discard counts.
pub fn classify_lines(content: &str) -> Classification<'_> {
    let mut state = ParserState::default();
    let mut buckets = SectionBuckets::new();
    let mut stats = ClassifyStats::default();

    for (line_idx, line) in split_lines(content).enumerate() {
        stats.lines += 1;
        let trimmed = line.trim();

        let route = match RULES.iter().find(|rule| (rule.applies)(&state, trimmed)) {
            Some(rule) => {
                (rule.update)(&mut state);
                let route = (rule.route)(trimmed);
                tracing::trace!(line = line_idx, rule = rule.name, ?route, "classified line");
                route
            }
            None => Route::Discard(DiscardReason::AfterExecutable),
        };

        match route {
            Route::Append(section) => buckets.push(section, line),
            Route::Discard(reason) => stats.record(reason),
        }
    }

    tracing::debug!(
        lines = stats.lines,
        header = buckets.len(Section::Header),
        thumbnail = buckets.len(Section::Thumbnail),
        executable = buckets.len(Section::Executable),
        metadata = buckets.len(Section::Metadata),
        config = buckets.len(Section::Config),
        discarded = stats.discarded(),
        "classification complete"
    );

    Classification {
        buckets,
        stats,
        state,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_executable_metadata() {
        let content = "; HEADER_BLOCK_START\n;hi\n; HEADER_BLOCK_END\nG1 X1\n; EXECUTABLE_BLOCK_END\n;filament used = 1.2g";
        let sections = classify(content);

        assert_eq!(
            sections.header,
            "; HEADER_BLOCK_START\n;hi\n; HEADER_BLOCK_END"
        );
        assert_eq!(sections.executable, "G1 X1");
        assert_eq!(sections.metadata, ";filament used = 1.2g");
        assert_eq!(sections.config, "");
        assert_eq!(sections.thumbnail, "");
    }

    #[test]
    fn test_no_markers_goes_to_executable() {
        let content = "G28\nG1 X10 Y10\n; comment\nM104 S200";
        let sections = classify(content);
        assert_eq!(sections.executable, content);
        assert_eq!(sections.header, "");
        assert_eq!(sections.metadata, "");
    }

    #[test]
    fn test_empty_input() {
        let classification = classify_lines("");
        assert_eq!(classification.stats.lines, 1);
        assert_eq!(classification.buckets.lines(Section::Executable), &[""]);
        assert!(classification.into_sections().is_empty(Section::Executable));
    }

    #[test]
    fn test_comments_before_first_instruction_are_executable() {
        let content = "; orphan\n\n; another\nG28\n; in body";
        let classification = classify_lines(content);
        assert_eq!(
            classification.buckets.lines(Section::Executable),
            &["; orphan", "", "; another", "G28", "; in body"]
        );
        assert!(classification.state.executable_started);
    }

    #[test]
    fn test_thumbnail_block() {
        let content = "; THUMBNAIL_BLOCK_START\n;\n; thumbnail begin 4x4 64\n; iVBORw0KGgo\n; thumbnail end\n; THUMBNAIL_BLOCK_END\nG28";
        let classification = classify_lines(content);

        assert_eq!(
            classification.buckets.lines(Section::Thumbnail),
            &[
                "; THUMBNAIL_BLOCK_START",
                ";",
                "; thumbnail begin 4x4 64",
                "; iVBORw0KGgo",
                "; thumbnail end",
            ]
        );
        // THUMBNAIL_BLOCK_END is not a marker; it is an orphaned comment
        assert_eq!(
            classification.buckets.lines(Section::Executable),
            &["; THUMBNAIL_BLOCK_END", "G28"]
        );
        assert!(!classification.state.in_thumbnail);
    }

    #[test]
    fn test_thumbnail_begin_without_block_start() {
        let content = "; thumbnail begin 2x2 8\n; AAAA\n; thumbnail end\nG1 X1";
        let sections = classify(content);
        assert_eq!(
            sections.thumbnail,
            "; thumbnail begin 2x2 8\n; AAAA\n; thumbnail end"
        );
        assert_eq!(sections.executable, "G1 X1");
    }

    #[test]
    fn test_config_block_after_metadata() {
        let content = "G28\n; EXECUTABLE_BLOCK_END\n; estimated printing time = 1h\n; CONFIG_BLOCK_START\n; layer_height = 0.2\n; CONFIG_BLOCK_END";
        let sections = classify(content);
        assert_eq!(sections.metadata, "; estimated printing time = 1h");
        assert_eq!(
            sections.config,
            "; CONFIG_BLOCK_START\n; layer_height = 0.2\n; CONFIG_BLOCK_END"
        );
        assert_eq!(sections.executable, "G28");
    }

    #[test]
    fn test_metadata_filter_discards_non_matching_lines() {
        let content = "G28\n; EXECUTABLE_BLOCK_END\n; filament used [g] = 0.37\n; plain note\nM84\n\n; total layers count = 12\n; estimated first layer time 30s";
        let classification = classify_lines(content);

        assert_eq!(
            classification.buckets.lines(Section::Metadata),
            &[
                "; filament used [g] = 0.37",
                "; total layers count = 12",
                "; estimated first layer time 30s",
            ]
        );
        // "; plain note", "M84" and the blank line
        assert_eq!(classification.stats.discarded_metadata, 3);
        assert_eq!(classification.stats.discarded_marker, 1);
        assert_eq!(classification.buckets.lines(Section::Executable), &["G28"]);
    }

    #[test]
    fn test_lines_after_config_end_following_executable_are_dropped() {
        let content = "G28\n; EXECUTABLE_BLOCK_END\n; CONFIG_BLOCK_START\n; a = 1\n; CONFIG_BLOCK_END\n; stray\n";
        let classification = classify_lines(content);
        // "; stray" and the trailing empty line
        assert_eq!(classification.stats.discarded_after_executable, 2);
        assert_eq!(classification.buckets.len(Section::Config), 3);
    }

    #[test]
    fn test_first_instruction_after_executable_end_is_still_claimed() {
        // With no instruction before the end marker, the first-instruction
        // rule still applies once the config block closes.
        let content = "; EXECUTABLE_BLOCK_END\n; CONFIG_BLOCK_START\n; CONFIG_BLOCK_END\nG28\nG1 X1";
        let classification = classify_lines(content);
        assert_eq!(classification.buckets.lines(Section::Executable), &["G28"]);
        assert_eq!(classification.stats.discarded_after_executable, 1);
    }

    #[test]
    fn test_marker_inside_header_is_consumed_as_marker() {
        let content = "; HEADER_BLOCK_START\n; thumbnail begin\n; HEADER_BLOCK_END";
        let classification = classify_lines(content);
        assert_eq!(classification.buckets.len(Section::Header), 2);
        assert_eq!(
            classification.buckets.lines(Section::Thumbnail),
            &["; thumbnail begin"]
        );
        // Thumbnail stays open after the header block closes
        assert!(classification.state.in_thumbnail);
    }

    #[test]
    fn test_markers_match_after_trimming() {
        let content = "  ; HEADER_BLOCK_START\r\n;x\r\n; HEADER_BLOCK_END  \r\nG28\r";
        let sections = classify(content);
        assert_eq!(
            sections.header,
            "  ; HEADER_BLOCK_START\r\n;x\r\n; HEADER_BLOCK_END  \r"
        );
        assert_eq!(sections.executable, "G28\r");
    }

    #[test]
    fn test_already_restructured_document_degrades() {
        let content = "; HEADER_BLOCK_START\n; HEADER_BLOCK_END\n\n; filament used [g] = 1.0\n\n; CONFIG_BLOCK_START\n; CONFIG_BLOCK_END\n\nG28";
        let classification = classify_lines(content);
        assert!(!classification.state.executable_ended);
        assert_eq!(classification.buckets.len(Section::Metadata), 0);
        assert_eq!(
            classification.buckets.lines(Section::Executable),
            &["", "; filament used [g] = 1.0", "", "", "G28"]
        );
        assert_eq!(classification.stats.discarded(), 0);
    }

    #[test]
    fn test_every_line_accounted_for() {
        let content = "; HEADER_BLOCK_START\n;h\n; HEADER_BLOCK_END\n\nG28\n; EXECUTABLE_BLOCK_END\n; x = 1\n; nope\n; CONFIG_BLOCK_START\n;c\n; CONFIG_BLOCK_END\n";
        let classification = classify_lines(content);
        assert_eq!(
            classification.buckets.total_lines() + classification.stats.discarded(),
            classification.stats.lines
        );
    }

    #[test]
    fn test_is_metadata_line() {
        assert!(is_metadata_line("; filament_density = 1.24"));
        assert!(is_metadata_line(";filament used [mm] 120"));
        assert!(is_metadata_line("; estimated printing time 10m"));
        assert!(is_metadata_line("; total filament weight 3g"));
        assert!(!is_metadata_line("; layer change"));
        assert!(!is_metadata_line("G1 X1 ; total"));
        assert!(!is_metadata_line(""));
    }
}
