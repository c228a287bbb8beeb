//! Descriptive values read from the header and metadata sections

use serde::Serialize;

/// One `; key = value` metadata comment. Both sides are kept as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetadataEntry {
    pub key: String,
    pub value: String,
}

/// Extract the `key = value` comments from a metadata section.
///
/// Lines are split at the first `=`; lines without one (e.g. `; total
/// estimated time: 43m`) are not entries.
pub fn entries(metadata: &str) -> Vec<MetadataEntry> {
    metadata
        .lines()
        .filter_map(|line| {
            let comment = line.trim().strip_prefix(';')?;
            let (key, value) = comment.split_once('=')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            Some(MetadataEntry {
                key: key.to_string(),
                value: value.trim().to_string(),
            })
        })
        .collect()
}

/// Producer named on the `; generated by <name> <version> ...` header line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlicerInfo {
    pub name: String,
    pub version: Option<String>,
}

impl std::fmt::Display for SlicerInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{} {version}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// Find the `; generated by` line in a header section.
pub fn slicer_info(header: &str) -> Option<SlicerInfo> {
    header.lines().find_map(|line| {
        let comment = line.trim().strip_prefix(';')?.trim();
        let rest = comment.strip_prefix("generated by ")?;
        let mut words = rest.split_whitespace();
        let name = words.next()?;
        Some(SlicerInfo {
            name: name.to_string(),
            version: words.next().map(str::to_string),
        })
    })
}

/// Estimated print time as written in the metadata section.
///
/// Understands `; estimated printing time (normal mode) = 37m 30s` and the
/// older `; model printing time: 43m 42s; total estimated time: 43m 42s`.
/// The first form wins when both are present.
pub fn estimated_time(metadata: &str) -> Option<String> {
    let mut older = None;
    for line in metadata.lines() {
        let Some(comment) = line.trim().strip_prefix(';') else {
            continue;
        };
        if comment.contains("estimated printing time") {
            if let Some((_, value)) = comment.split_once('=') {
                let value = value.trim();
                if !value.is_empty() {
                    return Some(value.to_string());
                }
            }
        }
        if older.is_none() {
            if let Some((_, rest)) = comment.split_once("total estimated time:") {
                let value = rest.split(';').next().unwrap_or_default().trim();
                if !value.is_empty() {
                    older = Some(value.to_string());
                }
            }
        }
    }
    older
}
