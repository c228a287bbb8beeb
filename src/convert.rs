//! In-place conversion of a G-code file
//!
//! Reads the whole document, writes a verbatim backup next to it, restructures
//! it and overwrites the original. A failed overwrite is followed by an
//! attempt to put the backup content back.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::classifier::{ClassifyStats, classify_lines};
use crate::config::{Config, DEFAULT_BACKUP_SUFFIX};
use crate::layout::Layout;
use crate::reassembler::reassemble_sections;

/// Storage the converter reads from and writes to.
pub trait DocumentStore {
    fn exists(&self, path: &Path) -> bool;
    fn read(&self, path: &Path) -> io::Result<String>;
    /// Replace the content at `path`; must be durable when it returns `Ok`.
    fn write(&self, path: &Path, content: &str) -> io::Result<()>;
}

/// [`DocumentStore`] backed by the local filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct FsStore;

impl DocumentStore for FsStore {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write(&self, path: &Path, content: &str) -> io::Result<()> {
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()
    }
}

/// Conversion options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Write a backup copy before overwriting
    pub backup: bool,
    /// Suffix appended to the file name of the backup copy
    pub backup_suffix: String,
    /// Restructure without writing anything
    pub dry_run: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            backup: true,
            backup_suffix: DEFAULT_BACKUP_SUFFIX.to_string(),
            dry_run: false,
        }
    }
}

impl From<&Config> for ConvertOptions {
    fn from(config: &Config) -> Self {
        Self {
            backup: config.backup.enabled,
            backup_suffix: config.backup.suffix.clone(),
            dry_run: false,
        }
    }
}

/// What happened to the backup copy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupOutcome {
    Created(PathBuf),
    /// Backup could not be written; conversion went ahead without it
    Failed { path: PathBuf, reason: String },
    Skipped,
}

/// What happened after a failed overwrite
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    Restored,
    /// Restoring from the backup failed too; the file needs manual attention
    Failed(String),
    /// No backup was available to restore from
    NotAttempted,
}

impl std::fmt::Display for RestoreOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RestoreOutcome::Restored => f.write_str("original file restored from backup"),
            RestoreOutcome::Failed(reason) => write!(
                f,
                "failed to restore backup ({reason}), manual intervention required"
            ),
            RestoreOutcome::NotAttempted => f.write_str("no backup available to restore"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("file {} does not exist", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}: {source}; {restore}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
        restore: RestoreOutcome,
    },
}

/// Result of a successful conversion
#[derive(Debug, Clone)]
pub struct ConversionReport {
    pub layout: Layout,
    pub stats: ClassifyStats,
    pub backup: BackupOutcome,
    /// The restructured document
    pub output: String,
    /// Whether `output` was written over the original file
    pub written: bool,
}

/// Path of the backup copy: the suffix is appended to the full file name.
pub fn backup_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

/// Converts G-code files in place through a [`DocumentStore`].
#[derive(Debug, Clone)]
pub struct Converter<S = FsStore> {
    store: S,
    options: ConvertOptions,
}

impl Converter<FsStore> {
    pub fn new(options: ConvertOptions) -> Self {
        Self::with_store(FsStore, options)
    }
}

impl<S: DocumentStore> Converter<S> {
    pub fn with_store(store: S, options: ConvertOptions) -> Self {
        Self { store, options }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Read, back up, restructure and overwrite `path`.
    pub fn convert(&self, path: &Path) -> Result<ConversionReport, ConvertError> {
        if !self.store.exists(path) {
            return Err(ConvertError::NotFound(path.to_path_buf()));
        }

        let original = self.store.read(path).map_err(|source| ConvertError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let layout = Layout::detect(&original);
        if !layout.needs_conversion() {
            tracing::warn!(
                "{} looks like {layout} output rather than OrcaSlicer; converting anyway",
                path.display()
            );
        }

        let backup = if self.options.backup && !self.options.dry_run {
            self.create_backup(path, &original)
        } else {
            BackupOutcome::Skipped
        };

        let classification = classify_lines(&original);
        let stats = classification.stats;
        let output = reassemble_sections(&classification.into_sections());

        tracing::debug!(
            bytes_in = original.len(),
            bytes_out = output.len(),
            discarded = stats.discarded(),
            "restructured document"
        );

        if self.options.dry_run {
            return Ok(ConversionReport {
                layout,
                stats,
                backup,
                output,
                written: false,
            });
        }

        if let Err(source) = self.store.write(path, &output) {
            let restore = self.restore(path, &backup);
            tracing::error!("failed to write {}: {source}; {restore}", path.display());
            return Err(ConvertError::Write {
                path: path.to_path_buf(),
                source,
                restore,
            });
        }

        tracing::info!("converted {}", path.display());

        Ok(ConversionReport {
            layout,
            stats,
            backup,
            output,
            written: true,
        })
    }

    fn create_backup(&self, path: &Path, original: &str) -> BackupOutcome {
        let backup = backup_path(path, &self.options.backup_suffix);
        if backup == path {
            tracing::warn!(
                "backup path {} is the file being converted; skipping backup",
                backup.display()
            );
            return BackupOutcome::Failed {
                path: backup,
                reason: "backup path is the same as the file being converted".to_string(),
            };
        }
        match self.store.write(&backup, original) {
            Ok(()) => {
                tracing::debug!("backup written to {}", backup.display());
                BackupOutcome::Created(backup)
            }
            Err(e) => {
                tracing::warn!("could not create backup {}: {e}", backup.display());
                BackupOutcome::Failed {
                    path: backup,
                    reason: e.to_string(),
                }
            }
        }
    }

    fn restore(&self, path: &Path, backup: &BackupOutcome) -> RestoreOutcome {
        let BackupOutcome::Created(backup) = backup else {
            return RestoreOutcome::NotAttempted;
        };
        if !self.store.exists(backup) {
            return RestoreOutcome::NotAttempted;
        }

        let restored = self
            .store
            .read(backup)
            .and_then(|content| self.store.write(path, &content));

        match restored {
            Ok(()) => RestoreOutcome::Restored,
            Err(e) => RestoreOutcome::Failed(e.to_string()),
        }
    }
}
