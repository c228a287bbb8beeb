//! gcode-reorder - G-code section reordering for FlashForge printers
//!
//! OrcaSlicer writes its filament and time estimates after the executable
//! block, where FlashForge firmware does not look for them. This crate
//! classifies every line of a document into header, thumbnail, executable,
//! metadata and config sections and re-emits them in the Orca-FlashForge
//! order: header, metadata, config, thumbnail, executable.

pub mod classifier;
pub mod config;
pub mod convert;
pub mod layout;
pub mod metadata;
pub mod reassembler;
pub mod reports;
pub mod sections;

pub use classifier::{classify, classify_lines};
pub use reassembler::{reassemble, restructure};
pub use sections::{ClassifiedSections, Section};
