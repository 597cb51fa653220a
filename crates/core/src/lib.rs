//! Pressure-advance calibration G-code generation.
//!
//! This crate turns a G-code file exported by a slicer into a pressure
//! advance (K-factor) calibration print. It reads the slicer's embedded
//! settings comments, derives a test configuration from them, emits a
//! line-per-value test pattern, and splices the pattern between the
//! original file's start and end G-code blocks so the print runs with the
//! user's own heating and homing routines.
//!
//! The main entry points are [`generate`] for the full one-shot pipeline
//! and [`inspect`] for settings extraction and validation on its own.
//! Everything is pure and synchronous; a given input always produces the
//! same output bytes.

mod document;
mod error;
mod firmware;
mod num;
mod pattern;
mod pipeline;
mod range;
mod settings;
mod splice;
mod template;

pub use document::{END_MARKER, GcodeDocument, ObjectBounds, START_MARKER};
pub use error::GcodeError;
pub use firmware::{AdvanceCommand, Flavor, flavor_of, select_advance_command};
pub use pattern::{
    PatternConfig, PatternLayout, PatternOptions, PrintArea, generate_test_pattern,
    validate_pattern_fits,
};
pub use pipeline::{GenerateOptions, RangeMode, generate, inspect};
pub use range::AdvanceRange;
pub use settings::{BedShape, RawEntry, RawSettings, Setting, SettingReport, SlicerSettings};
pub use template::{Block, Replacements, evaluate_gcode_template, join_blocks, render_blocks, split_to_blocks};
