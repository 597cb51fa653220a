//! Structural errors for the calibration pipeline.
//!
//! These abort the current pipeline stage immediately, in contrast to
//! per-setting extraction problems, which are collected as diagnostics on
//! the settings bundle and never raised individually.

use thiserror::Error;

/// Errors that abort a pipeline stage.
///
/// Every variant carries enough context to tell the user which key, line,
/// or measurement is at fault; no failure path is silently swallowed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GcodeError {
    /// One of the two object anchor markers was not found in the input.
    #[error(
        "could not locate object bounds: missing `{0}` marker line; check the printer's custom G-code settings"
    )]
    MissingMarker(&'static str),

    /// A template block was opened but never closed on the same line.
    #[error("malformed template: opened block `{open}` without closing `{close}` in line `{line}`")]
    UnterminatedBlock {
        /// The line containing the unterminated block.
        line: String,
        /// The opening bracket character.
        open: char,
        /// The expected closing bracket character.
        close: char,
    },

    /// A template placeholder referenced a variable with no replacement.
    #[error("unknown template variable `{0}`")]
    UnknownVariable(String),

    /// A template placeholder's index exceeds the replacement list.
    #[error("template variable `{variable}[{index}]` is out of range ({len} value(s) available)")]
    IndexOutOfRange {
        /// The placeholder's variable name.
        variable: String,
        /// The requested 0-based index.
        index: usize,
        /// The replacement list length.
        len: usize,
    },

    /// The `gcode_flavor` setting names a firmware this tool cannot drive.
    #[error("firmware flavor `{0}` is not supported")]
    UnsupportedFirmware(String),

    /// The requested pressure-advance range is not usable.
    #[error(
        "invalid range: start must be non-negative, both bounds finite, and end must exceed start by at least 0.01"
    )]
    InvalidRange,

    /// No candidate step size yields a test line count in the 10..=30 band.
    #[error("no suitable step size yields 10-30 test lines for the range {start}..{end}")]
    NoSuitableStep {
        /// Requested range start.
        start: f64,
        /// Requested range end.
        end: f64,
    },

    /// A setting needed for pattern derivation has no usable value.
    #[error("setting `{0}` has no usable value")]
    MissingSetting(&'static str),

    /// Neither volumetric flow limit setting carries a positive value.
    #[error(
        "no volumetric flow rate limit found (checked `filament_max_volumetric_speed` and `max_volumetric_speed`)"
    )]
    NoFlowLimit,

    /// The rotated pattern bounding box does not fit the declared bed.
    #[error(
        "test pattern size (x: {width}mm, y: {height}mm) exceeds the bed's usable size (x: {bed_x}mm, y: {bed_y}mm)"
    )]
    PatternExceedsBed {
        /// Rotated pattern width, mm.
        width: f64,
        /// Rotated pattern height, mm.
        height: f64,
        /// Declared bed X size, mm.
        bed_x: f64,
        /// Declared bed Y size, mm.
        bed_y: f64,
    },

    /// A test value contains a character with no stroke table.
    #[error("no glyph strokes defined for character `{0}`")]
    UnknownGlyph(char),

    /// The input is a binary G-code export.
    #[error(
        "binary G-code files are not supported; disable binary G-code in the slicer and export plain text"
    )]
    BinaryGcode,

    /// The settings bundle is unusable for generation.
    #[error("slicer settings are incomplete: {0} error(s) in the settings block")]
    SettingsInvalid(usize),
}
