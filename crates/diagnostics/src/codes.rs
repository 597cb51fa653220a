//! Diagnostic ID constants.
//!
//! Use these instead of string literals to get compile-time typo detection
//! and IDE autocomplete. The numbering groups codes by concern:
//! `PA10xx` — per-setting extraction failures, `PA11xx` — bed geometry.

/// A required slicer setting was not found in the file's comment block.
pub const REQUIRED_MISSING: &str = "PA1001";
/// A setting's raw text could not be parsed as a number.
pub const NOT_A_NUMBER: &str = "PA1002";
/// A tool-indexed setting could not be unpacked because the tool index is
/// unknown (`perimeter_extruder` missing or invalid).
pub const TOOL_INDEX_UNKNOWN: &str = "PA1003";
/// A tool-indexed setting's value list has fewer entries than the tool index.
pub const TOOL_ENTRY_MISSING: &str = "PA1004";

/// `bed_shape` does not describe four corner coordinates (round beds).
pub const BED_SHAPE_UNSUPPORTED: &str = "PA1101";
/// `bed_shape` is rectangular but not anchored at the `0x0` origin.
pub const BED_ORIGIN_NONZERO: &str = "PA1102";
