//! Input G-code handling: line splitting, settings extraction, and locating
//! the slicer's start/end blocks.

use crate::error::GcodeError;
use crate::settings::{RawSettings, SlicerSettings};

/// Marker comment the slicer emits after the first layer change; everything
/// before it is the start block.
pub const START_MARKER: &str = ";AFTER_LAYER_CHANGE";

/// Marker comment opening the filament end block; everything from it onward
/// is the end block.
pub const END_MARKER: &str = "; Filament-specific end gcode";

/// A parsed input file: its lines plus the extracted settings bundle.
#[derive(Debug)]
pub struct GcodeDocument {
    /// All input lines, with `;TYPE:Custom` lines removed.
    pub lines: Vec<String>,
    /// The raw `; key = value` map.
    pub raw_settings: RawSettings,
    /// The typed settings bundle.
    pub settings: SlicerSettings,
}

/// The start and end blocks of the input, as line index ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectBounds {
    /// Lines `0..start_end` form the start block (exclusive of the marker).
    pub start_end: usize,
    /// Lines `end_start..` form the end block (inclusive of the marker).
    pub end_start: usize,
}

impl GcodeDocument {
    /// Parse an exported G-code file.
    ///
    /// Rejects `.bgcode` file names outright; everything else is split on
    /// `\r?\n` and scanned for settings. `;TYPE:Custom` lines are dropped
    /// because the slicer's own G-code viewer refuses files containing them.
    pub fn parse(input: &str, file_name: &str) -> Result<Self, GcodeError> {
        if file_name.ends_with(".bgcode") {
            return Err(GcodeError::BinaryGcode);
        }
        let lines: Vec<String> = input
            .split('\n')
            .map(|l| l.strip_suffix('\r').unwrap_or(l).to_string())
            .filter(|l| l != ";TYPE:Custom")
            .collect();
        let raw_settings = RawSettings::extract(input);
        let settings = SlicerSettings::from_raw(&raw_settings);
        Ok(Self {
            lines,
            raw_settings,
            settings,
        })
    }

    /// Locate the start and end blocks around the sliced object.
    ///
    /// The start marker is searched forward (first occurrence) and the end
    /// marker backward (last occurrence), so an object containing either
    /// string in a comment cannot confuse the split.
    pub fn object_bounds(&self) -> Result<ObjectBounds, GcodeError> {
        let start_end = self
            .lines
            .iter()
            .position(|l| l == START_MARKER)
            .ok_or(GcodeError::MissingMarker(START_MARKER))?;
        let end_start = self
            .lines
            .iter()
            .rposition(|l| l == END_MARKER)
            .ok_or(GcodeError::MissingMarker(END_MARKER))?;
        Ok(ObjectBounds {
            start_end,
            end_start,
        })
    }

    /// The start block lines (everything before the start marker).
    pub fn start_lines(&self, bounds: ObjectBounds) -> Vec<String> {
        self.lines[..bounds.start_end].to_vec()
    }

    /// The end block lines (the end marker and everything after it).
    pub fn end_lines(&self, bounds: ObjectBounds) -> Vec<String> {
        self.lines[bounds.end_start..].to_vec()
    }
}
