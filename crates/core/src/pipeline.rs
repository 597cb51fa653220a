//! The host-facing one-shot pipeline: input text in, spliced G-code out.

use crate::document::GcodeDocument;
use crate::error::GcodeError;
use crate::firmware::{flavor_of, select_advance_command};
use crate::pattern::{
    PatternConfig, PatternOptions, PrintArea, generate_test_pattern, validate_pattern_fits,
};
use crate::range::AdvanceRange;
use crate::splice::prepare_start_end;

/// How the advance range is chosen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RangeMode {
    /// Preset for direct-drive extruders: 0 to 0.2.
    DirectDrive,
    /// Preset for bowden extruders: 0 to 2.0.
    Bowden,
    /// Explicit numeric bounds, validated like the presets.
    Custom {
        /// Range start.
        start: f64,
        /// Range end.
        end: f64,
    },
}

impl RangeMode {
    fn bounds(self) -> (f64, f64) {
        match self {
            Self::DirectDrive => (0.0, 0.2),
            Self::Bowden => (0.0, 2.0),
            Self::Custom { start, end } => (start, end),
        }
    }
}

/// Everything the host can adjust for a generation run.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Advance range selection.
    pub range: RangeMode,
    /// Pattern geometry knobs.
    pub pattern: PatternOptions,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            range: RangeMode::DirectDrive,
            pattern: PatternOptions::default(),
        }
    }
}

/// Generate a complete calibration print from an exported G-code file.
///
/// The returned text is the original start block (patched for the test),
/// the generated pattern, and the original end block. Any settings problem
/// or structural failure aborts with no output; the function is pure and
/// deterministic for a given input.
pub fn generate(
    input: &str,
    file_name: &str,
    opts: &GenerateOptions,
) -> Result<String, GcodeError> {
    let doc = GcodeDocument::parse(input, file_name)?;
    let settings = &doc.settings;
    if settings.error_count > 0 || !settings.has_all_required {
        return Err(GcodeError::SettingsInvalid(settings.error_count));
    }
    let bounds = doc.object_bounds()?;

    let (start, end) = opts.range.bounds();
    let range = AdvanceRange::compute(start, end)?;

    let flavor = flavor_of(settings.gcode_flavor.resolved()?)?;
    let advance = select_advance_command(
        flavor,
        settings.printer_model.resolved()?,
        settings.tool_index()?,
    );

    let config = PatternConfig::derive(settings, range, advance, opts.pattern.clone())?;
    // fit check runs before any emission
    let layout = validate_pattern_fits(&config)?;
    let pattern = generate_test_pattern(&config, &layout)?;
    let area = PrintArea::from_layout(&layout);

    let mut start_block = doc.start_lines(bounds);
    let mut end_block = doc.end_lines(bounds);
    let start_gcode = settings.start_gcode.resolved()?.clone();
    prepare_start_end(
        &mut start_block,
        &mut end_block,
        flavor,
        &start_gcode,
        &config,
        &area,
    )?;

    // the pattern begins and ends with a newline, so plain concatenation
    // keeps every line intact
    Ok(format!(
        "{}{}{}",
        start_block.join("\n"),
        pattern,
        end_block.join("\n")
    ))
}

/// Parse and validate a file without generating anything.
///
/// Hosts use this to show the settings report before the user commits to a
/// range.
pub fn inspect(input: &str, file_name: &str) -> Result<GcodeDocument, GcodeError> {
    GcodeDocument::parse(input, file_name)
}
