//! Test pattern geometry and G-code emission.
//!
//! The pattern is laid out in an unrotated coordinate frame and every
//! emitted coordinate is rotated clockwise around the pattern center at the
//! last moment. Coordinates round to 4 decimal places, Z to 3, extrusion
//! amounts to 4; feed rates carry at most 2.

use rust_decimal::Decimal;

use super::glyphs::create_glyphs;
use super::{PatternConfig, PatternOptions};
use crate::error::GcodeError;
use crate::num::{fmt, round_dp};

/// Distance between consecutive test lines, mm.
pub(crate) const LINE_SPACING: f64 = 4.0;

/// The pattern's placement on the bed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatternLayout {
    /// Unrotated pattern width, mm.
    pub size_x: f64,
    /// Unrotated pattern height, mm.
    pub size_y: f64,
    /// Rotation center X.
    pub center_x: f64,
    /// Rotation center Y.
    pub center_y: f64,
    /// Unrotated X of the pattern's left edge.
    pub pat_start_x: f64,
    /// Unrotated Y of the pattern's bottom edge.
    pub pat_start_y: f64,
    /// Axis-aligned width of the rotated pattern, mm.
    pub fit_width: f64,
    /// Axis-aligned height of the rotated pattern, mm.
    pub fit_height: f64,
}

impl PatternLayout {
    fn compute(config: &PatternConfig) -> Self {
        let PatternOptions {
            print_dir,
            length_slow,
            length_fast,
            null_center,
        } = config.options;
        let size_y = config.range.values.len() as f64 * LINE_SPACING + 25.0;
        let size_x = 2.0 * length_slow + length_fast + 8.0;
        let center_x = if null_center { 0.0 } else { config.bed.x as f64 / 2.0 };
        let center_y = if null_center { 0.0 } else { config.bed.y as f64 / 2.0 };
        let rad = print_dir.to_radians();
        Self {
            size_x,
            size_y,
            center_x,
            center_y,
            pat_start_x: center_x - 0.5 * length_fast - length_slow - 4.0,
            pat_start_y: center_y - size_y / 2.0,
            fit_width: (size_x * rad.cos()).abs() + (size_y * rad.sin()).abs(),
            fit_height: (size_x * rad.sin()).abs() + (size_y * rad.cos()).abs(),
        }
    }
}

/// The axis-aligned region the pattern occupies, for print-area commands
/// and object-exclusion polygons.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrintArea {
    /// Left edge, mm.
    pub x: f64,
    /// Bottom edge, mm.
    pub y: f64,
    /// Width, mm.
    pub width: f64,
    /// Height, mm.
    pub height: f64,
}

impl PrintArea {
    /// The rotated pattern's bounding box, centered on the layout center.
    pub fn from_layout(layout: &PatternLayout) -> Self {
        Self {
            x: layout.center_x - layout.fit_width / 2.0,
            y: layout.center_y - layout.fit_height / 2.0,
            width: layout.fit_width,
            height: layout.fit_height,
        }
    }
}

/// Check the rotated pattern against the declared bed size.
///
/// Runs before any emission so an oversized pattern never produces output.
/// Dimensions are ceiled to whole millimeters: a fractional overhang must
/// fail the check, never round down past it.
pub fn validate_pattern_fits(config: &PatternConfig) -> Result<PatternLayout, GcodeError> {
    let layout = PatternLayout::compute(config);
    let width = ceil_whole(layout.fit_width);
    let height = ceil_whole(layout.fit_height);
    if width > config.bed.x as f64 || height > config.bed.y as f64 {
        return Err(GcodeError::PatternExceedsBed {
            width,
            height,
            bed_x: config.bed.x as f64,
            bed_y: config.bed.y as f64,
        });
    }
    Ok(layout)
}

fn ceil_whole(v: f64) -> f64 {
    use rust_decimal::prelude::ToPrimitive;
    // drop trig noise first so an exactly-fitting pattern is not bumped over
    round_dp(v, 4).ceil().to_f64().unwrap_or(v)
}

// ── Emission state ──────────────────────────────────────────────────────

/// Flat emission parameters with all speeds already in mm/min.
pub(super) struct Basic {
    pub(super) slow: f64,
    pub(super) fast: f64,
    pub(super) print: f64,
    pub(super) travel: f64,
    pub(super) travel_z: f64,
    pub(super) print_accel: i64,
    pub(super) travel_accel: i64,
    pub(super) test_accel: i64,
    pub(super) center_x: f64,
    pub(super) center_y: f64,
    pub(super) print_dir: f64,
    pub(super) ext_ratio: f64,
    pub(super) ext_mult: f64,
    pub(super) retract_dist: f64,
    pub(super) deretract_dist: f64,
    pub(super) retract_speed: f64,
    pub(super) deretract_speed: f64,
    pub(super) layer_z: f64,
    pub(super) hop_z: f64,
}

impl Basic {
    fn new(config: &PatternConfig, layout: &PatternLayout) -> Self {
        let d = config.filament_diameter / 2.0;
        Self {
            // the slicer stores mm/s, G-code feeds are mm/min
            slow: config.speed_slow * 60.0,
            fast: config.speed_fast * 60.0,
            print: config.speed_print * 60.0,
            travel: config.travel_speed * 60.0,
            travel_z: config.travel_speed_z * 60.0,
            print_accel: config.print_acceleration,
            travel_accel: config.travel_acceleration,
            test_accel: config.test_acceleration,
            center_x: layout.center_x,
            center_y: layout.center_y,
            print_dir: config.options.print_dir,
            ext_ratio: config.line_width * config.layer_height
                / (d * d * std::f64::consts::PI),
            ext_mult: config.extrusion_multiplier,
            retract_dist: config.retract_dist,
            deretract_dist: config.deretract_dist,
            retract_speed: config.retract_speed * 60.0,
            deretract_speed: config.deretract_speed * 60.0,
            layer_z: config.layer_height,
            hop_z: config.layer_height + config.z_hop_height,
        }
    }
}

// clockwise rotation around the pattern center
fn rotate_x(x: f64, y: f64, b: &Basic) -> f64 {
    let rad = b.print_dir.to_radians();
    rad.cos() * (x - b.center_x) + rad.sin() * (y - b.center_y) + b.center_x
}

fn rotate_y(x: f64, y: f64, b: &Basic) -> f64 {
    let rad = b.print_dir.to_radians();
    rad.cos() * (y - b.center_y) - rad.sin() * (x - b.center_x) + b.center_y
}

/// Extrude a line from the current position to (`x`, `y`).
///
/// `length` drives the extrusion amount and may be negative for lines drawn
/// toward the origin; the extrusion is always positive.
pub(super) fn create_line(
    out: &mut String,
    x: f64,
    y: f64,
    length: f64,
    b: &Basic,
    speed: Option<f64>,
    ext_mult: Option<f64>,
    comment: &str,
) {
    let speed = speed.unwrap_or(b.print);
    let ext = b.ext_ratio * ext_mult.unwrap_or(b.ext_mult) * length.abs();
    out.push_str(&format!(
        "G1 X{} Y{} E{} F{}{comment}",
        fmt(rotate_x(x, y, b), 4),
        fmt(rotate_y(x, y, b), 4),
        fmt(ext, 4),
        fmt(speed, 2),
    ));
}

#[derive(Clone, Copy)]
pub(super) enum Rate {
    Print,
    Travel,
    Test,
}

pub(super) fn set_acceleration(out: &mut String, rate: Rate, b: &Basic) {
    let (accel, name) = match rate {
        Rate::Print => (b.print_accel, "print"),
        Rate::Travel => (b.travel_accel, "travel"),
        Rate::Test => (b.test_accel, "test"),
    };
    // firmwares disagree on which of P/T applies; setting both is the only
    // portable form
    out.push_str(&format!("M204 P{accel} T{accel}; Set {name} acceleration\n"));
}

/// Travel to (`x`, `y`) at travel acceleration, then restore print
/// acceleration for whatever follows.
pub(super) fn move_to(out: &mut String, x: f64, y: f64, b: &Basic) {
    set_acceleration(out, Rate::Travel, b);
    out.push_str(&format!(
        "G1 X{} Y{} F{} ; move to start\n",
        fmt(rotate_x(x, y, b), 4),
        fmt(rotate_y(x, y, b), 4),
        fmt(b.travel, 2),
    ));
    set_acceleration(out, Rate::Print, b);
}

pub(super) fn e_feed(out: &mut String, unretract: bool, b: &Basic) {
    if unretract {
        out.push_str(&format!(
            "G1 E{} F{} ; un-retract\n",
            fmt(b.deretract_dist, 4),
            fmt(b.deretract_speed, 2),
        ));
    } else {
        out.push_str(&format!(
            "G1 E-{} F{} ; retract\n",
            fmt(b.retract_dist, 4),
            fmt(b.retract_speed, 2),
        ));
    }
}

fn z_move(out: &mut String, z: f64, b: &Basic) {
    out.push_str(&format!(
        "G1 Z{} F{} ; zHop\n",
        fmt(z, 3),
        fmt(b.travel_z, 2),
    ));
}

fn advance_str(v: Decimal) -> String {
    v.normalize().to_string()
}

// ── The pattern itself ──────────────────────────────────────────────────

/// Emit the complete calibration pattern.
///
/// The returned string begins and ends with a newline so it can be placed
/// between the original start and end blocks verbatim.
pub fn generate_test_pattern(
    config: &PatternConfig,
    layout: &PatternLayout,
) -> Result<String, GcodeError> {
    let b = Basic::new(config, layout);
    let opts = &config.options;
    let prefix = &config.advance.gcode_prefix;
    let values = &config.range.values;
    let mut out = String::new();

    header(&mut out, config, layout, &b);

    out.push_str(&format!(
        "G92 E0 ; Reset extruder distance\nM106 S{} ; Start print fan\n",
        fmt(config.fan_speed * 2.55, 0),
    ));
    out.push_str(&format!(
        "G1 Z{} F{} ; Move to layer height\n",
        fmt(b.layer_z, 3),
        fmt(b.slow, 2),
    ));

    // anchor frame: aids removal and doubles as a prime line
    let line_width = config.line_width;
    let frame_x1 = layout.pat_start_x;
    let frame_x2 = layout.pat_start_x + 2.0 * opts.length_slow + opts.length_fast;
    let frame_y = layout.pat_start_y - 3.0;
    let frame_len = layout.size_y - 19.0;
    let frame_mult = Some(b.ext_mult * 1.1);

    out.push_str(";\n; print anchor frame\n;\n");
    move_to(&mut out, frame_x1, frame_y, &b);
    create_line(&mut out, frame_x1, frame_y + frame_len, frame_len, &b, None, frame_mult, " ; print line\n");
    move_to(&mut out, frame_x1 + line_width, frame_y + frame_len, &b);
    create_line(&mut out, frame_x1 + line_width, frame_y, -frame_len, &b, None, frame_mult, " ; print line\n");
    e_feed(&mut out, false, &b);
    move_to(&mut out, frame_x2, frame_y, &b);
    e_feed(&mut out, true, &b);
    create_line(&mut out, frame_x2, frame_y + frame_len, frame_len, &b, None, frame_mult, " ; print line\n");
    move_to(&mut out, frame_x2 - line_width, frame_y + frame_len, &b);
    create_line(&mut out, frame_x2 - line_width, frame_y, -frame_len, &b, None, frame_mult, " ; print line\n");
    e_feed(&mut out, false, &b);

    // one line per advance value, slow-fast-slow
    out.push_str(";\n; start the Test pattern\n;\n");
    move_to(&mut out, layout.pat_start_x, layout.pat_start_y, &b);

    let sx = layout.pat_start_x;
    let sy = layout.pat_start_y;
    let mut offset = 0.0;
    for (i, value) in values.iter().enumerate() {
        let shown = advance_str(*value);
        out.push_str(&format!("{prefix}{shown} ; set Pressure Advance\n"));
        out.push_str(&format!("M117 Pressure Advance = {shown} ; \n"));
        e_feed(&mut out, true, &b);
        set_acceleration(&mut out, Rate::Test, &b);
        create_line(&mut out, sx + opts.length_slow, sy + offset, opts.length_slow, &b, Some(b.slow), None, " ; print line\n");
        create_line(&mut out, sx + opts.length_slow + opts.length_fast, sy + offset, opts.length_fast, &b, Some(b.fast), None, " ; print line\n");
        create_line(&mut out, sx + 2.0 * opts.length_slow + opts.length_fast, sy + offset, opts.length_slow, &b, Some(b.slow), None, " ; print line\n");
        set_acceleration(&mut out, Rate::Print, &b);
        e_feed(&mut out, false, &b);
        if i != values.len() - 1 {
            move_to(&mut out, sx, sy + offset + LINE_SPACING, &b);
        }
        offset += LINE_SPACING;
    }
    set_acceleration(&mut out, Rate::Print, &b);

    // park the advance at the lowest test value for the rest of the print
    let first = advance_str(values[0]);
    out.push_str(&format!(
        ";\nM117 Pressure Advance = \n{prefix}{first} ; Set Pressure Advance to minimum test value\n"
    ));

    // reference marks where the speed changes
    let ref_x1 = layout.center_x - 0.5 * opts.length_fast - 4.0;
    let ref_x2 = layout.center_x + 0.5 * opts.length_fast - 4.0;
    let ref_y = layout.center_y + layout.size_y / 2.0 - 20.0;

    out.push_str(";\n; Mark the test area for reference\n");
    move_to(&mut out, ref_x1, ref_y, &b);
    e_feed(&mut out, true, &b);
    create_line(&mut out, ref_x1, ref_y + 20.0, 20.0, &b, None, None, " ; print line\n");
    e_feed(&mut out, false, &b);
    move_to(&mut out, ref_x2, ref_y, &b);
    e_feed(&mut out, true, &b);
    create_line(&mut out, ref_x2, ref_y + 20.0, 20.0, &b, None, None, " ; print line\n");
    e_feed(&mut out, false, &b);
    z_move(&mut out, b.hop_z, &b);

    // label every other line with its advance value
    let num_x = layout.center_x + 0.5 * opts.length_fast + opts.length_slow - 2.0;
    let num_y = layout.pat_start_y - 2.0;

    out.push_str(";\n; print K-value next to lines\n;\n");
    for (i, value) in values.iter().enumerate() {
        if i % 2 != 0 {
            continue;
        }
        let y = num_y + i as f64 * LINE_SPACING;
        move_to(&mut out, num_x, y, &b);
        z_move(&mut out, b.layer_z, &b);
        e_feed(&mut out, true, &b);
        create_glyphs(&mut out, num_x, y, &b, &advance_str(*value))?;
        e_feed(&mut out, false, &b);
        z_move(&mut out, b.hop_z, &b);
    }

    Ok(out)
}

fn header(out: &mut String, config: &PatternConfig, layout: &PatternLayout, b: &Basic) {
    let opts = &config.options;
    out.push_str(&format!(
        "\n; ### Pressure Advance Calibration Pattern ###\n\
         ; -------------------------------------------------\n\
         ;\n\
         ; Printer: {}\n\
         ; Filament: {}\n\
         ;\n\
         ; Settings Printer:\n\
         ; Filament Diameter = {} mm\n\
         ; Nozzle Diameter = {} mm\n\
         ; Filament Temperature = {} C\n\
         ; Retraction Distance = {} mm\n\
         ; Layer Height = {} mm\n\
         ; Extruder = {} \n\
         ; Fan Speed = {} %\n\
         ;\n",
        config.printer,
        config.filament,
        fmt(config.filament_diameter, 4),
        fmt(config.nozzle_diameter, 4),
        fmt(config.filament_temperature, 4),
        fmt(config.retract_dist, 4),
        fmt(config.layer_height, 4),
        config.tool_index,
        fmt(config.fan_speed, 4),
    ));
    out.push_str(&format!(
        "; Settings Print Bed:\n\
         ; Bed Shape = Rectangular\n\
         ; Bed Size X = {} mm\n\
         ; Bed Size Y = {} mm\n\
         ; Origin Bed Center = {}\n\
         ;\n",
        config.bed.x,
        config.bed.y,
        opts.null_center,
    ));
    out.push_str(&format!(
        "; Settings Speed:\n\
         ; Slow Printing Speed = {} mm/min\n\
         ; Fast Printing Speed = {} mm/min\n\
         ; Travel Speed = {} mm/min\n\
         ; Retract Speed = {} mm/min\n\
         ; Unretract Speed = {} mm/min\n\
         ;\n",
        fmt(b.slow, 2),
        fmt(b.fast, 2),
        fmt(b.travel, 2),
        fmt(b.retract_speed, 2),
        fmt(b.deretract_speed, 2),
    ));
    out.push_str(&format!(
        "; Settings Pattern:\n\
         ; Test Line Spacing = {} mm\n\
         ; Test Line Length Slow = {} mm\n\
         ; Test Line Length Fast = {} mm\n\
         ; Print Size X = {} mm\n\
         ; Print Size Y = {} mm\n\
         ; Print Rotation = {} degree\n\
         ;\n\
         ; -------------------------------------------------\n\n",
        fmt(LINE_SPACING, 4),
        fmt(opts.length_slow, 4),
        fmt(opts.length_fast, 4),
        fmt(layout.fit_width, 4),
        fmt(layout.fit_height, 4),
        fmt(opts.print_dir, 4),
    ));
}
