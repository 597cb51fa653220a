//! Rewriting the slicer's start and end blocks around the test pattern.
//!
//! The sliced object is discarded; its start block is kept but patched so
//! the printer heats to the test temperature and, where the firmware
//! supports it, knows the real print area. Klipper start blocks are
//! rebuilt from the `start_gcode` template instead, because the slicer
//! bakes object-specific commands into them that would fight the test.

use std::collections::BTreeMap;

use crate::error::GcodeError;
use crate::firmware::Flavor;
use crate::num::fmt;
use crate::pattern::{PatternConfig, PrintArea};
use crate::template::evaluate_gcode_template;

/// Object name used for Klipper's exclude-object bookkeeping.
const OBJECT_NAME: &str = "pressure_advance_calibration_test";

/// Rewrite the last hotend temperature wait (`M109 ... S<temp>`) in the
/// start block, or append one when the block never waits on temperature.
///
/// Scanning runs backward so a multi-tool start block that parks other
/// tools after the final heat-up is not confused.
pub(crate) fn set_filament_temperature(start: &mut [String], temp: f64) -> bool {
    for i in (1..start.len()).rev() {
        if let Some(rewritten) = rewrite_m109(&start[i], temp) {
            start[i] = rewritten;
            return true;
        }
    }
    false
}

/// Replace the 2-3 digit temperature after the last `S` of an `M109` line.
fn rewrite_m109(line: &str, temp: f64) -> Option<String> {
    if !line.contains("M109 ") {
        return None;
    }
    let bytes = line.as_bytes();
    for s_pos in (0..bytes.len()).rev() {
        if bytes[s_pos] != b'S' {
            continue;
        }
        let digits = bytes[s_pos + 1..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count();
        if (2..=3).contains(&digits) {
            let mut out = String::with_capacity(line.len());
            out.push_str(&line[..=s_pos]);
            out.push_str(&fmt(temp, 0));
            out.push_str(&line[s_pos + 1 + digits..]);
            return Some(out);
        }
    }
    None
}

fn append_m109(start: &mut Vec<String>, temp: f64, tool: usize) {
    // T<index> is accepted by klipper, marlin and RRF alike
    start.push(format!("M109 T{tool} S{}", fmt(temp, 0)));
}

/// Rewrite the last `M555` print-area line, when the start block has one.
pub(crate) fn replace_m555(start: &mut [String], area: &PrintArea) -> bool {
    for i in (1..start.len()).rev() {
        if start[i].starts_with("M555 ") {
            start[i] = format!(
                "M555 X{} Y{} W{} H{}",
                fmt(area.x, 3),
                fmt(area.y, 3),
                fmt(area.width, 3),
                fmt(area.height, 3),
            );
            return true;
        }
    }
    false
}

/// The leading run of comment and blank lines, which is where slicers put
/// the preview thumbnail.
fn thumbnail_len(start: &[String]) -> usize {
    start
        .iter()
        .position(|line| {
            let t = line.trim();
            !(t.is_empty() || t.starts_with(';'))
        })
        .unwrap_or(start.len())
}

/// Rebuild a Klipper start block from the slicer's `start_gcode` template.
///
/// Keeps the thumbnail, re-evaluates the template against the test's
/// temperatures and print area, clamps square-corner velocity, and wraps
/// the pattern in exclude-object markers when the original print used them.
fn klipper_start_gcode(
    start: &mut Vec<String>,
    end: &mut Vec<String>,
    start_gcode: &str,
    config: &PatternConfig,
    area: &PrintArea,
) -> Result<(), GcodeError> {
    let had_exclude_object = start.iter().any(|l| l.contains("EXCLUDE_OBJECT_DEFINE"));
    let thumbnail = thumbnail_len(start);

    let x = area.x;
    let y = area.y;
    let x_max = area.x + area.width;
    let y_max = area.y + area.height;
    let temp = fmt(config.filament_temperature, 0);
    let bed_temp = fmt(config.bed_temperature, 0);

    // the bare minimum variable set a klipper-oriented start template needs
    let mut vars: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for name in ["temperature", "first_layer_temperature"] {
        vars.insert(name.into(), vec![temp.clone(); 5]);
    }
    for name in ["bed_temperature", "first_layer_bed_temperature"] {
        vars.insert(name.into(), vec![bed_temp.clone(); 5]);
    }
    vars.insert(
        "first_layer_print_min".into(),
        vec![fmt(x, 3), fmt(y, 3)],
    );
    vars.insert(
        "first_layer_print_max".into(),
        vec![fmt(x_max, 3), fmt(y_max, 3)],
    );
    vars.insert(
        "first_layer_size".into(),
        vec![fmt(area.width, 3), fmt(area.height, 3)],
    );

    let evaluated = evaluate_gcode_template(start_gcode, &vars)?;

    start.truncate(thumbnail);
    if had_exclude_object {
        start.push(format!(
            "EXCLUDE_OBJECT_DEFINE NAME={OBJECT_NAME} CENTER={:.3},{:.3} POLYGON=[[{},{}],[{},{}],[{},{}],[{},{}]]",
            x + area.width / 2.0,
            y + area.height / 2.0,
            fmt(x, 3),
            fmt(y, 3),
            fmt(x, 3),
            fmt(y_max, 3),
            fmt(x_max, 3),
            fmt(y_max, 3),
            fmt(x_max, 3),
            fmt(y, 3),
        ));
    }
    start.extend(evaluated.split('\n').map(str::to_string));
    start.push(String::new());
    start.push("SET_VELOCITY_LIMIT SQUARE_CORNER_VELOCITY=1".into());
    start.push(String::new());
    if had_exclude_object {
        start.push(format!("EXCLUDE_OBJECT_START NAME={OBJECT_NAME}"));
        end.insert(0, format!("EXCLUDE_OBJECT_END NAME={OBJECT_NAME}"));
    }
    Ok(())
}

/// Patch the start and end blocks for the selected firmware.
pub(crate) fn prepare_start_end(
    start: &mut Vec<String>,
    end: &mut Vec<String>,
    flavor: Flavor,
    start_gcode: &str,
    config: &PatternConfig,
    area: &PrintArea,
) -> Result<(), GcodeError> {
    if flavor == Flavor::Klipper {
        return klipper_start_gcode(start, end, start_gcode, config, area);
    }

    // the start block heats to the first-layer temperature; only touch it
    // when the test wants something hotter
    if config.first_layer_temperature != config.filament_temperature
        && !set_filament_temperature(start, config.filament_temperature)
    {
        append_m109(start, config.filament_temperature, config.tool_index);
    }
    replace_m555(start, area);
    Ok(())
}
