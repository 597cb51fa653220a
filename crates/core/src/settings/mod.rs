//! Slicer settings extraction and validation.
//!
//! The slicer embeds its full configuration as comment lines of the form
//! `; <key> = <value>` at the end of an exported G-code file. [`RawSettings`]
//! collects those lines verbatim; [`SlicerSettings::from_raw`] resolves the
//! fixed catalogue of recognized keys into typed, validated values.
//!
//! Extraction never aborts: each setting collects its own diagnostics and a
//! broken key leaves every other key untouched. Whether the bundle as a
//! whole is usable is an aggregate question ([`SlicerSettings::has_all_required`],
//! [`SlicerSettings::error_count`]).

mod parse;

use std::collections::BTreeMap;

use pa_toolchain_diagnostics::{Diagnostic, Span, codes};
use serde::Serialize;

use crate::error::GcodeError;

// ── Raw extraction ──────────────────────────────────────────────────────

/// A raw setting value plus the byte span of its source line.
#[derive(Debug, Clone)]
pub struct RawEntry {
    /// The raw textual value, exactly as found after `" = "`.
    pub value: String,
    /// Byte span of the full `; key = value` line in the input.
    pub span: Span,
}

/// Mapping from setting key to its raw textual value.
///
/// Later duplicate keys overwrite earlier ones (last occurrence wins), which
/// matters because slicers emit both printer- and filament-level blocks.
#[derive(Debug, Default, Clone)]
pub struct RawSettings {
    map: BTreeMap<String, RawEntry>,
}

impl RawSettings {
    /// Scan every line of `input` for the pattern `; <key> = <value>`.
    pub fn extract(input: &str) -> Self {
        let mut map = BTreeMap::new();
        let mut offset = 0usize;
        for line in input.split_inclusive('\n') {
            let start = offset;
            offset += line.len();
            let text = line.trim_end_matches(['\n', '\r']);
            if let Some((key, value)) = match_setting_line(text) {
                map.insert(
                    key.to_string(),
                    RawEntry {
                        value: value.to_string(),
                        span: Span::new(start, start + text.len()),
                    },
                );
            }
        }
        Self { map }
    }

    /// Look up a raw entry by key.
    pub fn get(&self, key: &str) -> Option<&RawEntry> {
        self.map.get(key)
    }

    /// Number of distinct keys found.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// True when no settings lines were found at all.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Match `; <lower_snake_key> = <value>`, returning the key/value pair.
fn match_setting_line(line: &str) -> Option<(&str, &str)> {
    let rest = line.strip_prefix("; ")?;
    let (key, value) = rest.split_once(" = ")?;
    if key.is_empty() || value.is_empty() {
        return None;
    }
    let valid = key
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_');
    valid.then_some((key, value))
}

// ── Typed settings ──────────────────────────────────────────────────────

/// Bed geometry. Round (delta) beds are a parse error, never a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BedShape {
    /// Usable bed size along X, mm.
    pub x: i64,
    /// Usable bed size along Y, mm.
    pub y: i64,
}

/// One parsed setting: the raw text, the typed value (when parsing
/// succeeded), a display string, and any diagnostics collected on the way.
///
/// Invariant: `value` is present iff `diagnostics` is empty and a raw value
/// existed in the file.
#[derive(Debug, Clone)]
pub struct Setting<T> {
    /// The registry key.
    pub key: &'static str,
    /// Original raw text; empty when the setting was absent.
    pub raw: String,
    /// The typed value, absent on parse failure or missing key.
    pub value: Option<T>,
    /// Human-readable rendering of `value`, empty when absent.
    pub display: String,
    /// Setting-level diagnostics (never raised, only collected).
    pub diagnostics: Vec<Diagnostic>,
}

impl<T> Setting<T> {
    /// The typed value, or a structural error naming this key.
    ///
    /// Used by downstream derivations that cannot proceed without the value;
    /// the settings report will already have explained *why* it is absent.
    pub fn resolved(&self) -> Result<&T, GcodeError> {
        self.value
            .as_ref()
            .ok_or(GcodeError::MissingSetting(self.key))
    }
}

/// One row of the settings report consumed by hosts (CLI table, UI).
#[derive(Debug, Clone, Serialize)]
pub struct SettingReport {
    /// The registry key.
    pub key: &'static str,
    /// Original raw text, empty if absent.
    pub raw: String,
    /// Display rendering of the parsed value, empty if absent.
    pub display: String,
    /// Whether the key is required for pattern generation.
    pub required: bool,
    /// Messages of the diagnostics collected for this setting.
    pub errors: Vec<String>,
}

// ── Bundle construction ─────────────────────────────────────────────────

/// Accumulates per-setting rows and flattened diagnostics while the bundle
/// is built in registry order.
#[derive(Default)]
struct Acc {
    rows: Vec<SettingReport>,
    diagnostics: Vec<Diagnostic>,
    missing_required: usize,
}

fn build<T>(
    acc: &mut Acc,
    raw: &RawSettings,
    key: &'static str,
    required: bool,
    tool: Option<usize>,
    parser: impl FnOnce(&'static str, &str, Option<usize>, Option<Span>, &mut Vec<Diagnostic>) -> Option<T>,
    describe: impl FnOnce(&T) -> String,
) -> Setting<T> {
    let setting = match raw.get(key) {
        Some(entry) => {
            let mut diags = Vec::new();
            let value = parser(key, &entry.value, tool, Some(entry.span), &mut diags);
            let display = value.as_ref().map(describe).unwrap_or_default();
            Setting {
                key,
                raw: entry.value.clone(),
                value,
                display,
                diagnostics: diags,
            }
        }
        None => {
            let mut diags = Vec::new();
            if required {
                acc.missing_required += 1;
                diags.push(
                    Diagnostic::error(
                        codes::REQUIRED_MISSING,
                        format!("required setting `{key}` not found"),
                        None,
                    )
                    .with_context(BTreeMap::from([("key".into(), key.into())])),
                );
            }
            Setting {
                key,
                raw: String::new(),
                value: None,
                display: String::new(),
                diagnostics: diags,
            }
        }
    };

    acc.rows.push(SettingReport {
        key,
        raw: setting.raw.clone(),
        display: setting.display.clone(),
        required,
        errors: setting.diagnostics.iter().map(|d| d.message.clone()).collect(),
    });
    acc.diagnostics.extend(setting.diagnostics.iter().cloned());
    setting
}

/// The validated settings bundle: one [`Setting`] per recognized key, plus
/// aggregates. Constructed once per input file, immutable thereafter.
#[derive(Debug, Clone)]
#[allow(missing_docs)] // field names are the slicer's own setting keys
pub struct SlicerSettings {
    pub perimeter_extruder: Setting<i64>,
    pub printer_model: Setting<String>,
    pub gcode_flavor: Setting<String>,
    pub filament_settings_id: Setting<String>,
    pub bed_shape: Setting<BedShape>,
    pub nozzle_diameter: Setting<f64>,
    pub bed_temperature: Setting<f64>,
    pub external_perimeter_extrusion_width: Setting<f64>,
    pub extrusion_multiplier: Setting<f64>,
    pub temperature: Setting<f64>,
    pub first_layer_temperature: Setting<f64>,
    pub filament_diameter: Setting<f64>,
    pub retract_lift: Setting<f64>,
    pub retract_length: Setting<f64>,
    pub retract_restart_extra: Setting<f64>,
    pub retract_speed: Setting<f64>,
    pub deretract_speed: Setting<f64>,
    pub filament_retract_lift: Setting<f64>,
    pub filament_retract_length: Setting<f64>,
    pub filament_retract_restart_extra: Setting<f64>,
    pub filament_retract_speed: Setting<f64>,
    pub filament_deretract_speed: Setting<f64>,
    pub infill_acceleration: Setting<i64>,
    pub perimeter_acceleration: Setting<i64>,
    pub external_perimeter_acceleration: Setting<i64>,
    pub first_layer_acceleration: Setting<i64>,
    pub machine_max_acceleration_extruding: Setting<i64>,
    pub solid_infill_acceleration: Setting<i64>,
    pub top_solid_infill_acceleration: Setting<i64>,
    pub travel_acceleration: Setting<i64>,
    pub default_acceleration: Setting<i64>,
    pub perimeter_extrusion_width: Setting<f64>,
    pub perimeter_speed: Setting<i64>,
    pub solid_infill_speed: Setting<f64>,
    pub top_solid_infill_speed: Setting<f64>,
    pub travel_speed: Setting<i64>,
    pub travel_speed_z: Setting<i64>,
    pub layer_height: Setting<f64>,
    pub disable_fan_first_layers: Setting<f64>,
    pub first_layer_speed: Setting<f64>,
    pub min_fan_speed: Setting<f64>,
    pub infill_speed: Setting<f64>,
    pub max_volumetric_speed: Setting<f64>,
    pub filament_max_volumetric_speed: Setting<f64>,
    pub start_gcode: Setting<String>,

    /// False when any required key is missing from the file.
    pub has_all_required: bool,
    /// All per-setting diagnostics, flattened in registry order.
    pub diagnostics: Vec<Diagnostic>,
    /// Number of collected diagnostics.
    pub error_count: usize,
    /// Per-setting report rows in registry order, for host display.
    pub report: Vec<SettingReport>,
}

impl SlicerSettings {
    /// Resolve the fixed descriptor catalogue against a raw settings map.
    ///
    /// `perimeter_extruder` is resolved first: several other parsers need
    /// its value as a 1-based tool index. When it is missing or invalid,
    /// tool-indexed settings record their own error rather than guessing a
    /// default tool.
    pub fn from_raw(raw: &RawSettings) -> Self {
        use parse::*;

        let mut acc = Acc::default();
        let a = &mut acc;

        let perimeter_extruder = build(a, raw, "perimeter_extruder", true, None, int, show_int);
        let tool = perimeter_extruder
            .value
            .filter(|&t| t >= 1)
            .map(|t| t as usize);

        let s = Self {
            printer_model: build(a, raw, "printer_model", true, tool, string, show_string),
            gcode_flavor: build(a, raw, "gcode_flavor", true, tool, string, show_string),
            filament_settings_id: build(
                a, raw, "filament_settings_id", true, tool, tool_quoted_string, show_string,
            ),
            bed_shape: build(a, raw, "bed_shape", true, tool, bed_shape, show_bed),
            nozzle_diameter: build(a, raw, "nozzle_diameter", true, tool, tool_float, show_mm),
            bed_temperature: build(a, raw, "bed_temperature", true, tool, tool_float, show_temp),
            external_perimeter_extrusion_width: build(
                a, raw, "external_perimeter_extrusion_width", true, tool, float, show_mm,
            ),
            extrusion_multiplier: build(
                a, raw, "extrusion_multiplier", true, tool, tool_float, show_number,
            ),
            temperature: build(a, raw, "temperature", true, tool, tool_float, show_temp),
            first_layer_temperature: build(
                a, raw, "first_layer_temperature", true, tool, tool_float, show_temp,
            ),
            filament_diameter: build(a, raw, "filament_diameter", true, tool, tool_float, show_mm),
            retract_lift: build(a, raw, "retract_lift", true, tool, tool_float, show_mm),
            retract_length: build(a, raw, "retract_length", true, tool, tool_float, show_mm),
            retract_restart_extra: build(
                a, raw, "retract_restart_extra", true, tool, tool_float, show_mm,
            ),
            retract_speed: build(a, raw, "retract_speed", true, tool, tool_float, show_mms),
            deretract_speed: build(a, raw, "deretract_speed", true, tool, tool_float, show_mms),
            filament_retract_lift: build(
                a, raw, "filament_retract_lift", false, tool, tool_float, show_mm,
            ),
            filament_retract_length: build(
                a, raw, "filament_retract_length", false, tool, tool_float, show_mm,
            ),
            filament_retract_restart_extra: build(
                a, raw, "filament_retract_restart_extra", false, tool, tool_float, show_mm,
            ),
            filament_retract_speed: build(
                a, raw, "filament_retract_speed", false, tool, tool_float, show_mms,
            ),
            filament_deretract_speed: build(
                a, raw, "filament_deretract_speed", false, tool, tool_float, show_mms,
            ),
            infill_acceleration: build(a, raw, "infill_acceleration", true, tool, int, show_mms2),
            perimeter_acceleration: build(
                a, raw, "perimeter_acceleration", true, tool, int, show_mms2,
            ),
            external_perimeter_acceleration: build(
                a, raw, "external_perimeter_acceleration", true, tool, int, show_mms2,
            ),
            first_layer_acceleration: build(
                a, raw, "first_layer_acceleration", true, tool, int, show_mms2,
            ),
            machine_max_acceleration_extruding: build(
                a, raw, "machine_max_acceleration_extruding", true, tool, int, show_mms2,
            ),
            solid_infill_acceleration: build(
                a, raw, "solid_infill_acceleration", true, tool, int, show_mms2,
            ),
            top_solid_infill_acceleration: build(
                a, raw, "top_solid_infill_acceleration", true, tool, int, show_mms2,
            ),
            travel_acceleration: build(a, raw, "travel_acceleration", true, tool, int, show_mms2),
            default_acceleration: build(a, raw, "default_acceleration", true, tool, int, show_mms2),
            perimeter_extrusion_width: build(
                a, raw, "perimeter_extrusion_width", true, tool, float, show_mm,
            ),
            perimeter_speed: build(a, raw, "perimeter_speed", true, tool, int, show_int_mms),
            solid_infill_speed: build(a, raw, "solid_infill_speed", true, tool, float, show_mms),
            top_solid_infill_speed: build(
                a, raw, "top_solid_infill_speed", true, tool, float, show_mms,
            ),
            travel_speed: build(a, raw, "travel_speed", true, tool, int, show_int_mms),
            travel_speed_z: build(a, raw, "travel_speed_z", true, tool, int, show_int_mms),
            layer_height: build(a, raw, "layer_height", true, tool, float, show_mm),
            disable_fan_first_layers: build(
                a, raw, "disable_fan_first_layers", true, tool, tool_float, show_number,
            ),
            first_layer_speed: build(a, raw, "first_layer_speed", true, tool, float, show_mms),
            min_fan_speed: build(a, raw, "min_fan_speed", true, tool, tool_float, show_percent),
            infill_speed: build(a, raw, "infill_speed", true, tool, float, show_mms),
            max_volumetric_speed: build(
                a, raw, "max_volumetric_speed", true, tool, float, show_mm3s,
            ),
            filament_max_volumetric_speed: build(
                a, raw, "filament_max_volumetric_speed", false, tool, float, show_mm3s,
            ),
            start_gcode: build(a, raw, "start_gcode", true, tool, string, show_string),
            perimeter_extruder,

            has_all_required: acc.missing_required == 0,
            error_count: acc.diagnostics.len(),
            diagnostics: std::mem::take(&mut acc.diagnostics),
            report: std::mem::take(&mut acc.rows),
        };
        s
    }

    /// The 0-based tool index of the perimeter extruder, when resolvable.
    pub fn tool_index(&self) -> Result<usize, GcodeError> {
        let t = *self.perimeter_extruder.resolved()?;
        if t >= 1 {
            Ok(t as usize - 1)
        } else {
            Err(GcodeError::MissingSetting("perimeter_extruder"))
        }
    }
}
