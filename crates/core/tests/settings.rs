//! Settings extraction and validation against realistic slicer exports.

mod common;

use common::fixture;
use pa_toolchain_core::{GcodeDocument, RawSettings, SlicerSettings};

#[test]
fn full_fixture_has_no_errors() {
    let input = fixture(&[]);
    let doc = GcodeDocument::parse(&input, "test.gcode").unwrap();
    assert!(doc.settings.has_all_required);
    assert_eq!(doc.settings.error_count, 0);
    assert!(doc.settings.diagnostics.is_empty());
}

#[test]
fn last_occurrence_wins() {
    let raw = RawSettings::extract("; layer_height = 0.3\n; layer_height = 0.2\n");
    assert_eq!(raw.get("layer_height").unwrap().value, "0.2");
}

#[test]
fn settings_lines_must_match_exactly() {
    let raw = RawSettings::extract(
        ";layer_height = 0.2\n; Layer_Height = 0.2\n; layer_height=0.2\n; layer_height = \n",
    );
    assert!(raw.is_empty());
}

#[test]
fn tool_indexed_value_picks_this_tools_entry() {
    let input = fixture(&[("nozzle_diameter", "42.42,nil")]);
    let doc = GcodeDocument::parse(&input, "test.gcode").unwrap();
    assert_eq!(doc.settings.nozzle_diameter.value, Some(42.42));
    assert_eq!(doc.settings.error_count, 0);
}

#[test]
fn tool_indexed_value_errors_on_bad_entry() {
    let input = fixture(&[("perimeter_extruder", "2"), ("nozzle_diameter", "42.42,nil")]);
    let doc = GcodeDocument::parse(&input, "test.gcode").unwrap();
    let setting = &doc.settings.nozzle_diameter;
    assert_eq!(setting.value, None);
    assert_eq!(setting.diagnostics.len(), 1);
    // every other setting still parses on its own
    assert_eq!(doc.settings.layer_height.value, Some(0.2));
}

#[test]
fn quoted_tool_string_is_unwrapped() {
    let input = fixture(&[("filament_settings_id", "\"Fancy PETG\";\"Other\"")]);
    let doc = GcodeDocument::parse(&input, "test.gcode").unwrap();
    assert_eq!(
        doc.settings.filament_settings_id.value.as_deref(),
        Some("Fancy PETG")
    );
}

#[test]
fn bed_shape_takes_size_from_third_corner() {
    let raw = RawSettings::extract("; perimeter_extruder = 1\n; bed_shape = 0x0,0x0,250x210,0x0\n");
    let settings = SlicerSettings::from_raw(&raw);
    let bed = settings.bed_shape.value.unwrap();
    assert_eq!((bed.x, bed.y), (250, 210));
    assert_eq!(
        settings.bed_shape.display,
        "Rectangular: 250mm x 210mm"
    );
}

#[test]
fn round_bed_is_rejected_with_a_message() {
    // round beds export a many-cornered polygon, not 4 corners
    let input = fixture(&[("bed_shape", "0x-85,60x-60,85x0,60x60,0x85,-60x60,-85x0,-60x-60")]);
    let doc = GcodeDocument::parse(&input, "test.gcode").unwrap();
    let setting = &doc.settings.bed_shape;
    assert_eq!(setting.value, None);
    assert_eq!(setting.diagnostics.len(), 1);
    assert!(setting.diagnostics[0].message.contains("round beds"));
}

#[test]
fn missing_required_key_is_reported_not_raised() {
    let mut input = String::new();
    // a file with only the extruder setting: everything else goes missing
    input.push_str("; perimeter_extruder = 1\n");
    let raw = RawSettings::extract(&input);
    let settings = SlicerSettings::from_raw(&raw);
    assert!(!settings.has_all_required);
    assert!(settings.error_count > 0);
    // the report carries one row per registry key regardless
    assert_eq!(settings.report.len(), 45);
}

#[test]
fn optional_filament_overrides_do_not_error_when_absent() {
    let input = fixture(&[]);
    let doc = GcodeDocument::parse(&input, "test.gcode").unwrap();
    assert_eq!(doc.settings.filament_retract_length.value, None);
    assert!(doc.settings.filament_retract_length.diagnostics.is_empty());
}

#[test]
fn report_rows_follow_registry_order() {
    let input = fixture(&[]);
    let doc = GcodeDocument::parse(&input, "test.gcode").unwrap();
    let report = &doc.settings.report;
    assert_eq!(report[0].key, "perimeter_extruder");
    assert!(report.iter().any(|r| r.key == "start_gcode"));
    assert!(report.iter().all(|r| r.errors.is_empty()));
}
