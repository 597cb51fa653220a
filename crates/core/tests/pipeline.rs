//! End-to-end generation runs over realistic fixtures.

mod common;

use common::fixture;
use pa_toolchain_core::{GcodeError, GenerateOptions, PatternOptions, RangeMode, generate};

fn direct_drive() -> GenerateOptions {
    GenerateOptions {
        range: RangeMode::DirectDrive,
        pattern: PatternOptions::default(),
    }
}

#[test]
fn marlin_pattern_has_one_m900_per_test_value() {
    let input = fixture(&[]);
    let output = generate(&input, "test.gcode", &direct_drive()).unwrap();

    let set_lines: Vec<&str> = output
        .lines()
        .filter(|l| l.ends_with("; set Pressure Advance"))
        .collect();
    // 0.00 to 0.20 in 0.01 steps
    assert_eq!(set_lines.len(), 21);
    let mut expected = 0.0f64;
    for line in &set_lines {
        assert!(line.starts_with("M900 K"), "line: {line}");
        let value: f64 = line
            .trim_start_matches("M900 K")
            .split_whitespace()
            .next()
            .unwrap()
            .parse()
            .unwrap();
        assert!((value - expected).abs() < 1e-9, "line: {line}");
        expected += 0.01;
    }
}

#[test]
fn each_test_line_is_bracketed_by_retraction_and_acceleration() {
    let input = fixture(&[]);
    let output = generate(&input, "test.gcode", &direct_drive()).unwrap();
    let lines: Vec<&str> = output.lines().collect();

    let first_set = lines
        .iter()
        .position(|l| l.ends_with("; set Pressure Advance"))
        .unwrap();
    assert!(lines[first_set + 1].starts_with("M117 Pressure Advance = 0"));
    assert!(lines[first_set + 2].ends_with("; un-retract"));
    // test acceleration is the max of the five profile accelerations
    assert_eq!(lines[first_set + 3], "M204 P2000 T2000; Set test acceleration");
    assert!(lines[first_set + 4].ends_with("; print line"));
    assert!(lines[first_set + 5].ends_with("; print line"));
    assert!(lines[first_set + 6].ends_with("; print line"));
    assert_eq!(lines[first_set + 7], "M204 P1000 T1000; Set print acceleration");
    assert!(lines[first_set + 8].ends_with("; retract"));
}

#[test]
fn pattern_sits_between_original_start_and_end_blocks() {
    let input = fixture(&[]);
    let output = generate(&input, "test.gcode", &direct_drive()).unwrap();

    let start_pos = output.find("G28 ; home").unwrap();
    let pattern_pos = output
        .find("; ### Pressure Advance Calibration Pattern ###")
        .unwrap();
    let end_pos = output.find("; Filament-specific end gcode").unwrap();
    assert!(start_pos < pattern_pos && pattern_pos < end_pos);
    // the sliced object's moves are gone
    assert!(!output.contains("G1 X10 Y10 E1"));
}

#[test]
fn fan_is_off_when_disabled_for_first_layers() {
    let input = fixture(&[]);
    let output = generate(&input, "test.gcode", &direct_drive()).unwrap();
    assert!(output.contains("M106 S0 ; Start print fan"));

    let input = fixture(&[("disable_fan_first_layers", "0,0")]);
    let output = generate(&input, "test.gcode", &direct_drive()).unwrap();
    assert!(output.contains("M106 S255 ; Start print fan"));
}

#[test]
fn fast_speed_is_flow_capped() {
    // 2 mm^3/s over 0.45 * 0.2 mm^2 caps the 80 mm/s infill speed at
    // ~22.22 mm/s -> 1333.33 mm/min
    let input = fixture(&[("filament_max_volumetric_speed", "2")]);
    let output = generate(&input, "test.gcode", &direct_drive()).unwrap();
    assert!(output.contains("F1333.33 ; print line"));
}

#[test]
fn missing_flow_limit_is_an_error() {
    let input = fixture(&[("max_volumetric_speed", "0")]);
    assert!(matches!(
        generate(&input, "test.gcode", &direct_drive()),
        Err(GcodeError::NoFlowLimit)
    ));
}

#[test]
fn hotter_profile_temperature_rewrites_the_start_block() {
    let input = fixture(&[("temperature", "230,230")]);
    let output = generate(&input, "test.gcode", &direct_drive()).unwrap();
    assert!(output.contains("M109 S230 ; wait for hotend"));
    assert!(!output.contains("M109 S215"));
}

#[test]
fn matching_temperatures_leave_the_start_block_alone() {
    let input = fixture(&[]);
    let output = generate(&input, "test.gcode", &direct_drive()).unwrap();
    assert!(output.contains("M109 S215 ; wait for hotend"));
}

#[test]
fn oversized_pattern_fails_before_any_output() {
    let input = fixture(&[("bed_shape", "0x0,100x0,100x100,0x100")]);
    let err = generate(&input, "test.gcode", &direct_drive()).unwrap_err();
    assert!(matches!(err, GcodeError::PatternExceedsBed { .. }));
}

#[test]
fn fractional_overhang_fails_the_fit_check() {
    // 2*25 + 192.4 + 8 = 250.4 mm on a 250 mm bed: the width must ceil to
    // 251 and fail, not round down to a pass
    let input = fixture(&[]);
    let opts = GenerateOptions {
        range: RangeMode::DirectDrive,
        pattern: PatternOptions {
            length_fast: 192.4,
            ..PatternOptions::default()
        },
    };
    let err = generate(&input, "test.gcode", &opts).unwrap_err();
    assert!(matches!(
        err,
        GcodeError::PatternExceedsBed { width, .. } if width == 251.0
    ));
}

#[test]
fn custom_range_must_have_a_usable_step() {
    let input = fixture(&[]);
    let opts = GenerateOptions {
        range: RangeMode::Custom {
            start: 0.0,
            end: 10_000.0,
        },
        pattern: PatternOptions::default(),
    };
    assert!(matches!(
        generate(&input, "test.gcode", &opts),
        Err(GcodeError::NoSuitableStep { .. })
    ));
}

#[test]
fn settings_errors_abort_generation() {
    let input = fixture(&[("layer_height", "abc")]);
    assert!(matches!(
        generate(&input, "test.gcode", &direct_drive()),
        Err(GcodeError::SettingsInvalid(1))
    ));
}

#[test]
fn missing_start_marker_names_it() {
    let input = fixture(&[]).replace(";AFTER_LAYER_CHANGE\n", "");
    let err = generate(&input, "test.gcode", &direct_drive()).unwrap_err();
    assert_eq!(
        err.to_string(),
        "could not locate object bounds: missing `;AFTER_LAYER_CHANGE` marker line; check the printer's custom G-code settings"
    );
}

#[test]
fn input_shaper_printer_uses_m572() {
    let input = fixture(&[("printer_model", "MK4IS")]);
    let output = generate(&input, "test.gcode", &direct_drive()).unwrap();
    assert!(output.contains("M572 S0.05 ; set Pressure Advance"));
    assert!(!output.contains("M900"));
}

#[test]
fn reprapfirmware_uses_the_drive_parameter() {
    let input = fixture(&[("gcode_flavor", "reprapfirmware")]);
    let output = generate(&input, "test.gcode", &direct_drive()).unwrap();
    assert!(output.contains("M572 D0 S0.05 ; set Pressure Advance"));
}

#[test]
fn unsupported_firmware_is_rejected() {
    let input = fixture(&[("gcode_flavor", "smoothie")]);
    assert!(matches!(
        generate(&input, "test.gcode", &direct_drive()),
        Err(GcodeError::UnsupportedFirmware(_))
    ));
}

#[test]
fn binary_gcode_is_rejected_by_name() {
    let input = fixture(&[]);
    assert!(matches!(
        generate(&input, "part.bgcode", &direct_drive()),
        Err(GcodeError::BinaryGcode)
    ));
}

#[test]
fn klipper_start_block_is_rebuilt_from_the_template() {
    let input = fixture(&[("gcode_flavor", "klipper"), ("printer_model", "Voron 2.4")]);
    let output = generate(&input, "test.gcode", &direct_drive()).unwrap();

    // the template was re-evaluated with the test temperature
    assert!(output.contains("M109 S215 ; wait for temp"));
    // the original start block's own commands were dropped
    assert!(!output.contains("M109 S215 ; wait for hotend"));
    assert!(output.contains("SET_VELOCITY_LIMIT SQUARE_CORNER_VELOCITY=1"));
    assert!(output.contains("PRESSURE_ADVANCE EXTRUDER=extruder ADVANCE=0.05 ; set Pressure Advance"));
    // no exclude-object wrapping when the original never used it
    assert!(!output.contains("EXCLUDE_OBJECT_DEFINE"));
}

#[test]
fn output_is_deterministic() {
    let input = fixture(&[]);
    let a = generate(&input, "test.gcode", &direct_drive()).unwrap();
    let b = generate(&input, "test.gcode", &direct_drive()).unwrap();
    assert_eq!(a, b);
}
