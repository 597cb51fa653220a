//! Shared fixture builder: a minimal but complete slicer export.

/// Default settings block entries, matching a single-extruder MK3 profile.
pub const DEFAULT_SETTINGS: &[(&str, &str)] = &[
    ("perimeter_extruder", "1"),
    ("printer_model", "MK3"),
    ("gcode_flavor", "marlin2"),
    ("filament_settings_id", "\"Generic PLA\""),
    ("bed_shape", "0x0,250x0,250x210,0x210"),
    ("nozzle_diameter", "0.4,0.4"),
    ("bed_temperature", "60,60"),
    ("external_perimeter_extrusion_width", "0.45"),
    ("extrusion_multiplier", "1,1"),
    ("temperature", "215,215"),
    ("first_layer_temperature", "215,215"),
    ("filament_diameter", "1.75,1.75"),
    ("retract_lift", "0.4,0.4"),
    ("retract_length", "0.8,0.8"),
    ("retract_restart_extra", "0,0"),
    ("retract_speed", "35,35"),
    ("deretract_speed", "25,25"),
    ("infill_acceleration", "2000"),
    ("perimeter_acceleration", "1500"),
    ("external_perimeter_acceleration", "1250"),
    ("first_layer_acceleration", "1000"),
    ("machine_max_acceleration_extruding", "2500"),
    ("solid_infill_acceleration", "2000"),
    ("top_solid_infill_acceleration", "1500"),
    ("travel_acceleration", "3000"),
    ("default_acceleration", "1000"),
    ("perimeter_extrusion_width", "0.45"),
    ("perimeter_speed", "45"),
    ("solid_infill_speed", "80"),
    ("top_solid_infill_speed", "40"),
    ("travel_speed", "180"),
    ("travel_speed_z", "12"),
    ("layer_height", "0.2"),
    ("disable_fan_first_layers", "1,1"),
    ("first_layer_speed", "20"),
    ("min_fan_speed", "100,100"),
    ("infill_speed", "80"),
    ("max_volumetric_speed", "15"),
    (
        "start_gcode",
        r"G28 ; home all\nM109 S[first_layer_temperature] ; wait for temp",
    ),
];

/// Build a fixture G-code file, with `overrides` replacing (or, for new
/// keys, extending) the default settings block.
pub fn fixture(overrides: &[(&str, &str)]) -> String {
    let mut settings: Vec<(&str, &str)> = DEFAULT_SETTINGS.to_vec();
    for &(key, value) in overrides {
        match settings.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => settings.push((key, value)),
        }
    }

    let mut out = String::new();
    out.push_str("; generated by PrusaSlicer\n");
    out.push_str("M140 S60 ; set bed temperature\n");
    out.push_str("M109 S215 ; wait for hotend\n");
    out.push_str("G28 ; home\n");
    out.push_str(";AFTER_LAYER_CHANGE\n");
    out.push_str("G1 X10 Y10 E1 F1200\n");
    out.push_str("G1 X20 Y10 E2 F1200\n");
    out.push_str("; Filament-specific end gcode\n");
    out.push_str("M104 S0\n");
    out.push_str("M140 S0\n");
    for (key, value) in &settings {
        out.push_str(&format!("; {key} = {value}\n"));
    }
    out
}
