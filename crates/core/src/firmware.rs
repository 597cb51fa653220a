//! Firmware flavor detection and pressure-advance command selection.
//!
//! The advance command is derived from settings, never user-selected: the
//! `gcode_flavor` setting picks the firmware family and `printer_model`
//! distinguishes Prusa's input-shaper firmware (which takes `M572 S` with no
//! drive parameter) from legacy Marlin linear advance (`M900 K`).

use serde::Serialize;

use crate::error::GcodeError;

/// Supported firmware families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Flavor {
    /// Klipper, addressed through `SET_PRESSURE_ADVANCE`-style macros.
    Klipper,
    /// RepRapFirmware, `M572` with a drive parameter.
    RepRapFirmware,
    /// Marlin and derivatives, including Prusa firmware.
    Marlin,
}

/// The firmware-specific way to set pressure advance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdvanceCommand {
    /// Short human-readable label for reports.
    pub display: String,
    /// G-code line prefix; the numeric advance value is appended directly.
    pub gcode_prefix: String,
    /// The equivalent slicer-template form, for users wiring the winning
    /// value back into their printer profile.
    pub slicer_template: String,
}

/// Map a `gcode_flavor` setting value onto a firmware family.
pub fn flavor_of(gcode_flavor: &str) -> Result<Flavor, GcodeError> {
    let flavor = gcode_flavor.trim();
    if flavor == "klipper" {
        Ok(Flavor::Klipper)
    } else if flavor == "reprapfirmware" {
        Ok(Flavor::RepRapFirmware)
    } else if flavor.contains("marlin") {
        Ok(Flavor::Marlin)
    } else {
        Err(GcodeError::UnsupportedFirmware(flavor.to_string()))
    }
}

/// True for Prusa printer models running input-shaper firmware
/// (`MK4IS`, `MINIIS`, `XLIS`, `XL5IS`, ...).
fn is_input_shaper_model(model: &str) -> bool {
    if model.contains("MK4IS") || model.contains("MINIIS") {
        return true;
    }
    // XL optionally followed by a single tool-count digit, then IS.
    let bytes = model.as_bytes();
    for (i, window) in bytes.windows(2).enumerate() {
        if window == b"XL" {
            let rest = &bytes[i + 2..];
            if rest.starts_with(b"IS") {
                return true;
            }
            if rest.len() >= 3 && rest[0].is_ascii_digit() && &rest[1..3] == b"IS" {
                return true;
            }
        }
    }
    false
}

/// Pick the advance command for a flavor, printer model, and 0-based tool.
pub fn select_advance_command(flavor: Flavor, model: &str, tool: usize) -> AdvanceCommand {
    match flavor {
        Flavor::Klipper => {
            let mut extruder = String::from("extruder");
            if tool > 0 {
                extruder.push_str(&tool.to_string());
            }
            AdvanceCommand {
                display: "klipper: PRESSURE_ADVANCE".into(),
                gcode_prefix: format!("PRESSURE_ADVANCE EXTRUDER={extruder} ADVANCE="),
                slicer_template: "PRESSURE_ADVANCE EXTRUDER={current_extruder} ADVANCE=".into(),
            }
        }
        Flavor::RepRapFirmware => AdvanceCommand {
            display: "RepRapFirmware: M572".into(),
            gcode_prefix: format!("M572 D{tool} S"),
            slicer_template: "M572 D{current_extruder} S".into(),
        },
        Flavor::Marlin if is_input_shaper_model(model) => AdvanceCommand {
            display: "Prusa Input Shaper: M572".into(),
            gcode_prefix: "M572 S".into(),
            slicer_template: "M572 S".into(),
        },
        Flavor::Marlin => AdvanceCommand {
            display: "Marlin Linear Advance: M900".into(),
            gcode_prefix: "M900 K".into(),
            slicer_template: "M900 K".into(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flavor_detection() {
        assert_eq!(flavor_of("klipper").unwrap(), Flavor::Klipper);
        assert_eq!(flavor_of("reprapfirmware").unwrap(), Flavor::RepRapFirmware);
        assert_eq!(flavor_of("marlin").unwrap(), Flavor::Marlin);
        assert_eq!(flavor_of("marlin2").unwrap(), Flavor::Marlin);
        assert!(matches!(
            flavor_of("smoothie"),
            Err(GcodeError::UnsupportedFirmware(f)) if f == "smoothie"
        ));
    }

    #[test]
    fn klipper_extruder_naming() {
        let cmd = select_advance_command(Flavor::Klipper, "Voron 2.4", 0);
        assert_eq!(cmd.gcode_prefix, "PRESSURE_ADVANCE EXTRUDER=extruder ADVANCE=");
        let cmd = select_advance_command(Flavor::Klipper, "Voron 2.4", 2);
        assert_eq!(cmd.gcode_prefix, "PRESSURE_ADVANCE EXTRUDER=extruder2 ADVANCE=");
    }

    #[test]
    fn reprapfirmware_drive_parameter() {
        let cmd = select_advance_command(Flavor::RepRapFirmware, "Duet", 1);
        assert_eq!(cmd.gcode_prefix, "M572 D1 S");
    }

    #[test]
    fn prusa_input_shaper_models_use_m572() {
        for model in ["MK4IS", "MINIIS", "XLIS", "XL5IS"] {
            let cmd = select_advance_command(Flavor::Marlin, model, 0);
            assert_eq!(cmd.gcode_prefix, "M572 S", "model {model}");
        }
    }

    #[test]
    fn legacy_marlin_uses_m900() {
        for model in ["MK3", "MK3S", "Ender-3", "XL99IS"] {
            let cmd = select_advance_command(Flavor::Marlin, model, 0);
            assert_eq!(cmd.gcode_prefix, "M900 K", "model {model}");
        }
    }
}
