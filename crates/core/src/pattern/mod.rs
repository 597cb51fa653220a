//! Test pattern configuration and G-code emission.
//!
//! [`PatternConfig::derive`] folds the validated settings bundle, the
//! resolved advance range, and the user's pattern options into the flat set
//! of numbers the emitter works from. All speeds here are mm/s as the
//! slicer stores them; the emitter converts to mm/min at the last moment.

mod emit;
mod glyphs;

pub use emit::{PatternLayout, PrintArea, generate_test_pattern, validate_pattern_fits};

use crate::error::GcodeError;
use crate::firmware::AdvanceCommand;
use crate::range::AdvanceRange;
use crate::settings::{BedShape, Setting, SlicerSettings};

/// User-adjustable pattern geometry knobs, all with sensible defaults.
#[derive(Debug, Clone)]
pub struct PatternOptions {
    /// Pattern rotation in degrees, clockwise.
    pub print_dir: f64,
    /// Length of each slow segment, mm.
    pub length_slow: f64,
    /// Length of the fast middle segment, mm.
    pub length_fast: f64,
    /// Center the pattern on the origin instead of the bed center.
    pub null_center: bool,
}

impl Default for PatternOptions {
    fn default() -> Self {
        Self {
            print_dir: 0.0,
            length_slow: 25.0,
            length_fast: 100.0,
            null_center: false,
        }
    }
}

/// Everything the emitter and splicer need, derived once from the settings.
#[derive(Debug, Clone)]
pub struct PatternConfig {
    /// Printer model name, for the header.
    pub printer: String,
    /// Filament preset name, for the header.
    pub filament: String,
    /// Hotend temperature for the test, °C.
    pub filament_temperature: f64,
    /// First-layer temperature from the profile, °C.
    pub first_layer_temperature: f64,
    /// Bed temperature from the profile, °C.
    pub bed_temperature: f64,
    /// Filament diameter, mm.
    pub filament_diameter: f64,
    /// Nozzle diameter, mm (header only).
    pub nozzle_diameter: f64,
    /// Layer height, mm.
    pub layer_height: f64,
    /// Extruded line width, mm.
    pub line_width: f64,
    /// Flow multiplier.
    pub extrusion_multiplier: f64,
    /// Slow segment speed, mm/s.
    pub speed_slow: f64,
    /// Fast segment speed, mm/s (flow-capped).
    pub speed_fast: f64,
    /// Default printing speed, mm/s.
    pub speed_print: f64,
    /// Travel speed, mm/s.
    pub travel_speed: f64,
    /// Z travel speed, mm/s.
    pub travel_speed_z: f64,
    /// Retraction distance, mm.
    pub retract_dist: f64,
    /// Un-retraction distance, mm (retraction plus restart extra).
    pub deretract_dist: f64,
    /// Retraction speed, mm/s.
    pub retract_speed: f64,
    /// Un-retraction speed, mm/s.
    pub deretract_speed: f64,
    /// Travel acceleration, mm/s².
    pub travel_acceleration: i64,
    /// Acceleration used on the test segments, mm/s².
    pub test_acceleration: i64,
    /// Acceleration restored after each test line, mm/s².
    pub print_acceleration: i64,
    /// Z-hop height above the layer, mm.
    pub z_hop_height: f64,
    /// Bed size.
    pub bed: BedShape,
    /// Part cooling fan speed, percent.
    pub fan_speed: f64,
    /// 0-based tool index of the printing extruder.
    pub tool_index: usize,
    /// The firmware's advance command.
    pub advance: AdvanceCommand,
    /// The resolved advance value sequence.
    pub range: AdvanceRange,
    /// Geometry knobs.
    pub options: PatternOptions,
}

/// Filament retraction overrides beat the printer-level setting when the
/// filament profile carries one.
fn filament_override<'a>(base: &'a Setting<f64>, over: &'a Setting<f64>) -> &'a Setting<f64> {
    if over.value.is_some() { over } else { base }
}

impl PatternConfig {
    /// Derive the pattern configuration from validated settings.
    ///
    /// Fails when a needed setting has no usable value or when neither
    /// volumetric flow limit is positive.
    pub fn derive(
        settings: &SlicerSettings,
        range: AdvanceRange,
        advance: AdvanceCommand,
        options: PatternOptions,
    ) -> Result<Self, GcodeError> {
        let tool_index = settings.tool_index()?;

        // the hotter of the two profile temperatures drives the test
        let temperature = *settings.temperature.resolved()?;
        let first_layer_temperature = *settings.first_layer_temperature.resolved()?;
        let filament_temperature = temperature.max(first_layer_temperature);

        // the test segments run at the fastest acceleration any print move
        // in the profile is allowed to reach
        let test_acceleration = [
            &settings.perimeter_acceleration,
            &settings.infill_acceleration,
            &settings.solid_infill_acceleration,
            &settings.top_solid_infill_acceleration,
            &settings.external_perimeter_acceleration,
        ]
        .into_iter()
        .map(|s| s.resolved().copied())
        .try_fold(i64::MIN, |acc, v| v.map(|v| acc.max(v)))?;

        let speed_fast = flow_capped_speed(settings)?;

        let retract_dist = *filament_override(
            &settings.retract_length,
            &settings.filament_retract_length,
        )
        .resolved()?;
        let restart_extra = *filament_override(
            &settings.retract_restart_extra,
            &settings.filament_retract_restart_extra,
        )
        .resolved()?;

        // fan stays off when the profile disables it for the first layers
        let fan_speed = if *settings.disable_fan_first_layers.resolved()? > 0.0 {
            0.0
        } else {
            *settings.min_fan_speed.resolved()?
        };

        let first_layer_speed = *settings.first_layer_speed.resolved()?;

        Ok(Self {
            printer: settings.printer_model.resolved()?.clone(),
            filament: settings.filament_settings_id.resolved()?.clone(),
            filament_temperature,
            first_layer_temperature,
            bed_temperature: *settings.bed_temperature.resolved()?,
            filament_diameter: *settings.filament_diameter.resolved()?,
            nozzle_diameter: *settings.nozzle_diameter.resolved()?,
            layer_height: *settings.layer_height.resolved()?,
            line_width: *settings.perimeter_extrusion_width.resolved()?,
            extrusion_multiplier: *settings.extrusion_multiplier.resolved()?,
            speed_slow: first_layer_speed,
            speed_fast,
            speed_print: first_layer_speed,
            travel_speed: *settings.travel_speed.resolved()? as f64,
            travel_speed_z: *settings.travel_speed_z.resolved()? as f64,
            retract_dist,
            deretract_dist: retract_dist + restart_extra,
            retract_speed: *filament_override(
                &settings.retract_speed,
                &settings.filament_retract_speed,
            )
            .resolved()?,
            deretract_speed: *filament_override(
                &settings.deretract_speed,
                &settings.filament_deretract_speed,
            )
            .resolved()?,
            travel_acceleration: *settings.travel_acceleration.resolved()?,
            test_acceleration,
            print_acceleration: *settings.first_layer_acceleration.resolved()?,
            z_hop_height: *filament_override(
                &settings.retract_lift,
                &settings.filament_retract_lift,
            )
            .resolved()?,
            bed: *settings.bed_shape.resolved()?,
            fan_speed,
            tool_index,
            advance,
            range,
            options,
        })
    }
}

/// Cap the requested infill speed by the volumetric flow limit.
///
/// The filament-level limit wins over the printer-level one; a profile with
/// neither set to a positive value cannot be calibrated safely.
fn flow_capped_speed(settings: &SlicerSettings) -> Result<f64, GcodeError> {
    let filament_flow = settings.filament_max_volumetric_speed.value;
    let printer_flow = settings.max_volumetric_speed.value;
    let flow_rate = match (filament_flow, printer_flow) {
        (Some(f), _) if f > 0.0 => f,
        (_, Some(p)) if p > 0.0 => p,
        _ => return Err(GcodeError::NoFlowLimit),
    };
    let width = *settings.perimeter_extrusion_width.resolved()?;
    let height = *settings.layer_height.resolved()?;
    let max_speed = flow_rate / (width * height);
    Ok(max_speed.min(*settings.infill_speed.resolved()?))
}
