mod render;

use std::fs;

use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use pa_toolchain_core::{GenerateOptions, PatternOptions, RangeMode, generate, inspect};
use pa_toolchain_diagnostics::{self as diag, Diagnostic, Severity};

use crate::render::{Format, print_settings_table, print_summary, render_diagnostics};

// ── CLI definition ──────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "pacal",
    version,
    about = "pa-toolchain — generate pressure-advance calibration prints from sliced G-code"
)]
struct Cli {
    /// Output mode: "pretty" for coloured terminal output, "json" for
    /// machine-readable JSON. Defaults to "pretty" when stdout is a TTY,
    /// "json" otherwise.
    #[arg(long, global = true, value_parser = ["pretty", "json"])]
    output: Option<String>,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Extract and validate the slicer settings embedded in a G-code file.
    Inspect { file: String },

    /// Generate a calibration print from a sliced G-code file.
    ///
    /// The result goes to stdout unless --out is given, so diagnostics and
    /// status messages stay on stderr.
    Generate {
        file: String,

        /// Advance range preset for the extruder style.
        #[arg(long, value_enum, default_value_t = RangePreset::DirectDrive)]
        range: RangePreset,

        /// Custom range start; overrides --range. Needs --end.
        #[arg(long, requires = "end")]
        start: Option<f64>,

        /// Custom range end; overrides --range. Needs --start.
        #[arg(long, requires = "start")]
        end: Option<f64>,

        /// Pattern rotation in degrees, clockwise.
        #[arg(long, default_value_t = 0.0)]
        print_dir: f64,

        /// Length of each slow segment, mm.
        #[arg(long, default_value_t = 25.0)]
        length_slow: f64,

        /// Length of the fast middle segment, mm.
        #[arg(long, default_value_t = 100.0)]
        length_fast: f64,

        /// Center the pattern on the origin instead of the bed center.
        #[arg(long)]
        null_center: bool,

        /// Write the generated G-code to this file instead of stdout.
        #[arg(long, short)]
        out: Option<String>,
    },

    /// Explain a diagnostic ID (e.g. PA1002).
    Explain { id: String },
}

/// Advance range preset for the `generate` command.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum RangePreset {
    /// 0 to 0.2, typical for direct-drive extruders.
    DirectDrive,
    /// 0 to 2.0, typical for bowden extruders.
    Bowden,
}

impl From<RangePreset> for RangeMode {
    fn from(p: RangePreset) -> Self {
        match p {
            RangePreset::DirectDrive => RangeMode::DirectDrive,
            RangePreset::Bowden => RangeMode::Bowden,
        }
    }
}

// ── Main ────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    let format = Format::resolve_or_detect(cli.output.as_deref());

    match cli.cmd {
        Cmd::Inspect { file } => cmd_inspect(&file, format)?,
        Cmd::Generate {
            file,
            range,
            start,
            end,
            print_dir,
            length_slow,
            length_fast,
            null_center,
            out,
        } => {
            let mode = match (start, end) {
                (Some(start), Some(end)) => RangeMode::Custom { start, end },
                _ => range.into(),
            };
            let opts = GenerateOptions {
                range: mode,
                pattern: PatternOptions {
                    print_dir,
                    length_slow,
                    length_fast,
                    null_center,
                },
            };
            cmd_generate(&file, &opts, out.as_deref(), format)?;
        }
        Cmd::Explain { id } => cmd_explain(&id, format)?,
    }

    Ok(())
}

// ── Commands ────────────────────────────────────────────────────────────

fn cmd_inspect(file: &str, format: Format) -> Result<()> {
    let input = fs::read_to_string(file).with_context(|| format!("failed to read '{file}'"))?;
    let doc = inspect(&input, file)?;
    let settings = &doc.settings;
    let ok = settings.has_all_required && settings.error_count == 0;

    match format {
        Format::Json => {
            // Single valid JSON object to stdout.
            let out = serde_json::json!({
                "ok": ok,
                "settings": settings.report,
                "diagnostics": settings.diagnostics,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Format::Pretty => {
            // Report table to stdout, diagnostics to stderr.
            print_settings_table(&settings.report);
            if !settings.diagnostics.is_empty() {
                render_diagnostics(&input, file, &settings.diagnostics, format);
                print_summary(&settings.diagnostics);
            }
            if ok {
                eprintln!("settings ok");
            }
        }
    }

    exit_on_errors(&settings.diagnostics);
    Ok(())
}

fn cmd_generate(file: &str, opts: &GenerateOptions, out: Option<&str>, format: Format) -> Result<()> {
    let input = fs::read_to_string(file).with_context(|| format!("failed to read '{file}'"))?;

    // Validate first so setting-level problems come out as rendered
    // diagnostics rather than a bare error count.
    let doc = inspect(&input, file)?;
    if !doc.settings.diagnostics.is_empty() {
        render_diagnostics(&input, file, &doc.settings.diagnostics, format);
        print_summary(&doc.settings.diagnostics);
    }
    exit_on_errors(&doc.settings.diagnostics);
    if !doc.settings.has_all_required {
        // Required keys can be absent without producing an error-severity
        // diagnostic only if the file had no settings block at all.
        anyhow::bail!("'{file}' is missing required slicer settings");
    }

    let gcode = generate(&input, file, opts)
        .with_context(|| format!("failed to generate calibration pattern from '{file}'"))?;

    match out {
        Some(path) => {
            fs::write(path, &gcode).with_context(|| format!("failed to write '{path}'"))?;
            status_message(format, "generated", path);
        }
        None => print!("{gcode}"),
    }

    Ok(())
}

fn cmd_explain(id: &str, format: Format) -> Result<()> {
    match format {
        Format::Json => {
            let text = diag::explain(id);
            let out = serde_json::json!({
                "id": id,
                "explanation": text,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Format::Pretty => {
            // Explanation is the expected output — write to stdout, not stderr.
            if let Some(text) = diag::explain(id) {
                use ariadne::Fmt;
                println!("{}: {}", id.fg(ariadne::Color::Cyan), text);
            } else {
                println!("{}: (no explanation available)", id);
            }
        }
    }
    Ok(())
}

// ── Helpers ─────────────────────────────────────────────────────────────

/// Emit a one-line status message in the appropriate format.
fn status_message(format: Format, status: &str, file: &str) {
    match format {
        Format::Json => {
            let out = serde_json::json!({ "status": status, "file": file });
            println!(
                "{}",
                serde_json::to_string_pretty(&out).expect("status JSON serialization cannot fail")
            );
        }
        Format::Pretty => {
            eprintln!("{}: {}", status, file);
        }
    }
}

/// Exit with code 1 if any diagnostic is an error.
/// Warnings and info do not cause a non-zero exit.
fn exit_on_errors(diagnostics: &[Diagnostic]) {
    if diagnostics
        .iter()
        .any(|d| matches!(d.severity, Severity::Error))
    {
        process::exit(1);
    }
}
