//! Raw-value parsers and display formatters for slicer settings.
//!
//! Every parser is local in its failure: it appends to the setting's own
//! diagnostic list and returns `None`, leaving all other settings
//! unaffected. Nothing here ever aborts extraction.

use std::collections::BTreeMap;

use pa_toolchain_diagnostics::{Diagnostic, Span, codes};

use super::BedShape;

fn ctx(key: &str, raw: &str) -> BTreeMap<String, String> {
    BTreeMap::from([("key".into(), key.into()), ("raw".into(), raw.into())])
}

// ── Parsers ─────────────────────────────────────────────────────────────

pub(super) fn string(
    _key: &'static str,
    raw: &str,
    _tool: Option<usize>,
    _span: Option<Span>,
    _diags: &mut Vec<Diagnostic>,
) -> Option<String> {
    Some(raw.to_string())
}

pub(super) fn float(
    key: &'static str,
    raw: &str,
    _tool: Option<usize>,
    span: Option<Span>,
    diags: &mut Vec<Diagnostic>,
) -> Option<f64> {
    parse_number(key, raw, raw, span, diags)
}

/// Integer settings tolerate a fractional tail the way the slicer sometimes
/// writes one (`"250.5"` → 250); anything non-numeric is an error.
pub(super) fn int(
    key: &'static str,
    raw: &str,
    _tool: Option<usize>,
    span: Option<Span>,
    diags: &mut Vec<Diagnostic>,
) -> Option<i64> {
    parse_number(key, raw, raw, span, diags).map(|v| v.trunc() as i64)
}

/// Tool-indexed float: the raw text is one comma-separated entry per
/// extruder; `tool` is the 1-based index resolved from `perimeter_extruder`.
pub(super) fn tool_float(
    key: &'static str,
    raw: &str,
    tool: Option<usize>,
    span: Option<Span>,
    diags: &mut Vec<Diagnostic>,
) -> Option<f64> {
    let entry = tool_entry(key, raw, ',', tool, span, diags)?;
    parse_number(key, entry, raw, span, diags)
}

/// Tool-indexed quoted string: entries are semicolon-separated and each is
/// unwrapped from surrounding quote characters.
pub(super) fn tool_quoted_string(
    key: &'static str,
    raw: &str,
    tool: Option<usize>,
    span: Option<Span>,
    diags: &mut Vec<Diagnostic>,
) -> Option<String> {
    let entry = tool_entry(key, raw, ';', tool, span, diags)?;
    let unquoted = entry
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(entry);
    Some(unquoted.to_string())
}

/// Bed shape: exactly 4 comma-separated corner coordinates, the first
/// anchored at `0x0`; the 3rd corner carries the bed size. Any other corner
/// count means a round (delta) bed, which is rejected outright.
pub(super) fn bed_shape(
    key: &'static str,
    raw: &str,
    _tool: Option<usize>,
    span: Option<Span>,
    diags: &mut Vec<Diagnostic>,
) -> Option<BedShape> {
    let parts: Vec<&str> = raw.split(',').collect();
    if parts.len() != 4 {
        diags.push(
            Diagnostic::error(
                codes::BED_SHAPE_UNSUPPORTED,
                format!("setting `{key}` does not describe a rectangular bed; round beds are not supported"),
                span,
            )
            .with_context(ctx(key, raw)),
        );
        return None;
    }
    if parts[0].trim() != "0x0" {
        diags.push(
            Diagnostic::error(
                codes::BED_ORIGIN_NONZERO,
                format!("setting `{key}` describes a rectangular bed with a non-zero origin; this is not supported"),
                span,
            )
            .with_context(ctx(key, raw)),
        );
        return None;
    }
    // The 3rd corner is the (max_x, max_y) of an origin-anchored bed.
    let Some((max_x, max_y)) = parts[2].trim().split_once('x') else {
        diags.push(
            Diagnostic::error(
                codes::NOT_A_NUMBER,
                format!("setting `{key}` ({raw}): corner `{}` is not of the form <x>x<y>", parts[2]),
                span,
            )
            .with_context(ctx(key, raw)),
        );
        return None;
    };
    let x = parse_number(key, max_x, raw, span, diags)?.trunc() as i64;
    let y = parse_number(key, max_y, raw, span, diags)?.trunc() as i64;
    Some(BedShape { x, y })
}

// ── Shared pieces ───────────────────────────────────────────────────────

fn parse_number(
    key: &'static str,
    text: &str,
    raw: &str,
    span: Option<Span>,
    diags: &mut Vec<Diagnostic>,
) -> Option<f64> {
    match text.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => {
            diags.push(
                Diagnostic::error(
                    codes::NOT_A_NUMBER,
                    format!("setting `{key}` ({raw}) is not a number"),
                    span,
                )
                .with_context(ctx(key, raw)),
            );
            None
        }
    }
}

fn tool_entry<'a>(
    key: &'static str,
    raw: &'a str,
    sep: char,
    tool: Option<usize>,
    span: Option<Span>,
    diags: &mut Vec<Diagnostic>,
) -> Option<&'a str> {
    let Some(tool) = tool else {
        diags.push(
            Diagnostic::error(
                codes::TOOL_INDEX_UNKNOWN,
                format!(
                    "can't unpack `{key}` ({raw}) because the setting for `perimeter_extruder` is missing or invalid"
                ),
                span,
            )
            .with_context(ctx(key, raw)),
        );
        return None;
    };
    let entry = raw.split(sep).nth(tool - 1);
    if entry.is_none() {
        let mut c = ctx(key, raw);
        c.insert("tool".into(), tool.to_string());
        diags.push(
            Diagnostic::error(
                codes::TOOL_ENTRY_MISSING,
                format!("setting `{key}` ({raw}) does not have enough entries for tool #{tool}"),
                span,
            )
            .with_context(c),
        );
    }
    entry.map(str::trim)
}

// ── Display formatters ──────────────────────────────────────────────────

pub(super) fn show_string(v: &String) -> String {
    v.clone()
}

pub(super) fn show_number(v: &f64) -> String {
    v.to_string()
}

pub(super) fn show_int(v: &i64) -> String {
    v.to_string()
}

pub(super) fn show_mm(v: &f64) -> String {
    format!("{v} mm")
}

pub(super) fn show_mms(v: &f64) -> String {
    format!("{v} mm/s")
}

pub(super) fn show_int_mms(v: &i64) -> String {
    format!("{v} mm/s")
}

pub(super) fn show_mms2(v: &i64) -> String {
    format!("{v} mm/s^2")
}

pub(super) fn show_mm3s(v: &f64) -> String {
    format!("{v} mm^3/s")
}

pub(super) fn show_temp(v: &f64) -> String {
    format!("{v} °C")
}

pub(super) fn show_percent(v: &f64) -> String {
    format!("{v} %")
}

pub(super) fn show_bed(v: &BedShape) -> String {
    format!("Rectangular: {}mm x {}mm", v.x, v.y)
}
