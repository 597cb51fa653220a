//! Slicer start-G-code template evaluation.
//!
//! The slicer stores its custom start G-code as a single settings value with
//! literal `\n` escape sequences between logical lines and two placeholder
//! styles inside them: `[name]` / `[name_N]` (square, optional trailing
//! 0-based tool suffix) and `{name}` / `{name[N]}` (curly, optional 1-based
//! index). This module parses a line into [`Block`]s, re-renders the blocks
//! against a replacement map, and guarantees that parsing followed by
//! [`join_blocks`] reproduces the input byte for byte.

use std::collections::BTreeMap;

use crate::error::GcodeError;

/// One parsed segment of a template line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Verbatim text between placeholders.
    Literal(String),
    /// A `[name]`, `[name_N]`, `{name}`, or `{name[N]}` placeholder.
    Placeholder {
        /// The placeholder exactly as written, including delimiters.
        raw: String,
        /// The variable name.
        name: String,
        /// Resolved 0-based index into the variable's value list.
        index: Option<usize>,
    },
    /// An empty `[]` or `{}`, preserved verbatim and rendered as nothing.
    Elided {
        /// The pair exactly as written.
        raw: String,
    },
}

/// Variable name to value-list mapping used when rendering.
pub type Replacements = BTreeMap<String, Vec<String>>;

/// Split one template line into blocks.
///
/// A `[` or `{` with no matching close bracket on the same line is a
/// structural error; templates never span brackets across lines.
pub fn split_to_blocks(line: &str) -> Result<Vec<Block>, GcodeError> {
    let mut blocks = Vec::new();
    let mut literal = String::new();
    let mut rest = line;

    while let Some(pos) = rest.find(['[', '{']) {
        let open = rest.as_bytes()[pos] as char;
        let close = if open == '[' { ']' } else { '}' };
        literal.push_str(&rest[..pos]);
        let after_open = &rest[pos + 1..];
        let Some(end) = after_open.find(close) else {
            return Err(GcodeError::UnterminatedBlock {
                line: line.to_string(),
                open,
                close,
            });
        };
        if !literal.is_empty() {
            blocks.push(Block::Literal(std::mem::take(&mut literal)));
        }
        let inner = &after_open[..end];
        let raw = format!("{open}{inner}{close}");
        blocks.push(parse_placeholder(raw, inner, open));
        rest = &after_open[end + 1..];
    }

    literal.push_str(rest);
    if !literal.is_empty() {
        blocks.push(Block::Literal(literal));
    }
    Ok(blocks)
}

fn parse_placeholder(raw: String, inner: &str, open: char) -> Block {
    if inner.is_empty() {
        return Block::Elided { raw };
    }
    let (name, index) = if open == '[' {
        split_square_index(inner)
    } else {
        split_curly_index(inner)
    };
    Block::Placeholder {
        raw,
        name: name.to_string(),
        index,
    }
}

/// `name_N` with a trailing all-digit suffix carries a 0-based index.
fn split_square_index(inner: &str) -> (&str, Option<usize>) {
    if let Some((name, suffix)) = inner.rsplit_once('_')
        && !name.is_empty()
        && !suffix.is_empty()
        && suffix.bytes().all(|b| b.is_ascii_digit())
        && let Ok(index) = suffix.parse::<usize>()
    {
        return (name, Some(index));
    }
    (inner, None)
}

/// `name[N]` carries a 1-based index; `[0]` and `[1]` both mean the first.
fn split_curly_index(inner: &str) -> (&str, Option<usize>) {
    if let Some(stripped) = inner.strip_suffix(']')
        && let Some((name, digits)) = stripped.split_once('[')
        && !name.is_empty()
        && !digits.is_empty()
        && digits.bytes().all(|b| b.is_ascii_digit())
        && let Ok(n) = digits.parse::<usize>()
    {
        return (name, Some(n.saturating_sub(1)));
    }
    (inner, None)
}

/// Reassemble blocks into the exact original line.
pub fn join_blocks(blocks: &[Block]) -> String {
    let mut out = String::new();
    for block in blocks {
        match block {
            Block::Literal(text) => out.push_str(text),
            Block::Placeholder { raw, .. } | Block::Elided { raw } => out.push_str(raw),
        }
    }
    out
}

/// Render blocks against a replacement map.
///
/// Placeholders without an index take the variable's first value. Unknown
/// variables and out-of-range indices are hard errors; an elided pair
/// renders as nothing.
pub fn render_blocks(blocks: &[Block], vars: &Replacements) -> Result<String, GcodeError> {
    let mut out = String::new();
    for block in blocks {
        match block {
            Block::Literal(text) => out.push_str(text),
            Block::Elided { .. } => {}
            Block::Placeholder { name, index, .. } => {
                let values = vars
                    .get(name)
                    .ok_or_else(|| GcodeError::UnknownVariable(name.clone()))?;
                let idx = index.unwrap_or(0);
                let value = values.get(idx).ok_or_else(|| GcodeError::IndexOutOfRange {
                    variable: name.clone(),
                    index: idx,
                    len: values.len(),
                })?;
                out.push_str(value);
            }
        }
    }
    Ok(out)
}

/// Evaluate a raw start-G-code settings value into concrete G-code lines.
///
/// The raw value uses the literal two-character sequence `\n` between
/// logical lines; each logical line is parsed and rendered independently and
/// the results are joined with real newlines.
pub fn evaluate_gcode_template(raw: &str, vars: &Replacements) -> Result<String, GcodeError> {
    let mut lines = Vec::new();
    for logical in raw.split("\\n") {
        let blocks = split_to_blocks(logical)?;
        lines.push(render_blocks(&blocks, vars)?);
    }
    Ok(lines.join("\n"))
}
