//! Seven-segment style digit rendering for labeling test lines.
//!
//! Each character is drawn from a small stroke vocabulary on a 2 mm segment
//! grid. `1` and `.` are narrow (1 mm advance); every other character
//! advances the cursor by the full 3 mm glyph spacing.

use super::emit::{Basic, create_line, e_feed, move_to};
use crate::error::GcodeError;

const SEG: f64 = 2.0;
const DOT: f64 = 0.4;
const SPACING: f64 = 3.0;

#[derive(Debug, Clone, Copy)]
enum Stroke {
    Up,
    Down,
    Left,
    Right,
    /// Travel move one segment up, without extruding.
    MoveUp,
    Dot,
}

fn strokes_for(c: char) -> Result<&'static [Stroke], GcodeError> {
    use Stroke::*;
    Ok(match c {
        '1' => &[Up, Up],
        '2' => &[MoveUp, MoveUp, Right, Down, Left, Down, Right],
        '3' => &[MoveUp, MoveUp, Right, Down, Down, Left, MoveUp, Right],
        '4' => &[MoveUp, MoveUp, Down, Right, MoveUp, Down, Down],
        '5' => &[Right, Up, Left, Up, Right],
        '6' => &[MoveUp, Right, Down, Left, Up, Up, Right],
        '7' => &[MoveUp, MoveUp, Right, Down, Down],
        '8' => &[MoveUp, Right, Down, Left, Up, Up, Right, Down],
        '9' => &[Right, Up, Left, Up, Right, Down],
        '0' => &[Right, Up, Up, Left, Down, Down],
        '.' => &[Dot],
        other => return Err(GcodeError::UnknownGlyph(other)),
    })
}

/// Draw `text` starting at (`start_x`, `start_y`), retracting between
/// characters so travel moves don't ooze.
pub(super) fn create_glyphs(
    out: &mut String,
    mut start_x: f64,
    start_y: f64,
    basic: &Basic,
    text: &str,
) -> Result<(), GcodeError> {
    let chars: Vec<char> = text.chars().collect();
    for (i, &c) in chars.iter().enumerate() {
        let comment = format!(" ; {c}\n");
        let mut x_count = 0.0f64;
        let mut y_count = 0.0f64;
        for stroke in strokes_for(c)? {
            match stroke {
                Stroke::Up => {
                    create_line(
                        out,
                        start_x + x_count * SEG,
                        start_y + y_count * SEG + SEG,
                        SEG,
                        basic,
                        None,
                        None,
                        &comment,
                    );
                    y_count += 1.0;
                }
                Stroke::Down => {
                    create_line(
                        out,
                        start_x + x_count * SEG,
                        start_y + y_count * SEG - SEG,
                        SEG,
                        basic,
                        None,
                        None,
                        &comment,
                    );
                    y_count -= 1.0;
                }
                Stroke::Right => {
                    create_line(
                        out,
                        start_x + x_count * SEG + SEG,
                        start_y + y_count * SEG,
                        SEG,
                        basic,
                        None,
                        None,
                        &comment,
                    );
                    x_count += 1.0;
                }
                Stroke::Left => {
                    create_line(
                        out,
                        start_x + x_count * SEG - SEG,
                        start_y + y_count * SEG,
                        SEG,
                        basic,
                        None,
                        None,
                        &comment,
                    );
                    x_count -= 1.0;
                }
                Stroke::MoveUp => {
                    move_to(
                        out,
                        start_x + x_count * SEG,
                        start_y + y_count * SEG + SEG,
                        basic,
                    );
                    y_count += 1.0;
                }
                Stroke::Dot => {
                    create_line(out, start_x, start_y + DOT, DOT, basic, None, None, " ; dot\n");
                }
            }
        }
        start_x += if c == '1' || c == '.' { 1.0 } else { SPACING };
        if i != chars.len() - 1 {
            e_feed(out, false, basic);
            move_to(out, start_x, start_y, basic);
            e_feed(out, true, basic);
        }
    }
    Ok(())
}
