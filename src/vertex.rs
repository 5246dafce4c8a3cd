//! Conversion between board points and GTP vertex text.
//!
//! Columns are lettered from `A`, skipping `I`; rows are numbered from 1 at
//! the bottom. Input is accepted in any case, output is uppercase.

use thiserror::Error;

use crate::board::Point;

const COLUMN_LETTERS: &str = "ABCDEFGHJKLMNOPQRSTUVWXYZ";

/// Largest board size that vertex text can describe.
pub const MAX_BOARD_SIZE: usize = 25;

/// Vertex text that does not name a point on the board.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("ill-formed vertex '{0}'")]
pub struct VertexError(pub String);

/// Parse vertex text for a board of `size`.
///
/// Returns `Ok(None)` for `pass`.
pub fn parse_vertex(text: &str, size: usize) -> Result<Option<Point>, VertexError> {
    let ill_formed = || VertexError(text.to_string());
    let s = text.trim().to_ascii_uppercase();
    if s == "PASS" {
        return Ok(None);
    }
    let mut chars = s.chars();
    let letter = chars.next().ok_or_else(ill_formed)?;
    let col = COLUMN_LETTERS.find(letter).ok_or_else(ill_formed)?;
    let digits = chars.as_str();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ill_formed());
    }
    let row: usize = digits.parse().map_err(|_| ill_formed())?;
    if row == 0 || row > size || col >= size {
        return Err(ill_formed());
    }
    Ok(Some((row - 1, col)))
}

/// Format a point (or `None` for a pass) as uppercase vertex text.
pub fn format_vertex(point: Option<Point>) -> String {
    match point {
        None => "pass".to_string(),
        Some((row, col)) => match COLUMN_LETTERS.as_bytes().get(col) {
            Some(&letter) => format!("{}{}", letter as char, row + 1),
            None => "??".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_corners() {
        assert_eq!(parse_vertex("A1", 9), Ok(Some((0, 0))));
        assert_eq!(parse_vertex("j9", 9), Ok(Some((8, 8))));
        assert_eq!(parse_vertex("T19", 19), Ok(Some((18, 18))));
    }

    #[test]
    fn test_parse_pass() {
        assert_eq!(parse_vertex("pass", 9), Ok(None));
        assert_eq!(parse_vertex("PASS", 19), Ok(None));
    }

    #[test]
    fn test_letter_i_is_skipped() {
        assert!(parse_vertex("I5", 19).is_err());
        assert_eq!(parse_vertex("H5", 19), Ok(Some((4, 7))));
        assert_eq!(parse_vertex("J5", 19), Ok(Some((4, 8))));
    }

    #[test]
    fn test_parse_out_of_range() {
        assert!(parse_vertex("Z99", 9).is_err());
        assert!(parse_vertex("K1", 9).is_err());
        assert!(parse_vertex("A10", 9).is_err());
        assert!(parse_vertex("A0", 9).is_err());
    }

    #[test]
    fn test_parse_garbage() {
        for text in ["", "A", "4", "A-1", "A+1", "resign", "AA1"] {
            assert!(parse_vertex(text, 19).is_err(), "{text} accepted");
        }
    }

    #[test]
    fn test_format() {
        assert_eq!(format_vertex(Some((0, 4))), "E1");
        assert_eq!(format_vertex(Some((18, 8))), "J19");
        assert_eq!(format_vertex(None), "pass");
    }
}
