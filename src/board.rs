//! Minimal Go rules engine used to referee engine moves.
//!
//! The board only knows what is needed to check that a move is legal:
//! placement on empty points, capture of opposing groups left without
//! liberties, suicide and simple ko. It never trusts an engine's own idea of
//! legality.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stone colour, also used to name the side to move.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Colour {
    /// Black, moves first.
    #[serde(rename = "b")]
    Black,
    /// White.
    #[serde(rename = "w")]
    White,
}

impl Colour {
    /// Both colours, in playing order.
    pub const ALL: [Colour; 2] = [Colour::Black, Colour::White];

    /// The other colour.
    pub fn opponent(self) -> Colour {
        match self {
            Colour::Black => Colour::White,
            Colour::White => Colour::Black,
        }
    }

    /// Lowercase protocol form (`"b"` or `"w"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Colour::Black => "b",
            Colour::White => "w",
        }
    }

    /// Uppercase prefix used in score strings (`"B"` or `"W"`).
    pub fn score_prefix(self) -> char {
        match self {
            Colour::Black => 'B',
            Colour::White => 'W',
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Colour::Black => 0,
            Colour::White => 1,
        }
    }

    /// Parse `"b"`, `"w"`, `"black"` or `"white"`, ignoring case.
    pub fn from_name(name: &str) -> Option<Colour> {
        match name.to_ascii_lowercase().as_str() {
            "b" | "black" => Some(Colour::Black),
            "w" | "white" => Some(Colour::White),
            _ => None,
        }
    }
}

impl fmt::Display for Colour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `(row, column)`, both 0-based; row 0 is the row printed as `1`.
pub type Point = (usize, usize);

/// Why a move was refused by the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IllegalMove {
    /// The point is not on the board.
    #[error("off-board point")]
    OffBoard,
    /// The point already holds a stone.
    #[error("occupied point")]
    OccupiedPoint,
    /// The placed stone's own group would have no liberties.
    #[error("suicide")]
    Suicide,
    /// Immediate single-stone recapture.
    #[error("ko-forbidden point")]
    KoForbidden,
}

/// Square Go board with the ko point of the previous move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    size: usize,
    cells: Vec<Option<Colour>>,
    ko_point: Option<Point>,
}

impl Board {
    /// Create an empty board of `size` x `size` points.
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![None; size * size],
            ko_point: None,
        }
    }

    /// Side length of the board.
    pub fn size(&self) -> usize {
        self.size
    }

    /// The point forbidden to the next move by the ko rule, if any.
    pub fn ko_point(&self) -> Option<Point> {
        self.ko_point
    }

    fn idx(&self, (row, col): Point) -> usize {
        row * self.size + col
    }

    fn on_board(&self, (row, col): Point) -> bool {
        row < self.size && col < self.size
    }

    /// Contents of a point, `None` when empty or off the board.
    pub fn get(&self, point: Point) -> Option<Colour> {
        if !self.on_board(point) {
            return None;
        }
        self.cells[self.idx(point)]
    }

    fn set(&mut self, point: Point, value: Option<Colour>) {
        let i = self.idx(point);
        self.cells[i] = value;
    }

    fn neighbours(&self, (row, col): Point) -> impl Iterator<Item = Point> {
        let s = self.size;
        let mut v = Vec::with_capacity(4);
        if row > 0 {
            v.push((row - 1, col));
        }
        if row + 1 < s {
            v.push((row + 1, col));
        }
        if col > 0 {
            v.push((row, col - 1));
        }
        if col + 1 < s {
            v.push((row, col + 1));
        }
        v.into_iter()
    }

    /// The stones connected to `point` and the distinct empty points touching them.
    fn group_and_liberties(&self, point: Point) -> (Vec<Point>, Vec<Point>) {
        let Some(colour) = self.get(point) else {
            return (vec![], vec![]);
        };
        let mut visited = vec![false; self.size * self.size];
        let mut counted = vec![false; self.size * self.size];
        let mut stones = Vec::new();
        let mut liberties = Vec::new();
        let mut stack = vec![point];
        visited[self.idx(point)] = true;
        while let Some(p) = stack.pop() {
            stones.push(p);
            for n in self.neighbours(p) {
                let ni = self.idx(n);
                match self.get(n) {
                    None if !counted[ni] => {
                        counted[ni] = true;
                        liberties.push(n);
                    }
                    Some(c) if c == colour && !visited[ni] => {
                        visited[ni] = true;
                        stack.push(n);
                    }
                    _ => {}
                }
            }
        }
        (stones, liberties)
    }

    /// Play a stone for `colour` at `point`.
    ///
    /// Opposing groups left without liberties are removed. On error the board
    /// is left exactly as it was.
    pub fn play(&mut self, colour: Colour, point: Point) -> Result<(), IllegalMove> {
        if !self.on_board(point) {
            return Err(IllegalMove::OffBoard);
        }
        if self.get(point).is_some() {
            return Err(IllegalMove::OccupiedPoint);
        }
        if self.ko_point == Some(point) {
            return Err(IllegalMove::KoForbidden);
        }

        self.set(point, Some(colour));
        let opponent = colour.opponent();
        let mut captured: Vec<Point> = Vec::new();
        for n in self.neighbours(point) {
            if self.get(n) != Some(opponent) {
                continue;
            }
            let (stones, liberties) = self.group_and_liberties(n);
            if liberties.is_empty() {
                for stone in stones {
                    self.set(stone, None);
                    captured.push(stone);
                }
            }
        }

        let (own_group, own_liberties) = self.group_and_liberties(point);
        if own_liberties.is_empty() {
            // nothing was captured, otherwise there would be a liberty
            self.set(point, None);
            return Err(IllegalMove::Suicide);
        }

        self.ko_point = match captured.as_slice() {
            [single] if own_group.len() == 1 && own_liberties == [*single] => Some(*single),
            _ => None,
        };
        Ok(())
    }

    /// A pass: always legal, clears the ko point.
    pub fn pass(&mut self) {
        self.ko_point = None;
    }

    /// Check a move without changing the board.
    pub fn check_move(&self, colour: Colour, point: Point) -> Result<(), IllegalMove> {
        self.clone().play(colour, point)
    }

    /// True if `colour` may play at `point`.
    pub fn is_legal(&self, colour: Colour, point: Point) -> bool {
        self.check_move(colour, point).is_ok()
    }

    /// Area score: black points minus white points, before komi.
    ///
    /// A point counts for a colour if it holds a stone of that colour, or is
    /// empty and every stone bordering its empty region has that colour.
    pub fn area_score(&self) -> i32 {
        let mut score = 0i32;
        let mut seen = vec![false; self.size * self.size];
        for row in 0..self.size {
            for col in 0..self.size {
                let point = (row, col);
                match self.get(point) {
                    Some(Colour::Black) => score += 1,
                    Some(Colour::White) => score -= 1,
                    None => {
                        if seen[self.idx(point)] {
                            continue;
                        }
                        let (size, owner) = self.empty_region(point, &mut seen);
                        match owner {
                            Some(Colour::Black) => score += size as i32,
                            Some(Colour::White) => score -= size as i32,
                            None => {}
                        }
                    }
                }
            }
        }
        score
    }

    /// Flood an empty region, returning its size and sole bordering colour.
    fn empty_region(&self, start: Point, seen: &mut [bool]) -> (usize, Option<Colour>) {
        let mut borders_black = false;
        let mut borders_white = false;
        let mut size = 0;
        let mut stack = vec![start];
        seen[self.idx(start)] = true;
        while let Some(p) = stack.pop() {
            size += 1;
            for n in self.neighbours(p) {
                match self.get(n) {
                    Some(Colour::Black) => borders_black = true,
                    Some(Colour::White) => borders_white = true,
                    None => {
                        let ni = self.idx(n);
                        if !seen[ni] {
                            seen[ni] = true;
                            stack.push(n);
                        }
                    }
                }
            }
        }
        let owner = match (borders_black, borders_white) {
            (true, false) => Some(Colour::Black),
            (false, true) => Some(Colour::White),
            _ => None,
        };
        (size, owner)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in (0..self.size).rev() {
            for col in 0..self.size {
                let ch = match self.get((row, col)) {
                    Some(Colour::Black) => '#',
                    Some(Colour::White) => 'o',
                    None => '.',
                };
                write!(f, "{ch} ")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vertex::parse_vertex;

    fn pt(board: &Board, vertex: &str) -> Point {
        parse_vertex(vertex, board.size()).unwrap().unwrap()
    }

    fn play_all(board: &mut Board, moves: &[(Colour, &str)]) {
        for &(colour, vertex) in moves {
            let p = pt(board, vertex);
            board.play(colour, p).unwrap();
        }
    }

    use Colour::{Black as B, White as W};

    #[test]
    fn test_occupied_point() {
        let mut board = Board::new(9);
        play_all(&mut board, &[(B, "D4")]);
        let p = pt(&board, "D4");
        assert_eq!(board.play(W, p), Err(IllegalMove::OccupiedPoint));
        assert_eq!(board.play(B, p), Err(IllegalMove::OccupiedPoint));
    }

    #[test]
    fn test_corner_capture() {
        let mut board = Board::new(9);
        play_all(&mut board, &[(W, "A1"), (B, "A2"), (B, "B1")]);
        assert_eq!(board.get((0, 0)), None);
        assert_eq!(board.ko_point(), None);
    }

    #[test]
    fn test_group_capture() {
        let mut board = Board::new(5);
        play_all(
            &mut board,
            &[(W, "A1"), (W, "B1"), (B, "A2"), (B, "B2"), (B, "C1")],
        );
        assert_eq!(board.get((0, 0)), None);
        assert_eq!(board.get((0, 1)), None);
        assert_eq!(board.area_score(), 25);
    }

    #[test]
    fn test_suicide_rolls_back() {
        let mut board = Board::new(9);
        play_all(&mut board, &[(B, "A2"), (B, "B1")]);
        let before = board.clone();
        let p = pt(&board, "A1");
        assert_eq!(board.play(W, p), Err(IllegalMove::Suicide));
        assert_eq!(board, before);
    }

    #[test]
    fn test_capture_is_not_suicide() {
        let mut board = Board::new(9);
        // B1 has no empty neighbour but takes A1
        play_all(&mut board, &[(W, "A1"), (B, "A2"), (W, "C1"), (W, "B2")]);
        let p = pt(&board, "B1");
        assert!(board.check_move(B, p).is_ok());
    }

    fn ko_position() -> Board {
        let mut board = Board::new(9);
        play_all(
            &mut board,
            &[
                (B, "C5"),
                (W, "F5"),
                (B, "D6"),
                (W, "E4"),
                (B, "D4"),
                (W, "E6"),
                (B, "E5"),
                (W, "D5"),
            ],
        );
        board
    }

    #[test]
    fn test_ko_forbids_immediate_retake() {
        let board = ko_position();
        let e5 = pt(&board, "E5");
        assert_eq!(board.get(e5), None);
        assert_eq!(board.ko_point(), Some(e5));
        assert_eq!(board.check_move(B, e5), Err(IllegalMove::KoForbidden));
        assert!(!board.is_legal(B, e5));
    }

    #[test]
    fn test_ko_cleared_by_intervening_moves() {
        let mut board = ko_position();
        play_all(&mut board, &[(B, "J9"), (W, "J1")]);
        assert_eq!(board.ko_point(), None);
        let e5 = pt(&board, "E5");
        board.play(B, e5).unwrap();
        assert_eq!(board.get(pt(&board, "D5")), None);
    }

    #[test]
    fn test_pass_clears_ko() {
        let mut board = ko_position();
        board.pass();
        assert_eq!(board.ko_point(), None);
    }

    #[test]
    fn test_check_move_has_no_side_effects() {
        let board = ko_position();
        let before = board.clone();
        let _ = board.check_move(W, pt(&board, "A1"));
        let _ = board.check_move(B, pt(&board, "E5"));
        assert_eq!(board, before);
    }

    #[test]
    fn test_multi_stone_capture_sets_no_ko() {
        let mut board = Board::new(9);
        play_all(
            &mut board,
            &[
                (W, "A1"),
                (W, "A2"),
                (B, "B1"),
                (B, "B2"),
                (B, "A4"),
                (W, "B3"),
                (W, "A5"),
                (W, "B4"),
            ],
        );
        board.play(B, pt(&board, "A3")).unwrap();
        assert_eq!(board.get((0, 0)), None);
        assert_eq!(board.get((1, 0)), None);
        assert_eq!(board.ko_point(), None);
    }

    #[test]
    fn test_area_score_empty_board() {
        assert_eq!(Board::new(9).area_score(), 0);
    }

    #[test]
    fn test_area_score_split_board() {
        let mut board = Board::new(9);
        for row in 1..=9 {
            play_all(
                &mut board,
                &[(B, &format!("E{row}")), (W, &format!("G{row}"))],
            );
        }
        // black: 9 stones + 36 territory, white: 9 stones + 18, column F is dame
        assert_eq!(board.area_score(), 18);
    }

    #[test]
    fn test_colour_names() {
        assert_eq!(Colour::from_name("B"), Some(B));
        assert_eq!(Colour::from_name("white"), Some(W));
        assert_eq!(Colour::from_name("x"), None);
        assert_eq!(B.opponent(), W);
        assert_eq!(W.to_string(), "w");
    }
}
