use core::fmt;
use std::{
    fmt::Display,
    mem,
    num::NonZeroU8,
    ops::{Index, IndexMut, Not},
};

use anyhow::{bail, Context};

pub mod engine;
pub mod eval;
pub mod position;
pub mod zobrist;

use zobrist::ZOBRIST_HASHER;

pub use anyhow::Result;

pub const START_BOARD_FEN: &str = "W:W31-50:B1-20";

/// number of playable (dark) squares on the board
pub const SQUARE_COUNT: usize = 50;
/// squares per row
pub const ROW_WIDTH: u8 = 5;
pub const BOARD_SIZE: i8 = 10;

const DIAGONALS: [(i8, i8); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PieceType {
    Man = 0b01,
    King = 0b10,
}

impl PieceType {
    pub const ALL_TYPES: [PieceType; 2] = [PieceType::Man, PieceType::King];
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Color {
    White = 0,
    Black = 0b100,
}

impl Color {
    pub const ALL_COLORS: [Color; 2] = [Color::White, Color::Black];

    /// Black is the maximizing side, positive scores favour it.
    #[inline]
    pub fn is_maximizer(self) -> bool {
        self == Color::Black
    }

    /// sign of a score term that favours this color
    #[inline]
    pub fn sign(self) -> i32 {
        match self {
            Color::White => -1,
            Color::Black => 1,
        }
    }

    /// row direction in which men of this color move
    #[inline]
    pub fn forward(self) -> i8 {
        match self {
            Color::White => -1,
            Color::Black => 1,
        }
    }

    /// row on which men of this color are crowned
    #[inline]
    pub fn promotion_row(self) -> i8 {
        match self {
            Color::White => 0,
            Color::Black => BOARD_SIZE - 1,
        }
    }
}

impl Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Color::White => f.write_str("White"),
            Color::Black => f.write_str("Black"),
        }
    }
}

impl Not for Color {
    type Output = Color;

    fn not(self) -> Self::Output {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Piece(NonZeroU8);

impl Piece {
    pub fn new(typ: PieceType, color: Color) -> Self {
        // Safety: typ is always > 0
        unsafe { Piece(NonZeroU8::new_unchecked(typ as u8 | color as u8)) }
    }

    #[inline(always)]
    pub fn typ(&self) -> PieceType {
        let typ = self.0.get() & 0b11;
        assert!(typ != 0 && typ != 0b11, "Invalid draughts piece");
        unsafe { mem::transmute_copy(&typ) }
    }

    #[inline(always)]
    pub fn color(&self) -> Color {
        if self.0.get() & Color::Black as u8 == Color::Black as u8 {
            Color::Black
        } else {
            Color::White
        }
    }

    #[inline(always)]
    pub fn is_king(&self) -> bool {
        self.typ() == PieceType::King
    }

    pub fn crowned(self) -> Self {
        Piece::new(PieceType::King, self.color())
    }

    pub fn ascii_char(&self) -> char {
        match (self.typ(), self.color()) {
            (PieceType::Man, Color::White) => 'w',
            (PieceType::King, Color::White) => 'W',
            (PieceType::Man, Color::Black) => 'b',
            (PieceType::King, Color::Black) => 'B',
        }
    }

    fn zobrist_index(&self) -> usize {
        match (self.typ(), self.color()) {
            (PieceType::Man, Color::White) => 0,
            (PieceType::King, Color::White) => 1,
            (PieceType::Man, Color::Black) => 2,
            (PieceType::King, Color::Black) => 3,
        }
    }
}

impl fmt::Debug for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Piece")
            .field("type", &self.typ())
            .field("color", &self.color())
            .finish()
    }
}

/// (row, column) of a field index. Row 0 is Black's back row, only dark
/// squares are indexed.
#[inline]
pub fn coords(index: u8) -> (i8, i8) {
    let row = index / ROW_WIDTH;
    let k = index % ROW_WIDTH;
    let col = if row % 2 == 0 { 2 * k + 1 } else { 2 * k };
    (row as i8, col as i8)
}

/// field index of a board coordinate, `None` for light or off-board squares
#[inline]
pub fn index_at(row: i8, col: i8) -> Option<u8> {
    if !(0..BOARD_SIZE).contains(&row) || !(0..BOARD_SIZE).contains(&col) || (row + col) % 2 == 0
    {
        return None;
    }
    Some((row * ROW_WIDTH as i8 + col / 2) as u8)
}

#[inline]
fn bit(index: u8) -> u64 {
    1 << index
}

/// iterates the field indices set in `mask`
pub fn squares(mut mask: u64) -> impl Iterator<Item = u8> {
    std::iter::from_fn(move || {
        if mask == 0 {
            None
        } else {
            let index = mask.trailing_zeros() as u8;
            mask &= mask - 1;
            Some(index)
        }
    })
}

/// A complete draughts move. Field indices are 0 based, square numbers
/// (as printed) are `index + 1`.
///
/// A capture stores every captured field and which of them held a king so
/// that [Board::undo_move] can restore the position without extra state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: u8,
    pub to: u8,
    pub captures: u64,
    pub captured_kings: u64,
    pub promotes: bool,
}

impl Move {
    pub fn new(from: u8, to: u8) -> Self {
        Move {
            from,
            to,
            captures: 0,
            captured_kings: 0,
            promotes: false,
        }
    }

    pub fn capture(from: u8, to: u8, captures: u64, captured_kings: u64) -> Self {
        Move {
            from,
            to,
            captures,
            captured_kings,
            promotes: false,
        }
    }

    pub fn with_promotion(mut self, promotes: bool) -> Self {
        self.promotes = promotes;
        self
    }

    #[inline]
    pub fn is_capture(&self) -> bool {
        self.captures != 0
    }

    #[inline]
    pub fn capture_count(&self) -> u32 {
        self.captures.count_ones()
    }
}

impl Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sep = if self.is_capture() { 'x' } else { '-' };
        write!(f, "{}{}{}", self.from + 1, sep, self.to + 1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    fields: [Option<Piece>; SQUARE_COUNT],

    pub next_move: Color,

    pub zobrist_hash: u64,
}

impl Default for Board {
    fn default() -> Self {
        Board::empty()
    }
}

impl Board {
    pub fn empty() -> Self {
        let mut board = Board {
            fields: [None; SQUARE_COUNT],
            next_move: Color::White,
            zobrist_hash: 0,
        };
        board.zobrist_hash = board.calculate_zobrist_hash();
        board
    }

    pub fn start() -> Self {
        Board::from_fen(START_BOARD_FEN).expect("start position is valid")
    }

    /// Parses a draughts FEN like `W:W31-50:B1-20`. Square lists are comma
    /// separated, accept ranges and a `K` prefix for kings.
    pub fn from_fen(fen: &str) -> Result<Self> {
        let fen = fen.trim().trim_end_matches('.');
        let mut parts = fen.split(':');

        let next_move = match parts.next() {
            Some("W") => Color::White,
            Some("B") => Color::Black,
            other => bail!("Expected either 'W' or 'B' to move, got {other:?}"),
        };

        let mut fields = [None; SQUARE_COUNT];
        for part in parts {
            let mut chars = part.chars();
            let color = match chars.next() {
                Some('W') => Color::White,
                Some('B') => Color::Black,
                c => bail!("Expected piece list color 'W' or 'B', got {c:?}"),
            };
            let list = chars.as_str();
            if list.is_empty() {
                continue;
            }
            for item in list.split(',') {
                let item = item.trim();
                let (typ, item) = match item.strip_prefix('K') {
                    Some(rest) => (PieceType::King, rest),
                    None => (PieceType::Man, item),
                };
                let (first, last) = match item.split_once('-') {
                    Some((first, last)) => (parse_square(first)?, parse_square(last)?),
                    None => {
                        let square = parse_square(item)?;
                        (square, square)
                    }
                };
                if first > last {
                    bail!("Invalid square range '{item}'");
                }
                for square in first..=last {
                    let field = &mut fields[square as usize - 1];
                    if field.is_some() {
                        bail!("Square {square} is occupied twice");
                    }
                    *field = Some(Piece::new(typ, color));
                }
            }
        }

        let mut board = Board {
            fields,
            next_move,
            zobrist_hash: 0,
        };
        board.zobrist_hash = board.calculate_zobrist_hash();
        Ok(board)
    }

    pub fn calculate_zobrist_hash(&self) -> u64 {
        ZOBRIST_HASHER.hash(&self.fields, self.next_move)
    }

    pub fn generate_fen(&self) -> String {
        let mut fen = String::new();
        match self.next_move {
            Color::White => fen.push('W'),
            Color::Black => fen.push('B'),
        }
        for (color, tag) in [(Color::White, ":W"), (Color::Black, ":B")] {
            fen.push_str(tag);
            let squares: Vec<String> = self
                .fields
                .iter()
                .enumerate()
                .filter_map(|(idx, piece)| match piece {
                    Some(piece) if piece.color() == color => Some(if piece.is_king() {
                        format!("K{}", idx + 1)
                    } else {
                        (idx + 1).to_string()
                    }),
                    _ => None,
                })
                .collect();
            fen.push_str(&squares.join(","));
        }
        fen
    }

    pub fn pieces(&self) -> impl Iterator<Item = (u8, Piece)> + '_ {
        self.fields
            .iter()
            .enumerate()
            .filter_map(|(idx, piece)| piece.map(|piece| (idx as u8, piece)))
    }

    pub fn piece_count(&self, color: Color) -> usize {
        self.pieces().filter(|(_, p)| p.color() == color).count()
    }

    /// `None` while the side to move can still move, otherwise the side that won
    pub fn winner(&self) -> Option<Color> {
        if self.has_legal_move() {
            None
        } else {
            Some(!self.next_move)
        }
    }

    /// Checks whether the side to move has any legal move, without
    /// generating them. A piece that can jump always has a legal (capturing)
    /// move, so single jumps are enough here.
    pub fn has_legal_move(&self) -> bool {
        let color = self.next_move;
        self.pieces()
            .filter(|(_, piece)| piece.color() == color)
            .any(|(at, piece)| self.can_step(at, piece) || self.can_jump(at, piece))
    }

    /// Generates all legal moves for [Board::next_move]. Captures are
    /// mandatory and only the sequences capturing the most pieces are legal.
    pub fn generate_valid_moves(&self) -> Vec<Move> {
        let color = self.next_move;

        let mut captures = Vec::new();
        for (at, piece) in self.pieces() {
            if piece.color() == color {
                self.collect_captures(at, piece, at, 0, 0, &mut captures);
            }
        }
        if !captures.is_empty() {
            let most = captures.iter().map(Move::capture_count).max().unwrap_or(0);
            let mut moves: Vec<Move> = Vec::with_capacity(captures.len());
            for mve in captures {
                if mve.capture_count() == most && !moves.contains(&mve) {
                    moves.push(mve);
                }
            }
            return moves;
        }

        let mut moves = Vec::with_capacity(32);
        for (at, piece) in self.pieces() {
            if piece.color() == color {
                moves = self.generate_steps(at, piece, moves);
            }
        }
        moves
    }

    /// legal moves starting on `piece_at`
    pub fn generate_valid_moves_for_piece(&self, piece_at: u8) -> Vec<Move> {
        let mut moves = self.generate_valid_moves();
        moves.retain(|m| m.from == piece_at);
        moves
    }

    fn generate_steps(&self, at: u8, piece: Piece, mut moves: Vec<Move>) -> Vec<Move> {
        let (row, col) = coords(at);
        match piece.typ() {
            PieceType::Man => {
                let dr = piece.color().forward();
                for dc in [-1, 1] {
                    if let Some(to) = index_at(row + dr, col + dc) {
                        if self[to].is_none() {
                            let promotes = row + dr == piece.color().promotion_row();
                            moves.push(Move::new(at, to).with_promotion(promotes));
                        }
                    }
                }
            }
            PieceType::King => {
                for (dr, dc) in DIAGONALS {
                    let mut dist = 1;
                    while let Some(to) = index_at(row + dr * dist, col + dc * dist) {
                        if self[to].is_some() {
                            break;
                        }
                        moves.push(Move::new(at, to));
                        dist += 1;
                    }
                }
            }
        }
        moves
    }

    /// Depth first search over capture sequences of the piece that started
    /// on `origin` and currently stands on `at`. Only sequences that can not
    /// be extended are pushed.
    fn collect_captures(
        &self,
        origin: u8,
        piece: Piece,
        at: u8,
        captured: u64,
        captured_kings: u64,
        moves: &mut Vec<Move>,
    ) {
        let (row, col) = coords(at);
        let mut extended = false;

        for (dr, dc) in DIAGONALS {
            let mut dist = 1;
            if piece.is_king() {
                while let Some(sq) = index_at(row + dr * dist, col + dc * dist) {
                    if !self.is_vacant(sq, origin) {
                        break;
                    }
                    dist += 1;
                }
            }

            let Some(over) = index_at(row + dr * dist, col + dc * dist) else {
                continue;
            };
            if !self.is_capturable(over, piece.color(), captured) {
                continue;
            }
            let kings = match self[over] {
                Some(p) if p.is_king() => captured_kings | bit(over),
                _ => captured_kings,
            };

            dist += 1;
            while let Some(land) = index_at(row + dr * dist, col + dc * dist) {
                if !self.is_vacant(land, origin) {
                    break;
                }
                extended = true;
                self.collect_captures(origin, piece, land, captured | bit(over), kings, moves);
                if !piece.is_king() {
                    break;
                }
                dist += 1;
            }
        }

        if !extended && captured != 0 {
            let promotes = !piece.is_king() && row == piece.color().promotion_row();
            moves.push(Move::capture(origin, at, captured, captured_kings).with_promotion(promotes));
        }
    }

    fn can_step(&self, at: u8, piece: Piece) -> bool {
        let (row, col) = coords(at);
        let dirs: &[(i8, i8)] = if piece.is_king() {
            &DIAGONALS
        } else if piece.color() == Color::White {
            &DIAGONALS[..2]
        } else {
            &DIAGONALS[2..]
        };
        dirs.iter()
            .filter_map(|(dr, dc)| index_at(row + dr, col + dc))
            .any(|to| self[to].is_none())
    }

    fn can_jump(&self, at: u8, piece: Piece) -> bool {
        let (row, col) = coords(at);
        DIAGONALS.iter().any(|&(dr, dc)| {
            let mut dist = 1;
            if piece.is_king() {
                while let Some(sq) = index_at(row + dr * dist, col + dc * dist) {
                    if self[sq].is_some() {
                        break;
                    }
                    dist += 1;
                }
            }
            let Some(over) = index_at(row + dr * dist, col + dc * dist) else {
                return false;
            };
            let land = index_at(row + dr * (dist + 1), col + dc * (dist + 1));
            self.is_capturable(over, piece.color(), 0)
                && matches!(land, Some(land) if self[land].is_none())
        })
    }

    #[inline]
    fn is_vacant(&self, index: u8, origin: u8) -> bool {
        index == origin || self[index].is_none()
    }

    #[inline]
    fn is_capturable(&self, index: u8, color: Color, captured: u64) -> bool {
        captured & bit(index) == 0 && matches!(self[index], Some(p) if p.color() != color)
    }

    /// plays a given move. This assumes that the move is valid
    pub fn play_move(&mut self, mve: Move) {
        let piece = self[mve.from]
            .take()
            .expect("play_move: no piece on the from square");
        debug_assert_eq!(piece.color(), self.next_move);
        self.zobrist_hash ^= ZOBRIST_HASHER.piece_hash(mve.from, piece);

        for sq in squares(mve.captures) {
            if let Some(captured) = self[sq].take() {
                self.zobrist_hash ^= ZOBRIST_HASHER.piece_hash(sq, captured);
            }
        }

        let landed = if mve.promotes { piece.crowned() } else { piece };
        self[mve.to] = Some(landed);
        self.zobrist_hash ^= ZOBRIST_HASHER.piece_hash(mve.to, landed);

        self.next_move = !self.next_move;
        self.zobrist_hash ^= ZOBRIST_HASHER.black_move;
    }

    /// Reverts `mve`, which must be the move played last.
    pub fn undo_move(&mut self, mve: Move) {
        self.next_move = !self.next_move;
        self.zobrist_hash ^= ZOBRIST_HASHER.black_move;

        let landed = self[mve.to]
            .take()
            .expect("undo_move: no piece on the to square");
        self.zobrist_hash ^= ZOBRIST_HASHER.piece_hash(mve.to, landed);

        let piece = if mve.promotes {
            Piece::new(PieceType::Man, landed.color())
        } else {
            landed
        };
        self[mve.from] = Some(piece);
        self.zobrist_hash ^= ZOBRIST_HASHER.piece_hash(mve.from, piece);

        let opponent = !piece.color();
        for sq in squares(mve.captures) {
            let typ = if mve.captured_kings & bit(sq) != 0 {
                PieceType::King
            } else {
                PieceType::Man
            };
            let captured = Piece::new(typ, opponent);
            self[sq] = Some(captured);
            self.zobrist_hash ^= ZOBRIST_HASHER.piece_hash(sq, captured);
        }
    }

    /// finds the legal move written as `32-28` or `32x14`
    pub fn parse_move(&self, text: &str) -> Result<Move> {
        let text = text.trim();
        let (from, to) = text
            .split_once(|c: char| c == '-' || c == 'x')
            .with_context(|| format!("'{text}' is not a move"))?;
        let from = parse_square(from)? - 1;
        let to = parse_square(to)? - 1;
        let candidates: Vec<Move> = self
            .generate_valid_moves()
            .into_iter()
            .filter(|m| m.from == from && m.to == to)
            .collect();
        match candidates.as_slice() {
            [mve] => Ok(*mve),
            [] => bail!("'{text}' is not a legal move"),
            _ => bail!("'{text}' is ambiguous"),
        }
    }
}

fn parse_square(text: &str) -> Result<u8> {
    let square: u8 = text
        .trim()
        .parse()
        .with_context(|| format!("Could not parse square '{text}'"))?;
    if !(1..=SQUARE_COUNT as u8).contains(&square) {
        bail!("Square {square} is out of range");
    }
    Ok(square)
}

impl Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..BOARD_SIZE {
            for col in 0..BOARD_SIZE {
                let c = match index_at(row, col) {
                    Some(idx) => self[idx].map(|p| p.ascii_char()).unwrap_or('.'),
                    None => ' ',
                };
                write!(f, "{c}")?;
            }
            writeln!(f)?;
        }
        write!(f, "{} to move", self.next_move)
    }
}

impl Index<usize> for Board {
    type Output = Option<Piece>;

    fn index(&self, index: usize) -> &Self::Output {
        &self.fields[index]
    }
}

impl IndexMut<usize> for Board {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.fields[index]
    }
}

impl Index<u8> for Board {
    type Output = Option<Piece>;

    fn index(&self, index: u8) -> &Self::Output {
        &self[index as usize]
    }
}

impl IndexMut<u8> for Board {
    fn index_mut(&mut self, index: u8) -> &mut Self::Output {
        &mut self[index as usize]
    }
}

#[cfg(test)]
mod test {
    use crate::{coords, index_at, Board, Color, Piece, PieceType, START_BOARD_FEN};
    use std::collections::HashSet;

    const SINGLE_CAPTURE: &str = "W:W32:B28";
    const BACKWARD_CAPTURE: &str = "W:W23:B28";
    const MAXIMUM_CAPTURE: &str = "W:W32,37:B19,28,31";
    const FLYING_KING: &str = "W:WK46:B28";
    const PROMOTION: &str = "W:W6:B45";
    const KING_CAPTURES_KING: &str = "B:W33,K27:BK49,12";
    const MIDGAME: &str = "W:W27,28,31,32,33,36,38,K41,44:B8,12,13,17,19,21,K24";

    pub(crate) const ALL_TEST_FENS: &[&str] = &[
        START_BOARD_FEN,
        SINGLE_CAPTURE,
        BACKWARD_CAPTURE,
        MAXIMUM_CAPTURE,
        FLYING_KING,
        PROMOTION,
        KING_CAPTURES_KING,
        MIDGAME,
    ];

    #[test]
    fn pices_are_unique_u8() {
        let mut pieces = HashSet::new();
        for color in Color::ALL_COLORS {
            for typ in PieceType::ALL_TYPES {
                let piece = Piece::new(typ, color);
                assert!(!pieces.contains(&piece));
                assert_eq!(piece.typ(), typ);
                assert_eq!(piece.color(), color);
                pieces.insert(piece);
            }
        }
        assert!(pieces.len() == 4);
    }

    #[test]
    fn coords_round_trip() {
        for idx in 0..50u8 {
            let (row, col) = coords(idx);
            assert_eq!(index_at(row, col), Some(idx));
        }
        assert_eq!(coords(0), (0, 1));
        assert_eq!(coords(5), (1, 0));
        assert_eq!(index_at(0, 0), None);
        assert_eq!(index_at(10, 1), None);
        assert_eq!(index_at(-1, 0), None);
    }

    #[test]
    fn parse_fen() {
        for fen in ALL_TEST_FENS {
            assert!(Board::from_fen(fen).is_ok());
        }
        assert!(Board::from_fen("X:W1").is_err());
        assert!(Board::from_fen("W:W51").is_err());
        assert!(Board::from_fen("W:W1:B1").is_err());
    }

    #[test]
    fn start_position() {
        let board = Board::start();
        assert_eq!(board.piece_count(Color::White), 20);
        assert_eq!(board.piece_count(Color::Black), 20);
        assert_eq!(board[0u8], Some(Piece::new(PieceType::Man, Color::Black)));
        assert_eq!(board[49u8], Some(Piece::new(PieceType::Man, Color::White)));
        assert_eq!(board.next_move, Color::White);
    }

    #[test]
    fn fen_round_trip() {
        for fen in ALL_TEST_FENS {
            let board = Board::from_fen(fen).unwrap();
            let generated_fen = board.generate_fen();
            println!("FEN: {generated_fen}");
            let board_from_generated = Board::from_fen(&generated_fen).unwrap();
            assert_eq!(board, board_from_generated);
        }
    }

    #[test]
    fn zobrist_hash_valid_after_move() {
        for fen in ALL_TEST_FENS {
            let board = Board::from_fen(fen).unwrap();
            for mve in board.generate_valid_moves() {
                let mut clone = board.clone();
                clone.play_move(mve);
                assert_eq!(
                    clone.zobrist_hash,
                    clone.calculate_zobrist_hash(),
                    "\nZobrist hash failed for move {mve} at fen \"{fen}\""
                );
            }
        }
    }

    #[test]
    fn undo_restores_position() {
        for fen in ALL_TEST_FENS {
            let board = Board::from_fen(fen).unwrap();
            let mut played = board.clone();
            for mve in board.generate_valid_moves() {
                played.play_move(mve);
                assert_ne!(played.next_move, board.next_move);
                played.undo_move(mve);
                assert_eq!(played, board, "\nundo of {mve} failed at fen \"{fen}\"");
            }
        }
    }

    #[test]
    fn terminal_detection() {
        let board = Board::from_fen("W:W:B1,2").unwrap();
        assert!(!board.has_legal_move());
        assert_eq!(board.winner(), Some(Color::Black));

        // white man on 46 can neither step nor jump
        let blocked = Board::from_fen("W:W46:B37,41").unwrap();
        assert!(!blocked.has_legal_move());
        assert!(blocked.generate_valid_moves().is_empty());

        let start = Board::start();
        assert!(start.has_legal_move());
        assert_eq!(start.winner(), None);
    }

    #[test]
    fn has_legal_move_agrees_with_generation() {
        for fen in ALL_TEST_FENS {
            let board = Board::from_fen(fen).unwrap();
            assert_eq!(
                board.has_legal_move(),
                !board.generate_valid_moves().is_empty(),
                "fen \"{fen}\""
            );
        }
    }

    mod moves {
        use super::{BACKWARD_CAPTURE, FLYING_KING, KING_CAPTURES_KING, MAXIMUM_CAPTURE, PROMOTION};
        use crate::{squares, Board, Color, Move, Piece, PieceType};

        #[test]
        fn single_capture_is_mandatory() {
            let board = Board::from_fen(super::SINGLE_CAPTURE).unwrap();
            let moves = board.generate_valid_moves();
            assert_eq!(moves.len(), 1);
            assert_eq!(moves[0].to_string(), "32x23");
            assert_eq!(squares(moves[0].captures).collect::<Vec<_>>(), vec![27]);
        }

        #[test]
        fn man_captures_backwards() {
            let board = Board::from_fen(BACKWARD_CAPTURE).unwrap();
            let moves = board.generate_valid_moves();
            assert_eq!(moves.len(), 1);
            assert_eq!(moves[0].to_string(), "23x32");
        }

        #[test]
        fn maximum_capture_rule() {
            let mut board = Board::from_fen(MAXIMUM_CAPTURE).unwrap();
            let moves = board.generate_valid_moves();
            assert_eq!(moves.len(), 1);
            let mve = moves[0];
            assert_eq!(mve.to_string(), "32x14");
            assert_eq!(mve.capture_count(), 2);

            board.play_move(mve);
            let expected = Board::from_fen("B:W14,37:B31").unwrap();
            assert_eq!(board, expected);
        }

        #[test]
        fn flying_king_capture() {
            let board = Board::from_fen(FLYING_KING).unwrap();
            let mut targets: Vec<String> = board
                .generate_valid_moves()
                .iter()
                .map(|m| m.to_string())
                .collect();
            targets.sort();
            assert_eq!(targets, vec!["46x10", "46x14", "46x19", "46x23", "46x5"]);
        }

        #[test]
        fn captured_king_is_restored() {
            let board = Board::from_fen(KING_CAPTURES_KING).unwrap();
            let moves = board.generate_valid_moves();
            assert!(moves.iter().all(|m| m.is_capture()));
            for mve in moves {
                let mut played = board.clone();
                played.play_move(mve);
                played.undo_move(mve);
                assert_eq!(played, board);
            }
        }

        #[test]
        fn promotion_at_end_of_move() {
            let mut board = Board::from_fen(PROMOTION).unwrap();
            let mve = board.parse_move("6-1").unwrap();
            assert!(mve.promotes);

            board.play_move(mve);
            assert_eq!(board[0u8], Some(Piece::new(PieceType::King, Color::White)));
            assert_eq!(board.next_move, Color::Black);

            board.undo_move(mve);
            assert_eq!(board, Board::from_fen(PROMOTION).unwrap());
        }

        #[test]
        fn parse_move_rejects_illegal() {
            let board = Board::start();
            assert_eq!(board.parse_move("32-28").unwrap(), Move::new(31, 27));
            assert!(board.parse_move("32-27").is_ok());
            assert!(board.parse_move("32-23").is_err());
            assert!(board.parse_move("nonsense").is_err());
        }
    }

    mod move_gen {
        use crate::Board;

        #[test]
        fn correct_move_count_start() {
            let start = Board::start();
            assert_eq!(start.generate_valid_moves().len(), 9, "White to move");

            let mut black = start.clone();
            black.next_move = !black.next_move;
            assert_eq!(black.generate_valid_moves().len(), 9, "Black to move");
        }

        #[test]
        fn correct_move_count_king() {
            // king on 28 reaches 17 squares on an otherwise empty board
            let board = Board::from_fen("W:WK28:B1").unwrap();
            assert_eq!(board.generate_valid_moves().len(), 17);
        }

        #[test]
        fn moves_for_piece() {
            let start = Board::start();
            assert_eq!(start.generate_valid_moves_for_piece(34).len(), 1);
            assert_eq!(start.generate_valid_moves_for_piece(31).len(), 2);
            assert!(start.generate_valid_moves_for_piece(40).is_empty());
        }
    }
}
