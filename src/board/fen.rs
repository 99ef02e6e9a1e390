//! FEN parsing and serialization.
//!
//! Parsing and serialization are inverses for any position reachable
//! through legal play. Malformed notation is rejected at this boundary
//! with a structured error; the core never sees a half-built position.

use thiserror::Error;

use crate::types::{bb, more_than_one, Color, PieceType, Square};

use super::castling::{self, CastlingInfo};
use super::Position;

pub const STARTPOS: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FenError {
    #[error("FEN has {0} fields, expected at least 4")]
    MissingFields(usize),
    #[error("bad piece placement: {0}")]
    BadPlacement(String),
    #[error("bad side to move: {0}")]
    BadSideToMove(String),
    #[error("bad castling token: {0}")]
    BadCastling(String),
    #[error("bad en-passant square: {0}")]
    BadEnPassant(String),
    #[error("bad move counter: {0}")]
    BadCounter(String),
    #[error("each side needs exactly one king")]
    KingCount,
}

pub fn parse(fen: &str) -> Result<Position, FenError> {
    let fields: Vec<&str> = fen.split_whitespace().collect();
    if fields.len() < 4 {
        return Err(FenError::MissingFields(fields.len()));
    }

    let mut p = Position::empty();

    // piece placement, rank 8 first
    let mut rank: i32 = 7;
    let mut file: i32 = 0;
    for c in fields[0].chars() {
        match c {
            '/' => {
                if file != 8 {
                    return Err(FenError::BadPlacement(fields[0].into()));
                }
                rank -= 1;
                file = 0;
            }
            '1'..='8' => file += c as i32 - '0' as i32,
            _ => {
                if rank < 0 || file > 7 {
                    return Err(FenError::BadPlacement(fields[0].into()));
                }
                let color = if c.is_ascii_uppercase() {
                    Color::White
                } else {
                    Color::Black
                };
                let pt = match c.to_ascii_lowercase() {
                    'p' => PieceType::Pawn,
                    'n' => PieceType::Knight,
                    'b' => PieceType::Bishop,
                    'r' => PieceType::Rook,
                    'q' => PieceType::Queen,
                    'k' => PieceType::King,
                    _ => return Err(FenError::BadPlacement(fields[0].into())),
                };
                p.set_piece(color, pt, Square::new(file as u8, rank as u8));
                file += 1;
            }
        }
    }
    if rank != 0 || file != 8 {
        return Err(FenError::BadPlacement(fields[0].into()));
    }

    for c in Color::BOTH {
        let kings = p.pieces(c, PieceType::King);
        if kings == 0 || more_than_one(kings) {
            return Err(FenError::KingCount);
        }
    }
    p.set_king_squares();

    p.stm = match fields[1] {
        "w" => Color::White,
        "b" => Color::Black,
        other => return Err(FenError::BadSideToMove(other.into())),
    };

    // castling: KQkq, Shredder-style file letters, or '-'
    if fields[2] != "-" {
        for c in fields[2].chars() {
            let color = if c.is_ascii_uppercase() {
                Color::White
            } else {
                Color::Black
            };
            let king_file = p.king_sq(color).file();
            let rook_file = match c.to_ascii_lowercase() {
                'k' => 7,
                'q' => 0,
                f @ 'a'..='h' => f as u8 - b'a',
                _ => return Err(FenError::BadCastling(fields[2].into())),
            };
            let kingside = rook_file > king_file;
            p.castling_rights |= castling::right_mask(color, kingside);
        }
    }

    if fields[3] != "-" {
        let sq = Square::parse(fields[3]).ok_or_else(|| FenError::BadEnPassant(fields[3].into()))?;
        let valid_rank = if p.stm == Color::White { 5 } else { 2 };
        if sq.rank() != valid_rank {
            return Err(FenError::BadEnPassant(fields[3].into()));
        }
        // only keep the target when a capture is actually possible, so
        // parse/apply_move produce identical hashes
        let attackers =
            super::attacks::pawn_attacks(!p.stm, sq) & p.pieces(p.stm, PieceType::Pawn);
        let victim_sq = if p.stm == Color::White {
            sq.offset(-8)
        } else {
            sq.offset(8)
        };
        if attackers != 0 && p.pieces(!p.stm, PieceType::Pawn) & bb(victim_sq) != 0 {
            p.ep_square = Some(sq);
        }
    }

    p.halfmove_clock = match fields.get(4) {
        Some(s) => s.parse().map_err(|_| FenError::BadCounter((*s).into()))?,
        None => 0,
    };
    p.fullmove_number = match fields.get(5) {
        Some(s) => s.parse().map_err(|_| FenError::BadCounter((*s).into()))?,
        None => 1,
    };

    p.castling = CastlingInfo::rebuild(&p);
    p.recompute_keys();
    p.threats = p.compute_threats();
    p.checkers = p.compute_checkers();
    Ok(p)
}

pub fn serialize(p: &Position) -> String {
    let mut out = String::with_capacity(90);

    for rank in (0..8).rev() {
        let mut run = 0;
        for file in 0..8 {
            let sq = Square::new(file, rank);
            match (p.piece_type_on(sq), p.color_on(sq)) {
                (Some(pt), Some(c)) => {
                    if run > 0 {
                        out.push((b'0' + run) as char);
                        run = 0;
                    }
                    out.push(pt.to_char(c));
                }
                _ => run += 1,
            }
        }
        if run > 0 {
            out.push((b'0' + run) as char);
        }
        out.push(if rank == 0 { ' ' } else { '/' });
    }

    out.push(if p.stm == Color::White { 'w' } else { 'b' });
    out.push(' ');

    let mut any_right = false;
    for (c, ks, ch) in [
        (Color::White, true, 'K'),
        (Color::White, false, 'Q'),
        (Color::Black, true, 'k'),
        (Color::Black, false, 'q'),
    ] {
        if p.has_castling_right(c, ks) {
            out.push(ch);
            any_right = true;
        }
    }
    if !any_right {
        out.push('-');
    }
    out.push(' ');

    match p.ep_square {
        Some(sq) => out.push_str(&sq.to_string()),
        None => out.push('-'),
    }

    out.push_str(&format!(" {} {}", p.halfmove_clock, p.fullmove_number));
    out
}

impl Position {
    pub fn from_fen(fen: &str) -> Result<Position, FenError> {
        parse(fen)
    }

    pub fn to_fen(&self) -> String {
        serialize(self)
    }
}
