//! Staged move ordering.
//!
//! Moves come out in the order the search wants to try them without
//! ever materializing more than the current stage: hash move first,
//! then winning captures, the killer, history-ordered quiets, and the
//! losing captures that were set aside along the way. In check the
//! stages collapse into a single scored evasion pass. Quiescence stops
//! after the capture stages.

use crate::board::Position;
use crate::movegen::{self, GenType, MoveList};
use crate::types::{Move, MAX_MOVES};

use super::history::{History, MoveRef};
use super::see;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Stage {
    TtMove,
    GenerateCaptures,
    GoodCaptures,
    Killer,
    GenerateQuiets,
    Quiets,
    BadCaptures,
    Done,
}

pub struct MovePicker {
    stage: Stage,
    tt_move: Move,
    killer: Move,
    captures_only: bool,
    skip_quiets: bool,

    list: MoveList,
    scores: [i32; MAX_MOVES],
    idx: usize,

    bad_captures: MoveList,
    bad_idx: usize,
}

impl MovePicker {
    pub fn new(p: &Position, tt_move: Move, killer: Move, captures_only: bool) -> MovePicker {
        let tt_move = if !tt_move.is_null()
            && p.is_pseudo_legal(tt_move)
            && (!captures_only || p.in_check() || p.is_capture(tt_move))
        {
            tt_move
        } else {
            Move::NULL
        };
        MovePicker {
            stage: if tt_move.is_null() {
                Stage::GenerateCaptures
            } else {
                Stage::TtMove
            },
            tt_move,
            killer,
            captures_only,
            skip_quiets: false,
            list: MoveList::new(),
            scores: [0; MAX_MOVES],
            idx: 0,
            bad_captures: MoveList::new(),
            bad_idx: 0,
        }
    }

    /// Late-move pruning hook: once the search decides quiets cannot
    /// raise alpha anymore, the remaining quiet stages are skipped.
    pub fn skip_quiets(&mut self) {
        self.skip_quiets = true;
    }

    /// Next pseudo-legal move, or `None` when exhausted. Legality is
    /// the caller's job.
    pub fn next(
        &mut self,
        p: &Position,
        hist: &History,
        prior1: Option<MoveRef>,
        prior2: Option<MoveRef>,
    ) -> Option<Move> {
        loop {
            match self.stage {
                Stage::TtMove => {
                    self.stage = Stage::GenerateCaptures;
                    return Some(self.tt_move);
                }

                Stage::GenerateCaptures => {
                    let gt = if p.in_check() {
                        GenType::CaptureEvasions
                    } else {
                        GenType::Captures
                    };
                    movegen::generate(p, gt, &mut self.list);
                    for i in 0..self.list.len() {
                        let m = self.list[i];
                        let attacker = p.piece_type_on(m.from()).unwrap_or(crate::types::PieceType::Pawn);
                        let victim = p.captured_piece_type(m);
                        self.scores[i] = victim.map_or(0, |v| 16 * see::value(v))
                            + hist.capture_score(p, m, attacker);
                    }
                    self.idx = 0;
                    self.stage = Stage::GoodCaptures;
                }

                Stage::GoodCaptures => match self.select_next() {
                    Some(m) => {
                        if m == self.tt_move {
                            continue;
                        }
                        // losing captures wait until the quiets ran out
                        if !p.in_check() && !see::see(p, m, 0) {
                            self.bad_captures.push(m);
                            continue;
                        }
                        return Some(m);
                    }
                    None => {
                        self.stage = if self.captures_only {
                            if p.in_check() {
                                // evasions must consider quiets too or
                                // qsearch would miss forced mates
                                Stage::GenerateQuiets
                            } else {
                                Stage::Done
                            }
                        } else {
                            Stage::Killer
                        };
                    }
                },

                Stage::Killer => {
                    self.stage = Stage::GenerateQuiets;
                    let k = self.killer;
                    if !k.is_null()
                        && k != self.tt_move
                        && !self.skip_quiets
                        && p.is_pseudo_legal(k)
                        && !p.is_capture(k)
                    {
                        return Some(k);
                    }
                }

                Stage::GenerateQuiets => {
                    if self.skip_quiets && !p.in_check() {
                        self.stage = Stage::BadCaptures;
                        continue;
                    }
                    let gt = if p.in_check() {
                        GenType::QuietEvasions
                    } else {
                        GenType::Quiets
                    };
                    let start = self.list.len();
                    movegen::generate(p, gt, &mut self.list);
                    for i in start..self.list.len() {
                        let m = self.list[i];
                        let moved = p.piece_type_on(m.from()).unwrap_or(crate::types::PieceType::Pawn);
                        let cur = MoveRef {
                            color: p.stm,
                            piece: moved,
                            to: m.to(),
                        };
                        self.scores[i] = hist.quiet_score(p, m)
                            + hist.continuation_score(prior1, cur)
                            + hist.continuation_score(prior2, cur);
                    }
                    self.stage = Stage::Quiets;
                }

                Stage::Quiets => match self.select_next() {
                    Some(m) => {
                        if m == self.tt_move || m == self.killer {
                            continue;
                        }
                        if self.skip_quiets && !p.in_check() {
                            self.stage = Stage::BadCaptures;
                            continue;
                        }
                        return Some(m);
                    }
                    None => self.stage = Stage::BadCaptures,
                },

                Stage::BadCaptures => {
                    if self.bad_idx < self.bad_captures.len() {
                        let m = self.bad_captures[self.bad_idx];
                        self.bad_idx += 1;
                        return Some(m);
                    }
                    self.stage = Stage::Done;
                }

                Stage::Done => return None,
            }
        }
    }

    /// Selection sort step over the unsorted tail of the current list.
    fn select_next(&mut self) -> Option<Move> {
        if self.idx >= self.list.len() {
            return None;
        }
        let mut best = self.idx;
        for i in self.idx + 1..self.list.len() {
            if self.scores[i] > self.scores[best] {
                best = i;
            }
        }
        self.list.swap(self.idx, best);
        self.scores.swap(self.idx, best);
        let m = self.list[self.idx];
        self.idx += 1;
        Some(m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movegen::move_from_uci;

    fn drain(p: &Position, picker: &mut MovePicker, hist: &History) -> Vec<Move> {
        let mut out = Vec::new();
        while let Some(m) = picker.next(p, hist, None, None) {
            if p.is_legal(m) {
                out.push(m);
            }
        }
        out
    }

    #[test]
    fn tt_move_comes_first_and_never_repeats() {
        let p = Position::startpos();
        let hist = History::new();
        let tt = move_from_uci(&p, "e2e4").unwrap();
        let mut picker = MovePicker::new(&p, tt, Move::NULL, false);

        let moves = drain(&p, &mut picker, &hist);
        assert_eq!(moves[0], tt);
        assert_eq!(moves.iter().filter(|&&m| m == tt).count(), 1);
        assert_eq!(moves.len(), 20);
    }

    #[test]
    fn winning_captures_precede_losing_ones() {
        // QxP is losing (the king defends c7), NxQ is winning
        let p = Position::from_fen("3k4/2p5/3p4/4q3/8/3N4/2Q5/5K2 w - - 0 1").unwrap();
        let hist = History::new();
        let mut picker = MovePicker::new(&p, Move::NULL, Move::NULL, false);
        let moves = drain(&p, &mut picker, &hist);

        let nxq = move_from_uci(&p, "d3e5").unwrap();
        let qxc7 = move_from_uci(&p, "c2c7").unwrap();
        let i_good = moves.iter().position(|&m| m == nxq).unwrap();
        let i_bad = moves.iter().position(|&m| m == qxc7).unwrap();
        assert!(i_good < i_bad);
        // the losing capture still sorts behind every quiet
        assert_eq!(i_bad, moves.len() - 1);
    }

    #[test]
    fn qsearch_mode_stops_after_captures() {
        let p = Position::from_fen("3k4/2p5/3p4/4q3/8/3N4/2Q5/5K2 w - - 0 1").unwrap();
        let hist = History::new();
        let mut picker = MovePicker::new(&p, Move::NULL, Move::NULL, true);
        let moves = drain(&p, &mut picker, &hist);
        assert!(!moves.is_empty());
        assert!(moves.iter().all(|&m| p.is_capture(m)));
    }

    #[test]
    fn evasion_mode_yields_all_legal_replies() {
        let p = Position::from_fen("4r2k/8/8/8/8/8/3B4/4K3 w - - 0 1").unwrap();
        let hist = History::new();
        let mut picker = MovePicker::new(&p, Move::NULL, Move::NULL, false);
        let moves = drain(&p, &mut picker, &hist);
        assert_eq!(moves.len(), crate::movegen::generate_legal(&p).len());
    }

    #[test]
    fn killer_sorts_before_plain_quiets() {
        let p = Position::startpos();
        let hist = History::new();
        let killer = move_from_uci(&p, "b1c3").unwrap();
        let mut picker = MovePicker::new(&p, Move::NULL, killer, false);
        let moves = drain(&p, &mut picker, &hist);
        assert_eq!(moves[0], killer);
        assert_eq!(moves.iter().filter(|&&m| m == killer).count(), 1);
    }
}
