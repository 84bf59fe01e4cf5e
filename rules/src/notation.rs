//! 标准代数记谱法（SAN）
//!
//! 格式：`<棋子><消歧义><x><目标格><=升变><+/#>`
//! - 兵不写棋子字母，吃子时写出发纵线，如 `exd5`
//! - 易位写作 `O-O` / `O-O-O`

use chess::{BoardStatus, ChessMove, Piece, EMPTY};

use crate::error::ChessError;
use crate::game::Game;

/// 记谱法
pub struct Notation;

impl Notation {
    /// 将合法走法转换为 SAN
    pub fn san(game: &Game, mv: ChessMove) -> Result<String, ChessError> {
        let piece = match game.moving_piece(mv) {
            Some(piece) if game.is_legal(mv) => piece,
            _ => {
                return Err(ChessError::InvalidMove {
                    uci: mv.to_string(),
                })
            }
        };

        let mut san = if game.is_castling(mv) {
            if mv.get_dest().get_file().to_index() > mv.get_source().get_file().to_index() {
                "O-O".to_string()
            } else {
                "O-O-O".to_string()
            }
        } else {
            Self::body(game, mv, piece)
        };

        let next = game.board().make_move_new(mv);
        if next.status() == BoardStatus::Checkmate {
            san.push('#');
        } else if *next.checkers() != EMPTY {
            san.push('+');
        }

        Ok(san)
    }

    fn body(game: &Game, mv: ChessMove, piece: Piece) -> String {
        let mut out = String::with_capacity(8);
        let from = mv.get_source();
        let to = mv.get_dest();
        let capture = game.is_capture(mv);

        if piece == Piece::Pawn {
            if capture {
                out.push(file_char(from.get_file().to_index()));
            }
        } else {
            out.push(piece_letter(piece));

            let rivals: Vec<ChessMove> = game
                .legal_moves()
                .into_iter()
                .filter(|other| {
                    other.get_dest() == to
                        && other.get_source() != from
                        && game.moving_piece(*other) == Some(piece)
                })
                .collect();

            if !rivals.is_empty() {
                let same_file = rivals
                    .iter()
                    .any(|other| other.get_source().get_file() == from.get_file());
                let same_rank = rivals
                    .iter()
                    .any(|other| other.get_source().get_rank() == from.get_rank());

                if !same_file {
                    out.push(file_char(from.get_file().to_index()));
                } else if !same_rank {
                    out.push(rank_char(from.get_rank().to_index()));
                } else {
                    out.push(file_char(from.get_file().to_index()));
                    out.push(rank_char(from.get_rank().to_index()));
                }
            }
        }

        if capture {
            out.push('x');
        }
        out.push_str(&to.to_string());

        if let Some(promotion) = mv.get_promotion() {
            out.push('=');
            out.push(piece_letter(promotion));
        }

        out
    }
}

fn piece_letter(piece: Piece) -> char {
    match piece {
        Piece::Pawn => 'P',
        Piece::Knight => 'N',
        Piece::Bishop => 'B',
        Piece::Rook => 'R',
        Piece::Queen => 'Q',
        Piece::King => 'K',
    }
}

fn file_char(index: usize) -> char {
    (b'a' + index as u8) as char
}

fn rank_char(index: usize) -> char {
    (b'1' + index as u8) as char
}
