//! FEN 格式解析和生成
//!
//! 标准 FEN 格式：
//! `<棋盘> <走子方> <易位权> <吃过路兵格> <半回合计数> <回合数>`
//!
//! 示例：
//! `rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1`

use std::str::FromStr;

use chess::{Board, Color, File, Piece, Rank, Square};

use crate::error::ChessError;

/// 初始局面 FEN
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// 解析后的 FEN
#[derive(Debug, Clone, Copy)]
pub struct ParsedFen {
    pub board: Board,
    pub halfmove_clock: u32,
    pub fullmove_number: u32,
}

/// FEN 格式处理
pub struct Fen;

impl Fen {
    /// 解析 FEN 字符串
    ///
    /// 只给出前四个字段时，计数器默认为 `0 1`。
    pub fn parse(fen: &str) -> Result<ParsedFen, ChessError> {
        let parts: Vec<&str> = fen.split_whitespace().collect();
        if parts.len() < 4 || parts.len() > 6 {
            return Err(ChessError::InvalidFen {
                reason: format!("Expected 4 to 6 fields, got {}", parts.len()),
            });
        }

        let halfmove_clock = match parts.get(4) {
            Some(s) => s.parse().map_err(|_| ChessError::InvalidFen {
                reason: format!("Invalid halfmove clock: {}", s),
            })?,
            None => 0,
        };
        let fullmove_number = match parts.get(5) {
            Some(s) => s.parse().map_err(|_| ChessError::InvalidFen {
                reason: format!("Invalid fullmove number: {}", s),
            })?,
            None => 1,
        };

        validate_placement(parts[0])?;
        if parts[1] != "w" && parts[1] != "b" {
            return Err(ChessError::InvalidFen {
                reason: format!("Invalid side to move: {}", parts[1]),
            });
        }

        let normalized = format!("{} {} {} {} 0 1", parts[0], parts[1], parts[2], parts[3]);
        let board = Board::from_str(&normalized).map_err(|e| ChessError::InvalidFen {
            reason: format!("{:?}", e),
        })?;

        Ok(ParsedFen {
            board,
            halfmove_clock,
            fullmove_number: fullmove_number.max(1),
        })
    }

    /// 由棋盘与计数器生成 FEN
    pub fn generate(board: &Board, halfmove_clock: u32, fullmove_number: u32) -> String {
        format!(
            "{} {} {}",
            Self::position_key(board),
            halfmove_clock,
            fullmove_number
        )
    }

    /// 生成 FEN 的前四个字段（开局库与重复局面使用的键）
    pub fn position_key(board: &Board) -> String {
        let mut out = String::with_capacity(64);

        for rank in (0..8).rev() {
            let mut empty = 0;
            for file in 0..8 {
                let sq = Square::make_square(Rank::from_index(rank), File::from_index(file));
                match (board.piece_on(sq), board.color_on(sq)) {
                    (Some(piece), Some(color)) => {
                        if empty > 0 {
                            out.push_str(&empty.to_string());
                            empty = 0;
                        }
                        out.push(piece_char(piece, color));
                    }
                    _ => empty += 1,
                }
            }
            if empty > 0 {
                out.push_str(&empty.to_string());
            }
            if rank > 0 {
                out.push('/');
            }
        }

        out.push(' ');
        out.push(match board.side_to_move() {
            Color::White => 'w',
            Color::Black => 'b',
        });

        out.push(' ');
        let white = board.castle_rights(Color::White);
        let black = board.castle_rights(Color::Black);
        let mut castling = String::new();
        if white.has_kingside() {
            castling.push('K');
        }
        if white.has_queenside() {
            castling.push('Q');
        }
        if black.has_kingside() {
            castling.push('k');
        }
        if black.has_queenside() {
            castling.push('q');
        }
        if castling.is_empty() {
            castling.push('-');
        }
        out.push_str(&castling);

        out.push(' ');
        match board.en_passant() {
            Some(sq) => {
                // 目标格位于刚走过的兵身后
                let rank = match board.side_to_move() {
                    Color::White => '6',
                    Color::Black => '3',
                };
                out.push((b'a' + sq.get_file().to_index() as u8) as char);
                out.push(rank);
            }
            None => out.push('-'),
        }

        out
    }

    /// 颜色互换并上下翻转棋盘
    pub fn mirror(fen: &str) -> Result<String, ChessError> {
        let parts: Vec<&str> = fen.split_whitespace().collect();
        if parts.len() < 4 {
            return Err(ChessError::InvalidFen {
                reason: format!("Expected at least 4 fields, got {}", parts.len()),
            });
        }

        let placement = parts[0]
            .split('/')
            .rev()
            .map(swap_case)
            .collect::<Vec<_>>()
            .join("/");

        let side = match parts[1] {
            "w" => "b",
            "b" => "w",
            other => {
                return Err(ChessError::InvalidFen {
                    reason: format!("Invalid side to move: {}", other),
                })
            }
        };

        let castling = if parts[2] == "-" {
            "-".to_string()
        } else {
            let swapped = swap_case(parts[2]);
            "KQkq".chars().filter(|c| swapped.contains(*c)).collect()
        };

        let en_passant = match parts[3] {
            "-" => "-".to_string(),
            ep => ep
                .chars()
                .map(|c| match c {
                    '3' => '6',
                    '6' => '3',
                    other => other,
                })
                .collect(),
        };

        let mut mirrored = format!("{} {} {} {}", placement, side, castling, en_passant);
        for counter in parts.iter().skip(4) {
            mirrored.push(' ');
            mirrored.push_str(counter);
        }
        Ok(mirrored)
    }
}

/// 棋子的 FEN 字符（白方大写）
pub fn piece_char(piece: Piece, color: Color) -> char {
    let c = match piece {
        Piece::Pawn => 'p',
        Piece::Knight => 'n',
        Piece::Bishop => 'b',
        Piece::Rook => 'r',
        Piece::Queen => 'q',
        Piece::King => 'k',
    };
    match color {
        Color::White => c.to_ascii_uppercase(),
        Color::Black => c,
    }
}

fn swap_case(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_ascii_uppercase() {
                c.to_ascii_lowercase()
            } else {
                c.to_ascii_uppercase()
            }
        })
        .collect()
}

/// 检查棋盘字段的行数、每行格数与双方王的数量
fn validate_placement(placement: &str) -> Result<(), ChessError> {
    let invalid = |reason: String| ChessError::InvalidFen { reason };

    let ranks: Vec<&str> = placement.split('/').collect();
    if ranks.len() != 8 {
        return Err(invalid(format!("Expected 8 ranks, got {}", ranks.len())));
    }

    let mut white_kings = 0;
    let mut black_kings = 0;
    for rank in &ranks {
        let mut squares = 0u32;
        for c in rank.chars() {
            match c {
                '1'..='8' => squares += c.to_digit(10).unwrap_or(0),
                'p' | 'n' | 'b' | 'r' | 'q' | 'P' | 'N' | 'B' | 'R' | 'Q' => squares += 1,
                'K' => {
                    white_kings += 1;
                    squares += 1;
                }
                'k' => {
                    black_kings += 1;
                    squares += 1;
                }
                _ => return Err(invalid(format!("Invalid character '{}' in rank {}", c, rank))),
            }
        }
        if squares != 8 {
            return Err(invalid(format!("Rank {} has {} squares", rank, squares)));
        }
    }

    if white_kings != 1 || black_kings != 1 {
        return Err(invalid(format!(
            "Expected one king per side, got {} white and {} black",
            white_kings, black_kings
        )));
    }
    Ok(())
}
