//! 走法排序
//!
//! 吃子价值高的走法排在前面，同分走法保持生成顺序。

use std::cmp::Reverse;

use rules::{ChessMove, Game, Piece};

/// 走法排序器
pub struct MoveOrderer;

impl MoveOrderer {
    /// 被吃棋子的排序分值
    pub fn capture_value(piece: Piece) -> i32 {
        match piece {
            Piece::Pawn => 1,
            Piece::Knight | Piece::Bishop => 3,
            Piece::Rook => 5,
            Piece::Queen => 9,
            Piece::King => 0,
        }
    }

    /// 单个走法的排序分值，非吃子为 0
    pub fn score(game: &Game, mv: ChessMove) -> i32 {
        game.captured_piece(mv)
            .map(Self::capture_value)
            .unwrap_or(0)
    }

    /// 按分值降序排列（稳定排序）
    pub fn order(moves: &mut [ChessMove], game: &Game) {
        moves.sort_by_cached_key(|mv| Reverse(Self::score(game, *mv)));
    }

    /// 把指定走法提到最前，其余走法相对顺序不变
    ///
    /// 走法不在列表中时不做任何改动。
    pub fn promote(moves: &mut [ChessMove], first: ChessMove) {
        if let Some(index) = moves.iter().position(|mv| *mv == first) {
            moves[..=index].rotate_right(1);
        }
    }

    /// 一方的非兵子力（马、象 3，车 5，后 9）
    pub fn non_pawn_material(game: &Game, color: rules::Color) -> i32 {
        [Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen]
            .iter()
            .map(|&piece| game.occupied_squares(piece, color).popcnt() as i32 * Self::capture_value(piece))
            .sum()
    }
}
