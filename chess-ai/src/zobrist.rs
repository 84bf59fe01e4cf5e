//! Zobrist 哈希
//!
//! 用于快速计算棋局的哈希值，支持增量更新。
//! 覆盖棋子位置、走子方、易位权和吃过路兵纵线，
//! 增量更新的结果与完整计算完全一致。

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rules::{
    Board, CastleRights, ChessMove, Color, File, Piece, Square, ALL_COLORS, ALL_PIECES,
};

/// Zobrist 哈希表
///
/// 使用随机数为每个位置的每种棋子生成唯一的哈希值
pub struct ZobristTable {
    /// 棋子哈希值 [color][piece][square]
    pieces: [[[u64; 64]; 6]; 2],
    /// 易位权哈希值 [color][CastleRights::to_index()]
    castling: [[u64; 4]; 2],
    /// 吃过路兵纵线
    en_passant: [u64; 8],
    /// 当前走子方哈希值
    side_to_move: u64,
}

impl ZobristTable {
    /// 创建新的 Zobrist 表（使用固定种子保证确定性）
    pub fn new() -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(0xDEADBEEF_CAFE_1234);

        let mut pieces = [[[0u64; 64]; 6]; 2];
        for color in pieces.iter_mut() {
            for piece in color.iter_mut() {
                for square in piece.iter_mut() {
                    *square = rng.gen();
                }
            }
        }

        let mut castling = [[0u64; 4]; 2];
        for color in castling.iter_mut() {
            for rights in color.iter_mut() {
                *rights = rng.gen();
            }
        }

        let mut en_passant = [0u64; 8];
        for file in en_passant.iter_mut() {
            *file = rng.gen();
        }

        Self {
            pieces,
            castling,
            en_passant,
            side_to_move: rng.gen(),
        }
    }

    /// 计算棋盘的完整哈希值
    pub fn hash(&self, board: &Board) -> u64 {
        let mut hash = 0u64;

        for color in ALL_COLORS {
            let ours = *board.color_combined(color);
            for piece in ALL_PIECES {
                for square in *board.pieces(piece) & ours {
                    hash ^= self.piece_hash(color, piece, square);
                }
            }
            hash ^= self.castle_hash(color, board.castle_rights(color));
        }

        hash ^= self.en_passant_hash(board.en_passant());

        if board.side_to_move() == Color::Black {
            hash ^= self.side_to_move;
        }

        hash
    }

    /// 走子后的增量更新
    ///
    /// `before` 为走子前的局面，`after` 为走子后的局面。
    pub fn update(&self, hash: u64, mv: ChessMove, before: &Board, after: &Board) -> u64 {
        let us = before.side_to_move();
        let from = mv.get_source();
        let to = mv.get_dest();

        let moved = match before.piece_on(from) {
            Some(piece) => piece,
            None => return self.hash(after),
        };

        let mut hash = hash ^ self.side_to_move;
        hash ^= self.piece_hash(us, moved, from);
        hash ^= self.piece_hash(us, mv.get_promotion().unwrap_or(moved), to);

        if let Some(captured) = before.piece_on(to) {
            hash ^= self.piece_hash(!us, captured, to);
        } else if moved == Piece::Pawn && from.get_file() != to.get_file() {
            // 吃过路兵：被吃的兵和出发格同一横线
            let victim = Square::make_square(from.get_rank(), to.get_file());
            hash ^= self.piece_hash(!us, Piece::Pawn, victim);
        }

        let from_file = from.get_file().to_index();
        let to_file = to.get_file().to_index();
        if moved == Piece::King && from_file.abs_diff(to_file) == 2 {
            let (rook_from, rook_to) = if to_file > from_file {
                (File::H, File::F)
            } else {
                (File::A, File::D)
            };
            let rank = from.get_rank();
            hash ^= self.piece_hash(us, Piece::Rook, Square::make_square(rank, rook_from));
            hash ^= self.piece_hash(us, Piece::Rook, Square::make_square(rank, rook_to));
        }

        for color in ALL_COLORS {
            hash ^= self.castle_hash(color, before.castle_rights(color));
            hash ^= self.castle_hash(color, after.castle_rights(color));
        }
        hash ^= self.en_passant_hash(before.en_passant());
        hash ^= self.en_passant_hash(after.en_passant());

        hash
    }

    /// 空着后的增量更新
    pub fn update_null(&self, hash: u64, before: &Board, after: &Board) -> u64 {
        hash ^ self.side_to_move
            ^ self.en_passant_hash(before.en_passant())
            ^ self.en_passant_hash(after.en_passant())
    }

    /// 获取棋子的哈希值
    #[inline]
    pub fn piece_hash(&self, color: Color, piece: Piece, square: Square) -> u64 {
        self.pieces[color.to_index()][piece.to_index()][square.to_index()]
    }

    #[inline]
    fn castle_hash(&self, color: Color, rights: CastleRights) -> u64 {
        self.castling[color.to_index()][rights.to_index()]
    }

    #[inline]
    fn en_passant_hash(&self, square: Option<Square>) -> u64 {
        square
            .map(|sq| self.en_passant[sq.get_file().to_index()])
            .unwrap_or(0)
    }

    /// 获取走子方切换的哈希值
    #[inline]
    pub fn side_hash(&self) -> u64 {
        self.side_to_move
    }
}

impl Default for ZobristTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rules::Game;

    fn random_playout(fen: &str, seed: u64, plies: usize) {
        let zobrist = ZobristTable::new();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut game = Game::from_fen(fen).unwrap();
        let mut hash = zobrist.hash(game.board());

        for _ in 0..plies {
            let moves = game.legal_moves();
            if moves.is_empty() {
                break;
            }
            let mv = moves[rng.gen_range(0..moves.len())];
            let before = *game.board();
            game.apply(mv).unwrap();
            hash = zobrist.update(hash, mv, &before, game.board());
            assert_eq!(
                hash,
                zobrist.hash(game.board()),
                "增量哈希与完整哈希不一致: {} 之后 {}",
                mv,
                game.to_fen()
            );
        }
    }

    #[test]
    fn test_hash_deterministic() {
        let game = Game::new();
        let a = ZobristTable::new();
        let b = ZobristTable::new();
        assert_eq!(a.hash(game.board()), b.hash(game.board()));
    }

    #[test]
    fn test_side_to_move_changes_hash() {
        let white = Game::from_fen("4k3/8/8/8/8/8/8/4K2R w K - 0 1").unwrap();
        let black = Game::from_fen("4k3/8/8/8/8/8/8/4K2R b K - 0 1").unwrap();
        let zobrist = ZobristTable::new();
        assert_eq!(
            zobrist.hash(white.board()) ^ zobrist.side_hash(),
            zobrist.hash(black.board())
        );
    }

    #[test]
    fn test_castle_rights_change_hash() {
        let with = Game::from_fen("4k3/8/8/8/8/8/8/4K2R w K - 0 1").unwrap();
        let without = Game::from_fen("4k3/8/8/8/8/8/8/4K2R w - - 0 1").unwrap();
        let zobrist = ZobristTable::new();
        assert_ne!(zobrist.hash(with.board()), zobrist.hash(without.board()));
    }

    #[test]
    fn test_incremental_matches_full() {
        random_playout(rules::STARTING_FEN, 1, 120);
        random_playout(rules::STARTING_FEN, 2, 120);
        // 易位、吃过路兵与升变
        random_playout("r3k2r/pPppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1", 3, 80);
        random_playout("rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3", 4, 60);
        random_playout("8/1P4k1/8/8/8/8/6Kp/8 w - - 0 1", 5, 40);
    }

    #[test]
    fn test_specific_special_moves() {
        let zobrist = ZobristTable::new();
        for (fen, uci) in [
            ("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1", "e1g1"),
            ("r3k2r/8/8/8/8/8/8/R3K2R b KQkq - 0 1", "e8c8"),
            ("rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3", "e5f6"),
            ("1r5k/P7/8/8/8/8/8/7K w - - 0 1", "a7b8n"),
            ("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1", "a1a8"),
        ] {
            let mut game = Game::from_fen(fen).unwrap();
            let mv = game.parse_uci(uci).unwrap();
            let hash = zobrist.hash(game.board());
            let before = *game.board();
            game.apply(mv).unwrap();
            assert_eq!(
                zobrist.update(hash, mv, &before, game.board()),
                zobrist.hash(game.board()),
                "{} {}",
                fen,
                uci
            );
        }
    }

    #[test]
    fn test_update_twice_restores() {
        let zobrist = ZobristTable::new();
        let mut game = Game::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let original = zobrist.hash(game.board());
        let before = *game.board();

        let mv = game.parse_uci("e1g1").unwrap();
        let hash = {
            let applied = game.play(mv).unwrap();
            zobrist.update(original, mv, &before, applied.board())
        };
        assert_ne!(hash, original);
        // 撤销后重新计算与原值一致
        assert_eq!(zobrist.hash(game.board()), original);

        // 增量部分与起始哈希无关，异或两次回到原值
        let after = game.board().make_move_new(mv);
        let delta = hash ^ original;
        let other = 0x0123_4567_89AB_CDEF;
        assert_eq!(zobrist.update(other, mv, &before, &after) ^ other, delta);
        assert_eq!(hash ^ delta, original);
    }

    #[test]
    fn test_null_move_update() {
        let zobrist = ZobristTable::new();
        let mut game =
            Game::from_fen("rnbqkbnr/pppp1ppp/8/8/3pP3/8/PPP2PPP/RNBQKBNR b KQkq e3 0 3")
                .unwrap();
        let hash = zobrist.hash(game.board());
        let before = *game.board();
        let applied = game.play_null().unwrap();
        assert_eq!(
            zobrist.update_null(hash, &before, applied.board()),
            zobrist.hash(applied.board())
        );
    }
}
