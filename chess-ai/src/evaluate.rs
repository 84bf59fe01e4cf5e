//! 棋局评估函数
//!
//! 子力价值加棋子位置分值（简化评估函数），以走子方视角返回分数。

use rules::{Board, BoardStatus, Color, Game, Piece, Square, ALL_COLORS, ALL_PIECES};

/// 将死分数（走子方被将死时为其相反数）
pub const MATE_SCORE: i32 = 9999;
/// 和棋分数
pub const DRAW_SCORE: i32 = 0;

/// 评估器
pub struct Evaluator;

/// 棋子位置分值表（白方视角，黑方需要镜像）
/// 索引 0 为 a8，63 为 h1
mod position_tables {
    pub const PAWN: [i32; 64] = [
         0,  0,  0,  0,  0,  0,  0,  0,
        50, 50, 50, 50, 50, 50, 50, 50,
        10, 10, 20, 30, 30, 20, 10, 10,
         5,  5, 10, 25, 25, 10,  5,  5,
         0,  0,  0, 20, 20,  0,  0,  0,
         5, -5,-10,  0,  0,-10, -5,  5,
         5, 10, 10,-20,-20, 10, 10,  5,
         0,  0,  0,  0,  0,  0,  0,  0,
    ];

    pub const KNIGHT: [i32; 64] = [
        -50,-40,-30,-30,-30,-30,-40,-50,
        -40,-20,  0,  0,  0,  0,-20,-40,
        -30,  0, 10, 15, 15, 10,  0,-30,
        -30,  5, 15, 20, 20, 15,  5,-30,
        -30,  0, 15, 20, 20, 15,  0,-30,
        -30,  5, 10, 15, 15, 10,  5,-30,
        -40,-20,  0,  5,  5,  0,-20,-40,
        -50,-40,-30,-30,-30,-30,-40,-50,
    ];

    pub const BISHOP: [i32; 64] = [
        -20,-10,-10,-10,-10,-10,-10,-20,
        -10,  0,  0,  0,  0,  0,  0,-10,
        -10,  0,  5, 10, 10,  5,  0,-10,
        -10,  5,  5, 10, 10,  5,  5,-10,
        -10,  0, 10, 10, 10, 10,  0,-10,
        -10, 10, 10, 10, 10, 10, 10,-10,
        -10,  5,  0,  0,  0,  0,  5,-10,
        -20,-10,-10,-10,-10,-10,-10,-20,
    ];

    pub const ROOK: [i32; 64] = [
         0,  0,  0,  0,  0,  0,  0,  0,
         5, 10, 10, 10, 10, 10, 10,  5,
        -5,  0,  0,  0,  0,  0,  0, -5,
        -5,  0,  0,  0,  0,  0,  0, -5,
        -5,  0,  0,  0,  0,  0,  0, -5,
        -5,  0,  0,  0,  0,  0,  0, -5,
        -5,  0,  0,  0,  0,  0,  0, -5,
         0,  0,  0,  5,  5,  0,  0,  0,
    ];

    pub const QUEEN: [i32; 64] = [
        -20,-10,-10, -5, -5,-10,-10,-20,
        -10,  0,  0,  0,  0,  0,  0,-10,
        -10,  0,  5,  5,  5,  5,  0,-10,
         -5,  0,  5,  5,  5,  5,  0, -5,
          0,  0,  5,  5,  5,  5,  0, -5,
        -10,  5,  5,  5,  5,  5,  0,-10,
        -10,  0,  5,  0,  0,  0,  0,-10,
        -20,-10,-10, -5, -5,-10,-10,-20,
    ];

    pub const KING: [i32; 64] = [
        -30,-40,-40,-50,-50,-40,-40,-30,
        -30,-40,-40,-50,-50,-40,-40,-30,
        -30,-40,-40,-50,-50,-40,-40,-30,
        -30,-40,-40,-50,-50,-40,-40,-30,
        -20,-30,-30,-40,-40,-30,-30,-20,
        -10,-20,-20,-20,-20,-20,-20,-10,
         20, 20,  0,  0,  0,  0, 20, 20,
         20, 30, 10,  0,  0, 10, 30, 20,
    ];
}

impl Evaluator {
    /// 评估局面（走子方视角）
    ///
    /// 终局优先：被将死返回 `-MATE_SCORE`，逼和或子力不足返回 `DRAW_SCORE`。
    pub fn evaluate(game: &Game) -> i32 {
        match game.board().status() {
            BoardStatus::Checkmate => return -MATE_SCORE,
            BoardStatus::Stalemate => return DRAW_SCORE,
            BoardStatus::Ongoing => {}
        }
        if game.has_insufficient_material() {
            return DRAW_SCORE;
        }

        let score = Self::evaluate_board(game.board());
        match game.side_to_move() {
            Color::White => score,
            Color::Black => -score,
        }
    }

    /// 子力与位置分（白方视角，不考虑终局）
    pub fn evaluate_board(board: &Board) -> i32 {
        let mut score = 0;
        for color in ALL_COLORS {
            let sign = if color == Color::White { 1 } else { -1 };
            let ours = *board.color_combined(color);
            for piece in ALL_PIECES {
                for square in *board.pieces(piece) & ours {
                    score += sign * (Self::piece_value(piece) + Self::position_bonus(piece, color, square));
                }
            }
        }
        score
    }

    /// 只计算子力（白方视角）
    pub fn evaluate_material(board: &Board) -> i32 {
        ALL_PIECES
            .iter()
            .map(|&piece| {
                let pieces = *board.pieces(piece);
                let white = (pieces & *board.color_combined(Color::White)).popcnt() as i32;
                let black = (pieces & *board.color_combined(Color::Black)).popcnt() as i32;
                (white - black) * Self::piece_value(piece)
            })
            .sum()
    }

    /// 棋子基础分值
    ///
    /// 双方各有一王，王的分值互相抵消，记为 0。
    pub fn piece_value(piece: Piece) -> i32 {
        match piece {
            Piece::Pawn => 100,
            Piece::Knight => 320,
            Piece::Bishop => 330,
            Piece::Rook => 500,
            Piece::Queen => 900,
            Piece::King => 0,
        }
    }

    /// 位置分值
    fn position_bonus(piece: Piece, color: Color, square: Square) -> i32 {
        let index = match color {
            Color::White => square.to_index() ^ 56,
            Color::Black => square.to_index(),
        };
        let table = match piece {
            Piece::Pawn => &position_tables::PAWN,
            Piece::Knight => &position_tables::KNIGHT,
            Piece::Bishop => &position_tables::BISHOP,
            Piece::Rook => &position_tables::ROOK,
            Piece::Queen => &position_tables::QUEEN,
            Piece::King => &position_tables::KING,
        };
        table[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_initial_evaluation() {
        let game = Game::new();
        assert_eq!(Evaluator::evaluate(&game), 0, "初始局面应该是平衡的");
        assert_eq!(Evaluator::evaluate_material(game.board()), 0);
    }

    #[test]
    fn test_material_advantage() {
        // 黑方少一个后
        let game = Game::from_fen("rnb1kbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1").unwrap();
        assert_eq!(Evaluator::evaluate_material(game.board()), 900);
        assert!(Evaluator::evaluate(&game) > 800);

        // 同一局面轮到黑方走，分数取反
        let game = Game::from_fen("rnb1kbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR b KQkq - 0 1").unwrap();
        assert!(Evaluator::evaluate(&game) < -800);
    }

    #[test]
    fn test_position_bonus() {
        // 中心的马比边角的马价值高（各留一个兵，避免子力不足判和）
        let center = Game::from_fen("4k3/8/8/8/3N4/8/P7/4K3 w - - 0 1").unwrap();
        let corner = Game::from_fen("4k3/8/8/8/8/8/P7/N3K3 w - - 0 1").unwrap();
        assert!(!center.has_insufficient_material());
        assert!(
            Evaluator::evaluate(&center) > Evaluator::evaluate(&corner),
            "中心马应得分更高"
        );

        // 单马对王判和，但静态位置分仍然区分马的位置
        let bare_center = Game::from_fen("4k3/8/8/8/3N4/8/8/4K3 w - - 0 1").unwrap();
        let bare_corner = Game::from_fen("4k3/8/8/8/8/8/8/N3K3 w - - 0 1").unwrap();
        assert_eq!(Evaluator::evaluate(&bare_center), DRAW_SCORE);
        assert!(
            Evaluator::evaluate_board(bare_center.board())
                > Evaluator::evaluate_board(bare_corner.board())
        );

        // 接近升变的兵价值更高
        let advanced = Game::from_fen("4k3/1P6/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let home = Game::from_fen("4k3/8/8/8/8/8/1P6/4K3 w - - 0 1").unwrap();
        assert!(Evaluator::evaluate(&advanced) > Evaluator::evaluate(&home));
    }

    #[test]
    fn test_terminal_scores() {
        // 黑方被将死
        let mate = Game::from_fen("R5k1/5ppp/8/8/8/8/8/6K1 b - - 1 1").unwrap();
        assert_eq!(Evaluator::evaluate(&mate), -MATE_SCORE);

        let stalemate = Game::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        assert_eq!(Evaluator::evaluate(&stalemate), DRAW_SCORE);

        // 子力不足
        let bare = Game::from_fen("4k3/8/8/8/8/8/8/2B1K3 w - - 0 1").unwrap();
        assert_eq!(Evaluator::evaluate(&bare), DRAW_SCORE);
    }

    #[test]
    fn test_mirror_antisymmetry() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..24 {
            let mut game = Game::new();
            let plies = rng.gen_range(4..30);
            for _ in 0..plies {
                let moves = game.legal_moves();
                if moves.is_empty() {
                    break;
                }
                let mv = moves[rng.gen_range(0..moves.len())];
                game.apply(mv).unwrap();
            }

            let mirrored = game.mirror().unwrap();
            // 白方视角的分数互为相反数
            assert_eq!(
                Evaluator::evaluate_board(game.board()),
                -Evaluator::evaluate_board(mirrored.board()),
                "镜像局面分数不对称: {}",
                game.to_fen()
            );
            // 走子方视角的分数相同
            assert_eq!(Evaluator::evaluate(&game), Evaluator::evaluate(&mirrored));
        }
    }
}
