//! 国际象棋规则层
//!
//! 包含:
//! - 可变对局句柄 `Game`（走子/撤销、守卫式走子、终局判定）
//! - FEN 解析与生成
//! - 标准代数记谱法（SAN）
//! - PGN / JSON 棋谱
//! - 加权开局库
//!
//! 走法生成与将军检测由 `chess` crate 完成。

mod book;
mod error;
mod fen;
mod game;
mod notation;
mod record;

pub use book::{BookMove, OpeningBook};
pub use error::{BookError, ChessError, Result};
pub use fen::{Fen, ParsedFen, STARTING_FEN};
pub use game::{Applied, Game};
pub use notation::Notation;
pub use record::{DrawReason, GameMetadata, GameRecord, GameResult, MoveRecord, WinReason};

pub use chess::{
    BitBoard, Board, BoardStatus, CastleRights, ChessMove, Color, File, Piece, Rank, Square,
    ALL_COLORS, ALL_PIECES, ALL_SQUARES, EMPTY,
};
