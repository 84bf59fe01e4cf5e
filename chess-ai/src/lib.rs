//! 国际象棋 AI 引擎
//!
//! 包含:
//! - 棋局评估函数
//! - Negamax + Alpha-Beta 搜索（空着裁剪、静态搜索）
//! - 迭代加深
//! - Zobrist 哈希
//! - 置换表
//! - 开局库优先的走法决策

mod config;
mod error;
mod evaluate;
mod ordering;
mod search;
mod transposition;
mod zobrist;

pub use config::{AiConfig, Difficulty, MAX_DEPTH, MAX_NULL_MOVE_REDUCTION, MAX_TT_SIZE_MB};
pub use error::{AiError, Result};
pub use evaluate::{Evaluator, DRAW_SCORE, MATE_SCORE};
pub use ordering::MoveOrderer;
pub use search::{AiEngine, MoveSource, SearchOutcome, SearchStats, INFINITY};
pub use transposition::{EntryType, Replacement, TTEntry, TTStats, TranspositionTable};
pub use zobrist::ZobristTable;
