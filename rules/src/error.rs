//! 错误类型定义

use thiserror::Error;

/// 国际象棋规则错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChessError {
    /// 非法走法（不在当前局面的合法走法中）
    #[error("Invalid move: {uci}")]
    InvalidMove { uci: String },

    /// 撤销的走法与最后一步不匹配
    #[error("Unmatched undo: expected {expected}, got {actual}")]
    UnmatchedUndo { expected: String, actual: String },

    /// 没有可撤销的走法
    #[error("Nothing to undo")]
    EmptyHistory,

    /// 被将军时不能空着
    #[error("Null move while in check")]
    NullMoveInCheck,

    /// 无效的 FEN 字符串
    #[error("Invalid FEN string: {reason}")]
    InvalidFen { reason: String },
}

/// 开局库错误
#[derive(Error, Debug)]
pub enum BookError {
    /// IO 错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON 解析错误
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// 开局库中的局面无法解析
    #[error("Invalid book position {fen}: {reason}")]
    InvalidFen { fen: String, reason: String },
}

/// 规则层操作结果类型
pub type Result<T> = std::result::Result<T, ChessError>;
