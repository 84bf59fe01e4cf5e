//! AI 引擎错误类型

use rules::{BookError, ChessError};
use thiserror::Error;

/// AI 引擎错误
#[derive(Error, Debug)]
pub enum AiError {
    #[error("Rules error: {0}")]
    Rules(#[from] ChessError),

    #[error("Opening book error: {0}")]
    Book(#[from] BookError),

    #[error("No legal moves in position {fen}")]
    NoLegalMoves { fen: String },

    /// 迭代加深超时，当前层的结果作废
    #[error("Search stopped by deadline")]
    Stopped,

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AiError>;
