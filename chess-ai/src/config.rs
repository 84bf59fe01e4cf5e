//! AI 配置

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AiError, Result};
use crate::transposition::Replacement;

/// 允许的最大搜索深度
pub const MAX_DEPTH: u8 = 64;

/// 置换表大小上限（MB）
pub const MAX_TT_SIZE_MB: usize = 4096;

/// 空着裁剪深度缩减量上限
pub const MAX_NULL_MOVE_REDUCTION: u8 = 8;

/// 难度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

/// AI 配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub difficulty: Difficulty,
    /// 迭代加深的最大深度，固定深度搜索时为搜索深度
    pub max_depth: u8,
    /// 迭代加深的时间限制，`None` 表示不限时
    pub time_limit_ms: Option<u64>,
    /// 置换表大小（MB）
    pub tt_size_mb: usize,
    pub replacement: Replacement,
    pub use_transposition: bool,
    pub use_null_move: bool,
    /// 空着裁剪的深度缩减量
    pub null_move_reduction: u8,
    pub use_quiescence: bool,
    pub use_opening_book: bool,
    /// 外部开局库，未指定时使用内置开局库
    pub book_path: Option<PathBuf>,
    /// 开局库随机选择的种子，未指定时使用系统熵
    pub seed: Option<u64>,
}

impl AiConfig {
    pub fn from_difficulty(difficulty: Difficulty) -> Self {
        let (max_depth, time_limit_ms, use_opening_book) = match difficulty {
            Difficulty::Easy => (3, 1000, false),
            Difficulty::Medium => (4, 3000, true),
            Difficulty::Hard => (6, 5000, true),
        };
        Self {
            difficulty,
            max_depth,
            time_limit_ms: Some(time_limit_ms),
            tt_size_mb: 16,
            replacement: Replacement::DepthPreferred,
            use_transposition: true,
            use_null_move: true,
            null_move_reduction: 2,
            use_quiescence: true,
            use_opening_book,
            book_path: None,
            seed: None,
        }
    }

    /// 从 JSON 文件加载，缺省字段取默认值
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// 检查配置是否可用
    pub fn validate(&self) -> Result<()> {
        if self.max_depth == 0 || self.max_depth > MAX_DEPTH {
            return Err(AiError::Config(format!(
                "max_depth must be between 1 and {}, got {}",
                MAX_DEPTH, self.max_depth
            )));
        }
        if self.use_transposition && self.tt_size_mb == 0 {
            return Err(AiError::Config(
                "tt_size_mb must be positive when the transposition table is enabled".to_string(),
            ));
        }
        if self.tt_size_mb > MAX_TT_SIZE_MB {
            return Err(AiError::Config(format!(
                "tt_size_mb must be at most {}, got {}",
                MAX_TT_SIZE_MB, self.tt_size_mb
            )));
        }
        if self.null_move_reduction > MAX_NULL_MOVE_REDUCTION {
            return Err(AiError::Config(format!(
                "null_move_reduction must be at most {}, got {}",
                MAX_NULL_MOVE_REDUCTION, self.null_move_reduction
            )));
        }
        if self.time_limit_ms == Some(0) {
            return Err(AiError::Config("time_limit_ms must be positive".to_string()));
        }
        Ok(())
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self::from_difficulty(Difficulty::Medium)
    }
}
