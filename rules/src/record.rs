//! 棋谱记录格式
//!
//! 支持导出标准 PGN，以及 JSON 格式的存档

use chess::{ChessMove, Color};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::ChessError;
use crate::fen::{Fen, STARTING_FEN};
use crate::game::Game;
use crate::notation::Notation;

/// 棋谱版本
pub const RECORD_VERSION: &str = "1.0";

/// PGN 每行最大宽度
const PGN_LINE_WIDTH: usize = 80;

/// 游戏结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameResult {
    /// 白方胜
    WhiteWin(WinReason),
    /// 黑方胜
    BlackWin(WinReason),
    /// 和棋
    Draw(DrawReason),
}

/// 胜利原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WinReason {
    /// 将死
    Checkmate,
}

/// 和棋原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawReason {
    /// 无子可动（逼和）
    Stalemate,
    /// 子力不足
    InsufficientMaterial,
    /// 五十回合（申请）
    FiftyMoves,
    /// 七十五回合（自动）
    SeventyFiveMoves,
    /// 三次重复（申请）
    ThreefoldRepetition,
    /// 五次重复（自动）
    FivefoldRepetition,
}

impl GameResult {
    /// PGN 结果字符串
    pub fn pgn_result(&self) -> &'static str {
        match self {
            GameResult::WhiteWin(_) => "1-0",
            GameResult::BlackWin(_) => "0-1",
            GameResult::Draw(_) => "1/2-1/2",
        }
    }
}

/// 游戏元数据（PGN 七标签）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameMetadata {
    pub event: String,
    pub site: String,
    /// 日期，格式 `YYYY.MM.DD`
    pub date: String,
    pub round: String,
    pub white: String,
    pub black: String,
    /// 游戏结果
    pub result: Option<GameResult>,
}

/// 走法记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    /// UCI 格式，如 `e2e4`
    pub uci: String,
    /// 标准代数记谱
    pub san: String,
}

impl MoveRecord {
    /// 在走子之前记录（SAN 依赖走子前的局面）
    pub fn new(game: &Game, mv: ChessMove) -> Result<Self, ChessError> {
        Ok(Self {
            uci: mv.to_string(),
            san: Notation::san(game, mv)?,
        })
    }
}

/// 完整的棋谱记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameRecord {
    /// 版本号
    pub version: String,
    /// 元数据
    pub metadata: GameMetadata,
    /// 初始局面 FEN
    pub initial_fen: String,
    /// 走法列表
    pub moves: Vec<MoveRecord>,
}

impl GameRecord {
    /// 创建新的棋谱记录
    pub fn new(white: String, black: String) -> Self {
        Self {
            version: RECORD_VERSION.to_string(),
            metadata: GameMetadata {
                event: "?".to_string(),
                site: "?".to_string(),
                date: Utc::now().format("%Y.%m.%d").to_string(),
                round: "?".to_string(),
                white,
                black,
                result: None,
            },
            initial_fen: STARTING_FEN.to_string(),
            moves: Vec::new(),
        }
    }

    /// 从自定义 FEN 创建
    pub fn from_fen(white: String, black: String, fen: String) -> Self {
        let mut record = Self::new(white, black);
        record.initial_fen = fen;
        record
    }

    /// 设置赛事名称
    pub fn set_event(&mut self, event: &str) {
        self.metadata.event = event.to_string();
    }

    /// 添加走法
    pub fn add_move(&mut self, mv: MoveRecord) {
        self.moves.push(mv);
    }

    /// 设置游戏结果
    pub fn set_result(&mut self, result: GameResult) {
        self.metadata.result = Some(result);
    }

    /// 结果标签
    pub fn result_tag(&self) -> &'static str {
        self.metadata
            .result
            .map(|result| result.pgn_result())
            .unwrap_or("*")
    }

    /// 转换为 JSON 字符串
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// 从 JSON 字符串解析
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// 导出 PGN
    pub fn to_pgn(&self) -> String {
        let mut output = String::new();
        let result = self.result_tag();

        let tags = [
            ("Event", self.metadata.event.as_str()),
            ("Site", self.metadata.site.as_str()),
            ("Date", self.metadata.date.as_str()),
            ("Round", self.metadata.round.as_str()),
            ("White", self.metadata.white.as_str()),
            ("Black", self.metadata.black.as_str()),
            ("Result", result),
        ];
        for (name, value) in tags {
            output.push_str(&format!("[{} \"{}\"]\n", name, escape(value)));
        }
        if self.initial_fen != STARTING_FEN {
            output.push_str("[SetUp \"1\"]\n");
            output.push_str(&format!("[FEN \"{}\"]\n", self.initial_fen));
        }
        output.push('\n');

        let (mut side, mut number) = match Fen::parse(&self.initial_fen) {
            Ok(parsed) => (parsed.board.side_to_move(), parsed.fullmove_number),
            Err(_) => (Color::White, 1),
        };

        let mut tokens = Vec::with_capacity(self.moves.len() * 3 / 2 + 1);
        for (i, mv) in self.moves.iter().enumerate() {
            match side {
                Color::White => tokens.push(format!("{}.", number)),
                Color::Black if i == 0 => tokens.push(format!("{}...", number)),
                Color::Black => {}
            }
            tokens.push(mv.san.clone());
            if side == Color::Black {
                number += 1;
            }
            side = !side;
        }
        tokens.push(result.to_string());

        let mut line = String::new();
        for token in tokens {
            if !line.is_empty() && line.len() + 1 + token.len() > PGN_LINE_WIDTH {
                output.push_str(&line);
                output.push('\n');
                line.clear();
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(&token);
        }
        output.push_str(&line);
        output.push('\n');

        output
    }
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
