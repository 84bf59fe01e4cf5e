//! 开局库
//!
//! JSON 格式，键为 FEN 的前四个字段：
//!
//! ```json
//! {
//!   "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq -": [
//!     { "uci": "e2e4", "weight": 40 },
//!     { "uci": "d2d4", "weight": 35 }
//!   ]
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use chess::ChessMove;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::BookError;
use crate::fen::{Fen, STARTING_FEN};
use crate::game::Game;

/// 开局库中的一个候选走法
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookMove {
    pub uci: String,
    pub weight: u32,
}

/// 内置开局库
const BUILTIN_LINES: &[(&str, &str, u32)] = &[
    (STARTING_FEN, "e2e4", 40),
    (STARTING_FEN, "d2d4", 35),
    (STARTING_FEN, "c2c4", 15),
    (STARTING_FEN, "g1f3", 10),
    // 1. e4
    ("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq -", "c7c5", 40),
    ("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq -", "e7e5", 35),
    ("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq -", "e7e6", 15),
    ("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq -", "c7c6", 10),
    // 1. d4
    ("rnbqkbnr/pppppppp/8/8/3P4/8/PPP1PPPP/RNBQKBNR b KQkq -", "g8f6", 55),
    ("rnbqkbnr/pppppppp/8/8/3P4/8/PPP1PPPP/RNBQKBNR b KQkq -", "d7d5", 45),
    // 1. c4
    ("rnbqkbnr/pppppppp/8/8/2P5/8/PP1PPPPP/RNBQKBNR b KQkq -", "g8f6", 50),
    ("rnbqkbnr/pppppppp/8/8/2P5/8/PP1PPPPP/RNBQKBNR b KQkq -", "e7e5", 50),
    // 1. Nf3
    ("rnbqkbnr/pppppppp/8/8/8/5N2/PPPPPPPP/RNBQKB1R b KQkq -", "d7d5", 50),
    ("rnbqkbnr/pppppppp/8/8/8/5N2/PPPPPPPP/RNBQKB1R b KQkq -", "g8f6", 50),
];

/// 开局库
#[derive(Debug, Clone, Default)]
pub struct OpeningBook {
    entries: HashMap<String, Vec<BookMove>>,
}

impl OpeningBook {
    /// 空开局库
    pub fn new() -> Self {
        Self::default()
    }

    /// 内置的小型开局库
    pub fn builtin() -> Self {
        let mut book = Self::new();
        for (fen, uci, weight) in BUILTIN_LINES {
            if let Err(e) = book.insert(fen, uci, *weight) {
                warn!("Skipping builtin book line {} {}: {}", fen, uci, e);
            }
        }
        book
    }

    /// 从 JSON 文件加载
    pub fn load(path: impl AsRef<Path>) -> Result<Self, BookError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let book = Self::from_json(&json)?;
        debug!(
            "Loaded opening book {:?}: {} positions",
            path.as_ref(),
            book.len()
        );
        Ok(book)
    }

    /// 从 JSON 字符串解析
    pub fn from_json(json: &str) -> Result<Self, BookError> {
        let raw: HashMap<String, Vec<BookMove>> = serde_json::from_str(json)?;
        let mut book = Self::new();
        for (fen, moves) in raw {
            for mv in moves {
                book.insert(&fen, &mv.uci, mv.weight)?;
            }
        }
        Ok(book)
    }

    /// 转换为 JSON 字符串
    pub fn to_json(&self) -> Result<String, BookError> {
        Ok(serde_json::to_string_pretty(&self.entries)?)
    }

    /// 添加走法，已存在时累加权重
    ///
    /// 键会被规范化为本库生成的 FEN 前四个字段，保证与查询时一致。
    pub fn insert(&mut self, fen: &str, uci: &str, weight: u32) -> Result<(), BookError> {
        let parsed = Fen::parse(fen).map_err(|e| BookError::InvalidFen {
            fen: fen.to_string(),
            reason: e.to_string(),
        })?;
        let key = Fen::position_key(&parsed.board);
        let uci = uci.trim().to_ascii_lowercase();

        let entry = self.entries.entry(key).or_default();
        match entry.iter_mut().find(|bm| bm.uci == uci) {
            Some(existing) => existing.weight = existing.weight.saturating_add(weight),
            None => entry.push(BookMove { uci, weight }),
        }
        Ok(())
    }

    /// 收录的局面数
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 某局面的全部候选走法
    pub fn candidates(&self, game: &Game) -> &[BookMove] {
        self.entries
            .get(&game.position_key())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// 按权重随机选出一个开局库走法
    ///
    /// 局面不在库中、或库中走法在当前局面均不合法时返回 `None`。
    pub fn lookup<R: Rng + ?Sized>(&self, game: &Game, rng: &mut R) -> Option<ChessMove> {
        let playable: Vec<(ChessMove, u32)> = self
            .candidates(game)
            .iter()
            .filter(|bm| bm.weight > 0)
            .filter_map(|bm| match game.parse_uci(&bm.uci) {
                Ok(mv) => Some((mv, bm.weight)),
                Err(_) => {
                    warn!("Book move {} is illegal in {}", bm.uci, game.to_fen());
                    None
                }
            })
            .collect();

        let total: u32 = playable.iter().map(|(_, weight)| *weight).sum();
        if total == 0 {
            return None;
        }

        let mut roll = rng.gen_range(0..total);
        for (mv, weight) in playable {
            if roll < weight {
                return Some(mv);
            }
            roll -= weight;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::io::Write;

    #[test]
    fn test_builtin_book() {
        let book = OpeningBook::builtin();
        assert_eq!(book.len(), 5);

        let game = Game::new();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..20 {
            let mv = book.lookup(&game, &mut rng).unwrap();
            assert!(["e2e4", "d2d4", "c2c4", "g1f3"].contains(&mv.to_string().as_str()));
        }
    }

    #[test]
    fn test_book_miss() {
        let book = OpeningBook::builtin();
        let game = Game::from_fen("8/8/4k3/8/8/4K3/4R3/8 w - - 0 1").unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        assert_eq!(book.lookup(&game, &mut rng), None);
        assert!(book.candidates(&game).is_empty());
    }

    #[test]
    fn test_lookup_after_moves() {
        let book = OpeningBook::builtin();
        let mut game = Game::new();
        let e4 = game.parse_uci("e2e4").unwrap();
        game.apply(e4).unwrap();

        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let reply = book.lookup(&game, &mut rng).unwrap();
        assert!(["c7c5", "e7e5", "e7e6", "c7c6"].contains(&reply.to_string().as_str()));
    }

    #[test]
    fn test_weighted_choice() {
        let mut book = OpeningBook::new();
        book.insert(STARTING_FEN, "e2e4", 1).unwrap();
        book.insert(STARTING_FEN, "d2d4", 0).unwrap();
        book.insert(STARTING_FEN, "e2e5", 100).unwrap();

        let game = Game::new();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..10 {
            assert_eq!(book.lookup(&game, &mut rng).unwrap().to_string(), "e2e4");
        }
    }

    #[test]
    fn test_insert_accumulates_weight() {
        let mut book = OpeningBook::new();
        book.insert(STARTING_FEN, "e2e4", 2).unwrap();
        book.insert(STARTING_FEN, "E2E4", 3).unwrap();
        let game = Game::new();
        assert_eq!(
            book.candidates(&game),
            &[BookMove {
                uci: "e2e4".to_string(),
                weight: 5
            }]
        );
    }

    #[test]
    fn test_json_roundtrip_and_load() {
        let book = OpeningBook::builtin();
        let json = book.to_json().unwrap();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let loaded = OpeningBook::load(file.path()).unwrap();
        assert_eq!(loaded.len(), book.len());
    }

    #[test]
    fn test_invalid_book() {
        assert!(matches!(
            OpeningBook::from_json("not json"),
            Err(BookError::Json(_))
        ));
        assert!(matches!(
            OpeningBook::from_json(r#"{"bad fen": [{"uci": "e2e4", "weight": 1}]}"#),
            Err(BookError::InvalidFen { .. })
        ));
        // 没有黑王的局面不能收入开局库
        let mut book = OpeningBook::new();
        assert!(matches!(
            book.insert("8/8/8/8/8/8/8/4K3 w - - 0 1", "e1e2", 1),
            Err(BookError::InvalidFen { .. })
        ));
        assert!(book.is_empty());
        assert!(matches!(
            OpeningBook::load("/nonexistent/book.json"),
            Err(BookError::Io(_))
        ));
    }
}
