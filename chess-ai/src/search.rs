//! 搜索引擎
//!
//! 实现 Negamax + Alpha-Beta 剪枝（fail-soft）+ 迭代加深，
//! 配合置换表、空着裁剪与静态搜索。

use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rules::{BoardStatus, ChessMove, Game, OpeningBook};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::{AiConfig, Difficulty, MAX_TT_SIZE_MB};
use crate::error::{AiError, Result};
use crate::evaluate::{Evaluator, MATE_SCORE};
use crate::ordering::MoveOrderer;
use crate::transposition::{EntryType, TTStats, TranspositionTable};
use crate::zobrist::ZobristTable;

/// 搜索窗口的无穷大，大于任何评估分数
pub const INFINITY: i32 = 30_000;

/// 空着裁剪的最小剩余深度
const NULL_MOVE_MIN_DEPTH: u8 = 3;
/// 空着裁剪要求走子方的最少非兵子力
const NULL_MOVE_MIN_MATERIAL: i32 = 10;
/// 每隔多少个节点检查一次时间
const DEADLINE_CHECK_INTERVAL: u64 = 1024;

/// 走法来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveSource {
    Book,
    Search,
}

/// 搜索统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SearchStats {
    /// 主搜索节点数
    pub nodes: u64,
    /// 静态搜索节点数
    pub qnodes: u64,
    /// 置换表截断次数
    pub tt_cutoffs: u64,
    /// 空着裁剪次数
    pub null_cutoffs: u64,
    /// Beta 截断次数
    pub beta_cutoffs: u64,
}

impl SearchStats {
    pub fn total_nodes(&self) -> u64 {
        self.nodes + self.qnodes
    }
}

/// 一次决策的结果
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    #[serde(serialize_with = "serialize_move")]
    pub best_move: ChessMove,
    /// 走子方视角的分数，开局库走法为 0
    pub score: i32,
    /// 完成的搜索深度，开局库走法为 0
    pub depth: u8,
    pub source: MoveSource,
    pub stats: SearchStats,
}

fn serialize_move<S: serde::Serializer>(mv: &ChessMove, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(mv)
}

/// AI 引擎
pub struct AiEngine {
    config: AiConfig,
    zobrist: ZobristTable,
    tt: TranspositionTable,
    book: Option<OpeningBook>,
    rng: ChaCha8Rng,
    stats: SearchStats,
    deadline: Option<Instant>,
}

impl AiEngine {
    /// 创建新的 AI 引擎，启用开局库时使用内置开局库
    pub fn new(config: AiConfig) -> Self {
        let tt = TranspositionTable::new(config.tt_size_mb.min(MAX_TT_SIZE_MB), config.replacement);
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let book = config.use_opening_book.then(OpeningBook::builtin);

        Self {
            config,
            zobrist: ZobristTable::new(),
            tt,
            book,
            rng,
            stats: SearchStats::default(),
            deadline: None,
        }
    }

    /// 校验配置并加载 `book_path` 指定的开局库
    pub fn from_config(config: AiConfig) -> Result<Self> {
        config.validate()?;
        let external = match (&config.book_path, config.use_opening_book) {
            (Some(path), true) => Some(OpeningBook::load(path)?),
            _ => None,
        };

        let mut engine = Self::new(config);
        if let Some(book) = external {
            info!("Using opening book with {} positions", book.len());
            engine.set_book(Some(book));
        }
        Ok(engine)
    }

    /// 从难度创建
    pub fn from_difficulty(difficulty: Difficulty) -> Self {
        Self::new(AiConfig::from_difficulty(difficulty))
    }

    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    pub fn set_book(&mut self, book: Option<OpeningBook>) {
        self.book = book;
    }

    /// 新对局：清空置换表
    pub fn new_game(&mut self) {
        self.tt.clear();
    }

    /// 上一次决策的统计
    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    /// 获取搜索的节点数
    pub fn nodes_searched(&self) -> u64 {
        self.stats.total_nodes()
    }

    pub fn tt_stats(&self) -> TTStats {
        self.tt.stats()
    }

    /// 固定深度选择走法（优先开局库）
    pub fn choose_move(&mut self, game: &mut Game, depth: u8) -> Result<ChessMove> {
        Ok(self.search_depth(game, depth)?.best_move)
    }

    /// 固定深度决策（优先开局库）
    pub fn search_depth(&mut self, game: &mut Game, depth: u8) -> Result<SearchOutcome> {
        if let Some(outcome) = self.prepare(game)? {
            return Ok(outcome);
        }

        let depth = depth.max(1);
        let key = self.zobrist.hash(game.board());
        let (best_move, score) = self.search_root(game, depth, key, None)?;

        info!(
            "Search depth {} best {} score {} nodes {}",
            depth,
            best_move,
            score,
            self.stats.total_nodes()
        );
        Ok(SearchOutcome {
            best_move,
            score,
            depth,
            source: MoveSource::Search,
            stats: self.stats,
        })
    }

    /// 迭代加深决策（优先开局库）
    ///
    /// 第一层总是完整搜索；之后超时则放弃当前层，返回上一层完成的结果。
    pub fn think(&mut self, game: &mut Game) -> Result<SearchOutcome> {
        if let Some(outcome) = self.prepare(game)? {
            return Ok(outcome);
        }

        let start = Instant::now();
        let deadline = self
            .config
            .time_limit_ms
            .map(|ms| start + Duration::from_millis(ms));
        let key = self.zobrist.hash(game.board());

        let mut best: Option<(ChessMove, i32, u8)> = None;
        for depth in 1..=self.config.max_depth.max(1) {
            self.deadline = if depth == 1 { None } else { deadline };

            match self.search_root(game, depth, key, best.map(|(mv, _, _)| mv)) {
                Ok((mv, score)) => {
                    debug!(
                        "Depth {} best {} score {} nodes {} ({:?})",
                        depth,
                        mv,
                        score,
                        self.stats.total_nodes(),
                        start.elapsed()
                    );
                    best = Some((mv, score, depth));
                    if score.abs() >= MATE_SCORE {
                        break;
                    }
                }
                Err(AiError::Stopped) => {
                    debug!("Depth {} abandoned after {:?}", depth, start.elapsed());
                    break;
                }
                Err(e) => {
                    self.deadline = None;
                    return Err(e);
                }
            }

            if deadline.is_some_and(|d| Instant::now() >= d) {
                break;
            }
        }
        self.deadline = None;

        let (best_move, score, depth) = best.ok_or_else(|| AiError::NoLegalMoves {
            fen: game.to_fen(),
        })?;
        info!(
            "Best move {} score {} depth {} nodes {} in {:?}",
            best_move,
            score,
            depth,
            self.stats.total_nodes(),
            start.elapsed()
        );
        Ok(SearchOutcome {
            best_move,
            score,
            depth,
            source: MoveSource::Search,
            stats: self.stats,
        })
    }

    /// 以完整窗口搜索当前局面的分数（走子方视角）
    pub fn evaluate_position(&mut self, game: &mut Game, depth: u8) -> Result<i32> {
        let key = self.zobrist.hash(game.board());
        self.alpha_beta(game, -INFINITY, INFINITY, depth, key)
    }

    /// 决策前的准备：检查合法走法、重置统计、查询开局库
    fn prepare(&mut self, game: &Game) -> Result<Option<SearchOutcome>> {
        if game.legal_moves().is_empty() {
            return Err(AiError::NoLegalMoves { fen: game.to_fen() });
        }

        self.stats = SearchStats::default();
        self.deadline = None;
        self.tt.new_search();

        Ok(self.book_move(game).map(|mv| {
            info!("Book move {}", mv);
            SearchOutcome {
                best_move: mv,
                score: 0,
                depth: 0,
                source: MoveSource::Book,
                stats: self.stats,
            }
        }))
    }

    fn book_move(&mut self, game: &Game) -> Option<ChessMove> {
        if !self.config.use_opening_book {
            return None;
        }
        self.book.as_ref()?.lookup(game, &mut self.rng)
    }

    /// 根节点搜索，逐步收紧 Alpha，同分时保留先出现的走法
    fn search_root(
        &mut self,
        game: &mut Game,
        depth: u8,
        key: u64,
        first: Option<ChessMove>,
    ) -> Result<(ChessMove, i32)> {
        let mut moves = game.legal_moves();
        if moves.is_empty() {
            return Err(AiError::NoLegalMoves { fen: game.to_fen() });
        }
        MoveOrderer::order(&mut moves, game);
        if let Some(first) = first {
            MoveOrderer::promote(&mut moves, first);
        }

        let mut alpha = -INFINITY;
        let mut best_move = moves[0];
        let mut best_score = -INFINITY;

        for mv in moves {
            let before = *game.board();
            let score = {
                let mut child = game.play(mv)?;
                let child_key = self.zobrist.update(key, mv, &before, child.board());
                -self.alpha_beta(&mut child, -INFINITY, -alpha, depth - 1, child_key)?
            };

            if score > best_score {
                best_score = score;
                best_move = mv;
            }
            alpha = alpha.max(score);
        }

        self.store(key, best_score, depth, EntryType::Exact, Some(best_move));
        Ok((best_move, best_score))
    }

    /// Alpha-Beta 搜索（fail-soft）
    ///
    /// `key` 必须是当前局面的 Zobrist 哈希。返回走子方视角的分数：
    /// 落在窗口内时为精确值，否则为对应方向的界。
    pub fn alpha_beta(
        &mut self,
        game: &mut Game,
        mut alpha: i32,
        beta: i32,
        depth: u8,
        key: u64,
    ) -> Result<i32> {
        self.stats.nodes += 1;
        self.check_deadline()?;

        let alpha_orig = alpha;
        let mut hash_move = None;
        if self.config.use_transposition {
            if let Some(entry) = self.tt.probe(key).copied() {
                hash_move = entry.best_move;
                if entry.depth >= depth {
                    let usable = match entry.entry_type {
                        EntryType::Exact => true,
                        EntryType::LowerBound => entry.score >= beta,
                        EntryType::UpperBound => entry.score <= alpha,
                    };
                    if usable {
                        self.stats.tt_cutoffs += 1;
                        return Ok(entry.score);
                    }
                }
            }
        }

        if depth == 0 {
            return if self.config.use_quiescence {
                self.quiescence(game, alpha, beta)
            } else {
                Ok(Evaluator::evaluate(game))
            };
        }

        if is_terminal(game) {
            let score = Evaluator::evaluate(game);
            self.store(key, score, depth, EntryType::Exact, None);
            return Ok(score);
        }

        if self.config.use_null_move
            && depth >= NULL_MOVE_MIN_DEPTH
            && !game.is_in_check()
            && MoveOrderer::non_pawn_material(game, game.side_to_move()) >= NULL_MOVE_MIN_MATERIAL
        {
            let reduced = depth.saturating_sub(self.config.null_move_reduction.saturating_add(1));
            let before = *game.board();
            let score = {
                let mut child = game.play_null()?;
                let child_key = self.zobrist.update_null(key, &before, child.board());
                -self.alpha_beta(&mut child, -beta, -beta + 1, reduced, child_key)?
            };
            if score >= beta {
                self.stats.null_cutoffs += 1;
                self.store(key, beta, depth, EntryType::LowerBound, None);
                return Ok(beta);
            }
        }

        let mut moves = game.legal_moves();
        assert!(
            !moves.is_empty(),
            "no legal moves in non-terminal position {}",
            game.to_fen()
        );
        MoveOrderer::order(&mut moves, game);
        if let Some(mv) = hash_move {
            MoveOrderer::promote(&mut moves, mv);
        }

        let mut best_score = -INFINITY;
        let mut best_move = None;
        for mv in moves {
            let before = *game.board();
            let score = {
                let mut child = game.play(mv)?;
                let child_key = self.zobrist.update(key, mv, &before, child.board());
                -self.alpha_beta(&mut child, -beta, -alpha, depth - 1, child_key)?
            };

            if score > best_score {
                best_score = score;
                best_move = Some(mv);
            }
            if score > alpha {
                alpha = score;
            }
            if alpha >= beta {
                self.stats.beta_cutoffs += 1;
                break;
            }
        }

        let entry_type = if best_score >= beta {
            EntryType::LowerBound
        } else if best_score <= alpha_orig {
            EntryType::UpperBound
        } else {
            EntryType::Exact
        };
        self.store(key, best_score, depth, entry_type, best_move);

        Ok(best_score)
    }

    /// 静态搜索（只搜索吃子走法，fail-soft）
    pub fn quiescence(&mut self, game: &mut Game, mut alpha: i32, beta: i32) -> Result<i32> {
        self.stats.qnodes += 1;
        self.check_deadline()?;

        let stand_pat = Evaluator::evaluate(game);
        if stand_pat >= beta {
            return Ok(stand_pat);
        }
        if stand_pat > alpha {
            alpha = stand_pat;
        }

        let mut captures = game.captures();
        MoveOrderer::order(&mut captures, game);

        let mut best_score = stand_pat;
        for mv in captures {
            let score = {
                let mut child = game.play(mv)?;
                -self.quiescence(&mut child, -beta, -alpha)?
            };

            if score > best_score {
                best_score = score;
            }
            if score > alpha {
                alpha = score;
            }
            if alpha >= beta {
                break;
            }
        }

        Ok(best_score)
    }

    fn store(
        &mut self,
        key: u64,
        score: i32,
        depth: u8,
        entry_type: EntryType,
        best_move: Option<ChessMove>,
    ) {
        if self.config.use_transposition {
            self.tt.store(key, score, depth, entry_type, best_move);
        }
    }

    fn check_deadline(&self) -> Result<()> {
        if let Some(deadline) = self.deadline {
            if self.stats.total_nodes() % DEADLINE_CHECK_INTERVAL == 0 && Instant::now() >= deadline {
                return Err(AiError::Stopped);
            }
        }
        Ok(())
    }
}

/// 将死、逼和或子力不足
pub(crate) fn is_terminal(game: &Game) -> bool {
    game.board().status() != BoardStatus::Ongoing || game.has_insufficient_material()
}
