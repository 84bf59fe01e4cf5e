//! 对局状态
//!
//! `Game` 是搜索期间唯一的可变局面句柄。走子与撤销严格按后进先出配对，
//! 推荐通过 [`Game::play`] 返回的 [`Applied`] 守卫完成，守卫析构时自动撤销。

use std::fmt;
use std::ops::{Deref, DerefMut};

use chess::{
    BitBoard, Board, BoardStatus, CastleRights, ChessMove, Color, File, MoveGen, Piece, Rank,
    Square, EMPTY,
};

use crate::error::{ChessError, Result};
use crate::fen::{piece_char, Fen};
use crate::record::{DrawReason, GameResult, WinReason};

/// 栈中记录的一步
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ply {
    Move(ChessMove),
    Null,
}

/// 撤销所需的全部信息
#[derive(Clone, Copy)]
struct Snapshot {
    board: Board,
    ply: Ply,
    halfmove_clock: u32,
    fullmove_number: u32,
}

/// 可变对局
#[derive(Clone)]
pub struct Game {
    board: Board,
    halfmove_clock: u32,
    fullmove_number: u32,
    undo_stack: Vec<Snapshot>,
    /// 历史局面哈希（含当前局面）
    position_history: Vec<u64>,
}

impl Game {
    /// 标准初始局面
    pub fn new() -> Self {
        Self::with_board(Board::default(), 0, 1)
    }

    /// 从 FEN 创建
    pub fn from_fen(fen: &str) -> Result<Self> {
        let parsed = Fen::parse(fen)?;
        Ok(Self::with_board(
            parsed.board,
            parsed.halfmove_clock,
            parsed.fullmove_number,
        ))
    }

    fn with_board(board: Board, halfmove_clock: u32, fullmove_number: u32) -> Self {
        Self {
            board,
            halfmove_clock,
            fullmove_number,
            undo_stack: Vec::with_capacity(128),
            position_history: vec![board.get_hash()],
        }
    }

    /// 当前棋盘
    #[inline]
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// 生成 FEN
    pub fn to_fen(&self) -> String {
        Fen::generate(&self.board, self.halfmove_clock, self.fullmove_number)
    }

    /// 开局库查询使用的 FEN 前四个字段
    pub fn position_key(&self) -> String {
        Fen::position_key(&self.board)
    }

    /// 颜色互换、上下翻转后的局面
    pub fn mirror(&self) -> Result<Self> {
        Self::from_fen(&Fen::mirror(&self.to_fen())?)
    }

    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.board.side_to_move()
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    /// 已走的半回合数（含空着）
    pub fn ply(&self) -> usize {
        self.undo_stack.len()
    }

    /// 最近一步真实走法
    pub fn last_move(&self) -> Option<ChessMove> {
        match self.undo_stack.last()?.ply {
            Ply::Move(mv) => Some(mv),
            Ply::Null => None,
        }
    }

    // ---------------------------------------------------------------
    // 走法生成
    // ---------------------------------------------------------------

    /// 所有合法走法
    pub fn legal_moves(&self) -> Vec<ChessMove> {
        MoveGen::new_legal(&self.board).collect()
    }

    /// 所有合法的吃子走法（含吃过路兵）
    pub fn captures(&self) -> Vec<ChessMove> {
        MoveGen::new_legal(&self.board)
            .filter(|mv| self.is_capture(*mv))
            .collect()
    }

    /// 是否为合法走法
    pub fn is_legal(&self, mv: ChessMove) -> bool {
        self.board.legal(mv)
    }

    /// 解析 UCI 格式走法（如 `e2e4`、`e7e8q`），只接受合法走法
    pub fn parse_uci(&self, uci: &str) -> Result<ChessMove> {
        let uci = uci.trim().to_ascii_lowercase();
        MoveGen::new_legal(&self.board)
            .find(|mv| mv.to_string() == uci)
            .ok_or(ChessError::InvalidMove { uci })
    }

    /// 走动的棋子
    pub fn moving_piece(&self, mv: ChessMove) -> Option<Piece> {
        self.board.piece_on(mv.get_source())
    }

    /// 是否为吃过路兵
    pub fn is_en_passant(&self, mv: ChessMove) -> bool {
        self.moving_piece(mv) == Some(Piece::Pawn)
            && mv.get_source().get_file() != mv.get_dest().get_file()
            && self.board.piece_on(mv.get_dest()).is_none()
    }

    /// 是否吃子
    pub fn is_capture(&self, mv: ChessMove) -> bool {
        self.board.piece_on(mv.get_dest()).is_some() || self.is_en_passant(mv)
    }

    /// 被吃掉的棋子
    pub fn captured_piece(&self, mv: ChessMove) -> Option<Piece> {
        match self.board.piece_on(mv.get_dest()) {
            Some(piece) => Some(piece),
            None if self.is_en_passant(mv) => Some(Piece::Pawn),
            None => None,
        }
    }

    /// 是否为王车易位
    pub fn is_castling(&self, mv: ChessMove) -> bool {
        self.moving_piece(mv) == Some(Piece::King)
            && mv
                .get_source()
                .get_file()
                .to_index()
                .abs_diff(mv.get_dest().get_file().to_index())
                == 2
    }

    // ---------------------------------------------------------------
    // 走子与撤销
    // ---------------------------------------------------------------

    /// 走一步合法走法
    pub fn apply(&mut self, mv: ChessMove) -> Result<()> {
        if !self.board.legal(mv) {
            return Err(ChessError::InvalidMove {
                uci: mv.to_string(),
            });
        }
        self.push_move(mv);
        Ok(())
    }

    /// 撤销最后一步，`mv` 必须与最后一步一致
    pub fn undo(&mut self, mv: ChessMove) -> Result<()> {
        let top = self.undo_stack.last().ok_or(ChessError::EmptyHistory)?;
        if top.ply != Ply::Move(mv) {
            let expected = match top.ply {
                Ply::Move(last) => last.to_string(),
                Ply::Null => "0000".to_string(),
            };
            return Err(ChessError::UnmatchedUndo {
                expected,
                actual: mv.to_string(),
            });
        }
        self.pop();
        Ok(())
    }

    /// 走一步并返回守卫，守卫离开作用域时撤销
    pub fn play(&mut self, mv: ChessMove) -> Result<Applied<'_>> {
        self.apply(mv)?;
        Ok(Applied { game: self })
    }

    /// 空着（只交换走子方），被将军时不可用
    pub fn play_null(&mut self) -> Result<Applied<'_>> {
        let next = self.board.null_move().ok_or(ChessError::NullMoveInCheck)?;
        let snapshot = self.snapshot(Ply::Null);
        self.undo_stack.push(snapshot);
        if self.board.side_to_move() == Color::Black {
            self.fullmove_number += 1;
        }
        self.board = next;
        self.halfmove_clock += 1;
        self.position_history.push(self.board.get_hash());
        Ok(Applied { game: self })
    }

    fn snapshot(&self, ply: Ply) -> Snapshot {
        Snapshot {
            board: self.board,
            ply,
            halfmove_clock: self.halfmove_clock,
            fullmove_number: self.fullmove_number,
        }
    }

    fn push_move(&mut self, mv: ChessMove) {
        let irreversible = self.moving_piece(mv) == Some(Piece::Pawn) || self.is_capture(mv);

        let snapshot = self.snapshot(Ply::Move(mv));
        self.undo_stack.push(snapshot);
        if self.board.side_to_move() == Color::Black {
            self.fullmove_number += 1;
        }
        self.board = self.board.make_move_new(mv);
        self.halfmove_clock = if irreversible {
            0
        } else {
            self.halfmove_clock + 1
        };
        self.position_history.push(self.board.get_hash());
    }

    fn pop(&mut self) -> Option<Ply> {
        let snapshot = self.undo_stack.pop()?;
        self.board = snapshot.board;
        self.halfmove_clock = snapshot.halfmove_clock;
        self.fullmove_number = snapshot.fullmove_number;
        self.position_history.pop();
        Some(snapshot.ply)
    }

    // ---------------------------------------------------------------
    // 局面查询
    // ---------------------------------------------------------------

    /// 指定格子上的棋子
    pub fn piece_at(&self, square: Square) -> Option<(Piece, Color)> {
        Some((self.board.piece_on(square)?, self.board.color_on(square)?))
    }

    /// 指定颜色、类型棋子所在的格子
    pub fn occupied_squares(&self, piece: Piece, color: Color) -> BitBoard {
        *self.board.pieces(piece) & *self.board.color_combined(color)
    }

    pub fn castle_rights(&self, color: Color) -> CastleRights {
        self.board.castle_rights(color)
    }

    /// 可吃过路兵的纵线
    pub fn en_passant_file(&self) -> Option<File> {
        self.board.en_passant().map(|sq| sq.get_file())
    }

    pub fn is_in_check(&self) -> bool {
        *self.board.checkers() != EMPTY
    }

    pub fn is_checkmate(&self) -> bool {
        self.board.status() == BoardStatus::Checkmate
    }

    pub fn is_stalemate(&self) -> bool {
        self.board.status() == BoardStatus::Stalemate
    }

    /// 双方都无法将死对方
    ///
    /// 只剩王；王加一个轻子对王；或者只剩象且所有象同色格。
    pub fn has_insufficient_material(&self) -> bool {
        let heavy = *self.board.pieces(Piece::Pawn)
            | *self.board.pieces(Piece::Rook)
            | *self.board.pieces(Piece::Queen);
        if heavy != EMPTY {
            return false;
        }

        let knights = *self.board.pieces(Piece::Knight);
        let bishops = *self.board.pieces(Piece::Bishop);
        if (knights | bishops).popcnt() <= 1 {
            return true;
        }
        if knights != EMPTY {
            return false;
        }

        let light = bishops.filter(|sq| is_light_square(*sq)).count() as u32;
        light == 0 || light == bishops.popcnt()
    }

    /// 五十回合规则（可申请和棋）
    pub fn is_fifty_moves(&self) -> bool {
        self.halfmove_clock >= 100
    }

    /// 七十五回合规则（自动和棋）
    pub fn is_seventyfive_moves(&self) -> bool {
        self.halfmove_clock >= 150
    }

    fn repetitions(&self) -> usize {
        let Some(current) = self.position_history.last() else {
            return 0;
        };
        // 不可逆走法之前的局面不可能再次出现
        self.position_history
            .iter()
            .rev()
            .take(self.halfmove_clock as usize + 1)
            .filter(|hash| *hash == current)
            .count()
    }

    /// 三次重复（可申请和棋）
    pub fn is_threefold_repetition(&self) -> bool {
        self.repetitions() >= 3
    }

    /// 五次重复（自动和棋）
    pub fn is_fivefold_repetition(&self) -> bool {
        self.repetitions() >= 5
    }

    /// 对局结果，未结束时返回 `None`
    pub fn outcome(&self, claim_draw: bool) -> Option<GameResult> {
        match self.board.status() {
            BoardStatus::Checkmate => {
                return Some(match self.side_to_move() {
                    Color::White => GameResult::BlackWin(WinReason::Checkmate),
                    Color::Black => GameResult::WhiteWin(WinReason::Checkmate),
                })
            }
            BoardStatus::Stalemate => return Some(GameResult::Draw(DrawReason::Stalemate)),
            BoardStatus::Ongoing => {}
        }

        if self.has_insufficient_material() {
            return Some(GameResult::Draw(DrawReason::InsufficientMaterial));
        }
        if self.is_seventyfive_moves() {
            return Some(GameResult::Draw(DrawReason::SeventyFiveMoves));
        }
        if self.is_fivefold_repetition() {
            return Some(GameResult::Draw(DrawReason::FivefoldRepetition));
        }
        if claim_draw {
            if self.is_fifty_moves() {
                return Some(GameResult::Draw(DrawReason::FiftyMoves));
            }
            if self.is_threefold_repetition() {
                return Some(GameResult::Draw(DrawReason::ThreefoldRepetition));
            }
        }
        None
    }

    pub fn is_game_over(&self, claim_draw: bool) -> bool {
        self.outcome(claim_draw).is_some()
    }

    /// PGN 结果字符串
    pub fn result(&self, claim_draw: bool) -> &'static str {
        self.outcome(claim_draw)
            .map(|outcome| outcome.pgn_result())
            .unwrap_or("*")
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Game")
            .field("fen", &self.to_fen())
            .field("ply", &self.ply())
            .finish()
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in (0..8).rev() {
            for file in 0..8 {
                let sq = Square::make_square(Rank::from_index(rank), File::from_index(file));
                let c = match self.piece_at(sq) {
                    Some((piece, color)) => piece_char(piece, color),
                    None => '.',
                };
                if file > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{}", c)?;
            }
            if rank > 0 {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

#[inline]
fn is_light_square(sq: Square) -> bool {
    (sq.get_rank().to_index() + sq.get_file().to_index()) % 2 == 1
}

/// 已走一步的局面
///
/// 持有 `Game` 的独占借用，析构时撤销恰好一步，正常返回、剪枝提前返回
/// 与 `?` 传播错误都会经过这里。
pub struct Applied<'a> {
    game: &'a mut Game,
}

impl Deref for Applied<'_> {
    type Target = Game;

    fn deref(&self) -> &Game {
        self.game
    }
}

impl DerefMut for Applied<'_> {
    fn deref_mut(&mut self) -> &mut Game {
        self.game
    }
}

impl Drop for Applied<'_> {
    fn drop(&mut self) {
        self.game.pop();
    }
}
