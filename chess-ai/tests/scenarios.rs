//! 端到端对局场景

use chess_ai::{AiConfig, AiEngine, AiError, Difficulty, MoveSource, MATE_SCORE};
use rules::{DrawReason, Game, GameResult};

fn engine_without_book(depth: u8) -> AiEngine {
    AiEngine::new(AiConfig {
        max_depth: depth,
        time_limit_ms: None,
        use_opening_book: false,
        seed: Some(0),
        ..AiConfig::default()
    })
}

#[test]
fn test_opening_move_is_principled() {
    let mut game = Game::new();
    let mut engine = engine_without_book(3);
    let mv = engine.choose_move(&mut game, 3).unwrap();
    assert!(
        ["e2e4", "d2d4", "c2c4", "g1f3", "b1c3"].contains(&mv.to_string().as_str()),
        "开局走法不合理: {}",
        mv
    );
    assert_eq!(game.ply(), 0);
}

#[test]
fn test_finds_back_rank_mate() {
    let mut game = Game::from_fen("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1").unwrap();
    let mut engine = engine_without_book(2);
    let outcome = engine.think(&mut game).unwrap();
    assert_eq!(outcome.best_move.to_string(), "a1a8");
    assert_eq!(outcome.score, MATE_SCORE);

    game.apply(outcome.best_move).unwrap();
    assert!(game.is_checkmate());
    assert_eq!(game.result(false), "1-0");
}

#[test]
fn test_stalemated_side_has_no_move() {
    let mut game = Game::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
    assert_eq!(
        game.outcome(false),
        Some(GameResult::Draw(DrawReason::Stalemate))
    );

    let mut engine = engine_without_book(3);
    assert!(matches!(
        engine.think(&mut game),
        Err(AiError::NoLegalMoves { .. })
    ));
}

#[test]
fn test_avoids_stalemating_when_winning() {
    // 白后多子，Qf7 逼和，其余走法保持优势
    let mut game = Game::from_fen("7k/8/6K1/5Q2/8/8/8/8 w - - 0 1").unwrap();
    let mut engine = engine_without_book(3);
    let outcome = engine.think(&mut game).unwrap();
    assert_ne!(outcome.best_move.to_string(), "f5f7");
    assert!(outcome.score > 0);
}

#[test]
fn test_self_play_with_book() {
    let mut game = Game::new();
    let mut engine = AiEngine::new(AiConfig {
        max_depth: 2,
        time_limit_ms: None,
        seed: Some(11),
        ..AiConfig::from_difficulty(Difficulty::Medium)
    });

    let mut sources = Vec::new();
    for _ in 0..6 {
        if game.is_game_over(true) {
            break;
        }
        let outcome = engine.think(&mut game).unwrap();
        sources.push(outcome.source);
        game.apply(outcome.best_move).unwrap();
    }

    assert_eq!(sources[0], MoveSource::Book);
    assert!(sources.contains(&MoveSource::Search));
    assert_eq!(game.ply(), sources.len());
}
