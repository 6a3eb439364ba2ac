//! End-to-end game flows through the manager:
//! - create / join / state lifecycle
//! - move application with broadcast-visible effects
//! - matchmaking from queue to seated game
//! - clock bookkeeping across turns

use std::time::Duration;

use futures::channel::mpsc;

use minechess_server::game::error::GameError;
use minechess_server::models::{Color, MatchFoundEvent, PieceKind, Position, WsMove};
use minechess_server::service::GameManager;

fn wire_move(from: (i8, i8), to: (i8, i8)) -> WsMove {
    WsMove {
        from: Position::new(from.0, from.1),
        to: Position::new(to.0, to.1),
        promotion: None,
        mine: Position::new(0, 0),
    }
}

#[actix_web::test]
async fn full_game_lifecycle() {
    let manager = GameManager::new();
    let game_id = manager.create_game();

    assert_eq!(manager.join_game(&game_id, "alice"), Ok(Color::White));
    assert_eq!(manager.join_game(&game_id, "bob"), Ok(Color::Black));
    assert_eq!(
        manager.join_game(&game_id, "carol"),
        Err(GameError::GameFull)
    );

    // 1. e4 e5  2. Bc4 Nf6  3. Qh5 a6  4. Qxf7#
    let moves = [
        ((4, 6), (4, 4)),
        ((4, 1), (4, 3)),
        ((5, 7), (2, 4)),
        ((6, 0), (5, 2)),
        ((3, 7), (7, 3)),
        ((0, 1), (0, 2)),
        ((7, 3), (5, 1)),
    ];
    for (from, to) in moves {
        manager.make_move(&game_id, wire_move(from, to)).unwrap();
    }

    let state = manager.game_state(&game_id).unwrap();
    assert!(state.is_check);
    assert_eq!(state.resolve.as_deref(), Some("white wins by Checkmate"));
    assert_eq!(state.move_history.len(), 4);

    // Terminal games reject further moves.
    assert_eq!(
        manager.make_move(&game_id, wire_move((0, 2), (0, 3))),
        Err(GameError::GameOver)
    );
}

#[actix_web::test]
async fn snapshot_reflects_captures_and_clocks() {
    let manager = GameManager::new();
    let game_id = manager.create_game();
    manager.join_game(&game_id, "alice").unwrap();
    manager.join_game(&game_id, "bob").unwrap();

    manager.make_move(&game_id, wire_move((4, 6), (4, 4))).unwrap();
    manager.make_move(&game_id, wire_move((3, 1), (3, 3))).unwrap();
    manager.make_move(&game_id, wire_move((4, 4), (3, 3))).unwrap();

    let state = manager.game_state(&game_id).unwrap();
    assert_eq!(state.sound, "capture");
    assert_eq!(state.captured_pieces.white.len(), 1);
    assert_eq!(state.captured_pieces.white[0].kind, PieceKind::Pawn);
    assert_eq!(state.to_move, Color::Black);

    // Clocks tick in deciseconds from the 20-minute initial budget.
    assert!(state.players.white.time_left <= 12000);
    assert!(state.players.white.time_left > 11900);
    assert!(state.players.black.time_left <= 12000);
    assert!(state.players.black.time_left > 11900);
}

#[actix_web::test]
async fn matchmaking_pairs_and_notifies() {
    let manager = GameManager::new();

    let (tx1, mut rx1) = mpsc::channel(1);
    let (tx2, mut rx2) = mpsc::channel(1);
    manager.register_matchmaking_sink("alice", tx1);
    manager.register_matchmaking_sink("bob", tx2);

    manager.join_matchmaking("alice").unwrap();
    manager.join_matchmaking("bob").unwrap();
    manager.pair_waiting_players();

    let event1: MatchFoundEvent =
        serde_json::from_str(&rx1.try_next().unwrap().unwrap()).unwrap();
    let event2: MatchFoundEvent =
        serde_json::from_str(&rx2.try_next().unwrap().unwrap()).unwrap();
    assert_eq!(event1.color, "white");
    assert_eq!(event2.color, "black");
    assert_eq!(event1.game_id, event2.game_id);

    // The paired game is live: the matched players can move immediately.
    manager
        .make_move(&event1.game_id, wire_move((4, 6), (4, 4)))
        .unwrap();
    let state = manager.game_state(&event1.game_id).unwrap();
    assert_eq!(state.players.white.id, "alice");
    assert_eq!(state.players.black.id, "bob");
    assert_eq!(state.to_move, Color::Black);
}

#[actix_web::test]
async fn validation_errors_leave_state_untouched() {
    let manager = GameManager::new();
    let game_id = manager.create_game();
    manager.join_game(&game_id, "alice").unwrap();
    manager.join_game(&game_id, "bob").unwrap();

    let before = manager.game_state(&game_id).unwrap();
    assert_eq!(
        manager.make_move(&game_id, wire_move((4, 1), (4, 3))),
        Err(GameError::NotYourTurn)
    );
    assert_eq!(
        manager.make_move(&game_id, wire_move((4, 6), (4, 2))),
        Err(GameError::NotLegal)
    );
    let after = manager.game_state(&game_id).unwrap();
    assert_eq!(before, after);

    // A deadline watcher far in the future never fires during the test.
    manager.make_move(&game_id, wire_move((4, 6), (4, 4))).unwrap();
    actix_web::rt::time::sleep(Duration::from_millis(10)).await;
    assert!(manager.game_state(&game_id).unwrap().resolve.is_none());
}
