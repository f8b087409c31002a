mod common;

use common::*;
use rush_core::{AnswerOutcome, GameSession, ReadyOutcome, TimeoutOutcome};
use rush_types::{GameState, Ident, PlayerState};

fn current_id(session: &GameSession) -> Ident {
    session.game.current_player_id().unwrap().clone()
}

fn playing_fields(session: &GameSession) -> (String, i64, f64) {
    match &session.game.state {
        GameState::Playing {
            current_fragment,
            turn,
            difficulty,
            ..
        } => (current_fragment.clone(), *turn, *difficulty),
        other => panic!("not playing: {other:?}"),
    }
}

// Scenario A: two players ready up and the game reaches the playing state
// with a current player and a non-empty fragment.
#[test]
fn test_two_players_reach_playing() {
    let mut session = create_lobby(&["p1", "p2"]);
    assert_eq!(session.mark_ready(&Ident::from("p1")), ReadyOutcome::Updated);
    assert_eq!(session.mark_ready(&Ident::from("p2")), ReadyOutcome::AllReady);
    assert!(matches!(session.game.state, GameState::Starting));

    let schedule = session
        .start_playing(&create_test_table(), &mut create_test_rng(1))
        .unwrap();
    let (fragment, turn, _) = playing_fields(&session);
    assert!(!fragment.is_empty());
    assert_eq!(turn, 0);
    assert_eq!(schedule.turn, 0);
    assert!(schedule.time_ms > 0);
    assert!(!session.game.solo);
    assert_eq!(&schedule.player, session.game.current_player_id().unwrap());
}

// Scenario B: a correct answer advances the turn to the other player with a
// fresh fragment and strictly higher difficulty.
#[test]
fn test_correct_answer_advances_turn() {
    let mut session = create_playing_session(&["p1", "p2"], 2);
    let dictionary = create_test_dictionary();
    let table = create_test_table();
    let mut rng = create_test_rng(3);

    let answering = current_id(&session);
    let (fragment, turn, difficulty) = playing_fields(&session);
    let outcome = session
        .submit_answer(
            &answering,
            word_for_fragment(&fragment),
            &dictionary,
            &table,
            &mut rng,
        )
        .unwrap();

    let AnswerOutcome::Correct(schedule) = outcome else {
        panic!("expected a correct answer, got {outcome:?}");
    };
    let (new_fragment, new_turn, new_difficulty) = playing_fields(&session);
    assert_ne!(new_fragment, fragment);
    assert_eq!(new_turn, turn + 1);
    assert!(new_difficulty > difficulty);
    assert_ne!(schedule.player, answering);
    assert_eq!(schedule.previous.as_ref(), Some(&answering));
}

#[test]
fn test_incorrect_answer_keeps_turn() {
    let mut session = create_playing_session(&["p1", "p2"], 4);
    let dictionary = create_test_dictionary();
    let table = create_test_table();
    let mut rng = create_test_rng(5);

    let answering = current_id(&session);
    let (_, turn, _) = playing_fields(&session);
    let outcome = session
        .submit_answer(&answering, "зззз", &dictionary, &table, &mut rng)
        .unwrap();
    assert_eq!(outcome, AnswerOutcome::Incorrect);

    let (_, unchanged_turn, _) = playing_fields(&session);
    assert_eq!(unchanged_turn, turn);
    assert_eq!(current_id(&session), answering);
    assert_eq!(session.game.players[&answering].incorrect_guesses, 1);
}

#[test]
fn test_answer_from_non_current_player_is_ignored() {
    let mut session = create_playing_session(&["p1", "p2"], 6);
    let dictionary = create_test_dictionary();
    let table = create_test_table();
    let mut rng = create_test_rng(7);

    let bystander = session
        .game
        .players
        .keys()
        .find(|id| **id != current_id(&session))
        .cloned()
        .unwrap();
    let (fragment, turn, _) = playing_fields(&session);
    let outcome = session
        .submit_answer(
            &bystander,
            word_for_fragment(&fragment),
            &dictionary,
            &table,
            &mut rng,
        )
        .unwrap();
    assert_eq!(outcome, AnswerOutcome::Ignored);
    let (_, unchanged_turn, _) = playing_fields(&session);
    assert_eq!(unchanged_turn, turn);
    assert_eq!(session.game.players[&bystander].incorrect_guesses, 0);
}

// Scenario C: a live timeout costs exactly one hp and the game carries on.
#[test]
fn test_timeout_decrements_hp_and_continues() {
    let mut session = create_playing_session(&["p1", "p2"], 8);
    let table = create_test_table();
    let mut rng = create_test_rng(9);

    let timed_out = current_id(&session);
    let (_, turn, _) = playing_fields(&session);
    let hp_before = session.game.players[&timed_out].hp;

    let outcome = session.handle_timeout(turn, &table, &mut rng).unwrap();
    let TimeoutOutcome::Continued(schedule) = outcome else {
        panic!("expected the game to continue, got {outcome:?}");
    };
    assert_eq!(session.game.players[&timed_out].hp, hp_before - 1);
    assert_eq!(schedule.turn, turn + 1);
    assert_ne!(schedule.player, timed_out);
}

// A stale timer, superseded by an early correct answer, must change nothing.
#[test]
fn test_stale_timer_is_a_no_op() {
    let mut session = create_playing_session(&["p1", "p2"], 10);
    let dictionary = create_test_dictionary();
    let table = create_test_table();
    let mut rng = create_test_rng(11);

    let answering = current_id(&session);
    let (fragment, stale_turn, _) = playing_fields(&session);
    session
        .submit_answer(
            &answering,
            word_for_fragment(&fragment),
            &dictionary,
            &table,
            &mut rng,
        )
        .unwrap();

    let hp_before: Vec<_> = session.game.players.values().map(|p| p.hp).collect();
    let (_, turn_before, _) = playing_fields(&session);

    let outcome = session
        .handle_timeout(stale_turn, &table, &mut rng)
        .unwrap();
    assert_eq!(outcome, TimeoutOutcome::Stale);

    let hp_after: Vec<_> = session.game.players.values().map(|p| p.hp).collect();
    let (_, turn_after, _) = playing_fields(&session);
    assert_eq!(hp_before, hp_after);
    assert_eq!(turn_before, turn_after);
}

// Scenario D: the last opponent dying hands the win to the survivor and no
// further turns are scheduled.
#[test]
fn test_last_survivor_wins() {
    let mut session = create_playing_session(&["p1", "p2"], 12);
    let table = create_test_table();
    let mut rng = create_test_rng(13);

    let doomed = current_id(&session);
    let survivor = session
        .game
        .players
        .keys()
        .find(|id| **id != doomed)
        .cloned()
        .unwrap();
    session.game.players.get_mut(&doomed).unwrap().hp = 1;

    let (_, turn, _) = playing_fields(&session);
    let outcome = session.handle_timeout(turn, &table, &mut rng).unwrap();
    assert_eq!(outcome, TimeoutOutcome::Won(survivor.clone()));
    assert!(matches!(
        &session.game.state,
        GameState::Winning { winner } if *winner == survivor
    ));
    assert_eq!(session.game.players[&doomed].state, PlayerState::Dead);

    // A leftover timer for the final turn finds the game over and stands down.
    let outcome = session.handle_timeout(turn, &table, &mut rng).unwrap();
    assert_eq!(outcome, TimeoutOutcome::Stale);
}

#[test]
fn test_solo_defeat_halts_without_winner() {
    let mut session = create_playing_session(&["p1"], 14);
    let table = create_test_table();
    let mut rng = create_test_rng(15);
    assert!(session.game.solo);

    let id = Ident::from("p1");
    for _ in 0..3 {
        let (_, turn, _) = playing_fields(&session);
        let outcome = session.handle_timeout(turn, &table, &mut rng).unwrap();
        if session.game.players[&id].hp == 0 {
            assert_eq!(outcome, TimeoutOutcome::Halted);
        } else {
            assert!(matches!(outcome, TimeoutOutcome::Continued(_)));
        }
    }
    assert_eq!(session.game.players[&id].hp, 0);
    assert_eq!(session.game.players[&id].state, PlayerState::Dead);
    // Still in the playing state: solo games never transition to winning.
    assert!(matches!(session.game.state, GameState::Playing { .. }));
}

// hp never increases over a game's lifetime, whatever mix of answers and
// timeouts occurs.
#[test]
fn test_hp_is_monotonically_non_increasing() {
    let mut session = create_playing_session(&["p1", "p2", "p3"], 16);
    let dictionary = create_test_dictionary();
    let table = create_test_table();
    let mut rng = create_test_rng(17);

    let mut hp_floor: std::collections::HashMap<Ident, u8> = session
        .game
        .players
        .iter()
        .map(|(id, p)| (id.clone(), p.hp))
        .collect();

    for step in 0..24 {
        if !matches!(session.game.state, GameState::Playing { .. }) {
            break;
        }
        let current = current_id(&session);
        let (fragment, turn, _) = playing_fields(&session);
        if step % 3 == 0 {
            session
                .submit_answer(
                    &current,
                    word_for_fragment(&fragment),
                    &dictionary,
                    &table,
                    &mut rng,
                )
                .unwrap();
        } else {
            session.handle_timeout(turn, &table, &mut rng).unwrap();
        }
        for (id, player) in &session.game.players {
            let floor = hp_floor.get_mut(id).unwrap();
            assert!(player.hp <= *floor);
            *floor = player.hp;
        }
    }
}
