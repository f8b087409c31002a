use rand::SeedableRng;
use rand::rngs::StdRng;

use rush_core::{Dictionary, FragmentTable, GameSession};
use rush_types::{Ident, Player, PlayerProfile};

/// Word list with at least one word per test fragment.
pub fn create_test_dictionary() -> Dictionary {
    Dictionary::new("стол\nпример\nкот\nвывод\nмост\nслово")
}

pub fn create_test_table() -> FragmentTable {
    FragmentTable::from_json(
        r#"{"2": {"_total": 1000, "ст": 400, "пр": 300, "ко": 200, "вы": 100}}"#,
    )
    .unwrap()
}

/// A dictionary word containing the given fragment.
pub fn word_for_fragment(fragment: &str) -> &'static str {
    match fragment {
        "ст" => "стол",
        "пр" => "пример",
        "ко" => "кот",
        "вы" => "вывод",
        other => panic!("no test word for fragment {other:?}"),
    }
}

pub fn create_test_player(id: &str) -> Player {
    Player::new(
        Ident::from(id),
        PlayerProfile::sanitized(Some(id.to_string()), None, "/rpfp/"),
    )
}

pub fn create_test_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// A lobby session with the given players, none ready yet.
pub fn create_lobby(ids: &[&str]) -> GameSession {
    let mut session = GameSession::new(
        Ident::from("aaaa0000"),
        "c0de42".to_string(),
        create_test_player(ids[0]),
    );
    for id in &ids[1..] {
        session.add_player(create_test_player(id));
    }
    session
}

/// A session already in the playing state.
pub fn create_playing_session(ids: &[&str], seed: u64) -> GameSession {
    let mut session = create_lobby(ids);
    for id in ids {
        session.mark_ready(&Ident::from(*id));
    }
    session
        .start_playing(&create_test_table(), &mut create_test_rng(seed))
        .unwrap();
    session
}
