//! Save store behaviour on a real filesystem.

use std::fs;

use chrono::{TimeZone, Utc};

use aggravation::board::BoardTopology;
use aggravation::core::{Coordinate, GameConfig, GameState, MarbleSelector, MarbleState, PlayerId};
use aggravation::persist::{PersistenceError, SaveDocument, SaveStore};
use aggravation::rules::GameEngine;

fn p(id: u8) -> PlayerId {
    PlayerId::new(id)
}

fn store() -> (tempfile::TempDir, SaveStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = SaveStore::new(dir.path().join("saves")).unwrap();
    (dir, store)
}

fn opening(players: usize) -> GameEngine {
    let mut engine = GameEngine::new(GameConfig::new(players).with_seed(17)).unwrap();
    engine.apply_roll(6).unwrap();
    engine.execute_move(p(1), MarbleSelector::ExitPen, 6).unwrap();
    engine
}

#[test]
fn test_store_creates_directory() {
    let (dir, store) = store();
    assert!(store.dir().is_dir());
    assert!(store.dir().starts_with(fs::canonicalize(dir.path()).unwrap()));
    assert!(store.list().unwrap().is_empty());
}

#[test]
fn test_save_load_delete() {
    let (_dir, store) = store();
    let engine = opening(3);

    let path = store.save(&engine, "first game").unwrap();
    assert_eq!(path, store.dir().join("first_game.json"));
    assert!(!store.dir().join("first_game.json.tmp").exists());

    let loaded = store.load("first_game.json").unwrap();
    assert_eq!(loaded.state(), engine.state());
    assert_eq!(loaded.current_player(), p(2));

    store.delete("first_game.json").unwrap();
    assert!(!path.exists());
    assert!(matches!(store.load(&path), Err(PersistenceError::NotFound(_))));
    assert!(matches!(store.delete(&path), Err(PersistenceError::NotFound(_))));
}

#[test]
fn test_hostile_names_stay_inside() {
    let (dir, store) = store();
    let engine = opening(2);

    let path = store.save(&engine, "../../outside").unwrap();
    assert_eq!(path.parent(), Some(store.dir()));
    assert!(!dir.path().join("outside.json").exists());

    let unnamed = store.save(&engine, "***").unwrap();
    assert_eq!(unnamed.parent(), Some(store.dir()));
    assert!(unnamed.file_name().unwrap().to_string_lossy().starts_with("save_"));
}

#[test]
fn test_paths_outside_are_refused() {
    let (dir, store) = store();
    let engine = opening(2);
    let outside = dir.path().join("victim.json");
    fs::write(&outside, "{}").unwrap();

    assert!(matches!(store.load(&outside), Err(PersistenceError::PathEscape(_))));
    assert!(matches!(store.load("../victim.json"), Err(PersistenceError::PathEscape(_))));
    assert!(matches!(store.delete("../victim.json"), Err(PersistenceError::PathEscape(_))));
    assert!(matches!(store.info(&outside), Err(PersistenceError::PathEscape(_))));
    assert!(matches!(
        store.save_to(&engine, "../victim.json", "x"),
        Err(PersistenceError::PathEscape(_))
    ));
    assert_eq!(fs::read_to_string(&outside).unwrap(), "{}");
}

#[test]
fn test_version_mismatch_is_reported() {
    let (_dir, store) = store();
    let path = store.save(&opening(2), "old").unwrap();

    let mut value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    value["version"] = serde_json::json!("2.0");
    fs::write(&path, value.to_string()).unwrap();

    match store.load(&path) {
        Err(PersistenceError::VersionMismatch { found, expected }) => {
            assert_eq!(found, "2.0");
            assert_eq!(expected, "1.0");
        }
        other => panic!("expected a version mismatch, got {other:?}"),
    }
}

#[test]
fn test_corrupt_files_are_rejected() {
    let (_dir, store) = store();
    fs::write(store.dir().join("garbage.json"), "not json").unwrap();
    assert!(matches!(store.load("garbage.json"), Err(PersistenceError::Corrupt(_))));

    // Seat 2 claims the cell seat 1 is standing on.
    let path = store.save(&opening(2), "tampered").unwrap();
    let mut value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    value["game_state"]["players"]["2"]["marbles"] = serde_json::json!([[19, 1], null, null, null]);
    value["game_state"]["players"]["2"]["home"] = serde_json::json!([[25, 3], [23, 4], [21, 5]]);
    fs::write(&path, value.to_string()).unwrap();
    assert!(matches!(store.load(&path), Err(PersistenceError::Corrupt(_))));
}

#[test]
fn test_list_newest_first() {
    let (_dir, store) = store();
    let engine = opening(4);

    for (name, day) in [("monday", 1), ("wednesday", 3), ("tuesday", 2)] {
        let at = Utc.with_ymd_and_hms(2024, 4, day, 20, 0, 0).unwrap();
        let json = SaveDocument::new(&engine, name, at).to_json().unwrap();
        fs::write(store.dir().join(format!("{name}.json")), json).unwrap();
    }
    fs::write(store.dir().join("broken.json"), "{").unwrap();
    fs::write(store.dir().join("notes.txt"), "ignored").unwrap();

    let saves = store.list().unwrap();
    let names: Vec<&str> = saves.iter().map(|info| info.name.as_str()).collect();
    assert_eq!(names, vec!["wednesday", "tuesday", "monday"]);

    let info = &saves[0];
    assert_eq!(info.path, store.dir().join("wednesday.json"));
    assert_eq!(info.version, "1.0");
    assert_eq!(info.num_players, 4);
    assert_eq!(info.current_player, 2);
}

#[test]
fn test_finished_game_round_trip() {
    let (_dir, store) = store();
    let config = GameConfig::new(2).with_seed(3);
    let topology = BoardTopology::from_config(&config).unwrap();
    let mut state = GameState::new(2);
    for (marble, slot) in [(0, 3), (1, 2), (2, 1)] {
        state.place_marble(&topology, p(1), marble, MarbleState::OnHomeLane(slot));
    }
    state.place_marble(&topology, p(1), 3, MarbleState::OnTrack(Coordinate::new(15, 1)));
    let mut engine = GameEngine::from_state(config, state).unwrap();
    engine.apply_roll(1).unwrap();
    engine.execute_move(p(1), MarbleSelector::MoveMarble(3), 1).unwrap();
    assert_eq!(engine.winner(), Some(p(1)));

    let path = store.save(&engine, "won").unwrap();
    let loaded = store.load(&path).unwrap();

    assert!(loaded.is_game_over());
    assert_eq!(loaded.winner(), Some(p(1)));
    assert_eq!(loaded.phase(), aggravation::rules::TurnPhase::Finished);
}

#[test]
fn test_same_name_keeps_both_saves() {
    let (_dir, store) = store();
    let engine = opening(2);

    let first = store.save(&engine, "rematch").unwrap();
    let second = store.save(&engine, "rematch").unwrap();
    let third = store.save(&engine, "rematch").unwrap();

    assert_eq!(first, store.dir().join("rematch.json"));
    assert_ne!(first, second);
    assert_ne!(second, third);
    for path in [&second, &third] {
        assert_eq!(path.parent(), Some(store.dir()));
        assert!(path.file_name().unwrap().to_string_lossy().starts_with("rematch_"));
    }
    assert_eq!(store.list().unwrap().len(), 3);
}

#[test]
fn test_unrecorded_win_is_corrupt() {
    let (_dir, store) = store();
    let path = store.save(&opening(2), "tampered").unwrap();

    let mut value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    let seat = &mut value["game_state"]["players"]["2"];
    seat["home"] = serde_json::json!([]);
    seat["marbles"] = serde_json::json!([[27, 8], [25, 8], [23, 8], [21, 8]]);
    seat["end_home"] = serde_json::json!([[27, 8], [25, 8], [23, 8], [21, 8]]);
    fs::write(&path, value.to_string()).unwrap();

    assert!(matches!(store.load(&path), Err(PersistenceError::Corrupt(_))));
}

#[cfg(unix)]
#[test]
fn test_symlinks_cannot_leave_the_store() {
    use std::os::unix::fs::symlink;

    let (dir, store) = store();
    let outside = dir.path().join("elsewhere");
    fs::create_dir(&outside).unwrap();
    let json = SaveDocument::new(&opening(2), "secret", Utc::now()).to_json().unwrap();
    let secret = outside.join("secret.json");
    fs::write(&secret, &json).unwrap();

    symlink(&outside, store.dir().join("link")).unwrap();
    symlink(&secret, store.dir().join("alias.json")).unwrap();
    symlink(outside.join("missing.json"), store.dir().join("dangling.json")).unwrap();

    for path in ["link/secret.json", "alias.json"] {
        assert!(matches!(store.load(path), Err(PersistenceError::PathEscape(_))));
        assert!(matches!(store.delete(path), Err(PersistenceError::PathEscape(_))));
        assert!(matches!(store.info(path), Err(PersistenceError::PathEscape(_))));
    }
    assert!(matches!(
        store.save_to(&opening(2), "dangling.json", "x"),
        Err(PersistenceError::PathEscape(_))
    ));

    assert!(secret.exists());
    assert!(!outside.join("missing.json").exists());
    assert!(store.list().unwrap().is_empty());
}
