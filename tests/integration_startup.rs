//! Integration test to ensure a run can start up without errors.

use delve::{
    AsciiDisplay, ConfigError, DelveError, DelveResult, DungeonAlgorithm, GameConfig, GameState,
    GenerationConfig, PlayerAction,
};
use std::io::Write;

fn small_config(seed: u64) -> GameConfig {
    GameConfig {
        seed,
        generation: GenerationConfig::for_testing(),
        ..GameConfig::default()
    }
}

#[test]
fn test_basic_startup() -> DelveResult<()> {
    let state = GameState::new(&GameConfig::with_seed(12345))?;
    let map = state.current_map()?;

    assert_eq!(state.turn_number, 0);
    assert!(state.world.entities.contains(state.player_id));
    assert!(map.is_walkable(state.player_position()?));
    assert_eq!(state.player_hp(), Some(30));
    assert!(state.inventory().is_empty());
    Ok(())
}

#[test]
fn test_both_algorithms_start() -> DelveResult<()> {
    for algorithm in [DungeonAlgorithm::Bsp, DungeonAlgorithm::Tunneling] {
        let mut config = small_config(8);
        config.generation.algorithm = algorithm;
        let mut state = GameState::new(&config)?;
        for _ in 0..5 {
            if !state.player_dead {
                state.perform(PlayerAction::Wait)?;
            }
        }
        let screen = AsciiDisplay::new().render(&state)?;
        assert!(screen.contains('@'));
    }
    Ok(())
}

#[test]
fn test_starting_potion_can_be_picked_up() -> DelveResult<()> {
    let mut state = GameState::new(&small_config(21))?;
    let start = state.player_position()?;
    if !state.current_map()?.is_walkable(start + delve::Direction::East) {
        return Ok(());
    }
    let moved = state.perform(PlayerAction::Move(delve::Direction::East))?;
    if moved && state.player_position()? != start {
        assert!(state.perform(PlayerAction::PickUp)?);
        assert_eq!(state.inventory().len(), 1);
        assert_eq!(state.statistics.items_collected, 1);
    }
    Ok(())
}

#[test]
fn test_config_file_round() -> DelveResult<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    write!(
        file,
        r#"{{ "seed": 99, "fov_radius": 4, "generation": {{ "width": 40, "height": 30, "algorithm": "tunneling" }}, "ai": {{ "wander_chance": 0.5 }} }}"#
    )?;

    let config = GameConfig::from_path(file.path())?;
    assert_eq!(config.seed, 99);
    assert_eq!(config.fov_radius, 4);
    assert_eq!(config.generation.algorithm, DungeonAlgorithm::Tunneling);
    assert_eq!(config.generation.bsp_depth, 7);
    assert!((config.ai.wander_chance - 0.5).abs() < f64::EPSILON);
    assert!((config.ai.heading_weight - 2.5).abs() < f64::EPSILON);

    let state = GameState::new(&config)?;
    assert_eq!(state.fov_radius, 4);
    Ok(())
}

#[test]
fn test_missing_files_are_io_errors() {
    assert!(matches!(
        GameConfig::from_path("/definitely/not/here.json"),
        Err(DelveError::Io(_))
    ));

    let config = GameConfig {
        content_path: Some("/definitely/not/content.json".into()),
        ..small_config(1)
    };
    assert!(matches!(GameState::new(&config), Err(DelveError::Io(_))));
}

#[test]
fn test_custom_content_pack() -> DelveResult<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    write!(
        file,
        r#"{{
            "entities": [
                {{ "name": "player", "avatar": "@", "can": ["health:HP:10", "combat:DAMAGE:1:DEFENSE:0:ACCURACY:50", "inventory"] }},
                {{ "name": "stairs_up", "avatar": "<", "layer": "floor" }},
                {{ "name": "stairs_down", "avatar": ">", "layer": "floor" }},
                {{ "name": "door", "avatar": "+", "layer": "floor", "can": ["door"] }}
            ],
            "floors": [ {{ "monsters": {{}} }} ]
        }}"#
    )?;

    let config = GameConfig {
        content_path: Some(file.path().to_path_buf()),
        ..small_config(3)
    };
    let state = GameState::new(&config)?;
    assert_eq!(state.player_hp(), Some(10));
    assert!(state
        .world
        .entities
        .ids_with(delve::ComponentKind::MonsterAi)
        .is_empty());
    Ok(())
}

#[test]
fn test_level_without_floor_table() {
    let config = GameConfig {
        level: 9,
        ..small_config(1)
    };
    assert!(matches!(
        GameState::new(&config),
        Err(DelveError::Config(ConfigError::MissingFloor(9)))
    ));
}

#[test]
fn test_out_of_range_settings_are_config_errors() {
    let rejected = [
        (r#"{ "generation": { "door_chance": 2.0 } }"#, "generation.door_chance"),
        (
            r#"{ "generation": { "algorithm": "tunneling", "tunnel_min_room_size": 9, "tunnel_max_room_size": 5 } }"#,
            "generation.tunnel_max_room_size",
        ),
        (r#"{ "generation": { "prefab_chance": 1.01 } }"#, "generation.prefab_chance"),
        (
            r#"{ "generation": { "horizontal_first_chance": -1 } }"#,
            "generation.horizontal_first_chance",
        ),
        (r#"{ "ai": { "wander_chance": 7 } }"#, "ai.wander_chance"),
        (r#"{ "ai": { "heading_weight": 0 } }"#, "ai.heading_weight"),
    ];
    for (json, field) in rejected {
        match GameConfig::from_json_str(json) {
            Err(DelveError::Config(ConfigError::InvalidValue { attribute, .. })) => {
                assert_eq!(attribute, field)
            }
            other => panic!("{} was accepted: {:?}", json, other),
        }
    }
}

#[test]
fn test_state_refuses_an_unchecked_config() {
    let mut config = small_config(4);
    config.generation.algorithm = DungeonAlgorithm::Tunneling;
    config.generation.tunnel_min_room_size = 9;
    config.generation.tunnel_max_room_size = 5;
    assert!(matches!(
        GameState::new(&config),
        Err(DelveError::Config(ConfigError::InvalidValue { .. }))
    ));
}
