//! End-to-end turns through the public API: intents go through the action
//! factory, time goes through the scheduler.

use catacomb::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::rc::Rc;

fn factory() -> ActionFactory {
    ActionFactory::with_defaults(Rc::new(EffectsFactory::with_defaults()))
}

fn rng() -> StdRng {
    StdRng::seed_from_u64(2024)
}

#[test]
fn test_killed_monster_drops_everything() {
    let player = CharacterBuilder::new().with_name("player").build();
    let player_id = player.id;
    let goblin = CharacterBuilder::new()
        .with_name("goblin")
        .with_hit_points(2)
        .with_item(ItemBuilder::new().with_name("coin").build())
        .with_weapon(
            ItemBuilder::new()
                .with_name("dagger")
                .with_damage(Dice::new(1, 4), DamageType::Piercing)
                .build(),
        )
        .build();
    let goblin_id = goblin.id;
    let level = LevelBuilder::new()
        .with_character(player, Position::new(5, 5))
        .with_character(goblin, Position::new(6, 5))
        .build()
        .unwrap();
    let mut state = GameState::with_level(level);
    state.set_player(player_id);

    let events = factory()
        .perform(
            ActionParameters::Attack {
                attacker: player_id,
                direction: Direction::East,
                rolls: RollQueue::from(vec![20, 3]),
            },
            &mut state,
            &mut rng(),
        )
        .unwrap()
        .unwrap();

    assert!(events.iter().any(|e| e.event_type() == "death"));
    assert!(state.character(goblin_id).is_none());
    let level = state.level(0).unwrap();
    assert!(level.creature_at(Position::new(6, 5)).is_none());
    let mut dropped: Vec<&str> = level
        .items_at(Position::new(6, 5))
        .iter()
        .map(|i| i.name.as_str())
        .collect();
    dropped.sort_unstable();
    assert_eq!(dropped, vec!["coin", "dagger"]);
    assert_eq!(state.statistics.creatures_killed, 1);
    assert!(!state.is_game_ended());
}

#[test]
fn test_healing_potion_is_used_up() {
    let potion = ItemBuilder::new()
        .with_name("healing potion")
        .with_effect(EffectHandle::new(Trigger::OnDrink, "major heal").with_charges(1))
        .build();
    let potion_id = potion.id;
    let player = CharacterBuilder::new()
        .with_hit_points(1)
        .with_max_hp(20)
        .with_item(potion)
        .build();
    let player_id = player.id;
    let level = LevelBuilder::new()
        .with_character(player, Position::new(2, 2))
        .build()
        .unwrap();
    let mut state = GameState::with_level(level);
    let factory = factory();

    let drink = ActionParameters::Drink {
        character: player_id,
        item: potion_id,
    };
    assert!(factory.perform(drink.clone(), &mut state, &mut rng()).unwrap().is_some());

    let player = state.character(player_id).unwrap();
    assert_eq!(player.hit_points(), 11);
    assert!(!player.inventory.contains(potion_id));
    assert!(factory.perform(drink, &mut state, &mut rng()).unwrap().is_none());
}

#[test]
fn test_spider_poison_runs_its_course() {
    let spider = standard_creature_prototypes()
        .into_iter()
        .find(|c| c.name == "spider")
        .unwrap()
        .instantiate();
    let spider_id = spider.id;
    let player = CharacterBuilder::new()
        .with_hit_points(50)
        .with_max_hp(50)
        .build();
    let player_id = player.id;
    let level = LevelBuilder::new()
        .with_character(spider, Position::new(5, 5))
        .with_character(player, Position::new(6, 5))
        .build()
        .unwrap();
    let mut state = GameState::with_level(level);
    state.set_player(player_id);

    factory()
        .perform(
            ActionParameters::Attack {
                attacker: spider_id,
                direction: Direction::East,
                rolls: RollQueue::from(vec![20, 1]),
            },
            &mut state,
            &mut rng(),
        )
        .unwrap()
        .unwrap();
    let player = state.character(player_id).unwrap();
    assert_eq!(player.hit_points(), 49);
    assert!(player.has_effect_type(EffectType::Poison));

    // Poison deals 5 every third round for twelve rounds
    for _ in 0..12 {
        advance_time(&mut state, 0).unwrap();
    }
    let player = state.character(player_id).unwrap();
    assert_eq!(player.hit_points(), 29);
    assert!(!player.has_effect_type(EffectType::Poison));
    assert!(state
        .event_log
        .iter()
        .any(|e| e.event_type() == "effect removed"));
}

#[test]
fn test_escaping_with_the_skull_is_a_victory() {
    let player = CharacterBuilder::new().with_item(crystal_skull()).build();
    let player_id = player.id;
    let mut level = LevelBuilder::new()
        .with_character(player, Position::new(3, 3))
        .build()
        .unwrap();
    level.add_portal(Portal::exit(), Position::new(3, 3), None);
    let mut state = GameState::with_level(level);
    state.set_player(player_id);

    factory()
        .perform(
            ActionParameters::Escape {
                character: player_id,
            },
            &mut state,
            &mut rng(),
        )
        .unwrap()
        .unwrap();

    assert!(state.is_game_ended());
    assert_eq!(state.check_result(), GameResult::Victory);
}

#[test]
fn test_stairs_lead_to_the_next_level() {
    let config = GenerationConfig::for_testing(77);
    let mut rng = StdRng::seed_from_u64(77);
    let mut state = DungeonGenerator::new(2).generate(&config, &mut rng).unwrap();

    let stairs = state.levels[&0]
        .portals()
        .iter()
        .find(|p| p.icon == TileId::PORTAL_STAIRS_DOWN)
        .cloned()
        .unwrap();
    let link = stairs.other_end.unwrap();
    // Clear both ends of the stairs
    for (level, location) in [(0, stairs.location), (link.level, link.location)] {
        let level = state.level_mut(level).unwrap();
        if let Some(id) = level.creature_id_at(location) {
            level.remove_creature(id);
        }
    }
    let player = CharacterBuilder::new().with_name("player").build();
    let player_id = player.id;
    state
        .level_mut(0)
        .unwrap()
        .add_creature(player, stairs.location)
        .unwrap();
    state.set_player(player_id);

    factory()
        .perform(
            ActionParameters::Move {
                character: player_id,
                direction: Direction::Enter,
            },
            &mut state,
            &mut rng,
        )
        .unwrap()
        .unwrap();

    assert_eq!(state.locate_character(player_id), Some(1));
    assert_eq!(state.player().unwrap().location, link.location);
    assert_eq!(state.statistics.levels_visited, 1);
}

#[test]
fn test_scheduler_drives_a_generated_level() {
    let config = GenerationConfig::for_testing(5);
    let mut rng = StdRng::seed_from_u64(5);
    let level = LevelGenerator::from_config(&config)
        .generate_level(0, &config, &mut rng)
        .unwrap();
    let mut state = GameState::with_level(level);
    let factory = factory();

    let mut acted = std::collections::HashSet::new();
    for _ in 0..50 {
        let actor = get_next_actor(&mut state, 0).unwrap();
        acted.insert(actor);
        let waited = factory
            .perform(ActionParameters::Wait { character: actor }, &mut state, &mut rng)
            .unwrap();
        assert!(waited.is_some());
    }

    assert_eq!(acted.len(), config.creature_count);
    assert!(state.turn_number > 0);
}
