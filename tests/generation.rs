//! Level generation through the public pipeline.

use catacomb::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

#[test]
fn test_grid_and_bsp_levels_are_fully_connected() {
    let policies = [
        PartitionPolicy::Grid { rows: 3, cols: 4 },
        PartitionPolicy::Bsp {
            min_width: 10,
            min_height: 7,
        },
    ];
    for policy in policies {
        for seed in 0..5 {
            let config = GenerationConfig {
                partition: policy,
                ..GenerationConfig::new(seed)
            };
            let level = LevelGenerator::from_config(&config)
                .generate_level(0, &config, &mut StdRng::seed_from_u64(seed))
                .unwrap();
            assert!(level.is_fully_connected(), "{:?} seed {}", policy, seed);
            assert_eq!(level.creatures().len(), config.creature_count);
        }
    }
}

#[test]
fn test_pipeline_stages_compose() {
    let mut rng = StdRng::seed_from_u64(31);
    let mut level = Level::new(30, 20, TileId::FLOOR_ROCK, TileId::WALL_GROUND);

    let mut sections = GridPartitioner::new(2, 3).partition(&level, &mut rng).unwrap();
    assert_eq!(sections.len(), 6);
    RandomConnector::new()
        .connect_sections(&mut sections, Some(4), &mut rng)
        .unwrap();
    assert!(is_connected(&sections));

    for section in sections.iter_mut() {
        SquareRoomGenerator::new(3)
            .generate_room(&mut level, section, &mut rng)
            .unwrap();
    }
    let corridors = CorridorGenerator::new(TileId::WALL_EMPTY);
    for section in sections.iter() {
        for connection in &section.connections {
            let doorway = section.room_connection(connection.direction).unwrap();
            corridors.carve(&mut level, doorway, connection);
            assert!(!level.blocks_movement(connection.location));
        }
    }
    standard_decorator().decorate_level(&mut level);

    assert!(level.is_fully_connected());
    assert!(level
        .positions()
        .all(|p| level.wall_at(p) != Some(TileId::WALL_GROUND)));
}

#[test]
fn test_factory_serves_registered_generators_only() {
    let config = GenerationConfig::for_testing(8);
    let mut factory = LevelGeneratorFactory::new();
    factory.add_generator(
        "open",
        LevelConfiguration::new()
            .with_partitioners(vec![Box::new(GridPartitioner::new(1, 1))])
            .with_rooms(vec![Box::new(SquareRoomGenerator::new(5))])
            .with_level_size(12, 12)
            .build(),
    );

    let level = factory
        .generate_level("open", 4, &config, &mut StdRng::seed_from_u64(8))
        .unwrap();
    assert_eq!(level.id, 4);
    assert_eq!(level.width(), 12);

    let missing = factory.generate_level("swamp", 5, &config, &mut StdRng::seed_from_u64(8));
    assert!(matches!(missing, Err(CatacombError::Configuration(_))));
}

#[test]
fn test_dungeon_has_exit_and_skull() {
    let config = GenerationConfig::for_testing(3);
    let generator = DungeonGenerator::new(2);
    let state = generator
        .generate(&config, &mut StdRng::seed_from_u64(3))
        .unwrap();

    generator.validate(&state, &config).unwrap();
    assert_eq!(generator.generator_type(), "DungeonGenerator");
    let exits: usize = state
        .levels
        .values()
        .map(|l| l.portals().iter().filter(|p| p.exits_dungeon).count())
        .sum();
    assert_eq!(exits, 1);
    assert!(state.levels[&1]
        .items()
        .iter()
        .any(|i| i.name == VICTORY_ITEM));
}
