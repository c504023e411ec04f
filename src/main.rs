//! # Catacomb Main Entry Point
//!
//! Generates a level, drops a player and a handful of monsters into it and
//! lets them fight it out for a number of turns, then prints the map and the
//! event log.

use catacomb::{
    get_next_actor, ActionFactory, ActionParameters, CatacombError, CatacombResult,
    CharacterBuilder, Dice, DamageType, Direction, EffectsFactory, EntityId, GameState,
    GenerationConfig, ItemBuilder, LevelGenerator, LevelId, RollQueue,
};
use clap::Parser;
use log::{info, LevelFilter};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::rc::Rc;
use std::str::FromStr;

const LEVEL: LevelId = 0;

/// Command line arguments for the Catacomb simulation.
#[derive(Parser, Debug)]
#[command(name = "catacomb")]
#[command(about = "Headless run of the Catacomb roguelike core")]
#[command(version)]
struct Args {
    /// Random seed for dungeon generation and dice
    #[arg(short, long)]
    seed: Option<u64>,

    /// Number of actions to simulate
    #[arg(short, long, default_value_t = 200)]
    turns: u32,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Level width in tiles
    #[arg(long, default_value_t = catacomb::config::DEFAULT_LEVEL_WIDTH)]
    width: u32,

    /// Level height in tiles
    #[arg(long, default_value_t = catacomb::config::DEFAULT_LEVEL_HEIGHT)]
    height: u32,
}

fn main() -> CatacombResult<()> {
    let args = Args::parse();
    initialize_logging(&args.log_level)?;

    let seed = args.seed.unwrap_or_else(rand::random);
    info!("Starting Catacomb v{} with seed {}", catacomb::VERSION, seed);

    let config = GenerationConfig {
        width: args.width,
        height: args.height,
        ..GenerationConfig::new(seed)
    };
    let mut rng = StdRng::seed_from_u64(seed);
    let level = LevelGenerator::from_config(&config).generate_level(LEVEL, &config, &mut rng)?;
    let mut state = GameState::with_level(level);
    let player_id = place_player(&mut state, &mut rng)?;

    let factory = ActionFactory::with_defaults(Rc::new(EffectsFactory::with_defaults()));
    for _ in 0..args.turns {
        if state.is_game_ended() {
            break;
        }
        let actor = get_next_actor(&mut state, LEVEL)?;
        let intent = choose_intent(&state, actor, player_id, &mut rng);
        if factory.perform(intent, &mut state, &mut rng)?.is_none() {
            factory.perform(ActionParameters::Wait { character: actor }, &mut state, &mut rng)?;
        }
    }

    if let Some(level) = state.level(LEVEL) {
        println!("{}", level.to_ascii());
    }
    for event in &state.event_log {
        println!("{}", event);
    }
    println!(
        "Result after {} rounds: {:?} ({:?})",
        state.turn_number,
        state.check_result(),
        state.statistics
    );
    Ok(())
}

fn initialize_logging(log_level: &str) -> CatacombResult<()> {
    let filter = LevelFilter::from_str(log_level)
        .map_err(|_| CatacombError::Configuration(format!("Unknown log level '{}'", log_level)))?;
    env_logger::Builder::new().filter_level(filter).init();
    Ok(())
}

fn place_player(state: &mut GameState, rng: &mut StdRng) -> CatacombResult<EntityId> {
    let level = state.require_level_mut(LEVEL)?;
    let location = level
        .find_free_space(rng)
        .ok_or_else(|| CatacombError::InvalidState("No room for the player".to_string()))?;
    let player = CharacterBuilder::new()
        .with_name("player")
        .with_icon('@')
        .with_hit_points(30)
        .with_max_hp(30)
        .with_weapon(
            ItemBuilder::new()
                .with_name("short sword")
                .with_icon('|')
                .with_damage(Dice::new(1, 6), DamageType::Slashing)
                .build(),
        )
        .build();
    let id = level.add_creature(player, location)?;
    state.set_player(id);
    Ok(id)
}

/// Attacks an adjacent enemy if there is one, otherwise steps somewhere free.
fn choose_intent(
    state: &GameState,
    actor: EntityId,
    player_id: EntityId,
    rng: &mut StdRng,
) -> ActionParameters {
    let wait = ActionParameters::Wait { character: actor };
    let (Some(level), Some(character)) = (state.level(LEVEL), state.character(actor)) else {
        return wait;
    };

    let mut directions = Direction::all();
    directions.shuffle(rng);
    let enemy = directions.iter().copied().find(|direction| {
        level
            .creature_at(character.location.step(*direction))
            .map_or(false, |other| (other.id == player_id) != (actor == player_id))
    });
    if let Some(direction) = enemy {
        return ActionParameters::Attack {
            attacker: actor,
            direction,
            rolls: RollQueue::default(),
        };
    }

    directions
        .into_iter()
        .find(|direction| level.is_free(character.location.step(*direction)))
        .map_or(wait, |direction| ActionParameters::Move {
            character: actor,
            direction,
        })
}
