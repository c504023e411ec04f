//! # Section Connector
//!
//! Links neighbouring sections so that every section can be reached from
//! every other one.

use crate::{CatacombError, CatacombResult, SectionArena, SectionId};
use log::debug;
use pathfinding::prelude::bfs_reach;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Connects sections with a randomised depth-first walk.
///
/// From the current section the walk connects to a random unvisited
/// neighbour and moves there. When a section has no unvisited neighbours
/// left, the walk backs up to the most recent section that still has one.
/// The result is a spanning tree of the neighbour graph, with branches
/// wherever the walk had to back up.
///
/// # Examples
///
/// ```
/// use catacomb::{is_connected, GridPartitioner, Level, Partitioner, RandomConnector, TileId};
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let level = Level::new(40, 20, TileId::FLOOR_ROCK, TileId::WALL_GROUND);
/// let mut rng = StdRng::seed_from_u64(5);
/// let mut sections = GridPartitioner::new(2, 4).partition(&level, &mut rng).unwrap();
///
/// RandomConnector::new().connect_sections(&mut sections, None, &mut rng).unwrap();
/// assert!(is_connected(&sections));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomConnector;

impl RandomConnector {
    pub fn new() -> Self {
        Self
    }

    /// Connects every section reachable from `start` (the first section by
    /// default).
    pub fn connect_sections(
        &self,
        sections: &mut SectionArena,
        start: Option<SectionId>,
        rng: &mut StdRng,
    ) -> CatacombResult<()> {
        if sections.is_empty() {
            return Err(CatacombError::GenerationFailed(
                "No sections to connect".to_string(),
            ));
        }
        let start = start.unwrap_or(0);
        if start >= sections.len() {
            return Err(CatacombError::GenerationFailed(format!(
                "Start section {} does not exist",
                start
            )));
        }

        let mut visited = vec![false; sections.len()];
        visited[start] = true;
        let mut path = vec![start];

        while let Some(&current) = path.last() {
            let unvisited: Vec<SectionId> = sections
                .get(current)
                .map(|s| s.neighbours.iter().copied().filter(|n| !visited[*n]).collect())
                .unwrap_or_default();

            match unvisited.choose(rng) {
                Some(&next) => {
                    sections.connect(current, next, rng)?;
                    visited[next] = true;
                    path.push(next);
                }
                None => {
                    path.pop();
                    if let Some(back) = path.last() {
                        debug!("Backtracking from section {} to {}", current, back);
                    }
                }
            }
        }

        let unreached = visited.iter().filter(|v| !**v).count();
        if unreached > 0 {
            return Err(CatacombError::GenerationFailed(format!(
                "{} sections are not adjacent to the rest",
                unreached
            )));
        }
        Ok(())
    }
}

/// Checks that following connections from the first section reaches every
/// section.
pub fn is_connected(sections: &SectionArena) -> bool {
    if sections.is_empty() {
        return true;
    }
    let reached = bfs_reach(0, |id: &SectionId| {
        sections
            .get(*id)
            .map(|s| s.connections.iter().filter_map(|c| c.other).collect::<Vec<_>>())
            .unwrap_or_default()
    })
    .count();
    reached == sections.len()
}
