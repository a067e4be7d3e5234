//! # Tile View Regeneration
//!
//! Rebuilds the visual fragments of every dirty tile in two phases that share
//! one barrier:
//!
//! ```text
//! phase A (slot batches)   destroy fragments whose parent tile is dirty
//!         │ handle
//!         ▼
//! phase B (tile batches)   spawn top + open sides, clear UpdateTileView
//!         │ handle
//!         ▼
//! barrier.playback()       A's commands, then B's
//! ```
//!
//! A side spawns only when its neighbor is inside the map and not solid, so
//! the fragment set is a pure function of the tile type and the solidity of
//! its four neighbors.

use std::sync::Arc;

use delve_core::{
    mask_of, CommandBarrier, CommandResult, CommandWriter, Component, ComponentValue,
    DirtyTracker, EntityId, JobHandle, JobScheduler, MapTile, Parent, SharedWorld, Tag,
    UpdateTileView, ViewPart, World,
};

use crate::config::{Facet, ViewConfiguration, ViewParts, ViewTemplate};
use crate::dirty::{dirty_snapshot, dirty_tiles};
use crate::map::{neighbor_solidity, TileMapSnapshot};
use crate::systems::ScheduledPass;

/// Component mask of a view fragment.
pub const FRAGMENT_MASK: u64 = mask_of(ViewPart::ID) | mask_of(Parent::ID);

/// Facets to spawn for a tile with `parts`, given neighbor solidity in
/// north, east, south, west order.
pub fn visible_facets(
    parts: &ViewParts,
    neighbors_solid: [bool; 4],
) -> impl Iterator<Item = (Facet, &ViewTemplate)> + '_ {
    Facet::ALL.into_iter().filter_map(move |facet| {
        let open = match facet {
            Facet::Top => true,
            Facet::North => !neighbors_solid[0],
            Facet::East => !neighbors_solid[1],
            Facet::South => !neighbors_solid[2],
            Facet::West => !neighbors_solid[3],
        };
        if open {
            parts.get(facet).map(|template| (facet, template))
        } else {
            None
        }
    })
}

/// Components of a fragment built from `template` under `tile`.
#[must_use]
pub fn fragment_components(tile: EntityId, template: &ViewTemplate) -> Vec<ComponentValue> {
    vec![
        Parent { entity: tile }.into(),
        template.local_to_parent().into(),
        template.mesh_ref().into(),
        ComponentValue::tag::<ViewPart>(),
    ]
}

/// View fragments currently parented to `tile`, in slot order.
#[must_use]
pub fn fragments_of(world: &World, tile: EntityId) -> Vec<EntityId> {
    world
        .query(FRAGMENT_MASK)
        .filter(|&fragment| {
            world
                .get_component::<Parent>(fragment)
                .is_some_and(|parent| parent.entity == tile)
        })
        .collect()
}

/// Records the destruction of fragments in `range` whose parent is dirty.
fn record_cleanup(
    world: &World,
    dirty: &DirtyTracker,
    range: std::ops::Range<usize>,
    writer: &mut CommandWriter,
) -> CommandResult<()> {
    for fragment in world.query_range(FRAGMENT_MASK, range) {
        let Some(parent) = world.get_component::<Parent>(fragment) else {
            continue;
        };
        if dirty.contains(parent.entity) {
            writer.despawn(fragment)?;
        }
    }
    Ok(())
}

/// Records fresh fragments for `tile` and the removal of its dirty tag.
fn record_rebuild(
    world: &World,
    snapshot: &TileMapSnapshot,
    config: &ViewConfiguration,
    tile: EntityId,
    writer: &mut CommandWriter,
) -> CommandResult<()> {
    if let Some(data) = world.get_component::<MapTile>(tile) {
        if let Some(parts) = config.get(data.tile_type()) {
            let solid = neighbor_solidity(world, snapshot, data.x(), data.y());
            for (_, template) in visible_facets(parts, solid) {
                writer.spawn(fragment_components(tile, template))?;
            }
        }
    }
    writer.remove_tag::<UpdateTileView>(tile)
}

/// The view regeneration pass.
pub struct TileViewSystem {
    config: Arc<ViewConfiguration>,
    batch_size: usize,
}

impl TileViewSystem {
    /// Creates the pass. `batch_size` is the number of dirty tiles per job.
    #[must_use]
    pub fn new(config: ViewConfiguration, batch_size: usize) -> Self {
        Self {
            config: Arc::new(config),
            batch_size: batch_size.max(1),
        }
    }

    /// The view configuration in use.
    #[must_use]
    pub fn config(&self) -> &ViewConfiguration {
        &self.config
    }

    /// Schedules both phases against `barrier`.
    ///
    /// The dirty set is captured now, on the calling thread. Returns `None`
    /// when no tile is dirty; no job is scheduled in that case.
    pub fn schedule(
        &self,
        scheduler: &JobScheduler,
        world: &SharedWorld,
        snapshot: &TileMapSnapshot,
        barrier: &CommandBarrier,
        dependencies: &[JobHandle],
    ) -> Option<ScheduledPass> {
        let (tiles, dirty, capacity) = {
            let world = world.read();
            let tiles = dirty_tiles(&world);
            let dirty = dirty_snapshot(&world, &tiles);
            (tiles, Arc::new(dirty), world.capacity())
        };
        if tiles.is_empty() {
            return None;
        }

        // Phase A: one job per slot range
        let slot_batch = self
            .batch_size
            .max(capacity.div_ceil(scheduler.worker_count()));
        let mut cleanup = Vec::new();
        for start in (0..capacity).step_by(slot_batch) {
            let range = start..(start + slot_batch).min(capacity);
            let mut writer = barrier.create_writer();
            let world = Arc::clone(world);
            let dirty = Arc::clone(&dirty);
            cleanup.push(scheduler.schedule(dependencies, move || {
                let world = world.read();
                if let Err(err) = record_cleanup(&world, &dirty, range, &mut writer) {
                    tracing::warn!(error = %err, "fragment cleanup batch aborted");
                }
            }));
        }
        let cleaned = scheduler.combine(&cleanup);

        // Phase B: one job per batch of dirty tiles
        let mut rebuild = Vec::new();
        for batch in tiles.chunks(self.batch_size) {
            let batch = batch.to_vec();
            let mut writer = barrier.create_writer();
            let world = Arc::clone(world);
            let snapshot = snapshot.clone();
            let config = Arc::clone(&self.config);
            rebuild.push(scheduler.schedule(std::slice::from_ref(&cleaned), move || {
                let world = world.read();
                for tile in batch {
                    if let Err(err) =
                        record_rebuild(&world, &snapshot, &config, tile, &mut writer)
                    {
                        tracing::warn!(%tile, error = %err, "tile view rebuild skipped");
                    }
                }
            }));
        }

        let jobs = cleanup.len() + rebuild.len();
        let handle = scheduler.combine(&rebuild);
        barrier.add_job_handle_for_producer(handle.clone());

        tracing::debug!(tiles = dirty.dirty_count(), jobs, "view pass scheduled");
        Some(ScheduledPass {
            handle,
            tiles: tiles.len(),
            jobs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts() -> ViewParts {
        ViewParts {
            top: Some(ViewTemplate::new(1)),
            north: Some(ViewTemplate::new(2)),
            east: Some(ViewTemplate::new(3)),
            south: Some(ViewTemplate::new(4)),
            west: Some(ViewTemplate::new(5)),
        }
    }

    fn facets(parts: &ViewParts, solid: [bool; 4]) -> Vec<Facet> {
        visible_facets(parts, solid).map(|(facet, _)| facet).collect()
    }

    #[test]
    fn test_open_neighbors_spawn_sides() {
        assert_eq!(facets(&parts(), [false; 4]), Facet::ALL.to_vec());
        assert_eq!(facets(&parts(), [true; 4]), vec![Facet::Top]);
        assert_eq!(
            facets(&parts(), [false, true, true, false]),
            vec![Facet::Top, Facet::North, Facet::West]
        );
    }

    #[test]
    fn test_unconfigured_facets_never_spawn() {
        let floor = ViewParts {
            top: Some(ViewTemplate::new(7)),
            ..ViewParts::default()
        };
        assert_eq!(facets(&floor, [false; 4]), vec![Facet::Top]);
        assert!(facets(&ViewParts::default(), [false; 4]).is_empty());
    }

    #[test]
    fn test_fragment_components_carry_template() {
        let tile = EntityId::new(4, 1);
        let template = ViewTemplate::new(9).with_translation([0.0, 0.5, 0.5]);
        let components = fragment_components(tile, &template);

        assert!(components.contains(&Parent { entity: tile }.into()));
        assert!(components.contains(&template.local_to_parent().into()));
        assert!(components.contains(&ComponentValue::Mesh(delve_core::MeshRef { mesh_id: 9 })));
        assert!(components.contains(&ComponentValue::tag::<ViewPart>()));
    }
}
