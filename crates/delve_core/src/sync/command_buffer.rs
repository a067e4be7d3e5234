//! # Deferred Command Buffers
//!
//! Jobs never change the world's structure directly. They record intents
//! into a [`CommandWriter`], and a [`CommandBarrier`] replays every recorded
//! intent at one synchronization point, after all of the frame's producers
//! have completed.
//!
//! ```text
//!  producer job 0 ──> writer 0 ──┐
//!  producer job 1 ──> writer 1 ──┼──> barrier.playback(): complete handles
//!  producer job 2 ──> writer 2 ──┘        validate ──> write lock ──> apply
//! ```
//!
//! ## Ordering
//!
//! - Commands of one writer replay in recording order.
//! - Writers replay in the order they were created on the barrier.
//! - After playback the barrier is empty; a barrier nobody wrote to this
//!   frame does nothing.
//!
//! ## Destruction rule
//!
//! Within one frame, an entity that is destroyed may not be targeted or
//! referenced by any other command of the same barrier. Writers reject the
//! second half of such a pair when it is recorded, and the barrier re-checks
//! the merged stream before applying anything.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::ecs::{
    Component, EntityId, LocalToParent, MapTile, MeshRef, Parent, PhysicsCollider, Tag,
    Translation, World,
};
use crate::error::{CommandError, CommandResult};
use crate::sync::jobs::JobHandle;

/// A component value (or tag) carried by a command.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ComponentValue {
    /// Tile simulation data.
    MapTile(MapTile),
    /// World-space translation.
    Translation(Translation),
    /// Back-reference to a parent entity.
    Parent(Parent),
    /// Placement relative to the parent.
    LocalToParent(LocalToParent),
    /// Render mesh reference.
    Mesh(MeshRef),
    /// Collider slot.
    Collider(PhysicsCollider),
    /// A zero-size tag, by ID.
    Tag(u8),
}

macro_rules! impl_from_component {
    ($ty:ty, $variant:ident) => {
        impl From<$ty> for ComponentValue {
            fn from(value: $ty) -> Self {
                Self::$variant(value)
            }
        }
    };
}

impl_from_component!(MapTile, MapTile);
impl_from_component!(Translation, Translation);
impl_from_component!(Parent, Parent);
impl_from_component!(LocalToParent, LocalToParent);
impl_from_component!(MeshRef, Mesh);
impl_from_component!(PhysicsCollider, Collider);

impl ComponentValue {
    /// The value for tag `T`.
    #[must_use]
    pub const fn tag<T: Tag>() -> Self {
        Self::Tag(T::ID)
    }

    /// Component or tag ID this value is stored under.
    #[must_use]
    pub const fn component_id(&self) -> u8 {
        match self {
            Self::MapTile(_) => MapTile::ID,
            Self::Translation(_) => Translation::ID,
            Self::Parent(_) => Parent::ID,
            Self::LocalToParent(_) => LocalToParent::ID,
            Self::Mesh(_) => MeshRef::ID,
            Self::Collider(_) => PhysicsCollider::ID,
            Self::Tag(id) => *id,
        }
    }

    /// Another entity this value points at, if any.
    #[must_use]
    pub const fn referenced_entity(&self) -> Option<EntityId> {
        match self {
            Self::Parent(parent) => Some(parent.entity),
            _ => None,
        }
    }

    fn insert_into(self, world: &mut World, entity: EntityId) -> bool {
        match self {
            Self::MapTile(v) => world.insert(entity, v),
            Self::Translation(v) => world.insert(entity, v),
            Self::Parent(v) => world.insert(entity, v),
            Self::LocalToParent(v) => world.insert(entity, v),
            Self::Mesh(v) => world.insert(entity, v),
            Self::Collider(v) => world.insert(entity, v),
            Self::Tag(id) => world.add_id(entity, id),
        }
    }

    fn replace_in(self, world: &mut World, entity: EntityId) -> bool {
        match self {
            Self::MapTile(v) => world.replace(entity, v).is_some(),
            Self::Translation(v) => world.replace(entity, v).is_some(),
            Self::Parent(v) => world.replace(entity, v).is_some(),
            Self::LocalToParent(v) => world.replace(entity, v).is_some(),
            Self::Mesh(v) => world.replace(entity, v).is_some(),
            Self::Collider(v) => world.replace(entity, v).is_some(),
            Self::Tag(id) => world.has_id(entity, id),
        }
    }
}

/// A deferred structural change.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Create an entity carrying the given components.
    Spawn {
        /// Initial components and tags.
        components: Vec<ComponentValue>,
    },
    /// Destroy an entity.
    Despawn {
        /// Entity to destroy.
        entity: EntityId,
    },
    /// Attach a component or tag (overwrites an existing value).
    Add {
        /// Target entity.
        entity: EntityId,
        /// Value to attach.
        value: ComponentValue,
    },
    /// Overwrite a component that is already attached.
    Set {
        /// Target entity.
        entity: EntityId,
        /// Replacement value.
        value: ComponentValue,
    },
    /// Detach a component or tag.
    Remove {
        /// Target entity.
        entity: EntityId,
        /// Component or tag ID.
        component_id: u8,
    },
}

impl Command {
    /// Every entity this command targets or references.
    fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        let (target, values): (Option<EntityId>, &[ComponentValue]) = match self {
            Self::Spawn { components } => (None, components.as_slice()),
            Self::Despawn { entity } | Self::Remove { entity, .. } => (Some(*entity), &[]),
            Self::Add { entity, value } | Self::Set { entity, value } => {
                (Some(*entity), std::slice::from_ref(value))
            }
        };
        target
            .into_iter()
            .chain(values.iter().filter_map(ComponentValue::referenced_entity))
    }
}

/// Tracks which entities a command stream touches and destroys.
#[derive(Default)]
struct DestroyGuard {
    touched: HashSet<EntityId>,
    destroyed: HashSet<EntityId>,
}

impl DestroyGuard {
    fn check(&mut self, command: &Command) -> CommandResult<()> {
        if let Command::Despawn { entity } = command {
            if self.touched.contains(entity) {
                return Err(CommandError::DestroyConflict { entity: *entity });
            }
            self.destroyed.insert(*entity);
            return Ok(());
        }

        for entity in command.entities() {
            if self.destroyed.contains(&entity) {
                return Err(CommandError::UseAfterDestroy { entity });
            }
            self.touched.insert(entity);
        }
        Ok(())
    }
}

type Slot = Arc<Mutex<Vec<Command>>>;

/// Records commands for one producer.
///
/// The recorded commands are handed to the barrier when the writer is
/// dropped, which for a job is the end of its closure, before its handle
/// completes. A writer dropped while its thread is panicking hands over
/// nothing.
pub struct CommandWriter {
    commands: Vec<Command>,
    guard: DestroyGuard,
    slot: Slot,
}

impl CommandWriter {
    fn push(&mut self, command: Command) -> CommandResult<()> {
        self.guard.check(&command)?;
        self.commands.push(command);
        Ok(())
    }

    /// Requests a new entity with the given components.
    ///
    /// # Errors
    ///
    /// [`CommandError::UseAfterDestroy`] if a component references an entity
    /// this writer already destroys.
    pub fn spawn(&mut self, components: Vec<ComponentValue>) -> CommandResult<()> {
        self.push(Command::Spawn { components })
    }

    /// Requests destruction of `entity`.
    ///
    /// # Errors
    ///
    /// [`CommandError::DestroyConflict`] if this writer already has commands
    /// targeting or referencing `entity`.
    pub fn despawn(&mut self, entity: EntityId) -> CommandResult<()> {
        self.push(Command::Despawn { entity })
    }

    /// Requests attaching (or overwriting) a component.
    ///
    /// # Errors
    ///
    /// [`CommandError::UseAfterDestroy`] if `entity` is pending destruction.
    pub fn add_component(
        &mut self,
        entity: EntityId,
        value: impl Into<ComponentValue>,
    ) -> CommandResult<()> {
        self.push(Command::Add {
            entity,
            value: value.into(),
        })
    }

    /// Requests attaching tag `T`.
    ///
    /// # Errors
    ///
    /// [`CommandError::UseAfterDestroy`] if `entity` is pending destruction.
    pub fn add_tag<T: Tag>(&mut self, entity: EntityId) -> CommandResult<()> {
        self.push(Command::Add {
            entity,
            value: ComponentValue::tag::<T>(),
        })
    }

    /// Requests overwriting a component that must already be attached.
    ///
    /// # Errors
    ///
    /// [`CommandError::UseAfterDestroy`] if `entity` is pending destruction.
    pub fn set_component(
        &mut self,
        entity: EntityId,
        value: impl Into<ComponentValue>,
    ) -> CommandResult<()> {
        self.push(Command::Set {
            entity,
            value: value.into(),
        })
    }

    /// Requests detaching component `C`.
    ///
    /// # Errors
    ///
    /// [`CommandError::UseAfterDestroy`] if `entity` is pending destruction.
    pub fn remove_component<C: Component>(&mut self, entity: EntityId) -> CommandResult<()> {
        self.push(Command::Remove {
            entity,
            component_id: C::ID,
        })
    }

    /// Requests detaching tag `T`.
    ///
    /// # Errors
    ///
    /// [`CommandError::UseAfterDestroy`] if `entity` is pending destruction.
    pub fn remove_tag<T: Tag>(&mut self, entity: EntityId) -> CommandResult<()> {
        self.push(Command::Remove {
            entity,
            component_id: T::ID,
        })
    }

    /// Number of commands recorded so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl Drop for CommandWriter {
    fn drop(&mut self) {
        if self.commands.is_empty() {
            return;
        }
        if std::thread::panicking() {
            tracing::warn!(
                discarded = self.commands.len(),
                "writer dropped by a panicking producer; discarding its commands"
            );
            return;
        }
        self.slot.lock().append(&mut self.commands);
    }
}

/// What a playback did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlaybackStats {
    /// Producers (writers) replayed.
    pub producers: usize,
    /// Entities created.
    pub spawned: usize,
    /// Entities destroyed.
    pub despawned: usize,
    /// Components or tags attached.
    pub added: usize,
    /// Components overwritten in place.
    pub set: usize,
    /// Components or tags detached.
    pub removed: usize,
    /// Commands whose target was dead, missing the component, or out of
    /// capacity.
    pub skipped: usize,
}

impl PlaybackStats {
    /// Total commands applied (excluding skipped ones).
    #[must_use]
    pub const fn applied(&self) -> usize {
        self.spawned + self.despawned + self.added + self.set + self.removed
    }
}

#[derive(Default)]
struct PendingFrame {
    slots: Vec<Slot>,
    producers: Vec<JobHandle>,
}

/// Synchronization point that replays deferred commands.
pub struct CommandBarrier {
    name: &'static str,
    pending: Mutex<PendingFrame>,
}

impl CommandBarrier {
    /// Creates an empty barrier. The name shows up in logs.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            pending: Mutex::new(PendingFrame::default()),
        }
    }

    /// The barrier's name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Registers a new producer slot and returns its writer.
    ///
    /// Slots replay in creation order, so a pass that needs its phase-A
    /// commands before its phase-B commands creates the phase-A writers
    /// first.
    #[must_use]
    pub fn create_writer(&self) -> CommandWriter {
        let slot: Slot = Arc::default();
        self.pending.lock().slots.push(Arc::clone(&slot));
        CommandWriter {
            commands: Vec::new(),
            guard: DestroyGuard::default(),
            slot,
        }
    }

    /// Makes the next playback wait for `handle` before applying anything.
    pub fn add_job_handle_for_producer(&self, handle: JobHandle) {
        self.pending.lock().producers.push(handle);
    }

    /// Whether any writer or producer registered since the last playback.
    #[must_use]
    pub fn has_pending_work(&self) -> bool {
        let pending = self.pending.lock();
        !pending.slots.is_empty() || !pending.producers.is_empty()
    }

    /// Waits for all producers, then applies their commands under the world's
    /// write lock.
    ///
    /// # Errors
    ///
    /// Returns the first destruction-rule violation found across producers;
    /// in that case nothing is applied and the frame's commands are dropped.
    pub fn playback(&self, world: &RwLock<World>) -> CommandResult<PlaybackStats> {
        let Some((producers, commands)) = self.collect() else {
            return Ok(PlaybackStats::default());
        };
        self.validate(&commands)?;
        let mut world = world.write();
        Ok(self.apply(&mut world, producers, commands))
    }

    /// Like [`CommandBarrier::playback`] for a caller that already holds
    /// exclusive access to the world.
    ///
    /// # Errors
    ///
    /// See [`CommandBarrier::playback`].
    pub fn playback_exclusive(&self, world: &mut World) -> CommandResult<PlaybackStats> {
        let Some((producers, commands)) = self.collect() else {
            return Ok(PlaybackStats::default());
        };
        self.validate(&commands)?;
        Ok(self.apply(world, producers, commands))
    }

    /// Takes this frame's registrations, waits for producers and merges
    /// their commands in slot order. Returns `None` for an idle barrier.
    fn collect(&self) -> Option<(usize, Vec<Command>)> {
        let frame = std::mem::take(&mut *self.pending.lock());
        if frame.slots.is_empty() && frame.producers.is_empty() {
            return None;
        }

        for handle in &frame.producers {
            handle.complete();
        }

        let mut commands = Vec::new();
        for slot in &frame.slots {
            if Arc::strong_count(slot) > 1 {
                tracing::warn!(
                    barrier = self.name,
                    "writer still alive at playback; its commands miss this frame"
                );
            }
            commands.append(&mut slot.lock());
        }
        Some((frame.slots.len(), commands))
    }

    fn validate(&self, commands: &[Command]) -> CommandResult<()> {
        let mut guard = DestroyGuard::default();
        for command in commands {
            if let Err(err) = guard.check(command) {
                tracing::error!(barrier = self.name, error = %err, "rejecting frame commands");
                return Err(err);
            }
        }
        Ok(())
    }

    fn apply(&self, world: &mut World, producers: usize, commands: Vec<Command>) -> PlaybackStats {
        let mut stats = PlaybackStats {
            producers,
            ..PlaybackStats::default()
        };

        for command in commands {
            let applied = match command {
                Command::Spawn { components } => {
                    let entity = world.spawn();
                    if entity.is_null() {
                        false
                    } else {
                        for value in components {
                            value.insert_into(world, entity);
                        }
                        stats.spawned += 1;
                        true
                    }
                }
                Command::Despawn { entity } => {
                    let done = world.despawn(entity);
                    stats.despawned += usize::from(done);
                    done
                }
                Command::Add { entity, value } => {
                    let done = value.insert_into(world, entity);
                    stats.added += usize::from(done);
                    done
                }
                Command::Set { entity, value } => {
                    let done = value.replace_in(world, entity);
                    stats.set += usize::from(done);
                    done
                }
                Command::Remove {
                    entity,
                    component_id,
                } => {
                    let done = world.remove_id(entity, component_id);
                    stats.removed += usize::from(done);
                    done
                }
            };
            stats.skipped += usize::from(!applied);
        }

        if stats.skipped > 0 {
            tracing::warn!(
                barrier = self.name,
                skipped = stats.skipped,
                "commands skipped during playback"
            );
        }
        tracing::debug!(
            barrier = self.name,
            producers = stats.producers,
            spawned = stats.spawned,
            despawned = stats.despawned,
            added = stats.added,
            set = stats.set,
            removed = stats.removed,
            "barrier playback"
        );
        stats
    }
}
