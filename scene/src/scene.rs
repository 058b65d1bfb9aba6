//! The scene façade: one physics world, its identifier registries and its event relay.
//!
//! Lifecycle of a step:
//!
//! ```text
//! Unstepped --simulate/collide--> Stepping --fetch_results--> ResultsReady
//!     ^                                                            |
//!     +------------------------ any mutation ----------------------+
//! ```
//!
//! While a step is in flight the world is owned by the step job, so every query, getter and
//! mutation reports [`SceneError::SceneBusy`].

use crossbeam_channel::Receiver;
use rapier3d::prelude::{ColliderHandle, RigidBodyHandle};
use relay_shared::{
    AllHits, ChannelSink, EventAggregator, EventBatch, EventSink, FilterData, FlushReport,
    HitBuffer, Identifier, IdentifierKind, IdentifierLookup, IdentifierRegistry, MarshalError,
    PairFlags, QueryResult, Transform, Vec3, marshal_all, marshal_closest,
};

use crate::config::SceneConfig;
use crate::dispatcher::{PendingStep, StepDispatcher};
use crate::error::SceneError;
use crate::geometry::ActorDesc;
use crate::query::{self, RaycastQuery, SweepQuery};
use crate::world::{PhysicsWorld, StepKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SceneState {
    Unstepped,
    Stepping,
    ResultsReady,
}

enum WorldSlot {
    Idle(Box<PhysicsWorld>),
    Stepping(PendingStep),
    /// The world went down with a step worker.
    Lost,
}

/// Resolves engine handles through the scene's registries.
pub(crate) struct SceneIdentifiers<'a> {
    shapes: &'a IdentifierRegistry<ColliderHandle>,
    actors: &'a IdentifierRegistry<RigidBodyHandle>,
}

impl IdentifierLookup for SceneIdentifiers<'_> {
    type Shape = ColliderHandle;
    type Actor = RigidBodyHandle;

    fn shape_identifier(&self, shape: ColliderHandle) -> Option<Identifier> {
        self.shapes.get(shape)
    }

    fn actor_identifier(&self, actor: RigidBodyHandle) -> Option<Identifier> {
        self.actors.get(actor)
    }
}

pub struct Scene {
    config: SceneConfig,
    state: SceneState,
    slot: WorldSlot,
    dispatcher: StepDispatcher,
    shapes: IdentifierRegistry<ColliderHandle>,
    actors: IdentifierRegistry<RigidBodyHandle>,
    aggregator: EventAggregator,
    sink: Box<dyn EventSink>,
    last_flush: Option<FlushReport>,
}

impl Scene {
    pub fn new(config: SceneConfig, sink: Box<dyn EventSink>) -> Result<Self, SceneError> {
        if !config.timestep.is_finite() || config.timestep <= 0.0 {
            return Err(SceneError::invalid("timestep must be positive"));
        }
        let dispatcher = StepDispatcher::new(config.worker_count)?;
        let world = PhysicsWorld::new(config.gravity, config.timestep, config.pair_filter.clone());
        log::info!(
            "scene created (gravity {:?}, {} workers, {:?} unresolved identifiers)",
            config.gravity,
            config.worker_count,
            config.unresolved
        );

        Ok(Self {
            aggregator: EventAggregator::new(config.unresolved),
            config,
            state: SceneState::Unstepped,
            slot: WorldSlot::Idle(Box::new(world)),
            dispatcher,
            shapes: IdentifierRegistry::new(IdentifierKind::Shape),
            actors: IdentifierRegistry::new(IdentifierKind::Actor),
            sink,
            last_flush: None,
        })
    }

    /// Scene whose events arrive as [`EventBatch`] messages on the returned receiver.
    pub fn with_channel(config: SceneConfig) -> Result<(Self, Receiver<EventBatch>), SceneError> {
        let (tx, rx) = crossbeam_channel::unbounded();
        let scene = Self::new(config, Box::new(ChannelSink::new(tx)))?;
        Ok((scene, rx))
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn state(&self) -> SceneState {
        self.state
    }

    /// Report of the most recent flush.
    pub fn last_flush(&self) -> Option<&FlushReport> {
        self.last_flush.as_ref()
    }

    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    // ---------------------------------------------------------------------------------------
    // Actors and shapes
    // ---------------------------------------------------------------------------------------

    /// Add an actor with all its shapes. Nothing is added if any identifier is taken.
    pub fn add_actor(&mut self, desc: &ActorDesc) -> Result<(), SceneError> {
        let world = self.world_mut()?;
        let (body, colliders) = world.insert_actor(desc)?;

        if let Err(err) = self.register(body, desc, &colliders) {
            self.actors.release(body);
            for &collider in &colliders {
                self.shapes.release(collider);
            }
            if let WorldSlot::Idle(world) = &mut self.slot {
                world.remove_actor(body);
            }
            return Err(err);
        }
        log::debug!("actor {} added with {} shapes", desc.id, colliders.len());
        Ok(())
    }

    fn register(
        &mut self,
        body: RigidBodyHandle,
        desc: &ActorDesc,
        colliders: &[ColliderHandle],
    ) -> Result<(), SceneError> {
        self.actors.assign(body, desc.id)?;
        for (shape, &collider) in desc.shapes.iter().zip(colliders) {
            self.shapes.assign(collider, shape.id)?;
        }
        Ok(())
    }

    /// Remove an actor, its shapes and their identifiers. Touches the actor was part of
    /// end silently.
    pub fn remove_actor(&mut self, actor: Identifier) -> Result<(), SceneError> {
        let body = self.actors.handle_of(actor)?;
        let world = self.world_mut()?;
        let removed = world.remove_actor(body);
        for shape in removed {
            self.shapes.release(shape);
        }
        self.actors.release(body);
        log::debug!("actor {actor} removed");
        Ok(())
    }

    pub fn filter_data(&self, actor: Identifier, shape: Identifier) -> Result<FilterData, SceneError> {
        let collider = self.shape_on_actor(actor, shape)?;
        self.world()?
            .shape_filter(collider)
            .ok_or(SceneError::ShapeNotOnActor(actor, shape))
    }

    pub fn set_filter_data(
        &mut self,
        actor: Identifier,
        shape: Identifier,
        filter: FilterData,
    ) -> Result<(), SceneError> {
        let collider = self.shape_on_actor(actor, shape)?;
        self.world_mut()?.set_shape_filter(collider, filter);
        Ok(())
    }

    /// Replace `word0`/`word1` only.
    pub fn set_simulation_filter(
        &mut self,
        actor: Identifier,
        shape: Identifier,
        group: u32,
        mask: u32,
    ) -> Result<(), SceneError> {
        let filter = self.filter_data(actor, shape)?.with_simulation(group, mask);
        self.set_filter_data(actor, shape, filter)
    }

    /// Replace `word2` only.
    pub fn set_event_filter(
        &mut self,
        actor: Identifier,
        shape: Identifier,
        events: PairFlags,
    ) -> Result<(), SceneError> {
        let filter = self.filter_data(actor, shape)?.with_events(events);
        self.set_filter_data(actor, shape, filter)
    }

    pub fn set_trigger(
        &mut self,
        actor: Identifier,
        shape: Identifier,
        is_trigger: bool,
    ) -> Result<(), SceneError> {
        let collider = self.shape_on_actor(actor, shape)?;
        self.world_mut()?.set_trigger(collider, is_trigger);
        Ok(())
    }

    pub fn actor_pose(&self, actor: Identifier) -> Result<Transform, SceneError> {
        let body = self.actors.handle_of(actor)?;
        self.world()?
            .actor_pose(body)
            .ok_or_else(|| unknown_actor(actor))
    }

    pub fn set_actor_pose(&mut self, actor: Identifier, pose: Transform) -> Result<(), SceneError> {
        if !pose.translation.iter().all(|c| c.is_finite()) {
            return Err(SceneError::invalid("pose must be finite"));
        }
        let body = self.actors.handle_of(actor)?;
        self.world_mut()?.set_actor_pose(body, pose);
        Ok(())
    }

    pub fn linear_velocity(&self, actor: Identifier) -> Result<Vec3, SceneError> {
        let body = self.actors.handle_of(actor)?;
        self.world()?
            .linear_velocity(body)
            .ok_or_else(|| unknown_actor(actor))
    }

    pub fn set_linear_velocity(&mut self, actor: Identifier, velocity: Vec3) -> Result<(), SceneError> {
        if !velocity.iter().all(|c| c.is_finite()) {
            return Err(SceneError::invalid("velocity must be finite"));
        }
        let body = self.actors.handle_of(actor)?;
        self.world_mut()?.set_linear_velocity(body, velocity);
        Ok(())
    }

    pub fn gravity(&self) -> Result<Vec3, SceneError> {
        Ok(self.world()?.gravity())
    }

    pub fn set_gravity(&mut self, gravity: Vec3) -> Result<(), SceneError> {
        if !gravity.iter().all(|c| c.is_finite()) {
            return Err(SceneError::invalid("gravity must be finite"));
        }
        self.world_mut()?.set_gravity(gravity);
        Ok(())
    }

    // ---------------------------------------------------------------------------------------
    // Stepping
    // ---------------------------------------------------------------------------------------

    /// Start a full simulation step of `dt` seconds.
    pub fn simulate(&mut self, dt: f32) -> Result<(), SceneError> {
        self.begin_step(StepKind::Simulate, dt)
    }

    /// Start a collision-detection-only step; bodies keep their poses.
    pub fn collide(&mut self, dt: f32) -> Result<(), SceneError> {
        self.begin_step(StepKind::CollideOnly, dt)
    }

    /// Complete the step in flight and flush its events into the sink.
    ///
    /// With `block == false` this returns `Ok(false)` while the step is still running.
    pub fn fetch_results(&mut self, block: bool) -> Result<bool, SceneError> {
        if self.state != SceneState::Stepping {
            return Err(SceneError::NoStepInFlight);
        }
        let WorldSlot::Stepping(pending) = std::mem::replace(&mut self.slot, WorldSlot::Lost) else {
            self.state = SceneState::Unstepped;
            return Err(SceneError::WorkerDisconnected);
        };

        let finished = if block {
            pending.wait().map(Ok)
        } else {
            pending.poll()
        };
        let outcome = match finished {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(pending)) => {
                self.slot = WorldSlot::Stepping(pending);
                return Ok(false);
            }
            Err(err) => {
                log::error!("step failed: {err}");
                self.state = SceneState::Unstepped;
                return Err(err);
            }
        };

        self.slot = WorldSlot::Idle(outcome.world);
        self.state = SceneState::ResultsReady;

        let lookup = SceneIdentifiers {
            shapes: &self.shapes,
            actors: &self.actors,
        };
        self.aggregator.collect(&lookup, &outcome.notifications);
        let report = self.aggregator.flush(self.sink.as_mut())?;
        self.last_flush = Some(report);
        Ok(true)
    }

    /// `simulate(dt)` followed by a blocking `fetch_results`.
    pub fn step(&mut self, dt: f32) -> Result<(), SceneError> {
        self.simulate(dt)?;
        self.fetch_results(true)?;
        Ok(())
    }

    fn begin_step(&mut self, kind: StepKind, dt: f32) -> Result<(), SceneError> {
        if self.state == SceneState::Stepping {
            return Err(SceneError::StepAlreadyInFlight);
        }
        if !dt.is_finite() || dt <= 0.0 {
            return Err(SceneError::invalid("dt must be positive"));
        }
        let world = match std::mem::replace(&mut self.slot, WorldSlot::Lost) {
            WorldSlot::Idle(world) => world,
            other => {
                self.slot = other;
                return Err(SceneError::WorkerDisconnected);
            }
        };

        match self.dispatcher.submit(world, kind, dt) {
            Ok(pending) => {
                self.slot = WorldSlot::Stepping(pending);
                self.state = SceneState::Stepping;
                Ok(())
            }
            Err((err, world)) => {
                self.slot = WorldSlot::Idle(world);
                Err(err)
            }
        }
    }

    // ---------------------------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------------------------

    pub fn raycast_closest(&self, ray: &RaycastQuery) -> Result<QueryResult, SceneError> {
        let hit = query::raycast_closest(self.world()?, self.config.query_filter.as_ref(), ray)?;
        Ok(marshal_closest(&self.lookup(), hit, self.config.unresolved)?)
    }

    pub fn raycast_all(&self, ray: &RaycastQuery) -> Result<AllHits, SceneError> {
        let mut buffer = HitBuffer::with_capacity(self.config.hit_capacity);
        query::raycast_all(
            self.world()?,
            self.config.query_filter.as_ref(),
            ray,
            &mut buffer,
        )?;
        Ok(marshal_all(&self.lookup(), buffer, self.config.unresolved)?)
    }

    pub fn sweep_closest(&self, sweep: &SweepQuery) -> Result<QueryResult, SceneError> {
        let hit = query::sweep_closest(self.world()?, self.config.query_filter.as_ref(), sweep)?;
        Ok(marshal_closest(&self.lookup(), hit, self.config.unresolved)?)
    }

    pub fn sweep_all(&self, sweep: &SweepQuery) -> Result<AllHits, SceneError> {
        let mut buffer = HitBuffer::with_capacity(self.config.hit_capacity);
        query::sweep_all(
            self.world()?,
            self.config.query_filter.as_ref(),
            sweep,
            &mut buffer,
        )?;
        Ok(marshal_all(&self.lookup(), buffer, self.config.unresolved)?)
    }

    // ---------------------------------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------------------------------

    fn lookup(&self) -> SceneIdentifiers<'_> {
        SceneIdentifiers {
            shapes: &self.shapes,
            actors: &self.actors,
        }
    }

    fn world(&self) -> Result<&PhysicsWorld, SceneError> {
        match &self.slot {
            WorldSlot::Idle(world) => Ok(&**world),
            WorldSlot::Stepping(_) => Err(SceneError::SceneBusy),
            WorldSlot::Lost => Err(SceneError::WorkerDisconnected),
        }
    }

    /// Mutable world access; leaves `ResultsReady`.
    fn world_mut(&mut self) -> Result<&mut PhysicsWorld, SceneError> {
        match &mut self.slot {
            WorldSlot::Idle(world) => {
                self.state = SceneState::Unstepped;
                Ok(&mut **world)
            }
            WorldSlot::Stepping(_) => Err(SceneError::SceneBusy),
            WorldSlot::Lost => Err(SceneError::WorkerDisconnected),
        }
    }

    fn shape_on_actor(&self, actor: Identifier, shape: Identifier) -> Result<ColliderHandle, SceneError> {
        let body = self.actors.handle_of(actor)?;
        let collider = self.shapes.handle_of(shape)?;
        let parent = self.world()?.colliders().get(collider).and_then(|c| c.parent());
        if parent != Some(body) {
            return Err(SceneError::ShapeNotOnActor(actor, shape));
        }
        Ok(collider)
    }
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("state", &self.state)
            .field("actors", &self.actors.len())
            .field("shapes", &self.shapes.len())
            .field("workers", &self.dispatcher.worker_count())
            .finish()
    }
}

fn unknown_actor(id: Identifier) -> SceneError {
    MarshalError::UnknownIdentifier {
        kind: IdentifierKind::Actor,
        id,
    }
    .into()
}
