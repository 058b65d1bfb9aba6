//! The Rapier world owned by a scene and moved into step jobs.
//!
//! A step runs the engine with the pair filter installed as hooks, then turns the captured
//! collision events into raw [`StepNotifications`]:
//! - touch begin/end come from the engine's started/stopped events,
//! - persists are synthesized for contact pairs still touching from an earlier step while
//!   at least one of their bodies is awake,
//! - wake/sleep come from diffing body activation across the step,
//! - events caused by collider removal are dropped.

use std::collections::HashSet;
use std::sync::Arc;

use crossbeam_channel::Receiver;
use indexmap::IndexMap;
use rapier3d::prelude::*;
use relay_shared::{
    FilterData, PairFilterPolicy, PairFlag, PairFlags, RawContactPair, RawTriggerPair,
    StepNotifications, Transform, Vec3,
};

use crate::collector::{CapturedCollision, StepEventCollector, extract_contact_points};
use crate::error::SceneError;
use crate::geometry::{ActorDesc, ActorKind};
use crate::hooks::{PairFilterHooks, classify_pair};
use crate::settings::COLLIDE_PREDICTION_DISTANCE;

/// Raw notifications keyed by engine handles.
pub type WorldNotifications = StepNotifications<ColliderHandle, RigidBodyHandle>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepKind {
    /// Full simulation: collision detection, solving and integration.
    Simulate,
    /// Collision detection only; bodies do not move.
    CollideOnly,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TouchKind {
    Contact,
    Trigger,
}

/// A pair currently touching, with its colliders in the order the engine first reported.
#[derive(Clone, Copy, Debug)]
struct Touch {
    kind: TouchKind,
    first: ColliderHandle,
    second: ColliderHandle,
}

type PairKey = ((u32, u32), (u32, u32));

fn pair_key(a: ColliderHandle, b: ColliderHandle) -> PairKey {
    let (a, b) = (a.into_raw_parts(), b.into_raw_parts());
    if a <= b { (a, b) } else { (b, a) }
}

pub struct PhysicsWorld {
    gravity: Vec3,
    params: IntegrationParameters,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    islands: IslandManager,
    broad_phase: BroadPhaseBvh,
    narrow_phase: NarrowPhase,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd: CCDSolver,
    physics_pipeline: PhysicsPipeline,
    collision_pipeline: CollisionPipeline,
    hooks: PairFilterHooks,
    collector: StepEventCollector,
    events: Receiver<CapturedCollision>,
    touching: IndexMap<PairKey, Touch>,
    /// Touches cut by a trigger toggle; the engine's stop event for them is swallowed.
    interrupted: HashSet<PairKey>,
    /// Last observed sleep state of every dynamic body, in insertion order.
    sleeping: IndexMap<RigidBodyHandle, bool>,
}

impl PhysicsWorld {
    pub fn new(gravity: Vec3, timestep: f32, pair_filter: Arc<dyn PairFilterPolicy>) -> Self {
        let (collector, events) = StepEventCollector::new();
        Self {
            gravity,
            params: IntegrationParameters {
                dt: timestep,
                ..IntegrationParameters::default()
            },
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            islands: IslandManager::new(),
            broad_phase: BroadPhaseBvh::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd: CCDSolver::new(),
            physics_pipeline: PhysicsPipeline::new(),
            collision_pipeline: CollisionPipeline::new(),
            hooks: PairFilterHooks::new(pair_filter),
            collector,
            events,
            touching: IndexMap::new(),
            interrupted: HashSet::new(),
            sleeping: IndexMap::new(),
        }
    }

    pub fn gravity(&self) -> Vec3 {
        self.gravity
    }

    pub fn set_gravity(&mut self, gravity: Vec3) {
        self.gravity = gravity;
        // Sleeping bodies would otherwise ignore the new gravity.
        for (_, body) in self.bodies.iter_mut() {
            if body.is_dynamic() {
                body.wake_up(true);
            }
        }
    }

    pub fn colliders(&self) -> &ColliderSet {
        &self.colliders
    }

    /// World pose of `collider` from its parent body's current pose.
    ///
    /// Stored collider positions are only synchronized during a step; this also covers
    /// bodies moved since.
    pub fn collider_pose(&self, collider: &Collider) -> Isometry<Real> {
        let parent = collider
            .parent()
            .and_then(|h| self.bodies.get(h))
            .zip(collider.position_wrt_parent());
        match parent {
            Some((body, local)) => body.position() * local,
            None => *collider.position(),
        }
    }

    /// Insert an actor and its shapes. Shape handles come back in `desc.shapes` order.
    pub fn insert_actor(
        &mut self,
        desc: &ActorDesc,
    ) -> Result<(RigidBodyHandle, Vec<ColliderHandle>), SceneError> {
        desc.validate()?;
        let colliders = desc
            .shapes
            .iter()
            .map(|shape| shape.to_collider())
            .collect::<Result<Vec<_>, _>>()?;

        let body = self.bodies.insert(desc.to_body());
        let handles = colliders
            .into_iter()
            .map(|collider| {
                self.colliders
                    .insert_with_parent(collider, body, &mut self.bodies)
            })
            .collect();
        if desc.kind == ActorKind::Dynamic {
            self.sleeping.insert(body, false);
        }
        Ok((body, handles))
    }

    /// Remove an actor and its shapes, returning the removed shape handles.
    ///
    /// Touches involving the removed shapes are forgotten so that no lost-touch events are
    /// reported for them.
    pub fn remove_actor(&mut self, body: RigidBodyHandle) -> Vec<ColliderHandle> {
        let shapes: Vec<ColliderHandle> = match self.bodies.get(body) {
            Some(rb) => rb.colliders().to_vec(),
            None => return Vec::new(),
        };
        for &shape in &shapes {
            self.forget_touches(shape);
        }
        self.bodies.remove(
            body,
            &mut self.islands,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
        self.sleeping.shift_remove(&body);
        shapes
    }

    pub fn actor_pose(&self, body: RigidBodyHandle) -> Option<Transform> {
        let rb = self.bodies.get(body)?;
        Some(Transform::new(*rb.translation(), *rb.rotation()))
    }

    pub fn set_actor_pose(&mut self, body: RigidBodyHandle, pose: Transform) -> bool {
        match self.bodies.get_mut(body) {
            Some(rb) => {
                rb.set_translation(pose.translation, true);
                rb.set_rotation(pose.rotation, true);
                true
            }
            None => false,
        }
    }

    pub fn linear_velocity(&self, body: RigidBodyHandle) -> Option<Vec3> {
        self.bodies.get(body).map(|rb| *rb.linvel())
    }

    pub fn set_linear_velocity(&mut self, body: RigidBodyHandle, velocity: Vec3) -> bool {
        match self.bodies.get_mut(body) {
            Some(rb) => {
                rb.set_linvel(velocity, true);
                true
            }
            None => false,
        }
    }

    pub fn shape_filter(&self, shape: ColliderHandle) -> Option<FilterData> {
        self.colliders
            .get(shape)
            .map(|c| FilterData::unpack(c.user_data))
    }

    pub fn set_shape_filter(&mut self, shape: ColliderHandle, filter: FilterData) -> bool {
        match self.colliders.get_mut(shape) {
            Some(collider) => {
                collider.user_data = filter.pack();
                true
            }
            None => false,
        }
    }

    pub fn set_trigger(&mut self, shape: ColliderHandle, is_trigger: bool) -> bool {
        let Some(collider) = self.colliders.get_mut(shape) else {
            return false;
        };
        if collider.is_sensor() != is_trigger {
            collider.set_sensor(is_trigger);
            if is_trigger {
                collider.set_active_collision_types(ActiveCollisionTypes::all());
            } else {
                collider.set_active_collision_types(ActiveCollisionTypes::default());
            }
            let cut = self.forget_touches(shape);
            self.interrupted.extend(cut);
        }
        true
    }

    /// Run one step and report what happened during it.
    pub fn step(&mut self, kind: StepKind, dt: f32) -> WorldNotifications {
        self.params.dt = dt;
        match kind {
            StepKind::Simulate => self.physics_pipeline.step(
                &self.gravity,
                &self.params,
                &mut self.islands,
                &mut self.broad_phase,
                &mut self.narrow_phase,
                &mut self.bodies,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                &mut self.ccd,
                &self.hooks,
                &self.collector,
            ),
            StepKind::CollideOnly => self.collision_pipeline.step(
                COLLIDE_PREDICTION_DISTANCE,
                &mut self.broad_phase,
                &mut self.narrow_phase,
                &mut self.bodies,
                &mut self.colliders,
                &self.hooks,
                &self.collector,
            ),
        }
        self.collect_notifications()
    }

    fn collect_notifications(&mut self) -> WorldNotifications {
        let mut notes = WorldNotifications::new();
        let mut changed = HashSet::new();

        let captured: Vec<CapturedCollision> = self.events.try_iter().collect();
        for event in captured {
            let key = pair_key(event.collider1, event.collider2);
            if event.removed {
                self.touching.shift_remove(&key);
                continue;
            }
            if !event.started && self.interrupted.remove(&key) {
                continue;
            }
            changed.insert(key);

            let kind = if event.sensor {
                TouchKind::Trigger
            } else {
                TouchKind::Contact
            };
            if event.started {
                self.touching.insert(
                    key,
                    Touch {
                        kind,
                        first: event.collider1,
                        second: event.collider2,
                    },
                );
            } else {
                self.touching.shift_remove(&key);
            }

            let touch = if event.started {
                PairFlags::TOUCH_FOUND
            } else {
                PairFlags::TOUCH_LOST
            };
            let requested = self.event_flags(event.collider1, event.collider2);
            let status = touch & requested;
            if status.is_empty() {
                continue;
            }

            match kind {
                TouchKind::Trigger => {
                    if let Some(pair) = self.trigger_pair(event.collider1, event.collider2, status) {
                        notes.triggers.push(pair);
                    }
                }
                TouchKind::Contact => {
                    let points = if event.started && requested.has(PairFlag::NotifyContactPoints) {
                        self.contact_points(event.collider1, event.collider2)
                    } else {
                        Vec::new()
                    };
                    notes.contacts.push(RawContactPair {
                        shapes: [event.collider1, event.collider2],
                        events: status,
                        points,
                    });
                }
            }
        }

        for (key, touch) in &self.touching {
            if touch.kind != TouchKind::Contact || changed.contains(key) {
                continue;
            }
            if !self.is_awake(touch.first) && !self.is_awake(touch.second) {
                continue;
            }
            let requested = self.event_flags(touch.first, touch.second);
            if !requested.has(PairFlag::NotifyTouchPersists) {
                continue;
            }
            let points = if requested.has(PairFlag::NotifyContactPoints) {
                self.contact_points(touch.first, touch.second)
            } else {
                Vec::new()
            };
            notes.contacts.push(RawContactPair {
                shapes: [touch.first, touch.second],
                events: PairFlags::TOUCH_PERSISTS,
                points,
            });
        }

        for (&body, was_sleeping) in self.sleeping.iter_mut() {
            let Some(rb) = self.bodies.get(body) else {
                continue;
            };
            let now_sleeping = rb.is_sleeping();
            if now_sleeping != *was_sleeping {
                if now_sleeping {
                    notes.slept.push(body);
                } else {
                    notes.woken.push(body);
                }
                *was_sleeping = now_sleeping;
            }
        }

        self.interrupted.clear();
        notes
    }

    /// Static and kinematic bodies never count as awake.
    fn is_awake(&self, shape: ColliderHandle) -> bool {
        self.colliders
            .get(shape)
            .and_then(|c| c.parent())
            .and_then(|body| self.bodies.get(body))
            .is_some_and(|rb| rb.is_dynamic() && !rb.is_sleeping())
    }

    fn event_flags(&self, a: ColliderHandle, b: ColliderHandle) -> PairFlags {
        classify_pair(self.hooks.policy().as_ref(), &self.colliders, a, b)
            .map(|decision| decision.event_flags())
            .unwrap_or_default()
    }

    fn trigger_pair(
        &self,
        a: ColliderHandle,
        b: ColliderHandle,
        status: PairFlags,
    ) -> Option<RawTriggerPair<ColliderHandle, RigidBodyHandle>> {
        let a_is_trigger = self.colliders.get(a)?.is_sensor();
        let (trigger, other) = if a_is_trigger { (a, b) } else { (b, a) };
        Some(RawTriggerPair {
            trigger_shape: trigger,
            trigger_actor: self.colliders.get(trigger)?.parent(),
            other_shape: other,
            other_actor: self.colliders.get(other)?.parent(),
            status,
        })
    }

    fn contact_points(&self, a: ColliderHandle, b: ColliderHandle) -> Vec<relay_shared::ContactPoint> {
        match self.narrow_phase.contact_pair(a, b) {
            Some(pair) => {
                let mut points = extract_contact_points(pair, &self.colliders);
                if pair.collider1 != a {
                    // The engine stores the pair the other way round; report from `a`'s side.
                    for p in &mut points {
                        p.normal = -p.normal;
                        p.impulse = -p.impulse;
                    }
                }
                points
            }
            None => Vec::new(),
        }
    }

    fn forget_touches(&mut self, shape: ColliderHandle) -> Vec<PairKey> {
        let mut forgotten = Vec::new();
        self.touching.retain(|key, touch| {
            let keep = touch.first != shape && touch.second != shape;
            if !keep {
                forgotten.push(*key);
            }
            keep
        });
        forgotten
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Geometry, ShapeDesc};
    use relay_shared::GroupMaskPairFilter;

    fn ball(id: u32, at: Vec3) -> ActorDesc {
        ActorDesc::dynamic(id, Transform::from_translation(at))
            .with_shape(ShapeDesc::new(id, Geometry::Sphere { radius: 0.5 }))
    }

    fn world() -> PhysicsWorld {
        PhysicsWorld::new(Vec3::zeros(), 1.0 / 60.0, Arc::new(GroupMaskPairFilter))
    }

    #[test]
    fn pair_key_ignores_order() {
        let mut colliders = ColliderSet::new();
        let a = colliders.insert(ColliderBuilder::ball(1.0).build());
        let b = colliders.insert(ColliderBuilder::ball(1.0).build());

        assert_eq!(pair_key(a, b), pair_key(b, a));
    }

    #[test]
    fn overlapping_balls_begin_then_persist() {
        let mut world = world();
        world.insert_actor(&ball(1, Vec3::zeros())).unwrap();
        world.insert_actor(&ball(2, Vec3::new(0.4, 0.0, 0.0))).unwrap();

        let first = world.step(StepKind::Simulate, 1.0 / 60.0);
        assert_eq!(first.contacts.len(), 1);
        assert!(first.contacts[0].events.has(PairFlag::NotifyTouchFound));
        assert!(!first.contacts[0].points.is_empty());

        let second = world.step(StepKind::Simulate, 1.0 / 60.0);
        assert_eq!(second.contacts.len(), 1);
        assert_eq!(second.contacts[0].events, PairFlags::TOUCH_PERSISTS);
    }

    #[test]
    fn removing_an_actor_reports_no_lost_touch() {
        let mut world = world();
        world.insert_actor(&ball(1, Vec3::zeros())).unwrap();
        let (second, _) = world.insert_actor(&ball(2, Vec3::new(0.4, 0.0, 0.0))).unwrap();
        world.step(StepKind::Simulate, 1.0 / 60.0);

        let removed = world.remove_actor(second);
        assert_eq!(removed.len(), 1);

        let after = world.step(StepKind::Simulate, 1.0 / 60.0);
        assert!(after.contacts.is_empty());
    }

    #[test]
    fn trigger_toggle_swallows_the_interrupted_stop() {
        let mut world = world();
        let (_, first) = world.insert_actor(&ball(1, Vec3::zeros())).unwrap();
        world.insert_actor(&ball(2, Vec3::new(0.4, 0.0, 0.0))).unwrap();
        world.step(StepKind::Simulate, 1.0 / 60.0);

        assert!(world.set_trigger(first[0], true));
        let after = world.step(StepKind::Simulate, 1.0 / 60.0);

        assert!(after.contacts.is_empty());
        assert_eq!(after.triggers.len(), 1);
        assert!(world.interrupted.is_empty());
    }

    #[test]
    fn collider_pose_follows_a_moved_body_before_stepping() {
        let mut world = world();
        let (body, shapes) = world.insert_actor(&ball(1, Vec3::zeros())).unwrap();

        world.set_actor_pose(body, Transform::from_translation(Vec3::new(3.0, 0.0, 0.0)));

        let collider = &world.colliders()[shapes[0]];
        assert_eq!(world.collider_pose(collider).translation.vector, Vec3::new(3.0, 0.0, 0.0));
    }

    #[test]
    fn collide_only_does_not_move_bodies() {
        let mut world = PhysicsWorld::new(
            Vec3::new(0.0, -9.81, 0.0),
            1.0 / 60.0,
            Arc::new(GroupMaskPairFilter),
        );
        let (body, _) = world.insert_actor(&ball(1, Vec3::new(0.0, 5.0, 0.0))).unwrap();

        world.step(StepKind::CollideOnly, 1.0 / 60.0);

        let pose = world.actor_pose(body).unwrap();
        assert_eq!(pose.translation, Vec3::new(0.0, 5.0, 0.0));
    }
}
