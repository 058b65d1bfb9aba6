//! Captures the engine's collision events during a step.

use crossbeam_channel::{Receiver, Sender};
use rapier3d::prelude::*;
use relay_shared::{ContactPoint, Vec3};

/// One collision start/stop event as emitted by the engine, in emission order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct CapturedCollision {
    pub collider1: ColliderHandle,
    pub collider2: ColliderHandle,
    pub started: bool,
    pub sensor: bool,
    /// Caused by a collider being removed rather than by motion.
    pub removed: bool,
}

impl From<CollisionEvent> for CapturedCollision {
    fn from(event: CollisionEvent) -> Self {
        Self {
            collider1: event.collider1(),
            collider2: event.collider2(),
            started: event.started(),
            sensor: event.sensor(),
            removed: event.removed(),
        }
    }
}

/// `EventHandler` forwarding collision events over a channel.
///
/// The engine may call the handler from its own worker threads, so events travel over a
/// channel instead of being pushed into shared state.
pub(crate) struct StepEventCollector {
    tx: Sender<CapturedCollision>,
}

impl StepEventCollector {
    pub fn new() -> (Self, Receiver<CapturedCollision>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (Self { tx }, rx)
    }
}

impl EventHandler for StepEventCollector {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        // The receiver lives next to the collector in the world; a send can't fail while
        // the step runs.
        let _ = self.tx.send(event.into());
    }

    fn handle_contact_force_event(
        &self,
        _dt: Real,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: Real,
    ) {
    }
}

/// Copy every manifold point of `pair` into world space, in manifold order.
///
/// The normal points from the pair's first collider towards its second; impulses are the
/// solver's normal impulses from the last step.
pub(crate) fn extract_contact_points(pair: &ContactPair, colliders: &ColliderSet) -> Vec<ContactPoint> {
    let Some(co1) = colliders.get(pair.collider1) else {
        return Vec::new();
    };
    let pose = co1.position();

    let mut points = Vec::new();
    for manifold in &pair.manifolds {
        let normal: Vec3 = manifold.data.normal;
        for tracked in &manifold.points {
            points.push(ContactPoint {
                position: (pose * tracked.local_p1).coords,
                normal,
                impulse: normal * tracked.data.impulse,
            });
        }
    }
    points
}
