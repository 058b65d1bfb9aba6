//! Scene builders shared by the integration tests.

#![allow(dead_code)]

use crossbeam_channel::Receiver;
use relay_scene::{ActorDesc, Geometry, Scene, SceneConfig, ShapeDesc};
use relay_shared::{EventBatch, EventCategory, Identifier, Transform, Vec3};

pub const DT: f32 = 1.0 / 60.0;

pub fn weightless(worker_count: usize) -> (Scene, Receiver<EventBatch>) {
    Scene::with_channel(
        SceneConfig::default()
            .with_gravity(Vec3::zeros())
            .with_worker_count(worker_count),
    )
    .unwrap()
}

pub fn ball(actor: Identifier, shape: Identifier, at: Vec3, radius: f32) -> ActorDesc {
    ActorDesc::dynamic(actor, Transform::from_translation(at))
        .with_shape(ShapeDesc::new(shape, Geometry::Sphere { radius }))
}

pub fn static_ball(actor: Identifier, shape: Identifier, at: Vec3, radius: f32) -> ActorDesc {
    ActorDesc::fixed(actor, Transform::from_translation(at))
        .with_shape(ShapeDesc::new(shape, Geometry::Sphere { radius }))
}

pub fn ground(actor: Identifier, shape: Identifier) -> ActorDesc {
    ActorDesc::fixed(actor, Transform::default()).with_shape(ShapeDesc::new(shape, Geometry::Plane))
}

/// Step once and return the batches flushed by it.
pub fn step(scene: &mut Scene, events: &Receiver<EventBatch>) -> Vec<EventBatch> {
    scene.step(DT).unwrap();
    events.try_iter().collect()
}

pub fn categories(batches: &[EventBatch]) -> Vec<EventCategory> {
    batches.iter().map(EventBatch::category).collect()
}

pub fn find(batches: &[EventBatch], category: EventCategory) -> Option<&EventBatch> {
    batches.iter().find(|b| b.category() == category)
}
