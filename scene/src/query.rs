//! Raycasts and sweeps against a [`PhysicsWorld`], producing raw hits for the marshaler.
//!
//! Queries scan the collider set in arena order (the discovery order reported to the host),
//! prune by AABB and run the exact parry query per candidate. Collider poses are derived
//! from their parent bodies, so actors moved or added since the last step are seen at
//! their current pose.

use rapier3d::parry::bounding_volume::{Aabb, BoundingVolume};
use rapier3d::parry::query::{self as pquery, ShapeCastOptions};
use rapier3d::prelude::*;
use relay_shared::{
    FilterData, HitBuffer, QueryFilterData, QueryFilterPolicy, QueryHitType, RawHit, Transform,
    Vec3,
};

use crate::error::SceneError;
use crate::geometry::Geometry;
use crate::settings::MIN_DIRECTION_LENGTH;
use crate::world::PhysicsWorld;

pub(crate) type WorldHit = RawHit<ColliderHandle, RigidBodyHandle>;

#[derive(Clone, Copy, Debug)]
pub struct RaycastQuery {
    pub origin: Vec3,
    /// Need not be normalized.
    pub direction: Vec3,
    pub max_distance: f32,
    pub filter: QueryFilterData,
}

impl RaycastQuery {
    pub fn new(origin: Vec3, direction: Vec3, max_distance: f32) -> Self {
        Self {
            origin,
            direction,
            max_distance,
            filter: QueryFilterData::default(),
        }
    }

    pub fn with_filter(mut self, filter: QueryFilterData) -> Self {
        self.filter = filter;
        self
    }
}

#[derive(Clone, Debug)]
pub struct SweepQuery {
    pub geometry: Geometry,
    pub pose: Transform,
    /// Need not be normalized.
    pub direction: Vec3,
    pub max_distance: f32,
    /// Extra radius around the swept geometry; hits within it count.
    pub inflation: f32,
    pub filter: QueryFilterData,
}

impl SweepQuery {
    pub fn new(geometry: Geometry, pose: Transform, direction: Vec3, max_distance: f32) -> Self {
        Self {
            geometry,
            pose,
            direction,
            max_distance,
            inflation: 0.0,
            filter: QueryFilterData::default(),
        }
    }

    pub fn with_inflation(mut self, inflation: f32) -> Self {
        self.inflation = inflation;
        self
    }

    pub fn with_filter(mut self, filter: QueryFilterData) -> Self {
        self.filter = filter;
        self
    }
}

fn unit_direction(direction: Vec3, max_distance: f32) -> Result<Vec3, SceneError> {
    if !max_distance.is_finite() || max_distance < 0.0 {
        return Err(SceneError::invalid("max distance must be finite and non-negative"));
    }
    let length = direction.norm();
    if !length.is_finite() || length < MIN_DIRECTION_LENGTH {
        return Err(SceneError::invalid("query direction must be non-zero"));
    }
    Ok(direction / length)
}

fn verdict(policy: &dyn QueryFilterPolicy, query: &FilterData, collider: &Collider) -> QueryHitType {
    if collider.is_sensor() {
        return QueryHitType::None;
    }
    policy.pre_filter(query, &FilterData::unpack(collider.user_data))
}

fn world_hit(
    world: &PhysicsWorld,
    shape: ColliderHandle,
    position: Vec3,
    normal: Vec3,
    distance: f32,
) -> WorldHit {
    RawHit {
        shape,
        actor: world.colliders().get(shape).and_then(|c| c.parent()),
        position,
        normal,
        distance,
    }
}

/// Hits at distance zero started in contact and carry the normal opposite the travel
/// direction. No non-finite or zero normal leaves a query.
fn hit_normal(normal: Vec3, distance: f32, direction: Vec3) -> Vec3 {
    let usable = normal.iter().all(|c| c.is_finite()) && normal.norm_squared() > 0.0;
    if distance <= 0.0 || !usable {
        -direction
    } else {
        normal
    }
}

/// Keep hits up to and including the nearest blocking hit, in discovery order.
fn clip_at_block(candidates: Vec<(QueryHitType, WorldHit)>) -> Vec<WorldHit> {
    let block = candidates
        .iter()
        .enumerate()
        .filter(|(_, (kind, _))| *kind == QueryHitType::Block)
        .min_by(|(_, (_, a)), (_, (_, b))| a.distance.total_cmp(&b.distance))
        .map(|(i, (_, hit))| (i, hit.distance));

    match block {
        None => candidates.into_iter().map(|(_, hit)| hit).collect(),
        Some((block_index, block_distance)) => candidates
            .into_iter()
            .enumerate()
            .filter(|(i, (kind, hit))| {
                *i == block_index
                    || (*kind == QueryHitType::Touch && hit.distance <= block_distance)
            })
            .map(|(_, (_, hit))| hit)
            .collect(),
    }
}

fn nearest(candidates: Vec<(QueryHitType, WorldHit)>) -> Option<WorldHit> {
    // `min_by` keeps the first of equal elements, so ties go to discovery order.
    candidates
        .into_iter()
        .map(|(_, hit)| hit)
        .min_by(|a, b| a.distance.total_cmp(&b.distance))
}

fn fill(buffer: &mut HitBuffer<ColliderHandle, RigidBodyHandle>, hits: Vec<WorldHit>) {
    for hit in hits {
        if !buffer.push(hit) {
            break;
        }
    }
}

fn raycast_candidates(
    world: &PhysicsWorld,
    policy: &dyn QueryFilterPolicy,
    query: &RaycastQuery,
) -> Result<Vec<(QueryHitType, WorldHit)>, SceneError> {
    let direction = unit_direction(query.direction, query.max_distance)?;
    let ray = Ray::new(Point::from(query.origin), direction);
    let query_filter = query.filter.filter();
    let segment = segment_aabb(query.origin, query.origin + direction * query.max_distance);

    let mut candidates = Vec::new();
    for (handle, collider) in world.colliders().iter() {
        let kind = verdict(policy, &query_filter, collider);
        if kind == QueryHitType::None {
            continue;
        }
        let pose = world.collider_pose(collider);
        if !segment.intersects(&collider.shape().compute_aabb(&pose)) {
            continue;
        }
        if let Some(hit) =
            collider
                .shape()
                .cast_ray_and_get_normal(&pose, &ray, query.max_distance, true)
        {
            let position = ray.point_at(hit.time_of_impact).coords;
            let normal = hit_normal(hit.normal, hit.time_of_impact, direction);
            candidates.push((
                kind,
                world_hit(world, handle, position, normal, hit.time_of_impact),
            ));
        }
    }
    Ok(candidates)
}

pub(crate) fn raycast_closest(
    world: &PhysicsWorld,
    policy: &dyn QueryFilterPolicy,
    query: &RaycastQuery,
) -> Result<Option<WorldHit>, SceneError> {
    Ok(nearest(raycast_candidates(world, policy, query)?))
}

pub(crate) fn raycast_all(
    world: &PhysicsWorld,
    policy: &dyn QueryFilterPolicy,
    query: &RaycastQuery,
    buffer: &mut HitBuffer<ColliderHandle, RigidBodyHandle>,
) -> Result<(), SceneError> {
    fill(buffer, clip_at_block(raycast_candidates(world, policy, query)?));
    Ok(())
}

fn sweep_candidates(
    world: &PhysicsWorld,
    policy: &dyn QueryFilterPolicy,
    query: &SweepQuery,
) -> Result<Vec<(QueryHitType, WorldHit)>, SceneError> {
    let direction = unit_direction(query.direction, query.max_distance)?;
    if !query.inflation.is_finite() || query.inflation < 0.0 {
        return Err(SceneError::invalid("inflation must be finite and non-negative"));
    }
    let shape = query.geometry.to_shape()?;
    let start = query.pose.iso();
    let mut end = start;
    end.translation.vector += direction * query.max_distance;

    let swept = shape
        .compute_aabb(&start)
        .merged(&shape.compute_aabb(&end))
        .loosened(query.inflation);
    let query_filter = query.filter.filter();

    let mut options = ShapeCastOptions::with_max_time_of_impact(query.max_distance);
    options.target_distance = query.inflation;
    options.stop_at_penetration = true;

    let mut candidates = Vec::new();
    for (handle, collider) in world.colliders().iter() {
        let kind = verdict(policy, &query_filter, collider);
        if kind == QueryHitType::None {
            continue;
        }
        let target = world.collider_pose(collider);
        if !swept.intersects(&collider.shape().compute_aabb(&target)) {
            continue;
        }
        let cast = pquery::cast_shapes(
            &start,
            &direction,
            shape.as_ref(),
            &target,
            &Vector::zeros(),
            collider.shape(),
            options,
        );
        if let Ok(Some(hit)) = cast {
            // Witnesses of an initial overlap are not surface points.
            let position = if hit.time_of_impact <= 0.0 {
                query.pose.translation
            } else {
                (target * hit.witness2).coords
            };
            let normal = hit_normal(
                target.rotation * hit.normal2.into_inner(),
                hit.time_of_impact,
                direction,
            );
            candidates.push((
                kind,
                world_hit(world, handle, position, normal, hit.time_of_impact),
            ));
        }
    }
    Ok(candidates)
}

pub(crate) fn sweep_closest(
    world: &PhysicsWorld,
    policy: &dyn QueryFilterPolicy,
    query: &SweepQuery,
) -> Result<Option<WorldHit>, SceneError> {
    Ok(nearest(sweep_candidates(world, policy, query)?))
}

pub(crate) fn sweep_all(
    world: &PhysicsWorld,
    policy: &dyn QueryFilterPolicy,
    query: &SweepQuery,
    buffer: &mut HitBuffer<ColliderHandle, RigidBodyHandle>,
) -> Result<(), SceneError> {
    let candidates = sweep_candidates(world, policy, query)?;
    fill(buffer, clip_at_block(candidates));
    Ok(())
}

fn segment_aabb(a: Vec3, b: Vec3) -> Aabb {
    Aabb::new(Point::from(a.inf(&b)), Point::from(a.sup(&b)))
}
