//! Integration test: raycasts and sweeps marshaled into identifier results.

mod common;

use common::*;
use relay_scene::{
    ActorDesc, Geometry, HeightFieldDesc, RaycastQuery, Scene, SceneConfig, SceneError, ShapeDesc,
    SweepQuery, cook_height_field,
};
use relay_shared::{FilterData, QueryFilterData, QueryResult, Transform, Vec3};

fn ray_along_z() -> RaycastQuery {
    RaycastQuery::new(Vec3::zeros(), Vec3::z(), 100.0)
}

/// `count` static balls of radius 0.5 on the +Z axis, two meters apart.
fn row_of_balls(scene: &mut Scene, count: u32) {
    for i in 0..count {
        let z = 2.0 + 2.0 * i as f32;
        scene
            .add_actor(&static_ball(100 + i, 200 + i, Vec3::new(0.0, 0.0, z), 0.5))
            .unwrap();
    }
}

#[test]
fn closest_on_empty_scene_is_a_zeroed_miss() {
    let (scene, _events) = weightless(0);

    let result = scene.raycast_closest(&ray_along_z()).unwrap();

    assert_eq!(result, QueryResult::miss());
    assert!(!result.found);
    assert_eq!(result.actor, 0);
    assert_eq!(result.position, Vec3::zeros());
}

#[test]
fn closest_raycast_reports_identifiers_and_surface() {
    let (mut scene, _events) = weightless(0);
    scene.add_actor(&static_ball(7, 70, Vec3::new(0.0, 0.0, 5.0), 1.0)).unwrap();

    let result = scene.raycast_closest(&ray_along_z()).unwrap();

    assert!(result.found);
    assert_eq!(result.actor, 7);
    assert_eq!(result.shape, 70);
    assert!((result.position.z - 4.0).abs() < 1.0e-4);
    assert!((result.normal - Vec3::new(0.0, 0.0, -1.0)).norm() < 1.0e-4);
}

#[test]
fn closest_raycast_picks_the_nearest_of_many() {
    let (mut scene, _events) = weightless(0);
    row_of_balls(&mut scene, 3);

    let result = scene.raycast_closest(&ray_along_z()).unwrap();

    assert_eq!(result.shape, 200);
}

#[test]
fn raycasts_skip_triggers() {
    let (mut scene, _events) = weightless(0);
    let zone = ActorDesc::fixed(1, Transform::from_translation(Vec3::new(0.0, 0.0, 3.0)))
        .with_shape(ShapeDesc::new(10, Geometry::Sphere { radius: 1.0 }).trigger());
    scene.add_actor(&zone).unwrap();

    assert!(!scene.raycast_closest(&ray_along_z()).unwrap().found);
    assert_eq!(scene.raycast_all(&ray_along_z()).unwrap().filled(), 0);
}

#[test]
fn query_group_must_overlap_shape_group() {
    let (mut scene, _events) = weightless(0);
    let desc = ActorDesc::fixed(1, Transform::from_translation(Vec3::new(0.0, 0.0, 3.0)))
        .with_shape(
            ShapeDesc::new(10, Geometry::Sphere { radius: 1.0 })
                .with_filter(FilterData::standard().with_simulation(0x2, u32::MAX)),
        );
    scene.add_actor(&desc).unwrap();

    let only_group_one = ray_along_z().with_filter(QueryFilterData::new(0x1, u32::MAX));
    assert!(!scene.raycast_closest(&only_group_one).unwrap().found);

    let group_two = ray_along_z().with_filter(QueryFilterData::new(0x2, u32::MAX));
    assert!(scene.raycast_closest(&group_two).unwrap().found);
}

#[test]
fn all_hits_truncate_at_capacity() {
    let (mut scene, _events) = Scene::with_channel(
        SceneConfig::default()
            .with_worker_count(0)
            .with_hit_capacity(3),
    )
    .unwrap();
    row_of_balls(&mut scene, 5);

    let hits = scene.raycast_all(&ray_along_z()).unwrap();

    assert_eq!(hits.filled(), 3);
    assert!(hits.truncated);
}

#[test]
fn all_hits_below_capacity_are_complete() {
    let (mut scene, _events) = weightless(0);
    row_of_balls(&mut scene, 5);

    let hits = scene.raycast_all(&ray_along_z()).unwrap();

    assert_eq!(hits.filled(), 5);
    assert!(!hits.truncated);
    let mut shapes: Vec<_> = hits.results.iter().map(|r| r.shape).collect();
    shapes.sort();
    assert_eq!(shapes, vec![200, 201, 202, 203, 204]);
}

#[test]
fn max_distance_bounds_all_hits() {
    let (mut scene, _events) = weightless(0);
    row_of_balls(&mut scene, 5);

    // Reaches the balls centered at z = 2 and z = 4 only.
    let hits = scene
        .raycast_all(&RaycastQuery::new(Vec3::zeros(), Vec3::z(), 4.0))
        .unwrap();

    assert_eq!(hits.filled(), 2);
}

#[test]
fn zero_direction_is_an_invalid_argument() {
    let (scene, _events) = weightless(0);

    let err = scene
        .raycast_closest(&RaycastQuery::new(Vec3::zeros(), Vec3::zeros(), 10.0))
        .unwrap_err();

    assert!(matches!(err, SceneError::InvalidArgument(_)));
}

#[test]
fn sweep_closest_stops_at_first_contact() {
    let (mut scene, _events) = weightless(0);
    scene.add_actor(&static_ball(7, 70, Vec3::new(0.0, 0.0, 5.0), 1.0)).unwrap();

    let sweep = SweepQuery::new(
        Geometry::Sphere { radius: 0.5 },
        Transform::default(),
        Vec3::z(),
        10.0,
    );
    let result = scene.sweep_closest(&sweep).unwrap();

    assert!(result.found);
    assert_eq!(result.shape, 70);
    assert!((result.position.z - 4.0).abs() < 1.0e-3);
}

#[test]
fn sweep_inflation_widens_the_hit_corridor() {
    let (mut scene, _events) = weightless(0);
    // Clears the swept sphere by 0.7 m.
    scene.add_actor(&static_ball(7, 70, Vec3::new(1.7, 0.0, 5.0), 0.5)).unwrap();

    let sweep = SweepQuery::new(
        Geometry::Sphere { radius: 0.5 },
        Transform::default(),
        Vec3::z(),
        10.0,
    );
    assert!(!scene.sweep_closest(&sweep).unwrap().found);

    let inflated = sweep.with_inflation(1.0);
    assert!(scene.sweep_closest(&inflated).unwrap().found);
    assert_eq!(scene.sweep_all(&inflated).unwrap().filled(), 1);
}

#[test]
fn queries_are_rejected_while_stepping() {
    let (mut scene, _events) = weightless(1);
    row_of_balls(&mut scene, 1);

    scene.simulate(DT).unwrap();
    assert!(matches!(
        scene.raycast_closest(&ray_along_z()),
        Err(SceneError::SceneBusy)
    ));
    scene.fetch_results(true).unwrap();

    assert!(scene.raycast_closest(&ray_along_z()).unwrap().found);
}

#[test]
fn raycast_lands_on_cooked_terrain() {
    let (mut scene, _events) = weightless(0);
    let terrain = cook_height_field(&HeightFieldDesc {
        rows: 3,
        cols: 3,
        samples: vec![2; 9],
        height_scale: 0.5,
        row_scale: 1.0,
        col_scale: 1.0,
    })
    .unwrap();
    scene
        .add_actor(
            &ActorDesc::fixed(1, Transform::default())
                .with_shape(ShapeDesc::new(10, Geometry::Cooked(terrain))),
        )
        .unwrap();

    let down = RaycastQuery::new(Vec3::new(0.5, 10.0, 0.5), -Vec3::y(), 20.0);
    let result = scene.raycast_closest(&down).unwrap();

    assert!(result.found);
    assert_eq!(result.shape, 10);
    assert!((result.position.y - 1.0).abs() < 1.0e-4);
}

#[test]
fn raycast_starting_inside_a_shape_reports_the_reverse_direction() {
    let (mut scene, _events) = weightless(0);
    scene.add_actor(&static_ball(1, 10, Vec3::zeros(), 0.5)).unwrap();
    let crate_box = ActorDesc::fixed(2, Transform::from_translation(Vec3::new(10.0, 0.0, 0.0)))
        .with_shape(ShapeDesc::new(
            20,
            Geometry::Cuboid {
                half_extents: Vec3::new(1.0, 1.0, 1.0),
            },
        ));
    scene.add_actor(&crate_box).unwrap();

    let from_center = scene.raycast_closest(&ray_along_z()).unwrap();
    assert!(from_center.found);
    assert_eq!(from_center.shape, 10);
    assert_eq!(from_center.position, Vec3::zeros());
    assert_eq!(from_center.normal, -Vec3::z());

    let inside_box = RaycastQuery::new(Vec3::new(10.2, 0.0, 0.0), Vec3::y(), 5.0);
    let result = scene.raycast_closest(&inside_box).unwrap();
    assert_eq!(result.shape, 20);
    assert_eq!(result.normal, -Vec3::y());
}

#[test]
fn sweep_starting_in_overlap_reports_the_reverse_direction() {
    let (mut scene, _events) = weightless(0);
    scene.add_actor(&static_ball(7, 70, Vec3::new(0.0, 0.0, 0.6), 0.5)).unwrap();

    let sweep = SweepQuery::new(
        Geometry::Sphere { radius: 0.5 },
        Transform::default(),
        Vec3::x(),
        10.0,
    );
    let closest = scene.sweep_closest(&sweep).unwrap();
    assert!(closest.found);
    assert_eq!(closest.position, Vec3::zeros());
    assert_eq!(closest.normal, -Vec3::x());
    assert!(closest.normal.iter().all(|c| c.is_finite()));

    let all = scene.sweep_all(&sweep).unwrap();
    assert_eq!(all.filled(), 1);
    assert_eq!(all.results[0].normal, -Vec3::x());
}
