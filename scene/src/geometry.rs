//! Actor and shape descriptions and their Rapier builders.

use rapier3d::prelude::*;
use relay_shared::{FilterData, Identifier, Transform, Vec3};

use crate::cooking::CookedGeometry;
use crate::error::SceneError;

/// Supported collision geometry.
#[derive(Clone, Debug)]
pub enum Geometry {
    /// Infinite plane (half-space) whose outward normal is the shape's local +Y.
    ///
    /// Planes are static-only: a half-space has no finite mass.
    Plane,

    /// Oriented cuboid with given half-extents (meters).
    Cuboid { half_extents: Vec3 },

    /// Sphere/ball (meters).
    Sphere { radius: f32 },

    /// Y-aligned capsule (meters).
    CapsuleY { radius: f32, half_height: f32 },

    /// Y-aligned cylinder (meters).
    CylinderY { radius: f32, half_height: f32 },

    /// Y-aligned cone (meters).
    ConeY { radius: f32, half_height: f32 },

    /// Rounded cuboid (meters).
    ///
    /// `border_radius` rounds all edges/corners.
    RoundCuboid {
        half_extents: Vec3,
        border_radius: f32,
    },

    /// Y-aligned rounded cylinder (meters).
    RoundCylinderY {
        radius: f32,
        half_height: f32,
        border_radius: f32,
    },

    /// Y-aligned rounded cone (meters).
    RoundConeY {
        radius: f32,
        half_height: f32,
        border_radius: f32,
    },

    /// Output of [`crate::cooking`].
    Cooked(CookedGeometry),
}

impl Geometry {
    /// Build the engine shape. Dimensions must be finite and positive.
    pub fn to_shape(&self) -> Result<SharedShape, SceneError> {
        let shape = match self {
            Geometry::Plane => SharedShape::new(HalfSpace::new(Vector::y_axis())),
            Geometry::Cuboid { half_extents } => {
                positive(&[half_extents.x, half_extents.y, half_extents.z])?;
                SharedShape::cuboid(half_extents.x, half_extents.y, half_extents.z)
            }
            Geometry::Sphere { radius } => {
                positive(&[*radius])?;
                SharedShape::ball(*radius)
            }
            Geometry::CapsuleY {
                radius,
                half_height,
            } => {
                positive(&[*radius, *half_height])?;
                SharedShape::capsule_y(*half_height, *radius)
            }
            Geometry::CylinderY {
                radius,
                half_height,
            } => {
                positive(&[*radius, *half_height])?;
                SharedShape::cylinder(*half_height, *radius)
            }
            Geometry::ConeY {
                radius,
                half_height,
            } => {
                positive(&[*radius, *half_height])?;
                SharedShape::cone(*half_height, *radius)
            }
            Geometry::RoundCuboid {
                half_extents,
                border_radius,
            } => {
                positive(&[half_extents.x, half_extents.y, half_extents.z, *border_radius])?;
                SharedShape::round_cuboid(
                    half_extents.x,
                    half_extents.y,
                    half_extents.z,
                    *border_radius,
                )
            }
            Geometry::RoundCylinderY {
                radius,
                half_height,
                border_radius,
            } => {
                positive(&[*radius, *half_height, *border_radius])?;
                SharedShape::round_cylinder(*half_height, *radius, *border_radius)
            }
            Geometry::RoundConeY {
                radius,
                half_height,
                border_radius,
            } => {
                positive(&[*radius, *half_height, *border_radius])?;
                SharedShape::round_cone(*half_height, *radius, *border_radius)
            }
            Geometry::Cooked(cooked) => cooked.shape().clone(),
        };
        Ok(shape)
    }

    pub fn is_plane(&self) -> bool {
        matches!(self, Geometry::Plane)
    }
}

fn positive(values: &[f32]) -> Result<(), SceneError> {
    if values.iter().all(|v| v.is_finite() && *v > 0.0) {
        Ok(())
    } else {
        Err(SceneError::invalid("geometry dimensions must be finite and positive"))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    pub density: f32,
    pub friction: f32,
    pub restitution: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            density: 1.0,
            friction: 0.5,
            restitution: 0.0,
        }
    }
}

/// One shape attached to an actor.
#[derive(Clone, Debug)]
pub struct ShapeDesc {
    pub id: Identifier,
    pub geometry: Geometry,
    /// Pose relative to the owning actor.
    pub local_pose: Transform,
    pub filter: FilterData,
    pub is_trigger: bool,
    pub material: Material,
}

impl ShapeDesc {
    pub fn new(id: Identifier, geometry: Geometry) -> Self {
        Self {
            id,
            geometry,
            local_pose: Transform::default(),
            filter: FilterData::standard(),
            is_trigger: false,
            material: Material::default(),
        }
    }

    pub fn with_local_pose(mut self, pose: Transform) -> Self {
        self.local_pose = pose;
        self
    }

    pub fn with_filter(mut self, filter: FilterData) -> Self {
        self.filter = filter;
        self
    }

    pub fn trigger(mut self) -> Self {
        self.is_trigger = true;
        self
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    /// Build the Rapier collider, carrying the packed filter words as user data.
    pub(crate) fn to_collider(&self) -> Result<Collider, SceneError> {
        let shape = self.geometry.to_shape()?;
        let mut builder = ColliderBuilder::new(shape)
            .translation(self.local_pose.translation)
            .rotation(self.local_pose.rotation.scaled_axis())
            .density(self.material.density)
            .friction(self.material.friction)
            .restitution(self.material.restitution)
            .sensor(self.is_trigger)
            .user_data(self.filter.pack())
            .active_hooks(ActiveHooks::FILTER_CONTACT_PAIRS | ActiveHooks::FILTER_INTERSECTION_PAIR)
            .active_events(ActiveEvents::COLLISION_EVENTS);
        if self.is_trigger {
            // Triggers also watch kinematic and static bodies.
            builder = builder.active_collision_types(ActiveCollisionTypes::all());
        }
        Ok(builder.build())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActorKind {
    Static,
    Dynamic,
    Kinematic,
}

/// An actor and its shapes, as submitted by the host.
#[derive(Clone, Debug)]
pub struct ActorDesc {
    pub id: Identifier,
    pub kind: ActorKind,
    pub pose: Transform,
    pub linear_velocity: Vec3,
    pub shapes: Vec<ShapeDesc>,
}

impl ActorDesc {
    pub fn new(id: Identifier, kind: ActorKind, pose: Transform) -> Self {
        Self {
            id,
            kind,
            pose,
            linear_velocity: Vec3::zeros(),
            shapes: Vec::new(),
        }
    }

    pub fn fixed(id: Identifier, pose: Transform) -> Self {
        Self::new(id, ActorKind::Static, pose)
    }

    pub fn dynamic(id: Identifier, pose: Transform) -> Self {
        Self::new(id, ActorKind::Dynamic, pose)
    }

    pub fn kinematic(id: Identifier, pose: Transform) -> Self {
        Self::new(id, ActorKind::Kinematic, pose)
    }

    pub fn with_shape(mut self, shape: ShapeDesc) -> Self {
        self.shapes.push(shape);
        self
    }

    pub fn with_linear_velocity(mut self, velocity: Vec3) -> Self {
        self.linear_velocity = velocity;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), SceneError> {
        if self.shapes.is_empty() {
            return Err(SceneError::invalid("actor needs at least one shape"));
        }
        if self.kind != ActorKind::Static && self.shapes.iter().any(|s| s.geometry.is_plane()) {
            return Err(SceneError::invalid("planes can only be attached to static actors"));
        }
        let t = self.pose.translation;
        if !(t.x.is_finite() && t.y.is_finite() && t.z.is_finite()) {
            return Err(SceneError::invalid("actor pose must be finite"));
        }
        Ok(())
    }

    pub(crate) fn to_body(&self) -> RigidBody {
        let builder = match self.kind {
            ActorKind::Static => RigidBodyBuilder::fixed(),
            ActorKind::Dynamic => RigidBodyBuilder::dynamic(),
            ActorKind::Kinematic => RigidBodyBuilder::kinematic_velocity_based(),
        };
        builder
            .pose(self.pose.iso())
            .linvel(self.linear_velocity)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_positive_dimensions_are_rejected() {
        let bad = Geometry::CapsuleY {
            radius: 0.5,
            half_height: 0.0,
        };
        assert!(matches!(bad.to_shape(), Err(SceneError::InvalidArgument(_))));
        assert!(Geometry::Sphere { radius: f32::NAN }.to_shape().is_err());
    }

    #[test]
    fn collider_carries_packed_filter_and_trigger_flag() {
        let filter = FilterData::new(0x2, 0x4, 0x10, 7);
        let desc = ShapeDesc::new(1, Geometry::Sphere { radius: 1.0 })
            .with_filter(filter)
            .trigger();

        let collider = desc.to_collider().unwrap();

        assert_eq!(FilterData::unpack(collider.user_data), filter);
        assert!(collider.is_sensor());
    }

    #[test]
    fn planes_on_dynamic_actors_are_rejected() {
        let desc = ActorDesc::dynamic(1, Transform::default())
            .with_shape(ShapeDesc::new(2, Geometry::Plane));
        assert!(desc.validate().is_err());

        let fixed = ActorDesc::fixed(1, Transform::default())
            .with_shape(ShapeDesc::new(2, Geometry::Plane));
        assert!(fixed.validate().is_ok());
    }

    #[test]
    fn actor_without_shapes_is_rejected() {
        assert!(ActorDesc::fixed(1, Transform::default()).validate().is_err());
    }
}
