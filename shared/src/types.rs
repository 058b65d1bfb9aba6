use nalgebra as na;

/// Common math aliases for clarity and consistency.
pub type Vec3 = na::Vector3<f32>;
pub type Quat = na::UnitQuaternion<f32>;
pub type Iso = na::Isometry3<f32>;

/// Opaque caller-assigned identifier for a shape or an actor.
///
/// Unique among the live shapes (respectively actors) of a scene. Identifiers never keep the
/// underlying engine object alive.
pub type Identifier = u32;

/// A rigid transform (isometry) in world space, as exchanged with the host.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
}

impl Transform {
    #[inline]
    pub fn new(translation: Vec3, rotation: Quat) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    #[inline]
    pub fn from_translation(translation: Vec3) -> Self {
        Self::new(translation, Quat::identity())
    }

    /// Convert to nalgebra `Isometry3` for engine and parry3d calls.
    #[inline]
    pub fn iso(&self) -> Iso {
        Iso::from_parts(
            na::Translation3::new(self.translation.x, self.translation.y, self.translation.z),
            self.rotation,
        )
    }

    #[inline]
    pub fn from_iso(iso: &Iso) -> Self {
        Self::new(iso.translation.vector, iso.rotation)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::from_translation(Vec3::zeros())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iso_round_trips_translation_and_rotation() {
        let rotation = Quat::from_euler_angles(0.1, 0.2, 0.3);
        let t = Transform::new(Vec3::new(1.0, -2.0, 3.5), rotation);

        let back = Transform::from_iso(&t.iso());

        assert_eq!(back.translation, t.translation);
        assert!(back.rotation.angle_to(&rotation) < 1.0e-6);
    }
}
