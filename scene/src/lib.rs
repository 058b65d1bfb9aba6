mod collector;
pub mod config;
pub mod cooking;
mod dispatcher;
pub mod error;
pub mod geometry;
mod hooks;
pub mod host;
pub mod query;
pub mod scene;
pub mod settings;
mod world;

pub use config::SceneConfig;
pub use cooking::{
    CookedGeometry, CookedKind, HeightFieldDesc, TriangleIndices, cook_convex, cook_height_field,
    cook_triangle_mesh,
};
pub use error::SceneError;
pub use geometry::{ActorDesc, ActorKind, Geometry, Material, ShapeDesc};
pub use host::{SceneHandle, SceneHost, Status};
pub use query::{RaycastQuery, SweepQuery};
pub use scene::{Scene, SceneState};
