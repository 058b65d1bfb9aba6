/*!
Scene stepping and query tunables.

Notes
- Distances are in meters, time in seconds.
- These are defaults; per-scene values live on [`crate::SceneConfig`].
*/

/// Timestep used when the host does not override it on the config (seconds).
pub const DEFAULT_TIMESTEP: f32 = 1.0 / 60.0;

/// Number of step worker threads a scene gets by default.
///
/// Zero runs every step on the calling thread inside `fetch_results`.
pub const DEFAULT_WORKER_COUNT: usize = 1;

/// Contact prediction distance used by the collision-detection-only phase (meters).
///
/// Pairs closer than this get manifolds even before they touch, matching what a full
/// simulation step would report.
pub const COLLIDE_PREDICTION_DISTANCE: f32 = 0.002;

/// Shortest ray/sweep direction accepted before normalization.
pub const MIN_DIRECTION_LENGTH: f32 = 1.0e-6;

/// Prefix for step worker thread names; the worker index is appended.
pub const WORKER_THREAD_PREFIX: &str = "relay-step";
