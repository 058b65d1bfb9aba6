/// Maximum number of contact points copied into a single [`crate::ContactRecord`].
///
/// Raw engine manifolds may report more points than this; the aggregator clamps the count
/// and copies the first `MAX_CONTACT_POINTS` in manifold order.
pub const MAX_CONTACT_POINTS: usize = 4;

/// Default capacity of the hit buffer used by all-hits queries.
///
/// Hits beyond the capacity are discarded and reported through the truncation flag.
pub const DEFAULT_HIT_CAPACITY: usize = 1024;

/// Group bits given to shapes that never set a simulation filter.
pub const DEFAULT_FILTER_GROUP: u32 = 0x1;

/// Collision mask given to shapes that never set a simulation filter (collide with all).
pub const DEFAULT_FILTER_MASK: u32 = u32::MAX;

/// Default vertex limit passed to convex hull cooking.
///
/// Hulls with more vertices are rejected instead of being silently simplified.
pub const DEFAULT_CONVEX_VERTEX_LIMIT: usize = 255;

/// Standard gravity (m/s^2) along -Y.
pub const STANDARD_GRAVITY: f32 = 9.81;
