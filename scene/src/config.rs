use std::sync::Arc;

use relay_shared::{
    DEFAULT_HIT_CAPACITY, GroupMaskPairFilter, GroupQueryFilter, PairFilterPolicy,
    QueryFilterPolicy, STANDARD_GRAVITY, UnresolvedPolicy, Vec3,
};

use crate::settings::{DEFAULT_TIMESTEP, DEFAULT_WORKER_COUNT};

/// Construction-time settings for a [`crate::Scene`].
///
/// Policies are shared immutable strategy objects; several scenes may hold the same `Arc`.
#[derive(Clone, Debug)]
pub struct SceneConfig {
    pub gravity: Vec3,
    /// Step worker threads. Zero steps inline inside `fetch_results`.
    pub worker_count: usize,
    /// Capacity of the hit buffer used by all-hits queries.
    pub hit_capacity: usize,
    /// Default integration timestep; `simulate(dt)` overrides it per step.
    pub timestep: f32,
    pub unresolved: UnresolvedPolicy,
    pub pair_filter: Arc<dyn PairFilterPolicy>,
    pub query_filter: Arc<dyn QueryFilterPolicy>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -STANDARD_GRAVITY, 0.0),
            worker_count: DEFAULT_WORKER_COUNT,
            hit_capacity: DEFAULT_HIT_CAPACITY,
            timestep: DEFAULT_TIMESTEP,
            unresolved: UnresolvedPolicy::default(),
            pair_filter: Arc::new(GroupMaskPairFilter),
            query_filter: Arc::new(GroupQueryFilter),
        }
    }
}

impl SceneConfig {
    pub fn with_gravity(mut self, gravity: Vec3) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    pub fn with_hit_capacity(mut self, hit_capacity: usize) -> Self {
        self.hit_capacity = hit_capacity;
        self
    }

    pub fn with_timestep(mut self, timestep: f32) -> Self {
        self.timestep = timestep;
        self
    }

    pub fn with_unresolved_policy(mut self, policy: UnresolvedPolicy) -> Self {
        self.unresolved = policy;
        self
    }

    pub fn with_pair_filter(mut self, policy: Arc<dyn PairFilterPolicy>) -> Self {
        self.pair_filter = policy;
        self
    }

    pub fn with_query_filter(mut self, policy: Arc<dyn QueryFilterPolicy>) -> Self {
        self.query_filter = policy;
        self
    }
}
