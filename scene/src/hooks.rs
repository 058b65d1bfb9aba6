//! Adapter installing a [`PairFilterPolicy`] as the engine's contact/intersection hooks.

use std::sync::Arc;

use rapier3d::prelude::*;
use relay_shared::{FilterData, PairDecision, PairFilterPolicy, PairFlag, ShapeFilterInfo};

/// Filter inputs of a collider: its packed words and sensor flag.
pub(crate) fn shape_filter_info(collider: &Collider) -> ShapeFilterInfo {
    ShapeFilterInfo::new(FilterData::unpack(collider.user_data), collider.is_sensor())
}

/// Evaluate the policy for two live colliders. `None` if either no longer exists.
pub(crate) fn classify_pair(
    policy: &dyn PairFilterPolicy,
    colliders: &ColliderSet,
    a: ColliderHandle,
    b: ColliderHandle,
) -> Option<PairDecision> {
    let info_a = shape_filter_info(colliders.get(a)?);
    let info_b = shape_filter_info(colliders.get(b)?);
    Some(policy.classify(&info_a, &info_b))
}

#[derive(Clone, Debug)]
pub struct PairFilterHooks {
    policy: Arc<dyn PairFilterPolicy>,
}

impl PairFilterHooks {
    pub fn new(policy: Arc<dyn PairFilterPolicy>) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &Arc<dyn PairFilterPolicy> {
        &self.policy
    }

    fn decide(&self, context: &PairFilterContext) -> Option<PairDecision> {
        classify_pair(
            self.policy.as_ref(),
            context.colliders,
            context.collider1,
            context.collider2,
        )
    }
}

impl PhysicsHooks for PairFilterHooks {
    fn filter_contact_pair(&self, context: &PairFilterContext) -> Option<SolverFlags> {
        // Missing colliders read as a suppressed pair.
        let decision = self.decide(context)?;
        if !decision.is_accepted() {
            return None;
        }
        if decision.flags.has(PairFlag::SolveContact) {
            Some(SolverFlags::COMPUTE_IMPULSES)
        } else {
            Some(SolverFlags::empty())
        }
    }

    fn filter_intersection_pair(&self, context: &PairFilterContext) -> bool {
        self.decide(context)
            .is_some_and(|decision| decision.is_accepted())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_shared::GroupMaskPairFilter;

    #[test]
    fn classify_pair_reads_user_data_and_sensor_flag() {
        let mut colliders = ColliderSet::new();
        let a = colliders.insert(
            ColliderBuilder::ball(1.0)
                .user_data(FilterData::new(0x1, 0x1, 0, 0).pack())
                .sensor(true)
                .build(),
        );
        let b = colliders.insert(
            ColliderBuilder::ball(1.0)
                .user_data(FilterData::new(0x1, 0x1, 0, 0).pack())
                .sensor(true)
                .build(),
        );

        let decision = classify_pair(&GroupMaskPairFilter, &colliders, a, b).unwrap();

        // Two triggers never interact.
        assert!(!decision.is_accepted());
    }

    #[test]
    fn classify_pair_with_missing_collider_is_none() {
        let mut colliders = ColliderSet::new();
        let a = colliders.insert(ColliderBuilder::ball(1.0).build());
        let b = colliders.insert(ColliderBuilder::ball(1.0).build());
        let mut islands = IslandManager::new();
        let mut bodies = RigidBodySet::new();
        colliders.remove(b, &mut islands, &mut bodies, false);

        assert!(classify_pair(&GroupMaskPairFilter, &colliders, a, b).is_none());
    }
}
