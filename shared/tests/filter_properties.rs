//! Property tests for the pair and query filter policies.

use proptest::prelude::*;
use relay_shared::{
    ContactPhase, ContactPoint, ContactRecord, FilterAction, FilterData, GroupMaskPairFilter,
    GroupQueryFilter, MAX_CONTACT_POINTS, PairClassification, PairFilterPolicy, QueryFilterPolicy,
    QueryHitType, ShapeFilterInfo, Vec3,
};

fn shape_info() -> impl Strategy<Value = ShapeFilterInfo> {
    (any::<u32>(), any::<u32>(), any::<u32>(), any::<u32>(), any::<bool>()).prop_map(
        |(w0, w1, w2, w3, is_trigger)| {
            ShapeFilterInfo::new(FilterData::new(w0, w1, w2, w3), is_trigger)
        },
    )
}

proptest! {
    #[test]
    fn classify_is_symmetric(a in shape_info(), b in shape_info()) {
        let policy = GroupMaskPairFilter;
        prop_assert_eq!(policy.classify(&a, &b), policy.classify(&b, &a));
    }

    #[test]
    fn group_miss_always_suppresses(a in shape_info(), b in shape_info()) {
        let mut b = b;
        b.filter.word1 &= !a.filter.word0;
        let decision = GroupMaskPairFilter.classify(&a, &b);
        prop_assert_eq!(decision.action, FilterAction::Suppress);
        prop_assert!(decision.event_flags().is_empty());
    }

    #[test]
    fn trigger_pairs_never_solve(a in shape_info(), b in shape_info()) {
        let mut a = a;
        a.is_trigger = true;
        let decision = GroupMaskPairFilter.classify(&a, &b);
        prop_assert_ne!(decision.classification, PairClassification::Contact);
        prop_assert!(!decision.event_flags().has(relay_shared::PairFlag::SolveContact));
    }

    #[test]
    fn query_filter_touches_exactly_on_group_overlap(q in any::<u32>(), s in any::<u32>()) {
        let verdict = GroupQueryFilter.pre_filter(
            &FilterData::new(q, 0, 0, 0),
            &FilterData::new(s, 0, 0, 0),
        );
        let expected = if q & s != 0 { QueryHitType::Touch } else { QueryHitType::None };
        prop_assert_eq!(verdict, expected);
    }

    #[test]
    fn contact_records_hold_at_most_four_points(n in 0usize..32) {
        let raw = vec![ContactPoint { position: Vec3::x(), ..ContactPoint::default() }; n];
        let record = ContactRecord::new(1, 2, ContactPhase::Begin, &raw);
        prop_assert_eq!(record.contacts().len(), n.min(MAX_CONTACT_POINTS));
        prop_assert!(record.contact_count as usize <= MAX_CONTACT_POINTS);
    }
}
