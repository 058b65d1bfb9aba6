pub mod aggregator;
pub mod bitmask_flags;
pub mod constants;
pub mod error;
pub mod events;
pub mod filter_data;
pub mod identifier;
pub mod marshal;
pub mod pair_filter;
pub mod pair_flags;
pub mod query_filter;
pub mod sink;
pub mod types;

pub use aggregator::{AggregatorPhase, EventAggregator, FlushReport};
pub use constants::{
    DEFAULT_CONVEX_VERTEX_LIMIT, DEFAULT_FILTER_GROUP, DEFAULT_FILTER_MASK, DEFAULT_HIT_CAPACITY,
    MAX_CONTACT_POINTS, STANDARD_GRAVITY,
};
pub use error::{IdentifierKind, MarshalError};
pub use events::{
    ContactPhase, ContactPoint, ContactRecord, EventBatch, EventCategory, RawContactPair,
    RawTriggerPair, StepNotifications, TriggerPhase, TriggerRecord,
};
pub use filter_data::{FilterData, PackedFilter};
pub use identifier::{IdentifierLookup, IdentifierRegistry, UnresolvedPolicy};
pub use marshal::{AllHits, HitBuffer, QueryResult, RawHit, marshal_all, marshal_closest};
pub use pair_filter::{
    FilterAction, GroupMaskPairFilter, PairClassification, PairDecision, PairFilterPolicy,
    ShapeFilterInfo, can_interact,
};
pub use pair_flags::{PairFlag, PairFlags};
pub use query_filter::{GroupQueryFilter, QueryFilterData, QueryFilterPolicy, QueryHitType};
pub use sink::{ChannelSink, EventSink, HandlerSink};
pub use types::{Identifier, Iso, Quat, Transform, Vec3};
