//! Conversion of raw query hits into identifier-keyed results.

use crate::constants::DEFAULT_HIT_CAPACITY;
use crate::error::MarshalError;
use crate::identifier::{IdentifierLookup, UnresolvedPolicy};
use crate::types::{Identifier, Vec3};

/// One marshaled query result.
///
/// A miss is `found = false` with every other field zeroed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QueryResult {
    pub found: bool,
    pub actor: Identifier,
    pub shape: Identifier,
    pub position: Vec3,
    pub normal: Vec3,
}

impl QueryResult {
    pub fn miss() -> Self {
        Self {
            found: false,
            actor: 0,
            shape: 0,
            position: Vec3::zeros(),
            normal: Vec3::zeros(),
        }
    }
}

impl Default for QueryResult {
    fn default() -> Self {
        Self::miss()
    }
}

/// A hit as reported by the engine, before identifier resolution.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RawHit<S, A> {
    pub shape: S,
    pub actor: Option<A>,
    pub position: Vec3,
    pub normal: Vec3,
    /// Distance along the ray or sweep at which the hit occurred.
    pub distance: f32,
}

/// Fixed-capacity buffer filled in discovery order during an all-hits query.
///
/// Lives only for the duration of one query call.
#[derive(Debug)]
pub struct HitBuffer<S, A> {
    capacity: usize,
    hits: Vec<RawHit<S, A>>,
    truncated: bool,
}

impl<S, A> HitBuffer<S, A> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            hits: Vec::with_capacity(capacity.min(DEFAULT_HIT_CAPACITY)),
            truncated: false,
        }
    }

    /// Record a hit. Returns `false` once the buffer is full and the hit was discarded, at
    /// which point the query should stop.
    pub fn push(&mut self, hit: RawHit<S, A>) -> bool {
        if self.hits.len() >= self.capacity {
            self.truncated = true;
            return false;
        }
        self.hits.push(hit);
        true
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn truncated(&self) -> bool {
        self.truncated
    }

    pub fn hits(&self) -> &[RawHit<S, A>] {
        &self.hits
    }
}

impl<S, A> Default for HitBuffer<S, A> {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HIT_CAPACITY)
    }
}

/// Results of an all-hits query.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AllHits {
    pub results: Vec<QueryResult>,
    /// More hits existed than the buffer could hold.
    pub truncated: bool,
    /// Hits skipped because an identifier could not be resolved.
    pub dropped_unresolved: usize,
}

impl AllHits {
    pub fn filled(&self) -> usize {
        self.results.len()
    }
}

fn marshal_hit<L: IdentifierLookup>(
    lookup: &L,
    hit: &RawHit<L::Shape, L::Actor>,
) -> Result<QueryResult, MarshalError> {
    let shape = lookup.resolve_shape(hit.shape)?;
    let actor = match hit.actor {
        Some(actor) => lookup.resolve_actor(actor)?,
        None => {
            return Err(MarshalError::unresolved(
                crate::error::IdentifierKind::Actor,
                format_args!("parent of {:?}", hit.shape),
            ));
        }
    };
    Ok(QueryResult {
        found: true,
        actor,
        shape,
        position: hit.position,
        normal: hit.normal,
    })
}

/// Marshal a closest-hit query. An unresolved hit under `Drop` reads as a miss.
pub fn marshal_closest<L: IdentifierLookup>(
    lookup: &L,
    hit: Option<RawHit<L::Shape, L::Actor>>,
    policy: UnresolvedPolicy,
) -> Result<QueryResult, MarshalError> {
    let Some(hit) = hit else {
        return Ok(QueryResult::miss());
    };
    match marshal_hit(lookup, &hit) {
        Ok(result) => Ok(result),
        Err(err) => match policy {
            UnresolvedPolicy::Reject => Err(err),
            UnresolvedPolicy::Drop => {
                log::warn!("dropping query hit: {err}");
                Ok(QueryResult::miss())
            }
        },
    }
}

/// Marshal every buffered hit, preserving discovery order.
pub fn marshal_all<L: IdentifierLookup>(
    lookup: &L,
    buffer: HitBuffer<L::Shape, L::Actor>,
    policy: UnresolvedPolicy,
) -> Result<AllHits, MarshalError> {
    let mut out = AllHits {
        results: Vec::with_capacity(buffer.len()),
        truncated: buffer.truncated(),
        dropped_unresolved: 0,
    };
    for hit in buffer.hits() {
        match marshal_hit(lookup, hit) {
            Ok(result) => out.results.push(result),
            Err(err) if policy == UnresolvedPolicy::Drop => {
                log::warn!("dropping query hit: {err}");
                out.dropped_unresolved += 1;
            }
            Err(err) => return Err(err),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifier::test_support::MapLookup;

    fn hit(shape: u32, distance: f32) -> RawHit<u32, u32> {
        RawHit {
            shape,
            actor: Some(shape * 10),
            position: Vec3::new(0.0, 0.0, distance),
            normal: -Vec3::z(),
            distance,
        }
    }

    fn lookup(n: u32) -> MapLookup {
        let mut lookup = MapLookup::default();
        for s in 0..n {
            lookup.shapes.insert(s, 100 + s);
            lookup.actors.insert(s * 10, 1000 + s);
        }
        lookup
    }

    #[test]
    fn closest_miss_is_zeroed() {
        let result = marshal_closest(&lookup(0), None, UnresolvedPolicy::Reject).unwrap();

        assert_eq!(result, QueryResult::miss());
        assert!(!result.found);
        assert_eq!(result.position, Vec3::zeros());
    }

    #[test]
    fn closest_hit_carries_identifiers() {
        let result = marshal_closest(&lookup(3), Some(hit(2, 4.0)), UnresolvedPolicy::Reject)
            .unwrap();

        assert!(result.found);
        assert_eq!((result.shape, result.actor), (102, 1002));
        assert_eq!(result.position.z, 4.0);
    }

    #[test]
    fn buffer_over_capacity_truncates() {
        let mut buffer = HitBuffer::with_capacity(3);
        let accepted: Vec<bool> = (0..5).map(|i| buffer.push(hit(i, i as f32))).collect();

        assert_eq!(accepted, vec![true, true, true, false, false]);

        let all = marshal_all(&lookup(5), buffer, UnresolvedPolicy::Reject).unwrap();
        assert_eq!(all.filled(), 3);
        assert!(all.truncated);
        let shapes: Vec<_> = all.results.iter().map(|r| r.shape).collect();
        assert_eq!(shapes, vec![100, 101, 102]);
    }

    #[test]
    fn buffer_under_capacity_is_not_truncated() {
        let mut buffer = HitBuffer::with_capacity(8);
        for i in 0..2 {
            buffer.push(hit(i, 1.0));
        }

        let all = marshal_all(&lookup(2), buffer, UnresolvedPolicy::Reject).unwrap();
        assert_eq!(all.filled(), 2);
        assert!(!all.truncated);
    }

    #[test]
    fn unresolved_hit_under_reject_fails_the_query() {
        let mut buffer = HitBuffer::with_capacity(4);
        buffer.push(hit(0, 1.0));
        buffer.push(hit(9, 2.0));

        assert!(marshal_all(&lookup(1), buffer, UnresolvedPolicy::Reject).is_err());
    }

    #[test]
    fn unresolved_hit_under_drop_is_skipped() {
        let mut buffer = HitBuffer::with_capacity(4);
        buffer.push(hit(9, 2.0));
        buffer.push(hit(0, 1.0));

        let all = marshal_all(&lookup(1), buffer, UnresolvedPolicy::Drop).unwrap();
        assert_eq!(all.filled(), 1);
        assert_eq!(all.dropped_unresolved, 1);

        let closest = marshal_closest(&lookup(1), Some(hit(9, 1.0)), UnresolvedPolicy::Drop);
        assert_eq!(closest.unwrap(), QueryResult::miss());
    }
}
