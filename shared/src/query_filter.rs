use std::fmt::Debug;

use crate::filter_data::FilterData;

/// Per-shape verdict of a query pre-filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryHitType {
    /// Skip the shape.
    None,
    /// Report the hit and keep searching.
    Touch,
    /// Report the hit and stop at it.
    Block,
}

/// Strategy evaluated once per candidate shape during a spatial query.
pub trait QueryFilterPolicy: Send + Sync + Debug {
    fn pre_filter(&self, query: &FilterData, shape: &FilterData) -> QueryHitType;
}

/// Reports a shape when the query's group bits overlap the shape's group bits.
///
/// Never produces [`QueryHitType::Block`]; closest vs. all is chosen by the query call.
#[derive(Clone, Copy, Debug, Default)]
pub struct GroupQueryFilter;

impl QueryFilterPolicy for GroupQueryFilter {
    fn pre_filter(&self, query: &FilterData, shape: &FilterData) -> QueryHitType {
        if query.word0 & shape.word0 != 0 {
            QueryHitType::Touch
        } else {
            QueryHitType::None
        }
    }
}

/// Query-side filter words supplied by the host with each raycast or sweep.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueryFilterData {
    pub group: u32,
    pub mask: u32,
}

impl QueryFilterData {
    pub fn new(group: u32, mask: u32) -> Self {
        Self { group, mask }
    }

    pub fn filter(&self) -> FilterData {
        FilterData::new(self.group, self.mask, 0, 0)
    }
}

impl Default for QueryFilterData {
    /// Matches every group.
    fn default() -> Self {
        Self::new(u32::MAX, u32::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlapping_group_bits_touch() {
        let query = QueryFilterData::new(0b0110, 0).filter();
        let shape = FilterData::new(0b0100, 0, 0, 0);

        assert_eq!(GroupQueryFilter.pre_filter(&query, &shape), QueryHitType::Touch);
    }

    #[test]
    fn disjoint_group_bits_are_skipped() {
        let query = QueryFilterData::new(0b0001, u32::MAX).filter();
        let shape = FilterData::new(0b0010, u32::MAX, 0, 0);

        assert_eq!(GroupQueryFilter.pre_filter(&query, &shape), QueryHitType::None);
    }

    #[test]
    fn default_query_filter_hits_any_grouped_shape() {
        let shape = FilterData::standard();

        assert_eq!(
            GroupQueryFilter.pre_filter(&QueryFilterData::default().filter(), &shape),
            QueryHitType::Touch
        );
    }
}
