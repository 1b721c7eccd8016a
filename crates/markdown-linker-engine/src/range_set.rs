use crate::anchor::ResolvedRange;
use crate::document::EditDelta;
use crate::layers::{Decoration, LayerStyle};
use crate::span::Span;

/// The resolved ranges of one layer, sorted by start and non-overlapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeSet {
    ranges: Vec<ResolvedRange>,
}

/// What happened to a range set when it was mapped through an edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditMapping {
    /// Ranges after the edit that moved by the net length change.
    pub shifted: usize,
    /// Ranges overlapping the edit. They were removed and need re-resolution.
    pub invalidated: usize,
}

impl RangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces every range.
    ///
    /// Empty ranges are dropped. Ranges are sorted by start (stable, so input
    /// order breaks ties) and of two overlapping ranges the later-starting
    /// one is discarded.
    pub fn rebuild(&mut self, ranges: impl IntoIterator<Item = ResolvedRange>) {
        let mut ranges: Vec<_> = ranges.into_iter().filter(|r| !r.span.is_empty()).collect();
        ranges.sort_by_key(|r| r.span.start);

        let mut kept: Vec<ResolvedRange> = Vec::with_capacity(ranges.len());
        for range in ranges {
            match kept.last() {
                Some(last) if range.span.start < last.span.end => {}
                _ => kept.push(range),
            }
        }
        self.ranges = kept;
    }

    pub fn clear(&mut self) {
        self.ranges.clear();
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolvedRange> {
        self.ranges.iter()
    }

    /// The range containing `offset`, found by binary search on start.
    pub fn query_at(&self, offset: usize) -> Option<&ResolvedRange> {
        let idx = self.ranges.partition_point(|r| r.span.start <= offset);
        let candidate = self.ranges.get(idx.checked_sub(1)?)?;
        candidate.span.contains(offset).then_some(candidate)
    }

    /// Ranges intersecting `span`, in order.
    pub fn overlapping(&self, span: Span) -> impl Iterator<Item = &ResolvedRange> {
        let first = self.ranges.partition_point(|r| r.span.end <= span.start);
        self.ranges[first..]
            .iter()
            .take_while(move |r| r.span.start < span.end)
    }

    /// Projects the ranges into decorations. Pure: the set is unchanged.
    pub fn to_decorations(&self, style: &LayerStyle) -> Vec<Decoration> {
        self.ranges
            .iter()
            .map(|r| Decoration {
                span: r.span,
                layer: r.layer,
                class: style.class.clone(),
                kind: style.kind,
                tooltip: style.tooltip.clone(),
                meta: r.meta.clone(),
            })
            .collect()
    }

    /// Maps ranges through an edit without re-resolving.
    ///
    /// Ranges ending at or before the edit start stay put, ranges starting at
    /// or after the replaced region shift by the net length change, and
    /// ranges overlapping the replaced region are removed.
    pub fn map_through(&mut self, edit: &EditDelta) -> EditMapping {
        let net = edit.net();
        let mut mapping = EditMapping {
            shifted: 0,
            invalidated: 0,
        };

        self.ranges.retain_mut(|r| {
            if r.span.end <= edit.start {
                true
            } else if r.span.start >= edit.old_end {
                if net != 0 {
                    r.span = r.span.shifted(net);
                    mapping.shifted += 1;
                }
                true
            } else {
                mapping.invalidated += 1;
                false
            }
        });
        mapping
    }

    /// Checks the ordering invariants. Used by tests and debug assertions.
    pub fn is_well_formed(&self, len: usize) -> bool {
        self.ranges.iter().all(|r| r.span.start < r.span.end && r.span.end <= len)
            && self
                .ranges
                .windows(2)
                .all(|w| w[0].span.end <= w[1].span.start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchor::RangeMeta;
    use crate::layers::{DecorationKind, LayerId};
    use pretty_assertions::assert_eq;

    fn r(start: usize, end: usize) -> ResolvedRange {
        ResolvedRange::new(Span::new(start, end), LayerId(0))
    }

    fn spans(set: &RangeSet) -> Vec<(usize, usize)> {
        set.iter().map(|r| (r.span.start, r.span.end)).collect()
    }

    #[test]
    fn rebuild_sorts_and_drops_later_overlaps() {
        let mut set = RangeSet::new();
        set.rebuild(vec![r(10, 20), r(0, 5), r(15, 25), r(20, 22), r(4, 8)]);
        assert_eq!(spans(&set), vec![(0, 5), (10, 20), (20, 22)]);
        assert!(set.is_well_formed(30));
    }

    #[test]
    fn rebuild_keeps_first_of_equal_starts() {
        let mut set = RangeSet::new();
        set.rebuild(vec![r(3, 4), r(3, 9)]);
        assert_eq!(spans(&set), vec![(3, 4)]);
    }

    #[test]
    fn rebuild_drops_empty_ranges() {
        let mut set = RangeSet::new();
        set.rebuild(vec![r(3, 3), r(5, 2)]);
        assert!(set.is_empty());
    }

    #[test]
    fn rebuild_replaces_previous_contents() {
        let mut set = RangeSet::new();
        set.rebuild(vec![r(0, 1)]);
        set.rebuild(vec![r(5, 6)]);
        assert_eq!(spans(&set), vec![(5, 6)]);
    }

    #[test]
    fn query_at_uses_half_open_ranges() {
        let mut set = RangeSet::new();
        set.rebuild(vec![r(0, 4), r(6, 9)]);
        assert_eq!(set.query_at(0).map(|r| r.span), Some(Span::new(0, 4)));
        assert_eq!(set.query_at(3).map(|r| r.span), Some(Span::new(0, 4)));
        assert_eq!(set.query_at(4), None);
        assert_eq!(set.query_at(5), None);
        assert_eq!(set.query_at(8).map(|r| r.span), Some(Span::new(6, 9)));
        assert_eq!(set.query_at(9), None);
        assert_eq!(RangeSet::new().query_at(0), None);
    }

    #[test]
    fn overlapping_returns_intersecting_ranges() {
        let mut set = RangeSet::new();
        set.rebuild(vec![r(0, 4), r(6, 9), r(12, 14)]);
        let found: Vec<_> = set.overlapping(Span::new(3, 7)).map(|r| r.span).collect();
        assert_eq!(found, vec![Span::new(0, 4), Span::new(6, 9)]);
        assert_eq!(set.overlapping(Span::new(9, 12)).count(), 0);
    }

    #[test]
    fn decorations_carry_style_and_meta() {
        let mut set = RangeSet::new();
        let mut with_meta = r(0, 4);
        with_meta.meta = Some(RangeMeta {
            title: "T".into(),
            reason: "R".into(),
        });
        set.rebuild(vec![with_meta]);

        let style = LayerStyle::line("section-highlight");
        let decorations = set.to_decorations(&style);
        assert_eq!(decorations.len(), 1);
        assert_eq!(decorations[0].class, "section-highlight");
        assert_eq!(decorations[0].kind, DecorationKind::Line);
        assert_eq!(decorations[0].meta.as_ref().unwrap().title, "T");
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn insertion_before_range_shifts_it() {
        // "AAAA BBBB" with the range over "BBBB"; insert two chars at 0.
        let mut set = RangeSet::new();
        set.rebuild(vec![r(5, 9)]);
        let mapping = set.map_through(&EditDelta::insertion(0, 2));
        assert_eq!(spans(&set), vec![(7, 11)]);
        assert_eq!(
            mapping,
            EditMapping {
                shifted: 1,
                invalidated: 0
            }
        );
    }

    #[test]
    fn edit_after_range_leaves_it_untouched() {
        let mut set = RangeSet::new();
        set.rebuild(vec![r(0, 4)]);
        set.map_through(&EditDelta::deletion(Span::new(4, 6)));
        assert_eq!(spans(&set), vec![(0, 4)]);
    }

    #[test]
    fn overlapping_edit_invalidates_only_touched_ranges() {
        let mut set = RangeSet::new();
        set.rebuild(vec![r(0, 4), r(6, 9), r(12, 14)]);
        let mapping = set.map_through(&EditDelta::replacement(Span::new(7, 8), 3));
        assert_eq!(spans(&set), vec![(0, 4), (14, 16)]);
        assert_eq!(mapping.invalidated, 1);
        assert_eq!(mapping.shifted, 1);
    }

    #[test]
    fn deletion_shifts_left() {
        let mut set = RangeSet::new();
        set.rebuild(vec![r(10, 12)]);
        set.map_through(&EditDelta::deletion(Span::new(2, 5)));
        assert_eq!(spans(&set), vec![(7, 9)]);
    }
}
