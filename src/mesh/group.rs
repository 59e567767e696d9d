//! Named ranges over vertex and index arrays.
//!
//! A [`Group`] describes the half-open range `[start, start + count)` over some
//! parallel array. Meshes use groups both for geometric parts and for material
//! assignment, and the slice/flatten operations are built from the algebra in
//! this module.
//!
//! # Ordering
//!
//! Groups sort by `start` ascending; for equal starts the group with the larger
//! `end` comes first. Writers rely on this: the effective span of a group is
//! read from the start of the group following it in sorted order.

use std::cmp::Ordering;
use std::fmt;

/// A named half-open range `[start, start + count)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Group {
    name: String,
    start: u32,
    count: u32,
}

impl Group {
    /// Create a new group.
    pub fn new(name: impl Into<String>, start: u32, count: u32) -> Self {
        Self {
            name: name.into(),
            start,
            count,
        }
    }

    /// Create an empty group starting at `start`, to be grown with [`Group::set_count`].
    pub fn starting_at(name: impl Into<String>, start: u32) -> Self {
        Self::new(name, start, 0)
    }

    /// The group name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// First element of the range.
    #[inline]
    pub fn start(&self) -> u32 {
        self.start
    }

    /// Number of elements in the range.
    #[inline]
    pub fn count(&self) -> u32 {
        self.count
    }

    /// One past the last element of the range.
    #[inline]
    pub fn end(&self) -> u32 {
        self.start + self.count
    }

    /// Set the number of elements in the range.
    #[inline]
    pub fn set_count(&mut self, count: u32) {
        self.count = count;
    }

    /// Whether the range has no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// The range as `usize` bounds, for indexing slices.
    #[inline]
    pub fn range(&self) -> std::ops::Range<usize> {
        self.start as usize..self.end() as usize
    }

    /// Whether `other` lies entirely within this group.
    pub fn contains(&self, other: &Group) -> bool {
        other.start >= self.start && other.end() <= self.end()
    }

    /// Whether the two ranges overlap.
    ///
    /// An empty range lying strictly inside the other also counts, and then
    /// intersects to an empty group.
    pub fn intersects(&self, other: &Group) -> bool {
        other.start < self.end() && other.end() > self.start
    }

    /// The same range scaled by `factor`, e.g. from corners to face-index components.
    pub fn scaled(&self, factor: u32) -> Group {
        Group::new(self.name.clone(), self.start * factor, self.count * factor)
    }

    /// The same range divided by `divisor`, the inverse of [`Group::scaled`].
    pub fn divided(&self, divisor: u32) -> Group {
        Group::new(self.name.clone(), self.start / divisor, self.count / divisor)
    }
}

impl Ord for Group {
    fn cmp(&self, other: &Self) -> Ordering {
        self.start
            .cmp(&other.start)
            .then_with(|| other.end().cmp(&self.end()))
            .then_with(|| self.name.cmp(&other.name))
    }
}

impl PartialOrd for Group {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self.name, self.start, self.count)
    }
}

/// The overlap of `a` and `b`, named after `a`.
///
/// Only meaningful when `a.intersects(b)`; disjoint inputs give an empty group.
pub fn intersection(a: &Group, b: &Group) -> Group {
    let start = a.start.max(b.start);
    let end = a.end().min(b.end());
    Group::new(a.name.clone(), start, end.saturating_sub(start))
}

/// Rebase `absolute` into the local coordinates of `base`.
pub fn offset_into(base: &Group, absolute: &Group) -> Group {
    Group::new(
        absolute.name.clone(),
        absolute.start - base.start,
        absolute.count,
    )
}

/// Clip `source` to `spec` and express the survivors relative to `spec.start`.
///
/// Groups that do not intersect `spec` are dropped. The result is sorted.
pub fn slice_groups(source: &[Group], spec: &Group) -> Vec<Group> {
    let mut sliced: Vec<Group> = source
        .iter()
        .filter(|g| spec.intersects(g))
        .map(|g| offset_into(spec, &intersection(g, spec)))
        .collect();
    sliced.sort();
    sliced
}

/// Sort `groups` into [`Group`] order.
pub fn sort_groups(groups: &mut [Group]) {
    groups.sort();
}

/// Whether `groups` is already in [`Group`] order.
pub fn is_sorted(groups: &[Group]) -> bool {
    groups.windows(2).all(|w| w[0] <= w[1])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_and_range() {
        let g = Group::new("a", 3, 6);
        assert_eq!(g.end(), 9);
        assert_eq!(g.range(), 3..9);
        assert!(!g.is_empty());
        assert!(Group::starting_at("b", 4).is_empty());
    }

    #[test]
    fn test_ordering_prefers_wider_range() {
        let narrow = Group::new("narrow", 0, 3);
        let wide = Group::new("wide", 0, 9);
        let later = Group::new("later", 3, 3);

        let mut groups = vec![later.clone(), narrow.clone(), wide.clone()];
        groups.sort();
        assert_eq!(groups, vec![wide, narrow, later]);
    }

    #[test]
    fn test_intersects() {
        let a = Group::new("a", 0, 6);
        assert!(a.intersects(&Group::new("b", 3, 6)));
        assert!(a.intersects(&Group::new("c", 5, 1)));
        // Touching ranges do not overlap.
        assert!(!a.intersects(&Group::new("d", 6, 3)));
        assert!(!Group::new("e", 6, 3).intersects(&a));
    }

    #[test]
    fn test_contains() {
        let a = Group::new("a", 3, 6);
        assert!(a.contains(&Group::new("b", 3, 6)));
        assert!(a.contains(&Group::new("c", 4, 2)));
        assert!(!a.contains(&Group::new("d", 0, 6)));
    }

    #[test]
    fn test_intersection_takes_first_name() {
        let a = Group::new("a", 0, 6);
        let b = Group::new("b", 3, 6);
        assert_eq!(intersection(&a, &b), Group::new("a", 3, 3));
        assert_eq!(intersection(&b, &a), Group::new("b", 3, 3));
    }

    #[test]
    fn test_intersection_of_disjoint_is_empty() {
        let a = Group::new("a", 0, 3);
        let b = Group::new("b", 6, 3);
        assert!(intersection(&a, &b).is_empty());
    }

    #[test]
    fn test_offset_into() {
        let base = Group::new("base", 6, 9);
        let g = Group::new("g", 9, 3);
        assert_eq!(offset_into(&base, &g), Group::new("g", 3, 3));
    }

    #[test]
    fn test_slice_groups() {
        let source = vec![
            Group::new("a", 0, 6),
            Group::new("b", 6, 6),
            Group::new("c", 12, 6),
        ];
        let spec = Group::new("spec", 3, 6);
        let sliced = slice_groups(&source, &spec);
        assert_eq!(sliced, vec![Group::new("a", 0, 3), Group::new("b", 3, 3)]);
    }

    #[test]
    fn test_slice_groups_drops_disjoint() {
        let source = vec![Group::new("a", 0, 3), Group::new("b", 9, 3)];
        let sliced = slice_groups(&source, &Group::new("spec", 3, 6));
        assert!(sliced.is_empty());
    }

    #[test]
    fn test_slice_groups_sorts_output() {
        let source = vec![Group::new("late", 6, 3), Group::new("early", 0, 9)];
        let sliced = slice_groups(&source, &Group::new("spec", 0, 9));
        assert!(is_sorted(&sliced));
        assert_eq!(sliced[0].name(), "early");
    }

    #[test]
    fn test_scale_and_divide() {
        let g = Group::new("g", 3, 6);
        assert_eq!(g.scaled(3), Group::new("g", 9, 18));
        assert_eq!(g.scaled(3).divided(3), g);
    }

    #[test]
    fn test_display() {
        assert_eq!(Group::new("metal", 0, 3).to_string(), "[metal, 0, 3]");
    }
}
