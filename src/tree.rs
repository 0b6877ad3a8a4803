//! In-memory interval tree
//!
//! The spatial index of a stream is held in an [`IntervalTree`]: a map from
//! [`CollatingInterval`] keys to arbitrary values supporting bulk insertion
//! and enumeration of every entry overlapping a query interval.
//!
//! Entries are kept in a vector sorted by key, which doubles as an implicit
//! balanced binary tree (each subrange's root is its midpoint). A subtree
//! max-end augmentation is derived lazily on the first query and rebuilt if
//! entries are added afterwards. Duplicate keys are retained: two compressed
//! blocks can legitimately cover identical spans, and each must stay
//! reachable.

use std::sync::OnceLock;

use crate::interval::CollatingInterval;

/// A map from collating intervals to values with overlap enumeration
#[derive(Debug, Default)]
pub struct IntervalTree<V> {
    entries: Vec<(CollatingInterval, V)>,
    max_ends: OnceLock<Vec<u32>>,
}

impl<V> IntervalTree<V> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            max_ends: OnceLock::new(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Inserts an entry, keeping the vector sorted by key
    ///
    /// Equal keys are kept, appended after their duplicates. Bulk loads that
    /// arrive in key order insert at the tail.
    pub fn put(&mut self, interval: CollatingInterval, value: V) {
        self.max_ends.take();
        let at = self.entries.partition_point(|(key, _)| *key <= interval);
        self.entries.insert(at, (interval, value));
    }

    /// Enumerates every stored entry whose key overlaps `query`
    ///
    /// Enumeration order is unspecified; no entry is yielded twice.
    pub fn overlappers(&self, query: &CollatingInterval) -> Overlappers<'_, V> {
        let max_ends = self.max_ends.get_or_init(|| build_max_ends(&self.entries)).as_slice();
        let mut stack = Vec::new();
        if !self.entries.is_empty() {
            stack.push((0, self.entries.len()));
        }
        Overlappers {
            entries: self.entries.as_slice(),
            max_ends,
            query: *query,
            stack,
        }
    }
}

/// Computes, for each midpoint of the implicit-tree recursion, the maximum
/// interval end within its subrange
fn build_max_ends<V>(entries: &[(CollatingInterval, V)]) -> Vec<u32> {
    fn descend<V>(entries: &[(CollatingInterval, V)], max_ends: &mut [u32], lo: usize, hi: usize) -> u32 {
        if lo >= hi {
            return 0;
        }
        let mid = lo + (hi - lo) / 2;
        let mut max_end = entries[mid].0.end();
        max_end = max_end.max(descend(entries, max_ends, lo, mid));
        max_end = max_end.max(descend(entries, max_ends, mid + 1, hi));
        max_ends[mid] = max_end;
        max_end
    }

    let mut max_ends = vec![0; entries.len()];
    descend(entries, &mut max_ends, 0, entries.len());
    max_ends
}

/// Iterator over the entries overlapping a query interval
///
/// Walks the implicit tree with an explicit stack of subranges, pruning
/// subranges whose keys cannot reach the query: ranges on the wrong contig,
/// ranges starting past the query end, and (via the augmentation) ranges
/// ending before the query start.
pub struct Overlappers<'a, V> {
    entries: &'a [(CollatingInterval, V)],
    max_ends: &'a [u32],
    query: CollatingInterval,
    stack: Vec<(usize, usize)>,
}

impl<'a, V> Iterator for Overlappers<'a, V> {
    type Item = (CollatingInterval, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let contig = self.query.contig_index();
        while let Some((lo, hi)) = self.stack.pop() {
            if lo >= hi {
                continue;
            }
            let first = &self.entries[lo].0;
            let last = &self.entries[hi - 1].0;
            if first.contig_index() > contig || last.contig_index() < contig {
                continue;
            }
            let mid = lo + (hi - lo) / 2;
            // end-based pruning is only sound once the whole subrange shares
            // the query's contig
            if first.contig_index() == contig && last.contig_index() == contig {
                if first.start() > self.query.end() {
                    continue;
                }
                if self.max_ends[mid] < self.query.start() {
                    continue;
                }
            }
            self.stack.push((lo, mid));
            self.stack.push((mid + 1, hi));
            let (key, value) = &self.entries[mid];
            if self.query.overlaps(key) {
                return Some((*key, value));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dict::{Contig, SequenceDictionary};
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    fn test_dict() -> SequenceDictionary {
        SequenceDictionary::new(vec![
            Contig::new("chr1", 10_000),
            Contig::new("chr2", 10_000),
            Contig::new("chr3", 10_000),
        ])
    }

    fn iv(dict: &SequenceDictionary, contig: u32, start: u32, end: u32) -> CollatingInterval {
        CollatingInterval::new(dict, contig, start, end).unwrap()
    }

    fn collect_sorted(tree: &IntervalTree<u64>, query: &CollatingInterval) -> Vec<u64> {
        let mut hits: Vec<u64> = tree.overlappers(query).map(|(_, v)| *v).collect();
        hits.sort_unstable();
        hits
    }

    #[test]
    fn test_empty_tree() {
        let dict = test_dict();
        let tree: IntervalTree<u64> = IntervalTree::new();
        assert!(tree.is_empty());
        let query = iv(&dict, 0, 1, 10_000);
        assert_eq!(tree.overlappers(&query).count(), 0);
    }

    #[test]
    fn test_basic_overlap() {
        let dict = test_dict();
        let mut tree = IntervalTree::new();
        tree.put(iv(&dict, 0, 100, 200), 1u64);
        tree.put(iv(&dict, 0, 150, 300), 2);
        tree.put(iv(&dict, 1, 10, 50), 3);
        assert_eq!(tree.len(), 3);

        assert_eq!(collect_sorted(&tree, &iv(&dict, 0, 250, 260)), vec![2]);
        assert_eq!(collect_sorted(&tree, &iv(&dict, 0, 150, 160)), vec![1, 2]);
        assert_eq!(collect_sorted(&tree, &iv(&dict, 1, 1, 100)), vec![3]);
        assert!(collect_sorted(&tree, &iv(&dict, 0, 500, 600)).is_empty());
        assert!(collect_sorted(&tree, &iv(&dict, 2, 1, 10_000)).is_empty());
    }

    #[test]
    fn test_duplicate_keys_are_kept() {
        let dict = test_dict();
        let mut tree = IntervalTree::new();
        tree.put(iv(&dict, 0, 100, 200), 1u64);
        tree.put(iv(&dict, 0, 100, 200), 2);
        assert_eq!(collect_sorted(&tree, &iv(&dict, 0, 199, 199)), vec![1, 2]);
    }

    #[test]
    fn test_put_after_query_rebuilds() {
        let dict = test_dict();
        let mut tree = IntervalTree::new();
        tree.put(iv(&dict, 0, 100, 200), 1u64);
        assert_eq!(collect_sorted(&tree, &iv(&dict, 0, 150, 150)), vec![1]);

        tree.put(iv(&dict, 0, 140, 160), 2);
        assert_eq!(collect_sorted(&tree, &iv(&dict, 0, 150, 150)), vec![1, 2]);
    }

    #[test]
    fn test_overlappers_match_linear_scan() {
        let dict = test_dict();
        let mut rng = SmallRng::seed_from_u64(42);

        let mut tree = IntervalTree::new();
        let mut entries = Vec::new();
        for value in 0..500u64 {
            let contig = rng.random_range(0..3u32);
            let start = rng.random_range(1..9_000u32);
            let end = start + rng.random_range(0..1_000u32);
            let interval = iv(&dict, contig, start, end);
            tree.put(interval, value);
            entries.push((interval, value));
        }

        for _ in 0..200 {
            let contig = rng.random_range(0..3u32);
            let start = rng.random_range(1..9_500u32);
            let end = start + rng.random_range(0..500u32);
            let query = iv(&dict, contig, start, end);

            let mut expected: Vec<u64> = entries
                .iter()
                .filter(|(interval, _)| query.overlaps(interval))
                .map(|(_, value)| *value)
                .collect();
            expected.sort_unstable();

            assert_eq!(collect_sorted(&tree, &query), expected);
        }
    }
}
