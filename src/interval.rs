//! Collating intervals
//!
//! A [`CollatingInterval`] is a `(contig index, start, end)` triple used both
//! as record coordinates and as the key of the embedded spatial index.
//! Coordinates are 1-based and closed, and the total order is lexicographic
//! over `(contig_index, start, end)` — the order records must be written in.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::dict::SequenceDictionary;
use crate::error::{IntervalError, Result};

/// Number of bytes in the on-disk form of an interval
pub const SIZE_INTERVAL: usize = 12;

/// A 1-based closed genomic interval keyed by contig index
///
/// Instances are validated against a [`SequenceDictionary`] at construction:
/// the contig must exist and `1 <= start <= end <= contig length` must hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct CollatingInterval {
    contig_index: u32,
    start: u32,
    end: u32,
}
impl CollatingInterval {
    /// Creates an interval on the contig at `contig_index`
    pub fn new(dict: &SequenceDictionary, contig_index: u32, start: u32, end: u32) -> Result<Self> {
        let contig = dict.require(contig_index)?;
        let length = contig.length();
        if start < 1 || start > length || end < start || end > length {
            return Err(IntervalError::OutOfBounds {
                start,
                end,
                contig: contig.name().to_string(),
                length,
            }
            .into());
        }
        Ok(Self {
            contig_index,
            start,
            end,
        })
    }

    /// Creates an interval on the named contig
    pub fn with_name(
        dict: &SequenceDictionary,
        name: &str,
        start: u32,
        end: u32,
    ) -> Result<Self> {
        let contig_index = dict.index_of(name).ok_or_else(|| IntervalError::UnknownContig {
            name: name.to_string(),
        })?;
        Self::new(dict, contig_index, start, end)
    }

    #[must_use]
    pub fn contig_index(&self) -> u32 {
        self.contig_index
    }

    #[must_use]
    pub fn start(&self) -> u32 {
        self.start
    }

    #[must_use]
    pub fn end(&self) -> u32 {
        self.end
    }

    /// True when both intervals lie on the same contig
    #[must_use]
    pub fn contigs_match(&self, that: &Self) -> bool {
        self.contig_index == that.contig_index
    }

    /// True when the intervals share at least one position
    #[must_use]
    pub fn overlaps(&self, that: &Self) -> bool {
        self.contigs_match(that) && self.start <= that.end && that.start <= self.end
    }

    /// True when `that` lies entirely within this interval
    #[must_use]
    pub fn contains(&self, that: &Self) -> bool {
        self.contigs_match(that) && that.start >= self.start && that.end <= self.end
    }

    /// True when this interval sorts entirely before `that` with no overlap
    /// possible: an earlier contig, or the same contig ending before `that`
    /// starts
    #[must_use]
    pub fn is_upstream_of(&self, that: &Self) -> bool {
        self.contig_index < that.contig_index
            || (self.contig_index == that.contig_index && self.end < that.start)
    }

    /// Returns whichever interval ends later in collating order
    #[must_use]
    pub fn later_ending(interval1: Self, interval2: Self) -> Self {
        if interval1.contig_index == interval2.contig_index {
            if interval1.end > interval2.end {
                interval1
            } else {
                interval2
            }
        } else if interval1.contig_index > interval2.contig_index {
            interval1
        } else {
            interval2
        }
    }

    /// A stable hash shared across implementations of this format
    #[must_use]
    pub fn hash_code(&self) -> u32 {
        241u32
            .wrapping_mul(
                241u32
                    .wrapping_mul(241u32.wrapping_mul(self.contig_index).wrapping_add(self.start))
                    .wrapping_add(self.end),
            )
    }

    /// Writes the 12-byte on-disk form
    pub fn write_to<W: Write>(&self, dst: &mut W) -> Result<()> {
        dst.write_u32::<LittleEndian>(self.contig_index)?;
        dst.write_u32::<LittleEndian>(self.start)?;
        dst.write_u32::<LittleEndian>(self.end)?;
        Ok(())
    }

    /// Reads an interval written by [`Self::write_to`], re-validating it
    /// against the dictionary
    pub fn read_from<R: Read>(src: &mut R, dict: &SequenceDictionary) -> Result<Self> {
        let contig_index = src.read_u32::<LittleEndian>()?;
        let start = src.read_u32::<LittleEndian>()?;
        let end = src.read_u32::<LittleEndian>()?;
        Self::new(dict, contig_index, start, end)
    }

    /// Renders the interval with its contig name, e.g. `chr1:100-200`
    #[must_use]
    pub fn display_with(&self, dict: &SequenceDictionary) -> String {
        match dict.get(self.contig_index) {
            Some(contig) => format!("{}:{}-{}", contig.name(), self.start, self.end),
            None => self.to_string(),
        }
    }
}

impl fmt::Display for CollatingInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}:{}-{}", self.contig_index, self.start, self.end)
    }
}

impl Hash for CollatingInterval {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(self.hash_code());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dict::Contig;

    fn test_dict() -> SequenceDictionary {
        SequenceDictionary::new(vec![Contig::new("chr1", 1000), Contig::new("chr2", 500)])
    }

    fn iv(dict: &SequenceDictionary, contig: u32, start: u32, end: u32) -> CollatingInterval {
        CollatingInterval::new(dict, contig, start, end).unwrap()
    }

    #[test]
    fn test_construction_bounds() {
        let dict = test_dict();
        assert!(CollatingInterval::new(&dict, 0, 1, 1000).is_ok());
        assert!(CollatingInterval::new(&dict, 0, 0, 10).is_err());
        assert!(CollatingInterval::new(&dict, 0, 10, 5).is_err());
        assert!(CollatingInterval::new(&dict, 0, 10, 1001).is_err());
        assert!(CollatingInterval::new(&dict, 1, 600, 700).is_err());
        assert!(CollatingInterval::new(&dict, 2, 1, 10).is_err());
    }

    #[test]
    fn test_construction_by_name() {
        let dict = test_dict();
        let interval = CollatingInterval::with_name(&dict, "chr2", 10, 50).unwrap();
        assert_eq!(interval.contig_index(), 1);

        let err = CollatingInterval::with_name(&dict, "chrX", 10, 50).unwrap_err();
        assert!(matches!(
            err,
            crate::Error::IntervalError(IntervalError::UnknownContig { .. })
        ));
    }

    #[test]
    fn test_total_order() {
        let dict = test_dict();
        let a = iv(&dict, 0, 100, 200);
        let b = iv(&dict, 0, 100, 300);
        let c = iv(&dict, 0, 150, 160);
        let d = iv(&dict, 1, 1, 2);
        assert!(a < b);
        assert!(b < c);
        assert!(c < d);
        assert_eq!(a.cmp(&a), std::cmp::Ordering::Equal);
    }

    #[test]
    fn test_predicates() {
        let dict = test_dict();
        let a = iv(&dict, 0, 100, 200);
        let b = iv(&dict, 0, 150, 300);
        let c = iv(&dict, 0, 250, 260);
        let d = iv(&dict, 1, 100, 200);

        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c));
        assert!(!a.overlaps(&d));

        assert!(b.contains(&c));
        assert!(!c.contains(&b));

        assert!(a.is_upstream_of(&c));
        assert!(!a.is_upstream_of(&b));
        assert!(a.is_upstream_of(&d));
        assert!(!d.is_upstream_of(&a));
    }

    #[test]
    fn test_later_ending() {
        let dict = test_dict();
        let a = iv(&dict, 0, 100, 200);
        let b = iv(&dict, 0, 150, 300);
        let d = iv(&dict, 1, 1, 2);
        assert_eq!(CollatingInterval::later_ending(a, b), b);
        assert_eq!(CollatingInterval::later_ending(b, a), b);
        assert_eq!(CollatingInterval::later_ending(a, d), d);
        assert_eq!(CollatingInterval::later_ending(d, a), d);
    }

    #[test]
    fn test_hash_stability() {
        let dict = test_dict();
        let interval = iv(&dict, 1, 10, 50);
        // 241 * (241 * (241 * 1 + 10) + 50)
        assert_eq!(interval.hash_code(), 241 * (241 * (241 + 10) + 50));
    }

    #[test]
    fn test_wire_round_trip() {
        let dict = test_dict();
        let interval = iv(&dict, 1, 10, 50);

        let mut buf = Vec::new();
        interval.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), SIZE_INTERVAL);

        let restored = CollatingInterval::read_from(&mut buf.as_slice(), &dict).unwrap();
        assert_eq!(restored, interval);
    }

    #[test]
    fn test_read_rejects_foreign_contig() {
        let dict = test_dict();
        let mut buf = Vec::new();
        buf.extend_from_slice(&9u32.to_le_bytes());
        buf.extend_from_slice(&1u32.to_le_bytes());
        buf.extend_from_slice(&10u32.to_le_bytes());
        assert!(CollatingInterval::read_from(&mut buf.as_slice(), &dict).is_err());
    }

    #[test]
    fn test_display() {
        let dict = test_dict();
        let interval = iv(&dict, 0, 100, 200);
        assert_eq!(interval.to_string(), "#0:100-200");
        assert_eq!(interval.display_with(&dict), "chr1:100-200");
    }
}
