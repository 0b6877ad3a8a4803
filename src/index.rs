//! Index entries
//!
//! Each compressed block contributes one [`IndexEntry`] per contig it covers:
//! the tightest interval spanning the records of that contig that began
//! serializing inside the block, paired with the virtual file offset of the
//! first such record. The entries are written as the index section near the
//! end of the file and loaded into an interval tree for overlap queries.

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::dict::SequenceDictionary;
use crate::error::Result;
use crate::interval::{CollatingInterval, SIZE_INTERVAL};

/// Number of bytes in the on-disk form of an index entry
pub const SIZE_INDEX_ENTRY: usize = SIZE_INTERVAL + 8;

/// A block-coverage interval paired with the block's virtual file offset
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndexEntry {
    interval: CollatingInterval,
    virtual_offset: u64,
}
impl IndexEntry {
    #[must_use]
    pub fn new(interval: CollatingInterval, virtual_offset: u64) -> Self {
        Self {
            interval,
            virtual_offset,
        }
    }

    #[must_use]
    pub fn interval(&self) -> CollatingInterval {
        self.interval
    }

    /// Virtual offset of the first record that began serializing inside the
    /// referenced block, for this entry's contig
    #[must_use]
    pub fn virtual_offset(&self) -> u64 {
        self.virtual_offset
    }

    /// Writes the 20-byte on-disk form
    pub fn write_to<W: Write>(&self, dst: &mut W) -> Result<()> {
        self.interval.write_to(dst)?;
        dst.write_u64::<LittleEndian>(self.virtual_offset)?;
        Ok(())
    }

    /// Reads an entry written by [`Self::write_to`], resolving its contig
    /// index against the dictionary
    pub fn read_from<R: Read>(src: &mut R, dict: &SequenceDictionary) -> Result<Self> {
        let interval = CollatingInterval::read_from(src, dict)?;
        let virtual_offset = src.read_u64::<LittleEndian>()?;
        Ok(Self {
            interval,
            virtual_offset,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dict::Contig;

    fn test_dict() -> SequenceDictionary {
        SequenceDictionary::new(vec![Contig::new("chr1", 1000), Contig::new("chr2", 500)])
    }

    #[test]
    fn test_wire_round_trip() {
        let dict = test_dict();
        let interval = CollatingInterval::new(&dict, 1, 10, 50).unwrap();
        let entry = IndexEntry::new(interval, (77u64 << 16) | 12);

        let mut buf = Vec::new();
        entry.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), SIZE_INDEX_ENTRY);

        let restored = IndexEntry::read_from(&mut buf.as_slice(), &dict).unwrap();
        assert_eq!(restored, entry);
    }

    #[test]
    fn test_read_rejects_unknown_contig() {
        let dict = test_dict();
        let mut buf = Vec::new();
        buf.extend_from_slice(&5u32.to_le_bytes());
        buf.extend_from_slice(&1u32.to_le_bytes());
        buf.extend_from_slice(&10u32.to_le_bytes());
        buf.extend_from_slice(&0u64.to_le_bytes());
        assert!(IndexEntry::read_from(&mut buf.as_slice(), &dict).is_err());
    }
}
