//! Sequence dictionary support
//!
//! A [`SequenceDictionary`] is the ordered list of contigs a stream is
//! coordinate-sorted against. The writer embeds it in the first compressed
//! block of the file; the reader reconstructs an equivalent dictionary from
//! that block. Contig indices used throughout the crate are positions in this
//! list.

use std::collections::HashMap;
use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{IntervalError, Result};

/// A named reference sequence of fixed length
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Contig {
    name: String,
    length: u32,
}
impl Contig {
    pub fn new(name: impl Into<String>, length: u32) -> Self {
        Self {
            name: name.into(),
            length,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn length(&self) -> u32 {
        self.length
    }
}

/// An ordered collection of contigs with by-name lookup
///
/// The dictionary is authoritative for a file: it may name contigs that never
/// appear in any compressed block.
#[derive(Clone, Debug, Default)]
pub struct SequenceDictionary {
    contigs: Vec<Contig>,
    lookup: HashMap<String, u32>,
}
impl SequenceDictionary {
    #[must_use]
    pub fn new(contigs: Vec<Contig>) -> Self {
        let lookup = contigs
            .iter()
            .enumerate()
            .map(|(index, contig)| (contig.name.clone(), index as u32))
            .collect();
        Self { contigs, lookup }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.contigs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contigs.is_empty()
    }

    /// Returns the contig at `index`, if it is in range
    #[must_use]
    pub fn get(&self, index: u32) -> Option<&Contig> {
        self.contigs.get(index as usize)
    }

    /// Returns the contig at `index` or an [`IntervalError::UnknownContigIndex`]
    pub fn require(&self, index: u32) -> Result<&Contig> {
        self.get(index).ok_or_else(|| {
            IntervalError::UnknownContigIndex {
                index,
                len: self.contigs.len(),
            }
            .into()
        })
    }

    /// Returns the index of the contig with the given name, if present
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<u32> {
        self.lookup.get(name).copied()
    }

    pub fn contigs(&self) -> impl Iterator<Item = &Contig> {
        self.contigs.iter()
    }

    /// Returns the contig names in dictionary order
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.contigs.iter().map(|c| c.name.clone()).collect()
    }

    /// Writes the dictionary in its on-disk form: a `u32` contig count, then
    /// per contig its `u32` length and length-prefixed name.
    pub fn write_to<W: Write>(&self, dst: &mut W) -> Result<()> {
        dst.write_u32::<LittleEndian>(self.contigs.len() as u32)?;
        for contig in &self.contigs {
            dst.write_u32::<LittleEndian>(contig.length)?;
            write_utf(dst, &contig.name)?;
        }
        Ok(())
    }

    /// Reads a dictionary written by [`Self::write_to`]
    pub fn read_from<R: Read>(src: &mut R) -> Result<Self> {
        let n_recs = src.read_u32::<LittleEndian>()?;
        let mut contigs = Vec::with_capacity(n_recs as usize);
        for _ in 0..n_recs {
            let length = src.read_u32::<LittleEndian>()?;
            let name = read_utf(src)?;
            contigs.push(Contig::new(name, length));
        }
        Ok(Self::new(contigs))
    }
}

/// Writes a length-prefixed UTF-8 string: a `u16` byte count then the bytes
pub(crate) fn write_utf<W: Write>(dst: &mut W, value: &str) -> Result<()> {
    dst.write_u16::<LittleEndian>(value.len() as u16)?;
    dst.write_all(value.as_bytes())?;
    Ok(())
}

/// Reads a string written by [`write_utf`]
pub(crate) fn read_utf<R: Read>(src: &mut R) -> Result<String> {
    let len = src.read_u16::<LittleEndian>()?;
    let mut buf = vec![0u8; len as usize];
    src.read_exact(&mut buf)?;
    Ok(String::from_utf8(buf)?)
}
