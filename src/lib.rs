#![doc = include_str!("../README.md")]
//!
//! # Library layout
//!
//! - [`Writer`] ingests coordinate-sorted [`IntervalRecord`]s, compresses
//!   them into BGZF blocks, and appends the embedded index and trailer on
//!   [`Writer::finish`].
//! - [`Reader`] recovers the index pointer from the trailer and offers full
//!   iteration ([`Reader::records`]) and indexed overlap queries
//!   ([`Reader::query`]).
//! - [`CollatingInterval`] and [`SequenceDictionary`] define the coordinate
//!   model; [`IntervalTree`] holds the in-memory index.
//! - [`vpos`] centralizes BGZF virtual-offset arithmetic; [`stream`] adapts
//!   the BGZF codec; [`trailer`] owns the 40-byte trailer template.

/// Sequence dictionary: ordered contigs with by-name lookup
pub mod dict;

/// Error definitions
pub mod error;

/// Index entries mapping block coverage intervals to virtual offsets
pub mod index;

/// Collating intervals: ordering, predicates, wire form
pub mod interval;

/// Reader, full iteration, and overlap queries
pub mod read;

/// The record trait writers and readers are generic over
pub mod record;

/// Block-compressed stream adapters over the BGZF codec
pub mod stream;

/// The 40-byte trailer block carrying the index pointer
pub mod trailer;

/// In-memory interval tree backing overlap queries
pub mod tree;

/// Virtual file offset arithmetic
pub mod vpos;

/// Writer with block-transition tracking and index accumulation
pub mod write;

pub use dict::{Contig, SequenceDictionary};
pub use error::{Error, IntervalError, ReadError, Result, WriteError};
pub use index::IndexEntry;
pub use interval::CollatingInterval;
pub use read::{QueryIterator, Reader, RecordIterator};
pub use record::{BareInterval, IntervalRecord};
pub use trailer::{BCI_EXTENSION, TRAILER_TEMPLATE};
pub use tree::IntervalTree;
pub use vpos::{block_offset, same_block, within_block_offset};
pub use write::Writer;
