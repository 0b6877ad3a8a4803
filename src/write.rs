//! Writer for block-compressed interval streams
//!
//! The writer ingests records in collating order, compresses them into BGZF
//! blocks, and tracks block transitions as it goes: each compressed block
//! contributes one index entry per contig it covers, keyed by the tightest
//! interval spanning that contig's records and pointing at the virtual
//! offset of the first record that began serializing inside the block.
//! Closing the stream appends the accumulated index and the trailer block
//! that locates it.

use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::marker::PhantomData;
use std::path::Path;
use std::sync::Arc;

use byteorder::{LittleEndian, WriteBytesExt};
use log::debug;

use crate::dict::{self, SequenceDictionary};
use crate::error::{Error, Result, WriteError};
use crate::index::IndexEntry;
use crate::interval::CollatingInterval;
use crate::record::IntervalRecord;
use crate::stream::BlockCompressedWriter;
use crate::trailer;
use crate::vpos;

/// Writes interval-bearing records to a self-indexing block-compressed stream
///
/// Records must arrive in non-decreasing collating order; out-of-order writes
/// fail with [`WriteError::NotSorted`] and leave the stream unusable. Call
/// [`Writer::finish`] to emit the index and trailer; dropping the writer
/// performs a best-effort finish.
///
/// # Example
///
/// ```no_run
/// use bci::{BareInterval, CollatingInterval, Contig, SequenceDictionary, Writer};
///
/// fn main() -> bci::Result<()> {
///     let dict = SequenceDictionary::new(vec![Contig::new("chr1", 248_956_422)]);
///     let mut writer: Writer<_, BareInterval> = Writer::create("loci.bci", dict)?;
///
///     let interval = CollatingInterval::with_name(writer.dictionary(), "chr1", 100, 200)?;
///     writer.write(&BareInterval(interval))?;
///     writer.finish()?;
///     Ok(())
/// }
/// ```
pub struct Writer<W: Write + Seek, R: IntervalRecord> {
    /// Compressing output stream; `None` once finished
    stream: Option<BlockCompressedWriter<W>>,

    /// The dictionary records are sorted against
    dict: Arc<SequenceDictionary>,

    /// Label used in error messages (the path, when known)
    context: String,

    /// Interval of the most recently written record
    last_interval: Option<CollatingInterval>,

    /// Accumulated index entries, in (block offset, contig) order
    entries: Vec<IndexEntry>,

    /// Virtual offset of the first record tracked for the pending entry
    block_vpos: u64,

    /// Contig covered by the pending entry
    block_contig: u32,

    /// Tightest span observed for the pending entry
    block_start: u32,
    block_end: u32,

    /// Set when the next record is the first tracked member of its block
    first_block_member: bool,

    _record: PhantomData<R>,
}

impl<R: IntervalRecord> Writer<BufWriter<File>, R> {
    /// Creates a stream at `path`
    pub fn create<P: AsRef<Path>>(path: P, dict: SequenceDictionary) -> Result<Self> {
        let path = path.as_ref();
        let context = path.display().to_string();
        let file = File::create(path).map_err(|source| WriteError::Io {
            context: context.clone(),
            source,
        })?;
        Self::with_context(BufWriter::new(file), dict, context)
    }
}

impl<W: Write + Seek, R: IntervalRecord> Writer<W, R> {
    /// Creates a stream over an arbitrary seekable sink
    pub fn new(sink: W, dict: SequenceDictionary) -> Result<Self> {
        Self::with_context(sink, dict, "<stream>".to_string())
    }

    fn with_context(sink: W, dict: SequenceDictionary, context: String) -> Result<Self> {
        let mut writer = Self {
            stream: Some(BlockCompressedWriter::new(sink)),
            dict: Arc::new(dict),
            context,
            last_interval: None,
            entries: Vec::new(),
            block_vpos: 0,
            block_contig: 0,
            block_start: 0,
            block_end: 0,
            first_block_member: true,
            _record: PhantomData,
        };
        if let Err(e) = writer.write_header() {
            // a failed stream cannot be finished; disarm the drop
            writer.stream = None;
            return Err(e);
        }
        Ok(writer)
    }

    /// Writes the header block: class tag, version tag, dictionary
    fn write_header(&mut self) -> Result<()> {
        let dict = Arc::clone(&self.dict);
        dict::write_utf(self.stream_mut()?, R::CLASS_NAME).map_err(|e| self.wrap(e))?;
        dict::write_utf(self.stream_mut()?, R::VERSION).map_err(|e| self.wrap(e))?;
        dict.write_to(self.stream_mut()?).map_err(|e| self.wrap(e))?;
        self.stream_mut()?.flush_block().map_err(|e| self.wrap_io(e))?;
        Ok(())
    }

    /// The dictionary this stream is sorted against
    #[must_use]
    pub fn dictionary(&self) -> &SequenceDictionary {
        &self.dict
    }

    /// Number of index entries accumulated so far
    #[must_use]
    pub fn index_len(&self) -> usize {
        self.entries.len()
    }

    /// Writes one record
    pub fn write(&mut self, record: &R) -> Result<()> {
        let prev_vpos = self.stream_mut()?.virtual_position();

        let encoded = record.encode(self.stream_mut()?);
        encoded.map_err(|e| self.wrap(e))?;

        let interval = record.interval();
        if let Some(last) = self.last_interval {
            if interval < last {
                return Err(WriteError::NotSorted {
                    previous: last.display_with(&self.dict),
                    current: interval.display_with(&self.dict),
                }
                .into());
            }
        }

        // the first record tracked for a block just seeds the pending entry
        if self.first_block_member || self.last_interval.is_none() {
            self.start_block(prev_vpos, interval);
            return Ok(());
        }

        // a contig change closes out the pending entry and starts another for
        // the same block
        if interval.contig_index() != self.block_contig {
            self.push_entry()?;
            self.start_block(prev_vpos, interval);
            return Ok(());
        }

        self.block_end = self.block_end.max(interval.end());
        self.last_interval = Some(interval);

        // writing this record may have sealed a compressed block
        let cur_vpos = self.stream_mut()?.virtual_position();
        if !vpos::same_block(prev_vpos, cur_vpos) {
            self.push_entry()?;
            self.first_block_member = true;
        }
        Ok(())
    }

    /// Emits the index section and trailer, sealing the file
    ///
    /// Idempotent: later calls (including the one from `Drop`) do nothing.
    pub fn finish(&mut self) -> Result<()> {
        let Some(mut stream) = self.stream.take() else {
            return Ok(());
        };

        if !self.first_block_member {
            self.push_entry()?;
        }

        // seal the payload, then the index section starts on a block boundary
        stream.flush_block().map_err(|e| self.wrap_io(e))?;
        let index_vpos = stream.virtual_position();

        stream
            .write_u32::<LittleEndian>(self.entries.len() as u32)
            .map_err(|e| self.wrap_io(e))?;
        for entry in &self.entries {
            entry.write_to(&mut stream).map_err(|e| self.wrap(e))?;
        }

        let block = trailer::with_index_pointer(index_vpos);
        stream.finish(&block).map_err(|e| self.wrap_io(e))?;
        debug!(
            "sealed {} with {} index entries at virtual offset {index_vpos}",
            self.context,
            self.entries.len(),
        );
        Ok(())
    }

    fn start_block(&mut self, virtual_offset: u64, interval: CollatingInterval) {
        self.block_vpos = virtual_offset;
        self.last_interval = Some(interval);
        self.block_contig = interval.contig_index();
        self.block_start = interval.start();
        self.block_end = interval.end();
        self.first_block_member = false;
    }

    /// Appends the pending entry to the index
    fn push_entry(&mut self) -> Result<()> {
        let interval =
            CollatingInterval::new(&self.dict, self.block_contig, self.block_start, self.block_end)?;
        self.entries.push(IndexEntry::new(interval, self.block_vpos));
        Ok(())
    }

    fn stream_mut(&mut self) -> Result<&mut BlockCompressedWriter<W>> {
        let context = &self.context;
        self.stream
            .as_mut()
            .ok_or_else(|| {
                WriteError::AlreadyFinished {
                    context: context.clone(),
                }
                .into()
            })
    }

    fn wrap(&self, error: Error) -> Error {
        match error {
            Error::IoError(source) => self.wrap_io(source),
            other => other,
        }
    }

    fn wrap_io(&self, source: std::io::Error) -> Error {
        WriteError::Io {
            context: self.context.clone(),
            source,
        }
        .into()
    }
}

impl<W: Write + Seek, R: IntervalRecord> Drop for Writer<W, R> {
    fn drop(&mut self) {
        if self.stream.is_some() {
            self.finish().expect("Writer: failed to finish stream");
        }
    }
}
