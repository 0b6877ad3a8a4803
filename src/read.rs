//! Reader for block-compressed interval streams
//!
//! Opening a stream reads the raw 40-byte trailer to locate the index, then
//! decodes the header block (class tag, version tag, dictionary). Full
//! iteration decodes records from the first payload block up to the index;
//! overlap queries load the index into an interval tree once, then inflate
//! only the blocks whose coverage intervals overlap the query.
//!
//! A reader owns its own decompression cursor. Clones share the dictionary,
//! trailer pointer, and the lazily loaded index, but open an independent
//! cursor; every iterator is backed by its own clone so concurrent iteration
//! does not interfere.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use byteorder::{LittleEndian, ReadBytesExt};
use log::debug;

use crate::dict::{self, SequenceDictionary};
use crate::error::{Error, ReadError, Result};
use crate::index::IndexEntry;
use crate::interval::CollatingInterval;
use crate::record::IntervalRecord;
use crate::stream::BlockCompressedReader;
use crate::trailer::{self, TRAILER_LEN};
use crate::tree::IntervalTree;
use crate::vpos;

fn wrap_read(context: &str, error: Error) -> Error {
    match error {
        Error::IoError(source) => ReadError::Io {
            context: context.to_string(),
            source,
        }
        .into(),
        other => other,
    }
}

/// Reads records from a self-indexing block-compressed stream
///
/// # Example
///
/// ```no_run
/// use bci::{BareInterval, Reader};
///
/// fn main() -> bci::Result<()> {
///     let mut reader: Reader<BareInterval> = Reader::open("loci.bci")?;
///     for record in reader.query("chr1", 250, 260)? {
///         let record = record?;
///         // only records overlapping chr1:250-260 arrive here
///     }
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct Reader<R: IntervalRecord> {
    path: Arc<PathBuf>,
    context: String,
    dict: Arc<SequenceDictionary>,
    version: Arc<String>,
    index_vpos: u64,
    data_vpos: u64,
    stream: BlockCompressedReader<File>,
    index: Arc<OnceLock<IntervalTree<u64>>>,
    _record: PhantomData<R>,
}

impl<R: IntervalRecord> Reader<R> {
    /// Opens a stream, verifying its trailer and class tag
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let context = path.display().to_string();

        let mut file = File::open(&path).map_err(|source| ReadError::Io {
            context: context.clone(),
            source,
        })?;
        let index_vpos = read_trailer_pointer(&mut file, &context)?;

        let mut stream = BlockCompressedReader::new(file);
        let class_name = dict::read_utf(&mut stream).map_err(|e| wrap_read(&context, e))?;
        if class_name != R::CLASS_NAME {
            return Err(ReadError::ClassMismatch {
                context,
                expected: R::CLASS_NAME.to_string(),
                found: class_name,
            }
            .into());
        }
        let version = dict::read_utf(&mut stream).map_err(|e| wrap_read(&context, e))?;
        let dict =
            SequenceDictionary::read_from(&mut stream).map_err(|e| wrap_read(&context, e))?;
        let data_vpos = stream.virtual_position();

        Ok(Self {
            path: Arc::new(path),
            context,
            dict: Arc::new(dict),
            version: Arc::new(version),
            index_vpos,
            data_vpos,
            stream,
            index: Arc::new(OnceLock::new()),
            _record: PhantomData,
        })
    }

    /// Opens an independent cursor sharing this reader's dictionary, trailer
    /// pointer, and index
    pub fn try_clone(&self) -> Result<Self> {
        let file = File::open(self.path.as_ref()).map_err(|source| ReadError::Io {
            context: self.context.clone(),
            source,
        })?;
        Ok(Self {
            path: Arc::clone(&self.path),
            context: self.context.clone(),
            dict: Arc::clone(&self.dict),
            version: Arc::clone(&self.version),
            index_vpos: self.index_vpos,
            data_vpos: self.data_vpos,
            stream: BlockCompressedReader::new(file),
            index: Arc::clone(&self.index),
            _record: PhantomData,
        })
    }

    /// The dictionary reconstructed from the file header
    #[must_use]
    pub fn dictionary(&self) -> &SequenceDictionary {
        &self.dict
    }

    /// The version tag stored in the file header
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// The path this reader was opened from
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Contig names in dictionary order
    ///
    /// The dictionary is authoritative: names may include contigs that occur
    /// in no block of the file.
    #[must_use]
    pub fn sequence_names(&self) -> Vec<String> {
        self.dict.names()
    }

    /// Iterates every record in the stream, in file order
    pub fn records(&self) -> Result<RecordIterator<R>> {
        let mut reader = self.try_clone()?;
        reader
            .stream
            .seek(reader.data_vpos)
            .map_err(|source| ReadError::Io {
                context: reader.context.clone(),
                source,
            })?;
        Ok(RecordIterator { reader })
    }

    /// Iterates the records whose intervals overlap `contig:start-end`
    ///
    /// Records within a block arrive in file order, but no order holds
    /// across blocks: blocks are visited in index-enumeration order.
    pub fn query(&mut self, contig: &str, start: u32, end: u32) -> Result<QueryIterator<R>> {
        let query = CollatingInterval::with_name(&self.dict, contig, start, end)?;
        self.ensure_index()?;
        let tree = self.index.get().expect("index is published by ensure_index");
        let entries: Vec<u64> = tree.overlappers(&query).map(|(_, vpos)| *vpos).collect();
        Ok(QueryIterator {
            reader: self.try_clone()?,
            query,
            entries: entries.into_iter(),
            block_vpos: None,
            done: false,
        })
    }

    /// Loads and publishes the shared index if no clone has done so yet
    ///
    /// Racing first queries may both load; publication through the cell is
    /// atomic and the losing copy is discarded.
    fn ensure_index(&mut self) -> Result<()> {
        if self.index.get().is_some() {
            return Ok(());
        }
        let tree = self.load_index()?;
        let _ = self.index.set(tree);
        Ok(())
    }

    fn load_index(&mut self) -> Result<IntervalTree<u64>> {
        self.stream
            .seek(self.index_vpos)
            .map_err(|source| ReadError::Io {
                context: self.context.clone(),
                source,
            })?;
        let n_entries = self
            .stream
            .read_u32::<LittleEndian>()
            .map_err(|source| ReadError::Io {
                context: self.context.clone(),
                source,
            })?;

        let mut tree = IntervalTree::new();
        for _ in 0..n_entries {
            let entry = IndexEntry::read_from(&mut self.stream, &self.dict)
                .map_err(|e| self.corrupt_index(e))?;
            tree.put(entry.interval(), entry.virtual_offset());
        }

        self.stream
            .seek(self.data_vpos)
            .map_err(|source| ReadError::Io {
                context: self.context.clone(),
                source,
            })?;
        debug!(
            "loaded {n_entries} index entries from {} at virtual offset {}",
            self.context, self.index_vpos,
        );
        Ok(tree)
    }

    fn corrupt_index(&self, error: Error) -> Error {
        match error {
            Error::IoError(source) => ReadError::Io {
                context: self.context.clone(),
                source,
            }
            .into(),
            Error::IntervalError(detail) => ReadError::CorruptIndex {
                context: self.context.clone(),
                detail: detail.to_string(),
            }
            .into(),
            other => other,
        }
    }
}

/// Reads the raw final block of the file and decodes the index pointer
fn read_trailer_pointer(file: &mut File, context: &str) -> Result<u64> {
    let file_len = file
        .metadata()
        .map_err(|source| ReadError::Io {
            context: context.to_string(),
            source,
        })?
        .len();
    if file_len < TRAILER_LEN as u64 {
        return Err(ReadError::CorruptTrailer {
            context: context.to_string(),
        }
        .into());
    }

    let mut tail = [0u8; TRAILER_LEN];
    file.seek(SeekFrom::End(-(TRAILER_LEN as i64)))
        .and_then(|_| file.read_exact(&mut tail))
        .and_then(|()| file.seek(SeekFrom::Start(0)))
        .map_err(|source| ReadError::Io {
            context: context.to_string(),
            source,
        })?;

    trailer::read_index_pointer(&tail).ok_or_else(|| {
        ReadError::CorruptTrailer {
            context: context.to_string(),
        }
        .into()
    })
}

/// Iterator over every record of a stream, in file order
pub struct RecordIterator<R: IntervalRecord> {
    reader: Reader<R>,
}

impl<R: IntervalRecord> Iterator for RecordIterator<R> {
    type Item = Result<R>;

    fn next(&mut self) -> Option<Self::Item> {
        let position = self.reader.stream.virtual_position();
        if position == 0 || position >= self.reader.index_vpos {
            return None;
        }
        let decoded = R::decode(&mut self.reader.stream, &self.reader.dict)
            .map_err(|e| wrap_read(&self.reader.context, e));
        Some(decoded)
    }
}

/// Iterator over the records overlapping a query interval
///
/// Inflates only the blocks named by overlapping index entries. Within a
/// block, decoding stops early once a record lies entirely past the query;
/// remaining index entries are still visited.
#[derive(Debug)]
pub struct QueryIterator<R: IntervalRecord> {
    reader: Reader<R>,
    query: CollatingInterval,
    entries: std::vec::IntoIter<u64>,
    block_vpos: Option<u64>,
    done: bool,
}

impl<R: IntervalRecord> QueryIterator<R> {
    fn advance(&mut self) -> Result<Option<R>> {
        loop {
            let cursor = self.reader.stream.virtual_position();
            match self.block_vpos {
                // still inside the current entry's block
                Some(block_vpos) if vpos::same_block(block_vpos, cursor) => {}
                _ => {
                    let Some(next_vpos) = self.entries.next() else {
                        return Ok(None);
                    };
                    // reposition unless the cursor is already exactly there;
                    // the block alone is not enough, since a record can
                    // straddle a boundary and leave the cursor at the block
                    // start, upstream of the entry's first record
                    if cursor != next_vpos {
                        self.reader
                            .stream
                            .seek(next_vpos)
                            .map_err(|source| ReadError::Io {
                                context: self.reader.context.clone(),
                                source,
                            })?;
                    }
                    self.block_vpos = Some(next_vpos);
                }
            }

            let record = R::decode(&mut self.reader.stream, &self.reader.dict)
                .map_err(|e| wrap_read(&self.reader.context, e))?;
            let interval = record.interval();

            // records are sorted within a block: nothing past this one can
            // come back to the query, so abandon the block
            if self.query.is_upstream_of(&interval) {
                self.block_vpos = None;
                continue;
            }
            if self.query.overlaps(&interval) {
                return Ok(Some(record));
            }
        }
    }
}

impl<R: IntervalRecord> Iterator for QueryIterator<R> {
    type Item = Result<R>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.advance() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(error) => {
                self.done = true;
                Some(Err(error))
            }
        }
    }
}
