//! Block-compressed stream adapters
//!
//! Thin wrappers around the BGZF codec that expose exactly what the writer
//! and reader need: virtual positions as plain `u64`s, sealing the current
//! block, seeking, and the raw-trailer teardown. All conversion to the
//! codec's own position type happens here.

use std::io::{self, Read, Seek, SeekFrom, Write};

use noodles_bgzf as bgzf;

use crate::vpos;

/// A compressing output stream with virtual-position tracking
///
/// The `Seek` bound exists for teardown only: the codec appends its own
/// end-of-file marker when it releases the sink, and [`Self::finish`] rewinds
/// over that marker so the caller's trailer block forms the file tail.
pub struct BlockCompressedWriter<W: Write + Seek> {
    inner: bgzf::Writer<W>,
}

impl<W: Write + Seek> BlockCompressedWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            inner: bgzf::Writer::new(sink),
        }
    }

    /// The virtual position the next written byte will have
    #[must_use]
    pub fn virtual_position(&self) -> u64 {
        vpos::from_virtual_position(self.inner.virtual_position())
    }

    /// Seals the block in progress, if any
    ///
    /// After this call the virtual position addresses the start of a fresh
    /// block.
    pub fn flush_block(&mut self) -> io::Result<()> {
        self.inner.flush()
    }

    /// Seals pending data, writes `trailer` as the final raw bytes of the
    /// file, and returns the sink
    ///
    /// The trailer bypasses the compressor; it must itself be a valid BGZF
    /// block so the output remains a well-formed BGZF file.
    pub fn finish(mut self, trailer: &[u8]) -> io::Result<W> {
        self.inner.flush()?;
        let eof_offset = vpos::block_offset(self.virtual_position());
        let mut sink = self.inner.finish()?;
        // overwrite the codec's end-of-file marker with the caller's trailer
        sink.seek(SeekFrom::Start(eof_offset))?;
        sink.write_all(trailer)?;
        sink.flush()?;
        Ok(sink)
    }
}

impl<W: Write + Seek> Write for BlockCompressedWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// A decompressing input cursor with virtual-position tracking and seeking
pub struct BlockCompressedReader<R: Read + Seek> {
    inner: bgzf::Reader<R>,
}

impl<R: Read + Seek> std::fmt::Debug for BlockCompressedReader<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockCompressedReader").finish_non_exhaustive()
    }
}

impl<R: Read + Seek> BlockCompressedReader<R> {
    pub fn new(source: R) -> Self {
        Self {
            inner: bgzf::Reader::new(source),
        }
    }

    /// The virtual position of the next byte to be read
    #[must_use]
    pub fn virtual_position(&self) -> u64 {
        vpos::from_virtual_position(self.inner.virtual_position())
    }

    /// Positions the cursor at a virtual offset
    pub fn seek(&mut self, virtual_offset: u64) -> io::Result<u64> {
        self.inner
            .seek(vpos::to_virtual_position(virtual_offset))
            .map(vpos::from_virtual_position)
    }
}

impl<R: Read + Seek> Read for BlockCompressedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}
