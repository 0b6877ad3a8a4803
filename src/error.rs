use std::error::Error as StdError;

/// Custom Result type for bci operations, wrapping the custom [`Error`] type
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the bci library, encompassing all possible error
/// cases that can occur while writing or querying block-compressed interval
/// streams.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Errors raised while constructing or validating collating intervals
    #[error("Error processing interval: {0}")]
    IntervalError(#[from] IntervalError),

    /// Errors that occur during write operations
    #[error("Error writing file: {0}")]
    WriteError(#[from] WriteError),

    /// Errors that occur during read operations
    #[error("Error reading file: {0}")]
    ReadError(#[from] ReadError),

    /// Standard I/O errors
    #[error("Error with IO: {0}")]
    IoError(#[from] std::io::Error),

    /// UTF-8 conversion errors
    #[error("Error with UTF8: {0}")]
    Utf8Error(#[from] std::string::FromUtf8Error),

    /// Conversion errors from anyhow errors
    #[cfg(feature = "anyhow")]
    #[error("Generic error: {0}")]
    AnyhowError(#[from] anyhow::Error),

    /// Generic errors for other unexpected situations
    #[error("Generic error: {0}")]
    GenericError(#[from] Box<dyn StdError + Send + Sync>),
}

/// Errors raised while constructing or validating collating intervals
#[derive(thiserror::Error, Debug)]
pub enum IntervalError {
    /// A contig name was not found in the sequence dictionary
    #[error("Contig '{name}' is not in the sequence dictionary")]
    UnknownContig { name: String },

    /// A contig index was outside the sequence dictionary
    ///
    /// # Fields
    /// * `index` - The offending contig index
    /// * `len` - The number of contigs in the dictionary
    #[error("Contig index {index} is out of dictionary range ({len} contigs)")]
    UnknownContigIndex { index: u32, len: usize },

    /// Interval coordinates violate the 1-based closed-bounds invariant
    /// `1 <= start <= end <= contig length`
    #[error("Interval {start}-{end} is out of bounds for contig '{contig}' (length {length})")]
    OutOfBounds {
        start: u32,
        end: u32,
        contig: String,
        length: u32,
    },
}

/// Errors that can occur while writing a block-compressed interval stream
#[derive(thiserror::Error, Debug)]
pub enum WriteError {
    /// A record was written out of collating order
    ///
    /// The writer state is undefined after this error.
    #[error("Record interval {current} sorts before the previously written {previous}")]
    NotSorted { previous: String, current: String },

    /// An underlying I/O failure while writing
    #[error("Write failed for {context}: {source}")]
    Io {
        context: String,
        source: std::io::Error,
    },

    /// The writer was used after `finish`
    #[error("Writer for {context} is already finished")]
    AlreadyFinished { context: String },
}

/// Errors that can occur while reading a block-compressed interval stream
#[derive(thiserror::Error, Debug)]
pub enum ReadError {
    /// An underlying I/O failure while reading
    #[error("Read failed for {context}: {source}")]
    Io {
        context: String,
        source: std::io::Error,
    },

    /// The final block of the file does not match the trailer template
    #[error("Unable to recover index pointer from final block of {context}")]
    CorruptTrailer { context: String },

    /// The index section could not be decoded
    #[error("Malformed index in {context}: {detail}")]
    CorruptIndex { context: String, detail: String },

    /// The file's class tag does not match the requested record type
    #[error("Cannot read {expected} records from {context}: it contains {found} records")]
    ClassMismatch {
        context: String,
        expected: String,
        found: String,
    },
}
