use thiserror::Error;

/// Failures while decoding a buffer. Encoding never fails; unsupported input degrades
/// to `Undefined` instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CodecError {
    #[error("unknown tag {tag} at offset {offset}")]
    UnknownTag { tag: u8, offset: usize },

    #[error("buffer truncated at offset {offset}: needed {needed} more bytes")]
    Truncated { offset: usize, needed: usize },

    #[error("invalid UTF-16 string at offset {offset}")]
    InvalidString { offset: usize },

    #[error("sequence at offset {offset} has an invalid element kind")]
    InvalidSequenceKind { offset: usize },

    #[error("list model handle {index} is missing or already consumed")]
    InvalidHandle { index: u64 },

    #[error("nesting deeper than {max_depth} at offset {offset}")]
    TooDeep { max_depth: usize, offset: usize },
}
