//! Common settings in Tremolo.

/// The maximum length of a string field in UTF-16 code units.
pub const MAX_STRING_LENGTH: usize = crate::dictionary::StringPtr::MAX_LENGTH;

/// The maximum number of items in a split or synonym list.
pub const MAX_ARRAY_LENGTH: usize = 127;

/// The maximum length of a POS component in characters.
pub const MAX_POS_COMPONENT_LENGTH: usize = 127;

/// The maximum number of POS tags in a dictionary set.
pub const MAX_POS_COUNT: usize = i16::MAX as usize;

/// The maximum length of a sentence produced by [`SentenceReader`](crate::SentenceReader), in bytes.
pub const MAX_SENTENCE_LENGTH: usize = 4096;

/// The maximum length of a sentence given to a [`Worker`](crate::tokenizer::worker::Worker),
/// in characters. Path costs of such a sentence always fit in `i32`.
pub const MAX_TOKENIZE_LENGTH: usize = 0x7FFF;
