//! Providers of out-of-vocabulary words.
//!
//! Providers are configured statically with [`OovProviderConfig`]. At each
//! reachable position, the tokenizer calls its providers in configuration
//! order with the word lengths already found there.
mod character;
mod mecab;
mod pattern;
mod simple;

use crate::dictionary::{Dictionary, Pos, WordParam};
use crate::errors::{Result, TremoloError};
use crate::sentence::Sentence;

pub use character::{CharInfo, CharProperty};
pub use mecab::{MecabOov, MecabOovConfig};
pub use pattern::{Boundaries, RegexOov, RegexOovConfig};
pub use simple::{SimpleOov, SimpleOovConfig};

/// Set of word lengths in characters found at a position.
///
/// Lengths of [`WordMask::MAX_LENGTH`] and more share the last bit.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct WordMask(u64);

impl WordMask {
    /// The longest length with a bit of its own.
    pub const MAX_LENGTH: usize = 63;

    #[inline(always)]
    const fn nth(length: usize) -> u64 {
        debug_assert!(length > 0);
        let bit = if length - 1 < Self::MAX_LENGTH {
            length - 1
        } else {
            Self::MAX_LENGTH
        };
        1 << bit
    }

    #[inline(always)]
    pub fn add(&mut self, length: usize) {
        self.0 |= Self::nth(length);
    }

    #[inline(always)]
    pub const fn has(&self, length: usize) -> bool {
        self.0 & Self::nth(length) != 0
    }

    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

/// Word lengths found at a position.
///
/// Short lengths are kept in a [`WordMask`]. Lengths sharing its last bit are
/// also listed, so that they can be told apart.
#[derive(Clone, Debug, Default)]
pub(crate) struct FoundLengths {
    mask: WordMask,
    long: Vec<usize>,
}

impl FoundLengths {
    #[inline(always)]
    pub fn clear(&mut self) {
        self.mask = WordMask::default();
        self.long.clear();
    }

    #[inline(always)]
    pub fn add(&mut self, length: usize) {
        self.mask.add(length);
        if length > WordMask::MAX_LENGTH && !self.long.contains(&length) {
            self.long.push(length);
        }
    }

    /// Checks if a word of exactly `length` characters was found.
    #[inline(always)]
    pub fn has(&self, length: usize) -> bool {
        if length > WordMask::MAX_LENGTH {
            self.long.contains(&length)
        } else {
            self.mask.has(length)
        }
    }

    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.mask.is_empty()
    }
}

/// Word produced by a provider.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct OovWord {
    pub end_char: usize,
    pub param: WordParam,
    pub pos_id: u16,
}

/// Provider of out-of-vocabulary words.
pub enum OovProvider {
    Simple(SimpleOov),
    Regex(RegexOov),
    Mecab(MecabOov),
}

impl OovProvider {
    /// Appends words starting at `start_char` to `out`.
    #[inline(always)]
    pub(crate) fn provide(
        &self,
        sent: &Sentence,
        start_char: usize,
        found: &FoundLengths,
        out: &mut Vec<OovWord>,
    ) {
        match self {
            Self::Simple(p) => p.provide(sent, start_char, found, out),
            Self::Regex(p) => p.provide(sent, start_char, found, out),
            Self::Mecab(p) => p.provide(sent, start_char, found, out),
        }
    }

    /// Checks if the provider reads character categories of the sentence.
    pub(crate) fn needs_categories(&self) -> bool {
        matches!(self, Self::Regex(p) if p.boundaries() == Boundaries::Strict)
    }

    pub(crate) const fn char_prop(&self) -> Option<&CharProperty> {
        match self {
            Self::Mecab(p) => Some(p.char_prop()),
            _ => None,
        }
    }
}

/// Configuration of an OOV provider.
#[derive(Clone, Debug)]
pub enum OovProviderConfig {
    /// One-character words where no other word starts.
    Simple(SimpleOovConfig),
    /// Words matching a regular expression.
    Regex(RegexOovConfig),
    /// Words grouped by character categories of `char.def` and `unk.def`.
    Mecab(MecabOovConfig),
}

impl OovProviderConfig {
    /// Builds the provider for `dict`.
    ///
    /// # Errors
    ///
    /// [`TremoloError`] is returned when the configuration is invalid, names an
    /// undefined POS, or gives context ids out of the connection matrix.
    pub fn build(&self, dict: &Dictionary) -> Result<OovProvider> {
        Ok(match self {
            Self::Simple(c) => OovProvider::Simple(SimpleOov::new(c, dict)?),
            Self::Regex(c) => OovProvider::Regex(RegexOov::new(c, dict)?),
            Self::Mecab(c) => OovProvider::Mecab(MecabOov::new(c, dict)?),
        })
    }
}

/// Resolves the POS and checks the context ids of an OOV word.
pub(crate) fn resolve_param(
    dict: &Dictionary,
    pos: &Pos,
    left_id: i16,
    right_id: i16,
    cost: i16,
) -> Result<(WordParam, u16)> {
    let pos_id = dict.pos_id(pos).ok_or_else(|| {
        TremoloError::invalid_argument("pos", format!("POS {pos} is not in the dictionary"))
    })?;
    let conn = dict.connection();
    let in_range = |id: i16, size: usize| usize::try_from(id).map_or(false, |id| id < size);
    if !in_range(right_id, conn.left_size()) || !in_range(left_id, conn.right_size()) {
        return Err(TremoloError::invalid_argument(
            "left_id/right_id",
            format!("context ids ({left_id}, {right_id}) are out of the connection matrix"),
        ));
    }
    Ok((WordParam::new(left_id, right_id, cost), pos_id))
}
