use crate::errors::{Result, TremoloError};

/// Identifier of a word: a dictionary index packed with a word index.
///
/// The upper 4 bits hold the dictionary index (0 = system, 1.. = user
/// dictionaries in load order) and the lower 28 bits hold the word index.
#[derive(Clone, Copy, Eq, PartialEq, Debug, Hash, PartialOrd, Ord)]
pub struct WordId(u32);

impl WordId {
    /// The maximum word index.
    pub const MAX_WORD_ID: u32 = 0x0fff_ffff;

    /// The maximum dictionary index.
    pub const MAX_DIC_ID: u32 = 0xe;

    const DIC_SHIFT: u32 = 28;

    // Dictionary index reserved for OOV words, whose word index is the POS id.
    const OOV_DIC: u32 = 0xf;

    /// Packs a dictionary index and a word index.
    ///
    /// # Errors
    ///
    /// [`TremoloError`] is returned when either index is out of range.
    pub fn new(dic: u32, word: u32) -> Result<Self> {
        if word > Self::MAX_WORD_ID {
            return Err(TremoloError::capacity_exceeded(
                "word id",
                format!("word index {word} exceeds {}", Self::MAX_WORD_ID),
            ));
        }
        if dic > Self::MAX_DIC_ID {
            return Err(TremoloError::capacity_exceeded(
                "word id",
                format!("dictionary index {dic} exceeds {}", Self::MAX_DIC_ID),
            ));
        }
        Ok(Self(dic << Self::DIC_SHIFT | word))
    }

    #[inline(always)]
    pub(crate) const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Gets the packed value.
    #[inline(always)]
    pub const fn raw(&self) -> u32 {
        self.0
    }

    /// Gets the dictionary index.
    #[inline(always)]
    pub const fn dic(&self) -> u32 {
        self.0 >> Self::DIC_SHIFT
    }

    /// Gets the word index in its dictionary.
    #[inline(always)]
    pub const fn word(&self) -> u32 {
        self.0 & Self::MAX_WORD_ID
    }

    #[inline(always)]
    pub(crate) const fn oov(pos_id: u16) -> Self {
        Self(Self::OOV_DIC << Self::DIC_SHIFT | pos_id as u32)
    }

    /// Checks if the id is of an OOV word.
    #[inline(always)]
    pub const fn is_oov(&self) -> bool {
        self.dic() == Self::OOV_DIC
    }

    /// Replaces the dictionary index, keeping the word index.
    #[inline(always)]
    pub(crate) const fn with_dic(self, dic: u32) -> Self {
        Self(dic << Self::DIC_SHIFT | self.word())
    }
}
