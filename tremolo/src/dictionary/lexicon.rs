mod builder;
mod map;
mod param;
mod raw;
mod words;

use crate::dictionary::connector::Connection;
use crate::dictionary::strings::Strings;
use crate::dictionary::{DictionaryBuffer, StringPtr, WordId};
use crate::errors::{Result, TremoloError};
use crate::tokenizer::SplitMode;

pub use builder::{CompiledLexicon, LexiconCompiler, Target};
pub use map::{WordMap, WordMapBuilder};
pub use param::WordParam;
pub use raw::{unescape, ColumnLayout, NormalizedForm, RawEntry, WordRef};
pub use words::{WordRecord, Words};

/// Kind of a lexicon.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum LexiconKind {
    System,
    /// A user lexicon with the signature of the system dictionary it was built on.
    User { reference: String },
}

/// Sizes that stored data of a lexicon is checked against when loaded.
pub(crate) struct LoadBounds<'a> {
    pub connection: &'a Connection,
    pub num_system_words: usize,
    pub num_pos: usize,
}

/// Read-only lexicon backed by dictionary blocks.
pub struct Lexicon {
    kind: LexiconKind,
    dic_id: u32,
    map: WordMap,
    words: Words,
    strings: Strings,
    // POS ids at or above this are added by a user dictionary.
    pos_builtin: u16,
    pos_shift: u16,
}

/// A word found by a prefix search.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LexMatch {
    pub word_id: WordId,
    pub param: WordParam,
    pub end_char: usize,
}

impl Lexicon {
    pub(crate) fn new(
        kind: LexiconKind,
        dic_id: u32,
        index: DictionaryBuffer,
        strings: DictionaryBuffer,
        words: DictionaryBuffer,
    ) -> Result<Self> {
        Ok(Self {
            kind,
            dic_id,
            map: WordMap::read(index)?,
            words: Words::new(words)?,
            strings: Strings::new(strings)?,
            pos_builtin: u16::MAX,
            pos_shift: 0,
        })
    }

    /// Shifts POS ids from `builtin` by `shift`.
    pub(crate) fn set_pos_shift(&mut self, builtin: u16, shift: u16) {
        self.pos_builtin = builtin;
        self.pos_shift = shift;
    }

    #[inline(always)]
    pub const fn kind(&self) -> &LexiconKind {
        &self.kind
    }

    #[inline(always)]
    pub const fn dic_id(&self) -> u32 {
        self.dic_id
    }

    /// Number of words including ones reachable only by reference.
    #[inline(always)]
    pub const fn len(&self) -> usize {
        self.words.len()
    }

    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.words.len() == 0
    }

    /// Finds all words whose surface is a prefix of `input`.
    #[inline(always)]
    pub fn common_prefix_iterator<'a>(
        &'a self,
        input: &'a [char],
    ) -> impl Iterator<Item = LexMatch> + 'a {
        self.map
            .common_prefix_iterator(input)
            .map(move |(word, end_char)| LexMatch {
                word_id: WordId::from_raw(word).with_dic(self.dic_id),
                param: self.words.param(word as usize),
                end_char,
            })
    }

    /// Finds an indexed word by its surface, POS id and reading form.
    pub fn find_exact(&self, surface: &str, pos_id: u16, reading: &str) -> Option<u32> {
        let chars: Vec<char> = surface.chars().collect();
        for (word, end_char) in self.map.common_prefix_iterator(&chars) {
            if end_char != chars.len() {
                continue;
            }
            let i = word as usize;
            if self.pos_id(self.words.pos_id(i)) == pos_id
                && self.strings.get(self.words.reading(i)) == reading
            {
                return Some(word);
            }
        }
        None
    }

    #[inline(always)]
    pub(crate) fn param(&self, word: u32) -> WordParam {
        self.words.param(word as usize)
    }

    #[inline(always)]
    pub(crate) fn surface_len(&self, word: u32) -> usize {
        self.words.surface_len(word as usize)
    }

    #[inline(always)]
    fn pos_id(&self, raw: u16) -> u16 {
        if raw >= self.pos_builtin {
            raw + self.pos_shift
        } else {
            raw
        }
    }

    #[inline(always)]
    pub(crate) fn word_pos_id(&self, word: u32) -> u16 {
        self.pos_id(self.words.pos_id(word as usize))
    }

    pub(crate) fn headword(&self, word: u32) -> String {
        self.strings.get(self.words.headword(word as usize))
    }

    #[inline(always)]
    fn localize(&self, id: WordId) -> WordId {
        if id.dic() == 0 {
            id
        } else {
            id.with_dic(self.dic_id)
        }
    }

    /// Decodes the stored fields of `word`. Forms given by references are left
    /// to the caller, which knows the other lexicons.
    pub(crate) fn word_info(&self, word: u32) -> Result<WordInfo> {
        if word as usize >= self.len() {
            return Err(TremoloError::invalid_argument(
                "word_id",
                format!("word {word} does not exist in dictionary {}", self.dic_id),
            ));
        }
        let r = self.words.record(word as usize)?;
        let headword = self.strings.get(r.headword);
        let localize = |ids: Vec<WordId>| ids.into_iter().map(|id| self.localize(id)).collect();
        Ok(WordInfo {
            word_id: WordId::from_raw(word).with_dic(self.dic_id),
            param: r.param,
            pos_id: self.pos_id(r.pos_id),
            reading_form: self.strings.get(r.reading),
            normalized_form: match r.normalized_ref {
                Some(_) => String::new(),
                None => self.strings.get(r.normalized),
            },
            normalized_form_word_id: r.normalized_ref.map(|id| self.localize(id)),
            dictionary_form: headword.clone(),
            dictionary_form_word_id: r.dictionary_form_ref.map(|id| self.localize(id)),
            headword,
            surface_len: r.surface_len as usize,
            mode: r.mode,
            a_split: localize(r.a_split),
            b_split: localize(r.b_split),
            word_structure: localize(r.word_structure),
            synonym_group_ids: r.synonym_groups,
            user_data: self.strings.get(r.user_data),
        })
    }

    /// Checks every stored word, so that lookups never read out of bounds.
    pub(crate) fn validate(&self, bounds: &LoadBounds) -> Result<()> {
        let num_words = self.len();
        if u32::try_from(num_words).map_or(true, |n| n > WordId::MAX_WORD_ID + 1) {
            return Err(TremoloError::malformed_data(
                "words",
                0,
                format!("{num_words} words exceed the word id range"),
            ));
        }
        let check_ref = |i: usize, id: WordId| -> Result<()> {
            let limit = match (id.dic(), &self.kind) {
                (0, LexiconKind::System) => num_words,
                (0, LexiconKind::User { .. }) => bounds.num_system_words,
                (1, LexiconKind::User { .. }) => num_words,
                _ => 0,
            };
            if id.word() as usize >= limit {
                return Err(TremoloError::malformed_data(
                    "words",
                    i,
                    format!("word {i} refers to a missing word {:#x}", id.raw()),
                ));
            }
            Ok(())
        };
        for i in 0..num_words {
            let r = self.words.record(i)?;
            for ptr in [r.headword, r.reading, r.normalized, r.user_data] {
                self.strings.check(ptr)?;
            }
            if usize::from(r.pos_id) >= bounds.num_pos {
                return Err(TremoloError::malformed_data(
                    "words",
                    i,
                    format!("word {i} has an undefined POS id {}", r.pos_id),
                ));
            }
            let p = r.param;
            if p.is_indexed() {
                let in_range =
                    |id: i16, size: usize| usize::try_from(id).map_or(false, |id| id < size);
                if !in_range(p.right_id, bounds.connection.left_size())
                    || !in_range(p.left_id, bounds.connection.right_size())
                {
                    return Err(TremoloError::malformed_data(
                        "words",
                        i,
                        format!("word {i} has context ids out of the matrix"),
                    ));
                }
            }
            let refs = r.normalized_ref.iter().chain(&r.dictionary_form_ref);
            for &id in refs.chain(&r.a_split).chain(&r.b_split).chain(&r.word_structure) {
                check_ref(i, id)?;
            }
        }
        self.map.for_each_id(|word| {
            if word as usize >= num_words || !self.words.param(word as usize).is_indexed() {
                return Err(TremoloError::malformed_data(
                    "index",
                    0,
                    format!("posting of a missing or unindexed word {word}"),
                ));
            }
            Ok(())
        })
    }
}

/// Information of a dictionary word.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WordInfo {
    word_id: WordId,
    headword: String,
    param: WordParam,
    pos_id: u16,
    reading_form: String,
    normalized_form: String,
    normalized_form_word_id: Option<WordId>,
    dictionary_form: String,
    dictionary_form_word_id: Option<WordId>,
    surface_len: usize,
    mode: SplitMode,
    a_split: Vec<WordId>,
    b_split: Vec<WordId>,
    word_structure: Vec<WordId>,
    synonym_group_ids: Vec<u32>,
    user_data: String,
}

impl WordInfo {
    #[inline(always)]
    pub const fn word_id(&self) -> WordId {
        self.word_id
    }

    /// Headword shown to users. It equals the surface unless the lexicon gives
    /// a different writing.
    #[inline(always)]
    pub fn headword(&self) -> &str {
        &self.headword
    }

    #[inline(always)]
    pub const fn param(&self) -> WordParam {
        self.param
    }

    #[inline(always)]
    pub const fn pos_id(&self) -> u16 {
        self.pos_id
    }

    #[inline(always)]
    pub fn reading_form(&self) -> &str {
        &self.reading_form
    }

    #[inline(always)]
    pub fn normalized_form(&self) -> &str {
        &self.normalized_form
    }

    #[inline(always)]
    pub fn dictionary_form(&self) -> &str {
        &self.dictionary_form
    }

    /// Word id of the dictionary form, or `None` if the word is its own
    /// dictionary form.
    #[inline(always)]
    pub const fn dictionary_form_word_id(&self) -> Option<WordId> {
        self.dictionary_form_word_id
    }

    /// Length of the surface in UTF-8 bytes.
    #[inline(always)]
    pub const fn surface_len(&self) -> usize {
        self.surface_len
    }

    #[inline(always)]
    pub const fn mode(&self) -> SplitMode {
        self.mode
    }

    #[inline(always)]
    pub fn a_split(&self) -> &[WordId] {
        &self.a_split
    }

    #[inline(always)]
    pub fn b_split(&self) -> &[WordId] {
        &self.b_split
    }

    #[inline(always)]
    pub fn word_structure(&self) -> &[WordId] {
        &self.word_structure
    }

    #[inline(always)]
    pub fn synonym_group_ids(&self) -> &[u32] {
        &self.synonym_group_ids
    }

    #[inline(always)]
    pub fn user_data(&self) -> &str {
        &self.user_data
    }

    pub(crate) fn resolve_forms(&mut self, normalized: Option<String>, dictionary: Option<String>) {
        if let Some(s) = normalized {
            self.normalized_form = s;
        }
        if let Some(s) = dictionary {
            self.dictionary_form = s;
        }
    }

    pub(crate) const fn normalized_form_word_id(&self) -> Option<WordId> {
        self.normalized_form_word_id
    }

    /// Information of an OOV word, whose forms are all its surface.
    pub(crate) fn oov(word_id: WordId, surface: &str, param: WordParam, pos_id: u16) -> Self {
        Self {
            word_id,
            headword: surface.to_string(),
            param,
            pos_id,
            reading_form: surface.to_string(),
            normalized_form: surface.to_string(),
            normalized_form_word_id: None,
            dictionary_form: surface.to_string(),
            dictionary_form_word_id: None,
            surface_len: surface.len(),
            mode: SplitMode::A,
            a_split: vec![],
            b_split: vec![],
            word_structure: vec![],
            synonym_group_ids: vec![],
            user_data: String::new(),
        }
    }
}
