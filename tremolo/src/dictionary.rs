//! Binary dictionaries and their builders.
pub(crate) mod buffer;
pub(crate) mod builder;
pub(crate) mod connector;
pub(crate) mod description;
pub(crate) mod lexicon;
pub(crate) mod pos;
pub(crate) mod string_ptr;
pub(crate) mod strings;
pub(crate) mod word_id;

use std::path::Path;

use crate::codec::ByteReader;
use crate::common::MAX_POS_COUNT;
use crate::errors::{Result, TremoloError};

pub use buffer::DictionaryBuffer;
pub use builder::{SystemDictionaryBuilder, UserDictionaryBuilder};
pub use connector::{Connection, ConnectionMatrix, INHIBITED_CONNECTION};
pub use description::{BlockInfo, Description, DictionaryKind};
pub use lexicon::{LexMatch, Lexicon, LexiconKind, WordInfo, WordParam};
pub use pos::{Pos, PosTable, POS_DEPTH};
pub use string_ptr::StringPtr;
pub use strings::WordLayout;
pub use word_id::WordId;

use description::HEADER_SIZE;
use lexicon::LoadBounds;

pub(crate) const BLOCK_POS: &str = "pos";
pub(crate) const BLOCK_CONNECTION: &str = "connection";
pub(crate) const BLOCK_INDEX: &str = "index";
pub(crate) const BLOCK_STRINGS: &str = "strings";
pub(crate) const BLOCK_WORDS: &str = "words";

/// Inner data of [`Dictionary`].
struct DictionaryInner {
    description: Description,
    user_descriptions: Vec<Description>,
    connection: Connection,
    pos: Vec<Pos>,
    system_pos_len: usize,
    // The i-th lexicon has dictionary id i.
    lexicons: Vec<Lexicon>,
}

/// A system dictionary with user dictionaries loaded on top of it.
pub struct Dictionary(DictionaryInner);

/// Reads and checks the header of a binary dictionary.
fn read_description(buf: &DictionaryBuffer, kind: DictionaryKind) -> Result<Description> {
    if buf.len() < HEADER_SIZE {
        return Err(TremoloError::malformed_data(
            "header",
            buf.len(),
            "the buffer is shorter than a header",
        ));
    }
    let description = Description::read(&buf[..HEADER_SIZE])?;
    if description.kind != kind {
        return Err(TremoloError::malformed_data(
            "header",
            0,
            format!("expected a {kind:?} dictionary, got {:?}", description.kind),
        ));
    }
    let signature = Description::compute_signature(&buf[HEADER_SIZE..]);
    if signature != description.signature {
        return Err(TremoloError::malformed_data(
            "header",
            0,
            "the signature does not match the content",
        ));
    }
    Ok(description)
}

fn block(
    buf: &DictionaryBuffer,
    description: &Description,
    name: &'static str,
) -> Result<DictionaryBuffer> {
    let range = description.block(name, buf.len())?;
    log::debug!("loading block {name} ({} bytes)", range.len());
    buf.slice(name, range)
}

fn read_lexicon(
    buf: &DictionaryBuffer,
    description: &Description,
    kind: LexiconKind,
    dic_id: u32,
) -> Result<Lexicon> {
    let lexicon = Lexicon::new(
        kind,
        dic_id,
        block(buf, description, BLOCK_INDEX)?,
        block(buf, description, BLOCK_STRINGS)?,
        block(buf, description, BLOCK_WORDS)?,
    )?;
    if lexicon.len() != description.num_total_entries as usize {
        return Err(TremoloError::malformed_data(
            BLOCK_WORDS,
            0,
            format!(
                "{} words are stored but the header says {}",
                lexicon.len(),
                description.num_total_entries
            ),
        ));
    }
    Ok(lexicon)
}

impl Dictionary {
    /// Loads a system dictionary.
    ///
    /// All blocks are viewed in place. Every stored word is checked here, so
    /// that tokenization never reads out of bounds.
    ///
    /// # Errors
    ///
    /// [`TremoloError`] is returned when the data is not a valid system
    /// dictionary.
    pub fn load_system(buf: DictionaryBuffer) -> Result<Self> {
        let description = read_description(&buf, DictionaryKind::System)?;
        let pos = PosTable::read(&block(&buf, &description, BLOCK_POS)?)?;

        let data = block(&buf, &description, BLOCK_CONNECTION)?;
        let mut rdr = ByteReader::new(&data, BLOCK_CONNECTION);
        let left_size = usize::from(rdr.read_u16()?);
        let right_size = usize::from(rdr.read_u16()?);
        let connection = Connection::new(
            data.slice(BLOCK_CONNECTION, 4..data.len())?,
            left_size,
            right_size,
        )?;

        let lexicon = read_lexicon(&buf, &description, LexiconKind::System, 0)?;
        lexicon.validate(&LoadBounds {
            connection: &connection,
            num_system_words: lexicon.len(),
            num_pos: pos.len(),
        })?;
        log::info!(
            "loaded a system dictionary: {} words, {} POS, {left_size}x{right_size} matrix",
            lexicon.len(),
            pos.len(),
        );

        Ok(Self(DictionaryInner {
            description,
            user_descriptions: vec![],
            connection,
            system_pos_len: pos.len(),
            pos,
            lexicons: vec![lexicon],
        }))
    }

    /// Maps a system dictionary file into memory and loads it.
    ///
    /// # Errors
    ///
    /// [`TremoloError`] is returned when the file cannot be mapped or is not a
    /// valid system dictionary.
    pub fn from_path<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        Self::load_system(DictionaryBuffer::from_path(path)?)
    }

    /// Loads a user dictionary on top of the current dictionaries. It gets the
    /// next dictionary id.
    ///
    /// # Errors
    ///
    /// [`TremoloError`] is returned when the data is not a valid user
    /// dictionary, it was built on a different system dictionary, or too many
    /// dictionaries are loaded.
    pub fn load_user(mut self, buf: DictionaryBuffer) -> Result<Self> {
        let dic_id = u32::try_from(self.0.lexicons.len())?;
        if dic_id > WordId::MAX_DIC_ID {
            return Err(TremoloError::capacity_exceeded(
                "dictionaries",
                format!("at most {} user dictionaries can be loaded", WordId::MAX_DIC_ID),
            ));
        }
        let description = read_description(&buf, DictionaryKind::User)?;
        if description.reference != self.0.description.signature {
            return Err(TremoloError::malformed_data(
                "header",
                0,
                "the user dictionary was built on a different system dictionary",
            ));
        }

        let owned = PosTable::read(&block(&buf, &description, BLOCK_POS)?)?;
        let system_pos_len = self.0.system_pos_len;
        if self.0.pos.len() + owned.len() > MAX_POS_COUNT {
            return Err(TremoloError::capacity_exceeded(
                "POS table",
                format!("more than {MAX_POS_COUNT} POS tags with user dictionaries"),
            ));
        }

        let kind = LexiconKind::User {
            reference: description.reference.clone(),
        };
        let mut lexicon = read_lexicon(&buf, &description, kind, dic_id)?;
        lexicon.validate(&LoadBounds {
            connection: &self.0.connection,
            num_system_words: self.system_lexicon().len(),
            num_pos: system_pos_len + owned.len(),
        })?;
        lexicon.set_pos_shift(
            u16::try_from(system_pos_len)?,
            u16::try_from(self.0.pos.len() - system_pos_len)?,
        );
        log::info!(
            "loaded user dictionary {dic_id}: {} words, {} new POS",
            lexicon.len(),
            owned.len(),
        );

        self.0.pos.extend(owned);
        self.0.lexicons.push(lexicon);
        self.0.user_descriptions.push(description);
        Ok(self)
    }

    /// Gets the header of the system dictionary.
    #[inline(always)]
    pub const fn description(&self) -> &Description {
        &self.0.description
    }

    /// Gets the headers of the user dictionaries in load order.
    #[inline(always)]
    pub fn user_descriptions(&self) -> &[Description] {
        &self.0.user_descriptions
    }

    #[inline(always)]
    pub const fn connection(&self) -> &Connection {
        &self.0.connection
    }

    /// Gets the lexicons. The index of a lexicon is its dictionary id.
    #[inline(always)]
    pub fn lexicons(&self) -> &[Lexicon] {
        &self.0.lexicons
    }

    #[inline(always)]
    pub fn system_lexicon(&self) -> &Lexicon {
        &self.0.lexicons[0]
    }

    /// Iterates lexicons in lookup order: user lexicons in load order, then
    /// the system lexicon.
    pub(crate) fn lookup_order(&self) -> impl Iterator<Item = &Lexicon> {
        self.0.lexicons[1..]
            .iter()
            .chain(std::iter::once(self.system_lexicon()))
    }

    /// Gets the POS of `id`, including ones added by user dictionaries.
    #[inline(always)]
    pub fn pos(&self, id: u16) -> Option<&Pos> {
        self.0.pos.get(usize::from(id))
    }

    /// Finds the id of `pos`.
    pub fn pos_id(&self, pos: &Pos) -> Option<u16> {
        self.0
            .pos
            .iter()
            .position(|p| p == pos)
            .and_then(|i| u16::try_from(i).ok())
    }

    #[inline(always)]
    pub fn num_pos(&self) -> usize {
        self.0.pos.len()
    }

    /// Gets the POS defined by the system dictionary.
    #[inline(always)]
    pub fn system_pos(&self) -> &[Pos] {
        &self.0.pos[..self.0.system_pos_len]
    }

    fn lexicon_of(&self, word_id: WordId) -> Result<&Lexicon> {
        self.0
            .lexicons
            .get(word_id.dic() as usize)
            .ok_or_else(|| {
                TremoloError::invalid_argument(
                    "word_id",
                    format!("dictionary {} is not loaded", word_id.dic()),
                )
            })
    }

    fn headword(&self, word_id: WordId) -> Result<String> {
        let lexicon = self.lexicon_of(word_id)?;
        if word_id.word() as usize >= lexicon.len() {
            return Err(TremoloError::invalid_argument(
                "word_id",
                format!("word {:#x} does not exist", word_id.raw()),
            ));
        }
        Ok(lexicon.headword(word_id.word()))
    }

    /// Gets the information of a word. Forms given by references are
    /// resolved to the headwords of the referenced words.
    ///
    /// # Errors
    ///
    /// [`TremoloError`] is returned when the word does not exist.
    pub fn word_info(&self, word_id: WordId) -> Result<WordInfo> {
        let mut info = self.lexicon_of(word_id)?.word_info(word_id.word())?;
        let normalized = info
            .normalized_form_word_id()
            .map(|id| self.headword(id))
            .transpose()?;
        let dictionary = info
            .dictionary_form_word_id()
            .map(|id| self.headword(id))
            .transpose()?;
        info.resolve_forms(normalized, dictionary);
        Ok(info)
    }

    #[inline(always)]
    pub(crate) fn word_param(&self, word_id: WordId) -> WordParam {
        self.0.lexicons[word_id.dic() as usize].param(word_id.word())
    }

    #[inline(always)]
    pub(crate) fn word_surface_len(&self, word_id: WordId) -> usize {
        self.0.lexicons[word_id.dic() as usize].surface_len(word_id.word())
    }

    #[inline(always)]
    pub(crate) fn word_pos_id(&self, word_id: WordId) -> u16 {
        self.0.lexicons[word_id.dic() as usize].word_pos_id(word_id.word())
    }
}
