use std::io::{BufReader, Read};

use hashbrown::HashMap;

use crate::codec::ByteWriter;
use crate::dictionary::lexicon::raw::{ColumnLayout, NormalizedForm, RawEntry, WordRef};
use crate::dictionary::lexicon::words::{write_words, WordRecord};
use crate::dictionary::lexicon::{WordMapBuilder, WordParam};
use crate::dictionary::pos::{Pos, PosTable};
use crate::dictionary::{Dictionary, StringPtr, WordId, WordLayout};
use crate::errors::{Result, TremoloError};
use crate::tokenizer::SplitMode;
use crate::utils::CsvRecords;

/// Dictionary a lexicon is compiled into.
#[derive(Clone, Copy)]
pub enum Target<'a> {
    System,
    /// A user dictionary on top of the given system dictionary.
    User(&'a Dictionary),
}

impl Target<'_> {
    /// Dictionary id that stored word ids use for the dictionary being built.
    const fn own_dic(&self) -> u32 {
        match self {
            Self::System => 0,
            Self::User(_) => 1,
        }
    }
}

#[derive(Clone, Debug)]
enum Normalized {
    Surface,
    Literal(String),
    Ref(WordId),
}

/// An entry whose references are resolved.
#[derive(Clone, Debug)]
struct ArenaEntry {
    surface: String,
    param: WordParam,
    headword: String,
    pos_id: u16,
    reading: String,
    normalized: Normalized,
    dictionary_form: Option<WordId>,
    mode: SplitMode,
    a_split: Vec<WordId>,
    b_split: Vec<WordId>,
    word_structure: Vec<WordId>,
    synonym_groups: Vec<u32>,
    user_data: String,
    // 0 for entries registered from inline references
    row: usize,
}

/// Key for finding words from inline references.
type ContentKey = (String, u16, String);

/// Blocks of a compiled lexicon.
pub struct CompiledLexicon {
    pub index: Vec<u8>,
    pub strings: Vec<u8>,
    pub words: Vec<u8>,
    pub num_indexed: u32,
    pub num_total: u32,
}

/// Compiles CSV rows into lexicon blocks.
///
/// Entries are kept in an arena in which the index is the word id. A reference
/// can point only to words registered before it, or to the referencing entry
/// itself.
pub struct LexiconCompiler<'a> {
    target: Target<'a>,
    pos_table: PosTable,
    entries: Vec<ArenaEntry>,
    lookup: HashMap<ContentKey, u32>,
}

impl<'a> LexiconCompiler<'a> {
    /// Creates a compiler. For a user dictionary, `pos_table` must be preloaded
    /// with the POS of the system dictionary.
    pub fn new(target: Target<'a>, pos_table: PosTable) -> Self {
        Self {
            target,
            pos_table,
            entries: vec![],
            lookup: HashMap::new(),
        }
    }

    #[inline(always)]
    pub fn num_entries(&self) -> usize {
        self.entries.len()
    }

    #[inline(always)]
    pub const fn pos_table(&self) -> &PosTable {
        &self.pos_table
    }

    /// Reads a lexicon CSV, returning the number of rows read. The first row
    /// may be a header naming the columns. Quoted fields may span lines.
    ///
    /// # Errors
    ///
    /// [`TremoloError`] is returned when a row is malformed or a reference
    /// cannot be resolved. The message contains the row number, counting
    /// records rather than lines.
    pub fn read_lexicon<R>(&mut self, rdr: R) -> Result<usize>
    where
        R: Read,
    {
        let mut layout = ColumnLayout::default();
        let mut records = CsvRecords::new(BufReader::new(rdr));
        let mut row = 0;
        let mut num_rows = 0;
        while let Some(fields) = records.next_record()? {
            row += 1;
            if row == 1 {
                if let Some(header) = ColumnLayout::from_header(&fields)? {
                    layout = header;
                    continue;
                }
            }
            let raw = RawEntry::from_fields(&fields, &layout, row)?;
            self.add_entry(raw, row)?;
            num_rows += 1;
        }
        Ok(num_rows)
    }

    /// Registers an entry and resolves its references, returning its word index.
    pub fn add_entry(&mut self, raw: RawEntry, row: usize) -> Result<u32> {
        let index = self.next_index()?;
        let pos_id = self.pos_table.get_id(&raw.pos)?;
        let key = (raw.surface.clone(), pos_id, raw.reading.clone());
        self.lookup.entry(key).or_insert(index);
        self.entries.push(ArenaEntry {
            surface: raw.surface,
            param: raw.param,
            headword: raw.headword,
            pos_id,
            reading: raw.reading,
            normalized: Normalized::Surface,
            dictionary_form: None,
            mode: raw.mode,
            a_split: vec![],
            b_split: vec![],
            word_structure: vec![],
            synonym_groups: raw.synonym_groups,
            user_data: raw.user_data,
            row,
        });

        let normalized = match raw.normalized {
            NormalizedForm::Surface => Normalized::Surface,
            NormalizedForm::Literal(s) => Normalized::Literal(s),
            NormalizedForm::Ref(r) => Normalized::Ref(self.resolve(&r, row)?),
        };
        let dictionary_form = raw
            .dictionary_form
            .map(|r| self.resolve(&r, row))
            .transpose()?;
        let a_split = self.resolve_list(&raw.a_split, row)?;
        let b_split = self.resolve_list(&raw.b_split, row)?;
        let word_structure = self.resolve_list(&raw.word_structure, row)?;

        let e = &mut self.entries[index as usize];
        e.normalized = normalized;
        e.dictionary_form = dictionary_form;
        e.a_split = a_split;
        e.b_split = b_split;
        e.word_structure = word_structure;
        Ok(index)
    }

    fn next_index(&self) -> Result<u32> {
        let index = u32::try_from(self.entries.len())?;
        if index > WordId::MAX_WORD_ID {
            return Err(TremoloError::capacity_exceeded(
                "lexicon",
                format!("more than {} words", WordId::MAX_WORD_ID + 1),
            ));
        }
        Ok(index)
    }

    fn resolve_list(&mut self, refs: &[WordRef], row: usize) -> Result<Vec<WordId>> {
        refs.iter().map(|r| self.resolve(r, row)).collect()
    }

    fn resolve(&mut self, r: &WordRef, row: usize) -> Result<WordId> {
        match (r, self.target) {
            (WordRef::Index(n) | WordRef::User(n), Target::System) => self.own_word(*n, row),
            (WordRef::User(n), Target::User(_)) => self.own_word(*n, row),
            (WordRef::Index(n), Target::User(system)) => {
                let len = system.system_lexicon().len();
                if *n as usize >= len {
                    return Err(TremoloError::unresolved_reference(format!(
                        "row {row}: system word {n} does not exist ({len} words)"
                    )));
                }
                WordId::new(0, *n)
            }
            (
                WordRef::Inline {
                    surface,
                    pos,
                    reading,
                },
                _,
            ) => self.resolve_inline(surface, pos, reading),
        }
    }

    fn own_word(&self, n: u32, row: usize) -> Result<WordId> {
        if n as usize >= self.entries.len() {
            return Err(TremoloError::unresolved_reference(format!(
                "row {row}: word {n} is not defined yet ({} words so far)",
                self.entries.len()
            )));
        }
        WordId::new(self.target.own_dic(), n)
    }

    fn resolve_inline(&mut self, surface: &str, pos: &Pos, reading: &str) -> Result<WordId> {
        let pos_id = self.pos_table.get_id(pos)?;
        let key = (surface.to_string(), pos_id, reading.to_string());
        if let Some(&index) = self.lookup.get(&key) {
            return WordId::new(self.target.own_dic(), index);
        }
        if let Target::User(system) = self.target {
            if let Some(word) = system
                .system_lexicon()
                .find_exact(surface, pos_id, reading)
            {
                return WordId::new(0, word);
            }
        }

        // Registers an entry only reachable by reference.
        let index = self.next_index()?;
        self.lookup.insert(key, index);
        self.entries.push(ArenaEntry {
            surface: surface.to_string(),
            param: WordParam::new(-1, -1, i16::MAX),
            headword: surface.to_string(),
            pos_id,
            reading: reading.to_string(),
            normalized: Normalized::Surface,
            dictionary_form: None,
            mode: SplitMode::A,
            a_split: vec![],
            b_split: vec![],
            word_structure: vec![],
            synonym_groups: vec![],
            user_data: String::new(),
            row: 0,
        });
        WordId::new(self.target.own_dic(), index)
    }

    /// Checks the context ids of indexed entries against a `left_size x
    /// right_size` matrix. The right id is the row of the following
    /// connection, and the left id is the column of the preceding one.
    fn validate_params(&self, left_size: usize, right_size: usize) -> Result<()> {
        for e in &self.entries {
            if !e.param.is_indexed() {
                continue;
            }
            let in_range = |id: i16, size: usize| usize::try_from(id).map_or(false, |id| id < size);
            if !in_range(e.param.right_id, left_size) || !in_range(e.param.left_id, right_size) {
                return Err(TremoloError::invalid_format(
                    "lexicon",
                    format!(
                        "row {}: context ids ({}, {}) are out of the {left_size}x{right_size} matrix",
                        e.row, e.param.left_id, e.param.right_id
                    ),
                ));
            }
        }
        Ok(())
    }

    /// Compiles the entries against a `left_size x right_size` matrix.
    pub fn compile(&self, left_size: usize, right_size: usize) -> Result<CompiledLexicon> {
        self.validate_params(left_size, right_size)?;

        // Longer strings first, so that the padding they leave is back-filled.
        let mut texts: Vec<&str> = vec![];
        for e in &self.entries {
            texts.push(&e.headword);
            texts.push(&e.reading);
            texts.push(&e.surface);
            texts.push(&e.user_data);
            if let Normalized::Literal(s) = &e.normalized {
                texts.push(s);
            }
        }
        texts.sort_by_key(|s| std::cmp::Reverse(s.encode_utf16().count()));
        let mut layout = WordLayout::new();
        for s in texts {
            layout.add(s)?;
        }

        let mut map = WordMapBuilder::new();
        let mut records = Vec::with_capacity(self.entries.len());
        let mut num_indexed = 0;
        for (i, e) in self.entries.iter().enumerate() {
            let id = u32::try_from(i)?;
            if e.param.is_indexed() {
                map.add_record(e.surface.clone(), id);
                num_indexed += 1;
            }
            let (normalized, normalized_ref) = match &e.normalized {
                Normalized::Surface => (layout.add(&e.surface)?, None),
                Normalized::Literal(s) => (layout.add(s)?, None),
                Normalized::Ref(r) => (StringPtr::default(), Some(*r)),
            };
            records.push(WordRecord {
                param: e.param,
                pos_id: e.pos_id,
                headword: layout.add(&e.headword)?,
                reading: layout.add(&e.reading)?,
                normalized,
                normalized_ref,
                dictionary_form_ref: e.dictionary_form,
                surface_len: u32::try_from(e.surface.len())?,
                mode: e.mode,
                a_split: e.a_split.clone(),
                b_split: e.b_split.clone(),
                word_structure: e.word_structure.clone(),
                synonym_groups: e.synonym_groups.clone(),
                user_data: layout.add(&e.user_data)?,
            });
        }

        let mut index = ByteWriter::new();
        map.write(&mut index)?;
        let mut strings = vec![];
        layout.write(&mut strings)?;
        let mut words = ByteWriter::new();
        write_words(&records, &mut words)?;

        log::info!(
            "compiled {} words ({num_indexed} indexed), {} POS, {} string code units ({} wasted)",
            records.len(),
            self.pos_table.len(),
            layout.pointer(),
            layout.wasted_units(),
        );

        Ok(CompiledLexicon {
            index: index.into_inner(),
            strings,
            words: words.into_inner(),
            num_indexed,
            num_total: u32::try_from(records.len())?,
        })
    }
}
