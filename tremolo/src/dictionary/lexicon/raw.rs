//! Rows of a lexicon CSV before reference resolution.
use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::common::{MAX_ARRAY_LENGTH, MAX_STRING_LENGTH};
use crate::dictionary::lexicon::WordParam;
use crate::dictionary::pos::{Pos, POS_DEPTH};
use crate::errors::{Result, TremoloError};
use crate::tokenizer::SplitMode;

/// Columns in the order of the legacy layout.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Column {
    Surface,
    LeftId,
    RightId,
    Cost,
    Writing,
    Pos1,
    Pos2,
    Pos3,
    Pos4,
    Pos5,
    Pos6,
    ReadingForm,
    NormalizedForm,
    DictionaryForm,
    Mode,
    SplitA,
    SplitB,
    WordStructure,
    SynonymGroups,
    UserData,
}

const COLUMNS: [Column; 20] = [
    Column::Surface,
    Column::LeftId,
    Column::RightId,
    Column::Cost,
    Column::Writing,
    Column::Pos1,
    Column::Pos2,
    Column::Pos3,
    Column::Pos4,
    Column::Pos5,
    Column::Pos6,
    Column::ReadingForm,
    Column::NormalizedForm,
    Column::DictionaryForm,
    Column::Mode,
    Column::SplitA,
    Column::SplitB,
    Column::WordStructure,
    Column::SynonymGroups,
    Column::UserData,
];

/// Minimum number of fields in a legacy row.
pub const NUM_LEGACY_FIELDS: usize = 19;

impl Column {
    const fn name(self) -> &'static str {
        match self {
            Self::Surface => "surface",
            Self::LeftId => "leftid",
            Self::RightId => "rightid",
            Self::Cost => "cost",
            Self::Writing => "writing",
            Self::Pos1 => "pos1",
            Self::Pos2 => "pos2",
            Self::Pos3 => "pos3",
            Self::Pos4 => "pos4",
            Self::Pos5 => "pos5",
            Self::Pos6 => "pos6",
            Self::ReadingForm => "readingform",
            Self::NormalizedForm => "normalizedform",
            Self::DictionaryForm => "dictionaryform",
            Self::Mode => "mode",
            Self::SplitA => "splita",
            Self::SplitB => "splitb",
            Self::WordStructure => "wordstructure",
            Self::SynonymGroups => "synonymgroups",
            Self::UserData => "userdata",
        }
    }

    const fn is_required(self) -> bool {
        !matches!(self, Self::Writing | Self::SynonymGroups | Self::UserData)
    }
}

/// Mapping from columns to field indices.
#[derive(Clone, Debug)]
pub struct ColumnLayout {
    indices: [Option<usize>; COLUMNS.len()],
    legacy: bool,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        let mut indices = [None; COLUMNS.len()];
        for (i, idx) in indices.iter_mut().enumerate() {
            *idx = Some(i);
        }
        Self {
            indices,
            legacy: true,
        }
    }
}

impl ColumnLayout {
    /// Inspects the first row. Returns a layout from its names if the row is a
    /// header, or `None` if it is already an entry.
    pub fn from_header(row: &[String]) -> Result<Option<Self>> {
        let is_entry = row
            .get(Column::LeftId as usize)
            .map_or(false, |f| f.trim().parse::<i64>().is_ok());
        if is_entry {
            return Ok(None);
        }
        let mut indices = [None; COLUMNS.len()];
        for (i, field) in row.iter().enumerate() {
            let name = field.replace('_', "").to_lowercase();
            match COLUMNS.iter().position(|c| c.name() == name) {
                Some(c) if indices[c].is_none() => indices[c] = Some(i),
                Some(_) => {
                    return Err(TremoloError::invalid_format(
                        "lexicon",
                        format!("column {field} appears twice in the header"),
                    ))
                }
                None => log::warn!("ignoring unknown lexicon column {field}"),
            }
        }
        let missing: Vec<_> = COLUMNS
            .iter()
            .filter(|c| c.is_required() && indices[**c as usize].is_none())
            .map(|c| c.name())
            .collect();
        if !missing.is_empty() {
            return Err(TremoloError::invalid_format(
                "lexicon",
                format!("required columns [{}] are missing", missing.join(", ")),
            ));
        }
        Ok(Some(Self {
            indices,
            legacy: false,
        }))
    }

    fn get<'a>(&self, fields: &'a [String], column: Column, row: usize) -> Result<&'a str> {
        match self.indices[column as usize].and_then(|i| fields.get(i)) {
            Some(f) => Ok(f),
            None if column.is_required() => Err(TremoloError::invalid_format(
                "lexicon",
                format!("row {row}: column {} is missing", column.name()),
            )),
            None => Ok(""),
        }
    }
}

/// Reference to another word, as written in the CSV.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum WordRef {
    /// Plain `n`: word `n` of the system dictionary, or of the dictionary being
    /// built when it is a system dictionary.
    Index(u32),

    /// `U<n>`: word `n` of the dictionary being built.
    User(u32),

    /// `surface,pos1,..,pos6,reading`: a word found by its content, registered
    /// on the fly if it does not exist.
    Inline {
        surface: String,
        pos: Pos,
        reading: String,
    },
}

/// Normalized form of a raw entry.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum NormalizedForm {
    Surface,
    Literal(String),
    Ref(WordRef),
}

/// A lexicon row with its fields checked but references unresolved.
#[derive(Clone, Debug)]
pub struct RawEntry {
    pub surface: String,
    pub param: WordParam,
    pub headword: String,
    pub pos: Pos,
    pub reading: String,
    pub normalized: NormalizedForm,
    pub dictionary_form: Option<WordRef>,
    pub mode: SplitMode,
    pub a_split: Vec<WordRef>,
    pub b_split: Vec<WordRef>,
    pub word_structure: Vec<WordRef>,
    pub synonym_groups: Vec<u32>,
    pub user_data: String,
}

fn escape_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\\u(?:([0-9a-fA-F]{4})|\{([0-9a-fA-F]{1,6})\})").unwrap())
}

/// Decodes `\uXXXX` and `\u{X..}` escapes. Escaped surrogate pairs are combined.
pub fn unescape(text: &str) -> Result<String> {
    if !text.contains("\\u") {
        return Ok(text.to_string());
    }
    let mut units: Vec<u16> = Vec::with_capacity(text.len());
    let mut last = 0;
    for caps in escape_regex().captures_iter(text) {
        let Some(m) = caps.get(0) else { continue };
        units.extend(text[last..m.start()].encode_utf16());
        let code = parse_escape(&caps)?;
        if let Ok(unit) = u16::try_from(code) {
            units.push(unit);
        } else {
            let c = char::from_u32(code).ok_or_else(|| {
                TremoloError::invalid_format("lexicon", format!("invalid codepoint {code:#x}"))
            })?;
            let mut buf = [0; 2];
            units.extend_from_slice(c.encode_utf16(&mut buf));
        }
        last = m.end();
    }
    units.extend(text[last..].encode_utf16());
    String::from_utf16(&units).map_err(|_| {
        TremoloError::invalid_format("lexicon", format!("unpaired surrogate in {text}"))
    })
}

fn parse_escape(caps: &Captures) -> Result<u32> {
    let hex = caps
        .get(1)
        .or_else(|| caps.get(2))
        .map_or("", |m| m.as_str());
    Ok(u32::from_str_radix(hex, 16)?)
}

/// `n` or `U<n>`.
fn is_numeric_ref(text: &str) -> bool {
    let digits = text.strip_prefix('U').unwrap_or(text);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

fn is_empty_field(field: &str) -> bool {
    field.is_empty() || field == "*"
}

fn check_length(value: &str, name: &str, row: usize) -> Result<()> {
    let len = value.encode_utf16().count();
    if len > MAX_STRING_LENGTH {
        return Err(TremoloError::capacity_exceeded(
            "string length",
            format!("row {row}: {name} has {len} code units, more than {MAX_STRING_LENGTH}"),
        ));
    }
    Ok(())
}

impl WordRef {
    /// Parses a reference, returning `None` for `*` or an empty field.
    pub fn parse(text: &str, row: usize) -> Result<Option<Self>> {
        if is_empty_field(text) {
            return Ok(None);
        }
        if let Some(r) = Self::parse_numeric(text)? {
            return Ok(Some(r));
        }
        let fields: Vec<&str> = text.split(',').collect();
        if fields.len() != POS_DEPTH + 2 {
            return Err(TremoloError::invalid_format(
                "lexicon",
                format!("row {row}: invalid word reference {text}"),
            ));
        }
        let surface = unescape(fields[0])?;
        let pos = Pos::new(
            fields[1..=POS_DEPTH]
                .iter()
                .map(|f| unescape(f))
                .collect::<Result<Vec<_>>>()?,
        )?;
        let reading = unescape(fields[POS_DEPTH + 1])?;
        Ok(Some(Self::Inline {
            surface,
            pos,
            reading,
        }))
    }

    fn parse_numeric(text: &str) -> Result<Option<Self>> {
        if !is_numeric_ref(text) {
            return Ok(None);
        }
        Ok(Some(match text.strip_prefix('U') {
            Some(n) => Self::User(n.parse()?),
            None => Self::Index(text.parse()?),
        }))
    }

    /// Parses a `/`-separated list.
    pub fn parse_list(text: &str, row: usize) -> Result<Vec<Self>> {
        if is_empty_field(text) {
            return Ok(vec![]);
        }
        let items: Vec<&str> = text.split('/').collect();
        if items.len() > MAX_ARRAY_LENGTH {
            return Err(TremoloError::capacity_exceeded(
                "split list",
                format!("row {row}: {} items, more than {MAX_ARRAY_LENGTH}", items.len()),
            ));
        }
        let mut refs = Vec::with_capacity(items.len());
        for item in items {
            let r = Self::parse(item, row)?.ok_or_else(|| {
                TremoloError::invalid_format(
                    "lexicon",
                    format!("row {row}: empty item in the list {text}"),
                )
            })?;
            refs.push(r);
        }
        Ok(refs)
    }
}

impl RawEntry {
    /// Converts the fields of a CSV row. `row` is the 1-origin line number used
    /// in error messages.
    pub fn from_fields(fields: &[String], layout: &ColumnLayout, row: usize) -> Result<Self> {
        if layout.legacy && fields.len() < NUM_LEGACY_FIELDS {
            return Err(TremoloError::invalid_format(
                "lexicon",
                format!(
                    "row {row}: a lexicon row must have at least {NUM_LEGACY_FIELDS} fields, got {}",
                    fields.len()
                ),
            ));
        }
        let get = |c| layout.get(fields, c, row);
        let parse_i16 = |c: Column| -> Result<i16> {
            let f = get(c)?;
            f.trim().parse().map_err(|_| {
                TremoloError::invalid_format(
                    "lexicon",
                    format!("row {row}: {} must be a 16-bit integer, got {f}", c.name()),
                )
            })
        };

        let surface = unescape(get(Column::Surface)?)?;
        if surface.is_empty() {
            return Err(TremoloError::invalid_format(
                "lexicon",
                format!("row {row}: the surface is empty"),
            ));
        }
        let param = WordParam::new(
            parse_i16(Column::LeftId)?,
            parse_i16(Column::RightId)?,
            parse_i16(Column::Cost)?,
        );

        let writing = unescape(get(Column::Writing)?)?;
        let headword = if is_empty_field(&writing) {
            surface.clone()
        } else {
            writing
        };
        let pos = Pos::new(
            [
                Column::Pos1,
                Column::Pos2,
                Column::Pos3,
                Column::Pos4,
                Column::Pos5,
                Column::Pos6,
            ]
            .into_iter()
            .map(|c| unescape(get(c)?))
            .collect::<Result<Vec<_>>>()?,
        )?;
        let reading = unescape(get(Column::ReadingForm)?)?;
        let reading = if reading.is_empty() {
            surface.clone()
        } else {
            reading
        };

        let normalized_field = get(Column::NormalizedForm)?;
        let normalized = if is_empty_field(normalized_field) {
            NormalizedForm::Surface
        } else if is_numeric_ref(normalized_field)
            || normalized_field.split(',').count() == POS_DEPTH + 2
        {
            WordRef::parse(normalized_field, row)?.map_or(NormalizedForm::Surface, NormalizedForm::Ref)
        } else {
            NormalizedForm::Literal(unescape(normalized_field)?)
        };
        let dictionary_form = WordRef::parse(get(Column::DictionaryForm)?, row)?;

        let mode_field = get(Column::Mode)?;
        let mode = match mode_field.trim() {
            "A" | "a" => SplitMode::A,
            "B" | "b" => SplitMode::B,
            "C" | "c" | "*" | "" => SplitMode::C,
            m => {
                return Err(TremoloError::invalid_format(
                    "lexicon",
                    format!("row {row}: invalid split mode {m}"),
                ))
            }
        };
        let a_split = WordRef::parse_list(get(Column::SplitA)?, row)?;
        let b_split = WordRef::parse_list(get(Column::SplitB)?, row)?;
        if mode == SplitMode::A && !(a_split.is_empty() && b_split.is_empty()) {
            return Err(TremoloError::invalid_format(
                "lexicon",
                format!("row {row}: a mode A word cannot have A or B splits"),
            ));
        }
        let word_structure = WordRef::parse_list(get(Column::WordStructure)?, row)?;

        let synonym_field = get(Column::SynonymGroups)?;
        let synonym_groups = if is_empty_field(synonym_field) {
            vec![]
        } else {
            synonym_field
                .split('/')
                .map(|g| {
                    g.trim().parse().map_err(|_| {
                        TremoloError::invalid_format(
                            "lexicon",
                            format!("row {row}: invalid synonym group id {g}"),
                        )
                    })
                })
                .collect::<Result<Vec<u32>>>()?
        };
        if synonym_groups.len() > MAX_ARRAY_LENGTH {
            return Err(TremoloError::capacity_exceeded(
                "synonym groups",
                format!(
                    "row {row}: {} groups, more than {MAX_ARRAY_LENGTH}",
                    synonym_groups.len()
                ),
            ));
        }
        let user_data = unescape(get(Column::UserData)?)?;

        check_length(&surface, "surface", row)?;
        check_length(&headword, "writing", row)?;
        check_length(&reading, "reading form", row)?;
        if let NormalizedForm::Literal(s) = &normalized {
            check_length(s, "normalized form", row)?;
        }
        check_length(&user_data, "user data", row)?;

        Ok(Self {
            surface,
            param,
            headword,
            pos,
            reading,
            normalized,
            dictionary_form,
            mode,
            a_split,
            b_split,
            word_structure,
            synonym_groups,
            user_data,
        })
    }
}
