use regex::Regex;

use crate::dictionary::{Dictionary, Pos, WordParam};
use crate::errors::{Result, TremoloError};
use crate::oov::{resolve_param, FoundLengths, OovWord};
use crate::sentence::Sentence;

/// Where a match may start.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum Boundaries {
    /// Only at the start of a run of characters sharing a category. The
    /// categories come from the `char.def` of the MeCab-style provider, which
    /// then must be configured.
    #[default]
    Strict,
    /// At every position.
    Relaxed,
}

/// Parameters of [`RegexOov`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RegexOovConfig {
    /// Pattern matched at the start of each position.
    pub pattern: String,
    /// Maximum length of a match in characters.
    pub max_length: usize,
    pub pos: Pos,
    pub left_id: i16,
    pub right_id: i16,
    pub cost: i16,
    pub boundaries: Boundaries,
}

impl RegexOovConfig {
    /// The default of [`RegexOovConfig::max_length`].
    pub const DEFAULT_MAX_LENGTH: usize = 32;
}

/// Provider of words matching a regular expression.
pub struct RegexOov {
    regex: Regex,
    max_length: usize,
    boundaries: Boundaries,
    param: WordParam,
    pos_id: u16,
}

impl RegexOov {
    pub(crate) fn new(config: &RegexOovConfig, dict: &Dictionary) -> Result<Self> {
        if config.max_length == 0 {
            return Err(TremoloError::invalid_argument(
                "max_length",
                "must be positive",
            ));
        }
        let regex = Regex::new(&format!("^(?:{})", config.pattern))
            .map_err(|e| TremoloError::invalid_argument("pattern", e.to_string()))?;
        let (param, pos_id) = resolve_param(
            dict,
            &config.pos,
            config.left_id,
            config.right_id,
            config.cost,
        )?;
        Ok(Self {
            regex,
            max_length: config.max_length,
            boundaries: config.boundaries,
            param,
            pos_id,
        })
    }

    #[inline(always)]
    pub(crate) const fn boundaries(&self) -> Boundaries {
        self.boundaries
    }

    pub(crate) fn provide(
        &self,
        sent: &Sentence,
        start_char: usize,
        found: &FoundLengths,
        out: &mut Vec<OovWord>,
    ) {
        if self.boundaries == Boundaries::Strict && sent.is_inside_run(start_char) {
            return;
        }
        let end_limit = sent.len_char().min(start_char + self.max_length);
        if start_char >= end_limit {
            return;
        }
        let start_byte = sent.byte_position(start_char);
        let end_byte = sent.byte_position(end_limit);
        let text = &sent.raw()[start_byte..end_byte];
        let Some(m) = self.regex.find(text) else {
            return;
        };
        if m.end() == 0 {
            return;
        }
        let end_char = sent.char_position_ceil(start_byte + m.end());
        let length = end_char - start_char;
        if found.has(length) {
            return;
        }
        out.push(OovWord {
            end_char,
            param: self.param,
            pos_id: self.pos_id,
        });
    }
}
