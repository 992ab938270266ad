use crate::dictionary::{Dictionary, Pos, WordParam};
use crate::errors::Result;
use crate::oov::{resolve_param, FoundLengths, OovWord};
use crate::sentence::Sentence;

/// Parameters of [`SimpleOov`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SimpleOovConfig {
    pub pos: Pos,
    pub left_id: i16,
    pub right_id: i16,
    pub cost: i16,
}

/// Provider of a one-character word where nothing else starts.
pub struct SimpleOov {
    param: WordParam,
    pos_id: u16,
}

impl SimpleOov {
    pub(crate) fn new(config: &SimpleOovConfig, dict: &Dictionary) -> Result<Self> {
        let (param, pos_id) = resolve_param(
            dict,
            &config.pos,
            config.left_id,
            config.right_id,
            config.cost,
        )?;
        Ok(Self { param, pos_id })
    }

    #[inline(always)]
    pub(crate) fn provide(
        &self,
        sent: &Sentence,
        start_char: usize,
        found: &FoundLengths,
        out: &mut Vec<OovWord>,
    ) {
        if !found.is_empty() || start_char >= sent.len_char() {
            return;
        }
        out.push(OovWord {
            end_char: start_char + 1,
            param: self.param,
            pos_id: self.pos_id,
        });
    }
}
