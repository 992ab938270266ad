//! Provider of a routine for tokenization.
use crate::common::MAX_TOKENIZE_LENGTH;
use crate::dictionary::{WordId, WordParam};
use crate::errors::{Result, TremoloError};
use crate::sentence::Sentence;
use crate::token::{Token, TokenIter};
use crate::tokenizer::lattice::{Lattice, Node};
use crate::tokenizer::{SplitMode, Tokenizer};

/// A morpheme of the resultant path, after splitting.
#[derive(Clone, Debug)]
pub(crate) struct Morph {
    pub word_id: WordId,
    pub start_char: usize,
    pub end_char: usize,
    pub param: WordParam,
    pub total_cost: i32,
}

/// Provider of a routine for tokenization.
///
/// It holds the internal data structures used in tokenization,
/// which can be reused to avoid unnecessary memory reallocation.
pub struct Worker<'t> {
    pub(crate) tokenizer: &'t Tokenizer,
    pub(crate) sent: Sentence,
    pub(crate) lattice: Lattice,
    pub(crate) top_nodes: Vec<(usize, Node)>,
    pub(crate) morphs: Vec<Morph>,
}

impl<'t> Worker<'t> {
    /// Creates a new instance.
    pub(crate) fn new(tokenizer: &'t Tokenizer) -> Self {
        Self {
            tokenizer,
            sent: Sentence::new(),
            lattice: Lattice::default(),
            top_nodes: vec![],
            morphs: vec![],
        }
    }

    /// Resets the input sentence to be tokenized.
    ///
    /// # Errors
    ///
    /// [`TremoloError`] is returned when the input has more than
    /// [`MAX_TOKENIZE_LENGTH`] characters. The worker then holds an empty
    /// sentence.
    pub fn reset_sentence<S>(&mut self, input: S) -> Result<()>
    where
        S: AsRef<str>,
    {
        self.sent.clear();
        self.top_nodes.clear();
        self.morphs.clear();
        let input = input.as_ref();
        if input.is_empty() {
            return Ok(());
        }
        let len_char = input.chars().count();
        if len_char > MAX_TOKENIZE_LENGTH {
            return Err(TremoloError::invalid_argument(
                "input",
                format!("{len_char} characters is longer than {MAX_TOKENIZE_LENGTH}"),
            ));
        }
        self.sent.set_sentence(input);
        self.sent.compile(self.tokenizer.char_prop());
        Ok(())
    }

    /// Tokenizes the sentence set by [`Self::reset_sentence()`],
    /// overwriting the previous result.
    ///
    /// # Errors
    ///
    /// [`TremoloError`](crate::errors::TremoloError) is returned when some
    /// reachable position is covered by neither a dictionary word nor an OOV
    /// word, or when no path reaches the end of the sentence.
    pub fn tokenize(&mut self) -> Result<()> {
        self.top_nodes.clear();
        self.morphs.clear();
        self.tokenizer.build_lattice(&self.sent, &mut self.lattice)?;
        log::trace!("{:?}", self.lattice);
        self.lattice.append_top_nodes(&mut self.top_nodes);

        let mode = self.tokenizer.mode();
        for i in (0..self.top_nodes.len()).rev() {
            let (end_char, node) = &self.top_nodes[i];
            let morph = Morph {
                word_id: node.word_id(),
                start_char: node.start_char(),
                end_char: *end_char,
                param: node.param(),
                total_cost: node.min_cost(),
            };
            if mode == SplitMode::C || morph.word_id.is_oov() {
                self.morphs.push(morph);
            } else {
                self.push_splits(morph, mode)?;
            }
        }
        Ok(())
    }

    /// Pushes the sub-words of `morph`, or `morph` itself if it has none.
    ///
    /// Sub-words take their positions from the byte lengths of their
    /// surfaces, and the last one always ends where `morph` ends.
    fn push_splits(&mut self, morph: Morph, mode: SplitMode) -> Result<()> {
        let dict = self.tokenizer.dictionary();
        let info = dict.word_info(morph.word_id)?;
        let splits = match mode {
            SplitMode::A => info.a_split(),
            SplitMode::B => info.b_split(),
            SplitMode::C => &[],
        };
        if splits.len() <= 1 {
            self.morphs.push(morph);
            return Ok(());
        }

        let mut start_char = morph.start_char;
        let mut end_byte = self.sent.byte_position(morph.start_char);
        for (i, &word_id) in splits.iter().enumerate() {
            let end_char = if i + 1 == splits.len() {
                morph.end_char
            } else {
                end_byte += dict.word_surface_len(word_id);
                self.sent
                    .char_position_ceil(end_byte)
                    .clamp(start_char, morph.end_char)
            };
            self.morphs.push(Morph {
                word_id,
                start_char,
                end_char,
                param: dict.word_param(word_id),
                total_cost: morph.total_cost,
            });
            start_char = end_char;
        }
        Ok(())
    }

    /// Gets the number of resultant tokens.
    #[inline(always)]
    pub fn num_tokens(&self) -> usize {
        self.morphs.len()
    }

    /// Gets the `i`-th resultant token.
    #[inline(always)]
    pub fn token<'w>(&'w self, i: usize) -> Token<'w, 't> {
        Token::new(self, i)
    }

    /// Creates an iterator of resultant tokens.
    #[inline(always)]
    pub const fn token_iter<'w>(&'w self) -> TokenIter<'w, 't> {
        TokenIter::new(self, 0)
    }
}
