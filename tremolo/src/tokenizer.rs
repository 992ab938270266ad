//! Viterbi-based tokenizer.
pub(crate) mod lattice;
pub mod worker;

use crate::dictionary::{Dictionary, WordId};
use crate::errors::{Result, TremoloError};
use crate::oov::{CharProperty, FoundLengths, OovProvider, OovProviderConfig, OovWord};
use crate::sentence::Sentence;
use crate::tokenizer::lattice::Lattice;
use crate::tokenizer::worker::Worker;

/// Granularity of tokens.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum SplitMode {
    /// The finest units, expanding A-unit splits.
    A,
    /// Middle units, expanding B-unit splits.
    B,
    /// Words as they are in the lexicons.
    #[default]
    C,
}

/// Tokenizer.
pub struct Tokenizer {
    dict: Dictionary,
    split_mode: SplitMode,
    providers: Vec<OovProvider>,
}

impl Tokenizer {
    /// Creates a new instance without OOV providers.
    ///
    /// # Arguments
    ///
    ///  - `dict`: Dictionary to be used.
    pub const fn new(dict: Dictionary) -> Self {
        Self {
            dict,
            split_mode: SplitMode::C,
            providers: vec![],
        }
    }

    /// Sets the granularity of tokens. The default is [`SplitMode::C`].
    pub const fn split_mode(mut self, mode: SplitMode) -> Self {
        self.split_mode = mode;
        self
    }

    /// Appends an OOV provider. Providers are called in the order added.
    ///
    /// # Errors
    ///
    /// [`TremoloError`] is returned when the provider cannot be built for the
    /// dictionary, or when a second MeCab-style provider is added.
    pub fn oov_provider(mut self, config: &OovProviderConfig) -> Result<Self> {
        let provider = config.build(&self.dict)?;
        if provider.char_prop().is_some() && self.char_prop().is_some() {
            return Err(TremoloError::invalid_argument(
                "config",
                "only one MeCab-style provider can be added",
            ));
        }
        self.providers.push(provider);
        Ok(self)
    }

    /// Gets the reference to the dictionary.
    pub const fn dictionary(&self) -> &Dictionary {
        &self.dict
    }

    /// Gets the granularity of tokens.
    pub const fn mode(&self) -> SplitMode {
        self.split_mode
    }

    /// Creates a new worker.
    pub fn new_worker(&self) -> Worker<'_> {
        Worker::new(self)
    }

    pub(crate) fn char_prop(&self) -> Option<&CharProperty> {
        self.providers.iter().find_map(OovProvider::char_prop)
    }

    pub(crate) fn build_lattice(&self, sent: &Sentence, lattice: &mut Lattice) -> Result<()> {
        if self.char_prop().is_none() && self.providers.iter().any(OovProvider::needs_categories) {
            return Err(TremoloError::invalid_argument(
                "config",
                "strict regex boundaries need the character categories of a MeCab-style provider",
            ));
        }
        lattice.reset(sent.len_char());

        let mut found = FoundLengths::default();
        let mut oov_words = vec![];
        for start_char in 0..sent.len_char() {
            if !lattice.has_previous_node(start_char) {
                continue;
            }
            self.add_lattice_edges(sent, lattice, start_char, &mut found, &mut oov_words)?;
        }

        if lattice.insert_eos(self.dict.connection()) {
            Ok(())
        } else {
            Err(TremoloError::configuration_gap(sent.raw().len()))
        }
    }

    fn add_lattice_edges(
        &self,
        sent: &Sentence,
        lattice: &mut Lattice,
        start_char: usize,
        found: &mut FoundLengths,
        oov_words: &mut Vec<OovWord>,
    ) -> Result<()> {
        let connection = self.dict.connection();
        found.clear();

        let suffix = &sent.chars()[start_char..];
        for lexicon in self.dict.lookup_order() {
            for m in lexicon.common_prefix_iterator(suffix) {
                debug_assert!(start_char + m.end_char <= sent.len_char());
                lattice.insert_node(
                    start_char,
                    start_char + m.end_char,
                    m.word_id,
                    m.param,
                    connection,
                );
                found.add(m.end_char);
            }
        }

        for provider in &self.providers {
            oov_words.clear();
            provider.provide(sent, start_char, found, oov_words);
            for w in oov_words.iter() {
                debug_assert!(start_char < w.end_char && w.end_char <= sent.len_char());
                lattice.insert_node(
                    start_char,
                    w.end_char,
                    WordId::oov(w.pos_id),
                    w.param,
                    connection,
                );
                found.add(w.end_char - start_char);
            }
        }

        if found.is_empty() {
            return Err(TremoloError::configuration_gap(
                sent.byte_position(start_char),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::common::MAX_TOKENIZE_LENGTH;
    use crate::dictionary::{Pos, SystemDictionaryBuilder};
    use crate::oov::SimpleOovConfig;

    const POS: &str = "名詞,普通名詞,一般,*,*,*";

    fn lexicon_row(surface: &str, cost: i16) -> String {
        format!("{surface},0,0,{cost},{surface},{POS},{surface},*,*,C,*,*,*,*")
    }

    fn build_dict(rows: &[String]) -> Dictionary {
        let lexicon = rows.join("\n");
        SystemDictionaryBuilder::from_readers("1 1\n0 0 0".as_bytes(), lexicon.as_bytes())
            .unwrap()
            .into_dictionary()
            .unwrap()
    }

    fn simple_oov() -> OovProviderConfig {
        OovProviderConfig::Simple(SimpleOovConfig {
            pos: Pos::new(POS.split(',')).unwrap(),
            left_id: 0,
            right_id: 0,
            cost: 100,
        })
    }

    #[test]
    fn test_tokenize_1() {
        let dict = build_dict(&[
            lexicon_row("自然", 1),
            lexicon_row("言語", 4),
            lexicon_row("処理", 3),
            lexicon_row("自然言語", 6),
            lexicon_row("言語処理", 5),
        ]);
        let tokenizer = Tokenizer::new(dict);
        let mut worker = tokenizer.new_worker();
        worker.reset_sentence("自然言語処理").unwrap();
        worker.tokenize().unwrap();
        assert_eq!(worker.num_tokens(), 2);

        {
            let t = worker.token(0);
            assert_eq!(t.surface(), "自然");
            assert_eq!(t.range_char(), 0..2);
            assert_eq!(t.range_byte(), 0..6);
            assert_eq!(t.total_cost(), 1);
        }
        {
            let t = worker.token(1);
            assert_eq!(t.surface(), "言語処理");
            assert_eq!(t.range_char(), 2..6);
            assert_eq!(t.range_byte(), 6..18);
            assert_eq!(t.total_cost(), 6);
        }
    }

    #[test]
    fn test_tokenize_gap() {
        let dict = build_dict(&[lexicon_row("自然", 1)]);
        let tokenizer = Tokenizer::new(dict);
        let mut worker = tokenizer.new_worker();
        worker.reset_sentence("自然言語").unwrap();
        match worker.tokenize() {
            Err(TremoloError::ConfigurationGap(e)) => assert_eq!(e.offset, 6),
            _ => panic!("expected a configuration gap"),
        }
    }

    #[test]
    fn test_tokenize_oov() {
        let dict = build_dict(&[lexicon_row("自然", 1)]);
        let tokenizer = Tokenizer::new(dict).oov_provider(&simple_oov()).unwrap();
        let mut worker = tokenizer.new_worker();
        worker.reset_sentence("自然言語").unwrap();
        worker.tokenize().unwrap();
        assert_eq!(worker.num_tokens(), 3);
        assert!(!worker.token(0).is_oov());
        assert_eq!(worker.token(1).surface(), "言");
        assert!(worker.token(1).is_oov());
        assert_eq!(worker.token(2).surface(), "語");
        assert_eq!(worker.token(2).total_cost(), 201);
    }

    #[test]
    fn test_tokenize_empty() {
        let dict = build_dict(&[lexicon_row("自然", 1)]);
        let tokenizer = Tokenizer::new(dict);
        let mut worker = tokenizer.new_worker();
        worker.reset_sentence("").unwrap();
        worker.tokenize().unwrap();
        assert_eq!(worker.num_tokens(), 0);
    }

    #[test]
    fn test_tokenize_longest_costly() {
        let lexicon = lexicon_row("自然", 1);
        let dict = SystemDictionaryBuilder::from_readers(
            "1 1\n0 0 32766".as_bytes(),
            lexicon.as_bytes(),
        )
        .unwrap()
        .into_dictionary()
        .unwrap();
        let config = OovProviderConfig::Simple(SimpleOovConfig {
            pos: Pos::new(POS.split(',')).unwrap(),
            left_id: 0,
            right_id: 0,
            cost: 32767,
        });
        let tokenizer = Tokenizer::new(dict).oov_provider(&config).unwrap();
        let mut worker = tokenizer.new_worker();

        worker
            .reset_sentence("x".repeat(MAX_TOKENIZE_LENGTH))
            .unwrap();
        worker.tokenize().unwrap();
        assert_eq!(worker.num_tokens(), MAX_TOKENIZE_LENGTH);
        assert!(worker.token_iter().all(|t| t.total_cost() > 0));
        let last = worker.token(MAX_TOKENIZE_LENGTH - 1);
        assert_eq!(last.total_cost(), 32767 * (32767 + 32766));

        match worker.reset_sentence("x".repeat(MAX_TOKENIZE_LENGTH + 1)) {
            Err(TremoloError::InvalidArgument(e)) => assert_eq!(e.arg, "input"),
            _ => panic!("expected an invalid argument"),
        }
        assert_eq!(worker.num_tokens(), 0);
    }

    #[test]
    fn test_undefined_oov_pos() {
        let dict = build_dict(&[lexicon_row("自然", 1)]);
        let config = OovProviderConfig::Simple(SimpleOovConfig {
            pos: Pos::new(["補助記号", "一般", "*", "*", "*", "*"]).unwrap(),
            left_id: 0,
            right_id: 0,
            cost: 100,
        });
        assert!(Tokenizer::new(dict).oov_provider(&config).is_err());
    }

    #[test]
    fn test_oov_ids_out_of_matrix() {
        let dict = build_dict(&[lexicon_row("自然", 1)]);
        let config = OovProviderConfig::Simple(SimpleOovConfig {
            pos: Pos::new(POS.split(',')).unwrap(),
            left_id: 1,
            right_id: 0,
            cost: 100,
        });
        assert!(Tokenizer::new(dict).oov_provider(&config).is_err());
    }
}
