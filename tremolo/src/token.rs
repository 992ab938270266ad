//! Container of resultant tokens.
use std::ops::Range;

use crate::dictionary::{Pos, WordId, WordInfo, WordParam};
use crate::errors::Result;
use crate::tokenizer::worker::{Morph, Worker};

/// Resultant token.
pub struct Token<'w, 't> {
    worker: &'w Worker<'t>,
    index: usize,
}

impl<'w, 't> Token<'w, 't> {
    #[inline(always)]
    pub(crate) const fn new(worker: &'w Worker<'t>, index: usize) -> Self {
        Self { worker, index }
    }

    #[inline(always)]
    fn morph(&self) -> &'w Morph {
        &self.worker.morphs[self.index]
    }

    /// Gets the position range of the token in characters.
    #[inline(always)]
    pub fn range_char(&self) -> Range<usize> {
        let m = self.morph();
        m.start_char..m.end_char
    }

    /// Gets the position range of the token in bytes.
    #[inline(always)]
    pub fn range_byte(&self) -> Range<usize> {
        let sent = &self.worker.sent;
        let m = self.morph();
        sent.byte_position(m.start_char)..sent.byte_position(m.end_char)
    }

    /// Gets the surface string of the token.
    #[inline(always)]
    pub fn surface(&self) -> &'w str {
        &self.worker.sent.raw()[self.range_byte()]
    }

    /// Gets the word id. OOV tokens have ids with [`WordId::is_oov()`].
    #[inline(always)]
    pub fn word_id(&self) -> WordId {
        self.morph().word_id
    }

    /// Checks if the token is given by an OOV provider.
    #[inline(always)]
    pub fn is_oov(&self) -> bool {
        self.word_id().is_oov()
    }

    /// Gets the index of the dictionary the token is from, or `None` for OOV
    /// tokens.
    #[inline(always)]
    pub fn dictionary_id(&self) -> Option<u32> {
        let word_id = self.word_id();
        (!word_id.is_oov()).then(|| word_id.dic())
    }

    /// Gets the POS id.
    #[inline(always)]
    pub fn pos_id(&self) -> u16 {
        let word_id = self.word_id();
        if word_id.is_oov() {
            // The word index of an OOV id holds its POS id.
            word_id.word() as u16
        } else {
            self.worker.tokenizer.dictionary().word_pos_id(word_id)
        }
    }

    /// Gets the POS.
    #[inline(always)]
    pub fn pos(&self) -> Option<&'t Pos> {
        self.worker.tokenizer.dictionary().pos(self.pos_id())
    }

    /// Gets the connection ids and the cost of the word.
    #[inline(always)]
    pub fn param(&self) -> WordParam {
        self.morph().param
    }

    /// Gets the total cost from BOS to the token's node. Tokens split from a
    /// word share its cost.
    #[inline(always)]
    pub fn total_cost(&self) -> i32 {
        self.morph().total_cost
    }

    /// Gets the information of the word, with the forms resolved.
    ///
    /// All the forms of an OOV token are its surface.
    ///
    /// # Errors
    ///
    /// [`TremoloError`](crate::errors::TremoloError) is returned when the
    /// word data cannot be read.
    pub fn word_info(&self) -> Result<WordInfo> {
        let word_id = self.word_id();
        if word_id.is_oov() {
            Ok(WordInfo::oov(
                word_id,
                self.surface(),
                self.param(),
                self.pos_id(),
            ))
        } else {
            self.worker.tokenizer.dictionary().word_info(word_id)
        }
    }
}

/// Iterator of tokens.
pub struct TokenIter<'w, 't> {
    worker: &'w Worker<'t>,
    i: usize,
}

impl<'w, 't> TokenIter<'w, 't> {
    #[inline(always)]
    pub(crate) const fn new(worker: &'w Worker<'t>, i: usize) -> Self {
        Self { worker, i }
    }
}

impl<'w, 't> Iterator for TokenIter<'w, 't> {
    type Item = Token<'w, 't>;

    #[inline(always)]
    fn next(&mut self) -> Option<Self::Item> {
        if self.i < self.worker.num_tokens() {
            let t = self.worker.token(self.i);
            self.i += 1;
            Some(t)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::dictionary::*;
    use crate::oov::{OovProviderConfig, SimpleOovConfig};
    use crate::tokenizer::*;

    const LEXICON: &str = "\
自然,0,0,1,自然,名詞,普通名詞,一般,*,*,*,シゼン,*,*,C,*,*,*,*
言語,0,0,4,言語,名詞,普通名詞,一般,*,*,*,ゲンゴ,*,*,C,*,*,*,*
処理,0,0,3,処理,名詞,普通名詞,一般,*,*,*,ショリ,*,*,C,*,*,*,*";

    fn tokenizer() -> Tokenizer {
        let dict = SystemDictionaryBuilder::from_readers("1 1\n0 0 0".as_bytes(), LEXICON.as_bytes())
            .unwrap()
            .into_dictionary()
            .unwrap();
        let pos = Pos::new(["名詞", "普通名詞", "一般", "*", "*", "*"]).unwrap();
        Tokenizer::new(dict)
            .oov_provider(&OovProviderConfig::Simple(SimpleOovConfig {
                pos,
                left_id: 0,
                right_id: 0,
                cost: 50,
            }))
            .unwrap()
    }

    #[test]
    fn test_iter() {
        let tokenizer = tokenizer();
        let mut worker = tokenizer.new_worker();
        worker.reset_sentence("自然言語処理").unwrap();
        worker.tokenize().unwrap();
        assert_eq!(worker.num_tokens(), 3);

        let mut it = worker.token_iter();
        for i in 0..worker.num_tokens() {
            let lhs = worker.token(i);
            let rhs = it.next().unwrap();
            assert_eq!(lhs.surface(), rhs.surface());
        }
        assert!(it.next().is_none());
    }

    #[test]
    fn test_morpheme_view() {
        let tokenizer = tokenizer();
        let mut worker = tokenizer.new_worker();
        worker.reset_sentence("言語学").unwrap();
        worker.tokenize().unwrap();
        assert_eq!(worker.num_tokens(), 2);

        let t = worker.token(0);
        assert_eq!(t.surface(), "言語");
        assert_eq!(t.dictionary_id(), Some(0));
        assert_eq!(t.pos_id(), 0);
        assert_eq!(
            t.pos().unwrap().components(),
            &["名詞", "普通名詞", "一般", "*", "*", "*"]
        );
        let info = t.word_info().unwrap();
        assert_eq!(info.reading_form(), "ゲンゴ");
        assert_eq!(info.normalized_form(), "言語");
        assert_eq!(info.dictionary_form(), "言語");

        let t = worker.token(1);
        assert_eq!(t.surface(), "学");
        assert!(t.is_oov());
        assert_eq!(t.dictionary_id(), None);
        assert_eq!(t.pos_id(), 0);
        assert_eq!(t.range_byte(), 6..9);
        assert_eq!(t.total_cost(), 54);
        let info = t.word_info().unwrap();
        assert_eq!(info.headword(), "学");
        assert_eq!(info.reading_form(), "学");
        assert!(info.a_split().is_empty());
    }
}
