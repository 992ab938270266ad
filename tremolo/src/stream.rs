//! Splitting of a text stream into sentences.
use std::io::{ErrorKind, Read};

use crate::common::MAX_SENTENCE_LENGTH;
use crate::errors::{Result, TremoloError};

const PERIODS: &[char] = &['。', '？', '！', '♪', '…', '?', '!'];
const COMMAS: &[char] = &[',', '，', '、'];
const OPEN_PARENTHESES: &[char] = &[
    '(', '{', '｛', '[', '（', '「', '【', '『', '［', '≪', '〔', '“',
];
const CLOSE_PARENTHESES: &[char] = &[
    ')', '}', ']', '）', '」', '｝', '】', '』', '］', '〕', '≫', '”',
];
// Following these after `!`, `?` or a closing parenthesis, a sentence goes on.
const QUOTE_CONTINUATIONS: &[&str] = &["と", "っ", "です"];

/// Detector of sentence boundaries.
#[derive(Clone, Copy, Debug)]
pub struct SentenceDetector {
    limit: usize,
}

impl Default for SentenceDetector {
    fn default() -> Self {
        Self::new(MAX_SENTENCE_LENGTH)
    }
}

impl SentenceDetector {
    /// Creates a detector of sentences up to `limit` bytes. A zero limit is
    /// replaced with [`MAX_SENTENCE_LENGTH`].
    pub const fn new(limit: usize) -> Self {
        let limit = if limit == 0 { MAX_SENTENCE_LENGTH } else { limit };
        Self { limit }
    }

    #[inline(always)]
    pub const fn limit(&self) -> usize {
        self.limit
    }

    /// Gets the byte length of the first sentence of `input`.
    ///
    /// Without a boundary in the first `limit` bytes, the sentence ends after
    /// the last whitespace there or at the last character boundary. It
    /// always has at least one character unless `input` is empty.
    pub fn get_eos(&self, input: &str) -> usize {
        if let Some(eos) = self.find_boundary(input) {
            return eos;
        }
        if input.len() <= self.limit {
            return input.len();
        }
        let s = &input[..floor_char_boundary(input, self.limit)];
        if let Some(eos) = last_whitespace_end(s) {
            return eos;
        }
        if s.is_empty() {
            input.chars().next().map_or(0, char::len_utf8)
        } else {
            s.len()
        }
    }

    /// Finds the end of the first sentence closed by punctuation or a newline
    /// in the first `limit` bytes.
    pub fn find_boundary(&self, input: &str) -> Option<usize> {
        let s = &input[..floor_char_boundary(input, self.limit)];
        let mut level = 0usize;
        let mut chars = s.char_indices().peekable();
        while let Some((i, c)) = chars.next() {
            if c == '\n' {
                return Some(i + 1);
            }
            if OPEN_PARENTHESES.contains(&c) {
                level += 1;
                continue;
            }
            if CLOSE_PARENTHESES.contains(&c) {
                level = level.saturating_sub(1);
                continue;
            }
            if !PERIODS.contains(&c) || level != 0 {
                continue;
            }

            // A run of periods and then of marks that cannot start a sentence.
            let mut eos = i + c.len_utf8();
            let mut last = c;
            while let Some(&(j, d)) = chars.peek() {
                if !PERIODS.contains(&d)
                    && !COMMAS.contains(&d)
                    && !CLOSE_PARENTHESES.contains(&d)
                {
                    break;
                }
                eos = j + d.len_utf8();
                last = d;
                chars.next();
            }

            let continues = matches!(last, '！' | '？' | '!' | '?')
                || CLOSE_PARENTHESES.contains(&last);
            if continues
                && QUOTE_CONTINUATIONS
                    .iter()
                    .any(|q| s[eos..].starts_with(q))
            {
                continue;
            }
            return Some(eos);
        }
        None
    }
}

fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    (0..=index).rev().find(|&i| s.is_char_boundary(i)).unwrap_or(0)
}

fn last_whitespace_end(s: &str) -> Option<usize> {
    let mut found = None;
    let mut in_space = false;
    for (i, c) in s.char_indices() {
        if c.is_whitespace() {
            in_space = i != 0 || in_space;
            if in_space {
                found = Some(i + c.len_utf8());
            }
        } else {
            in_space = false;
        }
    }
    found
}

/// Reader of sentences from a byte stream of UTF-8 text.
///
/// Line terminators are removed from the sentences, and empty sentences are
/// skipped.
pub struct SentenceReader<R> {
    rdr: R,
    detector: SentenceDetector,
    pending: String,
    carry: Vec<u8>,
    chunk: Vec<u8>,
    eof: bool,
    failed: bool,
}

impl<R> SentenceReader<R>
where
    R: Read,
{
    /// Creates a new reader with the default [`SentenceDetector`].
    pub fn new(rdr: R) -> Self {
        Self::with_detector(rdr, SentenceDetector::default())
    }

    /// Creates a new reader with `detector`.
    pub fn with_detector(rdr: R, detector: SentenceDetector) -> Self {
        Self {
            rdr,
            detector,
            pending: String::new(),
            carry: vec![],
            chunk: vec![0; detector.limit()],
            eof: false,
            failed: false,
        }
    }

    /// Reads until `limit` bytes are pending or the source is exhausted.
    /// Short reads are not taken as the end of the input.
    fn fill(&mut self) -> Result<()> {
        while !self.eof && self.pending.len() < self.detector.limit() {
            let n = loop {
                match self.rdr.read(&mut self.chunk) {
                    Ok(n) => break n,
                    Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                    Err(e) => return Err(e.into()),
                }
            };
            if n == 0 {
                self.eof = true;
                if !self.carry.is_empty() {
                    return Err(TremoloError::invalid_format(
                        "input",
                        "the input ends in the middle of a UTF-8 sequence",
                    ));
                }
                break;
            }
            self.carry.extend_from_slice(&self.chunk[..n]);
            self.decode_carry()?;
        }
        Ok(())
    }

    fn decode_carry(&mut self) -> Result<()> {
        let valid_up_to = match std::str::from_utf8(&self.carry) {
            Ok(s) => {
                self.pending.push_str(s);
                self.carry.clear();
                return Ok(());
            }
            Err(e) if e.error_len().is_some() => {
                let msg = format!("invalid UTF-8 sequence: {e}");
                return Err(TremoloError::invalid_format("input", msg));
            }
            Err(e) => e.valid_up_to(),
        };
        let valid = std::str::from_utf8(&self.carry[..valid_up_to])
            .map_err(|e| TremoloError::invalid_format("input", e.to_string()))?;
        self.pending.push_str(valid);
        self.carry.drain(..valid_up_to);
        Ok(())
    }

    /// Reads the next sentence, or `None` at the end of the input.
    ///
    /// # Errors
    ///
    /// [`TremoloError`] is returned when reading fails or the input is not
    /// valid UTF-8.
    pub fn next_sentence(&mut self) -> Result<Option<String>> {
        loop {
            self.fill()?;
            if self.pending.is_empty() {
                return Ok(None);
            }
            let eos = self.detector.get_eos(&self.pending);
            let sentence: String = self.pending.drain(..eos).collect();
            let sentence = sentence.trim_end_matches(['\r', '\n']);
            if !sentence.is_empty() {
                return Ok(Some(sentence.to_string()));
            }
        }
    }
}

impl<R> Iterator for SentenceReader<R>
where
    R: Read,
{
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let result = self.next_sentence();
        self.failed = result.is_err();
        result.transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Returns at most `n` bytes per read, and fails with `Interrupted` every
    /// other call.
    struct ShortReader<'a> {
        data: &'a [u8],
        n: usize,
        interrupt: bool,
    }

    impl Read for ShortReader<'_> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.interrupt = !self.interrupt;
            if self.interrupt {
                return Err(std::io::Error::new(ErrorKind::Interrupted, "interrupted"));
            }
            let n = self.n.min(buf.len()).min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    #[test]
    fn test_get_eos() {
        let detector = SentenceDetector::default();
        assert_eq!(detector.get_eos("あいう。えお。"), 12);
        assert_eq!(detector.get_eos("あいうえお"), 15);
        assert_eq!(detector.get_eos(""), 0);
        assert_eq!(detector.get_eos("あいう。。えお。"), 15);
    }

    #[test]
    fn test_get_eos_with_limit() {
        let detector = SentenceDetector::new(15);
        assert_eq!(detector.get_eos("あい。うえお。"), 9);
        assert_eq!(detector.get_eos("あいうえおか"), 15);
        assert_eq!(detector.get_eos("あいうえお。"), 15);
        assert_eq!(detector.get_eos("あい うえおか"), 7);
        assert_eq!(detector.get_eos("あ い うえおか"), 8);
        // Never splits a character.
        assert_eq!(SentenceDetector::new(4).get_eos("あいう"), 3);
        assert_eq!(SentenceDetector::new(2).get_eos("あいう"), 3);
    }

    #[test]
    fn test_get_eos_with_parenthesis() {
        let detector = SentenceDetector::default();
        assert_eq!(detector.get_eos("あ（いう。え）お"), 24);
        assert_eq!(detector.get_eos("（あ（いう）。え）お"), 30);
        assert_eq!(detector.get_eos("あ（いう）。えお"), 18);
    }

    #[test]
    fn test_get_eos_with_prohibited_bos() {
        let detector = SentenceDetector::default();
        assert_eq!(detector.get_eos("あいう?えお"), 10);
        assert_eq!(detector.get_eos("あいう?)えお"), 11);
        assert_eq!(detector.get_eos("あいう?,えお"), 11);
    }

    #[test]
    fn test_get_eos_with_continuous_phrase() {
        let detector = SentenceDetector::default();
        assert_eq!(detector.get_eos("あいう?です。"), 19);
        assert_eq!(detector.get_eos("あいう?って。"), 19);
        assert_eq!(detector.get_eos("あいう?という。"), 22);
        assert_eq!(detector.get_eos("あいう?の?です。"), 10);
    }

    #[test]
    fn test_get_eos_newline() {
        let detector = SentenceDetector::default();
        assert_eq!(detector.get_eos("あ（い\nう。"), 10);
    }

    #[test]
    fn test_reader() {
        let text = "今日は晴れ。明日は雨？\n\nそうですか";
        let rdr = SentenceReader::new(text.as_bytes());
        let sentences: Vec<String> = rdr.map(|s| s.unwrap()).collect();
        assert_eq!(sentences, vec!["今日は晴れ。", "明日は雨？", "そうですか"]);
    }

    #[test]
    fn test_reader_short_reads() {
        let text = "今日は晴れ。明日は雨？そうですか";
        let rdr = ShortReader {
            data: text.as_bytes(),
            n: 2,
            interrupt: false,
        };
        let mut reader = SentenceReader::with_detector(rdr, SentenceDetector::new(64));
        assert_eq!(reader.next_sentence().unwrap().unwrap(), "今日は晴れ。");
        assert_eq!(reader.next_sentence().unwrap().unwrap(), "明日は雨？");
        assert_eq!(reader.next_sentence().unwrap().unwrap(), "そうですか");
        assert!(reader.next_sentence().unwrap().is_none());
    }

    #[test]
    fn test_reader_limit() {
        let text = "あいうえおかきくけこ";
        let rdr = SentenceReader::with_detector(text.as_bytes(), SentenceDetector::new(12));
        let sentences: Vec<String> = rdr.map(|s| s.unwrap()).collect();
        assert_eq!(sentences, vec!["あいうえ", "おかきく", "けこ"]);
    }

    #[test]
    fn test_reader_invalid_utf8() {
        let data = [0xe3, 0x81, 0x82, 0xff, 0x41];
        let mut rdr = SentenceReader::new(&data[..]);
        assert!(rdr.next().unwrap().is_err());
        assert!(rdr.next().is_none());
    }

    #[test]
    fn test_reader_truncated_utf8() {
        let data = [0xe3, 0x81, 0x82, 0xe3, 0x81];
        let mut rdr = SentenceReader::new(&data[..]);
        assert!(rdr.next_sentence().is_err());
    }
}
