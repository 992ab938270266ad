use crate::oov::{CharInfo, CharProperty};

/// Input text with per-character data used while building a lattice.
#[derive(Default, Clone, Debug)]
pub struct Sentence {
    raw: String,
    chars: Vec<char>,
    // Byte offset of each character, plus the total length.
    offsets: Vec<usize>,
    infos: Vec<CharInfo>,
    // Length of the same-category run starting at each character.
    runs: Vec<usize>,
}

impl Sentence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.raw.clear();
        self.chars.clear();
        self.offsets.clear();
        self.infos.clear();
        self.runs.clear();
    }

    pub fn set_sentence<S>(&mut self, input: S)
    where
        S: AsRef<str>,
    {
        self.clear();
        self.raw.push_str(input.as_ref());
    }

    /// Computes character positions. Categories and runs are computed only
    /// when `char_prop` is given.
    pub fn compile(&mut self, char_prop: Option<&CharProperty>) {
        let (chars, offsets): (Vec<_>, Vec<_>) =
            self.raw.char_indices().map(|(b, c)| (c, b)).unzip();
        self.chars = chars;
        self.offsets = offsets;
        self.offsets.push(self.raw.len());

        let Some(char_prop) = char_prop else {
            return;
        };
        self.infos.extend(self.chars.iter().map(|&c| char_prop.char_info(c)));
        self.runs = vec![1; self.chars.len()];
        for i in (0..self.infos.len().saturating_sub(1)).rev() {
            if CharProperty::groupable(&self.infos[i], &self.infos[i + 1]) {
                self.runs[i] = self.runs[i + 1] + 1;
            }
        }
    }

    #[inline(always)]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    #[inline(always)]
    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    #[inline(always)]
    pub fn len_char(&self) -> usize {
        self.chars.len()
    }

    #[inline(always)]
    pub fn byte_position(&self, pos_char: usize) -> usize {
        self.offsets[pos_char]
    }

    /// Gets the position of the first character starting at or after `pos_byte`.
    #[inline(always)]
    pub fn char_position_ceil(&self, pos_byte: usize) -> usize {
        self.offsets
            .partition_point(|&b| b < pos_byte)
            .min(self.len_char())
    }

    #[inline(always)]
    pub fn char_info(&self, pos_char: usize) -> CharInfo {
        self.infos[pos_char]
    }

    /// Gets the number of characters from `pos_char` sharing a category with
    /// their neighbors.
    #[inline(always)]
    pub fn groupable(&self, pos_char: usize) -> usize {
        self.runs[pos_char]
    }

    /// Checks if `pos_char` continues the same-category run of the previous
    /// character. Always `false` without categories.
    #[inline(always)]
    pub fn is_inside_run(&self, pos_char: usize) -> bool {
        pos_char > 0
            && pos_char < self.runs.len()
            && self.runs[pos_char - 1] == self.runs[pos_char] + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positions() {
        let mut sent = Sentence::new();
        sent.set_sentence("自然");
        sent.compile(None);
        assert_eq!(sent.chars(), &['自', '然']);
        assert_eq!(sent.byte_position(0), 0);
        assert_eq!(sent.byte_position(1), 3);
        assert_eq!(sent.byte_position(2), 6);
        assert_eq!(sent.char_position_ceil(0), 0);
        assert_eq!(sent.char_position_ceil(1), 1);
        assert_eq!(sent.char_position_ceil(3), 1);
        assert_eq!(sent.char_position_ceil(4), 2);
        assert_eq!(sent.char_position_ceil(100), 2);
    }

    #[test]
    fn test_runs() {
        let char_def = "DEFAULT 0 1 0\nALPHA 1 1 0\n0x0061..0x007A ALPHA";
        let prop = CharProperty::from_reader(char_def.as_bytes()).unwrap();
        let mut sent = Sentence::new();
        sent.set_sentence("ab自c");
        sent.compile(Some(&prop));
        assert_eq!(sent.groupable(0), 2);
        assert_eq!(sent.groupable(1), 1);
        assert_eq!(sent.groupable(2), 1);
        assert_eq!(sent.groupable(3), 1);
        assert_eq!(sent.char_info(0).primary_category(), 1);
        assert!(!sent.is_inside_run(0));
        assert!(sent.is_inside_run(1));
        assert!(!sent.is_inside_run(2));
        assert!(!sent.is_inside_run(3));
    }

    #[test]
    fn test_reuse() {
        let mut sent = Sentence::new();
        sent.set_sentence("東京都");
        sent.compile(None);
        sent.set_sentence("a");
        sent.compile(None);
        assert_eq!(sent.len_char(), 1);
        assert_eq!(sent.byte_position(1), 1);
    }
}
