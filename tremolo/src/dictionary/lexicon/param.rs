/// Connection ids and cost of a word.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct WordParam {
    pub left_id: i16,
    pub right_id: i16,
    pub word_cost: i16,
}

impl WordParam {
    #[inline(always)]
    pub const fn new(left_id: i16, right_id: i16, word_cost: i16) -> Self {
        Self {
            left_id,
            right_id,
            word_cost,
        }
    }

    /// Words with left id `-1` are stored but never looked up by surface.
    #[inline(always)]
    pub const fn is_indexed(&self) -> bool {
        self.left_id != -1
    }
}

impl Default for WordParam {
    fn default() -> Self {
        Self::new(-1, -1, 0)
    }
}
