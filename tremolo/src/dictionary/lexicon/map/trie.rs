use crate::errors::{Result, TremoloError};

/// Double-array trie from surfaces to posting offsets.
pub struct SurfaceTrie(crawdad::Trie);

impl SurfaceTrie {
    /// Builds a trie from surfaces sorted in ascending order.
    pub fn build<K>(entries: &[(K, u32)]) -> Result<Self>
    where
        K: AsRef<str>,
    {
        crawdad::Trie::from_records(entries.iter().map(|(k, v)| (k, *v)))
            .map(Self)
            .map_err(|e| TremoloError::invalid_argument("surfaces", e.to_string()))
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.serialize_to_vec()
    }

    /// Restores a trie written by [`Self::to_bytes()`]. `data` must hold
    /// exactly one trie.
    pub fn from_bytes(data: &[u8], offset: usize) -> Result<Self> {
        let (da, rest) = crawdad::Trie::deserialize_from_slice(data);
        if !rest.is_empty() {
            return Err(TremoloError::malformed_data(
                "index",
                offset + data.len() - rest.len(),
                "trailing bytes after the trie",
            ));
        }
        Ok(Self(da))
    }

    /// Iterates `(value, length in chars)` of the surfaces that are prefixes of
    /// `input`, shortest first.
    #[inline(always)]
    pub fn prefixes<'a>(&'a self, input: &'a [char]) -> impl Iterator<Item = (u32, usize)> + 'a {
        self.0.common_prefix_search(input.iter().copied())
    }
}
