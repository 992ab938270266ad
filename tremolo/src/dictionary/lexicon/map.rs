pub mod posting;
pub mod trie;

use std::collections::BTreeMap;

use crate::codec::{ByteReader, ByteWriter};
use crate::dictionary::DictionaryBuffer;
use crate::errors::Result;
use crate::utils::FromU32;
use posting::{Postings, PostingsBuilder};
use trie::SurfaceTrie;

/// Trie from surfaces to posting lists of word ids.
pub struct WordMap {
    // None for a lexicon without indexed words
    trie: Option<SurfaceTrie>,
    postings: Postings,
}

impl WordMap {
    /// Reads the map from an index block: the trie size as `u32`, the trie, and
    /// the postings.
    pub fn read(data: DictionaryBuffer) -> Result<Self> {
        let mut rdr = ByteReader::new(&data, "index");
        let trie_len = rdr.read_u32()? as usize;
        let trie_bytes = rdr.read_bytes(trie_len)?;
        let trie = if trie_bytes.is_empty() {
            None
        } else {
            Some(SurfaceTrie::from_bytes(trie_bytes, 4)?)
        };
        let start = rdr.position();
        let postings = Postings::new(data.slice("index", start..data.len())?)?;
        Ok(Self { trie, postings })
    }

    #[inline(always)]
    pub fn common_prefix_iterator<'a>(
        &'a self,
        input: &'a [char],
    ) -> impl Iterator<Item = (u32, usize)> + 'a {
        self.trie
            .iter()
            .flat_map(move |trie| trie.prefixes(input))
            .flat_map(move |(offset, end_char)| {
                self.postings
                    .ids(usize::from_u32(offset))
                    .map(move |word_id| (word_id, end_char))
            })
    }

    pub fn for_each_id<F>(&self, f: F) -> Result<()>
    where
        F: FnMut(u32) -> Result<()>,
    {
        self.postings.for_each_id(f)
    }
}

#[derive(Default)]
pub struct WordMapBuilder {
    map: BTreeMap<String, Vec<u32>>,
}

impl WordMapBuilder {
    #[inline(always)]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline(always)]
    pub fn add_record(&mut self, word: String, id: u32) {
        self.map.entry(word).or_default().push(id);
    }

    /// Writes an index block.
    pub fn write(self, wtr: &mut ByteWriter) -> Result<()> {
        let mut entries = vec![];
        let mut builder = PostingsBuilder::new();
        for (word, ids) in self.map {
            let offset = builder.push(&ids)?;
            entries.push((word, u32::try_from(offset)?));
        }
        let trie = if entries.is_empty() {
            None
        } else {
            Some(SurfaceTrie::build(&entries)?.to_bytes())
        };
        match trie {
            Some(bytes) => {
                wtr.write_u32(u32::try_from(bytes.len())?);
                wtr.write_bytes(&bytes);
            }
            None => wtr.write_u32(0),
        }
        builder.write(wtr);
        Ok(())
    }
}
