use crate::codec::{le_u32, ByteWriter};
use crate::dictionary::DictionaryBuffer;
use crate::errors::{Result, TremoloError};
use crate::utils::FromU32;

/// Lists of word ids sharing a surface, each prefixed by its length.
pub struct Postings {
    data: DictionaryBuffer,
}

impl Postings {
    pub fn new(data: DictionaryBuffer) -> Result<Self> {
        if data.len() % 4 != 0 {
            return Err(TremoloError::malformed_data(
                "index",
                data.len(),
                "postings are not a sequence of 32-bit ids",
            ));
        }
        Ok(Self { data })
    }

    #[inline(always)]
    fn len_u32(&self) -> usize {
        self.data.len() / 4
    }

    #[inline(always)]
    fn get(&self, i: usize) -> u32 {
        le_u32(&self.data, i * 4)
    }

    /// Gets the ids of the list starting at `i`. Out-of-range lists are empty.
    #[inline(always)]
    pub fn ids(&self, i: usize) -> impl Iterator<Item = u32> + '_ {
        let (start, end) = if i < self.len_u32() {
            let len = usize::from_u32(self.get(i));
            (i + 1, (i + 1 + len).min(self.len_u32()))
        } else {
            (0, 0)
        };
        (start..end).map(move |j| self.get(j))
    }

    /// Calls `f` with every id, failing if a list runs past the end.
    pub fn for_each_id<F>(&self, mut f: F) -> Result<()>
    where
        F: FnMut(u32) -> Result<()>,
    {
        let mut i = 0;
        while i < self.len_u32() {
            let len = usize::from_u32(self.get(i));
            if i + 1 + len > self.len_u32() {
                return Err(TremoloError::malformed_data(
                    "index",
                    i * 4,
                    "a posting list runs past the end",
                ));
            }
            for j in i + 1..i + 1 + len {
                f(self.get(j))?;
            }
            i += 1 + len;
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct PostingsBuilder {
    data: Vec<u32>,
}

impl PostingsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline(always)]
    pub fn push(&mut self, ids: &[u32]) -> Result<usize> {
        let offset = self.data.len();
        self.data.push(ids.len().try_into()?);
        self.data.extend_from_slice(ids);
        Ok(offset)
    }

    pub fn write(&self, wtr: &mut ByteWriter) {
        for &v in &self.data {
            wtr.write_u32(v);
        }
    }
}
