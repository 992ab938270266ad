use std::fs::File;
use std::ops::{Deref, Range};
use std::path::Path;
use std::sync::Arc;

use memmap2::Mmap;

use crate::errors::{Result, TremoloError};

enum Backing {
    Heap(Vec<u8>),
    Mmap(Mmap),
}

impl Deref for Backing {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Self::Heap(v) => v,
            Self::Mmap(m) => m,
        }
    }
}

/// Immutable, reference-counted bytes of a binary dictionary.
///
/// Cloning and slicing share the same backing memory, which is either a heap
/// buffer or a read-only memory map.
#[derive(Clone)]
pub struct DictionaryBuffer {
    backing: Arc<Backing>,
    range: Range<usize>,
}

impl DictionaryBuffer {
    /// Maps a dictionary file into memory.
    ///
    /// # Errors
    ///
    /// [`TremoloError`] is returned when the file cannot be opened or mapped.
    pub fn from_path<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let file = File::open(path)?;
        // The map is never written through, and dictionary files are not
        // expected to be modified while loaded.
        let mmap = unsafe { Mmap::map(&file)? };
        let len = mmap.len();
        log::debug!("mapped {len} bytes of dictionary data");
        Ok(Self {
            backing: Arc::new(Backing::Mmap(mmap)),
            range: 0..len,
        })
    }

    /// Gets a sub-buffer of `range`, relative to this buffer.
    pub(crate) fn slice(&self, block: &'static str, range: Range<usize>) -> Result<Self> {
        if range.start > range.end || range.end > self.len() {
            return Err(TremoloError::malformed_data(
                block,
                range.start,
                format!(
                    "range {}..{} exceeds the buffer of {} bytes",
                    range.start,
                    range.end,
                    self.len()
                ),
            ));
        }
        Ok(Self {
            backing: self.backing.clone(),
            range: self.range.start + range.start..self.range.start + range.end,
        })
    }
}

impl From<Vec<u8>> for DictionaryBuffer {
    fn from(data: Vec<u8>) -> Self {
        let len = data.len();
        Self {
            backing: Arc::new(Backing::Heap(data)),
            range: 0..len,
        }
    }
}

impl Deref for DictionaryBuffer {
    type Target = [u8];

    #[inline(always)]
    fn deref(&self) -> &[u8] {
        &self.backing[self.range.clone()]
    }
}
