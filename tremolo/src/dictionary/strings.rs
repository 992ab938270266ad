mod builder;

use crate::dictionary::{DictionaryBuffer, StringPtr};
use crate::errors::{Result, TremoloError};

pub use builder::WordLayout;

/// Read-only view of a string region of UTF-16LE code units.
#[derive(Clone)]
pub struct Strings {
    data: DictionaryBuffer,
}

impl Strings {
    pub(crate) fn new(data: DictionaryBuffer) -> Result<Self> {
        if data.len() % 2 != 0 {
            return Err(TremoloError::malformed_data(
                "strings",
                data.len(),
                "odd number of bytes in a UTF-16 region",
            ));
        }
        Ok(Self { data })
    }

    /// Number of code units in the region.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.data.len() / 2
    }

    pub(crate) fn check(&self, ptr: StringPtr) -> Result<()> {
        let end = ptr.offset() as usize + ptr.length() as usize;
        if end > self.len() {
            return Err(TremoloError::malformed_data(
                "strings",
                ptr.offset() as usize * 2,
                format!("a string of length {} runs past the region", ptr.length()),
            ));
        }
        Ok(())
    }

    /// Decodes the string at `ptr`.
    pub fn get(&self, ptr: StringPtr) -> String {
        let start = ptr.offset() as usize * 2;
        let end = start + ptr.length() as usize * 2;
        let units = self.data[start..end]
            .chunks_exact(2)
            .map(|b| u16::from_le_bytes([b[0], b[1]]));
        char::decode_utf16(units)
            .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect()
    }
}
