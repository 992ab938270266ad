use std::ops::Range;
use std::time::{SystemTime, UNIX_EPOCH};

use sha2::{Digest, Sha256};

use crate::codec::{ByteReader, ByteWriter};
use crate::errors::{Result, TremoloError};

/// Magic bytes at the head of every binary dictionary.
pub const DICTIONARY_MAGIC: &[u8; 16] = b"TremoloBinaryDic";

/// Format version.
pub const DICTIONARY_VERSION: u64 = 1;

/// Size of the header region. Blocks start right after it.
pub const HEADER_SIZE: usize = 4096;

/// Alignment of blocks.
pub const BLOCK_ALIGNMENT: usize = 8;

const FLAG_USER: u64 = 1;

/// Kind of a binary dictionary.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DictionaryKind {
    /// System dictionary.
    System,
    /// User dictionary referring to a system dictionary.
    User,
}

/// Location of a named block.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BlockInfo {
    pub name: String,
    pub start: u64,
    pub size: u64,
}

/// Header of a binary dictionary.
#[derive(Clone, Debug)]
pub struct Description {
    pub kind: DictionaryKind,
    pub creation_time: u64,
    pub comment: String,
    pub signature: String,
    pub reference: String,
    pub num_indexed_entries: u32,
    pub num_total_entries: u32,
    pub blocks: Vec<BlockInfo>,
}

impl Description {
    pub fn new(kind: DictionaryKind) -> Self {
        let creation_time = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self {
            kind,
            creation_time,
            comment: String::new(),
            signature: String::new(),
            reference: String::new(),
            num_indexed_entries: 0,
            num_total_entries: 0,
            blocks: vec![],
        }
    }

    /// Computes the signature of the payload that follows the header.
    pub fn compute_signature(payload: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(payload);
        hex::encode(hasher.finalize())
    }

    /// Gets the byte range of the block `name`.
    pub fn block(&self, name: &'static str, total_len: usize) -> Result<Range<usize>> {
        let info = self
            .blocks
            .iter()
            .find(|b| b.name == name)
            .ok_or_else(|| TremoloError::malformed_data(name, 0, "block is missing"))?;
        let start = usize::try_from(info.start)?;
        let end = start
            .checked_add(usize::try_from(info.size)?)
            .filter(|&end| start >= HEADER_SIZE && end <= total_len)
            .ok_or_else(|| {
                TremoloError::malformed_data(
                    name,
                    start,
                    format!("block of {} bytes is out of the buffer", info.size),
                )
            })?;
        Ok(start..end)
    }

    /// Serializes into a header region of exactly [`HEADER_SIZE`] bytes.
    pub fn write(&self) -> Result<Vec<u8>> {
        let mut wtr = ByteWriter::new();
        wtr.write_bytes(DICTIONARY_MAGIC);
        wtr.write_u64(DICTIONARY_VERSION);
        wtr.write_u64(self.creation_time);
        wtr.write_u64(match self.kind {
            DictionaryKind::System => 0,
            DictionaryKind::User => FLAG_USER,
        });
        wtr.write_utf8_string(&self.comment)?;
        wtr.write_utf8_string(&self.signature)?;
        wtr.write_utf8_string(&self.reference)?;
        wtr.write_varint32(self.num_indexed_entries);
        wtr.write_varint32(self.num_total_entries);
        wtr.write_varint32(u32::try_from(self.blocks.len())?);
        for b in &self.blocks {
            wtr.write_utf8_string(&b.name)?;
            wtr.write_varint64(b.start);
            wtr.write_varint64(b.size);
        }
        let mut data = wtr.into_inner();
        if data.len() > HEADER_SIZE {
            return Err(TremoloError::capacity_exceeded(
                "header",
                format!("{} bytes exceeds {HEADER_SIZE}", data.len()),
            ));
        }
        data.resize(HEADER_SIZE, 0);
        Ok(data)
    }

    pub fn read(data: &[u8]) -> Result<Self> {
        let mut rdr = ByteReader::new(data, "header");
        if rdr.read_bytes(DICTIONARY_MAGIC.len())? != DICTIONARY_MAGIC {
            return Err(TremoloError::malformed_data(
                "header",
                0,
                "the magic number of the input dictionary mismatches",
            ));
        }
        let version = rdr.read_u64()?;
        if version != DICTIONARY_VERSION {
            return Err(TremoloError::malformed_data(
                "header",
                DICTIONARY_MAGIC.len(),
                format!("unsupported version {version}"),
            ));
        }
        let creation_time = rdr.read_u64()?;
        let kind = if rdr.read_u64()? & FLAG_USER != 0 {
            DictionaryKind::User
        } else {
            DictionaryKind::System
        };
        let comment = rdr.read_utf8_string()?.to_string();
        let signature = rdr.read_utf8_string()?.to_string();
        let reference = rdr.read_utf8_string()?.to_string();
        let num_indexed_entries = rdr.read_varint32()?;
        let num_total_entries = rdr.read_varint32()?;
        let num_blocks = rdr.read_varint32()?;
        let mut blocks = vec![];
        for _ in 0..num_blocks {
            blocks.push(BlockInfo {
                name: rdr.read_utf8_string()?.to_string(),
                start: rdr.read_varint64()?,
                size: rdr.read_varint64()?,
            });
        }
        if rdr.position() > HEADER_SIZE {
            return Err(TremoloError::malformed_data(
                "header",
                rdr.position(),
                "header runs past its region",
            ));
        }
        Ok(Self {
            kind,
            creation_time,
            comment,
            signature,
            reference,
            num_indexed_entries,
            num_total_entries,
            blocks,
        })
    }
}
