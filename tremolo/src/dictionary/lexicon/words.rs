//! Fixed-size word records followed by a variable-size area of id lists.
//!
//! Record layout (36 bytes, little endian):
//!
//! | offset | field                                  |
//! |--------|----------------------------------------|
//! | 0      | left id (i16)                          |
//! | 2      | right id (i16)                         |
//! | 4      | cost (i16)                             |
//! | 6      | POS id (u16)                           |
//! | 8      | headword [`StringPtr`]                 |
//! | 12     | reading form [`StringPtr`]             |
//! | 16     | normalized form [`StringPtr`]          |
//! | 20     | normalized form word id, or `u32::MAX` |
//! | 24     | dictionary form word id, or `u32::MAX` |
//! | 28     | UTF-8 length of the surface            |
//! | 32     | offset of the id lists                 |
//!
//! Id lists: split mode, the counts of A, B, word-structure and synonym ids
//! (one byte each, padded to 8 bytes), the user data [`StringPtr`], and the ids.
use crate::codec::{le_i16, le_u16, le_u32, ByteReader, ByteWriter};
use crate::dictionary::lexicon::WordParam;
use crate::dictionary::{DictionaryBuffer, StringPtr, WordId};
use crate::errors::{Result, TremoloError};
use crate::tokenizer::SplitMode;

pub const RECORD_SIZE: usize = 36;
const NO_WORD: u32 = u32::MAX;

/// All fields of a stored word.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct WordRecord {
    pub param: WordParam,
    pub pos_id: u16,
    pub headword: StringPtr,
    pub reading: StringPtr,
    pub normalized: StringPtr,
    pub normalized_ref: Option<WordId>,
    pub dictionary_form_ref: Option<WordId>,
    pub surface_len: u32,
    pub mode: SplitMode,
    pub a_split: Vec<WordId>,
    pub b_split: Vec<WordId>,
    pub word_structure: Vec<WordId>,
    pub synonym_groups: Vec<u32>,
    pub user_data: StringPtr,
}

const fn encode_ref(id: Option<WordId>) -> u32 {
    match id {
        Some(id) => id.raw(),
        None => NO_WORD,
    }
}

const fn decode_ref(raw: u32) -> Option<WordId> {
    if raw == NO_WORD {
        None
    } else {
        Some(WordId::from_raw(raw))
    }
}

const fn encode_mode(mode: SplitMode) -> u8 {
    match mode {
        SplitMode::A => 0,
        SplitMode::B => 1,
        SplitMode::C => 2,
    }
}

/// Writes a words block.
pub fn write_words(records: &[WordRecord], wtr: &mut ByteWriter) -> Result<()> {
    wtr.write_u32(u32::try_from(records.len())?);
    let mut lists = ByteWriter::new();
    for r in records {
        wtr.write_i16(r.param.left_id);
        wtr.write_i16(r.param.right_id);
        wtr.write_i16(r.param.word_cost);
        wtr.write_u16(r.pos_id);
        wtr.write_u32(r.headword.encode());
        wtr.write_u32(r.reading.encode());
        wtr.write_u32(r.normalized.encode());
        wtr.write_u32(encode_ref(r.normalized_ref));
        wtr.write_u32(encode_ref(r.dictionary_form_ref));
        wtr.write_u32(r.surface_len);
        wtr.write_u32(u32::try_from(lists.len())?);

        lists.write_u8(encode_mode(r.mode));
        lists.write_u8(u8::try_from(r.a_split.len())?);
        lists.write_u8(u8::try_from(r.b_split.len())?);
        lists.write_u8(u8::try_from(r.word_structure.len())?);
        lists.write_u8(u8::try_from(r.synonym_groups.len())?);
        lists.write_bytes(&[0; 3]);
        lists.write_u32(r.user_data.encode());
        for id in r.a_split.iter().chain(&r.b_split).chain(&r.word_structure) {
            lists.write_u32(id.raw());
        }
        for &g in &r.synonym_groups {
            lists.write_u32(g);
        }
    }
    wtr.write_bytes(&lists.into_inner());
    Ok(())
}

/// Read-only view of a words block.
pub struct Words {
    data: DictionaryBuffer,
    len: usize,
}

impl Words {
    pub fn new(data: DictionaryBuffer) -> Result<Self> {
        let len = ByteReader::new(&data, "words").read_u32()? as usize;
        if len
            .checked_mul(RECORD_SIZE)
            .and_then(|n| n.checked_add(4))
            .map_or(true, |end| end > data.len())
        {
            return Err(TremoloError::malformed_data(
                "words",
                0,
                format!("{len} records do not fit in {} bytes", data.len()),
            ));
        }
        Ok(Self { data, len })
    }

    #[inline(always)]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[inline(always)]
    const fn record_offset(i: usize) -> usize {
        4 + i * RECORD_SIZE
    }

    #[inline(always)]
    pub fn param(&self, i: usize) -> WordParam {
        let o = Self::record_offset(i);
        WordParam::new(
            le_i16(&self.data, o),
            le_i16(&self.data, o + 2),
            le_i16(&self.data, o + 4),
        )
    }

    #[inline(always)]
    pub fn pos_id(&self, i: usize) -> u16 {
        le_u16(&self.data, Self::record_offset(i) + 6)
    }

    #[inline(always)]
    pub fn reading(&self, i: usize) -> StringPtr {
        StringPtr::decode(le_u32(&self.data, Self::record_offset(i) + 12))
    }

    #[inline(always)]
    pub fn headword(&self, i: usize) -> StringPtr {
        StringPtr::decode(le_u32(&self.data, Self::record_offset(i) + 8))
    }

    #[inline(always)]
    pub fn surface_len(&self, i: usize) -> usize {
        le_u32(&self.data, Self::record_offset(i) + 28) as usize
    }

    /// Decodes the whole record `i`, checking the bounds of its id lists.
    pub fn record(&self, i: usize) -> Result<WordRecord> {
        let o = Self::record_offset(i);
        let mut rdr = ByteReader::new(&self.data[o..o + RECORD_SIZE], "words");
        let left_id = rdr.read_u16()? as i16;
        let right_id = rdr.read_u16()? as i16;
        let word_cost = rdr.read_u16()? as i16;
        let pos_id = rdr.read_u16()?;
        let headword = StringPtr::decode(rdr.read_u32()?);
        let reading = StringPtr::decode(rdr.read_u32()?);
        let normalized = StringPtr::decode(rdr.read_u32()?);
        let normalized_ref = decode_ref(rdr.read_u32()?);
        let dictionary_form_ref = decode_ref(rdr.read_u32()?);
        let surface_len = rdr.read_u32()?;
        let lists_offset = rdr.read_u32()? as usize;

        let lists_start = Self::record_offset(self.len) + lists_offset;
        let lists = self.data.get(lists_start..).ok_or_else(|| {
            TremoloError::malformed_data("words", o, "id lists start past the block")
        })?;
        let mut rdr = ByteReader::new(lists, "words");
        let mode = match rdr.read_u8()? {
            0 => SplitMode::A,
            1 => SplitMode::B,
            2 => SplitMode::C,
            m => {
                return Err(TremoloError::malformed_data(
                    "words",
                    lists_start,
                    format!("invalid split mode {m}"),
                ))
            }
        };
        let num_a = usize::from(rdr.read_u8()?);
        let num_b = usize::from(rdr.read_u8()?);
        let num_ws = usize::from(rdr.read_u8()?);
        let num_syn = usize::from(rdr.read_u8()?);
        rdr.read_bytes(3)?;
        let user_data = StringPtr::decode(rdr.read_u32()?);
        let mut read_ids = |n: usize| -> Result<Vec<WordId>> {
            (0..n)
                .map(|_| Ok(WordId::from_raw(rdr.read_u32()?)))
                .collect()
        };
        let a_split = read_ids(num_a)?;
        let b_split = read_ids(num_b)?;
        let word_structure = read_ids(num_ws)?;
        let synonym_groups = (0..num_syn)
            .map(|_| rdr.read_u32())
            .collect::<Result<Vec<_>>>()?;

        Ok(WordRecord {
            param: WordParam::new(left_id, right_id, word_cost),
            pos_id,
            headword,
            reading,
            normalized,
            normalized_ref,
            dictionary_form_ref,
            surface_len,
            mode,
            a_split,
            b_split,
            word_structure,
            synonym_groups,
            user_data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_read() {
        let records = vec![
            WordRecord {
                param: WordParam::new(1, 2, -3),
                pos_id: 4,
                headword: StringPtr::new(2, 0).unwrap(),
                reading: StringPtr::new(3, 2).unwrap(),
                normalized: StringPtr::new(2, 0).unwrap(),
                surface_len: 6,
                mode: SplitMode::C,
                ..Default::default()
            },
            WordRecord {
                param: WordParam::new(-1, -1, i16::MAX),
                normalized_ref: Some(WordId::new(0, 0).unwrap()),
                dictionary_form_ref: Some(WordId::new(1, 7).unwrap()),
                mode: SplitMode::B,
                a_split: vec![WordId::new(0, 0).unwrap(), WordId::new(1, 2).unwrap()],
                word_structure: vec![WordId::new(0, 5).unwrap()],
                synonym_groups: vec![10, 20],
                user_data: StringPtr::new(1, 9).unwrap(),
                ..Default::default()
            },
        ];
        let mut wtr = ByteWriter::new();
        write_words(&records, &mut wtr).unwrap();
        let words = Words::new(DictionaryBuffer::from(wtr.into_inner())).unwrap();
        assert_eq!(words.len(), 2);
        assert_eq!(words.param(0), WordParam::new(1, 2, -3));
        assert_eq!(words.pos_id(0), 4);
        assert_eq!(words.surface_len(0), 6);
        assert!(!words.param(1).is_indexed());
        assert_eq!(words.record(0).unwrap(), records[0]);
        assert_eq!(words.record(1).unwrap(), records[1]);
    }

    #[test]
    fn test_truncated() {
        let mut wtr = ByteWriter::new();
        write_words(&[WordRecord::default()], &mut wtr).unwrap();
        let mut data = wtr.into_inner();
        data.truncate(4 + RECORD_SIZE + 4);
        let words = Words::new(DictionaryBuffer::from(data.clone())).unwrap();
        assert!(words.record(0).is_err());
        data.truncate(20);
        assert!(Words::new(DictionaryBuffer::from(data)).is_err());
    }
}
