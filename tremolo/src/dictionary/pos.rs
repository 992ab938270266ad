use std::fmt;

use hashbrown::HashMap;

use crate::codec::{ByteReader, ByteWriter};
use crate::common::{MAX_POS_COMPONENT_LENGTH, MAX_POS_COUNT};
use crate::errors::{Result, TremoloError};

/// Number of components of a part of speech.
pub const POS_DEPTH: usize = 6;

/// Part of speech: a hierarchy of six component strings.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Pos(Vec<String>);

impl Pos {
    /// Creates a new POS.
    ///
    /// # Errors
    ///
    /// [`TremoloError`] is returned when the number of components is not six or
    /// a component is longer than 127 characters.
    pub fn new<I, S>(components: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let components: Vec<String> = components.into_iter().map(Into::into).collect();
        if components.len() != POS_DEPTH {
            return Err(TremoloError::invalid_argument(
                "components",
                format!("POS must have {POS_DEPTH} components, got {}", components.len()),
            ));
        }
        if let Some(c) = components
            .iter()
            .find(|c| c.chars().count() > MAX_POS_COMPONENT_LENGTH)
        {
            return Err(TremoloError::capacity_exceeded(
                "POS component",
                format!("{c} is longer than {MAX_POS_COMPONENT_LENGTH} characters"),
            ));
        }
        Ok(Self(components))
    }

    #[inline(always)]
    pub fn components(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(","))
    }
}

/// Deduplicating table from POS to ids, numbered in order of first registration.
#[derive(Default)]
pub struct PosTable {
    list: Vec<Pos>,
    ids: HashMap<Pos, u16>,
    builtin: usize,
}

impl PosTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the POS of a base dictionary. They are not written out again.
    pub fn preload(&mut self, list: &[Pos]) -> Result<()> {
        for pos in list {
            self.get_id(pos)?;
        }
        self.builtin = self.list.len();
        Ok(())
    }

    /// Gets the id of `pos`, assigning the next one if it is new.
    ///
    /// # Errors
    ///
    /// [`TremoloError`] is returned when the table is full.
    pub fn get_id(&mut self, pos: &Pos) -> Result<u16> {
        if let Some(&id) = self.ids.get(pos) {
            return Ok(id);
        }
        if self.list.len() >= MAX_POS_COUNT {
            return Err(TremoloError::capacity_exceeded(
                "POS table",
                format!("more than {MAX_POS_COUNT} POS tags"),
            ));
        }
        let id = u16::try_from(self.list.len())?;
        self.ids.insert(pos.clone(), id);
        self.list.push(pos.clone());
        Ok(id)
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.list.len()
    }

    #[inline(always)]
    pub fn get(&self, id: u16) -> Option<&Pos> {
        self.list.get(usize::from(id))
    }

    /// Gets the POS registered by this table, excluding preloaded ones.
    pub fn owned(&self) -> &[Pos] {
        &self.list[self.builtin..]
    }

    pub(crate) fn write(&self, wtr: &mut ByteWriter) -> Result<()> {
        let owned = self.owned();
        wtr.write_varint32(u32::try_from(owned.len())?);
        for pos in owned {
            for c in pos.components() {
                wtr.write_utf8_string(c)?;
            }
        }
        Ok(())
    }

    pub(crate) fn read(data: &[u8]) -> Result<Vec<Pos>> {
        let mut rdr = ByteReader::new(data, "pos");
        let len = rdr.read_varint32()? as usize;
        let mut list = Vec::with_capacity(len.min(MAX_POS_COUNT));
        for _ in 0..len {
            let start = rdr.position();
            let mut components = Vec::with_capacity(POS_DEPTH);
            for _ in 0..POS_DEPTH {
                components.push(rdr.read_utf8_string()?);
            }
            let pos = Pos::new(components)
                .map_err(|e| TremoloError::malformed_data("pos", start, e.to_string()))?;
            list.push(pos);
        }
        Ok(list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(s: &str) -> Pos {
        Pos::new(s.split(',')).unwrap()
    }

    #[test]
    fn test_get_id() {
        let mut table = PosTable::new();
        assert_eq!(table.get_id(&pos("名詞,普通名詞,一般,*,*,*")).unwrap(), 0);
        assert_eq!(table.get_id(&pos("動詞,一般,*,*,*,*")).unwrap(), 1);
        assert_eq!(table.get_id(&pos("名詞,普通名詞,一般,*,*,*")).unwrap(), 0);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(1).unwrap().to_string(), "動詞,一般,*,*,*,*");
    }

    #[test]
    fn test_determinism() {
        let input = ["a,*,*,*,*,*", "b,*,*,*,*,*", "a,*,*,*,*,*", "c,*,*,*,*,*"];
        let ids = || {
            let mut table = PosTable::new();
            input
                .iter()
                .map(|s| table.get_id(&pos(s)).unwrap())
                .collect::<Vec<_>>()
        };
        assert_eq!(ids(), vec![0, 1, 0, 2]);
        assert_eq!(ids(), ids());
    }

    #[test]
    fn test_capacity() {
        let mut table = PosTable::new();
        for i in 0..MAX_POS_COUNT {
            table.get_id(&pos(&format!("{i},*,*,*,*,*"))).unwrap();
        }
        let result = table.get_id(&pos("overflow,*,*,*,*,*"));
        assert!(matches!(result, Err(TremoloError::CapacityExceeded(_))));
    }

    #[test]
    fn test_preload_and_write() {
        let mut table = PosTable::new();
        table.preload(&[pos("名詞,*,*,*,*,*")]).unwrap();
        assert_eq!(table.get_id(&pos("名詞,*,*,*,*,*")).unwrap(), 0);
        assert_eq!(table.get_id(&pos("新語,*,*,*,*,*")).unwrap(), 1);
        let mut wtr = ByteWriter::new();
        table.write(&mut wtr).unwrap();
        let list = PosTable::read(&wtr.into_inner()).unwrap();
        assert_eq!(list, vec![pos("新語,*,*,*,*,*")]);
    }

    #[test]
    fn test_invalid_pos() {
        assert!(Pos::new(["名詞", "*"]).is_err());
        let long = "あ".repeat(128);
        assert!(Pos::new([long.as_str(), "*", "*", "*", "*", "*"]).is_err());
    }
}
