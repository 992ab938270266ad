use std::io::Write;

use hashbrown::HashMap;

use crate::dictionary::StringPtr;
use crate::errors::{Result, TremoloError};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd)]
struct FreeSpace {
    // Field order gives the (length, start) ordering used for best-fit search.
    length: u32,
    start: u32,
}

impl FreeSpace {
    #[inline(always)]
    const fn end(&self) -> u32 {
        self.start + self.length
    }
}

/// Packs strings into a UTF-16 region so that every [`StringPtr`] is encodable.
///
/// Strings that need an aligned offset leave padding behind them. The padding is
/// kept as free space and back-filled by later, shorter strings; the best fit is
/// the smallest hole that can hold the string at a valid offset. Identical strings
/// are stored once.
#[derive(Default)]
pub struct WordLayout {
    data: Vec<u16>,
    free: Vec<FreeSpace>, // sorted
    dedup: HashMap<String, StringPtr>,
}

impl WordLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a string, returning its pointer.
    ///
    /// # Errors
    ///
    /// [`TremoloError`] is returned when the string is too long or the region
    /// exceeds the addressable offset range.
    pub fn add(&mut self, s: &str) -> Result<StringPtr> {
        if let Some(&ptr) = self.dedup.get(s) {
            return Ok(ptr);
        }
        let units: Vec<u16> = s.encode_utf16().collect();
        if units.len() > StringPtr::MAX_LENGTH {
            return Err(TremoloError::capacity_exceeded(
                "string length",
                format!("{} code units exceeds {}", units.len(), StringPtr::MAX_LENGTH),
            ));
        }
        let length = u32::try_from(units.len())?;
        let start = self.allocate(length);
        let ptr = StringPtr::new(length, start)?;
        let begin = start as usize;
        self.data[begin..begin + units.len()].copy_from_slice(&units);
        self.dedup.insert(s.to_string(), ptr);
        Ok(ptr)
    }

    fn allocate(&mut self, length: u32) -> u32 {
        let step = Self::step(length);
        let first = self.free.partition_point(|f| f.length < length);
        for i in first..self.free.len() {
            let slot = self.free[i];
            let start = Self::align_up(slot.start, step);
            if start + length <= slot.end() {
                self.free.remove(i);
                self.release(slot.start, start);
                self.release(start + length, slot.end());
                return start;
            }
        }
        let pointer = self.pointer();
        let start = Self::align_up(pointer, step);
        self.release(pointer, start);
        self.data.resize((start + length) as usize, 0);
        start
    }

    fn release(&mut self, start: u32, end: u32) {
        if start < end {
            let space = FreeSpace {
                length: end - start,
                start,
            };
            let pos = self.free.partition_point(|f| *f < space);
            self.free.insert(pos, space);
        }
    }

    #[inline(always)]
    const fn step(length: u32) -> u32 {
        let alignment = StringPtr::required_alignment(length);
        if alignment == 0 {
            1
        } else {
            1 << (alignment - 1)
        }
    }

    #[inline(always)]
    const fn align_up(value: u32, step: u32) -> u32 {
        (value + step - 1) & !(step - 1)
    }

    /// Gets the current end of the region in code units.
    #[inline(always)]
    pub fn pointer(&self) -> u32 {
        self.data.len() as u32
    }

    /// Total number of code units allocated but unused.
    pub fn wasted_units(&self) -> usize {
        self.free.iter().map(|f| f.length as usize).sum()
    }

    /// Number of free slots waiting to be back-filled.
    pub fn num_slots(&self) -> usize {
        self.free.len()
    }

    /// Writes the region as UTF-16LE, returning the number of bytes written.
    pub fn write<W>(&self, mut wtr: W) -> Result<usize>
    where
        W: Write,
    {
        let mut bytes = Vec::with_capacity(self.data.len() * 2);
        for u in &self.data {
            bytes.extend_from_slice(&u.to_le_bytes());
        }
        wtr.write_all(&bytes)?;
        Ok(bytes.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_back(layout: &WordLayout, ptr: StringPtr) -> String {
        let start = ptr.offset() as usize;
        String::from_utf16(&layout.data[start..start + ptr.length() as usize]).unwrap()
    }

    #[test]
    fn test_backfill() {
        let mut layout = WordLayout::new();
        let p1 = layout.add(&"a".repeat(25)).unwrap();
        let p2 = layout.add(&"b".repeat(23)).unwrap();
        let p3 = layout.add(&"c".repeat(15)).unwrap();
        let p4 = layout.add(&"d".repeat(4)).unwrap();
        assert_eq!(p1.offset(), 0);
        assert_eq!(p2.offset(), 28);
        assert_eq!(p3.offset(), 51);
        assert_eq!(p4.offset(), 66);
        // a..a ends at 25 and b..b is aligned to 28.
        assert_eq!(layout.num_slots(), 1);
        assert_eq!(layout.wasted_units(), 3);

        let p5 = layout.add("e").unwrap();
        let p6 = layout.add("ff").unwrap();
        assert!(p5.offset() < p2.offset());
        assert!(p6.offset() < p2.offset());
        assert_eq!(layout.num_slots(), 0);
        assert_eq!(layout.wasted_units(), 0);
        assert_eq!(layout.pointer(), 70);

        assert_eq!(read_back(&layout, p1), "a".repeat(25));
        assert_eq!(read_back(&layout, p2), "b".repeat(23));
        assert_eq!(read_back(&layout, p5), "e");
        assert_eq!(read_back(&layout, p6), "ff");
    }

    #[test]
    fn test_dedup() {
        let mut layout = WordLayout::new();
        let p1 = layout.add("東京").unwrap();
        let p2 = layout.add("京都").unwrap();
        let p3 = layout.add("東京").unwrap();
        assert_eq!(p1, p3);
        assert_ne!(p1, p2);
        assert_eq!(layout.pointer(), 4);
    }

    #[test]
    fn test_decreasing_lengths() {
        let mut layout = WordLayout::new();
        let mut ptrs = vec![];
        for len in (1..=500).rev() {
            let s: String = std::iter::repeat(char::from(b'a' + (len % 26) as u8))
                .take(len)
                .collect();
            ptrs.push((layout.add(&s).unwrap(), s));
        }
        for (ptr, s) in &ptrs {
            let decoded = StringPtr::decode(ptr.encode());
            assert_eq!(decoded, *ptr);
            assert_eq!(&read_back(&layout, decoded), s);
        }
    }

    #[test]
    fn test_write() {
        let mut layout = WordLayout::new();
        layout.add("ab").unwrap();
        let mut buf = vec![];
        assert_eq!(layout.write(&mut buf).unwrap(), 4);
        assert_eq!(buf, vec![b'a', 0, b'b', 0]);
    }

    #[test]
    fn test_too_long() {
        let mut layout = WordLayout::new();
        assert!(layout.add(&"x".repeat(StringPtr::MAX_LENGTH + 1)).is_err());
        layout.add(&"x".repeat(StringPtr::MAX_LENGTH)).unwrap();
    }
}
