use std::io::BufRead;

use csv_core::ReadFieldResult;

use crate::errors::{Result, TremoloError};

pub trait FromU32 {
    fn from_u32(src: u32) -> Self;
}

#[cfg(any(target_pointer_width = "32", target_pointer_width = "64"))]
impl FromU32 for usize {
    #[inline(always)]
    fn from_u32(src: u32) -> Self {
        // Since the pointer width is guaranteed to be 32 or 64,
        // the following process always succeeds.
        unsafe { Self::try_from(src).unwrap_unchecked() }
    }
}

/// Reader of CSV records over a buffered input.
///
/// Quoted fields may contain newlines, so a record can span several lines.
pub struct CsvRecords<R> {
    rdr: R,
    csv: csv_core::Reader,
    field: Vec<u8>,
}

impl<R> CsvRecords<R>
where
    R: BufRead,
{
    pub fn new(rdr: R) -> Self {
        Self {
            rdr,
            csv: csv_core::Reader::new(),
            field: vec![0; 256],
        }
    }

    /// Reads the next record, skipping lines of only whitespace.
    pub fn next_record(&mut self) -> Result<Option<Vec<String>>> {
        while let Some(fields) = self.read_record()? {
            if fields.len() == 1 && fields[0].trim().is_empty() {
                continue;
            }
            return Ok(Some(fields));
        }
        Ok(None)
    }

    fn read_record(&mut self) -> Result<Option<Vec<String>>> {
        let mut fields = vec![];
        let mut len = 0;
        loop {
            let input = self.rdr.fill_buf()?;
            let (result, nin, nout) = self.csv.read_field(input, &mut self.field[len..]);
            self.rdr.consume(nin);
            len += nout;
            match result {
                ReadFieldResult::InputEmpty => {}
                ReadFieldResult::OutputFull => {
                    let new_len = self.field.len() * 2;
                    self.field.resize(new_len, 0);
                }
                ReadFieldResult::Field { record_end } => {
                    let field = std::str::from_utf8(&self.field[..len])
                        .map_err(|e| TremoloError::invalid_format("csv", e.to_string()))?;
                    fields.push(field.to_string());
                    len = 0;
                    if record_end {
                        return Ok(Some(fields));
                    }
                }
                ReadFieldResult::End => return Ok(None),
            }
        }
    }
}

/// Parses the first record of `row`. An empty row is a single empty field.
pub fn parse_csv_row(row: &str) -> Result<Vec<String>> {
    let fields = CsvRecords::new(row.as_bytes()).read_record()?;
    Ok(fields.unwrap_or_else(|| vec![String::new()]))
}

#[cfg(test)]
macro_rules! hashmap {
    ( $($k:expr => $v:expr,)* ) => {
        {
            #[allow(unused_mut)]
            let mut h = hashbrown::HashMap::new();
            $(
                h.insert($k, $v);
            )*
            h
        }
    };
    ( $($k:expr => $v:expr),* ) => {
        hashmap![$( $k => $v, )*]
    };
}

#[cfg(test)]
pub(crate) use hashmap;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_csv_row() {
        assert_eq!(
            &["名詞", "トスカーナ"],
            parse_csv_row("名詞,トスカーナ").unwrap().as_slice()
        );
    }

    #[test]
    fn test_parse_csv_row_with_quote() {
        assert_eq!(
            &["名詞", "1,2-ジクロロエタン"],
            parse_csv_row("名詞,\"1,2-ジクロロエタン\"").unwrap().as_slice()
        );
    }

    #[test]
    fn test_parse_csv_row_empty_fields() {
        assert_eq!(&["", "", ""], parse_csv_row(",,").unwrap().as_slice());
    }

    #[test]
    fn test_records_quoted_newline() {
        let data = "a,\"x\ny\"\r\n\n  \nb,c\n";
        let mut records = CsvRecords::new(data.as_bytes());
        assert_eq!(
            &["a", "x\ny"],
            records.next_record().unwrap().unwrap().as_slice()
        );
        assert_eq!(&["b", "c"], records.next_record().unwrap().unwrap().as_slice());
        assert!(records.next_record().unwrap().is_none());
    }

    #[test]
    fn test_records_long_field() {
        let long = "あ".repeat(1000);
        let data = format!("{long},\"{long}\"");
        let mut records = CsvRecords::new(data.as_bytes());
        let fields = records.next_record().unwrap().unwrap();
        assert_eq!(fields, [long.clone(), long]);
        assert!(records.next_record().unwrap().is_none());
    }
}
