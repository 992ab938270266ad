use std::io::{prelude::*, BufReader, Read};

use crate::errors::{Result, TremoloError};

/// Connection costs parsed from a `matrix.def`-style text.
#[derive(Default)]
pub struct ConnectionMatrix {
    data: Vec<i16>,
    left_size: usize,
    right_size: usize,
}

impl ConnectionMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline(always)]
    pub const fn left_size(&self) -> usize {
        self.left_size
    }

    #[inline(always)]
    pub const fn right_size(&self) -> usize {
        self.right_size
    }

    /// Reads the header `L R` and the `left right cost` rows that follow,
    /// returning the number of rows read. A cell can be given only once.
    pub fn read_entries<R>(&mut self, rdr: R) -> Result<usize>
    where
        R: Read,
    {
        let reader = BufReader::new(rdr);
        let mut lines = reader.lines();

        let header = lines.next().transpose()?.ok_or_else(|| {
            TremoloError::invalid_format("matrix.def", "The header line is missing.")
        })?;
        let (left_size, right_size) = Self::parse_header(&header)?;
        self.left_size = left_size;
        self.right_size = right_size;
        self.data = vec![0; left_size * right_size];
        let mut given = vec![false; self.data.len()];

        let mut num_entries = 0;
        for (i, line) in lines.enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let (left, right, cost) = Self::parse_body(line, i + 2)?;
            if left_size <= left || right_size <= right {
                let msg = format!(
                    "line {}: left/right id must be within {left_size}/{right_size}, {line}",
                    i + 2
                );
                return Err(TremoloError::invalid_format("matrix.def", msg));
            }
            let cell = left * right_size + right;
            if given[cell] {
                let msg = format!("line {}: the cost of ({left}, {right}) is given twice", i + 2);
                return Err(TremoloError::invalid_format("matrix.def", msg));
            }
            given[cell] = true;
            self.data[cell] = cost;
            num_entries += 1;
        }
        log::debug!("read {num_entries} connection costs ({left_size}x{right_size})");
        Ok(num_entries)
    }

    fn parse_header(line: &str) -> Result<(usize, usize)> {
        let cols: Vec<_> = line.split_whitespace().collect();
        if cols.len() != 2 {
            let msg =
                format!("The header must consists of two integers separated by spaces, {line}");
            return Err(TremoloError::invalid_format("matrix.def", msg));
        }
        let parse = |col: &str| {
            col.parse::<i16>()
                .ok()
                .and_then(|v| usize::try_from(v).ok())
                .filter(|&v| v > 0)
                .ok_or_else(|| {
                    let msg = format!("The header has an invalid size, {line}");
                    TremoloError::invalid_format("matrix.def", msg)
                })
        };
        Ok((parse(cols[0])?, parse(cols[1])?))
    }

    fn parse_body(line: &str, line_no: usize) -> Result<(usize, usize, i16)> {
        let cols: Vec<_> = line.split_whitespace().collect();
        let parsed = (cols.len() == 3)
            .then(|| {
                Some((
                    cols[0].parse().ok()?,
                    cols[1].parse().ok()?,
                    cols[2].parse().ok()?,
                ))
            })
            .flatten();
        parsed.ok_or_else(|| {
            let msg = format!(
                "line {line_no}: a row other than the header must consists of three integers, {line}"
            );
            TremoloError::invalid_format("matrix.def", msg)
        })
    }

    /// Gets the costs as little-endian shorts in row-major `(left, right)` order.
    pub fn compiled_no_header(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.data.len() * 2);
        for c in &self.data {
            bytes.extend_from_slice(&c.to_le_bytes());
        }
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::dictionary::{Connection, DictionaryBuffer};

    #[test]
    fn test_3x3() {
        let mut cm = ConnectionMatrix::new();
        let n = cm
            .read_entries(include_str!("../../tests/resources/test.matrix").as_bytes())
            .unwrap();
        assert_eq!(n, 9);
        let conn = Connection::new(DictionaryBuffer::from(cm.compiled_no_header()), 3, 3).unwrap();
        assert_eq!(conn.cost(0, 0), 0);
        assert_eq!(conn.cost(1, 1), 4);
        assert_eq!(conn.cost(2, 1), 7);
    }

    #[test]
    fn test_2x3() {
        let data = "2 3
0 0 0
0 1 1
0 2 2
1 0 -3
1 1 -4
1 2 -5";
        let mut cm = ConnectionMatrix::new();
        assert_eq!(cm.read_entries(data.as_bytes()).unwrap(), 6);
        let conn = Connection::new(DictionaryBuffer::from(cm.compiled_no_header()), 2, 3).unwrap();
        assert_eq!(conn.cost(0, 2), 2);
        assert_eq!(conn.cost(1, 0), -3);
        assert_eq!(conn.cost(1, 2), -5);
    }

    #[test]
    fn test_invalid_header() {
        let mut cm = ConnectionMatrix::new();
        assert!(cm.read_entries("1".as_bytes()).is_err());
    }

    #[test]
    fn test_empty_header() {
        let mut cm = ConnectionMatrix::new();
        assert!(cm.read_entries("".as_bytes()).is_err());
    }

    #[test]
    fn test_bad_header() {
        for header in ["5 a", "1", "", "0 3"] {
            let mut cm = ConnectionMatrix::new();
            let result = cm.read_entries(header.as_bytes());
            assert!(matches!(result, Err(TremoloError::InvalidFormat(_))), "{header:?}");
        }
    }

    #[test]
    fn test_malformed_row() {
        let mut cm = ConnectionMatrix::new();
        assert!(cm.read_entries("2 2\n0 0".as_bytes()).is_err());
        assert!(cm.read_entries("2 2\n0 0 x".as_bytes()).is_err());
    }

    #[test]
    fn test_duplicate_cell() {
        let mut cm = ConnectionMatrix::new();
        let result = cm.read_entries("1 2\n0 0 5\n0 0 7".as_bytes());
        assert!(matches!(result, Err(TremoloError::InvalidFormat(_))));
        assert!(cm.read_entries("1 2\n0 0 5\n0 1 7".as_bytes()).is_ok());
    }

    #[test]
    fn test_out_of_range_row() {
        let mut cm = ConnectionMatrix::new();
        assert!(cm.read_entries("2 2\n2 0 1".as_bytes()).is_err());
    }
}
