mod builder;

use crate::codec::le_i16;
use crate::dictionary::DictionaryBuffer;
use crate::errors::{Result, TremoloError};

pub use builder::ConnectionMatrix;

/// Connection cost that forbids an edge.
pub const INHIBITED_CONNECTION: i16 = i16::MAX;

/// Read-only view of the connection cost matrix.
///
/// The first index is the right context id of the preceding word, and the
/// second is the left context id of the following word.
#[derive(Clone)]
pub struct Connection {
    data: DictionaryBuffer,
    left_size: usize,
    right_size: usize,
}

impl Connection {
    pub fn new(data: DictionaryBuffer, left_size: usize, right_size: usize) -> Result<Self> {
        // BOS and EOS use context id 0.
        if left_size == 0 || right_size == 0 {
            return Err(TremoloError::malformed_data(
                "connection",
                0,
                "the matrix must not be empty",
            ));
        }
        if data.len() != left_size * right_size * 2 {
            return Err(TremoloError::malformed_data(
                "connection",
                0,
                format!(
                    "{} bytes cannot hold a {left_size}x{right_size} matrix",
                    data.len()
                ),
            ));
        }
        Ok(Self {
            data,
            left_size,
            right_size,
        })
    }

    #[inline(always)]
    pub const fn left_size(&self) -> usize {
        self.left_size
    }

    #[inline(always)]
    pub const fn right_size(&self) -> usize {
        self.right_size
    }

    #[inline(always)]
    pub fn cost(&self, left: usize, right: usize) -> i16 {
        debug_assert!(left < self.left_size);
        debug_assert!(right < self.right_size);
        le_i16(&self.data, (left * self.right_size + right) * 2)
    }
}
