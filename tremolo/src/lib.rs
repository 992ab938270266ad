//! # Tremolo
//!
//! Tremolo is a dictionary-backed morphological analyzer for Japanese. It
//! compiles CSV lexicons into a compact binary dictionary and tokenizes text
//! by the minimum-cost path over a lattice of candidate words.
//!
//! ## Examples
//!
//! ```
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use tremolo::dictionary::{DictionaryBuffer, SystemDictionaryBuilder};
//! use tremolo::{Dictionary, SplitMode, Tokenizer};
//!
//! let matrix_def = "1 1\n0 0 0";
//! let lexicon_csv = "\
//! 東京,0,0,3000,東京,名詞,固有名詞,地名,一般,*,*,トウキョウ,*,*,A,*,*,*,*
//! 都,0,0,2000,都,名詞,普通名詞,一般,*,*,*,ト,*,*,A,*,*,*,*
//! 東京都,0,0,4000,東京都,名詞,固有名詞,地名,一般,*,*,トウキョウト,*,*,B,0/1,*,0/1,*";
//!
//! let data = SystemDictionaryBuilder::from_readers(matrix_def.as_bytes(), lexicon_csv.as_bytes())?
//!     .build()?;
//!
//! let dict = Dictionary::load_system(DictionaryBuffer::from(data.clone()))?;
//! let tokenizer = Tokenizer::new(dict);
//! let mut worker = tokenizer.new_worker();
//! worker.reset_sentence("東京都")?;
//! worker.tokenize()?;
//! assert_eq!(worker.num_tokens(), 1);
//!
//! let t = worker.token(0);
//! assert_eq!(t.surface(), "東京都");
//! assert_eq!(t.range_byte(), 0..9);
//! assert_eq!(t.word_info()?.reading_form(), "トウキョウト");
//!
//! // The finest units
//! let dict = Dictionary::load_system(DictionaryBuffer::from(data))?;
//! let tokenizer = Tokenizer::new(dict).split_mode(SplitMode::A);
//! let mut worker = tokenizer.new_worker();
//! worker.reset_sentence("東京都")?;
//! worker.tokenize()?;
//! let surfaces: Vec<_> = worker.token_iter().map(|t| t.surface()).collect();
//! assert_eq!(surfaces, ["東京", "都"]);
//! # Ok(())
//! # }
//! ```
#![warn(missing_docs)]

#[cfg(not(any(target_pointer_width = "32", target_pointer_width = "64")))]
compile_error!("`target_pointer_width` must be 32 or 64");

mod codec;
pub mod common;
pub mod dictionary;
pub mod errors;
pub mod oov;
mod sentence;
pub mod stream;
pub mod token;
pub mod tokenizer;
mod utils;

#[cfg(test)]
mod tests;

pub use dictionary::Dictionary;
pub use errors::{Result, TremoloError};
pub use oov::OovProviderConfig;
pub use stream::{SentenceDetector, SentenceReader};
pub use tokenizer::{SplitMode, Tokenizer};
