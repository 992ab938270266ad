mod oov;
mod tokenizer;

use crate::dictionary::{Dictionary, DictionaryBuffer, SystemDictionaryBuilder};

const LEX_CSV: &str = include_str!("./resources/lex.csv");
const MATRIX_DEF: &str = include_str!("./resources/matrix.def");

fn build_system() -> Vec<u8> {
    SystemDictionaryBuilder::from_readers(MATRIX_DEF.as_bytes(), LEX_CSV.as_bytes())
        .unwrap()
        .comment("test system dictionary")
        .build()
        .unwrap()
}

fn load_system() -> Dictionary {
    Dictionary::load_system(DictionaryBuffer::from(build_system())).unwrap()
}
