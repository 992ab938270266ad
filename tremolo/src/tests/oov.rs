use crate::dictionary::Pos;
use crate::errors::TremoloError;
use crate::oov::{Boundaries, MecabOovConfig, OovProviderConfig, RegexOovConfig, SimpleOovConfig};
use crate::tests::load_system;
use crate::tokenizer::Tokenizer;

const CHAR_DEF: &str = include_str!("./resources/char.def");
const UNK_DEF: &str = include_str!("./resources/unk.def");

fn noun() -> Pos {
    Pos::new(["名詞", "普通名詞", "一般", "*", "*", "*"]).unwrap()
}

fn simple() -> OovProviderConfig {
    OovProviderConfig::Simple(SimpleOovConfig {
        pos: noun(),
        left_id: 1,
        right_id: 1,
        cost: 10000,
    })
}

fn mecab() -> OovProviderConfig {
    OovProviderConfig::Mecab(MecabOovConfig {
        char_def: CHAR_DEF.to_string(),
        unk_def: UNK_DEF.to_string(),
        max_grouping_len: None,
    })
}

fn tokens(tokenizer: &Tokenizer, input: &str) -> Vec<(String, bool)> {
    let mut worker = tokenizer.new_worker();
    worker.reset_sentence(input).unwrap();
    worker.tokenize().unwrap();
    worker
        .token_iter()
        .map(|t| (t.surface().to_string(), t.is_oov()))
        .collect()
}

fn assert_coverage(tokenizer: &Tokenizer, input: &str) {
    let mut worker = tokenizer.new_worker();
    worker.reset_sentence(input).unwrap();
    worker.tokenize().unwrap();
    let mut end = 0;
    for t in worker.token_iter() {
        assert_eq!(t.range_byte().start, end);
        end = t.range_byte().end;
    }
    assert_eq!(end, input.len());
}

#[test]
fn test_simple_coverage() {
    let tokenizer = Tokenizer::new(load_system()).oov_provider(&simple()).unwrap();
    for input in ["ABC", "東京タワーに行った", "😀東京", "a b\tc"] {
        assert_coverage(&tokenizer, input);
    }
    assert_eq!(
        tokens(&tokenizer, "東京タワー"),
        [
            ("東京".to_string(), false),
            ("タ".to_string(), true),
            ("ワ".to_string(), true),
            ("ー".to_string(), true),
        ]
    );
}

#[test]
fn test_simple_word_info() {
    let tokenizer = Tokenizer::new(load_system()).oov_provider(&simple()).unwrap();
    let mut worker = tokenizer.new_worker();
    worker.reset_sentence("タ").unwrap();
    worker.tokenize().unwrap();
    let t = worker.token(0);
    assert_eq!(t.pos(), Some(&noun()));
    let info = t.word_info().unwrap();
    assert_eq!(info.headword(), "タ");
    assert_eq!(info.dictionary_form(), "タ");
    assert_eq!(info.param().word_cost, 10000);
    assert_eq!(info.surface_len(), 3);
}

#[test]
fn test_regex() {
    let config = OovProviderConfig::Regex(RegexOovConfig {
        pattern: "[0-9A-Za-z]+".to_string(),
        max_length: RegexOovConfig::DEFAULT_MAX_LENGTH,
        pos: noun(),
        left_id: 1,
        right_id: 1,
        cost: 1000,
        boundaries: Boundaries::Relaxed,
    });
    let tokenizer = Tokenizer::new(load_system())
        .oov_provider(&config)
        .unwrap()
        .oov_provider(&simple())
        .unwrap();
    assert_eq!(
        tokens(&tokenizer, "ABC123に"),
        [("ABC123".to_string(), true), ("に".to_string(), false)]
    );
    assert_coverage(&tokenizer, "x東京y");
}

#[test]
fn test_regex_max_length() {
    let config = OovProviderConfig::Regex(RegexOovConfig {
        pattern: "[a-z]+".to_string(),
        max_length: 2,
        pos: noun(),
        left_id: 1,
        right_id: 1,
        cost: 1000,
        boundaries: Boundaries::Relaxed,
    });
    let tokenizer = Tokenizer::new(load_system()).oov_provider(&config).unwrap();
    let surfaces: Vec<_> = tokens(&tokenizer, "abcde").into_iter().map(|t| t.0).collect();
    assert_eq!(surfaces, ["ab", "cd", "e"]);
}

#[test]
fn test_regex_strict() {
    let config = OovProviderConfig::Regex(RegexOovConfig {
        pattern: "[0-9A-Za-z]+".to_string(),
        max_length: RegexOovConfig::DEFAULT_MAX_LENGTH,
        pos: noun(),
        left_id: 1,
        right_id: 1,
        cost: 1000,
        boundaries: Boundaries::Strict,
    });
    let tokenizer = Tokenizer::new(load_system())
        .oov_provider(&config)
        .unwrap()
        .oov_provider(&mecab())
        .unwrap();
    assert_eq!(
        tokens(&tokenizer, "ABC123に"),
        [("ABC123".to_string(), true), ("に".to_string(), false)]
    );
    assert_coverage(&tokenizer, "x東京y 12");
}

#[test]
fn test_regex_strict_without_categories() {
    let config = OovProviderConfig::Regex(RegexOovConfig {
        pattern: "[a-z]+".to_string(),
        max_length: RegexOovConfig::DEFAULT_MAX_LENGTH,
        pos: noun(),
        left_id: 1,
        right_id: 1,
        cost: 1000,
        boundaries: Boundaries::default(),
    });
    let tokenizer = Tokenizer::new(load_system())
        .oov_provider(&config)
        .unwrap()
        .oov_provider(&simple())
        .unwrap();
    let mut worker = tokenizer.new_worker();
    worker.reset_sentence("abc").unwrap();
    assert!(matches!(
        worker.tokenize(),
        Err(TremoloError::InvalidArgument(_))
    ));
}

#[test]
fn test_regex_invalid() {
    let config = OovProviderConfig::Regex(RegexOovConfig {
        pattern: "[a-z".to_string(),
        max_length: 32,
        pos: noun(),
        left_id: 1,
        right_id: 1,
        cost: 1000,
        boundaries: Boundaries::Relaxed,
    });
    assert!(Tokenizer::new(load_system()).oov_provider(&config).is_err());
}

#[test]
fn test_mecab() {
    let tokenizer = Tokenizer::new(load_system()).oov_provider(&mecab()).unwrap();
    assert_eq!(
        tokens(&tokenizer, "ABC東京に"),
        [
            ("ABC".to_string(), true),
            ("東京".to_string(), false),
            ("に".to_string(), false),
        ]
    );
    for input in ["東京タワーに行った", "123 abc", "😀"] {
        assert_coverage(&tokenizer, input);
    }
}

#[test]
fn test_mecab_max_grouping_len() {
    let config = OovProviderConfig::Mecab(MecabOovConfig {
        char_def: CHAR_DEF.to_string(),
        unk_def: UNK_DEF.to_string(),
        max_grouping_len: Some(2),
    });
    let tokenizer = Tokenizer::new(load_system()).oov_provider(&config).unwrap();
    // ABC is too long to be grouped, but BC is not.
    let surfaces: Vec<_> = tokens(&tokenizer, "ABC").into_iter().map(|t| t.0).collect();
    assert_eq!(surfaces, ["A", "BC"]);
}

#[test]
fn test_mecab_twice() {
    let result = Tokenizer::new(load_system())
        .oov_provider(&mecab())
        .unwrap()
        .oov_provider(&mecab());
    assert!(result.is_err());
}

#[test]
fn test_mecab_undefined_category() {
    let config = OovProviderConfig::Mecab(MecabOovConfig {
        char_def: CHAR_DEF.to_string(),
        unk_def: "HIRAGANA,1,1,100,名詞,普通名詞,一般,*,*,*".to_string(),
        max_grouping_len: None,
    });
    assert!(Tokenizer::new(load_system()).oov_provider(&config).is_err());
}
