use crate::dictionary::SystemDictionaryBuilder;
use crate::errors::TremoloError;
use crate::tests::load_system;
use crate::tokenizer::{SplitMode, Tokenizer};

fn surfaces(tokenizer: &Tokenizer, input: &str) -> Vec<String> {
    let mut worker = tokenizer.new_worker();
    worker.reset_sentence(input).unwrap();
    worker.tokenize().unwrap();
    worker.token_iter().map(|t| t.surface().to_string()).collect()
}

#[test]
fn test_tokenize_tokyo() {
    let tokenizer = Tokenizer::new(load_system());
    let mut worker = tokenizer.new_worker();
    worker.reset_sentence("東京都に行った").unwrap();
    worker.tokenize().unwrap();
    assert_eq!(worker.num_tokens(), 4);

    //   c=0      c=3000       c=1000     c=5000     c=3000      c=0
    //  [BOS] -- [東京都] -- [に] -- [行っ] -- [た] -- [EOS]
    //      c=100      c=-100   c=200    c=-100    c=0
    let expected = [
        ("東京都", 0..3, 0..9, 3100),
        ("に", 3..4, 9..12, 4000),
        ("行っ", 4..6, 12..18, 9200),
        ("た", 6..7, 18..21, 12100),
    ];
    for (t, (surface, range_char, range_byte, cost)) in worker.token_iter().zip(expected) {
        assert_eq!(t.surface(), surface);
        assert_eq!(t.range_char(), range_char);
        assert_eq!(t.range_byte(), range_byte);
        assert_eq!(t.total_cost(), cost);
        assert!(!t.is_oov());
    }

    let t = worker.token(2);
    let info = t.word_info().unwrap();
    assert_eq!(info.dictionary_form(), "行く");
    assert_eq!(
        t.pos().unwrap().components(),
        &["動詞", "非自立可能", "*", "*", "五段-カ行", "連用形-促音便"]
    );
}

#[test]
fn test_split_modes() {
    let dict = load_system();
    let tokenizer = Tokenizer::new(dict);
    assert_eq!(tokenizer.mode(), SplitMode::C);
    assert_eq!(surfaces(&tokenizer, "東京都に"), ["東京都", "に"]);

    let tokenizer = Tokenizer::new(load_system()).split_mode(SplitMode::B);
    assert_eq!(surfaces(&tokenizer, "東京都に"), ["東京都", "に"]);

    let tokenizer = Tokenizer::new(load_system()).split_mode(SplitMode::A);
    let mut worker = tokenizer.new_worker();
    worker.reset_sentence("東京都に").unwrap();
    worker.tokenize().unwrap();
    assert_eq!(worker.num_tokens(), 3);
    let t = worker.token(0);
    assert_eq!(t.surface(), "東京");
    assert_eq!(t.range_char(), 0..2);
    assert_eq!(t.word_info().unwrap().reading_form(), "トウキョウ");
    // Split tokens share the cost of the word.
    assert_eq!(t.total_cost(), 3100);
    let t = worker.token(1);
    assert_eq!(t.surface(), "都");
    assert_eq!(t.range_byte(), 6..9);
    assert_eq!(t.param().word_cost, 2500);
}

#[test]
fn test_worker_reuse() {
    let tokenizer = Tokenizer::new(load_system());
    let mut worker = tokenizer.new_worker();
    worker.reset_sentence("東京都に行った").unwrap();
    worker.tokenize().unwrap();
    assert_eq!(worker.num_tokens(), 4);
    worker.reset_sentence("西に").unwrap();
    worker.tokenize().unwrap();
    assert_eq!(worker.num_tokens(), 2);
    assert_eq!(worker.token(0).surface(), "西");
}

#[test]
fn test_gap_without_oov() {
    let tokenizer = Tokenizer::new(load_system());
    let mut worker = tokenizer.new_worker();
    worker.reset_sentence("東京タワー").unwrap();
    match worker.tokenize() {
        Err(TremoloError::ConfigurationGap(e)) => assert_eq!(e.offset, 6),
        _ => panic!("expected a configuration gap"),
    }
}

#[test]
fn test_tie_break_keeps_first_word() {
    let matrix = "1 1\n0 0 0";
    let lexicon = "\
あ,0,0,100,あ,感動詞,一般,*,*,*,*,アー,*,*,A,*,*,*,*
あ,0,0,100,あ,感動詞,フィラー,*,*,*,*,アッ,*,*,A,*,*,*,*";
    let dict = SystemDictionaryBuilder::from_readers(matrix.as_bytes(), lexicon.as_bytes())
        .unwrap()
        .into_dictionary()
        .unwrap();
    let tokenizer = Tokenizer::new(dict);
    let mut worker = tokenizer.new_worker();
    worker.reset_sentence("ああ").unwrap();
    worker.tokenize().unwrap();
    assert_eq!(worker.num_tokens(), 2);
    for t in worker.token_iter() {
        assert_eq!(t.word_id().word(), 0);
        assert_eq!(t.word_info().unwrap().reading_form(), "アー");
    }
}

#[test]
fn test_inhibited_connection() {
    // BOS (right id 0) cannot precede left id 1.
    let matrix = "2 2\n0 0 0\n0 1 32767\n1 0 0\n1 1 0";
    let lexicon = "\
東京,1,1,100,東京,名詞,固有名詞,地名,一般,*,*,トウキョウ,*,*,A,*,*,*,*
東,0,1,500,東,名詞,普通名詞,一般,*,*,*,ヒガシ,*,*,A,*,*,*,*
京,1,0,500,京,名詞,普通名詞,一般,*,*,*,キョウ,*,*,A,*,*,*,*";
    let dict = SystemDictionaryBuilder::from_readers(matrix.as_bytes(), lexicon.as_bytes())
        .unwrap()
        .into_dictionary()
        .unwrap();
    let tokenizer = Tokenizer::new(dict);
    assert_eq!(surfaces(&tokenizer, "東京"), ["東", "京"]);

    // 京 cannot follow BOS, so no path reaches the end.
    let mut worker = tokenizer.new_worker();
    worker.reset_sentence("京東").unwrap();
    assert!(matches!(
        worker.tokenize(),
        Err(TremoloError::ConfigurationGap(_))
    ));

    // 東京 is the only word, and it cannot follow BOS.
    let lexicon = "東京,1,1,100,東京,名詞,固有名詞,地名,一般,*,*,トウキョウ,*,*,A,*,*,*,*";
    let dict = SystemDictionaryBuilder::from_readers(matrix.as_bytes(), lexicon.as_bytes())
        .unwrap()
        .into_dictionary()
        .unwrap();
    let tokenizer = Tokenizer::new(dict);
    let mut worker = tokenizer.new_worker();
    worker.reset_sentence("東京").unwrap();
    match worker.tokenize() {
        Err(TremoloError::ConfigurationGap(e)) => assert_eq!(e.offset, 6),
        _ => panic!("expected a configuration gap"),
    }
}
