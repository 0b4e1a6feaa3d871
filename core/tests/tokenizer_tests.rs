use docsearch_core::tokenizer::{is_valid_word, split_into_words};

#[test]
fn it_keeps_order_and_case() {
    let words = split_into_words("  Rust rust RUST   systems ");
    assert_eq!(words, vec!["Rust", "rust", "RUST", "systems"]);
}

#[test]
fn it_treats_other_whitespace_as_text() {
    let words = split_into_words("line\nbreak\ttab");
    assert_eq!(words, vec!["line\nbreak\ttab"]);
    assert!(!is_valid_word(words[0]));
}
