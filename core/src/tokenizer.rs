/// Split text into words on runs of the ASCII space character.
///
/// Leading and trailing spaces are ignored and word order is preserved. Only
/// `' '` separates words: tabs and newlines stay inside the word they touch.
pub fn split_into_words(text: &str) -> Vec<&str> {
    text.split(' ').filter(|word| !word.is_empty()).collect()
}

/// A word is valid when it holds no control character below U+0020.
pub fn is_valid_word(word: &str) -> bool {
    !word.chars().any(|c| c < ' ')
}
