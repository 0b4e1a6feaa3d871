use crate::error::{Result, SearchError};
use crate::index::IndexStore;
use crate::tokenizer::{is_valid_word, split_into_words};

/// Plus and minus words of a parsed query, borrowed from the query text.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Query<'q> {
    pub plus_words: Vec<&'q str>,
    pub minus_words: Vec<&'q str>,
}

struct QueryWord<'q> {
    data: &'q str,
    is_minus: bool,
    is_stop: bool,
}

/// Parse raw query text against the store's stop words.
///
/// With `dedup` set both word lists come back sorted and free of duplicates;
/// otherwise they keep query order. A word listed both plain and with a `-`
/// ends up in both lists.
pub fn parse_query<'q>(index: &IndexStore, text: &'q str, dedup: bool) -> Result<Query<'q>> {
    let mut query = Query::default();
    for word in split_into_words(text) {
        let query_word = parse_query_word(index, word)?;
        if query_word.is_stop {
            continue;
        }
        if query_word.is_minus {
            query.minus_words.push(query_word.data);
        } else {
            query.plus_words.push(query_word.data);
        }
    }
    if dedup {
        for words in [&mut query.plus_words, &mut query.minus_words] {
            words.sort_unstable();
            words.dedup();
        }
    }
    Ok(query)
}

fn parse_query_word<'q>(index: &IndexStore, text: &'q str) -> Result<QueryWord<'q>> {
    let (data, is_minus) = match text.strip_prefix('-') {
        Some(rest) => (rest, true),
        None => (text, false),
    };
    if data.is_empty() || data.starts_with('-') {
        return Err(SearchError::InvalidQuery(text.to_string()));
    }
    if !is_valid_word(data) {
        return Err(SearchError::InvalidTerm(data.to_string()));
    }
    Ok(QueryWord { data, is_minus, is_stop: index.is_stop_word(data) })
}
