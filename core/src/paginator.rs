use std::fmt;

/// One page: a borrowed run of consecutive items.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Page<'a, T> {
    items: &'a [T],
}

impl<'a, T> Page<'a, T> {
    pub fn items(&self) -> &'a [T] {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<'a, T> IntoIterator for Page<'a, T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: fmt::Display> fmt::Display for Page<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for item in self.items {
            write!(f, "{item}")?;
        }
        Ok(())
    }
}

/// Consecutive pages over a slice; only the last page may be short.
#[derive(Debug, Clone)]
pub struct Paginator<'a, T> {
    pages: Vec<Page<'a, T>>,
}

impl<'a, T> Paginator<'a, T> {
    /// A `page_size` of zero is treated as one.
    pub fn new(items: &'a [T], page_size: usize) -> Self {
        let pages = items.chunks(page_size.max(1)).map(|items| Page { items }).collect();
        Self { pages }
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Page<'a, T>> {
        self.pages.iter()
    }
}

impl<'p, 'a, T> IntoIterator for &'p Paginator<'a, T> {
    type Item = &'p Page<'a, T>;
    type IntoIter = std::slice::Iter<'p, Page<'a, T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub fn paginate<T>(items: &[T], page_size: usize) -> Paginator<'_, T> {
    Paginator::new(items, page_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Document;

    #[test]
    fn last_page_may_be_short() {
        let items: Vec<i32> = (1..=5).collect();
        let pages = paginate(&items, 2);
        assert_eq!(pages.len(), 3);
        let sizes: Vec<_> = pages.iter().map(Page::len).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
        assert_eq!(pages.iter().last().unwrap().items(), &[5]);
    }

    #[test]
    fn empty_and_degenerate_sizes() {
        assert!(paginate::<i32>(&[], 3).is_empty());
        assert_eq!(paginate(&[1, 2, 3], 0).len(), 3);
        assert_eq!(paginate(&[1, 2, 3], 10).len(), 1);
    }

    #[test]
    fn page_display_concatenates_documents() {
        let documents = [Document::new(2, 0.5, 3), Document::new(4, 0.25, -1)];
        let pages = paginate(&documents, 2);
        assert_eq!(
            pages.iter().next().unwrap().to_string(),
            "{ document_id = 2, relevance = 0.5, rating = 3 }{ document_id = 4, relevance = 0.25, rating = -1 }"
        );
    }
}
