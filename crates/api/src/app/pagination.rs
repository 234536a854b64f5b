//! Page-number pagination for list endpoints.

use serde::Deserialize;
use serde_json::{Map, Value};

use quizdesk_infra::PaginationConfig;

use crate::app::errors::ApiError;

/// `?page=&page_size=` as sent by the client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub page_size: Option<String>,
}

/// Splits collections into numbered pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    page_size: usize,
    max_page_size: usize,
}

/// One page of a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub count: usize,
    pub num_pages: usize,
    pub number: usize,
    pub page_size: usize,
    pub items: Vec<T>,
}

impl Paginator {
    pub fn new(page_size: usize, max_page_size: usize) -> Self {
        let page_size = page_size.max(1);
        Self {
            page_size,
            max_page_size: max_page_size.max(page_size),
        }
    }

    /// Requested page size; non-positive or non-numeric values fall back to the default.
    pub fn page_size(&self, query: &PageQuery) -> usize {
        query
            .page_size
            .as_deref()
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .filter(|&size| size > 0)
            .map(|size| size.min(self.max_page_size))
            .unwrap_or(self.page_size)
    }

    pub fn paginate<T>(&self, items: Vec<T>, query: &PageQuery) -> Result<Page<T>, ApiError> {
        let page_size = self.page_size(query);
        let count = items.len();
        // An empty collection still has one (empty) page.
        let num_pages = count.div_ceil(page_size).max(1);

        let number = match query.page.as_deref().map(str::trim) {
            None | Some("") => 1,
            Some("last") => num_pages,
            Some(raw) => raw.parse::<usize>().map_err(|_| invalid_page())?,
        };
        if number == 0 || number > num_pages {
            return Err(invalid_page());
        }

        let items = items
            .into_iter()
            .skip((number - 1) * page_size)
            .take(page_size)
            .collect();

        Ok(Page {
            count,
            num_pages,
            number,
            page_size,
            items,
        })
    }
}

impl From<PaginationConfig> for Paginator {
    fn from(config: PaginationConfig) -> Self {
        Self::new(config.page_size, config.max_page_size)
    }
}

impl<T> Page<T> {
    pub fn next(&self) -> Option<usize> {
        (self.number < self.num_pages).then_some(self.number + 1)
    }

    pub fn previous(&self) -> Option<usize> {
        (self.number > 1).then(|| self.number - 1)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            count: self.count,
            num_pages: self.num_pages,
            number: self.number,
            page_size: self.page_size,
            items: self.items.into_iter().map(f).collect(),
        }
    }
}

impl Page<Value> {
    /// Response body with the items under `key`.
    pub fn into_body(self, key: &str) -> Value {
        let mut body = Map::new();
        body.insert("count".into(), self.count.into());
        body.insert("num_pages".into(), self.num_pages.into());
        body.insert("page".into(), self.number.into());
        body.insert("page_size".into(), self.page_size.into());
        body.insert("next".into(), self.next().into());
        body.insert("previous".into(), self.previous().into());
        body.insert(key.to_string(), Value::Array(self.items));
        Value::Object(body)
    }
}

fn invalid_page() -> ApiError {
    ApiError::not_found("Invalid page.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn query(page: Option<&str>, page_size: Option<&str>) -> PageQuery {
        PageQuery {
            page: page.map(str::to_string),
            page_size: page_size.map(str::to_string),
        }
    }

    #[test]
    fn page_size_three_over_ten_items() {
        let paginator = Paginator::new(5, 1000);
        let page = paginator
            .paginate((0..10).collect::<Vec<_>>(), &query(None, Some("3")))
            .unwrap();

        assert_eq!(page.items, vec![0, 1, 2]);
        assert_eq!(page.count, 10);
        assert_eq!(page.num_pages, 4);
        assert_eq!(page.next(), Some(2));
        assert_eq!(page.previous(), None);
    }

    #[test]
    fn last_page_is_partial() {
        let paginator = Paginator::new(3, 1000);
        let page = paginator
            .paginate((0..10).collect::<Vec<_>>(), &query(Some("last"), None))
            .unwrap();
        assert_eq!(page.number, 4);
        assert_eq!(page.items, vec![9]);
        assert_eq!(page.next(), None);
        assert_eq!(page.previous(), Some(3));
    }

    #[test]
    fn first_page_of_empty_collection_is_valid() {
        let paginator = Paginator::new(5, 1000);
        let page = paginator.paginate(Vec::<u8>::new(), &query(None, None)).unwrap();
        assert_eq!(page.count, 0);
        assert_eq!(page.num_pages, 1);
        assert!(page.items.is_empty());

        assert!(paginator.paginate(Vec::<u8>::new(), &query(Some("2"), None)).is_err());
    }

    #[test]
    fn bad_page_numbers_are_not_found() {
        let paginator = Paginator::new(5, 1000);
        for raw in ["0", "-1", "abc", "6"] {
            let err = paginator
                .paginate((0..25).collect::<Vec<_>>(), &query(Some(raw), None))
                .unwrap_err();
            assert!(matches!(err, ApiError::NotFound(ref m) if m == "Invalid page."), "page={raw}");
        }
    }

    #[test]
    fn page_size_falls_back_and_caps() {
        let paginator = Paginator::new(5, 1000);
        assert_eq!(paginator.page_size(&query(None, Some("0"))), 5);
        assert_eq!(paginator.page_size(&query(None, Some("-3"))), 5);
        assert_eq!(paginator.page_size(&query(None, Some("ten"))), 5);
        assert_eq!(paginator.page_size(&query(None, Some("5000"))), 1000);
        assert_eq!(paginator.page_size(&query(None, None)), 5);
    }

    #[test]
    fn body_carries_links_and_items() {
        let page = Paginator::new(2, 10)
            .paginate(vec![Value::from(1), Value::from(2), Value::from(3)], &query(Some("2"), None))
            .unwrap();
        let body = page.into_body("subjects");
        assert_eq!(body["count"], 3);
        assert_eq!(body["page"], 2);
        assert_eq!(body["next"], Value::Null);
        assert_eq!(body["previous"], 1);
        assert_eq!(body["subjects"], serde_json::json!([3]));
    }

    proptest! {
        #[test]
        fn pages_partition_the_collection(len in 0usize..200, size in 1usize..20) {
            let paginator = Paginator::new(size, 1000);
            let items: Vec<usize> = (0..len).collect();
            let first = paginator.paginate(items.clone(), &PageQuery::default()).unwrap();

            let mut seen = Vec::new();
            for number in 1..=first.num_pages {
                let page = paginator
                    .paginate(items.clone(), &query(Some(&number.to_string()), None))
                    .unwrap();
                prop_assert!(page.items.len() <= size);
                seen.extend(page.items);
            }
            prop_assert_eq!(seen, items);
        }
    }
}
