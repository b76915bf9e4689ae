//! Search, sort and pagination shared by the list endpoints.

use chrono::{DateTime, NaiveDate, Utc};
use outreach_core::types::Pagination;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// `asc`/`desc`, case-insensitive; anything else is `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }

    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

/// A field value extracted for comparison.
#[derive(Debug, Clone, Copy)]
pub enum SortValue<'a> {
    Text(&'a str),
    Number(f64),
    Date(Option<NaiveDate>),
    Timestamp(Option<DateTime<Utc>>),
}

impl SortValue<'_> {
    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortValue::Text(a), SortValue::Text(b)) => compare_text(a, b),
            (SortValue::Number(a), SortValue::Number(b)) => a.total_cmp(b),
            (SortValue::Date(a), SortValue::Date(b)) => a.cmp(b),
            (SortValue::Timestamp(a), SortValue::Timestamp(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

/// Case-insensitive first, then exact text, so "acme" and "Acme" still have a
/// fixed order.
fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// A whitelisted sort field of some row type.
pub trait SortKey: Copy + Default + 'static {
    /// Accepted names; matched ignoring case and underscores.
    const FIELDS: &'static [(&'static str, Self)];

    fn default_order(self) -> SortOrder;

    fn parse(raw: &str) -> Option<Self> {
        let wanted = normalize(raw);
        Self::FIELDS
            .iter()
            .find(|(name, _)| normalize(name) == wanted)
            .map(|(_, key)| *key)
    }
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

pub trait Sortable {
    type Key: SortKey;

    fn sort_value(&self, key: Self::Key) -> SortValue<'_>;

    /// Secondary key for rows that compare equal.
    fn tie_breaker(&self) -> i64;
}

pub trait Searchable {
    fn search_fields(&self) -> Vec<&str>;
}

/// Resolved `sortBy`/`sortOrder` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec<K> {
    pub key: K,
    pub order: SortOrder,
}

impl<K: SortKey> SortSpec<K> {
    /// Unknown or missing fields fall back to the key's default.
    pub fn parse(sort_by: Option<&str>, sort_order: Option<&str>) -> Self {
        let key = match sort_by.filter(|s| !s.trim().is_empty()) {
            Some(raw) => K::parse(raw).unwrap_or_else(|| {
                tracing::debug!(sort_by = raw, "Unknown sort field, using default");
                K::default()
            }),
            None => K::default(),
        };
        let order = sort_order
            .and_then(SortOrder::parse)
            .unwrap_or_else(|| key.default_order());
        Self { key, order }
    }
}

impl<K: SortKey> Default for SortSpec<K> {
    fn default() -> Self {
        let key = K::default();
        Self {
            key,
            order: key.default_order(),
        }
    }
}

/// Keep rows where any search field contains `search`, ignoring case. An
/// empty or blank term keeps everything.
pub fn filter_by_search<T: Searchable>(rows: Vec<T>, search: Option<&str>) -> Vec<T> {
    let needle = match search.map(str::trim) {
        Some(s) if !s.is_empty() => s.to_lowercase(),
        _ => return rows,
    };
    rows.into_iter()
        .filter(|row| {
            row.search_fields()
                .iter()
                .any(|field| field.to_lowercase().contains(&needle))
        })
        .collect()
}

/// Sort by `spec.key` with the row id as secondary key. The direction
/// applies to both, so flipping it reverses the output exactly.
pub fn sort_rows<T: Sortable>(rows: &mut [T], spec: SortSpec<T::Key>) {
    rows.sort_by(|a, b| {
        let ordering = a
            .sort_value(spec.key)
            .compare(&b.sort_value(spec.key))
            .then_with(|| a.tie_breaker().cmp(&b.tie_breaker()));
        spec.order.apply(ordering)
    });
}

/// A validated page request; `page` and `limit` are always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: usize,
    limit: usize,
}

impl PageRequest {
    pub const DEFAULT_LIMIT: usize = 50;

    /// Page defaults to 1; limit to `default_limit`, clamped to `1..=max_limit`.
    pub fn new(
        page: Option<usize>,
        limit: Option<usize>,
        default_limit: usize,
        max_limit: usize,
    ) -> Self {
        let max_limit = max_limit.max(1);
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(default_limit).clamp(1, max_limit),
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    fn offset(&self) -> usize {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

/// Slice `[(page-1)*limit, page*limit)` out of `rows`.
pub fn paginate<T>(rows: Vec<T>, request: PageRequest) -> (Vec<T>, Pagination) {
    let total = rows.len();
    let total_pages = total.div_ceil(request.limit);
    let page: Vec<T> = rows
        .into_iter()
        .skip(request.offset())
        .take(request.limit)
        .collect();

    let pagination = Pagination {
        page: request.page,
        limit: request.limit,
        total,
        total_pages,
        has_next: request.page < total_pages,
        has_prev: request.page > 1,
    };
    (page, pagination)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: i64,
        name: &'static str,
        sent: f64,
    }

    #[derive(Debug, Clone, Copy, Default, PartialEq)]
    enum RowKey {
        #[default]
        Name,
        Sent,
    }

    impl SortKey for RowKey {
        const FIELDS: &'static [(&'static str, Self)] =
            &[("name", RowKey::Name), ("emails_sent", RowKey::Sent)];

        fn default_order(self) -> SortOrder {
            SortOrder::Asc
        }
    }

    impl Sortable for Row {
        type Key = RowKey;

        fn sort_value(&self, key: RowKey) -> SortValue<'_> {
            match key {
                RowKey::Name => SortValue::Text(self.name),
                RowKey::Sent => SortValue::Number(self.sent),
            }
        }

        fn tie_breaker(&self) -> i64 {
            self.id
        }
    }

    impl Searchable for Row {
        fn search_fields(&self) -> Vec<&str> {
            vec![self.name]
        }
    }

    fn rows() -> Vec<Row> {
        vec![
            Row {
                id: 1,
                name: "beta",
                sent: 10.0,
            },
            Row {
                id: 2,
                name: "Alpha",
                sent: 30.0,
            },
            Row {
                id: 3,
                name: "gamma",
                sent: 10.0,
            },
            Row {
                id: 4,
                name: "alpha",
                sent: 0.0,
            },
        ]
    }

    fn ids(rows: &[Row]) -> Vec<i64> {
        rows.iter().map(|r| r.id).collect()
    }

    #[test]
    fn test_sort_key_parsing_accepts_camel_and_snake_case() {
        assert_eq!(RowKey::parse("emailsSent"), Some(RowKey::Sent));
        assert_eq!(RowKey::parse("EMAILS_SENT"), Some(RowKey::Sent));
        assert_eq!(RowKey::parse("revenue"), None);

        let spec = SortSpec::<RowKey>::parse(Some("revenue"), Some("DESC"));
        assert_eq!(spec.key, RowKey::Name);
        assert_eq!(spec.order, SortOrder::Desc);
    }

    #[test]
    fn test_text_sort_ignores_case() {
        let mut data = rows();
        sort_rows(
            &mut data,
            SortSpec {
                key: RowKey::Name,
                order: SortOrder::Asc,
            },
        );
        assert_eq!(ids(&data), vec![2, 4, 1, 3]);
    }

    #[test]
    fn test_reversing_order_reverses_output_even_with_ties() {
        for key in [RowKey::Name, RowKey::Sent] {
            let mut asc = rows();
            sort_rows(
                &mut asc,
                SortSpec {
                    key,
                    order: SortOrder::Asc,
                },
            );
            let mut desc = rows();
            sort_rows(
                &mut desc,
                SortSpec {
                    key,
                    order: SortOrder::Desc,
                },
            );
            desc.reverse();
            assert_eq!(asc, desc);
        }
    }

    #[test]
    fn test_numeric_ties_broken_by_id() {
        let mut data = rows();
        sort_rows(
            &mut data,
            SortSpec {
                key: RowKey::Sent,
                order: SortOrder::Asc,
            },
        );
        assert_eq!(ids(&data), vec![4, 1, 3, 2]);
    }

    #[test]
    fn test_search_filter() {
        assert_eq!(filter_by_search(rows(), Some("")).len(), 4);
        assert_eq!(filter_by_search(rows(), Some("   ")).len(), 4);
        assert_eq!(filter_by_search(rows(), None).len(), 4);
        assert_eq!(ids(&filter_by_search(rows(), Some("GAM"))), vec![3]);
        assert_eq!(ids(&filter_by_search(rows(), Some("alpha"))), vec![2, 4]);
    }

    #[test]
    fn test_pages_reconstruct_full_set() {
        let data: Vec<i64> = (1..=23).collect();
        for limit in [1, 5, 7, 23, 50] {
            let request = PageRequest::new(Some(1), Some(limit), 50, 500);
            let (_, pagination) = paginate(data.clone(), request);
            let mut rebuilt = Vec::new();
            for page in 1..=pagination.total_pages {
                let request = PageRequest::new(Some(page), Some(limit), 50, 500);
                let (chunk, _) = paginate(data.clone(), request);
                assert!(chunk.len() <= limit);
                rebuilt.extend(chunk);
            }
            assert_eq!(rebuilt, data, "limit {limit}");
        }
    }

    #[test]
    fn test_pagination_metadata() {
        let data: Vec<i64> = (1..=120).collect();
        let (page, meta) = paginate(data.clone(), PageRequest::new(Some(3), None, 50, 500));
        assert_eq!(page, (101..=120).collect::<Vec<_>>());
        assert_eq!(meta.total_pages, 3);
        assert!(!meta.has_next);
        assert!(meta.has_prev);

        let (beyond, _) = paginate(data, PageRequest::new(Some(9), Some(50), 50, 500));
        assert!(beyond.is_empty());
    }

    #[test]
    fn test_page_request_clamps() {
        let request = PageRequest::new(Some(0), Some(10_000), 50, 500);
        assert_eq!((request.page(), request.limit()), (1, 500));
        assert_eq!(PageRequest::new(None, Some(0), 50, 500).limit(), 1);
        assert_eq!(PageRequest::new(None, None, 50, 500), PageRequest::default());
    }

    #[test]
    fn test_zero_limits_never_reach_pagination() {
        let request = PageRequest::new(None, Some(0), 0, 0);
        assert_eq!(request.limit(), 1);
        let (page, meta) = paginate(vec![1, 2, 3], request);
        assert_eq!(page, vec![1]);
        assert_eq!(meta.total_pages, 3);

        let (empty, meta) = paginate(Vec::<i64>::new(), request);
        assert!(empty.is_empty());
        assert_eq!(meta.total_pages, 0);
    }
}
