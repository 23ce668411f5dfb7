use std::cmp::Ordering;
use std::sync::Arc;

use canvass_types::resources::Record;

/// Categorical filter, applied as a predicate conjunction with all others.
#[derive(Clone)]
pub struct Filter<R> {
    pub name: String,
    predicate: Arc<dyn Fn(&R) -> bool + Send + Sync>,
}

impl <R> Filter<R> {
    pub fn new(name: impl Into<String>, predicate: impl Fn(&R) -> bool + Send + Sync + 'static) -> Self {
        Self {
            name: name.into(),
            predicate: Arc::new(predicate),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Clone)]
pub struct Sort<R> {
    pub name: String,
    pub direction: SortDirection,
    comparator: Arc<dyn Fn(&R, &R) -> Ordering + Send + Sync>,
}

impl <R> Sort<R> {
    pub fn by(name: impl Into<String>, direction: SortDirection, comparator: impl Fn(&R, &R) -> Ordering + Send + Sync + 'static) -> Self {
        Self {
            name: name.into(),
            direction,
            comparator: Arc::new(comparator),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Page {
    pub index: usize,
    pub size: usize,
}

impl Page {
    pub const DEFAULT_SIZE: usize = 10;
}

impl Default for Page {
    fn default() -> Self {
        Self {
            index: 0,
            size: Self::DEFAULT_SIZE,
        }
    }
}

/// Current view settings of a list page. Applying a query never mutates
/// the underlying rows; the projection is recomputed on every change.
#[derive(Clone)]
pub struct ListQuery<R> {
    pub search: String,
    pub filters: Vec<Filter<R>>,
    pub sort: Option<Sort<R>>,
    pub page: Page,
}

impl <R> Default for ListQuery<R> {
    fn default() -> Self {
        Self {
            search: String::new(),
            filters: Vec::new(),
            sort: None,
            page: Page::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProjectedPage<R> {
    pub rows: Vec<R>,
    pub total_filtered: usize,
    pub page: Page,
    pub page_count: usize,
}

/// Filters, sorts and paginates `rows` according to `query`.
///
/// Pure and synchronous. The sort is stable, so rows comparing equal keep
/// their server response order.
pub fn project<R>(rows: &[R], query: &ListQuery<R>) -> ProjectedPage<R>
where
    R: Record,
{
    let needle = query.search.trim().to_lowercase();

    let mut filtered = rows.iter()
        .filter(|row| {
            let matches_search = needle.is_empty()
                || row.search_terms().iter()
                    .any(|term| term.to_lowercase().contains(&needle));

            matches_search
                && query.filters.iter().all(|filter| (filter.predicate)(row))
        })
        .collect::<Vec<_>>();

    if let Some(sort) = &query.sort {
        filtered.sort_by(|a, b| {
            let ordering = (sort.comparator)(a, b);
            match sort.direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        });
    }

    let total_filtered = filtered.len();
    let page_size = query.page.size.max(1);
    let page_count = total_filtered.div_ceil(page_size);

    let rows = filtered.into_iter()
        .skip(query.page.index * page_size)
        .take(page_size)
        .cloned()
        .collect::<Vec<_>>();

    ProjectedPage {
        rows,
        total_filtered,
        page: query.page,
        page_count,
    }
}


#[cfg(test)]
mod tests {
    use googletest::prelude::*;
    use time::macros::datetime;

    use canvass_types::nominee::{Nominee, NomineeId, NomineeStatus};

    use super::*;

    fn nominee(id: i64, name: &str, constituency: &str, status: NomineeStatus) -> Nominee {
        Nominee {
            id: NomineeId(id),
            name: String::from(name),
            constituency: String::from(constituency),
            category: String::from("council"),
            status,
            submitted_at: datetime!(2024-05-01 10:00 UTC),
        }
    }

    fn rows() -> Vec<Nominee> {
        vec![
            nominee(1, "Ada Okafor", "Riverside East", NomineeStatus::Pending),
            nominee(2, "Ben Mensah", "Hillcrest", NomineeStatus::Approved),
            nominee(3, "Ada Balogun", "Riverside West", NomineeStatus::Pending),
            nominee(4, "Chidi Eze", "Hillcrest", NomineeStatus::Rejected),
        ]
    }

    #[test]
    fn should_match_the_search_case_insensitively_against_all_terms() {

        let rows = rows();
        let query = ListQuery {
            search: String::from("riverside"),
            ..ListQuery::default()
        };

        let result = project(&rows, &query);

        assert_that!(result.rows.iter().map(|row| row.id.0).collect::<Vec<_>>(), eq(vec![1, 3]));
    }

    #[test]
    fn should_apply_filters_as_a_conjunction() {

        let rows = rows();
        let query = ListQuery {
            search: String::from("ada"),
            filters: vec![
                Filter::new("pending-only", |nominee: &Nominee| nominee.status == NomineeStatus::Pending),
                Filter::new("east-side", |nominee: &Nominee| nominee.constituency.contains("East")),
            ],
            ..ListQuery::default()
        };

        let result = project(&rows, &query);

        assert_that!(result.rows.iter().map(|row| row.id.0).collect::<Vec<_>>(), eq(vec![1]));
    }

    #[test]
    fn should_sort_stably_so_ties_keep_the_server_order() {

        let rows = rows();
        let query = ListQuery {
            sort: Some(Sort::by("constituency", SortDirection::Ascending, |a: &Nominee, b: &Nominee| {
                a.constituency.split_whitespace().next().cmp(&b.constituency.split_whitespace().next())
            })),
            ..ListQuery::default()
        };

        let result = project(&rows, &query);

        // "Hillcrest" ties (2 before 4), "Riverside" ties (1 before 3).
        assert_that!(result.rows.iter().map(|row| row.id.0).collect::<Vec<_>>(), eq(vec![2, 4, 1, 3]));
    }

    #[test]
    fn should_reverse_the_ordering_for_descending_sorts() {

        let rows = rows();
        let query = ListQuery {
            sort: Some(Sort::by("name", SortDirection::Descending, |a: &Nominee, b: &Nominee| {
                a.name.cmp(&b.name)
            })),
            ..ListQuery::default()
        };

        let result = project(&rows, &query);

        assert_that!(result.rows.iter().map(|row| row.id.0).collect::<Vec<_>>(), eq(vec![4, 2, 1, 3]));
    }

    #[test]
    fn should_paginate_the_filtered_and_sorted_rows() {

        let rows = rows();
        let query = ListQuery {
            page: Page { index: 1, size: 3 },
            ..ListQuery::default()
        };

        let result = project(&rows, &query);

        assert_that!(result.rows.iter().map(|row| row.id.0).collect::<Vec<_>>(), eq(vec![4]));
        assert_that!(result.total_filtered, eq(4));
        assert_that!(result.page_count, eq(2));
    }

    #[test]
    fn should_be_pure_and_repeatable() {

        let rows = rows();
        let before = rows.clone();
        let query = ListQuery {
            search: String::from("hillcrest"),
            sort: Some(Sort::by("name", SortDirection::Ascending, |a: &Nominee, b: &Nominee| a.name.cmp(&b.name))),
            ..ListQuery::default()
        };

        let first = project(&rows, &query);
        let second = project(&rows, &query);

        assert_that!(first, eq(second));
        assert_that!(rows, eq(before));
    }
}
