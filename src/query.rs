//! Filter/sort/pagination translator and the paginated result envelope.
//!
//! Parses the flat query-string shape of a list request into a structured
//! query, independent of any backend. Filter values stay raw strings here;
//! the storage adapter coerces them per field type before binding.

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;

const RESERVED_KEYS: &[&str] = &["page", "limit", "sort"];

/// Comparison operator in a filter clause. All clauses are AND-combined;
/// there is no OR support and no nested grouping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    Ne,
}

impl Operator {
    /// Unrecognized operator names fall back to equality.
    pub fn parse(s: &str) -> Self {
        match s {
            "gt" => Operator::Gt,
            "gte" => Operator::Gte,
            "lt" => Operator::Lt,
            "lte" => Operator::Lte,
            "like" => Operator::Like,
            "ne" => Operator::Ne,
            _ => Operator::Eq,
        }
    }

    pub fn sql(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Like => "LIKE",
            Operator::Ne => "!=",
        }
    }
}

#[derive(Clone, Debug)]
pub struct FilterClause {
    pub field: String,
    pub op: Operator,
    pub value: String,
}

#[derive(Clone, Debug)]
pub struct Sort {
    pub field: String,
    pub descending: bool,
}

impl Default for Sort {
    /// Newest-first by id.
    fn default() -> Self {
        Sort {
            field: "id".into(),
            descending: true,
        }
    }
}

impl Sort {
    fn parse(raw: &str) -> Self {
        match raw.strip_prefix('-') {
            Some(field) if !field.is_empty() => Sort {
                field: field.into(),
                descending: true,
            },
            Some(_) => Sort::default(),
            None if raw.is_empty() => Sort::default(),
            None => Sort {
                field: raw.into(),
                descending: false,
            },
        }
    }
}

#[derive(Clone, Debug)]
pub struct ListQuery {
    pub filter: Vec<FilterClause>,
    pub sort: Sort,
    pub page: u32,
    pub limit: u32,
}

impl Default for ListQuery {
    fn default() -> Self {
        ListQuery {
            filter: Vec::new(),
            sort: Sort::default(),
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl ListQuery {
    /// Translate a query-string map. Reserved keys are consumed first
    /// (non-numeric or non-positive values fall back to the defaults, never
    /// an error); every remaining key becomes a filter clause, with the
    /// bracketed `field[op]` form selecting the operator.
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let page = parse_positive(params.get("page")).unwrap_or(DEFAULT_PAGE);
        let limit = parse_positive(params.get("limit")).unwrap_or(DEFAULT_LIMIT);
        let sort = params
            .get("sort")
            .map(|s| Sort::parse(s))
            .unwrap_or_default();

        let mut entries: Vec<(&String, &String)> = params
            .iter()
            .filter(|(k, _)| !RESERVED_KEYS.contains(&k.as_str()))
            .collect();
        // HashMap iteration order is arbitrary; keep clause order stable.
        entries.sort_by(|a, b| a.0.cmp(b.0));

        let filter = entries
            .into_iter()
            .map(|(key, value)| match split_operator(key) {
                Some((field, op)) => FilterClause {
                    field: field.into(),
                    op: Operator::parse(op),
                    value: value.clone(),
                },
                None => FilterClause {
                    field: key.clone(),
                    op: Operator::Eq,
                    value: value.clone(),
                },
            })
            .collect();

        ListQuery {
            filter,
            sort,
            page,
            limit,
        }
    }

    pub fn offset(&self) -> u32 {
        (self.page - 1) * self.limit
    }
}

fn parse_positive(raw: Option<&String>) -> Option<u32> {
    raw.and_then(|s| s.parse::<u32>().ok()).filter(|n| *n >= 1)
}

/// `field[op]` -> `(field, op)`; anything else is a plain equality key.
fn split_operator(key: &str) -> Option<(&str, &str)> {
    let open = key.find('[')?;
    if open == 0 || !key.ends_with(']') {
        return None;
    }
    Some((&key[..open], &key[open + 1..key.len() - 1]))
}

/// The list-response envelope.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResult {
    pub docs: Vec<Value>,
    pub total_docs: u64,
    pub limit: u32,
    pub total_pages: u32,
    pub page: u32,
    pub paging_counter: u64,
    pub has_prev_page: bool,
    pub has_next_page: bool,
    pub prev_page: Option<u32>,
    pub next_page: Option<u32>,
}

impl PaginatedResult {
    /// `total_pages = ceil(total_docs / limit)`, `paging_counter =
    /// (page - 1) * limit + 1`, `has_next_page <=> page < total_pages`.
    pub fn assemble(docs: Vec<Value>, total_docs: u64, page: u32, limit: u32) -> Self {
        let limit = limit.max(1);
        let total_pages = (total_docs.div_ceil(u64::from(limit))) as u32;
        let has_prev_page = page > 1;
        let has_next_page = page < total_pages;
        PaginatedResult {
            docs,
            total_docs,
            limit,
            total_pages,
            page,
            paging_counter: u64::from(page - 1) * u64::from(limit) + 1,
            has_prev_page,
            has_next_page,
            prev_page: has_prev_page.then(|| page - 1),
            next_page: has_next_page.then(|| page + 1),
        }
    }
}
