//! Translation of UI filter/sort/page state into the catalog's query language.
//!
//! Every listing carries a fixed set of baseline predicates; optional search and
//! platform predicates are appended and everything is joined with `&`.

use std::fmt;
use std::str::FromStr;

/// Rated, released, non-variant, non-child games only.
pub const GAME_BASELINE_PREDICATES: [&str; 5] = [
    "total_rating > 0",
    "total_rating_count > 0",
    "version_parent = null",
    "parent_game = null",
    "first_release_date != null",
];
pub const FRANCHISE_BASELINE_PREDICATES: [&str; 1] = ["games > 0"];
pub const STUDIO_BASELINE_PREDICATES: [&str; 2] = ["developed != null", "logo != null"];

pub const DEFAULT_GAME_PAGE_SIZE: u32 = 100;
pub const DEFAULT_LISTING_PAGE_SIZE: u32 = 20;

/// Sort orders offered by the browse UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Popularity,
    ReleaseNewest,
    ReleaseOldest,
    NameAsc,
    NameDesc,
    RatingDesc,
    RatingAsc,
}

impl SortKey {
    const ALL: [SortKey; 7] = [
        SortKey::Popularity,
        SortKey::ReleaseNewest,
        SortKey::ReleaseOldest,
        SortKey::NameAsc,
        SortKey::NameDesc,
        SortKey::RatingDesc,
        SortKey::RatingAsc,
    ];

    pub fn as_clause(self) -> &'static str {
        match self {
            SortKey::Popularity => "total_rating_count desc",
            SortKey::ReleaseNewest => "first_release_date desc",
            SortKey::ReleaseOldest => "first_release_date asc",
            SortKey::NameAsc => "name asc",
            SortKey::NameDesc => "name desc",
            SortKey::RatingDesc => "total_rating desc",
            SortKey::RatingAsc => "total_rating asc",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_clause())
    }
}

impl FromStr for SortKey {
    type Err = String;

    /// Accepts the clause text itself, e.g. `"first_release_date desc"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.split_whitespace().collect::<Vec<_>>().join(" ");
        Self::ALL
            .into_iter()
            .find(|key| key.as_clause().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| format!("unsupported sort key: {s}"))
    }
}

/// Filter state of the game browser.
#[derive(Debug, Clone, Default)]
pub struct GameFilter {
    pub search: Option<String>,
    pub platform_name: Option<String>,
    /// 1-based.
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub sort: Option<SortKey>,
}

impl GameFilter {
    pub fn search(term: impl Into<String>) -> Self {
        Self {
            search: Some(term.into()),
            ..Self::default()
        }
    }
}

/// Filter state of the franchise and studio listings.
#[derive(Debug, Clone, Default)]
pub struct ListingFilter {
    pub search: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub sort: Option<SortKey>,
}

/// A built query: the where-clause plus the sort/limit/offset tail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogQuery {
    pub where_clause: String,
    pub sort: SortKey,
    pub limit: u32,
    pub offset: u64,
}

impl CatalogQuery {
    /// Body for a `/count` endpoint.
    pub fn count_body(&self) -> String {
        format!("where {};", self.where_clause)
    }

    /// `sort ...; limit ...; offset ...;`
    pub fn tail_clause(&self) -> String {
        format!(
            "sort {}; limit {}; offset {};",
            self.sort.as_clause(),
            self.limit,
            self.offset
        )
    }

    /// Body for a record endpoint returning `fields`.
    pub fn page_body(&self, fields: &str) -> String {
        format!(
            "fields {fields}; where {}; {}",
            self.where_clause,
            self.tail_clause()
        )
    }
}

pub fn build_game_query(filter: &GameFilter) -> CatalogQuery {
    let mut predicates = baseline(&GAME_BASELINE_PREDICATES);
    push_search(&mut predicates, filter.search.as_deref());
    if let Some(platform) = non_empty(filter.platform_name.as_deref()) {
        predicates.push(format!("platforms.name = {}", quote(platform)));
    }
    finish(
        predicates,
        filter.sort.unwrap_or(SortKey::Popularity),
        filter.page,
        filter.page_size.unwrap_or(DEFAULT_GAME_PAGE_SIZE),
    )
}

pub fn build_franchise_query(filter: &ListingFilter) -> CatalogQuery {
    build_listing_query(&FRANCHISE_BASELINE_PREDICATES, filter)
}

pub fn build_studio_query(filter: &ListingFilter) -> CatalogQuery {
    build_listing_query(&STUDIO_BASELINE_PREDICATES, filter)
}

/// `where id = {id};` for single-record lookups.
pub fn by_id(id: i64) -> String {
    format!("where id = {id};")
}

fn build_listing_query(baseline_predicates: &[&str], filter: &ListingFilter) -> CatalogQuery {
    let mut predicates = baseline(baseline_predicates);
    push_search(&mut predicates, filter.search.as_deref());
    finish(
        predicates,
        filter.sort.unwrap_or(SortKey::NameAsc),
        filter.page,
        filter.page_size.unwrap_or(DEFAULT_LISTING_PAGE_SIZE),
    )
}

fn baseline(predicates: &[&str]) -> Vec<String> {
    predicates.iter().map(|p| p.to_string()).collect()
}

fn push_search(predicates: &mut Vec<String>, search: Option<&str>) {
    if let Some(term) = non_empty(search) {
        predicates.push(format!("name ~ *{}*", quote(term)));
    }
}

fn finish(predicates: Vec<String>, sort: SortKey, page: Option<u32>, page_size: u32) -> CatalogQuery {
    // Page and size are not validated here; saturating math only keeps page 0 from underflowing.
    let page = page.unwrap_or(1);
    let offset = u64::from(page.saturating_sub(1)) * u64::from(page_size);
    CatalogQuery {
        where_clause: predicates.join(" & "),
        sort,
        limit: page_size,
        offset,
    }
}

fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

fn quote(raw: &str) -> String {
    let escaped = raw.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}
