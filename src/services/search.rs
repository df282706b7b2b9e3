use sqlx::{Postgres, QueryBuilder};

/// Column list and joins of the show/status/watcher relation, without predicates
pub(crate) const SHOW_ROW_SELECT: &str = "
SELECT
    s.id AS show_id,
    s.name AS show_name,
    s.num_seasons,
    p.name AS platform_name,
    p.icon AS platform_icon,
    s.cancelled,
    s.date_cancelled,
    ss.watch_status_id,
    ws.status AS watch_status,
    ss.current_season,
    ss.finished_at,
    string_agg(w.name, ', ' ORDER BY w.name) AS watcher_name,
    s.poster_image
FROM show_status AS ss
    INNER JOIN watch_status AS ws ON ws.id = ss.watch_status_id
    INNER JOIN shows AS s ON s.id = ss.show_id
    LEFT JOIN platforms AS p ON p.id = s.platform_id
    INNER JOIN watchers_to_show_statuses AS wtss ON wtss.show_status_id = ss.id
    INNER JOIN watchers AS w ON w.id = wtss.watcher_id
";

pub(crate) const SHOW_ROW_GROUP_BY: &str = "
GROUP BY
    s.id, p.name, p.icon, ws.status, ss.watch_status_id, ss.current_season, ss.finished_at
";

/// Optional filters for a show search; all present filters combine with AND
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchShowsOptions {
    /// 1-based page; anything below 1 is treated as 1
    pub page: i64,
    pub show_name: Option<String>,
    pub platform_id: Option<i64>,
}

impl Default for SearchShowsOptions {
    fn default() -> Self {
        Self {
            page: 1,
            show_name: None,
            platform_id: None,
        }
    }
}

impl SearchShowsOptions {
    pub fn with_page(mut self, page: i64) -> Self {
        self.page = page;
        self
    }

    /// Blank names are ignored
    pub fn with_show_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.show_name = if name.trim().is_empty() {
            None
        } else {
            Some(name)
        };
        self
    }

    pub fn with_platform(mut self, platform_id: i64) -> Self {
        self.platform_id = Some(platform_id);
        self
    }

    pub fn effective_page(&self) -> i64 {
        self.page.max(1)
    }
}

/// One page of search results plus the size of the whole filtered set
#[derive(Debug, Clone)]
pub struct SearchPage<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub total_count: i64,
}

impl<T> SearchPage<T> {
    pub fn num_pages(&self, page_size: i64) -> i64 {
        if page_size <= 0 {
            return 0;
        }
        (self.total_count + page_size - 1) / page_size
    }
}

/// Wraps a search term for a substring ILIKE match, escaping LIKE metacharacters
pub fn ilike_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Opens `WITH matches AS (...)` over the account's shows with every present filter
fn push_matches(
    qb: &mut QueryBuilder<'static, Postgres>,
    account_id: i64,
    options: &SearchShowsOptions,
) {
    qb.push("WITH matches AS (");
    qb.push(SHOW_ROW_SELECT);
    qb.push(" WHERE ss.account_id = ");
    qb.push_bind(account_id);

    if let Some(name) = &options.show_name {
        qb.push(" AND s.name ILIKE ");
        qb.push_bind(ilike_pattern(name));
    }

    if let Some(platform_id) = options.platform_id {
        qb.push(" AND s.platform_id = ");
        qb.push_bind(platform_id);
    }

    qb.push(SHOW_ROW_GROUP_BY);
    qb.push(")\n");
}

/// Builds the filtered, paged search query
///
/// The total count is computed over the filtered set before OFFSET/LIMIT so one round
/// trip yields both the page and the count. A page past the end carries no rows, so
/// its count comes from [`build_count_query`].
pub fn build_search_query(
    account_id: i64,
    options: &SearchShowsOptions,
    page_size: i64,
) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("");
    push_matches(&mut qb, account_id, options);
    qb.push(
        "SELECT matches.*, (SELECT COUNT(*) FROM matches) AS total_count
FROM matches
ORDER BY show_name ASC, show_id ASC",
    );
    qb.push(" OFFSET ");
    qb.push_bind(crate::db::page_offset(options.page, page_size));
    qb.push(" LIMIT ");
    qb.push_bind(page_size);

    qb
}

/// Counts the filtered set, ignoring the page
pub fn build_count_query(
    account_id: i64,
    options: &SearchShowsOptions,
) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("");
    push_matches(&mut qb, account_id, options);
    qb.push("SELECT COUNT(*) FROM matches");
    qb
}
