use indexmap::IndexMap;

use crate::models::{ShowGroupItem, ShowRow};

/// Two-level, insertion-ordered grouping of dashboard items
pub type ShowGroups = IndexMap<String, IndexMap<String, Vec<ShowGroupItem>>>;

/// Buckets rows by watch-status label, then by watcher-name group
///
/// Rows must already be ordered by status id descending, then show name; the first
/// time a key is seen fixes its position.
pub fn group_by_status_then_watcher<I>(rows: I) -> ShowGroups
where
    I: IntoIterator<Item = ShowRow>,
{
    bucket(rows, |row| (row.watch_status.clone(), row.watcher_name.clone()))
}

/// Buckets rows by watcher-name group, then by watch-status label
///
/// Rows must already be ordered by watcher-name group, status id descending, then
/// show name.
pub fn group_by_watcher_then_status<I>(rows: I) -> ShowGroups
where
    I: IntoIterator<Item = ShowRow>,
{
    bucket(rows, |row| (row.watcher_name.clone(), row.watch_status.clone()))
}

fn bucket<I, F>(rows: I, keys: F) -> ShowGroups
where
    I: IntoIterator<Item = ShowRow>,
    F: Fn(&ShowRow) -> (String, String),
{
    let mut groups = ShowGroups::new();

    for row in rows {
        let (outer, inner) = keys(&row);
        groups
            .entry(outer)
            .or_default()
            .entry(inner)
            .or_default()
            .push(ShowGroupItem::from(row));
    }

    groups
}
