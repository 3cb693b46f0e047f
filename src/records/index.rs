// ABOUTME: Keyed views over record lists.
// ABOUTME: index_by keeps one item per key, group_by keeps them all.

use std::collections::BTreeMap;

/// Map each item by `key`. Later items replace earlier ones with the same key.
pub fn index_by<T, K, F>(items: impl IntoIterator<Item = T>, key: F) -> BTreeMap<K, T>
where
    K: Ord,
    F: Fn(&T) -> K,
{
    items.into_iter().map(|item| (key(&item), item)).collect()
}

/// Group items by `key`, keeping their original order within each group.
pub fn group_by<T, K, F>(items: impl IntoIterator<Item = T>, key: F) -> BTreeMap<K, Vec<T>>
where
    K: Ord,
    F: Fn(&T) -> K,
{
    let mut groups: BTreeMap<K, Vec<T>> = BTreeMap::new();
    for item in items {
        groups.entry(key(&item)).or_default().push(item);
    }
    groups
}
