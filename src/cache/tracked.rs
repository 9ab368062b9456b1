use std::collections::BTreeMap;
use std::mem;

/// Map whose entries survive a `sweep` only if they were marked since
/// the previous one.
#[derive(Clone, Debug)]
pub struct Tracked<K, V> {
    map: BTreeMap<K, Item<V>>,
}

#[derive(Clone, Debug)]
struct Item<V> {
    value: V,
    fresh: bool,
}

impl<K: Ord, V> Tracked<K, V> {
    pub fn new() -> Self {
        Self {
            map: BTreeMap::new(),
        }
    }

    /// Insert or replace `key` and mark it fresh, returning the value it
    /// held before.
    pub fn mark(&mut self, key: K, value: V) -> Option<V> {
        let item = Item { value, fresh: true };
        self.map.insert(key, item).map(|prev| prev.value)
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.map.get(key).map(|item| &item.value)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.map.iter().map(|(k, item)| (k, &item.value))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Clear every mark without dropping anything.
    pub fn unmark(&mut self) {
        for item in self.map.values_mut() {
            item.fresh = false;
        }
    }

    /// Drop every unmarked entry and clear the marks on the rest.
    /// Returns the number of entries dropped.
    pub fn sweep(&mut self) -> usize {
        let count = self.map.len();
        self.map.retain(|_, item| mem::replace(&mut item.fresh, false));
        count - self.map.len()
    }
}

impl<K: Ord, V> Default for Tracked<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
