use std::{
    collections::{hash_map::RandomState, HashMap},
    hash::{BuildHasher, Hash},
    slice,
};

/// A hash map that guarantees iteration in insertion order, unlike [`HashMap`], which has no
/// predictable iteration order. Used wherever emitted output must be deterministic.
#[derive(Debug, Clone)]
pub struct OrderedHashMap<K, V, S = RandomState> {
    inner: HashMap<K, V, S>,
    insertion_order: Vec<K>,
}
impl<K: Eq + Hash + Clone, V, S: BuildHasher> OrderedHashMap<K, V, S> {
    pub fn iter(&self) -> OrderedHashMapIter<K, V, S> {
        OrderedHashMapIter {
            inner: &self.inner,
            key_iter: self.insertion_order.iter(),
        }
    }

    /// Returns the value stored under `key`, inserting the result of `insert` first if the key
    /// was not present yet.
    pub fn get_or_insert_with<F>(&mut self, key: K, insert: F) -> &mut V
    where
        F: FnOnce() -> V,
    {
        if !self.inner.contains_key(&key) {
            self.insertion_order.push(key.clone());
        }
        self.inner.entry(key).or_insert_with(insert)
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.inner.get(key)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.inner.get_mut(key)
    }

    pub fn len(&self) -> usize {
        self.insertion_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.insertion_order.is_empty()
    }
}
impl<K, V, S: BuildHasher + Default> Default for OrderedHashMap<K, V, S> {
    fn default() -> Self {
        Self {
            inner: Default::default(),
            insertion_order: Default::default(),
        }
    }
}

pub struct OrderedHashMapIter<'k, K, V, S> {
    inner: &'k HashMap<K, V, S>,
    key_iter: slice::Iter<'k, K>,
}

impl<'k, K: Eq + Hash, V, S: BuildHasher> Iterator for OrderedHashMapIter<'k, K, V, S> {
    type Item = (&'k K, &'k V);

    fn next(&mut self) -> Option<Self::Item> {
        self.key_iter
            .next()
            .and_then(|k| self.inner.get_key_value(k))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iterates_in_insertion_order() {
        let mut map: OrderedHashMap<String, usize> = Default::default();

        for (idx, key) in ["zeta", "alpha", "mu", "beta"].iter().enumerate() {
            *map.get_or_insert_with(key.to_string(), || 0) = idx;
        }

        let keys: Vec<_> = map.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(vec!["zeta", "alpha", "mu", "beta"], keys);
    }

    #[test]
    fn reinserting_a_key_keeps_its_original_place() {
        let mut map: OrderedHashMap<&str, Vec<usize>> = Default::default();

        map.get_or_insert_with("a", Vec::new).push(1);
        map.get_or_insert_with("b", Vec::new).push(2);
        map.get_or_insert_with("a", Vec::new).push(3);

        assert_eq!(2, map.len());
        assert_eq!(Some(&vec![1, 3]), map.get(&"a"));
        let keys: Vec<_> = map.iter().map(|(k, _)| *k).collect();
        assert_eq!(vec!["a", "b"], keys);
    }
}
