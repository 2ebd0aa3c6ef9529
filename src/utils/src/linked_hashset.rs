// Copyright 2017 The Australian National University
// 
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
// 
//     http://www.apache.org/licenses/LICENSE-2.0
// 
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hash};
use std::borrow::Borrow;
use std::iter::FromIterator;

use linked_hash_map::Keys;
use linked_hash_map::LinkedHashMap;

/// A set that remembers insertion order. Live sets are kept in this so that
/// the order we add interference edges (and therefore what we log) does not
/// depend on hashing.
pub struct LinkedHashSet<K, S = RandomState>(LinkedHashMap<K, (), S>);

impl<K: Hash + Eq> LinkedHashSet<K> {
    pub fn new() -> Self {
        LinkedHashSet(LinkedHashMap::new())
    }

    /// builds a set from a vector, later duplicates are dropped
    pub fn from_vec(from: Vec<K>) -> Self {
        let mut ret = LinkedHashSet::new();

        for ele in from {
            ret.insert(ele);
        }

        ret
    }

    pub fn to_vec(mut self) -> Vec<K> {
        let mut ret = vec![];

        while let Some(ele) = self.pop_front() {
            ret.push(ele);
        }

        ret
    }
}

impl<K: Hash + Eq, S: BuildHasher> LinkedHashSet<K, S> {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn pop_front(&mut self) -> Option<K> {
        match self.0.pop_front() {
            Some((k, _)) => Some(k),
            None => None
        }
    }

    /// inserts a value, returns Some(()) if the value was already there
    /// (the existing entry keeps its position)
    pub fn insert(&mut self, k: K) -> Option<()> {
        if self.0.contains_key(&k) {
            Some(())
        } else {
            self.0.insert(k, ())
        }
    }

    pub fn contains<Q: ?Sized>(&self, k: &Q) -> bool
        where K: Borrow<Q>,
              Q: Eq + Hash
    {
        self.0.contains_key(k)
    }

    pub fn remove<Q: ?Sized>(&mut self, k: &Q) -> Option<()>
        where K: Borrow<Q>,
              Q: Eq + Hash
    {
        self.0.remove(k)
    }

    pub fn iter(&self) -> Keys<K, ()> {
        self.0.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Hash + Eq + Clone> Clone for LinkedHashSet<K> {
    fn clone(&self) -> Self {
        LinkedHashSet(self.0.clone())
    }
}

impl<K: Hash + Eq> Default for LinkedHashSet<K> {
    fn default() -> Self {
        LinkedHashSet::new()
    }
}

impl<K: Hash + Eq> FromIterator<K> for LinkedHashSet<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut ret = LinkedHashSet::new();
        for ele in iter {
            ret.insert(ele);
        }
        ret
    }
}

use std::fmt;
impl<A: fmt::Debug + Hash + Eq, S: BuildHasher> fmt::Debug for LinkedHashSet<A, S> {
    /// Returns a string that lists the elements in insertion order.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}
