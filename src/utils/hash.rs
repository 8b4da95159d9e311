use std::collections::{HashMap, HashSet};
use std::hash::BuildHasherDefault;

use rustc_hash::FxHasher;

/// A `HashMap` using the Fx hasher.
pub type FastHashMap<K, V> = HashMap<K, V, BuildHasherDefault<FxHasher>>;

/// A `HashSet` using the Fx hasher.
pub type FastHashSet<K> = HashSet<K, BuildHasherDefault<FxHasher>>;
