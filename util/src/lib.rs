//! Unopinionated standalone utilities.

mod adler;
pub use adler::adler32;

mod cavemap;
pub use cavemap::CaveMap;

mod report;
pub use report::Reporter;

mod rng;
pub use rng::{seeded_rng, GameRng};

mod text;
pub use text::{escape, unescape};

/// Map with an efficient hash function.
pub use rustc_hash::FxHashMap as HashMap;

/// Set with an efficient hash function.
pub use rustc_hash::FxHashSet as HashSet;

type DefaultHashBuilder = std::hash::BuildHasherDefault<rustc_hash::FxHasher>;

/// Insertion order preserving map with an efficient hash function.
pub type IndexMap<K, V> = indexmap::IndexMap<K, V, DefaultHashBuilder>;

/// Insertion order preserving set with an efficient hash function.
pub type IndexSet<V> = indexmap::IndexSet<V, DefaultHashBuilder>;
