//! Generic chained hash table with two-table incremental rehashing.
//!
//! The table keeps serving O(1)-amortized lookups and inserts while an
//! old bucket array is migrated into a new one bucket by bucket. On top
//! of that it provides a stateless resize-tolerant full scan and two
//! iteration protocols: a safe one that tolerates mutation and an
//! unsafe one that detects it through a state fingerprint.

/// Resize policy configuration.
pub mod config;
/// Core dictionary: lifecycle, resize policy, rehash engine, CRUD.
pub mod dict;
/// Recoverable error taxonomy.
pub mod error;
/// Safe and unsafe detached iterators.
pub mod iter;
/// Random entry sampling.
mod random;
/// Stateless reverse-binary scan cursor.
mod scan;
/// Bucket array and chain entries.
mod table;
/// Type descriptor (hashing, comparison, dup/destroy hooks) and the
/// tagged value.
pub mod types;

pub use config::{DictConfig, DICT_FORCE_RESIZE_RATIO, DICT_HASH_SEED, DICT_HT_INITIAL_SIZE};
pub use dict::{Dict, SipDict};
pub use error::{DictError, DictResult};
pub use iter::{DictIterator, SafeDictIterator};
pub use types::{DictType, DictValue, SipDictType};
