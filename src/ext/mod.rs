//! Extensions to the standard collections.
pub mod ordered_hash_map;
