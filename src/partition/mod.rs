//! Source partition module
//!
//! A source partition identifies one independently-cursored collection:
//! the issues of a single `(owner, repository)` pair. It is the lookup key
//! into the cursor store and the prefix of every emitted record key.

mod types;

pub use types::SourcePartition;
