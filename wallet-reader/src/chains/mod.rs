//! Chain metadata directory.
//!
//! - [`ChainRecord`] — one entry as published by the directory.
//! - [`ChainSource`] — where records come from; [`HttpChainSource`] fetches them.
//! - [`ChainDirectory`] — the memoising cache with lookups.

mod directory;
mod record;
mod source;

pub use self::directory::*;
pub use self::record::*;
pub use self::source::*;
