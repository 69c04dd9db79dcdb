//! Application cache management: where extracted capsule resources live on
//! disk, and the cross-process locking that keeps concurrent launches of
//! the same capsule from racing each other during extraction.

pub mod app;
pub mod root;

pub use app::{AppCache, CacheContext};
pub use root::CacheRoot;
