pub mod accessor;
pub mod blockstore;
pub mod cache;
pub mod file;
pub mod getter;
pub mod store;

pub use accessor::{Accessor, AccessorError, Blockstore};
pub use blockstore::EdsBlockstore;
pub use cache::{AccessorCache, AccessorCacheSettings, CacheError, CachedAccessor};
pub use file::FileAccessor;
pub use getter::StoreGetter;
pub use store::{EdsStore, EdsStoreSettings};
