pub use crate::builder::CacheBuilder;
pub use crate::cache::{ActivationCache, DefaultStore};
pub use crate::entry::CacheEntry;
pub use crate::error::InvariantError;
pub use crate::recency::RecencySet;
pub use crate::stats::CacheStatsSnapshot;
pub use crate::store::{EntryStore, FxHashStore};
pub use crate::traits::{ActivationMode, Activator, PassivationReason};
