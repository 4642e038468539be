//! Reply caches that sit in front of the model gateway.
//!
//! - [`TtlCache`] holds composed replies for a fixed time-to-live, keyed by
//!   [`history_cache_key`].
//! - [`RecencyCache`] is a bounded least-recently-used map used by the
//!   streaming path.
//!
//! Both are explicit objects owned by the caller and shared via `Arc`; each
//! guards its state with a single lock held only for the get/set itself.

pub mod key;
pub mod recency;
pub mod ttl;

pub use key::history_cache_key;
pub use recency::RecencyCache;
pub use ttl::TtlCache;
