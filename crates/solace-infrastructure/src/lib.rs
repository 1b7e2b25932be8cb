pub mod consent_cache;
pub mod paths;
pub mod schedule_store;
pub mod session_store;
pub mod state_store;

pub use crate::consent_cache::LocalConsentCache;
pub use crate::schedule_store::LocalScheduleStore;
pub use crate::session_store::LocalSessionStore;
pub use crate::state_store::TomlStateStore;
