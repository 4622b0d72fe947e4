//! Store module: per-guild subscriptions and filters
//!
//! State lives in the external config service as one blob per guild.
//! Commands load a [`GuildHandle`], mutate it and flush it back; the
//! dispatcher only reads from a loaded handle.

pub mod backend;
pub mod handle;
pub mod locks;
pub mod state;

pub use backend::{ConfigBackend, JsonFileBackend, MemoryBackend};
pub use handle::GuildHandle;
pub use locks::GuildLocks;
pub use state::{GuildBlob, GuildState, UserFilters};
