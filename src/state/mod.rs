//! In-memory concurrent state.
//!
//! The presence registry and typing tracker are process-local shared mutable
//! state with no persistence guarantee: a restart resets every user to
//! offline/not-typing, which is correct because presence is definitionally
//! "currently connected to this process". Both are owned components built at
//! startup and injected into services, not ambient globals.

mod presence;
mod typing;

pub use presence::PresenceRegistry;
pub use typing::TypingTracker;
