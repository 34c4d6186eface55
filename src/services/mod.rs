//! Service layer: orchestration over the storage repositories and in-memory
//! registries, plus the background maintenance tasks.

mod cleanup;
mod friends;
mod notify;
mod presence;
mod requests;
mod typing;

pub use cleanup::spawn_request_cleanup_task;
pub use friends::FriendshipService;
pub use notify::Notifier;
pub use presence::{PresenceService, UserStatusView};
pub use requests::FriendRequestService;
pub use typing::{TypingService, spawn_typing_sweep_task};
