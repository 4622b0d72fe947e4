//! Chat platform seams
//!
//! Member lookup and direct-message delivery behind traits, with the
//! Discord REST implementation.

mod adapter;
mod discord;

pub use adapter::{DirectMessenger, Member, MemberDirectory};
pub use discord::DiscordClient;
