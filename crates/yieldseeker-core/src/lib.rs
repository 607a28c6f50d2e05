pub mod client;
pub mod config;
pub mod controller;
pub mod error;
pub mod guard;
pub mod models;
pub mod session;

// Re-export main types for convenience
pub use client::{ApiStyle, ChatBackend, ChatClient};
pub use config::Config;
pub use controller::{ChatController, ChatPhase, HistoryTicket, RequestId, SendTicket};
pub use error::{ChatError, StoreError};
pub use guard::{AuthSignals, AuthStore, Guard, GuardWatcher, View};
pub use models::{AuthToken, ChatHistory, Message};
pub use session::{is_valid_address, validate_address, SessionStore};
