//! Protection service collaborators.
//!
//! The service itself (monitoring, freezing) is external; this module only
//! registers the session's wallet and listens to its notification stream.

pub mod notifications;
pub mod registration;
pub mod types;

pub use notifications::{ChannelClosed, NotificationChannel};
pub use registration::RegistrationClient;
pub use types::{decode_notification, InboundMessage, Notification, ProtectionError};
