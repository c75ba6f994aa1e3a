pub mod client;
pub mod events;

pub use client::{ApiClient, GatewayError};
pub use events::{PushChannel, PushEvent};
