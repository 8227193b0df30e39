//! Downstream job notifications.

mod types;
mod webhook;

pub use types::*;
pub use webhook::{create_publisher, LogPublisher, WebhookPublisher};
