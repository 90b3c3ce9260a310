//! Outbound email delivery.
//!
//! The processing pass hands fully rendered messages to an [`EmailProvider`];
//! everything about the provider (endpoint, credentials, sender identity)
//! comes from the `[delivery]` section of the configuration.

mod client;
mod http_provider;
mod provider;

pub use http_provider::HttpEmailProvider;
pub use provider::{DeliveryOutcome, EmailProvider, OutboundEmail};
