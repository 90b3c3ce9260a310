use crate::error::AppResult;
use async_trait::async_trait;

/// One message handed to a provider for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    /// Recipient address
    pub to: String,
    /// Recipient display name, when the contact registry has one
    pub to_name: Option<String>,
    pub subject: String,
    pub body_html: String,
    pub body_text: String,
}

/// What a provider reports back for an accepted message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryOutcome {
    /// Provider-side message id, when the API returns one
    pub message_id: Option<String>,
}

/// A transactional-email backend.
///
/// The processing pass talks to exactly one provider per run; swapping the
/// implementation (or substituting a recording fake in tests) is a matter of
/// handing the services a different `Arc<dyn EmailProvider>`.
#[async_trait]
pub trait EmailProvider: Send + Sync {
    /// Short provider label used in logs and delivery error messages.
    fn name(&self) -> &str;

    /// Sends one email, returning the provider's acknowledgement.
    async fn send(&self, email: &OutboundEmail) -> AppResult<DeliveryOutcome>;
}
