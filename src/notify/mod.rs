use async_trait::async_trait;

use crate::error::NotifyError;
use crate::model::NotificationPayload;

pub mod email;

/// Delivery collaborator. `None` signals the "nothing new today" variant,
/// which gets its own body rather than an empty item list.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, payload: Option<&NotificationPayload>) -> Result<(), NotifyError>;
}
