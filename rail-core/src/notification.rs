use async_trait::async_trait;
use rail_shared::{Masked, TicketEvent};
use serde::Serialize;

pub const SUBJECT_BOOKING: &str = "Ticket Booking Confirmation";
pub const SUBJECT_APPROVAL: &str = "Ticket Approval Notification";
pub const SUBJECT_CANCELLATION: &str = "Ticket Cancellation Notification";
pub const SUBJECT_UPDATE: &str = "Ticket Update Notification";

/// A rendered message for the ticket holder.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub recipient: Masked<String>,
    pub subject: String,
    pub body: String,
    pub event: TicketEvent,
}

/// Delivery port for ticket notifications.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(
        &self,
        notification: &Notification,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Writes notifications to the log instead of delivering them.
pub struct LogNotificationSender;

#[async_trait]
impl NotificationSender for LogNotificationSender {
    async fn send(
        &self,
        notification: &Notification,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        tracing::info!(
            recipient = %notification.recipient.email_hint(),
            subject = %notification.subject,
            ticket_id = %notification.event.ticket_id,
            "Notification dispatched"
        );
        tracing::debug!(body_len = notification.body.len(), "Notification body rendered");
        Ok(())
    }
}

/// Drops every notification.
pub struct NoopNotificationSender;

#[async_trait]
impl NotificationSender for NoopNotificationSender {
    async fn send(
        &self,
        _notification: &Notification,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }
}
