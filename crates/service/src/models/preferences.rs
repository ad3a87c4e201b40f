//! Notification preferences.

use customer_accounts_core::{CustomerId, NotificationPreferencesId};

/// Which channels a customer can be notified on. All off by default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotificationChannels {
    pub sms: bool,
    pub email: bool,
    pub push: bool,
}

/// Stored notification preferences for one customer.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct NotificationPreferences {
    pub id: NotificationPreferencesId,
    pub customer_id: CustomerId,
    pub sms_enabled: bool,
    pub email_enabled: bool,
    pub push_enabled: bool,
}

impl NotificationPreferences {
    /// The enabled channels.
    #[must_use]
    pub const fn channels(&self) -> NotificationChannels {
        NotificationChannels {
            sms: self.sms_enabled,
            email: self.email_enabled,
            push: self.push_enabled,
        }
    }
}
