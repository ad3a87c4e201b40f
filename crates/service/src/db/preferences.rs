//! Notification preferences repository.

use sqlx::PgPool;

use customer_accounts_core::CustomerId;

use super::RepositoryError;
use crate::models::NotificationPreferences;

/// Repository for notification preference database operations.
pub struct NotificationPreferencesRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> NotificationPreferencesRepository<'a> {
    /// Create a new notification preferences repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the preferences belonging to a customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Option<NotificationPreferences>, RepositoryError> {
        let preferences = sqlx::query_as::<_, NotificationPreferences>(
            r"
            SELECT id, customer_id, sms_enabled, email_enabled, push_enabled
            FROM notification_preferences
            WHERE customer_id = $1
            ",
        )
        .bind(customer_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(preferences)
    }
}
