//! Customer repository for database operations.
//!
//! Registration writes the customer, its loan limit and its notification
//! preferences in one transaction.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use customer_accounts_core::{
    CurrencyCode, CustomerId, CustomerStatus, LoanLimitId, NationalId, NotificationPreferencesId,
};

use super::{Page, PageRequest, RepositoryError, conflict_on_unique};
use crate::models::{
    Customer, CustomerDetails, LoanLimit, NewCustomer, NotificationPreferences,
};

const DUPLICATE_NATIONAL_ID: &str = "an active customer with this national ID already exists";

/// Optional equality filters for customer listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerFilter {
    pub phone_number: Option<String>,
    pub national_id: Option<String>,
    pub status: Option<CustomerStatus>,
    pub id: Option<CustomerId>,
}

/// A customer row joined with its loan limit and preferences.
#[derive(sqlx::FromRow)]
struct CustomerDetailsRow {
    #[sqlx(flatten)]
    customer: Customer,
    loan_limit_id: Option<LoanLimitId>,
    credit_limit: Option<Decimal>,
    available_limit: Option<Decimal>,
    loan_currency: Option<CurrencyCode>,
    loan_date_created: Option<DateTime<Utc>>,
    loan_date_modified: Option<DateTime<Utc>>,
    preferences_id: Option<NotificationPreferencesId>,
    sms_enabled: Option<bool>,
    email_enabled: Option<bool>,
    push_enabled: Option<bool>,
}

impl CustomerDetailsRow {
    fn into_details(self) -> Result<CustomerDetails, RepositoryError> {
        let customer_id = self.customer.id;

        let loan_limit = match self.loan_limit_id {
            Some(id) => Some(LoanLimit {
                id,
                customer_id,
                credit_limit: self.credit_limit.ok_or_else(|| {
                    RepositoryError::DataCorruption(format!(
                        "loan limit {id} has no credit limit"
                    ))
                })?,
                available_limit: self.available_limit,
                currency: self.loan_currency.ok_or_else(|| {
                    RepositoryError::DataCorruption(format!("loan limit {id} has no currency"))
                })?,
                date_created: self.loan_date_created.ok_or_else(|| {
                    RepositoryError::DataCorruption(format!(
                        "loan limit {id} has no creation date"
                    ))
                })?,
                date_modified: self.loan_date_modified,
            }),
            None => None,
        };

        let preferences = self.preferences_id.map(|id| NotificationPreferences {
            id,
            customer_id,
            sms_enabled: self.sms_enabled.unwrap_or(false),
            email_enabled: self.email_enabled.unwrap_or(false),
            push_enabled: self.push_enabled.unwrap_or(false),
        });

        Ok(CustomerDetails {
            customer: self.customer,
            loan_limit,
            preferences,
        })
    }
}

/// Repository for customer database operations.
pub struct CustomerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CustomerRepository<'a> {
    /// Create a new customer repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a customer by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let customer = sqlx::query_as::<_, Customer>(
            r"
            SELECT id, first_name, last_name, email, phone_number, national_id,
                   income, currency, active, date_created, date_modified
            FROM customers
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(customer)
    }

    /// Check whether an active customer already holds `national_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn exists_active_national_id(
        &self,
        national_id: &NationalId,
    ) -> Result<bool, RepositoryError> {
        let exists = sqlx::query_scalar::<_, bool>(
            r"
            SELECT EXISTS (
                SELECT 1 FROM customers WHERE national_id = $1 AND active = 1
            )
            ",
        )
        .bind(national_id)
        .fetch_one(self.pool)
        .await?;

        Ok(exists)
    }

    /// Register a customer with its loan limit and notification preferences.
    ///
    /// The loan limit starts with `credit_limit` and an available limit of
    /// zero, in the customer's currency.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if an active customer already
    /// holds the national ID.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn register(
        &self,
        new: &NewCustomer,
        credit_limit: Decimal,
    ) -> Result<CustomerDetails, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let customer = sqlx::query_as::<_, Customer>(
            r"
            INSERT INTO customers
                (first_name, last_name, email, phone_number, national_id, income, currency, active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, first_name, last_name, email, phone_number, national_id,
                      income, currency, active, date_created, date_modified
            ",
        )
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(&new.email)
        .bind(&new.phone_number)
        .bind(&new.national_id)
        .bind(new.income)
        .bind(new.currency)
        .bind(CustomerStatus::Active)
        .fetch_one(&mut *tx)
        .await
        .map_err(conflict_on_unique(DUPLICATE_NATIONAL_ID))?;

        let loan_limit = sqlx::query_as::<_, LoanLimit>(
            r"
            INSERT INTO loan_limits (customer_id, credit_limit, available_limit, currency)
            VALUES ($1, $2, 0, $3)
            RETURNING id, customer_id, credit_limit, available_limit, currency,
                      date_created, date_modified
            ",
        )
        .bind(customer.id)
        .bind(credit_limit)
        .bind(new.currency)
        .fetch_one(&mut *tx)
        .await?;

        let preferences = sqlx::query_as::<_, NotificationPreferences>(
            r"
            INSERT INTO notification_preferences
                (customer_id, sms_enabled, email_enabled, push_enabled)
            VALUES ($1, $2, $3, $4)
            RETURNING id, customer_id, sms_enabled, email_enabled, push_enabled
            ",
        )
        .bind(customer.id)
        .bind(new.notifications.sms)
        .bind(new.notifications.email)
        .bind(new.notifications.push)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(CustomerDetails {
            customer,
            loan_limit: Some(loan_limit),
            preferences: Some(preferences),
        })
    }

    /// Persist the mutable fields of an existing customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the customer does not exist.
    /// Returns `RepositoryError::Conflict` if reactivating would duplicate
    /// an active national ID.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn save(&self, customer: &Customer) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE customers
            SET first_name = $2,
                last_name = $3,
                email = $4,
                phone_number = $5,
                income = $6,
                currency = $7,
                active = $8,
                date_modified = $9
            WHERE id = $1
            ",
        )
        .bind(customer.id)
        .bind(&customer.first_name)
        .bind(&customer.last_name)
        .bind(&customer.email)
        .bind(&customer.phone_number)
        .bind(customer.income)
        .bind(customer.currency)
        .bind(customer.status)
        .bind(customer.date_modified)
        .execute(self.pool)
        .await
        .map_err(conflict_on_unique(DUPLICATE_NATIONAL_ID))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// List customers matching `filter`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if a joined loan limit is incomplete.
    pub async fn list(
        &self,
        filter: &CustomerFilter,
        request: PageRequest,
    ) -> Result<Page<CustomerDetails>, RepositoryError> {
        let total = sqlx::query_scalar::<_, i64>(
            r"
            SELECT COUNT(*)
            FROM customers c
            WHERE ($1::text IS NULL OR c.phone_number = $1)
              AND ($2::text IS NULL OR c.national_id = $2)
              AND ($3::int IS NULL OR c.active = $3)
              AND ($4::bigint IS NULL OR c.id = $4)
            ",
        )
        .bind(filter.phone_number.as_deref())
        .bind(filter.national_id.as_deref())
        .bind(filter.status)
        .bind(filter.id)
        .fetch_one(self.pool)
        .await?;

        let rows = sqlx::query_as::<_, CustomerDetailsRow>(
            r"
            SELECT c.id, c.first_name, c.last_name, c.email, c.phone_number, c.national_id,
                   c.income, c.currency, c.active, c.date_created, c.date_modified,
                   l.id AS loan_limit_id, l.credit_limit, l.available_limit,
                   l.currency AS loan_currency,
                   l.date_created AS loan_date_created,
                   l.date_modified AS loan_date_modified,
                   p.id AS preferences_id, p.sms_enabled, p.email_enabled, p.push_enabled
            FROM customers c
            LEFT JOIN loan_limits l ON l.customer_id = c.id
            LEFT JOIN notification_preferences p ON p.customer_id = c.id
            WHERE ($1::text IS NULL OR c.phone_number = $1)
              AND ($2::text IS NULL OR c.national_id = $2)
              AND ($3::int IS NULL OR c.active = $3)
              AND ($4::bigint IS NULL OR c.id = $4)
            ORDER BY c.date_created DESC, c.id DESC
            LIMIT $5 OFFSET $6
            ",
        )
        .bind(filter.phone_number.as_deref())
        .bind(filter.national_id.as_deref())
        .bind(filter.status)
        .bind(filter.id)
        .bind(request.limit())
        .bind(request.offset())
        .fetch_all(self.pool)
        .await?;

        let content = rows
            .into_iter()
            .map(CustomerDetailsRow::into_details)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(content, request, total))
    }
}
