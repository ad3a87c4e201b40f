//! Customer registration, lookup, deactivation and limit changes.

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{info, instrument};

use customer_accounts_core::CustomerId;

use crate::db::{
    CustomerFilter, CustomerRepository, LoanLimitRepository, NotificationPreferencesRepository,
    Page, PageRequest,
};
use crate::error::{AppError, Result};
use crate::models::{Customer, CustomerDetails, LoanLimit, LoanLimitUpdate, NewCustomer};

/// Result of a deactivation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeactivationOutcome {
    Deactivated(Customer),
    AlreadyInactive,
}

/// Customer operations backing the HTTP API.
pub struct CustomerService<'a> {
    pool: &'a PgPool,
    default_limit: Decimal,
}

impl<'a> CustomerService<'a> {
    /// Create a service that assigns `default_limit` as the credit limit of
    /// new customers.
    #[must_use]
    pub const fn new(pool: &'a PgPool, default_limit: Decimal) -> Self {
        Self {
            pool,
            default_limit,
        }
    }

    /// Register a customer with a loan limit and notification preferences.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Conflict` if an active customer already holds the
    /// national ID, or `AppError::Database` if persisting fails.
    #[instrument(skip_all, fields(national_id = %new.national_id))]
    pub async fn register(&self, new: NewCustomer) -> Result<CustomerDetails> {
        let customers = CustomerRepository::new(self.pool);

        if customers.exists_active_national_id(&new.national_id).await? {
            return Err(duplicate_national_id());
        }

        // The partial unique index catches registrations racing past the check.
        let details = customers
            .register(&new, self.default_limit)
            .await
            .map_err(|e| match AppError::from(e) {
                AppError::Conflict(_) => duplicate_national_id(),
                other => other,
            })?;

        info!(customer_id = %details.customer.id, "Customer registered");
        Ok(details)
    }

    /// Get a customer with its loan limit and preferences.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the customer does not exist.
    pub async fn get(&self, id: CustomerId) -> Result<CustomerDetails> {
        let customer = self.find_customer(id).await?;
        let loan_limit = LoanLimitRepository::new(self.pool)
            .get_by_customer(id)
            .await?;
        let preferences = NotificationPreferencesRepository::new(self.pool)
            .get_by_customer(id)
            .await?;

        Ok(CustomerDetails {
            customer,
            loan_limit,
            preferences,
        })
    }

    /// List customers matching `filter`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filter: &CustomerFilter,
        request: PageRequest,
    ) -> Result<Page<CustomerDetails>> {
        let page = CustomerRepository::new(self.pool)
            .list(filter, request)
            .await?;
        Ok(page)
    }

    /// Mark a customer inactive.
    ///
    /// Only the status and modification time change; the creation time is
    /// kept.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the customer does not exist.
    #[instrument(skip(self))]
    pub async fn deactivate(&self, id: CustomerId) -> Result<DeactivationOutcome> {
        let mut customer = self.find_customer(id).await?;

        if !customer.deactivate(Utc::now()) {
            return Ok(DeactivationOutcome::AlreadyInactive);
        }

        CustomerRepository::new(self.pool).save(&customer).await?;
        info!(customer_id = %id, "Customer deactivated");

        Ok(DeactivationOutcome::Deactivated(customer))
    }

    /// Overwrite a customer's credit and available limits.
    ///
    /// The loan limit takes the customer's currency.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the customer has no loan limit or
    /// does not exist.
    #[instrument(skip(self))]
    pub async fn set_loan_limit(
        &self,
        customer_id: CustomerId,
        update: LoanLimitUpdate,
    ) -> Result<LoanLimit> {
        let limits = LoanLimitRepository::new(self.pool);

        let mut limit = limits
            .get_by_customer(customer_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Loan limit not found for customer".to_string()))?;
        let customer = self.find_customer(customer_id).await?;

        limit.apply_update(update, customer.currency);
        let saved = limits.save(&limit).await?;

        info!(
            %customer_id,
            credit_limit = %saved.credit_limit,
            available_limit = ?saved.available_limit,
            "Loan limit set"
        );
        Ok(saved)
    }

    async fn find_customer(&self, id: CustomerId) -> Result<Customer> {
        CustomerRepository::new(self.pool)
            .get_by_id(id)
            .await?
            .ok_or_else(|| customer_not_found(id))
    }
}

fn duplicate_national_id() -> AppError {
    AppError::Conflict("Customer with this National ID already exists.".to_string())
}

fn customer_not_found(id: CustomerId) -> AppError {
    AppError::NotFound(format!("customer with id: {id} not found"))
}
