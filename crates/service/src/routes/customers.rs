//! Customer route handlers.
//!
//! Request bodies are deserialized with every field optional so that a
//! missing field is reported next to the malformed ones instead of as a
//! generic JSON error.

use std::str::FromStr;

use axum::extract::State;
use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use customer_accounts_core::{
    CurrencyCode, CustomerId, CustomerStatus, Email, NationalId, PhoneNumber,
};

use super::extract::{ApiJson, ApiPath, ApiQuery};
use crate::db::{CustomerFilter, Page, PageRequest};
use crate::error::{AppError, FieldErrors, Result};
use crate::models::{
    CustomerDetails, LoanLimit, LoanLimitUpdate, NewCustomer, NotificationChannels,
};
use crate::response::ApiResponse;
use crate::services::DeactivationOutcome;
use crate::state::AppState;

/// Smallest income accepted at registration.
const MIN_INCOME: i64 = 500;
/// Exclusive upper bound of a `NUMERIC(19, 2)` amount column.
const MAX_AMOUNT: i64 = 100_000_000_000_000_000;
const DEFAULT_PAGE: i64 = 1;
const DEFAULT_PAGE_SIZE: i64 = 10;
const MIN_PAGE_SIZE: i64 = 5;

// =============================================================================
// Request and response bodies
// =============================================================================

/// Registration body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub currency: Option<String>,
    pub national_id: Option<String>,
    pub income: Option<Decimal>,
    pub customer_notification_preferences_dto: Option<NotificationPreferencesDto>,
}

/// Notification channel toggles as sent and returned by the API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationPreferencesDto {
    #[serde(rename = "smsNotifications")]
    pub sms: bool,
    #[serde(rename = "emailNotifications")]
    pub email: bool,
    #[serde(rename = "pushNotifications")]
    pub push: bool,
}

impl From<NotificationPreferencesDto> for NotificationChannels {
    fn from(dto: NotificationPreferencesDto) -> Self {
        Self {
            sms: dto.sms,
            email: dto.email,
            push: dto.push,
        }
    }
}

impl From<NotificationChannels> for NotificationPreferencesDto {
    fn from(channels: NotificationChannels) -> Self {
        Self {
            sms: channels.sms,
            email: channels.email,
            push: channels.push,
        }
    }
}

/// Listing query string.
///
/// Numeric parameters arrive as text so that an empty value (`active=`)
/// counts as absent and a malformed one is reported per field.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerListQuery {
    pub phone_number: Option<String>,
    pub national_id: Option<String>,
    pub active: Option<String>,
    pub id: Option<String>,
    pub page: Option<String>,
    pub size: Option<String>,
}

/// Limit-setting body. An incoming `currency` is ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetLoanLimitRequest {
    pub credit_limit: Option<Decimal>,
    pub available_limit: Option<Decimal>,
}

/// A customer as returned by the API.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerResponse {
    pub id: CustomerId,
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub phone_number: PhoneNumber,
    pub national_id: NationalId,
    pub income: Decimal,
    pub currency: CurrencyCode,
    pub active: CustomerStatus,
    pub date_created: DateTime<Utc>,
    pub date_modified: Option<DateTime<Utc>>,
    pub loan_limits: Option<LoanLimitResponse>,
    pub customer_preferences: Option<NotificationPreferencesDto>,
}

/// A loan limit as returned by the API.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanLimitResponse {
    pub credit_limit: Decimal,
    pub available_limit: Option<Decimal>,
    pub currency: CurrencyCode,
}

impl From<LoanLimit> for LoanLimitResponse {
    fn from(limit: LoanLimit) -> Self {
        Self {
            credit_limit: limit.credit_limit,
            available_limit: limit.available_limit,
            currency: limit.currency,
        }
    }
}

impl From<CustomerDetails> for CustomerResponse {
    fn from(details: CustomerDetails) -> Self {
        let CustomerDetails {
            customer,
            loan_limit,
            preferences,
        } = details;

        Self {
            id: customer.id,
            first_name: customer.first_name,
            last_name: customer.last_name,
            email: customer.email,
            phone_number: customer.phone_number,
            national_id: customer.national_id,
            income: customer.income,
            currency: customer.currency,
            active: customer.status,
            date_created: customer.date_created,
            date_modified: customer.date_modified,
            loan_limits: loan_limit.map(LoanLimitResponse::from),
            customer_preferences: preferences.map(|p| p.channels().into()),
        }
    }
}

// =============================================================================
// Validation
// =============================================================================

fn required_text(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<String>,
    message: &str,
) -> String {
    let value = value.unwrap_or_default().trim().to_string();
    if value.is_empty() {
        errors.add(field, message);
    }
    value
}

impl CreateCustomerRequest {
    /// Check every field, collecting one message per invalid field.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` listing the invalid fields.
    pub fn validate(self) -> Result<NewCustomer> {
        let mut errors = FieldErrors::new();

        let first_name = required_text(
            &mut errors,
            "firstName",
            self.first_name,
            "First name is required",
        );
        let last_name = required_text(
            &mut errors,
            "lastName",
            self.last_name,
            "Last name is required",
        );

        let email = Email::parse(self.email.as_deref().unwrap_or_default())
            .map_err(|e| errors.add("email", e.to_string()))
            .ok();
        let phone_number = PhoneNumber::parse(self.phone_number.as_deref().unwrap_or_default())
            .map_err(|e| errors.add("phoneNumber", e.to_string()))
            .ok();
        let national_id = NationalId::parse(self.national_id.as_deref().unwrap_or_default())
            .map_err(|e| errors.add("nationalId", e.to_string()))
            .ok();
        let currency = CurrencyCode::parse(self.currency.as_deref().unwrap_or_default())
            .map_err(|e| errors.add("currency", e.to_string()))
            .ok();

        let income = match self.income {
            None => {
                errors.add("income", "Income is required");
                None
            }
            Some(income) if income < Decimal::from(MIN_INCOME) => {
                errors.add("income", format!("Income must be at least {MIN_INCOME}"));
                None
            }
            Some(income) if !fits_amount_column(income) => {
                errors.add("income", format!("Income must be less than {MAX_AMOUNT}"));
                None
            }
            Some(income) => Some(income),
        };

        let notifications = self
            .customer_notification_preferences_dto
            .unwrap_or_default()
            .into();

        match (email, phone_number, national_id, currency, income) {
            (Some(email), Some(phone_number), Some(national_id), Some(currency), Some(income)) => {
                errors.into_result(NewCustomer {
                    first_name,
                    last_name,
                    email,
                    phone_number,
                    national_id,
                    income,
                    currency,
                    notifications,
                })
            }
            _ => Err(AppError::Validation(errors)),
        }
    }
}

impl CustomerListQuery {
    /// Resolve defaults and check bounds.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for an out-of-range page, size or
    /// active flag.
    pub fn validate(self) -> Result<(CustomerFilter, PageRequest)> {
        let mut errors = FieldErrors::new();

        let page_message = "page must be greater than or equal to 1";
        let page = number_param::<i64>(&mut errors, "page", self.page, page_message)
            .unwrap_or(DEFAULT_PAGE);
        let page = u32::try_from(page).ok().filter(|p| *p >= 1).unwrap_or_else(|| {
            errors.add("page", page_message);
            1
        });

        let size_message = format!("size must be greater than or equal to {MIN_PAGE_SIZE}");
        let size = number_param::<i64>(&mut errors, "size", self.size, &size_message)
            .unwrap_or(DEFAULT_PAGE_SIZE);
        let size = u32::try_from(size)
            .ok()
            .filter(|s| i64::from(*s) >= MIN_PAGE_SIZE)
            .unwrap_or_else(|| {
                errors.add("size", size_message.as_str());
                0
            });

        let active_message = "active must be 0 or 1";
        let active = number_param::<i32>(&mut errors, "active", self.active, active_message);
        let status = match active {
            None => Some(CustomerStatus::Active),
            Some(flag) => CustomerStatus::from_flag(flag).or_else(|| {
                errors.add("active", active_message);
                None
            }),
        };

        let id = number_param::<i64>(&mut errors, "id", self.id, "id must be a whole number")
            .map(CustomerId::new);

        let filter = CustomerFilter {
            phone_number: non_blank(self.phone_number),
            national_id: non_blank(self.national_id),
            status,
            id,
        };

        errors.into_result((filter, PageRequest::new(page, size)))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Whether `amount`, rounded to cents the way the column stores it, stays
/// below [`MAX_AMOUNT`].
fn fits_amount_column(amount: Decimal) -> bool {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        < Decimal::from(MAX_AMOUNT)
}

/// Parse an optional numeric query parameter. Blank counts as absent.
fn number_param<T: FromStr>(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<String>,
    message: &str,
) -> Option<T> {
    let raw = non_blank(value)?;
    raw.parse()
        .map_err(|_| errors.add(field, message))
        .ok()
}

impl SetLoanLimitRequest {
    /// Both limits are required, must not be negative and must fit the
    /// amount column.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` listing the invalid fields.
    pub fn validate(self) -> Result<LoanLimitUpdate> {
        let mut errors = FieldErrors::new();
        let credit_limit = non_negative(&mut errors, "creditLimit", self.credit_limit);
        let available_limit = non_negative(&mut errors, "availableLimit", self.available_limit);

        errors.into_result(LoanLimitUpdate {
            credit_limit,
            available_limit,
        })
    }
}

fn non_negative(errors: &mut FieldErrors, field: &str, value: Option<Decimal>) -> Decimal {
    match value {
        None => {
            errors.add(field, format!("{field} is required"));
            Decimal::ZERO
        }
        Some(amount) if amount < Decimal::ZERO => {
            errors.add(field, format!("{field} must not be negative"));
            Decimal::ZERO
        }
        Some(amount) if !fits_amount_column(amount) => {
            errors.add(field, format!("{field} must be less than {MAX_AMOUNT}"));
            Decimal::ZERO
        }
        Some(amount) => amount,
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// `POST /customer`
pub async fn create_customer(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateCustomerRequest>,
) -> Result<ApiResponse<CustomerResponse>> {
    let new = body.validate()?;
    let details = state.customers().register(new).await?;

    Ok(ApiResponse::ok(
        "Customer created successfully",
        CustomerResponse::from(details),
    ))
}

/// `GET /customer`
pub async fn list_customers(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<CustomerListQuery>,
) -> Result<ApiResponse<Page<CustomerResponse>>> {
    let (filter, request) = query.validate()?;
    let page = state.customers().list(&filter, request).await?;

    Ok(ApiResponse::ok(
        "Customer retrieved",
        page.map(CustomerResponse::from),
    ))
}

/// `PUT /customer/{id}/deactivate`
pub async fn deactivate_customer(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<ApiResponse<CustomerResponse>> {
    let id = CustomerId::new(id);
    let customers = state.customers();

    match customers.deactivate(id).await? {
        DeactivationOutcome::AlreadyInactive => Ok(ApiResponse::message(
            false,
            "Customer is already inactive.",
        )),
        DeactivationOutcome::Deactivated(customer) => {
            let details = customers.get(id).await?;
            Ok(ApiResponse::ok(
                format!("successfully deactivated customer: {}", customer.last_name),
                CustomerResponse::from(details),
            ))
        }
    }
}

/// `POST /customer/{customerId}/set-loan-limit`
pub async fn set_loan_limit(
    State(state): State<AppState>,
    ApiPath(customer_id): ApiPath<i64>,
    ApiJson(body): ApiJson<SetLoanLimitRequest>,
) -> Result<ApiResponse<LoanLimitResponse>> {
    let update = body.validate()?;
    let limit = state
        .customers()
        .set_loan_limit(CustomerId::new(customer_id), update)
        .await?;

    Ok(ApiResponse::ok(
        "Loan limit set successfully",
        LoanLimitResponse::from(limit),
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn valid_request() -> CreateCustomerRequest {
        CreateCustomerRequest {
            first_name: Some("Amina".to_string()),
            last_name: Some("Otieno".to_string()),
            email: Some("amina@example.com".to_string()),
            phone_number: Some("+254712345678".to_string()),
            currency: Some("KES".to_string()),
            national_id: Some("12345678".to_string()),
            income: Some(Decimal::from(1500)),
            customer_notification_preferences_dto: None,
        }
    }

    fn field_errors(result: Result<impl std::fmt::Debug>) -> FieldErrors {
        match result.unwrap_err() {
            AppError::Validation(errors) => errors,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_registration_defaults_preferences_off() {
        let new = valid_request().validate().unwrap();
        assert_eq!(new.first_name, "Amina");
        assert_eq!(new.currency.as_str(), "KES");
        assert_eq!(new.notifications, NotificationChannels::default());
    }

    #[test]
    fn test_registration_keeps_requested_preferences() {
        let request = CreateCustomerRequest {
            customer_notification_preferences_dto: Some(NotificationPreferencesDto {
                sms: true,
                email: false,
                push: true,
            }),
            ..valid_request()
        };

        let new = request.validate().unwrap();
        assert!(new.notifications.sms);
        assert!(!new.notifications.email);
        assert!(new.notifications.push);
    }

    #[test]
    fn test_empty_registration_reports_every_field() {
        let errors = field_errors(CreateCustomerRequest::default().validate());

        for field in [
            "firstName",
            "lastName",
            "email",
            "phoneNumber",
            "currency",
            "nationalId",
            "income",
        ] {
            assert!(errors.get(field).is_some(), "missing message for {field}");
        }
    }

    #[test]
    fn test_registration_field_messages() {
        let request = CreateCustomerRequest {
            email: Some("not-an-email".to_string()),
            phone_number: Some("12345".to_string()),
            currency: Some("kenyan".to_string()),
            national_id: Some("12AB".to_string()),
            income: Some(Decimal::from(499)),
            ..valid_request()
        };

        let errors = field_errors(request.validate());
        assert_eq!(errors.get("email"), Some("Invalid email format"));
        assert_eq!(errors.get("phoneNumber"), Some("Invalid phone number format"));
        assert_eq!(
            errors.get("nationalId"),
            Some("National ID must be between 6 and 10 digits")
        );
        assert_eq!(errors.get("income"), Some("Income must be at least 500"));
        assert!(errors.get("currency").is_some());
        assert!(errors.get("firstName").is_none());
    }

    #[test]
    fn test_blank_name_is_rejected_even_when_rest_is_valid() {
        let request = CreateCustomerRequest {
            first_name: Some("   ".to_string()),
            ..valid_request()
        };

        let errors = field_errors(request.validate());
        assert_eq!(errors.get("firstName"), Some("First name is required"));
    }

    #[test]
    fn test_list_query_defaults() {
        let (filter, page) = CustomerListQuery::default().validate().unwrap();

        assert_eq!(filter.status, Some(CustomerStatus::Active));
        assert!(filter.phone_number.is_none());
        assert_eq!(page, PageRequest::new(1, 10));
    }

    #[test]
    fn test_list_query_honours_filters() {
        let query = CustomerListQuery {
            phone_number: Some(" +254712345678 ".to_string()),
            national_id: Some(String::new()),
            active: Some("0".to_string()),
            id: Some("3".to_string()),
            page: Some("2".to_string()),
            size: Some("5".to_string()),
        };

        let (filter, page) = query.validate().unwrap();
        assert_eq!(filter.phone_number.as_deref(), Some("+254712345678"));
        assert!(filter.national_id.is_none());
        assert_eq!(filter.status, Some(CustomerStatus::Inactive));
        assert_eq!(filter.id, Some(CustomerId::new(3)));
        assert_eq!(page.offset(), 5);
    }

    #[test]
    fn test_list_query_bounds() {
        let query = CustomerListQuery {
            page: Some("0".to_string()),
            size: Some("4".to_string()),
            active: Some("2".to_string()),
            ..CustomerListQuery::default()
        };

        let errors = field_errors(query.validate());
        assert_eq!(errors.get("page"), Some("page must be greater than or equal to 1"));
        assert_eq!(errors.get("size"), Some("size must be greater than or equal to 5"));
        assert_eq!(errors.get("active"), Some("active must be 0 or 1"));
    }

    #[test]
    fn test_set_loan_limit_validation() {
        let update = SetLoanLimitRequest {
            credit_limit: Some(Decimal::from(5000)),
            available_limit: Some(Decimal::ZERO),
        }
        .validate()
        .unwrap();
        assert_eq!(update.available_limit, Decimal::ZERO);

        let errors = field_errors(
            SetLoanLimitRequest {
                credit_limit: None,
                available_limit: Some(Decimal::from(-1)),
            }
            .validate(),
        );
        assert_eq!(errors.get("creditLimit"), Some("creditLimit is required"));
        assert_eq!(
            errors.get("availableLimit"),
            Some("availableLimit must not be negative")
        );

        let errors = field_errors(
            SetLoanLimitRequest {
                credit_limit: Some(Decimal::from(MAX_AMOUNT)),
                available_limit: Some("1e20".parse().unwrap()),
            }
            .validate(),
        );
        assert_eq!(
            errors.get("creditLimit"),
            Some("creditLimit must be less than 100000000000000000")
        );
        assert_eq!(
            errors.get("availableLimit"),
            Some("availableLimit must be less than 100000000000000000")
        );

        let update = SetLoanLimitRequest {
            credit_limit: Some("99999999999999999.99".parse().unwrap()),
            available_limit: Some(Decimal::ZERO),
        }
        .validate()
        .unwrap();
        assert_eq!(update.credit_limit, "99999999999999999.99".parse().unwrap());

        // Rounds up to the bound once stored with two decimal places.
        let errors = field_errors(
            SetLoanLimitRequest {
                credit_limit: Some("99999999999999999.995".parse().unwrap()),
                available_limit: Some(Decimal::ZERO),
            }
            .validate(),
        );
        assert!(errors.get("creditLimit").is_some());
    }

    #[test]
    fn test_list_query_blank_values_are_absent() {
        let blank = || Some(String::new());
        let query = CustomerListQuery {
            phone_number: blank(),
            national_id: blank(),
            active: blank(),
            id: blank(),
            page: blank(),
            size: Some("  ".to_string()),
        };

        let (filter, page) = query.validate().unwrap();
        assert_eq!(
            filter,
            CustomerFilter {
                status: Some(CustomerStatus::Active),
                ..CustomerFilter::default()
            }
        );
        assert_eq!(page, PageRequest::new(1, 10));
    }

    #[test]
    fn test_list_query_malformed_numbers() {
        let query = CustomerListQuery {
            active: Some("yes".to_string()),
            id: Some("abc".to_string()),
            page: Some("first".to_string()),
            size: Some("99999999999999999999".to_string()),
            ..CustomerListQuery::default()
        };

        let errors = field_errors(query.validate());
        assert_eq!(errors.get("active"), Some("active must be 0 or 1"));
        assert_eq!(errors.get("id"), Some("id must be a whole number"));
        assert_eq!(errors.get("page"), Some("page must be greater than or equal to 1"));
        assert_eq!(errors.get("size"), Some("size must be greater than or equal to 5"));
    }

    #[test]
    fn test_registration_income_must_fit_amount_column() {
        let request = CreateCustomerRequest {
            income: Some(Decimal::from(MAX_AMOUNT)),
            ..valid_request()
        };

        let errors = field_errors(request.validate());
        assert_eq!(
            errors.get("income"),
            Some("Income must be less than 100000000000000000")
        );
    }

    #[test]
    fn test_preferences_wire_names() {
        let dto: NotificationPreferencesDto =
            serde_json::from_str(r#"{"smsNotifications": true}"#).unwrap();
        assert!(dto.sms);
        assert!(!dto.email);

        let json = serde_json::to_value(NotificationPreferencesDto::default()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "smsNotifications": false,
                "emailNotifications": false,
                "pushNotifications": false
            })
        );
    }
}
