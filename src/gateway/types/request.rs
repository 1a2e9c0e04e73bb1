//! Request DTOs and validating extractors
//!
//! Field rules are declared with `validator` derives and enforced by
//! [`ValidatedJson`] / [`ValidatedQuery`] before a handler runs.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
};
use serde::{Deserialize, de::DeserializeOwned};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::response::ApiError;
use crate::core_types::{AccountId, MinorUnits};
use crate::currency::validate_currency;
use crate::error::ValidationError;
use crate::models::Page;

/// Open a new account with zero balance
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateAccountRequest {
    #[schema(example = "alice")]
    #[validate(length(min = 1, max = 128))]
    pub owner: String,
    /// One of USD, EUR, ARS
    #[schema(example = "USD")]
    #[validate(custom(function = "validate_currency"))]
    pub currency: String,
}

/// Move money between two accounts of the same currency
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct TransferRequest {
    #[validate(range(min = 1))]
    pub from_account_id: AccountId,
    #[validate(range(min = 1))]
    pub to_account_id: AccountId,
    /// Minor units, strictly positive
    #[schema(example = 400)]
    #[validate(range(min = 1))]
    pub amount: MinorUnits,
    /// Must match both accounts' currency
    #[schema(example = "USD")]
    #[validate(custom(function = "validate_currency"))]
    pub currency: String,
}

/// `?owner=&page_id=&page_size=`
#[derive(Debug, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListAccountsQuery {
    #[validate(length(min = 1))]
    pub owner: String,
    /// 1-based page number
    #[validate(range(min = 1))]
    pub page_id: i64,
    #[validate(range(min = 5, max = 10))]
    pub page_size: i64,
}

impl ListAccountsQuery {
    pub fn page(&self) -> Result<Page, ValidationError> {
        Page::from_page_id(self.page_id, self.page_size)
    }
}

/// `?page_id=&page_size=`
#[derive(Debug, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    #[validate(range(min = 1))]
    pub page_id: i64,
    #[validate(range(min = 5, max = 10))]
    pub page_size: i64,
}

impl PageQuery {
    pub fn page(&self) -> Result<Page, ValidationError> {
        Page::from_page_id(self.page_id, self.page_size)
    }
}

// ============================================================================
// Validating Extractors
// ============================================================================

/// JSON body that has passed its `validator` rules
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ApiError::bad_request(format!("Invalid JSON: {}", e.body_text())))?;
        value.validate()?;
        Ok(Self(value))
    }
}

/// Query string that has passed its `validator` rules
#[derive(Debug)]
pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::bad_request(format!("Invalid query: {}", e.body_text())))?;
        value.validate()?;
        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_account_rules() {
        let ok = CreateAccountRequest {
            owner: "alice".into(),
            currency: "EUR".into(),
        };
        assert!(ok.validate().is_ok());

        let empty_owner = CreateAccountRequest {
            owner: String::new(),
            currency: "EUR".into(),
        };
        assert!(empty_owner.validate().is_err());

        let bad_currency = CreateAccountRequest {
            owner: "alice".into(),
            currency: "GBP".into(),
        };
        let errs = bad_currency.validate().unwrap_err();
        assert!(errs.field_errors().contains_key("currency"));
    }

    #[test]
    fn test_transfer_rules() {
        let req = TransferRequest {
            from_account_id: 1,
            to_account_id: 2,
            amount: 0,
            currency: "USD".into(),
        };
        let errs = req.validate().unwrap_err();
        assert!(errs.field_errors().contains_key("amount"));

        let req = TransferRequest {
            from_account_id: 0,
            to_account_id: 2,
            amount: 10,
            currency: "USD".into(),
        };
        assert!(req.validate().unwrap_err().field_errors().contains_key("from_account_id"));
    }

    #[test]
    fn test_page_size_window() {
        for (size, valid) in [(4, false), (5, true), (10, true), (11, false)] {
            let q = PageQuery {
                page_id: 1,
                page_size: size,
            };
            assert_eq!(q.validate().is_ok(), valid, "page_size {size}");
        }
        assert_eq!(
            PageQuery {
                page_id: 2,
                page_size: 5
            }
            .page(),
            Ok(Page::new(5, 5))
        );
    }

    #[test]
    fn test_huge_page_id_is_rejected_not_wrapped() {
        let q = ListAccountsQuery {
            owner: "alice".into(),
            page_id: i64::MAX,
            page_size: 10,
        };
        // Passes the field rules, then fails when the offset is computed
        assert!(q.validate().is_ok());
        assert!(matches!(q.page(), Err(ValidationError::InvalidPage(_))));

        let err: ApiError = q.page().unwrap_err().into();
        assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);
    }
}
