use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Json, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::StoreError;
use crate::service::Customer;
use crate::Result;

pub const CUSTOMER_ID_HEADER: &str = "x-customer-id";
pub const USER_SLUG_HEADER: &str = "x-user-slug";

/// Caller identity forwarded by the upstream auth layer. `None` for anonymous requests.
#[derive(Debug, Clone)]
pub struct CurrentCustomer(pub Option<Customer>);

impl CurrentCustomer {
    pub fn customer(&self) -> Option<&Customer> { self.0.as_ref() }

    pub fn require(self) -> Result<Customer> {
        self.0.ok_or_else(|| StoreError::Unauthorized("Authentication credentials were not provided".into()))
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for CurrentCustomer {
    type Rejection = StoreError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        let Some(raw) = parts.headers.get(CUSTOMER_ID_HEADER) else { return Ok(Self(None)) };
        let id = raw
            .to_str()
            .ok()
            .and_then(|v| v.trim().parse::<i64>().ok())
            .ok_or_else(|| StoreError::Validation(format!("Invalid {CUSTOMER_ID_HEADER} header")))?;
        let user_slug = parts
            .headers
            .get(USER_SLUG_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map_or_else(|| id.to_string(), str::to_string);
        Ok(Self(Some(Customer { id, user_slug })))
    }
}

/// JSON body that has passed its `validator` rules.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = StoreError;

    async fn from_request(req: Request, state: &S) -> Result<Self> {
        let Json(data) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| StoreError::Validation(e.body_text()))?;
        data.validate()?;
        Ok(Self(data))
    }
}
