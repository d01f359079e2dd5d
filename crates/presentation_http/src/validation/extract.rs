//! Validating extractors
//!
//! `ValidatedJson` and `ValidatedQuery` deserialize like `Json` and `Query`
//! and then convert the raw payload through its [`IntoValidated`] impl, so a
//! handler receives the checked value directly. Both reject with
//! [`ApiError`], so failures come out in the standard envelope.

use std::fmt;

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use validator::ValidationErrors;

use crate::error::ApiError;

/// A raw payload that converts into a checked value or reports every
/// violated field
pub trait IntoValidated {
    type Output;

    fn into_validated(self) -> Result<Self::Output, ValidationErrors>;
}

/// The checked value of a JSON body
///
/// # Example
///
/// ```ignore
/// async fn handler(ValidatedJson(product): ValidatedJson<CreateProductRequest>) {
///     // `product` is a `NewProduct` with every field within bounds
/// }
/// ```
pub struct ValidatedJson<T: IntoValidated>(pub T::Output);

impl<T: IntoValidated> fmt::Debug for ValidatedJson<T>
where
    T::Output: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ValidatedJson").field(&self.0).finish()
    }
}

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + IntoValidated,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::InvalidBody(rejection.body_text()))?;

        Ok(Self(value.into_validated()?))
    }
}

/// The checked value of a query string
pub struct ValidatedQuery<T: IntoValidated>(pub T::Output);

impl<T: IntoValidated> fmt::Debug for ValidatedQuery<T>
where
    T::Output: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ValidatedQuery").field(&self.0).finish()
    }
}

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + IntoValidated,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

        Ok(Self(value.into_validated()?))
    }
}
