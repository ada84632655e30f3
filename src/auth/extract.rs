use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};

use super::{Principal, StaffPrincipal};
use crate::error::AppError;
use crate::AppState;

/// Extract the bearer token, if any. A present but malformed header is an error.
fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>, AppError> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    let value = value.to_str().map_err(|_| AppError::Unauthorized)?;
    match value.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(Some(token.trim())),
        _ => {
            tracing::debug!("Authorization header is not a bearer token");
            Err(AppError::Unauthorized)
        }
    }
}

/// Any authenticated principal (401 without a valid token)
pub struct CurrentPrincipal(pub Principal);

#[async_trait]
impl FromRequestParts<AppState> for CurrentPrincipal {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?.ok_or(AppError::Unauthorized)?;
        Ok(Self(state.identity.resolve(token).await?))
    }
}

/// Principal when a token is supplied; anonymous otherwise
pub struct OptionalPrincipal(pub Option<Principal>);

#[async_trait]
impl FromRequestParts<AppState> for OptionalPrincipal {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match bearer_token(&parts.headers)? {
            Some(token) => Ok(Self(Some(state.identity.resolve(token).await?))),
            None => Ok(Self(None)),
        }
    }
}

/// Staff or admin principal (401 without a token, 403 for customers)
pub struct RequireStaff(pub StaffPrincipal);

#[async_trait]
impl FromRequestParts<AppState> for RequireStaff {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentPrincipal(principal) = CurrentPrincipal::from_request_parts(parts, state).await?;
        match principal {
            Principal::Staff(staff) => Ok(Self(staff)),
            Principal::Customer(customer) => {
                tracing::warn!("Customer {} attempted a staff-only action", customer.email);
                Err(AppError::Forbidden)
            }
        }
    }
}

/// Admin principal
pub struct RequireAdmin(pub StaffPrincipal);

#[async_trait]
impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let RequireStaff(staff) = RequireStaff::from_request_parts(parts, state).await?;
        if !staff.is_admin() {
            tracing::warn!("Staff {} attempted an admin-only action", staff.email);
            return Err(AppError::Forbidden);
        }
        Ok(Self(staff))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_no_header_is_anonymous() {
        assert!(matches!(bearer_token(&HeaderMap::new()), Ok(None)));
    }

    #[test]
    fn test_bearer_token_extracted() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers).unwrap(), Some("abc.def"));
    }

    #[test]
    fn test_non_bearer_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwdw=="));
        assert!(matches!(bearer_token(&headers), Err(AppError::Unauthorized)));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer   "));
        assert!(matches!(bearer_token(&headers), Err(AppError::Unauthorized)));
    }
}
