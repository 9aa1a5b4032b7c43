//! # Routes
//!
//! | Method     | Path                                   | Handler                  |
//! |------------|----------------------------------------|--------------------------|
//! | GET        | `/health`                              | [`health::health`]       |
//! | POST       | `/api/pos/customers/lookup`            | [`pos::lookup_customer`] |
//! | POST       | `/api/pos/shops/{shop_id}/quote`       | [`pos::quote`]           |
//! | POST / GET | `/api/pos/shops/{shop_id}/sales`       | [`pos::complete_sale`] / [`pos::sales_history`] |
//! | POST       | `/api/allocations`                     | [`allocation::allocate`] |
//! | PUT / DEL  | `/api/allocations/{shop_stock_id}`     | [`allocation::reallocate`] / [`allocation::deallocate`] |
//! | GET / POST | `/api/cart`                            | [`cart::view`] / [`cart::add`] |
//! | PUT / DEL  | `/api/cart/{cart_id}`                  | [`cart::update`] / [`cart::remove`] |
//! | POST       | `/api/cart/checkout`                   | [`cart::checkout`]       |
//!
//! Every `/api` route needs a caller. Authentication happens upstream; the
//! gateway forwards the account id in the `x-user-id` header and
//! [`CallerIdentity`] resolves it to a [`Caller`] with the stored role.

pub mod allocation;
pub mod cart;
pub mod health;
pub mod pos;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::Router;
use shopline_core::{Caller, Role};
use shopline_db::DbError;
use tracing::warn;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

pub const USER_ID_HEADER: &str = "x-user-id";

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(pos::router())
        .merge(allocation::router())
        .merge(cart::router())
}

/// The authenticated caller of a request.
#[derive(Debug, Clone, Copy)]
pub struct CallerIdentity(pub Caller);

impl CallerIdentity {
    /// Till operations are for admins and proprietors.
    pub fn require_staff(self) -> ApiResult<Caller> {
        match self.0.role {
            Role::Admin | Role::Proprietor => Ok(self.0),
            Role::Customer => Err(ApiError::forbidden("staff account required")),
        }
    }
}

impl FromRequestParts<AppState> for CallerIdentity {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| ApiError::unauthorized("missing x-user-id header"))?;

        let user_id: i64 = raw
            .to_str()
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .ok_or_else(|| ApiError::unauthorized("malformed x-user-id header"))?;

        match state.db.users().get_by_id(user_id).await {
            Ok(user) => Ok(CallerIdentity(Caller::new(user.user_id, user.role))),
            Err(DbError::NotFound { .. }) => {
                warn!(user_id, uri = %parts.uri, "Unknown caller");
                Err(ApiError::unauthorized("unknown user"))
            }
            Err(other) => Err(other.into()),
        }
    }
}

// =============================================================================
// Test support
// =============================================================================


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use axum::http::{Method, StatusCode};
    use shopline_core::Tier;

    #[tokio::test]
    async fn test_missing_or_unknown_caller_is_unauthorized() {
        let t = test_app().await;

        let (status, body) = send(&t.app, Method::GET, "/api/cart", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "UNAUTHORIZED");

        let (status, _) = send(&t.app, Method::GET, "/api/cart", Some(9_999), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_customers_cannot_use_the_till() {
        let t = test_app().await;
        let shopper = customer(&t.db, "5550100", Tier::Gold).await;

        let (status, body) = send(
            &t.app,
            Method::POST,
            "/api/pos/customers/lookup",
            Some(shopper.user_id),
            Some(serde_json::json!({ "phone": "5550100" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "FORBIDDEN");
    }
}
