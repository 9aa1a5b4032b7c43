//! Self-service cart endpoints. Every call acts on the caller's own cart.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use shopline_core::dto::{
    AddToCartRequest, CartView, CheckoutRequest, SaleReceipt, UpdateCartRequest,
};

use crate::error::ApiResult;
use crate::routes::CallerIdentity;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/cart", get(view).post(add))
        .route("/api/cart/checkout", post(checkout))
        .route("/api/cart/{cart_id}", put(update).delete(remove))
}

/// GET /api/cart
pub async fn view(
    State(state): State<AppState>,
    CallerIdentity(caller): CallerIdentity,
) -> ApiResult<Json<CartView>> {
    Ok(Json(state.db.carts().view_cart(caller).await?))
}

/// POST /api/cart
pub async fn add(
    State(state): State<AppState>,
    CallerIdentity(caller): CallerIdentity,
    Json(request): Json<AddToCartRequest>,
) -> ApiResult<Json<CartView>> {
    let cart = state
        .db
        .carts()
        .add_to_cart(caller, request.stock_id, request.quantity)
        .await?;
    Ok(Json(cart))
}

/// PUT /api/cart/{cart_id}
pub async fn update(
    State(state): State<AppState>,
    CallerIdentity(caller): CallerIdentity,
    Path(cart_id): Path<i64>,
    Json(request): Json<UpdateCartRequest>,
) -> ApiResult<Json<CartView>> {
    let cart = state
        .db
        .carts()
        .update_quantity(caller, cart_id, request.quantity)
        .await?;
    Ok(Json(cart))
}

/// DELETE /api/cart/{cart_id}
pub async fn remove(
    State(state): State<AppState>,
    CallerIdentity(caller): CallerIdentity,
    Path(cart_id): Path<i64>,
) -> ApiResult<Json<CartView>> {
    Ok(Json(state.db.carts().remove_from_cart(caller, cart_id).await?))
}

/// POST /api/cart/checkout
pub async fn checkout(
    State(state): State<AppState>,
    CallerIdentity(caller): CallerIdentity,
    Json(request): Json<CheckoutRequest>,
) -> ApiResult<(StatusCode, Json<SaleReceipt>)> {
    let receipt = state.db.carts().checkout(caller, request.shop_id).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::{customer, send, test_app};
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use shopline_core::Tier;

    #[tokio::test]
    async fn test_cart_round_trip_and_checkout() {
        let t = test_app().await;
        let shopper = customer(&t.db, "5550100", Tier::Silver).await;
        let me = Some(shopper.user_id);

        let (status, cart) = send(
            &t.app,
            Method::POST,
            "/api/cart",
            me,
            Some(json!({ "stockId": t.stock_id, "quantity": 3 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let cart_id = cart["lines"][0]["cartId"].as_i64().unwrap();

        let (status, cart) = send(
            &t.app,
            Method::PUT,
            &format!("/api/cart/{}", cart_id),
            me,
            Some(json!({ "quantity": 2 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cart["itemCount"], 2);
        assert_eq!(cart["totalCents"], 1998);

        let (status, receipt) = send(
            &t.app,
            Method::POST,
            "/api/cart/checkout",
            me,
            Some(json!({ "shopId": t.shop_id })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(receipt["saleType"], "Online");
        assert_eq!(receipt["totalCents"], 1798);

        let (_, cart) = send(&t.app, Method::GET, "/api/cart", me, None).await;
        assert!(cart["lines"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_checkout_and_foreign_entries() {
        let t = test_app().await;
        let alice = customer(&t.db, "5550100", Tier::None).await;
        let bob = customer(&t.db, "5550101", Tier::None).await;

        let (status, body) = send(
            &t.app,
            Method::POST,
            "/api/cart/checkout",
            Some(alice.user_id),
            Some(json!({ "shopId": t.shop_id })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "EMPTY_CART");

        let (_, cart) = send(
            &t.app,
            Method::POST,
            "/api/cart",
            Some(alice.user_id),
            Some(json!({ "stockId": t.stock_id, "quantity": 1 })),
        )
        .await;
        let cart_id = cart["lines"][0]["cartId"].as_i64().unwrap();

        let (status, _) = send(
            &t.app,
            Method::DELETE,
            &format!("/api/cart/{}", cart_id),
            Some(bob.user_id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
