//! Till endpoints: customer lookup, line quotes, sale completion, history.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::Deserialize;
use shopline_core::dto::{
    CompleteSaleRequest, CustomerLookupRequest, CustomerLookupResponse, PricingResponse,
    QuoteRequest, SaleReceipt,
};
use shopline_core::Sale;
use shopline_db::DbError;

use crate::error::ApiResult;
use crate::routes::CallerIdentity;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/pos/customers/lookup", post(lookup_customer))
        .route("/api/pos/shops/{shop_id}/quote", post(quote))
        .route(
            "/api/pos/shops/{shop_id}/sales",
            post(complete_sale).get(sales_history),
        )
}

/// POST /api/pos/customers/lookup
pub async fn lookup_customer(
    State(state): State<AppState>,
    identity: CallerIdentity,
    Json(request): Json<CustomerLookupRequest>,
) -> ApiResult<Json<CustomerLookupResponse>> {
    identity.require_staff()?;
    let response = state.db.pos().lookup_customer(&request.phone).await?;
    Ok(Json(response))
}

/// POST /api/pos/shops/{shop_id}/quote
///
/// An item the shop does not carry answers 404 in the pricing shape
/// (`success: false` with a message) so the till can show it inline.
/// Staff of other shops get 403.
pub async fn quote(
    State(state): State<AppState>,
    identity: CallerIdentity,
    Path(shop_id): Path<i64>,
    Json(request): Json<QuoteRequest>,
) -> ApiResult<(StatusCode, Json<PricingResponse>)> {
    let caller = identity.require_staff()?;

    match state
        .db
        .pos()
        .price_line_item(caller, shop_id, request.stock_id, request.quantity)
        .await
    {
        Ok(line) => Ok((StatusCode::OK, Json(line.into()))),
        Err(err @ DbError::NotFound { .. }) => Ok((
            StatusCode::NOT_FOUND,
            Json(PricingResponse::failed(err.to_string())),
        )),
        Err(err) => Err(err.into()),
    }
}

/// POST /api/pos/shops/{shop_id}/sales
pub async fn complete_sale(
    State(state): State<AppState>,
    identity: CallerIdentity,
    Path(shop_id): Path<i64>,
    Json(request): Json<CompleteSaleRequest>,
) -> ApiResult<(StatusCode, Json<SaleReceipt>)> {
    let caller = identity.require_staff()?;
    let receipt = state.db.pos().complete_sale(caller, shop_id, request).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// Inclusive calendar-day bounds, `YYYY-MM-DD`.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// GET /api/pos/shops/{shop_id}/sales?from=&to=
pub async fn sales_history(
    State(state): State<AppState>,
    identity: CallerIdentity,
    Path(shop_id): Path<i64>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<Vec<Sale>>> {
    let caller = identity.require_staff()?;
    let sales = state
        .db
        .pos()
        .sales_history(caller, shop_id, query.from, query.to)
        .await?;
    Ok(Json(sales))
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::{customer, proprietor, send, test_app};
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use shopline_core::Tier;

    #[tokio::test]
    async fn test_lookup_then_sell_with_tier_discount() {
        let t = test_app().await;
        customer(&t.db, "5550100", Tier::Silver).await;

        let (status, lookup) = send(
            &t.app,
            Method::POST,
            "/api/pos/customers/lookup",
            Some(t.admin.user_id),
            Some(json!({ "phone": "5550100" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(lookup["success"], true);
        assert_eq!(lookup["customerTier"], "Silver");
        assert_eq!(lookup["tierDiscount"], 10.0);

        let uri = format!("/api/pos/shops/{}/sales", t.shop_id);
        let (status, receipt) = send(
            &t.app,
            Method::POST,
            &uri,
            Some(t.admin.user_id),
            Some(json!({
                "customerPhone": "5550100",
                "discountRate": lookup["tierDiscount"],
                "items": [{ "stockId": t.stock_id, "quantity": 2, "unitPrice": 0.01 }]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(receipt["subtotalCents"], 1998);
        assert_eq!(receipt["discountCents"], 200);
        assert_eq!(receipt["totalCents"], 1798);
        assert_eq!(receipt["saleType"], "POS");

        let (status, history) = send(&t.app, Method::GET, &uri, Some(t.owner.user_id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(history.as_array().unwrap().len(), 1);
        assert_eq!(history[0]["totalPriceCents"], 1798);
    }

    #[tokio::test]
    async fn test_unknown_customer_is_not_an_error() {
        let t = test_app().await;
        let (status, body) = send(
            &t.app,
            Method::POST,
            "/api/pos/customers/lookup",
            Some(t.owner.user_id),
            Some(json!({ "phone": "5559999" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], false);
        assert_eq!(body["customerTier"], "None");
        assert_eq!(body["tierDiscount"], 0.0);
    }

    #[tokio::test]
    async fn test_quote() {
        let t = test_app().await;
        let uri = format!("/api/pos/shops/{}/quote", t.shop_id);

        let (status, body) = send(
            &t.app,
            Method::POST,
            &uri,
            Some(t.admin.user_id),
            Some(json!({ "stockId": t.stock_id, "quantity": 3 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["itemName"], "Dune");
        assert_eq!(body["subtotal"], 29.97);

        let (status, body) = send(
            &t.app,
            Method::POST,
            &uri,
            Some(t.admin.user_id),
            Some(json!({ "stockId": 9999, "quantity": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert!(body["message"].is_string());

        let rival = proprietor(&t.db, "rival@example.com").await;
        let (status, body) = send(
            &t.app,
            Method::POST,
            &uri,
            Some(rival.user_id),
            Some(json!({ "stockId": t.stock_id, "quantity": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "FORBIDDEN");
        assert!(body.get("itemName").is_none());
    }

    #[tokio::test]
    async fn test_sale_errors_map_to_status() {
        let t = test_app().await;
        let uri = format!("/api/pos/shops/{}/sales", t.shop_id);

        let (status, body) = send(&t.app, Method::POST, &uri, Some(t.admin.user_id), Some(json!({ "items": [] }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "EMPTY_CART");

        let (status, body) = send(
            &t.app,
            Method::POST,
            &uri,
            Some(t.admin.user_id),
            Some(json!({ "items": [{ "stockId": t.stock_id, "quantity": 21 }] })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "INSUFFICIENT_STOCK");

        let (status, body) = send(
            &t.app,
            Method::POST,
            &uri,
            Some(t.admin.user_id),
            Some(json!({ "discountRate": 101, "items": [{ "stockId": t.stock_id, "quantity": 1 }] })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");

        let (status, _) = send(
            &t.app,
            Method::GET,
            &format!("{}?from=2026-02-01&to=2026-01-01", uri),
            Some(t.admin.user_id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
