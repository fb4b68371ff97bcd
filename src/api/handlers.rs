use crate::application::ErrorResponse;
use crate::domain::Order;
use crate::ports::OrderRepositoryPort;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use std::sync::Arc;
use tracing::info;

/// 应用状态
pub struct AppState<R: OrderRepositoryPort + ?Sized> {
    pub order_repository: Arc<R>,
}

impl<R: OrderRepositoryPort + ?Sized> Clone for AppState<R> {
    fn clone(&self) -> Self {
        Self {
            order_repository: self.order_repository.clone(),
        }
    }
}

/// 查询订单
///
/// 只做错误映射：未找到返回 404，其余错误统一返回 500 且不透出细节。
pub async fn get_order<R: OrderRepositoryPort + ?Sized + 'static>(
    State(state): State<AppState<R>>,
    Path(order_uid): Path<String>,
) -> Result<Json<Order>, (StatusCode, Json<ErrorResponse>)> {
    info!("Received order query request: {}", order_uid);

    state
        .order_repository
        .get_order(&order_uid)
        .await
        .map(Json)
        .map_err(|e| {
            if e.is_not_found() {
                (
                    StatusCode::NOT_FOUND,
                    Json(ErrorResponse::not_found(
                        "order with provided UID was not found",
                    )),
                )
            } else {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse::internal()),
                )
            }
        })
}

/// 未知路由
pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::not_found(
            "requested resource was not found on the server",
        )),
    )
}

/// 健康检查
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}
