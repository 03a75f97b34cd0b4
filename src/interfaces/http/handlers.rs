use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;

use super::{ApiResponse, AppState};
use crate::support::errors::CsmsError;

fn error_response<T>(err: CsmsError) -> (StatusCode, Json<ApiResponse<T>>) {
    let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(ApiResponse::error(format!("{}: {}", err.code(), err))))
}

pub async fn health() -> Json<ApiResponse<&'static str>> {
    Json(ApiResponse::success("ok"))
}

pub async fn metrics(State(state): State<AppState>) -> String {
    state.metrics.render()
}

pub async fn list_charge_points(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Value>>>, (StatusCode, Json<ApiResponse<Vec<Value>>>)> {
    match state.charge_points.list_chargers().await {
        Ok(chargers) => Ok(Json(ApiResponse::success(
            chargers.into_iter().map(|c| serde_json::to_value(c).unwrap_or(Value::Null)).collect(),
        ))),
        Err(e) => Err(error_response(e)),
    }
}

pub async fn get_charge_point(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Value>>, (StatusCode, Json<ApiResponse<Value>>)> {
    match state.charge_points.get_charger(&id).await {
        Ok(charger) => Ok(Json(ApiResponse::success(serde_json::to_value(charger).unwrap_or(Value::Null)))),
        Err(e) => Err(error_response(e)),
    }
}

pub async fn transaction_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Vec<Value>>>, (StatusCode, Json<ApiResponse<Vec<Value>>>)> {
    match state.charge_points.transaction_history(&id).await {
        Ok(txs) => Ok(Json(ApiResponse::success(
            txs.into_iter().map(|t| serde_json::to_value(t).unwrap_or(Value::Null)).collect(),
        ))),
        Err(e) => Err(error_response(e)),
    }
}

#[derive(serde::Deserialize)]
pub struct SendCommandRequest {
    pub action: String,
    #[serde(default)]
    pub payload: Value,
}

pub async fn send_command(
    State(state): State<AppState>,
    Path(charge_point_id): Path<String>,
    Json(body): Json<SendCommandRequest>,
) -> Result<Json<ApiResponse<Value>>, (StatusCode, Json<ApiResponse<Value>>)> {
    match state.charge_points.send_command(&charge_point_id, &body.action, body.payload).await {
        Ok(result) => Ok(Json(ApiResponse::success(result))),
        Err(e) => Err(error_response(e)),
    }
}
