//! `initiateTransfer` and `getTransfer` handlers (spec.md §6).

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use uuid::Uuid;

use crate::error::{KernelError, TracedError};
use crate::gateway::state::AppState;
use crate::gateway::types::{InitiateTransferRequest, TransferResponse};
use crate::money;
use crate::transfer::{self, InitiateTransferParams};

const MAX_IDEMPOTENCY_KEY_LEN: usize = 255;

fn trace_id(headers: &HeaderMap) -> String {
    headers
        .get("x-trace-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

fn idempotency_key(headers: &HeaderMap) -> Result<String, KernelError> {
    let raw = headers
        .get("idempotency-key")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| KernelError::Validation("missing Idempotency-Key header".into()))?;
    if raw.is_empty() || raw.len() > MAX_IDEMPOTENCY_KEY_LEN {
        return Err(KernelError::Validation(format!(
            "Idempotency-Key must be 1-{MAX_IDEMPOTENCY_KEY_LEN} chars"
        )));
    }
    Ok(raw.to_string())
}

pub async fn initiate_transfer(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<InitiateTransferRequest>,
) -> Result<(StatusCode, Json<TransferResponse>), TracedError> {
    let trace_id = trace_id(&headers);
    let result = initiate_transfer_inner(state, &headers, body, trace_id.clone()).await;
    result.map_err(|e| TracedError(e, trace_id))
}

async fn initiate_transfer_inner(
    state: Arc<AppState>,
    headers: &HeaderMap,
    body: InitiateTransferRequest,
    trace_id: String,
) -> Result<(StatusCode, Json<TransferResponse>), KernelError> {
    let idempotency_key = idempotency_key(headers)?;
    let amount = money::parse(&body.amount)?;

    let params = InitiateTransferParams {
        idempotency_key,
        from_account_id: body.from_account_id,
        to_account_id: body.to_account_id,
        amount,
        currency: body.currency,
        description: body.description,
        user_id: body.user_id,
        trace_id,
    };

    let (result, outcome) = state.orchestrator.initiate_transfer(params).await?;
    let status = StatusCode::from_u16(outcome.status_code()).unwrap_or(StatusCode::OK);
    Ok((status, Json(result.into())))
}

pub async fn get_transfer(
    State(state): State<Arc<AppState>>,
    Path(transfer_id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<TransferResponse>, TracedError> {
    let trace_id = trace_id(&headers);
    get_transfer_inner(state, &headers, transfer_id)
        .await
        .map_err(|e| TracedError(e, trace_id))
}

async fn get_transfer_inner(
    state: Arc<AppState>,
    headers: &HeaderMap,
    transfer_id: Uuid,
) -> Result<Json<TransferResponse>, KernelError> {
    let requesting_user_id = headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or_else(|| KernelError::Validation("missing or invalid X-User-Id header".into()))?;

    let result = transfer::get_transfer(&state.db, transfer_id, requesting_user_id)
        .await?
        .ok_or_else(|| KernelError::NotFound(format!("transfer {transfer_id}")))?;

    Ok(Json(result.into()))
}
