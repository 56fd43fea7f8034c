use crate::dates::CanonicalDay;
use crate::errors::AppError;
use crate::export::logs_csv;
use crate::models::{
    Deleted, EntryRequest, LogEntry, LogId, LogWrite, QUICK_TOGGLE_TAG, Quota, QuotaId, QuotaInput,
    ReorderRequest, Ritual, RitualId, RitualInput, SaveRequest, SaveResponse, WeekView,
};
use crate::session::WeekSession;
use crate::state::AppState;
use crate::store::LogStore;
use axum::{
    Json,
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};
use tracing::info;

pub async fn list_rituals(State(state): State<AppState>) -> Json<Vec<Ritual>> {
    Json(state.store.rituals().await)
}

pub async fn create_ritual(
    State(state): State<AppState>,
    Json(input): Json<RitualInput>,
) -> Result<Json<Ritual>, AppError> {
    Ok(Json(state.store.create_ritual(input).await?))
}

pub async fn update_ritual(
    State(state): State<AppState>,
    Path(id): Path<RitualId>,
    Json(input): Json<RitualInput>,
) -> Result<Json<Ritual>, AppError> {
    Ok(Json(state.store.update_ritual(id, input).await?))
}

pub async fn delete_ritual(
    State(state): State<AppState>,
    Path(id): Path<RitualId>,
) -> Result<Json<Deleted>, AppError> {
    state.store.delete_ritual(id).await?;
    Ok(Json(Deleted { ok: true }))
}

pub async fn reorder_rituals(
    State(state): State<AppState>,
    Json(request): Json<ReorderRequest>,
) -> Result<Json<Vec<Ritual>>, AppError> {
    state.store.reorder_rituals(&request.ids).await?;
    Ok(Json(state.store.rituals().await))
}

pub async fn list_quotas(State(state): State<AppState>) -> Json<Vec<Quota>> {
    Json(state.store.quotas().await)
}

pub async fn create_quota(
    State(state): State<AppState>,
    Json(input): Json<QuotaInput>,
) -> Result<Json<Quota>, AppError> {
    Ok(Json(state.store.create_quota(input).await?))
}

pub async fn update_quota(
    State(state): State<AppState>,
    Path(id): Path<QuotaId>,
    Json(input): Json<QuotaInput>,
) -> Result<Json<Quota>, AppError> {
    Ok(Json(state.store.update_quota(id, input).await?))
}

pub async fn delete_quota(
    State(state): State<AppState>,
    Path(id): Path<QuotaId>,
) -> Result<Json<Deleted>, AppError> {
    state.store.delete_quota(id).await?;
    Ok(Json(Deleted { ok: true }))
}

pub async fn reorder_quotas(
    State(state): State<AppState>,
    Json(request): Json<ReorderRequest>,
) -> Result<Json<Vec<Quota>>, AppError> {
    state.store.reorder_quotas(&request.ids).await?;
    Ok(Json(state.store.quotas().await))
}

/// One-tap quota log for today.
pub async fn tick_quota(
    State(state): State<AppState>,
    Path(id): Path<QuotaId>,
) -> Result<Json<LogEntry>, AppError> {
    let today = state.normalizer.today();
    let write = LogWrite::quota(id, 1.0, today, Some(QUICK_TOGGLE_TAG.to_string()));
    Ok(Json(state.store.create_log(write).await?))
}

pub async fn list_logs(State(state): State<AppState>) -> Json<Vec<LogEntry>> {
    Json(state.store.logs().await)
}

/// Every log as CSV, oldest id first.
pub async fn export_logs(State(state): State<AppState>) -> impl IntoResponse {
    let mut logs = state.store.logs().await;
    logs.sort_by_key(|log| log.id);
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=logs.csv"),
        ],
        logs_csv(&logs),
    )
}

pub async fn list_tags(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.store.tags().await)
}

pub async fn create_log(
    State(state): State<AppState>,
    Json(write): Json<LogWrite>,
) -> Result<Json<LogEntry>, AppError> {
    Ok(Json(state.store.create_log(write).await?))
}

pub async fn update_log(
    State(state): State<AppState>,
    Path(id): Path<LogId>,
    Json(write): Json<LogWrite>,
) -> Result<Json<LogEntry>, AppError> {
    Ok(Json(state.store.update_log(id, write).await?))
}

pub async fn delete_log(
    State(state): State<AppState>,
    Path(id): Path<LogId>,
) -> Result<Json<Deleted>, AppError> {
    state.store.delete_log(id).await?;
    Ok(Json(Deleted { ok: true }))
}

/// Single-entry logging for a ritual or quota on a chosen (default: today's) day.
pub async fn log_entry(
    State(state): State<AppState>,
    Json(request): Json<EntryRequest>,
) -> Result<Json<LogEntry>, AppError> {
    if !request.value.is_finite() || request.value < 0.0 {
        return Err(AppError::bad_request("value must be a non-negative number"));
    }

    let day = match request.date.as_deref().map(str::trim) {
        Some(date) if !date.is_empty() => state.normalizer.canonicalize(date)?,
        _ => state.normalizer.today(),
    };
    let tag = request.tag.filter(|tag| !tag.trim().is_empty());

    let write = match (request.ritual_id, request.quota_id) {
        (Some(ritual_id), None) => {
            let tag = match tag {
                Some(tag) => Some(tag),
                None => state
                    .store
                    .rituals()
                    .await
                    .into_iter()
                    .find(|ritual| ritual.id == ritual_id)
                    .and_then(|ritual| ritual.default_tag),
            };
            LogWrite::ritual(ritual_id, request.value, day, tag)
        }
        (None, Some(quota_id)) => LogWrite::quota(quota_id, request.value, day, tag),
        _ => {
            return Err(AppError::bad_request(
                "exactly one of ritual_id or quota_id is required",
            ));
        }
    };

    Ok(Json(state.store.create_log(write).await?))
}

pub async fn current_week(State(state): State<AppState>) -> Result<Json<WeekView>, AppError> {
    let session = WeekSession::open(&state.store, state.normalizer, state.normalizer.today()).await?;
    Ok(Json(session.view()))
}

pub async fn get_week(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<WeekView>, AppError> {
    let day = state.normalizer.canonicalize(date.as_str())?;
    let session = WeekSession::open(&state.store, state.normalizer, day).await?;
    Ok(Json(session.view()))
}

pub async fn save_week(
    State(state): State<AppState>,
    Path(date): Path<String>,
    Json(request): Json<SaveRequest>,
) -> Result<Json<SaveResponse>, AppError> {
    let day = state.normalizer.canonicalize(date.as_str())?;
    let Ok(_saving) = state.saving.try_lock() else {
        return Err(AppError::conflict("a save is already in progress"));
    };

    let mut session = WeekSession::open(&state.store, state.normalizer, day).await?;
    if let Some(outside) = first_day_outside(&request, session.week_start()) {
        return Err(AppError::bad_request(format!(
            "cell {outside} is outside the week of {}",
            session.week_start()
        )));
    }

    session.replace_grid(request.grid);
    let summary = session.save(&state.store).await?;
    info!(
        week = %session.week_start(),
        created = summary.created,
        updated = summary.updated,
        deleted = summary.deleted,
        "saved week"
    );

    Ok(Json(SaveResponse {
        summary,
        week: session.view(),
    }))
}

fn first_day_outside(request: &SaveRequest, week_start: CanonicalDay) -> Option<CanonicalDay> {
    request
        .grid
        .cells()
        .map(|(_, day, _)| day)
        .find(|day| day.week_start() != week_start)
}
