use crate::errors::AppError;
use crate::keys::{CategoryStatKey, MainKey, SubKey};
use crate::models::{
    category_views, CategoryView, ConfirmQuery, CustomFieldView, LogCallBody, LogCallResponse,
    NameRequest, PendingMinutesQuery, StatsResponse, StopwatchResetRequest, StopwatchView,
    SubcategoryRequest, SuggestQuery, SuggestionView, SummaryResponse, TemplateRequest,
    TotalsResponse, UndoStatus,
};
use crate::state::AppState;
use crate::stats::{today_totals, CallStats, Window};
use crate::summary::SummaryInput;
use crate::ui::render_index;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse},
    Json,
};

pub async fn index(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let mut desk = state.desk.lock().await;
    desk.stats.roll_over_if_stale()?;
    let date = desk.stats.data().last_reset_date.clone();
    let totals = today_totals(&desk.stats, 0, 0);
    Ok(Html(render_index(&date, &totals)))
}

pub async fn list_categories(State(state): State<AppState>) -> Json<Vec<CategoryView>> {
    let desk = state.desk.lock().await;
    Json(category_views(&desk.categories))
}

pub async fn add_main_category(
    State(state): State<AppState>,
    Json(payload): Json<NameRequest>,
) -> Result<(StatusCode, Json<Vec<CategoryView>>), AppError> {
    let mut desk = state.desk.lock().await;
    desk.categories.add_main_category(&payload.name)?;
    Ok((StatusCode::CREATED, Json(category_views(&desk.categories))))
}

pub async fn delete_main_category(
    State(state): State<AppState>,
    Path(main): Path<String>,
    Query(query): Query<ConfirmQuery>,
) -> Result<StatusCode, AppError> {
    let mut desk = state.desk.lock().await;
    desk.delete_main_category(&MainKey::from(main), query.confirm)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_subcategory(
    State(state): State<AppState>,
    Path(main): Path<String>,
    Json(payload): Json<SubcategoryRequest>,
) -> Result<(StatusCode, Json<Vec<CategoryView>>), AppError> {
    let mut desk = state.desk.lock().await;
    desk.categories
        .add_subcategory(&MainKey::from(main), &payload.name, &payload.template)?;
    Ok((StatusCode::CREATED, Json(category_views(&desk.categories))))
}

pub async fn update_subcategory(
    State(state): State<AppState>,
    Path((main, sub)): Path<(String, String)>,
    Json(payload): Json<TemplateRequest>,
) -> Result<StatusCode, AppError> {
    let mut desk = state.desk.lock().await;
    desk.categories.update_subcategory_template(
        &MainKey::from(main),
        &SubKey::from(sub),
        &payload.template,
    )?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_subcategory(
    State(state): State<AppState>,
    Path((main, sub)): Path<(String, String)>,
    Query(query): Query<ConfirmQuery>,
) -> Result<StatusCode, AppError> {
    let mut desk = state.desk.lock().await;
    desk.delete_subcategory(&MainKey::from(main), &SubKey::from(sub), query.confirm)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn suggest_subcategories(
    State(state): State<AppState>,
    Path(main): Path<String>,
    Query(query): Query<SuggestQuery>,
) -> Json<Vec<SuggestionView>> {
    let desk = state.desk.lock().await;
    let suggestions = desk
        .categories
        .suggest_subcategories(&MainKey::from(main), &query.q)
        .into_iter()
        .map(|(key, name)| SuggestionView { key, name })
        .collect();
    Json(suggestions)
}

pub async fn get_stats(
    State(state): State<AppState>,
    Path(window): Path<Window>,
) -> Json<StatsResponse> {
    let desk = state.desk.lock().await;
    Json(StatsResponse {
        breakdown: desk.breakdown(window),
        all_keys: desk.stats.window_totals(window),
    })
}

pub async fn get_key_stats(
    State(state): State<AppState>,
    Path((window, key)): Path<(Window, String)>,
) -> Json<CallStats> {
    let desk = state.desk.lock().await;
    Json(desk.stats_for(&CategoryStatKey::from(key), window))
}

pub async fn get_totals(
    State(state): State<AppState>,
    Query(pending): Query<PendingMinutesQuery>,
) -> Json<TotalsResponse> {
    let desk = state.desk.lock().await;
    Json(TotalsResponse {
        date: desk.stats.data().last_reset_date.clone(),
        totals: today_totals(&desk.stats, pending.inbound, pending.outbound),
    })
}

pub async fn export_stats(
    State(state): State<AppState>,
    Path(window): Path<Window>,
) -> Result<impl IntoResponse, AppError> {
    let export = state.desk.lock().await.export(window)?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", export.filename),
            ),
        ],
        export.content,
    ))
}

pub async fn log_call(
    State(state): State<AppState>,
    Json(payload): Json<LogCallBody>,
) -> Result<Json<LogCallResponse>, AppError> {
    let request = payload.into_request();
    let mut desk = state.desk.lock().await;
    let logged = desk.log_call(&request)?;
    let today = desk.stats_for(&logged.call.category_stat_key, Window::Today);
    let undo_seconds = desk.undo.window_secs();

    // Swapped while the desk is still locked.
    state
        .restart_countdown(logged.undo_generation, undo_seconds)
        .await;
    drop(desk);

    Ok(Json(LogCallResponse {
        logged,
        today,
        undo_seconds,
    }))
}

pub async fn get_undo(State(state): State<AppState>) -> Json<UndoStatus> {
    let mut desk = state.desk.lock().await;
    let seconds_left = desk.undo.seconds_left();
    Json(UndoStatus {
        pending: desk.undo.pending().cloned(),
        seconds_left,
    })
}

pub async fn apply_undo(State(state): State<AppState>) -> Result<Json<UndoStatus>, AppError> {
    let mut desk = state.desk.lock().await;
    let undone = desk.undo_last_call()?;
    state.cancel_countdown().await;
    drop(desk);
    Ok(Json(UndoStatus {
        pending: Some(undone),
        seconds_left: None,
    }))
}

pub async fn list_custom_fields(State(state): State<AppState>) -> Json<Vec<CustomFieldView>> {
    let desk = state.desk.lock().await;
    Json(custom_field_views(&desk.custom_fields))
}

pub async fn add_custom_field(
    State(state): State<AppState>,
    Json(payload): Json<NameRequest>,
) -> Result<(StatusCode, Json<Vec<CustomFieldView>>), AppError> {
    let mut desk = state.desk.lock().await;
    desk.custom_fields.add(&payload.name)?;
    Ok((StatusCode::CREATED, Json(custom_field_views(&desk.custom_fields))))
}

pub async fn delete_custom_field(
    State(state): State<AppState>,
    Path(index): Path<usize>,
    Query(query): Query<ConfirmQuery>,
) -> Result<StatusCode, AppError> {
    let mut desk = state.desk.lock().await;
    desk.delete_custom_field(index, query.confirm)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn summary(
    State(state): State<AppState>,
    Json(payload): Json<SummaryInput>,
) -> Json<SummaryResponse> {
    let desk = state.desk.lock().await;
    Json(SummaryResponse {
        summary: desk.summary(&payload),
    })
}

pub async fn get_stopwatch(State(state): State<AppState>) -> Json<StopwatchView> {
    let desk = state.desk.lock().await;
    Json(StopwatchView::of(&desk.stopwatch))
}

pub async fn start_stopwatch(State(state): State<AppState>) -> Json<StopwatchView> {
    let mut desk = state.desk.lock().await;
    desk.stopwatch.start();
    Json(StopwatchView::of(&desk.stopwatch))
}

pub async fn pause_stopwatch(State(state): State<AppState>) -> Json<StopwatchView> {
    let mut desk = state.desk.lock().await;
    desk.stopwatch.pause();
    Json(StopwatchView::of(&desk.stopwatch))
}

pub async fn reset_stopwatch(
    State(state): State<AppState>,
    Json(payload): Json<StopwatchResetRequest>,
) -> Result<Json<StopwatchView>, AppError> {
    let mut desk = state.desk.lock().await;
    desk.stopwatch.reset(&payload.name)?;
    Ok(Json(StopwatchView::of(&desk.stopwatch)))
}

pub async fn delete_stopwatch_entry(
    State(state): State<AppState>,
    Path(index): Path<usize>,
    Query(query): Query<ConfirmQuery>,
) -> Result<StatusCode, AppError> {
    let mut desk = state.desk.lock().await;
    desk.delete_stopwatch_entry(index, query.confirm)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn take_notices(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.desk.lock().await.take_notices())
}

fn custom_field_views(fields: &crate::custom_fields::CustomFields) -> Vec<CustomFieldView> {
    fields
        .fields()
        .iter()
        .enumerate()
        .map(|(index, field)| CustomFieldView {
            index,
            name: field.name.clone(),
        })
        .collect()
}
