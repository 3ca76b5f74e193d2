use crate::errors::{AppError, TrackerError};
use crate::models::{Preferences, RefreshResponse, ToggleRequest, ToggleResponse};
use crate::remote::FetchRange;
use crate::render::Grid;
use crate::state::AppState;
use crate::static_files;
use crate::transfer::{self, EXPORT_FILE_NAME};
use crate::ui::render_index;
use crate::window::{CalendarDay, DateWindow};
use axum::{
    body::Bytes,
    extract::State,
    http::{header, Uri},
    response::{Html, IntoResponse, Response},
    Json,
};
use chrono::Local;
use tracing::info;

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let tracker = state.tracker.lock().await;
    let grid = tracker.grid(today());
    Html(render_index(
        &state.config.title,
        &grid,
        tracker.show_week_separators(),
        state.calendar.is_some(),
    ))
}

pub async fn get_grid(State(state): State<AppState>) -> Json<Grid> {
    let tracker = state.tracker.lock().await;
    Json(tracker.grid(today()))
}

pub async fn toggle(
    State(state): State<AppState>,
    Json(payload): Json<ToggleRequest>,
) -> Result<Json<ToggleResponse>, AppError> {
    let date: CalendarDay = payload.date.parse()?;

    let mut tracker = state.tracker.lock().await;
    let mut grid = tracker.grid(today());
    let cell = tracker.toggle(date, &mut grid).await?;

    Ok(Json(ToggleResponse {
        date,
        done: tracker.done().contains(date),
        cell,
        summary: grid.summary,
    }))
}

pub async fn export(State(state): State<AppState>) -> Result<Response, AppError> {
    let tracker = state.tracker.lock().await;
    let body = transfer::export_json(tracker.done())?;
    let disposition = format!("attachment; filename=\"{EXPORT_FILE_NAME}\"");

    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

pub async fn import(State(state): State<AppState>, body: Bytes) -> Result<Json<Grid>, AppError> {
    // Validate before locking so a rejected document cannot touch state.
    let days = transfer::parse_import(&body)?;

    let mut tracker = state.tracker.lock().await;
    let mut grid = tracker.grid(today());
    tracker.import(days, &mut grid).await?;
    info!("imported {} done day(s)", tracker.done().len());

    Ok(Json(grid))
}

pub async fn refresh(State(state): State<AppState>) -> Result<Json<RefreshResponse>, AppError> {
    if state.calendar.is_none() {
        return Err(AppError::bad_request("no calendar source configured"));
    }

    let added = merge_remote(&state).await?;
    let tracker = state.tracker.lock().await;
    Ok(Json(RefreshResponse {
        added,
        grid: tracker.grid(today()),
    }))
}

pub async fn get_preferences(State(state): State<AppState>) -> Json<Preferences> {
    let tracker = state.tracker.lock().await;
    Json(Preferences {
        show_week_separators: tracker.show_week_separators(),
    })
}

pub async fn set_preferences(
    State(state): State<AppState>,
    Json(payload): Json<Preferences>,
) -> Result<Json<Preferences>, AppError> {
    let mut tracker = state.tracker.lock().await;
    tracker.set_show_week_separators(payload.show_week_separators).await?;
    Ok(Json(payload))
}

pub async fn static_file(State(state): State<AppState>, uri: Uri) -> Response {
    static_files::serve(&state.config.static_root, uri.path()).await
}

/// Fetches every configured entity and unions the results into the done
/// set. The tracker lock is only taken once the fetches have settled.
pub async fn merge_remote(state: &AppState) -> Result<usize, TrackerError> {
    let (Some(client), Some(calendar)) = (&state.calendar, &state.config.calendar) else {
        return Ok(0);
    };

    let window = DateWindow::ending_at(today());
    let Some(range) = FetchRange::for_window(&window, &Local) else {
        return Ok(0);
    };
    let events = client.fetch_all(&calendar.entities, &range).await;

    let mut tracker = state.tracker.lock().await;
    let added = tracker.merge_remote(&events).await?;
    info!(
        "merged {added} new day(s) from {} event(s) across {} calendar(s)",
        events.len(),
        calendar.entities.len()
    );
    Ok(added)
}

fn today() -> CalendarDay {
    CalendarDay::from_date(Local::now().date_naive())
}
