use serde::Serialize;
use tauri::{AppHandle, Emitter, State};
use tracing::{debug, warn};

use crate::db::{Clip, ClipStore, RenameOutcome};
use crate::services::control::ControlHandle;
use crate::services::lifecycle::LifecycleRequest;
use crate::utils::display::{self, Alignment, PREVIEW_CHARS};

/// Tells the frontend to refetch the list with its current filter.
pub const CLIPS_CHANGED_EVENT: &str = "clips://changed";

pub struct AppState {
    pub store: ClipStore,
    pub control: ControlHandle,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipView {
    pub content: String,
    pub is_favorite: bool,
    pub preview: String,
    pub alignment: Alignment,
    pub needs_reshaping: bool,
}

impl From<Clip> for ClipView {
    fn from(clip: Clip) -> Self {
        let classification = display::classify(&clip.content);
        Self {
            preview: display::preview(&clip.content, PREVIEW_CHARS),
            alignment: classification.alignment,
            needs_reshaping: classification.needs_reshaping,
            is_favorite: clip.is_favorite,
            content: clip.content,
        }
    }
}

pub fn notify_clips_changed(app: &AppHandle) {
    if let Err(err) = app.emit(CLIPS_CHANGED_EVENT, ()) {
        warn!("failed to emit {CLIPS_CHANGED_EVENT}: {err}");
    }
}

#[tauri::command]
pub fn list_clips(state: State<'_, AppState>, query: Option<String>) -> Result<Vec<ClipView>, String> {
    let clips = state
        .store
        .fetch(query.as_deref())
        .map_err(|err| err.to_string())?;
    Ok(clips.into_iter().map(ClipView::from).collect())
}

#[tauri::command]
pub async fn copy_clip(state: State<'_, AppState>, content: String) -> Result<(), String> {
    state
        .control
        .copy(content)
        .await
        .map_err(|err| err.to_string())
}

#[tauri::command]
pub fn toggle_pin(
    app: AppHandle,
    state: State<'_, AppState>,
    content: String,
) -> Result<Option<bool>, String> {
    let favorite = state
        .store
        .toggle_favorite(&content)
        .map_err(|err| err.to_string())?;
    if favorite.is_some() {
        notify_clips_changed(&app);
    }
    Ok(favorite)
}

#[tauri::command]
pub fn delete_clip(app: AppHandle, state: State<'_, AppState>, content: String) -> Result<bool, String> {
    let deleted = state
        .store
        .delete(&content)
        .map_err(|err| err.to_string())?;
    if deleted {
        notify_clips_changed(&app);
    }
    Ok(deleted)
}

#[tauri::command]
pub fn rename_clip(
    app: AppHandle,
    state: State<'_, AppState>,
    old: String,
    new: String,
) -> Result<RenameOutcome, String> {
    let outcome = state
        .store
        .update_content(&old, &new)
        .map_err(|err| err.to_string())?;
    if !outcome.is_success() {
        debug!(?outcome, "rename rejected");
    } else if outcome == RenameOutcome::Renamed {
        notify_clips_changed(&app);
    }
    Ok(outcome)
}

#[tauri::command]
pub fn toggle_visibility(state: State<'_, AppState>) -> Result<(), String> {
    state
        .control
        .request(LifecycleRequest::Toggle)
        .map_err(|err| err.to_string())
}

#[tauri::command]
pub fn hide_window(state: State<'_, AppState>) -> Result<(), String> {
    state
        .control
        .request(LifecycleRequest::Close)
        .map_err(|err| err.to_string())
}

#[tauri::command]
pub fn quit_app(state: State<'_, AppState>) -> Result<(), String> {
    state
        .control
        .request(LifecycleRequest::Quit)
        .map_err(|err| err.to_string())
}
