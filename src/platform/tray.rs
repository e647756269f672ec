use tauri::menu::{Menu, MenuItem};
use tauri::tray::{MouseButton, MouseButtonState, TrayIconBuilder, TrayIconEvent};
use tauri::AppHandle;
use tracing::warn;

use crate::config::{APP_NAME, HOTKEY_LABEL, TRAY_ID};
use crate::error::{AppError, AppResult};
use crate::services::control::ControlHandle;
use crate::services::lifecycle::{BackgroundService, LifecycleRequest};

const MENU_SHOW: &str = "show";
const MENU_QUIT: &str = "quit";

pub fn menu_request(id: &str) -> Option<LifecycleRequest> {
    match id {
        MENU_SHOW => Some(LifecycleRequest::Show),
        MENU_QUIT => Some(LifecycleRequest::Quit),
        _ => None,
    }
}

fn forward(control: &ControlHandle, request: LifecycleRequest) {
    if let Err(err) = control.request(request) {
        warn!("tray request {request:?} dropped: {err}");
    }
}

/// Builds the tray icon. A left click toggles the window; the menu offers Show and Quit.
pub fn build_tray(app: &AppHandle, control: ControlHandle) -> AppResult<TrayService> {
    let icon = app
        .default_window_icon()
        .cloned()
        .ok_or_else(|| AppError::Internal("no default window icon for tray".to_string()))?;

    let show = MenuItem::with_id(app, MENU_SHOW, "Show", true, None::<&str>)?;
    let quit = MenuItem::with_id(app, MENU_QUIT, "Quit", true, None::<&str>)?;
    let menu = Menu::with_items(app, &[&show, &quit])?;

    let menu_control = control.clone();
    TrayIconBuilder::with_id(TRAY_ID)
        .icon(icon)
        .tooltip(format!("{APP_NAME} ({HOTKEY_LABEL})"))
        .menu(&menu)
        .show_menu_on_left_click(false)
        .on_menu_event(move |_app, event| {
            if let Some(request) = menu_request(event.id().as_ref()) {
                forward(&menu_control, request);
            }
        })
        .on_tray_icon_event(move |_tray, event| {
            if let TrayIconEvent::Click {
                button: MouseButton::Left,
                button_state: MouseButtonState::Up,
                ..
            } = event
            {
                forward(&control, LifecycleRequest::Toggle);
            }
        })
        .build(app)?;

    Ok(TrayService { app: app.clone() })
}

pub struct TrayService {
    app: AppHandle,
}

impl BackgroundService for TrayService {
    fn name(&self) -> &'static str {
        "tray icon"
    }

    fn stop(&mut self) -> AppResult<()> {
        if self.app.remove_tray_by_id(TRAY_ID).is_none() {
            warn!("tray icon was already gone");
        }
        Ok(())
    }
}
