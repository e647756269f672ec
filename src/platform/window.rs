use tauri::{AppHandle, Emitter, Monitor, PhysicalPosition, WebviewWindow};
use tracing::debug;

use crate::config::Placement;
use crate::error::AppResult;
use crate::platform::placement::{self, Rect};
use crate::services::lifecycle::WindowSurface;

/// Emitted after the window is shown so the frontend can focus its search field and refetch.
pub const WINDOW_SHOWN_EVENT: &str = "window://shown";

pub struct TauriWindow {
    app: AppHandle,
    window: WebviewWindow,
    placement: Placement,
}

impl TauriWindow {
    pub fn new(app: AppHandle, window: WebviewWindow, placement: Placement) -> Self {
        Self {
            app,
            window,
            placement,
        }
    }

    fn move_near_cursor(&self) -> AppResult<()> {
        let cursor = self.window.cursor_position()?;
        let cursor = PhysicalPosition::new(cursor.x.round() as i32, cursor.y.round() as i32);
        let size = self.window.outer_size()?;

        let monitors: Vec<Rect> = self
            .window
            .available_monitors()?
            .iter()
            .map(monitor_rect)
            .collect();

        let target = match placement::monitor_containing(cursor, &monitors) {
            Some(index) => monitors[index],
            None => match self.window.current_monitor()? {
                Some(monitor) => monitor_rect(&monitor),
                None => {
                    debug!("no monitor under cursor, keeping window position");
                    return Ok(());
                }
            },
        };

        let position = placement::near_cursor(cursor, size, target);
        self.window.set_position(position)?;
        Ok(())
    }
}

fn monitor_rect(monitor: &Monitor) -> Rect {
    let origin = monitor.position();
    let size = monitor.size();
    Rect::new(origin.x, origin.y, size.width, size.height)
}

impl WindowSurface for TauriWindow {
    fn is_visible(&self) -> bool {
        let visible = self.window.is_visible().unwrap_or_default();
        let minimized = self.window.is_minimized().unwrap_or_default();
        visible && !minimized
    }

    fn reveal(&self) -> AppResult<()> {
        self.window.unminimize()?;
        if self.placement == Placement::NearCursor {
            if let Err(err) = self.move_near_cursor() {
                debug!("window placement skipped: {err}");
            }
        }
        self.window.show()?;
        Ok(())
    }

    fn withdraw(&self) -> AppResult<()> {
        self.window.hide()?;
        Ok(())
    }

    fn set_always_on_top(&self, on_top: bool) -> AppResult<()> {
        self.window.set_always_on_top(on_top)?;
        Ok(())
    }

    fn focus_search(&self) -> AppResult<()> {
        self.window.set_focus()?;
        self.window.emit(WINDOW_SHOWN_EVENT, ())?;
        Ok(())
    }

    fn exit(&self) {
        self.app.exit(0);
    }
}
