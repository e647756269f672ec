use tauri::AppHandle;
use tauri_plugin_global_shortcut::{Code, GlobalShortcutExt, Modifiers, Shortcut, ShortcutState};
use tracing::{info, warn};

use crate::config::HOTKEY_LABEL;
use crate::error::{AppError, AppResult};
use crate::services::control::ControlHandle;
use crate::services::lifecycle::{BackgroundService, LifecycleRequest};

pub fn toggle_shortcut() -> Shortcut {
    Shortcut::new(Some(Modifiers::CONTROL), Code::Space)
}

/// Plugin handler: every press of the toggle shortcut becomes a toggle request.
pub fn on_shortcut(control: &ControlHandle, shortcut: &Shortcut, state: ShortcutState) {
    if state != ShortcutState::Pressed || *shortcut != toggle_shortcut() {
        return;
    }
    if let Err(err) = control.request(LifecycleRequest::Toggle) {
        warn!("hotkey toggle dropped: {err}");
    }
}

pub fn register_hotkey(app: &AppHandle) -> AppResult<HotkeyService> {
    app.global_shortcut()
        .register(toggle_shortcut())
        .map_err(|err| AppError::Internal(format!("register {HOTKEY_LABEL}: {err}")))?;
    info!("registered {HOTKEY_LABEL}");
    Ok(HotkeyService { app: app.clone() })
}

pub struct HotkeyService {
    app: AppHandle,
}

impl BackgroundService for HotkeyService {
    fn name(&self) -> &'static str {
        "hotkey listener"
    }

    fn stop(&mut self) -> AppResult<()> {
        self.app
            .global_shortcut()
            .unregister_all()
            .map_err(|err| AppError::Internal(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_presses_of_the_toggle_shortcut_toggle() {
        let (control, mut rx) = ControlHandle::channel();

        on_shortcut(&control, &toggle_shortcut(), ShortcutState::Released);
        on_shortcut(
            &control,
            &Shortcut::new(Some(Modifiers::SHIFT), Code::KeyV),
            ShortcutState::Pressed,
        );
        assert!(rx.try_recv().is_err());

        on_shortcut(&control, &toggle_shortcut(), ShortcutState::Pressed);
        assert!(matches!(
            rx.try_recv(),
            Ok(crate::services::control::ControlMessage::Lifecycle(
                LifecycleRequest::Toggle
            ))
        ));
    }
}
