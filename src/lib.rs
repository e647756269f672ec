mod clipboard;
mod commands;
mod config;
mod db;
mod error;
mod platform;
mod services;
mod utils;

use std::path::PathBuf;

use commands::AppState;
use config::{AppConfig, DATABASE_FILE, MAIN_WINDOW};
use db::ClipStore;
use error::{AppError, AppResult};
use platform::window::TauriWindow;
use services::control::{spawn_control_thread, ControlHandle};
use services::lifecycle::{BackgroundService, LifecycleController, LifecycleRequest};
use tauri::{App, Manager, RunEvent, WindowEvent};
use tauri_plugin_autostart::{MacosLauncher, ManagerExt as AutostartManagerExt};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn data_dir(app: &App, config: &AppConfig) -> AppResult<PathBuf> {
    match &config.data_dir {
        Some(dir) => Ok(dir.clone()),
        None => Ok(app.path().app_data_dir()?),
    }
}

fn open_store(path: PathBuf) -> AppResult<ClipStore> {
    let store = ClipStore::new(&path)?;
    let version = store.migrate()?;
    info!(path = %path.display(), schema = version, "clip store ready");
    Ok(store)
}

fn start_services(app: &App, control: &ControlHandle) -> Vec<Box<dyn BackgroundService>> {
    let mut services: Vec<Box<dyn BackgroundService>> = Vec::new();

    match platform::hotkey::register_hotkey(app.handle()) {
        Ok(hotkey) => services.push(Box::new(hotkey)),
        Err(err) => warn!("global hotkey unavailable: {err}"),
    }

    match platform::tray::build_tray(app.handle(), control.clone()) {
        Ok(tray) => services.push(Box::new(tray)),
        Err(err) => warn!("tray icon unavailable: {err}"),
    }

    let names: Vec<&str> = services.iter().map(|service| service.name()).collect();
    info!("background services up: {names:?}");
    services
}

pub fn run() {
    init_logging();

    let config = AppConfig::from_env();
    let (control, control_rx) = ControlHandle::channel();
    let hotkey_control = control.clone();
    let close_control = control.clone();
    let exit_control = control.clone();

    let app_builder = tauri::Builder::default()
        .plugin(tauri_plugin_autostart::init(
            MacosLauncher::LaunchAgent,
            None::<Vec<&'static str>>,
        ))
        .plugin(
            tauri_plugin_global_shortcut::Builder::new()
                .with_handler(move |_app, shortcut, event| {
                    platform::hotkey::on_shortcut(&hotkey_control, shortcut, event.state);
                })
                .build(),
        )
        .setup(move |app| {
            #[cfg(target_os = "macos")]
            app.set_activation_policy(tauri::ActivationPolicy::Accessory);

            let db_path = data_dir(app, &config)?.join(DATABASE_FILE);
            let store = match open_store(db_path) {
                Ok(store) => store,
                Err(err) => {
                    error!("failed to open clip store: {err}");
                    return Err(err.into());
                }
            };
            match store.count() {
                Ok(count) => info!("{count} clips in history"),
                Err(err) => warn!("failed to count clips: {err}"),
            }

            let services = start_services(app, &control);

            if let Err(err) = app.autolaunch().enable() {
                warn!("failed to enable autostart: {err}");
            }

            let window = app
                .get_webview_window(MAIN_WINDOW)
                .ok_or_else(|| AppError::Internal(format!("missing window `{MAIN_WINDOW}`")))?;
            let surface = TauriWindow::new(app.handle().clone(), window, config.placement);
            let lifecycle = LifecycleController::new(surface, services);

            let handle = app.handle().clone();
            spawn_control_thread(
                store.clone(),
                lifecycle,
                config.clone(),
                Box::new(move || commands::notify_clips_changed(&handle)),
                control_rx,
            )?;

            app.manage(AppState {
                store,
                control: control.clone(),
            });

            Ok(())
        })
        .on_window_event(move |window, event| {
            if let WindowEvent::CloseRequested { api, .. } = event {
                if window.label() != MAIN_WINDOW {
                    return;
                }
                api.prevent_close();
                if let Err(err) = close_control.request(LifecycleRequest::Close) {
                    warn!("close request dropped: {err}");
                }
            }
        })
        .invoke_handler(tauri::generate_handler![
            commands::list_clips,
            commands::copy_clip,
            commands::toggle_pin,
            commands::delete_clip,
            commands::rename_clip,
            commands::toggle_visibility,
            commands::hide_window,
            commands::quit_app
        ]);

    let app = match app_builder.build(tauri::generate_context!()) {
        Ok(app) => app,
        Err(err) => {
            error!("error while building tauri application: {err}");
            return;
        }
    };

    app.run(move |_app, event| {
        if let RunEvent::ExitRequested { code, api, .. } = event {
            if exit_control.intercept_exit(code) {
                api.prevent_exit();
            }
        }
    });
}
