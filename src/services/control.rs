use std::thread::{self, JoinHandle};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info, trace, warn};

use crate::clipboard::{ClipboardService, SystemClipboard};
use crate::config::AppConfig;
use crate::db::ClipStore;
use crate::error::{AppError, AppResult};
use crate::services::lifecycle::{LifecycleController, LifecycleRequest, Transition, WindowSurface};
use crate::services::poller::{ClipboardPoller, PollOutcome};

#[derive(Debug)]
pub enum ControlMessage {
    Lifecycle(LifecycleRequest),
    Copy {
        content: String,
        reply: Option<oneshot::Sender<AppResult<()>>>,
    },
}

/// Sending side of the control loop. Background contexts (hotkey, tray, window events, commands)
/// only ever talk to the loop through this handle.
#[derive(Debug, Clone)]
pub struct ControlHandle {
    tx: mpsc::UnboundedSender<ControlMessage>,
}

impl ControlHandle {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ControlMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn send(&self, message: ControlMessage) -> AppResult<()> {
        self.tx.send(message).map_err(|_| AppError::ControlStopped)
    }

    pub fn request(&self, request: LifecycleRequest) -> AppResult<()> {
        self.send(ControlMessage::Lifecycle(request))
    }

    /// Decides what to do with a process exit request. An exit not started by the app itself
    /// (`code` is `None`) is turned into a quit request so background services are stopped first;
    /// returns `true` when the caller should hold the exit until the control loop ends it.
    pub fn intercept_exit(&self, code: Option<i32>) -> bool {
        if code.is_some() {
            return false;
        }
        match self.request(LifecycleRequest::Quit) {
            Ok(()) => true,
            Err(err) => {
                debug!("exit proceeds without control loop: {err}");
                false
            }
        }
    }

    pub async fn copy(&self, content: String) -> AppResult<()> {
        let (reply, response) = oneshot::channel();
        self.send(ControlMessage::Copy {
            content,
            reply: Some(reply),
        })?;
        response.await.map_err(|_| AppError::ControlStopped)?
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopFlow {
    Continue,
    Stop,
}

/// Single owner of the poller, the clipboard and the lifecycle controller.
pub struct ControlLoop<C: ClipboardService, W: WindowSurface> {
    store: ClipStore,
    poller: ClipboardPoller<C>,
    lifecycle: LifecycleController<W>,
    on_clips_changed: Box<dyn FnMut() + Send>,
    poll_interval: Duration,
    topmost_pulse: Duration,
    topmost_release_at: Option<Instant>,
}

impl<C: ClipboardService, W: WindowSurface> ControlLoop<C, W> {
    pub fn new(
        store: ClipStore,
        poller: ClipboardPoller<C>,
        lifecycle: LifecycleController<W>,
        config: &AppConfig,
        on_clips_changed: Box<dyn FnMut() + Send>,
    ) -> Self {
        Self {
            store,
            poller,
            lifecycle,
            on_clips_changed,
            poll_interval: config.poll_interval,
            topmost_pulse: config.topmost_pulse,
            topmost_release_at: None,
        }
    }

    #[cfg(test)]
    pub fn lifecycle(&self) -> &LifecycleController<W> {
        &self.lifecycle
    }

    #[cfg(test)]
    pub fn poller_mut(&mut self) -> &mut ClipboardPoller<C> {
        &mut self.poller
    }

    #[cfg(test)]
    pub fn topmost_release_at(&self) -> Option<Instant> {
        self.topmost_release_at
    }

    /// One poll cycle.
    pub fn tick(&mut self) -> PollOutcome {
        let outcome = self.poller.poll(&self.store);
        if let PollOutcome::Stored(content) = &outcome {
            trace!(chars = content.chars().count(), "announcing new clip");
            (self.on_clips_changed)();
        }
        outcome
    }

    pub fn dispatch(&mut self, message: ControlMessage) -> LoopFlow {
        match message {
            ControlMessage::Lifecycle(request) => match self.lifecycle.handle(request) {
                Transition::Shown => {
                    self.topmost_release_at = Some(Instant::now() + self.topmost_pulse);
                    LoopFlow::Continue
                }
                Transition::Quit => {
                    self.topmost_release_at = None;
                    LoopFlow::Stop
                }
                Transition::Hidden | Transition::Ignored => LoopFlow::Continue,
            },
            ControlMessage::Copy { content, reply } => {
                let result = self.poller.copy(&content).map_err(AppError::from);
                if let Err(err) = &result {
                    warn!("copy to clipboard failed: {err}");
                }
                if let Some(reply) = reply {
                    let _ = reply.send(result);
                }
                LoopFlow::Continue
            }
        }
    }

    pub fn release_topmost(&mut self) {
        self.topmost_release_at = None;
        self.lifecycle.release_topmost();
    }

    pub async fn run(mut self, mut rx: mpsc::UnboundedReceiver<ControlMessage>) {
        let mut ticker = time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            interval_ms = self.poll_interval.as_millis() as u64,
            "control loop started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick();
                }
                _ = sleep_until(self.topmost_release_at) => {
                    self.release_topmost();
                }
                message = rx.recv() => match message {
                    Some(message) => {
                        if self.dispatch(message) == LoopFlow::Stop {
                            break;
                        }
                    }
                    None => {
                        info!("control channel closed");
                        break;
                    }
                },
            }
        }

        info!("control loop stopped");
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Runs the control loop on its own thread with a current-thread runtime. The system clipboard is
/// opened on that thread and never leaves it.
pub fn spawn_control_thread<W>(
    store: ClipStore,
    lifecycle: LifecycleController<W>,
    config: AppConfig,
    on_clips_changed: Box<dyn FnMut() + Send>,
    rx: mpsc::UnboundedReceiver<ControlMessage>,
) -> std::io::Result<JoinHandle<()>>
where
    W: WindowSurface + Send + 'static,
{
    thread::Builder::new()
        .name("clipvault-control".to_string())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()
            {
                Ok(runtime) => runtime,
                Err(err) => {
                    error!("control runtime init failed: {err}");
                    return;
                }
            };

            let poller = ClipboardPoller::new(SystemClipboard::new());
            let control = ControlLoop::new(store, poller, lifecycle, &config, on_clips_changed);
            runtime.block_on(control.run(rx));
        })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    use crate::services::lifecycle::tests::{services, FakeWindow};
    use crate::services::lifecycle::Visibility;
    use crate::services::poller::tests::{remove_store, temp_store, ScriptedClipboard};

    use super::*;

    type TestLoop = ControlLoop<ScriptedClipboard, FakeWindow>;

    /// Window whose stacking state stays observable after the loop takes ownership.
    #[derive(Default)]
    struct SharedWindow {
        visible: Arc<AtomicBool>,
        on_top: Arc<AtomicBool>,
        on_top_sets: Arc<AtomicUsize>,
    }

    impl WindowSurface for SharedWindow {
        fn is_visible(&self) -> bool {
            self.visible.load(Ordering::SeqCst)
        }

        fn reveal(&self) -> AppResult<()> {
            self.visible.store(true, Ordering::SeqCst);
            Ok(())
        }

        fn withdraw(&self) -> AppResult<()> {
            self.visible.store(false, Ordering::SeqCst);
            Ok(())
        }

        fn set_always_on_top(&self, on_top: bool) -> AppResult<()> {
            self.on_top.store(on_top, Ordering::SeqCst);
            self.on_top_sets.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn focus_search(&self) -> AppResult<()> {
            Ok(())
        }

        fn exit(&self) {}
    }

    fn build(store: ClipStore) -> (TestLoop, Arc<AtomicUsize>) {
        let changes = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&changes);
        let (list, _, _) = services();
        let control = ControlLoop::new(
            store,
            ClipboardPoller::new(ScriptedClipboard::default()),
            LifecycleController::new(FakeWindow::default(), list),
            &AppConfig::default(),
            Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );
        (control, changes)
    }

    fn set_clipboard(control: &mut TestLoop, text: &str) {
        control.poller_mut().clipboard_mut().current = Some(text.to_string());
    }

    #[test]
    fn tick_notifies_only_for_new_clips() {
        let (store, path) = temp_store();
        let (mut control, changes) = build(store.clone());

        set_clipboard(&mut control, "hello");
        assert_eq!(control.tick(), PollOutcome::Stored("hello".to_string()));
        assert_eq!(control.tick(), PollOutcome::Unchanged);
        assert_eq!(changes.load(Ordering::SeqCst), 1);
        assert_eq!(store.count().expect("count"), 1);

        remove_store(&path);
    }

    #[test]
    fn show_schedules_topmost_release() {
        let (store, path) = temp_store();
        let (mut control, _) = build(store);

        let flow = control.dispatch(ControlMessage::Lifecycle(LifecycleRequest::Toggle));
        assert_eq!(flow, LoopFlow::Continue);
        assert_eq!(control.lifecycle().state(), Visibility::Visible);
        assert!(control.topmost_release_at().is_some());
        assert!(control.lifecycle().window().on_top.get());

        control.release_topmost();
        assert!(control.topmost_release_at().is_none());
        assert!(!control.lifecycle().window().on_top.get());

        control.dispatch(ControlMessage::Lifecycle(LifecycleRequest::Toggle));
        assert_eq!(control.lifecycle().state(), Visibility::Hidden);

        remove_store(&path);
    }

    #[test]
    fn polling_continues_while_hidden() {
        let (store, path) = temp_store();
        let (mut control, _) = build(store.clone());

        control.dispatch(ControlMessage::Lifecycle(LifecycleRequest::Close));
        assert_eq!(control.lifecycle().state(), Visibility::Hidden);
        set_clipboard(&mut control, "captured while hidden");
        assert!(matches!(control.tick(), PollOutcome::Stored(_)));
        assert_eq!(store.count().expect("count"), 1);

        remove_store(&path);
    }

    #[test]
    fn copy_request_is_not_recaptured() {
        let (store, path) = temp_store();
        let (mut control, changes) = build(store.clone());

        let (reply, mut response) = oneshot::channel();
        control.dispatch(ControlMessage::Copy {
            content: "from history".to_string(),
            reply: Some(reply),
        });
        assert!(matches!(response.try_recv(), Ok(Ok(()))));
        assert_eq!(control.tick(), PollOutcome::Unchanged);
        assert_eq!(changes.load(Ordering::SeqCst), 0);

        remove_store(&path);
    }

    #[test]
    fn quit_stops_the_loop() {
        let (store, path) = temp_store();
        let (mut control, _) = build(store);

        let flow = control.dispatch(ControlMessage::Lifecycle(LifecycleRequest::Quit));
        assert_eq!(flow, LoopFlow::Stop);
        assert_eq!(control.lifecycle().window().exits.get(), 1);

        remove_store(&path);
    }

    #[tokio::test]
    async fn run_drains_messages_until_quit() {
        let (store, path) = temp_store();
        let (list, hotkey, tray) = services();
        let control = ControlLoop::new(
            store,
            ClipboardPoller::new(ScriptedClipboard {
                current: Some("seen at startup".to_string()),
                ..ScriptedClipboard::default()
            }),
            LifecycleController::new(FakeWindow::default(), list),
            &AppConfig::default(),
            Box::new(|| {}),
        );

        let (handle, rx) = ControlHandle::channel();
        handle
            .request(LifecycleRequest::Toggle)
            .expect("queue toggle");
        let (reply, response) = oneshot::channel();
        handle
            .send(ControlMessage::Copy {
                content: "copied".to_string(),
                reply: Some(reply),
            })
            .expect("queue copy");
        handle.request(LifecycleRequest::Quit).expect("queue quit");
        handle.request(LifecycleRequest::Quit).expect("queue second quit");

        control.run(rx).await;

        assert!(matches!(response.await, Ok(Ok(()))));
        assert_eq!(hotkey.load(Ordering::SeqCst), 1);
        assert_eq!(tray.load(Ordering::SeqCst), 1);
        assert!(handle.request(LifecycleRequest::Toggle).is_err());

        remove_store(&path);
    }

    #[tokio::test(start_paused = true)]
    async fn run_releases_topmost_after_the_pulse() {
        let (store, path) = temp_store();
        let window = SharedWindow::default();
        let on_top = Arc::clone(&window.on_top);
        let on_top_sets = Arc::clone(&window.on_top_sets);
        let control = ControlLoop::new(
            store,
            ClipboardPoller::new(ScriptedClipboard::default()),
            LifecycleController::new(window, Vec::new()),
            &AppConfig::default(),
            Box::new(|| {}),
        );

        let (handle, rx) = ControlHandle::channel();
        let driver = async {
            handle.request(LifecycleRequest::Toggle).expect("queue toggle");
            time::sleep(Duration::from_millis(10)).await;
            let during_pulse = on_top.load(Ordering::SeqCst);
            time::sleep(Duration::from_millis(100)).await;
            let after_pulse = on_top.load(Ordering::SeqCst);
            handle.request(LifecycleRequest::Quit).expect("queue quit");
            (during_pulse, after_pulse)
        };

        let ((), (during_pulse, after_pulse)) = tokio::join!(control.run(rx), driver);
        assert!(during_pulse);
        assert!(!after_pulse);
        assert_eq!(on_top_sets.load(Ordering::SeqCst), 2);

        remove_store(&path);
    }

    #[test]
    fn app_initiated_exit_is_not_intercepted() {
        let (handle, mut rx) = ControlHandle::channel();
        assert!(!handle.intercept_exit(Some(0)));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn external_exit_becomes_a_quit_request() {
        let (handle, mut rx) = ControlHandle::channel();
        assert!(handle.intercept_exit(None));
        assert!(matches!(
            rx.try_recv(),
            Ok(ControlMessage::Lifecycle(LifecycleRequest::Quit))
        ));

        drop(rx);
        assert!(!handle.intercept_exit(None));
    }

    #[tokio::test]
    async fn copy_reports_stopped_loop() {
        let (handle, rx) = ControlHandle::channel();
        drop(rx);
        let err = handle.copy("late".to_string()).await.expect_err("loop is gone");
        assert!(matches!(err, AppError::ControlStopped));
    }
}
