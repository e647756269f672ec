use tracing::{info, warn};

use crate::error::AppResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Hidden,
    Visible,
    /// Terminal.
    Quitting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleRequest {
    Toggle,
    Show,
    /// The window manager asked to close the window.
    Close,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Shown,
    Hidden,
    Quit,
    /// The controller is already quitting.
    Ignored,
}

/// The window operations the controller drives.
pub trait WindowSurface {
    /// Actual on-screen state, not a cached flag.
    fn is_visible(&self) -> bool;
    /// Map, position and raise the window.
    fn reveal(&self) -> AppResult<()>;
    fn withdraw(&self) -> AppResult<()>;
    fn set_always_on_top(&self, on_top: bool) -> AppResult<()>;
    fn focus_search(&self) -> AppResult<()>;
    /// Ends the process event loop.
    fn exit(&self);
}

/// A background context that must be stopped before the process exits.
pub trait BackgroundService: Send {
    fn name(&self) -> &'static str;
    fn stop(&mut self) -> AppResult<()>;
}

pub struct LifecycleController<W: WindowSurface> {
    window: W,
    state: Visibility,
    services: Vec<Box<dyn BackgroundService>>,
}

impl<W: WindowSurface> LifecycleController<W> {
    pub fn new(window: W, services: Vec<Box<dyn BackgroundService>>) -> Self {
        let state = if window.is_visible() {
            Visibility::Visible
        } else {
            Visibility::Hidden
        };
        Self {
            window,
            state,
            services,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> Visibility {
        self.state
    }

    #[cfg(test)]
    pub fn window(&self) -> &W {
        &self.window
    }

    pub fn handle(&mut self, request: LifecycleRequest) -> Transition {
        if self.state == Visibility::Quitting {
            return Transition::Ignored;
        }

        match request {
            LifecycleRequest::Toggle => {
                if self.window.is_visible() {
                    self.hide()
                } else {
                    self.show()
                }
            }
            LifecycleRequest::Show => self.show(),
            LifecycleRequest::Close => self.hide(),
            LifecycleRequest::Quit => self.quit(),
        }
    }

    /// Ends the transient always-on-top emphasis given on show.
    pub fn release_topmost(&mut self) {
        if self.state == Visibility::Quitting {
            return;
        }
        if let Err(err) = self.window.set_always_on_top(false) {
            warn!("failed to drop always-on-top: {err}");
        }
    }

    fn show(&mut self) -> Transition {
        if let Err(err) = self.window.reveal() {
            warn!("failed to show window: {err}");
        }
        if let Err(err) = self.window.set_always_on_top(true) {
            warn!("failed to raise window: {err}");
        }
        if let Err(err) = self.window.focus_search() {
            warn!("failed to focus search field: {err}");
        }
        self.state = Visibility::Visible;
        Transition::Shown
    }

    fn hide(&mut self) -> Transition {
        if let Err(err) = self.window.withdraw() {
            warn!("failed to hide window: {err}");
        }
        self.state = Visibility::Hidden;
        Transition::Hidden
    }

    fn quit(&mut self) -> Transition {
        self.state = Visibility::Quitting;
        for mut service in self.services.drain(..) {
            match service.stop() {
                Ok(()) => info!("stopped {}", service.name()),
                Err(err) => warn!("failed to stop {}: {err}", service.name()),
            }
        }
        self.window.exit();
        Transition::Quit
    }
}
