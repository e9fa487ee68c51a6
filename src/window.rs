//! Native window host.
//!
//! Opens a winit window, presents through [`GpuState`] and drives the engine
//! from redraw requests: the engine asks for a frame, the driver turns that
//! into `request_redraw`, and the redraw delivers the frame back.
//!
//! When the GPU cannot be initialized the engine is mounted without a canvas
//! and the window stays empty.

use std::sync::Arc;
use std::time::Instant;

use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::window::{Window, WindowId};

use crate::config::BackdropConfig;
use crate::engine::{Backdrop, MountOutcome};
use crate::error::HostError;
use crate::gpu::{GpuCanvas, GpuState};
use crate::input::InputTranslator;
use crate::scheduler::{FrameDriver, FrameToken};

/// Frame driver backed by the window's redraw requests.
#[derive(Debug, Default)]
pub struct RedrawDriver {
    window: Option<Arc<Window>>,
    pending: Option<FrameToken>,
}

impl RedrawDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&mut self, window: Arc<Window>) {
        if self.pending.is_some() {
            window.request_redraw();
        }
        self.window = Some(window);
    }

    /// Take the token for the frame being delivered.
    pub fn take_pending(&mut self) -> Option<FrameToken> {
        self.pending.take()
    }
}

impl FrameDriver for RedrawDriver {
    fn request_frame(&mut self, token: FrameToken) {
        self.pending = Some(token);
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        // winit cannot retract a redraw request; forgetting the token is enough.
        if self.pending == Some(token) {
            self.pending = None;
        }
    }
}

struct App {
    engine: Backdrop<GpuCanvas, RedrawDriver>,
    window: Option<Arc<Window>>,
    gpu: Option<GpuState>,
    input: InputTranslator,
    start: Instant,
    error: Option<HostError>,
}

impl App {
    fn new(config: BackdropConfig) -> Result<Self, HostError> {
        Ok(Self {
            engine: Backdrop::new(config, RedrawDriver::new())?,
            window: None,
            gpu: None,
            input: InputTranslator::new(1.0),
            start: Instant::now(),
            error: None,
        })
    }

    fn now_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(token) = self.engine.driver_mut().take_pending() {
            let now = self.now_ms();
            self.engine.frame(token, now);
        }

        let background = self.engine.config().background;
        let (Some(gpu), Some(canvas)) = (self.gpu.as_mut(), self.engine.canvas()) else {
            return;
        };
        match gpu.present(canvas, background) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => gpu.reconfigure(),
            Err(wgpu::SurfaceError::OutOfMemory) => {
                tracing::error!("GPU out of memory, exiting");
                self.engine.unmount();
                event_loop.exit();
            }
            Err(e) => tracing::warn!(error = ?e, "frame dropped"),
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = Window::default_attributes()
            .with_title("backdrop")
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                self.error = Some(e.into());
                event_loop.exit();
                return;
            }
        };

        let canvas = match pollster::block_on(GpuState::new(window.clone())) {
            Ok(gpu) => {
                self.gpu = Some(gpu);
                Some(GpuCanvas::new())
            }
            Err(e) => {
                tracing::warn!(error = %e, "GPU unavailable");
                None
            }
        };

        self.input = InputTranslator::new(window.scale_factor());
        let size = window.inner_size();
        self.input.resized(size.width, size.height);
        self.engine.driver_mut().attach(window.clone());
        self.window = Some(window);

        let outcome = self.engine.mount(canvas, self.input.metrics());
        if outcome != MountOutcome::Running {
            tracing::info!(?outcome, "background not animating");
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match &event {
            WindowEvent::CloseRequested => {
                self.engine.unmount();
                event_loop.exit();
                return;
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
                return;
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(*physical_size);
                }
            }
            _ => {}
        }

        if let Some(host_event) = self.input.translate(&event) {
            self.engine.handle_event(host_event);
        }
    }
}

/// Open a window and animate `config` until it is closed.
pub fn run(config: BackdropConfig) -> Result<(), HostError> {
    let event_loop = EventLoop::new()?;
    let mut app = App::new(config)?;
    event_loop.run_app(&mut app)?;
    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_tracks_latest_token() {
        let mut driver = RedrawDriver::new();
        let mut scheduler = crate::scheduler::Scheduler::new(ManualProbe(&mut driver));
        let token = scheduler.start();
        assert!(token.is_some());
        drop(scheduler);
        assert_eq!(driver.take_pending(), token);
        assert_eq!(driver.take_pending(), None);
    }

    #[test]
    fn test_cancel_forgets_matching_token() {
        let mut driver = RedrawDriver::new();
        let mut scheduler = crate::scheduler::Scheduler::new(ManualProbe(&mut driver));
        scheduler.start();
        scheduler.pause();
        drop(scheduler);
        assert_eq!(driver.take_pending(), None);
    }

    /// Lets a test keep ownership of the driver it hands to a scheduler.
    struct ManualProbe<'a>(&'a mut RedrawDriver);

    impl FrameDriver for ManualProbe<'_> {
        fn request_frame(&mut self, token: FrameToken) {
            self.0.request_frame(token);
        }

        fn cancel_frame(&mut self, token: FrameToken) {
            self.0.cancel_frame(token);
        }
    }
}
