//! Renderer: owns the display surface and drives the frame loop.
//!
//! Lifecycle: `Uninitialized → Running → Stopped`. [`Renderer::init`] opens
//! the backend and attaches the surface, [`Renderer::run`] loops until a quit
//! event or [`Renderer::stop`], and the backend is released on every exit
//! path out of `run`.
//!
//! Rebuilding the animation sequence never takes the loop down: a failed
//! build is reported and the session continues with no animation attached,
//! showing only the background until the next successful rebuild.

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{Receiver, TryRecvError};

use tracing::{debug, error, info, warn};

use crate::animation::Animation;
use crate::backend::{Backend, Clock, InputEvent};
use crate::config::ConfigStore;
use crate::error::{BackendError, BuildError, BuildValidationError};
use crate::surface::SharedSurface;
use crate::types::Geometry;
use crate::watcher::ReloadRequest;

/// Window title: library version and the version of the toolchain that
/// compiled it.
pub fn window_title() -> String {
    format!(
        "Dataflow Animation {} | Rust {}",
        env!("CARGO_PKG_VERSION"),
        env!("DATAFLOW_RUSTC_VERSION"),
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererState {
    Uninitialized,
    Running,
    Stopped,
}

pub struct Renderer<B: Backend> {
    backend: B,
    config: ConfigStore,
    animation: Option<Animation>,
    surface: Option<SharedSurface>,
    geometry: Option<Geometry>,
    clock: Option<B::Clock>,
    tick_duration: u64,
    running: bool,
    state: RendererState,
    reload_requests: Option<Receiver<ReloadRequest>>,
    reload_pending: bool,
    animation_source: Option<Box<dyn FnMut() -> Animation>>,
}

impl<B: Backend> Renderer<B> {
    pub fn new(backend: B, config: ConfigStore) -> Self {
        Renderer {
            backend,
            config,
            animation: None,
            surface: None,
            geometry: None,
            clock: None,
            tick_duration: 0,
            running: true,
            state: RendererState::Uninitialized,
            reload_requests: None,
            reload_pending: false,
            animation_source: None,
        }
    }

    /// Rebuild requests sent on this channel are drained once per frame.
    pub fn set_reload_receiver(&mut self, receiver: Receiver<ReloadRequest>) {
        self.reload_requests = Some(receiver);
    }

    /// On a reload request, attach a new animation from `source` instead of
    /// rebuilding the current one. Reloads keep working after a failed build
    /// has detached the animation.
    pub fn set_animation_source(&mut self, source: impl FnMut() -> Animation + 'static) {
        self.animation_source = Some(Box::new(source));
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn state(&self) -> RendererState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// True when an animation is attached and its engine has items.
    pub fn is_ready(&self) -> bool {
        self.animation
            .as_ref()
            .is_some_and(|animation| animation.engine().is_ready())
    }

    pub fn animation(&self) -> Option<&Animation> {
        self.animation.as_ref()
    }

    pub fn surface(&self) -> Option<&SharedSurface> {
        self.surface.as_ref()
    }

    /// Milliseconds the previous frame took; fed to the next `render`.
    pub fn tick_duration(&self) -> u64 {
        self.tick_duration
    }

    pub fn config(&mut self) -> &mut ConfigStore {
        &mut self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Open the display per the current configuration and attach the surface
    /// to the current animation. No-op unless uninitialized.
    pub fn init(&mut self) -> Result<(), BackendError> {
        if self.state != RendererState::Uninitialized {
            return Ok(());
        }

        let geometry = self.config.get().geometry();
        let surface = self.backend.open(&window_title(), geometry)?.shared();
        if let Some(animation) = self.animation.as_mut() {
            animation.engine_mut().set_surface(surface.clone());
        }
        self.surface = Some(surface);
        self.geometry = Some(geometry);
        self.clock = Some(self.backend.clock());
        self.state = RendererState::Running;
        info!(?geometry, "Renderer started.");
        Ok(())
    }

    /// Run frames until the run flag drops. Initializes first if needed.
    /// The backend is released however the loop ends.
    pub fn run(&mut self) -> Result<(), BackendError> {
        self.init()?;
        let result = panic::catch_unwind(AssertUnwindSafe(|| self.run_loop()));
        self.release();
        match result {
            Ok(result) => result,
            Err(payload) => {
                error!("Render loop panicked: {}", panic_message(payload.as_ref()));
                panic::resume_unwind(payload)
            }
        }
    }

    fn run_loop(&mut self) -> Result<(), BackendError> {
        while self.running {
            self.frame()?;
        }
        Ok(())
    }

    /// One loop iteration: input, pending rebuilds, then the frame itself.
    pub fn frame(&mut self) -> Result<(), BackendError> {
        self.parse_events()?;
        self.drain_reload_requests();
        self.render()
    }

    pub fn parse_events(&mut self) -> Result<(), BackendError> {
        for event in self.backend.poll_events()? {
            match event {
                InputEvent::Quit => self.running = false,
                InputEvent::Reload => self.reload_pending = true,
                InputEvent::Resize { width, height } => {
                    debug!(width, height, "Display resized");
                }
            }
        }
        Ok(())
    }

    /// Clear to the background, draw the attached animation, present, and
    /// wait out the frame budget.
    pub fn render(&mut self) -> Result<(), BackendError> {
        let config = self.config.get();
        let background = config.background();
        let fps = config.fps();

        if let Some(surface) = &self.surface {
            surface.borrow_mut().fill(background);
        }
        if let Some(animation) = self.animation.as_mut() {
            animation.engine_mut().render(self.tick_duration);
        }
        if let Some(surface) = &self.surface {
            self.backend.present(&surface.borrow())?;
        }
        if let Some(clock) = self.clock.as_mut() {
            self.tick_duration = clock.tick(fps);
        }
        Ok(())
    }

    /// Ask the loop to finish after the current iteration.
    pub fn stop(&mut self) {
        self.running = false;
    }

    fn release(&mut self) {
        if self.state != RendererState::Running {
            return;
        }
        if let Some(animation) = self.animation.as_mut() {
            animation.engine_mut().detach_surface();
        }
        self.surface = None;
        self.clock = None;
        self.running = false;
        self.state = RendererState::Stopped;
        if let Err(e) = self.backend.close() {
            warn!("Failed to release the display: {e}");
        }
        info!("Renderer stopped.");
    }

    // -----------------------------------------------------------------------
    // Rebuild protocol
    // -----------------------------------------------------------------------

    /// Attach a new animation (or none) and build its sequence.
    ///
    /// If the display cannot be brought in line with the fresh configuration
    /// the previous animation stays attached. Any later failure leaves the
    /// renderer with no animation. Either way the error has already been
    /// logged and the loop can continue.
    pub fn set_animation(&mut self, animation: Option<Animation>) -> Result<(), BuildError> {
        let Some(animation) = animation else {
            self.animation = None;
            return Ok(());
        };
        self.prepare_display()?;
        self.animation = Some(animation);
        self.build_attached()
    }

    /// Rebuild the attached animation from scratch against a fresh
    /// configuration. No-op without an animation.
    pub fn build_animation_sequence(&mut self) -> Result<(), BuildError> {
        if self.animation.is_none() {
            return Ok(());
        }
        self.prepare_display()?;
        self.build_attached()
    }

    fn drain_reload_requests(&mut self) {
        let mut requested = std::mem::take(&mut self.reload_pending);
        let mut disconnected = false;
        if let Some(receiver) = &self.reload_requests {
            loop {
                match receiver.try_recv() {
                    Ok(request) => {
                        debug!(path = %request.path.display(), "Reload requested");
                        requested = true;
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        disconnected = true;
                        break;
                    }
                }
            }
        }
        if disconnected {
            warn!("Live reload stopped: watcher disconnected");
            self.reload_requests = None;
        }
        if !requested {
            return;
        }
        info!("Rebuilding animation sequence");
        // Failures are reported and recovered inside.
        let fresh = self.animation_source.as_mut().map(|source| source());
        let result = match fresh {
            Some(animation) => self.set_animation(Some(animation)),
            None => self.build_animation_sequence(),
        };
        if let Err(e) = result {
            debug!("Reload did not attach a new animation: {e}");
        }
    }

    /// Reload the configuration and bring the display in line with it.
    fn prepare_display(&mut self) -> Result<(), BuildError> {
        let geometry = self.config.reload().geometry();
        let Some(surface) = &self.surface else {
            return Ok(());
        };
        if self.geometry == Some(geometry) {
            return Ok(());
        }

        if let Err(e) = self.backend.reconfigure(geometry) {
            let err = BuildError::Rendering(e);
            report(&err);
            return Err(err);
        }
        surface.borrow_mut().resize(geometry.width, geometry.height);
        self.geometry = Some(geometry);
        info!(?geometry, "Display reconfigured");
        Ok(())
    }

    fn build_attached(&mut self) -> Result<(), BuildError> {
        let result = self.try_build();
        match &result {
            Ok(()) => {
                if let Some(engine) = self.animation.as_ref().map(Animation::engine) {
                    info!(
                        entities = engine.entities().len(),
                        information = engine.information().len(),
                        steps = engine.steps().len(),
                        "Animation sequence built"
                    );
                }
            }
            Err(err) => {
                report(err);
                self.animation = None;
            }
        }
        result
    }

    fn try_build(&mut self) -> Result<(), BuildError> {
        let Some(animation) = self.animation.as_mut() else {
            return Ok(());
        };

        animation.reset_engine();
        if let Some(surface) = &self.surface {
            animation.engine_mut().set_surface(surface.clone());
        }

        match panic::catch_unwind(AssertUnwindSafe(|| setup_animation(animation))) {
            Ok(result) => result,
            Err(payload) => Err(BuildError::Unexpected(anyhow::anyhow!(
                "setup panicked: {}",
                panic_message(payload.as_ref())
            ))),
        }
    }
}

/// Run the definition's setup, check readiness, then resolve the engine.
fn setup_animation(animation: &mut Animation) -> Result<(), BuildError> {
    animation.setup().map_err(BuildError::from_setup)?;
    if !animation.engine().is_ready() {
        return Err(BuildValidationError.into());
    }
    animation
        .engine_mut()
        .setup()
        .map_err(|e| BuildError::Unexpected(e.into()))
}

fn report(err: &BuildError) {
    match err {
        BuildError::Validation(e) => error!("{e}"),
        BuildError::Rendering(e) => error!("Rendering subsystem error: {e}"),
        BuildError::Unexpected(e) => error!("Error building the animations:\n{e:?}"),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        *s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic payload"
    }
}
