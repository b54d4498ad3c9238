use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::coords::Viewport;
use crate::core::{LoopEvent, LoopState, RenderLoop};
use crate::device::GpuInit;
use crate::mesh::generate_sphere_with;
use crate::render::{GpuMesh, WgpuBackend};
use crate::scene::SceneConfig;
use crate::shader::{ShaderProgram, ShaderSources};

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    /// Keys that end the session when pressed.
    pub quit_keys: Vec<KeyCode>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "Sphaera".to_string(),
            initial_size: LogicalSize::new(512.0, 512.0),
            quit_keys: vec![KeyCode::Escape, KeyCode::KeyQ],
        }
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens the window, draws the scene until the user quits, then tears
    /// everything down.
    ///
    /// Returns `Err` if the event loop, window, GPU context or shader program
    /// could not be set up.
    pub fn run(
        config: RuntimeConfig,
        gpu_init: GpuInit,
        scene: SceneConfig,
        shaders: ShaderSources,
    ) -> Result<()> {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut host = WindowHost::new(config, gpu_init, scene, shaders);

        event_loop
            .run_app(&mut host)
            .context("winit event loop terminated with error")?;

        match host.startup_error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[self_referencing]
struct WindowEntry {
    render_loop: RenderLoop<ShaderProgram, GpuMesh>,

    window: Window,

    #[borrows(window)]
    #[covariant]
    backend: WgpuBackend<'this>,
}

/// Owns the single window and forwards its events to the render loop.
struct WindowHost {
    config: RuntimeConfig,
    gpu_init: GpuInit,
    scene: SceneConfig,
    shaders: ShaderSources,

    entry: Option<WindowEntry>,
    /// Events received since the last iteration, applied at its start.
    pending: Vec<LoopEvent>,
    /// Set once the window has been created, so a later `resumed` does not
    /// open a second one.
    started: bool,
    startup_error: Option<anyhow::Error>,
}

impl WindowHost {
    fn new(
        config: RuntimeConfig,
        gpu_init: GpuInit,
        scene: SceneConfig,
        shaders: ShaderSources,
    ) -> Self {
        Self {
            config,
            gpu_init,
            scene,
            shaders,
            entry: None,
            pending: Vec::new(),
            started: false,
            startup_error: None,
        }
    }

    fn create_window_entry(&self, event_loop: &ActiveEventLoop) -> Result<WindowEntry> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let viewport = Viewport::from(window.inner_size());
        log::info!(
            "window `{}` created at {}x{}",
            self.config.title,
            viewport.width,
            viewport.height
        );

        let gpu_init = self.gpu_init.clone();
        let mut entry = WindowEntryTryBuilder {
            render_loop: RenderLoop::new(&self.scene, viewport),
            window,
            backend_builder: |w| pollster::block_on(WgpuBackend::new(w, gpu_init)),
        }
        .try_build()
        .context("GPU initialization failed for window")?;

        let scene = &self.scene;
        let shaders = &self.shaders;
        entry.with_mut(|fields| -> Result<()> {
            let gpu = fields.backend.gpu();
            let program = ShaderProgram::compile(
                gpu.device(),
                shaders,
                gpu.program_target(),
                scene.shader_failure,
            )?;
            let mesh = GpuMesh::upload(gpu.device(), generate_sphere_with(&scene.sphere));
            fields.render_loop.start(program, mesh)
        })?;

        Ok(entry)
    }
}

impl ApplicationHandler for WindowHost {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.started {
            return;
        }
        self.started = true;

        match self.create_window_entry(event_loop) {
            Ok(entry) => {
                entry.with_window(|w| w.request_redraw());
                self.entry = Some(entry);
            }
            Err(e) => {
                log::error!("failed to start: {e:#}");
                self.startup_error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some(entry) = self.entry.as_ref() else {
            if self.started {
                event_loop.exit();
            }
            return;
        };

        event_loop.set_control_flow(ControlFlow::Wait);

        // Continuous redraw.
        entry.with_window(|w| w.request_redraw());
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(entry) = self.entry.as_ref() else {
            return;
        };
        if entry.with_window(|w| w.id()) != window_id {
            return;
        }

        if let WindowEvent::RedrawRequested = event {
            let Some(entry) = self.entry.as_mut() else {
                return;
            };
            let pending = &mut self.pending;
            let state = entry
                .with_mut(|fields| fields.render_loop.iterate(fields.backend, pending.drain(..)));

            if state == LoopState::Terminated {
                self.entry = None;
                event_loop.exit();
            }
            return;
        }

        let quit_keys = &self.config.quit_keys;
        if let Some(ev) = loop_event(&event, quit_keys, || entry.with_window(|w| w.inner_size())) {
            self.pending.push(ev);
        }
    }
}

/// Maps a window event to render loop input. `inner_size` is read only when
/// the scale factor changes.
fn loop_event(
    event: &WindowEvent,
    quit_keys: &[KeyCode],
    inner_size: impl FnOnce() -> PhysicalSize<u32>,
) -> Option<LoopEvent> {
    match event {
        WindowEvent::CloseRequested => Some(LoopEvent::Quit),

        WindowEvent::KeyboardInput { event: key, .. }
            if is_quit_key(key.state, key.repeat, key.physical_key, quit_keys) =>
        {
            Some(LoopEvent::Quit)
        }

        WindowEvent::Resized(size) => Some(resize(*size)),

        WindowEvent::ScaleFactorChanged { .. } => Some(resize(inner_size())),

        _ => None,
    }
}

fn resize(size: PhysicalSize<u32>) -> LoopEvent {
    LoopEvent::Resize {
        width: size.width,
        height: size.height,
    }
}

fn is_quit_key(state: ElementState, repeat: bool, key: PhysicalKey, quit_keys: &[KeyCode]) -> bool {
    if state != ElementState::Pressed || repeat {
        return false;
    }
    match key {
        PhysicalKey::Code(code) => quit_keys.contains(&code),
        PhysicalKey::Unidentified(_) => false,
    }
}
