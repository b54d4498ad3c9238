use anyhow::{bail, Result};
use glam::Mat4;

use crate::coords::Viewport;
use crate::render::{Frame, MeshResource, PresentOutcome, RenderBackend};
use crate::scene::{PhongParams, SceneConfig, Transforms};
use crate::shader::{UniformInterface, UniformLocation, UniformValue};

/// Uniform names pushed every frame, in push order.
pub const FRAME_UNIFORMS: [&str; 11] = [
    "model",
    "view",
    "projection",
    "ka",
    "kd",
    "ks",
    "p",
    "Ia",
    "lightPos",
    "lightColor",
    "viewPos",
];

/// Lifecycle of a [`RenderLoop`]. Transitions only move forward.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LoopState {
    Uninitialized,
    Running,
    Terminated,
}

/// Input delivered to the loop by the window host.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LoopEvent {
    Resize { width: u32, height: u32 },
    Quit,
}

/// Single-window render loop.
///
/// Owns the transforms, the material/light constants, the viewport and (once
/// running) the shader program and mesh. Each [`iterate`](Self::iterate) is one
/// frame: quit check, input, clear, program, uniforms, bind, draw, unbind,
/// present.
pub struct RenderLoop<P, M> {
    state: LoopState,
    quit_pending: bool,

    viewport: Viewport,
    camera: Transforms,
    material: PhongParams,
    clear_color: wgpu::Color,
    projection_follows_viewport: bool,

    program: Option<P>,
    mesh: Option<M>,
    slots: [Option<UniformLocation>; FRAME_UNIFORMS.len()],

    frames_presented: u64,
}

impl<P, M> RenderLoop<P, M>
where
    P: UniformInterface,
    M: MeshResource,
{
    pub fn new(config: &SceneConfig, viewport: Viewport) -> Self {
        let mut camera = config.camera;
        if config.projection_follows_viewport && !viewport.is_empty() {
            camera.fit_projection(viewport);
        }

        Self {
            state: LoopState::Uninitialized,
            quit_pending: false,
            viewport,
            camera,
            material: config.material,
            clear_color: config.clear_color,
            projection_follows_viewport: config.projection_follows_viewport,
            program: None,
            mesh: None,
            slots: [None; FRAME_UNIFORMS.len()],
            frames_presented: 0,
        }
    }

    /// Takes ownership of the ready program and mesh and enters `Running`.
    ///
    /// Uniform locations are resolved once here; names the program does not
    /// declare are reported and their values are dropped every frame.
    pub fn start(&mut self, program: P, mesh: M) -> Result<()> {
        if self.state != LoopState::Uninitialized {
            bail!("render loop already started (state {:?})", self.state);
        }

        for (slot, name) in self.slots.iter_mut().zip(FRAME_UNIFORMS) {
            *slot = program.uniform_location(name);
            if slot.is_none() {
                log::warn!("uniform `{name}` not found in program; its value will be dropped");
            }
        }

        log::info!("render loop running: {} indices", mesh.index_count());
        self.program = Some(program);
        self.mesh = Some(mesh);
        self.state = LoopState::Running;
        Ok(())
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn camera(&self) -> &Transforms {
        &self.camera
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    pub fn quit_pending(&self) -> bool {
        self.quit_pending
    }

    /// Asks the loop to stop. The frame in flight still completes; the loop
    /// terminates at the top of the next iteration.
    pub fn request_quit(&mut self) {
        if !self.quit_pending {
            log::info!("quit requested");
        }
        self.quit_pending = true;
    }

    /// Applies one input event. Ignored once terminated.
    pub fn handle_event<B>(&mut self, backend: &mut B, event: LoopEvent)
    where
        B: RenderBackend<Program = P, Mesh = M>,
    {
        if self.state == LoopState::Terminated {
            return;
        }

        match event {
            LoopEvent::Quit => self.request_quit(),
            LoopEvent::Resize { width, height } => {
                let viewport = Viewport::new(width, height);
                log::debug!("viewport resized to {width}x{height}");
                self.viewport = viewport;
                backend.set_viewport(viewport);
                if self.projection_follows_viewport && !viewport.is_empty() {
                    self.camera.fit_projection(viewport);
                }
            }
        }
    }

    /// Runs one iteration and returns the resulting state.
    ///
    /// A quit requested before this call terminates here without drawing.
    /// Otherwise `events` are applied and one frame is recorded and presented;
    /// a quit among `events` takes effect on the next call.
    pub fn iterate<B, I>(&mut self, backend: &mut B, events: I) -> LoopState
    where
        B: RenderBackend<Program = P, Mesh = M>,
        I: IntoIterator<Item = LoopEvent>,
    {
        match self.state {
            LoopState::Uninitialized => {
                log::warn!("iterate called before the render loop was started");
                return self.state;
            }
            LoopState::Terminated => return self.state,
            LoopState::Running => {}
        }

        if self.quit_pending {
            self.shutdown(backend);
            return self.state;
        }

        for event in events {
            self.handle_event(backend, event);
        }

        let frame = self.record_frame();
        let (Some(program), Some(mesh)) = (self.program.as_mut(), self.mesh.as_ref()) else {
            return self.state;
        };

        match backend.present(program, mesh, &frame) {
            PresentOutcome::Presented => self.frames_presented += 1,
            PresentOutcome::Skipped => log::trace!("frame skipped"),
            PresentOutcome::Fatal => {
                log::error!("surface failure is unrecoverable; stopping");
                self.request_quit();
            }
        }

        self.state
    }

    /// Records the draw commands for the current state without presenting.
    pub fn record_frame(&self) -> Frame {
        let mut frame = Frame::new();
        frame.clear(self.clear_color);
        frame.use_program();

        for (slot, value) in self.slots.iter().zip(self.uniform_values()) {
            if let Some(location) = slot {
                frame.set_uniform(*location, value);
            }
        }

        frame.bind_mesh();
        frame.draw_indexed(self.mesh.as_ref().map_or(0, |m| m.index_count()));
        frame.unbind_mesh();
        frame
    }

    /// Releases the mesh, the program and the context, in that order.
    ///
    /// Runs at most once; later calls do nothing.
    pub fn shutdown<B>(&mut self, backend: &mut B)
    where
        B: RenderBackend<Program = P, Mesh = M>,
    {
        if self.state == LoopState::Terminated {
            return;
        }

        if let Some(mesh) = self.mesh.take() {
            backend.release_mesh(mesh);
        }
        if let Some(program) = self.program.take() {
            backend.release_program(program);
        }
        backend.release_context();

        self.state = LoopState::Terminated;
        log::info!("render loop terminated after {} frames", self.frames_presented);
    }

    /// Values for [`FRAME_UNIFORMS`], index for index.
    fn uniform_values(&self) -> [UniformValue; FRAME_UNIFORMS.len()] {
        let t = &self.camera;
        let m = &self.material;
        let projection: Mat4 = t.projection_matrix();
        [
            t.model.into(),
            t.view.into(),
            projection.into(),
            m.ambient.into(),
            m.diffuse.into(),
            m.specular.into(),
            m.shininess.into(),
            m.ambient_intensity.into(),
            m.light_pos.into(),
            m.light_color.into(),
            m.view_pos.into(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{generate_sphere, Mesh};
    use crate::render::Command;
    use crate::shader::{UniformKind, UniformLayout};

    // ── recording backend ─────────────────────────────────────────────────

    struct FakeProgram {
        layout: UniformLayout,
    }

    impl UniformInterface for FakeProgram {
        fn uniform_location(&self, name: &str) -> Option<UniformLocation> {
            self.layout.location(name)
        }
    }

    struct FakeMesh {
        mesh: Mesh,
    }

    impl MeshResource for FakeMesh {
        fn index_count(&self) -> u32 {
            self.mesh.indices.len() as u32
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Viewport(Viewport),
        Present,
        ReleaseMesh,
        ReleaseProgram,
        ReleaseContext,
    }

    #[derive(Default)]
    struct Recorder {
        calls: Vec<Call>,
        frames: Vec<Frame>,
        uploaded: Vec<Mesh>,
        next_outcome: Option<PresentOutcome>,
    }

    impl Recorder {
        fn count(&self, call: &Call) -> usize {
            self.calls.iter().filter(|c| *c == call).count()
        }
    }

    impl RenderBackend for Recorder {
        type Program = FakeProgram;
        type Mesh = FakeMesh;

        fn set_viewport(&mut self, viewport: Viewport) {
            self.calls.push(Call::Viewport(viewport));
        }

        fn present(&mut self, _: &mut FakeProgram, mesh: &FakeMesh, frame: &Frame) -> PresentOutcome {
            self.calls.push(Call::Present);
            self.frames.push(frame.clone());
            self.uploaded.push(mesh.mesh.clone());
            self.next_outcome.take().unwrap_or(PresentOutcome::Presented)
        }

        fn release_mesh(&mut self, _: FakeMesh) {
            self.calls.push(Call::ReleaseMesh);
        }

        fn release_program(&mut self, _: FakeProgram) {
            self.calls.push(Call::ReleaseProgram);
        }

        fn release_context(&mut self) {
            self.calls.push(Call::ReleaseContext);
        }
    }

    fn running_loop(config: &SceneConfig) -> RenderLoop<FakeProgram, FakeMesh> {
        let mut rl = RenderLoop::new(config, Viewport::default());
        let program = FakeProgram { layout: UniformLayout::phong() };
        let mesh = FakeMesh { mesh: generate_sphere(1.0, 32, 16) };
        rl.start(program, mesh).unwrap();
        rl
    }

    fn projection_of(frame: &Frame) -> UniformValue {
        let loc = UniformLayout::phong().location("projection").unwrap();
        frame.uniforms().find(|(l, _)| *l == loc).unwrap().1
    }

    // ── lifecycle ─────────────────────────────────────────────────────────

    #[test]
    fn starts_uninitialized_and_refuses_to_draw() {
        let mut rl: RenderLoop<FakeProgram, FakeMesh> =
            RenderLoop::new(&SceneConfig::default(), Viewport::default());
        let mut backend = Recorder::default();
        assert_eq!(rl.iterate(&mut backend, []), LoopState::Uninitialized);
        assert!(backend.calls.is_empty());
    }

    #[test]
    fn start_enters_running_once() {
        let mut rl = running_loop(&SceneConfig::default());
        assert_eq!(rl.state(), LoopState::Running);
        let again = rl.start(
            FakeProgram { layout: UniformLayout::phong() },
            FakeMesh { mesh: Mesh::default() },
        );
        assert!(again.is_err());
    }

    #[test]
    fn quit_lets_current_frame_finish_then_releases_in_order() {
        let mut rl = running_loop(&SceneConfig::default());
        let mut backend = Recorder::default();

        for _ in 0..3 {
            assert_eq!(rl.iterate(&mut backend, []), LoopState::Running);
        }
        // Quit arrives during iteration k: that frame is still drawn and presented.
        assert_eq!(rl.iterate(&mut backend, [LoopEvent::Quit]), LoopState::Running);
        assert_eq!(backend.count(&Call::Present), 4);
        assert_eq!(rl.frames_presented(), 4);

        assert_eq!(rl.iterate(&mut backend, []), LoopState::Terminated);
        assert_eq!(backend.count(&Call::Present), 4);
        assert_eq!(
            &backend.calls[backend.calls.len() - 3..],
            &[Call::ReleaseMesh, Call::ReleaseProgram, Call::ReleaseContext]
        );

        // Further iterations and shutdowns are no-ops.
        assert_eq!(rl.iterate(&mut backend, [LoopEvent::Quit]), LoopState::Terminated);
        rl.shutdown(&mut backend);
        assert_eq!(backend.count(&Call::ReleaseMesh), 1);
        assert_eq!(backend.count(&Call::ReleaseProgram), 1);
        assert_eq!(backend.count(&Call::ReleaseContext), 1);
    }

    #[test]
    fn quit_between_frames_terminates_without_drawing() {
        let mut rl = running_loop(&SceneConfig::default());
        let mut backend = Recorder::default();
        rl.handle_event(&mut backend, LoopEvent::Quit);
        assert!(rl.quit_pending());
        assert_eq!(rl.iterate(&mut backend, []), LoopState::Terminated);
        assert_eq!(backend.count(&Call::Present), 0);
    }

    #[test]
    fn fatal_present_terminates_on_next_iteration() {
        let mut rl = running_loop(&SceneConfig::default());
        let mut backend = Recorder {
            next_outcome: Some(PresentOutcome::Fatal),
            ..Default::default()
        };
        assert_eq!(rl.iterate(&mut backend, []), LoopState::Running);
        assert_eq!(rl.frames_presented(), 0);
        assert_eq!(rl.iterate(&mut backend, []), LoopState::Terminated);
    }

    // ── frame contents ────────────────────────────────────────────────────

    #[test]
    fn frame_follows_fixed_order() {
        let rl = running_loop(&SceneConfig::default());
        let frame = rl.record_frame();
        let cmds = frame.commands();

        assert_eq!(cmds[0], Command::Clear(wgpu::Color::BLACK));
        assert_eq!(cmds[1], Command::UseProgram);
        assert!(cmds[2..13].iter().all(|c| matches!(c, Command::SetUniform { .. })));
        assert_eq!(cmds[13], Command::BindMesh);
        assert_eq!(cmds[14], Command::DrawIndexed { index_count: 2604 });
        assert_eq!(cmds[15], Command::UnbindMesh);
        assert_eq!(cmds.len(), 16);
    }

    #[test]
    fn draw_covers_full_index_sequence() {
        let rl = running_loop(&SceneConfig::default());
        let expected = generate_sphere(1.0, 32, 16).indices.len() as u32;
        let frame = rl.record_frame();
        assert!(frame
            .commands()
            .contains(&Command::DrawIndexed { index_count: expected }));
    }

    #[test]
    fn pushes_material_constants() {
        let rl = running_loop(&SceneConfig::default());
        let layout = UniformLayout::phong();
        let frame = rl.record_frame();
        let value = |name: &str| {
            let loc = layout.location(name).unwrap();
            frame.uniforms().find(|(l, _)| *l == loc).unwrap().1
        };
        assert_eq!(value("ka"), UniformValue::Vec3([0.0, 1.0, 0.0]));
        assert_eq!(value("kd"), UniformValue::Vec3([0.0, 0.5, 0.0]));
        assert_eq!(value("ks"), UniformValue::Vec3([0.5, 0.5, 0.5]));
        assert_eq!(value("p"), UniformValue::Float(32.0));
        assert_eq!(value("Ia"), UniformValue::Float(0.2));
        assert_eq!(value("lightPos"), UniformValue::Vec3([-4.0, 4.0, -3.0]));
        assert_eq!(value("lightColor"), UniformValue::Vec3([1.0, 1.0, 1.0]));
        assert_eq!(value("viewPos"), UniformValue::Vec3([0.0, 0.0, 0.0]));
    }

    #[test]
    fn injected_material_reaches_the_frame() {
        let mut config = SceneConfig::default();
        config.material.shininess = 8.0;
        config.clear_color = wgpu::Color::WHITE;
        let rl = running_loop(&config);
        let frame = rl.record_frame();
        assert_eq!(frame.clear_color(), Some(wgpu::Color::WHITE));
        assert!(frame.uniforms().any(|(_, v)| v == UniformValue::Float(8.0)));
    }

    #[test]
    fn undeclared_uniform_is_dropped_silently() {
        let layout = UniformLayout::new(&[
            ("model", UniformKind::Mat4),
            ("view", UniformKind::Mat4),
            ("projection", UniformKind::Mat4),
            ("eyePosition", UniformKind::Vec3),
        ]);
        let mut rl = RenderLoop::new(&SceneConfig::default(), Viewport::default());
        rl.start(FakeProgram { layout }, FakeMesh { mesh: generate_sphere(1.0, 4, 4) })
            .unwrap();

        let mut backend = Recorder::default();
        assert_eq!(rl.iterate(&mut backend, []), LoopState::Running);
        assert_eq!(backend.frames[0].uniforms().count(), 3);
        assert!(backend.frames[0]
            .commands()
            .contains(&Command::DrawIndexed { index_count: 36 }));
    }

    // ── resize ────────────────────────────────────────────────────────────

    #[test]
    fn resize_updates_viewport_only() {
        let mut rl = running_loop(&SceneConfig::default());
        let mut backend = Recorder::default();

        rl.iterate(&mut backend, []);
        rl.iterate(&mut backend, [LoopEvent::Resize { width: 800, height: 600 }]);

        assert_eq!(rl.viewport(), Viewport::new(800, 600));
        assert!(backend.calls.contains(&Call::Viewport(Viewport::new(800, 600))));
        assert_eq!(backend.uploaded[0], backend.uploaded[1]);
        assert_eq!(backend.frames[0], backend.frames[1]);
    }

    #[test]
    fn resize_refits_projection_when_enabled() {
        let config = SceneConfig {
            projection_follows_viewport: true,
            ..SceneConfig::default()
        };
        let mut rl = running_loop(&config);
        let mut backend = Recorder::default();

        rl.iterate(&mut backend, []);
        rl.iterate(&mut backend, [LoopEvent::Resize { width: 800, height: 600 }]);

        assert_ne!(projection_of(&backend.frames[0]), projection_of(&backend.frames[1]));
        let f = rl.camera().projection;
        assert!(((f.right - f.left) / (f.top - f.bottom) - 800.0 / 600.0).abs() < 1e-5);
    }

    #[test]
    fn events_after_termination_are_ignored() {
        let mut rl = running_loop(&SceneConfig::default());
        let mut backend = Recorder::default();
        rl.request_quit();
        rl.iterate(&mut backend, []);
        rl.handle_event(&mut backend, LoopEvent::Resize { width: 10, height: 10 });
        assert_eq!(rl.viewport(), Viewport::default());
    }
}
