use anyhow::Result;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::coords::Viewport;
use crate::device::{Gpu, GpuInit, SurfaceErrorAction};
use crate::shader::ShaderProgram;

use super::{Command, Frame, GpuMesh, MeshResource, PresentOutcome, RenderBackend};

/// [`RenderBackend`] over a wgpu surface bound to one window.
pub struct WgpuBackend<'w> {
    gpu: Gpu<'w>,
    window: &'w Window,
    viewport: Viewport,
}

impl<'w> WgpuBackend<'w> {
    pub async fn new(window: &'w Window, init: GpuInit) -> Result<Self> {
        let gpu = Gpu::new(window, init).await?;
        let viewport = Viewport::from(gpu.size());

        let info = gpu.adapter_info();
        log::info!("GPU ready: {} ({:?})", info.name, info.backend);

        Ok(Self {
            gpu,
            window,
            viewport,
        })
    }

    pub fn gpu(&self) -> &Gpu<'w> {
        &self.gpu
    }
}

impl RenderBackend for WgpuBackend<'_> {
    type Program = ShaderProgram;
    type Mesh = GpuMesh;

    fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.gpu
            .resize(PhysicalSize::new(viewport.width, viewport.height));
    }

    fn present(&mut self, program: &mut ShaderProgram, mesh: &GpuMesh, frame: &Frame) -> PresentOutcome {
        if self.viewport.is_empty() {
            return PresentOutcome::Skipped;
        }

        let mut gpu_frame = match self.gpu.begin_frame() {
            Ok(f) => f,
            Err(err) => {
                log::debug!("surface error: {err}");
                return match self.gpu.handle_surface_error(err) {
                    SurfaceErrorAction::Fatal => PresentOutcome::Fatal,
                    SurfaceErrorAction::Reconfigured | SurfaceErrorAction::SkipFrame => {
                        PresentOutcome::Skipped
                    }
                };
            }
        };

        for (location, value) in frame.uniforms() {
            program.set_uniform(location, value);
        }
        program.upload_uniforms(self.gpu.queue());

        let size = self.gpu.size();
        let clear = frame.clear_color().unwrap_or(wgpu::Color::BLACK);

        // Render pass borrows the encoder; dropped before submit() takes the frame.
        {
            let (color_view, resolve_target) = match self.gpu.msaa_view() {
                Some(msaa) => (msaa, Some(&gpu_frame.view)),
                None => (&gpu_frame.view, None),
            };

            let mut rpass = gpu_frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("sphaera phong pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: color_view,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: self.gpu.depth_view(),
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            rpass.set_viewport(
                0.0,
                0.0,
                self.viewport.width.min(size.width) as f32,
                self.viewport.height.min(size.height) as f32,
                0.0,
                1.0,
            );

            let mut program_bound = false;
            let mut mesh_bound = false;

            for cmd in frame.commands() {
                match *cmd {
                    Command::UseProgram => {
                        if let Some(pipeline) = program.pipeline() {
                            rpass.set_pipeline(pipeline);
                            rpass.set_bind_group(0, program.bind_group(), &[]);
                            program_bound = true;
                        }
                    }
                    // Zero-sized buffers cannot be bound.
                    Command::BindMesh => {
                        if mesh.index_count() > 0 {
                            mesh.bind(&mut rpass);
                            mesh_bound = true;
                        }
                    }
                    Command::DrawIndexed { index_count } => {
                        if program_bound && mesh_bound {
                            rpass.draw_indexed(0..index_count.min(mesh.index_count()), 0, 0..1);
                        }
                    }
                    Command::UnbindMesh => mesh_bound = false,
                    Command::Clear(_) | Command::SetUniform { .. } => {}
                }
            }
        }

        self.window.pre_present_notify();
        self.gpu.submit(gpu_frame);
        PresentOutcome::Presented
    }

    fn release_mesh(&mut self, mut mesh: GpuMesh) {
        if mesh.release() {
            log::debug!("mesh buffers released");
        }
    }

    fn release_program(&mut self, mut program: ShaderProgram) {
        if program.release() {
            log::debug!("shader program released");
        }
    }

    fn release_context(&mut self) {
        if self.gpu.release_surface() {
            log::debug!("surface released");
        }
    }
}
