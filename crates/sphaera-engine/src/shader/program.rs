use anyhow::{bail, Result};

use crate::render::MeshLayout;

use super::{
    merge_layouts, reflect_uniforms, ShaderFailurePolicy, ShaderSources, UniformBlock,
    UniformInterface, UniformLayout, UniformLocation, UniformValue,
};

/// Attachment formats a program's pipeline must match.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ProgramTarget {
    pub color_format: wgpu::TextureFormat,
    pub depth_format: wgpu::TextureFormat,
    pub sample_count: u32,
}

/// Compiled vertex + fragment pair with its pipeline and uniform block.
///
/// A program whose stages failed to compile under
/// [`ShaderFailurePolicy::Continue`] has no pipeline; draws with it are skipped.
pub struct ShaderProgram {
    layout: UniformLayout,
    block: UniformBlock,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    pipeline: Option<wgpu::RenderPipeline>,
    released: bool,
}

impl ShaderProgram {
    /// Compiles both stages and links them into a render pipeline.
    ///
    /// Every compiler message is logged. Errors abort with `Err` only under
    /// [`ShaderFailurePolicy::Abort`]. The uniform interface is whatever the
    /// two stages declare at `@group(0) @binding(0)`.
    pub fn compile(
        device: &wgpu::Device,
        sources: &ShaderSources,
        target: ProgramTarget,
        policy: ShaderFailurePolicy,
    ) -> Result<Self> {
        let layout = merge_layouts(
            &stage_layout(&sources.vertex_label, &sources.vertex),
            &stage_layout(&sources.fragment_label, &sources.fragment),
        );

        let (vertex, vertex_errors) = compile_stage(device, &sources.vertex_label, &sources.vertex);
        let (fragment, fragment_errors) =
            compile_stage(device, &sources.fragment_label, &sources.fragment);

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("sphaera phong ubo"),
            size: layout.size() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sphaera phong bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(layout.size() as u64),
                },
                count: None,
            }],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sphaera phong bind group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline = if link_allowed(policy, vertex_errors, fragment_errors)? {
            log::info!("linking program");
            let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
            let pipeline = create_pipeline(device, &bind_group_layout, &vertex, &fragment, target);
            match pollster::block_on(scope.pop()) {
                None => Some(pipeline),
                Some(err) => {
                    link_failed(policy, &err.to_string())?;
                    None
                }
            }
        } else {
            None
        };

        Ok(Self {
            block: UniformBlock::new(&layout),
            layout,
            uniform_buffer,
            bind_group,
            pipeline,
            released: false,
        })
    }

    /// Stages a uniform value; it reaches the GPU on the next [`upload_uniforms`](Self::upload_uniforms).
    pub fn set_uniform(&mut self, location: UniformLocation, value: UniformValue) {
        self.block.write(location, value);
    }

    pub fn upload_uniforms(&self, queue: &wgpu::Queue) {
        queue.write_buffer(&self.uniform_buffer, 0, self.block.as_bytes());
    }

    pub fn pipeline(&self) -> Option<&wgpu::RenderPipeline> {
        self.pipeline.as_ref()
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    /// Frees the pipeline and uniform buffer. Returns `false` if already released.
    pub fn release(&mut self) -> bool {
        if self.released {
            return false;
        }
        self.pipeline = None;
        self.uniform_buffer.destroy();
        self.released = true;
        true
    }
}

impl UniformInterface for ShaderProgram {
    fn uniform_location(&self, name: &str) -> Option<UniformLocation> {
        self.layout.location(name)
    }
}

/// Compiles one stage, logging every compiler message. Returns the module and
/// its error count.
fn compile_stage(device: &wgpu::Device, label: &str, source: &str) -> (wgpu::ShaderModule, usize) {
    log::info!("compiling shader: {label}");

    let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    let scope_error = pollster::block_on(scope.pop());
    let info = pollster::block_on(module.get_compilation_info());

    let mut errors = 0;
    for msg in &info.messages {
        let line = msg.location.as_ref().map_or(0, |l| l.line_number);
        match msg.message_type {
            wgpu::CompilationMessageType::Error => {
                errors += 1;
                log::error!("{label}:{line}: {}", msg.message);
            }
            wgpu::CompilationMessageType::Warning => log::warn!("{label}:{line}: {}", msg.message),
            wgpu::CompilationMessageType::Info => log::info!("{label}:{line}: {}", msg.message),
        }
    }

    if let Some(err) = scope_error {
        log::error!("{label}: {err}");
        errors = errors.max(1);
    }

    (module, errors)
}

/// Uniform layout declared by one stage; empty if the source does not parse
/// (the compile step reports why).
fn stage_layout(label: &str, source: &str) -> UniformLayout {
    reflect_uniforms(source).unwrap_or_else(|e| {
        log::debug!("{label}: no uniform interface: {e:#}");
        UniformLayout::from_locations(Vec::new(), 0)
    })
}

/// Whether linking should go ahead after both stages compiled.
///
/// `Ok(false)` means continue without a pipeline.
fn link_allowed(
    policy: ShaderFailurePolicy,
    vertex_errors: usize,
    fragment_errors: usize,
) -> Result<bool> {
    if vertex_errors + fragment_errors == 0 {
        return Ok(true);
    }
    match policy {
        ShaderFailurePolicy::Abort => bail!(
            "shader compilation failed ({vertex_errors} vertex, {fragment_errors} fragment errors)"
        ),
        ShaderFailurePolicy::Continue => {
            log::error!("shader compilation failed; continuing without a pipeline, nothing will be drawn");
            Ok(false)
        }
    }
}

fn link_failed(policy: ShaderFailurePolicy, err: &str) -> Result<()> {
    match policy {
        ShaderFailurePolicy::Abort => bail!("program link failed: {err}"),
        ShaderFailurePolicy::Continue => {
            log::error!("program link failed: {err}; nothing will be drawn");
            Ok(())
        }
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    bind_group_layout: &wgpu::BindGroupLayout,
    vertex: &wgpu::ShaderModule,
    fragment: &wgpu::ShaderModule,
    target: ProgramTarget,
) -> wgpu::RenderPipeline {
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("sphaera phong pipeline layout"),
        bind_group_layouts: &[bind_group_layout],
        immediate_size: 0,
    });

    let buffers = MeshLayout::buffers();

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("sphaera phong pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: vertex,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &buffers,
        },
        fragment: Some(wgpu::FragmentState {
            module: fragment,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: target.color_format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: target.depth_format,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: target.sample_count,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview_mask: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_stages_link_under_either_policy() {
        assert!(link_allowed(ShaderFailurePolicy::Continue, 0, 0).unwrap());
        assert!(link_allowed(ShaderFailurePolicy::Abort, 0, 0).unwrap());
    }

    #[test]
    fn continue_skips_the_pipeline_on_compile_errors() {
        assert!(!link_allowed(ShaderFailurePolicy::Continue, 2, 0).unwrap());
        assert!(!link_allowed(ShaderFailurePolicy::Continue, 0, 1).unwrap());
    }

    #[test]
    fn abort_fails_on_compile_errors() {
        let err = link_allowed(ShaderFailurePolicy::Abort, 1, 3).unwrap_err();
        assert!(err.to_string().contains("1 vertex, 3 fragment"));
    }

    #[test]
    fn link_errors_follow_the_policy() {
        assert!(link_failed(ShaderFailurePolicy::Continue, "bad interface").is_ok());
        let err = link_failed(ShaderFailurePolicy::Abort, "bad interface").unwrap_err();
        assert!(err.to_string().contains("bad interface"));
    }

    #[test]
    fn unparsable_stage_contributes_no_uniforms() {
        assert!(stage_layout("broken.wgsl", "fn {").is_empty());
    }

    #[test]
    fn layout_comes_from_the_loaded_sources() {
        let sources = ShaderSources::builtin();
        let layout = merge_layouts(
            &stage_layout(&sources.vertex_label, &sources.vertex),
            &stage_layout(&sources.fragment_label, &sources.fragment),
        );
        assert_eq!(layout, UniformLayout::phong());
    }
}
