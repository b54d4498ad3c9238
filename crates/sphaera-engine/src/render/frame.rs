use crate::shader::{UniformLocation, UniformValue};

/// One recorded step of a frame, in submission order.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Command {
    Clear(wgpu::Color),
    UseProgram,
    SetUniform {
        location: UniformLocation,
        value: UniformValue,
    },
    BindMesh,
    DrawIndexed {
        index_count: u32,
    },
    UnbindMesh,
}

/// Commands recorded by the render loop for a single frame.
///
/// A backend replays the list against its program and mesh when the frame is
/// presented.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    commands: Vec<Command>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self, color: wgpu::Color) {
        self.commands.push(Command::Clear(color));
    }

    pub fn use_program(&mut self) {
        self.commands.push(Command::UseProgram);
    }

    pub fn set_uniform(&mut self, location: UniformLocation, value: UniformValue) {
        self.commands.push(Command::SetUniform { location, value });
    }

    pub fn bind_mesh(&mut self) {
        self.commands.push(Command::BindMesh);
    }

    pub fn draw_indexed(&mut self, index_count: u32) {
        self.commands.push(Command::DrawIndexed { index_count });
    }

    pub fn unbind_mesh(&mut self) {
        self.commands.push(Command::UnbindMesh);
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Clear color of the frame, if one was recorded.
    pub fn clear_color(&self) -> Option<wgpu::Color> {
        self.commands.iter().find_map(|c| match c {
            Command::Clear(color) => Some(*color),
            _ => None,
        })
    }

    pub fn uniforms(&self) -> impl Iterator<Item = (UniformLocation, UniformValue)> + '_ {
        self.commands.iter().filter_map(|c| match c {
            Command::SetUniform { location, value } => Some((*location, *value)),
            _ => None,
        })
    }
}
