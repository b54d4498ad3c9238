use glam::{Mat4, Vec3};

/// Type of a uniform slot.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum UniformKind {
    Float,
    Vec3,
    Mat4,
}

impl UniformKind {
    /// Bytes written for a value of this kind (excluding trailing padding).
    pub const fn size(self) -> usize {
        match self {
            UniformKind::Float => 4,
            UniformKind::Vec3 => 12,
            UniformKind::Mat4 => 64,
        }
    }
}

/// A value pushed to a uniform slot. Matrices are column-major.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec3([f32; 3]),
    Mat4([[f32; 4]; 4]),
}

impl UniformValue {
    pub fn kind(&self) -> UniformKind {
        match self {
            UniformValue::Float(_) => UniformKind::Float,
            UniformValue::Vec3(_) => UniformKind::Vec3,
            UniformValue::Mat4(_) => UniformKind::Mat4,
        }
    }

    fn bytes(&self) -> &[u8] {
        match self {
            UniformValue::Float(v) => bytemuck::bytes_of(v),
            UniformValue::Vec3(v) => bytemuck::cast_slice(v),
            UniformValue::Mat4(m) => bytemuck::cast_slice(m),
        }
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        UniformValue::Float(v)
    }
}

impl From<Vec3> for UniformValue {
    fn from(v: Vec3) -> Self {
        UniformValue::Vec3(v.to_array())
    }
}

impl From<Mat4> for UniformValue {
    fn from(m: Mat4) -> Self {
        UniformValue::Mat4(m.to_cols_array_2d())
    }
}

/// Resolved uniform slot: a byte offset into the program's uniform block.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct UniformLocation {
    pub offset: usize,
    pub kind: UniformKind,
}

/// Named uniform interface of a shader program.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformLayout {
    entries: Vec<(String, UniformLocation)>,
    size: usize,
}

impl UniformLayout {
    /// Builds a layout from `(name, kind)` pairs using WGSL uniform
    /// address-space rules: scalars align to 4, `vec3` and `mat4x4` to 16, and
    /// the block size is rounded up to 16.
    pub fn new(fields: &[(&str, UniformKind)]) -> Self {
        let mut entries = Vec::with_capacity(fields.len());
        let mut offset = 0usize;

        for &(name, kind) in fields {
            let align = match kind {
                UniformKind::Float => 4,
                UniformKind::Vec3 | UniformKind::Mat4 => 16,
            };
            offset = offset.next_multiple_of(align);
            entries.push((name.to_string(), UniformLocation { offset, kind }));
            offset += kind.size();
        }

        Self::from_locations(entries, offset)
    }

    /// Builds a layout from already-placed slots, e.g. reflected from shader
    /// source. `size` is rounded up to 16.
    pub fn from_locations(entries: Vec<(String, UniformLocation)>, size: usize) -> Self {
        Self {
            entries,
            size: size.next_multiple_of(16).max(16),
        }
    }

    /// The Phong block shared by the built-in vertex and fragment stages.
    pub fn phong() -> Self {
        Self::new(&[
            ("model", UniformKind::Mat4),
            ("view", UniformKind::Mat4),
            ("projection", UniformKind::Mat4),
            ("ka", UniformKind::Vec3),
            ("p", UniformKind::Float),
            ("kd", UniformKind::Vec3),
            ("Ia", UniformKind::Float),
            ("ks", UniformKind::Vec3),
            ("lightPos", UniformKind::Vec3),
            ("lightColor", UniformKind::Vec3),
            ("viewPos", UniformKind::Vec3),
        ])
    }

    /// Looks a uniform up by its exact name. Unknown names return `None`.
    pub fn location(&self, name: &str) -> Option<UniformLocation> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, loc)| *loc)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Block size in bytes.
    pub fn size(&self) -> usize {
        self.size
    }
}

/// CPU copy of a uniform block, uploaded once per draw.
#[derive(Debug, Clone)]
pub struct UniformBlock {
    bytes: Vec<u8>,
}

impl UniformBlock {
    pub fn new(layout: &UniformLayout) -> Self {
        Self {
            bytes: vec![0; layout.size()],
        }
    }

    /// Writes `value` at `location`.
    ///
    /// A value whose kind does not match the slot, or a slot outside the block,
    /// is dropped with a warning.
    pub fn write(&mut self, location: UniformLocation, value: UniformValue) -> bool {
        if value.kind() != location.kind {
            log::warn!(
                "uniform at offset {} expects {:?}, got {:?}; value dropped",
                location.offset,
                location.kind,
                value.kind()
            );
            return false;
        }

        let src = value.bytes();
        let Some(dst) = self.bytes.get_mut(location.offset..location.offset + src.len()) else {
            log::warn!("uniform at offset {} lies outside the block", location.offset);
            return false;
        };
        dst.copy_from_slice(src);
        true
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}
