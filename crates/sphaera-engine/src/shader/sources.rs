use std::path::Path;

use anyhow::{Context, Result};

/// Vertex and fragment stage source text.
///
/// Labels name the origin of each stage in diagnostics (a file path or
/// `builtin:*`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSources {
    pub vertex: String,
    pub fragment: String,
    pub vertex_label: String,
    pub fragment_label: String,
}

impl ShaderSources {
    /// The Phong stages compiled into the crate.
    pub fn builtin() -> Self {
        Self {
            vertex: include_str!("shaders/phong.vert.wgsl").to_string(),
            fragment: include_str!("shaders/phong.frag.wgsl").to_string(),
            vertex_label: "builtin:phong.vert.wgsl".to_string(),
            fragment_label: "builtin:phong.frag.wgsl".to_string(),
        }
    }

    /// Reads both stages from disk. Either file being unreadable is an error.
    pub fn from_files(vertex: impl AsRef<Path>, fragment: impl AsRef<Path>) -> Result<Self> {
        let (vertex, fragment) = (vertex.as_ref(), fragment.as_ref());

        let vertex_src = std::fs::read_to_string(vertex)
            .with_context(|| format!("failed to read vertex shader `{}`", vertex.display()))?;
        let fragment_src = std::fs::read_to_string(fragment)
            .with_context(|| format!("failed to read fragment shader `{}`", fragment.display()))?;

        Ok(Self {
            vertex: vertex_src,
            fragment: fragment_src,
            vertex_label: vertex.display().to_string(),
            fragment_label: fragment.display().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn scratch(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("sphaera-{}-{name}", std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn builtin_stages_declare_entry_points() {
        let s = ShaderSources::builtin();
        assert!(s.vertex.contains("fn vs_main"));
        assert!(s.fragment.contains("fn fs_main"));
    }

    #[test]
    fn builtin_stages_declare_every_uniform() {
        let s = ShaderSources::builtin();
        for name in crate::shader::UniformLayout::phong().names() {
            let field = format!("{name}:");
            assert!(s.vertex.contains(&field), "vertex stage lacks `{name}`");
            assert!(s.fragment.contains(&field), "fragment stage lacks `{name}`");
        }
    }

    #[test]
    fn reads_both_files() {
        let vert = scratch("read.vert", "// vertex");
        let frag = scratch("read.frag", "// fragment");
        let s = ShaderSources::from_files(&vert, &frag).unwrap();
        assert_eq!(s.vertex, "// vertex");
        assert_eq!(s.fragment, "// fragment");
        assert_eq!(s.vertex_label, vert.display().to_string());
        let _ = std::fs::remove_file(vert);
        let _ = std::fs::remove_file(frag);
    }

    #[test]
    fn missing_fragment_file_is_an_error() {
        let vert = scratch("missing.vert", "// vertex");
        let frag = std::env::temp_dir().join("sphaera-does-not-exist.frag");
        let err = ShaderSources::from_files(&vert, &frag).unwrap_err();
        assert!(format!("{err:#}").contains("fragment shader"));
        let _ = std::fs::remove_file(vert);
    }
}
