use anyhow::{anyhow, bail, Result};
use naga::{AddressSpace, Scalar, TypeInner, VectorSize};

use super::{UniformKind, UniformLayout, UniformLocation};

/// Bind group and binding the uniform block is read from.
pub const UNIFORM_GROUP: u32 = 0;
pub const UNIFORM_BINDING: u32 = 0;

/// Reads the uniform interface a WGSL stage declares at
/// `@group(0) @binding(0)`.
///
/// Member names and offsets come from the shader itself. Members whose type is
/// not `f32`, `vec3<f32>` or `mat4x4<f32>` are left out. A stage without such a
/// block yields an empty layout; a stage that does not parse is an error.
pub fn reflect_uniforms(source: &str) -> Result<UniformLayout> {
    let module = naga::front::wgsl::parse_str(source)
        .map_err(|e| anyhow!("{}", e.emit_to_string(source)))?;

    let Some(global) = module.global_variables.iter().map(|(_, g)| g).find(|g| {
        g.space == AddressSpace::Uniform
            && g.binding.as_ref().is_some_and(|b| {
                b.group == UNIFORM_GROUP && b.binding == UNIFORM_BINDING
            })
    }) else {
        return Ok(UniformLayout::from_locations(Vec::new(), 0));
    };

    let TypeInner::Struct { members, span } = &module.types[global.ty].inner else {
        bail!("uniform at @group(0) @binding(0) is not a struct");
    };

    let mut entries = Vec::with_capacity(members.len());
    for member in members {
        let Some(name) = member.name.clone() else { continue };
        match uniform_kind(&module.types[member.ty].inner) {
            Some(kind) => entries.push((
                name,
                UniformLocation {
                    offset: member.offset as usize,
                    kind,
                },
            )),
            None => log::debug!("uniform member `{name}` has an unsupported type; skipped"),
        }
    }

    Ok(UniformLayout::from_locations(entries, *span as usize))
}

/// Combines the layouts of two stages sharing one block.
///
/// Names present in both must agree on offset and kind; a disagreeing name is
/// dropped from the result.
pub fn merge_layouts(vertex: &UniformLayout, fragment: &UniformLayout) -> UniformLayout {
    let mut entries: Vec<(String, UniformLocation)> = Vec::new();

    for name in vertex.names().chain(fragment.names()) {
        if entries.iter().any(|(n, _)| n == name) {
            continue;
        }
        let location = match (vertex.location(name), fragment.location(name)) {
            (Some(v), Some(f)) if v != f => {
                log::warn!("uniform `{name}` differs between stages ({v:?} vs {f:?}); dropped");
                continue;
            }
            (Some(loc), _) | (None, Some(loc)) => loc,
            (None, None) => continue,
        };
        entries.push((name.to_string(), location));
    }

    UniformLayout::from_locations(entries, vertex.size().max(fragment.size()))
}

fn uniform_kind(inner: &TypeInner) -> Option<UniformKind> {
    match *inner {
        TypeInner::Scalar(Scalar::F32) => Some(UniformKind::Float),
        TypeInner::Vector {
            size: VectorSize::Tri,
            scalar: Scalar::F32,
        } => Some(UniformKind::Vec3),
        TypeInner::Matrix {
            columns: VectorSize::Quad,
            rows: VectorSize::Quad,
            scalar: Scalar::F32,
        } => Some(UniformKind::Mat4),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::ShaderSources;

    const RENAMED: &str = r#"
        struct Block {
            model: mat4x4<f32>,
            lightPosition: vec3<f32>,
            p: f32,
        };
        @group(0) @binding(0) var<uniform> u: Block;

        @vertex
        fn vs_main(@location(0) pos: vec3<f32>) -> @builtin(position) vec4<f32> {
            return u.model * vec4<f32>(pos + u.lightPosition * u.p, 1.0);
        }
    "#;

    #[test]
    fn builtin_stages_match_phong_layout() {
        let sources = ShaderSources::builtin();
        let vertex = reflect_uniforms(&sources.vertex).unwrap();
        let fragment = reflect_uniforms(&sources.fragment).unwrap();
        assert_eq!(vertex, UniformLayout::phong());
        assert_eq!(merge_layouts(&vertex, &fragment), UniformLayout::phong());
    }

    #[test]
    fn renamed_member_is_not_found() {
        let layout = reflect_uniforms(RENAMED).unwrap();
        assert!(layout.location("lightPos").is_none());
        let loc = layout.location("lightPosition").unwrap();
        assert_eq!(loc.offset, 64);
        assert_eq!(loc.kind, UniformKind::Vec3);
        assert_eq!(layout.location("p").unwrap().offset, 76);
        assert_eq!(layout.size(), 80);
    }

    #[test]
    fn stage_without_block_has_empty_layout() {
        let src = "@fragment fn fs_main() -> @location(0) vec4<f32> { return vec4<f32>(1.0); }";
        let layout = reflect_uniforms(src).unwrap();
        assert!(layout.is_empty());
    }

    #[test]
    fn unparsable_stage_is_an_error() {
        assert!(reflect_uniforms("struct {").is_err());
    }

    #[test]
    fn unsupported_member_types_are_skipped() {
        let src = r#"
            struct Block { count: u32, tint: vec4<f32>, gain: f32 };
            @group(0) @binding(0) var<uniform> u: Block;
            @fragment fn fs_main() -> @location(0) vec4<f32> { return u.tint * u.gain * f32(u.count); }
        "#;
        let layout = reflect_uniforms(src).unwrap();
        assert_eq!(layout.names().collect::<Vec<_>>(), vec!["gain"]);
        assert_eq!(layout.location("gain").unwrap().offset, 32);
    }

    #[test]
    fn merge_drops_conflicting_names() {
        let a = UniformLayout::new(&[("x", UniformKind::Float), ("y", UniformKind::Float)]);
        let b = UniformLayout::new(&[("y", UniformKind::Float), ("z", UniformKind::Float)]);
        let merged = merge_layouts(&a, &b);
        assert_eq!(merged.location("x").unwrap().offset, 0);
        assert_eq!(merged.location("z").unwrap().offset, 4);
        // `y` sits at 4 in one stage and 0 in the other.
        assert!(merged.location("y").is_none());
    }
}
