//! Export utilities for writing generated trees to standard 3D file formats.
//!
//! Supports OBJ (text) and GLB (binary glTF 2.0). These are pure data
//! conversions over [`TreeMesh`] buffers with no Bevy system dependencies; call
//! them from your own export systems or CLI tools.

use std::fmt::Write as _;

use crate::materials::{MaterialSettings, TreeMaterialSettings};
use crate::mesher::{MeshBuffers, TreeMesh};

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Obj,
    Glb,
}

impl ExportFormat {
    pub const ALL: &'static [ExportFormat] = &[ExportFormat::Obj, ExportFormat::Glb];

    pub fn name(&self) -> &'static str {
        match self {
            ExportFormat::Obj => "OBJ",
            ExportFormat::Glb => "GLB",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Obj => "obj",
            ExportFormat::Glb => "glb",
        }
    }
}

/// Serializes `tree` in `format`. OBJ output carries no materials.
pub fn export_tree(
    tree: &TreeMesh,
    format: ExportFormat,
    base_name: &str,
    materials: &TreeMaterialSettings,
) -> Vec<u8> {
    match format {
        ExportFormat::Obj => tree_to_obj(tree, base_name).into_bytes(),
        ExportFormat::Glb => tree_to_glb(tree, materials),
    }
}

/// The non-empty buffer sets of a tree with their object suffix and material.
fn parts<'a>(
    tree: &'a TreeMesh,
    materials: &'a TreeMaterialSettings,
) -> impl Iterator<Item = (&'static str, &'a MeshBuffers, &'a MaterialSettings)> {
    [
        ("bark", &tree.branches, &materials.bark),
        ("twigs", &tree.twigs, &materials.twig),
    ]
    .into_iter()
    .filter(|(_, buffers, _)| !buffers.is_empty())
}

// ---------------------------------------------------------------------------
// OBJ Export
// ---------------------------------------------------------------------------

/// Converts a tree to OBJ text with one object per non-empty mesh, named
/// `{base_name}_bark` and `{base_name}_twigs`.
///
/// Returns the combined OBJ text (without header comments; prepend your own).
pub fn tree_to_obj(tree: &TreeMesh, base_name: &str) -> String {
    let defaults = TreeMaterialSettings::default();
    let mut combined = String::new();
    let mut vertex_offset = 0u32;

    for (suffix, buffers, _) in parts(tree, &defaults) {
        let object_name = format!("{}_{}", base_name, suffix);
        combined.push_str(&buffers_to_obj(buffers, &object_name, vertex_offset));
        vertex_offset += buffers.vertex_count() as u32;
    }

    combined
}

/// Converts one buffer set to OBJ text.
///
/// `vertex_offset` is added to all vertex indices for combining multiple meshes
/// into a single OBJ file. Pass `0` for a standalone mesh.
pub fn buffers_to_obj(buffers: &MeshBuffers, object_name: &str, vertex_offset: u32) -> String {
    let mut obj = String::new();
    let _ = writeln!(obj, "o {}", object_name);

    for p in buffers.positions.chunks_exact(3) {
        let _ = writeln!(obj, "v {} {} {}", p[0], p[1], p[2]);
    }
    for uv in buffers.uvs.chunks_exact(2) {
        let _ = writeln!(obj, "vt {} {}", uv[0], uv[1]);
    }
    for n in buffers.normals.chunks_exact(3) {
        let _ = writeln!(obj, "vn {} {} {}", n[0], n[1], n[2]);
    }

    for tri in buffers.indices.chunks_exact(3) {
        let (a, b, c) = (
            tri[0] + 1 + vertex_offset,
            tri[1] + 1 + vertex_offset,
            tri[2] + 1 + vertex_offset,
        );
        let _ = writeln!(obj, "f {a}/{a}/{a} {b}/{b}/{b} {c}/{c}/{c}");
    }

    obj
}

// ---------------------------------------------------------------------------
// GLB (Binary glTF 2.0) Export
// ---------------------------------------------------------------------------

const ARRAY_BUFFER: u32 = 34962;
const ELEMENT_ARRAY_BUFFER: u32 = 34963;
const FLOAT: u32 = 5126;
const UNSIGNED_INT: u32 = 5125;

/// Converts a tree and its material settings to GLB (binary glTF 2.0).
///
/// Each non-empty buffer set becomes its own glTF mesh, node and PBR
/// metallic-roughness material. Alpha-tested materials export as `MASK`.
pub fn tree_to_glb(tree: &TreeMesh, materials: &TreeMaterialSettings) -> Vec<u8> {
    let mut glb = GlbBuilder::default();
    for (mesh_idx, (suffix, buffers, settings)) in parts(tree, materials).enumerate() {
        glb.add_material(suffix, settings);
        glb.add_mesh(suffix, buffers, mesh_idx);
    }
    glb.finish()
}

#[derive(Default)]
struct GlbBuilder {
    bin_buffer: Vec<u8>,
    buffer_views: Vec<String>,
    accessors: Vec<String>,
    meshes: Vec<String>,
    nodes: Vec<String>,
    materials: Vec<String>,
}

impl GlbBuilder {
    fn add_material(&mut self, name: &str, s: &MaterialSettings) {
        let alpha = match s.alpha_cutoff {
            Some(cutoff) => format!(",\"alphaMode\":\"MASK\",\"alphaCutoff\":{:.4}", cutoff),
            None => String::new(),
        };
        self.materials.push(format!(
            concat!(
                "{{",
                "\"name\":\"{}\",",
                "\"pbrMetallicRoughness\":{{",
                "\"baseColorFactor\":[{:.4},{:.4},{:.4},1.0],",
                "\"metallicFactor\":{:.4},",
                "\"roughnessFactor\":{:.4}",
                "}},",
                "\"doubleSided\":{}{}",
                "}}"
            ),
            name,
            s.base_color[0],
            s.base_color[1],
            s.base_color[2],
            s.metallic,
            s.roughness,
            s.double_sided,
            alpha,
        ));
    }

    /// Appends raw bytes as a new buffer view and returns its index.
    fn push_view(&mut self, bytes: impl Iterator<Item = [u8; 4]>, target: u32) -> usize {
        let offset = self.bin_buffer.len();
        for chunk in bytes {
            self.bin_buffer.extend_from_slice(&chunk);
        }
        let length = self.bin_buffer.len() - offset;
        self.buffer_views.push(format!(
            "{{\"buffer\":0,\"byteOffset\":{},\"byteLength\":{},\"target\":{}}}",
            offset, length, target
        ));
        self.buffer_views.len() - 1
    }

    fn add_mesh(&mut self, name: &str, buffers: &MeshBuffers, mesh_idx: usize) {
        let vertex_count = buffers.vertex_count();

        // Position bounds are required by the glTF spec for POSITION accessors.
        let mut min = [f32::MAX; 3];
        let mut max = [f32::MIN; 3];
        for pos in buffers.positions.chunks_exact(3) {
            for i in 0..3 {
                min[i] = min[i].min(pos[i]);
                max[i] = max[i].max(pos[i]);
            }
        }

        let mut attr_entries = Vec::new();

        // --- Positions ---
        let view = self.push_view(
            buffers.positions.iter().map(|f| f.to_le_bytes()),
            ARRAY_BUFFER,
        );
        attr_entries.push(format!("\"POSITION\":{}", self.accessors.len()));
        self.accessors.push(format!(
            concat!(
                "{{\"bufferView\":{},\"componentType\":{},\"count\":{},\"type\":\"VEC3\",",
                "\"min\":[{:.6},{:.6},{:.6}],\"max\":[{:.6},{:.6},{:.6}]}}"
            ),
            view, FLOAT, vertex_count, min[0], min[1], min[2], max[0], max[1], max[2],
        ));

        // --- Normals ---
        let view = self.push_view(
            buffers.normals.iter().map(|f| f.to_le_bytes()),
            ARRAY_BUFFER,
        );
        attr_entries.push(format!("\"NORMAL\":{}", self.accessors.len()));
        self.accessors.push(format!(
            "{{\"bufferView\":{},\"componentType\":{},\"count\":{},\"type\":\"VEC3\"}}",
            view, FLOAT, vertex_count,
        ));

        // --- UVs ---
        let view = self.push_view(buffers.uvs.iter().map(|f| f.to_le_bytes()), ARRAY_BUFFER);
        attr_entries.push(format!("\"TEXCOORD_0\":{}", self.accessors.len()));
        self.accessors.push(format!(
            "{{\"bufferView\":{},\"componentType\":{},\"count\":{},\"type\":\"VEC2\"}}",
            view, FLOAT, vertex_count,
        ));

        // --- Indices ---
        let view = self.push_view(
            buffers.indices.iter().map(|i| i.to_le_bytes()),
            ELEMENT_ARRAY_BUFFER,
        );
        let indices_accessor = self.accessors.len();
        self.accessors.push(format!(
            "{{\"bufferView\":{},\"componentType\":{},\"count\":{},\"type\":\"SCALAR\"}}",
            view,
            UNSIGNED_INT,
            buffers.indices.len(),
        ));

        self.meshes.push(format!(
            "{{\"name\":\"{}\",\"primitives\":[{{\"attributes\":{{{}}},\"indices\":{},\"material\":{}}}]}}",
            name,
            attr_entries.join(","),
            indices_accessor,
            mesh_idx
        ));
        self.nodes
            .push(format!("{{\"name\":\"{}\",\"mesh\":{}}}", name, mesh_idx));
    }

    fn finish(self) -> Vec<u8> {
        if self.nodes.is_empty() {
            return build_empty_glb();
        }

        let node_indices: String = (0..self.nodes.len())
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join(",");

        let json = format!(
            concat!(
                "{{",
                "\"asset\":{{\"version\":\"2.0\",\"generator\":\"bevy_proctree\"}},",
                "\"scene\":0,",
                "\"scenes\":[{{\"name\":\"Tree\",\"nodes\":[{}]}}],",
                "\"nodes\":[{}],",
                "\"meshes\":[{}],",
                "\"materials\":[{}],",
                "\"accessors\":[{}],",
                "\"bufferViews\":[{}],",
                "\"buffers\":[{{\"byteLength\":{}}}]",
                "}}"
            ),
            node_indices,
            self.nodes.join(","),
            self.meshes.join(","),
            self.materials.join(","),
            self.accessors.join(","),
            self.buffer_views.join(","),
            self.bin_buffer.len(),
        );

        pack_glb(&json, &self.bin_buffer)
    }
}

fn build_empty_glb() -> Vec<u8> {
    let json = r#"{"asset":{"version":"2.0","generator":"bevy_proctree"},"scene":0,"scenes":[{"name":"Empty"}]}"#;
    pack_glb(json, &[])
}

fn pack_glb(json: &str, bin_data: &[u8]) -> Vec<u8> {
    let json_bytes = json.as_bytes();
    let json_padded_len = (json_bytes.len() + 3) & !3;
    let bin_padded_len = (bin_data.len() + 3) & !3;

    let has_bin = !bin_data.is_empty();
    let bin_chunk_size = if has_bin { 8 + bin_padded_len } else { 0 };
    let total_length = 12 + 8 + json_padded_len + bin_chunk_size;

    let mut glb = Vec::with_capacity(total_length);

    // GLB Header
    glb.extend_from_slice(&0x46546C67u32.to_le_bytes()); // magic "glTF"
    glb.extend_from_slice(&2u32.to_le_bytes()); // version
    glb.extend_from_slice(&(total_length as u32).to_le_bytes());

    // JSON Chunk
    glb.extend_from_slice(&(json_padded_len as u32).to_le_bytes());
    glb.extend_from_slice(&0x4E4F534Au32.to_le_bytes()); // "JSON"
    glb.extend_from_slice(json_bytes);
    glb.resize(glb.len() + json_padded_len - json_bytes.len(), b' ');

    // BIN Chunk
    if has_bin {
        glb.extend_from_slice(&(bin_padded_len as u32).to_le_bytes());
        glb.extend_from_slice(&0x004E4942u32.to_le_bytes()); // "BIN\0"
        glb.extend_from_slice(bin_data);
        glb.resize(glb.len() + bin_padded_len - bin_data.len(), 0);
    }

    glb
}
