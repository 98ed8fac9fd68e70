use bevy::mesh::{Indices, VertexAttributeValues};
use bevy::prelude::*;
use bevy_proctree::{
    MeshBuffers, Skeleton, TreeConfig, TreeError, TreeMeshBuilder, build_skeleton, generate,
};

fn trunk_only() -> TreeConfig {
    TreeConfig {
        max_radius: 0.05,
        taper_rate: 0.947,
        trunk_length: 0.1,
        ..TreeConfig::default()
            .with_seed(1)
            .with_levels(0)
            .with_tree_steps(8)
            .with_segments(6)
    }
}

fn vec3_at(values: &[f32], index: u32) -> Vec3 {
    let i = index as usize * 3;
    Vec3::new(values[i], values[i + 1], values[i + 2])
}

fn assert_valid_topology(buffers: &MeshBuffers, label: &str) {
    let vertices = buffers.vertex_count();
    assert_eq!(buffers.positions.len() % 3, 0, "{label}: ragged positions");
    assert_eq!(buffers.normals.len(), buffers.positions.len(), "{label}: normal parity");
    assert_eq!(buffers.uvs.len() / 2, vertices, "{label}: uv parity");
    assert_eq!(buffers.indices.len() % 3, 0, "{label}: index count not a multiple of 3");
    assert!(
        buffers.indices.iter().all(|&i| (i as usize) < vertices),
        "{label}: index out of range"
    );
}

#[test]
fn test_trunk_only_vertex_count() {
    let tree = generate(&trunk_only()).unwrap();
    assert_eq!(tree.branches.vertex_count(), 48, "8 rings of 6 vertices");
    assert_eq!(tree.branches.triangle_count(), 7 * 6 * 2);
    assert!(tree.twigs.is_empty());
    assert!(tree.twigs.indices.is_empty());
}

#[test]
fn test_meshes_are_well_formed() {
    for seed in [1, 2, 3, 256, 999] {
        let tree = generate(&TreeConfig::default().with_seed(seed)).unwrap();
        assert!(!tree.branches.is_empty());
        assert!(!tree.twigs.is_empty());
        assert_valid_topology(&tree.branches, "branches");
        assert_valid_topology(&tree.twigs, "twigs");
        assert!(tree.branches.positions.iter().all(|v| v.is_finite()));
    }
}

#[test]
fn test_branch_normals_are_unit_length() {
    let tree = generate(&TreeConfig::default()).unwrap();
    for n in tree.branches.normals.chunks_exact(3) {
        let length = Vec3::new(n[0], n[1], n[2]).length();
        assert!((length - 1.0).abs() < 1e-4, "normal length {length}");
    }
}

#[test]
fn test_trunk_triangles_face_outward() {
    let tree = generate(&trunk_only()).unwrap();
    let buffers = &tree.branches;

    for tri in buffers.indices.chunks_exact(3) {
        let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| vec3_at(&buffers.positions, i));
        let face = (b - a).cross(c - a);
        let vertex_normals = vec3_at(&buffers.normals, tri[0])
            + vec3_at(&buffers.normals, tri[1])
            + vec3_at(&buffers.normals, tri[2]);
        assert!(face.dot(vertex_normals) > 0.0, "triangle {tri:?} faces inward");
    }
}

#[test]
fn test_ring_uvs_wrap_and_climb() {
    let config = trunk_only();
    let tree = generate(&config).unwrap();
    let segments = config.segments as usize;

    let uvs: Vec<[f32; 2]> = tree.branches.uvs.chunks_exact(2).map(|c| [c[0], c[1]]).collect();
    for ring in uvs.chunks_exact(segments) {
        for (i, uv) in ring.iter().enumerate() {
            assert!((uv[0] - i as f32 / segments as f32).abs() < 1e-6);
            assert_eq!(uv[1], ring[0][1], "v constant around a ring");
        }
    }
    assert_eq!(uvs[0][1], 0.0);

    let last_v = uvs[uvs.len() - 1][1];
    let expected = config.trunk_length * config.v_multiplier;
    assert!((last_v - expected).abs() < 1e-4, "v at the tip {last_v}");
}

#[test]
fn test_children_share_parent_rings() {
    let config = TreeConfig::default().with_levels(2);
    let skeleton = build_skeleton(&config).unwrap();
    let tree = generate(&config).unwrap();

    let rings: usize = skeleton
        .branches()
        .iter()
        .map(|b| {
            if b.parent.is_some() {
                b.sections.len() - 1
            } else {
                b.sections.len()
            }
        })
        .sum();
    assert_eq!(tree.branches.vertex_count(), rings * config.segments as usize);

    let spans: usize = skeleton.branches().iter().map(|b| b.sections.len() - 1).sum();
    assert_eq!(tree.branches.triangle_count(), spans * config.segments as usize * 2);
}

#[test]
fn test_generation_is_bit_identical() {
    let config = TreeConfig::default().with_seed(77);
    let a = generate(&config).unwrap();
    let b = generate(&config).unwrap();

    let bits = |values: &[f32]| values.iter().map(|v| v.to_bits()).collect::<Vec<_>>();
    assert_eq!(bits(&a.branches.positions), bits(&b.branches.positions));
    assert_eq!(bits(&a.branches.normals), bits(&b.branches.normals));
    assert_eq!(bits(&a.twigs.positions), bits(&b.twigs.positions));
    assert_eq!(a.branches.indices, b.branches.indices);
    assert_eq!(a, b);
}

#[test]
fn test_seed_changes_shape_not_counts() {
    let a = generate(&TreeConfig::default().with_seed(1)).unwrap();
    let b = generate(&TreeConfig::default().with_seed(2)).unwrap();

    assert_eq!(a.branches.vertex_count(), b.branches.vertex_count());
    assert_eq!(a.branches.indices.len(), b.branches.indices.len());
    assert_eq!(a.twigs.vertex_count(), b.twigs.vertex_count());
    assert_ne!(a.branches.positions, b.branches.positions);
}

#[test]
fn test_invalid_config_produces_no_geometry() {
    let result = generate(&TreeConfig::default().with_segments(2));
    assert!(matches!(
        result,
        Err(TreeError::InvalidConfiguration { field: "segments", .. })
    ));
    assert!(generate(&TreeConfig::default().with_max_radius(0.0)).is_err());
}

#[test]
fn test_twig_quads() {
    let config = TreeConfig::default();
    let skeleton = build_skeleton(&config).unwrap();
    let tree = generate(&config).unwrap();
    let twigs = &tree.twigs;

    assert_eq!(twigs.vertex_count(), skeleton.twigs().len() * 4);
    assert_eq!(twigs.indices.len(), skeleton.twigs().len() * 6);

    for (quad, placement) in skeleton.twigs().iter().enumerate() {
        let base = quad as u32 * 4;
        assert_eq!(
            &twigs.indices[quad * 6..quad * 6 + 6],
            &[base, base + 1, base + 2, base, base + 2, base + 3]
        );
        assert_eq!(
            &twigs.uvs[quad * 8..quad * 8 + 8],
            &[0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0]
        );

        let normal = vec3_at(&twigs.normals, base);
        assert!((normal.length() - 1.0).abs() < 1e-4);
        assert!(normal.dot(placement.outward) > 0.0);

        let [a, b, c] = [base, base + 1, base + 2].map(|i| vec3_at(&twigs.positions, i));
        assert!(((b - a).length() - config.twig_scale).abs() < 1e-4);
        assert!(((c - b).length() - config.twig_scale * 2.0).abs() < 1e-4);
        assert!((b - a).cross(c - a).dot(normal) > 0.0, "quad winding");
    }
}

#[test]
fn test_empty_skeleton_gives_empty_meshes() {
    let tree = TreeMeshBuilder::new().build(&Skeleton::new());
    assert!(tree.branches.is_empty());
    assert!(tree.twigs.is_empty());
    assert_eq!(tree.branches.triangle_count(), 0);
}

#[test]
fn test_builder_clamps_segments() {
    let skeleton = build_skeleton(&trunk_only()).unwrap();
    let tree = TreeMeshBuilder::new().with_segments(1).build(&skeleton);
    assert_eq!(tree.branches.vertex_count(), 8 * 3);
}

#[test]
fn test_to_mesh_preserves_buffers() {
    let tree = generate(&TreeConfig::default()).unwrap();
    let mesh = tree.branches.to_mesh();

    assert_eq!(mesh.count_vertices(), tree.branches.vertex_count());
    match mesh.attribute(Mesh::ATTRIBUTE_NORMAL) {
        Some(VertexAttributeValues::Float32x3(normals)) => {
            assert_eq!(normals.len(), tree.branches.vertex_count())
        }
        other => panic!("unexpected normal attribute: {other:?}"),
    }
    assert!(mesh.attribute(Mesh::ATTRIBUTE_UV_0).is_some());
    match mesh.indices() {
        Some(Indices::U32(indices)) => assert_eq!(indices, &tree.branches.indices),
        other => panic!("unexpected indices: {other:?}"),
    }
}
