use std::f32::consts::TAU;

use bevy::asset::RenderAssetUsages;
use bevy::mesh::{Indices, PrimitiveTopology};
use bevy::prelude::*;

use crate::frame;
use crate::params::{MAX_SEGMENTS, MIN_SEGMENTS, TreeConfig, TreeParams};
use crate::skeleton::{Branch, Section, Skeleton, TwigPlacement};

/// Upward lean added to the outward normal of every twig quad.
const TWIG_TILT: f32 = 0.25;

/// Flat vertex and index buffers of one triangle-list mesh.
///
/// `positions` and `normals` hold three floats per vertex, `uvs` two, and
/// `indices` three per counter-clockwise triangle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshBuffers {
    pub positions: Vec<f32>,
    pub normals: Vec<f32>,
    pub uvs: Vec<f32>,
    pub indices: Vec<u32>,
}

impl MeshBuffers {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    fn push_vertex(&mut self, position: Vec3, normal: Vec3, uv: [f32; 2]) -> u32 {
        let index = self.vertex_count() as u32;
        self.positions.extend_from_slice(&position.to_array());
        self.normals.extend_from_slice(&normal.to_array());
        self.uvs.extend_from_slice(&uv);
        index
    }

    pub fn to_mesh(&self) -> Mesh {
        let positions: Vec<[f32; 3]> = self
            .positions
            .chunks_exact(3)
            .map(|p| [p[0], p[1], p[2]])
            .collect();
        let normals: Vec<[f32; 3]> = self
            .normals
            .chunks_exact(3)
            .map(|n| [n[0], n[1], n[2]])
            .collect();
        let uvs: Vec<[f32; 2]> = self.uvs.chunks_exact(2).map(|uv| [uv[0], uv[1]]).collect();

        let mut mesh = Mesh::new(
            PrimitiveTopology::TriangleList,
            RenderAssetUsages::default(),
        );
        mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
        mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
        mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, uvs);
        mesh.insert_indices(Indices::U32(self.indices.clone()));
        mesh
    }
}

/// The two independent meshes of a generated tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreeMesh {
    /// Bark: one ring of vertices per branch section.
    pub branches: MeshBuffers,
    /// Foliage: one quad per twig placement.
    pub twigs: MeshBuffers,
}

/// A ring already written to the vertex buffer.
#[derive(Clone)]
struct Ring {
    indices: Vec<u32>,
    /// Frame used to lay out the ring; children seed their own frame from it.
    forward: Vec3,
    side: Vec3,
    v: f32,
}

pub struct TreeMeshBuilder {
    segments: u32,
    v_multiplier: f32,
    twig_scale: f32,
}

impl Default for TreeMeshBuilder {
    fn default() -> Self {
        let config = TreeConfig::default();
        Self {
            segments: config.segments,
            v_multiplier: config.v_multiplier,
            twig_scale: config.twig_scale,
        }
    }
}

impl TreeMeshBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_params(params: &TreeParams) -> Self {
        let config = params.config();
        Self::new()
            .with_segments(config.segments)
            .with_v_multiplier(config.v_multiplier)
            .with_twig_scale(config.twig_scale)
    }

    pub fn with_segments(mut self, segments: u32) -> Self {
        self.segments = segments.clamp(MIN_SEGMENTS, MAX_SEGMENTS);
        self
    }

    pub fn with_v_multiplier(mut self, v_multiplier: f32) -> Self {
        self.v_multiplier = v_multiplier;
        self
    }

    pub fn with_twig_scale(mut self, twig_scale: f32) -> Self {
        self.twig_scale = twig_scale;
        self
    }

    pub fn build(&self, skeleton: &Skeleton) -> TreeMesh {
        TreeMesh {
            branches: self.build_branches(skeleton),
            twigs: self.build_twigs(skeleton),
        }
    }

    fn build_branches(&self, skeleton: &Skeleton) -> MeshBuffers {
        let mut data = MeshBuffers::default();
        let mut rings: Vec<Vec<Ring>> = vec![Vec::new(); skeleton.len()];

        for id in skeleton.pre_order() {
            let branch = skeleton.branch(id);
            let attachment = match (branch.parent, branch.parent_section) {
                (Some(parent), Some(section)) => rings[parent.index()].get(section).cloned(),
                _ => None,
            };
            if branch.parent.is_some() && attachment.is_none() {
                continue;
            }
            rings[id.index()] = self.process_branch(&mut data, branch, attachment);
        }

        data
    }

    fn process_branch(
        &self,
        data: &mut MeshBuffers,
        branch: &Branch,
        attachment: Option<Ring>,
    ) -> Vec<Ring> {
        let points = &branch.sections;
        if points.is_empty() {
            return Vec::new();
        }

        let mut rings = Vec::with_capacity(points.len());
        let first_tangent = miter_tangent(points, 0);
        match attachment {
            Some(parent) => rings.push(Self::share_ring(&parent, first_tangent)),
            None => {
                let side = frame::side_vector(first_tangent, Vec3::X);
                rings.push(self.add_ring(data, &points[0], first_tangent, side, 0.0));
            }
        }

        for i in 1..points.len() {
            let previous = &rings[i - 1];
            let tangent = miter_tangent(points, i);
            // Re-orthogonalize the previous side vector rather than rotating it,
            // so the frame cannot accumulate twist along the branch.
            let side = frame::side_vector(tangent, previous.side);
            let v = previous.v
                + points[i].position.distance(points[i - 1].position) * self.v_multiplier;
            let ring = self.add_ring(data, &points[i], tangent, side, v);
            Self::connect_rings(data, &previous.indices, &ring.indices);
            rings.push(ring);
        }

        rings
    }

    /// Reuses a parent ring as the first ring of a child heading along
    /// `tangent`. When the child points against the parent the ring is walked
    /// backwards so its winding matches the child's frame.
    fn share_ring(parent: &Ring, tangent: Vec3) -> Ring {
        let indices = if tangent.dot(parent.forward) < 0.0 {
            let n = parent.indices.len();
            (0..n).map(|i| parent.indices[(n - i) % n]).collect()
        } else {
            parent.indices.clone()
        };
        Ring {
            indices,
            forward: tangent,
            side: frame::side_vector(tangent, parent.side),
            v: parent.v,
        }
    }

    fn add_ring(
        &self,
        data: &mut MeshBuffers,
        section: &Section,
        forward: Vec3,
        side: Vec3,
        v: f32,
    ) -> Ring {
        let lateral = forward.cross(side);
        let mut indices = Vec::with_capacity(self.segments as usize);

        for i in 0..self.segments {
            let u = i as f32 / self.segments as f32;
            let (sin, cos) = (u * TAU).sin_cos();
            let normal = side * cos + lateral * sin;
            let position = section.position + normal * section.radius;
            indices.push(data.push_vertex(position, normal, [u, v]));
        }

        Ring {
            indices,
            forward,
            side,
            v,
        }
    }

    fn connect_rings(data: &mut MeshBuffers, bottom: &[u32], top: &[u32]) {
        let n = bottom.len().min(top.len());
        for i in 0..n {
            let next = (i + 1) % n;
            data.indices.extend_from_slice(&[bottom[i], bottom[next], top[i]]);
            data.indices.extend_from_slice(&[bottom[next], top[next], top[i]]);
        }
    }

    fn build_twigs(&self, skeleton: &Skeleton) -> MeshBuffers {
        let mut data = MeshBuffers::default();
        for twig in skeleton.twigs() {
            self.add_twig(&mut data, twig);
        }
        data
    }

    fn add_twig(&self, data: &mut MeshBuffers, twig: &TwigPlacement) {
        let normal = (twig.outward + Vec3::Y * TWIG_TILT)
            .try_normalize()
            .unwrap_or(twig.outward);
        let along = (twig.tangent - normal * twig.tangent.dot(normal))
            .try_normalize()
            .unwrap_or_else(|| frame::side_vector(normal, Vec3::Y));
        let side = along.cross(normal);

        let half_width = side * (self.twig_scale * 0.5);
        let length = along * (self.twig_scale * 2.0);
        let base = twig.position;

        let a = data.push_vertex(base - half_width, normal, [0.0, 0.0]);
        let b = data.push_vertex(base + half_width, normal, [1.0, 0.0]);
        let c = data.push_vertex(base + half_width + length, normal, [1.0, 1.0]);
        let d = data.push_vertex(base - half_width + length, normal, [0.0, 1.0]);
        data.indices.extend_from_slice(&[a, b, c, a, c, d]);
    }
}

/// Tangent at section `i`, averaging the incoming and outgoing spans so rings
/// at bends sit on the bisecting plane.
fn miter_tangent(points: &[Section], i: usize) -> Vec3 {
    let outgoing = points
        .get(i + 1)
        .and_then(|next| (next.position - points[i].position).try_normalize());
    let incoming = i
        .checked_sub(1)
        .and_then(|prev| (points[i].position - points[prev].position).try_normalize());

    match (incoming, outgoing) {
        (Some(v_in), Some(v_out)) => {
            let sum = v_in + v_out;
            if sum.length_squared() < 0.001 {
                v_in
            } else {
                sum.normalize()
            }
        }
        (Some(v), None) | (None, Some(v)) => v,
        (None, None) => points[i].direction.try_normalize().unwrap_or(Vec3::Y),
    }
}
