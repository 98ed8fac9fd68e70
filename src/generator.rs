use tracing::debug;

use crate::error::TreeError;
use crate::mesher::{TreeMesh, TreeMeshBuilder};
use crate::params::{TreeConfig, TreeParams};
use crate::skeleton::Skeleton;

/// Generates the bark and twig meshes of the tree described by `config`.
///
/// The result is a pure function of `config`: calling this twice with equal
/// configurations yields identical buffers. Invalid configurations are
/// rejected before any geometry is produced.
#[tracing::instrument(level = "debug", skip_all, fields(seed = config.seed, levels = config.levels))]
pub fn generate(config: &TreeConfig) -> Result<TreeMesh, TreeError> {
    let params = TreeParams::from_config(config)?;
    let skeleton = Skeleton::build(&params);
    let mesh = TreeMeshBuilder::from_params(&params).build(&skeleton);
    debug!(
        branch_vertices = mesh.branches.vertex_count(),
        branch_triangles = mesh.branches.triangle_count(),
        twig_vertices = mesh.twigs.vertex_count(),
        "tree generated"
    );
    Ok(mesh)
}

/// Builds only the branch skeleton, without emitting geometry.
pub fn build_skeleton(config: &TreeConfig) -> Result<Skeleton, TreeError> {
    let params = TreeParams::from_config(config)?;
    Ok(Skeleton::build(&params))
}
