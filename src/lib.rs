//! Deterministic procedural tree meshes for Bevy.
//!
//! Given a [`TreeConfig`] this crate grows a branching skeleton and turns it
//! into two independent triangle meshes: the bark (ring-skinned branches) and
//! the twigs (flat foliage quads). Generation is a pure function of the
//! configuration, seed included, so an application can simply regenerate the
//! whole tree whenever a parameter changes.
//!
//! # Pipeline
//!
//! 1. [`TreeParams`] validates the configuration and derives per-level
//!    lengths, radii and clumping.
//! 2. [`Skeleton`] builds the branch hierarchy and the twig placements.
//! 3. [`TreeMeshBuilder`] emits flat [`MeshBuffers`] for both meshes.
//!
//! [`generate`] runs all three stages.
//!
//! # Features
//!
//! - **Materials**: bark and twig PBR materials kept in sync by Bevy systems,
//!   see [`materials`].
//! - **Export**: OBJ and GLB export utilities via [`export`].
//! - **Physics colliders** (optional): capsule colliders along the skeleton via
//!   [`ColliderGenerator`]. Requires the `physics` feature.
//! - **Egui UI helpers** (optional): tree parameter and material editors via
//!   [`ui`]. Requires the `egui` feature.
//!
//! # Example
//!
//! ```ignore
//! use bevy::prelude::*;
//! use bevy_proctree::{generate, materials::*, TreeConfig};
//!
//! fn setup(app: &mut App) {
//!     app.add_systems(Startup, (setup_tree_materials, spawn_tree).chain())
//!        .add_systems(Update, sync_tree_materials);
//! }
//!
//! fn spawn_tree(
//!     mut commands: Commands,
//!     mut meshes: ResMut<Assets<Mesh>>,
//!     palette: Res<TreeMaterialPalette>,
//! ) {
//!     let Ok(tree) = generate(&TreeConfig::default()) else {
//!         return;
//!     };
//!     commands.spawn((
//!         Mesh3d(meshes.add(tree.branches.to_mesh())),
//!         MeshMaterial3d(palette.bark.clone()),
//!     ));
//!     commands.spawn((
//!         Mesh3d(meshes.add(tree.twigs.to_mesh())),
//!         MeshMaterial3d(palette.twig.clone()),
//!     ));
//! }
//! ```

pub mod error;
pub mod export;
mod frame;
pub mod generator;
pub mod materials;
pub mod mesher;
pub mod params;
pub mod skeleton;

#[cfg(feature = "physics")]
pub mod collider;

#[cfg(feature = "egui")]
pub mod ui;

pub use error::TreeError;
pub use generator::{build_skeleton, generate};
pub use mesher::{MeshBuffers, TreeMesh, TreeMeshBuilder};
pub use params::{LevelParams, TreeConfig, TreeParams};
pub use skeleton::{Branch, BranchId, Section, Skeleton, TwigPlacement};

#[cfg(feature = "physics")]
pub use collider::{ColliderGenerator, PositionedCollider};
