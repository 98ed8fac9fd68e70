//! Capsule collider generation for tree skeletons.
//!
//! Builds physics shapes by placing one capsule along every span between two
//! consecutive branch sections. This is far cheaper than a convex
//! decomposition of the bark mesh and follows the branches closely.

use avian3d::prelude::Collider;
use bevy::prelude::*;

use crate::skeleton::{Section, Skeleton};

/// A positioned capsule collider ready to be spawned into the world.
#[derive(Debug, Clone)]
pub struct PositionedCollider {
    /// Tree-space transform for the collider center.
    pub transform: Transform,
    /// The capsule collider shape.
    pub collider: Collider,
    /// Average radius of the span.
    pub radius: f32,
    /// Length of the span.
    pub length: f32,
}

/// Generates capsule colliders from tree skeletons.
///
/// Spans thinner than the minimum radius are skipped, which keeps twiggy
/// crowns from flooding the physics world.
#[derive(Default)]
pub struct ColliderGenerator {
    min_radius: f32,
    max_level: Option<u32>,
}

impl ColliderGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spans with an average radius below this threshold get no collider.
    pub fn with_min_radius(mut self, min_radius: f32) -> Self {
        self.min_radius = min_radius.max(0.0);
        self
    }

    /// Ignores branches deeper than `level` (the trunk is level 0).
    pub fn with_max_level(mut self, level: u32) -> Self {
        self.max_level = Some(level);
        self
    }

    /// Generates a single compound collider for the entire skeleton.
    ///
    /// Returns `None` if no span qualifies.
    pub fn build(&self, skeleton: &Skeleton) -> Option<Collider> {
        let parts = self.build_parts(skeleton);
        if parts.is_empty() {
            return None;
        }
        Some(Collider::compound(
            parts
                .into_iter()
                .map(|p| (p.transform.translation, p.transform.rotation, p.collider))
                .collect::<Vec<_>>(),
        ))
    }

    /// Generates individual positioned colliders for each qualifying span.
    ///
    /// Prefer [`build`](Self::build) unless you need per-span access.
    pub fn build_parts(&self, skeleton: &Skeleton) -> Vec<PositionedCollider> {
        let mut colliders = Vec::new();

        for branch in skeleton.branches() {
            if self.max_level.is_some_and(|max| branch.level > max) {
                continue;
            }
            for span in branch.sections.windows(2) {
                if let Some(collider) = self.span_collider(&span[0], &span[1]) {
                    colliders.push(collider);
                }
            }
        }

        colliders
    }

    fn span_collider(&self, start: &Section, end: &Section) -> Option<PositionedCollider> {
        let avg_radius = (start.radius + end.radius) * 0.5;
        if avg_radius < self.min_radius {
            return None;
        }

        let segment_vec = end.position - start.position;
        let length = segment_vec.length();
        if length < 0.0001 {
            return None;
        }

        let center = (start.position + end.position) * 0.5;
        // Avian capsules are aligned with +Y.
        let rotation = Quat::from_rotation_arc(Vec3::Y, segment_vec / length);

        // A capsule shorter than its diameter would poke out past both ends.
        let collider = if length < 2.0 * avg_radius {
            Collider::sphere(avg_radius)
        } else {
            Collider::capsule(avg_radius, length - 2.0 * avg_radius)
        };

        Some(PositionedCollider {
            transform: Transform::from_translation(center).with_rotation(rotation),
            collider,
            radius: avg_radius,
            length,
        })
    }
}
