//! Branch skeleton construction.
//!
//! The skeleton is an arena of [`Branch`] records addressed by [`BranchId`].
//! Each record points back at its parent by handle, so the hierarchy has a
//! single owner (the [`Skeleton`]) and no reference cycles.
//!
//! A pseudo-random stream seeded from [`TreeConfig::seed`](crate::TreeConfig::seed)
//! decides every angle, kink and twig sample. How many children a section
//! spawns is a deterministic quota of the branch factor instead, so reseeding a
//! tree changes its shape but never its branch, vertex or index counts.

use std::f32::consts::TAU;

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use crate::frame;
use crate::params::TreeParams;

/// Upper bound on the number of branches in one skeleton.
pub const MAX_BRANCHES: usize = 65_536;

/// Upper bound on the bark vertices a skeleton may produce. Each ring costs
/// `segments` vertices, so the ring budget shrinks as rings get finer.
pub const MAX_BRANCH_VERTICES: usize = 1 << 22;

/// Upper bound on twig placements in one skeleton.
pub const MAX_TWIGS: usize = 1 << 18;

/// A child starts at most this fraction of its parent's radius at the
/// attachment section.
const CHILD_RADIUS_RATIO: f32 = 0.95;

/// Twig placements per unit of terminal branch length and unit of twig scale.
const TWIG_DENSITY: f32 = 8.0;

/// Handle of a branch inside a [`Skeleton`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BranchId(usize);

impl BranchId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One point of a branch polyline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Section {
    pub position: Vec3,
    /// Unit heading from this section towards the next one.
    pub direction: Vec3,
    pub radius: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    pub sections: Vec<Section>,
    pub parent: Option<BranchId>,
    /// Index of the parent section this branch grows out of.
    pub parent_section: Option<usize>,
    pub children: Vec<BranchId>,
    /// Recursion depth; the trunk is level 0.
    pub level: u32,
    /// Whether the branch sits at the deepest configured level.
    pub terminal: bool,
}

impl Branch {
    /// Arc length of the polyline.
    pub fn length(&self) -> f32 {
        self.sections
            .windows(2)
            .map(|pair| pair[0].position.distance(pair[1].position))
            .sum()
    }

    pub fn base_radius(&self) -> f32 {
        self.sections.first().map_or(0.0, |s| s.radius)
    }
}

/// Where a twig quad is attached to the surface of a terminal branch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TwigPlacement {
    pub branch: BranchId,
    /// Point on the branch surface.
    pub position: Vec3,
    /// Unit direction along the branch.
    pub tangent: Vec3,
    /// Unit radial direction from the branch axis through `position`.
    pub outward: Vec3,
    /// Branch radius at the attachment point.
    pub radius: f32,
}

/// The full branch hierarchy of one tree plus its twig placements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Skeleton {
    branches: Vec<Branch>,
    twigs: Vec<TwigPlacement>,
}

impl Skeleton {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grows a complete skeleton for `params`.
    pub fn build(params: &TreeParams) -> Self {
        let mut rng = StdRng::seed_from_u64(params.config().seed);

        let mut skeleton = Self::new();
        skeleton.push(grow_trunk(params, &mut rng));
        if skeleton.grow_branches(params, &mut rng) {
            warn!(
                max_branches = MAX_BRANCHES,
                max_branch_vertices = MAX_BRANCH_VERTICES,
                "geometry budget exhausted; the last level grown is incomplete"
            );
        }
        if skeleton.scatter_twigs(params, &mut rng) {
            warn!(max_twigs = MAX_TWIGS, "twig budget exhausted");
        }

        debug!(
            branches = skeleton.branches.len(),
            twigs = skeleton.twigs.len(),
            "skeleton built"
        );
        skeleton
    }

    pub fn root(&self) -> Option<BranchId> {
        if self.branches.is_empty() {
            None
        } else {
            Some(BranchId(0))
        }
    }

    pub fn branch(&self, id: BranchId) -> &Branch {
        &self.branches[id.0]
    }

    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    pub fn twigs(&self) -> &[TwigPlacement] {
        &self.twigs
    }

    pub fn len(&self) -> usize {
        self.branches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }

    /// Branch handles with every parent listed before its children.
    pub fn pre_order(&self) -> Vec<BranchId> {
        let mut order = Vec::with_capacity(self.branches.len());
        let mut stack: Vec<BranchId> = self.root().into_iter().collect();
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.branches[id.0].children.iter().rev().copied());
        }
        order
    }

    fn push(&mut self, branch: Branch) -> BranchId {
        let id = BranchId(self.branches.len());
        if let Some(parent) = branch.parent {
            self.branches[parent.0].children.push(id);
        }
        self.branches.push(branch);
        id
    }

    /// Breadth-first expansion of every non-terminal branch. Returns `true`
    /// when [`MAX_BRANCHES`] or [`MAX_BRANCH_VERTICES`] cut the hierarchy short,
    /// which can happen in the middle of a parent's sections.
    fn grow_branches(&mut self, params: &TreeParams, rng: &mut StdRng) -> bool {
        let branch_factor = params.config().branch_factor;
        let ring_budget = MAX_BRANCH_VERTICES / params.config().segments.max(1) as usize;
        let mut rings = self.branches.iter().map(|b| b.sections.len()).sum::<usize>();
        let mut cursor = 0;
        while cursor < self.branches.len() {
            let id = BranchId(cursor);
            cursor += 1;

            if self.branches[id.0].level >= params.max_level() {
                continue;
            }

            let section_count = self.branches[id.0].sections.len();
            // Children reuse their parent's ring at the attachment section.
            let child_rings = params.level(self.branches[id.0].level + 1).sections - 1;
            // Section 0 is the attachment point (or the ground for the trunk).
            for section in 1..section_count {
                for _ in 0..child_count(branch_factor, section) {
                    if self.branches.len() >= MAX_BRANCHES || rings + child_rings > ring_budget {
                        return true;
                    }
                    let child = grow_child(params, id, &self.branches[id.0], section, rng);
                    rings += child_rings;
                    self.push(child);
                }
            }
        }
        false
    }

    /// Returns `true` when [`MAX_TWIGS`] stopped the scatter early.
    fn scatter_twigs(&mut self, params: &TreeParams, rng: &mut StdRng) -> bool {
        let twig_scale = params.config().twig_scale;
        if twig_scale <= 0.0 {
            return false;
        }

        for (index, branch) in self.branches.iter().enumerate() {
            // The trunk never carries twigs, even when it is the only level.
            if !branch.terminal || branch.parent.is_none() {
                continue;
            }
            let count = (TWIG_DENSITY * params.level(branch.level).length * twig_scale).ceil();
            let count = if count.is_finite() { count as usize } else { 0 };

            let n = branch.sections.len();
            let (a, b) = (&branch.sections[n - 2], &branch.sections[n - 1]);
            let tangent = (b.position - a.position)
                .try_normalize()
                .unwrap_or(b.direction);
            let (side, lateral) = frame::basis(tangent, Vec3::Y);

            for _ in 0..count {
                if self.twigs.len() >= MAX_TWIGS {
                    return true;
                }
                let t: f32 = rng.gen_range(0.0..=1.0);
                let azimuth: f32 = rng.gen_range(0.0..TAU);
                let (sin, cos) = azimuth.sin_cos();
                let outward = side * cos + lateral * sin;
                let radius = a.radius + (b.radius - a.radius) * t;
                self.twigs.push(TwigPlacement {
                    branch: BranchId(index),
                    position: a.position.lerp(b.position, t) + outward * radius,
                    tangent,
                    outward,
                    radius,
                });
            }
        }
        false
    }
}

/// Children spawned at `section` (1-based among the spawning sections).
///
/// Counts follow a running quota of `branch_factor`, so sections `1..=n`
/// together spawn exactly `floor(n * branch_factor)` children.
fn child_count(branch_factor: f32, section: usize) -> usize {
    let quota = |s: usize| (s as f32 * branch_factor).floor() as usize;
    quota(section) - quota(section - 1)
}

fn grow_trunk(params: &TreeParams, rng: &mut StdRng) -> Branch {
    let config = params.config();
    let row = params.level(0);
    let n = row.sections;
    let spacing = params.section_spacing();
    let twist_step = config.twist_rate * TAU / n as f32;

    let mut sections = Vec::with_capacity(n);
    let mut position = Vec3::ZERO;
    let mut heading = Vec3::Y;
    for step in 0..n {
        if step > 0 {
            position += heading * spacing;
            if step + 1 < n {
                heading = kink(heading, twist_step * step as f32, params, rng);
            }
        }
        let radius = (config.max_radius * config.taper_rate.powi(step as i32)).max(row.radius_floor);
        sections.push(Section {
            position,
            direction: heading,
            radius,
        });
    }

    Branch {
        sections,
        parent: None,
        parent_section: None,
        children: Vec::new(),
        level: 0,
        terminal: params.max_level() == 0,
    }
}

/// Bends the trunk heading by a random kink towards `azimuth`, then pulls it
/// back towards vertical by the climb rate.
fn kink(heading: Vec3, azimuth: f32, params: &TreeParams, rng: &mut StdRng) -> Vec3 {
    let config = params.config();
    let (side, lateral) = frame::basis(heading, Vec3::X);
    let (sin, cos) = azimuth.sin_cos();
    let amount = config.trunk_kink * rng.gen_range(-1.0f32..1.0);
    let bent = (heading + (side * cos + lateral * sin) * amount)
        .try_normalize()
        .unwrap_or(heading);
    (bent + Vec3::Y * config.climb_rate)
        .try_normalize()
        .unwrap_or(Vec3::Y)
}

/// Vertical bias applied to a child of a branch at `parent_level`: grow lifts
/// most near the trunk, drop pulls down most near the tips.
fn vertical_bias(params: &TreeParams, parent_level: u32) -> f32 {
    let config = params.config();
    let levels = params.max_level().max(1) as f32;
    let grow = ((levels - parent_level as f32) / levels).powi(2);
    let drop = (parent_level + 1) as f32 / levels;
    config.grow_amount * grow - config.drop_amount * drop
}

fn grow_child(
    params: &TreeParams,
    parent_id: BranchId,
    parent: &Branch,
    section: usize,
    rng: &mut StdRng,
) -> Branch {
    let config = params.config();
    let level = parent.level + 1;
    let row = params.level(level);
    let anchor = parent.sections[section];

    let tangent = anchor.direction;
    let (side, lateral) = frame::basis(tangent, Vec3::Y);
    let azimuth = rng.gen_range(0.0..TAU) + config.sweep_amount * TAU * section as f32;
    let (sin, cos) = azimuth.sin_cos();
    let scattered = side * cos + lateral * sin;
    let clumped = (scattered * (1.0 - row.clump) + tangent * row.clump)
        .try_normalize()
        .unwrap_or(tangent);

    let bias = Vec3::Y * vertical_bias(params, parent.level);
    let spans = row.sections - 1;
    let step = row.length / spans as f32;
    let bend = bias / spans as f32;
    let mut heading = (clumped + bias).try_normalize().unwrap_or(clumped);

    let start_radius = row
        .radius
        .min(anchor.radius * CHILD_RADIUS_RATIO)
        .max(row.radius_floor);

    let mut sections = Vec::with_capacity(row.sections);
    let mut position = anchor.position;
    for i in 0..row.sections {
        if i > 0 {
            position += heading * step;
            if i < spans {
                heading = (heading + bend).try_normalize().unwrap_or(heading);
            }
        }
        let radius = (start_radius * config.taper_rate.powi(i as i32)).max(row.radius_floor);
        sections.push(Section {
            position,
            direction: heading,
            radius,
        });
    }

    Branch {
        sections,
        parent: Some(parent_id),
        parent_section: Some(section),
        children: Vec::new(),
        level,
        terminal: level == params.max_level(),
    }
}
