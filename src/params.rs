//! Tree configuration and the per-level parameter table derived from it.
//!
//! [`TreeConfig`] is the raw, user-facing record. [`TreeParams`] is what the
//! skeleton builder and the mesher actually consume: a validated copy of the
//! configuration plus one [`LevelParams`] row per recursion level. The table is
//! cheap to compute and is rebuilt on every generation call.

use serde::{Deserialize, Serialize};

use crate::error::TreeError;

/// Smallest ring resolution that still encloses an area.
pub const MIN_SEGMENTS: u32 = 3;
/// Largest ring resolution accepted.
pub const MAX_SEGMENTS: u32 = 128;
/// Deepest branch hierarchy accepted.
pub const MAX_LEVELS: u32 = 12;
/// Upper bound for the expected number of children per section.
pub const MAX_BRANCH_FACTOR: f32 = 8.0;
/// Every branch polyline has at least this many sections.
pub const MIN_SECTIONS: usize = 2;
/// Finest trunk subdivision accepted. Child section counts never exceed the
/// trunk's, so this bounds every polyline.
pub const MAX_TREE_STEPS: u32 = 64;

/// Minimum ring radius at level 0. Deeper levels get a slightly lower floor so
/// a child can always start thinner than its parent.
const RADIUS_FLOOR: f32 = 1e-3;
const RADIUS_FLOOR_FALLOFF: f32 = 0.9;

/// Raw parameters of a procedural tree.
///
/// Deserializes from camelCase preset documents; keys that are missing keep
/// their default value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TreeConfig {
    pub seed: u64,
    /// Radial subdivisions of every ring.
    pub segments: u32,
    /// Recursion depth of the branch hierarchy; 0 grows a bare trunk.
    pub levels: u32,
    #[serde(alias = "initalBranchLength")]
    pub initial_branch_length: f32,
    pub length_falloff_factor: f32,
    pub length_falloff_power: f32,
    pub clump_max: f32,
    pub clump_min: f32,
    /// Expected number of children spawned per parent section.
    pub branch_factor: f32,
    pub drop_amount: f32,
    pub grow_amount: f32,
    pub sweep_amount: f32,
    pub max_radius: f32,
    pub radius_falloff_rate: f32,
    pub taper_rate: f32,
    pub climb_rate: f32,
    pub trunk_kink: f32,
    pub twist_rate: f32,
    pub trunk_length: f32,
    /// Number of sections the trunk is divided into.
    pub tree_steps: u32,
    pub v_multiplier: f32,
    pub twig_scale: f32,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            seed: 256,
            segments: 6,
            levels: 3,
            initial_branch_length: 0.6,
            length_falloff_factor: 0.85,
            length_falloff_power: 0.99,
            clump_max: 0.9,
            clump_min: 0.404,
            branch_factor: 2.45,
            drop_amount: -0.1,
            grow_amount: 0.235,
            sweep_amount: 0.01,
            max_radius: 0.1,
            radius_falloff_rate: 0.5,
            taper_rate: 0.947,
            climb_rate: 0.25,
            trunk_kink: 0.093,
            twist_rate: 3.02,
            trunk_length: 2.0,
            tree_steps: 8,
            v_multiplier: 2.36,
            twig_scale: 0.3,
        }
    }
}

impl TreeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_levels(mut self, levels: u32) -> Self {
        self.levels = levels;
        self
    }

    pub fn with_segments(mut self, segments: u32) -> Self {
        self.segments = segments;
        self
    }

    pub fn with_tree_steps(mut self, steps: u32) -> Self {
        self.tree_steps = steps;
        self
    }

    pub fn with_branch_factor(mut self, branch_factor: f32) -> Self {
        self.branch_factor = branch_factor;
        self
    }

    pub fn with_max_radius(mut self, max_radius: f32) -> Self {
        self.max_radius = max_radius;
        self
    }

    pub fn with_twig_scale(mut self, twig_scale: f32) -> Self {
        self.twig_scale = twig_scale;
        self
    }

    /// Rescales the size-dependent parameters for a tree whose trunk has
    /// reached `radius`, so a sapling can be grown into a full tree.
    ///
    /// Deeper hierarchies appear as the radius grows, one level per 0.025
    /// units, capped at [`MAX_LEVELS`].
    pub fn grown(mut self, radius: f32) -> Self {
        self.max_radius = radius;
        self.trunk_length = radius * 10.0;
        self.climb_rate = radius * 2.5;
        self.initial_branch_length = radius * 6.0;
        self.twig_scale = radius * 2.5;
        let levels = (radius / 0.025).ceil();
        self.levels = if levels.is_finite() && levels > 1.0 {
            (levels as u32).min(MAX_LEVELS)
        } else {
            1
        };
        self
    }

    /// Checks every field against its meaningful range.
    pub fn validate(&self) -> Result<(), TreeError> {
        if self.segments < MIN_SEGMENTS {
            return Err(TreeError::invalid(
                "segments",
                format!("must be at least {MIN_SEGMENTS}, got {}", self.segments),
            ));
        }
        if self.segments > MAX_SEGMENTS {
            return Err(TreeError::invalid(
                "segments",
                format!("must be at most {MAX_SEGMENTS}, got {}", self.segments),
            ));
        }
        if self.levels > MAX_LEVELS {
            return Err(TreeError::invalid(
                "levels",
                format!("must be at most {MAX_LEVELS}, got {}", self.levels),
            ));
        }

        if self.tree_steps > MAX_TREE_STEPS {
            return Err(TreeError::invalid(
                "treeSteps",
                format!("must be at most {MAX_TREE_STEPS}, got {}", self.tree_steps),
            ));
        }

        positive("initialBranchLength", self.initial_branch_length)?;
        unit_interval("lengthFalloffFactor", self.length_falloff_factor)?;
        positive("lengthFalloffPower", self.length_falloff_power)?;
        fraction("clumpMax", self.clump_max)?;
        fraction("clumpMin", self.clump_min)?;
        in_range("branchFactor", self.branch_factor, 0.0, MAX_BRANCH_FACTOR)?;
        finite("dropAmount", self.drop_amount)?;
        finite("growAmount", self.grow_amount)?;
        finite("sweepAmount", self.sweep_amount)?;
        positive("maxRadius", self.max_radius)?;
        unit_interval("radiusFalloffRate", self.radius_falloff_rate)?;
        unit_interval("taperRate", self.taper_rate)?;
        non_negative("climbRate", self.climb_rate)?;
        non_negative("trunkKink", self.trunk_kink)?;
        finite("twistRate", self.twist_rate)?;
        positive("trunkLength", self.trunk_length)?;
        non_negative("vMultiplier", self.v_multiplier)?;
        non_negative("twigScale", self.twig_scale)?;
        Ok(())
    }
}

fn finite(field: &'static str, value: f32) -> Result<(), TreeError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(TreeError::invalid(field, format!("must be finite, got {value}")))
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), TreeError> {
    finite(field, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(TreeError::invalid(field, format!("must be positive, got {value}")))
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), TreeError> {
    finite(field, value)?;
    if value >= 0.0 {
        Ok(())
    } else {
        Err(TreeError::invalid(
            field,
            format!("must not be negative, got {value}"),
        ))
    }
}

/// Half-open `(0, 1]`, used for multiplicative falloffs.
fn unit_interval(field: &'static str, value: f32) -> Result<(), TreeError> {
    finite(field, value)?;
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(TreeError::invalid(
            field,
            format!("must lie in (0, 1], got {value}"),
        ))
    }
}

fn fraction(field: &'static str, value: f32) -> Result<(), TreeError> {
    in_range(field, value, 0.0, 1.0)
}

fn in_range(field: &'static str, value: f32, min: f32, max: f32) -> Result<(), TreeError> {
    finite(field, value)?;
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(TreeError::invalid(
            field,
            format!("must lie in [{min}, {max}], got {value}"),
        ))
    }
}

/// Derived values for one recursion level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelParams {
    /// Nominal length of a branch at this level.
    pub length: f32,
    /// Nominal starting radius of a branch at this level.
    pub radius: f32,
    /// How closely children at this level follow their parent's tangent.
    pub clump: f32,
    /// Minimum ring radius for branches at this level.
    pub radius_floor: f32,
    /// Number of sections a branch at this level is divided into.
    pub sections: usize,
}

/// A validated configuration together with its per-level table.
#[derive(Debug, Clone)]
pub struct TreeParams {
    config: TreeConfig,
    levels: Vec<LevelParams>,
    section_spacing: f32,
}

impl TreeParams {
    pub fn from_config(config: &TreeConfig) -> Result<Self, TreeError> {
        config.validate()?;

        let trunk_sections = (config.tree_steps as usize).max(MIN_SECTIONS);
        let section_spacing = config.trunk_length / (trunk_sections - 1) as f32;
        let depth = config.levels;

        let mut levels = Vec::with_capacity(depth as usize + 1);
        let mut length = config.initial_branch_length;
        for level in 0..=depth {
            if level > 0 {
                length = length.powf(config.length_falloff_power) * config.length_falloff_factor;
            }
            let t = if depth == 0 {
                0.0
            } else {
                level as f32 / depth as f32
            };
            let sections = if level == 0 {
                trunk_sections
            } else {
                let spans = (length / section_spacing).ceil();
                let spans = if spans.is_finite() { spans as usize } else { 1 };
                (spans + 1).clamp(MIN_SECTIONS, trunk_sections)
            };
            levels.push(LevelParams {
                length,
                radius: config.max_radius * config.radius_falloff_rate.powi(level as i32),
                clump: config.clump_min + (config.clump_max - config.clump_min) * t,
                radius_floor: RADIUS_FLOOR * RADIUS_FLOOR_FALLOFF.powi(level as i32),
                sections,
            });
        }

        Ok(Self {
            config: config.clone(),
            levels,
            section_spacing,
        })
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// Rows for levels `0..=config.levels`.
    pub fn levels(&self) -> &[LevelParams] {
        &self.levels
    }

    /// Callers only ask for levels up to the configured depth.
    pub(crate) fn level(&self, level: u32) -> &LevelParams {
        &self.levels[level as usize]
    }

    pub fn max_level(&self) -> u32 {
        self.config.levels
    }

    /// Distance between consecutive trunk sections.
    pub fn section_spacing(&self) -> f32 {
        self.section_spacing
    }

    pub fn trunk_sections(&self) -> usize {
        self.levels[0].sections
    }
}
