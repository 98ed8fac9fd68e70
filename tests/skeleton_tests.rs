use bevy::prelude::*;
use bevy_proctree::params::{MAX_SEGMENTS, MAX_TREE_STEPS};
use bevy_proctree::skeleton::{MAX_BRANCH_VERTICES, MAX_BRANCHES, MAX_TWIGS};
use bevy_proctree::{Skeleton, TreeConfig, TreeParams, build_skeleton};

fn skeleton_for(config: &TreeConfig) -> Skeleton {
    build_skeleton(config).expect("config should be valid")
}

#[test]
fn test_radius_non_increasing_along_branches() {
    for seed in [1, 7, 99, 256] {
        let skeleton = skeleton_for(&TreeConfig::default().with_seed(seed));
        for branch in skeleton.branches() {
            for pair in branch.sections.windows(2) {
                assert!(
                    pair[1].radius <= pair[0].radius,
                    "radius grew along a level {} branch",
                    branch.level
                );
                assert!(pair[1].radius > 0.0);
            }
        }
    }
}

#[test]
fn test_child_starts_thinner_than_parent() {
    let skeleton = skeleton_for(&TreeConfig::default().with_levels(4));
    for branch in skeleton.branches() {
        let (Some(parent), Some(section)) = (branch.parent, branch.parent_section) else {
            continue;
        };
        let anchor = skeleton.branch(parent).sections[section];
        assert!(
            branch.base_radius() < anchor.radius,
            "child radius {} not below parent radius {}",
            branch.base_radius(),
            anchor.radius
        );
        assert_eq!(branch.sections[0].position, anchor.position);
    }
}

#[test]
fn test_tiny_radius_keeps_hierarchy_strict() {
    let config = TreeConfig::default().with_max_radius(1e-6).with_levels(4);
    let skeleton = skeleton_for(&config);
    assert!(skeleton.len() > 1);
    for branch in skeleton.branches() {
        assert!(branch.sections.iter().all(|s| s.radius > 0.0));
        if let (Some(parent), Some(section)) = (branch.parent, branch.parent_section) {
            assert!(branch.base_radius() < skeleton.branch(parent).sections[section].radius);
        }
    }
}

#[test]
fn test_level_bound() {
    for levels in 0..=3 {
        let skeleton = skeleton_for(&TreeConfig::default().with_levels(levels));
        for branch in skeleton.branches() {
            assert!(branch.level <= levels);
            assert_eq!(branch.terminal, branch.level == levels);
            if branch.level == levels {
                assert!(branch.children.is_empty());
            }
        }
    }
}

#[test]
fn test_trunk_only_has_single_branch() {
    let skeleton = skeleton_for(&TreeConfig::default().with_levels(0));
    assert_eq!(skeleton.len(), 1);
    assert!(skeleton.twigs().is_empty());
    let trunk = skeleton.branch(skeleton.root().unwrap());
    assert_eq!(trunk.sections.len(), TreeConfig::default().tree_steps as usize);
    assert!(trunk.parent.is_none());
}

#[test]
fn test_every_branch_is_a_polyline() {
    let skeleton = skeleton_for(&TreeConfig::default().with_tree_steps(0));
    for branch in skeleton.branches() {
        assert!(branch.sections.len() >= 2);
        assert!(branch.length() > 0.0);
    }
}

#[test]
fn test_parent_child_links_are_consistent() {
    let skeleton = skeleton_for(&TreeConfig::default());
    for (index, branch) in skeleton.branches().iter().enumerate() {
        for &child in &branch.children {
            let child_branch = skeleton.branch(child);
            assert_eq!(child_branch.parent.map(|p| p.index()), Some(index));
            assert_eq!(child_branch.level, branch.level + 1);
            let section = child_branch.parent_section.unwrap();
            assert!(section >= 1 && section < branch.sections.len());
        }
    }
}

#[test]
fn test_trunk_length_matches_config() {
    let config = TreeConfig::default().with_levels(0);
    let skeleton = skeleton_for(&config);
    let trunk = skeleton.branch(skeleton.root().unwrap());
    assert!((trunk.length() - config.trunk_length).abs() < 1e-4);
}

#[test]
fn test_average_child_count_matches_branch_factor() {
    let mut per_tree = Vec::new();

    for seed in 1..=50 {
        let config = TreeConfig::default()
            .with_seed(seed)
            .with_levels(1)
            .with_branch_factor(2.45);
        let skeleton = skeleton_for(&config);
        let trunk = skeleton.branch(skeleton.root().unwrap());
        // The base section never spawns children.
        let spawning = trunk.sections.len() - 1;
        let mean = trunk.children.len() as f32 / spawning as f32;
        assert!(
            (mean - 2.45).abs() <= 1.0 / spawning as f32,
            "seed {seed}: average children per section {mean} far from 2.45"
        );
        per_tree.push(trunk.children.len());
    }

    assert!(per_tree.iter().all(|&n| n == per_tree[0]), "counts depend on seed");
}

#[test]
fn test_fine_trunk_child_count_converges() {
    let config = TreeConfig::default()
        .with_levels(1)
        .with_tree_steps(MAX_TREE_STEPS)
        .with_branch_factor(3.7);
    let skeleton = skeleton_for(&config);
    let trunk = skeleton.branch(skeleton.root().unwrap());
    let mean = trunk.children.len() as f32 / (trunk.sections.len() - 1) as f32;
    assert!((mean - 3.7).abs() < 0.05, "average children per section {mean}");
}

#[test]
fn test_zero_twig_scale_scatters_nothing() {
    let skeleton = skeleton_for(&TreeConfig::default().with_twig_scale(0.0));
    assert!(skeleton.len() > 1);
    assert!(skeleton.twigs().is_empty());
}

#[test]
fn test_twigs_sit_on_terminal_branch_surfaces() {
    let skeleton = skeleton_for(&TreeConfig::default());
    assert!(!skeleton.twigs().is_empty());

    for twig in skeleton.twigs() {
        let branch = skeleton.branch(twig.branch);
        assert!(branch.terminal);

        let n = branch.sections.len();
        let (a, b) = (branch.sections[n - 2], branch.sections[n - 1]);
        let axis = (b.position - a.position).normalize();
        let offset = twig.position - a.position;
        let radial = offset - axis * offset.dot(axis);

        assert!((twig.outward.length() - 1.0).abs() < 1e-4);
        assert!(twig.outward.dot(axis).abs() < 1e-3, "outward not radial");
        assert!((radial.length() - twig.radius).abs() < 1e-4);
    }
}

#[test]
fn test_twig_count_grows_with_twig_scale() {
    let small = skeleton_for(&TreeConfig::default().with_twig_scale(0.1));
    let large = skeleton_for(&TreeConfig::default().with_twig_scale(0.9));
    assert!(large.twigs().len() > small.twigs().len());
}

#[test]
fn test_skeleton_is_deterministic() {
    let config = TreeConfig::default().with_seed(31);
    assert_eq!(skeleton_for(&config), skeleton_for(&config));
}

#[test]
fn test_reseeding_keeps_structure() {
    let a = skeleton_for(&TreeConfig::default().with_seed(1));
    let b = skeleton_for(&TreeConfig::default().with_seed(2));
    assert_eq!(a.len(), b.len());
    assert_eq!(a.twigs().len(), b.twigs().len());
    assert_ne!(a, b);
}

#[test]
fn test_branch_budget_caps_growth() {
    let config = TreeConfig::default()
        .with_levels(12)
        .with_branch_factor(8.0)
        .with_tree_steps(35);
    let skeleton = skeleton_for(&config);
    assert_eq!(skeleton.len(), MAX_BRANCHES);
}

#[test]
fn test_vertex_budget_caps_fine_rings() {
    let config = TreeConfig::default()
        .with_levels(12)
        .with_branch_factor(8.0)
        .with_tree_steps(MAX_TREE_STEPS)
        .with_segments(MAX_SEGMENTS);
    let skeleton = skeleton_for(&config);

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
    assert!(rings * MAX_SEGMENTS as usize <= MAX_BRANCH_VERTICES);
    assert!(skeleton.len() < MAX_BRANCHES);
}

#[test]
fn test_twig_budget_caps_scatter() {
    let skeleton = skeleton_for(&TreeConfig::default().with_twig_scale(5000.0));
    assert_eq!(skeleton.twigs().len(), MAX_TWIGS);
}

#[test]
fn test_build_directly_from_params() {
    let params = TreeParams::from_config(&TreeConfig::default()).unwrap();
    let skeleton = Skeleton::build(&params);
    assert_eq!(skeleton.branch(skeleton.root().unwrap()).sections[0].position, Vec3::ZERO);
    assert_eq!(skeleton.pre_order().len(), skeleton.len());
}
