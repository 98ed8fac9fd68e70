//! Egui UI helpers for tree editing.
//!
//! Provides reusable widgets for [`TreeConfig`] and [`TreeMaterialSettings`],
//! so any application with `bevy_egui` can embed live tree controls.

use std::ops::RangeInclusive;

use bevy_egui::egui;
use bevy_egui::egui::emath::Numeric;

use crate::materials::{MaterialSettings, TreeMaterialSettings};
use crate::params::TreeConfig;

fn slider<N: Numeric>(ui: &mut egui::Ui, value: &mut N, range: RangeInclusive<N>, label: &str) -> bool {
    ui.add(egui::Slider::new(value, range).text(label)).changed()
}

/// Renders the tree parameter editor in Tree, Branching and Trunk groups.
///
/// Returns `true` if any parameter was modified; regenerate the tree then.
pub fn tree_config_editor(ui: &mut egui::Ui, config: &mut TreeConfig) -> bool {
    let mut changed = false;

    ui.collapsing("Tree", |ui| {
        changed |= slider(ui, &mut config.seed, 1..=1000, "Seed");
        changed |= slider(ui, &mut config.segments, 6..=20, "Segments");
        changed |= slider(ui, &mut config.levels, 0..=10, "Levels");
        changed |= slider(ui, &mut config.v_multiplier, 0.01..=10.0, "V Multiplier");
        changed |= slider(ui, &mut config.twig_scale, 0.0..=1.0, "Twig Scale");
    });

    ui.collapsing("Branching", |ui| {
        changed |= slider(ui, &mut config.initial_branch_length, 0.1..=1.0, "Initial Length");
        changed |= slider(ui, &mut config.length_falloff_factor, 0.5..=1.0, "Length Falloff");
        changed |= slider(ui, &mut config.length_falloff_power, 0.1..=1.5, "Falloff Power");
        changed |= slider(ui, &mut config.clump_max, 0.0..=1.0, "Clump Max");
        changed |= slider(ui, &mut config.clump_min, 0.0..=1.0, "Clump Min");
        changed |= slider(ui, &mut config.branch_factor, 2.0..=4.0, "Branch Factor");
        changed |= slider(ui, &mut config.drop_amount, -1.0..=1.0, "Drop");
        changed |= slider(ui, &mut config.grow_amount, -0.5..=1.0, "Grow");
        changed |= slider(ui, &mut config.sweep_amount, -1.0..=1.0, "Sweep");
    });

    ui.collapsing("Trunk", |ui| {
        changed |= slider(ui, &mut config.max_radius, 0.05..=1.0, "Max Radius");
        changed |= slider(ui, &mut config.climb_rate, 0.05..=1.0, "Climb Rate");
        changed |= slider(ui, &mut config.trunk_kink, 0.0..=0.5, "Kink");
        changed |= slider(ui, &mut config.tree_steps, 0..=35, "Steps");
        changed |= slider(ui, &mut config.taper_rate, 0.7..=1.0, "Taper Rate");
        changed |= slider(ui, &mut config.radius_falloff_rate, 0.5..=0.8, "Radius Falloff");
        changed |= slider(ui, &mut config.twist_rate, 0.0..=10.0, "Twist");
        changed |= slider(ui, &mut config.trunk_length, 0.1..=5.0, "Trunk Length");
    });

    if ui.button("Reset Defaults").clicked() {
        *config = TreeConfig::default();
        changed = true;
    }

    changed
}

/// Renders bark and twig material controls.
///
/// Returns `true` if any material property was modified.
pub fn tree_material_editor(ui: &mut egui::Ui, settings: &mut TreeMaterialSettings) -> bool {
    let mut changed = false;
    ui.collapsing("Bark", |ui| {
        changed |= material_editor(ui, &mut settings.bark);
    });
    ui.collapsing("Twigs", |ui| {
        changed |= material_editor(ui, &mut settings.twig);
    });
    changed
}

fn material_editor(ui: &mut egui::Ui, settings: &mut MaterialSettings) -> bool {
    let mut changed = false;

    ui.horizontal(|ui| {
        ui.label("Base Color:");
        changed |= ui.color_edit_button_rgb(&mut settings.base_color).changed();
    });
    changed |= slider(ui, &mut settings.roughness, 0.0..=1.0, "Roughness");
    changed |= slider(ui, &mut settings.metallic, 0.0..=1.0, "Metallic");
    changed |= slider(ui, &mut settings.uv_scale, 0.1..=10.0, "UV Scale");
    changed |= ui
        .checkbox(&mut settings.double_sided, "Double Sided")
        .changed();

    let mut masked = settings.alpha_cutoff.is_some();
    if ui.checkbox(&mut masked, "Alpha Mask").changed() {
        settings.alpha_cutoff = masked.then_some(0.9);
        changed = true;
    }
    if let Some(cutoff) = settings.alpha_cutoff.as_mut() {
        changed |= slider(ui, cutoff, 0.0..=1.0, "Cutoff");
    }

    changed
}
