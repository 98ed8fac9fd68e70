//! Bark and twig materials for generated trees.
//!
//! A tree always renders with exactly two materials, one per
//! [`TreeMesh`](crate::TreeMesh) buffer set. [`TreeMaterialSettings`] holds the
//! editable values and [`TreeMaterialPalette`] the matching Bevy handles.
//!
//! # Workflow
//!
//! 1. Add [`setup_tree_materials`] as a `Startup` system. It uses an existing
//!    [`TreeMaterialSettings`] resource if present and inserts the defaults
//!    otherwise.
//! 2. Add [`sync_tree_materials`] to your `Update` schedule.
//! 3. Mutate [`TreeMaterialSettings`] from your UI; the sync system picks up
//!    the change through Bevy's change detection.

use bevy::math::{Affine2, Vec2};
use bevy::prelude::*;

/// Bark colour of the reference tree, `#9d7362`.
pub const BARK_COLOR: [f32; 3] = srgb_from_hex(0x9d7362);
/// Twig colour of the reference tree, `#F16950`.
pub const TWIG_COLOR: [f32; 3] = srgb_from_hex(0xF16950);

/// Splits a `0xRRGGBB` value into sRGB channels in `[0, 1]`.
pub const fn srgb_from_hex(hex: u32) -> [f32; 3] {
    [
        ((hex >> 16) & 0xFF) as f32 / 255.0,
        ((hex >> 8) & 0xFF) as f32 / 255.0,
        (hex & 0xFF) as f32 / 255.0,
    ]
}

/// PBR settings for one tree material, shared by the UI and the exporters.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialSettings {
    pub base_color: [f32; 3],
    pub roughness: f32,
    pub metallic: f32,
    /// Alpha-test threshold; `None` renders the material opaque.
    pub alpha_cutoff: Option<f32>,
    pub double_sided: bool,
    pub uv_scale: f32,
}

impl MaterialSettings {
    pub fn bark() -> Self {
        Self {
            base_color: BARK_COLOR,
            roughness: 1.0,
            metallic: 0.0,
            alpha_cutoff: None,
            double_sided: false,
            uv_scale: 1.0,
        }
    }

    /// Twig quads are single-sided geometry, so the material renders both faces.
    pub fn twig() -> Self {
        Self {
            base_color: TWIG_COLOR,
            roughness: 1.0,
            metallic: 0.0,
            alpha_cutoff: Some(0.9),
            double_sided: true,
            uv_scale: 1.0,
        }
    }

    /// Writes these settings into a Bevy material.
    pub fn apply_to(&self, material: &mut StandardMaterial) {
        material.base_color = Color::srgb_from_array(self.base_color);
        material.perceptual_roughness = self.roughness;
        material.metallic = self.metallic;
        material.alpha_mode = match self.alpha_cutoff {
            Some(cutoff) => AlphaMode::Mask(cutoff),
            None => AlphaMode::Opaque,
        };
        material.double_sided = self.double_sided;
        material.cull_mode = if self.double_sided {
            None
        } else {
            StandardMaterial::default().cull_mode
        };
        material.uv_transform = Affine2::from_scale(Vec2::splat(self.uv_scale));
    }

    pub fn to_material(&self) -> StandardMaterial {
        let mut material = StandardMaterial::default();
        self.apply_to(&mut material);
        material
    }
}

/// Resource holding the editable bark and twig settings.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct TreeMaterialSettings {
    pub bark: MaterialSettings,
    pub twig: MaterialSettings,
}

impl Default for TreeMaterialSettings {
    fn default() -> Self {
        Self {
            bark: MaterialSettings::bark(),
            twig: MaterialSettings::twig(),
        }
    }
}

/// Material handles for the two tree meshes.
#[derive(Resource)]
pub struct TreeMaterialPalette {
    pub bark: Handle<StandardMaterial>,
    pub twig: Handle<StandardMaterial>,
}

// ---------------------------------------------------------------------------
// Bevy systems
// ---------------------------------------------------------------------------

/// Startup system that creates the bark and twig materials.
///
/// Inserts [`TreeMaterialPalette`], and [`TreeMaterialSettings`] when the app
/// did not provide one.
pub fn setup_tree_materials(
    mut commands: Commands,
    settings: Option<Res<TreeMaterialSettings>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let settings = match settings {
        Some(settings) => (*settings).clone(),
        None => {
            let defaults = TreeMaterialSettings::default();
            commands.insert_resource(defaults.clone());
            defaults
        }
    };

    commands.insert_resource(TreeMaterialPalette {
        bark: materials.add(settings.bark.to_material()),
        twig: materials.add(settings.twig.to_material()),
    });
}

/// Update system that copies [`TreeMaterialSettings`] into the palette's
/// materials whenever the settings change.
pub fn sync_tree_materials(
    settings: Res<TreeMaterialSettings>,
    palette: Res<TreeMaterialPalette>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    if !settings.is_changed() {
        return;
    }

    for (handle, values) in [
        (&palette.bark, &settings.bark),
        (&palette.twig, &settings.twig),
    ] {
        let Some(material) = materials.get_mut(handle) else {
            continue;
        };
        values.apply_to(material);
    }
}
