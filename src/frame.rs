use bevy::prelude::*;

/// Axis used when a reference vector is (anti)parallel to `forward`.
fn fallback_reference(forward: Vec3) -> Vec3 {
    if forward.x.abs() < 0.8 {
        Vec3::X
    } else {
        Vec3::Y
    }
}

/// Unit vector perpendicular to `forward`, as close to `reference` as possible.
///
/// `forward` must be unit length.
pub(crate) fn side_vector(forward: Vec3, reference: Vec3) -> Vec3 {
    let projected = reference - forward * reference.dot(forward);
    if let Some(side) = projected.try_normalize() {
        return side;
    }
    let reference = fallback_reference(forward);
    (reference - forward * reference.dot(forward)).normalize()
}

/// Right-handed basis `(side, lateral)` of the plane perpendicular to
/// `forward`, with `side × lateral == forward`.
pub(crate) fn basis(forward: Vec3, reference: Vec3) -> (Vec3, Vec3) {
    let side = side_vector(forward, reference);
    (side, forward.cross(side))
}
