// Radial displacement brush.
//
// One call per pointer-move event while a drag is active. Pure transform of
// (pointer, radius, mode, buffer) → (mutated buffer, repaint flag); no state
// survives between calls.

use glam::Vec2;

/// Displacement direction relative to the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrushMode {
    /// Vertices inside the radius move away from the pointer (default).
    Push,
    /// Vertices inside the radius move toward the pointer (modifier key).
    Pull,
}

/// Displace every vertex within `radius` of `pointer`, in place.
///
/// For an in-range vertex v with d = |v - pointer|:
///
///   dir = (v - pointer) · d
///   dir = dir · (d - radius)   pull  (negative factor, reverses toward pointer)
///   dir = dir · (radius - d)   push  (tapers to zero at the rim)
///   v'  = v + dir
///
/// The direction vector is intentionally not unit-normalized; the combined
/// d²·(radius - d) weighting is the tool's characteristic feel, with its
/// disproportionately large displacements just off the brush center. Do not
/// substitute a conventional smooth kernel here.
///
/// Vertices at d ≥ radius (including exactly on the rim) are left untouched,
/// and results are not clamped back into [-1, 1] — the mesh may spill out of
/// the original grid bounds.
///
/// Returns whether any vertex moved, so the caller can skip the GPU re-upload
/// when the pointer is far from the whole mesh.
pub fn displace(positions: &mut [[f32; 2]], pointer: Vec2, radius: f32, mode: BrushMode) -> bool {
    // An empty buffer means a rebuild was missed; refuse to limp along.
    assert!(!positions.is_empty(), "displace called with an empty vertex buffer");
    debug_assert!(radius > 0.0, "brush radius must be positive");

    let mut repaint = false;

    for pos in positions.iter_mut() {
        let v = Vec2::from(*pos);
        let d = pointer.distance(v);
        if d < radius {
            let mut dir = (v - pointer) * d;
            dir *= match mode {
                BrushMode::Pull => d - radius,
                BrushMode::Push => radius - d,
            };
            *pos = (v + dir).to_array();
            repaint = true;
        }
    }

    repaint
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertices_outside_radius_are_bit_for_bit_untouched() {
        // (1, 0) sits exactly on the rim of a radius-1 brush at the origin;
        // d < radius is strict, so it must not move.
        let mut positions = vec![[1.0f32, 0.0], [0.0, -1.0], [0.75, 0.75]];
        let before = positions.clone();

        let repaint = displace(&mut positions, Vec2::ZERO, 1.0, BrushMode::Push);

        assert!(!repaint);
        assert_eq!(positions, before);
    }

    #[test]
    fn push_moves_in_range_vertices_outward() {
        let v = Vec2::new(0.2, 0.1);
        let mut positions = vec![v.to_array()];

        let repaint = displace(&mut positions, Vec2::ZERO, 0.5, BrushMode::Push);

        assert!(repaint);
        let moved = Vec2::from(positions[0]);
        assert!(moved.length() > v.length());
        // Displacement is radial: the moved vertex stays on the ray from the
        // pointer through the original position.
        assert!(moved.perp_dot(v).abs() < 1e-7);
    }

    #[test]
    fn pull_moves_in_range_vertices_toward_pointer() {
        let v = Vec2::new(0.2, 0.1);
        let mut positions = vec![v.to_array()];

        let repaint = displace(&mut positions, Vec2::ZERO, 0.5, BrushMode::Pull);

        assert!(repaint);
        let moved = Vec2::from(positions[0]);
        assert!(moved.length() < v.length());
        assert!(moved.perp_dot(v).abs() < 1e-7);
    }

    #[test]
    fn displacement_vanishes_at_the_brush_rim() {
        // Just inside the rim: |dir| = d²·(radius - d) ≈ 0.25 · 1e-6.
        let radius = 0.5f32;
        let v = Vec2::new(radius - 1e-6, 0.0);
        let mut positions = vec![v.to_array()];

        displace(&mut positions, Vec2::ZERO, radius, BrushMode::Push);

        let shift = (Vec2::from(positions[0]) - v).length();
        assert!(shift < 1e-5, "falloff must be continuous at the rim, shift = {shift}");
    }

    #[test]
    fn matches_the_reference_formula_exactly() {
        let pointer = Vec2::new(0.1, -0.2);
        let radius = 0.4f32;
        let v = Vec2::new(0.3, -0.05);
        let mut positions = vec![v.to_array()];

        displace(&mut positions, pointer, radius, BrushMode::Push);

        let d = pointer.distance(v);
        let expected = v + (v - pointer) * d * (radius - d);
        let moved = Vec2::from(positions[0]);
        assert!((moved - expected).length() < 1e-6);
    }

    #[test]
    #[should_panic(expected = "empty vertex buffer")]
    fn empty_buffer_is_a_loud_failure() {
        let mut positions: Vec<[f32; 2]> = Vec::new();
        displace(&mut positions, Vec2::ZERO, 0.2, BrushMode::Push);
    }
}
