// Liquify session: owns the grid mesh, brush and drag state, and runs the
// pointer state machine. Everything the brush needs lives here — no
// process-wide mutable state anywhere in the crate.

use glam::Vec2;

use super::brush::{BrushMode, displace};
use super::mesh::GridMesh;

/// Vertices per side at startup.
pub const DEFAULT_GRID_RESOLUTION: usize = 32;

/// Brush radius in NDC units at startup.
pub const DEFAULT_BRUSH_RADIUS: f32 = 0.2;

/// Pointer event in mesh NDC space, already converted from pixels by the
/// caller. The session never talks to the windowing layer directly.
#[derive(Debug, Clone, Copy)]
pub enum PointerEvent {
    /// Primary button pressed.
    Down,
    /// Pointer moved to the given NDC position.
    Move(Vec2),
    /// Primary button released.
    Up,
}

/// Current brush settings. Mode is updated by the caller from the modifier
/// key before each move delivery; radius from the validated control value.
#[derive(Debug, Clone, Copy)]
pub struct BrushState {
    pub radius: f32,
    pub mode: BrushMode,
}

impl Default for BrushState {
    fn default() -> Self {
        Self {
            radius: DEFAULT_BRUSH_RADIUS,
            mode: BrushMode::Push,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DragState {
    Idle,
    Dragging,
}

/// One liquify editing session over a single grid mesh.
///
/// State machine:
///   Idle     --Down--> Dragging
///   Dragging --Up----> Idle
///   Dragging --Move--> Dragging   (runs the brush, may request repaint)
///   Idle     --Move--> Idle       (ignored)
pub struct LiquifySession {
    mesh: GridMesh,
    pub brush: BrushState,
    drag: DragState,
}

impl LiquifySession {
    pub fn new(resolution: usize) -> Self {
        Self {
            mesh: GridMesh::build(resolution),
            brush: BrushState::default(),
            drag: DragState::Idle,
        }
    }

    pub fn mesh(&self) -> &GridMesh {
        &self.mesh
    }

    pub fn resolution(&self) -> usize {
        self.mesh.resolution()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag == DragState::Dragging
    }

    /// Replace the mesh with a fresh build at `resolution`, discarding any
    /// accumulated deformation. All four buffers are swapped in one step, so
    /// the renderer never observes a partially rebuilt mesh. Callers validate
    /// `resolution` ≥ 2 beforehand.
    pub fn rebuild(&mut self, resolution: usize) {
        self.mesh = GridMesh::build(resolution);
        self.drag = DragState::Idle;
    }

    /// Drive the drag state machine. Returns true when vertices moved and the
    /// renderer should re-upload the position buffer.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> bool {
        match event {
            PointerEvent::Down => {
                self.drag = DragState::Dragging;
                false
            }
            PointerEvent::Up => {
                self.drag = DragState::Idle;
                false
            }
            PointerEvent::Move(pos) => {
                if self.drag != DragState::Dragging {
                    return false;
                }

                let n = self.mesh.resolution();
                assert_eq!(
                    self.mesh.positions.len(),
                    n * n,
                    "vertex buffer size does not match grid resolution; missed rebuild?"
                );

                displace(&mut self.mesh.positions, pos, self.brush.radius, self.brush.mode)
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn drag_to(session: &mut LiquifySession, pos: Vec2) -> bool {
        session.handle_pointer(PointerEvent::Down);
        let repaint = session.handle_pointer(PointerEvent::Move(pos));
        session.handle_pointer(PointerEvent::Up);
        repaint
    }

    #[test]
    fn move_while_idle_mutates_nothing() {
        let mut session = LiquifySession::new(4);
        let before = session.mesh().positions.clone();

        let repaint = session.handle_pointer(PointerEvent::Move(Vec2::ZERO));

        assert!(!repaint);
        assert_eq!(session.mesh().positions, before);
    }

    #[test]
    fn release_ends_the_drag() {
        let mut session = LiquifySession::new(4);
        session.handle_pointer(PointerEvent::Down);
        assert!(session.is_dragging());
        session.handle_pointer(PointerEvent::Up);
        assert!(!session.is_dragging());

        let before = session.mesh().positions.clone();
        assert!(!session.handle_pointer(PointerEvent::Move(Vec2::ZERO)));
        assert_eq!(session.mesh().positions, before);
    }

    #[test]
    fn push_at_center_moves_only_the_inner_ring() {
        // 4×4 grid: coordinates are {-1, -1/3, 1/3, 1} per axis. The four
        // innermost vertices sit at distance √2/3 ≈ 0.471 from the origin,
        // inside a 0.5 brush; all 12 outer vertices are at ≥ 0.5 and must be
        // untouched.
        let mut session = LiquifySession::new(4);
        session.brush.radius = 0.5;
        let before = session.mesh().positions.clone();

        let repaint = drag_to(&mut session, Vec2::ZERO);
        assert!(repaint);

        let inner = [5usize, 6, 9, 10];
        for (i, (old, new)) in before.iter().zip(session.mesh().positions.iter()).enumerate() {
            let old_v = Vec2::from(*old);
            let new_v = Vec2::from(*new);
            if inner.contains(&i) {
                // Strictly outward, to the exact reference coordinates.
                assert!(new_v.length() > old_v.length(), "vertex {i} did not move outward");
                let d = old_v.length();
                let expected = old_v + old_v * d * (0.5 - d);
                assert!(
                    (new_v - expected).length() < 1e-6,
                    "vertex {i}: got {new_v:?}, expected {expected:?}"
                );
            } else {
                assert_eq!(old, new, "outer vertex {i} must not move");
            }
        }
    }

    #[test]
    fn pull_at_center_draws_the_inner_ring_inward() {
        let mut session = LiquifySession::new(4);
        session.brush.radius = 0.5;
        session.brush.mode = BrushMode::Pull;
        let before = session.mesh().positions.clone();

        assert!(drag_to(&mut session, Vec2::ZERO));

        let inner = [5usize, 6, 9, 10];
        for (i, (old, new)) in before.iter().zip(session.mesh().positions.iter()).enumerate() {
            let old_v = Vec2::from(*old);
            let new_v = Vec2::from(*new);
            if inner.contains(&i) {
                assert!(new_v.length() < old_v.length(), "vertex {i} did not move inward");
                let d = old_v.length();
                let expected = old_v + old_v * d * (d - 0.5);
                assert!((new_v - expected).length() < 1e-6);
            } else {
                assert_eq!(old, new);
            }
        }
    }

    #[test]
    fn rebuild_discards_deformation() {
        let mut session = LiquifySession::new(8);
        session.brush.radius = 0.5;
        assert!(drag_to(&mut session, Vec2::ZERO));
        assert_ne!(session.mesh().positions, GridMesh::build(8).positions);

        session.rebuild(8);

        let fresh = GridMesh::build(8);
        assert_eq!(session.mesh().positions, fresh.positions);
        assert_eq!(session.mesh().uvs, fresh.uvs);
        assert_eq!(session.mesh().triangle_indices, fresh.triangle_indices);
        assert_eq!(session.mesh().line_indices, fresh.line_indices);
    }

    #[test]
    fn rebuild_resizes_every_buffer_together() {
        let mut session = LiquifySession::new(4);
        session.rebuild(6);

        assert_eq!(session.resolution(), 6);
        assert_eq!(session.mesh().vertex_count(), 36);
        assert_eq!(session.mesh().triangle_index_count(), 25 * 6);
        assert_eq!(session.mesh().line_index_count(), 25 * 8);
        assert!(!session.is_dragging());
    }
}
