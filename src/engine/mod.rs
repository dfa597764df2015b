// Engine module - mesh deformation core plus the platform-facing helpers

pub mod brush;
pub mod input;
pub mod mesh;
pub mod session;
pub mod texture;
pub mod ui;

// Re-export commonly used items
pub use brush::BrushMode;
pub use session::{LiquifySession, PointerEvent, DEFAULT_BRUSH_RADIUS, DEFAULT_GRID_RESOLUTION};
