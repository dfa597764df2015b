// Input state tracking for keyboard and mouse
// Abstracts winit events into a queryable snapshot

use std::collections::HashSet;
use glam::Vec2;
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

pub struct InputState {
    // Keyboard
    keys_held: HashSet<KeyCode>,

    // Mouse
    pub mouse_position: (f32, f32),

    // Window dimensions (used for the pixel → NDC conversion)
    pub window_size: (u32, u32),
}

impl InputState {
    pub fn new(window_size: (u32, u32)) -> Self {
        Self {
            keys_held: HashSet::new(),
            mouse_position: (0.0, 0.0),
            window_size,
        }
    }

    /// Feed a winit WindowEvent into the input state.
    /// Call this once per event before the tool's own event handling.
    pub fn process_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    match event.state {
                        ElementState::Pressed => { self.keys_held.insert(key); }
                        ElementState::Released => { self.keys_held.remove(&key); }
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.mouse_position = (position.x as f32, position.y as f32);
            }
            WindowEvent::Resized(size) => {
                self.window_size = (size.width, size.height);
            }
            _ => {}
        }
    }

    pub fn is_key_held(&self, key: KeyCode) -> bool {
        self.keys_held.contains(&key)
    }

    /// Either Ctrl key — selects the pull brush while held.
    pub fn ctrl_held(&self) -> bool {
        self.is_key_held(KeyCode::ControlLeft) || self.is_key_held(KeyCode::ControlRight)
    }

    /// Cursor position converted to mesh NDC:
    ///   x = (px / (width - 1)) · 2 - 1
    ///   y = 1 - (py / (height - 1)) · 2
    ///
    /// None until the window has a usable size (events can arrive before the
    /// first Resized).
    pub fn pointer_ndc(&self) -> Option<Vec2> {
        let (w, h) = self.window_size;
        if w < 2 || h < 2 {
            return None;
        }
        let (px, py) = self.mouse_position;
        Some(Vec2::new(
            px / (w - 1) as f32 * 2.0 - 1.0,
            1.0 - py / (h - 1) as f32 * 2.0,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointer_ndc_maps_window_corners() {
        let mut input = InputState::new((640, 480));

        input.mouse_position = (0.0, 0.0);
        assert_eq!(input.pointer_ndc(), Some(Vec2::new(-1.0, 1.0)));

        input.mouse_position = (639.0, 479.0);
        assert_eq!(input.pointer_ndc(), Some(Vec2::new(1.0, -1.0)));
    }

    #[test]
    fn pointer_ndc_unavailable_before_first_resize() {
        let input = InputState::new((0, 0));
        assert_eq!(input.pointer_ndc(), None);
    }
}
