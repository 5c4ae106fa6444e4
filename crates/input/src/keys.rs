use glview_camera::WalkInput;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkKey {
    Forward,
    Backward,
    Left,
    Right,
}

/// Held walk keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkKeys {
    forward: bool,
    backward: bool,
    left: bool,
    right: bool,
}

impl WalkKeys {
    pub fn set(&mut self, key: WalkKey, pressed: bool) {
        match key {
            WalkKey::Forward => self.forward = pressed,
            WalkKey::Backward => self.backward = pressed,
            WalkKey::Left => self.left = pressed,
            WalkKey::Right => self.right = pressed,
        }
    }

    pub fn release_all(&mut self) {
        *self = Self::default();
    }

    /// Opposite keys cancel out.
    pub fn input(&self) -> WalkInput {
        WalkInput {
            forward: axis(self.forward, self.backward),
            right: axis(self.right, self.left),
        }
    }
}

fn axis(positive: bool, negative: bool) -> f32 {
    match (positive, negative) {
        (true, false) => 1.0,
        (false, true) => -1.0,
        _ => 0.0,
    }
}
