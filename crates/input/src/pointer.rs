use glam::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Down,
    Up,
    Move,
    Wheel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// One pointer event in window pixel coordinates (origin top-left).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerInfo {
    pub kind: PointerKind,
    pub position: Vec2,
    /// Movement since the previous event, for `Move`.
    pub delta: Vec2,
    /// Button that changed for `Down`/`Up`, or is held during a `Move`.
    pub button: Option<PointerButton>,
    /// Set on `Up` when the press turned into a drag.
    pub dragged: bool,
    /// Wheel lines, positive away from the user.
    pub wheel: f32,
}

impl PointerInfo {
    pub fn new(kind: PointerKind, position: Vec2) -> Self {
        Self {
            kind,
            position,
            delta: Vec2::ZERO,
            button: None,
            dragged: false,
            wheel: 0.0,
        }
    }

    pub fn with_button(mut self, button: PointerButton) -> Self {
        self.button = Some(button);
        self
    }

    /// A released press that did not become a drag.
    pub fn is_click(&self) -> bool {
        self.kind == PointerKind::Up && !self.dragged
    }
}

/// Turns raw cursor/button/wheel notifications into [`PointerInfo`] events
/// with drag detection.
#[derive(Debug, Clone)]
pub struct PointerTracker {
    position: Vec2,
    pressed: Option<(PointerButton, Vec2)>,
    dragged: bool,
    drag_threshold: f32,
}

impl Default for PointerTracker {
    fn default() -> Self {
        Self::new(4.0)
    }
}

impl PointerTracker {
    pub fn new(drag_threshold: f32) -> Self {
        Self {
            position: Vec2::ZERO,
            pressed: None,
            dragged: false,
            drag_threshold,
        }
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn held(&self) -> Option<PointerButton> {
        self.pressed.map(|(b, _)| b)
    }

    pub fn moved(&mut self, position: Vec2) -> PointerInfo {
        let delta = position - self.position;
        self.position = position;
        if let Some((_, start)) = self.pressed {
            if !self.dragged && position.distance(start) > self.drag_threshold {
                tracing::trace!(?start, ?position, "press became a drag");
                self.dragged = true;
            }
        }
        PointerInfo {
            delta,
            button: self.held(),
            ..PointerInfo::new(PointerKind::Move, position)
        }
    }

    pub fn pressed(&mut self, button: PointerButton) -> PointerInfo {
        self.pressed = Some((button, self.position));
        self.dragged = false;
        PointerInfo::new(PointerKind::Down, self.position).with_button(button)
    }

    pub fn released(&mut self, button: PointerButton) -> PointerInfo {
        let dragged = match self.pressed {
            Some((held, _)) if held == button => {
                self.pressed = None;
                std::mem::take(&mut self.dragged)
            }
            // Release of a button we never saw pressed, e.g. focus changes.
            _ => true,
        };
        PointerInfo {
            dragged,
            ..PointerInfo::new(PointerKind::Up, self.position).with_button(button)
        }
    }

    pub fn wheel(&mut self, lines: f32) -> PointerInfo {
        PointerInfo {
            wheel: lines,
            ..PointerInfo::new(PointerKind::Wheel, self.position)
        }
    }
}
