//! Picking and dragging masses with a mouse or touch pointer
//!
//! Pointer events never touch the mass registry directly. The controller turns
//! a drag into `MassCommand`s on a channel, and the simulation drains that
//! channel at the top of the next tick.

use std::sync::mpsc::{self, Receiver, Sender};

use glam::Vec2;
use gravity_physics::{MassRegistry, MOUSE_PICK_RADIUS_SQ, TOUCH_PICK_RADIUS_SQ};

/// Drawable size in physical pixels
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }
}

/// Screen pixels (origin top-left, y down) to NDC (y up).
/// `None` for non-finite input or an empty viewport.
pub fn screen_to_ndc(screen: Vec2, viewport: Viewport) -> Option<Vec2> {
    if !viewport.is_valid() || !screen.is_finite() {
        return None;
    }
    let ndc = screen / viewport.size() * 2.0 - Vec2::ONE;
    Some(Vec2::new(ndc.x, -ndc.y))
}

pub fn ndc_to_screen(ndc: Vec2, viewport: Viewport) -> Vec2 {
    Vec2::new(
        (ndc.x + 1.0) * viewport.width / 2.0,
        viewport.height - (ndc.y + 1.0) * viewport.height / 2.0,
    )
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerKind {
    Mouse,
    Touch,
}

impl PointerKind {
    /// Squared pick radius in px²
    pub fn pick_radius_sq(self) -> f32 {
        match self {
            PointerKind::Mouse => MOUSE_PICK_RADIUS_SQ,
            PointerKind::Touch => TOUCH_PICK_RADIUS_SQ,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MassCommand {
    /// Move a mass in the xy plane, keeping its depth
    SetPosition { index: usize, x: f32, y: f32 },
}

pub fn command_channel() -> (Sender<MassCommand>, Receiver<MassCommand>) {
    mpsc::channel()
}

/// First mass, in registry order, strictly within the pointer's pick radius.
///
/// First match, not closest match: overlapping masses resolve to the lower index.
pub fn pick_mass(
    registry: &MassRegistry,
    screen: Vec2,
    viewport: Viewport,
    kind: PointerKind,
) -> Option<usize> {
    if !viewport.is_valid() || !screen.is_finite() {
        return None;
    }
    let radius_sq = kind.pick_radius_sq();
    registry
        .iter()
        .position(|mass| ndc_to_screen(mass.xy(), viewport).distance_squared(screen) < radius_sq)
}

/// Apply every queued command. Returns how many were applied.
pub fn apply_commands(registry: &mut MassRegistry, commands: &Receiver<MassCommand>) -> usize {
    let mut applied = 0;
    for command in commands.try_iter() {
        match command {
            MassCommand::SetPosition { index, x, y } => {
                if registry.set_position(index, x, y) {
                    applied += 1;
                } else {
                    log::warn!("Dropping move for unknown mass {}", index);
                }
            }
        }
    }
    applied
}

/// Tracks the picked mass across pointer events
pub struct InteractionController {
    commands: Sender<MassCommand>,
    viewport: Viewport,
    picked: Option<usize>,
    pressed: bool,
    active_touch: Option<u64>,
}

impl InteractionController {
    pub fn new(commands: Sender<MassCommand>, viewport: Viewport) -> Self {
        Self {
            commands,
            viewport,
            picked: None,
            pressed: false,
            active_touch: None,
        }
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn picked(&self) -> Option<usize> {
        self.picked
    }

    pub fn pointer_down(
        &mut self,
        screen: Vec2,
        kind: PointerKind,
        registry: &MassRegistry,
    ) -> Option<usize> {
        self.pressed = true;
        self.picked = pick_mass(registry, screen, self.viewport, kind);
        if let Some(index) = self.picked {
            log::debug!("Picked mass {} with {:?}", index, kind);
        }
        self.picked
    }

    /// Queue a move for the picked mass while the pointer is held.
    /// Returns true if a command was sent.
    pub fn pointer_move(&mut self, screen: Vec2, registry: &MassRegistry) -> bool {
        let Some(index) = self.picked else {
            return false;
        };
        if !self.pressed {
            return false;
        }
        if registry.get(index).is_none() {
            log::warn!("Picked mass {} no longer exists", index);
            self.picked = None;
            return false;
        }
        let Some(ndc) = screen_to_ndc(screen, self.viewport) else {
            log::debug!("Ignoring malformed pointer position {:?}", screen);
            return false;
        };

        self.commands
            .send(MassCommand::SetPosition {
                index,
                x: ndc.x,
                y: ndc.y,
            })
            .is_ok()
    }

    pub fn pointer_up(&mut self) {
        self.pressed = false;
        self.picked = None;
    }

    /// Only the first touch point drags; other fingers are ignored until it lifts
    pub fn touch_start(&mut self, id: u64, screen: Vec2, registry: &MassRegistry) {
        if self.active_touch.is_some() {
            return;
        }
        self.active_touch = Some(id);
        self.pointer_down(screen, PointerKind::Touch, registry);
    }

    pub fn touch_move(&mut self, id: u64, screen: Vec2, registry: &MassRegistry) {
        if self.active_touch == Some(id) {
            self.pointer_move(screen, registry);
        }
    }

    /// Touch end and touch cancel
    pub fn touch_end(&mut self, id: u64) {
        if self.active_touch == Some(id) {
            self.active_touch = None;
            self.pointer_up();
        }
    }
}
