//! Lights
//!
//! A light is a component that registers itself with its layer so draw
//! passes can enumerate the lights affecting them. Concrete shading is the
//! renderer's business; the scene graph only tracks membership and the
//! light's parameters.

use crate::render::Color;

/// How a light emits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightKind {
    /// Uniform light with no position or direction
    Ambient,
    /// Parallel rays along the owning actor's orientation
    Directional,
    /// Omnidirectional light at the owning actor's position
    Point,
    /// Cone light along the owning actor's orientation
    Spot,
}

/// A light component
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    kind: LightKind,
    color: Color,
}

impl Light {
    /// Create a light of the given kind with the given color
    pub fn new(kind: LightKind, color: Color) -> Self {
        Self { kind, color }
    }

    /// The light's kind
    pub fn kind(&self) -> LightKind {
        self.kind
    }

    /// The light's color
    pub fn color(&self) -> Color {
        self.color
    }

    /// Change the light's color
    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }
}
