//! Actor components
//!
//! A component is a capability attached to exactly one actor: a camera, a
//! light, or an external renderer implementing the [`Component`] trait.
//! Cameras and lights are known to the scene graph (they register with
//! their layer); everything else stays opaque behind the trait.

use crate::foundation::math::{Aabb, Mat4, Vec2};
use crate::render::{GraphicsDevice, GraphicsError};
use crate::scene::camera::Camera;
use crate::scene::graph::{ActorId, LayerId};
use crate::scene::light::Light;

/// Capability contract implemented by concrete renderers (sprites, text,
/// meshes, shapes, ...) attached to actors
///
/// All methods have benign defaults so a renderer only implements what it
/// participates in.
pub trait Component {
    /// Issue draw calls for this component
    ///
    /// `transform` is the owning actor's world transform, `view_projection`
    /// the active camera's render view-projection.
    fn draw(
        &mut self,
        transform: &Mat4,
        opacity: f32,
        view_projection: &Mat4,
        wireframe: bool,
        device: &mut dyn GraphicsDevice,
    ) -> Result<(), GraphicsError>;

    /// Bounding box in the owning actor's local space; empty boxes never
    /// pass visibility culling
    fn bounding_box(&self) -> Aabb {
        Aabb::empty()
    }

    /// Hit test a point in the owning actor's local space
    fn point_on(&self, local_position: Vec2) -> bool {
        let _ = local_position;
        false
    }

    /// Overlap test against a polygon given in the owning actor's local space
    fn shape_overlaps(&self, local_edges: &[Vec2]) -> bool {
        let _ = local_edges;
        false
    }

    /// The owning actor's transform changed; invalidate dependent caches
    fn update_transform(&mut self) {}

    /// The component was attached to (or detached from) an actor
    fn actor_changed(&mut self, actor: Option<ActorId>) {
        let _ = actor;
    }

    /// The owning actor moved to a different layer
    fn layer_changed(&mut self, layer: Option<LayerId>) {
        let _ = layer;
    }
}

/// Concrete storage for a component attached to an actor
///
/// Cameras and lights are statically typed so the graph can register them
/// with layers and drive projection recalculation; everything else is a
/// boxed [`Component`].
pub enum ComponentKind {
    /// A camera (see [`Camera`])
    Camera(Camera),
    /// A light (see [`Light`])
    Light(Light),
    /// An external renderer
    Custom(Box<dyn Component>),
}

impl ComponentKind {
    /// Local-space bounding box this component contributes to its actor
    pub(crate) fn bounding_box(&self) -> Aabb {
        match self {
            Self::Camera(_) | Self::Light(_) => Aabb::empty(),
            Self::Custom(component) => component.bounding_box(),
        }
    }

    pub(crate) fn point_on(&self, local_position: Vec2) -> bool {
        match self {
            Self::Camera(_) | Self::Light(_) => false,
            Self::Custom(component) => component.point_on(local_position),
        }
    }

    pub(crate) fn shape_overlaps(&self, local_edges: &[Vec2]) -> bool {
        match self {
            Self::Camera(_) | Self::Light(_) => false,
            Self::Custom(component) => component.shape_overlaps(local_edges),
        }
    }
}

/// Arena entry for a component and its back-references
pub struct ComponentEntry {
    /// The component payload
    pub(crate) kind: ComponentKind,
    /// Owning actor, if attached
    pub(crate) actor: Option<ActorId>,
    /// Layer the owning actor currently belongs to
    pub(crate) layer: Option<LayerId>,
    /// Hidden components neither draw nor contribute bounding boxes
    pub(crate) hidden: bool,
}

impl ComponentEntry {
    pub(crate) fn new(kind: ComponentKind) -> Self {
        Self {
            kind,
            actor: None,
            layer: None,
            hidden: false,
        }
    }
}
