//! Actors
//!
//! An actor is a node in the scene tree: a spatial transform, draw/pick
//! flags, and a list of attached components. Tree structure and all
//! operations that touch more than one node live on
//! [`crate::scene::SceneGraph`]; this module holds the per-node state and
//! the lazily cached transform math.

use crate::foundation::math::{self, Mat4, Quat, Vec2, Vec3};
use crate::scene::graph::{ActorId, ComponentId, LayerId};
use std::cell::Cell;

/// Draw/pick priority; an actor's world order is the sum of `order` along
/// its ancestor chain
pub type Order = i32;

/// Where an actor is parented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parent {
    /// Direct child of another actor
    Actor(ActorId),
    /// Root actor of a layer
    Layer(LayerId),
}

/// A node in the scene tree
///
/// Local transform state (position, rotation, scale, flip) feeds three
/// lazily cached matrices: the local transform, the world transform
/// (parent world x local), and its inverse. Each cache carries a dirty
/// flag and recomputes exactly once per invalidation; recomputation is
/// idempotent and safe from shared references.
pub struct Actor {
    // Tree structure, maintained by SceneGraph
    pub(crate) children: Vec<ActorId>,
    pub(crate) owned_children: Vec<ActorId>,
    pub(crate) parent: Option<Parent>,
    pub(crate) layer: Option<LayerId>,
    pub(crate) entered: bool,

    pub(crate) components: Vec<ComponentId>,
    pub(crate) owned_components: Vec<ComponentId>,

    // Spatial state
    position: Vec3,
    rotation: Quat,
    scale: Vec3,
    flip_x: bool,
    flip_y: bool,
    opacity: f32,
    order: Order,

    pickable: bool,
    cull_disabled: bool,
    hidden: bool,

    // Derived during visit
    pub(crate) world_order: Order,
    pub(crate) world_hidden: bool,

    // Cached transforms
    pub(crate) parent_transform: Mat4,
    local_transform: Cell<Mat4>,
    transform: Cell<Mat4>,
    inverse_transform: Cell<Mat4>,
    local_transform_dirty: Cell<bool>,
    transform_dirty: Cell<bool>,
    inverse_transform_dirty: Cell<bool>,
    pub(crate) update_children_transform: Cell<bool>,

    local_transform_recalculations: Cell<u32>,
}

impl Default for Actor {
    fn default() -> Self {
        Self::new()
    }
}

impl Actor {
    /// Create a detached actor at the origin
    pub fn new() -> Self {
        Self {
            children: Vec::new(),
            owned_children: Vec::new(),
            parent: None,
            layer: None,
            entered: false,
            components: Vec::new(),
            owned_components: Vec::new(),
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
            flip_x: false,
            flip_y: false,
            opacity: 1.0,
            order: 0,
            pickable: false,
            cull_disabled: false,
            hidden: false,
            world_order: 0,
            world_hidden: false,
            parent_transform: Mat4::identity(),
            local_transform: Cell::new(Mat4::identity()),
            transform: Cell::new(Mat4::identity()),
            inverse_transform: Cell::new(Mat4::identity()),
            local_transform_dirty: Cell::new(true),
            transform_dirty: Cell::new(true),
            inverse_transform_dirty: Cell::new(true),
            update_children_transform: Cell::new(true),
            local_transform_recalculations: Cell::new(0),
        }
    }

    /// Local position
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Local rotation
    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    /// Local scale
    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    /// Horizontal mirror flag
    pub fn flip_x(&self) -> bool {
        self.flip_x
    }

    /// Vertical mirror flag
    pub fn flip_y(&self) -> bool {
        self.flip_y
    }

    /// Opacity in [0, 1]
    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Draw/pick order relative to siblings
    pub fn order(&self) -> Order {
        self.order
    }

    /// Whether picking traversals consider this actor
    pub fn is_pickable(&self) -> bool {
        self.pickable
    }

    /// Whether this actor bypasses camera visibility culling
    pub fn is_cull_disabled(&self) -> bool {
        self.cull_disabled
    }

    /// Whether this actor (and its subtree) is hidden
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Whether this actor or any ancestor was hidden during the last visit
    pub fn is_world_hidden(&self) -> bool {
        self.world_hidden
    }

    /// World order computed during the last visit
    pub fn world_order(&self) -> Order {
        self.world_order
    }

    /// This actor's parent, if attached to a tree
    pub fn parent(&self) -> Option<Parent> {
        self.parent
    }

    /// The layer this actor currently belongs to
    pub fn layer(&self) -> Option<LayerId> {
        self.layer
    }

    /// Whether this actor is live in an entered scene
    pub fn is_entered(&self) -> bool {
        self.entered
    }

    /// Direct children, back-most first
    pub fn children(&self) -> &[ActorId] {
        &self.children
    }

    /// Attached components in attach order
    pub fn components(&self) -> &[ComponentId] {
        &self.components
    }

    /// The local transform (translation x rotation x scale-with-flip),
    /// recomputed at most once per invalidation
    pub fn local_transform(&self) -> Mat4 {
        if self.local_transform_dirty.get() {
            self.calculate_local_transform();
        }
        self.local_transform.get()
    }

    /// The world transform (parent world x local), recomputed at most once
    /// per invalidation
    pub fn transform(&self) -> Mat4 {
        if self.transform_dirty.get() {
            self.calculate_transform();
        }
        self.transform.get()
    }

    /// Inverse of the world transform, recomputed at most once per
    /// invalidation
    pub fn inverse_transform(&self) -> Mat4 {
        if self.inverse_transform_dirty.get() {
            let inverse = self
                .transform()
                .try_inverse()
                .unwrap_or_else(Mat4::identity);
            self.inverse_transform.set(inverse);
            self.inverse_transform_dirty.set(false);
        }
        self.inverse_transform.get()
    }

    /// Position of the actor's origin in world space
    pub fn world_position(&self) -> Vec3 {
        math::transform_point(&self.transform(), Vec3::zeros())
    }

    /// Map a world-space position into this actor's local space
    pub fn convert_world_to_local(&self, world_position: Vec3) -> Vec3 {
        math::transform_point(&self.inverse_transform(), world_position)
    }

    /// Map a local-space position into world space
    pub fn convert_local_to_world(&self, local_position: Vec3) -> Vec3 {
        math::transform_point(&self.transform(), local_position)
    }

    /// How many times the local transform has been recomputed; lazy caching
    /// diagnostics
    pub fn local_transform_recalculations(&self) -> u32 {
        self.local_transform_recalculations.get()
    }

    // Raw mutators; SceneGraph wraps these to also notify attached
    // components.

    pub(crate) fn set_position_raw(&mut self, position: Vec3) {
        self.position = position;
        self.invalidate_local_transform();
    }

    pub(crate) fn set_rotation_raw(&mut self, rotation: Quat) {
        self.rotation = rotation;
        self.invalidate_local_transform();
    }

    pub(crate) fn set_scale_raw(&mut self, scale: Vec3) {
        self.scale = scale;
        self.invalidate_local_transform();
    }

    pub(crate) fn set_flip_x_raw(&mut self, flip_x: bool) {
        self.flip_x = flip_x;
        self.invalidate_local_transform();
    }

    pub(crate) fn set_flip_y_raw(&mut self, flip_y: bool) {
        self.flip_y = flip_y;
        self.invalidate_local_transform();
    }

    pub(crate) fn set_opacity_raw(&mut self, opacity: f32) {
        self.opacity = opacity.clamp(0.0, 1.0);
    }

    pub(crate) fn set_order_raw(&mut self, order: Order) {
        self.order = order;
    }

    pub(crate) fn set_pickable_raw(&mut self, pickable: bool) {
        self.pickable = pickable;
    }

    pub(crate) fn set_cull_disabled_raw(&mut self, cull_disabled: bool) {
        self.cull_disabled = cull_disabled;
    }

    pub(crate) fn set_hidden_raw(&mut self, hidden: bool) {
        self.hidden = hidden;
    }

    /// A local mutation invalidates all three cached matrices
    fn invalidate_local_transform(&mut self) {
        self.local_transform_dirty.set(true);
        self.transform_dirty.set(true);
        self.inverse_transform_dirty.set(true);
    }

    /// The parent's world transform changed; the local cache stays valid
    pub(crate) fn set_parent_transform(&mut self, parent_transform: Mat4) {
        self.parent_transform = parent_transform;
        self.transform_dirty.set(true);
        self.inverse_transform_dirty.set(true);
    }

    fn calculate_local_transform(&self) {
        let flip_scale = Vec3::new(
            self.scale.x * if self.flip_x { -1.0 } else { 1.0 },
            self.scale.y * if self.flip_y { -1.0 } else { 1.0 },
            self.scale.z,
        );

        let local = Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&flip_scale);

        self.local_transform.set(local);
        self.local_transform_dirty.set(false);
        self.local_transform_recalculations
            .set(self.local_transform_recalculations.get() + 1);
    }

    fn calculate_transform(&self) {
        self.transform.set(self.parent_transform * self.local_transform());
        self.transform_dirty.set(false);

        // Children revisit with the new world transform on the next pass
        self.update_children_transform.set(true);
    }
}

/// Builder-style convenience setters used when constructing actors before
/// spawning them into a graph
impl Actor {
    /// Set the local position
    #[must_use]
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.set_position_raw(position);
        self
    }

    /// Set the local rotation
    #[must_use]
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.set_rotation_raw(rotation);
        self
    }

    /// Set the local scale
    #[must_use]
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.set_scale_raw(scale);
        self
    }

    /// Set the sibling order
    #[must_use]
    pub fn with_order(mut self, order: Order) -> Self {
        self.set_order_raw(order);
        self
    }

    /// Mark the actor pickable
    #[must_use]
    pub fn with_pickable(mut self, pickable: bool) -> Self {
        self.set_pickable_raw(pickable);
        self
    }
}

/// Extend a 2D position into the XY plane
pub fn vec2_to_vec3(v: Vec2) -> Vec3 {
    Vec3::new(v.x, v.y, 0.0)
}
