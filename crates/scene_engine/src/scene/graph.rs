//! The scene graph arena
//!
//! [`SceneGraph`] owns every actor, component, and layer in generational
//! arenas and exposes all operations that touch more than one node:
//! attaching, reparenting, destruction, traversal, and picking. Nodes refer
//! to each other by copyable ids; a destroyed node's id goes stale and is
//! rejected by the arena.
//!
//! Ownership is dual-tracked: a parent holds every child in `children` and
//! additionally in `owned_children` when it owns the child's lifetime.
//! Destroying a parent destroys its owned subtree and detaches (but keeps
//! alive) referenced children. Components follow the same model.

use crate::foundation::math::{Aabb, Mat4, Quat, Vec2, Vec3};
use crate::render::{GraphicsDevice, GraphicsError};
use crate::scene::actor::{vec2_to_vec3, Actor, Order, Parent};
use crate::scene::camera::Camera;
use crate::scene::component::{Component, ComponentEntry, ComponentKind};
use crate::scene::layer::Layer;
use crate::scene::light::Light;
use slotmap::{new_key_type, SlotMap};
use std::collections::VecDeque;

new_key_type! {
    /// Generational id of an [`Actor`]
    pub struct ActorId;
    /// Generational id of a component
    pub struct ComponentId;
    /// Generational id of a [`Layer`]
    pub struct LayerId;
}

/// A visibility-passed actor queued for drawing, keyed by world order
pub(crate) type DrawEntry = (ActorId, Order);

/// Arena owner of actors, components, and layers
///
/// All id-taking methods panic when handed a stale or foreign id; operating
/// on destroyed nodes is a programming error, not a recoverable condition.
#[derive(Default)]
pub struct SceneGraph {
    pub(crate) actors: SlotMap<ActorId, Actor>,
    pub(crate) components: SlotMap<ComponentId, ComponentEntry>,
    pub(crate) layers: SlotMap<LayerId, Layer>,
}

impl SceneGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a detached actor and return its id
    pub fn spawn(&mut self, actor: Actor) -> ActorId {
        self.actors.insert(actor)
    }

    /// Borrow an actor
    ///
    /// # Panics
    /// Panics if `id` is stale.
    pub fn actor(&self, id: ActorId) -> &Actor {
        &self.actors[id]
    }

    /// Borrow an actor if it is still alive
    pub fn get_actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(id)
    }

    /// Destroy an actor: detach it from its parent, destroy its owned
    /// components and owned descendants, and orphan referenced children
    ///
    /// # Panics
    /// Panics if `id` is stale.
    pub fn destroy_actor(&mut self, id: ActorId) {
        assert!(self.actors.contains_key(id), "destroy_actor: stale actor id");
        self.detach_from_parent(id);
        self.despawn(id);
    }

    pub(crate) fn despawn(&mut self, id: ActorId) {
        let components = self.actors[id].components.clone();
        let owned_components = self.actors[id].owned_components.clone();
        for component in components {
            self.set_component_layer(component, None);
            if owned_components.contains(&component) {
                self.components.remove(component);
            } else if let Some(entry) = self.components.get_mut(component) {
                entry.actor = None;
                if let ComponentKind::Custom(custom) = &mut entry.kind {
                    custom.actor_changed(None);
                }
            }
        }

        let children = self.actors[id].children.clone();
        let owned_children = self.actors[id].owned_children.clone();
        for child in children {
            if owned_children.contains(&child) {
                self.despawn(child);
            } else {
                self.orphan(child);
            }
        }

        self.actors.remove(id);
    }

    /// Detach a referenced child whose parent is going away
    pub(crate) fn orphan(&mut self, child: ActorId) {
        self.actors[child].parent = None;
        if self.actors[child].entered {
            self.set_entered_recursive(child, false);
        }
        self.set_actor_layer(child, None);
    }

    // Tree structure

    /// Attach `child` under `parent` without taking ownership; reparents if
    /// the child was attached elsewhere
    ///
    /// # Panics
    /// Panics if either id is stale.
    pub fn add_child(&mut self, parent: ActorId, child: ActorId) {
        self.attach(Parent::Actor(parent), child, false);
    }

    /// Attach `child` under `parent` and transfer its lifetime to the
    /// parent; the child is destroyed with the parent
    ///
    /// # Panics
    /// Panics if either id is stale.
    pub fn add_owned_child(&mut self, parent: ActorId, child: ActorId) {
        self.attach(Parent::Actor(parent), child, true);
    }

    pub(crate) fn attach(&mut self, parent: Parent, child: ActorId, owned: bool) {
        assert!(self.actors.contains_key(child), "attach: stale child id");

        self.detach_from_parent(child);

        let (layer, entered) = match parent {
            Parent::Actor(id) => {
                let actor = &self.actors[id];
                (actor.layer, actor.entered)
            }
            Parent::Layer(id) => (Some(id), self.layers[id].entered),
        };

        match parent {
            Parent::Actor(id) => {
                self.actors[id].children.push(child);
                if owned {
                    self.actors[id].owned_children.push(child);
                }
            }
            Parent::Layer(id) => {
                self.layers[id].children.push(child);
                if owned {
                    self.layers[id].owned_children.push(child);
                }
            }
        }

        self.actors[child].parent = Some(parent);

        // The child's cached parent transform is stale after reparenting
        match parent {
            Parent::Actor(id) => self.actors[id].update_children_transform.set(true),
            Parent::Layer(_) => self.actors[child].set_parent_transform(Mat4::identity()),
        }

        self.set_actor_layer(child, layer);
        if entered {
            self.set_entered_recursive(child, true);
        }
    }

    /// Remove a direct child; an owned child is destroyed, a referenced
    /// child is detached and stays alive
    ///
    /// Returns `false` (and does nothing) when `child` is not a direct
    /// child of `parent`.
    pub fn remove_child(&mut self, parent: ActorId, child: ActorId) -> bool {
        self.remove_from(Parent::Actor(parent), child)
    }

    pub(crate) fn remove_from(&mut self, parent: Parent, child: ActorId) -> bool {
        let (children, owned_children): (&mut Vec<ActorId>, &mut Vec<ActorId>) = match parent {
            Parent::Actor(id) => {
                let actor = &mut self.actors[id];
                (&mut actor.children, &mut actor.owned_children)
            }
            Parent::Layer(id) => {
                let layer = &mut self.layers[id];
                (&mut layer.children, &mut layer.owned_children)
            }
        };

        let Some(position) = children.iter().position(|&c| c == child) else {
            return false;
        };
        children.remove(position);
        let owned = if let Some(position) = owned_children.iter().position(|&c| c == child) {
            owned_children.remove(position);
            true
        } else {
            false
        };

        self.actors[child].parent = None;
        if self.actors[child].entered {
            self.set_entered_recursive(child, false);
        }
        self.set_actor_layer(child, None);

        if owned {
            self.despawn(child);
        }
        true
    }

    /// Give up ownership of an owned child, detaching it; the caller is now
    /// responsible for destroying it
    ///
    /// Returns the child's id, or `None` when `parent` did not own `child`.
    pub fn release_child(&mut self, parent: ActorId, child: ActorId) -> Option<ActorId> {
        self.release_from(Parent::Actor(parent), child)
    }

    pub(crate) fn release_from(&mut self, parent: Parent, child: ActorId) -> Option<ActorId> {
        let owned_children = match parent {
            Parent::Actor(id) => &mut self.actors[id].owned_children,
            Parent::Layer(id) => &mut self.layers[id].owned_children,
        };
        let position = owned_children.iter().position(|&c| c == child)?;
        owned_children.remove(position);

        self.remove_from(parent, child);
        Some(child)
    }

    /// Detach an actor from whatever parent it has; owned actors survive
    /// (ownership is dropped)
    pub fn remove_from_parent(&mut self, id: ActorId) {
        self.detach_from_parent(id);
    }

    fn detach_from_parent(&mut self, child: ActorId) {
        let Some(parent) = self.actors[child].parent else {
            return;
        };
        match parent {
            Parent::Actor(id) => {
                let actor = &mut self.actors[id];
                actor.children.retain(|&c| c != child);
                actor.owned_children.retain(|&c| c != child);
            }
            Parent::Layer(id) => {
                let layer = &mut self.layers[id];
                layer.children.retain(|&c| c != child);
                layer.owned_children.retain(|&c| c != child);
            }
        }
        self.actors[child].parent = None;
        if self.actors[child].entered {
            self.set_entered_recursive(child, false);
        }
        self.set_actor_layer(child, None);
    }

    /// Detach every child of an actor; owned children are destroyed
    pub fn remove_all_children(&mut self, parent: ActorId) {
        let children = self.actors[parent].children.clone();
        for child in children {
            self.remove_child(parent, child);
        }
    }

    /// Move a child to the front of its siblings (picked first, drawn last
    /// among equals)
    pub fn move_child_to_front(&mut self, parent: ActorId, child: ActorId) -> bool {
        let children = &mut self.actors[parent].children;
        let Some(position) = children.iter().position(|&c| c == child) else {
            return false;
        };
        children.remove(position);
        children.push(child);
        true
    }

    /// Move a child behind all of its siblings
    pub fn move_child_to_back(&mut self, parent: ActorId, child: ActorId) -> bool {
        let children = &mut self.actors[parent].children;
        let Some(position) = children.iter().position(|&c| c == child) else {
            return false;
        };
        children.remove(position);
        children.insert(0, child);
        true
    }

    /// Whether `child` is a child of `parent`, optionally searching the
    /// whole subtree
    pub fn has_child(&self, parent: ActorId, child: ActorId, recursive: bool) -> bool {
        for &direct in &self.actors[parent].children {
            if direct == child {
                return true;
            }
            if recursive && self.has_child(direct, child, true) {
                return true;
            }
        }
        false
    }

    pub(crate) fn set_entered_recursive(&mut self, id: ActorId, entered: bool) {
        self.actors[id].entered = entered;
        let children = self.actors[id].children.clone();
        for child in children {
            self.set_entered_recursive(child, entered);
        }
    }

    pub(crate) fn set_actor_layer(&mut self, id: ActorId, layer: Option<LayerId>) {
        self.actors[id].layer = layer;
        let components = self.actors[id].components.clone();
        for component in components {
            self.set_component_layer(component, layer);
        }
        let children = self.actors[id].children.clone();
        for child in children {
            self.set_actor_layer(child, layer);
        }
    }

    // Spatial mutators; these invalidate the actor's cached transforms and
    // notify attached components.

    /// Set an actor's local position
    pub fn set_position(&mut self, id: ActorId, position: Vec3) {
        self.actors[id].set_position_raw(position);
        self.notify_transform_changed(id);
    }

    /// Set an actor's local rotation
    pub fn set_rotation(&mut self, id: ActorId, rotation: Quat) {
        self.actors[id].set_rotation_raw(rotation);
        self.notify_transform_changed(id);
    }

    /// Set an actor's local rotation from Euler angles (roll, pitch, yaw)
    pub fn set_rotation_euler(&mut self, id: ActorId, angles: Vec3) {
        self.set_rotation(id, Quat::from_euler_angles(angles.x, angles.y, angles.z));
    }

    /// Set an actor's local rotation to an angle about the Z axis
    pub fn set_rotation_angle(&mut self, id: ActorId, angle: f32) {
        self.set_rotation(id, Quat::from_axis_angle(&Vec3::z_axis(), angle));
    }

    /// Set an actor's local scale
    pub fn set_scale(&mut self, id: ActorId, scale: Vec3) {
        self.actors[id].set_scale_raw(scale);
        self.notify_transform_changed(id);
    }

    /// Mirror an actor horizontally
    pub fn set_flip_x(&mut self, id: ActorId, flip_x: bool) {
        self.actors[id].set_flip_x_raw(flip_x);
        self.notify_transform_changed(id);
    }

    /// Mirror an actor vertically
    pub fn set_flip_y(&mut self, id: ActorId, flip_y: bool) {
        self.actors[id].set_flip_y_raw(flip_y);
        self.notify_transform_changed(id);
    }

    /// Set an actor's opacity, clamped to [0, 1]
    pub fn set_opacity(&mut self, id: ActorId, opacity: f32) {
        self.actors[id].set_opacity_raw(opacity);
    }

    /// Set an actor's draw/pick order relative to its siblings
    pub fn set_order(&mut self, id: ActorId, order: Order) {
        self.actors[id].set_order_raw(order);
    }

    /// Include or exclude an actor from picking traversals
    pub fn set_pickable(&mut self, id: ActorId, pickable: bool) {
        self.actors[id].set_pickable_raw(pickable);
    }

    /// Exempt an actor from camera visibility culling
    pub fn set_cull_disabled(&mut self, id: ActorId, cull_disabled: bool) {
        self.actors[id].set_cull_disabled_raw(cull_disabled);
    }

    /// Hide or show an actor and its subtree
    pub fn set_hidden(&mut self, id: ActorId, hidden: bool) {
        self.actors[id].set_hidden_raw(hidden);
    }

    fn notify_transform_changed(&mut self, id: ActorId) {
        let components = self.actors[id].components.clone();
        for component in components {
            if let ComponentKind::Custom(custom) = &mut self.components[component].kind {
                custom.update_transform();
            }
        }
    }

    // World-space queries; these pull through the parent chain and are
    // correct regardless of visit timing.

    /// World transform of an actor, composed through its parent chain
    pub fn world_transform(&self, id: ActorId) -> Mat4 {
        let actor = &self.actors[id];
        match actor.parent {
            Some(Parent::Actor(parent)) => self.world_transform(parent) * actor.local_transform(),
            _ => actor.local_transform(),
        }
    }

    /// World position of an actor's origin
    pub fn world_position(&self, id: ActorId) -> Vec3 {
        crate::foundation::math::transform_point(&self.world_transform(id), Vec3::zeros())
    }

    // Components

    /// Insert a detached component and return its id
    pub fn create_component(&mut self, kind: ComponentKind) -> ComponentId {
        self.components.insert(ComponentEntry::new(kind))
    }

    /// Create a component and attach it to an actor, owned
    pub fn add_component(&mut self, actor: ActorId, kind: ComponentKind) -> ComponentId {
        let component = self.create_component(kind);
        self.attach_owned_component(actor, component);
        component
    }

    /// Attach a component to an actor without transferring ownership
    pub fn attach_component(&mut self, actor: ActorId, component: ComponentId) {
        self.attach_component_inner(actor, component, false);
    }

    /// Attach a component to an actor and tie its lifetime to the actor
    pub fn attach_owned_component(&mut self, actor: ActorId, component: ComponentId) {
        self.attach_component_inner(actor, component, true);
    }

    fn attach_component_inner(&mut self, actor: ActorId, component: ComponentId, owned: bool) {
        assert!(
            self.components.contains_key(component),
            "attach_component: stale component id"
        );
        self.detach_component(component);

        self.actors[actor].components.push(component);
        if owned {
            self.actors[actor].owned_components.push(component);
        }
        self.components[component].actor = Some(actor);

        if let ComponentKind::Custom(custom) = &mut self.components[component].kind {
            custom.actor_changed(Some(actor));
        }

        let layer = self.actors[actor].layer;
        self.set_component_layer(component, layer);
    }

    /// Detach a component from its actor; an owned component is destroyed
    ///
    /// Returns `false` when the component was not attached.
    pub fn detach_component(&mut self, component: ComponentId) -> bool {
        let Some(actor) = self.components[component].actor else {
            return false;
        };

        let holder = &mut self.actors[actor];
        holder.components.retain(|&c| c != component);
        let owned = {
            let before = holder.owned_components.len();
            holder.owned_components.retain(|&c| c != component);
            holder.owned_components.len() != before
        };

        self.components[component].actor = None;
        self.set_component_layer(component, None);
        if let ComponentKind::Custom(custom) = &mut self.components[component].kind {
            custom.actor_changed(None);
        }

        if owned {
            self.components.remove(component);
        }
        true
    }

    /// Give up ownership of an owned component, detaching it; the caller
    /// must destroy it eventually
    pub fn release_component(&mut self, component: ComponentId) -> Option<ComponentId> {
        let actor = self.components[component].actor?;
        let owned_components = &mut self.actors[actor].owned_components;
        let position = owned_components.iter().position(|&c| c == component)?;
        owned_components.remove(position);

        self.detach_component(component);
        Some(component)
    }

    /// Destroy a detached component
    ///
    /// # Panics
    /// Panics if the component is still attached; detach it first.
    pub fn destroy_component(&mut self, component: ComponentId) {
        assert!(
            self.components[component].actor.is_none(),
            "destroy_component: component is still attached"
        );
        self.set_component_layer(component, None);
        self.components.remove(component);
    }

    pub(crate) fn set_component_layer(&mut self, component: ComponentId, layer: Option<LayerId>) {
        let old = self.components[component].layer;
        if old == layer {
            return;
        }

        let is_camera = matches!(self.components[component].kind, ComponentKind::Camera(_));
        let is_light = matches!(self.components[component].kind, ComponentKind::Light(_));

        if let Some(old) = old {
            if let Some(entry) = self.layers.get_mut(old) {
                entry.cameras.retain(|&c| c != component);
                entry.lights.retain(|&c| c != component);
            }
        }

        self.components[component].layer = layer;

        if let Some(new) = layer {
            if is_camera {
                self.layers[new].cameras.push(component);
            } else if is_light {
                self.layers[new].lights.push(component);
            }
        }

        if let ComponentKind::Custom(custom) = &mut self.components[component].kind {
            custom.layer_changed(layer);
        }
    }

    /// Whether a component is hidden (skipped by draw, bounds, and hit
    /// tests)
    pub fn component_hidden(&self, component: ComponentId) -> bool {
        self.components[component].hidden
    }

    /// Hide or show a component
    pub fn set_component_hidden(&mut self, component: ComponentId, hidden: bool) {
        self.components[component].hidden = hidden;
    }

    /// Borrow a camera component
    ///
    /// # Panics
    /// Panics if `component` is stale or not a camera.
    pub fn camera(&self, component: ComponentId) -> &Camera {
        match &self.components[component].kind {
            ComponentKind::Camera(camera) => camera,
            _ => panic!("component is not a camera"),
        }
    }

    /// Mutably borrow a camera component
    ///
    /// # Panics
    /// Panics if `component` is stale or not a camera.
    pub fn camera_mut(&mut self, component: ComponentId) -> &mut Camera {
        match &mut self.components[component].kind {
            ComponentKind::Camera(camera) => camera,
            _ => panic!("component is not a camera"),
        }
    }

    /// Borrow a light component
    ///
    /// # Panics
    /// Panics if `component` is stale or not a light.
    pub fn light(&self, component: ComponentId) -> &Light {
        match &self.components[component].kind {
            ComponentKind::Light(light) => light,
            _ => panic!("component is not a light"),
        }
    }

    /// Mutably borrow a light component
    ///
    /// # Panics
    /// Panics if `component` is stale or not a light.
    pub fn light_mut(&mut self, component: ComponentId) -> &mut Light {
        match &mut self.components[component].kind {
            ComponentKind::Light(light) => light,
            _ => panic!("component is not a light"),
        }
    }

    /// Mutably borrow a custom component
    ///
    /// # Panics
    /// Panics if `component` is stale or not a custom component.
    pub fn custom_component_mut(&mut self, component: ComponentId) -> &mut dyn Component {
        match &mut self.components[component].kind {
            ComponentKind::Custom(custom) => custom.as_mut(),
            _ => panic!("component is not a custom component"),
        }
    }

    /// Local-space bounding box of an actor: the merge of its non-hidden
    /// components' boxes
    pub fn actor_bounding_box(&self, id: ActorId) -> Aabb {
        let mut bounds = Aabb::empty();
        for &component in &self.actors[id].components {
            let entry = &self.components[component];
            if !entry.hidden {
                bounds.merge(&entry.kind.bounding_box());
            }
        }
        bounds
    }

    /// Hit test a world-space point against an actor's components
    pub fn actor_point_on(&self, id: ActorId, position: Vec2) -> bool {
        let local = self.actors[id].convert_world_to_local(vec2_to_vec3(position));
        self.actors[id].components.iter().any(|&component| {
            let entry = &self.components[component];
            !entry.hidden && entry.kind.point_on(Vec2::new(local.x, local.y))
        })
    }

    /// Overlap test a world-space polygon against an actor's components
    pub fn actor_shape_overlaps(&self, id: ActorId, edges: &[Vec2]) -> bool {
        let actor = &self.actors[id];
        let local_edges: Vec<Vec2> = edges
            .iter()
            .map(|&edge| {
                let local = actor.convert_world_to_local(vec2_to_vec3(edge));
                Vec2::new(local.x, local.y)
            })
            .collect();
        actor.components.iter().any(|&component| {
            let entry = &self.components[component];
            !entry.hidden && entry.kind.shape_overlaps(&local_edges)
        })
    }

    // Traversal

    /// Depth-first visit pass: refresh world order, world hidden, and
    /// pushed-down parent transforms, and collect visible actors into the
    /// draw queue sorted by descending world order
    pub(crate) fn visit(
        &mut self,
        id: ActorId,
        parent_transform: &Mat4,
        parent_transform_dirty: bool,
        camera: Option<&Camera>,
        parent_order: Order,
        parent_hidden: bool,
        draw_queue: &mut Vec<DrawEntry>,
    ) {
        {
            let actor = &mut self.actors[id];
            actor.world_order = parent_order + actor.order();
            actor.world_hidden = parent_hidden || actor.is_hidden();
        }

        if parent_transform_dirty {
            self.actors[id].set_parent_transform(*parent_transform);
            self.notify_transform_changed(id);
        }

        // Forces recomputation now so the children-update flag is current
        let transform = self.actors[id].transform();

        let (world_order, world_hidden, cull_disabled) = {
            let actor = &self.actors[id];
            (actor.world_order, actor.world_hidden, actor.is_cull_disabled())
        };

        if !world_hidden {
            let visible = cull_disabled
                || camera.map_or(true, |camera| {
                    let bounds = self.actor_bounding_box(id);
                    !bounds.is_empty() && camera.check_visibility(&transform, &bounds)
                });
            if visible {
                let index = draw_queue.partition_point(|entry| entry.1 >= world_order);
                draw_queue.insert(index, (id, world_order));
            }
        }

        let update_children = self.actors[id].update_children_transform.get();
        let children = self.actors[id].children.clone();
        for child in children {
            self.visit(
                child,
                &transform,
                update_children,
                camera,
                world_order,
                world_hidden,
                draw_queue,
            );
        }
        self.actors[id].update_children_transform.set(false);
    }

    /// Issue draw calls for an actor's non-hidden custom components
    pub(crate) fn draw_actor(
        &mut self,
        id: ActorId,
        camera: &Camera,
        device: &mut dyn GraphicsDevice,
    ) -> Result<(), GraphicsError> {
        let transform = self.actors[id].transform();
        let opacity = self.actors[id].opacity();
        let components = self.actors[id].components.clone();
        for component in components {
            let entry = &mut self.components[component];
            if entry.hidden {
                continue;
            }
            if let ComponentKind::Custom(custom) = &mut entry.kind {
                custom.draw(
                    &transform,
                    opacity,
                    &camera.render_view_projection(),
                    camera.wireframe(),
                    device,
                )?;
            }
        }
        Ok(())
    }

    /// Recompute a camera's cached matrices from its owning actor's inverse
    /// world transform; a detached camera's view is the identity
    ///
    /// # Panics
    /// Panics if `component` is stale or not a camera.
    pub fn refresh_camera(&mut self, component: ComponentId) {
        let view = self.components[component].actor.map_or_else(Mat4::identity, |actor| {
            self.world_transform(actor)
                .try_inverse()
                .unwrap_or_else(Mat4::identity)
        });
        self.camera_mut(component).update_matrices(view);
    }

    // Picking

    /// Collect pickable actors under a world-space point, front-most first
    ///
    /// Children are searched breadth-first and front-to-back; hidden
    /// subtrees are skipped entirely. Results come back sorted by ascending
    /// world order (front-most first), stable among equals.
    pub fn find_actors(&self, roots: &[ActorId], position: Vec2) -> Vec<ActorId> {
        self.find(roots, |graph, actor| graph.actor_point_on(actor, position))
    }

    /// Collect pickable actors overlapping a world-space polygon, ordered
    /// like [`SceneGraph::find_actors`]
    pub fn find_actors_overlapping(&self, roots: &[ActorId], edges: &[Vec2]) -> Vec<ActorId> {
        self.find(roots, |graph, actor| graph.actor_shape_overlaps(actor, edges))
    }

    fn find(&self, roots: &[ActorId], hit: impl Fn(&Self, ActorId) -> bool) -> Vec<ActorId> {
        let mut hits: Vec<DrawEntry> = Vec::new();
        let mut pending: VecDeque<Vec<ActorId>> = VecDeque::new();
        pending.push_back(roots.to_vec());

        while let Some(children) = pending.pop_front() {
            for &child in children.iter().rev() {
                let actor = &self.actors[child];
                if actor.is_hidden() {
                    continue;
                }
                pending.push_back(actor.children.clone());
                if actor.is_pickable() && hit(self, child) {
                    let order = actor.world_order();
                    let index = hits.partition_point(|entry| entry.1 <= order);
                    hits.insert(index, (child, order));
                }
            }
        }

        hits.into_iter().map(|entry| entry.0).collect()
    }
}
