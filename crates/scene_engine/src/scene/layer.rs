//! Layers
//!
//! A layer is a root container of actors plus the cameras and lights
//! registered on it. Each camera of a layer gets its own visit and draw
//! pass; cameras are also the entry point for pointer picking, iterated
//! back-to-front so the top-most camera wins.
//!
//! Layer-level operations live on [`SceneGraph`] next to the other
//! multi-node operations; the [`Layer`] struct itself is plain state.

use crate::foundation::math::{Mat4, Vec2, Vec3};
use crate::render::{DepthStencilState, GraphicsDevice, GraphicsError};
use crate::scene::actor::{vec2_to_vec3, Order, Parent};
use crate::scene::graph::{ActorId, ComponentId, DrawEntry, LayerId, SceneGraph};

/// A root container of actors drawn by its registered cameras
pub struct Layer {
    pub(crate) children: Vec<ActorId>,
    pub(crate) owned_children: Vec<ActorId>,
    pub(crate) entered: bool,
    // Cameras and lights of actors in this layer, in attach order
    pub(crate) cameras: Vec<ComponentId>,
    pub(crate) lights: Vec<ComponentId>,
    pub(crate) order: Order,
}

impl Default for Layer {
    fn default() -> Self {
        Self::new()
    }
}

impl Layer {
    /// Create an empty layer with order 0
    pub fn new() -> Self {
        Self {
            children: Vec::new(),
            owned_children: Vec::new(),
            entered: false,
            cameras: Vec::new(),
            lights: Vec::new(),
            order: 0,
        }
    }

    /// Root actors, back-most first
    pub fn children(&self) -> &[ActorId] {
        &self.children
    }

    /// Cameras registered on this layer, in attach order
    pub fn cameras(&self) -> &[ComponentId] {
        &self.cameras
    }

    /// Lights registered on this layer, in attach order
    pub fn lights(&self) -> &[ComponentId] {
        &self.lights
    }

    /// Draw order among the scene's layers; higher orders draw first
    /// (further back)
    pub fn order(&self) -> Order {
        self.order
    }

    /// Whether the layer is part of an entered scene
    pub fn is_entered(&self) -> bool {
        self.entered
    }
}

impl SceneGraph {
    /// Insert an empty layer and return its id
    pub fn create_layer(&mut self) -> LayerId {
        self.layers.insert(Layer::new())
    }

    /// Borrow a layer
    ///
    /// # Panics
    /// Panics if `id` is stale.
    pub fn layer(&self, id: LayerId) -> &Layer {
        &self.layers[id]
    }

    /// Borrow a layer if it is still alive
    pub fn get_layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.get(id)
    }

    /// Set a layer's draw order among the scene's layers
    pub fn set_layer_order(&mut self, id: LayerId, order: Order) {
        self.layers[id].order = order;
    }

    /// Destroy a layer: its owned actors are destroyed, referenced root
    /// actors are detached and kept alive
    ///
    /// # Panics
    /// Panics if `id` is stale.
    pub fn destroy_layer(&mut self, id: LayerId) {
        assert!(self.layers.contains_key(id), "destroy_layer: stale layer id");
        let children = self.layers[id].children.clone();
        let owned_children = self.layers[id].owned_children.clone();
        for child in children {
            if owned_children.contains(&child) {
                self.despawn(child);
            } else {
                self.orphan(child);
            }
        }
        self.layers.remove(id);
    }

    /// Attach a root actor to a layer without taking ownership
    pub fn add_layer_child(&mut self, layer: LayerId, child: ActorId) {
        self.attach(Parent::Layer(layer), child, false);
    }

    /// Attach a root actor to a layer, destroying it with the layer
    pub fn add_owned_layer_child(&mut self, layer: LayerId, child: ActorId) {
        self.attach(Parent::Layer(layer), child, true);
    }

    /// Remove a root actor from a layer; owned actors are destroyed
    ///
    /// Returns `false` when `child` is not a root actor of `layer`.
    pub fn remove_layer_child(&mut self, layer: LayerId, child: ActorId) -> bool {
        self.remove_from(Parent::Layer(layer), child)
    }

    /// Give up a layer's ownership of a root actor, detaching it
    pub fn release_layer_child(&mut self, layer: LayerId, child: ActorId) -> Option<ActorId> {
        self.release_from(Parent::Layer(layer), child)
    }

    /// Mark a layer and its actors as live in an entered scene
    pub fn enter_layer(&mut self, id: LayerId) {
        log::debug!("entering layer");
        self.layers[id].entered = true;
        let children = self.layers[id].children.clone();
        for child in children {
            self.set_entered_recursive(child, true);
        }
    }

    /// Mark a layer and its actors as no longer live
    pub fn leave_layer(&mut self, id: LayerId) {
        log::debug!("leaving layer");
        self.layers[id].entered = false;
        let children = self.layers[id].children.clone();
        for child in children {
            self.set_entered_recursive(child, false);
        }
    }

    /// Visit a layer's tree for one camera: refresh world orders, world
    /// hidden flags and pushed-down transforms, and collect the visible
    /// actors sorted by descending world order
    ///
    /// With no camera every non-hidden actor is collected (no culling).
    pub(crate) fn visit_layer(
        &mut self,
        layer: LayerId,
        camera: Option<&crate::scene::camera::Camera>,
    ) -> Vec<DrawEntry> {
        let mut draw_queue = Vec::new();
        let children = self.layers[layer].children.clone();
        for child in children {
            self.visit(
                child,
                &Mat4::identity(),
                false,
                camera,
                0,
                false,
                &mut draw_queue,
            );
        }
        draw_queue
    }

    /// Draw a layer: one visit and draw pass per registered camera
    ///
    /// Each pass binds the camera's render target, viewport, and depth
    /// state, then draws the queue back-to-front. Render-target clearing is
    /// the scene's responsibility (it deduplicates across layers).
    pub fn draw_layer(
        &mut self,
        layer: LayerId,
        device: &mut dyn GraphicsDevice,
    ) -> Result<(), GraphicsError> {
        let cameras = self.layers[layer].cameras.clone();
        for camera_id in cameras {
            let target = self.camera(camera_id).render_target();
            let target_size = device.render_target_size(target);
            if self.camera(camera_id).calculated_target_size() != target_size {
                self.camera_mut(camera_id).recalculate_projection(target_size);
            }
            self.refresh_camera(camera_id);
            let camera = self.camera(camera_id).clone();

            let draw_queue = self.visit_layer(layer, Some(&camera));

            device.set_render_target(camera.render_target())?;
            device.set_viewport(camera.render_viewport())?;
            let depth_state = camera.depth_test().then_some(DepthStencilState::LESS_EQUAL);
            device.set_depth_stencil_state(depth_state, camera.stencil_reference_value())?;

            for (actor, _) in draw_queue {
                self.draw_actor(actor, &camera, device)?;
            }
        }
        Ok(())
    }

    /// Recalculate every layer camera's projection for the current render
    /// target sizes
    pub fn recalculate_layer_projection(&mut self, layer: LayerId, device: &dyn GraphicsDevice) {
        let cameras = self.layers[layer].cameras.clone();
        for camera_id in cameras {
            let target = self.camera(camera_id).render_target();
            let target_size = device.render_target_size(target);
            self.camera_mut(camera_id).recalculate_projection(target_size);
        }
    }

    /// Pick the front-most actor of a layer under a window-normalized
    /// position
    ///
    /// Cameras are tried back-to-front; cameras drawing into render targets
    /// are skipped unless `pick_render_targets`. Returns the actor and the
    /// hit position in its local space.
    pub fn pick_layer_actor(
        &self,
        layer: LayerId,
        position: Vec2,
        pick_render_targets: bool,
    ) -> Option<(ActorId, Vec3)> {
        for &camera_id in self.layers[layer].cameras.iter().rev() {
            let camera = self.camera(camera_id);
            if !pick_render_targets && camera.render_target().is_some() {
                continue;
            }

            let world = camera.convert_normalized_to_world(position);
            let world_position = Vec2::new(world.x, world.y);
            let hits = self.find_actors(&self.layers[layer].children, world_position);
            if let Some(&actor) = hits.first() {
                let local = self.actors[actor].convert_world_to_local(vec2_to_vec3(world_position));
                return Some((actor, local));
            }
        }
        None
    }

    /// Pick every actor of a layer under a window-normalized position,
    /// front-most first within each camera
    pub fn pick_layer_actors(
        &self,
        layer: LayerId,
        position: Vec2,
        pick_render_targets: bool,
    ) -> Vec<(ActorId, Vec3)> {
        let mut result = Vec::new();
        for &camera_id in self.layers[layer].cameras.iter().rev() {
            let camera = self.camera(camera_id);
            if !pick_render_targets && camera.render_target().is_some() {
                continue;
            }

            let world = camera.convert_normalized_to_world(position);
            let world_position = Vec2::new(world.x, world.y);
            for actor in self.find_actors(&self.layers[layer].children, world_position) {
                let local = self.actors[actor].convert_world_to_local(vec2_to_vec3(world_position));
                result.push((actor, local));
            }
        }
        result
    }

    /// Pick every actor of a layer overlapping a window-normalized polygon
    pub fn pick_layer_actors_overlapping(
        &self,
        layer: LayerId,
        edges: &[Vec2],
        pick_render_targets: bool,
    ) -> Vec<ActorId> {
        let mut result = Vec::new();
        for &camera_id in self.layers[layer].cameras.iter().rev() {
            let camera = self.camera(camera_id);
            if !pick_render_targets && camera.render_target().is_some() {
                continue;
            }

            let world_edges: Vec<Vec2> = edges
                .iter()
                .map(|&edge| {
                    let world = camera.convert_normalized_to_world(edge);
                    Vec2::new(world.x, world.y)
                })
                .collect();
            result.extend(self.find_actors_overlapping(&self.layers[layer].children, &world_edges));
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{DeviceCall, NullDevice, RenderTargetId};
    use crate::scene::actor::Actor;
    use crate::scene::camera::{Camera, ScaleMode};
    use crate::scene::component::ComponentKind;
    use crate::scene::test_support::TestQuad;

    fn ortho_camera() -> ComponentKind {
        ComponentKind::Camera(Camera::orthographic(
            Vec2::new(800.0, 600.0),
            ScaleMode::ShowAll,
        ))
    }

    fn layer_with_camera(graph: &mut SceneGraph) -> (LayerId, ActorId, ComponentId) {
        let layer = graph.create_layer();
        let camera_actor = graph.spawn(Actor::new());
        let camera = graph.add_component(camera_actor, ortho_camera());
        graph.add_owned_layer_child(layer, camera_actor);
        (layer, camera_actor, camera)
    }

    #[test]
    fn test_camera_registers_with_layer() {
        let mut graph = SceneGraph::new();
        let (layer, camera_actor, camera) = layer_with_camera(&mut graph);
        assert_eq!(graph.layer(layer).cameras(), &[camera]);

        graph.remove_layer_child(layer, camera_actor);
        assert!(graph.layer(layer).cameras().is_empty());
    }

    #[test]
    fn test_light_registers_with_layer() {
        use crate::render::Color;
        use crate::scene::light::{Light, LightKind};

        let mut graph = SceneGraph::new();
        let layer = graph.create_layer();
        let actor = graph.spawn(Actor::new());
        let light = graph.add_component(
            actor,
            ComponentKind::Light(Light::new(LightKind::Point, Color::BLACK)),
        );

        graph.add_owned_layer_child(layer, actor);
        assert_eq!(graph.layer(layer).lights(), &[light]);

        graph.detach_component(light);
        assert!(graph.layer(layer).lights().is_empty());
    }

    #[test]
    fn test_draw_layer_binds_camera_state() {
        let mut graph = SceneGraph::new();
        let (layer, _, _) = layer_with_camera(&mut graph);
        let quad = graph.spawn(Actor::new());
        graph.add_component(quad, ComponentKind::Custom(Box::new(TestQuad::new(50.0))));
        graph.add_owned_layer_child(layer, quad);

        let mut device = NullDevice::new(800, 600);
        graph.draw_layer(layer, &mut device).unwrap();

        assert!(device
            .calls
            .contains(&DeviceCall::SetRenderTarget(None)));
        assert!(device
            .calls
            .iter()
            .any(|call| matches!(call, DeviceCall::SetViewport(_))));
        assert!(device
            .calls
            .iter()
            .any(|call| matches!(call, DeviceCall::Draw(_, 6))));
    }

    #[test]
    fn test_draw_order_back_to_front() {
        let mut graph = SceneGraph::new();
        let (layer, _, _) = layer_with_camera(&mut graph);

        let front = graph.spawn(Actor::new().with_order(1));
        graph.add_component(
            front,
            ComponentKind::Custom(Box::new(TestQuad::tagged(50.0, 1))),
        );
        let back = graph.spawn(Actor::new().with_order(10));
        graph.add_component(
            back,
            ComponentKind::Custom(Box::new(TestQuad::tagged(50.0, 2))),
        );
        graph.add_owned_layer_child(layer, front);
        graph.add_owned_layer_child(layer, back);

        let mut device = NullDevice::new(800, 600);
        graph.draw_layer(layer, &mut device).unwrap();

        let draws: Vec<u64> = device
            .calls
            .iter()
            .filter_map(|call| match call {
                DeviceCall::Draw(buffer, _) => Some(buffer.0),
                _ => None,
            })
            .collect();
        assert_eq!(draws, vec![2, 1]);
    }

    #[test]
    fn test_offscreen_actor_is_culled() {
        let mut graph = SceneGraph::new();
        let (layer, _, _) = layer_with_camera(&mut graph);
        let quad = graph.spawn(Actor::new().with_position(Vec3::new(10_000.0, 0.0, 0.0)));
        graph.add_component(quad, ComponentKind::Custom(Box::new(TestQuad::new(50.0))));
        graph.add_owned_layer_child(layer, quad);

        let mut device = NullDevice::new(800, 600);
        graph.draw_layer(layer, &mut device).unwrap();

        assert!(!device
            .calls
            .iter()
            .any(|call| matches!(call, DeviceCall::Draw(..))));
    }

    #[test]
    fn test_cull_disabled_actor_always_draws() {
        let mut graph = SceneGraph::new();
        let (layer, _, _) = layer_with_camera(&mut graph);
        let quad = graph.spawn(Actor::new().with_position(Vec3::new(10_000.0, 0.0, 0.0)));
        graph.add_component(quad, ComponentKind::Custom(Box::new(TestQuad::new(50.0))));
        graph.add_owned_layer_child(layer, quad);
        graph.set_cull_disabled(quad, true);

        let mut device = NullDevice::new(800, 600);
        graph.draw_layer(layer, &mut device).unwrap();

        assert!(device
            .calls
            .iter()
            .any(|call| matches!(call, DeviceCall::Draw(..))));
    }

    #[test]
    fn test_hidden_actor_is_not_drawn() {
        let mut graph = SceneGraph::new();
        let (layer, _, _) = layer_with_camera(&mut graph);
        let quad = graph.spawn(Actor::new());
        graph.add_component(quad, ComponentKind::Custom(Box::new(TestQuad::new(50.0))));
        graph.add_owned_layer_child(layer, quad);
        graph.set_hidden(quad, true);

        let mut device = NullDevice::new(800, 600);
        graph.draw_layer(layer, &mut device).unwrap();

        assert!(!device
            .calls
            .iter()
            .any(|call| matches!(call, DeviceCall::Draw(..))));
    }

    #[test]
    fn test_pick_layer_actor() {
        let mut graph = SceneGraph::new();
        let (layer, _, _) = layer_with_camera(&mut graph);
        let quad = graph.spawn(Actor::new().with_pickable(true));
        graph.add_component(quad, ComponentKind::Custom(Box::new(TestQuad::new(50.0))));
        graph.add_owned_layer_child(layer, quad);

        let mut device = NullDevice::new(800, 600);
        graph.draw_layer(layer, &mut device).unwrap();

        let hit = graph.pick_layer_actor(layer, Vec2::new(0.5, 0.5), false);
        assert_eq!(hit.map(|(actor, _)| actor), Some(quad));

        let miss = graph.pick_layer_actor(layer, Vec2::new(0.9, 0.5), false);
        assert!(miss.is_none());
    }

    #[test]
    fn test_pick_skips_render_target_cameras() {
        let mut graph = SceneGraph::new();
        let layer = graph.create_layer();

        let camera_actor = graph.spawn(Actor::new());
        let mut camera = Camera::orthographic(Vec2::new(800.0, 600.0), ScaleMode::ShowAll);
        camera.set_render_target(Some(RenderTargetId(7)));
        graph.add_component(camera_actor, ComponentKind::Camera(camera));
        graph.add_owned_layer_child(layer, camera_actor);

        let quad = graph.spawn(Actor::new().with_pickable(true));
        graph.add_component(quad, ComponentKind::Custom(Box::new(TestQuad::new(50.0))));
        graph.add_owned_layer_child(layer, quad);

        let mut device = NullDevice::new(800, 600);
        graph.draw_layer(layer, &mut device).unwrap();

        assert!(graph.pick_layer_actor(layer, Vec2::new(0.5, 0.5), false).is_none());
        assert!(graph.pick_layer_actor(layer, Vec2::new(0.5, 0.5), true).is_some());
    }

    #[test]
    fn test_enter_propagates_to_new_children() {
        let mut graph = SceneGraph::new();
        let layer = graph.create_layer();
        graph.enter_layer(layer);

        let actor = graph.spawn(Actor::new());
        graph.add_owned_layer_child(layer, actor);
        assert!(graph.actor(actor).is_entered());

        graph.leave_layer(layer);
        assert!(!graph.actor(actor).is_entered());
    }
}
