//! Scenes and the scene manager
//!
//! A [`Scene`] is an ordered set of layers plus the pointer-input routing
//! that turns raw mouse and touch events into actor-targeted UI events.
//! [`SceneManager`] holds at most one active scene and swaps them whole.
//!
//! Scenes do not own the graph; every operation takes the [`SceneGraph`]
//! (and, where events are produced, the [`EventDispatcher`]) explicitly.

use crate::events::{
    Event, EventDispatcher, MouseEvent, MouseEventKind, TouchEvent, TouchEventKind, UiEvent,
    UiEventKind,
};
use crate::foundation::math::{Vec2, Vec3};
use crate::render::{GraphicsDevice, GraphicsError, RenderTargetId};
use crate::scene::graph::{ActorId, LayerId, SceneGraph};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Pointer id used for the mouse; touches use their own ids
const MOUSE_POINTER_ID: u64 = 0;

/// Scene behavior configuration
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SceneConfig {
    /// Whether picking also considers cameras drawing into render targets
    #[serde(default)]
    pub pick_render_targets: bool,
}

/// An ordered set of layers with pointer-input routing
pub struct Scene {
    layers: Vec<LayerId>,
    owned_layers: Vec<LayerId>,
    entered: bool,
    config: SceneConfig,
    // Per-pointer press state: the actor pressed on and the hit position in
    // its local space
    pointer_down_on_actors: HashMap<u64, (ActorId, Vec3)>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(SceneConfig::default())
    }
}

impl Scene {
    /// Create an empty scene
    pub fn new(config: SceneConfig) -> Self {
        Self {
            layers: Vec::new(),
            owned_layers: Vec::new(),
            entered: false,
            config,
            pointer_down_on_actors: HashMap::new(),
        }
    }

    /// The scene's configuration
    pub fn config(&self) -> SceneConfig {
        self.config
    }

    /// Layers in draw order as of the last draw
    pub fn layers(&self) -> &[LayerId] {
        &self.layers
    }

    /// Whether this scene is the active one
    pub fn is_entered(&self) -> bool {
        self.entered
    }

    /// Add a layer without taking ownership; no-op if already added
    pub fn add_layer(&mut self, graph: &mut SceneGraph, layer: LayerId) {
        if self.has_layer(layer) {
            return;
        }
        self.layers.push(layer);
        if self.entered {
            graph.enter_layer(layer);
        }
    }

    /// Add a layer and destroy it with the scene
    pub fn add_owned_layer(&mut self, graph: &mut SceneGraph, layer: LayerId) {
        self.add_layer(graph, layer);
        if !self.owned_layers.contains(&layer) {
            self.owned_layers.push(layer);
        }
    }

    /// Remove a layer; an owned layer is destroyed
    ///
    /// Returns `false` when the layer is not part of this scene.
    pub fn remove_layer(&mut self, graph: &mut SceneGraph, layer: LayerId) -> bool {
        let Some(position) = self.layers.iter().position(|&l| l == layer) else {
            return false;
        };
        if self.entered {
            graph.leave_layer(layer);
        }
        self.layers.remove(position);

        if let Some(owned) = self.owned_layers.iter().position(|&l| l == layer) {
            self.owned_layers.remove(owned);
            graph.destroy_layer(layer);
        }
        true
    }

    /// Remove every layer, destroying the owned ones
    pub fn remove_all_layers(&mut self, graph: &mut SceneGraph) {
        for layer in self.layers.clone() {
            self.remove_layer(graph, layer);
        }
    }

    /// Whether a layer is part of this scene
    pub fn has_layer(&self, layer: LayerId) -> bool {
        self.layers.contains(&layer)
    }

    /// Become the active scene
    pub fn enter(&mut self, graph: &mut SceneGraph) {
        log::debug!("entering scene");
        self.entered = true;
        for &layer in &self.layers {
            graph.enter_layer(layer);
        }
    }

    /// Stop being the active scene
    pub fn leave(&mut self, graph: &mut SceneGraph) {
        log::debug!("leaving scene");
        self.entered = false;
        for &layer in &self.layers {
            graph.leave_layer(layer);
        }
    }

    /// Recalculate every camera projection after a resolution change
    pub fn recalculate_projections(&self, graph: &mut SceneGraph, device: &dyn GraphicsDevice) {
        for &layer in &self.layers {
            graph.recalculate_layer_projection(layer, device);
        }
    }

    /// Draw every layer back-to-front and present
    ///
    /// Layers are stable-sorted by descending order first. Each render
    /// target is cleared at most once per frame, by the first camera that
    /// asks for it.
    pub fn draw(
        &mut self,
        graph: &mut SceneGraph,
        device: &mut dyn GraphicsDevice,
    ) -> Result<(), GraphicsError> {
        self.layers
            .sort_by(|&a, &b| graph.layer(b).order().cmp(&graph.layer(a).order()));

        let mut cleared_targets: HashSet<Option<RenderTargetId>> = HashSet::new();
        for &layer in &self.layers {
            for camera_id in graph.layer(layer).cameras().to_vec() {
                let camera = graph.camera(camera_id);
                if !camera.clear_flags().is_empty()
                    && cleared_targets.insert(camera.render_target())
                {
                    let (target, flags, color, depth, stencil) = (
                        camera.render_target(),
                        camera.clear_flags(),
                        camera.clear_color(),
                        camera.clear_depth(),
                        camera.clear_stencil(),
                    );
                    device.set_render_target(target)?;
                    device.clear_render_target(flags, color, depth, stencil)?;
                }
            }

            graph.draw_layer(layer, device)?;
        }

        device.present()
    }

    /// Pick the front-most actor under a window-normalized position,
    /// searching layers front-to-back
    pub fn pick_actor(&self, graph: &SceneGraph, position: Vec2) -> Option<(ActorId, Vec3)> {
        self.layers.iter().rev().find_map(|&layer| {
            graph.pick_layer_actor(layer, position, self.config.pick_render_targets)
        })
    }

    /// Pick every actor under a window-normalized position
    pub fn pick_actors(&self, graph: &SceneGraph, position: Vec2) -> Vec<(ActorId, Vec3)> {
        let mut result = Vec::new();
        for &layer in self.layers.iter().rev() {
            result.extend(graph.pick_layer_actors(
                layer,
                position,
                self.config.pick_render_targets,
            ));
        }
        result
    }

    /// Pick every actor overlapping a window-normalized polygon
    pub fn pick_actors_overlapping(&self, graph: &SceneGraph, edges: &[Vec2]) -> Vec<ActorId> {
        let mut result = Vec::new();
        for &layer in self.layers.iter().rev() {
            result.extend(graph.pick_layer_actors_overlapping(
                layer,
                edges,
                self.config.pick_render_targets,
            ));
        }
        result
    }

    /// Route a raw mouse event into actor-targeted UI events
    pub fn handle_mouse(
        &mut self,
        graph: &SceneGraph,
        dispatcher: &mut EventDispatcher,
        event: &MouseEvent,
    ) {
        match event.kind {
            MouseEventKind::Press => {
                let hit = self.pick_actor(graph, event.position);
                self.pointer_down(dispatcher, MOUSE_POINTER_ID, hit, event.position);
            }
            MouseEventKind::Release => {
                let hit = self.pick_actor(graph, event.position);
                self.pointer_up(dispatcher, MOUSE_POINTER_ID, hit, event.position);
            }
            MouseEventKind::Move => {
                self.pointer_move(graph, dispatcher, MOUSE_POINTER_ID, event.position, event.difference);
            }
        }
    }

    /// Route a raw touch event into actor-targeted UI events
    ///
    /// Touches from pads that are not the screen itself cannot be picked
    /// against and are ignored.
    pub fn handle_touch(
        &mut self,
        graph: &SceneGraph,
        dispatcher: &mut EventDispatcher,
        event: &TouchEvent,
    ) {
        if !event.screen_device {
            return;
        }
        match event.kind {
            TouchEventKind::Begin => {
                let hit = self.pick_actor(graph, event.position);
                self.pointer_down(dispatcher, event.touch_id, hit, event.position);
            }
            TouchEventKind::End | TouchEventKind::Cancel => {
                let hit = self.pick_actor(graph, event.position);
                self.pointer_up(dispatcher, event.touch_id, hit, event.position);
            }
            TouchEventKind::Move => {
                self.pointer_move(graph, dispatcher, event.touch_id, event.position, event.difference);
            }
        }
    }

    fn pointer_move(
        &mut self,
        graph: &SceneGraph,
        dispatcher: &mut EventDispatcher,
        pointer_id: u64,
        position: Vec2,
        difference: Vec2,
    ) {
        if let Some((previous, _)) = self.pick_actor(graph, position - difference) {
            Self::dispatch_ui(
                dispatcher,
                UiEventKind::ActorLeave,
                previous,
                pointer_id,
                position,
                Vec3::zeros(),
                Vec2::zeros(),
            );
        }
        if let Some((current, _)) = self.pick_actor(graph, position) {
            Self::dispatch_ui(
                dispatcher,
                UiEventKind::ActorEnter,
                current,
                pointer_id,
                position,
                Vec3::zeros(),
                Vec2::zeros(),
            );
        }

        if let Some(&(pressed, local_position)) = self.pointer_down_on_actors.get(&pointer_id) {
            Self::dispatch_ui(
                dispatcher,
                UiEventKind::ActorDrag,
                pressed,
                pointer_id,
                position,
                local_position,
                difference,
            );
        }
    }

    fn pointer_down(
        &mut self,
        dispatcher: &mut EventDispatcher,
        pointer_id: u64,
        hit: Option<(ActorId, Vec3)>,
        position: Vec2,
    ) {
        let Some((actor, local_position)) = hit else {
            return;
        };
        self.pointer_down_on_actors
            .insert(pointer_id, (actor, local_position));
        Self::dispatch_ui(
            dispatcher,
            UiEventKind::ActorPress,
            actor,
            pointer_id,
            position,
            local_position,
            Vec2::zeros(),
        );
    }

    fn pointer_up(
        &mut self,
        dispatcher: &mut EventDispatcher,
        pointer_id: u64,
        hit: Option<(ActorId, Vec3)>,
        position: Vec2,
    ) {
        if let Some(&(pressed, local_position)) = self.pointer_down_on_actors.get(&pointer_id) {
            Self::dispatch_ui(
                dispatcher,
                UiEventKind::ActorRelease,
                pressed,
                pointer_id,
                position,
                local_position,
                Vec2::zeros(),
            );

            if hit.map(|(actor, _)| actor) == Some(pressed) {
                Self::dispatch_ui(
                    dispatcher,
                    UiEventKind::ActorClick,
                    pressed,
                    pointer_id,
                    position,
                    Vec3::zeros(),
                    Vec2::zeros(),
                );
            }
        }

        // Down state always clears, hit or not
        self.pointer_down_on_actors.remove(&pointer_id);
    }

    #[allow(clippy::too_many_arguments)]
    fn dispatch_ui(
        dispatcher: &mut EventDispatcher,
        kind: UiEventKind,
        actor: ActorId,
        pointer_id: u64,
        position: Vec2,
        local_position: Vec3,
        difference: Vec2,
    ) {
        dispatcher.dispatch(&Event::Ui(UiEvent {
            kind,
            actor,
            pointer_id,
            position,
            local_position,
            difference,
        }));
    }
}

/// Owner of the single active scene
#[derive(Default)]
pub struct SceneManager {
    scene: Option<Scene>,
}

impl SceneManager {
    /// Create a manager with no active scene
    pub fn new() -> Self {
        Self::default()
    }

    /// The active scene, if any
    pub fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    /// The active scene, mutably
    pub fn scene_mut(&mut self) -> Option<&mut Scene> {
        self.scene.as_mut()
    }

    /// Make `scene` the active scene, entering it; the previous scene
    /// leaves and is handed back
    pub fn set_scene(&mut self, graph: &mut SceneGraph, mut scene: Scene) -> Option<Scene> {
        let mut previous = self.scene.take();
        if let Some(previous) = &mut previous {
            previous.leave(graph);
        }

        scene.enter(graph);
        self.scene = Some(scene);
        previous
    }

    /// Deactivate and hand back the active scene
    pub fn clear_scene(&mut self, graph: &mut SceneGraph) -> Option<Scene> {
        let mut previous = self.scene.take();
        if let Some(previous) = &mut previous {
            previous.leave(graph);
        }
        previous
    }

    /// Draw the active scene, if any
    pub fn draw(
        &mut self,
        graph: &mut SceneGraph,
        device: &mut dyn GraphicsDevice,
    ) -> Result<(), GraphicsError> {
        match &mut self.scene {
            Some(scene) => scene.draw(graph, device),
            None => Ok(()),
        }
    }

    /// Forward a mouse event to the active scene
    pub fn handle_mouse(
        &mut self,
        graph: &SceneGraph,
        dispatcher: &mut EventDispatcher,
        event: &MouseEvent,
    ) {
        if let Some(scene) = &mut self.scene {
            scene.handle_mouse(graph, dispatcher, event);
        }
    }

    /// Forward a touch event to the active scene
    pub fn handle_touch(
        &mut self,
        graph: &SceneGraph,
        dispatcher: &mut EventDispatcher,
        event: &TouchEvent,
    ) {
        if let Some(scene) = &mut self.scene {
            scene.handle_touch(graph, dispatcher, event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{ClearFlags, Color, DeviceCall, NullDevice};
    use crate::scene::actor::Actor;
    use crate::scene::camera::{Camera, ScaleMode};
    use crate::scene::component::ComponentKind;
    use crate::scene::test_support::TestQuad;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Fixture {
        graph: SceneGraph,
        scene: Scene,
        quad: ActorId,
    }

    // A scene with one layer, one 800x600 show-all camera and one pickable
    // 50-unit quad at the origin, already drawn once so matrices and world
    // orders are current.
    fn fixture() -> Fixture {
        let _ = env_logger::builder().is_test(true).try_init();

        let mut graph = SceneGraph::new();
        let layer = graph.create_layer();

        let camera_actor = graph.spawn(Actor::new());
        graph.add_component(
            camera_actor,
            ComponentKind::Camera(Camera::orthographic(
                Vec2::new(800.0, 600.0),
                ScaleMode::ShowAll,
            )),
        );
        graph.add_owned_layer_child(layer, camera_actor);

        let quad = graph.spawn(Actor::new().with_pickable(true));
        graph.add_component(quad, ComponentKind::Custom(Box::new(TestQuad::new(50.0))));
        graph.add_owned_layer_child(layer, quad);

        let mut scene = Scene::default();
        scene.add_owned_layer(&mut graph, layer);

        let mut device = NullDevice::new(800, 600);
        scene.draw(&mut graph, &mut device).unwrap();

        Fixture { graph, scene, quad }
    }

    fn recording_dispatcher() -> (EventDispatcher, Rc<RefCell<Vec<(UiEventKind, ActorId)>>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut dispatcher = EventDispatcher::new();
        {
            let log = Rc::clone(&log);
            dispatcher.add_handler(
                0,
                Box::new(move |event| {
                    if let Event::Ui(ui) = event {
                        log.borrow_mut().push((ui.kind, ui.actor));
                    }
                    false
                }),
            );
        }
        (dispatcher, log)
    }

    fn mouse(kind: MouseEventKind, position: Vec2) -> MouseEvent {
        MouseEvent {
            kind,
            position,
            difference: Vec2::zeros(),
        }
    }

    #[test]
    fn test_press_release_click_sequence() {
        let mut fixture = fixture();
        let (mut dispatcher, log) = recording_dispatcher();
        let center = Vec2::new(0.5, 0.5);

        fixture.scene.handle_mouse(
            &fixture.graph,
            &mut dispatcher,
            &mouse(MouseEventKind::Press, center),
        );
        fixture.scene.handle_mouse(
            &fixture.graph,
            &mut dispatcher,
            &mouse(MouseEventKind::Release, center),
        );

        assert_eq!(
            *log.borrow(),
            vec![
                (UiEventKind::ActorPress, fixture.quad),
                (UiEventKind::ActorRelease, fixture.quad),
                (UiEventKind::ActorClick, fixture.quad),
            ]
        );
        assert!(fixture.scene.pointer_down_on_actors.is_empty());
    }

    #[test]
    fn test_release_off_actor_is_no_click() {
        let mut fixture = fixture();
        let (mut dispatcher, log) = recording_dispatcher();

        fixture.scene.handle_mouse(
            &fixture.graph,
            &mut dispatcher,
            &mouse(MouseEventKind::Press, Vec2::new(0.5, 0.5)),
        );
        // Release far off the quad
        fixture.scene.handle_mouse(
            &fixture.graph,
            &mut dispatcher,
            &mouse(MouseEventKind::Release, Vec2::new(0.95, 0.5)),
        );

        assert_eq!(
            *log.borrow(),
            vec![
                (UiEventKind::ActorPress, fixture.quad),
                (UiEventKind::ActorRelease, fixture.quad),
            ]
        );
        assert!(fixture.scene.pointer_down_on_actors.is_empty());
    }

    #[test]
    fn test_drag_targets_pressed_actor() {
        let mut fixture = fixture();
        let (mut dispatcher, log) = recording_dispatcher();

        fixture.scene.handle_mouse(
            &fixture.graph,
            &mut dispatcher,
            &mouse(MouseEventKind::Press, Vec2::new(0.5, 0.5)),
        );
        fixture.scene.handle_mouse(
            &fixture.graph,
            &mut dispatcher,
            &MouseEvent {
                kind: MouseEventKind::Move,
                position: Vec2::new(0.95, 0.5),
                difference: Vec2::new(0.45, 0.0),
            },
        );

        let kinds: Vec<UiEventKind> = log.borrow().iter().map(|entry| entry.0).collect();
        assert!(kinds.contains(&UiEventKind::ActorDrag));
        // Drag keeps targeting the pressed actor even off of it
        assert!(log
            .borrow()
            .iter()
            .all(|&(kind, actor)| kind != UiEventKind::ActorDrag || actor == fixture.quad));
    }

    #[test]
    fn test_move_produces_enter_and_leave() {
        let mut fixture = fixture();
        let (mut dispatcher, log) = recording_dispatcher();

        // From off the quad onto it
        fixture.scene.handle_mouse(
            &fixture.graph,
            &mut dispatcher,
            &MouseEvent {
                kind: MouseEventKind::Move,
                position: Vec2::new(0.5, 0.5),
                difference: Vec2::new(0.45, 0.0),
            },
        );
        assert_eq!(*log.borrow(), vec![(UiEventKind::ActorEnter, fixture.quad)]);
        log.borrow_mut().clear();

        // And back off of it
        fixture.scene.handle_mouse(
            &fixture.graph,
            &mut dispatcher,
            &MouseEvent {
                kind: MouseEventKind::Move,
                position: Vec2::new(0.95, 0.5),
                difference: Vec2::new(0.45, 0.0),
            },
        );
        assert_eq!(*log.borrow(), vec![(UiEventKind::ActorLeave, fixture.quad)]);
    }

    #[test]
    fn test_touch_uses_its_own_pointer_id() {
        let mut fixture = fixture();
        let (mut dispatcher, log) = recording_dispatcher();

        fixture.scene.handle_touch(
            &fixture.graph,
            &mut dispatcher,
            &TouchEvent {
                kind: TouchEventKind::Begin,
                touch_id: 42,
                position: Vec2::new(0.5, 0.5),
                difference: Vec2::zeros(),
                screen_device: true,
            },
        );

        assert!(fixture.scene.pointer_down_on_actors.contains_key(&42));
        assert_eq!(*log.borrow(), vec![(UiEventKind::ActorPress, fixture.quad)]);
    }

    #[test]
    fn test_non_screen_touch_is_ignored() {
        let mut fixture = fixture();
        let (mut dispatcher, log) = recording_dispatcher();

        fixture.scene.handle_touch(
            &fixture.graph,
            &mut dispatcher,
            &TouchEvent {
                kind: TouchEventKind::Begin,
                touch_id: 1,
                position: Vec2::new(0.5, 0.5),
                difference: Vec2::zeros(),
                screen_device: false,
            },
        );

        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_render_target_cleared_once_per_frame() {
        let mut graph = SceneGraph::new();
        let layer = graph.create_layer();

        // Two cameras clearing the same (back buffer) target
        for _ in 0..2 {
            let actor = graph.spawn(Actor::new());
            let mut camera = Camera::orthographic(Vec2::new(800.0, 600.0), ScaleMode::ShowAll);
            camera.set_clear_flags(ClearFlags::COLOR);
            camera.set_clear_color(Color::BLACK);
            graph.add_component(actor, ComponentKind::Camera(camera));
            graph.add_owned_layer_child(layer, actor);
        }

        let mut scene = Scene::default();
        scene.add_owned_layer(&mut graph, layer);

        let mut device = NullDevice::new(800, 600);
        scene.draw(&mut graph, &mut device).unwrap();

        let clears = device
            .calls
            .iter()
            .filter(|call| matches!(call, DeviceCall::ClearRenderTarget(..)))
            .count();
        assert_eq!(clears, 1);
        assert_eq!(device.calls.last(), Some(&DeviceCall::Present));
    }

    #[test]
    fn test_layers_draw_in_descending_order() {
        let mut graph = SceneGraph::new();

        let make_layer = |graph: &mut SceneGraph, order, tag| {
            let layer = graph.create_layer();
            graph.set_layer_order(layer, order);
            let camera_actor = graph.spawn(Actor::new());
            graph.add_component(
                camera_actor,
                ComponentKind::Camera(Camera::orthographic(
                    Vec2::new(800.0, 600.0),
                    ScaleMode::ShowAll,
                )),
            );
            graph.add_owned_layer_child(layer, camera_actor);
            let quad = graph.spawn(Actor::new());
            graph.add_component(
                quad,
                ComponentKind::Custom(Box::new(TestQuad::tagged(50.0, tag))),
            );
            graph.add_owned_layer_child(layer, quad);
            layer
        };

        let front = make_layer(&mut graph, 1, 1);
        let back = make_layer(&mut graph, 10, 2);

        let mut scene = Scene::default();
        scene.add_owned_layer(&mut graph, front);
        scene.add_owned_layer(&mut graph, back);

        let mut device = NullDevice::new(800, 600);
        scene.draw(&mut graph, &mut device).unwrap();

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
    fn test_scene_swap_leaves_previous() {
        let mut graph = SceneGraph::new();
        let layer_a = graph.create_layer();
        let layer_b = graph.create_layer();

        let mut scene_a = Scene::default();
        scene_a.add_owned_layer(&mut graph, layer_a);
        let mut scene_b = Scene::default();
        scene_b.add_owned_layer(&mut graph, layer_b);

        let mut manager = SceneManager::new();
        assert!(manager.set_scene(&mut graph, scene_a).is_none());
        assert!(graph.layer(layer_a).is_entered());

        let previous = manager.set_scene(&mut graph, scene_b).unwrap();
        assert!(!previous.is_entered());
        assert!(!graph.layer(layer_a).is_entered());
        assert!(graph.layer(layer_b).is_entered());
    }
}
