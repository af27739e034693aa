//! # Scene Engine
//!
//! A retained-mode scene graph with cameras, visibility culling, actor
//! picking, and property animation.
//!
//! ## Features
//!
//! - **Scene Graph**: Arena-backed actor trees with lazy cached transforms
//! - **Layers and Scenes**: Ordered layers composed into switchable scenes
//! - **Cameras**: Orthographic and perspective projection with content
//!   scaling and visibility culling
//! - **Picking**: Front-to-back actor hit testing from normalized window
//!   coordinates
//! - **Pointer Routing**: Mouse and touch input translated to per-actor
//!   enter/leave/press/release/click/drag events
//! - **Animation**: Composable animator trees (sequence, parallel, repeat,
//!   ease) driving actor properties
//!
//! ## Quick Start
//!
//! ```rust
//! use scene_engine::prelude::*;
//!
//! let mut graph = SceneGraph::new();
//! let layer = graph.create_layer();
//!
//! let actor = graph.spawn(Actor::new().with_position(Vec3::new(10.0, 0.0, 0.0)));
//! graph.add_owned_layer_child(layer, actor);
//!
//! let eye = graph.spawn(Actor::new());
//! graph.add_owned_layer_child(layer, eye);
//! let camera = Camera::orthographic(Vec2::new(800.0, 600.0), ScaleMode::ShowAll);
//! graph.add_component(eye, ComponentKind::Camera(camera));
//!
//! assert_eq!(graph.world_position(actor).x, 10.0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod animation;
pub mod events;
pub mod foundation;
pub mod render;
pub mod scene;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        animation::{Animators, EasingFunc, EasingMode},
        events::{Event, EventDispatcher, EventPoster, MouseEvent, TouchEvent, UiEvent, UiEventKind},
        foundation::math::{Aabb, Mat4, Quat, Rect, Vec2, Vec3},
        render::{ClearFlags, Color, GraphicsDevice},
        scene::{
            Actor, ActorId, Camera, Component, ComponentKind, Layer, LayerId, Light, LightKind,
            ScaleMode, Scene, SceneConfig, SceneGraph, SceneManager,
        },
    };
}
