//! Scene graph: actors, components, cameras, lights, layers, and scenes
//!
//! All nodes live in the arenas of [`SceneGraph`] and refer to each other
//! by generational ids. [`Scene`] and [`SceneManager`] sit on top, routing
//! draw passes and pointer input through the graph.

pub mod actor;
pub mod camera;
pub mod component;
pub mod graph;
pub mod layer;
pub mod light;
pub mod scene_manager;

pub use actor::{Actor, Order, Parent};
pub use camera::{Camera, ProjectionMode, ScaleMode};
pub use component::{Component, ComponentKind};
pub use graph::{ActorId, ComponentId, LayerId, SceneGraph};
pub use layer::Layer;
pub use light::{Light, LightKind};
pub use scene_manager::{Scene, SceneConfig, SceneManager};

#[cfg(test)]
pub(crate) mod test_support {
    use crate::foundation::math::{Aabb, Mat4, Vec2, Vec3};
    use crate::render::{BufferId, GraphicsDevice, GraphicsError, PrimitiveMode};
    use crate::scene::component::Component;

    /// Axis-aligned square centered on its actor's origin; draws a tagged
    /// indexed quad so tests can assert draw ordering
    pub struct TestQuad {
        half_extent: f32,
        tag: u64,
    }

    impl TestQuad {
        pub fn new(half_extent: f32) -> Self {
            Self::tagged(half_extent, 0)
        }

        pub fn tagged(half_extent: f32, tag: u64) -> Self {
            Self { half_extent, tag }
        }
    }

    impl Component for TestQuad {
        fn draw(
            &mut self,
            _transform: &Mat4,
            _opacity: f32,
            _view_projection: &Mat4,
            _wireframe: bool,
            device: &mut dyn GraphicsDevice,
        ) -> Result<(), GraphicsError> {
            device.draw(
                BufferId(self.tag),
                6,
                2,
                BufferId(self.tag),
                PrimitiveMode::TriangleList,
                0,
            )
        }

        fn bounding_box(&self) -> Aabb {
            Aabb::from_center_extents(
                Vec3::zeros(),
                Vec3::new(self.half_extent, self.half_extent, 0.0),
            )
        }

        fn point_on(&self, local_position: Vec2) -> bool {
            local_position.x.abs() <= self.half_extent && local_position.y.abs() <= self.half_extent
        }

        fn shape_overlaps(&self, local_edges: &[Vec2]) -> bool {
            local_edges.iter().any(|edge| self.point_on(*edge))
        }
    }
}
