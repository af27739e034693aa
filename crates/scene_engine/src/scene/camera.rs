//! Cameras
//!
//! A camera is a component that projects the scene of its layer. It owns a
//! projection (custom, orthographic, or perspective), a normalized viewport
//! into its render target, content scaling rules, clear state, and the
//! visibility test used during actor visits.
//!
//! View-projection matrices are cached and refreshed by the scene graph
//! (the view part is the owning actor's inverse world transform, identity
//! when the camera is not attached to an actor).

use crate::foundation::math::{self, Aabb, Frustum, Mat4, Rect, Vec2, Vec3, Vec4};
use crate::render::{ClearFlags, Color, RenderTargetId};

/// How the camera builds its projection matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionMode {
    /// Projection supplied by the caller, never recomputed
    Custom,
    /// Orthographic projection sized to the content size
    Orthographic,
    /// Perspective projection from fov/aspect/near/far
    Perspective,
}

/// How the target content size maps onto the render viewport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleMode {
    /// Keep scale 1; the content shows at native size
    NoScale,
    /// Stretch: content size equals the target content size exactly
    ExactFit,
    /// Uniform scale that fills the viewport, cropping one axis
    NoBorder,
    /// Uniform scale that fits the viewport, letterboxing one axis
    ShowAll,
}

/// Default vertical field of view, a sixth of a full turn
pub const DEFAULT_FOV: f32 = std::f32::consts::TAU / 6.0;

/// A camera component
#[derive(Debug, Clone)]
pub struct Camera {
    projection_mode: ProjectionMode,
    fov: f32,
    near_plane: f32,
    far_plane: f32,

    projection: Mat4,

    viewport: Rect,
    render_viewport: Rect,
    target_content_size: Vec2,
    render_target_size: [u32; 2],

    scale_mode: ScaleMode,
    content_size: Vec2,
    content_scale: Vec2,
    content_position: Vec2,

    depth_test: bool,
    wireframe: bool,

    view_projection: Mat4,
    render_view_projection: Mat4,
    inverse_view_projection: Mat4,

    // Clip-space correction supplied by the device (identity by default)
    render_projection_adjustment: Mat4,

    render_target: Option<RenderTargetId>,
    stencil_reference_value: u32,

    clear_flags: ClearFlags,
    clear_color: Color,
    clear_depth: f32,
    clear_stencil: u32,
}

impl Camera {
    fn base(projection_mode: ProjectionMode) -> Self {
        Self {
            projection_mode,
            fov: DEFAULT_FOV,
            near_plane: 1.0,
            far_plane: 100.0,
            projection: Mat4::identity(),
            viewport: Rect::new(0.0, 0.0, 1.0, 1.0),
            render_viewport: Rect::default(),
            target_content_size: Vec2::zeros(),
            render_target_size: [0, 0],
            scale_mode: ScaleMode::NoScale,
            content_size: Vec2::zeros(),
            content_scale: Vec2::new(1.0, 1.0),
            content_position: Vec2::zeros(),
            depth_test: false,
            wireframe: false,
            view_projection: Mat4::identity(),
            render_view_projection: Mat4::identity(),
            inverse_view_projection: Mat4::identity(),
            render_projection_adjustment: Mat4::identity(),
            render_target: None,
            stencil_reference_value: 0,
            clear_flags: ClearFlags::empty(),
            clear_color: Color::default(),
            clear_depth: 1.0,
            clear_stencil: 0,
        }
    }

    /// Create a camera with a caller-supplied projection matrix
    pub fn with_projection(projection: Mat4) -> Self {
        let mut camera = Self::base(ProjectionMode::Custom);
        camera.projection = projection;
        camera
    }

    /// Create an orthographic camera targeting a content size
    pub fn orthographic(target_content_size: Vec2, scale_mode: ScaleMode) -> Self {
        let mut camera = Self::base(ProjectionMode::Orthographic);
        camera.target_content_size = target_content_size;
        camera.scale_mode = scale_mode;
        camera
    }

    /// Create a perspective camera
    pub fn perspective(fov: f32, near_plane: f32, far_plane: f32) -> Self {
        let mut camera = Self::base(ProjectionMode::Perspective);
        camera.fov = fov;
        camera.near_plane = near_plane;
        camera.far_plane = far_plane;
        camera
    }

    /// The active projection mode
    pub fn projection_mode(&self) -> ProjectionMode {
        self.projection_mode
    }

    /// Vertical field of view in radians (perspective mode)
    pub fn fov(&self) -> f32 {
        self.fov
    }

    /// Set the vertical field of view; call
    /// [`Camera::recalculate_projection`] afterwards
    pub fn set_fov(&mut self, fov: f32) {
        self.fov = fov;
    }

    /// Near clip plane distance
    pub fn near_plane(&self) -> f32 {
        self.near_plane
    }

    /// Far clip plane distance
    pub fn far_plane(&self) -> f32 {
        self.far_plane
    }

    /// The projection matrix
    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    /// Normalized viewport rectangle within the render target
    pub fn viewport(&self) -> Rect {
        self.viewport
    }

    /// Set the normalized viewport; call
    /// [`Camera::recalculate_projection`] afterwards
    pub fn set_viewport(&mut self, viewport: Rect) {
        self.viewport = viewport;
    }

    /// Viewport in render-target pixels, derived by the last projection
    /// recalculation
    pub fn render_viewport(&self) -> Rect {
        self.render_viewport
    }

    /// Render-target pixel size the projection was last calculated for
    pub(crate) fn calculated_target_size(&self) -> [u32; 2] {
        self.render_target_size
    }

    /// Content scale mode
    pub fn scale_mode(&self) -> ScaleMode {
        self.scale_mode
    }

    /// Set the scale mode; call [`Camera::recalculate_projection`]
    /// afterwards
    pub fn set_scale_mode(&mut self, scale_mode: ScaleMode) {
        self.scale_mode = scale_mode;
    }

    /// The content size the camera is asked to show
    pub fn target_content_size(&self) -> Vec2 {
        self.target_content_size
    }

    /// Set the target content size; call
    /// [`Camera::recalculate_projection`] afterwards
    pub fn set_target_content_size(&mut self, target_content_size: Vec2) {
        self.target_content_size = target_content_size;
    }

    /// Effective content size after scale-mode resolution
    pub fn content_size(&self) -> Vec2 {
        self.content_size
    }

    /// Effective content scale after scale-mode resolution
    pub fn content_scale(&self) -> Vec2 {
        self.content_scale
    }

    /// Offset centering the target content inside the content size
    pub fn content_position(&self) -> Vec2 {
        self.content_position
    }

    /// Render target this camera draws into (`None` = backbuffer)
    pub fn render_target(&self) -> Option<RenderTargetId> {
        self.render_target
    }

    /// Set the render target; call [`Camera::recalculate_projection`]
    /// afterwards with the new target's size
    pub fn set_render_target(&mut self, render_target: Option<RenderTargetId>) {
        self.render_target = render_target;
    }

    /// Whether this camera's pass uses depth testing
    pub fn depth_test(&self) -> bool {
        self.depth_test
    }

    /// Enable or disable depth testing
    pub fn set_depth_test(&mut self, depth_test: bool) {
        self.depth_test = depth_test;
    }

    /// Stencil reference value applied with the depth-stencil state
    pub fn stencil_reference_value(&self) -> u32 {
        self.stencil_reference_value
    }

    /// Set the stencil reference value
    pub fn set_stencil_reference_value(&mut self, value: u32) {
        self.stencil_reference_value = value;
    }

    /// Whether this camera draws in wireframe
    pub fn wireframe(&self) -> bool {
        self.wireframe
    }

    /// Enable or disable wireframe drawing
    pub fn set_wireframe(&mut self, wireframe: bool) {
        self.wireframe = wireframe;
    }

    /// Which buffers this camera clears at the start of a frame
    pub fn clear_flags(&self) -> ClearFlags {
        self.clear_flags
    }

    /// Set which buffers to clear
    pub fn set_clear_flags(&mut self, flags: ClearFlags) {
        self.clear_flags = flags;
    }

    /// Clear color
    pub fn clear_color(&self) -> Color {
        self.clear_color
    }

    /// Set the clear color
    pub fn set_clear_color(&mut self, color: Color) {
        self.clear_color = color;
    }

    /// Clear depth value
    pub fn clear_depth(&self) -> f32 {
        self.clear_depth
    }

    /// Set the clear depth value
    pub fn set_clear_depth(&mut self, depth: f32) {
        self.clear_depth = depth;
    }

    /// Clear stencil value
    pub fn clear_stencil(&self) -> u32 {
        self.clear_stencil
    }

    /// Set the clear stencil value
    pub fn set_clear_stencil(&mut self, stencil: u32) {
        self.clear_stencil = stencil;
    }

    /// Set the device's clip-space correction matrix applied on top of the
    /// view-projection for rendering
    pub fn set_render_projection_adjustment(&mut self, adjustment: Mat4) {
        self.render_projection_adjustment = adjustment;
    }

    /// Combined view-projection, current as of the last refresh
    pub fn view_projection(&self) -> Mat4 {
        self.view_projection
    }

    /// View-projection with the device clip-space correction applied
    pub fn render_view_projection(&self) -> Mat4 {
        self.render_view_projection
    }

    /// Inverse of the view-projection, current as of the last refresh
    pub fn inverse_view_projection(&self) -> Mat4 {
        self.inverse_view_projection
    }

    /// Recompute cached matrices from the owning actor's inverse world
    /// transform (called by the scene graph when dirty)
    pub(crate) fn update_matrices(&mut self, view: Mat4) {
        self.view_projection = self.projection * view;
        self.render_view_projection = self.render_projection_adjustment * self.view_projection;
        self.inverse_view_projection = self
            .view_projection
            .try_inverse()
            .unwrap_or_else(Mat4::identity);
    }

    /// Recompute the render viewport, content scaling, and projection
    /// matrix
    ///
    /// Must be invoked whenever the viewport, target content size, scale
    /// mode, or render target changes. `render_target_size` is the pixel
    /// size of the camera's render target (or the backbuffer), as reported
    /// by the graphics device.
    pub fn recalculate_projection(&mut self, render_target_size: [u32; 2]) {
        self.render_target_size = render_target_size;
        let target_size = Vec2::new(render_target_size[0] as f32, render_target_size[1] as f32);

        self.render_viewport = Rect::new(
            target_size.x * self.viewport.position.x,
            target_size.y * self.viewport.position.y,
            target_size.x * self.viewport.size.x,
            target_size.y * self.viewport.size.y,
        );

        if self.render_viewport.size.x <= 0.0 || self.render_viewport.size.y <= 0.0 {
            log::warn!(
                "camera render viewport is degenerate: {:?}",
                self.render_viewport
            );
        }

        if self.target_content_size.x > 0.0 && self.target_content_size.y > 0.0 {
            self.content_scale = Vec2::new(
                self.render_viewport.size.x / self.target_content_size.x,
                self.render_viewport.size.y / self.target_content_size.y,
            );

            match self.scale_mode {
                ScaleMode::NoScale => {}
                ScaleMode::ExactFit => {
                    self.content_scale = Vec2::new(1.0, 1.0);
                }
                ScaleMode::NoBorder => {
                    let uniform = self.content_scale.x.max(self.content_scale.y);
                    self.content_scale = Vec2::new(uniform, uniform);
                }
                ScaleMode::ShowAll => {
                    let uniform = self.content_scale.x.min(self.content_scale.y);
                    self.content_scale = Vec2::new(uniform, uniform);
                }
            }

            self.content_size = Vec2::new(
                self.render_viewport.size.x / self.content_scale.x,
                self.render_viewport.size.y / self.content_scale.y,
            );
            self.content_position = Vec2::new(
                (self.content_size.x - self.target_content_size.x) / 2.0,
                (self.content_size.y - self.target_content_size.y) / 2.0,
            );
        } else {
            self.content_scale = Vec2::new(1.0, 1.0);
            self.content_size = self.render_viewport.size;
            self.content_position = Vec2::zeros();
        }

        match self.projection_mode {
            ProjectionMode::Custom => {}
            ProjectionMode::Orthographic => {
                let half = self.content_size / 2.0;
                self.projection =
                    Mat4::new_orthographic(-half.x, half.x, -half.y, half.y, -1.0, 1.0);
            }
            ProjectionMode::Perspective => {
                let aspect = self.content_size.x / self.content_size.y;
                self.projection =
                    Mat4::new_perspective(aspect, self.fov, self.near_plane, self.far_plane);
            }
        }
    }

    /// Test whether a bounding box, positioned by `box_transform`, is
    /// visible to this camera
    ///
    /// The orthographic path projects the box center into clip space and
    /// inflates the unit clip rectangle by the box's transformed 2D
    /// half-extents: a cheap approximation, not an exact oriented-box
    /// test. Every other projection mode performs an exact 6-plane
    /// frustum test against the box.
    pub fn check_visibility(&self, box_transform: &Mat4, bounding_box: &Aabb) -> bool {
        if self.projection_mode == ProjectionMode::Orthographic {
            let diff = bounding_box.max - bounding_box.min;

            // Box center in local space, flattened onto the XY plane
            let center = Vec3::new(
                bounding_box.min.x + diff.x / 2.0,
                bounding_box.min.y + diff.y / 2.0,
                0.0,
            );
            let world_center = math::transform_point(box_transform, center);

            let clip = self.view_projection
                * Vec4::new(world_center.x, world_center.y, world_center.z, 1.0);
            debug_assert!(clip.w != 0.0);

            // Normalized position of the center point in [0, 1]
            let normalized = Vec2::new(
                (clip.x / clip.w + 1.0) * 0.5,
                (clip.y / clip.w + 1.0) * 0.5,
            );

            let half = Vec2::new(diff.x / 2.0, diff.y / 2.0);

            // Half size in world space through the transform's rotation and
            // scale block
            let m = box_transform;
            let mut half_world = Vec2::new(
                (half.x * m[(0, 0)] + half.y * m[(0, 1)])
                    .abs()
                    .max((half.x * m[(0, 0)] - half.y * m[(0, 1)]).abs()),
                (half.x * m[(1, 0)] + half.y * m[(1, 1)])
                    .abs()
                    .max((half.x * m[(1, 0)] - half.y * m[(1, 1)]).abs()),
            );

            // Scale half size by the projection to get clip-space extents
            let vp = &self.view_projection;
            half_world.x *= (vp[(0, 0)].abs() + vp[(0, 1)].abs()) / 2.0;
            half_world.y *= (vp[(1, 0)].abs() + vp[(1, 1)].abs()) / 2.0;

            let visible_rect = Rect::new(
                -half_world.x,
                -half_world.y,
                1.0 + half_world.x * 2.0,
                1.0 + half_world.y * 2.0,
            );

            visible_rect.contains_point(normalized)
        } else {
            let model_view_projection = self.view_projection * box_transform;
            let frustum = Frustum::from_matrix(&model_view_projection);
            frustum.intersects_aabb(bounding_box)
        }
    }

    /// Map a window-normalized position (origin top-left, Y down, [0, 1])
    /// into world space
    pub fn convert_normalized_to_world(&self, normalized_position: Vec2) -> Vec3 {
        // Window normalized to viewport clip position
        let clip = Vec3::new(
            ((normalized_position.x - self.viewport.position.x) / self.viewport.size.x - 0.5)
                * 2.0,
            (((1.0 - normalized_position.y) - self.viewport.position.y) / self.viewport.size.y
                - 0.5)
                * 2.0,
            0.0,
        );

        math::transform_point(&self.inverse_view_projection, clip)
    }

    /// Map a world-space position into window-normalized coordinates
    /// (origin top-left, Y down, [0, 1])
    pub fn convert_world_to_normalized(&self, world_position: Vec3) -> Vec2 {
        let clip = math::transform_point(&self.view_projection, world_position);

        // Viewport clip position to window normalized
        Vec2::new(
            (clip.x / 2.0 + 0.5) * self.viewport.size.x + self.viewport.position.x,
            1.0 - ((clip.y / 2.0 + 0.5) * self.viewport.size.y + self.viewport.position.y),
        )
    }
}
