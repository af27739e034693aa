//! Graphics device abstraction
//!
//! The scene graph issues draw work through the [`GraphicsDevice`] trait and
//! owns none of the underlying device state. Concrete backends (Vulkan, GL,
//! Metal, ...) live outside this crate; [`NullDevice`] is a headless
//! implementation used by tests.

use crate::foundation::math::Rect;
use bitflags::bitflags;
use thiserror::Error;

/// Errors surfaced by graphics device calls
#[derive(Debug, Error)]
pub enum GraphicsError {
    /// A resource handle did not refer to a live device resource
    #[error("invalid resource handle: {0}")]
    InvalidResource(u64),

    /// The backend rejected a state change or draw call
    #[error("graphics backend error: {0}")]
    Backend(String),
}

/// Handle to a device render target (not owned by this crate)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderTargetId(pub u64);

/// Handle to a device vertex or index buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub u64);

/// Handle to a device pipeline state object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineStateId(pub u64);

/// Handle to a device texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u64);

bitflags! {
    /// Which buffers a camera clears before its pass
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ClearFlags: u8 {
        /// Clear the color buffer
        const COLOR = 1 << 0;
        /// Clear the depth buffer
        const DEPTH = 1 << 1;
        /// Clear the stencil buffer
        const STENCIL = 1 << 2;
    }
}

/// RGBA color with components in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    /// Red component
    pub r: f32,
    /// Green component
    pub g: f32,
    /// Blue component
    pub b: f32,
    /// Alpha component
    pub a: f32,
}

impl Color {
    /// Opaque black
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);
    /// Fully transparent black
    pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    /// Create a color from components
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::TRANSPARENT
    }
}

/// Depth comparison function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareFunction {
    /// Never passes
    Never,
    /// Passes when incoming depth is less
    Less,
    /// Passes when depths are equal
    Equal,
    /// Passes when incoming depth is less or equal
    LessEqual,
    /// Passes when incoming depth is greater
    Greater,
    /// Passes when depths differ
    NotEqual,
    /// Passes when incoming depth is greater or equal
    GreaterEqual,
    /// Always passes
    Always,
}

/// Depth/stencil pipeline state applied before a camera pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthStencilState {
    /// Whether depth testing is enabled
    pub depth_test: bool,
    /// Whether depth writes are enabled
    pub depth_write: bool,
    /// Depth comparison function
    pub compare: CompareFunction,
}

impl DepthStencilState {
    /// The state a depth-testing camera applies: test and write with
    /// less-equal comparison
    pub const LESS_EQUAL: Self = Self {
        depth_test: true,
        depth_write: true,
        compare: CompareFunction::LessEqual,
    };
}

/// Primitive topology for draw calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveMode {
    /// Isolated points
    PointList,
    /// Isolated line segments
    LineList,
    /// Connected line strip
    LineStrip,
    /// Isolated triangles
    TriangleList,
    /// Connected triangle strip
    TriangleStrip,
}

/// The rendering collaborator consumed by layer and scene draw passes
///
/// Mutating calls return `Result` so backend failures propagate out of the
/// draw path synchronously.
pub trait GraphicsDevice {
    /// Pixel size of a render target, or of the backbuffer when `None`
    fn render_target_size(&self, target: Option<RenderTargetId>) -> [u32; 2];

    /// Bind a render target (`None` = backbuffer)
    fn set_render_target(&mut self, target: Option<RenderTargetId>) -> Result<(), GraphicsError>;

    /// Set the viewport in render-target pixels
    fn set_viewport(&mut self, viewport: Rect) -> Result<(), GraphicsError>;

    /// Apply depth/stencil state (`None` = disabled) and stencil reference
    fn set_depth_stencil_state(
        &mut self,
        state: Option<DepthStencilState>,
        stencil_reference: u32,
    ) -> Result<(), GraphicsError>;

    /// Clear the currently bound render target
    fn clear_render_target(
        &mut self,
        flags: ClearFlags,
        color: Color,
        depth: f32,
        stencil: u32,
    ) -> Result<(), GraphicsError>;

    /// Bind a pipeline state object
    fn set_pipeline_state(&mut self, pipeline: PipelineStateId) -> Result<(), GraphicsError>;

    /// Upload fragment and vertex shader constants
    fn set_shader_constants(
        &mut self,
        fragment: &[f32],
        vertex: &[f32],
    ) -> Result<(), GraphicsError>;

    /// Bind textures for the next draw call
    fn set_textures(&mut self, textures: &[TextureId]) -> Result<(), GraphicsError>;

    /// Issue an indexed draw call
    fn draw(
        &mut self,
        index_buffer: BufferId,
        index_count: u32,
        index_size: u32,
        vertex_buffer: BufferId,
        primitive_mode: PrimitiveMode,
        start_index: u32,
    ) -> Result<(), GraphicsError>;

    /// Present the backbuffer
    fn present(&mut self) -> Result<(), GraphicsError>;
}

/// Recorded device call, for assertions in tests
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCall {
    /// `set_render_target`
    SetRenderTarget(Option<RenderTargetId>),
    /// `set_viewport`
    SetViewport(Rect),
    /// `set_depth_stencil_state`
    SetDepthStencilState(Option<DepthStencilState>, u32),
    /// `clear_render_target`
    ClearRenderTarget(ClearFlags, Color),
    /// `set_pipeline_state`
    SetPipelineState(PipelineStateId),
    /// `set_shader_constants`
    SetShaderConstants,
    /// `set_textures`
    SetTextures(Vec<TextureId>),
    /// `draw`
    Draw(BufferId, u32),
    /// `present`
    Present,
}

/// Headless device that records every call and reports a fixed surface size
#[derive(Debug)]
pub struct NullDevice {
    surface_size: [u32; 2],
    /// Every call issued since construction or the last [`NullDevice::clear_calls`]
    pub calls: Vec<DeviceCall>,
}

impl NullDevice {
    /// Create a null device with the given backbuffer size
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            surface_size: [width, height],
            calls: Vec::new(),
        }
    }

    /// Forget all recorded calls
    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }
}

impl GraphicsDevice for NullDevice {
    fn render_target_size(&self, _target: Option<RenderTargetId>) -> [u32; 2] {
        self.surface_size
    }

    fn set_render_target(&mut self, target: Option<RenderTargetId>) -> Result<(), GraphicsError> {
        self.calls.push(DeviceCall::SetRenderTarget(target));
        Ok(())
    }

    fn set_viewport(&mut self, viewport: Rect) -> Result<(), GraphicsError> {
        self.calls.push(DeviceCall::SetViewport(viewport));
        Ok(())
    }

    fn set_depth_stencil_state(
        &mut self,
        state: Option<DepthStencilState>,
        stencil_reference: u32,
    ) -> Result<(), GraphicsError> {
        self.calls
            .push(DeviceCall::SetDepthStencilState(state, stencil_reference));
        Ok(())
    }

    fn clear_render_target(
        &mut self,
        flags: ClearFlags,
        color: Color,
        _depth: f32,
        _stencil: u32,
    ) -> Result<(), GraphicsError> {
        self.calls.push(DeviceCall::ClearRenderTarget(flags, color));
        Ok(())
    }

    fn set_pipeline_state(&mut self, pipeline: PipelineStateId) -> Result<(), GraphicsError> {
        self.calls.push(DeviceCall::SetPipelineState(pipeline));
        Ok(())
    }

    fn set_shader_constants(
        &mut self,
        _fragment: &[f32],
        _vertex: &[f32],
    ) -> Result<(), GraphicsError> {
        self.calls.push(DeviceCall::SetShaderConstants);
        Ok(())
    }

    fn set_textures(&mut self, textures: &[TextureId]) -> Result<(), GraphicsError> {
        self.calls.push(DeviceCall::SetTextures(textures.to_vec()));
        Ok(())
    }

    fn draw(
        &mut self,
        index_buffer: BufferId,
        index_count: u32,
        _index_size: u32,
        _vertex_buffer: BufferId,
        _primitive_mode: PrimitiveMode,
        _start_index: u32,
    ) -> Result<(), GraphicsError> {
        self.calls.push(DeviceCall::Draw(index_buffer, index_count));
        Ok(())
    }

    fn present(&mut self) -> Result<(), GraphicsError> {
        self.calls.push(DeviceCall::Present);
        Ok(())
    }
}
