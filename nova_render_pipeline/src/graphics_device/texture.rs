/// Texture formats, usage flags, resource states, and the Texture trait

use bitflags::bitflags;

/// Pixel format of a texture or render target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum ResourceFormat {
    R32G32B32A32_FLOAT,
    R8G8B8A8_UNORM,
    B8G8R8A8_UNORM,
    D24_UNORM_S8_UINT,
    D32_FLOAT,
}

/// Usage role a GPU resource currently occupies.
///
/// Resource-state transitions declare a role change to the backend
/// (e.g., render target -> shader-readable). They are ordering hints for
/// the command stream, not synchronous waits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceState {
    Common,
    RenderTarget,
    DepthWrite,
    /// Readable from compute and ray-trace shaders
    ComputeShaderResource,
    /// Readable from pixel shaders (sampled blits)
    PixelShaderResource,
    /// Writable from compute and ray-trace shaders
    UnorderedAccess,
    Present,
}

bitflags! {
    /// Usage capabilities requested at texture creation
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TextureUsage: u32 {
        const SHADER_RESOURCE  = 1 << 0;
        const RENDER_TARGET    = 1 << 1;
        const DEPTH_STENCIL    = 1 << 2;
        const UNORDERED_ACCESS = 1 << 3;
    }
}

/// Descriptor for creating a 2-D texture
#[derive(Debug, Clone)]
pub struct TextureDesc {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Pixel format
    pub format: ResourceFormat,
    /// Usage capabilities
    pub usage: TextureUsage,
}

impl TextureDesc {
    /// Descriptor for a drawable color target that later passes can sample
    pub fn render_target(width: u32, height: u32, format: ResourceFormat) -> Self {
        Self {
            width,
            height,
            format,
            usage: TextureUsage::RENDER_TARGET | TextureUsage::SHADER_RESOURCE,
        }
    }

    /// Descriptor for a depth-stencil buffer readable by lighting passes
    pub fn depth_stencil(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            format: ResourceFormat::D24_UNORM_S8_UINT,
            usage: TextureUsage::DEPTH_STENCIL | TextureUsage::SHADER_RESOURCE,
        }
    }

    /// Descriptor for a compute-writable buffer that later passes can sample
    pub fn unordered_access(width: u32, height: u32, format: ResourceFormat) -> Self {
        Self {
            width,
            height,
            format,
            usage: TextureUsage::UNORDERED_ACCESS | TextureUsage::SHADER_RESOURCE,
        }
    }
}

/// Read-only properties of a created texture
#[derive(Debug, Clone)]
pub struct TextureInfo {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Pixel format
    pub format: ResourceFormat,
    /// Usage capabilities
    pub usage: TextureUsage,
}

/// Texture resource trait
///
/// Implemented by backend-specific texture types. The texture is
/// destroyed when the last reference is dropped.
pub trait Texture: Send + Sync {
    /// Get the read-only properties of this texture
    fn info(&self) -> &TextureInfo;

    /// Debug name assigned at creation time
    fn name(&self) -> &str;
}
