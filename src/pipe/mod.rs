//! Graphics pipe abstraction
//!
//! The bridge never renders by itself. Everything it needs from the hardware driver is
//! expressed by the traits of this module:
//!
//! - a [`PipeScreen`] creates resources, views into resources, pipe contexts and waits for fences,
//! - a [`PipeContext`] copies between views and flushes submitted work,
//! - [`Resource`]s, [`PipeSurface`]s and [`Fence`]s are the objects passed around.
//!
//! Reference counting of resources and fences maps onto [`Rc`]: cloning a [`ResourceRef`] takes a
//! reference, dropping it releases the reference. Views are uniquely owned, dropping the box
//! releases the view.

use std::{fmt, rc::Rc, time::Duration};

use downcast_rs::{impl_downcast, Downcast};

use crate::utils::{Point, Size};

/// Pixel formats known to the bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// No format, used to clear a texture image
    None,
    /// 24-bit RGB, no alpha
    R8G8B8Unorm,
    /// 32-bit BGRA
    B8G8R8A8Unorm,
    /// 32-bit BGR with padding
    B8G8R8X8Unorm,
    /// 32-bit ARGB
    A8R8G8B8Unorm,
    /// 16-bit RGB
    B5G6R5Unorm,
    /// 24-bit depth with 8-bit stencil
    Z24UnormS8Uscaled,
    /// 16-bit depth
    Z16Unorm,
}

bitflags::bitflags! {
    /// Usages a resource or a view into a resource can be bound for
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BindFlags: u32 {
        /// Rendered into by a pipe context
        const RENDER_TARGET = 1 << 0;
        /// Sampled from as a texture
        const SAMPLER_VIEW = 1 << 1;
        /// Displayed by the window system
        const DISPLAY_TARGET = 1 << 2;
        /// Scanned out by a CRTC
        const SCANOUT = 1 << 3;
        /// Source of a blit
        const BLIT_SOURCE = 1 << 4;
        /// Destination of a blit
        const BLIT_DESTINATION = 1 << 5;
    }
}

bitflags::bitflags! {
    /// What a flush has to cover
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FlushFlags: u32 {
        /// Flush the render cache
        const RENDER_CACHE = 1 << 0;
        /// Mark the end of a frame
        const FRAME = 1 << 1;
    }
}

impl FlushFlags {
    /// Flags used whenever the bridge flushes a context on behalf of the application
    pub const FRAME_BOUNDARY: FlushFlags = FlushFlags::RENDER_CACHE.union(FlushFlags::FRAME);
}

/// Dimensionality of a pipe resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceTarget {
    /// Two dimensional texture
    Texture2D,
}

/// Description of a resource to be created by [`PipeScreen::resource_create`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceTemplate {
    /// Dimensionality
    pub target: ResourceTarget,
    /// Pixel format
    pub format: Format,
    /// Size of the first level
    pub size: Size,
    /// Number of mipmap levels beyond the first one
    pub last_level: u32,
    /// Usages the resource has to support
    pub bind: BindFlags,
}

impl ResourceTemplate {
    /// Template of a single-level 2D texture
    pub fn texture_2d(format: Format, size: Size, bind: BindFlags) -> ResourceTemplate {
        ResourceTemplate {
            target: ResourceTarget::Texture2D,
            format,
            size,
            last_level: 0,
            bind,
        }
    }
}

/// A memory object owned by the pipe driver
pub trait Resource: fmt::Debug + Downcast {
    /// Size of the first level
    fn size(&self) -> Size;
}
impl_downcast!(Resource);

/// Counted reference to a [`Resource`]
pub type ResourceRef = Rc<dyn Resource>;

/// A two dimensional view into a level of a [`Resource`]
///
/// Dropping the view releases it.
pub trait PipeSurface: fmt::Debug + Downcast {
    /// Size of the viewed level
    fn size(&self) -> Size;
    /// The usage the view was created for
    fn usage(&self) -> BindFlags;
}
impl_downcast!(PipeSurface);

/// A fence that will be signaled once the work submitted before it is done.
///
/// Waiting on it goes through [`PipeScreen::fence_finish`], dropping the last reference
/// releases it.
pub trait Fence: fmt::Debug + Downcast {}
impl_downcast!(Fence);

/// Counted reference to a [`Fence`]
pub type FenceRef = Rc<dyn Fence>;

/// Per-device entry point of the pipe driver
pub trait PipeScreen: fmt::Debug {
    /// Creates a view of `resource` usable for `usage`
    fn get_tex_surface(
        &self,
        resource: &ResourceRef,
        level: u32,
        face: u32,
        layer: u32,
        usage: BindFlags,
    ) -> Option<Box<dyn PipeSurface>>;

    /// Allocates a new resource
    fn resource_create(&self, template: &ResourceTemplate) -> Option<ResourceRef>;

    /// Creates a new pipe context
    fn context_create(&self) -> Option<Box<dyn PipeContext>>;

    /// Blocks until `fence` is signaled or `timeout` expired.
    ///
    /// `None` waits forever. Returns whether the fence was signaled.
    fn fence_finish(&self, fence: &FenceRef, timeout: Option<Duration>) -> bool;
}

/// A pipe context, used by the bridge for blits only
///
/// Dropping the context destroys it.
pub trait PipeContext: fmt::Debug {
    /// Copies a `size` region from `src` at `src_loc` to `dst` at `dst_loc`
    fn surface_copy(
        &mut self,
        dst: &dyn PipeSurface,
        dst_loc: Point,
        src: &dyn PipeSurface,
        src_loc: Point,
        size: Size,
    );

    /// Flushes submitted work. Returns a fence if `want_fence` was set and the driver created one.
    fn flush(&mut self, flags: FlushFlags, want_fence: bool) -> Option<FenceRef>;
}
