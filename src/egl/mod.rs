//! EGL on top of the graphics pipe
//!
//! A [`Display`] ties together a [`NativeDisplay`](crate::native::NativeDisplay), the pipe
//! screen it exposes and the state trackers the driver was built with. It creates
//! [contexts](Display::create_context) and surfaces (window, pixmap, pbuffer and screen), binds
//! them to a [`Session`], presents and copies surfaces, and binds pbuffers as textures.
//!
//! ## Object lifetime
//!
//! Contexts and surfaces are addressed by handles ([`ContextId`], [`SurfaceId`]). Destroying
//! one through the display unlinks it: its handle stops resolving right away. The object
//! itself is only freed once no session has it bound any more, which happens in the
//! [`Display::make_current`] call that replaces the binding.
//!
//! ```no_run
//! # use egl_g3d::egl::*;
//! # fn run(display: &mut Display, config: ConfigId, surface: SurfaceId) -> Result<(), Error> {
//! let mut session = Session::new();
//! let context = display.create_context(config, None, ContextAttributes::default())?;
//! display.make_current(&mut session, Some(context), Some(surface), Some(surface))?;
//!
//! // still bound, only unlinked
//! display.destroy_context(context)?;
//! // freed here
//! display.make_current(&mut session, None, None, None)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Logging
//!
//! Every display opens an `egl_g3d` span, contexts and surfaces log inside child spans of it.

mod config;
mod context;
mod current;
mod display;
mod error;
mod framebuffer;
mod screen;
mod session;
mod surface;
mod swap;
mod texture;


pub use self::config::{Config, ConfigId};
pub use self::context::{ContextAttributes, ContextId};
pub use self::display::Display;
pub use self::error::{codes, Error};
pub use self::framebuffer::{Framebuffer, ValidatedTextures};
pub use self::screen::{Mode, ModeId, Screen, ScreenId};
pub use self::session::Session;
pub use self::surface::{SurfaceAttributes, SurfaceId, SurfaceType, TextureFormat, TextureTarget};

/// `EGL_CORE_NATIVE_ENGINE`, the only engine [`Display::wait_native`] knows
pub const CORE_NATIVE_ENGINE: i32 = 0x305B;

/// Which buffer of a surface rendering goes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderBuffer {
    /// Not bound to a window surface
    None,
    /// The back buffer, shown by [`Display::swap_buffers`]
    Back,
    /// The front buffer, rendering is visible right away
    Single,
}
