use super::SurfaceType;
use crate::st::ClientApi;

/// EGL error codes, as returned by `eglGetError`
pub mod codes {
    /// `EGL_SUCCESS`
    pub const SUCCESS: u32 = 0x3000;
    /// `EGL_BAD_ACCESS`
    pub const BAD_ACCESS: u32 = 0x3002;
    /// `EGL_BAD_ALLOC`
    pub const BAD_ALLOC: u32 = 0x3003;
    /// `EGL_BAD_CONFIG`
    pub const BAD_CONFIG: u32 = 0x3005;
    /// `EGL_BAD_CONTEXT`
    pub const BAD_CONTEXT: u32 = 0x3006;
    /// `EGL_BAD_MATCH`
    pub const BAD_MATCH: u32 = 0x3009;
    /// `EGL_BAD_NATIVE_PIXMAP`
    pub const BAD_NATIVE_PIXMAP: u32 = 0x300A;
    /// `EGL_BAD_NATIVE_WINDOW`
    pub const BAD_NATIVE_WINDOW: u32 = 0x300B;
    /// `EGL_BAD_PARAMETER`
    pub const BAD_PARAMETER: u32 = 0x300C;
    /// `EGL_BAD_SURFACE`
    pub const BAD_SURFACE: u32 = 0x300D;
    /// `EGL_BAD_SCREEN_MESA`
    pub const BAD_SCREEN_MESA: u32 = 0x4000;
    /// `EGL_BAD_MODE_MESA`
    pub const BAD_MODE_MESA: u32 = 0x4001;
}

/// Errors of the EGL entry points
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// An object could not be allocated
    #[error("Failed to allocate resources for the requested operation")]
    AllocationFailure,
    /// No state tracker serves the requested client API and version
    #[error("The client API {api:?} version {version} is not supported")]
    UnsupportedClientApi {
        /// Requested client API
        api: ClientApi,
        /// Requested client version
        version: i32,
    },
    /// The texture format or target of a surface is not supported
    #[error("The texture format or target of the surface is not supported")]
    UnsupportedFormat,
    /// The native surface or the framebuffer could not be created
    #[error("Failed to create a {0:?} surface")]
    SurfaceCreationFailure(SurfaceType),
    /// The state tracker refused to make the context current
    #[error("The state tracker failed to make the context current")]
    BindFailure,
    /// No config of the display can render into the native pixmap
    #[error("No config is compatible with the native pixmap")]
    NoMatchingConfig,
    /// An argument value is invalid
    #[error("Invalid parameter: {0}")]
    InvalidParameter(&'static str),
    /// Arguments are inconsistent
    #[error("Arguments are inconsistent: {0}")]
    BadMatch(&'static str),
    /// The handle does not name a live context of the display
    #[error("The handle does not name a valid context")]
    BadContext,
    /// The handle does not name a live surface of the display, or the surface has the wrong type
    #[error("The handle does not name a valid surface")]
    BadSurface,
    /// The handle does not name a config of the display
    #[error("The handle does not name a valid config")]
    BadConfig,
    /// The context or surface is current in another session
    #[error("The object is current in another session")]
    BadAccess,
    /// A temporary surface for the native pixmap could not be created
    #[error("The native pixmap is not valid")]
    BadNativePixmap,
    /// The handle does not name a screen of the display
    #[error("The handle does not name a valid screen")]
    BadScreen,
    /// The mode is not a mode of the screen
    #[error("The mode is not a mode of the screen")]
    BadMode,
    /// The pbuffer is already bound to a texture
    #[error("The surface is already bound to a texture")]
    AlreadyBound,
    /// The pbuffer is not bound to a texture
    #[error("The surface is not bound to a texture")]
    NotBound,
    /// The native surface failed to present
    #[error("The native surface failed to swap buffers")]
    SwapFailed,
    /// The copy to the native pixmap could not be set up
    #[error("Failed to copy the surface to the native pixmap")]
    CopyFailed,
    /// The state tracker could not take the surface as texture image
    #[error("The state tracker failed to take the surface as texture image")]
    TexImageFailed,
}

impl Error {
    /// The EGL error code an application sees for this error
    pub fn egl_code(&self) -> u32 {
        match self {
            Error::AllocationFailure => codes::BAD_ALLOC,
            Error::UnsupportedClientApi { .. } => codes::BAD_MATCH,
            Error::UnsupportedFormat => codes::BAD_MATCH,
            Error::SurfaceCreationFailure(SurfaceType::Window) => codes::BAD_NATIVE_WINDOW,
            Error::SurfaceCreationFailure(SurfaceType::Pixmap) => codes::BAD_NATIVE_PIXMAP,
            Error::SurfaceCreationFailure(_) => codes::BAD_ALLOC,
            Error::BindFailure => codes::BAD_MATCH,
            Error::NoMatchingConfig => codes::BAD_NATIVE_PIXMAP,
            Error::InvalidParameter(_) => codes::BAD_PARAMETER,
            Error::BadMatch(_) => codes::BAD_MATCH,
            Error::BadContext => codes::BAD_CONTEXT,
            Error::BadSurface => codes::BAD_SURFACE,
            Error::BadConfig => codes::BAD_CONFIG,
            Error::BadAccess => codes::BAD_ACCESS,
            Error::BadNativePixmap => codes::BAD_NATIVE_PIXMAP,
            Error::BadScreen => codes::BAD_SCREEN_MESA,
            Error::BadMode => codes::BAD_MODE_MESA,
            Error::AlreadyBound => codes::BAD_ACCESS,
            Error::NotBound => codes::BAD_SURFACE,
            Error::SwapFailed => codes::BAD_SURFACE,
            Error::CopyFailed => codes::BAD_ALLOC,
            Error::TexImageFailed => codes::BAD_ALLOC,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texture_protocol_errors_map_like_egl() {
        assert_eq!(Error::AlreadyBound.egl_code(), codes::BAD_ACCESS);
        assert_eq!(Error::NotBound.egl_code(), codes::BAD_SURFACE);
        assert_eq!(Error::UnsupportedFormat.egl_code(), codes::BAD_MATCH);
    }

    #[test]
    fn surface_creation_errors_name_the_native_object() {
        assert_eq!(
            Error::SurfaceCreationFailure(SurfaceType::Window).egl_code(),
            codes::BAD_NATIVE_WINDOW
        );
        assert_eq!(
            Error::SurfaceCreationFailure(SurfaceType::Pbuffer).egl_code(),
            codes::BAD_ALLOC
        );
    }
}
