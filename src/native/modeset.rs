use std::fmt;

use super::{NativeConfig, NativeSurface};
use crate::utils::{Point, Size};

/// A display mode of a native connector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeMode {
    /// Human readable name, like `1920x1080`
    pub desc: String,
    /// Resolution of the mode
    pub size: Size,
    /// Refresh rate in mHz
    pub refresh_rate: i32,
}

/// Opaque handle of a native connector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeConnector(pub usize);

/// Mode setting interface of a native display
pub trait NativeModeset: fmt::Debug {
    /// Creates a surface that can be scanned out by a CRTC
    fn create_scanout_surface(&self, config: &NativeConfig, size: Size) -> Option<Box<dyn NativeSurface>>;

    /// Programs `crtc` to scan out `surface` at `origin` on `connectors` using `mode`.
    ///
    /// No surface and no mode disables the CRTC. Returns whether the CRTC was changed.
    fn program(
        &self,
        crtc: usize,
        surface: Option<&dyn NativeSurface>,
        origin: Point,
        connectors: &[NativeConnector],
        mode: Option<&NativeMode>,
    ) -> bool;
}
