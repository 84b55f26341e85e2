//! Screens of the mode setting interface

use std::slice;

use tracing::{debug, instrument, warn};

use super::{Display, Error, SurfaceId, SurfaceType};
use crate::{
    native::{NativeConnector, NativeMode},
    utils::{Point, Size},
};

/// Handle of a [`Screen`] of a display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScreenId(pub(crate) usize);

/// Handle of a [`Mode`] of a screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModeId(pub(crate) usize);

/// A display mode as advertised to applications
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mode {
    /// Handle of the mode within its screen
    pub id: ModeId,
    /// Resolution
    pub size: Size,
    /// Refresh rate in mHz
    pub refresh_rate: i32,
    /// Name of the mode
    pub name: String,
}

/// A connector that can scan out screen surfaces
#[derive(Debug)]
pub struct Screen {
    connector: NativeConnector,
    modes: Vec<Mode>,
    native_modes: Vec<NativeMode>,
    origin: Point,
    current_surface: Option<SurfaceId>,
    current_mode: Option<ModeId>,
}

impl Screen {
    /// Creates a screen for `connector`, advertising one [`Mode`] per native mode
    pub fn new(connector: NativeConnector, native_modes: Vec<NativeMode>) -> Screen {
        let modes = native_modes
            .iter()
            .enumerate()
            .map(|(index, native)| Mode {
                id: ModeId(index),
                size: native.size,
                refresh_rate: native.refresh_rate,
                name: native.desc.clone(),
            })
            .collect();
        Screen {
            connector,
            modes,
            native_modes,
            origin: Point::default(),
            current_surface: None,
            current_mode: None,
        }
    }

    /// Moves the scanout origin within the shown surface
    pub fn with_origin(mut self, origin: impl Into<Point>) -> Screen {
        self.origin = origin.into();
        self
    }

    /// The native connector
    pub fn connector(&self) -> NativeConnector {
        self.connector
    }

    /// Modes of the screen
    pub fn modes(&self) -> &[Mode] {
        &self.modes
    }

    /// Looks up a mode
    pub fn mode(&self, mode: ModeId) -> Option<&Mode> {
        self.modes.get(mode.0)
    }

    /// Scanout origin
    pub fn origin(&self) -> Point {
        self.origin
    }

    /// The surface last shown on the screen
    pub fn current_surface(&self) -> Option<SurfaceId> {
        self.current_surface
    }

    /// The mode last programmed
    pub fn current_mode(&self) -> Option<ModeId> {
        self.current_mode
    }
}

impl Display {
    /// Shows `surface` on `screen` using `mode`.
    ///
    /// The surface must be a screen surface at least as large as the mode. Passing neither a
    /// surface nor a mode turns the screen off. Returns whether the native modeset applied the
    /// new configuration; the screen state only changes if it did.
    #[instrument(level = "debug", parent = &self.span, skip(self))]
    pub fn show_screen_surface(
        &mut self,
        screen: ScreenId,
        surface: Option<SurfaceId>,
        mode: Option<ModeId>,
    ) -> Result<bool, Error> {
        let changed = {
            let target = self.screens.get(screen.0).ok_or(Error::BadScreen)?;
            let modeset = self
                .native()
                .modeset()
                .ok_or(Error::BadMatch("display has no mode setting interface"))?;
            let connectors = slice::from_ref(&target.connector);

            match (surface, mode) {
                (Some(surface), Some(mode)) => {
                    let surface = self.lookup_surface(surface)?;
                    if surface.kind() != SurfaceType::Screen {
                        return Err(Error::BadSurface);
                    }
                    let Some(native_mode) = target.native_modes.get(mode.0) else {
                        return Err(Error::BadMode);
                    };
                    let size = surface.framebuffer().size();
                    if !size.contains(native_mode.size) {
                        return Err(Error::BadMatch("surface smaller than mode size"));
                    }
                    surface
                        .framebuffer()
                        .with_native(|native| {
                            modeset.program(0, Some(&*native), target.origin, connectors, Some(native_mode))
                        })
                        .unwrap_or(false)
                }
                (Some(_), None) => return Err(Error::BadMatch("surface without mode")),
                (None, Some(_)) => return Err(Error::BadMatch("mode without surface")),
                (None, None) => modeset.program(0, None, target.origin, connectors, None),
            }
        };

        if changed {
            let target = &mut self.screens[screen.0];
            target.current_surface = surface;
            target.current_mode = mode;
            debug!(?surface, ?mode, "Screen reprogrammed");
        } else {
            warn!(?surface, ?mode, "Native modeset refused the configuration");
        }
        Ok(changed)
    }
}
