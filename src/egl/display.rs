//! EGL displays and the lifecycle of their contexts and surfaces

use std::{cell::RefCell, fmt, rc::Rc};

use indexmap::IndexMap;
use tracing::{debug, info, info_span, instrument, trace, warn};

use super::{
    context::Context,
    screen::{Screen, ScreenId},
    surface::Surface,
    Config, ConfigId, ContextAttributes, ContextId, Error, Framebuffer, RenderBuffer, SurfaceAttributes,
    SurfaceId, SurfaceType,
};
use crate::{
    native::{AttachmentMask, NativeConfig, NativeDisplay, NativePixmap, NativeSurface, NativeWindow},
    pipe::{PipeContext, PipeScreen},
    st::{self, StApiTable, StAttachment},
    utils::{ids::id_gen, Size},
};

id_gen!(display_ids);

/// Native target of a surface about to be created
enum Target {
    Window(NativeWindow),
    Pixmap(NativePixmap),
    Pbuffer,
    Screen,
}

impl Target {
    fn kind(&self) -> SurfaceType {
        match self {
            Target::Window(_) => SurfaceType::Window,
            Target::Pixmap(_) => SurfaceType::Pixmap,
            Target::Pbuffer => SurfaceType::Pbuffer,
            Target::Screen => SurfaceType::Screen,
        }
    }
}

/// An initialized EGL display
///
/// The display owns every context and surface created on it. Destroying a context or surface
/// unlinks it from the display; it is freed right away unless a [`Session`](super::Session)
/// still has it bound, in which case it is freed by the
/// [`make_current`](Display::make_current) call that unbinds it.
pub struct Display {
    token: display_ids::Token,
    native: Box<dyn NativeDisplay>,
    pub(crate) pipe_screen: Rc<dyn PipeScreen>,
    apis: StApiTable,
    configs: Vec<Config>,
    contexts: IndexMap<usize, Rc<Context>>,
    surfaces: IndexMap<usize, Rc<Surface>>,
    pub(crate) screens: Vec<Screen>,
    pub(crate) pipe: RefCell<Option<Box<dyn PipeContext>>>,
    pub(crate) span: tracing::Span,
}

impl fmt::Debug for Display {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Display")
            .field("id", &self.token.get())
            .field("native", &self.native)
            .field("apis", &self.apis)
            .field("configs", &self.configs)
            .field("contexts", &self.contexts.len())
            .field("surfaces", &self.surfaces.len())
            .field("screens", &self.screens)
            .field("pipe", &self.pipe.borrow().is_some())
            .finish()
    }
}

impl Display {
    /// Initializes a display on top of `native`, driving the state trackers of `apis`.
    ///
    /// Every native config becomes one [`Config`], in the given order.
    pub fn new(native: Box<dyn NativeDisplay>, apis: StApiTable, native_configs: Vec<NativeConfig>) -> Display {
        let token = display_ids::Token::new();
        let span = info_span!("egl_g3d", display = token.get());
        let _guard = span.enter();

        let configs = native_configs
            .into_iter()
            .enumerate()
            .map(|(index, native)| Config::new(ConfigId(index), native))
            .collect::<Vec<_>>();
        if apis.is_empty() {
            warn!("Display initialized without any state tracker");
        }
        info!(configs = configs.len(), "Display initialized");
        let pipe_screen = native.screen();

        drop(_guard);
        Display {
            token,
            native,
            pipe_screen,
            apis,
            configs,
            contexts: IndexMap::new(),
            surfaces: IndexMap::new(),
            screens: Vec::new(),
            pipe: RefCell::new(None),
            span,
        }
    }

    pub(crate) fn id(&self) -> usize {
        self.token.get()
    }

    /// The native display
    pub fn native(&self) -> &dyn NativeDisplay {
        &*self.native
    }

    /// All configs of the display
    pub fn configs(&self) -> &[Config] {
        &self.configs
    }

    /// Looks up a config
    pub fn config(&self, config: ConfigId) -> Result<&Config, Error> {
        self.configs.get(config.0).ok_or(Error::BadConfig)
    }

    /// The first config whose native config can render into `pixmap`
    pub fn find_pixmap_config(&self, pixmap: NativePixmap) -> Option<&Config> {
        self.configs
            .iter()
            .find(|config| self.native.is_pixmap_supported(pixmap, config.native()))
    }

    /// Registers a screen of the mode setting interface
    pub fn add_screen(&mut self, screen: Screen) -> ScreenId {
        self.screens.push(screen);
        ScreenId(self.screens.len() - 1)
    }

    /// Looks up a screen
    pub fn screen(&self, screen: ScreenId) -> Option<&Screen> {
        self.screens.get(screen.0)
    }

    pub(crate) fn lookup_context(&self, context: ContextId) -> Result<&Rc<Context>, Error> {
        if context.display != self.id() {
            return Err(Error::BadMatch("context belongs to another display"));
        }
        self.contexts.get(&context.id).ok_or(Error::BadContext)
    }

    pub(crate) fn lookup_surface(&self, surface: SurfaceId) -> Result<&Rc<Surface>, Error> {
        if surface.display != self.id() {
            return Err(Error::BadMatch("surface belongs to another display"));
        }
        self.surfaces.get(&surface.id).ok_or(Error::BadSurface)
    }

    /// Creates a context rendering with the client API of `attributes`
    #[instrument(level = "debug", parent = &self.span, skip(self))]
    pub fn create_context(
        &mut self,
        config: ConfigId,
        share: Option<ContextId>,
        attributes: ContextAttributes,
    ) -> Result<ContextId, Error> {
        let visual = self.config(config)?.visual().clone();
        let share = share.map(|share| self.lookup_context(share)).transpose()?;

        let unsupported = Error::UnsupportedClientApi {
            api: attributes.api,
            version: attributes.version,
        };
        let Some(slot) = st::choose_slot(attributes.api, attributes.version) else {
            warn!(api = ?attributes.api, version = attributes.version, "Unknown client API");
            return Err(unsupported);
        };
        let Some(api) = self.apis.get(slot).cloned() else {
            warn!(?slot, "Driver has no state tracker for the client API");
            return Err(unsupported);
        };

        let st = {
            let share = share.map(|share| share.st().borrow());
            api.create_context(&visual, share.as_deref().map(|share| &**share))
        };
        let Some(st) = st else {
            warn!(?slot, "State tracker failed to create a context");
            return Err(Error::AllocationFailure);
        };

        let context = Context::new(self.id(), config, attributes, slot, api, st, &self.span);
        let handle = context.handle();
        debug!(?handle, "Context created");
        self.contexts.insert(handle.id, Rc::new(context));
        Ok(handle)
    }

    /// Destroys a context.
    ///
    /// A context current in a session stays alive until it is unbound.
    #[instrument(level = "debug", parent = &self.span, skip(self))]
    pub fn destroy_context(&mut self, context: ContextId) -> Result<(), Error> {
        self.lookup_context(context)?;
        if let Some(context) = self.contexts.shift_remove(&context.id) {
            if context.is_current() {
                let _guard = context.span.enter();
                trace!("Context is current, deferring destruction");
            }
        }
        Ok(())
    }

    /// Creates a surface rendering into a native window
    #[instrument(level = "debug", parent = &self.span, skip(self))]
    pub fn create_window_surface(
        &mut self,
        config: ConfigId,
        window: NativeWindow,
        attributes: SurfaceAttributes,
    ) -> Result<SurfaceId, Error> {
        self.create_surface(config, Target::Window(window), attributes)
    }

    /// Creates a surface rendering into a native pixmap
    #[instrument(level = "debug", parent = &self.span, skip(self))]
    pub fn create_pixmap_surface(
        &mut self,
        config: ConfigId,
        pixmap: NativePixmap,
        attributes: SurfaceAttributes,
    ) -> Result<SurfaceId, Error> {
        self.create_surface(config, Target::Pixmap(pixmap), attributes)
    }

    /// Creates an off-screen surface of `attributes.size`
    #[instrument(level = "debug", parent = &self.span, skip(self))]
    pub fn create_pbuffer_surface(
        &mut self,
        config: ConfigId,
        attributes: SurfaceAttributes,
    ) -> Result<SurfaceId, Error> {
        self.create_surface(config, Target::Pbuffer, attributes)
    }

    /// Creates a surface of `attributes.size` that can be shown on a screen
    #[instrument(level = "debug", parent = &self.span, skip(self))]
    pub fn create_screen_surface(
        &mut self,
        config: ConfigId,
        attributes: SurfaceAttributes,
    ) -> Result<SurfaceId, Error> {
        self.create_surface(config, Target::Screen, attributes)
    }

    fn create_surface(
        &mut self,
        config: ConfigId,
        target: Target,
        mut attributes: SurfaceAttributes,
    ) -> Result<SurfaceId, Error> {
        let kind = target.kind();
        let config = self.config(config)?;

        // screen surfaces are always back-buffered
        if kind == SurfaceType::Screen {
            attributes.render_buffer = RenderBuffer::Back;
        }
        if !matches!(attributes.render_buffer, RenderBuffer::Back | RenderBuffer::Single) {
            return Err(Error::InvalidParameter("render buffer"));
        }

        let native = match target {
            Target::Window(window) => self.native.create_window_surface(window, config.native()),
            Target::Pixmap(pixmap) => self.native.create_pixmap_surface(pixmap, config.native()),
            Target::Screen => self
                .native
                .modeset()
                .and_then(|modeset| modeset.create_scanout_surface(config.native(), attributes.size)),
            Target::Pbuffer => None,
        };

        let (native, size, sequence_number) = match native {
            Some(native) => {
                let Some((native, size, sequence_number)) = initial_geometry(native) else {
                    warn!(?kind, "Native surface failed to validate");
                    return Err(Error::SurfaceCreationFailure(kind));
                };
                (Some(native), size, sequence_number)
            }
            None if kind == SurfaceType::Pbuffer => (None, attributes.size, 0),
            None => {
                warn!(?kind, "Failed to create native surface");
                return Err(Error::SurfaceCreationFailure(kind));
            }
        };

        let mut visual = config.visual().clone();
        if kind != SurfaceType::Pbuffer && attributes.render_buffer == RenderBuffer::Single {
            visual.render_buffer = StAttachment::FrontLeft;
        }
        if !visual.has_render_buffer() {
            // dropping `native` destroys it
            warn!(?kind, render_buffer = ?visual.render_buffer, "Config lacks the render buffer");
            return Err(Error::SurfaceCreationFailure(kind));
        }

        let screen = self.pipe_screen.clone();
        let surface = Surface::new(
            self.id(),
            kind,
            config.id(),
            attributes,
            |span| Framebuffer::new(kind, visual, screen, native, size, sequence_number, span),
            &self.span,
        );
        let handle = surface.handle();
        debug!(?handle, ?size, "Surface created");
        self.surfaces.insert(handle.id, Rc::new(surface));
        Ok(handle)
    }

    /// Destroys a surface.
    ///
    /// A surface bound as draw or read surface stays alive until it is unbound.
    #[instrument(level = "debug", parent = &self.span, skip(self))]
    pub fn destroy_surface(&mut self, surface: SurfaceId) -> Result<(), Error> {
        self.lookup_surface(surface)?;
        if let Some(surface) = self.surfaces.shift_remove(&surface.id) {
            if surface.bound_context().is_some() {
                let _guard = surface.span.enter();
                trace!("Surface is bound, deferring destruction");
            }
        }
        Ok(())
    }

    /// Contexts linked into the display
    pub fn contexts(&self) -> impl Iterator<Item = ContextId> + '_ {
        self.contexts.values().map(|context| context.handle())
    }

    /// Surfaces linked into the display
    pub fn surfaces(&self) -> impl Iterator<Item = SurfaceId> + '_ {
        self.surfaces.values().map(|surface| surface.handle())
    }

    /// Attributes the context was created with
    pub fn context_attributes(&self, context: ContextId) -> Result<ContextAttributes, Error> {
        Ok(self.lookup_context(context)?.attributes())
    }

    /// The buffer a context renders to while bound to a window surface.
    ///
    /// [`RenderBuffer::None`] unless the context is current with a window draw surface.
    pub fn context_render_buffer(&self, context: ContextId) -> Result<RenderBuffer, Error> {
        Ok(self.lookup_context(context)?.window_render_buffer())
    }

    /// Returns true if the context is current in some session
    pub fn is_current(&self, context: ContextId) -> Result<bool, Error> {
        Ok(self.lookup_context(context)?.is_current())
    }

    /// Type of a surface
    pub fn surface_type(&self, surface: SurfaceId) -> Result<SurfaceType, Error> {
        Ok(self.lookup_surface(surface)?.kind())
    }

    /// Size of a surface as of its last validation
    pub fn surface_size(&self, surface: SurfaceId) -> Result<Size, Error> {
        Ok(self.lookup_surface(surface)?.framebuffer().size())
    }

    /// The buffer a surface renders to
    pub fn surface_render_buffer(&self, surface: SurfaceId) -> Result<RenderBuffer, Error> {
        Ok(self.lookup_surface(surface)?.render_buffer())
    }

    /// Attributes the surface was created with
    pub fn surface_attributes(&self, surface: SurfaceId) -> Result<SurfaceAttributes, Error> {
        Ok(*self.lookup_surface(surface)?.attributes())
    }

    /// The framebuffer state trackers render into when the surface is bound
    pub fn surface_framebuffer(&self, surface: SurfaceId) -> Result<Rc<Framebuffer>, Error> {
        Ok(self.lookup_surface(surface)?.framebuffer().clone())
    }

    /// Returns true if the pbuffer is bound to a texture
    pub fn is_bound_to_texture(&self, surface: SurfaceId) -> Result<bool, Error> {
        Ok(self.lookup_surface(surface)?.is_bound_to_texture())
    }

    /// Sets the mipmap level a pbuffer is bound to by [`Display::bind_tex_image`]
    pub fn set_mipmap_level(&self, surface: SurfaceId, level: i32) -> Result<(), Error> {
        if level < 0 {
            return Err(Error::InvalidParameter("mipmap level"));
        }
        self.lookup_surface(surface)?.set_mipmap_level(level);
        Ok(())
    }
}

impl Drop for Display {
    fn drop(&mut self) {
        let _guard = self.span.enter();
        if self.pipe.get_mut().take().is_some() {
            debug!("Destroying auxiliary pipe context");
        }
        let bound = self
            .contexts
            .values()
            .filter(|context| context.is_current())
            .count();
        if bound > 0 {
            warn!(bound, "Display dropped while contexts are still current");
        }
        info!("Display terminated");
    }
}

/// Validates a fresh native surface without attachments to learn its size
fn initial_geometry(mut native: Box<dyn NativeSurface>) -> Option<(Box<dyn NativeSurface>, Size, u32)> {
    let validated = native.validate(AttachmentMask::empty())?;
    Some((native, validated.size, validated.sequence_number))
}
