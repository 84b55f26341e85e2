#![allow(missing_docs)]
//! Dummy collaborators recording every call
//!
//! [`DummyDriver`] bundles a pipe screen, a native display and state trackers that do no
//! rendering at all. They count what the EGL layer asks of them in a shared [`CallLog`],
//! which also carries knobs to make individual collaborator calls fail.

use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    rc::{Rc, Weak},
    time::Duration,
};

use crate::{
    egl::{Display, Framebuffer},
    native::{
        AttachmentMask, AttachmentTextures, NativeConfig, NativeConnector, NativeDisplay,
        NativeMode, NativeModeset, NativePixmap, NativeSurface, NativeWindow, Validated,
    },
    pipe::{
        BindFlags, Fence, FenceRef, FlushFlags, Format, PipeContext, PipeScreen, PipeSurface, Resource,
        ResourceRef, ResourceTemplate,
    },
    st::{ApiSlot, StApi, StApiTable, StContext, TextureType, Visual},
    utils::{Point, Size},
};

fn bump(counter: &Cell<usize>) {
    counter.set(counter.get() + 1);
}

/// Failure knobs of the dummy collaborators
#[derive(Debug, Default)]
pub struct Knobs {
    pub fail_st_context: Cell<bool>,
    pub fail_make_current: Cell<bool>,
    pub fail_unbind: Cell<bool>,
    pub fail_validate: Cell<bool>,
    pub fail_swap: Cell<bool>,
    pub fail_pipe_context: Cell<bool>,
    pub fail_resource: Cell<bool>,
    /// Views created for any of these usages fail
    pub fail_views: Cell<BindFlags>,
    pub fail_teximage: Cell<bool>,
    pub fail_program: Cell<bool>,
    pub no_teximage: Cell<bool>,
}

/// Calls made into the dummy collaborators
#[derive(Debug, Default)]
pub struct CallLog {
    pub knobs: Knobs,

    pub native_created: Cell<usize>,
    pub native_destroyed: Cell<usize>,
    pub native_validates: Cell<usize>,
    pub native_swaps: Cell<usize>,
    pub native_front_flushes: Cell<usize>,
    pub native_waits: Cell<usize>,

    pub resources_created: Cell<usize>,
    pub views_created: Cell<usize>,
    pub views_released: Cell<usize>,
    pub copies: Cell<usize>,
    pub last_copy_size: Cell<Option<Size>>,
    pub pipe_contexts_created: Cell<usize>,
    pub pipe_contexts_destroyed: Cell<usize>,
    pub fences_created: Cell<usize>,
    pub fences_released: Cell<usize>,
    pub fence_waits: Cell<usize>,

    pub st_contexts_created: Cell<usize>,
    pub st_contexts_destroyed: Cell<usize>,
    pub st_flushes: Cell<usize>,
    pub st_binds: Cell<usize>,
    pub st_unbinds: Cell<usize>,
    pub st_invalidations: Cell<usize>,
    pub teximage_binds: Cell<usize>,
    pub teximage_releases: Cell<usize>,

    pub programs: Cell<usize>,

    resources: RefCell<Vec<Weak<DummyResource>>>,
    windows: RefCell<HashMap<usize, Size>>,
    pixmaps: RefCell<HashMap<usize, (Size, Option<u32>)>>,
}

impl CallLog {
    pub fn new() -> Rc<CallLog> {
        Rc::new(CallLog::default())
    }

    /// Makes `window` known to the native display
    pub fn add_window(&self, window: usize, size: impl Into<Size>) {
        self.windows.borrow_mut().insert(window, size.into());
    }

    /// Changes the size of `window`, its buffers get reallocated on the next validation
    pub fn resize_window(&self, window: usize, size: impl Into<Size>) {
        self.add_window(window, size)
    }

    /// Makes `pixmap` known to the native display, renderable by the native config `config`
    pub fn add_pixmap(&self, pixmap: usize, size: impl Into<Size>, config: Option<u32>) {
        self.pixmaps.borrow_mut().insert(pixmap, (size.into(), config));
    }

    pub fn live_native_surfaces(&self) -> usize {
        self.native_created.get() - self.native_destroyed.get()
    }

    pub fn live_views(&self) -> usize {
        self.views_created.get() - self.views_released.get()
    }

    pub fn live_fences(&self) -> usize {
        self.fences_created.get() - self.fences_released.get()
    }

    pub fn live_st_contexts(&self) -> usize {
        self.st_contexts_created.get() - self.st_contexts_destroyed.get()
    }

    pub fn live_resources(&self) -> usize {
        self.resources
            .borrow()
            .iter()
            .filter(|resource| resource.strong_count() > 0)
            .count()
    }

    fn window_size(&self, window: usize) -> Option<Size> {
        self.windows.borrow().get(&window).copied()
    }
}

#[derive(Debug)]
pub struct DummyResource {
    size: Size,
}

impl Resource for DummyResource {
    fn size(&self) -> Size {
        self.size
    }
}

#[derive(Debug)]
pub struct DummyView {
    size: Size,
    usage: BindFlags,
    log: Rc<CallLog>,
}

impl PipeSurface for DummyView {
    fn size(&self) -> Size {
        self.size
    }

    fn usage(&self) -> BindFlags {
        self.usage
    }
}

impl Drop for DummyView {
    fn drop(&mut self) {
        bump(&self.log.views_released);
    }
}

#[derive(Debug)]
pub struct DummyFence {
    log: Rc<CallLog>,
}

impl Fence for DummyFence {}

impl Drop for DummyFence {
    fn drop(&mut self) {
        bump(&self.log.fences_released);
    }
}

fn fence(log: &Rc<CallLog>) -> FenceRef {
    bump(&log.fences_created);
    Rc::new(DummyFence { log: log.clone() })
}

#[derive(Debug)]
pub struct DummyScreen {
    log: Rc<CallLog>,
}

impl DummyScreen {
    fn allocate(&self, size: Size) -> Option<ResourceRef> {
        if self.log.knobs.fail_resource.get() {
            return None;
        }
        let resource = Rc::new(DummyResource { size });
        self.log.resources.borrow_mut().push(Rc::downgrade(&resource));
        bump(&self.log.resources_created);
        Some(resource)
    }
}

impl PipeScreen for DummyScreen {
    fn get_tex_surface(
        &self,
        resource: &ResourceRef,
        _level: u32,
        _face: u32,
        _layer: u32,
        usage: BindFlags,
    ) -> Option<Box<dyn PipeSurface>> {
        if self.log.knobs.fail_views.get().intersects(usage) {
            return None;
        }
        bump(&self.log.views_created);
        Some(Box::new(DummyView {
            size: resource.size(),
            usage,
            log: self.log.clone(),
        }))
    }

    fn resource_create(&self, template: &ResourceTemplate) -> Option<ResourceRef> {
        self.allocate(template.size)
    }

    fn context_create(&self) -> Option<Box<dyn PipeContext>> {
        if self.log.knobs.fail_pipe_context.get() {
            return None;
        }
        bump(&self.log.pipe_contexts_created);
        Some(Box::new(DummyPipeContext { log: self.log.clone() }))
    }

    fn fence_finish(&self, _fence: &FenceRef, _timeout: Option<Duration>) -> bool {
        bump(&self.log.fence_waits);
        true
    }
}

#[derive(Debug)]
pub struct DummyPipeContext {
    log: Rc<CallLog>,
}

impl PipeContext for DummyPipeContext {
    fn surface_copy(
        &mut self,
        _dst: &dyn PipeSurface,
        _dst_loc: Point,
        _src: &dyn PipeSurface,
        _src_loc: Point,
        size: Size,
    ) {
        bump(&self.log.copies);
        self.log.last_copy_size.set(Some(size));
    }

    fn flush(&mut self, _flags: FlushFlags, want_fence: bool) -> Option<FenceRef> {
        want_fence.then(|| fence(&self.log))
    }
}

impl Drop for DummyPipeContext {
    fn drop(&mut self) {
        bump(&self.log.pipe_contexts_destroyed);
    }
}

#[derive(Debug, Clone, Copy)]
enum Backing {
    Window(usize),
    Fixed(Size),
}

#[derive(Debug)]
pub struct DummyNativeSurface {
    log: Rc<CallLog>,
    screen: Rc<DummyScreen>,
    backing: Backing,
    buffer_mask: AttachmentMask,
    size: Size,
    sequence_number: u32,
    textures: AttachmentTextures,
}

impl DummyNativeSurface {
    fn new(log: &Rc<CallLog>, screen: &Rc<DummyScreen>, backing: Backing, config: &NativeConfig) -> Self {
        bump(&log.native_created);
        DummyNativeSurface {
            log: log.clone(),
            screen: screen.clone(),
            backing,
            buffer_mask: config.buffer_mask,
            size: Size::default(),
            sequence_number: 0,
            textures: AttachmentTextures::default(),
        }
    }
}

impl NativeSurface for DummyNativeSurface {
    fn validate(&mut self, attachments: AttachmentMask) -> Option<Validated> {
        bump(&self.log.native_validates);
        if self.log.knobs.fail_validate.get() {
            return None;
        }

        let size = match self.backing {
            Backing::Window(window) => self.log.window_size(window)?,
            Backing::Fixed(size) => size,
        };
        if size != self.size {
            self.size = size;
            self.textures = AttachmentTextures::default();
            self.sequence_number += 1;
        }

        let mut validated = Validated {
            sequence_number: self.sequence_number,
            textures: AttachmentTextures::default(),
            size,
        };
        for attachment in (attachments & self.buffer_mask).attachments() {
            if self.textures.get(attachment).is_none() {
                let texture = self.screen.allocate(size)?;
                self.textures.set(attachment, Some(texture));
            }
            validated
                .textures
                .set(attachment, self.textures.get(attachment).cloned());
        }
        Some(validated)
    }

    fn swap_buffers(&mut self) -> bool {
        bump(&self.log.native_swaps);
        !self.log.knobs.fail_swap.get()
    }

    fn flush_frontbuffer(&mut self) -> bool {
        bump(&self.log.native_front_flushes);
        true
    }

    fn wait(&mut self) {
        bump(&self.log.native_waits);
    }
}

impl Drop for DummyNativeSurface {
    fn drop(&mut self) {
        bump(&self.log.native_destroyed);
    }
}

#[derive(Debug)]
pub struct DummyModeset {
    log: Rc<CallLog>,
    screen: Rc<DummyScreen>,
}

impl NativeModeset for DummyModeset {
    fn create_scanout_surface(&self, config: &NativeConfig, size: Size) -> Option<Box<dyn NativeSurface>> {
        Some(Box::new(DummyNativeSurface::new(
            &self.log,
            &self.screen,
            Backing::Fixed(size),
            config,
        )))
    }

    fn program(
        &self,
        _crtc: usize,
        _surface: Option<&dyn NativeSurface>,
        _origin: Point,
        _connectors: &[NativeConnector],
        _mode: Option<&NativeMode>,
    ) -> bool {
        bump(&self.log.programs);
        !self.log.knobs.fail_program.get()
    }
}

#[derive(Debug)]
pub struct DummyNativeDisplay {
    log: Rc<CallLog>,
    screen: Rc<DummyScreen>,
    modeset: DummyModeset,
}

impl NativeDisplay for DummyNativeDisplay {
    fn screen(&self) -> Rc<dyn PipeScreen> {
        self.screen.clone()
    }

    fn create_window_surface(
        &self,
        window: NativeWindow,
        config: &NativeConfig,
    ) -> Option<Box<dyn NativeSurface>> {
        self.log.window_size(window.0)?;
        Some(Box::new(DummyNativeSurface::new(
            &self.log,
            &self.screen,
            Backing::Window(window.0),
            config,
        )))
    }

    fn create_pixmap_surface(
        &self,
        pixmap: NativePixmap,
        config: &NativeConfig,
    ) -> Option<Box<dyn NativeSurface>> {
        let (size, _) = self.log.pixmaps.borrow().get(&pixmap.0).copied()?;
        Some(Box::new(DummyNativeSurface::new(
            &self.log,
            &self.screen,
            Backing::Fixed(size),
            config,
        )))
    }

    fn is_pixmap_supported(&self, pixmap: NativePixmap, config: &NativeConfig) -> bool {
        self.log
            .pixmaps
            .borrow()
            .get(&pixmap.0)
            .map(|(_, supported)| *supported == Some(config.id))
            .unwrap_or(false)
    }

    fn modeset(&self) -> Option<&dyn NativeModeset> {
        Some(&self.modeset)
    }
}

#[derive(Debug)]
pub struct DummyStApi {
    slot: ApiSlot,
    log: Rc<CallLog>,
}

impl StApi for DummyStApi {
    fn create_context(&self, visual: &Visual, _share: Option<&dyn StContext>) -> Option<Box<dyn StContext>> {
        if self.log.knobs.fail_st_context.get() {
            return None;
        }
        bump(&self.log.st_contexts_created);
        Some(Box::new(DummyStContext {
            slot: self.slot,
            log: self.log.clone(),
            visual: visual.clone(),
            texture: None,
        }))
    }

    fn make_current(
        &self,
        context: Option<&mut dyn StContext>,
        draw: Option<&Rc<Framebuffer>>,
        _read: Option<&Rc<Framebuffer>>,
    ) -> bool {
        if context.is_none() {
            bump(&self.log.st_unbinds);
            return !self.log.knobs.fail_unbind.get();
        }
        if self.log.knobs.fail_make_current.get() {
            return false;
        }
        bump(&self.log.st_binds);

        // validate the render buffer like a real state tracker would before drawing
        match draw {
            Some(draw) => draw.validate(&[draw.visual().render_buffer]).is_some(),
            None => true,
        }
    }
}

#[derive(Debug)]
pub struct DummyStContext {
    slot: ApiSlot,
    log: Rc<CallLog>,
    visual: Visual,
    texture: Option<ResourceRef>,
}

impl DummyStContext {
    pub fn slot(&self) -> ApiSlot {
        self.slot
    }

    pub fn visual(&self) -> &Visual {
        &self.visual
    }

    pub fn texture(&self) -> Option<&ResourceRef> {
        self.texture.as_ref()
    }
}

impl StContext for DummyStContext {
    fn flush(&mut self, _flags: FlushFlags, want_fence: bool) -> Option<FenceRef> {
        bump(&self.log.st_flushes);
        want_fence.then(|| fence(&self.log))
    }

    fn notify_invalid_framebuffer(&mut self, _framebuffer: &Rc<Framebuffer>) {
        bump(&self.log.st_invalidations);
    }

    fn supports_teximage(&self) -> bool {
        !self.log.knobs.no_teximage.get()
    }

    fn teximage(
        &mut self,
        _target: TextureType,
        _level: i32,
        _format: Format,
        resource: Option<&ResourceRef>,
        _mipmap: bool,
    ) -> bool {
        match resource {
            Some(resource) => {
                if self.log.knobs.fail_teximage.get() {
                    return false;
                }
                bump(&self.log.teximage_binds);
                self.texture = Some(resource.clone());
            }
            None => {
                bump(&self.log.teximage_releases);
                self.texture = None;
            }
        }
        true
    }
}

impl Drop for DummyStContext {
    fn drop(&mut self) {
        bump(&self.log.st_contexts_destroyed);
    }
}

/// Native config id of the double-buffered config
pub const DOUBLE_BUFFERED: u32 = 1;
/// Native config id of the single-buffered config
pub const SINGLE_BUFFERED: u32 = 2;

/// A complete set of dummy collaborators sharing one [`CallLog`]
#[derive(Debug)]
pub struct DummyDriver {
    pub log: Rc<CallLog>,
    apis: Vec<ApiSlot>,
}

impl DummyDriver {
    /// A driver with state trackers for every client API
    pub fn new() -> DummyDriver {
        DummyDriver::with_apis(&[
            ApiSlot::OpenGlEs1,
            ApiSlot::OpenGlEs2,
            ApiSlot::OpenGl,
            ApiSlot::OpenVg,
        ])
    }

    /// A driver built with the state trackers of `apis` only
    pub fn with_apis(apis: &[ApiSlot]) -> DummyDriver {
        DummyDriver {
            log: CallLog::new(),
            apis: apis.to_vec(),
        }
    }

    pub fn configs() -> Vec<NativeConfig> {
        vec![
            NativeConfig {
                id: DOUBLE_BUFFERED,
                buffer_mask: AttachmentMask::FRONT_LEFT | AttachmentMask::BACK_LEFT,
                color_format: Format::B8G8R8A8Unorm,
                depth_format: Format::Z24UnormS8Uscaled,
            },
            NativeConfig {
                id: SINGLE_BUFFERED,
                buffer_mask: AttachmentMask::FRONT_LEFT,
                color_format: Format::B8G8R8X8Unorm,
                depth_format: Format::None,
            },
        ]
    }

    /// Initializes a display on top of the dummy collaborators
    pub fn display(&self) -> Display {
        let screen = Rc::new(DummyScreen { log: self.log.clone() });
        let native = DummyNativeDisplay {
            log: self.log.clone(),
            screen: screen.clone(),
            modeset: DummyModeset {
                log: self.log.clone(),
                screen,
            },
        };
        let apis = self.apis.iter().fold(StApiTable::new(), |table, slot| {
            table.with(
                *slot,
                Rc::new(DummyStApi {
                    slot: *slot,
                    log: self.log.clone(),
                }),
            )
        });
        Display::new(Box::new(native), apis, DummyDriver::configs())
    }
}

impl Default for DummyDriver {
    fn default() -> Self {
        Self::new()
    }
}

