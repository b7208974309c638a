//! PBR demo renderer: C FFI entry points for native windowing hosts.
//!
//! This crate is compiled as a cdylib. All public functions use `extern "C"`
//! ABI with `#[no_mangle]`. Functions return a handle (`0` on failure) or a
//! status code (`0` on success, `-1` on failure); the message of the last
//! failure on a handle is available from [`pbr_last_error`].

pub mod assets;
mod handle;

use std::ffi::{c_char, c_void, CStr, CString};
use std::sync::{LazyLock, Mutex, MutexGuard};

use assets::FileAssets;
use handle::HandleStore;
use pbrdemo_render::{ConfiguredRenderer, Renderer, RendererConfig, ViewSettings};

/// Default log filter: renderer milestones, but only warnings from wgpu internals.
const DEFAULT_LOG_FILTER: &str = "info,wgpu_core=warn,wgpu_hal=warn,naga=warn";

static RENDERERS: LazyLock<Mutex<HandleStore<RendererState>>> =
    LazyLock::new(|| Mutex::new(HandleStore::new()));

enum Stage {
    Initialized(Renderer),
    Configured(ConfiguredRenderer),
}

struct RendererState {
    /// `None` once a failed setup has consumed the renderer.
    stage: Option<Stage>,
    last_error: Option<CString>,
}

impl RendererState {
    fn fail(&mut self, message: impl Into<String>) -> i32 {
        let message = message.into();
        log::error!("{message}");
        self.last_error = CString::new(message.replace('\0', " ")).ok();
        -1
    }
}

fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(DEFAULT_LOG_FILTER))
        .try_init();
}

fn renderers() -> MutexGuard<'static, HandleStore<RendererState>> {
    // A panic while holding the lock leaves the store itself consistent.
    RENDERERS.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn renderer_config(width: i32, height: i32, samples: i32, vsync: bool) -> Result<RendererConfig, String> {
    let dimension = |name: &str, value: i32| {
        u32::try_from(value).map_err(|_| format!("invalid {name} {value}"))
    };
    Ok(RendererConfig {
        width: dimension("width", width)?,
        height: dimension("height", height)?,
        samples: dimension("sample count", samples)?,
        vsync,
        debug: cfg!(debug_assertions),
        ..Default::default()
    })
}

fn register(result: Result<Renderer, String>) -> u64 {
    match result {
        Ok(renderer) => renderers().insert(RendererState {
            stage: Some(Stage::Initialized(renderer)),
            last_error: None,
        }),
        Err(e) => {
            log::error!("Renderer initialization failed: {e}");
            0
        }
    }
}

// ============================================================
// Window handle wrappers for raw-window-handle integration
// ============================================================

/// Xlib window and display pointer.
#[cfg(target_os = "linux")]
struct X11WindowHandle {
    window: u64,
    display: *mut c_void,
}

// The host owns the window and keeps it alive until `pbr_shutdown`.
#[cfg(target_os = "linux")]
unsafe impl Send for X11WindowHandle {}
#[cfg(target_os = "linux")]
unsafe impl Sync for X11WindowHandle {}

#[cfg(target_os = "linux")]
impl raw_window_handle::HasWindowHandle for X11WindowHandle {
    fn window_handle(&self) -> Result<raw_window_handle::WindowHandle<'_>, raw_window_handle::HandleError> {
        let raw = raw_window_handle::RawWindowHandle::Xlib(raw_window_handle::XlibWindowHandle::new(self.window as _));
        Ok(unsafe { raw_window_handle::WindowHandle::borrow_raw(raw) })
    }
}

#[cfg(target_os = "linux")]
impl raw_window_handle::HasDisplayHandle for X11WindowHandle {
    fn display_handle(&self) -> Result<raw_window_handle::DisplayHandle<'_>, raw_window_handle::HandleError> {
        let raw = raw_window_handle::RawDisplayHandle::Xlib(raw_window_handle::XlibDisplayHandle::new(
            std::ptr::NonNull::new(self.display),
            0,
        ));
        Ok(unsafe { raw_window_handle::DisplayHandle::borrow_raw(raw) })
    }
}

/// Win32 HWND.
#[cfg(target_os = "windows")]
struct Win32WindowHandle {
    hwnd: *mut c_void,
}

#[cfg(target_os = "windows")]
unsafe impl Send for Win32WindowHandle {}
#[cfg(target_os = "windows")]
unsafe impl Sync for Win32WindowHandle {}

#[cfg(target_os = "windows")]
impl raw_window_handle::HasWindowHandle for Win32WindowHandle {
    fn window_handle(&self) -> Result<raw_window_handle::WindowHandle<'_>, raw_window_handle::HandleError> {
        let hwnd = std::num::NonZeroIsize::new(self.hwnd as isize)
            .ok_or(raw_window_handle::HandleError::Unavailable)?;
        let raw = raw_window_handle::RawWindowHandle::Win32(raw_window_handle::Win32WindowHandle::new(hwnd));
        Ok(unsafe { raw_window_handle::WindowHandle::borrow_raw(raw) })
    }
}

#[cfg(target_os = "windows")]
impl raw_window_handle::HasDisplayHandle for Win32WindowHandle {
    fn display_handle(&self) -> Result<raw_window_handle::DisplayHandle<'_>, raw_window_handle::HandleError> {
        let raw = raw_window_handle::RawDisplayHandle::Windows(raw_window_handle::WindowsDisplayHandle::new());
        Ok(unsafe { raw_window_handle::DisplayHandle::borrow_raw(raw) })
    }
}

// ============================================================
// FFI: Lifecycle
// ============================================================

/// Initialize a renderer presenting to a native window.
///
/// On Linux: `window_handle` is the X11 Window, `display_handle` is the X11 Display*.
/// On Windows: `window_handle` is the HWND, `display_handle` is unused.
/// `samples` is the MSAA sample count, 0 for none.
///
/// Returns a renderer handle (> 0) on success, 0 on failure.
#[no_mangle]
pub extern "C" fn pbr_initialize(
    window_handle: u64,
    display_handle: *mut c_void,
    width: i32,
    height: i32,
    samples: i32,
    vsync: i32,
) -> u64 {
    init_logging();

    let config = match renderer_config(width, height, samples, vsync != 0) {
        Ok(config) => config,
        Err(e) => return register(Err(e)),
    };

    #[cfg(target_os = "linux")]
    let result = {
        let window = X11WindowHandle { window: window_handle, display: display_handle };
        Renderer::initialize(window, &config).map_err(|e| e.to_string())
    };

    #[cfg(target_os = "windows")]
    let result = {
        let _ = display_handle;
        let window = Win32WindowHandle { hwnd: window_handle as *mut c_void };
        Renderer::initialize(window, &config).map_err(|e| e.to_string())
    };

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    let result: Result<Renderer, String> = {
        let _ = (window_handle, display_handle, config);
        Err("Unsupported platform".into())
    };

    register(result)
}

/// Initialize a renderer drawing into an offscreen texture.
///
/// Returns a renderer handle (> 0) on success, 0 on failure.
#[no_mangle]
pub extern "C" fn pbr_initialize_headless(width: i32, height: i32, samples: i32) -> u64 {
    init_logging();
    register(
        renderer_config(width, height, samples, false)
            .and_then(|config| Renderer::initialize_headless(&config).map_err(|e| e.to_string())),
    )
}

/// Load assets from `asset_root` (a NUL-terminated UTF-8 path) and precompute
/// the environment lighting. Blocks until the GPU work is done.
///
/// Returns 0 on success, -1 on failure. A failed setup leaves the handle unusable
/// except for `pbr_last_error` and `pbr_shutdown`.
#[no_mangle]
pub extern "C" fn pbr_setup(renderer: u64, asset_root: *const c_char) -> i32 {
    let mut store = renderers();
    let Some(state) = store.get_mut(renderer) else {
        return -1;
    };
    if asset_root.is_null() {
        return state.fail("asset root is null");
    }
    // SAFETY: the caller passes a valid NUL-terminated string.
    let root = match unsafe { CStr::from_ptr(asset_root) }.to_str() {
        Ok(root) => root.to_owned(),
        Err(e) => return state.fail(format!("asset root is not UTF-8: {e}")),
    };

    let initialized = match state.stage.take() {
        Some(Stage::Initialized(initialized)) => initialized,
        other => {
            state.stage = other;
            return state.fail("setup must run exactly once, after initialization");
        }
    };

    let assets = FileAssets::new(root);
    match initialized.setup(&assets) {
        Ok(configured) => {
            state.stage = Some(Stage::Configured(configured));
            state.last_error = None;
            0
        }
        Err(e) => state.fail(format!("Setup failed: {e}")),
    }
}

/// Draw and present one frame for the given orbit camera (angles in degrees).
///
/// Returns 0 on success, -1 if the renderer is not set up.
#[no_mangle]
pub extern "C" fn pbr_render(renderer: u64, pitch: f32, yaw: f32, distance: f32, fov: f32) -> i32 {
    let mut store = renderers();
    let Some(state) = store.get_mut(renderer) else {
        return -1;
    };
    if let Some(Stage::Configured(configured)) = &mut state.stage {
        configured.render(&ViewSettings { pitch, yaw, distance, fov });
        return 0;
    }
    state.fail("render called before a successful setup")
}

/// Release every GPU resource of the renderer and invalidate its handle.
#[no_mangle]
pub extern "C" fn pbr_shutdown(renderer: u64) {
    let Some(state) = renderers().remove(renderer) else {
        return;
    };
    match state.stage {
        Some(Stage::Initialized(initialized)) => initialized.shutdown(),
        Some(Stage::Configured(configured)) => configured.shutdown(),
        None => {}
    }
}

/// The message of the last failure on `renderer`, or null.
///
/// The pointer stays valid until the next call on the same handle.
#[no_mangle]
pub extern "C" fn pbr_last_error(renderer: u64) -> *const c_char {
    renderers()
        .get(renderer)
        .and_then(|state| state.last_error.as_ref())
        .map_or(std::ptr::null(), |message| message.as_ptr())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renderer_config_rejects_negative_sizes() {
        assert!(renderer_config(-1, 64, 0, true).is_err());
        assert!(renderer_config(64, 64, -4, true).is_err());

        let config = renderer_config(640, 480, 4, false).unwrap();
        assert_eq!((config.width, config.height, config.samples), (640, 480, 4));
        assert!(!config.vsync);
    }

    #[test]
    fn test_unknown_handles_fail() {
        assert_eq!(pbr_render(u64::MAX, 0.0, 0.0, 150.0, 45.0), -1);
        assert_eq!(pbr_setup(u64::MAX, std::ptr::null()), -1);
        assert!(pbr_last_error(u64::MAX).is_null());
        pbr_shutdown(u64::MAX);
    }

    #[test]
    fn test_failure_message_is_kept() {
        let mut state = RendererState { stage: None, last_error: None };
        assert_eq!(state.fail("broken\0message"), -1);
        assert_eq!(state.last_error.as_deref().and_then(|m| m.to_str().ok()), Some("broken message"));
    }
}
