//! GPU context: adapter/device ownership, capability checks, and the single
//! command stream every stage records into.
//!
//! Commands are recorded into one lazily created encoder. [`GpuContext::submit`]
//! hands the recorded work to the queue, which orders it after everything
//! submitted before; that is the barrier between dependent dispatches and draws.

use crate::config::BRDF_LUT_FORMAT;
use crate::error::{RendererError, Result};

/// Features the renderer cannot run without.
pub const REQUIRED_FEATURES: wgpu::Features =
    wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES;

/// Compute kernels run 32x32 invocations per workgroup.
pub const REQUIRED_INVOCATIONS_PER_WORKGROUP: u32 = 1024;
pub const REQUIRED_WORKGROUP_EDGE: u32 = 32;

pub struct GpuContext {
    pub adapter: wgpu::Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    encoder: Option<wgpu::CommandEncoder>,
}

impl GpuContext {
    /// Create an instance with validation enabled when `debug` is set.
    pub fn create_instance(debug: bool) -> wgpu::Instance {
        wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            flags: if debug {
                wgpu::InstanceFlags::debugging()
            } else {
                wgpu::InstanceFlags::empty()
            },
            ..Default::default()
        })
    }

    /// Pick an adapter (compatible with `surface` when given) and open a device
    /// with the features and limits the renderer depends on.
    pub fn new(
        instance: &wgpu::Instance,
        surface: Option<&wgpu::Surface<'_>>,
        debug: bool,
    ) -> Result<Self> {
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: surface,
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| {
            RendererError::ContextCreationFailed("no suitable GPU adapter found".into())
        })?;

        let info = adapter.get_info();
        log::info!("GPU adapter: {} ({:?}, {:?})", info.name, info.device_type, info.backend);

        let required_limits = required_limits(&adapter.limits())?;
        check_features(adapter.features())?;
        check_storage_format(&adapter, BRDF_LUT_FORMAT)?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("PBR Demo Device"),
                required_features: REQUIRED_FEATURES,
                required_limits,
                memory_hints: wgpu::MemoryHints::default(),
            },
            None,
        ))
        .map_err(device_request_failed)?;

        if debug {
            device.on_uncaptured_error(Box::new(|error: wgpu::Error| {
                log::error!("GPU error: {error}");
            }));
        }

        Ok(Self { adapter, device, queue, encoder: None })
    }

    /// Context without a presentation surface.
    pub fn headless(debug: bool) -> Result<Self> {
        Self::new(&Self::create_instance(debug), None, debug)
    }

    /// The encoder recording the current batch of commands.
    pub fn encoder(&mut self) -> &mut wgpu::CommandEncoder {
        let device = &self.device;
        self.encoder.get_or_insert_with(|| {
            device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("PBR Demo Commands"),
            })
        })
    }

    /// Submit recorded commands, if any.
    pub fn submit(&mut self) {
        if let Some(encoder) = self.encoder.take() {
            self.queue.submit(std::iter::once(encoder.finish()));
        }
    }

    /// Make results of all previously recorded shader writes visible to later commands.
    pub fn memory_barrier(&mut self) {
        self.submit();
    }

    /// Submit and block until the device has executed everything.
    pub fn finish(&mut self) {
        self.submit();
        self.device.poll(wgpu::Maintain::Wait);
    }

    /// Update a uniform buffer so that previously recorded commands still see the old value.
    pub fn write_buffer(&mut self, buffer: &wgpu::Buffer, data: &[u8]) {
        self.submit();
        self.queue.write_buffer(buffer, 0, data);
    }

    /// Run `f` inside validation and out-of-memory error scopes.
    pub fn capture_errors<T>(&self, f: impl FnOnce(&wgpu::Device) -> T) -> (T, Option<wgpu::Error>) {
        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let value = f(&self.device);
        let validation = pollster::block_on(self.device.pop_error_scope());
        let out_of_memory = pollster::block_on(self.device.pop_error_scope());
        (value, validation.or(out_of_memory))
    }

    /// Like [`capture_errors`](Self::capture_errors), mapping a captured error to
    /// [`RendererError::ResourceCreationFailed`].
    pub fn create_resource<T>(
        &self,
        resource: &'static str,
        f: impl FnOnce(&wgpu::Device) -> T,
    ) -> Result<T> {
        match self.capture_errors(f) {
            (value, None) => Ok(value),
            (_, Some(error)) => Err(RendererError::ResourceCreationFailed {
                resource,
                reason: error.to_string(),
            }),
        }
    }
}

/// The adapter refused the requested features or limits.
fn device_request_failed(error: impl std::fmt::Display) -> RendererError {
    RendererError::ExtensionLoadFailed(format!("failed to create device: {error}"))
}

fn check_features(available: wgpu::Features) -> Result<()> {
    let missing = REQUIRED_FEATURES - available;
    if missing.is_empty() {
        Ok(())
    } else {
        Err(RendererError::ExtensionLoadFailed(format!("missing device features {missing:?}")))
    }
}

/// Default limits raised to what the compute kernels need, if the adapter allows it.
pub fn required_limits(adapter: &wgpu::Limits) -> Result<wgpu::Limits> {
    let checks = [
        (
            "max_compute_invocations_per_workgroup",
            adapter.max_compute_invocations_per_workgroup,
            REQUIRED_INVOCATIONS_PER_WORKGROUP,
        ),
        (
            "max_compute_workgroup_size_x",
            adapter.max_compute_workgroup_size_x,
            REQUIRED_WORKGROUP_EDGE,
        ),
        (
            "max_compute_workgroup_size_y",
            adapter.max_compute_workgroup_size_y,
            REQUIRED_WORKGROUP_EDGE,
        ),
    ];
    if let Some((name, have, need)) = checks.iter().find(|(_, have, need)| have < need) {
        return Err(RendererError::ExtensionLoadFailed(format!(
            "{name} is {have}, need {need}"
        )));
    }

    let defaults = wgpu::Limits::default();
    Ok(wgpu::Limits {
        max_compute_invocations_per_workgroup: defaults
            .max_compute_invocations_per_workgroup
            .max(REQUIRED_INVOCATIONS_PER_WORKGROUP),
        max_compute_workgroup_size_x: defaults
            .max_compute_workgroup_size_x
            .max(REQUIRED_WORKGROUP_EDGE),
        max_compute_workgroup_size_y: defaults
            .max_compute_workgroup_size_y
            .max(REQUIRED_WORKGROUP_EDGE),
        ..defaults
    }
    .using_resolution(adapter.clone()))
}

fn check_storage_format(adapter: &wgpu::Adapter, format: wgpu::TextureFormat) -> Result<()> {
    let features = adapter.get_texture_format_features(format);
    if features.allowed_usages.contains(wgpu::TextureUsages::STORAGE_BINDING) {
        Ok(())
    } else {
        Err(RendererError::ExtensionLoadFailed(format!(
            "{format:?} cannot be written from compute shaders"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limits_raised_for_capable_adapter() {
        let capable = wgpu::Limits {
            max_compute_invocations_per_workgroup: 1024,
            max_compute_workgroup_size_x: 1024,
            max_compute_workgroup_size_y: 1024,
            ..wgpu::Limits::default()
        };
        let limits = required_limits(&capable).unwrap();
        assert_eq!(limits.max_compute_invocations_per_workgroup, 1024);
        assert!(limits.max_compute_workgroup_size_x >= 32);
        assert!(limits.max_compute_workgroup_size_y >= 32);
        assert!(limits.check_limits(&capable));
    }

    #[test]
    fn test_insufficient_adapter_limits() {
        let weak = wgpu::Limits {
            max_compute_invocations_per_workgroup: 256,
            ..wgpu::Limits::default()
        };
        let err = required_limits(&weak).unwrap_err();
        assert!(matches!(err, RendererError::ExtensionLoadFailed(msg) if msg.contains("invocations")));
    }

    #[test]
    fn test_refused_device_is_extension_failure() {
        let err = device_request_failed("limit exceeded");
        assert!(matches!(err, RendererError::ExtensionLoadFailed(msg) if msg.contains("limit exceeded")));
    }

    #[test]
    fn test_missing_feature_reported() {
        assert!(check_features(wgpu::Features::empty()).is_err());
        assert!(check_features(REQUIRED_FEATURES).is_ok());
    }
}
