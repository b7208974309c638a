//! Error kinds of the rendering core.
//!
//! Every fallible operation returns [`Result`]. The first failure during
//! initialization or setup aborts that stage; there is no retry or partial
//! recovery.

use thiserror::Error;

use crate::resources::FramebufferStatus;

#[derive(Debug, Error)]
pub enum RendererError {
    /// No window or device could be obtained.
    #[error("failed to create GPU context: {0}")]
    ContextCreationFailed(String),

    /// The device lacks a required feature, limit, or format capability.
    #[error("required GPU capability unavailable: {0}")]
    ExtensionLoadFailed(String),

    /// The shader source provider returned nothing for this id.
    #[error("shader source '{source_id}' is missing or empty")]
    ShaderSourceMissing { source_id: String },

    #[error("failed to compile shader '{source_id}':\n{log}")]
    ShaderCompileFailed { source_id: String, log: String },

    #[error("failed to link program:\n{log}")]
    ProgramLinkFailed { log: String },

    #[error("failed to create {resource}: {reason}")]
    ResourceCreationFailed { resource: &'static str, reason: String },

    #[error("framebuffer incomplete: {status:?}")]
    FramebufferIncomplete { status: FramebufferStatus },

    /// A mesh or image provider could not deliver the requested asset.
    #[error("failed to load asset '{id}': {reason}")]
    AssetLoad { id: String, reason: String },
}

pub type Result<T> = std::result::Result<T, RendererError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_error_message_carries_log() {
        let err = RendererError::ShaderCompileFailed {
            source_id: "pbr_fs".into(),
            log: "error: expected ';'".into(),
        };
        let message = err.to_string();
        assert!(message.contains("pbr_fs"));
        assert!(message.contains("expected ';'"));
    }

    #[test]
    fn test_framebuffer_status_in_message() {
        let err = RendererError::FramebufferIncomplete {
            status: FramebufferStatus::UnsupportedSampleCount,
        };
        assert!(err.to_string().contains("UnsupportedSampleCount"));
    }
}
