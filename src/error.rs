//! Error types for backdrop.
//!
//! The animation itself never fails: a missing canvas, a failed layout read or a
//! degenerate viewport all degrade silently inside the engine. The types here cover
//! the surfaces around it: configuration loading, GPU setup, the native window host
//! and headless snapshots.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while parsing CSS color strings.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ColorError {
    /// The string is not one of `rgb(...)`, `rgba(...)`, `#rrggbb` or `#rrggbbaa`.
    #[error("unrecognized color syntax: {0:?}")]
    Malformed(String),
    /// A channel could not be parsed or lies outside its range.
    #[error("color channel out of range in {0:?}")]
    OutOfRange(String),
}

/// Errors that can occur while loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The configuration is not valid JSON or has the wrong shape.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    /// A field holds a value the engine cannot run with.
    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Errors that can occur during GPU initialization.
#[derive(Debug, Error)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    #[error("failed to create GPU surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    #[error("no compatible GPU adapter found")]
    NoAdapter,
    /// The surface supports no texture format on this adapter.
    #[error("surface has no supported texture format")]
    NoSurfaceFormat,
    /// Failed to create GPU device.
    #[error("failed to create GPU device: {0}")]
    DeviceCreation(#[from] wgpu::RequestDeviceError),
}

/// Errors that can occur when running the native window host.
#[derive(Debug, Error)]
pub enum HostError {
    /// Failed to create or run the event loop.
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    /// Failed to create the window.
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    /// The configuration was rejected before the window opened.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors that can occur while rendering a headless snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The engine refused to mount (viewport below the disable threshold).
    #[error("effect is disabled for a {width}px wide viewport")]
    Disabled { width: f32 },
    /// Encoding or writing the image failed.
    #[error("failed to write snapshot: {0}")]
    Image(#[from] image::ImageError),
}
