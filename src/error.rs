use thiserror::Error;

/// Main error type for the art-studio library
#[derive(Error, Debug)]
pub enum StudioError {
    #[error("Module error: {0}")]
    Module(#[from] ModuleError),

    #[error("Composition error: {0}")]
    Composition(#[from] CompositionError),

    #[error("Surface error: {0}")]
    Surface(#[from] SurfaceError),

    #[error("Audio processing error: {0}")]
    Audio(#[from] AudioError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Generic error: {0}")]
    Generic(String),
}

/// Module construction and configuration errors
#[derive(Error, Debug)]
pub enum ModuleError {
    #[error("Unknown option '{key}' for module type '{kind}'")]
    UnknownOption { kind: String, key: String },

    #[error("Invalid value for option '{key}' of module type '{kind}': {reason}")]
    InvalidOption {
        kind: String,
        key: String,
        reason: String,
    },

    #[error("Invalid module specification: {reason}")]
    InvalidSpec { reason: String },
}

/// Composition-specific errors
#[derive(Error, Debug)]
pub enum CompositionError {
    #[error("Composition record has no 'modules' list")]
    MissingModules,

    #[error("Malformed composition record: {reason}")]
    Malformed { reason: String },

    #[error("Failed to parse composition: {reason}")]
    ParseFailed { reason: String },

    #[error("Layer index {index} out of range for {len} layers")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Drawing surface errors
#[derive(Error, Debug)]
pub enum SurfaceError {
    #[error("Drawing surface unavailable at {width}x{height}")]
    Unavailable { width: u32, height: u32 },

    #[error("Image export failed: {reason}")]
    ExportFailed { reason: String },

    #[error("This surface does not hold pixels and cannot be exported")]
    ExportUnsupported,
}

/// Audio-specific errors
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Failed to load audio file: {path}")]
    LoadFailed { path: String },

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    #[error("Audio analysis failed: {reason}")]
    AnalysisFailed { reason: String },

    #[error("Invalid audio parameters: {details}")]
    InvalidParameters { details: String },
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path}")]
    ParseFailed { path: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {key}")]
    MissingKey { key: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Convenience type alias for Results using StudioError
pub type Result<T> = std::result::Result<T, StudioError>;

impl StudioError {
    /// Create a generic error with a custom message
    pub fn generic<S: Into<String>>(message: S) -> Self {
        Self::Generic(message.into())
    }

    /// Check if this error is recoverable (can be retried or skipped)
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Io(_) => true,
            Self::Audio(AudioError::LoadFailed { .. }) => true,
            // A bad option only affects the one module it belongs to
            Self::Module(_) => true,
            Self::Composition(CompositionError::IndexOutOfRange { .. }) => true,
            _ => false,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Audio(AudioError::LoadFailed { path }) => {
                format!("Could not load audio file '{}'. Please check the file exists and is a supported format.", path)
            }
            Self::Module(ModuleError::UnknownOption { kind, key }) => {
                format!("Module '{}' has no option named '{}'.", kind, key)
            }
            Self::Composition(CompositionError::MissingModules) => {
                "The composition file does not contain a module list.".to_string()
            }
            Self::Surface(SurfaceError::Unavailable { width, height }) => {
                format!("Cannot create a {}x{} canvas. Both dimensions must be non-zero.", width, height)
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_errors_are_recoverable() {
        let err: StudioError = ModuleError::InvalidOption {
            kind: "circles".to_string(),
            key: "count".to_string(),
            reason: "expected u32".to_string(),
        }
        .into();
        assert!(err.is_recoverable());

        let err: StudioError = CompositionError::MissingModules.into();
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_user_message() {
        let err: StudioError = SurfaceError::Unavailable { width: 0, height: 10 }.into();
        assert!(err.user_message().contains("0x10"));
    }
}
