use std::path::PathBuf;

/// Failures a tool reports back to the model instead of propagating.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Path is not a file: {}", .0.display())]
    NotAFile(PathBuf),

    #[error("Permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),

    #[error("Cannot read file as text (binary file?): {}", .0.display())]
    DecodeError(PathBuf),

    #[error("File already exists: {}. Use Edit tool to modify existing files.", .0.display())]
    AlreadyExists(PathBuf),

    #[error("String not found in file: '{preview}'")]
    StringNotFound { preview: String },

    #[error(
        "String found {count} times in file. It must be unique. Add more context to make it unique."
    )]
    AmbiguousMatch { count: usize },

    #[error("Command timed out after {secs} seconds.")]
    Timeout { secs: u64 },

    #[error("Command exited with code {code}{}", stderr_suffix(.stderr))]
    NonZeroExit { code: i32, stderr: String },

    #[error("Failed to execute command: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ToolError {
    /// Maps an I/O error on `path` onto the matching tool failure.
    pub fn from_io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        let path = path.into();
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            std::io::ErrorKind::AlreadyExists => Self::AlreadyExists(path),
            std::io::ErrorKind::InvalidData => Self::DecodeError(path),
            _ => Self::Io { path, source: err },
        }
    }
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}

/// Transport-level failures. These are never fed back to the model; they
/// abort the current `send_message` call.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("configuration error: {0}")]
    Configuration(String),
}
