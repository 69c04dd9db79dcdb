use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for all Capsule launcher operations.
///
/// Each variant corresponds to one of the error kinds named in the error
/// handling design: a failure surfaces as a one-line message plus a hint to
/// re-run with `CAPSULE_LOG=debug` for the full trace.
#[derive(Debug, Error, Diagnostic)]
pub enum CapsuleError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The archive could not be opened or is not a valid ZIP-family container.
    #[error("Invalid archive: {message}")]
    #[diagnostic(help("re-run with CAPSULE_LOG=debug for the full trace"))]
    InvalidArchive { message: String },

    /// The manifest index is malformed, or violates a structural rule
    /// (e.g. an identity attribute outside the main section).
    #[error("Invalid manifest: {message}")]
    #[diagnostic(help("re-run with CAPSULE_LOG=debug for the full trace"))]
    InvalidManifest { message: String },

    /// Neither `Application-Class` nor an artifact main class could be
    /// determined.
    #[error("No entrypoint: {message}")]
    #[diagnostic(help("set Application-Class or Application in the manifest"))]
    MissingEntrypoint { message: String },

    /// An attribute was used in a way its declared mode disallows (e.g. a
    /// `$CAPSULE_DIR` reference with extraction disabled).
    #[error("Attribute misuse: {message}")]
    #[diagnostic(help("re-run with CAPSULE_LOG=debug for the full trace"))]
    AttributeMisuse { message: String },

    /// The application cache could not be read, written, or locked.
    #[error("Cache I/O failure: {message}")]
    #[diagnostic(help("re-run with CAPSULE_LOG=debug for the full trace"))]
    CacheIoFailure { message: String },

    /// No installed runtime satisfies the manifest's declared constraints.
    #[error("No matching runtime: {message}")]
    #[diagnostic(help("install a compatible JVM or set CAPSULE_JAVA_HOME"))]
    NoMatchingRuntime { message: String },

    /// The external dependency resolver reported a failure.
    #[error("Resolver failure: {message}")]
    #[diagnostic(help("re-run with CAPSULE_LOG=debug for the full trace"))]
    ResolverFailure { message: String },

    /// A declared coordinate could not be resolved to any artifact.
    #[error("Dependency not found: {message}")]
    DependencyNotFound { message: String },

    /// A coordinate with no version matched more than one embedded
    /// artifact, or zero.
    #[error("Ambiguous dependency: {message}")]
    DependencyAmbiguous { message: String },

    /// The child process could not be spawned.
    #[error("Failed to spawn child process: {message}")]
    ChildSpawnFailure { message: String },

    /// The child process exited with a non-zero status.
    #[error("Child process exited with code {code}")]
    ChildCrash { code: i32 },

    /// Waiting for the child process was interrupted.
    #[error("Interrupted while waiting for child: {message}")]
    InterruptedWait { message: String },

    /// Catch-all for miscellaneous errors.
    #[error("{message}")]
    Generic { message: String },
}

/// Convenience alias for `miette::Result<T>`.
pub type CapsuleResult<T> = miette::Result<T>;
