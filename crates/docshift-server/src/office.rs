//! Office-suite (LibreOffice) resolution and invocation
//!
//! [`OfficeSuite`] has two calling conventions. [`run_conversion`] prefers
//! [`OfficeSuite::convert_with_options`] and falls back to
//! [`OfficeSuite::convert`] only when the implementation does not support
//! options. [`Soffice`] runs the real binary in headless mode.

use crate::config::ServerConfig;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Hint attached to failures that look like a missing installation
pub const INSTALL_HINT: &str =
    "Install LibreOffice (https://www.libreoffice.org/download/) or set SOFFICE_PATH to the soffice binary";

/// Hint for a binary that is installed but not visible to the server
pub const PATH_HINT: &str = "Make sure the soffice binary is on the PATH of the server process";

/// Uploaded document handed to the office suite
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OfficeInput<'a> {
    /// Client-supplied file name (sanitized before touching the disk)
    pub file_name: &'a str,
    /// Validated source extension, without the dot
    pub source_ext: &'a str,
    pub bytes: &'a [u8],
}

/// Converted bytes and the binary that produced them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfficeOutput {
    pub bytes: Vec<u8>,
    pub bin: String,
}

/// Options for the preferred calling convention
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Delay between checks for the output file
    pub poll_interval: Duration,
    /// Number of checks for the output file
    pub attempts: u32,
    /// Binaries to try, in order, until one starts
    pub binary_paths: Vec<PathBuf>,
}

impl ConvertOptions {
    /// Options from the server configuration, with the platform candidate list
    #[must_use = "creates conversion options"]
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            poll_interval: config.poll_interval,
            attempts: config.poll_attempts,
            binary_paths: candidate_paths(config.soffice_path.as_deref()),
        }
    }
}

/// Office-suite failures
#[derive(Debug, Error)]
pub enum OfficeError {
    #[error("LibreOffice binary not found")]
    BinaryNotFound { tried: Vec<String> },

    #[error("Failed to start {bin}: {source}")]
    Spawn {
        bin: String,
        source: std::io::Error,
        tried: Vec<String>,
    },

    #[error("{bin} failed ({status}): {stderr}")]
    Failed {
        bin: String,
        status: String,
        stderr: String,
        tried: Vec<String>,
    },

    #[error("{bin} did not finish within {} seconds", .timeout.as_secs())]
    Timeout {
        bin: String,
        timeout: Duration,
        tried: Vec<String>,
    },

    #[error("{bin} produced no .{ext} output")]
    MissingOutput {
        bin: String,
        ext: String,
        tried: Vec<String>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl OfficeError {
    /// Binary paths attempted before the failure
    #[must_use]
    pub fn tried(&self) -> &[String] {
        match self {
            Self::BinaryNotFound { tried }
            | Self::Spawn { tried, .. }
            | Self::Failed { tried, .. }
            | Self::Timeout { tried, .. }
            | Self::MissingOutput { tried, .. } => tried,
            Self::Io(_) => &[],
        }
    }

    /// Binary involved in the failure, when one was started
    #[must_use]
    pub fn bin(&self) -> Option<&str> {
        match self {
            Self::Spawn { bin, .. }
            | Self::Failed { bin, .. }
            | Self::Timeout { bin, .. }
            | Self::MissingOutput { bin, .. } => Some(bin),
            Self::BinaryNotFound { .. } | Self::Io(_) => None,
        }
    }

    /// Server-side failure unrelated to the office suite
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Io(_))
    }

    /// Remediation hints, ending with the list of attempted binaries
    #[must_use]
    pub fn hints(&self) -> Vec<String> {
        let looks_missing = match self {
            Self::BinaryNotFound { .. } => true,
            Self::Spawn { source, .. } => is_missing_binary(source),
            Self::Failed { stderr, .. } => stderr.to_lowercase().contains("not found"),
            _ => false,
        };

        let mut hints = Vec::new();
        if looks_missing {
            hints.push(INSTALL_HINT.to_string());
            hints.push(PATH_HINT.to_string());
        }
        if !self.tried().is_empty() {
            hints.push(format!("Tried: {}", self.tried().join(", ")));
        }
        hints
    }
}

/// An office suite able to convert documents
#[async_trait]
pub trait OfficeSuite: Send + Sync {
    /// Convert `input` to the format with extension `ext`
    async fn convert(&self, input: OfficeInput<'_>, ext: &str) -> Result<OfficeOutput, OfficeError>;

    /// Convert with explicit polling and binary candidates
    ///
    /// Returns `None` when the implementation does not support options.
    async fn convert_with_options(
        &self,
        _input: OfficeInput<'_>,
        _ext: &str,
        _options: &ConvertOptions,
    ) -> Option<Result<OfficeOutput, OfficeError>> {
        None
    }
}

/// Convert through exactly one calling convention, options first
///
/// # Errors
///
/// Returns the failure of the convention that was used.
pub async fn run_conversion(
    suite: &dyn OfficeSuite,
    input: OfficeInput<'_>,
    ext: &str,
    options: &ConvertOptions,
) -> Result<OfficeOutput, OfficeError> {
    if let Some(result) = suite.convert_with_options(input, ext, options).await {
        return result;
    }
    debug!("Office suite does not take options, using plain convert");
    suite.convert(input, ext).await
}

/// Binary candidates: the explicit path, platform install locations, then bare names for `PATH`
#[must_use]
pub fn candidate_paths(explicit: Option<&Path>) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = explicit.map(Path::to_path_buf).into_iter().collect();

    if cfg!(windows) {
        for (var, default) in [
            ("ProgramFiles", r"C:\Program Files"),
            ("ProgramFiles(x86)", r"C:\Program Files (x86)"),
        ] {
            let root = std::env::var(var).unwrap_or_else(|_| default.to_string());
            paths.push(
                PathBuf::from(root)
                    .join("LibreOffice")
                    .join("program")
                    .join("soffice.exe"),
            );
        }
    } else if cfg!(target_os = "macos") {
        paths.push(PathBuf::from("/Applications/LibreOffice.app/Contents/MacOS/soffice"));
    } else {
        paths.extend(
            ["/usr/bin/soffice", "/usr/bin/libreoffice", "/usr/local/bin/soffice"]
                .into_iter()
                .map(PathBuf::from),
        );
        paths.extend(opt_installs(Path::new("/opt")));
        paths.push(PathBuf::from("/snap/bin/libreoffice"));
    }

    paths.push(PathBuf::from("soffice"));
    paths.push(PathBuf::from("libreoffice"));

    let mut seen = std::collections::HashSet::new();
    paths.retain(|p| seen.insert(p.clone()));
    paths
}

/// `<root>/libreoffice*/program/soffice`, newest version first
fn opt_installs(root: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(root) else {
        return Vec::new();
    };
    let mut dirs: Vec<(Vec<u64>, PathBuf)> = entries
        .flatten()
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().into_owned();
            let version = name.strip_prefix("libreoffice").map(install_version)?;
            Some((version, entry.path()))
        })
        .collect();
    dirs.sort_by(|a, b| b.cmp(a));
    dirs.into_iter()
        .map(|(_, dir)| dir.join("program").join("soffice"))
        .collect()
}

/// Numeric components of an install suffix (`"24.2"` is `[24, 2]`)
fn install_version(suffix: &str) -> Vec<u64> {
    suffix
        .split(|c: char| !c.is_ascii_digit())
        .filter(|part| !part.is_empty())
        .filter_map(|part| part.parse().ok())
        .collect()
}

fn is_missing_binary(err: &std::io::Error) -> bool {
    matches!(
        err.kind(),
        std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied
    )
}

/// File name safe to place in the working directory
fn safe_file_name(name: &str) -> String {
    let base = Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Staged input name: sanitized stem plus the validated source extension
fn staged_file_name(name: &str, source_ext: &str) -> String {
    let safe = safe_file_name(name);
    let ext: String = source_ext.chars().filter(char::is_ascii_alphanumeric).collect();
    if ext.is_empty() {
        return safe;
    }
    let stem = Path::new(&safe)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("upload");
    format!("{stem}.{ext}")
}

/// `file://` URL for the `-env:UserInstallation` switch
fn file_url(path: &Path) -> String {
    let s = path.to_string_lossy().replace('\\', "/").replace(' ', "%20");
    if s.starts_with('/') {
        format!("file://{s}")
    } else {
        format!("file:///{s}")
    }
}

/// Per-call temp directory with input, output and profile subdirectories
struct Workspace {
    _dir: tempfile::TempDir,
    input: PathBuf,
    outdir: PathBuf,
    profile: PathBuf,
}

impl Workspace {
    async fn stage(input: OfficeInput<'_>) -> Result<Self, OfficeError> {
        let dir = tempfile::Builder::new().prefix("docshift-").tempdir()?;
        let indir = dir.path().join("in");
        let outdir = dir.path().join("out");
        let profile = dir.path().join("profile");
        for sub in [&indir, &outdir, &profile] {
            tokio::fs::create_dir_all(sub).await?;
        }
        let input_path = indir.join(staged_file_name(input.file_name, input.source_ext));
        tokio::fs::write(&input_path, input.bytes).await?;
        Ok(Self {
            _dir: dir,
            input: input_path,
            outdir,
            profile,
        })
    }

    /// Where the office suite writes its result (`ext` may carry a `:filter` suffix)
    fn output_path(&self, ext: &str) -> PathBuf {
        let stem = self
            .input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("upload");
        let ext = ext.split(':').next().unwrap_or(ext);
        self.outdir.join(format!("{stem}.{ext}"))
    }
}

enum RunOutcome {
    Finished,
    NotFound(std::io::Error),
    SpawnFailed(std::io::Error),
    Failed { status: String, stderr: String },
    TimedOut,
}

async fn run_once(bin: &Path, workspace: &Workspace, ext: &str, timeout: Duration) -> RunOutcome {
    let mut command = Command::new(bin);
    command
        .arg(format!("-env:UserInstallation={}", file_url(&workspace.profile)))
        .args(["--headless", "--norestore", "--convert-to", ext, "--outdir"])
        .arg(&workspace.outdir)
        .arg(&workspace.input)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = match command.spawn() {
        Ok(child) => child,
        Err(e) if is_missing_binary(&e) => return RunOutcome::NotFound(e),
        Err(e) => return RunOutcome::SpawnFailed(e),
    };

    // Dropping the future on timeout drops the child, which kills it
    match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) if output.status.success() => RunOutcome::Finished,
        Ok(Ok(output)) => RunOutcome::Failed {
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        },
        Ok(Err(e)) => RunOutcome::SpawnFailed(e),
        Err(_) => RunOutcome::TimedOut,
    }
}

async fn wait_for_output(path: &Path, attempts: u32, interval: Duration) -> Option<Vec<u8>> {
    let attempts = attempts.max(1);
    for attempt in 1..=attempts {
        if let Ok(bytes) = tokio::fs::read(path).await {
            if !bytes.is_empty() {
                return Some(bytes);
            }
        }
        if attempt < attempts {
            tokio::time::sleep(interval).await;
        }
    }
    None
}

/// Headless LibreOffice
#[derive(Debug, Clone)]
pub struct Soffice {
    binary_paths: Vec<PathBuf>,
    timeout: Duration,
}

impl Soffice {
    #[must_use = "creates an office suite"]
    pub const fn new(binary_paths: Vec<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary_paths,
            timeout,
        }
    }

    /// Candidates from `SOFFICE_PATH` and the platform defaults
    #[must_use = "creates an office suite"]
    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(
            candidate_paths(config.soffice_path.as_deref()),
            config.soffice_timeout,
        )
    }

    /// First candidate present on disk, else the first bare name for `PATH` lookup
    fn resolve(&self) -> Option<&PathBuf> {
        self.binary_paths
            .iter()
            .find(|p| p.is_file())
            .or_else(|| self.binary_paths.iter().find(|p| p.components().count() == 1))
    }

    async fn convert_via(
        &self,
        input: OfficeInput<'_>,
        ext: &str,
        binaries: &[PathBuf],
        attempts: u32,
        interval: Duration,
    ) -> Result<OfficeOutput, OfficeError> {
        let workspace = Workspace::stage(input).await?;
        let output_path = workspace.output_path(ext);
        let mut tried = Vec::with_capacity(binaries.len());

        for bin in binaries {
            let label = bin.display().to_string();
            tried.push(label.clone());

            match run_once(bin, &workspace, ext, self.timeout).await {
                RunOutcome::NotFound(e) => {
                    debug!("Office binary {label} unavailable: {e}");
                }
                RunOutcome::SpawnFailed(source) => {
                    return Err(OfficeError::Spawn {
                        bin: label,
                        source,
                        tried,
                    })
                }
                RunOutcome::Failed { status, stderr } => {
                    return Err(OfficeError::Failed {
                        bin: label,
                        status,
                        stderr,
                        tried,
                    })
                }
                RunOutcome::TimedOut => {
                    warn!("{label} killed after {:?}", self.timeout);
                    return Err(OfficeError::Timeout {
                        bin: label,
                        timeout: self.timeout,
                        tried,
                    });
                }
                RunOutcome::Finished => {
                    return match wait_for_output(&output_path, attempts, interval).await {
                        Some(bytes) => {
                            info!(
                                "Converted {} to .{ext} with {label} ({} bytes)",
                                input.file_name,
                                bytes.len()
                            );
                            Ok(OfficeOutput { bytes, bin: label })
                        }
                        None => Err(OfficeError::MissingOutput {
                            bin: label,
                            ext: ext.to_string(),
                            tried,
                        }),
                    };
                }
            }
        }

        Err(OfficeError::BinaryNotFound { tried })
    }
}

#[async_trait]
impl OfficeSuite for Soffice {
    async fn convert(&self, input: OfficeInput<'_>, ext: &str) -> Result<OfficeOutput, OfficeError> {
        let Some(bin) = self.resolve() else {
            return Err(OfficeError::BinaryNotFound { tried: Vec::new() });
        };
        let binaries = [bin.clone()];
        self.convert_via(input, ext, &binaries, 1, Duration::ZERO).await
    }

    async fn convert_with_options(
        &self,
        input: OfficeInput<'_>,
        ext: &str,
        options: &ConvertOptions,
    ) -> Option<Result<OfficeOutput, OfficeError>> {
        Some(
            self.convert_via(
                input,
                ext,
                &options.binary_paths,
                options.attempts,
                options.poll_interval,
            )
            .await,
        )
    }
}
