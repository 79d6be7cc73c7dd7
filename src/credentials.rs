//! Credential handling: the in-memory gate and the durable store.
//!
//! [`CredentialGate`] is the single point that can unblock a paused job. It
//! holds at most two credentials with an explicit priority policy: a
//! credential supplied by the caller mid-session always overrides the ambient
//! default picked up from the environment at startup. The gate never
//! validates a credential proactively — validity is only discovered when the
//! analysis client next uses it.
//!
//! [`CredentialStore`] persists the user-supplied credential across runs in a
//! single file under a fixed name. It is read once at process start; the gate
//! treats a credential found there identically to one typed in mid-job.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable consulted for the ambient credential.
pub const ENV_CREDENTIAL: &str = "GEMINI_API_KEY";

/// Fixed filename of the durable credential store.
const STORE_FILE: &str = "credential";

/// Holds the current credential and exposes whether one is known.
///
/// Priority: an explicitly supplied credential always wins over the ambient
/// default. This is a deliberate policy, covered by a unit test, rather than
/// an accident of lookup order.
#[derive(Debug, Clone, Default)]
pub struct CredentialGate {
    /// Credential supplied by the caller (typed in, loaded from the store).
    explicit: Option<String>,
    /// Credential picked up from the environment at construction.
    ambient: Option<String>,
}

impl CredentialGate {
    /// A gate with no credential from any source.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a gate from the ambient environment, without touching the store.
    pub fn from_env() -> Self {
        let ambient = std::env::var(ENV_CREDENTIAL)
            .ok()
            .filter(|v| !v.trim().is_empty());
        if ambient.is_some() {
            debug!("ambient credential found in {}", ENV_CREDENTIAL);
        }
        Self {
            explicit: None,
            ambient,
        }
    }

    /// Build a gate with a known ambient credential (tests, embedders).
    pub fn with_ambient(ambient: impl Into<String>) -> Self {
        Self {
            explicit: None,
            ambient: Some(ambient.into()),
        }
    }

    /// Whether any credential is currently known.
    pub fn has_credential(&self) -> bool {
        self.current().is_some()
    }

    /// The credential the next analysis call should use: explicit first,
    /// ambient otherwise.
    pub fn current(&self) -> Option<&str> {
        self.explicit.as_deref().or(self.ambient.as_deref())
    }

    /// Supply a credential. Setting one while a job is paused is the signal
    /// callers use before invoking resume.
    pub fn set_credential(&mut self, value: impl Into<String>) {
        self.explicit = Some(value.into());
    }

    /// Forget every known credential, from both sources.
    pub fn clear(&mut self) {
        self.explicit = None;
        self.ambient = None;
    }
}

/// File-backed persistence for the user-supplied credential.
///
/// One file, fixed name, plain contents. Read once at process start.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// A store rooted at `dir` (the file lives at `dir/credential`).
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(STORE_FILE),
        }
    }

    /// The conventional per-user store location, or `None` when no home
    /// directory can be determined.
    pub fn default_dir() -> Option<PathBuf> {
        std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config").join("pdf2report"))
    }

    /// Read the stored credential, if any. Unreadable or empty files are
    /// treated as absent.
    pub fn load(&self) -> Option<String> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let trimmed = contents.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    debug!("loaded credential from {}", self.path.display());
                    Some(trimmed.to_string())
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!("could not read credential store {}: {}", self.path.display(), e);
                None
            }
        }
    }

    /// Persist a credential, creating parent directories as needed.
    pub fn save(&self, credential: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, credential.trim())
    }

    /// Remove the stored credential. Missing files are not an error.
    pub fn forget(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}
