// # Keyfile
//
// The keyfile is a text file with three whitespace-separated fields per line:
//
// ```text
// # FQDN              PROVIDER   SECRET
// host.example.com    namecheap  0123456789abcdef
// ```
//
// Blank lines and lines starting with `#` are ignored. Malformed lines are
// logged and skipped.
//
// ## Security Requirements
//
// - Secrets NEVER appear in logs, `Debug` output or error messages
// - When running as non-root, the file must be private to its owner and no
//   ancestor directory may be group/world writable (sticky dirs excepted)

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Marker printed in place of a secret
pub const REDACTED: &str = "<REDACTED>";

/// A shared secret that refuses to be printed
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    /// Wrap a secret value
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw secret, for building provider requests only
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

/// One keyfile row: the secret for `fqdn` at `provider`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    /// Fully-qualified domain name
    pub fqdn: String,
    /// Provider name (e.g., "namecheap")
    pub provider: String,
    /// Provider secret
    pub secret: Secret,
}

impl Credential {
    /// Create a credential
    pub fn new(fqdn: impl Into<String>, provider: impl Into<String>, secret: Secret) -> Self {
        Self {
            fqdn: fqdn.into(),
            provider: provider.into(),
            secret,
        }
    }
}

/// Parsed keyfile
#[derive(Debug, Clone, Default)]
pub struct KeyFile {
    path: PathBuf,
    entries: Vec<Credential>,
}

impl KeyFile {
    /// Open, verify and parse the keyfile at `path`
    ///
    /// # Errors
    ///
    /// - `Error::Config` if the file cannot be opened, or if it or its
    ///   directories have unsafe permissions
    /// - `Error::Io` if the opened file cannot be read
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            Error::config(format!("can't open keyfile {}: {}", path.display(), e))
        })?;

        #[cfg(unix)]
        {
            let metadata = file.metadata()?;
            // SAFETY: getuid() has no preconditions and cannot fail.
            let uid = unsafe { libc::getuid() };
            if uid != 0 {
                unix::verify_file(path, &metadata, uid)?;
                unix::verify_ancestors(path)?;
            }
        }

        Self::parse(BufReader::new(file), path)
    }

    /// Parse keyfile contents from any reader
    ///
    /// `origin` is only used to label warnings.
    pub fn parse<R: BufRead>(reader: R, origin: impl Into<PathBuf>) -> Result<Self> {
        let path = origin.into();
        let mut entries = Vec::new();

        for (n, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let fields: Vec<&str> = line.split_whitespace().collect();
            let [fqdn, provider, secret] = fields.as_slice() else {
                warn!(
                    "{}:{}: expected 3 fields, found {}; skipping",
                    path.display(),
                    n + 1,
                    fields.len()
                );
                continue;
            };

            entries.push(Credential::new(*fqdn, *provider, Secret::new(*secret)));
        }

        debug!("Loaded {} keyfile entries from {}", entries.len(), path.display());
        Ok(Self { path, entries })
    }

    /// Find the first credential for `fqdn` at `provider`
    pub fn lookup(&self, fqdn: &str, provider: &str) -> Option<&Credential> {
        self.entries
            .iter()
            .find(|c| c.fqdn == fqdn && c.provider == provider)
    }

    /// Where this keyfile came from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of well-formed rows
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the keyfile holds no rows
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(unix)]
mod unix {
    use std::fs::{self, Metadata};
    use std::os::unix::fs::MetadataExt;
    use std::path::Path;

    use crate::error::{Error, Result};

    const GROUP_WORLD_RW: u32 = 0o066;
    const GROUP_WORLD_W: u32 = 0o022;
    const STICKY: u32 = 0o1000;

    /// The keyfile must be private to the user running us
    pub(super) fn verify_file(path: &Path, metadata: &Metadata, uid: u32) -> Result<()> {
        check_file_mode(path, metadata.mode(), metadata.uid(), uid)
    }

    pub(super) fn check_file_mode(path: &Path, mode: u32, owner: u32, uid: u32) -> Result<()> {
        if mode & GROUP_WORLD_RW != 0 {
            return Err(Error::config(format!(
                "keyfile {}: insecure permissions (group/world read-write)",
                path.display()
            )));
        }

        if owner != uid {
            return Err(Error::config(format!(
                "keyfile {}: user {} is not the owner ({})",
                path.display(),
                uid,
                owner
            )));
        }

        Ok(())
    }

    /// No directory between the keyfile and `/` may be writable by others
    pub(super) fn verify_ancestors(path: &Path) -> Result<()> {
        for dir in path.ancestors().skip(1) {
            if dir.as_os_str().is_empty() {
                continue;
            }

            let metadata = fs::metadata(dir)?;
            check_dir_mode(dir, metadata.mode())?;
        }

        Ok(())
    }

    pub(super) fn check_dir_mode(dir: &Path, mode: u32) -> Result<()> {
        if mode & GROUP_WORLD_W != 0 && mode & STICKY == 0 {
            return Err(Error::config(format!(
                "insecure permissions on {} (group/world write)",
                dir.display()
            )));
        }

        Ok(())
    }
}
