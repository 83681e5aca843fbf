//! Build configuration describing the target platform.

use std::path::PathBuf;

/// An immutable description of the platform/toolchain variant a load runs
/// against.
///
/// The engine itself never interprets the configuration; it is passed
/// through unchanged to every [`Locator`](super::Locator) call. The bundled
/// [`DirLocator`](super::DirLocator) uses the os/arch pair for filename-based
/// file filtering; `build_tags` is carried for locator strategies that can
/// evaluate build constraints (the bundled one does not parse sources and
/// therefore cannot).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildConfig {
    /// Target operating system, in the toolchain's spelling ("linux",
    /// "darwin", "windows", ...).
    pub goos: String,
    /// Target architecture ("amd64", "arm64", ...).
    pub goarch: String,
    /// Build tags in effect for this run.
    pub build_tags: Vec<String>,
    /// Override for the toolchain installation directory.
    pub toolchain_dir: Option<PathBuf>,
    /// Whether the run is in module mode (as opposed to a legacy
    /// workspace-path mode).
    pub module_mode: bool,
}

impl BuildConfig {
    /// A configuration for an explicit os/arch pair, module mode on.
    pub fn new(goos: impl Into<String>, goarch: impl Into<String>) -> Self {
        Self {
            goos: goos.into(),
            goarch: goarch.into(),
            build_tags: Vec::new(),
            toolchain_dir: None,
            module_mode: true,
        }
    }

    /// A configuration matching the host platform.
    pub fn host() -> Self {
        let goos = match std::env::consts::OS {
            "macos" => "darwin",
            other => other,
        };
        let goarch = match std::env::consts::ARCH {
            "x86_64" => "amd64",
            "x86" => "386",
            "aarch64" => "arm64",
            other => other,
        };
        Self::new(goos, goarch)
    }

    /// Set the build tags.
    pub fn with_build_tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.build_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Set the toolchain directory override.
    pub fn with_toolchain_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.toolchain_dir = Some(dir.into());
        self
    }

    /// Set module mode.
    pub fn with_module_mode(mut self, on: bool) -> Self {
        self.module_mode = on;
        self
    }

    /// Filename-based platform filtering: `x_linux.go`, `x_amd64.go`, and
    /// `x_linux_amd64.go` only build on the matching platform. The suffix is
    /// only a constraint when something precedes it, so `linux.go` matches
    /// everywhere.
    pub(crate) fn file_matches(&self, name: &str) -> bool {
        let Some(stem) = name.strip_suffix(".go") else {
            return false;
        };
        let stem = stem.strip_suffix("_test").unwrap_or(stem);
        let parts: Vec<&str> = stem.split('_').collect();
        if parts.len() < 2 {
            return true;
        }
        let last = parts[parts.len() - 1];
        if KNOWN_ARCH.contains(&last) {
            if parts.len() >= 3 && KNOWN_OS.contains(&parts[parts.len() - 2]) {
                return parts[parts.len() - 2] == self.goos && last == self.goarch;
            }
            return last == self.goarch;
        }
        if KNOWN_OS.contains(&last) {
            return last == self.goos;
        }
        true
    }
}

const KNOWN_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "illumos", "ios", "js", "linux",
    "netbsd", "openbsd", "plan9", "solaris", "wasip1", "windows",
];

const KNOWN_ARCH: &[&str] = &[
    "386", "amd64", "arm", "arm64", "loong64", "mips", "mips64", "mips64le", "mipsle",
    "ppc64", "ppc64le", "riscv64", "s390x", "wasm",
];
