#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostOs {
    Linux,
    MacOs,
    Windows,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostArch {
    X86,
    X86_64,
    Aarch64,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostPlatform {
    pub os: HostOs,
    pub arch: HostArch,
}

impl HostOs {
    pub fn parse(input: &str) -> Self {
        match input {
            "linux" => Self::Linux,
            "macos" => Self::MacOs,
            "windows" => Self::Windows,
            _ => Self::Other,
        }
    }

    pub fn is_unix(self) -> bool {
        matches!(self, Self::Linux | Self::MacOs)
    }
}

impl HostArch {
    pub fn parse(input: &str) -> Self {
        match input {
            "x86" => Self::X86,
            "x86_64" => Self::X86_64,
            "aarch64" => Self::Aarch64,
            _ => Self::Other,
        }
    }
}

impl HostPlatform {
    pub fn new(os: HostOs, arch: HostArch) -> Self {
        Self { os, arch }
    }

    pub fn current() -> Self {
        Self {
            os: HostOs::parse(std::env::consts::OS),
            arch: HostArch::parse(std::env::consts::ARCH),
        }
    }
}

/// Inputs that influence how a `meta.yaml` renders.
///
/// This is passed explicitly into every parse so that recipes pinning
/// `numpy x.x` (or selecting on `py`/`np`) never depend on process-wide state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderConfig {
    pub platform: HostPlatform,
    pub python: Option<String>,
    pub numpy: Option<String>,
}

impl RenderConfig {
    pub fn new(platform: HostPlatform) -> Self {
        Self {
            platform,
            python: None,
            numpy: None,
        }
    }

    pub fn for_host() -> Self {
        Self::new(HostPlatform::current())
    }

    pub fn with_python(mut self, version: impl Into<String>) -> Self {
        self.python = Some(version.into());
        self
    }

    pub fn with_numpy(mut self, version: impl Into<String>) -> Self {
        self.numpy = Some(version.into());
        self
    }

    /// `3.5.2` -> `35`, the integer conda selectors compare `py` against.
    pub(crate) fn python_tag(&self) -> Option<i64> {
        self.python.as_deref().and_then(version_tag)
    }

    pub(crate) fn numpy_tag(&self) -> Option<i64> {
        self.numpy.as_deref().and_then(version_tag)
    }
}

fn version_tag(version: &str) -> Option<i64> {
    let parts = version.trim().split('.').take(2).collect::<Vec<_>>();
    if parts.is_empty() || parts.iter().any(|part| part.is_empty()) {
        return None;
    }
    if !parts
        .iter()
        .all(|part| part.chars().all(|ch| ch.is_ascii_digit()))
    {
        return None;
    }
    parts.concat().parse().ok()
}
