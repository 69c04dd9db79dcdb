use crate::ResolutionContext;

/// The operating system names recognized in bracketed section headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum OsName {
    Posix,
    Windows,
    Mac,
    Linux,
}

impl OsName {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "POSIX" => Some(Self::Posix),
            "Windows" => Some(Self::Windows),
            "Mac" => Some(Self::Mac),
            "Linux" => Some(Self::Linux),
            _ => None,
        }
    }

    /// True when `self` describes the family that `current` belongs to.
    /// `Posix` matches every non-Windows OS.
    fn matches(self, current: OsName) -> bool {
        match self {
            OsName::Posix => current != OsName::Windows,
            other => other == current,
        }
    }

    /// The host's OS, for building a [`ResolutionContext`].
    pub fn current() -> Self {
        if cfg!(windows) {
            OsName::Windows
        } else if cfg!(target_os = "macos") {
            OsName::Mac
        } else {
            OsName::Linux
        }
    }
}

/// Identifies one conditional section of a manifest, parsed from a
/// bracketed header like `[Windows]`, `[Runtime-9]`, `[release]`,
/// `[Release-POSIX]`, or `[Release-Runtime-9]`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SectionId {
    Os(OsName),
    RuntimeMajor(u32),
    Mode(String),
    ModeOs(String, OsName),
    ModeRuntime(String, u32),
}

impl SectionId {
    /// Parse a section header's bracketed contents (without the brackets).
    pub fn parse(header: &str) -> Self {
        if let Some(os) = OsName::parse(header) {
            return SectionId::Os(os);
        }
        if let Some(major) = header.strip_prefix("Runtime-").and_then(|s| s.parse().ok()) {
            return SectionId::RuntimeMajor(major);
        }
        if let Some(rest) = header.strip_prefix("Release-") {
            if let Some(major) = rest
                .strip_prefix("Runtime-")
                .and_then(|s| s.parse().ok())
            {
                return SectionId::ModeRuntime("Release".to_string(), major);
            }
            if let Some(os) = OsName::parse(rest) {
                return SectionId::ModeOs("Release".to_string(), os);
            }
        }
        // Generic `Mode-Runtime-N` / `Mode-Os` forms.
        if let Some(idx) = header.rfind("-Runtime-") {
            let (mode, tail) = header.split_at(idx);
            if let Some(major) = tail.trim_start_matches("-Runtime-").parse().ok() {
                return SectionId::ModeRuntime(mode.to_string(), major);
            }
        }
        for (suffix, os) in [
            ("-POSIX", OsName::Posix),
            ("-Windows", OsName::Windows),
            ("-Mac", OsName::Mac),
            ("-Linux", OsName::Linux),
        ] {
            if let Some(mode) = header.strip_suffix(suffix) {
                return SectionId::ModeOs(mode.to_string(), os);
            }
        }
        SectionId::Mode(header.to_string())
    }

    /// Whether this section applies given the current resolution context.
    pub fn matches(&self, ctx: &ResolutionContext) -> bool {
        match self {
            SectionId::Os(os) => os.matches(ctx.os),
            SectionId::RuntimeMajor(major) => *major == ctx.runtime_major,
            SectionId::Mode(mode) => ctx.mode.as_deref() == Some(mode.as_str()),
            SectionId::ModeOs(mode, os) => {
                ctx.mode.as_deref() == Some(mode.as_str()) && os.matches(ctx.os)
            }
            SectionId::ModeRuntime(mode, major) => {
                ctx.mode.as_deref() == Some(mode.as_str()) && *major == ctx.runtime_major
            }
        }
    }

    /// Whether this section's mode component equals `mode`, independent of
    /// whether the rest of the context would currently match. Used to check
    /// that a requested mode exists *somewhere* in the manifest.
    pub fn matches_mode_name(&self, mode: &str) -> bool {
        match self {
            SectionId::Mode(m) | SectionId::ModeOs(m, _) | SectionId::ModeRuntime(m, _) => {
                m == mode
            }
            _ => false,
        }
    }

    /// Fixed override precedence: later sections win ties on the same key.
    pub fn precedence(&self) -> u8 {
        match self {
            SectionId::Os(_) => 0,
            SectionId::RuntimeMajor(_) => 1,
            SectionId::Mode(_) => 2,
            SectionId::ModeOs(..) => 3,
            SectionId::ModeRuntime(..) => 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_os_sections() {
        assert_eq!(SectionId::parse("Windows"), SectionId::Os(OsName::Windows));
        assert_eq!(SectionId::parse("POSIX"), SectionId::Os(OsName::Posix));
    }

    #[test]
    fn parses_runtime_major() {
        assert_eq!(SectionId::parse("Runtime-9"), SectionId::RuntimeMajor(9));
    }

    #[test]
    fn parses_bare_mode() {
        assert_eq!(
            SectionId::parse("release"),
            SectionId::Mode("release".to_string())
        );
    }

    #[test]
    fn parses_release_posix() {
        assert_eq!(
            SectionId::parse("Release-POSIX"),
            SectionId::ModeOs("Release".to_string(), OsName::Posix)
        );
    }

    #[test]
    fn parses_release_runtime() {
        assert_eq!(
            SectionId::parse("Release-Runtime-9"),
            SectionId::ModeRuntime("Release".to_string(), 9)
        );
    }

    #[test]
    fn release_prefixed_section_is_reachable_by_its_own_declared_casing() {
        let section = SectionId::parse("Release-POSIX");
        assert!(section.matches_mode_name("Release"));
        assert!(!section.matches_mode_name("release"));
    }

    #[test]
    fn posix_matches_non_windows() {
        assert!(OsName::Posix.matches(OsName::Linux));
        assert!(OsName::Posix.matches(OsName::Mac));
        assert!(!OsName::Posix.matches(OsName::Windows));
    }
}
