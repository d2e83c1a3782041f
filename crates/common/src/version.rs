use std::fmt;

use serde::Serialize;

/// Version information for the running binary
#[derive(Debug, Clone, Serialize)]
pub struct BuildInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub build_profile: &'static str,
}

impl BuildInfo {
    pub const fn new(name: &'static str, version: &'static str) -> Self {
        let build_profile = if cfg!(debug_assertions) {
            "debug"
        } else {
            "release"
        };
        Self {
            name,
            version,
            build_profile,
        }
    }
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.name, self.version, self.build_profile)
    }
}

/// Build info for the crate the macro is expanded in
#[macro_export]
macro_rules! build_info {
    () => {
        $crate::version::BuildInfo::new(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
    };
}

#[cfg(test)]
mod test {
    #[test]
    fn test_build_info_display() {
        let info = crate::build_info!();
        assert_eq!(info.name, "ndnx-common");
        assert!(info.to_string().starts_with("ndnx-common "));
    }
}
