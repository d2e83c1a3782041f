use std::fmt;

use serde::Serialize;

/// A way of retrieving the benchmark asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    Direct,
    Cdn,
    VpnDirect,
    VpnCdn,
    Indirection,
}

impl Strategy {
    pub const ALL: [Strategy; 5] = [
        Strategy::Direct,
        Strategy::Cdn,
        Strategy::VpnDirect,
        Strategy::VpnCdn,
        Strategy::Indirection,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Direct => "direct",
            Strategy::Cdn => "cdn",
            Strategy::VpnDirect => "vpn-direct",
            Strategy::VpnCdn => "vpn-cdn",
            Strategy::Indirection => "indirection",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
