//! Local distribution companies (utility providers) the system can sync with.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Utility provider (LDC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LdcProvider {
    /// Pacific Gas & Electric.
    Pge,
    /// Southern California Edison.
    Sce,
    /// San Diego Gas & Electric.
    Sdge,
    /// Consolidated Edison.
    ConEd,
    /// Duke Energy.
    Duke,
    Other,
}

pub const UNKNOWN_PROVIDER: &str = "LdcProvider.Unknown";

impl LdcProvider {
    pub const ALL: [LdcProvider; 6] = [
        LdcProvider::Pge,
        LdcProvider::Sce,
        LdcProvider::Sdge,
        LdcProvider::ConEd,
        LdcProvider::Duke,
        LdcProvider::Other,
    ];

    /// Short provider code, as used in configuration and external systems.
    pub fn code(self) -> &'static str {
        match self {
            LdcProvider::Pge => "pge",
            LdcProvider::Sce => "sce",
            LdcProvider::Sdge => "sdge",
            LdcProvider::ConEd => "coned",
            LdcProvider::Duke => "duke",
            LdcProvider::Other => "other",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            LdcProvider::Pge => "Pacific Gas & Electric",
            LdcProvider::Sce => "Southern California Edison",
            LdcProvider::Sdge => "San Diego Gas & Electric",
            LdcProvider::ConEd => "Consolidated Edison",
            LdcProvider::Duke => "Duke Energy",
            LdcProvider::Other => "Other",
        }
    }
}

impl core::fmt::Display for LdcProvider {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

impl core::str::FromStr for LdcProvider {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        LdcProvider::ALL
            .into_iter()
            .find(|p| p.code() == wanted)
            .ok_or_else(|| DomainError::new(UNKNOWN_PROVIDER, format!("unknown provider: {s}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_codes_case_insensitively() {
        assert_eq!("PGE".parse::<LdcProvider>().unwrap(), LdcProvider::Pge);
        assert_eq!(" ConEd ".parse::<LdcProvider>().unwrap(), LdcProvider::ConEd);
        for provider in LdcProvider::ALL {
            assert_eq!(provider.to_string().parse::<LdcProvider>().unwrap(), provider);
        }
    }

    #[test]
    fn unknown_code_is_rejected() {
        let err = "acme-power".parse::<LdcProvider>().unwrap_err();
        assert_eq!(err.code(), UNKNOWN_PROVIDER);
    }
}
