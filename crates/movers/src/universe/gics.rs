//! GICS (Global Industry Classification Standard) sector definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// GICS Level 1 sectors (11 sectors).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GicsSector {
    /// Energy
    Energy,
    /// Materials
    Materials,
    /// Industrials
    Industrials,
    /// Consumer Discretionary
    ConsumerDiscretionary,
    /// Consumer Staples
    ConsumerStaples,
    /// Health Care
    HealthCare,
    /// Financials
    Financials,
    /// Information Technology
    InformationTechnology,
    /// Communication Services
    CommunicationServices,
    /// Utilities
    Utilities,
    /// Real Estate
    RealEstate,
}

impl GicsSector {
    /// All sectors in GICS code order.
    pub const ALL: [Self; 11] = [
        Self::Energy,
        Self::Materials,
        Self::Industrials,
        Self::ConsumerDiscretionary,
        Self::ConsumerStaples,
        Self::HealthCare,
        Self::Financials,
        Self::InformationTechnology,
        Self::CommunicationServices,
        Self::Utilities,
        Self::RealEstate,
    ];

    /// Returns the sector code (2-digit).
    pub const fn code(&self) -> u8 {
        match self {
            Self::Energy => 10,
            Self::Materials => 15,
            Self::Industrials => 20,
            Self::ConsumerDiscretionary => 25,
            Self::ConsumerStaples => 30,
            Self::HealthCare => 35,
            Self::Financials => 40,
            Self::InformationTechnology => 45,
            Self::CommunicationServices => 50,
            Self::Utilities => 55,
            Self::RealEstate => 60,
        }
    }

    /// Returns the sector name as it appears in constituent listings.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::InformationTechnology => "Information Technology",
            Self::HealthCare => "Health Care",
            Self::Financials => "Financials",
            Self::ConsumerDiscretionary => "Consumer Discretionary",
            Self::CommunicationServices => "Communication Services",
            Self::Industrials => "Industrials",
            Self::ConsumerStaples => "Consumer Staples",
            Self::Energy => "Energy",
            Self::Utilities => "Utilities",
            Self::RealEstate => "Real Estate",
            Self::Materials => "Materials",
        }
    }

    /// Parse a sector from its code.
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            10 => Some(Self::Energy),
            15 => Some(Self::Materials),
            20 => Some(Self::Industrials),
            25 => Some(Self::ConsumerDiscretionary),
            30 => Some(Self::ConsumerStaples),
            35 => Some(Self::HealthCare),
            40 => Some(Self::Financials),
            45 => Some(Self::InformationTechnology),
            50 => Some(Self::CommunicationServices),
            55 => Some(Self::Utilities),
            60 => Some(Self::RealEstate),
            _ => None,
        }
    }

    /// Parse a sector from a full name or a common short alias.
    ///
    /// Matching ignores case and whitespace, so `"Health Care"`, `"healthcare"`
    /// and `"health"` all resolve to [`GicsSector::HealthCare`].
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized: String = name
            .chars()
            .filter(|c| !c.is_whitespace())
            .flat_map(char::to_lowercase)
            .collect();

        let sector = match normalized.as_str() {
            "informationtechnology" | "it" | "tech" => Self::InformationTechnology,
            "healthcare" | "health" => Self::HealthCare,
            "financials" | "finance" => Self::Financials,
            "consumerdiscretionary" | "discretionary" => Self::ConsumerDiscretionary,
            "communicationservices" | "communication" | "comms" => Self::CommunicationServices,
            "industrials" | "industrial" => Self::Industrials,
            "consumerstaples" | "staples" => Self::ConsumerStaples,
            "energy" => Self::Energy,
            "utilities" | "utility" => Self::Utilities,
            "realestate" | "estate" => Self::RealEstate,
            "materials" => Self::Materials,
            _ => return None,
        };

        Some(sector)
    }
}

impl fmt::Display for GicsSector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for GicsSector {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| format!("Unknown sector: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_codes_round_trip_for_every_sector() {
        for sector in GicsSector::ALL {
            assert_eq!(GicsSector::from_code(sector.code()), Some(sector));
        }
        assert_eq!(GicsSector::from_code(99), None);
    }

    #[rstest]
    #[case("Information Technology", GicsSector::InformationTechnology)]
    #[case("health care", GicsSector::HealthCare)]
    #[case("HEALTH", GicsSector::HealthCare)]
    #[case("Real Estate", GicsSector::RealEstate)]
    #[case("staples", GicsSector::ConsumerStaples)]
    #[case("Communication Services", GicsSector::CommunicationServices)]
    fn test_from_name(#[case] input: &str, #[case] expected: GicsSector) {
        assert_eq!(GicsSector::from_name(input), Some(expected));
    }

    #[test]
    fn test_from_name_rejects_unknown() {
        assert_eq!(GicsSector::from_name("Crypto"), None);
        assert!("Crypto".parse::<GicsSector>().is_err());
    }

    #[test]
    fn test_display_matches_listing_names() {
        for sector in GicsSector::ALL {
            assert_eq!(GicsSector::from_name(&sector.to_string()), Some(sector));
        }
        assert_eq!(format!("{}", GicsSector::Energy), "Energy");
    }
}
