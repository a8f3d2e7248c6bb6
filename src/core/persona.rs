use serde::{Deserialize, Serialize};

use super::stats::PersonalityScore;

/// Scores inside this band on both axes read as balanced.
const BALANCED_BAND: i32 = 20;

/// Trainee persona, derived from the personality score on every read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PersonaType {
    GentleConfident,
    GentleShy,
    ColdConfident,
    ColdShy,
    Balanced,
}

pub struct PersonaInfo {
    pub title: &'static str,
    pub emoji: &'static str,
    pub description: &'static str,
}

impl PersonaType {
    pub const ALL: [PersonaType; 5] = [
        PersonaType::GentleConfident,
        PersonaType::GentleShy,
        PersonaType::ColdConfident,
        PersonaType::ColdShy,
        PersonaType::Balanced,
    ];

    pub fn classify(score: &PersonalityScore) -> Self {
        let PersonalityScore { kindness, confidence } = *score;

        if kindness.abs() < BALANCED_BAND && confidence.abs() < BALANCED_BAND {
            return PersonaType::Balanced;
        }

        match (kindness > 0, confidence > 0) {
            (true, true) => PersonaType::GentleConfident,
            (true, false) => PersonaType::GentleShy,
            (false, true) => PersonaType::ColdConfident,
            (false, false) => PersonaType::ColdShy,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PersonaType::GentleConfident => "gentle-confident",
            PersonaType::GentleShy => "gentle-shy",
            PersonaType::ColdConfident => "cold-confident",
            PersonaType::ColdShy => "cold-shy",
            PersonaType::Balanced => "balanced",
        }
    }

    pub fn info(&self) -> PersonaInfo {
        match self {
            PersonaType::GentleConfident => PersonaInfo {
                title: "Warm Leader",
                emoji: "🌟",
                description: "Warm-hearted and carries the team with quiet authority",
            },
            PersonaType::GentleShy => PersonaInfo {
                title: "Sunshine Teammate",
                emoji: "🌻",
                description: "Soft and friendly, with a bashful charm",
            },
            PersonaType::ColdConfident => PersonaInfo {
                title: "Fierce Trainee",
                emoji: "🔥",
                description: "Cool-headed, driven and fixed on the goal",
            },
            PersonaType::ColdShy => PersonaInfo {
                title: "Quiet Professional",
                emoji: "🌙",
                description: "Says little and lets the work do the talking",
            },
            PersonaType::Balanced => PersonaInfo {
                title: "Balanced Idol",
                emoji: "⚖️",
                description: "Adapts to whatever the stage throws at them",
            },
        }
    }
}

impl std::fmt::Display for PersonaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Speech register picked from the bond level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BondTier {
    Distant,
    Casual,
    Friendly,
}

impl BondTier {
    pub fn from_bond_level(bond_level: i32) -> Self {
        match bond_level {
            level if level <= 30 => BondTier::Distant,
            level if level <= 60 => BondTier::Casual,
            _ => BondTier::Friendly,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(kindness: i32, confidence: i32) -> PersonaType {
        PersonaType::classify(&PersonalityScore { kindness, confidence })
    }

    #[test]
    fn test_balanced_band() {
        assert_eq!(classify(0, 0), PersonaType::Balanced);
        assert_eq!(classify(19, -19), PersonaType::Balanced);
        assert_eq!(classify(-19, 19), PersonaType::Balanced);
    }

    #[test]
    fn test_band_edge_is_not_balanced() {
        assert_eq!(classify(20, 0), PersonaType::GentleShy);
        assert_eq!(classify(0, 20), PersonaType::ColdConfident);
        assert_eq!(classify(-20, 0), PersonaType::ColdShy);
    }

    #[test]
    fn test_quadrants() {
        assert_eq!(classify(50, 50), PersonaType::GentleConfident);
        assert_eq!(classify(50, -50), PersonaType::GentleShy);
        assert_eq!(classify(-50, 50), PersonaType::ColdConfident);
        assert_eq!(classify(-50, -50), PersonaType::ColdShy);
        // zero counts as the "not positive" side
        assert_eq!(classify(30, 0), PersonaType::GentleShy);
        assert_eq!(classify(0, -30), PersonaType::ColdShy);
    }

    #[test]
    fn test_classify_is_deterministic() {
        for kindness in (-100..=100).step_by(7) {
            for confidence in (-100..=100).step_by(11) {
                assert_eq!(classify(kindness, confidence), classify(kindness, confidence));
            }
        }
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&PersonaType::GentleConfident).unwrap();
        assert_eq!(json, "\"gentle-confident\"");
        for persona in PersonaType::ALL {
            assert_eq!(
                serde_json::to_string(&persona).unwrap(),
                format!("\"{}\"", persona.as_str())
            );
        }
    }

    #[test]
    fn test_bond_tiers() {
        assert_eq!(BondTier::from_bond_level(0), BondTier::Distant);
        assert_eq!(BondTier::from_bond_level(30), BondTier::Distant);
        assert_eq!(BondTier::from_bond_level(31), BondTier::Casual);
        assert_eq!(BondTier::from_bond_level(60), BondTier::Casual);
        assert_eq!(BondTier::from_bond_level(61), BondTier::Friendly);
    }
}
