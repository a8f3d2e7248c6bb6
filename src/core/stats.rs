use serde::{Deserialize, Serialize};

use super::persona::PersonaType;

pub const BOND_MIN: i32 = 0;
pub const BOND_MAX: i32 = 100;
pub const TRAIT_MIN: i32 = -100;
pub const TRAIT_MAX: i32 = 100;

/// Bond level a trainee starts from, both on first launch and as the
/// onboarding baseline ("start low, grow").
pub const BASELINE_BOND: i32 = 20;

pub fn clamp_bond(value: i32) -> i32 {
    value.clamp(BOND_MIN, BOND_MAX)
}

pub fn clamp_trait(value: i32) -> i32 {
    value.clamp(TRAIT_MIN, TRAIT_MAX)
}

/// Kindness / confidence pair, each in `[-100, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PersonalityScore {
    pub kindness: i32,
    pub confidence: i32,
}

impl PersonalityScore {
    pub fn new(kindness: i32, confidence: i32) -> Self {
        PersonalityScore {
            kindness: clamp_trait(kindness),
            confidence: clamp_trait(confidence),
        }
    }

    pub fn persona(&self) -> PersonaType {
        PersonaType::classify(self)
    }
}

/// Partial personality update; `None` leaves the field untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PersonalityDelta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kindness: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<i32>,
}

impl PersonalityDelta {
    pub fn is_empty(&self) -> bool {
        self.kindness.is_none() && self.confidence.is_none()
    }
}

/// Stat adjustment produced by one chat exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatDelta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bond: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kindness: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<i32>,
}

impl StatDelta {
    pub fn is_empty(&self) -> bool {
        self.bond.is_none() && self.kindness.is_none() && self.confidence.is_none()
    }

    pub fn personality(&self) -> PersonalityDelta {
        PersonalityDelta {
            kindness: self.kindness,
            confidence: self.confidence,
        }
    }
}

impl std::fmt::Display for StatDelta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = Vec::new();
        if let Some(bond) = self.bond {
            parts.push(format!("bond {bond:+}"));
        }
        if let Some(kindness) = self.kindness {
            parts.push(format!("kindness {kindness:+}"));
        }
        if let Some(confidence) = self.confidence {
            parts.push(format!("confidence {confidence:+}"));
        }
        if parts.is_empty() {
            write!(f, "no change")
        } else {
            write!(f, "{}", parts.join(", "))
        }
    }
}

/// Read-only view of the current stats, persona included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdolStats {
    pub bond_level: i32,
    pub personality: PersonalityScore,
    pub persona: PersonaType,
}

/// Point-in-time record appended to the stat history. Never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatSnapshot {
    pub timestamp: i64,
    pub bond_level: i32,
    pub kindness: i32,
    pub confidence: i32,
    pub persona: PersonaType,
}

impl StatSnapshot {
    pub fn capture(timestamp: i64, bond_level: i32, score: PersonalityScore) -> Self {
        StatSnapshot {
            timestamp,
            bond_level,
            kindness: score.kindness,
            confidence: score.confidence,
            persona: score.persona(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatKind {
    Bond,
    Kindness,
    Confidence,
}

impl std::fmt::Display for StatKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatKind::Bond => write!(f, "bond"),
            StatKind::Kindness => write!(f, "kindness"),
            StatKind::Confidence => write!(f, "confidence"),
        }
    }
}
