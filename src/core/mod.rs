pub mod card;
pub mod error;
pub mod message;
pub mod onboarding;
pub mod persona;
pub mod report;
pub mod stats;

pub use card::{CardGrade, DebutCard};
pub use error::{IdolError, Result};
pub use message::{Message, Role};
pub use onboarding::{default_questions, score_answers, Answer, InitialStats, Question};
pub use persona::{BondTier, PersonaType};
pub use report::{history_stats, persona_timeline, HistoryStats, PersonaShift};
pub use stats::{
    IdolStats, PersonalityDelta, PersonalityScore, StatDelta, StatKind, StatSnapshot,
};
