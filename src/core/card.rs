use super::persona::PersonaType;
use super::stats::IdolStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardGrade {
    S,
    A,
    B,
    C,
}

impl CardGrade {
    pub fn from_bond_level(bond_level: i32) -> Self {
        match bond_level {
            level if level >= 90 => CardGrade::S,
            level if level >= 70 => CardGrade::A,
            level if level >= 50 => CardGrade::B,
            _ => CardGrade::C,
        }
    }

    pub fn stars(&self) -> &'static str {
        match self {
            CardGrade::S => "***",
            CardGrade::A => "**",
            CardGrade::B => "*",
            CardGrade::C => "-",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            CardGrade::S => "DEBUT READY!",
            CardGrade::A => "TRAINEE+",
            CardGrade::B => "TRAINEE",
            CardGrade::C => "ROOKIE",
        }
    }
}

impl std::fmt::Display for CardGrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let letter = match self {
            CardGrade::S => "S",
            CardGrade::A => "A",
            CardGrade::B => "B",
            CardGrade::C => "C",
        };
        write!(f, "{letter}")
    }
}

/// Map a `[-100, 100]` trait onto `[0, 100]` for display.
pub fn display_scale(value: i32) -> i32 {
    ((f64::from(value) + 100.0) / 2.0).round() as i32
}

/// Ten-cell text bar, e.g. `|||||.....` for 50.
pub fn stat_bar(value: i32) -> String {
    let filled = ((f64::from(value.clamp(0, 100))) / 10.0).round() as usize;
    format!("{}{}", "|".repeat(filled), ".".repeat(10 - filled))
}

#[derive(Debug, Clone)]
pub struct DebutCard {
    pub name: String,
    pub grade: CardGrade,
    pub persona: PersonaType,
    pub bond_level: i32,
    pub kindness: i32,
    pub confidence: i32,
}

impl DebutCard {
    pub fn new(name: impl Into<String>, stats: &IdolStats) -> Self {
        DebutCard {
            name: name.into(),
            grade: CardGrade::from_bond_level(stats.bond_level),
            persona: stats.persona,
            bond_level: stats.bond_level,
            kindness: display_scale(stats.personality.kindness),
            confidence: display_scale(stats.personality.confidence),
        }
    }

    pub fn render(&self) -> String {
        let info = self.persona.info();
        let mut lines = vec![
            format!("+{}+", "-".repeat(34)),
            format!("| {:<32} |", format!("{} [{}] {}", self.grade.title(), self.grade, self.grade.stars())),
            format!("| {:<32} |", self.name),
            format!("| {:<32} |", format!("{} {}", info.emoji, info.title)),
            format!("| {:<32} |", ""),
            format!("| {:<32} |", format!("BOND  {:>3} [{}]", self.bond_level, stat_bar(self.bond_level))),
            format!("| {:<32} |", format!("KIND  {:>3} [{}]", self.kindness, stat_bar(self.kindness))),
            format!("| {:<32} |", format!("CONF  {:>3} [{}]", self.confidence, stat_bar(self.confidence))),
        ];
        if self.grade == CardGrade::S {
            lines.push(format!("| {:<32} |", "*** READY FOR THE STAGE ***"));
        }
        lines.push(format!("+{}+", "-".repeat(34)));
        lines.join("\n")
    }
}
