use serde::{Deserialize, Serialize};

use super::error::{IdolError, Result};
use super::stats::{clamp_bond, clamp_trait, PersonalityScore, BASELINE_BOND};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Weights {
    #[serde(default)]
    pub kindness: Option<i32>,
    #[serde(default)]
    pub confidence: Option<i32>,
    #[serde(default)]
    pub bond_level: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerOption {
    pub text: String,
    pub weights: Weights,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub prompt: String,
    pub options: Vec<AnswerOption>,
}

/// One picked option, by index into the question bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Answer {
    pub question: usize,
    pub option: usize,
}

impl Answer {
    pub fn new(question: usize, option: usize) -> Self {
        Answer { question, option }
    }
}

/// Stats written into the store when onboarding completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitialStats {
    pub bond_level: i32,
    pub personality: PersonalityScore,
}

/// Sum the answer weights and turn them into starting stats.
///
/// Every question in `bank` must be answered exactly once. The order of
/// `answers` does not matter.
pub fn score_answers(answers: &[Answer], bank: &[Question]) -> Result<InitialStats> {
    let mut answered = vec![false; bank.len()];
    let (mut kindness, mut confidence, mut bond) = (0i32, 0i32, 0i32);

    for answer in answers {
        let question = bank.get(answer.question).ok_or_else(|| {
            IdolError::InvalidAnswers(format!(
                "question {} does not exist (bank has {})",
                answer.question,
                bank.len()
            ))
        })?;
        let option = question.options.get(answer.option).ok_or_else(|| {
            IdolError::InvalidAnswers(format!(
                "question {} has no option {}",
                answer.question, answer.option
            ))
        })?;
        if std::mem::replace(&mut answered[answer.question], true) {
            return Err(IdolError::InvalidAnswers(format!(
                "question {} answered more than once",
                answer.question
            )));
        }

        kindness = kindness.saturating_add(option.weights.kindness.unwrap_or(0));
        confidence = confidence.saturating_add(option.weights.confidence.unwrap_or(0));
        bond = bond.saturating_add(option.weights.bond_level.unwrap_or(0));
    }

    if let Some(missing) = answered.iter().position(|done| !done) {
        return Err(IdolError::InvalidAnswers(format!(
            "question {missing} was not answered"
        )));
    }

    Ok(InitialStats {
        bond_level: clamp_bond(BASELINE_BOND.saturating_add(bond)),
        personality: PersonalityScore {
            kindness: clamp_trait(kindness),
            confidence: clamp_trait(confidence),
        },
    })
}

fn option(text: &str, kindness: Option<i32>, confidence: Option<i32>, bond_level: Option<i32>) -> AnswerOption {
    AnswerOption {
        text: text.to_string(),
        weights: Weights { kindness, confidence, bond_level },
    }
}

fn question(prompt: &str, options: Vec<AnswerOption>) -> Question {
    Question {
        prompt: prompt.to_string(),
        options,
    }
}

/// The ten trainee questions asked on first launch.
pub fn default_questions() -> Vec<Question> {
    vec![
        question(
            "What kind of environment did the trainee grow up in?",
            vec![
                option("Under relentless training", Some(-15), Some(5), Some(-5)),
                option("In a warm, easy-going home", Some(10), Some(-5), Some(3)),
                option("Somewhere in between", Some(0), Some(0), None),
            ],
        ),
        question(
            "How does the trainee react to a mistake?",
            vec![
                option("Beats themselves up about it", Some(-12), Some(3), Some(-3)),
                option("Shakes it off and goes again", Some(8), None, Some(3)),
                option("Quietly works out what went wrong", None, Some(3), None),
            ],
        ),
        question(
            "What is the trainee's self-management style?",
            vec![
                option("A strict schedule", Some(-8), Some(5), Some(-2)),
                option("An easy, steady pace", Some(5), Some(-3), Some(2)),
                option("Depends on the day", Some(2), Some(2), None),
            ],
        ),
        question(
            "How does the trainee take praise?",
            vec![
                option("Lights up and gets motivated", Some(8), None, Some(5)),
                option("Accepts it calmly", Some(2), None, Some(1)),
                option("Insists there is a long way to go", Some(-8), Some(3), Some(-2)),
            ],
        ),
        question(
            "How ambitious is the trainee?",
            vec![
                option("Charges at the highest goal", Some(-5), Some(5), Some(-2)),
                option("Sets realistic targets", Some(3), Some(3), None),
                option("Goes with the flow", Some(5), Some(-3), Some(2)),
            ],
        ),
        question(
            "How competitive is the trainee?",
            vec![
                option("Fiercely competitive", Some(-15), Some(5), Some(-5)),
                option("Walks their own path", Some(8), None, Some(3)),
                option("Just enough to stay sharp", Some(-3), Some(2), None),
            ],
        ),
        question(
            "How does the trainee rest?",
            vec![
                option("Resting feels like a waste", Some(-12), Some(3), Some(-3)),
                option("Rest is part of the work", Some(8), None, Some(5)),
                option("Whenever the body asks", Some(3), Some(2), Some(1)),
            ],
        ),
        question(
            "How does the trainee like feedback?",
            vec![
                option("Blunt and direct", Some(-8), Some(5), Some(-2)),
                option("Gently, please", Some(8), None, Some(3)),
                option("Let them figure it out", Some(3), Some(3), Some(1)),
            ],
        ),
        question(
            "What does the trainee do after failing?",
            vec![
                option("Tries again straight away", Some(-5), Some(5), Some(-2)),
                option("Needs a little comfort first", Some(8), None, Some(5)),
                option("Analyses calmly, then retries", Some(2), Some(3), None),
            ],
        ),
        question(
            "How badly does the trainee want to debut?",
            vec![
                option("As soon as possible!", Some(-8), Some(5), Some(-3)),
                option("When they are ready", Some(3), Some(3), None),
                option("They love the process itself", Some(5), Some(-3), Some(2)),
            ],
        ),
    ]
}
