use std::ops::RangeInclusive;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::core::{BondTier, IdolStats, PersonaType, StatDelta};

const POSITIVE_KEYWORDS: &[&str] = &[
    "well done", "great job", "the best", "amazing", "awesome", "proud", "love", "perfect",
    "wonderful", "잘했어", "최고", "응원", "좋아", "멋져", "훌륭", "대단", "완벽", "사랑",
];

const NEGATIVE_KEYWORDS: &[&str] = &[
    "disappoint", "what's wrong with you", "can't do anything", "hate", "annoying", "not good",
    "stop it", "useless", "왜 그래", "실망", "못해", "싫어", "짜증", "별로", "그만", "안 돼",
];

const ENCOURAGEMENT_KEYWORDS: &[&str] = &[
    "you can do it", "hang in there", "keep going", "don't give up", "fighting", "it's okay",
    "cheer up", "힘내", "할 수 있어", "파이팅", "화이팅", "포기하지마", "괜찮아",
];

/// What the keyword classifier made of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentiment {
    Positive,
    Negative,
    Encouragement,
    Neutral,
}

impl Sentiment {
    pub fn detect(message: &str) -> Self {
        let message = message.to_lowercase();
        let has_any = |keywords: &[&str]| keywords.iter().any(|kw| message.contains(kw));

        if has_any(POSITIVE_KEYWORDS) {
            Sentiment::Positive
        } else if has_any(NEGATIVE_KEYWORDS) {
            Sentiment::Negative
        } else if has_any(ENCOURAGEMENT_KEYWORDS) {
            Sentiment::Encouragement
        } else {
            Sentiment::Neutral
        }
    }
}

fn positive_pool(persona: PersonaType, tier: BondTier) -> &'static [&'static str] {
    use BondTier::*;
    use PersonaType::*;
    match (persona, tier) {
        (GentleConfident, Distant) => &[
            "I heard you. Thank you.",
            "I see. That makes sense to me.",
            "That's kind of you. It gives me strength.",
        ],
        (GentleConfident, Casual) => &[
            "Yeah! Let's keep at it together.",
            "Thanks~ that really picks me up.",
            "Got it! I'll work hard.",
        ],
        (GentleConfident, Friendly) => &[
            "You always give me so much energy! Thank you~",
            "I feel safe with you here. Let's go all the way together!",
            "You're the best! With you around I can do this.",
        ],
        (GentleShy, Distant) => &[
            "Oh, um... thank you.",
            "I see. That's nice of you to say.",
            "Thanks... I'll do my best.",
        ],
        (GentleShy, Casual) => &[
            "Thank you... that made me feel better.",
            "Mm! I'll work hard too.",
            "Wow~ really? That cheers me up!",
        ],
        (GentleShy, Friendly) => &[
            "Really, thank you! It's all thanks to you~",
            "I'm so glad we're in this together. Please keep looking after me!",
            "I'm so happy... let's stay together!",
        ],
        (ColdConfident, Distant) => &[
            "Understood. I'll take note.",
            "I see. I'll do better.",
            "Heard. I'll put in the work.",
        ],
        (ColdConfident, Casual) => &[
            "Fine. I'll do better.",
            "Sure, I can handle this much.",
            "Obviously. Who do you think I am?",
        ],
        (ColdConfident, Friendly) => &[
            "I'll live up to what you expect. Trust me.",
            "Don't worry. I've got this.",
            "This won't break me. I'll only get stronger.",
        ],
        (ColdShy, Distant) => &["...Understood.", "Yes. I heard you.", "...I'll try."],
        (ColdShy, Casual) => &["Mm. Got it.", "...Fine. I'll do it.", "Okay. I'll try harder."],
        (ColdShy, Friendly) => &[
            "Mm... thanks.",
            "Okay. I'll believe you.",
            "...It's because of you. Thanks.",
        ],
        (Balanced, Distant) => &[
            "Understood. Thank you.",
            "I see. That's good advice.",
            "Yes, I'll keep that in mind.",
        ],
        (Balanced, Casual) => &[
            "Okay, got it. Thanks.",
            "Right! I'll give it a go.",
            "Good. Let's push on together.",
        ],
        (Balanced, Friendly) => &[
            "Thanks! That really helps.",
            "Yeah! Together we can do anything.",
            "With you, I think I can make it.",
        ],
    }
}

fn negative_pool(persona: PersonaType, tier: BondTier) -> &'static [&'static str] {
    use BondTier::*;
    use PersonaType::*;
    match (persona, tier) {
        (GentleConfident, Distant) => &["That's a little disappointing...", "Is that so... I understand."],
        (GentleConfident, Casual) => &["Hmm... that stings a bit.", "Ah... I see."],
        (GentleConfident, Friendly) => &["What's wrong... did something happen?", "That hurts... did I do something wrong?"],
        (GentleShy, Distant) => &["Oh... I see...", "...Yes, understood."],
        (GentleShy, Casual) => &["...That hurts a little.", "...Why are you like this?"],
        (GentleShy, Friendly) => &["...Is it because of me? I'm sorry...", "...I'm upset. What's the matter?"],
        (ColdConfident, Distant) => &["...Is that so.", "Understood."],
        (ColdConfident, Casual) => &["What's the problem?", "And?"],
        (ColdConfident, Friendly) => &["What's wrong? What happened?", "What did I do wrong?"],
        (ColdShy, Distant) => &["...Yes.", "...Understood."],
        (ColdShy, Casual) => &["...Mm.", "...Fine."],
        (ColdShy, Friendly) => &["...Sorry.", "...What's the problem?"],
        (Balanced, Distant) => &["I see... understood.", "That's a bit disappointing."],
        (Balanced, Casual) => &["Hmm... I see.", "What's wrong?"],
        (Balanced, Friendly) => &["Did something happen? Talk to me.", "That hurts... what's the problem?"],
    }
}

fn encouragement_pool(persona: PersonaType) -> &'static [&'static str] {
    match persona {
        PersonaType::GentleConfident => &[
            "Yes! I can do it. Thank you!",
            "Your support is the best fuel there is!",
            "With you, I feel like I can pull anything off!",
        ],
        PersonaType::GentleShy => &[
            "Mm... I'll hang in there. Thanks!",
            "Having you here gives me courage...",
            "I'll try my best... thank you for cheering me on!",
        ],
        PersonaType::ColdConfident => &[
            "Of course. This is nothing.",
            "Don't worry. I'm not giving up.",
            "Thanks for the support. I'll get it done.",
        ],
        PersonaType::ColdShy => &["...Thanks. I'll keep going.", "...Mm. I'll try.", "...It's thanks to you."],
        PersonaType::Balanced => &[
            "Yes! I'll hang in there. Thanks!",
            "Your cheering gives me confidence!",
            "Let's both keep going!",
        ],
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockReply {
    pub response: String,
    pub stat_changes: StatDelta,
    pub sentiment: Sentiment,
}

/// Offline stand-in for the chat backend: keyword classification, template
/// replies and random stat deltas after a fake network delay.
pub struct MockResponder {
    rng: StdRng,
    latency_ms: RangeInclusive<u64>,
}

impl MockResponder {
    pub fn new(latency_ms: RangeInclusive<u64>) -> Self {
        Self {
            rng: StdRng::from_entropy(),
            latency_ms,
        }
    }

    /// Deterministic responder without latency.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            latency_ms: 0..=0,
        }
    }

    pub async fn respond(&mut self, message: &str, stats: &IdolStats) -> MockReply {
        let (lo, hi) = (*self.latency_ms.start(), *self.latency_ms.end());
        let delay = if hi > lo { self.rng.gen_range(lo..=hi) } else { lo };
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        self.reply(message, stats)
    }

    /// The reply without the simulated delay.
    pub fn reply(&mut self, message: &str, stats: &IdolStats) -> MockReply {
        let sentiment = Sentiment::detect(message);
        let tier = BondTier::from_bond_level(stats.bond_level);
        let persona = stats.persona;

        let (pool, stat_changes) = match sentiment {
            Sentiment::Positive => (
                positive_pool(persona, tier),
                StatDelta {
                    bond: Some(self.rng.gen_range(5..=10)),
                    kindness: Some(self.rng.gen_range(3..=5)),
                    confidence: None,
                },
            ),
            Sentiment::Negative => (
                negative_pool(persona, tier),
                StatDelta {
                    bond: Some(self.rng.gen_range(-10..=-5)),
                    kindness: Some(self.rng.gen_range(-5..=-3)),
                    confidence: None,
                },
            ),
            Sentiment::Encouragement => (
                encouragement_pool(persona),
                StatDelta {
                    bond: Some(self.rng.gen_range(3..=6)),
                    kindness: None,
                    confidence: Some(self.rng.gen_range(5..=8)),
                },
            ),
            Sentiment::Neutral => (
                positive_pool(persona, tier),
                StatDelta {
                    bond: Some(self.rng.gen_range(1..=3)),
                    ..Default::default()
                },
            ),
        };

        let response = pool.choose(&mut self.rng).copied().unwrap_or("...").to_string();
        MockReply {
            response,
            stat_changes,
            sentiment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PersonalityScore;

    fn stats(bond_level: i32, kindness: i32, confidence: i32) -> IdolStats {
        let personality = PersonalityScore { kindness, confidence };
        IdolStats {
            bond_level,
            personality,
            persona: personality.persona(),
        }
    }

    #[test]
    fn test_sentiment_detection() {
        assert_eq!(Sentiment::detect("You did AMAZING today"), Sentiment::Positive);
        assert_eq!(Sentiment::detect("오늘 정말 잘했어"), Sentiment::Positive);
        assert_eq!(Sentiment::detect("I'm so disappointed"), Sentiment::Negative);
        assert_eq!(Sentiment::detect("짜증나"), Sentiment::Negative);
        assert_eq!(Sentiment::detect("don't give up!"), Sentiment::Encouragement);
        assert_eq!(Sentiment::detect("힘내"), Sentiment::Encouragement);
        assert_eq!(Sentiment::detect("what did you eat?"), Sentiment::Neutral);
    }

    #[test]
    fn test_positive_delta_ranges() {
        let mut responder = MockResponder::seeded(7);
        let current = stats(50, 0, 0);
        for _ in 0..500 {
            let reply = responder.reply("great job on stage", &current);
            let bond = reply.stat_changes.bond.unwrap();
            let kindness = reply.stat_changes.kindness.unwrap();
            assert!((5..=10).contains(&bond), "bond {bond}");
            assert!((3..=5).contains(&kindness), "kindness {kindness}");
            assert_eq!(reply.stat_changes.confidence, None);
            assert!(positive_pool(current.persona, BondTier::Casual).contains(&reply.response.as_str()));
        }
    }

    #[test]
    fn test_negative_and_encouragement_ranges() {
        let mut responder = MockResponder::seeded(11);
        let current = stats(80, -50, 50);
        for _ in 0..300 {
            let reply = responder.reply("this is so annoying", &current);
            assert!((-10..=-5).contains(&reply.stat_changes.bond.unwrap()));
            assert!((-5..=-3).contains(&reply.stat_changes.kindness.unwrap()));
            assert!(negative_pool(PersonaType::ColdConfident, BondTier::Friendly)
                .contains(&reply.response.as_str()));

            let reply = responder.reply("keep going", &current);
            assert!((3..=6).contains(&reply.stat_changes.bond.unwrap()));
            assert!((5..=8).contains(&reply.stat_changes.confidence.unwrap()));
            assert_eq!(reply.stat_changes.kindness, None);
        }
    }

    #[test]
    fn test_neutral_only_moves_bond() {
        let mut responder = MockResponder::seeded(3);
        let current = stats(10, -40, -40);
        for _ in 0..300 {
            let reply = responder.reply("what's for dinner", &current);
            assert!((1..=3).contains(&reply.stat_changes.bond.unwrap()));
            assert_eq!(reply.stat_changes.kindness, None);
            assert_eq!(reply.stat_changes.confidence, None);
            assert!(positive_pool(PersonaType::ColdShy, BondTier::Distant)
                .contains(&reply.response.as_str()));
        }
    }

    #[test]
    fn test_every_pool_is_populated() {
        for persona in PersonaType::ALL {
            for tier in [BondTier::Distant, BondTier::Casual, BondTier::Friendly] {
                assert!(!positive_pool(persona, tier).is_empty());
                assert!(!negative_pool(persona, tier).is_empty());
            }
            assert!(!encouragement_pool(persona).is_empty());
        }
    }

    #[tokio::test]
    async fn test_respond_waits_for_latency() {
        let mut responder = MockResponder::new(20..=40);
        let started = std::time::Instant::now();
        let reply = responder.respond("love it", &stats(50, 0, 0)).await;
        assert!(started.elapsed() >= Duration::from_millis(20));
        assert_eq!(reply.sentiment, Sentiment::Positive);
    }
}
