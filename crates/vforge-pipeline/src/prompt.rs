//! Prompt degradation ladder for bad-output retries.
//!
//! When the upstream model returns an unusable result, the same shot is
//! retried with a progressively simpler prompt. The three tiers form an
//! explicit, inspectable table rather than inline string surgery.
//!
//! Note: the de-intensification rules are tuned against one upstream
//! model's observed failure patterns and may need re-tuning if the
//! backend changes.

/// Maximum generation attempts per shot (one per ladder tier).
pub const MAX_GENERATION_ATTEMPTS: u32 = 3;

/// One rung of the degradation ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptTier {
    /// The shot prompt as planned.
    Original,
    /// Stylistic intensifiers and subordinate clauses stripped.
    DeIntensified,
    /// A minimal, generic restatement of the same action.
    MinimalGeneric,
}

/// The ladder, in escalation order. Attempt `n` (1-based) uses entry `n-1`.
pub const DEGRADATION_LADDER: &[PromptTier] = &[
    PromptTier::Original,
    PromptTier::DeIntensified,
    PromptTier::MinimalGeneric,
];

impl PromptTier {
    /// Tier used for a 1-based attempt number; attempts beyond the ladder
    /// stay on the last rung.
    pub fn for_attempt(attempt: u32) -> Self {
        let index = (attempt.max(1) as usize - 1).min(DEGRADATION_LADDER.len() - 1);
        DEGRADATION_LADDER[index]
    }
}

/// Stylistic amplifiers the upstream model tends to over-interpret.
const INTENSIFIERS: &[&str] = &[
    "ultra",
    "hyper",
    "extremely",
    "intensely",
    "dramatically",
    "violently",
    "brutally",
    "gritty",
    "graphic",
    "visceral",
    "explosive",
    "breathtaking",
    "stunning",
    "epic",
];

/// Clause openers that mark subordinate, scene-dressing detail.
const SUBORDINATORS: &[&str] = &[
    "while", "as", "with", "whose", "which", "where", "featuring", "bathed", "drenched",
    "surrounded",
];

/// Produce the prompt text for a given tier.
pub fn degrade(prompt: &str, tier: PromptTier) -> String {
    match tier {
        PromptTier::Original => prompt.trim().to_string(),
        PromptTier::DeIntensified => de_intensify(prompt),
        PromptTier::MinimalGeneric => minimal_restatement(prompt),
    }
}

/// Drop intensifier words and subordinate clauses, keeping the main action.
fn de_intensify(prompt: &str) -> String {
    let kept_clauses: Vec<String> = prompt
        .split(',')
        .map(str::trim)
        .filter(|clause| !clause.is_empty())
        .filter(|clause| {
            let first = clause
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_lowercase();
            !SUBORDINATORS.contains(&first.as_str())
        })
        .map(strip_intensifiers)
        .collect();

    let result = kept_clauses.join(", ");
    if result.is_empty() {
        // Everything was subordinate; fall back to a stripped original
        strip_intensifiers(prompt)
    } else {
        result
    }
}

/// Reduce the prompt to a plain statement of its main action.
fn minimal_restatement(prompt: &str) -> String {
    let core = prompt
        .split(',')
        .map(str::trim)
        .find(|clause| !clause.is_empty())
        .map(strip_intensifiers)
        .unwrap_or_default();

    if core.is_empty() {
        "A simple video scene".to_string()
    } else {
        format!("A simple video of {}", lowercase_first(&core))
    }
}

fn strip_intensifiers(clause: &str) -> String {
    clause
        .split_whitespace()
        .filter(|word| {
            let bare = word
                .trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase();
            !INTENSIFIERS.contains(&bare.as_str())
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn lowercase_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
