//! Parent wellbeing: stress estimated from how the app is being used,
//! encouragement matched to that level and short relaxation exercises.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use shared::{RelaxationCategory, RelaxationTechnique, StressLevel, SupportMessageType, UserInteractionType};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};
use uuid::Uuid;

const HISTORY_LIMIT: usize = 100;
const RECENT_WINDOW: usize = 10;
const HIGH_STRESS_RATIO: f64 = 0.6;
const MEDIUM_STRESS_RATIO: f64 = 0.3;

const LOW_MESSAGES: &[&str] = &[
    "You're doing great! Keep up this parenting rhythm.",
    "Your baby is growing up healthy under your careful care.",
    "Remember to look after yourself too!",
];
const MEDIUM_MESSAGES: &[&str] = &[
    "Parenting really isn't easy, and you are already working hard.",
    "Take breaks when you can; caring for your baby includes caring for yourself.",
    "If you feel tired, don't hesitate to ask family and friends for help.",
];
const HIGH_MESSAGES: &[&str] = &[
    "Parenting brings many challenges, but you are not alone.",
    "Feeling stressed is normal; please reach out for support and help.",
    "Consider talking with a professional or with other parents about your experience.",
];

#[derive(Debug, Clone, PartialEq)]
pub struct UserInteraction {
    pub timestamp: DateTime<Utc>,
    pub interaction_type: UserInteractionType,
    pub context: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SupportMessage {
    pub id: Uuid,
    pub text: String,
    pub level: StressLevel,
    pub timestamp: DateTime<Utc>,
    pub message_type: SupportMessageType,
}

fn relaxation_techniques() -> Vec<RelaxationTechnique> {
    vec![
        RelaxationTechnique {
            name: "Deep breathing".to_string(),
            description: "Breathe in slowly for 4 seconds, hold for 4 seconds, then breathe out slowly for 4 seconds. Repeat 5-10 times.".to_string(),
            duration_secs: 300,
            category: RelaxationCategory::Breathing,
        },
        RelaxationTechnique {
            name: "Progressive muscle relaxation".to_string(),
            description: "Starting at your toes, tense and then relax each muscle group of your body in turn.".to_string(),
            duration_secs: 600,
            category: RelaxationCategory::MuscleRelaxation,
        },
        RelaxationTechnique {
            name: "Mindfulness meditation".to_string(),
            description: "Focus on the present moment, noticing your breath and body sensations without judging them.".to_string(),
            duration_secs: 900,
            category: RelaxationCategory::Mindfulness,
        },
    ]
}

fn is_stress_indicator(interaction_type: UserInteractionType) -> bool {
    matches!(
        interaction_type,
        UserInteractionType::FrequentLogging
            | UserInteractionType::LateNightActivity
            | UserInteractionType::MultipleRetries
    )
}

/// Level for a stress-indicator ratio; both thresholds are exclusive
pub fn stress_level_for_ratio(ratio: f64) -> StressLevel {
    if ratio > HIGH_STRESS_RATIO {
        StressLevel::High
    } else if ratio > MEDIUM_STRESS_RATIO {
        StressLevel::Medium
    } else {
        StressLevel::Low
    }
}

#[derive(Default)]
struct SupportState {
    interactions: VecDeque<UserInteraction>,
    messages: VecDeque<SupportMessage>,
}

/// Interaction and message history shared across clones
#[derive(Clone)]
pub struct EmotionSupporter {
    state: Arc<Mutex<SupportState>>,
    rng: Arc<Mutex<StdRng>>,
}

impl Default for EmotionSupporter {
    fn default() -> Self {
        Self::new()
    }
}

impl EmotionSupporter {
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Deterministic message and technique choice
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            state: Arc::new(Mutex::new(SupportState::default())),
            rng: Arc::new(Mutex::new(rng)),
        }
    }

    fn state(&self) -> MutexGuard<'_, SupportState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn rng(&self) -> MutexGuard<'_, StdRng> {
        self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn record_user_interaction(&self, interaction: UserInteraction) {
        debug!("Recording user interaction {:?}", interaction.interaction_type);
        let mut state = self.state();
        state.interactions.push_back(interaction);
        while state.interactions.len() > HISTORY_LIMIT {
            state.interactions.pop_front();
        }
    }

    /// Share of stress indicators among the last ten interactions.
    /// No history at all reads as low stress.
    pub fn detect_stress_level(&self) -> StressLevel {
        let state = self.state();
        let recent: Vec<&UserInteraction> = state.interactions.iter().rev().take(RECENT_WINDOW).collect();
        if recent.is_empty() {
            return StressLevel::Low;
        }

        let indicators = recent.iter().filter(|i| is_stress_indicator(i.interaction_type)).count();
        let ratio = indicators as f64 / recent.len() as f64;
        let level = stress_level_for_ratio(ratio);
        debug!("Stress ratio {:.2} over {} interactions: {:?}", ratio, recent.len(), level);
        level
    }

    /// Pick an encouragement for `level` and keep it in the message history
    pub fn generate_support_message(&self, level: StressLevel, now: DateTime<Utc>) -> SupportMessage {
        let texts = match level {
            StressLevel::Low => LOW_MESSAGES,
            StressLevel::Medium => MEDIUM_MESSAGES,
            StressLevel::High => HIGH_MESSAGES,
        };
        let text = texts.choose(&mut *self.rng()).copied().unwrap_or(MEDIUM_MESSAGES[0]);

        let message = SupportMessage {
            id: Uuid::new_v4(),
            text: text.to_string(),
            level,
            timestamp: now,
            message_type: SupportMessageType::Encouragement,
        };
        info!("Support message for {:?} stress", level);

        let mut state = self.state();
        state.messages.push_back(message.clone());
        while state.messages.len() > HISTORY_LIMIT {
            state.messages.pop_front();
        }
        message
    }

    /// Messages handed out so far, oldest first
    pub fn support_messages(&self) -> Vec<SupportMessage> {
        self.state().messages.iter().cloned().collect()
    }

    pub fn suggest_relaxation_technique(&self) -> RelaxationTechnique {
        let techniques = relaxation_techniques();
        let technique = techniques.choose(&mut *self.rng()).cloned();
        technique.unwrap_or_else(|| techniques[0].clone())
    }
}
