//! Smart assistant: learned schedules, a small parenting knowledge base and
//! emotional support for the parent.

use anyhow::Result;
use chrono::{DateTime, Local, NaiveDate, Utc};
use shared::{AppContext, ParentingTip, RelaxationTechnique, StressLevel, TipCategory};
use tracing::info;
use uuid::Uuid;

use crate::domain::activity_service::ActivityService;
use crate::domain::emotion_supporter::{EmotionSupporter, SupportMessage, UserInteraction};
use crate::domain::models::pattern::{BabyPattern, PredictedEvent, ScheduleSuggestion};
use crate::domain::pattern_learner::PatternLearner;

const MATCHED_CONFIDENCE: f64 = 0.8;
const FALLBACK_CONFIDENCE: f64 = 0.5;

struct KnowledgeItem {
    category: TipCategory,
    question: &'static str,
    answer: &'static str,
    tags: &'static [&'static str],
}

const KNOWLEDGE_ITEMS: &[KnowledgeItem] = &[
    KnowledgeItem {
        category: TipCategory::Feeding,
        question: "How often should my baby feed?",
        answer: "Newborns usually feed every 2-3 hours; the gap grows gradually as the baby gets older.",
        tags: &["feed", "newborn", "frequency"],
    },
    KnowledgeItem {
        category: TipCategory::Sleep,
        question: "What if my baby's sleep is irregular?",
        answer: "Build a fixed bedtime routine, keep the room quiet and comfortable, and work towards regular sleep times step by step.",
        tags: &["sleep", "routine", "schedule"],
    },
    KnowledgeItem {
        category: TipCategory::Development,
        question: "How can I support my baby's brain development?",
        answer: "Talk and sing to your baby, offer varied sensory experiences and play interactive games together.",
        tags: &["develop", "brain", "interact"],
    },
];

/// Answer to a free-text parenting question
#[derive(Debug, Clone, PartialEq)]
pub struct Advice {
    pub question: String,
    pub answer: String,
    pub category: TipCategory,
    pub confidence: f64,
    pub sources: Vec<String>,
}

fn daily_tips() -> Vec<ParentingTip> {
    vec![
        ParentingTip {
            title: "Tip of the day".to_string(),
            content: "Eye contact with your baby builds your bond and supports social development.".to_string(),
            category: TipCategory::Development,
        },
        ParentingTip {
            title: "Feeding cues".to_string(),
            content: "Watch for hunger signals such as sucking motions or rooting, and respond promptly.".to_string(),
            category: TipCategory::Feeding,
        },
        ParentingTip {
            title: "Sleep environment".to_string(),
            content: "Keeping the nursery at 18-20°C helps the baby sleep better.".to_string(),
            category: TipCategory::Sleep,
        },
    ]
}

#[derive(Clone)]
pub struct AssistantService {
    learner: PatternLearner,
    activity_service: ActivityService,
    emotion_supporter: EmotionSupporter,
}

impl AssistantService {
    pub fn new(activity_service: ActivityService, learner: PatternLearner) -> Self {
        Self::with_emotion_supporter(activity_service, learner, EmotionSupporter::new())
    }

    pub fn with_emotion_supporter(
        activity_service: ActivityService,
        learner: PatternLearner,
        emotion_supporter: EmotionSupporter,
    ) -> Self {
        Self { learner, activity_service, emotion_supporter }
    }

    /// Relearn the baby's rhythm from its full activity history
    pub fn learn_baby_patterns(&self, baby_id: Uuid) -> Result<BabyPattern> {
        let activities = self.activity_service.load_activities(baby_id)?;
        Ok(self.learner.learn_patterns(baby_id, &activities))
    }

    pub fn generate_schedule_suggestions(&self, baby_id: Uuid, date: NaiveDate) -> Vec<ScheduleSuggestion> {
        self.learner.generate_daily_schedule(baby_id, date)
    }

    pub fn next_predicted_event(&self, baby_id: Uuid, now: DateTime<Local>) -> Option<PredictedEvent> {
        self.learner.next_predicted_event(baby_id, now)
    }

    /// Keyword lookup in the knowledge base; unmatched questions get a
    /// general recommendation with lower confidence
    pub fn get_advice(&self, query: &str) -> Advice {
        info!("Advice requested: {}", query);
        let lowercase_query = query.to_lowercase();

        let matched = KNOWLEDGE_ITEMS.iter().find(|item| {
            item.tags.iter().any(|tag| lowercase_query.contains(tag))
                || item.question.to_lowercase().contains(&lowercase_query)
        });

        match matched {
            Some(item) => Advice {
                question: query.to_string(),
                answer: item.answer.to_string(),
                category: item.category,
                confidence: MATCHED_CONFIDENCE,
                sources: vec!["Parenting knowledge base".to_string()],
            },
            None => Advice {
                question: query.to_string(),
                answer: "Consider asking a paediatrician or parenting specialist for advice tailored to your baby.".to_string(),
                category: TipCategory::General,
                confidence: FALLBACK_CONFIDENCE,
                sources: vec!["General advice".to_string()],
            },
        }
    }

    pub fn daily_tips(&self) -> Vec<ParentingTip> {
        daily_tips()
    }

    pub fn contextual_tips(&self, context: AppContext) -> Vec<ParentingTip> {
        let tips = daily_tips();
        match context {
            AppContext::HomeScreen => tips.into_iter().take(2).collect(),
            AppContext::FeedingLog => tips.into_iter().filter(|t| t.category == TipCategory::Feeding).collect(),
            AppContext::SleepLog => tips.into_iter().filter(|t| t.category == TipCategory::Sleep).collect(),
        }
    }

    pub fn record_user_interaction(&self, interaction: UserInteraction) {
        self.emotion_supporter.record_user_interaction(interaction);
    }

    pub fn detect_user_stress_level(&self) -> StressLevel {
        self.emotion_supporter.detect_stress_level()
    }

    pub fn provide_support_message(&self, level: StressLevel, now: DateTime<Utc>) -> SupportMessage {
        self.emotion_supporter.generate_support_message(level, now)
    }

    pub fn support_messages(&self) -> Vec<SupportMessage> {
        self.emotion_supporter.support_messages()
    }

    pub fn suggest_relaxation_technique(&self) -> RelaxationTechnique {
        self.emotion_supporter.suggest_relaxation_technique()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::commands::activity::CreateActivityCommand;
    use crate::domain::events::EventBus;
    use crate::storage::csv::test_utils::RepositoryTestHelper;
    use chrono::{Duration, TimeZone, Utc};
    use shared::{ActivityDetails, ActivityType, SleepDetails};
    use std::sync::Arc;

    fn setup() -> (RepositoryTestHelper, ActivityService, AssistantService) {
        let helper = RepositoryTestHelper::new().unwrap();
        let activities = ActivityService::new(Arc::new(helper.env.connection.clone()), EventBus::new());
        let assistant = AssistantService::new(activities.clone(), PatternLearner::new());
        (helper, activities, assistant)
    }

    #[test]
    fn test_default_schedule_without_history() {
        let (helper, _activities, assistant) = setup();
        let baby = helper.create_test_baby("Noa").unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 5, 1).unwrap();

        let suggestions = assistant.generate_schedule_suggestions(baby.id, date);
        assert_eq!(suggestions.len(), 3);
        assert_eq!(suggestions[0].activity_type, ActivityType::Feeding);
        assert!(assistant.next_predicted_event(baby.id, Local::now()).is_none());
    }

    #[test]
    fn test_learned_naps_drive_schedule() {
        let (helper, activities, assistant) = setup();
        let baby = helper.create_test_baby("Noa").unwrap();

        for days_ago in 1..=3 {
            let day = Local::now().date_naive() - Duration::days(days_ago);
            let start = Local
                .from_local_datetime(&day.and_hms_opt(13, 0, 0).unwrap())
                .earliest()
                .unwrap()
                .with_timezone(&Utc);
            activities
                .add_activity(CreateActivityCommand {
                    baby_id: baby.id,
                    activity_type: ActivityType::Sleep,
                    start_time: Some(start),
                    end_time: Some(start + Duration::hours(1)),
                    duration: None,
                    details: ActivityDetails::Sleep(SleepDetails { quality: None, location: None }),
                    notes: None,
                    created_by: None,
                })
                .unwrap();
        }

        let pattern = assistant.learn_baby_patterns(baby.id).unwrap();
        let sleep = pattern.sleep.unwrap();
        assert_eq!(sleep.typical_sleep_times, vec![13 * 60]);
        assert_eq!(sleep.average_duration, 3600.0);

        let suggestions = assistant.generate_schedule_suggestions(baby.id, Local::now().date_naive());
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].activity_type, ActivityType::Sleep);
    }

    #[test]
    fn test_advice_keyword_match_and_fallback() {
        let (_helper, _activities, assistant) = setup();

        let advice = assistant.get_advice("My baby will not SLEEP at night");
        assert_eq!(advice.category, TipCategory::Sleep);
        assert_eq!(advice.confidence, 0.8);

        let fallback = assistant.get_advice("Which stroller should I buy?");
        assert_eq!(fallback.category, TipCategory::General);
        assert_eq!(fallback.confidence, 0.5);
    }

    #[test]
    fn test_contextual_tips() {
        let (_helper, _activities, assistant) = setup();
        assert_eq!(assistant.daily_tips().len(), 3);
        assert_eq!(assistant.contextual_tips(AppContext::HomeScreen).len(), 2);

        let feeding = assistant.contextual_tips(AppContext::FeedingLog);
        assert_eq!(feeding.len(), 1);
        assert_eq!(feeding[0].category, TipCategory::Feeding);
        assert_eq!(assistant.contextual_tips(AppContext::SleepLog)[0].category, TipCategory::Sleep);
    }

    #[test]
    fn test_support_follows_recorded_interactions() {
        let helper = RepositoryTestHelper::new().unwrap();
        let activities = ActivityService::new(Arc::new(helper.env.connection.clone()), EventBus::new());
        let assistant =
            AssistantService::with_emotion_supporter(activities, PatternLearner::new(), EmotionSupporter::with_seed(5));
        assert_eq!(assistant.detect_user_stress_level(), StressLevel::Low);

        let at = Utc.with_ymd_and_hms(2026, 3, 1, 3, 0, 0).unwrap();
        for interaction_type in [
            shared::UserInteractionType::LateNightActivity,
            shared::UserInteractionType::MultipleRetries,
            shared::UserInteractionType::NormalLogging,
        ] {
            assistant.record_user_interaction(UserInteraction { timestamp: at, interaction_type, context: None });
        }
        let level = assistant.detect_user_stress_level();
        assert_eq!(level, StressLevel::High);

        let message = assistant.provide_support_message(level, at);
        assert_eq!(message.level, StressLevel::High);
        assert_eq!(assistant.support_messages(), vec![message]);
        assert!(assistant.suggest_relaxation_technique().duration_secs >= 300);
    }
}
