//! backend/src/io/rest/mappers/assistant_mapper.rs

use shared::{
    AdviceResponse, NextEventResponse, PredictedEvent as SharedPredictedEvent, ScheduleResponse,
    ScheduleSuggestion as SharedScheduleSuggestion, SupportMessage as SharedSupportMessage,
};

use crate::domain::assistant_service::Advice;
use crate::domain::emotion_supporter::SupportMessage;
use crate::domain::models::pattern::{PredictedEvent, ScheduleSuggestion};

pub struct AssistantMapper;

impl AssistantMapper {
    pub fn to_schedule_dto(suggestions: Vec<ScheduleSuggestion>) -> ScheduleResponse {
        ScheduleResponse {
            suggestions: suggestions
                .into_iter()
                .map(|s| SharedScheduleSuggestion {
                    activity_type: s.activity_type,
                    suggested_time: s.suggested_time.to_rfc3339(),
                    confidence: s.confidence,
                    reason: s.reason,
                })
                .collect(),
        }
    }

    pub fn to_next_event_dto(event: Option<PredictedEvent>) -> NextEventResponse {
        NextEventResponse {
            event: event.map(|e| SharedPredictedEvent {
                activity_type: e.activity_type,
                predicted_time: e.predicted_time.to_rfc3339(),
                confidence: e.confidence,
            }),
        }
    }

    pub fn to_advice_dto(advice: Advice) -> AdviceResponse {
        AdviceResponse {
            question: advice.question,
            answer: advice.answer,
            category: advice.category,
            confidence: advice.confidence,
            sources: advice.sources,
        }
    }

    pub fn to_support_message_dto(message: SupportMessage) -> SharedSupportMessage {
        SharedSupportMessage {
            id: message.id.to_string(),
            text: message.text,
            level: message.level,
            timestamp: message.timestamp.to_rfc3339(),
            message_type: message.message_type,
        }
    }
}
