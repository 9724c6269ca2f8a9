//! backend/src/io/rest/mappers/activity_mapper.rs

use anyhow::Result;
use chrono::NaiveDate;
use shared::{
    ActivityListResponse, ActivityRecord as SharedActivity, ActivitySummaryResponse, ActivityType,
    CreateActivityRequest, StatisticsResponse, TrendData, UpdateActivityRequest,
};
use std::collections::BTreeMap;

use super::{parse_id, parse_timestamp};
use crate::domain::commands::activity::{CreateActivityCommand, UpdateActivityCommand};
use crate::domain::models::activity::{ActivityRecord as DomainActivity, ActivityStatistics};

/// Mapper between shared activity DTOs and the domain ActivityRecord
pub struct ActivityMapper;

impl ActivityMapper {
    pub fn to_dto(domain: DomainActivity) -> SharedActivity {
        SharedActivity {
            id: domain.id.to_string(),
            baby_id: domain.baby_id.to_string(),
            activity_type: domain.activity_type,
            start_time: domain.start_time.to_rfc3339(),
            end_time: domain.end_time.map(|t| t.to_rfc3339()),
            duration_secs: domain.duration,
            details: domain.details,
            notes: domain.notes,
            created_by: domain.created_by.to_string(),
            created_at: domain.created_at.to_rfc3339(),
            updated_at: domain.updated_at.to_rfc3339(),
        }
    }

    pub fn to_list_dto(activities: Vec<DomainActivity>) -> ActivityListResponse {
        ActivityListResponse {
            activities: activities.into_iter().map(Self::to_dto).collect(),
        }
    }

    pub fn to_create_command(request: CreateActivityRequest) -> Result<CreateActivityCommand> {
        Ok(CreateActivityCommand {
            baby_id: parse_id(&request.baby_id)?,
            activity_type: request.activity_type,
            start_time: request.start_time.as_deref().map(parse_timestamp).transpose()?,
            end_time: request.end_time.as_deref().map(parse_timestamp).transpose()?,
            duration: request.duration_secs,
            details: request.details,
            notes: request.notes,
            created_by: request.created_by.as_deref().map(parse_id).transpose()?,
        })
    }

    pub fn to_update_command(request: UpdateActivityRequest) -> Result<UpdateActivityCommand> {
        Ok(UpdateActivityCommand {
            start_time: request.start_time.as_deref().map(parse_timestamp).transpose()?,
            end_time: request.end_time.as_deref().map(parse_timestamp).transpose()?,
            duration: request.duration_secs,
            details: request.details,
            notes: request.notes,
        })
    }

    pub fn to_summary_dto(date: NaiveDate, counts: BTreeMap<ActivityType, usize>) -> ActivitySummaryResponse {
        ActivitySummaryResponse {
            date: date.format("%Y-%m-%d").to_string(),
            counts,
        }
    }

    pub fn to_statistics_dto(statistics: ActivityStatistics) -> StatisticsResponse {
        StatisticsResponse {
            period: statistics.period,
            activity_counts: statistics.activity_counts,
            total_duration_secs: statistics.total_duration,
            averages: statistics.averages,
            trends: statistics
                .trends
                .into_iter()
                .map(|(name, trend)| {
                    (
                        name,
                        TrendData {
                            direction: trend.direction,
                            percentage: trend.percentage,
                            description: trend.description,
                        },
                    )
                })
                .collect(),
            generated_at: statistics.generated_at.to_rfc3339(),
        }
    }
}
