//! backend/src/io/rest/mappers/baby_mapper.rs

use anyhow::Result;
use shared::{
    ActiveBabyResponse, Baby as SharedBaby, BabyAgeResponse, BabyListResponse, CreateBabyRequest,
    UpdateBabyRequest,
};

use super::parse_date;
use crate::domain::commands::baby::{CreateBabyCommand, UpdateBabyCommand};
use crate::domain::models::baby::{Baby as DomainBaby, BabyAge};

/// Mapper between shared Baby DTOs and the domain Baby model
pub struct BabyMapper;

impl BabyMapper {
    pub fn to_dto(domain: DomainBaby) -> SharedBaby {
        SharedBaby {
            id: domain.id.to_string(),
            name: domain.name,
            birth_date: domain.birth_date.format("%Y-%m-%d").to_string(),
            gender: domain.gender,
            profile_image_path: domain.profile_image_path,
            weight: domain.weight,
            height: domain.height,
            created_at: domain.created_at.to_rfc3339(),
            updated_at: domain.updated_at.to_rfc3339(),
        }
    }

    pub fn to_list_dto(babies: Vec<DomainBaby>) -> BabyListResponse {
        BabyListResponse {
            babies: babies.into_iter().map(Self::to_dto).collect(),
        }
    }

    pub fn to_active_dto(baby: Option<DomainBaby>) -> ActiveBabyResponse {
        ActiveBabyResponse {
            active_baby: baby.map(Self::to_dto),
        }
    }

    pub fn to_age_dto(age: BabyAge) -> BabyAgeResponse {
        BabyAgeResponse {
            months: age.months,
            days: age.days,
            age_string: age.display_string(),
        }
    }

    pub fn to_create_command(request: CreateBabyRequest) -> Result<CreateBabyCommand> {
        Ok(CreateBabyCommand {
            name: request.name,
            birth_date: parse_date(&request.birth_date)?,
            gender: request.gender,
            profile_image_path: request.profile_image_path,
            weight: request.weight,
            height: request.height,
        })
    }

    pub fn to_update_command(request: UpdateBabyRequest) -> Result<UpdateBabyCommand> {
        Ok(UpdateBabyCommand {
            name: request.name,
            birth_date: request.birth_date.as_deref().map(parse_date).transpose()?,
            gender: request.gender,
            profile_image_path: request.profile_image_path,
            weight: request.weight,
            height: request.height,
        })
    }
}
