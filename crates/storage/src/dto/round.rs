use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::{RoundStage, RoundTemplate, round_template::template_max_score};

/// One stage of a round definition as submitted by a client. Used for both
/// creation and whole-template replacement; stage order comes from payload
/// position.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct StageInput {
    #[validate(length(min = 1, max = 100, message = "Stage name must be between 1 and 100 characters"))]
    pub name: String,

    #[validate(length(max = 50))]
    pub distance: Option<String>,

    #[validate(range(min = 1, max = 200, message = "num_ends must be between 1 and 200"))]
    pub num_ends: i32,

    #[validate(range(min = 1, max = 12, message = "arrows_per_end must be between 1 and 12"))]
    pub arrows_per_end: i32,

    #[validate(length(min = 1, message = "allowed_values must not be empty"))]
    pub allowed_values: Vec<String>,

    pub value_score_map: BTreeMap<String, i32>,

    #[validate(range(min = 1))]
    pub max_score_per_arrow: i32,
}

impl StageInput {
    /// Cross-field invariant: every legal token must resolve through the
    /// value map, otherwise an end containing it could never be scored.
    pub fn validate_value_map(&self) -> Result<(), String> {
        for token in &self.allowed_values {
            if !self.value_score_map.contains_key(token) {
                return Err(format!(
                    "Stage '{}' has no score mapping for allowed value '{}'",
                    self.name, token
                ));
            }
        }
        Ok(())
    }
}

/// Payload for creating a custom round template, and for replacing one
/// wholesale on edit.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct RoundTemplateRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: String,

    #[validate(length(min = 1, max = 50))]
    pub organization: String,

    #[validate(length(max = 2000))]
    pub description: Option<String>,

    #[validate(length(min = 1, message = "At least one stage is required"))]
    #[validate(nested)]
    pub stages: Vec<StageInput>,
}

impl RoundTemplateRequest {
    /// Validation that spans fields within each stage.
    pub fn validate_stages(&self) -> Result<(), String> {
        for stage in &self.stages {
            stage.validate_value_map()?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StageResponse {
    pub stage_id: Uuid,
    pub stage_order: i32,
    pub name: String,
    pub distance: Option<String>,
    pub num_ends: i32,
    pub arrows_per_end: i32,
    pub allowed_values: Vec<String>,
    pub value_score_map: BTreeMap<String, i32>,
    pub max_score_per_arrow: i32,
}

impl From<RoundStage> for StageResponse {
    fn from(stage: RoundStage) -> Self {
        Self {
            stage_id: stage.stage_id,
            stage_order: stage.stage_order,
            name: stage.name,
            distance: stage.distance,
            num_ends: stage.num_ends,
            arrows_per_end: stage.arrows_per_end,
            allowed_values: stage.allowed_values.0,
            value_score_map: stage.value_score_map.0,
            max_score_per_arrow: stage.max_score_per_arrow,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RoundTemplateResponse {
    pub template_id: Uuid,
    pub name: String,
    pub organization: String,
    pub description: Option<String>,
    pub is_official: bool,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub max_score: i32,
    pub stages: Vec<StageResponse>,
}

impl RoundTemplateResponse {
    pub fn new(template: RoundTemplate, stages: Vec<RoundStage>) -> Self {
        let max_score = template_max_score(&stages);
        Self {
            template_id: template.template_id,
            name: template.name,
            organization: template.organization,
            description: template.description,
            is_official: template.is_official,
            created_by: template.created_by,
            created_at: template.created_at,
            max_score,
            stages: stages.into_iter().map(StageResponse::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage_input() -> StageInput {
        StageInput {
            name: "18m".to_string(),
            distance: Some("18m".to_string()),
            num_ends: 20,
            arrows_per_end: 3,
            allowed_values: vec!["X".to_string(), "10".to_string(), "M".to_string()],
            value_score_map: BTreeMap::from([
                ("X".to_string(), 10),
                ("10".to_string(), 10),
                ("M".to_string(), 0),
            ]),
            max_score_per_arrow: 10,
        }
    }

    #[test]
    fn test_value_map_covering_all_tokens_passes() {
        assert!(stage_input().validate_value_map().is_ok());
    }

    #[test]
    fn test_missing_token_mapping_rejected() {
        let mut stage = stage_input();
        stage.value_score_map.remove("M");
        let err = stage.validate_value_map().unwrap_err();
        assert!(err.contains("'M'"));
        assert!(err.contains("18m"));
    }

    #[test]
    fn test_extra_map_entries_are_allowed() {
        let mut stage = stage_input();
        stage.value_score_map.insert("9".to_string(), 9);
        assert!(stage.validate_value_map().is_ok());
    }
}
