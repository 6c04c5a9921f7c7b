use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{Result, StorageError};

/// A round definition a session is scored against: ordered stages, each with
/// its own end structure and scoring values.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct RoundTemplate {
    pub template_id: Uuid,
    pub name: String,
    pub organization: String,
    pub description: Option<String>,
    pub is_official: bool,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// One distance/phase of a round. Arrow value tokens are short strings
/// ("X", "10", "M") because target faces use non-numeric ring labels;
/// `value_score_map` resolves each token to its numeric score.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct RoundStage {
    pub stage_id: Uuid,
    pub template_id: Uuid,
    pub stage_order: i32,
    pub name: String,
    pub distance: Option<String>,
    pub num_ends: i32,
    pub arrows_per_end: i32,
    #[schema(value_type = Vec<String>)]
    pub allowed_values: Json<Vec<String>>,
    #[schema(value_type = BTreeMap<String, i32>)]
    pub value_score_map: Json<BTreeMap<String, i32>>,
    pub max_score_per_arrow: i32,
}

/// A validated, scored end: what `RoundStage::score_end` produces before
/// anything is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredEnd {
    pub arrows: Vec<ScoredArrow>,
    pub end_total: i32,
    pub x_count: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredArrow {
    pub arrow_number: i32,
    pub score_value: String,
    pub score_numeric: i32,
}

impl RoundStage {
    /// Validates a submitted end against this stage's rules and resolves each
    /// token to its numeric score. Numeric scores are resolved exactly once,
    /// here; persisted arrows never re-read the value map.
    pub fn score_end(&self, values: &[String]) -> Result<ScoredEnd> {
        if values.len() != self.arrows_per_end as usize {
            return Err(StorageError::validation(format!(
                "Expected {} arrows, got {}",
                self.arrows_per_end,
                values.len()
            )));
        }

        let mut arrows = Vec::with_capacity(values.len());
        let mut end_total = 0;
        let mut x_count = 0;

        for (idx, value) in values.iter().enumerate() {
            if !self.allowed_values.iter().any(|allowed| allowed == value) {
                return Err(StorageError::validation(format!(
                    "Invalid arrow value '{}'. Allowed values: {}",
                    value,
                    self.allowed_values.join(", ")
                )));
            }

            let numeric = *self.value_score_map.get(value).ok_or_else(|| {
                StorageError::validation(format!("No score mapping for value '{value}'"))
            })?;

            end_total += numeric;
            if value == "X" {
                x_count += 1;
            }
            arrows.push(ScoredArrow {
                arrow_number: idx as i32 + 1,
                score_value: value.clone(),
                score_numeric: numeric,
            });
        }

        Ok(ScoredEnd {
            arrows,
            end_total,
            x_count,
        })
    }

    /// Maximum score achievable on this stage.
    pub fn max_score(&self) -> i32 {
        self.num_ends * self.arrows_per_end * self.max_score_per_arrow
    }
}

/// Maximum score achievable across a template's stages, used for
/// percentage calculations.
pub fn template_max_score(stages: &[RoundStage]) -> i32 {
    stages.iter().map(RoundStage::max_score).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target_stage(arrows_per_end: i32, values: &[(&str, i32)]) -> RoundStage {
        RoundStage {
            stage_id: Uuid::new_v4(),
            template_id: Uuid::new_v4(),
            stage_order: 1,
            name: "20yd".to_string(),
            distance: Some("20yd".to_string()),
            num_ends: 10,
            arrows_per_end,
            allowed_values: Json(values.iter().map(|(v, _)| v.to_string()).collect()),
            value_score_map: Json(
                values
                    .iter()
                    .map(|(v, s)| (v.to_string(), *s))
                    .collect::<BTreeMap<_, _>>(),
            ),
            max_score_per_arrow: values.iter().map(|(_, s)| *s).max().unwrap_or(0),
        }
    }

    fn ten_ring() -> RoundStage {
        target_stage(
            3,
            &[
                ("X", 10),
                ("10", 10),
                ("9", 9),
                ("8", 8),
                ("7", 7),
                ("6", 6),
                ("5", 5),
                ("4", 4),
                ("3", 3),
                ("2", 2),
                ("1", 1),
                ("M", 0),
            ],
        )
    }

    fn tokens(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_perfect_end_scores_with_x_count() {
        let scored = ten_ring().score_end(&tokens(&["X", "X", "X"])).unwrap();
        assert_eq!(scored.end_total, 30);
        assert_eq!(scored.x_count, 3);
        assert_eq!(scored.arrows.len(), 3);
    }

    #[test]
    fn test_mixed_end_total_and_arrow_numbers() {
        let scored = ten_ring().score_end(&tokens(&["X", "10", "9"])).unwrap();
        assert_eq!(scored.end_total, 29);
        assert_eq!(scored.x_count, 1);
        let numbers: Vec<i32> = scored.arrows.iter().map(|a| a.arrow_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(scored.arrows[2].score_numeric, 9);
    }

    #[test]
    fn test_miss_scores_zero() {
        let scored = ten_ring().score_end(&tokens(&["M", "M", "M"])).unwrap();
        assert_eq!(scored.end_total, 0);
        assert_eq!(scored.x_count, 0);
    }

    #[test]
    fn test_wrong_arrow_count_rejected() {
        let err = ten_ring().score_end(&tokens(&["10", "9"])).unwrap_err();
        assert!(matches!(err, StorageError::Validation(_)));
        assert!(err.to_string().contains("Expected 3 arrows, got 2"));
    }

    #[test]
    fn test_illegal_token_rejected_with_allowed_set() {
        let five_ring = target_stage(
            5,
            &[("X", 5), ("5", 5), ("4", 4), ("3", 3), ("2", 2), ("1", 1), ("M", 0)],
        );
        let err = five_ring
            .score_end(&tokens(&["X", "5", "10", "3", "2"]))
            .unwrap_err();
        assert!(matches!(err, StorageError::Validation(_)));
        let msg = err.to_string();
        assert!(msg.contains("'10'"));
        assert!(msg.contains("X, 5, 4, 3, 2, 1, M"));
    }

    #[test]
    fn test_mapped_but_not_allowed_token_rejected() {
        let mut stage = ten_ring();
        stage.value_score_map.insert("11".to_string(), 11);
        assert!(stage.score_end(&tokens(&["11", "9", "9"])).is_err());
    }

    #[test]
    fn test_illegal_token_rejected_regardless_of_position() {
        for position in 0..3 {
            let mut values = tokens(&["9", "9", "9"]);
            values[position] = "Z".to_string();
            assert!(ten_ring().score_end(&values).is_err());
        }
    }

    #[test]
    fn test_max_score() {
        assert_eq!(ten_ring().max_score(), 300);
        let stage = target_stage(5, &[("X", 5), ("5", 5), ("M", 0)]);
        assert_eq!(stage.max_score(), 250);
    }
}
