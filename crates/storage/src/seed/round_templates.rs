//! Official round templates seeded at startup.

use std::collections::BTreeMap;

use sqlx::PgPool;
use sqlx::types::Json;

use crate::error::Result;

struct StageSeed {
    name: &'static str,
    distance: &'static str,
    num_ends: i32,
    arrows_per_end: i32,
    allowed_values: &'static [&'static str],
    value_score_map: &'static [(&'static str, i32)],
    max_score_per_arrow: i32,
}

struct TemplateSeed {
    name: &'static str,
    organization: &'static str,
    description: &'static str,
    stages: &'static [StageSeed],
}

const TEN_RING_VALUES: &[&str] = &[
    "X", "10", "9", "8", "7", "6", "5", "4", "3", "2", "1", "M",
];

const TEN_RING_MAP: &[(&str, i32)] = &[
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
];

const TEMPLATES: &[TemplateSeed] = &[
    TemplateSeed {
        name: "WA Indoor 18m (Recurve)",
        organization: "WA",
        description: "World Archery Indoor round: 60 arrows at 18m on 40cm target face, 10-ring scoring with X",
        stages: &[StageSeed {
            name: "18m",
            distance: "18m",
            num_ends: 20,
            arrows_per_end: 3,
            allowed_values: TEN_RING_VALUES,
            value_score_map: TEN_RING_MAP,
            max_score_per_arrow: 10,
        }],
    },
    TemplateSeed {
        name: "WA Indoor 18m (Compound)",
        organization: "WA",
        description: "World Archery Indoor Compound: 60 arrows at 18m on triple spot, inner-10 scoring with X",
        stages: &[StageSeed {
            name: "18m Triple",
            distance: "18m",
            num_ends: 20,
            arrows_per_end: 3,
            allowed_values: &["X", "10", "9", "8", "7", "6", "M"],
            value_score_map: &[
                ("X", 10),
                ("10", 10),
                ("9", 9),
                ("8", 8),
                ("7", 7),
                ("6", 6),
                ("M", 0),
            ],
            max_score_per_arrow: 10,
        }],
    },
    TemplateSeed {
        name: "WA 720 (70m Recurve)",
        organization: "WA",
        description: "World Archery 720 round: 72 arrows at 70m on 122cm target face",
        stages: &[StageSeed {
            name: "70m",
            distance: "70m",
            num_ends: 12,
            arrows_per_end: 6,
            allowed_values: TEN_RING_VALUES,
            value_score_map: TEN_RING_MAP,
            max_score_per_arrow: 10,
        }],
    },
    TemplateSeed {
        name: "WA 1440 (Recurve)",
        organization: "WA",
        description: "World Archery 1440 round: 144 arrows over four distances on 122cm and 80cm faces",
        stages: &[
            StageSeed {
                name: "90m",
                distance: "90m",
                num_ends: 6,
                arrows_per_end: 6,
                allowed_values: TEN_RING_VALUES,
                value_score_map: TEN_RING_MAP,
                max_score_per_arrow: 10,
            },
            StageSeed {
                name: "70m",
                distance: "70m",
                num_ends: 6,
                arrows_per_end: 6,
                allowed_values: TEN_RING_VALUES,
                value_score_map: TEN_RING_MAP,
                max_score_per_arrow: 10,
            },
            StageSeed {
                name: "50m",
                distance: "50m",
                num_ends: 12,
                arrows_per_end: 3,
                allowed_values: TEN_RING_VALUES,
                value_score_map: TEN_RING_MAP,
                max_score_per_arrow: 10,
            },
            StageSeed {
                name: "30m",
                distance: "30m",
                num_ends: 12,
                arrows_per_end: 3,
                allowed_values: TEN_RING_VALUES,
                value_score_map: TEN_RING_MAP,
                max_score_per_arrow: 10,
            },
        ],
    },
    TemplateSeed {
        name: "Vegas 300",
        organization: "Vegas",
        description: "The Vegas Shoot: 30 arrows at 20yd on 40cm target, inner X ring",
        stages: &[StageSeed {
            name: "20yd",
            distance: "20yd",
            num_ends: 10,
            arrows_per_end: 3,
            allowed_values: TEN_RING_VALUES,
            value_score_map: TEN_RING_MAP,
            max_score_per_arrow: 10,
        }],
    },
    TemplateSeed {
        name: "NFAA Indoor 300",
        organization: "NFAA",
        description: "NFAA Indoor round: 60 arrows at 20yd, 5-ring blue target face, X=5",
        stages: &[StageSeed {
            name: "20yd",
            distance: "20yd",
            num_ends: 12,
            arrows_per_end: 5,
            allowed_values: &["X", "5", "4", "3", "2", "1", "M"],
            value_score_map: &[("X", 5), ("5", 5), ("4", 4), ("3", 3), ("2", 2), ("1", 1), ("M", 0)],
            max_score_per_arrow: 5,
        }],
    },
];

/// Seed the official template catalog. Idempotent: does nothing once any
/// template exists.
pub async fn seed_round_templates(pool: &PgPool) -> Result<()> {
    let already_seeded: Option<i32> =
        sqlx::query_scalar("SELECT 1 FROM round_templates LIMIT 1")
            .fetch_optional(pool)
            .await?;
    if already_seeded.is_some() {
        return Ok(());
    }

    let mut tx = pool.begin().await?;

    for template in TEMPLATES {
        let template_id: uuid::Uuid = sqlx::query_scalar(
            "INSERT INTO round_templates (name, organization, description, is_official) \
             VALUES ($1, $2, $3, TRUE) \
             RETURNING template_id",
        )
        .bind(template.name)
        .bind(template.organization)
        .bind(template.description)
        .fetch_one(&mut *tx)
        .await?;

        for (idx, stage) in template.stages.iter().enumerate() {
            let allowed: Vec<String> =
                stage.allowed_values.iter().map(|v| v.to_string()).collect();
            let value_map: BTreeMap<String, i32> = stage
                .value_score_map
                .iter()
                .map(|(v, s)| (v.to_string(), *s))
                .collect();

            sqlx::query(
                "INSERT INTO round_stages \
                     (template_id, stage_order, name, distance, num_ends, arrows_per_end, \
                      allowed_values, value_score_map, max_score_per_arrow) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            )
            .bind(template_id)
            .bind(idx as i32 + 1)
            .bind(stage.name)
            .bind(stage.distance)
            .bind(stage.num_ends)
            .bind(stage.arrows_per_end)
            .bind(Json(allowed))
            .bind(Json(value_map))
            .bind(stage.max_score_per_arrow)
            .execute(&mut *tx)
            .await?;
        }
    }

    tx.commit().await?;

    tracing::info!("Seeded {} official round templates", TEMPLATES.len());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_seed_stage_maps_all_allowed_values() {
        for template in TEMPLATES {
            for stage in template.stages {
                for value in stage.allowed_values {
                    assert!(
                        stage.value_score_map.iter().any(|(v, _)| v == value),
                        "{}/{} is missing a mapping for '{}'",
                        template.name,
                        stage.name,
                        value
                    );
                }
            }
        }
    }

    #[test]
    fn test_seed_max_scores_are_consistent() {
        for template in TEMPLATES {
            for stage in template.stages {
                let highest = stage
                    .value_score_map
                    .iter()
                    .map(|(_, score)| *score)
                    .max()
                    .unwrap_or(0);
                assert_eq!(
                    highest, stage.max_score_per_arrow,
                    "{}/{}",
                    template.name, stage.name
                );
            }
        }
    }
}
