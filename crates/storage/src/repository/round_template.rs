use sqlx::{PgConnection, PgPool};
use sqlx::types::Json;
use uuid::Uuid;

use crate::dto::round::{RoundTemplateRequest, StageInput};
use crate::error::{Result, StorageError};
use crate::models::{RoundStage, RoundTemplate, SessionStatus};

const TEMPLATE_COLUMNS: &str =
    "template_id, name, organization, description, is_official, created_by, created_at";

const STAGE_COLUMNS: &str = "stage_id, template_id, stage_order, name, distance, num_ends, \
     arrows_per_end, allowed_values, value_score_map, max_score_per_arrow";

/// Repository for the round template catalog.
pub struct RoundTemplateRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RoundTemplateRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Official templates, plus the viewer's own custom templates when
    /// authenticated.
    pub async fn list_visible(&self, viewer: Option<Uuid>) -> Result<Vec<RoundTemplate>> {
        let sql = format!(
            "SELECT {TEMPLATE_COLUMNS} FROM round_templates \
             WHERE is_official OR created_by = $1 \
             ORDER BY name"
        );
        let templates = sqlx::query_as::<_, RoundTemplate>(&sql)
            .bind(viewer)
            .fetch_all(self.pool)
            .await?;

        Ok(templates)
    }

    pub async fn find_name(&self, template_id: Uuid) -> Result<Option<String>> {
        let name: Option<String> =
            sqlx::query_scalar("SELECT name FROM round_templates WHERE template_id = $1")
                .bind(template_id)
                .fetch_optional(self.pool)
                .await?;

        Ok(name)
    }

    pub async fn find_by_id(&self, template_id: Uuid) -> Result<RoundTemplate> {
        let sql = format!("SELECT {TEMPLATE_COLUMNS} FROM round_templates WHERE template_id = $1");
        let template = sqlx::query_as::<_, RoundTemplate>(&sql)
            .bind(template_id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(StorageError::NotFound)?;

        Ok(template)
    }

    /// Ordered stages of a template.
    pub async fn list_stages(&self, template_id: Uuid) -> Result<Vec<RoundStage>> {
        let sql = format!(
            "SELECT {STAGE_COLUMNS} FROM round_stages \
             WHERE template_id = $1 ORDER BY stage_order"
        );
        let stages = sqlx::query_as::<_, RoundStage>(&sql)
            .bind(template_id)
            .fetch_all(self.pool)
            .await?;

        Ok(stages)
    }

    /// Create a custom template owned by `owner`. Stage order is assigned
    /// densely from payload position.
    pub async fn create(
        &self,
        owner: Uuid,
        req: &RoundTemplateRequest,
    ) -> Result<(RoundTemplate, Vec<RoundStage>)> {
        let mut tx = self.pool.begin().await?;

        let template_sql = format!(
            "INSERT INTO round_templates (name, organization, description, is_official, created_by) \
             VALUES ($1, $2, $3, FALSE, $4) \
             RETURNING {TEMPLATE_COLUMNS}"
        );
        let template = sqlx::query_as::<_, RoundTemplate>(&template_sql)
            .bind(&req.name)
            .bind(&req.organization)
            .bind(&req.description)
            .bind(owner)
            .fetch_one(&mut *tx)
            .await?;

        let stages = insert_stages(&mut tx, template.template_id, &req.stages).await?;

        tx.commit().await?;

        Ok((template, stages))
    }

    /// Replace a custom template wholesale: template fields updated, old
    /// stages removed (ends referencing them keep their scores with the
    /// stage reference nulled), fresh stages inserted. Rejected while any
    /// session on the template is still in progress.
    pub async fn update(
        &self,
        template_id: Uuid,
        requester: Uuid,
        req: &RoundTemplateRequest,
    ) -> Result<(RoundTemplate, Vec<RoundStage>)> {
        let mut tx = self.pool.begin().await?;

        let template = Self::find_editable(&mut *tx, template_id, requester).await?;

        let in_progress: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM scoring_sessions WHERE template_id = $1 AND status = $2",
        )
        .bind(template_id)
        .bind(SessionStatus::InProgress.as_str())
        .fetch_one(&mut *tx)
        .await?;
        if in_progress > 0 {
            return Err(StorageError::conflict(
                "Template is in use by an in-progress session",
            ));
        }

        let update_sql = format!(
            "UPDATE round_templates SET name = $2, organization = $3, description = $4 \
             WHERE template_id = $1 \
             RETURNING {TEMPLATE_COLUMNS}"
        );
        let template = sqlx::query_as::<_, RoundTemplate>(&update_sql)
            .bind(template.template_id)
            .bind(&req.name)
            .bind(&req.organization)
            .bind(&req.description)
            .fetch_one(&mut *tx)
            .await?;

        // ends.stage_id is ON DELETE SET NULL, so history survives this.
        sqlx::query("DELETE FROM round_stages WHERE template_id = $1")
            .bind(template_id)
            .execute(&mut *tx)
            .await?;

        let stages = insert_stages(&mut tx, template_id, &req.stages).await?;

        tx.commit().await?;

        Ok((template, stages))
    }

    /// Delete a custom template; stages cascade, ends keep their data.
    pub async fn delete(&self, template_id: Uuid, requester: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        Self::find_editable(&mut *tx, template_id, requester).await?;

        sqlx::query("DELETE FROM round_templates WHERE template_id = $1")
            .bind(template_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                let err = StorageError::from(e);
                if err.is_foreign_key_violation() {
                    StorageError::conflict("Template is referenced by existing sessions")
                } else {
                    err
                }
            })?;

        tx.commit().await?;

        Ok(())
    }

    /// Shared guard for edit/delete: the template must exist, be custom,
    /// and be owned by the requester.
    async fn find_editable(
        conn: &mut PgConnection,
        template_id: Uuid,
        requester: Uuid,
    ) -> Result<RoundTemplate> {
        let sql = format!(
            "SELECT {TEMPLATE_COLUMNS} FROM round_templates WHERE template_id = $1 FOR UPDATE"
        );
        let template = sqlx::query_as::<_, RoundTemplate>(&sql)
            .bind(template_id)
            .fetch_optional(conn)
            .await?
            .ok_or(StorageError::NotFound)?;

        if template.is_official {
            return Err(StorageError::forbidden(
                "Official templates cannot be modified",
            ));
        }
        if template.created_by != Some(requester) {
            return Err(StorageError::forbidden(
                "Only the template's creator can modify it",
            ));
        }

        Ok(template)
    }
}

async fn insert_stages(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    template_id: Uuid,
    stages: &[StageInput],
) -> Result<Vec<RoundStage>> {
    let stage_sql = format!(
        "INSERT INTO round_stages \
             (template_id, stage_order, name, distance, num_ends, arrows_per_end, \
              allowed_values, value_score_map, max_score_per_arrow) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         RETURNING {STAGE_COLUMNS}"
    );

    let mut created = Vec::with_capacity(stages.len());
    for (idx, stage) in stages.iter().enumerate() {
        let row = sqlx::query_as::<_, RoundStage>(&stage_sql)
            .bind(template_id)
            .bind(idx as i32 + 1)
            .bind(&stage.name)
            .bind(&stage.distance)
            .bind(stage.num_ends)
            .bind(stage.arrows_per_end)
            .bind(Json(&stage.allowed_values))
            .bind(Json(&stage.value_score_map))
            .bind(stage.max_score_per_arrow)
            .fetch_one(&mut **tx)
            .await?;
        created.push(row);
    }

    Ok(created)
}
