use sqlx::PgPool;
use storage::{
    dto::round::{RoundTemplateRequest, RoundTemplateResponse},
    error::Result,
    repository::round_template::RoundTemplateRepository,
};
use uuid::Uuid;

/// Templates visible to the viewer: officials plus their own customs.
pub async fn list_rounds(pool: &PgPool, viewer: Option<Uuid>) -> Result<Vec<RoundTemplateResponse>> {
    let repo = RoundTemplateRepository::new(pool);
    let templates = repo.list_visible(viewer).await?;

    let mut rounds = Vec::with_capacity(templates.len());
    for template in templates {
        let stages = repo.list_stages(template.template_id).await?;
        rounds.push(RoundTemplateResponse::new(template, stages));
    }

    Ok(rounds)
}

/// A template with its ordered stages.
pub async fn get_round(pool: &PgPool, template_id: Uuid) -> Result<RoundTemplateResponse> {
    let repo = RoundTemplateRepository::new(pool);
    let template = repo.find_by_id(template_id).await?;
    let stages = repo.list_stages(template_id).await?;

    Ok(RoundTemplateResponse::new(template, stages))
}

/// Create a custom template owned by the requester.
pub async fn create_round(
    pool: &PgPool,
    owner: Uuid,
    request: &RoundTemplateRequest,
) -> Result<RoundTemplateResponse> {
    let repo = RoundTemplateRepository::new(pool);
    let (template, stages) = repo.create(owner, request).await?;

    Ok(RoundTemplateResponse::new(template, stages))
}

/// Replace a custom template wholesale.
pub async fn update_round(
    pool: &PgPool,
    template_id: Uuid,
    requester: Uuid,
    request: &RoundTemplateRequest,
) -> Result<RoundTemplateResponse> {
    let repo = RoundTemplateRepository::new(pool);
    let (template, stages) = repo.update(template_id, requester, request).await?;

    Ok(RoundTemplateResponse::new(template, stages))
}

/// Delete a custom template.
pub async fn delete_round(pool: &PgPool, template_id: Uuid, requester: Uuid) -> Result<()> {
    let repo = RoundTemplateRepository::new(pool);
    repo.delete(template_id, requester).await
}
