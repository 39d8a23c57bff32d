//! Category hierarchy endpoints. Parent categories are fixed and
//! read-only; child categories are admin-managed and carry the size
//! configuration, validated before persistence.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::domain::{self, ParentKey, SizeConfig};
use crate::error::{Result, StoreError};
use crate::models::{Category, ChildCategory, ParentCategory};

use super::AppState;

pub(super) async fn list_legacy(State(s): State<AppState>) -> Result<Json<Vec<Category>>> {
    let categories = sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY name")
        .fetch_all(&s.db)
        .await?;
    Ok(Json(categories))
}

pub(super) async fn list_parents(State(s): State<AppState>) -> Result<Json<Vec<ParentCategory>>> {
    let parents =
        sqlx::query_as::<_, ParentCategory>("SELECT * FROM parent_categories ORDER BY name")
            .fetch_all(&s.db)
            .await?;
    Ok(Json(parents))
}

pub(super) async fn list_children(
    State(s): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Vec<ChildCategory>>> {
    let parent =
        sqlx::query_as::<_, ParentCategory>("SELECT * FROM parent_categories WHERE slug = $1")
            .bind(&slug)
            .fetch_optional(&s.db)
            .await?
            .ok_or(StoreError::NotFound("parent category"))?;
    let children = sqlx::query_as::<_, ChildCategory>(
        "SELECT * FROM child_categories WHERE parent_id = $1 ORDER BY name",
    )
    .bind(parent.id)
    .fetch_all(&s.db)
    .await?;
    Ok(Json(children))
}

#[derive(Debug, Deserialize, Validate)]
pub(super) struct CreateChildRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub slug: Option<String>,
    pub parent_key: String,
    pub description: Option<String>,
    pub size_config: serde_json::Value,
}

pub(super) async fn create_child(
    State(s): State<AppState>,
    Json(r): Json<CreateChildRequest>,
) -> Result<(StatusCode, Json<ChildCategory>)> {
    r.validate()?;
    let key = ParentKey::from_str(&r.parent_key)
        .ok_or_else(|| StoreError::Validation(format!("unknown parent category: {}", r.parent_key)))?;
    let parent =
        sqlx::query_as::<_, ParentCategory>("SELECT * FROM parent_categories WHERE key = $1")
            .bind(key.as_str())
            .fetch_optional(&s.db)
            .await?
            .ok_or(StoreError::NotFound("parent category"))?;

    let config = SizeConfig::parse(key, &r.size_config)
        .map_err(|e| StoreError::Validation(e.to_string()))?;

    let slug = r.slug.clone().unwrap_or_else(|| domain::slugify(&r.name));
    let child = sqlx::query_as::<_, ChildCategory>(
        "INSERT INTO child_categories (id, name, slug, parent_id, description, size_config) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(&r.name)
    .bind(&slug)
    .bind(parent.id)
    .bind(r.description.as_deref().unwrap_or(""))
    .bind(config.to_value())
    .fetch_one(&s.db)
    .await
    .map_err(|e| super::conflict_on_unique(e, "a child category with this name already exists"))?;
    Ok((StatusCode::CREATED, Json(child)))
}

#[derive(Debug, Deserialize, Validate)]
pub(super) struct UpdateChildRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub size_config: serde_json::Value,
}

pub(super) async fn update_child(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
    Json(r): Json<UpdateChildRequest>,
) -> Result<Json<ChildCategory>> {
    r.validate()?;
    // The parent is fixed for the child's lifetime; validation follows it.
    let row: Option<(String,)> = sqlx::query_as(
        "SELECT p.key FROM child_categories c \
         JOIN parent_categories p ON c.parent_id = p.id WHERE c.id = $1",
    )
    .bind(id)
    .fetch_optional(&s.db)
    .await?;
    let (key,) = row.ok_or(StoreError::NotFound("child category"))?;
    let key = ParentKey::from_str(&key)
        .ok_or_else(|| StoreError::Validation(format!("unknown parent category: {key}")))?;

    let config = SizeConfig::parse(key, &r.size_config)
        .map_err(|e| StoreError::Validation(e.to_string()))?;

    let slug = r.slug.clone().unwrap_or_else(|| domain::slugify(&r.name));
    let child = sqlx::query_as::<_, ChildCategory>(
        "UPDATE child_categories SET name = $2, slug = $3, description = $4, size_config = $5, \
         updated_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(&r.name)
    .bind(&slug)
    .bind(r.description.as_deref().unwrap_or(""))
    .bind(config.to_value())
    .fetch_optional(&s.db)
    .await
    .map_err(|e| super::conflict_on_unique(e, "a child category with this name already exists"))?
    .ok_or(StoreError::NotFound("child category"))?;
    Ok(Json(child))
}
