//! Category persistence rules: slug and path resolution, tool links, and
//! keeping descendant paths in step with their ancestors.

use std::collections::{HashSet, VecDeque};

use async_trait::async_trait;
use db::models::{
    category::{Category, CategoryFields, CategorySummary, CategoryWithTools, UpsertCategory},
    tool::{Tool, ToolSummary},
};
use sqlx::{SqliteConnection, SqlitePool};
use thiserror::Error;
use tracing::{debug, info};
use utils::slug::slugify;
use uuid::Uuid;

use super::{
    category_editor::{ActionError, CategoryEditorSource, CategoryUpsert},
    category_tree::{CategoryTreeNode, build_category_tree},
};

#[derive(Debug, Error)]
pub enum CategoryServiceError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Category not found")]
    NotFound,
    #[error("Name is required")]
    NameRequired,
    #[error("Name `{0}` does not produce a usable slug")]
    InvalidSlug(String),
    #[error("Parent category not found")]
    ParentNotFound,
    #[error("A category cannot be nested under itself or one of its subcategories")]
    InvalidParent,
    #[error("A category with slug `{0}` already exists")]
    SlugTaken(String),
    #[error("Tool `{0}` no longer exists")]
    ToolNotFound(Uuid),
}

impl From<CategoryServiceError> for ActionError {
    fn from(err: CategoryServiceError) -> Self {
        ActionError::new(err.to_string())
    }
}

#[derive(Clone)]
pub struct CategoryService {
    pool: SqlitePool,
}

impl CategoryService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<CategorySummary>, CategoryServiceError> {
        Ok(Category::find_all_summaries(&self.pool).await?)
    }

    pub async fn tree(&self) -> Result<Vec<CategoryTreeNode>, CategoryServiceError> {
        Ok(build_category_tree(self.list().await?))
    }

    pub async fn tool_options(&self) -> Result<Vec<ToolSummary>, CategoryServiceError> {
        Ok(Tool::find_all_summaries(&self.pool).await?)
    }

    pub async fn find_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<CategoryWithTools>, CategoryServiceError> {
        Ok(Category::find_with_tools_by_slug(&self.pool, slug).await?)
    }

    /// Create (no `id`) or update (with `id`) a category in one transaction
    pub async fn upsert(&self, data: UpsertCategory) -> Result<Category, CategoryServiceError> {
        let name = data.name.trim();
        if name.is_empty() {
            return Err(CategoryServiceError::NameRequired);
        }

        let slug = match data.slug.trim() {
            "" => slugify(name),
            given => slugify(given),
        };
        if slug.is_empty() {
            return Err(CategoryServiceError::InvalidSlug(name.to_string()));
        }

        let label = data.label.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let description = data
            .description
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let mut tools: Vec<Uuid> = Vec::with_capacity(data.tools.len());
        for tool in data.tools {
            if !tools.contains(&tool) {
                tools.push(tool);
            }
        }

        let mut tx = self.pool.begin().await?;

        let existing = match data.id {
            Some(id) => Some(
                Category::find_by_id(&mut *tx, id)
                    .await?
                    .ok_or(CategoryServiceError::NotFound)?,
            ),
            None => None,
        };

        let full_path = match data.parent_id {
            Some(parent_id) => {
                if Some(parent_id) == data.id {
                    return Err(CategoryServiceError::InvalidParent);
                }
                let parent = Category::find_by_id(&mut *tx, parent_id)
                    .await?
                    .ok_or(CategoryServiceError::ParentNotFound)?;
                if let Some(id) = data.id {
                    ensure_not_ancestor(&mut tx, id, &parent).await?;
                }
                format!("{}/{}", parent.full_path, slug)
            }
            None => slug.clone(),
        };

        for tool_id in &tools {
            if Tool::find_by_id(&mut *tx, *tool_id).await?.is_none() {
                return Err(CategoryServiceError::ToolNotFound(*tool_id));
            }
        }

        let fields = CategoryFields {
            name,
            slug: &slug,
            label,
            description,
            parent_id: data.parent_id,
            full_path: &full_path,
        };

        let saved = match &existing {
            Some(existing) => Category::update(&mut *tx, existing.id, &fields).await,
            None => Category::create(&mut *tx, Uuid::new_v4(), &fields).await,
        }
        .map_err(|err| slug_conflict(err, &slug))?;

        Category::set_tools(&mut tx, saved.id, &tools).await?;

        let moved = existing
            .as_ref()
            .is_some_and(|existing| existing.full_path != saved.full_path);
        if moved {
            let rewritten = rewrite_descendant_paths(&mut tx, saved.id, &saved.full_path).await?;
            debug!(
                category_id = %saved.id,
                rewritten,
                "Rewrote descendant category paths"
            );
        }

        tx.commit().await?;

        info!(
            category_id = %saved.id,
            slug = %saved.slug,
            full_path = %saved.full_path,
            tools = tools.len(),
            created = existing.is_none(),
            "Category upserted"
        );

        Ok(saved)
    }

    /// Delete categories by id. Surviving direct children become roots and
    /// their subtrees get fresh paths.
    pub async fn delete(&self, ids: &[Uuid]) -> Result<u64, CategoryServiceError> {
        let doomed: HashSet<Uuid> = ids.iter().copied().collect();
        let mut tx = self.pool.begin().await?;

        let mut orphans = Vec::new();
        for id in &doomed {
            for child in Category::find_children(&mut *tx, *id).await? {
                if !doomed.contains(&child.id) {
                    orphans.push(child.id);
                }
            }
        }

        let mut deleted = 0;
        for id in &doomed {
            deleted += Category::delete(&mut *tx, *id).await?;
        }

        for orphan in orphans {
            let Some(category) = Category::find_by_id(&mut *tx, orphan).await? else {
                continue;
            };
            Category::update_full_path(&mut *tx, category.id, &category.slug).await?;
            rewrite_descendant_paths(&mut tx, category.id, &category.slug).await?;
        }

        tx.commit().await?;
        info!(requested = ids.len(), deleted, "Categories deleted");
        Ok(deleted)
    }
}

fn slug_conflict(err: sqlx::Error, slug: &str) -> CategoryServiceError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return CategoryServiceError::SlugTaken(slug.to_string());
        }
    }
    CategoryServiceError::Database(err)
}

/// Fails when `id` appears in the ancestry of `parent`
async fn ensure_not_ancestor(
    conn: &mut SqliteConnection,
    id: Uuid,
    parent: &Category,
) -> Result<(), CategoryServiceError> {
    let mut visited = HashSet::from([parent.id]);
    let mut cursor = parent.parent_id;

    while let Some(ancestor_id) = cursor {
        if ancestor_id == id {
            return Err(CategoryServiceError::InvalidParent);
        }
        if !visited.insert(ancestor_id) {
            break;
        }
        cursor = Category::find_by_id(&mut *conn, ancestor_id)
            .await?
            .and_then(|ancestor| ancestor.parent_id);
    }
    Ok(())
}

/// Recompute `full_path` for every descendant of `root_id`; returns how many rows changed
async fn rewrite_descendant_paths(
    conn: &mut SqliteConnection,
    root_id: Uuid,
    root_path: &str,
) -> Result<usize, sqlx::Error> {
    let mut queue = VecDeque::from([(root_id, root_path.to_string())]);
    let mut visited = HashSet::from([root_id]);
    let mut rewritten = 0;

    while let Some((parent_id, parent_path)) = queue.pop_front() {
        for child in Category::find_children(&mut *conn, parent_id).await? {
            if !visited.insert(child.id) {
                continue;
            }
            let path = format!("{}/{}", parent_path, child.slug);
            if path != child.full_path {
                Category::update_full_path(&mut *conn, child.id, &path).await?;
                rewritten += 1;
            }
            queue.push_back((child.id, path));
        }
    }
    Ok(rewritten)
}

#[async_trait]
impl CategoryEditorSource for CategoryService {
    async fn tools(&self) -> Result<Vec<ToolSummary>, ActionError> {
        Ok(self.tool_options().await?)
    }

    async fn categories(&self) -> Result<Vec<CategorySummary>, ActionError> {
        Ok(self.list().await?)
    }

    async fn category(&self, slug: &str) -> Result<Option<CategoryWithTools>, ActionError> {
        Ok(self.find_by_slug(slug).await?)
    }
}

#[async_trait]
impl CategoryUpsert for CategoryService {
    async fn upsert_category(&self, data: UpsertCategory) -> Result<Category, ActionError> {
        Ok(self.upsert(data).await?)
    }
}
