use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqliteConnection, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq, TS)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub label: Option<String>,
    pub description: Option<String>,
    pub parent_id: Option<Uuid>, // Self-reference, NULL for root categories
    pub full_path: String,       // Slash-delimited slugs of every ancestor, then our own
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One row of the flat category listing used to build pickers and trees
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq, TS)]
pub struct CategorySummary {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub parent_id: Option<Uuid>,
    pub full_path: String,
    pub subcategory_count: i64,
}

impl CategorySummary {
    pub fn has_subcategories(&self) -> bool {
        self.subcategory_count > 0
    }

    /// Number of slash-delimited segments in the full path
    pub fn depth(&self) -> usize {
        self.full_path.split('/').count()
    }
}

/// A category with the ids of its tools, the starting point of an edit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
pub struct CategoryWithTools {
    #[serde(flatten)]
    #[ts(flatten)]
    pub category: Category,
    pub tools: Vec<Uuid>,
    pub subcategory_count: i64,
}

impl std::ops::Deref for CategoryWithTools {
    type Target = Category;
    fn deref(&self) -> &Self::Target {
        &self.category
    }
}

/// Input of the category upsert: no `id` creates, an `id` updates
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, TS)]
pub struct UpsertCategory {
    pub id: Option<Uuid>,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    pub label: Option<String>,
    pub description: Option<String>,
    pub parent_id: Option<Uuid>,
    #[serde(default)]
    pub tools: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct DeleteCategories {
    pub ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
pub struct DeletedCategories {
    pub deleted: u64,
}

/// Column values written for a category once slug and path are resolved
#[derive(Debug, Clone)]
pub struct CategoryFields<'a> {
    pub name: &'a str,
    pub slug: &'a str,
    pub label: Option<&'a str>,
    pub description: Option<&'a str>,
    pub parent_id: Option<Uuid>,
    pub full_path: &'a str,
}

impl Category {
    pub async fn find_all_summaries(pool: &SqlitePool) -> Result<Vec<CategorySummary>, sqlx::Error> {
        sqlx::query_as::<_, CategorySummary>(
            r#"SELECT
  c.id,
  c.name,
  c.slug,
  c.parent_id,
  c.full_path,
  ( SELECT COUNT(*)
      FROM categories sub
     WHERE sub.parent_id = c.id
  )                                AS subcategory_count
FROM categories c
ORDER BY c.name ASC"#,
        )
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Category>(
            r#"SELECT id, name, slug, label, description, parent_id, full_path, created_at, updated_at
               FROM categories
               WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    pub async fn find_by_slug(pool: &SqlitePool, slug: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Category>(
            r#"SELECT id, name, slug, label, description, parent_id, full_path, created_at, updated_at
               FROM categories
               WHERE slug = $1"#,
        )
        .bind(slug)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_with_tools_by_slug(
        pool: &SqlitePool,
        slug: &str,
    ) -> Result<Option<CategoryWithTools>, sqlx::Error> {
        let Some(category) = Self::find_by_slug(pool, slug).await? else {
            return Ok(None);
        };
        let tools = Self::tool_ids(pool, category.id).await?;
        let subcategory_count = Self::subcategory_count(pool, category.id).await?;

        Ok(Some(CategoryWithTools {
            category,
            tools,
            subcategory_count,
        }))
    }

    pub async fn tool_ids<'e, E>(executor: E, id: Uuid) -> Result<Vec<Uuid>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_scalar::<_, Uuid>(
            r#"SELECT ct.tool_id
               FROM category_tools ct
               JOIN tools t ON t.id = ct.tool_id
               WHERE ct.category_id = $1
               ORDER BY t.name ASC"#,
        )
        .bind(id)
        .fetch_all(executor)
        .await
    }

    pub async fn subcategory_count<'e, E>(executor: E, id: Uuid) -> Result<i64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM categories WHERE parent_id = $1")
            .bind(id)
            .fetch_one(executor)
            .await
    }

    pub async fn find_children<'e, E>(executor: E, parent_id: Uuid) -> Result<Vec<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Category>(
            r#"SELECT id, name, slug, label, description, parent_id, full_path, created_at, updated_at
               FROM categories
               WHERE parent_id = $1
               ORDER BY name ASC"#,
        )
        .bind(parent_id)
        .fetch_all(executor)
        .await
    }

    pub async fn create<'e, E>(
        executor: E,
        id: Uuid,
        fields: &CategoryFields<'_>,
    ) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Category>(
            r#"INSERT INTO categories (id, name, slug, label, description, parent_id, full_path)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               RETURNING id, name, slug, label, description, parent_id, full_path, created_at, updated_at"#,
        )
        .bind(id)
        .bind(fields.name)
        .bind(fields.slug)
        .bind(fields.label)
        .bind(fields.description)
        .bind(fields.parent_id)
        .bind(fields.full_path)
        .fetch_one(executor)
        .await
    }

    pub async fn update<'e, E>(
        executor: E,
        id: Uuid,
        fields: &CategoryFields<'_>,
    ) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Category>(
            r#"UPDATE categories
               SET name = $2, slug = $3, label = $4, description = $5, parent_id = $6, full_path = $7,
                   updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING id, name, slug, label, description, parent_id, full_path, created_at, updated_at"#,
        )
        .bind(id)
        .bind(fields.name)
        .bind(fields.slug)
        .bind(fields.label)
        .bind(fields.description)
        .bind(fields.parent_id)
        .bind(fields.full_path)
        .fetch_one(executor)
        .await
    }

    pub async fn update_full_path<'e, E>(
        executor: E,
        id: Uuid,
        full_path: &str,
    ) -> Result<(), sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"UPDATE categories
               SET full_path = $2, updated_at = datetime('now', 'subsec')
               WHERE id = $1"#,
        )
        .bind(id)
        .bind(full_path)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Replace the tool associations of a category with exactly `tool_ids`
    pub async fn set_tools(
        conn: &mut SqliteConnection,
        id: Uuid,
        tool_ids: &[Uuid],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM category_tools WHERE category_id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        for tool_id in tool_ids {
            sqlx::query(
                r#"INSERT INTO category_tools (category_id, tool_id)
                   VALUES ($1, $2)
                   ON CONFLICT DO NOTHING"#,
            )
            .bind(id)
            .bind(tool_id)
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }

    pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<u64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
