use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Tool {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub website_url: String,
    pub tagline: Option<String>,
    pub description: Option<String>,
    pub is_featured: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The slice of a tool the category editor needs to offer it as an option
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq, TS)]
pub struct ToolSummary {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateTool {
    pub name: String,
    pub slug: String,
    pub website_url: String,
    pub tagline: Option<String>,
    pub description: Option<String>,
}

impl Tool {
    pub async fn create(pool: &SqlitePool, id: Uuid, data: &CreateTool) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Tool>(
            r#"INSERT INTO tools (id, name, slug, website_url, tagline, description)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING id, name, slug, website_url, tagline, description, is_featured, published_at, created_at, updated_at"#,
        )
        .bind(id)
        .bind(&data.name)
        .bind(&data.slug)
        .bind(&data.website_url)
        .bind(&data.tagline)
        .bind(&data.description)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Tool>(
            r#"SELECT id, name, slug, website_url, tagline, description, is_featured, published_at, created_at, updated_at
               FROM tools
               WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// Every tool, ordered by name, trimmed to what a picker displays
    pub async fn find_all_summaries(pool: &SqlitePool) -> Result<Vec<ToolSummary>, sqlx::Error> {
        sqlx::query_as::<_, ToolSummary>(
            r#"SELECT id, name, slug
               FROM tools
               ORDER BY name ASC"#,
        )
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DBService;

    fn create_tool(name: &str, slug: &str) -> CreateTool {
        CreateTool {
            name: name.to_string(),
            slug: slug.to_string(),
            website_url: format!("https://{slug}.example.com"),
            tagline: None,
            description: None,
        }
    }

    #[tokio::test]
    async fn test_summaries_are_sorted_by_name() {
        let db = DBService::new_in_memory().await.unwrap();
        Tool::create(&db.pool, Uuid::new_v4(), &create_tool("Zed", "zed"))
            .await
            .unwrap();
        let created = Tool::create(&db.pool, Uuid::new_v4(), &create_tool("Atom", "atom"))
            .await
            .unwrap();
        assert!(!created.is_featured);

        let summaries = Tool::find_all_summaries(&db.pool).await.unwrap();
        let names: Vec<_> = summaries.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Atom", "Zed"]);
        assert_eq!(summaries[0].id, created.id);
        assert_eq!(summaries[0].slug, "atom");
    }

    #[tokio::test]
    async fn test_find_by_id_missing() {
        let db = DBService::new_in_memory().await.unwrap();
        assert!(Tool::find_by_id(&db.pool, Uuid::new_v4()).await.unwrap().is_none());
    }
}
