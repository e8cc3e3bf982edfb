//! Loading the category editor: the data it reads and the upsert it submits through.

use async_trait::async_trait;
use db::models::{
    category::{Category, CategorySummary, CategoryWithTools, UpsertCategory},
    tool::ToolSummary,
};
use thiserror::Error;
use tracing::debug;

use super::{
    category_form::CategoryForm,
    category_tree::{CategoryTreeNode, build_category_tree},
};

/// Failure reported back to the editor, carrying a message fit for display
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ActionError {
    pub message: String,
}

impl ActionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Read side of the editor
#[async_trait]
pub trait CategoryEditorSource: Send + Sync {
    async fn tools(&self) -> Result<Vec<ToolSummary>, ActionError>;

    async fn categories(&self) -> Result<Vec<CategorySummary>, ActionError>;

    async fn category(&self, slug: &str) -> Result<Option<CategoryWithTools>, ActionError>;
}

/// Write side of the editor: create without an id, update with one
#[async_trait]
pub trait CategoryUpsert: Send + Sync {
    async fn upsert_category(&self, data: UpsertCategory) -> Result<Category, ActionError>;
}

/// Everything the editor shows once its inputs have resolved
#[derive(Debug, Clone)]
pub struct CategoryEditor {
    pub tools: Vec<ToolSummary>,
    pub categories: Vec<CategoryTreeNode>,
    pub form: CategoryForm,
}

/// Await the tool list, the category list and, when `slug` is given, the
/// category being edited. Nothing is returned until all of them resolve; the
/// first failure wins.
pub async fn load_category_editor<S>(
    source: &S,
    slug: Option<&str>,
) -> Result<CategoryEditor, ActionError>
where
    S: CategoryEditorSource + ?Sized,
{
    let existing = async {
        match slug {
            Some(slug) => source
                .category(slug)
                .await?
                .map(Some)
                .ok_or_else(|| ActionError::new(format!("Category `{slug}` not found"))),
            None => Ok(None),
        }
    };

    let (tools, categories, existing) =
        tokio::try_join!(source.tools(), source.categories(), existing)?;

    debug!(
        tools = tools.len(),
        categories = categories.len(),
        editing = slug.unwrap_or("<new>"),
        "Category editor inputs loaded"
    );

    let form = match &existing {
        Some(category) => CategoryForm::edit(category),
        None => CategoryForm::new(),
    };

    Ok(CategoryEditor {
        tools,
        categories: build_category_tree(categories),
        form,
    })
}
