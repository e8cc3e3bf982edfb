//! Form state of the category editor: field binding, derived fields,
//! validation and the submit flow.

use std::collections::BTreeMap;

use db::models::category::{Category, CategoryWithTools, UpsertCategory};
use serde::{Deserialize, Serialize};
use strum_macros::Display;
use thiserror::Error;
use tracing::{info, warn};
use ts_rs::TS;
use utils::slug::{is_valid_slug, slugify};
use uuid::Uuid;

use super::category_editor::CategoryUpsert;

pub const MAX_LABEL_LEN: usize = 120;
pub const MAX_DESCRIPTION_LEN: usize = 2000;

/// Admin page of the category with `slug`
pub fn category_admin_path(slug: &str) -> String {
    format!("/admin/categories/{slug}")
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FormField {
    Name,
    Slug,
    Label,
    Description,
    ParentId,
    Tools,
}

/// Per-field validation messages
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors(BTreeMap<FormField, String>);

impl FieldErrors {
    pub fn get(&self, field: FormField) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = FormField> + '_ {
        self.0.keys().copied()
    }

    fn insert(&mut self, field: FormField, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    fn clear(&mut self, field: FormField) {
        self.0.remove(&field);
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CategoryFormError {
    #[error("the parent of a category with subcategories cannot be changed")]
    ParentLocked,
}

/// Toast-style message produced by a submit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", content = "message", rename_all = "lowercase")]
pub enum Notification {
    Success(String),
    Error(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Validation failed; nothing was sent
    Invalid(FieldErrors),
    Saved {
        category: Category,
        notification: Notification,
        /// Where to navigate after a create or a slug change
        redirect: Option<String>,
    },
    /// The upsert was rejected; form values are left as they were
    Failed { notification: Notification },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryFormValues {
    pub name: String,
    pub slug: String,
    pub label: String,
    pub description: String,
    pub parent_id: Option<Uuid>,
    pub tools: Vec<Uuid>,
}

impl CategoryFormValues {
    /// Check every field and produce the upsert payload for `id`
    pub fn validate(&self, id: Option<Uuid>) -> Result<UpsertCategory, FieldErrors> {
        let mut errors = FieldErrors::default();

        let name = self.name.trim();
        if name.is_empty() {
            errors.insert(FormField::Name, "Name is required");
        }

        let slug = self.slug.trim();
        if !slug.is_empty() && !is_valid_slug(slug) {
            errors.insert(
                FormField::Slug,
                "Slug may only contain lowercase letters, numbers and single hyphens",
            );
        }

        let label = self.label.trim();
        if label.chars().count() > MAX_LABEL_LEN {
            errors.insert(
                FormField::Label,
                format!("Label must be at most {MAX_LABEL_LEN} characters"),
            );
        }

        let description = self.description.trim();
        if description.chars().count() > MAX_DESCRIPTION_LEN {
            errors.insert(
                FormField::Description,
                format!("Description must be at most {MAX_DESCRIPTION_LEN} characters"),
            );
        }

        if id.is_some() && self.parent_id == id {
            errors.insert(FormField::ParentId, "A category cannot be its own parent");
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        let mut tools = Vec::with_capacity(self.tools.len());
        for tool in &self.tools {
            if !tools.contains(tool) {
                tools.push(*tool);
            }
        }

        Ok(UpsertCategory {
            id,
            name: name.to_string(),
            slug: slug.to_string(),
            label: non_empty(label),
            description: non_empty(description),
            parent_id: self.parent_id,
            tools,
        })
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SavedCategory {
    id: Uuid,
    slug: String,
    has_subcategories: bool,
}

/// Editable state of one category, new or existing
#[derive(Debug, Clone, Default)]
pub struct CategoryForm {
    saved: Option<SavedCategory>,
    values: CategoryFormValues,
    errors: FieldErrors,
}

impl CategoryForm {
    /// Empty form for a category that does not exist yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Form seeded from an existing category
    pub fn edit(category: &CategoryWithTools) -> Self {
        Self {
            saved: Some(SavedCategory {
                id: category.id,
                slug: category.slug.clone(),
                has_subcategories: category.subcategory_count > 0,
            }),
            values: CategoryFormValues {
                name: category.name.clone(),
                slug: category.slug.clone(),
                label: category.label.clone().unwrap_or_default(),
                description: category.description.clone().unwrap_or_default(),
                parent_id: category.parent_id,
                tools: category.tools.clone(),
            },
            errors: FieldErrors::default(),
        }
    }

    pub fn is_new(&self) -> bool {
        self.saved.is_none()
    }

    pub fn id(&self) -> Option<Uuid> {
        self.saved.as_ref().map(|saved| saved.id)
    }

    pub fn values(&self) -> &CategoryFormValues {
        &self.values
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn error(&self, field: FormField) -> Option<&str> {
        self.errors.get(field)
    }

    /// Sets the name. While the category is new, slug and label follow it.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.values.name = name.into();
        self.errors.clear(FormField::Name);

        if self.is_new() {
            let name = self.values.name.trim();
            self.values.slug = slugify(name);
            self.values.label = if name.is_empty() {
                String::new()
            } else {
                format!("{name} Tools")
            };
            self.errors.clear(FormField::Slug);
            self.errors.clear(FormField::Label);
        }
    }

    pub fn set_slug(&mut self, slug: impl Into<String>) {
        self.values.slug = slug.into();
        self.errors.clear(FormField::Slug);
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.values.label = label.into();
        self.errors.clear(FormField::Label);
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.values.description = description.into();
        self.errors.clear(FormField::Description);
    }

    /// A category that already has subcategories keeps its parent
    pub fn can_change_parent(&self) -> bool {
        !self
            .saved
            .as_ref()
            .is_some_and(|saved| saved.has_subcategories)
    }

    pub fn set_parent(&mut self, parent_id: Option<Uuid>) -> Result<(), CategoryFormError> {
        if parent_id != self.values.parent_id && !self.can_change_parent() {
            return Err(CategoryFormError::ParentLocked);
        }
        self.values.parent_id = parent_id;
        self.errors.clear(FormField::ParentId);
        Ok(())
    }

    pub fn set_tools(&mut self, tools: Vec<Uuid>) {
        self.values.tools = tools;
        self.errors.clear(FormField::Tools);
    }

    /// Adds the tool when absent, removes it when present
    pub fn toggle_tool(&mut self, tool_id: Uuid) {
        if let Some(position) = self.values.tools.iter().position(|id| *id == tool_id) {
            self.values.tools.remove(position);
        } else {
            self.values.tools.push(tool_id);
        }
        self.errors.clear(FormField::Tools);
    }

    /// Validate the current values, keeping the resulting errors on the form
    pub fn validate(&mut self) -> Result<UpsertCategory, FieldErrors> {
        match self.values.validate(self.id()) {
            Ok(payload) => {
                self.errors = FieldErrors::default();
                Ok(payload)
            }
            Err(errors) => {
                self.errors = errors.clone();
                Err(errors)
            }
        }
    }

    /// Validate and send the form through `upsert`, one attempt.
    ///
    /// A successful save turns a new form into an edit of the saved category,
    /// so later name changes stop deriving slug and label.
    pub async fn submit<U>(&mut self, upsert: &U) -> SubmitOutcome
    where
        U: CategoryUpsert + ?Sized,
    {
        let payload = match self.validate() {
            Ok(payload) => payload,
            Err(errors) => return SubmitOutcome::Invalid(errors),
        };

        let was_new = self.is_new();
        match upsert.upsert_category(payload).await {
            Ok(category) => {
                let slug_changed = self
                    .saved
                    .as_ref()
                    .is_some_and(|saved| saved.slug != category.slug);
                let redirect =
                    (was_new || slug_changed).then(|| category_admin_path(&category.slug));

                info!(
                    category_id = %category.id,
                    slug = %category.slug,
                    created = was_new,
                    "Category saved"
                );

                let has_subcategories = self
                    .saved
                    .as_ref()
                    .is_some_and(|saved| saved.has_subcategories);
                self.saved = Some(SavedCategory {
                    id: category.id,
                    slug: category.slug.clone(),
                    has_subcategories,
                });
                self.values.slug = category.slug.clone();

                let verb = if was_new { "created" } else { "updated" };
                SubmitOutcome::Saved {
                    notification: Notification::Success(format!("Category successfully {verb}")),
                    redirect,
                    category,
                }
            }
            Err(err) => {
                warn!(error = %err, created = was_new, "Category upsert failed");
                SubmitOutcome::Failed {
                    notification: Notification::Error(err.message),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::Utc;

    use super::*;
    use crate::services::category_editor::ActionError;

    /// Records every payload and answers with a fixed slug or a failure
    struct RecordingUpsert {
        calls: Mutex<Vec<UpsertCategory>>,
        slug: Option<String>,
        failure: Option<String>,
    }

    impl RecordingUpsert {
        fn returning_slug(slug: Option<&str>) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                slug: slug.map(str::to_string),
                failure: None,
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                slug: None,
                failure: Some(message.to_string()),
            }
        }

        fn calls(&self) -> Vec<UpsertCategory> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CategoryUpsert for RecordingUpsert {
        async fn upsert_category(&self, data: UpsertCategory) -> Result<Category, ActionError> {
            self.calls.lock().unwrap().push(data.clone());
            if let Some(message) = &self.failure {
                return Err(ActionError::new(message.clone()));
            }
            let now = Utc::now();
            let slug = self.slug.clone().unwrap_or_else(|| data.slug.clone());
            Ok(Category {
                id: data.id.unwrap_or_else(Uuid::new_v4),
                name: data.name,
                full_path: slug.clone(),
                slug,
                label: data.label,
                description: data.description,
                parent_id: data.parent_id,
                created_at: now,
                updated_at: now,
            })
        }
    }

    fn existing(slug: &str, subcategory_count: i64) -> CategoryWithTools {
        let now = Utc::now();
        CategoryWithTools {
            category: Category {
                id: Uuid::new_v4(),
                name: "Databases".to_string(),
                slug: slug.to_string(),
                label: Some("Hand-picked Databases".to_string()),
                description: Some("Storage engines".to_string()),
                parent_id: None,
                full_path: slug.to_string(),
                created_at: now,
                updated_at: now,
            },
            tools: vec![Uuid::new_v4()],
            subcategory_count,
        }
    }

    #[test]
    fn test_new_form_derives_slug_and_label_from_name() {
        let mut form = CategoryForm::new();
        form.set_name("Open Source");
        assert_eq!(form.values().slug, "open-source");
        assert_eq!(form.values().label, "Open Source Tools");

        form.set_name("Open Source ");
        assert_eq!(form.values().name, "Open Source ");
        assert_eq!(form.values().label, "Open Source Tools");

        form.set_name("");
        assert_eq!(form.values().slug, "");
        assert_eq!(form.values().label, "");
    }

    #[test]
    fn test_existing_form_keeps_slug_and_label() {
        let mut form = CategoryForm::edit(&existing("databases", 0));
        form.set_name("Open Source");
        assert_eq!(form.values().name, "Open Source");
        assert_eq!(form.values().slug, "databases");
        assert_eq!(form.values().label, "Hand-picked Databases");
    }

    #[test]
    fn test_parent_locked_when_subcategories_exist() {
        let mut form = CategoryForm::edit(&existing("databases", 2));
        assert!(!form.can_change_parent());
        assert_eq!(
            form.set_parent(Some(Uuid::new_v4())),
            Err(CategoryFormError::ParentLocked)
        );
        // Re-selecting the current value is not a change.
        assert_eq!(form.set_parent(None), Ok(()));

        let mut leaf = CategoryForm::edit(&existing("graph-databases", 0));
        let parent = Uuid::new_v4();
        assert_eq!(leaf.set_parent(Some(parent)), Ok(()));
        assert_eq!(leaf.values().parent_id, Some(parent));
    }

    #[test]
    fn test_validation_messages() {
        let mut form = CategoryForm::edit(&existing("databases", 0));
        form.set_name("   ");
        form.set_slug("Not A Slug");
        form.set_label("x".repeat(MAX_LABEL_LEN + 1));
        let own_id = form.id();
        form.values.parent_id = own_id;

        let errors = form.validate().unwrap_err();
        assert_eq!(errors.get(FormField::Name), Some("Name is required"));
        assert!(errors.get(FormField::Slug).is_some());
        assert!(errors.get(FormField::Label).is_some());
        assert_eq!(
            errors.get(FormField::ParentId),
            Some("A category cannot be its own parent")
        );
        assert!(errors.get(FormField::Description).is_none());
        assert_eq!(form.errors(), &errors);

        form.set_name("Databases");
        assert!(form.error(FormField::Name).is_none());
    }

    #[test]
    fn test_validation_normalises_payload() {
        let tool = Uuid::new_v4();
        let mut form = CategoryForm::new();
        form.set_name("  Password Managers ");
        form.set_label("");
        form.set_description("  ");
        form.set_tools(vec![tool, tool]);

        let payload = form.validate().unwrap();
        assert_eq!(payload.id, None);
        assert_eq!(payload.name, "Password Managers");
        assert_eq!(payload.slug, "password-managers");
        assert_eq!(payload.label, None);
        assert_eq!(payload.description, None);
        assert_eq!(payload.tools, vec![tool]);
    }

    #[test]
    fn test_toggle_tool() {
        let tool = Uuid::new_v4();
        let mut form = CategoryForm::new();
        form.toggle_tool(tool);
        assert_eq!(form.values().tools, vec![tool]);
        form.toggle_tool(tool);
        assert!(form.values().tools.is_empty());
    }

    #[tokio::test]
    async fn test_submit_with_empty_name_skips_upsert() {
        let upsert = RecordingUpsert::returning_slug(None);
        let mut form = CategoryForm::new();

        let outcome = form.submit(&upsert).await;
        match outcome {
            SubmitOutcome::Invalid(errors) => {
                assert_eq!(errors.fields().collect::<Vec<_>>(), vec![FormField::Name]);
            }
            other => panic!("expected invalid outcome, got {other:?}"),
        }
        assert!(upsert.calls().is_empty());
    }

    #[tokio::test]
    async fn test_overlong_description_blocks_submit() {
        let upsert = RecordingUpsert::returning_slug(None);
        let mut form = CategoryForm::new();
        form.set_name("Monitoring");
        form.set_description("x".repeat(MAX_DESCRIPTION_LEN + 1));

        let SubmitOutcome::Invalid(errors) = form.submit(&upsert).await else {
            panic!("expected invalid outcome");
        };
        assert_eq!(
            errors.fields().collect::<Vec<_>>(),
            vec![FormField::Description]
        );
        assert_eq!(
            form.error(FormField::Description),
            Some("Description must be at most 2000 characters")
        );
        assert!(upsert.calls().is_empty());

        form.set_description("x".repeat(MAX_DESCRIPTION_LEN));
        assert!(matches!(
            form.submit(&upsert).await,
            SubmitOutcome::Saved { .. }
        ));
        assert_eq!(upsert.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_create_redirects_to_returned_slug() {
        let upsert = RecordingUpsert::returning_slug(Some("open-source-2"));
        let mut form = CategoryForm::new();
        form.set_name("Open Source");

        let outcome = form.submit(&upsert).await;
        let SubmitOutcome::Saved {
            notification,
            redirect,
            category,
        } = outcome
        else {
            panic!("expected saved outcome");
        };
        assert_eq!(
            notification,
            Notification::Success("Category successfully created".to_string())
        );
        assert_eq!(redirect.as_deref(), Some("/admin/categories/open-source-2"));
        assert_eq!(upsert.calls()[0].id, None);

        // The form now edits the saved record.
        assert!(!form.is_new());
        assert_eq!(form.id(), Some(category.id));
        form.set_name("Renamed");
        assert_eq!(form.values().slug, "open-source-2");
    }

    #[tokio::test]
    async fn test_update_with_same_slug_does_not_redirect() {
        let upsert = RecordingUpsert::returning_slug(None);
        let current = existing("databases", 0);
        let mut form = CategoryForm::edit(&current);
        form.set_description("Relational and document stores");

        let outcome = form.submit(&upsert).await;
        let SubmitOutcome::Saved {
            notification,
            redirect,
            ..
        } = outcome
        else {
            panic!("expected saved outcome");
        };
        assert_eq!(
            notification,
            Notification::Success("Category successfully updated".to_string())
        );
        assert_eq!(redirect, None);

        let call = &upsert.calls()[0];
        assert_eq!(call.id, Some(current.id));
        assert_eq!(call.tools, current.tools);
        assert_eq!(call.description.as_deref(), Some("Relational and document stores"));
    }

    #[tokio::test]
    async fn test_update_with_new_slug_redirects() {
        let upsert = RecordingUpsert::returning_slug(None);
        let mut form = CategoryForm::edit(&existing("databases", 0));
        form.set_slug("data-stores");

        let outcome = form.submit(&upsert).await;
        let SubmitOutcome::Saved { redirect, .. } = outcome else {
            panic!("expected saved outcome");
        };
        assert_eq!(redirect.as_deref(), Some("/admin/categories/data-stores"));

        // A second save with the slug unchanged stays put.
        let SubmitOutcome::Saved { redirect, .. } = form.submit(&upsert).await else {
            panic!("expected saved outcome");
        };
        assert_eq!(redirect, None);
    }

    #[tokio::test]
    async fn test_failed_upsert_keeps_values() {
        let upsert = RecordingUpsert::failing("A category with slug `open-source` already exists");
        let mut form = CategoryForm::new();
        form.set_name("Open Source");

        let outcome = form.submit(&upsert).await;
        assert_eq!(
            outcome,
            SubmitOutcome::Failed {
                notification: Notification::Error(
                    "A category with slug `open-source` already exists".to_string()
                ),
            }
        );
        assert!(form.is_new());
        assert_eq!(form.values().slug, "open-source");
        assert_eq!(upsert.calls().len(), 1);
    }
}
