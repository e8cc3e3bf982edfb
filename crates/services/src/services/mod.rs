pub mod admin_client;
pub mod category;
pub mod category_editor;
pub mod category_form;
pub mod category_tree;
pub mod database_validator;
