use std::{fs, path::PathBuf};

use db::models::{
    category::{
        Category, CategorySummary, CategoryWithTools, DeleteCategories, DeletedCategories,
        UpsertCategory,
    },
    tool::{Tool, ToolSummary},
};
use services::services::{
    category_form::{FormField, Notification},
    category_tree::CategoryTreeNode,
};
use ts_rs::TS;

fn generate_types_content() -> String {
    let decls = [
        Category::decl(),
        CategorySummary::decl(),
        CategoryWithTools::decl(),
        CategoryTreeNode::decl(),
        UpsertCategory::decl(),
        DeleteCategories::decl(),
        DeletedCategories::decl(),
        Tool::decl(),
        ToolSummary::decl(),
        FormField::decl(),
        Notification::decl(),
    ];

    let mut content = String::from(
        "// This file was generated by `generate_types`. Do not edit it by hand.\n\n",
    );
    for decl in decls {
        content.push_str("export ");
        content.push_str(&decl);
        content.push_str("\n\n");
    }
    content
}

fn main() -> anyhow::Result<()> {
    let check_mode = std::env::args().any(|arg| arg == "--check");
    let out_path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../shared/types.ts");
    let content = generate_types_content();

    if check_mode {
        let current = fs::read_to_string(&out_path).unwrap_or_default();
        if current != content {
            anyhow::bail!(
                "{} is out of date, run `cargo run --bin generate_types`",
                out_path.display()
            );
        }
        println!("{} is up to date", out_path.display());
        return Ok(());
    }

    if let Some(parent) = out_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&out_path, content)?;
    println!("Wrote {}", out_path.display());
    Ok(())
}
