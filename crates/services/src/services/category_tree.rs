//! Two-level category tree used by the parent picker of the category editor.

use std::collections::HashMap;

use db::models::category::CategorySummary;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Categories whose full path has this many segments or more are not nested
/// under their parent; they are listed as roots instead.
pub const MAX_NESTED_PATH_SEGMENTS: usize = 3;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
pub struct CategoryTreeNode {
    #[serde(flatten)]
    #[ts(flatten)]
    pub category: CategorySummary,
    pub children: Vec<CategoryTreeNode>,
}

impl std::ops::Deref for CategoryTreeNode {
    type Target = CategorySummary;
    fn deref(&self) -> &Self::Target {
        &self.category
    }
}

/// Build display roots from a flat category list in a single pass.
///
/// A record is attached to its parent when the parent is part of `categories`
/// and the record's full path has fewer than [`MAX_NESTED_PATH_SEGMENTS`]
/// segments. Everything else, including records whose parent is missing, is a
/// root. Roots and children keep the order of the input.
pub fn build_category_tree(categories: Vec<CategorySummary>) -> Vec<CategoryTreeNode> {
    let index_by_id: HashMap<Uuid, usize> = categories
        .iter()
        .enumerate()
        .map(|(index, category)| (category.id, index))
        .collect();

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); categories.len()];
    let mut roots = Vec::new();

    for (index, category) in categories.iter().enumerate() {
        let parent = category
            .parent_id
            .and_then(|parent_id| index_by_id.get(&parent_id).copied())
            .filter(|&parent| parent != index);

        match parent {
            Some(parent) if category.depth() < MAX_NESTED_PATH_SEGMENTS => {
                children[parent].push(index)
            }
            _ => roots.push(index),
        }
    }

    let mut slots: Vec<Option<CategorySummary>> = categories.into_iter().map(Some).collect();
    roots
        .into_iter()
        .filter_map(|root| take_node(root, &mut slots, &children))
        .collect()
}

// Each record has at most one parent, so every slot is taken at most once.
fn take_node(
    index: usize,
    slots: &mut [Option<CategorySummary>],
    children: &[Vec<usize>],
) -> Option<CategoryTreeNode> {
    let category = slots[index].take()?;
    let children = children[index]
        .iter()
        .filter_map(|&child| take_node(child, slots, children))
        .collect();
    Some(CategoryTreeNode { category, children })
}
