pub mod category;
pub mod tool;
