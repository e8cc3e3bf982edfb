pub mod response;
pub mod slug;
