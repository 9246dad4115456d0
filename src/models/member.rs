use serde::Serialize;

/// A congregation member. `code` is the value printed in their QR badge.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Member {
    pub id: i64,
    pub code: String,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub is_visitor: bool,
    pub created_at: String,
}
