use super::UserID;

/// Only the author of a post matters to this service: posts are removed
/// together with the account that wrote them.
pub struct Post {
    pub user: UserID,
}
