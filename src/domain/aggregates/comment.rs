//! Comment Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    pub product_id: i64,
    pub customer_id: Option<i64>,
    /// Slug of the author's user account, captured when the comment is written.
    pub commenter: Option<String>,
    pub changed_at: DateTime<Utc>,
    pub comment_field: String,
    pub checked: bool,
}

impl Comment {
    pub fn new(product_id: i64, customer_id: i64, commenter: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: 0,
            product_id,
            customer_id: Some(customer_id),
            commenter: Some(commenter.into()),
            changed_at: Utc::now(),
            comment_field: text.into(),
            checked: false,
        }
    }

    pub fn commenters_name(&self) -> Option<&str> { self.commenter.as_deref() }

    pub fn is_written_by(&self, customer_id: i64) -> bool { self.customer_id == Some(customer_id) }
}

/// Result of a moderation batch.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ModerationOutcome {
    pub approved: Vec<i64>,
    pub deleted: Vec<i64>,
}

impl ModerationOutcome {
    /// Approves every comment listed in `approved_ids`; every comment left
    /// unchecked afterwards is marked for deletion.
    pub fn plan(comments: &[Comment], approved_ids: &[i64]) -> Self {
        let mut outcome = Self::default();
        for comment in comments {
            if approved_ids.contains(&comment.id) {
                outcome.approved.push(comment.id);
            } else if !comment.checked {
                outcome.deleted.push(comment.id);
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(id: i64, checked: bool) -> Comment {
        let mut c = Comment::new(1, 7, "alice", format!("comment {id}"));
        c.id = id;
        c.checked = checked;
        c
    }

    #[test]
    fn test_plan_approves_listed_and_deletes_rest() {
        let comments = vec![comment(1, false), comment(2, false), comment(3, false)];
        let outcome = ModerationOutcome::plan(&comments, &[1, 3]);
        assert_eq!(outcome.approved, vec![1, 3]);
        assert_eq!(outcome.deleted, vec![2]);
    }

    #[test]
    fn test_plan_keeps_already_checked() {
        let comments = vec![comment(1, true), comment(2, false)];
        let outcome = ModerationOutcome::plan(&comments, &[]);
        assert!(outcome.approved.is_empty());
        assert_eq!(outcome.deleted, vec![2]);
    }

    #[test]
    fn test_unknown_ids_are_ignored() {
        let comments = vec![comment(1, false)];
        let outcome = ModerationOutcome::plan(&comments, &[1, 99]);
        assert_eq!(outcome.approved, vec![1]);
        assert!(outcome.deleted.is_empty());
    }
}
