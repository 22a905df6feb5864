//! Threaded comments for feeds and community posts

use super::author;
use crate::error::ApiError;
use crate::hashing;
use crate::repositories::{CommentRecord, CommentRepository, CommentTarget, NewComment};
use bml_shared::types::CommentNode;
use bml_shared::validation::validate_not_blank;
use chrono::Utc;
use sqlx::PgPool;
use std::collections::HashMap;

/// Nest a page of comments (oldest first) under their parents
///
/// A comment is attached to a parent only when that parent appears earlier
/// in the page; otherwise it becomes a root. Sibling order follows the input.
pub fn build_comment_tree(nodes: Vec<CommentNode>) -> Vec<CommentNode> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut parent_of: Vec<Option<usize>> = Vec::with_capacity(nodes.len());
    for (idx, node) in nodes.iter().enumerate() {
        let parent = node
            .parent_hash
            .as_ref()
            .and_then(|hash| seen.get(hash).copied());
        parent_of.push(parent);
        seen.entry(node.view_hash.clone()).or_insert(idx);
    }

    let mut slots: Vec<Option<CommentNode>> = nodes.into_iter().map(Some).collect();
    // Children always come after their parent, so folding from the back
    // finishes every subtree before it is attached.
    for idx in (0..slots.len()).rev() {
        if let Some(parent) = parent_of[idx] {
            if let Some(child) = slots[idx].take() {
                if let Some(parent_node) = slots[parent].as_mut() {
                    parent_node.children.insert(0, child);
                }
            }
        }
    }

    slots.into_iter().flatten().collect()
}

fn to_node(record: CommentRecord, viewer_id: Option<i64>) -> CommentNode {
    CommentNode {
        is_owner: viewer_id == Some(record.user_id),
        view_hash: record.view_hash,
        parent_hash: record.parent_hash,
        comment: record.comment,
        user: author(
            Some(record.user_hash),
            Some(record.nickname),
            record.profile_image,
        ),
        created_at: record.created_at,
        updated_at: record.updated_at,
        deleted_at: record.deleted_at,
        children: Vec::new(),
    }
}

pub struct CommentService;

impl CommentService {
    pub async fn create(
        pool: &PgPool,
        target: CommentTarget,
        target_id: i64,
        user_id: i64,
        comment: &str,
        parent_hash: Option<&str>,
    ) -> Result<CommentNode, ApiError> {
        validate_not_blank("comment", comment).map_err(ApiError::Validation)?;

        let parent_hash = parent_hash.map(str::trim).filter(|h| !h.is_empty());
        let parent_id = match parent_hash {
            Some(hash) => {
                let parent = CommentRepository::find_by_hash(pool, target, hash)
                    .await
                    .map_err(ApiError::from_repo)?
                    .filter(|p| p.target_id == target_id)
                    .ok_or_else(|| ApiError::NotFound("Parent comment not found".to_string()))?;
                Some(parent.id)
            }
            None => None,
        };

        let view_hash = hashing::comment_hash(target_id, user_id, parent_id, Utc::now());
        CommentRepository::create(
            pool,
            target,
            NewComment {
                target_id,
                user_id,
                parent_id,
                view_hash: &view_hash,
                parent_hash,
                comment: comment.trim(),
            },
        )
        .await
        .map_err(ApiError::from_repo)?;

        let created = CommentRepository::find_by_hash(pool, target, &view_hash)
            .await
            .map_err(ApiError::from_repo)?
            .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("comment vanished after insert")))?;

        Ok(to_node(created, Some(user_id)))
    }

    pub async fn tree(
        pool: &PgPool,
        target: CommentTarget,
        target_id: i64,
        viewer_id: Option<i64>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CommentNode>, ApiError> {
        let records = CommentRepository::list(pool, target, target_id, limit, offset)
            .await
            .map_err(ApiError::from_repo)?;

        Ok(build_comment_tree(
            records
                .into_iter()
                .map(|record| to_node(record, viewer_id))
                .collect(),
        ))
    }

    async fn owned(
        pool: &PgPool,
        target: CommentTarget,
        user_id: i64,
        view_hash: &str,
    ) -> Result<CommentRecord, ApiError> {
        let comment = CommentRepository::find_by_hash(pool, target, view_hash)
            .await
            .map_err(ApiError::from_repo)?
            .ok_or_else(|| ApiError::NotFound("Comment not found".to_string()))?;
        if comment.user_id != user_id {
            return Err(ApiError::Forbidden("Not the author of this comment".to_string()));
        }
        Ok(comment)
    }

    pub async fn update(
        pool: &PgPool,
        target: CommentTarget,
        user_id: i64,
        view_hash: &str,
        text: &str,
    ) -> Result<(), ApiError> {
        validate_not_blank("comment", text).map_err(ApiError::Validation)?;
        let comment = Self::owned(pool, target, user_id, view_hash).await?;
        if comment.deleted_at.is_some() {
            return Err(ApiError::NotFound("Comment not found".to_string()));
        }

        CommentRepository::update_text(pool, target, comment.id, text.trim())
            .await
            .map_err(ApiError::from_repo)
    }

    /// Soft delete; repeating it is a no-op
    pub async fn delete(
        pool: &PgPool,
        target: CommentTarget,
        user_id: i64,
        view_hash: &str,
    ) -> Result<(), ApiError> {
        let comment = Self::owned(pool, target, user_id, view_hash).await?;
        if comment.deleted_at.is_some() {
            return Ok(());
        }

        CommentRepository::soft_delete(pool, target, comment.id)
            .await
            .map_err(ApiError::from_repo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bml_shared::types::AuthorSummary;
    use proptest::prelude::*;

    fn node(hash: &str, parent: Option<&str>) -> CommentNode {
        let now = Utc::now();
        CommentNode {
            view_hash: hash.to_string(),
            parent_hash: parent.map(str::to_string),
            comment: format!("comment {}", hash),
            is_owner: false,
            user: AuthorSummary {
                user_hash: None,
                nickname: None,
                profile_image: None,
            },
            created_at: now,
            updated_at: now,
            deleted_at: None,
            children: Vec::new(),
        }
    }

    fn count(nodes: &[CommentNode]) -> usize {
        nodes.iter().map(|n| 1 + count(&n.children)).sum()
    }

    fn children_point_at_parent(nodes: &[CommentNode]) -> bool {
        nodes.iter().all(|n| {
            n.children
                .iter()
                .all(|c| c.parent_hash.as_deref() == Some(n.view_hash.as_str()))
                && children_point_at_parent(&n.children)
        })
    }

    #[test]
    fn test_nests_replies() {
        let tree = build_comment_tree(vec![
            node("a", None),
            node("b", Some("a")),
            node("c", Some("b")),
            node("d", None),
            node("e", Some("a")),
        ]);

        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].view_hash, "a");
        let replies: Vec<_> = tree[0].children.iter().map(|c| c.view_hash.as_str()).collect();
        assert_eq!(replies, vec!["b", "e"]);
        assert_eq!(tree[0].children[0].children[0].view_hash, "c");
        assert_eq!(tree[1].view_hash, "d");
    }

    #[test]
    fn test_orphans_become_roots() {
        let tree = build_comment_tree(vec![node("b", Some("gone")), node("c", Some("b"))]);

        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].view_hash, "b");
        assert_eq!(tree[0].children[0].view_hash, "c");
    }

    #[test]
    fn test_parent_later_in_page_is_not_used() {
        let tree = build_comment_tree(vec![node("a", Some("b")), node("b", Some("a"))]);

        assert_eq!(count(&tree), 2);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].view_hash, "a");
        assert_eq!(tree[0].children[0].view_hash, "b");
    }

    #[test]
    fn test_empty_page() {
        assert!(build_comment_tree(Vec::new()).is_empty());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_tree_keeps_every_comment(parents in prop::collection::vec(prop::option::of(0usize..40), 0..40)) {
            let nodes: Vec<_> = parents
                .iter()
                .enumerate()
                .map(|(i, p)| {
                    let parent = p.map(|p| format!("c{}", p));
                    node(&format!("c{}", i), parent.as_deref())
                })
                .collect();
            let total = nodes.len();

            let tree = build_comment_tree(nodes);
            prop_assert_eq!(count(&tree), total);
            prop_assert!(children_point_at_parent(&tree));
        }
    }
}
