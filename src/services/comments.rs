use chrono::Utc;

use crate::{
    db::CommentStore,
    error::{AppError, AppResult},
    models::{MovieComment, NewComment, MAX_COMMENT_CHARS},
};

/// Trims the body and enforces the length limit
fn clean_content(content: &str) -> AppResult<String> {
    let content = content.trim();
    if content.is_empty() {
        return Err(AppError::InvalidInput("Comment cannot be empty".to_string()));
    }
    if content.chars().count() > MAX_COMMENT_CHARS {
        return Err(AppError::InvalidInput(format!(
            "Comment cannot be longer than {} characters",
            MAX_COMMENT_CHARS
        )));
    }
    Ok(content.to_string())
}

/// Loads a comment only if it is filed under `movie_slug`
async fn find_on_movie(
    store: &dyn CommentStore,
    movie_slug: &str,
    comment_id: i64,
) -> AppResult<Option<MovieComment>> {
    Ok(store
        .find(comment_id)
        .await?
        .filter(|comment| comment.movie_slug == movie_slug))
}

pub async fn list_comments(
    store: &dyn CommentStore,
    movie_slug: &str,
) -> AppResult<Vec<MovieComment>> {
    store.list_for_movie(movie_slug).await
}

pub async fn count_comments(store: &dyn CommentStore, movie_slug: &str) -> AppResult<i64> {
    store.count_for_movie(movie_slug).await
}

pub async fn add_comment(
    store: &dyn CommentStore,
    user_id: &str,
    movie_slug: &str,
    movie_title: &str,
    content: &str,
) -> AppResult<MovieComment> {
    let user_id = user_id.trim();
    let movie_slug = movie_slug.trim();

    if user_id.is_empty() {
        return Err(AppError::InvalidInput("User id cannot be empty".to_string()));
    }
    if movie_slug.is_empty() {
        return Err(AppError::InvalidInput("Movie slug cannot be empty".to_string()));
    }
    let content = clean_content(content)?;

    let comment = store
        .insert(&NewComment {
            user_id: user_id.to_string(),
            movie_slug: movie_slug.to_string(),
            movie_title: movie_title.trim().to_string(),
            content,
            created_at: Utc::now(),
        })
        .await?;

    tracing::info!(
        user_id = %user_id,
        movie_slug = %movie_slug,
        comment_id = comment.id,
        "Comment added"
    );
    Ok(comment)
}

/// Edits a comment's body. Only its author may edit it.
///
/// Returns `None` when the comment does not exist on this movie or belongs
/// to someone else.
pub async fn update_comment(
    store: &dyn CommentStore,
    user_id: &str,
    movie_slug: &str,
    comment_id: i64,
    content: &str,
) -> AppResult<Option<MovieComment>> {
    let content = clean_content(content)?;

    let Some(existing) = find_on_movie(store, movie_slug, comment_id).await? else {
        return Ok(None);
    };
    if existing.user_id != user_id {
        tracing::warn!(
            user_id = %user_id,
            comment_id = comment_id,
            "Refusing to edit another user's comment"
        );
        return Ok(None);
    }

    store.update_content(comment_id, &content, Utc::now()).await
}

/// Deletes a comment. Authors may delete their own, admins any.
pub async fn delete_comment(
    store: &dyn CommentStore,
    user_id: &str,
    is_admin: bool,
    movie_slug: &str,
    comment_id: i64,
) -> AppResult<bool> {
    let Some(existing) = find_on_movie(store, movie_slug, comment_id).await? else {
        return Ok(false);
    };
    if existing.user_id != user_id && !is_admin {
        return Ok(false);
    }

    let deleted = store.delete(comment_id).await?;
    if deleted {
        tracing::info!(
            user_id = %user_id,
            comment_id = comment_id,
            moderated = existing.user_id != user_id,
            "Comment deleted"
        );
    }
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{comments::MockCommentStore, MemoryStore};

    #[tokio::test]
    async fn test_comments_are_newest_first_per_movie() {
        let store = MemoryStore::new();
        add_comment(&store, "u1", "x", "Movie X", "first").await.unwrap();
        add_comment(&store, "u2", "x", "Movie X", "second").await.unwrap();
        add_comment(&store, "u1", "y", "Movie Y", "elsewhere").await.unwrap();

        let bodies: Vec<String> = list_comments(&store, "x")
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.content)
            .collect();

        assert_eq!(bodies, vec!["second".to_string(), "first".to_string()]);
        assert_eq!(count_comments(&store, "x").await.unwrap(), 2);
        assert_eq!(count_comments(&store, "z").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_content_is_trimmed_and_bounded() {
        let store = MemoryStore::new();

        let comment = add_comment(&store, "u1", "x", "Movie X", "  hay quá  ")
            .await
            .unwrap();
        assert_eq!(comment.content, "hay quá");
        assert_eq!(comment.updated_at, None);

        let result = add_comment(&store, "u1", "x", "Movie X", "   ").await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));

        // Multi-byte characters count once each
        let at_limit = "ế".repeat(MAX_COMMENT_CHARS);
        assert!(add_comment(&store, "u1", "x", "Movie X", &at_limit).await.is_ok());

        let too_long = "a".repeat(MAX_COMMENT_CHARS + 1);
        let result = add_comment(&store, "u1", "x", "Movie X", &too_long).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_only_author_can_edit() {
        let store = MemoryStore::new();
        let comment = add_comment(&store, "u1", "x", "Movie X", "draft").await.unwrap();

        let refused = update_comment(&store, "u2", "x", comment.id, "hijacked")
            .await
            .unwrap();
        assert!(refused.is_none());

        let edited = update_comment(&store, "u1", "x", comment.id, " final ")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(edited.content, "final");
        assert!(edited.updated_at.is_some());
        assert_eq!(edited.created_at, comment.created_at);
    }

    #[tokio::test]
    async fn test_comment_is_scoped_to_its_movie() {
        let store = MemoryStore::new();
        let comment = add_comment(&store, "u1", "x", "Movie X", "hello").await.unwrap();

        assert!(update_comment(&store, "u1", "y", comment.id, "moved")
            .await
            .unwrap()
            .is_none());
        assert!(!delete_comment(&store, "u1", false, "y", comment.id)
            .await
            .unwrap());
        assert_eq!(count_comments(&store, "x").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_by_author_or_admin() {
        let store = MemoryStore::new();
        let first = add_comment(&store, "u1", "x", "Movie X", "one").await.unwrap();
        let second = add_comment(&store, "u1", "x", "Movie X", "two").await.unwrap();

        assert!(!delete_comment(&store, "u2", false, "x", first.id).await.unwrap());
        assert!(delete_comment(&store, "u1", false, "x", first.id).await.unwrap());
        assert!(delete_comment(&store, "mod-1", true, "x", second.id).await.unwrap());
        assert!(!delete_comment(&store, "mod-1", true, "x", 999).await.unwrap());

        assert_eq!(count_comments(&store, "x").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_invalid_edit_never_reaches_store() {
        let mut store = MockCommentStore::new();
        store.expect_find().times(0);
        store.expect_update_content().times(0);

        let result = update_comment(&store, "u1", "x", 1, "").await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_store_failure_surfaces() {
        let mut store = MockCommentStore::new();
        store
            .expect_list_for_movie()
            .withf(|slug| slug == "x")
            .returning(|_| Err(AppError::Internal("db down".to_string())));

        let result = list_comments(&store, "x").await;
        assert!(matches!(result, Err(AppError::Internal(_))));
    }
}
