use chrono::Utc;
use marquee_models::{Comment, CommentAuthor, CommentThread};
use marquee_store::{CommentStore, MovieStore, Store};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use crate::{CoreError, CoreResult};

pub const MAX_COMMENT_LEN: usize = 2000;
const DEFAULT_AUTHOR_NAME: &str = "User";
const ADMIN_AUTHOR_NAME: &str = "Admin";

/// The author's own photo, or a generated initials avatar
pub fn avatar_url(author: &CommentAuthor) -> String {
    if let Some(photo) = author.photo_url.as_deref().filter(|p| !p.trim().is_empty()) {
        return photo.to_string();
    }
    let name = if author.name.trim().is_empty() {
        DEFAULT_AUTHOR_NAME
    } else {
        author.name.trim()
    };
    format!(
        "https://ui-avatars.com/api/?name={}&background=111&color=fff",
        urlencoding::encode(name)
    )
}

/// Comment as submitted by a visitor
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewComment {
    pub text: String,
    pub author: CommentAuthor,
    pub parent_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: Comment,
    pub avatar_url: String,
}

impl From<Comment> for CommentView {
    fn from(comment: Comment) -> Self {
        let avatar_url = avatar_url(&comment.author);
        Self {
            comment,
            avatar_url,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadView {
    #[serde(flatten)]
    pub comment: CommentView,
    pub replies: Vec<CommentView>,
}

impl From<CommentThread> for ThreadView {
    fn from(thread: CommentThread) -> Self {
        Self {
            comment: thread.comment.into(),
            replies: thread.replies.into_iter().map(CommentView::from).collect(),
        }
    }
}

fn clean_text(text: &str) -> CoreResult<String> {
    let text = text.trim();
    if text.is_empty() {
        return Err(CoreError::validation("Comment cannot be empty"));
    }
    if text.chars().count() > MAX_COMMENT_LEN {
        return Err(CoreError::validation(format!(
            "Comment must be at most {} characters",
            MAX_COMMENT_LEN
        )));
    }
    Ok(text.to_string())
}

/// Group a movie's comments into one-level threads: newest thread first,
/// replies oldest first. Replies whose parent is gone are dropped.
pub fn build_threads(mut comments: Vec<Comment>) -> Vec<CommentThread> {
    comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
    let (replies, top_level): (Vec<Comment>, Vec<Comment>) =
        comments.into_iter().partition(Comment::is_reply);

    let mut threads: Vec<CommentThread> = top_level
        .into_iter()
        .rev()
        .map(|comment| CommentThread {
            comment,
            replies: Vec::new(),
        })
        .collect();

    for reply in replies {
        if let Some(thread) = threads
            .iter_mut()
            .find(|t| reply.parent_id.as_deref() == Some(t.comment.id.as_str()))
        {
            thread.replies.push(reply);
        }
    }
    threads
}

pub struct CommentService {
    store: Arc<dyn Store>,
}

impl CommentService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Top-level comment that a reply may attach to
    async fn reply_target(&self, parent_id: &str) -> CoreResult<Comment> {
        let parent = self
            .store
            .get_comment(parent_id)
            .await?
            .ok_or_else(|| CoreError::not_found("comment", parent_id))?;
        if parent.is_reply() {
            return Err(CoreError::validation("Replies cannot be replied to"));
        }
        Ok(parent)
    }

    pub async fn post(&self, movie_id: &str, new: NewComment) -> CoreResult<Comment> {
        let text = clean_text(&new.text)?;
        if self.store.get_movie(movie_id).await?.is_none() {
            return Err(CoreError::not_found("movie", movie_id));
        }

        let parent_id = match new.parent_id.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
            Some(parent_id) => {
                let parent = self.reply_target(parent_id).await?;
                if parent.movie_id != movie_id {
                    return Err(CoreError::validation("Reply must belong to the same movie"));
                }
                Some(parent.id)
            }
            None => None,
        };

        let mut author = new.author;
        author.name = author.name.trim().to_string();
        if author.name.is_empty() {
            author.name = DEFAULT_AUTHOR_NAME.to_string();
        }

        let comment = Comment {
            id: uuid::Uuid::new_v4().simple().to_string(),
            movie_id: movie_id.to_string(),
            author,
            text,
            is_admin: false,
            parent_id,
            created_at: Utc::now(),
        };
        self.store.insert_comment(comment.clone()).await?;
        info!(operation = "post_comment", movie_id, comment_id = %comment.id, reply = comment.is_reply(), "Comment posted");
        Ok(comment)
    }

    pub async fn admin_reply(&self, parent_id: &str, text: &str) -> CoreResult<Comment> {
        let text = clean_text(text)?;
        let parent = self.reply_target(parent_id).await?;

        let comment = Comment {
            id: uuid::Uuid::new_v4().simple().to_string(),
            movie_id: parent.movie_id.clone(),
            author: CommentAuthor {
                user_id: None,
                name: ADMIN_AUTHOR_NAME.to_string(),
                photo_url: None,
            },
            text,
            is_admin: true,
            parent_id: Some(parent.id),
            created_at: Utc::now(),
        };
        self.store.insert_comment(comment.clone()).await?;
        info!(operation = "admin_reply", movie_id = %comment.movie_id, comment_id = %comment.id, "Admin replied");
        Ok(comment)
    }

    pub async fn threads(&self, movie_id: &str) -> CoreResult<Vec<CommentThread>> {
        let comments = self.store.comments_for_movie(movie_id).await?;
        Ok(build_threads(comments))
    }

    /// All comments across movies, newest first, for moderation
    pub async fn list_all(&self) -> CoreResult<Vec<Comment>> {
        Ok(self.store.list_comments().await?)
    }

    pub async fn edit(&self, id: &str, text: &str) -> CoreResult<Comment> {
        let text = clean_text(text)?;
        let comment = self.store.update_comment_text(id, text).await?;
        info!(operation = "edit_comment", comment_id = id, "Comment edited");
        Ok(comment)
    }

    /// Delete a comment; a top-level comment takes its replies with it
    pub async fn delete(&self, id: &str) -> CoreResult<usize> {
        let removed = self.store.delete_comment(id).await?;
        if removed == 0 {
            return Err(CoreError::not_found("comment", id));
        }
        info!(operation = "delete_comment", comment_id = id, removed, "Comment deleted");
        Ok(removed)
    }

    /// Delete several comments; ids that are already gone are skipped
    pub async fn delete_many(&self, ids: &[String]) -> CoreResult<usize> {
        let mut removed = 0;
        for id in ids {
            removed += self.store.delete_comment(id).await?;
        }
        info!(operation = "delete_comments", requested = ids.len(), removed, "Comments deleted");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marquee_models::{Movie, MovieDraft};
    use marquee_store::EmbeddedStore;

    async fn service() -> CommentService {
        let store = Arc::new(EmbeddedStore::in_memory());
        for id in ["m1", "m2"] {
            let movie = Movie::from_draft(id.to_string(), MovieDraft::default(), Utc::now());
            store.insert_movie(movie).await.unwrap();
        }
        CommentService::new(store)
    }

    fn text(t: &str) -> NewComment {
        NewComment {
            text: t.to_string(),
            ..NewComment::default()
        }
    }

    fn reply(t: &str, parent: &str) -> NewComment {
        NewComment {
            parent_id: Some(parent.to_string()),
            ..text(t)
        }
    }

    #[test]
    fn test_avatar_url() {
        let with_photo = CommentAuthor {
            user_id: None,
            name: "Ana".to_string(),
            photo_url: Some("https://img/ana.png".to_string()),
        };
        assert_eq!(avatar_url(&with_photo), "https://img/ana.png");

        let generated = CommentAuthor {
            name: "Ana Lima".to_string(),
            ..CommentAuthor::default()
        };
        assert_eq!(
            avatar_url(&generated),
            "https://ui-avatars.com/api/?name=Ana%20Lima&background=111&color=fff"
        );
        assert!(avatar_url(&CommentAuthor::default()).contains("name=User"));
    }

    #[tokio::test]
    async fn test_post_validates_text_and_defaults_name() {
        let service = service().await;
        assert!(matches!(service.post("m1", text("   ")).await, Err(CoreError::Validation(_))));
        let long = "x".repeat(MAX_COMMENT_LEN + 1);
        assert!(matches!(service.post("m1", text(&long)).await, Err(CoreError::Validation(_))));
        assert!(matches!(service.post("nope", text("hi")).await, Err(CoreError::NotFound { .. })));

        let comment = service.post("m1", text("  great film ")).await.unwrap();
        assert_eq!(comment.text, "great film");
        assert_eq!(comment.author.name, "User");
        assert!(!comment.is_admin);
    }

    #[tokio::test]
    async fn test_reply_to_reply_rejected() {
        let service = service().await;
        let parent = service.post("m1", text("parent")).await.unwrap();
        let child = service.post("m1", reply("child", &parent.id)).await.unwrap();
        assert_eq!(child.parent_id.as_deref(), Some(parent.id.as_str()));

        let nested = service.post("m1", reply("nested", &child.id)).await;
        assert!(matches!(nested, Err(CoreError::Validation(_))));

        let cross_movie = service.post("m2", reply("elsewhere", &parent.id)).await;
        assert!(matches!(cross_movie, Err(CoreError::Validation(_))));

        let admin_nested = service.admin_reply(&child.id, "no").await;
        assert!(matches!(admin_nested, Err(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_threads_order_and_admin_reply() {
        let service = service().await;
        let first = service.post("m1", text("first")).await.unwrap();
        let second = service.post("m1", text("second")).await.unwrap();
        service.post("m1", reply("r1", &first.id)).await.unwrap();
        let admin = service.admin_reply(&first.id, "thanks").await.unwrap();
        assert!(admin.is_admin);
        assert_eq!(admin.author.name, "Admin");
        assert_eq!(admin.movie_id, "m1");

        let threads = service.threads("m1").await.unwrap();
        assert_eq!(threads.len(), 2);
        assert_eq!(threads[0].comment.id, second.id);
        assert_eq!(threads[1].comment.id, first.id);
        let replies: Vec<&str> = threads[1].replies.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(replies, vec!["r1", "thanks"]);
    }

    #[tokio::test]
    async fn test_delete_parent_removes_replies() {
        let service = service().await;
        let parent = service.post("m1", text("parent")).await.unwrap();
        service.post("m1", reply("a", &parent.id)).await.unwrap();
        service.post("m1", reply("b", &parent.id)).await.unwrap();
        let other = service.post("m1", text("other")).await.unwrap();

        assert_eq!(service.delete(&parent.id).await.unwrap(), 3);
        assert!(matches!(service.delete(&parent.id).await, Err(CoreError::NotFound { .. })));

        let remaining = service.threads("m1").await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].comment.id, other.id);

        assert_eq!(service.delete_many(&[other.id.clone(), "gone".to_string()]).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_edit() {
        let service = service().await;
        let comment = service.post("m1", text("typo")).await.unwrap();
        let edited = service.edit(&comment.id, "fixed").await.unwrap();
        assert_eq!(edited.text, "fixed");
        assert!(matches!(service.edit(&comment.id, "").await, Err(CoreError::Validation(_))));
    }
}
