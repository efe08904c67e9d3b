//! Comment records and the batches handed to the statistics engines.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One top-level comment as ingested from the source service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Opaque identifier assigned by the source service.
    pub id: String,
    /// Raw comment body. Markup artifacts from the source are kept verbatim.
    pub text: String,
    /// Display name of the author.
    #[serde(default)]
    pub author: String,
    /// Publication time reported by the source.
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    /// Like count at fetch time.
    #[serde(default)]
    pub like_count: u64,
}

impl Comment {
    /// Creates a comment with empty metadata.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            author: String::new(),
            published_at: None,
            like_count: 0,
        }
    }

    /// Sets the author.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    /// Sets the publication time.
    pub fn with_published_at(mut self, published_at: DateTime<Utc>) -> Self {
        self.published_at = Some(published_at);
        self
    }

    /// Sets the like count.
    pub fn with_like_count(mut self, like_count: u64) -> Self {
        self.like_count = like_count;
        self
    }
}

/// The ordered comments fetched for one video.
///
/// Order is the order in which the source returned them (oldest page first).
/// A batch is immutable once built; cloning shares the underlying storage so
/// the same batch can be handed to several engines at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentBatch {
    comments: Arc<[Comment]>,
}

impl CommentBatch {
    /// Creates an empty batch.
    pub fn empty() -> Self {
        Self {
            comments: Arc::from(Vec::new()),
        }
    }

    /// Builds a batch from comments, keeping the first occurrence of each id.
    pub fn from_comments(comments: impl IntoIterator<Item = Comment>) -> Self {
        let mut builder = CommentBatchBuilder::new();
        for comment in comments {
            builder.push(comment);
        }
        builder.finish()
    }

    /// Number of comments in the batch.
    pub fn len(&self) -> usize {
        self.comments.len()
    }

    /// Returns true if the batch holds no comments.
    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    /// Iterates the comments in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Comment> {
        self.comments.iter()
    }

    /// Returns the comments as a slice.
    pub fn as_slice(&self) -> &[Comment] {
        &self.comments
    }

    /// Returns the comment at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&Comment> {
        self.comments.get(index)
    }
}

impl Default for CommentBatch {
    fn default() -> Self {
        Self::empty()
    }
}

impl<'a> IntoIterator for &'a CommentBatch {
    type Item = &'a Comment;
    type IntoIter = std::slice::Iter<'a, Comment>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<Comment> for CommentBatch {
    fn from_iter<I: IntoIterator<Item = Comment>>(iter: I) -> Self {
        Self::from_comments(iter)
    }
}

impl Serialize for CommentBatch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.comments.iter())
    }
}

impl<'de> Deserialize<'de> for CommentBatch {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<Comment>::deserialize(deserializer).map(Self::from_comments)
    }
}

/// Accumulates comments in arrival order, dropping repeated ids.
#[derive(Debug, Default)]
pub struct CommentBatchBuilder {
    comments: Vec<Comment>,
    seen: HashSet<String>,
}

impl CommentBatchBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a comment. Returns false if its id was already present.
    pub fn push(&mut self, comment: Comment) -> bool {
        if !self.seen.insert(comment.id.clone()) {
            return false;
        }
        self.comments.push(comment);
        true
    }

    /// Number of comments accepted so far.
    pub fn len(&self) -> usize {
        self.comments.len()
    }

    /// Returns true if nothing has been accepted yet.
    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    /// Freezes the accumulated comments into a batch.
    pub fn finish(self) -> CommentBatch {
        CommentBatch {
            comments: Arc::from(self.comments),
        }
    }
}
