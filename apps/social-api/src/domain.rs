//! Domain types and invariants.
//!
//! Content limits and the post visibility rules live here; the `store`
//! modules persist these types, the route handlers shuttle them over
//! JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SocialError;

/// Maximum characters in a post.
pub const MAX_POST_LEN: usize = 2000;

/// Maximum characters in a comment.
pub const MAX_COMMENT_LEN: usize = 1000;

/// Who can see a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Everyone.
    #[default]
    Public,
    /// The author and their followers.
    Followers,
    /// The author only.
    Private,
}

impl Visibility {
    /// Stable storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Followers => "followers",
            Self::Private => "private",
        }
    }

    /// Parse from storage; unknown values read back as `Public`.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "followers" => Self::Followers,
            "private" => Self::Private,
            _ => Self::Public,
        }
    }

    /// Whether a viewer with the given relationship to the author may see
    /// a post with this visibility.
    #[must_use]
    pub const fn visible_to(self, is_author: bool, is_follower: bool) -> bool {
        match self {
            Self::Public => true,
            Self::Followers => is_author || is_follower,
            Self::Private => is_author,
        }
    }
}

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique user id.
    pub id: i64,
    /// Unique handle.
    pub username: String,
    /// Display name shown beside posts.
    pub display_name: String,
    /// Profile bio.
    pub bio: String,
    /// When true, posts are visible to followers only and the profile's
    /// post list is closed to non-followers.
    pub is_private: bool,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
}

/// Command to create a user profile.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    /// Unique handle. Required, non-empty.
    pub username: String,
    /// Display name; defaults to the username.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Profile bio.
    #[serde(default)]
    pub bio: Option<String>,
    /// Private profile flag.
    #[serde(default)]
    pub is_private: bool,
}

impl NewUser {
    /// Check the create invariants.
    pub fn validate(&self) -> Result<(), SocialError> {
        let username = self.username.trim();
        if username.is_empty() {
            return Err(SocialError::invalid("Username is required"));
        }
        if !username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(SocialError::invalid(
                "Username may only contain letters, digits and underscores",
            ));
        }
        Ok(())
    }
}

/// Partial profile update; absent fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    /// New display name.
    #[serde(default)]
    pub display_name: Option<String>,
    /// New bio.
    #[serde(default)]
    pub bio: Option<String>,
    /// New privacy flag.
    #[serde(default)]
    pub is_private: Option<bool>,
}

/// Command to create a post.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPost {
    /// Post body. Required, at most [`MAX_POST_LEN`] characters.
    pub content: String,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Visibility; defaults to public.
    #[serde(default)]
    pub visibility: Visibility,
}

impl NewPost {
    /// Check the content invariants.
    pub fn validate(&self) -> Result<(), SocialError> {
        validate_content(&self.content, MAX_POST_LEN, "Post")
    }
}

/// Partial post edit; absent fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostUpdate {
    /// New body.
    #[serde(default)]
    pub content: Option<String>,
    /// New tags.
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    /// New visibility.
    #[serde(default)]
    pub visibility: Option<Visibility>,
}

impl PostUpdate {
    /// Check the content invariants of the fields that are present.
    pub fn validate(&self) -> Result<(), SocialError> {
        if let Some(content) = &self.content {
            validate_content(content, MAX_POST_LEN, "Post")?;
        }
        Ok(())
    }
}

/// A post as returned by the API: the row plus author info and counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostView {
    /// Unique post id.
    pub id: i64,
    /// Author summary.
    pub author: UserSummary,
    /// Post body.
    pub content: String,
    /// Free-form tags.
    pub tags: Vec<String>,
    /// Visibility.
    pub visibility: Visibility,
    /// True once the post has been edited.
    pub is_edited: bool,
    /// Number of likes.
    pub like_count: i64,
    /// Number of comments.
    pub comment_count: i64,
    /// Whether the requesting viewer has liked this post.
    pub liked: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last edit timestamp.
    pub updated_at: DateTime<Utc>,
}

/// A comment as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentView {
    /// Unique comment id.
    pub id: i64,
    /// Post the comment belongs to.
    pub post_id: i64,
    /// Author summary.
    pub author: UserSummary,
    /// Comment body.
    pub content: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Minimal user info embedded in posts, comments, and follow lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    /// Unique user id.
    pub id: i64,
    /// Unique handle.
    pub username: String,
    /// Display name.
    pub display_name: String,
}

/// A profile as shown to a particular viewer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileView {
    /// Unique user id.
    pub id: i64,
    /// Unique handle.
    pub username: String,
    /// Display name.
    pub display_name: String,
    /// Profile bio.
    pub bio: String,
    /// Private profile flag.
    pub is_private: bool,
    /// Number of followers.
    pub followers_count: i64,
    /// Number of followed users.
    pub following_count: i64,
    /// Number of posts.
    pub posts_count: i64,
    /// Whether this is the viewer's own profile.
    pub is_own_profile: bool,
    /// Whether the viewer follows this user.
    pub is_following: bool,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
}

/// Validate a content field: non-blank and within the length cap.
pub fn validate_content(content: &str, max_len: usize, what: &str) -> Result<(), SocialError> {
    if content.trim().is_empty() {
        return Err(SocialError::invalid(format!("{what} content is required")));
    }
    if content.chars().count() > max_len {
        return Err(SocialError::invalid(format!(
            "{what} content exceeds {max_len} characters"
        )));
    }
    Ok(())
}
