use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Change to an optional column, used for article titles. `Absent` leaves
/// the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Patch<T> {
    #[default]
    Absent,
    Null,
    Value(T),
}

impl<T> Patch<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Patch::Absent)
    }

    /// Apply the patch to an optional field in place.
    pub fn apply_to(self, field: &mut Option<T>) {
        match self {
            Patch::Absent => {}
            Patch::Null => *field = None,
            Patch::Value(v) => *field = Some(v),
        }
    }
}

/// A user account stored in redb. Never serialized to API clients as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub api_key_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The public view of a user account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&UserRecord> for UserProfile {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub banner_url: Option<String>,
    #[serde(default)]
    pub banner_asset_id: Option<String>,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    pub text: String,
    pub index: i32,
    pub post_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: String,
    pub url: String,
    pub asset_id: String,
    pub index: i32,
    /// `None` for loose user images that belong to no article.
    #[serde(default)]
    pub article_id: Option<String>,
    pub user_id: String,
    pub size: u64,
    pub original_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A login session. Keyed by the hash of its token, never by the token itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// An article together with its images, ordered by index.
#[derive(Debug, Clone, Serialize)]
pub struct ArticleWithImages {
    #[serde(flatten)]
    pub article: ArticleRecord,
    pub images: Vec<ImageRecord>,
}

/// A post together with its articles (and their images), ordered by index.
#[derive(Debug, Clone, Serialize)]
pub struct PostWithArticles {
    #[serde(flatten)]
    pub post: PostRecord,
    pub articles: Vec<ArticleWithImages>,
}

/// One entry of a client-submitted permutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexUpdate {
    pub id: String,
    pub index: i32,
}

/// Asset ids released by a delete, for clean-up on the asset host.
#[derive(Debug, Default, PartialEq)]
pub struct ReleasedAssets {
    pub asset_ids: Vec<String>,
}

impl ReleasedAssets {
    pub fn push(&mut self, asset_id: impl Into<String>) {
        self.asset_ids.push(asset_id.into());
    }

    pub fn extend(&mut self, other: ReleasedAssets) {
        self.asset_ids.extend(other.asset_ids);
    }
}

/// Aggregate numbers for a user's image library.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImageTotals {
    pub total_images: u64,
    pub total_size: u64,
}
