use redb::TableDefinition;

/// User records: uuid -> UserRecord (msgpack)
pub const USERS: TableDefinition<&str, &[u8]> = TableDefinition::new("users");

/// Email index: email -> user uuid (enforces email uniqueness)
pub const USER_EMAILS: TableDefinition<&str, &str> = TableDefinition::new("user_emails");

/// API key index: sha-256 hex of the raw key -> user uuid
pub const USER_API_KEYS: TableDefinition<&str, &str> = TableDefinition::new("user_api_keys");

/// Post records: uuid -> PostRecord (msgpack)
pub const POSTS: TableDefinition<&str, &[u8]> = TableDefinition::new("posts");

/// Article records: uuid -> ArticleRecord (msgpack)
pub const ARTICLES: TableDefinition<&str, &[u8]> = TableDefinition::new("articles");

/// Image records: uuid -> ImageRecord (msgpack)
pub const IMAGES: TableDefinition<&str, &[u8]> = TableDefinition::new("images");

/// Session records: sha-256 hex of the raw token -> SessionRecord (msgpack)
pub const SESSIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("sessions");

/// Owner index: user uuid -> msgpack Vec of post UUIDs
pub const USER_POSTS: TableDefinition<&str, &[u8]> = TableDefinition::new("user_posts");

/// Owner index: user uuid -> msgpack Vec of image UUIDs
pub const USER_IMAGES: TableDefinition<&str, &[u8]> = TableDefinition::new("user_images");

/// Owner index: user uuid -> msgpack Vec of session token hashes
pub const USER_SESSIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("user_sessions");

/// Parent index: post uuid -> msgpack Vec of article UUIDs
pub const POST_ARTICLES: TableDefinition<&str, &[u8]> = TableDefinition::new("post_articles");

/// Parent index: article uuid -> msgpack Vec of image UUIDs
pub const ARTICLE_IMAGES: TableDefinition<&str, &[u8]> = TableDefinition::new("article_images");
