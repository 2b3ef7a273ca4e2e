mod admin;
mod articles;
mod auth;
mod cms;
mod forms;
mod images;
mod media;
mod posts;
mod settings;

pub use admin::health;
pub use articles::{create_image, delete_article, list_images, reorder_images, update_article};
pub use auth::{login, logout, register};
pub use cms::{get_image as cms_get_image, get_post as cms_get_post};
pub use images::{
    create_image as create_user_image, delete_image, list_images as list_user_images,
    replace_image,
};
pub use media::serve_media;
pub use posts::{
    create_article, create_post, delete_post, get_post, list_posts, reorder_articles, update_post,
};
pub use settings::{delete_account, get_user, rotate_key, update_password, update_user};
