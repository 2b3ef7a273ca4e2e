mod articles;
pub mod db;
mod images;
pub mod models;
pub mod ordering;
mod posts;
mod sessions;
mod tables;
mod users;

pub use db::{Database, DatabaseError};
pub use images::NewImage;
pub use tables::*;
pub use users::NewUser;
