pub use self::{
    db::TableManager,
    models::{Entity, File, Folder},
};

pub mod db;
pub mod mapper;
pub mod models;
