pub mod model;
pub mod ranking;
pub mod repository;
pub mod validate;
