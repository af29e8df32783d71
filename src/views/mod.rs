pub mod auth;
pub mod components;
pub mod dashboard;
pub mod homepage;
pub mod layout;
pub mod student;
pub mod teacher;

pub use layout::{page, render, titled};
