pub mod activity;
pub mod board;
pub mod card;
pub mod comment;
pub mod list;
