pub mod activity;
pub mod add;
pub mod board;
pub mod comment;
pub mod delete;
pub mod edit;
pub mod init;
pub mod list;
pub mod name;
pub mod show;
pub mod toggle;
