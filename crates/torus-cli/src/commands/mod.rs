pub mod groups;
pub mod init;
pub mod place;
