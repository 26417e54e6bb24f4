pub mod accounts;
pub mod auth;
pub mod messages;
pub mod password;
pub mod session;
pub mod templates;
pub mod users;
