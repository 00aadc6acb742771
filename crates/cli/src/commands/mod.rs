pub mod chat;
pub mod gateway;
pub mod hash_password;
pub mod onboard;
pub mod pages;
