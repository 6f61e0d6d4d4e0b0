pub mod account;
pub mod admin;
