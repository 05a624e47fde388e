//! Accounts and bearer-token authentication

pub mod accounts;
mod extractor;
pub mod password;
pub mod token;

pub use extractor::Principal;
pub use token::TokenPair;
