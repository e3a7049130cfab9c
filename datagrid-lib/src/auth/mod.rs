//! Bearer credentials
//!
//! The grid never authenticates on its own. Every request asks a
//! [`TokenProvider`] for the current credential at call time.

mod token;

pub use token::AccessToken;
pub use token::StaticTokenProvider;
pub use token::TokenProvider;
