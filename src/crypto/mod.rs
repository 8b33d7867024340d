pub mod password;
pub mod token;

pub use password::CredentialStore;
pub use token::{Claims, SessionIssuer};
