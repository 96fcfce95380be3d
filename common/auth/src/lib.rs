pub mod claims;
pub mod config;
pub mod decoder;
pub mod error;
pub mod guards;
pub mod roles;
pub mod session;
pub mod storage;

pub use claims::DecodedClaims;
pub use config::SessionConfig;
pub use decoder::{decode_unverified, ClaimsResolver};
pub use error::{AuthError, AuthResult};
pub use guards::{AuthGuard, AuthState};
pub use roles::{Role, ROLE_ACCOUNTANT, ROLE_ADMIN, ROLE_TEACHER};
pub use session::{SessionBlob, TokenStore, UserProfile};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage};
