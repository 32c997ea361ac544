pub mod pii;
pub mod principal;

pub use pii::Masked;
pub use principal::{Principal, Role};
