//! Data collection: filesystem primitives, user enumeration, and the SSH key
//! scanner that ties them together.

pub mod filesystem;
pub mod ssh;
pub mod users;

pub use ssh::{collect_user_keys, gen_user_ssh_keys, KeyScan};
pub use users::PasswdUserSource;
