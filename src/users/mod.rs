pub mod memory;
pub mod repo;
pub mod repo_types;

pub use memory::MemoryUserStore;
pub use repo::{PgUserStore, UserStore, UsernameTaken};
pub use repo_types::{NewUser, User};
