pub mod constants;
pub mod lock;

pub use constants::*;
pub use lock::{LockHandle, LockRegistry};
