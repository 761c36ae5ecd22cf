pub mod access;
pub mod general;
pub mod health;

pub use access::{read_value, write_value};
pub use general::{not_found, root};
pub use health::health_check;
