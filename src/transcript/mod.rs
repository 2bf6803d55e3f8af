pub mod store;
pub mod types;

pub use store::Transcript;
pub use types::{Speaker, Turn};
