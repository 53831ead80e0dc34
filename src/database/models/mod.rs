pub mod branch;
pub mod chat;
pub mod content;
pub mod user;

pub use branch::*;
pub use chat::*;
pub use content::*;
pub use user::*;
