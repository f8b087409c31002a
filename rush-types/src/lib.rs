pub mod errors;
pub mod game;
pub mod ident;
pub mod messages;
pub mod player;

// Re-export all types
pub use errors::*;
pub use game::*;
pub use ident::*;
pub use messages::*;
pub use player::*;
