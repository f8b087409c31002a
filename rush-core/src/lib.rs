pub mod dictionary;
pub mod engine;
pub mod fragments;
pub mod ident;

// Re-export main components
pub use dictionary::*;
pub use engine::*;
pub use fragments::*;
pub use ident::*;
