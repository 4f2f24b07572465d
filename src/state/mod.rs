pub mod token_store;

pub use token_store::{reduce, PersistedTokenState, StoreAction, TokenState, TokenStore};
