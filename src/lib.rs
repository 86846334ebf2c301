pub mod cli;
pub mod config;
pub mod context;
pub mod download;
pub mod error;
pub mod filter;
pub mod logging;
pub mod model;
pub mod parser;
pub mod schema;
pub mod store;
pub mod ui;
pub mod validate;
pub mod writer;

pub use cli::{Cli, Commands};
pub use context::Session;
pub use error::PokedexError;
pub use model::{ByLanguage, Catalog};
pub use store::{FormQuery, Store};
pub use ui::{Phase, SilentUi, Ui};
