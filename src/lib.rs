// Library exports for tabviz

pub mod classify;
pub mod config;
pub mod data;
pub mod error;
pub mod export;
pub mod filter;
pub mod graph;
pub mod insight;
pub mod ir;
pub mod loader;
pub mod runtime;
pub mod session;
pub mod stats;
pub mod theme;
pub mod transform;

pub use config::{Config, LoadOptions, RenderOptions};
pub use error::{ConfigError, LoadError};
pub use ir::{ChartKind, Selection};
pub use session::Session;
