#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls
)]
#![warn(
    missing_docs,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]
#![allow(clippy::module_name_repetitions)]

//! Typed pipeline configuration layered from defaults, a JSON file, and the
//! environment.
//!
//! Layout: `model.rs` (typed config), `defaults.rs` (default values and
//! bounds), `validate.rs` (validation helpers), `loader.rs` (`ConfigLoader`).

mod defaults;
pub mod error;
pub mod loader;
pub mod model;
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, ENV_PREFIX};
pub use model::PipelineConfig;
