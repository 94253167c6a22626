//! Layered configuration loading with typed, templated optional values.
//!
//! ```
//! use serde_json::json;
//! use tmplcfg::Optional;
//!
//! let node = json!("{{ default \"30\" env \"TMPLCFG_DOC_TIMEOUT\" }}");
//! assert_eq!(Optional::<u32>::decode(Some(&node)).unwrap(), Optional::Present(30));
//! assert!(Optional::<u32>::decode(None).unwrap().is_absent());
//! ```

pub mod cli;
pub mod config;
mod error;
pub mod logging;
pub mod option;
pub mod template;

pub use config::{Config, ConfigError};
pub use error::Error;
pub use option::{ConfigValue, DecodeError, Optional, RawNode, TextParse};
pub use template::{Evaluator, TemplateError, TemplateEvaluator};
