pub mod app_config;
pub mod config;
pub mod link;
pub mod locale;
pub mod navigation;
pub mod page;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use link::{CatalogKind, LinkReference};
pub use locale::{build_locale_url, split_locale_prefix, to_cms_locale, to_commerce_locale, Locale};
pub use navigation::{
    decide_page, ExtraMenu, ExtraMenuEntry, NavigationElement, NavigationTree, PageDecision,
};
pub use page::{PagePayload, PageTarget, Section, SectionKind, Slot};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
