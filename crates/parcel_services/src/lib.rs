//! Parcel Services Layer
//!
//! Settings loading shared by the command-line runtime.

pub mod settings;

pub use settings::{LoggingSettings, Settings, SettingsError};

/// Load settings from `path`, or defaults when no path is given.
pub fn init_services(path: Option<&std::path::Path>) -> Result<Settings, SettingsError> {
    let settings = match path {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    tracing::debug!(
        partners = settings.partition.partners.len(),
        seed = settings.synthetic.seed,
        "settings ready"
    );
    Ok(settings)
}
