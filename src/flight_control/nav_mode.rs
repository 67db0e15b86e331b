use strum_macros::Display;

/// Navigation modes the controller can dispatch on.
#[derive(Debug, Display, PartialEq, Eq, Clone, Copy, Hash, Default, serde::Serialize, serde::Deserialize)]
pub enum NavMode {
    /// Hover in place at zero attitude.
    #[default]
    Hold,
    /// Placeholder, issues no attitude or height corrections.
    Land,
}
