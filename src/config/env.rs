use strum_macros::{Display, EnumString};

#[derive(Clone, Copy, Debug, Display, EnumString, PartialEq, Eq)]
pub enum ENV {
    #[strum(serialize = "development")]
    Development,
    #[strum(serialize = "testing")]
    Testing,
    #[strum(serialize = "production")]
    Production,
}

impl From<String> for ENV {
    fn from(value: String) -> Self {
        value.parse().unwrap_or(ENV::Development)
    }
}
