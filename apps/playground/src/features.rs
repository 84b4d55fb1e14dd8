//! Demo feature manifest used by the playground.

use fkit::domain::{FromVariables, Variables, VariablesError, deserialize};
use fkit::feature_manifest;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct SettingsConfig {
    pub punctuation_enabled: bool,
}

impl FromVariables for SettingsConfig {
    fn from_variables(variables: &dyn Variables) -> Result<Self, VariablesError> {
        Ok(Self { punctuation_enabled: variables.get_bool("punctuation-enabled").unwrap_or(false) })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct HomescreenConfig {
    pub sections: Vec<String>,
}

impl Default for HomescreenConfig {
    fn default() -> Self {
        Self { sections: vec!["top-sites".to_owned()] }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct OnboardingConfig {
    pub card_count: u8,
    pub headline: String,
}

/// At most this many onboarding cards are shown.
const MAX_CARDS: i64 = 8;

fn onboarding(variables: &dyn Variables) -> Result<OnboardingConfig, VariablesError> {
    let card_count = match variables.get_value("card-count") {
        None => 1,
        Some(_) => {
            let count = variables.require_int("card-count")?;
            u8::try_from(count)
                .ok()
                .filter(|&count| i64::from(count) <= MAX_CARDS)
                .ok_or_else(|| {
                    VariablesError::malformed("card-count", format!("{count} is not within 0..={MAX_CARDS}"))
                })?
        },
    };
    let headline = variables.get_string("headline").unwrap_or("Welcome").to_owned();

    Ok(OnboardingConfig { card_count, headline })
}

#[feature_manifest(serialize)]
pub struct DemoFeatures {
    /// Editor settings.
    settings: SettingsConfig,
    /// Sections shown on the home screen, in order.
    #[feature(name = "home-screen", with = deserialize)]
    homescreen: HomescreenConfig,
    /// First-run onboarding cards.
    #[feature(with = onboarding)]
    onboarding: OnboardingConfig,
}
