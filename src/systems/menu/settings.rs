use bevy::prelude::Resource;
use log::warn;
use once_cell::sync::Lazy;
use serde::Deserialize;

use super::repeat::RepeatProfile;

const DEFAULT_SETTINGS_JSON: &str = include_str!("./content/menu_settings.json");

static DEFAULT_SETTINGS: Lazy<Result<MenuSettings, SettingsError>> =
    Lazy::new(|| MenuSettings::from_json(DEFAULT_SETTINGS_JSON));

/// Runtime policy for menu navigation.
#[derive(Resource, Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MenuSettings {
    #[serde(default)]
    pub repeat: RepeatProfile,
    /// How long sampling sleeps while no menu is open.
    #[serde(default = "default_idle_backoff_ms")]
    pub idle_backoff_ms: u64,
    /// Buttons stay disabled this long after a text input closes.
    #[serde(default = "default_text_input_cooldown_ms")]
    pub text_input_cooldown_ms: u64,
    /// Root menus ignore cancel; child menus still go back.
    #[serde(default)]
    pub prevent_exiting_menu: bool,
    #[serde(default)]
    pub disable_back_button: bool,
    #[serde(default)]
    pub disable_menu_buttons: bool,
    /// Closes the open menu every tick unless it opts out.
    #[serde(default)]
    pub dont_open_any_menu: bool,
}

fn default_idle_backoff_ms() -> u64 {
    1_000
}

fn default_text_input_cooldown_ms() -> u64 {
    300
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsValidationError {
    ZeroInitialDelay,
    ZeroStageDelay { stage: usize },
    ThresholdNotIncreasing { stage: usize },
    DelayIncreases { stage: usize },
}

impl std::fmt::Display for SettingsValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroInitialDelay => write!(f, "repeat.initial_delay_ms must be positive"),
            Self::ZeroStageDelay { stage } => {
                write!(f, "repeat.stages[{stage}].delay_ms must be positive")
            }
            Self::ThresholdNotIncreasing { stage } => write!(
                f,
                "repeat.stages[{stage}].after_steps must exceed the previous stage"
            ),
            Self::DelayIncreases { stage } => write!(
                f,
                "repeat.stages[{stage}].delay_ms must not exceed the previous delay"
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub enum SettingsError {
    Parse(String),
    Validation(Vec<SettingsValidationError>),
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(message) => write!(f, "{message}"),
            Self::Validation(errors) => {
                write!(f, "menu settings failed validation with {} error(s)", errors.len())?;
                for error in errors {
                    write!(f, "; {error}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for SettingsError {}

impl Default for MenuSettings {
    fn default() -> Self {
        match DEFAULT_SETTINGS.as_ref() {
            Ok(settings) => settings.clone(),
            Err(error) => {
                warn!("failed to load menu settings: {error}; using safe defaults");
                Self::fallback()
            }
        }
    }
}

impl MenuSettings {
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: MenuSettings = serde_json::from_str(json).map_err(|error| {
            SettingsError::Parse(format!("failed to parse menu settings: {error}"))
        })?;

        let errors = validate_settings(&settings);
        if !errors.is_empty() {
            return Err(SettingsError::Validation(errors));
        }
        Ok(settings)
    }

    /// Built-in values used when the embedded profile cannot be loaded.
    pub fn fallback() -> Self {
        Self {
            repeat: RepeatProfile::standard(),
            idle_backoff_ms: default_idle_backoff_ms(),
            text_input_cooldown_ms: default_text_input_cooldown_ms(),
            prevent_exiting_menu: false,
            disable_back_button: false,
            disable_menu_buttons: false,
            dont_open_any_menu: false,
        }
    }
}

pub fn validate_settings(settings: &MenuSettings) -> Vec<SettingsValidationError> {
    let mut errors = Vec::new();
    let repeat = &settings.repeat;
    if repeat.initial_delay_ms == 0 {
        errors.push(SettingsValidationError::ZeroInitialDelay);
    }

    let mut previous_threshold: Option<u32> = None;
    let mut previous_delay = repeat.initial_delay_ms;
    for (stage, entry) in repeat.stages.iter().enumerate() {
        if entry.delay_ms == 0 {
            errors.push(SettingsValidationError::ZeroStageDelay { stage });
        }
        if previous_threshold.is_some_and(|threshold| entry.after_steps <= threshold) {
            errors.push(SettingsValidationError::ThresholdNotIncreasing { stage });
        }
        if entry.delay_ms > previous_delay {
            errors.push(SettingsValidationError::DelayIncreases { stage });
        }
        previous_threshold = Some(entry.after_steps);
        previous_delay = entry.delay_ms;
    }
    errors
}
