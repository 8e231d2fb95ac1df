//! Layered pipeline settings

use aoi_stream::{ColumnMap, LabelComposer, DEFAULT_OFF_SCREEN_TOKENS};
use config::{Config, Environment, File};
use fixation::{DwellAnalyzer, DwellConfig, FixationConfig, FixationDetector};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};
use transitions::TransitionConfig;
use triplets::{TripletConfig, TripletDetector, TripletError};

/// Environment variables starting with `GAZE__` override file settings,
/// e.g. `GAZE__TRIPLETS__MAX_GAP_FRAMES=2`
pub const ENV_PREFIX: &str = "GAZE";

/// Settings errors. All of them stop a run before any data is read.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    #[error(transparent)]
    InvalidPattern(#[from] TripletError),

    #[error("Invalid setting: {0}")]
    Invalid(String),
}

/// Age banding for the cohort breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CohortConfig {
    /// Ascending band edges in months; `[6, 12]` gives `<6`, `6-12`, `>=12`
    pub age_bands_months: Vec<f64>,
}

impl Default for CohortConfig {
    fn default() -> Self {
        Self {
            age_bands_months: vec![6.0, 9.0, 12.0, 18.0, 24.0],
        }
    }
}

impl CohortConfig {
    /// Band label for an age, `unknown` when the age was not annotated
    pub fn band(&self, age_months: Option<f64>) -> String {
        let Some(age) = age_months else {
            return "unknown".to_string();
        };
        let edges = &self.age_bands_months;
        match edges.iter().position(|&edge| age < edge) {
            Some(0) => format!("<{}", edges[0]),
            Some(i) => format!("{}-{}", edges[i - 1], edges[i]),
            None => match edges.last() {
                Some(last) => format!(">={}", last),
                None => "all".to_string(),
            },
        }
    }

    fn validate(&self) -> Result<(), SettingsError> {
        let edges = &self.age_bands_months;
        if edges.iter().any(|e| !e.is_finite() || *e < 0.0) {
            return Err(SettingsError::Invalid(
                "age band edges must be non-negative numbers".into(),
            ));
        }
        if edges.windows(2).any(|w| w[0] >= w[1]) {
            return Err(SettingsError::Invalid(
                "age band edges must be strictly ascending".into(),
            ));
        }
        Ok(())
    }
}

/// Complete pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Input column names
    pub columns: ColumnMap,

    /// Annotation tokens read as off-screen
    pub off_screen_tokens: Vec<String>,

    /// Master fixation log detection
    pub fixation: FixationConfig,

    /// Dwell-time detection and trimming
    pub dwell: DwellConfig,

    pub transitions: TransitionConfig,

    pub triplets: TripletConfig,

    pub cohort: CohortConfig,

    /// Process trials in parallel
    pub parallel: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            columns: ColumnMap::default(),
            off_screen_tokens: DEFAULT_OFF_SCREEN_TOKENS.iter().map(|t| t.to_string()).collect(),
            fixation: FixationConfig::default(),
            dwell: DwellConfig::default(),
            transitions: TransitionConfig::default(),
            triplets: TripletConfig::default(),
            cohort: CohortConfig::default(),
            parallel: true,
        }
    }
}

impl Settings {
    /// Load defaults, then `base`, then `variant`, then `GAZE__*` variables.
    ///
    /// Later sources override earlier ones key by key. List values are
    /// merged by position, so a list should be given in full in one source.
    pub fn load(base: Option<&Path>, variant: Option<&Path>) -> Result<Self, SettingsError> {
        let mut builder = Config::builder();
        for path in [base, variant].into_iter().flatten() {
            info!("Loading settings from {}", path.display());
            builder = builder.add_source(File::from(path));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        debug!("Settings: {:?}", settings);
        Ok(settings)
    }

    /// Check every section; triplet patterns are fully validated here
    pub fn validate(&self) -> Result<(), SettingsError> {
        self.triplets.validate()?;
        self.fixation
            .validate()
            .map_err(|e| SettingsError::Invalid(format!("fixation: {}", e)))?;
        DwellAnalyzer::new(self.dwell.clone())
            .map_err(|e| SettingsError::Invalid(format!("dwell: {}", e)))?;
        self.transitions
            .validate()
            .map_err(|e| SettingsError::Invalid(format!("transitions: {}", e)))?;
        self.cohort.validate()?;
        Ok(())
    }

    pub fn composer(&self) -> LabelComposer {
        LabelComposer::new(&self.off_screen_tokens)
    }

    /// Build the detectors once per run
    pub fn detectors(&self) -> Result<Detectors, SettingsError> {
        Ok(Detectors {
            composer: self.composer(),
            fixation: FixationDetector::new(self.fixation.clone())
                .map_err(|e| SettingsError::Invalid(format!("fixation: {}", e)))?,
            dwell: DwellAnalyzer::new(self.dwell.clone())
                .map_err(|e| SettingsError::Invalid(format!("dwell: {}", e)))?,
            transitions: transitions::TransitionExtractor::new(self.transitions.collapse_repeats),
            triplets: TripletDetector::new(&self.triplets)?,
        })
    }
}

/// Configured detectors shared read-only by every trial
#[derive(Debug, Clone)]
pub struct Detectors {
    pub composer: LabelComposer,
    pub fixation: FixationDetector,
    pub dwell: DwellAnalyzer,
    pub transitions: transitions::TransitionExtractor,
    pub triplets: TripletDetector,
}
