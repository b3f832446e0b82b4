//! Language classification of input files.
//!
//! A file's language is taken either from its name (configured substrings per
//! language) or from the text of its cells. Text detection itself is a black
//! box behind [`LanguageDetect`]; this module only samples the text and maps
//! the detector's answer onto the known codes.

use crate::config::{LanguageConfig, LanguageMode};
use crate::engine::WorkbookSession;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Language codes files can be classified as.
pub const KNOWN_LANGUAGES: &[&str] = &["vi", "en", "ja", "zh", "ko", "th", "fr", "de", "es"];

/// Code for anything that is not a known language.
pub const OTHER_LANGUAGE: &str = "other";

/// Text cells sampled from a workbook.
pub const MAX_TEXT_SAMPLES: usize = 100;

/// Samples joined into the detector's input.
pub const DETECTION_SAMPLES: usize = 50;

// Raw cells read while looking for usable samples.
const RAW_CELL_LIMIT: usize = MAX_TEXT_SAMPLES * 20;

/// Text -> language code.
pub trait LanguageDetect: Send + Sync {
    /// Detect the language of `text`, returning an ISO 639-1 style code
    /// (`"en"`, `"zh-cn"`, ...) or `None` when undecided.
    fn detect(&self, text: &str) -> Option<String>;
}

impl<F> LanguageDetect for F
where
    F: Fn(&str) -> Option<String> + Send + Sync,
{
    fn detect(&self, text: &str) -> Option<String> {
        self(text)
    }
}

/// Map a detector code onto [`KNOWN_LANGUAGES`], or [`OTHER_LANGUAGE`].
///
/// Region subtags are dropped (`zh-cn` is `zh`).
pub fn normalize_code(code: &str) -> String {
    let primary = code
        .trim()
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    if KNOWN_LANGUAGES.contains(&primary.as_str()) {
        primary
    } else {
        OTHER_LANGUAGE.to_string()
    }
}

fn is_sample(text: &str) -> bool {
    text.chars().count() > 3 && text.chars().any(char::is_alphabetic)
}

/// Up to [`MAX_TEXT_SAMPLES`] cells of real text, in reading order.
pub fn collect_samples<S>(session: &S) -> Vec<String>
where
    S: WorkbookSession + ?Sized,
{
    session
        .text_samples(RAW_CELL_LIMIT)
        .into_iter()
        .map(|text| text.trim().to_string())
        .filter(|text| is_sample(text))
        .take(MAX_TEXT_SAMPLES)
        .collect()
}

/// Detector input built from collected samples.
pub fn detection_text(samples: &[String]) -> String {
    samples
        .iter()
        .take(DETECTION_SAMPLES)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Decides the language of each file from [`LanguageConfig`].
#[derive(Clone)]
pub struct LanguageClassifier {
    config: LanguageConfig,
    detector: Option<Arc<dyn LanguageDetect>>,
}

impl fmt::Debug for LanguageClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LanguageClassifier")
            .field("config", &self.config)
            .field("detector", &self.detector.is_some())
            .finish()
    }
}

impl LanguageClassifier {
    pub fn new(config: LanguageConfig) -> Self {
        Self {
            config,
            detector: None,
        }
    }

    pub fn with_detector(mut self, detector: Arc<dyn LanguageDetect>) -> Self {
        self.detector = Some(detector);
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn config(&self) -> &LanguageConfig {
        &self.config
    }

    /// Whether classifying in the current mode reads the workbook.
    pub fn wants_content(&self) -> bool {
        self.config.enabled && self.config.mode == LanguageMode::Auto && self.detector.is_some()
    }

    /// Classify from the file stem alone.
    ///
    /// The first language with a non-empty pattern contained in `stem` wins.
    /// Failing that, a language listing the empty pattern takes the file,
    /// unless another language's pattern occurs in the stem.
    pub fn classify_filename(&self, stem: &str) -> String {
        let patterns = &self.config.filename_patterns;

        for entry in patterns {
            if let Some(pattern) = entry
                .patterns
                .iter()
                .find(|p| !p.is_empty() && stem.contains(p.as_str()))
            {
                debug!("'{}' matches pattern '{}' of {}", stem, pattern, entry.lang);
                return entry.lang.clone();
            }
        }

        for entry in patterns {
            if !entry.patterns.iter().any(String::is_empty) {
                continue;
            }
            let claimed_elsewhere = patterns
                .iter()
                .filter(|other| other.lang != entry.lang)
                .flat_map(|other| other.patterns.iter())
                .any(|p| !p.is_empty() && stem.contains(p.as_str()));
            if !claimed_elsewhere {
                debug!("'{}' falls to catch-all language {}", stem, entry.lang);
                return entry.lang.clone();
            }
        }

        OTHER_LANGUAGE.to_string()
    }

    /// Classify from the workbook's text.
    ///
    /// Returns `None` when there is no detector, no usable text, or the
    /// detector cannot decide.
    pub fn classify_content<S>(&self, session: &S) -> Option<String>
    where
        S: WorkbookSession + ?Sized,
    {
        let detector = self.detector.as_ref()?;
        let samples = collect_samples(session);
        if samples.is_empty() {
            warn!("No text found for language detection");
            return None;
        }
        let detected = detector.detect(&detection_text(&samples))?;
        let code = normalize_code(&detected);
        debug!("Detector answered '{}', classified as '{}'", detected, code);
        Some(code)
    }

    /// Language code for one file, or `None` when classification is off.
    ///
    /// In auto mode the workbook text decides; without a workbook or a
    /// detector the filename does.
    pub fn classify(&self, stem: &str, session: Option<&dyn WorkbookSession>) -> Option<String> {
        if !self.config.enabled {
            return None;
        }
        let lang = match (self.config.mode, session) {
            (LanguageMode::Filename, _) => self.classify_filename(stem),
            (LanguageMode::Auto, Some(session)) => match self.classify_content(session) {
                Some(code) => code,
                None => self.classify_filename(stem),
            },
            (LanguageMode::Auto, None) => {
                debug!("No workbook text for '{}', using the filename", stem);
                self.classify_filename(stem)
            }
        };
        info!("Classified '{}' as '{}'", stem, lang);
        Some(lang)
    }

    /// Output folder for a classified file.
    pub fn folder_for(&self, lang: &str) -> String {
        self.config.folder_name(lang)
    }
}
