use crate::deck::model::{Slide, validate_slides};
use crate::export::options::ExportOptions;
use crate::foundation::error::{ReelError, ReelResult};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Where a deck's code listing comes from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeDef {
    /// Code embedded in the deck JSON.
    Inline(String),
    /// Path to a source file, relative to the deck file.
    Path(PathBuf),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DeckDef {
    code: CodeDef,
    #[serde(default = "default_language")]
    language: String,
    #[serde(default = "default_speed")]
    speed: f64,
    slides: Vec<Slide>,
    #[serde(default)]
    export: ExportOptions,
}

fn default_language() -> String {
    "text".to_owned()
}

fn default_speed() -> f64 {
    1.0
}

/// JSON-facing deck: code listing, slides, playback speed and export defaults.
///
/// Decks are what the CLI loads; library users can also build slides directly and skip this
/// type entirely.
#[derive(Debug, Clone)]
pub struct Deck {
    pub code: String,
    pub language: String,
    pub speed: f64,
    pub slides: Vec<Slide>,
    pub export: ExportOptions,
}

impl Deck {
    /// Parse a deck from a JSON reader. Path-based code is resolved against `base_dir`.
    pub fn from_reader<R: std::io::Read>(r: R, base_dir: &Path) -> ReelResult<Self> {
        let def: DeckDef = serde_json::from_reader(r)
            .map_err(|e| ReelError::validation(format!("parse deck JSON: {e}")))?;

        let code = match def.code {
            CodeDef::Inline(s) => s,
            CodeDef::Path(p) => {
                let full = base_dir.join(&p);
                std::fs::read_to_string(&full).map_err(|e| {
                    ReelError::validation(format!("read code file '{}': {e}", full.display()))
                })?
            }
        };

        let deck = Self {
            code,
            language: def.language,
            speed: def.speed,
            slides: def.slides,
            export: def.export,
        };
        deck.validate()?;
        Ok(deck)
    }

    /// Parse a deck from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> ReelResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            ReelError::validation(format!("open deck JSON '{}': {e}", path.display()))
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_reader(BufReader::new(f), base)
    }

    pub fn validate(&self) -> ReelResult<()> {
        if self.code.trim().is_empty() {
            return Err(ReelError::validation("deck code must be non-empty"));
        }
        if !self.speed.is_finite() || self.speed <= 0.0 {
            return Err(ReelError::validation("deck speed must be finite and > 0"));
        }
        validate_slides(&self.slides)
    }
}
