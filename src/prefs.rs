use crate::canvas::Rgb;
use crate::viz::{VisualSettings, VisualSize, VisualStyle, DEFAULT_COLOR};
use std::fmt;
use std::path::{Path, PathBuf};

/// Last-used visual settings, persisted between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppPrefs {
    pub style: VisualStyle,
    pub size: VisualSize,
    pub color: Rgb,
}

impl Default for AppPrefs {
    fn default() -> Self {
        Self {
            style: VisualStyle::Bars,
            size: VisualSize::Small,
            color: DEFAULT_COLOR,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrefsError {
    Io(String),
    Parse { line: usize, message: String },
}

impl fmt::Display for PrefsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "I/O error: {msg}"),
            Self::Parse { line, message } => write!(f, "parse error at line {line}: {message}"),
        }
    }
}

impl std::error::Error for PrefsError {}

impl AppPrefs {
    pub fn settings(&self) -> VisualSettings {
        VisualSettings {
            style: self.style,
            size: self.size,
            color: self.color,
        }
    }

    pub fn from_settings(settings: VisualSettings) -> Self {
        Self {
            style: settings.style,
            size: settings.size,
            color: settings.color,
        }
    }

    pub fn load(path: Option<&Path>) -> Result<Self, PrefsError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let text = match std::fs::read_to_string(path) {
            Ok(v) => v,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => return Err(PrefsError::Io(err.to_string())),
        };

        Self::parse(&text)
    }

    /// Unknown keys are skipped so older builds can read newer files.
    pub fn parse(text: &str) -> Result<Self, PrefsError> {
        let mut prefs = Self::default();
        for (line_idx, raw) in text.lines().enumerate() {
            let line_no = line_idx + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key_raw, value_raw)) = line.split_once('=') else {
                return Err(PrefsError::Parse {
                    line: line_no,
                    message: "expected <key>=<value>".to_string(),
                });
            };
            let key = key_raw.trim();
            let value = value_raw.trim();
            match key {
                "style" => {
                    prefs.style = VisualStyle::parse(value).ok_or_else(|| PrefsError::Parse {
                        line: line_no,
                        message: "style must be bars/wave/circle".to_string(),
                    })?;
                }
                "size" => {
                    prefs.size = VisualSize::parse(value).ok_or_else(|| PrefsError::Parse {
                        line: line_no,
                        message: "size must be small/large".to_string(),
                    })?;
                }
                "color" => {
                    prefs.color = Rgb::parse_hex(value).map_err(|e| PrefsError::Parse {
                        line: line_no,
                        message: format!("color: {e}"),
                    })?;
                }
                _ => {}
            }
        }
        Ok(prefs)
    }

    pub fn save(&self, path: Option<&Path>) -> Result<(), PrefsError> {
        let Some(path) = path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| PrefsError::Io(e.to_string()))?;
        }
        let body = format!(
            "# trackviz runtime prefs v1\nstyle={}\nsize={}\ncolor={}\n",
            self.style.label(),
            self.size.label(),
            self.color.hex()
        );
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, &body).map_err(|e| PrefsError::Io(e.to_string()))?;
        std::fs::rename(&tmp, path).map_err(|e| PrefsError::Io(e.to_string()))
    }
}

pub fn prefs_storage_path() -> Option<PathBuf> {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        if !xdg.trim().is_empty() {
            return Some(PathBuf::from(xdg).join("trackviz").join("prefs.txt"));
        }
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("trackviz")
            .join("prefs.txt"),
    )
}
