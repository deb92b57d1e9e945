use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

const DEFAULT_MINIMUM_INPUT: usize = 3;
const DEFAULT_LIVE_UPDATE_DELAY_SECS: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LiveCompletion {
    #[default]
    Always,
    Visible,
    Never,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColumnLayout {
    #[default]
    OneColumn,
    MultiColumn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Placement {
    #[default]
    AboveInput,
    Top,
}

/// When a multi-select pick should force-complete the field against the
/// source. Only consulted for non-file categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ForceComplete {
    #[default]
    Never,
    BeforeAppend,
    AfterAppend,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayOptions {
    pub placement: Placement,
    pub layout: ColumnLayout,
    pub line_numbers: bool,
    pub stripes: bool,
    pub hide_mode_line: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            placement: Placement::AboveInput,
            layout: ColumnLayout::OneColumn,
            line_numbers: false,
            stripes: false,
            hide_mode_line: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TandemConfig {
    pub minimum_input: usize,
    pub live_update_delay: Duration,
    pub live_completion: LiveCompletion,
    pub passlist: Vec<String>,
    pub blocklist: Vec<String>,
    pub remove_shadowed_file_names: bool,
    pub multi_select_force_complete: ForceComplete,
    pub display: DisplayOptions,
}

impl Default for TandemConfig {
    fn default() -> Self {
        Self {
            minimum_input: DEFAULT_MINIMUM_INPUT,
            live_update_delay: Duration::from_secs_f64(DEFAULT_LIVE_UPDATE_DELAY_SECS),
            live_completion: LiveCompletion::Always,
            passlist: Vec::new(),
            blocklist: Vec::new(),
            remove_shadowed_file_names: true,
            multi_select_force_complete: ForceComplete::Never,
            display: DisplayOptions::default(),
        }
    }
}

impl TandemConfig {
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path_ref = path.as_ref();
        match Self::load(path_ref) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(path = %path_ref.display(), "{err}. Using defaults.");
                Self::default()
            }
        }
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|error| ConfigError::Io {
            path: path.to_path_buf(),
            error,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let cfg: ConfigToml = toml::from_str(s)?;
        let delay = cfg.completion.live_update_delay;
        if !delay.is_finite() || delay < 0.0 {
            return Err(ConfigError::InvalidDelay(delay));
        }
        Ok(Self {
            minimum_input: cfg.completion.minimum_input,
            live_update_delay: Duration::from_secs_f64(delay),
            live_completion: cfg.completion.live_completion,
            passlist: cfg.completion.passlist,
            blocklist: cfg.completion.blocklist,
            remove_shadowed_file_names: cfg.completion.remove_shadowed_file_names,
            multi_select_force_complete: cfg.completion.multi_select_force_complete,
            display: DisplayOptions {
                placement: cfg.display.placement,
                layout: cfg.display.layout,
                line_numbers: cfg.display.line_numbers,
                stripes: cfg.display.stripes,
                hide_mode_line: cfg.display.hide_mode_line,
            },
        })
    }

    pub fn is_passlisted(&self, kind: &str) -> bool {
        self.passlist.iter().any(|k| k == kind)
    }

    pub fn is_blocklisted(&self, kind: &str) -> bool {
        self.blocklist.iter().any(|k| k == kind)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigToml {
    completion: CompletionToml,
    display: DisplayToml,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct CompletionToml {
    minimum_input: usize,
    live_update_delay: f64,
    live_completion: LiveCompletion,
    passlist: Vec<String>,
    blocklist: Vec<String>,
    remove_shadowed_file_names: bool,
    multi_select_force_complete: ForceComplete,
}

impl Default for CompletionToml {
    fn default() -> Self {
        Self {
            minimum_input: DEFAULT_MINIMUM_INPUT,
            live_update_delay: DEFAULT_LIVE_UPDATE_DELAY_SECS,
            live_completion: LiveCompletion::Always,
            passlist: Vec::new(),
            blocklist: Vec::new(),
            remove_shadowed_file_names: true,
            multi_select_force_complete: ForceComplete::Never,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DisplayToml {
    placement: Placement,
    layout: ColumnLayout,
    line_numbers: bool,
    stripes: bool,
    hide_mode_line: bool,
}
