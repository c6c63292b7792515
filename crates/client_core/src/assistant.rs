//! Voice-assistant runtime configuration.

pub const NATIVE_PANEL_DEFAULT_TEXT: &str = "Что вы хотите сделать?";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativePanel {
    pub default_text: String,
    pub screenshot_mode: bool,
    pub tab_index: i32,
}

impl Default for NativePanel {
    fn default() -> Self {
        Self {
            default_text: NATIVE_PANEL_DEFAULT_TEXT.to_string(),
            screenshot_mode: false,
            tab_index: -1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebuggerOptions {
    pub token: String,
    pub init_phrase: String,
    pub native_panel: NativePanel,
}

/// Development builds talk to the smartapp debugger; everything else uses
/// the production assistant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssistantMode {
    Debugger(DebuggerOptions),
    Production,
}

impl AssistantMode {
    pub fn for_environment(app_env: &str, token: Option<&str>, smartapp: Option<&str>) -> Self {
        if !app_env.trim().eq_ignore_ascii_case("development") {
            return Self::Production;
        }

        Self::Debugger(DebuggerOptions {
            token: token.unwrap_or_default().to_string(),
            init_phrase: format!("Запусти {}", smartapp.unwrap_or_default()),
            native_panel: NativePanel::default(),
        })
    }

    pub fn is_debugger(&self) -> bool {
        matches!(self, Self::Debugger(_))
    }

    pub fn init_phrase(&self) -> Option<&str> {
        match self {
            Self::Debugger(options) => Some(&options.init_phrase),
            Self::Production => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Debugger(_) => "debugger",
            Self::Production => "production",
        }
    }
}
