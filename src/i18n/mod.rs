//! Internationalization (i18n) module.
//!
//! Provides localized strings for CLI help and user-facing errors.
//! English is the default language; Spanish is available as an alternative.

use std::sync::OnceLock;

static CURRENT_LANG: OnceLock<Lang> = OnceLock::new();

/// Supported languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lang {
    /// English (default)
    En,
    /// Spanish
    Es,
}

impl Lang {
    /// Parse a language code string (e.g. "en", "es", "en_US", "es_ES.UTF-8").
    /// Returns `None` for unrecognized codes.
    pub fn from_code(code: &str) -> Option<Self> {
        let normalized = code.to_lowercase();
        let prefix = normalized.split(['_', '-', '.']).next().unwrap_or("");
        match prefix {
            "en" => Some(Self::En),
            "es" => Some(Self::Es),
            _ => None,
        }
    }

    /// Return the ISO 639-1 code for this language.
    pub fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Es => "es",
        }
    }
}

/// Initialize the global language. Call once at startup.
/// If already initialized, this is a no-op.
pub fn set_lang(lang: Lang) {
    let _ = CURRENT_LANG.set(lang);
}

/// Get the currently configured language (defaults to English).
pub fn lang() -> Lang {
    CURRENT_LANG.get().copied().unwrap_or(Lang::En)
}

/// Detect language from `URLSCAN_LANG`, `LC_MESSAGES` or `LANG`.
pub fn detect_system_lang() -> Lang {
    ["URLSCAN_LANG", "LC_MESSAGES", "LANG"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find_map(|v| Lang::from_code(&v))
        .unwrap_or(Lang::En)
}

/// Defines a function returning the string for the current language.
macro_rules! msg {
    ($name:ident, $en:expr, $es:expr) => {
        /// Returns a localized string for the current language.
        pub fn $name() -> &'static str {
            match lang() {
                Lang::En => $en,
                Lang::Es => $es,
            }
        }
    };
}

// ── CLI help strings ─────────────────────────────────────────────

msg!(
    app_about,
    "urlscan \u{2014} extract URLs from email messages or plain text",
    "urlscan \u{2014} extrae URLs de correos electr\u{f3}nicos o texto plano"
);
msg!(
    help_cmd_completions,
    "Generate shell completions",
    "Generar completions para tu shell"
);
msg!(
    help_cmd_manpage,
    "Generate a man page",
    "Generar p\u{e1}gina de manual"
);

// ── Summary output ───────────────────────────────────────────────

msg!(msg_source, "Source", "Origen");
msg!(msg_encoding, "Encoding", "Codificaci\u{f3}n");
msg!(msg_plain_text, "Plain text", "Texto plano");
msg!(msg_subject, "Subject", "Asunto");
msg!(msg_date, "Date", "Fecha");
msg!(msg_parts, "Parts", "Partes");
msg!(msg_yes, "yes", "s\u{ed}");
msg!(msg_no, "no", "no");

// ── Errors ───────────────────────────────────────────────────────

msg!(
    err_decoding_exhausted,
    "Encoding not detected. Please pass encoding value manually",
    "Codificaci\u{f3}n no detectada. Indica la codificaci\u{f3}n manualmente"
);
msg!(
    err_no_terminal,
    "No controlling terminal available for interactive input",
    "No hay terminal de control disponible para la entrada interactiva"
);
msg!(
    err_file_not_found,
    "File not found",
    "Fichero no encontrado"
);
