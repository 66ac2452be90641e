//! Ordered list of encodings to try when decoding input.

use super::codec::labels_match;

/// Fallback encodings, tried in this order after the locale's preference.
pub const BASE_ENCODINGS: [&str; 7] = [
    "UTF-8",
    "LATIN-1",
    "ISO-8859-1",
    "ISO-8859-2",
    "UTF-16",
    "CP720",
    "CP437",
];

/// Locale state captured once at startup.
///
/// Holds the raw values of the locale environment variables so that
/// candidate resolution never reads process-global state itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocaleSnapshot {
    pub lc_all: Option<String>,
    pub lc_ctype: Option<String>,
    pub lang: Option<String>,
}

impl LocaleSnapshot {
    /// Read `LC_ALL`, `LC_CTYPE` and `LANG` from the environment.
    pub fn from_env() -> Self {
        Self {
            lc_all: std::env::var("LC_ALL").ok(),
            lc_ctype: std::env::var("LC_CTYPE").ok(),
            lang: std::env::var("LANG").ok(),
        }
    }

    /// The locale's preferred encoding, if one can be determined.
    ///
    /// `en_US.UTF-8` yields `UTF-8`, `de_DE.ISO-8859-15@euro` yields
    /// `ISO-8859-15`, and `C`/`POSIX` yield `ANSI_X3.4-1968`.
    pub fn preferred_encoding(&self) -> Option<String> {
        let locale = [&self.lc_all, &self.lc_ctype, &self.lang]
            .into_iter()
            .flatten()
            .map(|v| v.trim())
            .find(|v| !v.is_empty())?;

        if locale == "C" || locale == "POSIX" {
            return Some("ANSI_X3.4-1968".to_string());
        }

        let (_, codeset) = locale.split_once('.')?;
        let codeset = codeset.split('@').next().unwrap_or("").trim();
        if codeset.is_empty() {
            None
        } else {
            Some(codeset.to_string())
        }
    }
}

/// Ordered, deduplicated encoding labels. The first label that decodes wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodingCandidateList {
    labels: Vec<String>,
}

impl EncodingCandidateList {
    /// Build the list from locale state: the preferred encoding first
    /// (unless already a base member), then the base list.
    ///
    /// An undeterminable locale leaves the base list unchanged.
    pub fn resolve(locale: &LocaleSnapshot) -> Self {
        let mut list = Self::base();
        match locale.preferred_encoding() {
            Some(preferred) if !list.contains(&preferred) => {
                tracing::debug!(encoding = %preferred, "Prepending locale encoding");
                list.labels.insert(0, preferred);
            }
            Some(_) => {}
            None => tracing::debug!("Locale encoding undetermined, using base list"),
        }
        list
    }

    /// The fixed base list.
    pub fn base() -> Self {
        Self {
            labels: BASE_ENCODINGS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// A list holding exactly the given labels, duplicates dropped.
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list = Self { labels: Vec::new() };
        list.extend(labels);
        list
    }

    /// Append labels not yet present.
    pub fn extend<I, S>(&mut self, labels: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for label in labels {
            let label = label.into();
            if !self.contains(&label) {
                self.labels.push(label);
            }
        }
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.iter().any(|l| labels_match(l, label))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.labels
    }
}
