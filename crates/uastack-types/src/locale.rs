//! Locales and localized text.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::UaError;

/// A language with an optional country, e.g. `en` or `en-US`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Locale {
    language: String,
    country: Option<String>,
}

impl Locale {
    pub fn new(language: impl Into<String>, country: Option<&str>) -> Self {
        Self {
            language: language.into().to_lowercase(),
            country: country
                .filter(|c| !c.is_empty())
                .map(|c| c.to_uppercase()),
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn country(&self) -> Option<&str> {
        self.country.as_deref()
    }

    /// Canonical locale id: `language` or `language-COUNTRY`.
    pub fn to_locale_id(&self) -> String {
        match &self.country {
            Some(country) => format!("{}-{}", self.language, country),
            None => self.language.clone(),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_locale_id())
    }
}

impl FromStr for Locale {
    type Err = UaError;

    /// Accepts `en`, `en-US` and `en_US`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().splitn(2, ['-', '_']);
        let language = parts.next().unwrap_or_default();
        if language.is_empty() || !language.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(UaError::Decoding(format!("invalid locale '{s}'")));
        }
        let country = parts.next();
        if let Some(country) = country {
            if !country.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(UaError::Decoding(format!("invalid locale '{s}'")));
            }
        }
        Ok(Locale::new(language, country))
    }
}

impl TryFrom<String> for Locale {
    type Error = UaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Locale> for String {
    fn from(locale: Locale) -> Self {
        locale.to_locale_id()
    }
}

/// Human-readable text tagged with the locale it is written in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedText {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl LocalizedText {
    pub fn new(text: impl Into<String>, locale: Option<&Locale>) -> Self {
        Self {
            locale: locale.map(Locale::to_locale_id),
            text: Some(text.into()),
        }
    }

    /// Text without a locale.
    pub fn invariant(text: impl Into<String>) -> Self {
        Self::new(text, None)
    }

    pub fn is_empty(&self) -> bool {
        self.text.as_deref().map_or(true, str::is_empty)
    }
}

impl fmt::Display for LocalizedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text.as_deref().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locale_id_projection() {
        assert_eq!(Locale::new("en", Some("us")).to_locale_id(), "en-US");
        assert_eq!(Locale::new("FI", None).to_locale_id(), "fi");
        assert_eq!(Locale::new("de", Some("")).to_locale_id(), "de");
    }

    #[test]
    fn test_parse_locales() {
        let a: Locale = "en_GB".parse().unwrap();
        let b: Locale = "en-gb".parse().unwrap();
        assert_eq!(a, b);
        assert!("".parse::<Locale>().is_err());
        assert!("e1-US".parse::<Locale>().is_err());
    }

    #[test]
    fn test_localized_text() {
        let fi = Locale::new("fi", Some("FI"));
        let text = LocalizedText::new("Pumppu", Some(&fi));
        assert_eq!(text.locale.as_deref(), Some("fi-FI"));
        assert_eq!(text.to_string(), "Pumppu");
        assert!(LocalizedText::default().is_empty());
    }
}
