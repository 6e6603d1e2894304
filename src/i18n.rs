//! Locales and receipt text lookup.
//!
//! The renderer never hardcodes user-facing labels; it asks a [`Translate`]
//! implementation for each key. [`Catalog`] ships the English and Kannada
//! tables used by the trust, and any `Fn(&str) -> Option<String>` closure can
//! stand in for it.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// The two receipt languages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Kn,
}

/// Locale-dependent styling of the receipt title
#[derive(Debug, Clone, PartialEq)]
pub struct TitleStyle {
    pub font_size_px: u32,
    pub uppercase: bool,
    pub letter_spacing_px: f32,
    pub line_height: Option<f32>,
}

impl TitleStyle {
    /// Inline CSS for the title element
    pub fn css(&self) -> String {
        let mut css = format!(
            "color: #ea580c; margin: 0; font-size: {}px; font-weight: 800;",
            self.font_size_px
        );
        if self.uppercase {
            css.push_str(" text-transform: uppercase;");
        }
        if self.letter_spacing_px > 0.0 {
            css.push_str(&format!(" letter-spacing: {}px;", self.letter_spacing_px));
        }
        if let Some(lh) = self.line_height {
            css.push_str(&format!(" line-height: {};", lh));
        }
        css
    }
}

/// Receipt date format; both locales are day-first
const DATE_FORMAT: &str = "%d/%m/%Y";

impl Locale {
    pub const ALL: [Locale; 2] = [Locale::En, Locale::Kn];

    pub fn code(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Kn => "kn",
        }
    }

    /// Kannada keeps its script as-is; English titles are set in tracked capitals.
    pub fn title_style(&self) -> TitleStyle {
        match self {
            Locale::En => TitleStyle {
                font_size_px: 28,
                uppercase: true,
                letter_spacing_px: 0.5,
                line_height: None,
            },
            Locale::Kn => TitleStyle {
                font_size_px: 26,
                uppercase: false,
                letter_spacing_px: 0.0,
                line_height: Some(1.5),
            },
        }
    }

    /// `chrono` format string for receipt dates
    pub fn date_format(&self) -> &'static str {
        DATE_FORMAT
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Locale {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        // Accept region-qualified tags like `en-IN` or `kn_IN`
        let lang = s.trim().split(['-', '_']).next().unwrap_or_default().to_ascii_lowercase();
        match lang.as_str() {
            "en" => Ok(Locale::En),
            "kn" => Ok(Locale::Kn),
            _ => Err(Error::ConfigError(format!("unsupported locale '{}'", s))),
        }
    }
}

/// Text lookup for receipt labels.
pub trait Translate {
    /// Locale-specific text for `key`, if known
    fn lookup(&self, key: &str) -> Option<String>;

    /// Text for `key`, or `fallback` when the lookup has nothing (or only an empty string)
    fn text_or(&self, key: &str, fallback: &str) -> String {
        self.lookup(key)
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| fallback.to_string())
    }

    /// Text for `key`, falling back to the key itself
    fn text(&self, key: &str) -> String {
        self.text_or(key, key)
    }
}

impl<F> Translate for F
where
    F: Fn(&str) -> Option<String>,
{
    fn lookup(&self, key: &str) -> Option<String> {
        self(key)
    }
}

const EN: &[(&str, &str)] = &[
    ("top_ribbon", "|| Sri Kottureshwaraya Namaha ||"),
    ("app_title", "Donation Collection"),
    ("app_description", "Record a new donation and generate a receipt instantly."),
    ("donor_name", "Donor Name"),
    ("mobile_number", "Mobile Number"),
    ("amount", "Amount / Value (₹)"),
    ("donation_type", "Donation Type"),
    ("mode_upi", "UPI / QR Code"),
    ("mode_cash", "Cash"),
    ("mode_groceries", "Groceries / Goods"),
    ("notes", "Notes (Optional)"),
    ("receipt_no", "Receipt No"),
    ("date", "Date"),
    ("thank_you", "Thank you for your generous contribution!"),
    ("trust_name", "Paramashakthi Sri Guru Kottureshwara Trust (R)"),
    ("trust_address", "Sri Kshetra Kotturu, Vijayanagara District"),
    ("trust_state", "Karnataka - 583 134"),
    ("receipt_generated_title", "Receipt Generated"),
    ("receipt_generated_desc", "The donation receipt has been downloaded."),
    ("missing_info_title", "Missing Information"),
    ("missing_info_desc", "Please fill in all mandatory fields (Name, Amount, Mobile)."),
    ("error_title", "Error"),
    ("error_desc", "Failed to generate receipt. Please try again."),
    ("utr_number", "UTR Number"),
    ("address", "Address"),
    ("grocery_items", "Grocery Items List"),
    ("original_copy", "Original Copy"),
    ("serial_no", "S.NO"),
    ("item_name", "ITEM NAME"),
    ("quantity", "QUANTITY"),
];

const KN: &[(&str, &str)] = &[
    ("top_ribbon", "|| ಶ್ರೀ ಕೊಟ್ಟೂರೇಶ್ವರಾಯ ನಮಃ ||"),
    ("app_title", "ದೇಣಿಗೆ ಸಂಗ್ರಹ"),
    ("app_description", "ಹೊಸ ದೇಣಿಗೆಯನ್ನು ದಾಖಲಿಸಿ ಮತ್ತು ತಕ್ಷಣ ರಸೀದಿಯನ್ನು ರಚಿಸಿ."),
    ("donor_name", "ದಾನಿಗಳ ಹೆಸರು"),
    ("mobile_number", "ಮೊಬೈಲ್ ಸಂಖ್ಯೆ"),
    ("amount", "ಮೊತ್ತ / ಮೌಲ್ಯ (₹)"),
    ("donation_type", "ದೇಣಿಗೆ ಪ್ರಕಾರ"),
    ("mode_upi", "ಯುಪಿಐ (UPI) / ಕ್ಯೂಆರ್ ಕೋಡ್"),
    ("mode_cash", "ನಗದು"),
    ("mode_groceries", "ದವಸ ಧಾನ್ಯಗಳು / ವಸ್ತುಗಳು"),
    ("notes", "ಟಿಪ್ಪಣಿಗಳು (ಐಚ್ಛಿಕ)"),
    ("receipt_no", "ರಸೀದಿ ಸಂಖ್ಯೆ"),
    ("date", "ದಿನಾಂಕ"),
    ("thank_you", "ನಿಮ್ಮ ಉದಾರ ದೇಣಿಗೆಗೆ ಧನ್ಯವಾದಗಳು!"),
    ("trust_name", "ಪರಮಶಕ್ತಿ ಶ್ರೀ ಗುರು ಕೊಟ್ಟೂರೇಶ್ವರ ಟ್ರಸ್ಟ್ (ರಿ)"),
    ("trust_address", "ಶ್ರೀ ಕ್ಷೇತ್ರ ಕೊಟ್ಟೂರು, ವಿಜಯನಗರ ಜಿಲ್ಲೆ"),
    ("trust_state", "ಕರ್ನಾಟಕ - 583 134"),
    ("receipt_generated_title", "ರಸೀದಿ ರಚಿಸಲಾಗಿದೆ"),
    ("receipt_generated_desc", "ದೇಣಿಗೆ ರಸೀದಿಯನ್ನು ಡೌನ್‌ಲೋಡ್ ಮಾಡಲಾಗಿದೆ."),
    ("missing_info_title", "ಮಾಹಿತಿ ಕಾಣೆಯಾಗಿದೆ"),
    ("missing_info_desc", "ದಯವಿಟ್ಟು ಎಲ್ಲಾ ಕಡ್ಡಾಯ ಕ್ಷೇತ್ರಗಳನ್ನು ಭರ್ತಿ ಮಾಡಿ (ಹೆಸರು, ಮೊತ್ತ, ಮೊಬೈಲ್)."),
    ("error_title", "ದೋಷ"),
    ("error_desc", "ರಸೀದಿಯನ್ನು ರಚಿಸಲು ವಿಫಲವಾಗಿದೆ. ದಯವಿಟ್ಟು ಮತ್ತೆ ಪ್ರಯತ್ನಿಸಿ."),
];

/// Translation tables keyed by locale
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    tables: HashMap<Locale, HashMap<String, String>>,
}

impl Catalog {
    /// An empty catalog; every lookup misses
    pub fn new() -> Self {
        Self::default()
    }

    /// The trust's English and Kannada tables
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        for (locale, table) in [(Locale::En, EN), (Locale::Kn, KN)] {
            let entries = catalog.tables.entry(locale).or_default();
            for (k, v) in table {
                entries.insert((*k).to_string(), (*v).to_string());
            }
        }
        catalog
    }

    /// Overlay entries from JSON shaped as `{ "en": { "key": "text" }, "kn": { ... } }`.
    pub fn merge_json(&mut self, json: &str) -> Result<()> {
        let parsed: HashMap<String, HashMap<String, String>> = serde_json::from_str(json)
            .map_err(|e| Error::ConfigError(format!("invalid catalog JSON: {}", e)))?;
        for (code, entries) in parsed {
            let locale: Locale = code.parse()?;
            let table = self.tables.entry(locale).or_default();
            let count = entries.len();
            table.extend(entries);
            log::debug!("merged {} catalog entries for locale {}", count, locale);
        }
        Ok(())
    }

    /// Look up `key` in one locale's table only
    pub fn get(&self, locale: Locale, key: &str) -> Option<&str> {
        self.tables.get(&locale).and_then(|t| t.get(key)).map(String::as_str)
    }

    /// A lookup bound to `locale`, falling back to English
    pub fn translator(&self, locale: Locale) -> LocaleText<'_> {
        LocaleText { catalog: self, locale }
    }
}

/// [`Catalog`] view bound to one locale
#[derive(Debug, Clone, Copy)]
pub struct LocaleText<'a> {
    catalog: &'a Catalog,
    locale: Locale,
}

impl Translate for LocaleText<'_> {
    fn lookup(&self, key: &str) -> Option<String> {
        self.catalog
            .get(self.locale, key)
            .or_else(|| self.catalog.get(Locale::En, key))
            .map(str::to_string)
    }
}
