use anyhow::{anyhow, Result};
use fluent_bundle::{FluentArgs, FluentBundle, FluentResource, FluentValue};
use log::warn;
use std::collections::HashMap;
use unic_langid::LanguageIdentifier;

/// Language used when a requested language has no catalog
pub const FALLBACK_LANGUAGE: &str = "en";

const EN_MESSAGES: &str = include_str!("../locales/en/main.ftl");

/// Localization manager for status messages
pub struct LocalizationManager {
    bundles: HashMap<String, FluentBundle<FluentResource>>,
}

impl LocalizationManager {
    /// Create a new localization manager with the bundled catalogs
    pub fn new() -> Result<Self> {
        let mut bundles = HashMap::new();

        // Load English bundle
        let en_locale: LanguageIdentifier = FALLBACK_LANGUAGE.parse()?;
        let bundle = Self::create_bundle(&en_locale, EN_MESSAGES)?;
        bundles.insert(FALLBACK_LANGUAGE.to_string(), bundle);

        Ok(Self { bundles })
    }

    /// Create a fluent bundle for a specific locale
    fn create_bundle(locale: &LanguageIdentifier, source: &str) -> Result<FluentBundle<FluentResource>> {
        let mut bundle = FluentBundle::new(vec![locale.clone()]);
        // Plain terminal output; no bidi isolation marks around arguments
        bundle.set_use_isolating(false);

        let resource = FluentResource::try_new(source.to_string())
            .map_err(|(_, errors)| anyhow!("Invalid catalog for {}: {:?}", locale, errors))?;
        bundle
            .add_resource(resource)
            .map_err(|errors| anyhow!("Duplicate messages in catalog for {}: {:?}", locale, errors))?;

        Ok(bundle)
    }

    /// Check whether a language has its own catalog
    pub fn supports(&self, language: &str) -> bool {
        self.bundles.contains_key(language)
    }

    /// Get a localized message in the fallback language
    pub fn get_message(&self, key: &str, args: Option<&HashMap<&str, &str>>) -> String {
        self.get_message_in_language(key, FALLBACK_LANGUAGE, args)
    }

    /// Get a localized message, falling back to English for unknown languages
    pub fn get_message_in_language(
        &self,
        key: &str,
        language: &str,
        args: Option<&HashMap<&str, &str>>,
    ) -> String {
        let bundle = match self
            .bundles
            .get(language)
            .or_else(|| self.bundles.get(FALLBACK_LANGUAGE))
        {
            Some(bundle) => bundle,
            None => return format!("Missing translation: {}", key),
        };

        let msg = match bundle.get_message(key) {
            Some(msg) => msg,
            None => return format!("Missing translation: {}", key),
        };

        let pattern = match msg.value() {
            Some(pattern) => pattern,
            None => return format!("Missing value for key: {}", key),
        };

        let fluent_args = args.map(|args| {
            FluentArgs::from_iter(args.iter().map(|(k, v)| (*k, FluentValue::from(*v))))
        });

        let mut value = String::new();
        let mut errors = vec![];
        if let Err(e) = bundle.write_pattern(&mut value, pattern, fluent_args.as_ref(), &mut errors) {
            warn!("Failed to format message '{}': {}", key, e);
        }
        if !errors.is_empty() {
            warn!("Formatting errors in message '{}': {:?}", key, errors);
        }

        value
    }

    /// Get a localized message with simple string arguments
    pub fn get_message_with_args(&self, key: &str, args: &[(&str, &str)]) -> String {
        let args_map: HashMap<&str, &str> = args.iter().cloned().collect();
        self.get_message(key, Some(&args_map))
    }

    /// Get a localized message in a given language with simple string arguments
    pub fn get_message_in_language_with_args(
        &self,
        key: &str,
        language: &str,
        args: &[(&str, &str)],
    ) -> String {
        let args_map: HashMap<&str, &str> = args.iter().cloned().collect();
        self.get_message_in_language(key, language, Some(&args_map))
    }
}
