//! Bundled page content.
//!
//! Catalogs are compiled into the binary from `locales/*.json` and flattened
//! into dotted keys (`services.emergency.title`).

use serrure_i18n::{I18nError, LocaleStrings, StringCatalog};
use tracing::warn;

use crate::config::CompletenessPolicy;

const FR_JSON: &str = include_str!("../locales/fr.json");
const EN_JSON: &str = include_str!("../locales/en.json");

/// Locales shipped with the site, in switcher order.
pub const BUNDLED_LOCALES: [(&str, &str); 2] = [("fr", FR_JSON), ("en", EN_JSON)];

/// Keys rendered on the single page, in document order.
pub const PAGE_KEYS: &[&str] = &[
    "meta.title",
    "meta.description",
    "nav.home",
    "nav.services",
    "nav.gallery",
    "nav.testimonials",
    "nav.contact",
    "nav.call_now",
    "hero.badge",
    "hero.title",
    "hero.subtitle",
    "hero.cta_primary",
    "hero.cta_secondary",
    "services.title",
    "services.subtitle",
    "services.emergency.title",
    "services.emergency.description",
    "services.lock_change.title",
    "services.lock_change.description",
    "services.security.title",
    "services.security.description",
    "services.safes.title",
    "services.safes.description",
    "gallery.title",
    "gallery.subtitle",
    "gallery.before",
    "gallery.after",
    "testimonials.title",
    "testimonials.quote_1",
    "testimonials.quote_2",
    "testimonials.quote_3",
    "contact.title",
    "contact.subtitle",
    "contact.name",
    "contact.email",
    "contact.phone",
    "contact.message",
    "contact.submit",
    "footer.hours",
    "footer.legal",
    "footer.privacy",
    "footer.rights",
    "language.label",
];

/// Keys shown only while the logo intro plays.
pub const INTRO_KEYS: &[&str] = &["intro.tagline", "intro.skip"];

/// Parse every bundled locale into a catalog.
pub fn bundled_catalog() -> Result<StringCatalog, I18nError> {
    let mut catalog = StringCatalog::new();
    for (locale, source) in BUNDLED_LOCALES {
        catalog.add_locale(locale, LocaleStrings::from_json_str(locale, source)?);
    }
    Ok(catalog)
}

/// Check every locale against `reference` under `policy`.
pub fn check_completeness(
    catalog: &StringCatalog,
    reference: &str,
    policy: CompletenessPolicy,
) -> Result<(), I18nError> {
    match (catalog.verify_complete(reference), policy) {
        (Ok(()), _) => Ok(()),
        (Err(I18nError::IncompleteCatalog { locale, missing }), CompletenessPolicy::WarnOnly) => {
            warn!(
                locale = %locale,
                missing = missing.len(),
                first = missing.first().map(String::as_str).unwrap_or(""),
                "catalog incomplete, falling back for missing keys"
            );
            Ok(())
        }
        (Err(err), _) => Err(err),
    }
}
