//! Property-based invariant tests for locale resolution and detection.
//!
//! 1. Every key of the fallback table resolves to non-empty text in every
//!    supported locale.
//! 2. A locale's own translation always wins over the fallback.
//! 3. Unknown keys degrade to the key itself.
//! 4. Detection returns the first supported detector result, independent of
//!    what later detectors would say.
//! 5. Rejected `set_locale` calls never change state.
//! 6. Tag canonicalization is idempotent.

use proptest::prelude::*;
use serrure_i18n::{
    EnvironmentLocale, LocaleContext, LocaleDetector, LocaleStrings, LocaleTag, MemoryStorage,
    Resolver, StringCatalog, SupportedLocales, detect_initial_locale, LOCALE_STORAGE_KEY,
};

// ── Helpers ─────────────────────────────────────────────────────────────

fn key_strategy() -> impl Strategy<Value = String> {
    proptest::collection::vec("[a-z]{1,8}", 1..=3).prop_map(|parts| parts.join("."))
}

fn text_strategy() -> impl Strategy<Value = String> {
    "[A-Za-zÀ-ÿ0-9 ]{1,24}"
}

/// Fallback table plus a partial translation (a subset of keys).
fn tables_strategy() -> impl Strategy<Value = (Vec<(String, String)>, Vec<(String, String)>)> {
    proptest::collection::btree_map(key_strategy(), text_strategy(), 1..30).prop_flat_map(|fr| {
        let fr: Vec<(String, String)> = fr.into_iter().collect();
        let len = fr.len();
        (
            Just(fr.clone()),
            proptest::sample::subsequence(fr, 0..=len).prop_flat_map(|subset| {
                let n = subset.len();
                (
                    Just(subset),
                    proptest::collection::vec(text_strategy(), n..=n),
                )
                    .prop_map(|(subset, texts)| {
                        subset
                            .into_iter()
                            .zip(texts)
                            .map(|((k, _), t)| (k, t))
                            .collect::<Vec<_>>()
                    })
            }),
        )
    })
}

fn build(fr: &[(String, String)], en: &[(String, String)]) -> Resolver {
    let mut catalog = StringCatalog::new();
    let mut fr_strings = LocaleStrings::new();
    for (k, v) in fr {
        fr_strings.insert(k.as_str(), v.as_str());
    }
    let mut en_strings = LocaleStrings::new();
    for (k, v) in en {
        en_strings.insert(k.as_str(), v.as_str());
    }
    catalog.add_locale("fr", fr_strings);
    catalog.add_locale("en", en_strings);
    Resolver::new(
        catalog,
        SupportedLocales::new(["fr", "en"]).unwrap(),
        LocaleTag::parse("fr").unwrap(),
    )
    .unwrap()
}

fn candidate_strategy() -> impl Strategy<Value = Option<&'static str>> {
    prop_oneof![
        Just(None),
        Just(Some("fr")),
        Just(Some("en")),
        Just(Some("en-US")),
        Just(Some("de")),
        Just(Some("C")),
    ]
}

struct Candidate(Option<&'static str>);

impl LocaleDetector for Candidate {
    fn name(&self) -> &'static str {
        "candidate"
    }

    fn detect(&self, supported: &SupportedLocales) -> Option<LocaleTag> {
        self.0.and_then(|raw| supported.negotiate(raw))
    }
}

// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn fallback_keys_resolve_everywhere((fr, en) in tables_strategy()) {
        let resolver = build(&fr, &en);
        for (key, _) in &fr {
            for locale in ["fr", "en"] {
                let text = resolver.try_resolve(key, locale);
                prop_assert!(text.is_ok(), "{key} missing in {locale}");
                prop_assert!(!text.unwrap().is_empty());
            }
        }
    }

    #[test]
    fn own_translation_wins((fr, en) in tables_strategy()) {
        let resolver = build(&fr, &en);
        for (key, text) in &en {
            prop_assert_eq!(resolver.resolve(key, "en"), text.as_str());
        }
        for (key, text) in &fr {
            if !en.iter().any(|(k, _)| k == key) {
                prop_assert_eq!(resolver.resolve(key, "en"), text.as_str());
            }
        }
    }

    #[test]
    fn unknown_keys_degrade_to_key((fr, en) in tables_strategy(), suffix in "[0-9]{1,4}") {
        let resolver = build(&fr, &en);
        let key = format!("missing_{suffix}");
        prop_assert_eq!(resolver.resolve(&key, "en"), key.as_str());
    }

    #[test]
    fn detection_takes_first_supported(
        candidates in proptest::collection::vec(candidate_strategy(), 0..6),
    ) {
        let supported = SupportedLocales::new(["fr", "en"]).unwrap();
        let default = LocaleTag::parse("fr").unwrap();
        let detectors: Vec<Candidate> = candidates.iter().copied().map(Candidate).collect();
        let refs: Vec<&dyn LocaleDetector> =
            detectors.iter().map(|d| d as &dyn LocaleDetector).collect();

        let expected = candidates
            .iter()
            .flatten()
            .find_map(|raw| supported.negotiate(raw))
            .unwrap_or_else(|| default.clone());
        prop_assert_eq!(detect_initial_locale(&refs, &supported, &default), expected);
    }

    #[test]
    fn rejected_set_locale_leaves_state((fr, en) in tables_strategy(), code in "[a-z]{2}(-[A-Z]{2})?") {
        prop_assume!(code != "fr" && code != "en");
        let ctx = LocaleContext::new(
            build(&fr, &en),
            MemoryStorage::new(),
            LOCALE_STORAGE_KEY,
            LocaleTag::parse("en").unwrap(),
        );
        prop_assert!(ctx.set_locale(&code).is_err());
        let current = ctx.locale();
        prop_assert_eq!(current.as_str(), "en");
        prop_assert_eq!(ctx.state().version(), 0);
        prop_assert!(ctx.storage().is_empty());
    }

    #[test]
    fn canonicalization_idempotent(
        lang in "[a-zA-Z]{2,3}",
        region in proptest::option::of("[a-zA-Z]{2}"),
        sep in prop_oneof![Just('-'), Just('_')],
    ) {
        let raw = match &region {
            Some(r) => format!("{lang}{sep}{r}"),
            None => lang.clone(),
        };
        let once = LocaleTag::parse(&raw).unwrap();
        let twice = LocaleTag::parse(once.as_str()).unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn environment_detector_matches_first_supported(
        langs in proptest::collection::vec(prop_oneof![
            Just("de-DE"), Just("en-GB"), Just("fr-CA"), Just("it")
        ], 0..5),
    ) {
        let supported = SupportedLocales::new(["fr", "en"]).unwrap();
        let env = EnvironmentLocale::from_languages(langs.iter().copied());
        let expected = langs.iter().find_map(|l| supported.negotiate(l));
        prop_assert_eq!(env.detect(&supported), expected);
    }
}
