//! The locale context handed to rendering code.
//!
//! [`LocaleContext`] is the single writer of the active locale. It pairs the
//! pure [`Resolver`] with the [`ActiveLocale`] holder and the persistence
//! collaborator, replacing a process-wide "current language" global with an
//! explicit object the host owns and passes around.
//!
//! Execution is single-threaded. Locale changes requested while the context
//! is busy (subscribers running, or a missing-key hook running) are deferred
//! to the next turn; the host calls [`LocaleContext::run_deferred`] once per
//! event-loop turn.

use std::rc::Rc;

use tracing::{debug, info, warn};

use crate::catalog::interpolate;
use crate::detect::{LocaleDetector, StoredPreference, detect_with_source};
use crate::error::I18nError;
use crate::locale::LocaleTag;
use crate::resolver::Resolver;
use crate::state::{ActiveLocale, LocaleChange, LocaleSubscription};
use crate::storage::LocaleStorage;

/// Callback invoked with `(key, locale)` when a key cannot be resolved.
pub type MissingKeyHook = Rc<dyn Fn(&str, &str)>;

/// Resolver + active locale + persistence.
pub struct LocaleContext<S> {
    resolver: Resolver,
    state: ActiveLocale,
    storage: S,
    storage_key: String,
    on_missing: Option<MissingKeyHook>,
}

impl<S: LocaleStorage> std::fmt::Debug for LocaleContext<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocaleContext")
            .field("state", &self.state)
            .field("storage_key", &self.storage_key)
            .finish_non_exhaustive()
    }
}

impl<S: LocaleStorage> LocaleContext<S> {
    /// Create a context with an already-chosen initial locale.
    ///
    /// An unsupported `initial` is replaced by the resolver's fallback.
    pub fn new(resolver: Resolver, storage: S, storage_key: impl Into<String>, initial: LocaleTag) -> Self {
        let initial = if resolver.supported().contains(initial.as_str()) {
            initial
        } else {
            warn!(locale = %initial, "initial locale unsupported, using fallback");
            resolver.fallback().clone()
        };
        Self {
            state: ActiveLocale::new(initial),
            resolver,
            storage,
            storage_key: storage_key.into(),
            on_missing: None,
        }
    }

    /// Create a context by running detection.
    ///
    /// The persisted preference is consulted first, then `ambient` detectors
    /// in the given order, then `default`.
    pub fn detect(
        resolver: Resolver,
        storage: S,
        storage_key: impl Into<String>,
        ambient: &[&dyn LocaleDetector],
        default: &LocaleTag,
    ) -> Self {
        let storage_key = storage_key.into();
        let detection = {
            let stored = StoredPreference::new(&storage, storage_key.as_str());
            let mut detectors: Vec<&dyn LocaleDetector> = Vec::with_capacity(ambient.len() + 1);
            detectors.push(&stored);
            detectors.extend_from_slice(ambient);
            detect_with_source(&detectors, resolver.supported(), default)
        };
        info!(
            locale = %detection.locale,
            source = detection.source.unwrap_or("default"),
            "active locale initialized"
        );
        Self::new(resolver, storage, storage_key, detection.locale)
    }

    /// Install a hook called on every unresolved key.
    ///
    /// The hook runs with the context marked busy: a `set_locale` issued from
    /// inside it is deferred to the next turn.
    #[must_use]
    pub fn with_missing_key_hook(mut self, hook: impl Fn(&str, &str) + 'static) -> Self {
        self.on_missing = Some(Rc::new(hook));
        self
    }

    /// Resolve `key` for `locale`, or for the active locale when `None`.
    ///
    /// Never fails: a key absent from both the locale and the fallback is
    /// logged and returned verbatim.
    pub fn resolve<'a>(&'a self, key: &'a str, locale: Option<&str>) -> &'a str {
        let outcome = self.state.with(|current| {
            let locale = locale.unwrap_or(current.as_str());
            self.resolver
                .try_resolve(key, locale)
                .map_err(|_| locale.to_string())
        });

        match outcome {
            Ok(text) => text,
            Err(locale) => {
                warn!(key, locale = %locale, "missing translation key");
                if let Some(hook) = &self.on_missing {
                    let _busy = self.state.busy_guard();
                    hook(key, &locale);
                }
                key
            }
        }
    }

    /// Shorthand for [`resolve`](Self::resolve) with the active locale.
    pub fn t<'a>(&'a self, key: &'a str) -> &'a str {
        self.resolve(key, None)
    }

    /// Resolve with the active locale and interpolate `{name}` tokens.
    pub fn format(&self, key: &str, args: &[(&str, &str)]) -> String {
        interpolate(self.resolve(key, None), args)
    }

    /// Switch the active locale.
    ///
    /// `code` is canonicalized (`EN` becomes `en`) but never negotiated: a
    /// regional variant such as `en-GB` is rejected unless it is itself a
    /// member. Fails with [`I18nError::UnsupportedLocale`] (state untouched)
    /// otherwise. On success the choice is persisted; a persistence failure
    /// is logged, not returned, since the page can keep rendering in the new
    /// locale.
    pub fn set_locale(&self, code: &str) -> Result<LocaleChange, I18nError> {
        let tag = match LocaleTag::parse(code) {
            Ok(tag) if self.resolver.supported().contains(tag.as_str()) => tag,
            _ => {
                warn!(code, "rejected unsupported locale");
                return Err(I18nError::UnsupportedLocale(code.to_string()));
            }
        };
        Ok(self.apply(tag))
    }

    /// Apply changes deferred during earlier turns. Returns how many ran.
    pub fn run_deferred(&self) -> usize {
        let mut applied = 0;
        while let Some(tag) = self.state.take_pending() {
            self.apply(tag);
            applied += 1;
        }
        applied
    }

    fn apply(&self, tag: LocaleTag) -> LocaleChange {
        let change = self.state.set(tag.clone());
        match &change {
            LocaleChange::Deferred => {
                debug!(locale = %tag, "locale change deferred to next turn");
                return change;
            }
            LocaleChange::Applied { previous } => {
                info!(from = %previous, to = %tag, "locale changed");
            }
            LocaleChange::Unchanged => {}
        }
        if let Err(err) = self.storage.set(&self.storage_key, tag.as_str()) {
            warn!(locale = %tag, error = %err, "failed to persist locale");
        }
        change
    }

    /// Active locale.
    #[must_use]
    pub fn locale(&self) -> LocaleTag {
        self.state.get()
    }

    /// Shared state handle (for version checks and subscriptions).
    #[must_use]
    pub fn state(&self) -> &ActiveLocale {
        &self.state
    }

    /// Subscribe to applied locale changes.
    pub fn subscribe(&self, callback: impl Fn(&LocaleTag) + 'static) -> LocaleSubscription {
        self.state.subscribe(callback)
    }

    /// Underlying resolver.
    #[must_use]
    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Persistence collaborator.
    #[must_use]
    pub fn storage(&self) -> &S {
        &self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{LocaleStrings, StringCatalog};
    use crate::detect::{DocumentLanguage, EnvironmentLocale};
    use crate::error::StorageError;
    use crate::locale::SupportedLocales;
    use crate::storage::{LOCALE_STORAGE_KEY, MemoryStorage};
    use std::cell::{Cell, RefCell};

    fn resolver() -> Resolver {
        let mut catalog = StringCatalog::new();
        let mut fr = LocaleStrings::new();
        fr.insert("nav.services", "Nos services");
        fr.insert("nav.contact", "Contact");
        fr.insert("hero.badge", "Agréé assurances");
        catalog.add_locale("fr", fr);
        let mut en = LocaleStrings::new();
        en.insert("nav.services", "Our services");
        en.insert("nav.contact", "Contact");
        catalog.add_locale("en", en);
        Resolver::new(
            catalog,
            SupportedLocales::new(["fr", "en"]).unwrap(),
            tag("fr"),
        )
        .unwrap()
    }

    fn tag(s: &str) -> LocaleTag {
        LocaleTag::parse(s).unwrap()
    }

    fn context() -> LocaleContext<Rc<MemoryStorage>> {
        LocaleContext::new(
            resolver(),
            Rc::new(MemoryStorage::new()),
            LOCALE_STORAGE_KEY,
            tag("fr"),
        )
    }

    #[test]
    fn resolve_uses_active_or_explicit_locale() {
        let ctx = context();
        assert_eq!(ctx.t("nav.services"), "Nos services");
        assert_eq!(ctx.resolve("nav.services", Some("en")), "Our services");
        assert_eq!(ctx.resolve("hero.badge", Some("en")), "Agréé assurances");
    }

    #[test]
    fn missing_key_degrades_and_calls_hook() {
        let hits = Rc::new(RefCell::new(Vec::new()));
        let hits_clone = Rc::clone(&hits);
        let ctx = context().with_missing_key_hook(move |key, locale| {
            hits_clone.borrow_mut().push(format!("{locale}:{key}"));
        });
        assert_eq!(ctx.resolve("nav.blog", Some("en")), "nav.blog");
        assert_eq!(ctx.t("nav.blog"), "nav.blog");
        assert_eq!(*hits.borrow(), vec!["en:nav.blog", "fr:nav.blog"]);
    }

    #[test]
    fn set_locale_persists() {
        let ctx = context();
        let change = ctx.set_locale("en").unwrap();
        assert_eq!(change, LocaleChange::Applied { previous: tag("fr") });
        assert_eq!(ctx.locale(), tag("en"));
        assert_eq!(ctx.t("nav.services"), "Our services");
        assert_eq!(ctx.storage().get(LOCALE_STORAGE_KEY), Some("en".into()));
    }

    #[test]
    fn set_same_locale_still_records_choice() {
        let ctx = context();
        assert_eq!(ctx.set_locale("fr").unwrap(), LocaleChange::Unchanged);
        assert_eq!(ctx.storage().get(LOCALE_STORAGE_KEY), Some("fr".into()));
        assert_eq!(ctx.state().version(), 0);
    }

    #[test]
    fn unsupported_locale_is_rejected_without_side_effects() {
        let ctx = context();
        let err = ctx.set_locale("xx").unwrap_err();
        assert_eq!(err, I18nError::UnsupportedLocale("xx".into()));
        assert_eq!(ctx.locale(), tag("fr"));
        assert_eq!(ctx.state().version(), 0);
        assert!(ctx.storage().is_empty());
    }

    #[test]
    fn set_locale_canonicalizes_case() {
        let ctx = context();
        ctx.set_locale("EN").unwrap();
        assert_eq!(ctx.locale(), tag("en"));
        assert_eq!(ctx.storage().get(LOCALE_STORAGE_KEY), Some("en".into()));
    }

    #[test]
    fn regional_variant_is_not_negotiated() {
        let ctx = context();
        for code in ["en-GB", "en_US.UTF-8@euro", "en-Latn-ZZ", "fr-CA"] {
            let err = ctx.set_locale(code).unwrap_err();
            assert_eq!(err, I18nError::UnsupportedLocale(code.into()));
        }
        assert_eq!(ctx.locale(), tag("fr"));
        assert_eq!(ctx.state().version(), 0);
        assert!(ctx.storage().is_empty());
    }

    #[test]
    fn set_from_missing_key_hook_is_deferred() {
        let ctx = Rc::new_cyclic(|weak: &std::rc::Weak<LocaleContext<Rc<MemoryStorage>>>| {
            let weak = weak.clone();
            context().with_missing_key_hook(move |_, _| {
                if let Some(ctx) = weak.upgrade() {
                    assert_eq!(ctx.set_locale("en").unwrap(), LocaleChange::Deferred);
                }
            })
        });

        let text = ctx.t("nope");
        assert_eq!(text, "nope");
        assert_eq!(ctx.locale(), tag("fr"), "no change mid-resolution");
        assert_eq!(ctx.storage().get(LOCALE_STORAGE_KEY), None);

        assert_eq!(ctx.run_deferred(), 1);
        assert_eq!(ctx.locale(), tag("en"));
        assert_eq!(ctx.storage().get(LOCALE_STORAGE_KEY), Some("en".into()));
        assert_eq!(ctx.run_deferred(), 0);
    }

    #[test]
    fn set_from_subscriber_is_deferred() {
        let ctx = Rc::new(context());
        let weak = Rc::downgrade(&ctx);
        let renders = Rc::new(Cell::new(0));
        let renders_clone = Rc::clone(&renders);
        let _sub = ctx.subscribe(move |locale| {
            renders_clone.set(renders_clone.get() + 1);
            if locale.as_str() == "en"
                && let Some(ctx) = weak.upgrade()
            {
                assert_eq!(ctx.set_locale("fr").unwrap(), LocaleChange::Deferred);
            }
        });

        ctx.set_locale("en").unwrap();
        assert_eq!(ctx.locale(), tag("en"));
        assert_eq!(renders.get(), 1);

        ctx.run_deferred();
        assert_eq!(ctx.locale(), tag("fr"));
        assert_eq!(renders.get(), 2);
    }

    #[test]
    fn restart_restores_persisted_choice_over_ambient_signals() {
        let storage = Rc::new(MemoryStorage::new());
        {
            let ctx = LocaleContext::detect(
                resolver(),
                Rc::clone(&storage),
                LOCALE_STORAGE_KEY,
                &[&EnvironmentLocale::from_languages(["fr-FR"])],
                &tag("fr"),
            );
            assert_eq!(ctx.locale(), tag("fr"));
            ctx.set_locale("en").unwrap();
        }

        let env = EnvironmentLocale::from_languages(["fr-FR"]);
        let doc = DocumentLanguage::new(Some("fr"));
        let reloaded = LocaleContext::detect(
            resolver(),
            Rc::clone(&storage),
            LOCALE_STORAGE_KEY,
            &[&env, &doc],
            &tag("fr"),
        );
        assert_eq!(reloaded.locale(), tag("en"));
    }

    #[test]
    fn unsupported_initial_uses_fallback() {
        let ctx = LocaleContext::new(resolver(), MemoryStorage::new(), LOCALE_STORAGE_KEY, tag("de"));
        assert_eq!(ctx.locale(), tag("fr"));
    }

    struct BrokenStorage;

    impl LocaleStorage for BrokenStorage {
        fn get(&self, _key: &str) -> Option<String> {
            None
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Io("read-only".into()))
        }
    }

    #[test]
    fn persistence_failure_keeps_new_locale() {
        let ctx = LocaleContext::new(resolver(), BrokenStorage, LOCALE_STORAGE_KEY, tag("fr"));
        assert!(ctx.set_locale("en").is_ok());
        assert_eq!(ctx.locale(), tag("en"));
    }
}
