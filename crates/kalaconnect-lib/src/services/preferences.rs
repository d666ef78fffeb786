// Preferences and session state
//
// Small key-value port for the language preference and the sign-in flag.
// Values are plain strings under fixed keys.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::models::content::Language;

pub const KEY_SELECTED_LANGUAGE: &str = "selectedLanguage";
pub const KEY_IS_AUTHENTICATED: &str = "isAuthenticated";
pub const KEY_USER_EMAIL: &str = "userEmail";
pub const KEY_LOGIN_TIME: &str = "loginTime";

/// String key-value storage
pub trait PreferenceStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, String>;
    fn set(&self, key: &str, value: &str) -> Result<(), String>;
    /// Returns true if the key existed
    fn remove(&self, key: &str) -> Result<bool, String>;
}

/// Process-local store
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, String> {
        let values = self
            .values
            .read()
            .map_err(|e| format!("Failed to read preferences: {}", e))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), String> {
        let mut values = self
            .values
            .write()
            .map_err(|e| format!("Failed to write preferences: {}", e))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool, String> {
        let mut values = self
            .values
            .write()
            .map_err(|e| format!("Failed to write preferences: {}", e))?;
        Ok(values.remove(key).is_some())
    }
}

/// Typed view over the preference keys
#[derive(Clone)]
pub struct SessionPreferences {
    store: Arc<dyn PreferenceStore>,
}

impl SessionPreferences {
    pub fn new(store: Arc<dyn PreferenceStore>) -> Self {
        Self { store }
    }

    /// Selected content language, English when unset or unrecognized
    pub fn language(&self) -> Result<Language, String> {
        Ok(self
            .store
            .get(KEY_SELECTED_LANGUAGE)?
            .map(|code| Language::from_code_or_default(&code))
            .unwrap_or_default())
    }

    pub fn set_language(&self, language: Language) -> Result<(), String> {
        self.store.set(KEY_SELECTED_LANGUAGE, language.code())
    }

    pub fn is_authenticated(&self) -> Result<bool, String> {
        Ok(self.store.get(KEY_IS_AUTHENTICATED)?.as_deref() == Some("true"))
    }

    pub fn user_email(&self) -> Result<Option<String>, String> {
        self.store.get(KEY_USER_EMAIL)
    }

    pub fn login_time(&self) -> Result<Option<DateTime<Utc>>, String> {
        Ok(self
            .store
            .get(KEY_LOGIN_TIME)?
            .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok())
            .map(|t| t.with_timezone(&Utc)))
    }

    /// Record a signed-in session
    pub fn sign_in(&self, email: &str) -> Result<(), String> {
        let email = email.trim();
        if email.is_empty() {
            return Err("Email is required".to_string());
        }
        self.store.set(KEY_IS_AUTHENTICATED, "true")?;
        self.store.set(KEY_USER_EMAIL, email)?;
        self.store.set(KEY_LOGIN_TIME, &Utc::now().to_rfc3339())?;
        log::info!("Signed in as {}", email);
        Ok(())
    }

    /// Clear the session keys. The language preference is kept.
    pub fn sign_out(&self) -> Result<(), String> {
        self.store.remove(KEY_IS_AUTHENTICATED)?;
        self.store.remove(KEY_USER_EMAIL)?;
        self.store.remove(KEY_LOGIN_TIME)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> (Arc<MemoryPreferenceStore>, SessionPreferences) {
        let store = Arc::new(MemoryPreferenceStore::new());
        let prefs = SessionPreferences::new(store.clone());
        (store, prefs)
    }

    #[test]
    fn test_language_defaults_to_english() {
        let (store, prefs) = session();
        assert_eq!(prefs.language().unwrap(), Language::En);

        store.set(KEY_SELECTED_LANGUAGE, "xx").unwrap();
        assert_eq!(prefs.language().unwrap(), Language::En);
    }

    #[test]
    fn test_language_round_trip_uses_code() {
        let (store, prefs) = session();
        prefs.set_language(Language::Ta).unwrap();
        assert_eq!(store.get(KEY_SELECTED_LANGUAGE).unwrap().as_deref(), Some("ta"));
        assert_eq!(prefs.language().unwrap(), Language::Ta);
    }

    #[test]
    fn test_sign_in_and_out() {
        let (store, prefs) = session();
        assert!(!prefs.is_authenticated().unwrap());

        prefs.set_language(Language::Hi).unwrap();
        prefs.sign_in(" artisan@example.com ").unwrap();
        assert!(prefs.is_authenticated().unwrap());
        assert_eq!(prefs.user_email().unwrap().as_deref(), Some("artisan@example.com"));
        assert!(prefs.login_time().unwrap().is_some());

        prefs.sign_out().unwrap();
        assert!(!prefs.is_authenticated().unwrap());
        assert_eq!(store.get(KEY_USER_EMAIL).unwrap(), None);
        assert_eq!(prefs.language().unwrap(), Language::Hi);
    }

    #[test]
    fn test_sign_in_requires_email() {
        let (_, prefs) = session();
        assert!(prefs.sign_in("  ").is_err());
        assert!(!prefs.is_authenticated().unwrap());
    }

    #[test]
    fn test_memory_store_remove() {
        let store = MemoryPreferenceStore::new();
        store.set("k", "v").unwrap();
        assert!(store.remove("k").unwrap());
        assert!(!store.remove("k").unwrap());
    }
}
