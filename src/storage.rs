use crate::config::default_dir;
use crate::constants::SESSION_FILE;
use crate::models::{AuthTokens, LoginResponse, Role, User};
use anyhow::Result;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Keys persisted between runs
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub display_name: Option<String>,
    pub user_id: Option<String>,
    pub role: Option<Role>,
    /// Payment created but not yet confirmed, so the poll can resume after a restart
    pub pending_payment_id: Option<String>,
}

impl Session {
    pub fn is_signed_in(&self) -> bool {
        self.access_token.is_some()
    }

    pub fn is_merchant(&self) -> bool {
        self.role == Some(Role::Merchant)
    }
}

/// Key-value session store backed by a YAML file
pub struct Storage {
    session: Session,
    /// `None` keeps everything in memory
    config_dir: Option<PathBuf>,
}

impl Storage {
    pub fn new() -> Self {
        let config_dir = default_dir().unwrap_or_else(|| PathBuf::from(".snackhub"));
        Self::at(config_dir)
    }

    pub fn at(config_dir: impl Into<PathBuf>) -> Self {
        let mut storage = Storage {
            session: Session::default(),
            config_dir: Some(config_dir.into()),
        };

        if let Err(e) = storage.load() {
            tracing::warn!(error = %e, "Ignoring unreadable session file");
        }
        storage
    }

    pub fn in_memory() -> Self {
        Storage {
            session: Session::default(),
            config_dir: None,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn session_path(&self) -> Option<PathBuf> {
        self.config_dir.as_ref().map(|dir| dir.join(SESSION_FILE))
    }

    fn ensure_dir(&self) -> Result<()> {
        if let Some(dir) = &self.config_dir {
            if !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }
        Ok(())
    }

    pub fn load(&mut self) -> Result<()> {
        let Some(path) = self.session_path() else {
            return Ok(());
        };
        if !path.exists() {
            return Ok(());
        }
        let content = fs::read_to_string(&path)?;
        self.session = serde_yaml::from_str(&content)?;
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        let Some(path) = self.session_path() else {
            return Ok(());
        };
        self.ensure_dir()?;
        let content = serde_yaml::to_string(&self.session)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Persist everything a successful login returns
    pub fn save_login(&mut self, login: &LoginResponse) -> Result<()> {
        self.session.access_token = Some(login.tokens.access_token.clone());
        self.session.refresh_token = Some(login.tokens.refresh_token.clone());
        self.session.user_id = Some(login.user.id.clone());
        self.session.role = Some(login.user.role);
        self.session.display_name = Some(login.user.display_name().to_string());
        self.save()
    }

    pub fn save_tokens(&mut self, tokens: &AuthTokens) -> Result<()> {
        self.session.access_token = Some(tokens.access_token.clone());
        self.session.refresh_token = Some(tokens.refresh_token.clone());
        self.save()
    }

    pub fn save_user(&mut self, user: &User) -> Result<()> {
        self.session.user_id = Some(user.id.clone());
        self.session.role = Some(user.role);
        self.session.display_name = Some(user.display_name().to_string());
        self.save()
    }

    pub fn set_pending_payment(&mut self, payment_id: Option<String>) -> Result<()> {
        if self.session.pending_payment_id == payment_id {
            return Ok(());
        }
        self.session.pending_payment_id = payment_id;
        self.save()
    }

    /// Clears every session key and removes the file
    pub fn logout(&mut self) -> Result<()> {
        self.session = Session::default();
        if let Some(path) = self.session_path() {
            if path.exists() {
                fs::remove_file(path)?;
            }
        }
        Ok(())
    }

    /// Whether the stored access token is missing or past its `exp` claim
    pub fn access_token_expired(&self, now: DateTime<Utc>) -> bool {
        match self.session.access_token.as_deref().and_then(token_expiry) {
            Some(exp) => exp <= now,
            // Opaque tokens carry no expiry; let the server decide.
            None => self.session.access_token.is_none(),
        }
    }
}

impl Default for Storage {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads the `exp` claim out of a JWT without verifying it
pub fn token_expiry(token: &str) -> Option<DateTime<Utc>> {
    let payload = token.split('.').nth(1)?;
    let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    let exp = claims.get("exp")?.as_i64()?;
    Utc.timestamp_opt(exp, 0).single()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn jwt_with_exp(exp: i64) -> String {
        let engine = base64::engine::general_purpose::URL_SAFE_NO_PAD;
        let header = engine.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = engine.encode(format!(r#"{{"sub":"u1","exp":{}}}"#, exp));
        format!("{}.{}.signature", header, payload)
    }

    fn login(token: &str) -> LoginResponse {
        serde_json::from_value(serde_json::json!({
            "user": {"id": "u1", "username": "linh", "email": "linh@example.com",
                     "fullName": "Linh Tran", "role": "merchant"},
            "accessToken": token,
            "refreshToken": "refresh-1"
        }))
        .unwrap()
    }

    #[test]
    fn test_login_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = Storage::at(dir.path());
        storage.save_login(&login("tok")).unwrap();

        let reloaded = Storage::at(dir.path());
        assert_eq!(reloaded.session().access_token.as_deref(), Some("tok"));
        assert_eq!(reloaded.session().display_name.as_deref(), Some("Linh Tran"));
        assert!(reloaded.session().is_merchant());
    }

    #[test]
    fn test_logout_clears_all_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = Storage::at(dir.path());
        storage.save_login(&login("tok")).unwrap();
        storage.set_pending_payment(Some("pay-1".into())).unwrap();

        storage.logout().unwrap();
        assert_eq!(storage.session(), &Session::default());
        assert!(!dir.path().join(SESSION_FILE).exists());
        assert_eq!(Storage::at(dir.path()).session(), &Session::default());
    }

    #[test]
    fn test_pending_payment_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = Storage::at(dir.path());
        storage.set_pending_payment(Some("pay-9".into())).unwrap();
        assert_eq!(
            Storage::at(dir.path()).session().pending_payment_id.as_deref(),
            Some("pay-9")
        );
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SESSION_FILE), "access_token: [").unwrap();
        assert!(!Storage::at(dir.path()).session().is_signed_in());
    }

    #[test]
    fn test_token_expiry() {
        let now = Utc::now();
        let mut storage = Storage::in_memory();
        assert!(storage.access_token_expired(now));

        let future = (now + Duration::hours(1)).timestamp();
        storage.save_login(&login(&jwt_with_exp(future))).unwrap();
        assert!(!storage.access_token_expired(now));
        assert_eq!(
            token_expiry(storage.session().access_token.as_deref().unwrap())
                .map(|t| t.timestamp()),
            Some(future)
        );

        let past = (now - Duration::minutes(5)).timestamp();
        storage.save_login(&login(&jwt_with_exp(past))).unwrap();
        assert!(storage.access_token_expired(now));
    }

    #[test]
    fn test_opaque_token_never_expires_locally() {
        let mut storage = Storage::in_memory();
        storage.save_login(&login("opaque-token")).unwrap();
        assert!(!storage.access_token_expired(Utc::now()));
        assert_eq!(token_expiry("opaque-token"), None);
    }
}
