//! Google OAuth credentials for the Slides API
//!
//! Credential resolution, in order:
//! 1. A cached authorized-user token that has not expired is used as-is.
//! 2. An expired token with a refresh token is refreshed at its `token_uri`.
//! 3. Otherwise the installed-app flow runs: the consent URL is opened in the
//!    browser (and printed), a loopback server waits for the redirect, and the
//!    code is exchanged with its PKCE verifier.
//!
//! Whatever token results from 2 or 3 is written back to the token file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use super::callback::CallbackServer;
use super::error::AuthError;
use super::pkce::generate_pkce;
use crate::config::SlidesConfig;

/// Scope needed to create and edit presentations
pub const SLIDES_SCOPE: &str = "https://www.googleapis.com/auth/presentations";

const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Tokens this close to expiry are treated as expired
const EXPIRY_MARGIN_SECS: i64 = 60;

/// OAuth client registration for an installed application
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

#[derive(Deserialize)]
struct ClientSecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

impl ClientSecrets {
    /// Load a client secrets file as downloaded from the Google Cloud console
    pub fn load(path: &Path) -> Result<Self, AuthError> {
        debug!(?path, "ClientSecrets::load: called");
        if !path.exists() {
            return Err(AuthError::CredentialsNotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path).map_err(|e| AuthError::InvalidCredentials {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let file: ClientSecretsFile = serde_json::from_str(&content).map_err(|e| AuthError::InvalidCredentials {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        file.installed.or(file.web).ok_or_else(|| AuthError::InvalidCredentials {
            path: path.to_path_buf(),
            reason: "expected an \"installed\" or \"web\" client".to_string(),
        })
    }
}

/// Cached user authorization, in the same JSON shape as Google's client libraries
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthorizedUser {
    pub token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for AuthorizedUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizedUser")
            .field("token", &"[REDACTED]")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("token_uri", &self.token_uri)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("scopes", &self.scopes)
            .field("expiry", &self.expiry)
            .finish()
    }
}

impl AuthorizedUser {
    /// Load a cached token; a missing file is not an error
    pub fn load(path: &Path) -> Result<Option<Self>, AuthError> {
        debug!(?path, "AuthorizedUser::load: called");
        if !path.exists() {
            debug!("AuthorizedUser::load: no token file");
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|e| AuthError::InvalidCredentials {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let user = serde_json::from_str(&content).map_err(|e| AuthError::InvalidCredentials {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(Some(user))
    }

    /// Write the token file, readable only by the owner on unix
    pub fn save(&self, path: &Path) -> Result<(), AuthError> {
        debug!(?path, "AuthorizedUser::save: called");
        let storage = |source: std::io::Error| AuthError::Storage {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(storage)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(storage)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).map_err(storage)?;
        }

        Ok(())
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expiry {
            Some(expiry) => now + chrono::Duration::seconds(EXPIRY_MARGIN_SECS) >= expiry,
            None => false,
        }
    }

    /// A token that can be sent as-is
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        !self.token.is_empty() && !self.is_expired(now)
    }

    pub fn can_refresh(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    scope: Option<String>,
}

fn expiry_from_now(expires_in: Option<i64>) -> Option<DateTime<Utc>> {
    expires_in
        .filter(|secs| *secs > 0)
        .map(|secs| Utc::now() + chrono::Duration::seconds(secs))
}


type UrlHandler = Box<dyn Fn(&Url) + Send + Sync>;

/// Show the consent URL and try to open it in the default browser
fn open_in_browser(url: &Url) {
    println!("Please visit this URL to authorize this application: {}", url);
    if let Err(e) = webbrowser::open(url.as_str()) {
        debug!(error = %e, "open_in_browser: no browser launched");
    }
}

/// Obtains an access token for the Slides API
pub struct Authenticator {
    http: Client,
    credentials_file: PathBuf,
    token_file: PathBuf,
    scopes: Vec<String>,
    consent_timeout: Duration,
    url_handler: UrlHandler,
}

impl Authenticator {
    pub fn new(config: &SlidesConfig) -> Result<Self, AuthError> {
        debug!(credentials_file = ?config.credentials_file, token_file = ?config.token_file, "Authenticator::new: called");
        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            http,
            credentials_file: config.credentials_file.clone(),
            token_file: config.token_file.clone(),
            scopes: vec![SLIDES_SCOPE.to_string()],
            consent_timeout: Duration::from_secs(config.consent_timeout_secs),
            url_handler: Box::new(open_in_browser),
        })
    }

    /// Replace how the consent URL is presented to the user
    pub fn with_url_handler(mut self, handler: impl Fn(&Url) + Send + Sync + 'static) -> Self {
        self.url_handler = Box::new(handler);
        self
    }

    /// Resolve credentials, refreshing or running the consent flow as needed
    pub async fn authorize(&self) -> Result<AuthorizedUser, AuthError> {
        debug!("Authenticator::authorize: called");
        let user = match AuthorizedUser::load(&self.token_file)? {
            Some(user) if user.is_valid(Utc::now()) => {
                info!("Using cached token from {}", self.token_file.display());
                return Ok(user);
            }
            Some(user) if user.can_refresh() => {
                info!("Cached token expired, refreshing");
                self.refresh(user).await?
            }
            _ => {
                info!("No usable cached token, starting consent flow");
                self.run_consent_flow().await?
            }
        };

        user.save(&self.token_file)?;
        info!("Saved token to {}", self.token_file.display());
        Ok(user)
    }

    async fn refresh(&self, user: AuthorizedUser) -> Result<AuthorizedUser, AuthError> {
        debug!(token_uri = %user.token_uri, "Authenticator::refresh: called");
        let refresh_token = user.refresh_token.clone().unwrap_or_default();

        let response = self
            .http
            .post(&user.token_uri)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.as_str()),
                ("client_id", user.client_id.as_str()),
                ("client_secret", user.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AuthError::RefreshFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AuthError::RefreshFailed(format!("HTTP {}: {}", status, text)));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::RefreshFailed(e.to_string()))?;

        Ok(AuthorizedUser {
            token: token.access_token,
            refresh_token: token.refresh_token.or(user.refresh_token),
            expiry: expiry_from_now(token.expires_in),
            ..user
        })
    }

    async fn run_consent_flow(&self) -> Result<AuthorizedUser, AuthError> {
        debug!("Authenticator::run_consent_flow: called");
        let secrets = ClientSecrets::load(&self.credentials_file)?;

        let server = CallbackServer::start()?;
        let redirect_uri = server.redirect_uri();
        debug!(port = server.port(), "Authenticator::run_consent_flow: callback server ready");
        let state = uuid::Uuid::new_v4().simple().to_string();
        let pkce = generate_pkce();

        let url = authorization_url(&secrets, &redirect_uri, &self.scopes, &state, &pkce.challenge)?;
        let pending = server.expect(&state);
        (self.url_handler)(&url);

        let result = pending.wait(self.consent_timeout).await;
        server.stop().await;
        let code = result?;

        info!("Authorization code received");
        self.exchange_code(&secrets, &code, &redirect_uri, &pkce.verifier).await
    }

    async fn exchange_code(
        &self,
        secrets: &ClientSecrets,
        code: &str,
        redirect_uri: &str,
        code_verifier: &str,
    ) -> Result<AuthorizedUser, AuthError> {
        debug!(token_uri = %secrets.token_uri, "Authenticator::exchange_code: called");
        let response = self
            .http
            .post(&secrets.token_uri)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("client_id", secrets.client_id.as_str()),
                ("client_secret", secrets.client_secret.as_str()),
                ("redirect_uri", redirect_uri),
                ("code_verifier", code_verifier),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AuthError::AuthorizationFailed(format!("HTTP {}: {}", status, text)));
        }

        let token: TokenResponse = response.json().await?;
        let scopes = match token.scope {
            Some(scope) => scope.split_whitespace().map(str::to_string).collect(),
            None => self.scopes.clone(),
        };

        Ok(AuthorizedUser {
            token: token.access_token,
            refresh_token: token.refresh_token,
            token_uri: secrets.token_uri.clone(),
            client_id: secrets.client_id.clone(),
            client_secret: secrets.client_secret.clone(),
            scopes,
            expiry: expiry_from_now(token.expires_in),
        })
    }
}

/// Build the consent URL for the installed-app flow
pub fn authorization_url(
    secrets: &ClientSecrets,
    redirect_uri: &str,
    scopes: &[String],
    state: &str,
    code_challenge: &str,
) -> Result<Url, AuthError> {
    let mut url = Url::parse(&secrets.auth_uri).map_err(|e| AuthError::InvalidCredentials {
        path: PathBuf::from("auth_uri"),
        reason: e.to_string(),
    })?;

    url.query_pairs_mut()
        .append_pair("response_type", "code")
        .append_pair("client_id", &secrets.client_id)
        .append_pair("redirect_uri", redirect_uri)
        .append_pair("scope", &scopes.join(" "))
        .append_pair("state", state)
        .append_pair("code_challenge", code_challenge)
        .append_pair("code_challenge_method", "S256")
        .append_pair("access_type", "offline");

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slides::pkce::challenge_for;
    use std::collections::HashMap;
    use tempfile::TempDir;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn user(token_uri: &str, expiry: Option<DateTime<Utc>>) -> AuthorizedUser {
        AuthorizedUser {
            token: "ya29.old".to_string(),
            refresh_token: Some("1//refresh".to_string()),
            token_uri: token_uri.to_string(),
            client_id: "client.apps.googleusercontent.com".to_string(),
            client_secret: "shh".to_string(),
            scopes: vec![SLIDES_SCOPE.to_string()],
            expiry,
        }
    }

    fn config(dir: &TempDir) -> SlidesConfig {
        SlidesConfig {
            credentials_file: dir.path().join("creds.json"),
            token_file: dir.path().join("token.json"),
            timeout_ms: 5_000,
            consent_timeout_secs: 5,
            ..Default::default()
        }
    }

    fn secrets(token_uri: &str) -> ClientSecrets {
        ClientSecrets {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            auth_uri: DEFAULT_AUTH_URI.to_string(),
            token_uri: token_uri.to_string(),
        }
    }

    fn query(url: &Url) -> HashMap<String, String> {
        url.query_pairs().into_owned().collect()
    }

    fn form(body: &[u8]) -> HashMap<String, String> {
        url::form_urlencoded::parse(body).into_owned().collect()
    }

    #[test]
    fn test_client_secrets_installed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("creds.json");
        std::fs::write(
            &path,
            r#"{"installed":{"client_id":"id","client_secret":"secret","redirect_uris":["http://localhost"]}}"#,
        )
        .unwrap();

        let secrets = ClientSecrets::load(&path).unwrap();
        assert_eq!(secrets.client_id, "id");
        assert_eq!(secrets.auth_uri, DEFAULT_AUTH_URI);
        assert_eq!(secrets.token_uri, DEFAULT_TOKEN_URI);
    }

    #[test]
    fn test_client_secrets_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("creds.json");
        assert!(matches!(ClientSecrets::load(&path), Err(AuthError::CredentialsNotFound(_))));

        std::fs::write(&path, r#"{"service_account": {}}"#).unwrap();
        assert!(matches!(ClientSecrets::load(&path), Err(AuthError::InvalidCredentials { .. })));
    }

    #[test]
    fn test_token_file_from_google_client_library() {
        let json = r#"{
            "token": "ya29.a0",
            "refresh_token": "1//0g",
            "token_uri": "https://oauth2.googleapis.com/token",
            "client_id": "id.apps.googleusercontent.com",
            "client_secret": "secret",
            "scopes": ["https://www.googleapis.com/auth/presentations"],
            "universe_domain": "googleapis.com",
            "account": "",
            "expiry": "2024-05-01T12:00:00.123456Z"
        }"#;

        let user: AuthorizedUser = serde_json::from_str(json).unwrap();
        assert_eq!(user.token, "ya29.a0");
        assert!(user.can_refresh());
        assert!(user.is_expired(Utc::now()));
        assert!(!user.is_valid(Utc::now()));
    }

    #[test]
    fn test_expiry_margin() {
        let now = Utc::now();
        assert!(!user("u", None).is_expired(now));
        assert!(!user("u", Some(now + chrono::Duration::minutes(10))).is_expired(now));
        assert!(user("u", Some(now + chrono::Duration::seconds(30))).is_expired(now));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let debug = format!("{:?}", user("u", None));
        assert!(!debug.contains("ya29.old"));
        assert!(!debug.contains("1//refresh"));
        assert!(!debug.contains("shh"));
        assert!(debug.contains("client.apps.googleusercontent.com"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("token.json");
        let saved = user("https://oauth2.googleapis.com/token", None);

        saved.save(&path).unwrap();
        let loaded = AuthorizedUser::load(&path).unwrap().unwrap();
        assert_eq!(loaded.token, saved.token);
        assert_eq!(loaded.refresh_token, saved.refresh_token);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn test_authorization_url() {
        let url = authorization_url(
            &secrets(DEFAULT_TOKEN_URI),
            "http://127.0.0.1:4000/",
            &[SLIDES_SCOPE.to_string()],
            "xyz",
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM",
        )
        .unwrap();
        let pairs = query(&url);

        assert!(url.as_str().starts_with(DEFAULT_AUTH_URI));
        assert_eq!(pairs["client_id"], "id");
        assert_eq!(pairs["redirect_uri"], "http://127.0.0.1:4000/");
        assert_eq!(pairs["scope"], SLIDES_SCOPE);
        assert_eq!(pairs["state"], "xyz");
        assert_eq!(pairs["response_type"], "code");
        assert_eq!(pairs["access_type"], "offline");
        assert_eq!(pairs["code_challenge"], "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM");
        assert_eq!(pairs["code_challenge_method"], "S256");
    }

    #[tokio::test]
    async fn test_authorize_uses_valid_cached_token() {
        let dir = TempDir::new().unwrap();
        let cfg = config(&dir);
        let cached = user("http://127.0.0.1:1/token", Some(Utc::now() + chrono::Duration::hours(1)));
        cached.save(&cfg.token_file).unwrap();

        let auth = Authenticator::new(&cfg).unwrap();
        let user = auth.authorize().await.unwrap();
        assert_eq!(user.token, "ya29.old");
    }

    #[tokio::test]
    async fn test_authorize_refreshes_expired_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=1%2F%2Frefresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "ya29.new",
                "expires_in": 3599,
                "token_type": "Bearer"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let cfg = config(&dir);
        user(
            &format!("{}/token", server.uri()),
            Some(Utc::now() - chrono::Duration::hours(1)),
        )
        .save(&cfg.token_file)
        .unwrap();

        let refreshed = Authenticator::new(&cfg).unwrap().authorize().await.unwrap();
        assert_eq!(refreshed.token, "ya29.new");
        assert_eq!(refreshed.refresh_token.as_deref(), Some("1//refresh"));
        assert!(refreshed.is_valid(Utc::now()));

        let saved = AuthorizedUser::load(&cfg.token_file).unwrap().unwrap();
        assert_eq!(saved.token, "ya29.new");
    }

    #[tokio::test]
    async fn test_authorize_refresh_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_string(r#"{"error":"invalid_grant"}"#))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let cfg = config(&dir);
        user(
            &format!("{}/token", server.uri()),
            Some(Utc::now() - chrono::Duration::hours(1)),
        )
        .save(&cfg.token_file)
        .unwrap();

        let err = Authenticator::new(&cfg).unwrap().authorize().await.unwrap_err();
        match err {
            AuthError::RefreshFailed(msg) => assert!(msg.contains("invalid_grant")),
            other => panic!("expected RefreshFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_authorize_without_token_or_secrets() {
        let dir = TempDir::new().unwrap();
        let err = Authenticator::new(&config(&dir)).unwrap().authorize().await.unwrap_err();
        assert!(matches!(err, AuthError::CredentialsNotFound(_)));
    }

    #[tokio::test]
    async fn test_exchange_code_form_and_scope_split() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=4%2F0Ab"))
            .and(body_string_contains("redirect_uri=http%3A%2F%2F127.0.0.1%3A4000%2F"))
            .and(body_string_contains("code_verifier=verifier-123"))
            .and(body_string_contains("client_secret=secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "ya29.fresh",
                "expires_in": 3599,
                "scope": "https://www.googleapis.com/auth/presentations openid",
                "token_type": "Bearer"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let auth = Authenticator::new(&config(&dir)).unwrap();
        let user = auth
            .exchange_code(
                &secrets(&format!("{}/token", server.uri())),
                "4/0Ab",
                "http://127.0.0.1:4000/",
                "verifier-123",
            )
            .await
            .unwrap();

        assert_eq!(user.token, "ya29.fresh");
        assert_eq!(user.refresh_token, None);
        assert!(!user.can_refresh());
        assert_eq!(user.scopes, vec![SLIDES_SCOPE.to_string(), "openid".to_string()]);
        assert_eq!(user.client_id, "id");
        assert!(user.is_valid(Utc::now()));
    }

    #[tokio::test]
    async fn test_exchange_code_without_scope_keeps_requested() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "ya29.fresh",
                "refresh_token": "1//new"
            })))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let auth = Authenticator::new(&config(&dir)).unwrap();
        let user = auth
            .exchange_code(&secrets(&format!("{}/token", server.uri())), "c", "http://127.0.0.1:1/", "v")
            .await
            .unwrap();

        assert_eq!(user.scopes, vec![SLIDES_SCOPE.to_string()]);
        assert_eq!(user.refresh_token.as_deref(), Some("1//new"));
        assert_eq!(user.expiry, None);
    }

    #[tokio::test]
    async fn test_exchange_code_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_string(r#"{"error":"invalid_grant"}"#))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let err = Authenticator::new(&config(&dir))
            .unwrap()
            .exchange_code(&secrets(&format!("{}/token", server.uri())), "c", "http://127.0.0.1:1/", "v")
            .await
            .unwrap_err();
        match err {
            AuthError::AuthorizationFailed(msg) => assert!(msg.contains("invalid_grant")),
            other => panic!("expected AuthorizationFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_consent_flow_end_to_end() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=4%2F0Ab"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "ya29.consented",
                "refresh_token": "1//consented",
                "expires_in": 3599
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let cfg = config(&dir);
        std::fs::write(
            &cfg.credentials_file,
            serde_json::json!({
                "installed": {
                    "client_id": "id",
                    "client_secret": "secret",
                    "token_uri": format!("{}/token", server.uri())
                }
            })
            .to_string(),
        )
        .unwrap();

        // Stand-in for the user's browser: follow the consent URL's redirect
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<Url>();
        let browser = tokio::spawn(async move {
            let consent = rx.recv().await.unwrap();
            let params = query(&consent);
            let redirect = format!("{}?state={}&code=4%2F0Ab", params["redirect_uri"], params["state"]);
            let status = reqwest::get(redirect).await.unwrap().status();
            (params, status)
        });

        let auth = Authenticator::new(&cfg).unwrap().with_url_handler(move |url| {
            let _ = tx.send(url.clone());
        });
        let user = auth.authorize().await.unwrap();

        let (params, status) = browser.await.unwrap();
        assert_eq!(status, 200);
        assert!(params["redirect_uri"].starts_with("http://127.0.0.1:"));
        assert_eq!(params["code_challenge_method"], "S256");

        assert_eq!(user.token, "ya29.consented");
        assert_eq!(user.token_uri, format!("{}/token", server.uri()));

        // The verifier sent to the token endpoint matches the challenge in the URL
        let requests = server.received_requests().await.unwrap();
        let sent = form(&requests[0].body);
        assert_eq!(challenge_for(&sent["code_verifier"]), params["code_challenge"]);
        assert_eq!(sent["redirect_uri"], params["redirect_uri"]);

        let saved = AuthorizedUser::load(&cfg.token_file).unwrap().unwrap();
        assert_eq!(saved.refresh_token.as_deref(), Some("1//consented"));
    }

    #[tokio::test]
    async fn test_consent_flow_denied() {
        let dir = TempDir::new().unwrap();
        let cfg = config(&dir);
        std::fs::write(
            &cfg.credentials_file,
            r#"{"installed":{"client_id":"id","client_secret":"secret"}}"#,
        )
        .unwrap();

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<Url>();
        let browser = tokio::spawn(async move {
            let params = query(&rx.recv().await.unwrap());
            let redirect = format!("{}?state={}&error=access_denied", params["redirect_uri"], params["state"]);
            reqwest::get(redirect).await.unwrap().status()
        });

        let auth = Authenticator::new(&cfg).unwrap().with_url_handler(move |url| {
            let _ = tx.send(url.clone());
        });
        let err = auth.authorize().await.unwrap_err();

        assert_eq!(browser.await.unwrap(), 400);
        assert!(matches!(err, AuthError::AuthorizationFailed(ref e) if e == "access_denied"));
        assert!(!cfg.token_file.exists());
    }
}
