use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::core::{FileMedium, SnapshotMedium, generate_id};
use crate::sync::wire::RemoteState;
use crate::sync::{SyncBackend, SyncError};

/// Anonymous credential triple persisted next to the snapshot. Only usable
/// when all three fields are present.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthState {
    username: String,
    password: String,
    access_token: String,
}

impl AuthState {
    fn usable(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty() && !self.access_token.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct PullResponse {
    #[serde(default)]
    state: Option<RemoteState>,
}

#[derive(Debug, Serialize)]
struct ImportRequest<'a> {
    mode: &'static str,
    state: &'a RemoteState,
}

#[derive(Debug, Serialize)]
struct CredentialsBody<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    access_token: String,
}

/// HTTP implementation of the sync contract against the companion server.
///
/// Accounts are anonymous and device-local: on first contact the client
/// invents a `noto_xxxxxxxx` username and a random password, registers them
/// and keeps the triple in `auth.json` for the next session.
pub struct HttpSyncClient {
    http: reqwest::Client,
    base_url: String,
    auth_path: PathBuf,
    session: RwLock<Option<AuthState>>,
}

impl HttpSyncClient {
    /// `base_url` is the API root, e.g. `http://localhost:4000/api/v1`.
    /// Credentials persist in `data_dir/auth.json`.
    pub fn new(base_url: &str, data_dir: &Path) -> Result<Self, SyncError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
            auth_path: data_dir.join("auth.json"),
            session: RwLock::new(None),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn read_auth(&self) -> Option<AuthState> {
        let blob = std::fs::read_to_string(&self.auth_path).ok()?;
        let auth: AuthState = serde_json::from_str(&blob).ok()?;
        auth.usable().then_some(auth)
    }

    fn write_auth(&self, auth: &AuthState) {
        let blob = match serde_json::to_string(auth) {
            Ok(blob) => blob,
            Err(err) => {
                tracing::warn!("could not serialize credentials: {err}");
                return;
            }
        };
        if let Err(err) = FileMedium::new(&self.auth_path).write(&blob) {
            tracing::warn!("could not persist credentials: {err}");
        }
    }

    async fn token(&self) -> Result<String, SyncError> {
        match self.session.read().await.as_ref() {
            Some(auth) => Ok(auth.access_token.clone()),
            None => Err(SyncError::AuthUnavailable),
        }
    }

    async fn probe_token(&self, token: &str) -> Result<bool, SyncError> {
        let response = self
            .http
            .get(self.url("/me"))
            .bearer_auth(token)
            .send()
            .await?;
        Ok(response.status().is_success())
    }

    /// Login; `Ok(None)` when the server rejected the credentials, which is
    /// the expected outcome before the account exists.
    async fn request_token(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<String>, SyncError> {
        let body = CredentialsBody { username, password };
        let response = self
            .http
            .post(self.url("/auth/login"))
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Ok(None);
        }
        let token: TokenResponse = response.json().await?;
        Ok(Some(token.access_token))
    }

    async fn establish_session(&self) -> Result<AuthState, SyncError> {
        if let Some(auth) = self.read_auth()
            && self.probe_token(&auth.access_token).await.unwrap_or(false)
        {
            return Ok(auth);
        }
        let (username, password) = match self.read_auth() {
            Some(auth) => (auth.username, auth.password),
            None => {
                let username = format!("noto_{}", &generate_id().to_string()[..8]);
                let password = generate_id().simple().to_string();
                (username, password)
            }
        };
        let token = match self.request_token(&username, &password).await? {
            Some(token) => Some(token),
            None => {
                // first contact: the account does not exist yet
                let body = CredentialsBody {
                    username: &username,
                    password: &password,
                };
                let register = self
                    .http
                    .post(self.url("/auth/register"))
                    .json(&body)
                    .send()
                    .await;
                if let Err(err) = register {
                    tracing::debug!("register attempt failed: {err}");
                }
                self.request_token(&username, &password).await?
            }
        };
        let Some(access_token) = token else {
            return Err(SyncError::AuthUnavailable);
        };
        let auth = AuthState {
            username,
            password,
            access_token,
        };
        self.write_auth(&auth);
        Ok(auth)
    }
}

impl SyncBackend for HttpSyncClient {
    fn bootstrap_auth(&self) -> impl Future<Output = Result<(), SyncError>> + Send {
        async move {
            let auth = self.establish_session().await?;
            *self.session.write().await = Some(auth);
            Ok(())
        }
    }

    fn pull(&self) -> impl Future<Output = Result<Option<RemoteState>, SyncError>> + Send {
        async move {
            let token = self.token().await?;
            let response = self
                .http
                .get(self.url("/export"))
                .bearer_auth(&token)
                .send()
                .await?;
            if !response.status().is_success() {
                return Err(SyncError::Status {
                    status: response.status().as_u16(),
                    path: "/export".to_owned(),
                });
            }
            let body: PullResponse = response.json().await?;
            Ok(body.state.filter(RemoteState::has_data))
        }
    }

    fn push(&self, snapshot: &RemoteState) -> impl Future<Output = Result<(), SyncError>> + Send {
        async move {
            let token = self.token().await?;
            let body = ImportRequest {
                mode: "replace",
                state: snapshot,
            };
            let response = self
                .http
                .post(self.url("/import"))
                .bearer_auth(&token)
                .json(&body)
                .send()
                .await?;
            if !response.status().is_success() {
                return Err(SyncError::Status {
                    status: response.status().as_u16(),
                    path: "/import".to_owned(),
                });
            }
            Ok(())
        }
    }
}
