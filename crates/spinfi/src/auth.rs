// Hotspot authentication
//
// Form login against a MikroTik-style hotspot (`POST /login` with
// `username` and `password` fields). The portal treats the call as
// fire-and-forget; the CLI keeps the task handles so it can report the
// result before exiting.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

use spinfi_core::Authenticator;

use crate::error::CliError;

type LoginTask = JoinHandle<Result<(), CliError>>;

pub struct HotspotAuthenticator {
    http: reqwest::Client,
    login_url: Url,
    pending: Mutex<Vec<LoginTask>>,
}

impl HotspotAuthenticator {
    pub fn new(login_url: Url, timeout: Duration) -> Result<Self, CliError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .cookie_store(true)
            .build()
            .map_err(|e| CliError::LoginFailed {
                url: login_url.to_string(),
                source: Box::new(e),
            })?;
        Ok(Self::with_client(http, login_url))
    }

    pub fn with_client(http: reqwest::Client, login_url: Url) -> Self {
        Self {
            http,
            login_url,
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Wait for every login started so far. Returns how many succeeded,
    /// or the first failure.
    pub async fn wait(&self) -> Result<usize, CliError> {
        let tasks: Vec<LoginTask> = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();

        let mut succeeded = 0;
        for task in tasks {
            match task.await {
                Ok(Ok(())) => succeeded += 1,
                Ok(Err(e)) => return Err(e),
                Err(join) => {
                    return Err(CliError::LoginFailed {
                        url: self.login_url.to_string(),
                        source: Box::new(join),
                    });
                }
            }
        }
        Ok(succeeded)
    }
}

impl Authenticator for HotspotAuthenticator {
    fn perform_authentication(&self, username: &str, password: &SecretString) {
        let http = self.http.clone();
        let url = self.login_url.clone();
        let form = [
            ("username", username.to_owned()),
            ("password", password.expose_secret().to_owned()),
        ];

        info!(%url, username, "hotspot login");
        let task = tokio::spawn(async move { login(&http, url, &form).await });
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(task);
    }
}

async fn login(
    http: &reqwest::Client,
    url: Url,
    form: &[(&str, String)],
) -> Result<(), CliError> {
    debug!("posting login form to {url}");
    let failed = |source: Box<dyn std::error::Error + Send + Sync>| CliError::LoginFailed {
        url: url.to_string(),
        source,
    };

    let resp = http
        .post(url.clone())
        .form(form)
        .send()
        .await
        .map_err(|e| failed(Box::new(e)))?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        warn!(%status, "hotspot login rejected");
        return Err(failed(format!("HTTP {status}: {body}").into()));
    }

    debug!("hotspot login accepted");
    Ok(())
}
