//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::ClientSettings;
use crate::error::{Error, Result};
use crate::http::{AuthenticatedHttpClient, RequestConfig};
use crate::session::SessionEndReason;
use crate::token::{decode_claims, FileTokenStore, TokenStore};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let settings = self.load_settings()?;
        let client = Self::build_client(&settings)?;

        match &self.cli.command {
            Commands::Login { email, password } => self.login(&client, email, password).await,
            Commands::Logout => self.logout(&client).await,
            Commands::Status => self.status(&client).await,
            Commands::Request {
                method,
                path,
                data,
                query,
            } => {
                let mut config = RequestConfig::new();
                if let Some(data) = data {
                    let body: Value = serde_json::from_str(data)?;
                    config = config.json(body);
                }
                for (key, value) in query {
                    config = config.query(key, value);
                }
                self.request(&client, (*method).into(), path, config).await
            }
        }
    }

    /// Settings file first, then command line overrides
    fn load_settings(&self) -> Result<ClientSettings> {
        let mut settings = match (&self.cli.settings, &self.cli.base_url) {
            (Some(path), _) => ClientSettings::from_file(path)?,
            (None, Some(base_url)) => ClientSettings::new(base_url),
            (None, None) => {
                return Err(Error::config(
                    "Either --settings or --base-url is required",
                ))
            }
        };

        if let Some(base_url) = &self.cli.base_url {
            settings.base_url.clone_from(base_url);
        }
        if let Some(token_file) = &self.cli.token_file {
            settings.token_file.clone_from(token_file);
        }

        settings.validate()?;
        debug!("Using settings: {settings:?}");
        Ok(settings)
    }

    fn build_client(settings: &ClientSettings) -> Result<AuthenticatedHttpClient> {
        let store = Arc::new(FileTokenStore::open(&settings.token_file)?);
        let client = AuthenticatedHttpClient::new(settings.to_http_config(), store)?
            .with_observer(|reason: &SessionEndReason| {
                warn!("Session ended ({reason}); run `session-http login` again");
            });
        Ok(client)
    }

    async fn login(
        &self,
        client: &AuthenticatedHttpClient,
        email: &str,
        password: &str,
    ) -> Result<()> {
        let tokens = client
            .login(&json!({ "email": email, "password": password }))
            .await?;

        let expires_at = decode_claims(&tokens.access_token)
            .ok()
            .and_then(|claims| claims.expires_at())
            .map(|at| at.to_rfc3339());

        self.output_message(&json!({
            "type": "LOGIN",
            "status": "SUCCEEDED",
            "expires_at": expires_at,
            "has_refresh_token": tokens.refresh_token().is_some(),
        }));
        Ok(())
    }

    async fn logout(&self, client: &AuthenticatedHttpClient) -> Result<()> {
        client.logout().await?;
        self.output_message(&json!({ "type": "LOGOUT", "status": "SUCCEEDED" }));
        Ok(())
    }

    async fn status(&self, client: &AuthenticatedHttpClient) -> Result<()> {
        let store = client.store();
        let Some(tokens) = store.tokens().await?.filter(|t| t.is_logged_in()) else {
            self.output_message(&json!({ "type": "STATUS", "logged_in": false }));
            return Ok(());
        };

        let claims = decode_claims(&tokens.access_token).ok();
        self.output_message(&json!({
            "type": "STATUS",
            "logged_in": true,
            "access_token_valid": store.is_token_valid(&tokens.access_token),
            "subject": claims.as_ref().and_then(|c| c.sub.clone()),
            "expires_at": claims
                .as_ref()
                .and_then(|c| c.expires_at())
                .map(|at| at.to_rfc3339()),
            "has_refresh_token": tokens.refresh_token().is_some(),
        }));
        Ok(())
    }

    async fn request(
        &self,
        client: &AuthenticatedHttpClient,
        method: reqwest::Method,
        path: &str,
        config: RequestConfig,
    ) -> Result<()> {
        let response = client.request(method, path, config).await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        let body = serde_json::from_str::<Value>(&text).unwrap_or(Value::String(text));

        self.output_message(&json!({
            "type": "RESPONSE",
            "status": status,
            "body": body,
        }));
        Ok(())
    }

    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn runner(args: &[&str]) -> Runner {
        Runner::new(Cli::try_parse_from(args).unwrap())
    }

    #[test]
    fn test_settings_require_base_url() {
        let err = runner(&["session-http", "status"])
            .load_settings()
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_command_line_overrides_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.yaml");
        std::fs::write(
            &path,
            "base_url: https://api.example.com\ntoken_file: /tmp/a.json\n",
        )
        .unwrap();

        let settings = runner(&[
            "session-http",
            "--settings",
            path.to_str().unwrap(),
            "--base-url",
            "http://localhost:9000",
            "status",
        ])
        .load_settings()
        .unwrap();

        assert_eq!(settings.base_url, "http://localhost:9000");
        assert_eq!(settings.token_file, std::path::PathBuf::from("/tmp/a.json"));
    }

    #[tokio::test]
    async fn test_status_and_logout_with_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let token_file = dir.path().join("tokens.json");
        let runner = runner(&[
            "session-http",
            "--base-url",
            "http://localhost:9000",
            "--token-file",
            token_file.to_str().unwrap(),
            "status",
        ]);

        runner.run().await.unwrap();

        let client = Runner::build_client(&runner.load_settings().unwrap()).unwrap();
        runner.logout(&client).await.unwrap();
        assert!(!token_file.exists());
    }
}
