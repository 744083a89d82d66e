//! External-process fetch backend
//!
//! Some sites reject the direct client on its TLS or header fingerprint while
//! letting curl through. The process follows redirects itself and only reports
//! pass/fail, so its results never carry response headers.

use crate::config::FetchConfig;
use crate::crawler::fetcher::{FetchRequest, FetchResult, Fetcher};
use crate::FetchError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::io::ErrorKind;
use tokio::process::Command;

/// Fallback fetch backend spawning a curl-compatible program
pub struct CurlFetcher {
    program: String,
    user_agent: String,
    accept: String,
    accept_language: String,
}

impl CurlFetcher {
    pub fn from_config(config: &FetchConfig) -> Self {
        Self {
            program: config.fallback_program.clone(),
            user_agent: config.user_agent.clone(),
            accept: config.accept.clone(),
            accept_language: config.accept_language.clone(),
        }
    }

    /// Arguments passed to the program for one request
    pub fn arguments(&self, request: &FetchRequest<'_>) -> Vec<String> {
        let mut args = vec![
            "-L".to_string(),
            "-sS".to_string(),
            "--max-time".to_string(),
            request.timeout.as_secs().max(1).to_string(),
            "-A".to_string(),
            self.user_agent.clone(),
            "-H".to_string(),
            format!("Accept: {}", self.accept),
            "-H".to_string(),
            format!("Accept-Language: {}", self.accept_language),
            "-H".to_string(),
            "Upgrade-Insecure-Requests: 1".to_string(),
        ];

        if let Some(referer) = request.referer {
            args.push("-e".to_string());
            args.push(referer.to_string());
        }

        args.push(request.url.as_str().to_string());
        args
    }
}

#[async_trait]
impl Fetcher for CurlFetcher {
    fn name(&self) -> &'static str {
        "curl"
    }

    async fn fetch(&self, request: &FetchRequest<'_>) -> Result<FetchResult, FetchError> {
        let output = Command::new(&self.program)
            .args(self.arguments(request))
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => {
                    FetchError::Fallback(format!("{} not found in PATH", self.program))
                }
                _ => FetchError::Fallback(format!("cannot spawn {}: {}", self.program, e)),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FetchError::Fallback(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        Ok(FetchResult {
            status: Some(200),
            headers: HashMap::new(),
            body: output.stdout,
        })
    }
}
