//! Per-invocation request context.
//!
//! Every top-level operation derives its constants (credential, account,
//! reporting window, breakdowns, endpoint) once from the inbound request and
//! passes them down the call chain as an immutable value. Two concurrent
//! invocations never share context.

use crate::{Error, Result};

/// Default batch endpoint: versioned graph API base.
pub const DEFAULT_BASE_URL: &str = "https://graph.facebook.com/v22.0";

/// Immutable constants for one orchestration run.
#[derive(Debug, Clone)]
pub struct GraphContext {
    access_token: String,
    account_id: String,
    date_start: String,
    date_end: String,
    breakdowns: Vec<String>,
    base_url: String,
}

impl GraphContext {
    pub fn builder() -> GraphContextBuilder {
        GraphContextBuilder::new()
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn date_start(&self) -> &str {
        &self.date_start
    }

    pub fn date_end(&self) -> &str {
        &self.date_end
    }

    pub fn breakdowns(&self) -> &[String] {
        &self.breakdowns
    }

    /// The batch endpoint URL. Every sub-request is resolved against this
    /// base by the remote side.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Builder validating the required inbound fields before any network work.
#[derive(Debug, Default)]
pub struct GraphContextBuilder {
    access_token: Option<String>,
    account_id: Option<String>,
    date_start: Option<String>,
    date_end: Option<String>,
    breakdowns: Option<Vec<String>>,
    base_url: Option<String>,
}

impl GraphContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn account_id(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }

    pub fn date_start(mut self, date_start: impl Into<String>) -> Self {
        self.date_start = Some(date_start.into());
        self
    }

    pub fn date_end(mut self, date_end: impl Into<String>) -> Self {
        self.date_end = Some(date_end.into());
        self
    }

    pub fn breakdowns(mut self, breakdowns: Vec<String>) -> Self {
        self.breakdowns = Some(breakdowns);
        self
    }

    /// Override the batch endpoint (primarily for testing with mock servers).
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn build(self) -> Result<GraphContext> {
        let access_token = self
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::validation("Access token is required"))?;
        let account_id = self
            .account_id
            .filter(|a| !a.is_empty())
            .ok_or_else(|| Error::validation("Account ID is required"))?;
        let date_start = self
            .date_start
            .filter(|d| !d.is_empty())
            .ok_or_else(|| Error::validation("Date start is required"))?;
        let date_end = self
            .date_end
            .filter(|d| !d.is_empty())
            .ok_or_else(|| Error::validation("Date end is required"))?;
        let breakdowns = self
            .breakdowns
            .ok_or_else(|| Error::validation("Breakdown is required"))?;

        Ok(GraphContext {
            access_token,
            account_id,
            date_start,
            date_end,
            breakdowns,
            base_url: self.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        })
    }
}
