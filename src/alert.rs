use std::convert::Infallible;

use rocket::{
    http::uri::Reference,
    request::{FlashMessage, FromRequest, Outcome},
    response::{Flash, Redirect},
    Request,
};
use serde::Serialize;

use crate::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Danger,
    Warning,
    #[default]
    Info,
}

impl Severity {
    /// Name of the matching `alert-*` class.
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Success => "success",
            Severity::Danger => "danger",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }

    fn from_kind(kind: &str) -> Self {
        match kind {
            "success" => Severity::Success,
            "danger" => Severity::Danger,
            "warning" => Severity::Warning,
            _ => Severity::Info,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Alert {
    pub severity: Severity,
    pub message: String,
}

/// What templates need to render the alert area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alerts {
    pub items: Vec<Alert>,
    pub timeout_ms: u64,
}

/// Notification channel handed to every view.
///
/// Collects the alerts raised while handling a request, together with the
/// one carried over from the previous request by a flash cookie.
#[derive(Debug)]
pub struct Notifier {
    timeout: u64,
    carried: Option<Alert>,
    pending: Vec<Alert>,
}

impl Notifier {
    pub fn new(timeout: u64) -> Self {
        Self {
            timeout,
            carried: None,
            pending: Vec::new(),
        }
    }

    pub fn notify(&mut self, severity: Severity, message: impl Into<String>) {
        self.pending.push(Alert {
            severity,
            message: message.into(),
        });
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.notify(Severity::Success, message);
    }

    pub fn danger(&mut self, message: impl Into<String>) {
        self.notify(Severity::Danger, message);
    }

    pub fn alerts(&self) -> Alerts {
        Alerts {
            items: self
                .carried
                .iter()
                .chain(&self.pending)
                .filter(|alert| !alert.message.is_empty())
                .cloned()
                .collect(),
            timeout_ms: self.timeout * 1000,
        }
    }

    /// Navigates to `uri`, carrying the latest alert along.
    pub fn redirect<U: TryInto<Reference<'static>>>(mut self, uri: U) -> Flash<Redirect> {
        let alert = self.pending.pop().unwrap_or_default();
        Flash::new(Redirect::to(uri), alert.severity.as_str(), alert.message)
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Notifier {
    type Error = Infallible;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let timeout = request
            .rocket()
            .state::<Config>()
            .map(|config| config.alert_timeout)
            .unwrap_or_else(|| Config::default().alert_timeout);

        let mut notifier = Notifier::new(timeout);
        notifier.carried = request
            .guard::<Option<FlashMessage<'_>>>()
            .await
            .succeeded()
            .flatten()
            .map(|flash| Alert {
                severity: Severity::from_kind(flash.kind()),
                message: flash.message().to_string(),
            });

        Outcome::Success(notifier)
    }
}
