//! Resource kinds and their REST endpoints

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// REST location and JSON envelope keys for one resource kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    /// Collection path, e.g. `/api/email/template`
    pub path: &'static str,
    /// Envelope key for a single resource, e.g. `emailTemplate`
    pub singular: &'static str,
    /// Envelope key for a collection, e.g. `emailTemplates`
    pub plural: &'static str,
}

/// Kind of remote configuration object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Email,
    Message,
    Theme,
    Lambda,
    Application,
}

impl ResourceKind {
    #[must_use]
    pub const fn endpoint(self) -> Endpoint {
        match self {
            Self::Email => Endpoint {
                path: "/api/email/template",
                singular: "emailTemplate",
                plural: "emailTemplates",
            },
            Self::Message => Endpoint {
                path: "/api/message/template",
                singular: "messageTemplate",
                plural: "messageTemplates",
            },
            Self::Theme => Endpoint {
                path: "/api/theme",
                singular: "theme",
                plural: "themes",
            },
            Self::Lambda => Endpoint {
                path: "/api/lambda",
                singular: "lambda",
                plural: "lambdas",
            },
            Self::Application => Endpoint {
                path: "/api/application",
                singular: "application",
                plural: "applications",
            },
        }
    }

    /// Human readable label used in console messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Email => "email template",
            Self::Message => "message template",
            Self::Theme => "theme",
            Self::Lambda => "lambda",
            Self::Application => "application",
        }
    }

    /// Default local directory for kinds that are synced as a tree.
    #[must_use]
    pub const fn default_dir(self) -> &'static str {
        match self {
            Self::Email => "./emails/",
            Self::Message => "./messages/",
            Self::Theme => "./themes/",
            Self::Lambda => "./lambdas/",
            Self::Application => "./applications/",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "email" => Ok(Self::Email),
            "message" => Ok(Self::Message),
            "theme" => Ok(Self::Theme),
            "lambda" => Ok(Self::Lambda),
            "application" => Ok(Self::Application),
            other => Err(format!("unknown resource kind '{other}'")),
        }
    }
}
