//! Reverse proxy (nginx mode) settings

use serde::{Deserialize, Serialize};

/// Settings for the nginx edge proxy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NginxConfig {
    /// Public domain name, may be empty
    pub domain: String,

    /// How the server certificate is obtained
    pub https_mode: HttpsMode,

    /// A Let's Encrypt certificate for `domain` exists in the certbot volume.
    /// Until then the proxy serves the certificate in `server_certs`.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub letsencrypt_issued: bool,

    pub security: SecurityConfig,
}

impl NginxConfig {
    /// Whether the proxy can point at the Let's Encrypt live certificate
    pub fn serves_letsencrypt(&self) -> bool {
        self.https_mode == HttpsMode::Letsencrypt && self.letsencrypt_issued
    }
}

/// Access control applied in front of TeddyCloud
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    #[serde(rename = "type")]
    pub kind: SecurityType,

    /// IP addresses or CIDR blocks allowed to connect, empty means everyone
    pub allowed_ips: Vec<String>,

    /// Addresses that skip basic auth, only read while `kind` is `BasicAuth`
    pub auth_bypass_ips: Vec<String>,
}

/// Server certificate strategy
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum HttpsMode {
    /// Publicly trusted certificate issued by Let's Encrypt
    Letsencrypt,
    SelfSigned,
    /// Operator places certificate material out of band
    UserProvided,
    /// Not configured yet (older versions wrote an empty string)
    #[default]
    #[serde(alias = "")]
    None,
}

impl HttpsMode {
    /// Identifier used in prompts and the config file
    pub fn id(self) -> &'static str {
        self.into()
    }

    pub fn label(self) -> &'static str {
        match self {
            HttpsMode::Letsencrypt => "Let's Encrypt (automatic certificates)",
            HttpsMode::SelfSigned => "Create self-signed certificates",
            HttpsMode::UserProvided => "Custom certificates (provide your own)",
            HttpsMode::None => "Not configured",
        }
    }

    /// Modes an operator can pick
    pub fn selectable() -> [HttpsMode; 3] {
        [
            HttpsMode::Letsencrypt,
            HttpsMode::SelfSigned,
            HttpsMode::UserProvided,
        ]
    }
}

/// Access-control mechanism
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SecurityType {
    #[default]
    #[serde(alias = "")]
    None,
    /// Password file (.htpasswd)
    BasicAuth,
    /// Mutual TLS with client certificates
    ClientCert,
}

impl SecurityType {
    pub fn id(self) -> &'static str {
        self.into()
    }

    pub fn label(self) -> &'static str {
        match self {
            SecurityType::None => "No additional security",
            SecurityType::BasicAuth => "Basic Authentication (.htpasswd)",
            SecurityType::ClientCert => "Client Certificates",
        }
    }

    pub fn all() -> [SecurityType; 3] {
        [
            SecurityType::None,
            SecurityType::BasicAuth,
            SecurityType::ClientCert,
        ]
    }
}
