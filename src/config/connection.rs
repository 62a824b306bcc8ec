//! Engine connection strings
//!
//! Two forms are accepted: a `postgres://` URL, or libpq keyword/value pairs
//! such as `host=localhost user=postgres`. Keyword values may be single
//! quoted, with `\'` and `\\` escapes inside quotes. Keywords the engine
//! driver has no counterpart for are kept aside and reported, not rejected.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::errors::{ConfigError, ConfigResult};

/// Built-in connection string used when no config file is present
pub const DEFAULT_CONNECTION: &str = "host=localhost user=postgres";

const URL_SCHEMES: [&str; 2] = ["postgres://", "postgresql://"];
const SSL_MODES: [&str; 6] = ["disable", "allow", "prefer", "require", "verify-ca", "verify-full"];
const REDACTED: &str = "*****";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConnectionKeywords {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub dbname: Option<String>,
    /// Numeric address; connected to instead of `host` when both are set
    pub hostaddr: Option<String>,
    pub sslmode: Option<String>,
    pub sslrootcert: Option<String>,
    pub sslcert: Option<String>,
    pub sslkey: Option<String>,
    pub application_name: Option<String>,
    /// Backend options, libpq style: `-c name=value ...`
    pub options: Option<String>,
    /// Seconds; zero means wait indefinitely
    pub connect_timeout: Option<u64>,
    /// Keywords accepted by libpq that this panel does not act on
    pub ignored: Vec<String>,
}

impl ConnectionKeywords {
    /// Address to connect to
    pub fn address(&self) -> Option<&str> {
        self.hostaddr.as_deref().or(self.host.as_deref())
    }

    /// `-c name=value` pairs from `options`
    pub fn backend_options(&self) -> Vec<(String, String)> {
        let Some(options) = &self.options else {
            return Vec::new();
        };
        let mut pairs = Vec::new();
        let mut words = options.split_whitespace();
        while let Some(word) = words.next() {
            let setting = match word.strip_prefix("-c") {
                Some("") => words.next(),
                Some(rest) => Some(rest),
                None => word.strip_prefix("--"),
            };
            if let Some((name, value)) = setting.and_then(|s| s.split_once('=')) {
                pairs.push((name.replace('-', "_"), value.to_string()));
            }
        }
        pairs
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "form", content = "value", rename_all = "lowercase")]
pub enum ConnectionSettings {
    Url(String),
    Keywords(ConnectionKeywords),
}

impl ConnectionSettings {
    pub fn parse(input: &str) -> ConfigResult<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ConfigError::invalid("connection string is empty"));
        }
        if URL_SCHEMES.iter().any(|scheme| input.starts_with(scheme)) {
            return Ok(Self::Url(input.to_string()));
        }
        parse_keywords(input).map(Self::Keywords)
    }

    /// Printable form with any password masked
    pub fn redacted(&self) -> String {
        match self {
            Self::Url(url) => redact_url(url),
            Self::Keywords(kw) => {
                let masked = ConnectionKeywords {
                    password: kw.password.as_ref().map(|_| REDACTED.to_string()),
                    ..kw.clone()
                };
                masked.to_string()
            }
        }
    }
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self::Keywords(ConnectionKeywords {
            host: Some("localhost".to_string()),
            user: Some("postgres".to_string()),
            ..ConnectionKeywords::default()
        })
    }
}

impl FromStr for ConnectionSettings {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ConnectionKeywords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let port = self.port.map(|p| p.to_string());
        let timeout = self.connect_timeout.map(|t| t.to_string());
        let pairs = [
            ("host", self.host.as_deref()),
            ("hostaddr", self.hostaddr.as_deref()),
            ("port", port.as_deref()),
            ("user", self.user.as_deref()),
            ("password", self.password.as_deref()),
            ("dbname", self.dbname.as_deref()),
            ("sslmode", self.sslmode.as_deref()),
            ("sslrootcert", self.sslrootcert.as_deref()),
            ("sslcert", self.sslcert.as_deref()),
            ("sslkey", self.sslkey.as_deref()),
            ("application_name", self.application_name.as_deref()),
            ("options", self.options.as_deref()),
            ("connect_timeout", timeout.as_deref()),
        ];
        let rendered: Vec<String> = pairs
            .iter()
            .filter_map(|(key, value)| value.map(|v| format!("{}={}", key, quote_value(v))))
            .collect();
        write!(f, "{}", rendered.join(" "))
    }
}

fn quote_value(value: &str) -> String {
    if !value.is_empty() && !value.contains(|c: char| c.is_whitespace() || c == '\'' || c == '\\') {
        return value.to_string();
    }
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

fn parse_keywords(input: &str) -> ConfigResult<ConnectionKeywords> {
    let mut keywords = ConnectionKeywords::default();
    for (key, value) in tokenize(input)? {
        match key.as_str() {
            "host" => keywords.host = Some(value),
            "port" => {
                let port = value
                    .parse::<u16>()
                    .map_err(|_| ConfigError::invalid(format!("port '{}' is not a number", value)))?;
                keywords.port = Some(port);
            }
            "user" => keywords.user = Some(value),
            "password" => keywords.password = Some(value),
            "dbname" => keywords.dbname = Some(value),
            "hostaddr" => keywords.hostaddr = Some(value),
            "sslmode" => {
                if !SSL_MODES.contains(&value.as_str()) {
                    return Err(ConfigError::invalid(format!("unknown sslmode '{}'", value)));
                }
                keywords.sslmode = Some(value);
            }
            "sslrootcert" => keywords.sslrootcert = Some(value),
            "sslcert" => keywords.sslcert = Some(value),
            "sslkey" => keywords.sslkey = Some(value),
            "application_name" => keywords.application_name = Some(value),
            "options" => keywords.options = Some(value),
            "connect_timeout" => {
                let seconds = value.parse::<u64>().map_err(|_| {
                    ConfigError::invalid(format!("connect_timeout '{}' is not a number", value))
                })?;
                keywords.connect_timeout = Some(seconds);
            }
            "" => return Err(ConfigError::invalid("missing keyword before '='")),
            other => keywords.ignored.push(other.to_string()),
        }
    }
    Ok(keywords)
}

fn tokenize(input: &str) -> ConfigResult<Vec<(String, String)>> {
    let mut pairs = Vec::new();
    let mut chars = input.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        if chars.peek().is_none() {
            break;
        }

        let mut key = String::new();
        while let Some(c) = chars.next_if(|c| *c != '=' && !c.is_whitespace()) {
            key.push(c);
        }
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        if chars.next() != Some('=') {
            return Err(ConfigError::invalid(format!("missing '=' after '{}'", key)));
        }
        while chars.next_if(|c| c.is_whitespace()).is_some() {}

        let mut value = String::new();
        if chars.next_if_eq(&'\'').is_some() {
            loop {
                match chars.next() {
                    Some('\\') => match chars.next() {
                        Some(c) => value.push(c),
                        None => return Err(ConfigError::invalid("unterminated quoted value")),
                    },
                    Some('\'') => break,
                    Some(c) => value.push(c),
                    None => return Err(ConfigError::invalid("unterminated quoted value")),
                }
            }
        } else {
            while let Some(c) = chars.next_if(|c| !c.is_whitespace()) {
                value.push(c);
            }
        }
        pairs.push((key, value));
    }
    Ok(pairs)
}

fn redact_url(url: &str) -> String {
    let Some(scheme_end) = url.find("://").map(|i| i + 3) else {
        return url.to_string();
    };
    let rest = &url[scheme_end..];
    let Some(at) = rest.find('@') else {
        return url.to_string();
    };
    match rest[..at].find(':') {
        Some(colon) => format!(
            "{}{}:{}{}",
            &url[..scheme_end],
            &rest[..colon],
            REDACTED,
            &rest[at..]
        ),
        None => url.to_string(),
    }
}
