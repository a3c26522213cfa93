//! Security definitions and their scheme vocabulary.

use serde_json::{Map, Value};

use crate::error::Result;
use crate::model::{as_object, get_str, get_str_list, multilang, unsupported};

/// The `scheme` keyword of a security definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemeType {
    NoSec,
    Basic,
    Digest,
    ApiKey,
    Bearer,
    Psk,
    OAuth2,
}

impl SchemeType {
    pub fn parse(value: &str) -> Result<Self> {
        Ok(match value {
            "nosec" => SchemeType::NoSec,
            "basic" => SchemeType::Basic,
            "digest" => SchemeType::Digest,
            "apikey" => SchemeType::ApiKey,
            "bearer" => SchemeType::Bearer,
            "psk" => SchemeType::Psk,
            "oauth2" => SchemeType::OAuth2,
            other => return Err(unsupported("scheme", other)),
        })
    }

    pub fn c_value(self) -> &'static str {
        match self {
            SchemeType::NoSec => "SECURITY_SCHEME_NONE",
            SchemeType::Basic => "SECURITY_SCHEME_BASIC",
            SchemeType::Digest => "SECURITY_SCHEME_DIGEST",
            SchemeType::ApiKey => "SECURITY_SCHEME_API_KEY",
            SchemeType::Bearer => "SECURITY_SCHEME_BEARER",
            SchemeType::Psk => "SECURITY_SCHEME_PSK",
            SchemeType::OAuth2 => "SECURITY_SCHEME_OAUTH2",
        }
    }

    /// Short name used in the subtype record's C type.
    pub fn specifier(self) -> &'static str {
        match self {
            SchemeType::NoSec => "nosec",
            SchemeType::Basic => "basic",
            SchemeType::Digest => "digest",
            SchemeType::ApiKey => "api_key",
            SchemeType::Bearer => "bearer",
            SchemeType::Psk => "psk",
            SchemeType::OAuth2 => "oauth2",
        }
    }
}

/// Where a security parameter is carried in the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthLocation {
    #[default]
    Default,
    Header,
    Query,
    Body,
    Cookie,
}

impl AuthLocation {
    pub fn parse(value: &str) -> Result<Self> {
        Ok(match value {
            "default" => AuthLocation::Default,
            "header" => AuthLocation::Header,
            "query" => AuthLocation::Query,
            "body" => AuthLocation::Body,
            "cookie" => AuthLocation::Cookie,
            other => return Err(unsupported("in", other)),
        })
    }

    pub fn c_value(self) -> &'static str {
        match self {
            AuthLocation::Default => "SECURITY_SCHEME_IN_DEFAULT",
            AuthLocation::Header => "SECURITY_SCHEME_IN_HEADER",
            AuthLocation::Query => "SECURITY_SCHEME_IN_QUERY",
            AuthLocation::Body => "SECURITY_SCHEME_IN_BODY",
            AuthLocation::Cookie => "SECURITY_SCHEME_IN_COOKIE",
        }
    }
}

/// Quality of protection for digest authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestQop {
    Auth,
    AuthInt,
}

impl DigestQop {
    pub fn parse(value: &str) -> Result<Self> {
        Ok(match value {
            "auth" => DigestQop::Auth,
            "auth-int" => DigestQop::AuthInt,
            other => return Err(unsupported("qop", other)),
        })
    }

    pub fn c_value(self) -> &'static str {
        match self {
            DigestQop::Auth => "SECURITY_DIGEST_QOP_AUTH",
            DigestQop::AuthInt => "SECURITY_DIGEST_QOP_AUTH_INT",
        }
    }
}

/// The `name`/`in` pair shared by header-carried schemes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NameAndLocation {
    pub name: Option<String>,
    pub location: AuthLocation,
}

impl NameAndLocation {
    fn from_map(map: &Map<String, Value>) -> Result<Self> {
        let location = match get_str(map, "in")? {
            Some(raw) => AuthLocation::parse(&raw)?,
            None => AuthLocation::Default,
        };
        Ok(NameAndLocation { name: get_str(map, "name")?, location })
    }
}

/// Scheme-specific parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemeDetail {
    NoSec,
    Basic(NameAndLocation),
    Digest {
        base: NameAndLocation,
        qop: Option<DigestQop>,
    },
    ApiKey(NameAndLocation),
    Bearer {
        base: NameAndLocation,
        authorization: Option<String>,
        alg: Option<String>,
        format: Option<String>,
    },
    Psk {
        identity: Option<String>,
    },
    OAuth2 {
        authorization: Option<String>,
        token: Option<String>,
        refresh: Option<String>,
        scopes: Vec<String>,
        flow: Option<String>,
    },
}

/// The common part of every security scheme plus its detail.
#[derive(Debug, Clone, PartialEq)]
pub struct SecurityScheme {
    pub scheme_type: SchemeType,
    pub types: Vec<String>,
    pub descriptions: Option<Vec<(String, String)>>,
    pub proxy: Option<String>,
    pub detail: SchemeDetail,
}

/// A named entry of `securityDefinitions`.
#[derive(Debug, Clone, PartialEq)]
pub struct SecurityDefinition {
    pub key: String,
    pub scheme: SecurityScheme,
}

impl SecurityDefinition {
    pub fn from_value(key: &str, value: &Value, default_lang: &str) -> Result<SecurityDefinition> {
        let map = as_object(value, "security definition")?;
        let scheme_name = get_str(map, "scheme")?
            .ok_or_else(|| crate::model::malformed(format!("security definition '{key}' has no scheme")))?;
        let scheme_type = SchemeType::parse(&scheme_name)?;

        let detail = match scheme_type {
            SchemeType::NoSec => SchemeDetail::NoSec,
            SchemeType::Basic => SchemeDetail::Basic(NameAndLocation::from_map(map)?),
            SchemeType::Digest => SchemeDetail::Digest {
                base: NameAndLocation::from_map(map)?,
                qop: match get_str(map, "qop")? {
                    Some(raw) => Some(DigestQop::parse(&raw)?),
                    None => None,
                },
            },
            SchemeType::ApiKey => SchemeDetail::ApiKey(NameAndLocation::from_map(map)?),
            SchemeType::Bearer => SchemeDetail::Bearer {
                base: NameAndLocation::from_map(map)?,
                authorization: get_str(map, "authorization")?,
                alg: get_str(map, "alg")?,
                format: get_str(map, "format")?,
            },
            SchemeType::Psk => SchemeDetail::Psk { identity: get_str(map, "identity")? },
            SchemeType::OAuth2 => SchemeDetail::OAuth2 {
                authorization: get_str(map, "authorization")?,
                token: get_str(map, "token")?,
                refresh: get_str(map, "refresh")?,
                scopes: get_str_list(map, "scopes")?,
                flow: get_str(map, "flow")?,
            },
        };

        Ok(SecurityDefinition {
            key: key.to_string(),
            scheme: SecurityScheme {
                scheme_type,
                types: get_str_list(map, "@type")?,
                descriptions: multilang(map, "descriptions", "description", default_lang)?,
                proxy: get_str(map, "proxy")?,
                detail,
            },
        })
    }
}
