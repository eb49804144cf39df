//! Common types used throughout session-http
//!
//! Shared type definitions used across multiple modules.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

// ============================================================================
// HTTP Types
// ============================================================================

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    GET,
    POST,
    PUT,
    PATCH,
    DELETE,
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::GET => reqwest::Method::GET,
            Method::POST => reqwest::Method::POST,
            Method::PUT => reqwest::Method::PUT,
            Method::PATCH => reqwest::Method::PATCH,
            Method::DELETE => reqwest::Method::DELETE,
        }
    }
}

impl FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::GET),
            "POST" => Ok(Method::POST),
            "PUT" => Ok(Method::PUT),
            "PATCH" => Ok(Method::PATCH),
            "DELETE" => Ok(Method::DELETE),
            other => Err(format!("unsupported HTTP method: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_conversion() {
        assert_eq!(reqwest::Method::from(Method::GET), reqwest::Method::GET);
        assert_eq!(reqwest::Method::from(Method::PATCH), reqwest::Method::PATCH);
    }

    #[test]
    fn test_method_from_str() {
        assert_eq!("post".parse::<Method>(), Ok(Method::POST));
        assert_eq!("DELETE".parse::<Method>(), Ok(Method::DELETE));
        assert!("TRACE".parse::<Method>().is_err());
    }

    #[test]
    fn test_method_serde() {
        let json = serde_json::to_string(&Method::PUT).unwrap();
        assert_eq!(json, "\"PUT\"");
        let parsed: Method = serde_json::from_str("\"GET\"").unwrap();
        assert_eq!(parsed, Method::GET);
    }
}
