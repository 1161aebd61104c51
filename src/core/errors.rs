//! CADRA-prefixed error types with structured error codes and error kinds.

#![allow(missing_docs)]

use std::path::PathBuf;

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, CadraError>;

/// Which of the four error kinds from the error-handling design a variant
/// belongs to. The CLI uses this to pick an exit code without string-matching
/// messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing/invalid config, missing rules directory — fatal.
    Configuration,
    /// Failed connectivity probe against the graph store — fatal.
    GraphConnectivity,
    /// Principal not found, inconsistent path, invalid rule file — the
    /// offending item is skipped; only fatal if nothing is left to report.
    DataAnomaly,
    /// Missing property, unknown operator value, malformed metric token —
    /// never fatal, the one criterion degrades to false/unknown.
    EvaluationAnomaly,
}

/// Top-level error type for CADRA.
#[derive(Debug, Error)]
pub enum CadraError {
    #[error("[CADRA-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[CADRA-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[CADRA-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[CADRA-1004] rules directory not found: {path}")]
    MissingRulesDirectory { path: PathBuf },

    #[error("[CADRA-2001] failed to connect to graph store at {uri}: {details}")]
    GraphConnection { uri: String, details: String },

    #[error("[CADRA-2002] graph query failed: {details}")]
    GraphQuery { details: String },

    #[error("[CADRA-3001] principal not found: {name}")]
    PrincipalNotFound { name: String },

    #[error("[CADRA-3002] inconsistent path for relationship starting at {start_id}: {reason}")]
    InconsistentPath { start_id: String, reason: String },

    #[error("[CADRA-3003] invalid rule file {path}: {details}")]
    InvalidRuleFile { path: PathBuf, details: String },

    #[error("[CADRA-4001] missing property '{property}' on node {node_id}")]
    MissingProperty { node_id: String, property: String },

    #[error("[CADRA-4002] unknown operator value: {value}")]
    UnknownOperator { value: String },

    #[error("[CADRA-4003] malformed metric vector token: {token}")]
    MalformedMetricToken { token: String },

    #[error("[CADRA-9001] io failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CadraError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "CADRA-1001",
            Self::MissingConfig { .. } => "CADRA-1002",
            Self::ConfigParse { .. } => "CADRA-1003",
            Self::MissingRulesDirectory { .. } => "CADRA-1004",
            Self::GraphConnection { .. } => "CADRA-2001",
            Self::GraphQuery { .. } => "CADRA-2002",
            Self::PrincipalNotFound { .. } => "CADRA-3001",
            Self::InconsistentPath { .. } => "CADRA-3002",
            Self::InvalidRuleFile { .. } => "CADRA-3003",
            Self::MissingProperty { .. } => "CADRA-4001",
            Self::UnknownOperator { .. } => "CADRA-4002",
            Self::MalformedMetricToken { .. } => "CADRA-4003",
            Self::Io { .. } => "CADRA-9001",
        }
    }

    /// Which error kind this variant belongs to.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidConfig { .. }
            | Self::MissingConfig { .. }
            | Self::ConfigParse { .. }
            | Self::MissingRulesDirectory { .. } => ErrorKind::Configuration,
            Self::GraphConnection { .. } | Self::GraphQuery { .. } => ErrorKind::GraphConnectivity,
            Self::PrincipalNotFound { .. }
            | Self::InconsistentPath { .. }
            | Self::InvalidRuleFile { .. } => ErrorKind::DataAnomaly,
            Self::MissingProperty { .. }
            | Self::UnknownOperator { .. }
            | Self::MalformedMetricToken { .. } => ErrorKind::EvaluationAnomaly,
            Self::Io { .. } => ErrorKind::Configuration,
        }
    }

    /// Whether this error is fatal to the whole run, per the error-handling
    /// design in §7: configuration and graph-connectivity errors always are;
    /// data anomalies are fatal only when the driver decides nothing usable
    /// remains (the caller, not this method, makes that call for
    /// `DataAnomaly`); evaluation anomalies never are.
    #[must_use]
    pub const fn is_always_fatal(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Configuration | ErrorKind::GraphConnectivity
        )
    }

    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<serde_json::Error> for CadraError {
    fn from(value: serde_json::Error) -> Self {
        Self::ConfigParse {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_errors() -> Vec<CadraError> {
        vec![
            CadraError::InvalidConfig {
                details: String::new(),
            },
            CadraError::MissingConfig {
                path: PathBuf::new(),
            },
            CadraError::ConfigParse {
                context: "",
                details: String::new(),
            },
            CadraError::MissingRulesDirectory {
                path: PathBuf::new(),
            },
            CadraError::GraphConnection {
                uri: String::new(),
                details: String::new(),
            },
            CadraError::GraphQuery {
                details: String::new(),
            },
            CadraError::PrincipalNotFound {
                name: String::new(),
            },
            CadraError::InconsistentPath {
                start_id: String::new(),
                reason: String::new(),
            },
            CadraError::InvalidRuleFile {
                path: PathBuf::new(),
                details: String::new(),
            },
            CadraError::MissingProperty {
                node_id: String::new(),
                property: String::new(),
            },
            CadraError::UnknownOperator {
                value: String::new(),
            },
            CadraError::MalformedMetricToken {
                token: String::new(),
            },
            CadraError::Io {
                path: PathBuf::new(),
                source: std::io::Error::other("test"),
            },
        ]
    }

    #[test]
    fn error_codes_are_unique() {
        let codes: Vec<&str> = sample_errors().iter().map(CadraError::code).collect();
        let unique: std::collections::HashSet<&&str> = codes.iter().collect();
        assert_eq!(codes.len(), unique.len(), "codes must be unique: {codes:?}");
    }

    #[test]
    fn error_codes_have_cadra_prefix() {
        for err in sample_errors() {
            assert!(err.code().starts_with("CADRA-"));
        }
    }

    #[test]
    fn error_display_includes_code() {
        let err = CadraError::InvalidConfig {
            details: "bad value".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("CADRA-1001"));
        assert!(msg.contains("bad value"));
    }

    #[test]
    fn configuration_and_connectivity_are_always_fatal() {
        assert!(
            CadraError::MissingConfig {
                path: PathBuf::new()
            }
            .is_always_fatal()
        );
        assert!(
            CadraError::GraphConnection {
                uri: String::new(),
                details: String::new()
            }
            .is_always_fatal()
        );
    }

    #[test]
    fn data_and_evaluation_anomalies_are_not_inherently_fatal() {
        assert!(
            !CadraError::PrincipalNotFound {
                name: String::new()
            }
            .is_always_fatal()
        );
        assert!(
            !CadraError::MissingProperty {
                node_id: String::new(),
                property: String::new()
            }
            .is_always_fatal()
        );
    }

    #[test]
    fn from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: CadraError = json_err.into();
        assert_eq!(err.code(), "CADRA-1003");
    }
}
