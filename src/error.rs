//! Error types for collectd-tagger
//!
//! This module defines the error types used throughout the application.

use thiserror::Error;

/// Rule 파싱 및 regex 관련 에러
#[derive(Error, Debug)]
pub enum RuleError {
    /// 정규식 패턴 컴파일 실패
    #[error("Invalid regex pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// 규칙 컴파일 실패 (인덱스 포함)
    #[error("Failed to compile rule '{name}' at index {index}: {source}")]
    RuleCompileFailed {
        index: usize,
        name: String,
        #[source]
        source: Box<RuleError>,
    },
}

/// Transform 엔진 에러
///
/// Raised for a single metric; callers skip the metric and keep going.
#[derive(Error, Debug)]
pub enum TransformError {
    /// 규칙 에러
    #[error("Rule error: {0}")]
    Rule(#[from] RuleError),

    /// 알 수 없는 하위 타입 (`wt` / `dir` 값이 테이블에 없음)
    #[error("Unknown {field} '{value}' for rule '{rule}'")]
    UnknownSubtype {
        field: &'static str,
        value: String,
        rule: String,
    },

    /// 캡처 그룹 누락
    #[error("Missing tag '{field}' for rule '{rule}'")]
    MissingTag { field: &'static str, rule: String },
}

impl TransformError {
    /// The tag whose value could not be mapped, if any
    pub fn field(&self) -> Option<&'static str> {
        match self {
            TransformError::UnknownSubtype { field, .. } => Some(*field),
            TransformError::MissingTag { field, .. } => Some(*field),
            TransformError::Rule(_) => None,
        }
    }
}

/// 입력 라인 처리 에러
#[derive(Error, Debug)]
pub enum CollectorError {
    /// 입력 읽기 실패
    #[error("Failed to read input: {0}")]
    Io(#[from] std::io::Error),

    /// 잘못된 값 필드
    #[error("Line {line}: invalid value '{value}'")]
    InvalidValue { line: usize, value: String },

    /// 잘못된 타임스탬프 필드
    #[error("Line {line}: invalid timestamp '{timestamp}'")]
    InvalidTimestamp { line: usize, timestamp: String },

    /// UTF-8이 아닌 라인
    #[error("Line {line}: input is not valid UTF-8")]
    InvalidEncoding { line: usize },

    /// 잘못된 메트릭명
    #[error("Line {line}: invalid metric name '{name}'")]
    InvalidMetricName { line: usize, name: String },

    /// 필드 수가 맞지 않는 라인
    #[error("Line {line}: expected '<name> [<value> [<timestamp>]]', got '{content}'")]
    Malformed { line: usize, content: String },
}

impl CollectorError {
    /// Whether processing can continue with the next line
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, CollectorError::Io(_))
    }
}

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Rule table construction error
    #[error("Rule error: {0}")]
    Rule(#[from] RuleError),

    /// Metric transformation error
    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),

    /// Input error
    #[error("Input error: {0}")]
    Collector(#[from] CollectorError),

    /// Output serialization error
    #[error("Output error: {0}")]
    Output(String),
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_subtype_message() {
        let err = TransformError::UnknownSubtype {
            field: "wt",
            value: "bogus".to_string(),
            rule: "disk".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown wt 'bogus' for rule 'disk'");
        assert_eq!(err.field(), Some("wt"));
    }

    #[test]
    fn test_rule_compile_failed_keeps_source() {
        let source = regex::Regex::new("(").unwrap_err();
        let err = RuleError::RuleCompileFailed {
            index: 3,
            name: "memory".to_string(),
            source: Box::new(RuleError::InvalidPattern {
                pattern: "(".to_string(),
                source,
            }),
        };
        let msg = err.to_string();
        assert!(msg.contains("'memory'"));
        assert!(msg.contains("index 3"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_collector_error_recoverable() {
        let err = CollectorError::InvalidValue {
            line: 1,
            value: "abc".to_string(),
        };
        assert!(err.is_recoverable());

        let err = CollectorError::Io(std::io::Error::other("boom"));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_app_error_from_transform() {
        let err: AppError = TransformError::MissingTag {
            field: "dir",
            rule: "interface".to_string(),
        }
        .into();
        assert!(err.to_string().starts_with("Transform error:"));
    }
}
