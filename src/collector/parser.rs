//! Graphite plaintext 라인 파서
//!
//! `<metric_name> [<value> [<timestamp>]]` 형식의 라인을 파싱합니다.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::CollectorError;

/// Collector 작업 결과 타입
pub type CollectResult<T> = Result<T, CollectorError>;

static LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<name>\S+)(?:\s+(?P<value>\S+))?(?:\s+(?P<timestamp>\S+))?$")
        .expect("invalid line regex")
});

/// 입력 한 줄에서 읽은 샘플
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// 입력 라인 번호 (1부터 시작)
    pub line: usize,
    /// 점으로 구분된 메트릭명
    pub name: String,
    /// 샘플 값
    pub value: Option<f64>,
    /// 타임스탬프 (Unix epoch 초)
    pub timestamp: Option<i64>,
}

/// 라인 하나를 파싱
///
/// 빈 줄과 `#` 주석은 `Ok(None)`을 반환합니다.
pub fn parse_line(line_no: usize, raw: &str) -> CollectResult<Option<Sample>> {
    let line = raw.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let caps = LINE_RE
        .captures(line)
        .ok_or_else(|| CollectorError::Malformed {
            line: line_no,
            content: line.to_string(),
        })?;

    // Regex guarantees the name group on a match
    let name = caps.name("name").map(|m| m.as_str()).unwrap_or_default();
    if name.starts_with('.') || name.ends_with('.') || name.contains("..") {
        return Err(CollectorError::InvalidMetricName {
            line: line_no,
            name: name.to_string(),
        });
    }

    let value = caps
        .name("value")
        .map(|m| parse_value(line_no, m.as_str()))
        .transpose()?;

    let timestamp = caps
        .name("timestamp")
        .map(|m| parse_timestamp(line_no, m.as_str()))
        .transpose()?;

    Ok(Some(Sample {
        line: line_no,
        name: name.to_string(),
        value,
        timestamp,
    }))
}

fn parse_value(line_no: usize, raw: &str) -> CollectResult<f64> {
    raw.parse::<f64>().map_err(|_| CollectorError::InvalidValue {
        line: line_no,
        value: raw.to_string(),
    })
}

/// 정수 또는 소수 형태의 타임스탬프 허용
fn parse_timestamp(line_no: usize, raw: &str) -> CollectResult<i64> {
    if let Ok(ts) = raw.parse::<i64>() {
        return Ok(ts);
    }

    match raw.parse::<f64>() {
        Ok(ts) if ts.is_finite() => Ok(ts.trunc() as i64),
        _ => Err(CollectorError::InvalidTimestamp {
            line: line_no,
            timestamp: raw.to_string(),
        }),
    }
}
