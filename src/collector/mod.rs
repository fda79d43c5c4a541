//! 메트릭 입력 수집 모듈
//!
//! 파일 또는 stdin에서 Graphite plaintext 라인을 읽어 샘플로 변환합니다.
//!
//! # Example
//!
//! ```ignore
//! use collectd_tagger::collector::LineReader;
//!
//! let reader = LineReader::new(std::io::stdin().lock());
//! for sample in reader {
//!     let sample = sample?;
//!     println!("{}", sample.name);
//! }
//! ```

mod parser;

pub use parser::{parse_line, CollectResult, Sample};

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::CollectorError;

/// 입력 소스 - `-`는 stdin
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// 표준 입력
    Stdin,
    /// 파일 경로
    File(std::path::PathBuf),
}

impl InputSource {
    /// 경로 인자로부터 입력 소스 생성
    pub fn from_arg(arg: &Path) -> Self {
        if arg.as_os_str() == "-" {
            InputSource::Stdin
        } else {
            InputSource::File(arg.to_path_buf())
        }
    }

    /// 버퍼링된 리더 열기
    pub fn open(&self) -> CollectResult<Box<dyn BufRead>> {
        match self {
            InputSource::Stdin => Ok(Box::new(BufReader::new(std::io::stdin()))),
            InputSource::File(path) => {
                let file = File::open(path)?;
                Ok(Box::new(BufReader::new(file)))
            }
        }
    }
}

impl std::fmt::Display for InputSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputSource::Stdin => write!(f, "<stdin>"),
            InputSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// 라인 단위 샘플 리더
///
/// 빈 줄과 주석은 건너뜁니다. 파싱 에러와 UTF-8 디코딩 에러는 해당 라인에
/// 대해서만 반환되며 이후 라인은 계속 읽을 수 있습니다.
pub struct LineReader<R> {
    inner: R,
    line_no: usize,
    buf: Vec<u8>,
}

impl<R: BufRead> LineReader<R> {
    /// 새 LineReader 생성
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            line_no: 0,
            buf: Vec::new(),
        }
    }

    /// 마지막으로 읽은 라인 번호
    pub fn line_no(&self) -> usize {
        self.line_no
    }
}

impl<R: BufRead> Iterator for LineReader<R> {
    type Item = Result<Sample, CollectorError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.inner.read_until(b'\n', &mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {
                    self.line_no += 1;
                    // Decoded per line so one corrupt line does not end the stream
                    let Ok(raw) = std::str::from_utf8(&self.buf) else {
                        return Some(Err(CollectorError::InvalidEncoding {
                            line: self.line_no,
                        }));
                    };
                    match parse_line(self.line_no, raw) {
                        Ok(Some(sample)) => return Some(Ok(sample)),
                        Ok(None) => continue,
                        Err(e) => return Some(Err(e)),
                    }
                }
                Err(e) => return Some(Err(CollectorError::Io(e))),
            }
        }
    }
}
