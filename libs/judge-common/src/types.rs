use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Languages the judge knows how to build and run.
///
/// Parsing is case-insensitive and accepts the usual short aliases
/// (`js`, `ts`, `py`, `c++`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    JavaScript,
    TypeScript,
    Python,
    Java,
    C,
    Cpp,
    Go,
    Rust,
}

impl Language {
    pub const ALL: [Language; 8] = [
        Language::JavaScript,
        Language::TypeScript,
        Language::Python,
        Language::Java,
        Language::C,
        Language::Cpp,
        Language::Go,
        Language::Rust,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Python => "python",
            Language::Java => "java",
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::Go => "go",
            Language::Rust => "rust",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedLanguage(pub String);

impl fmt::Display for UnsupportedLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unsupported language: {}", self.0)
    }
}

impl std::error::Error for UnsupportedLanguage {}

impl FromStr for Language {
    type Err = UnsupportedLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "javascript" | "js" | "node" => Ok(Language::JavaScript),
            "typescript" | "ts" => Ok(Language::TypeScript),
            "python" | "py" | "python3" => Ok(Language::Python),
            "java" => Ok(Language::Java),
            "c" => Ok(Language::C),
            "cpp" | "c++" | "cxx" => Ok(Language::Cpp),
            "go" | "golang" => Ok(Language::Go),
            "rust" | "rs" => Ok(Language::Rust),
            _ => Err(UnsupportedLanguage(s.to_string())),
        }
    }
}

/// One judge invocation's input, read from stdin.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRequest {
    pub code: String,
    pub language: String,
    #[serde(default)]
    pub test_cases: Vec<TestCase>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    /// Opaque to the judge; echoed back on the matching result.
    #[serde(default)]
    pub id: serde_json::Value,
    #[serde(default)]
    pub input: Option<String>,
    #[serde(default)]
    pub expected_output: String,
    #[serde(default)]
    pub is_public: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    Passed,
    Failed,
    RuntimeError,
    Timeout,
    Error,
}

/// Flat error taxonomy shared by test results and verdicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorType {
    CompilationFailed,
    RangeError,
    TypeError,
    ReferenceError,
    SyntaxError,
    RuntimeError,
    ExecutionTimeout,
    ExecutionException,
    SystemError,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub id: serde_json::Value,
    pub input_tokens: Vec<String>,
    pub expected_output: String,
    pub actual_output: Option<String>,
    pub status: TestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<ErrorType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// `None` only when the test never reached the execution stage.
    pub execution_time_ms: Option<u64>,
    pub is_public: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerdictError {
    pub error_type: ErrorType,
    pub error_message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_error: Option<String>,
}

/// Final result of one invocation, written to stdout.
///
/// The variants carry exactly the fields their status allows: only a
/// completed run has test results, only the failure variants have an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Verdict {
    Completed {
        #[serde(rename = "testResults")]
        test_results: Vec<TestResult>,
    },
    CompileError {
        error: VerdictError,
    },
    Error {
        error: VerdictError,
    },
}

impl Verdict {
    pub fn compile_error(message: impl Into<String>, full_error: impl Into<String>) -> Self {
        Verdict::CompileError {
            error: VerdictError {
                error_type: ErrorType::CompilationFailed,
                error_message: message.into(),
                full_error: Some(full_error.into()),
            },
        }
    }

    pub fn system_error(message: impl Into<String>) -> Self {
        Verdict::Error {
            error: VerdictError {
                error_type: ErrorType::SystemError,
                error_message: message.into(),
                full_error: None,
            },
        }
    }

    pub fn system_error_with_detail(message: impl Into<String>, detail: impl Into<String>) -> Self {
        Verdict::Error {
            error: VerdictError {
                error_type: ErrorType::SystemError,
                error_message: message.into(),
                full_error: Some(detail.into()),
            },
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            Verdict::Completed { .. } => "completed",
            Verdict::CompileError { .. } => "compile_error",
            Verdict::Error { .. } => "error",
        }
    }

    pub fn test_results(&self) -> Option<&[TestResult]> {
        match self {
            Verdict::Completed { test_results } => Some(test_results),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&VerdictError> {
        match self {
            Verdict::Completed { .. } => None,
            Verdict::CompileError { error } | Verdict::Error { error } => Some(error),
        }
    }
}
