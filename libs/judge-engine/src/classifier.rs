/// Error Classifier - maps a failed run's stderr to an error category
///
/// Each language supplies an ordered `(substring, category)` table; the
/// first entry whose substring occurs in stderr decides the category.
/// Nothing matching means `RUNTIME_ERROR`.
use crate::engine::RawExecutionOutcome;
use crate::strategy::ClassificationTable;
use judge_common::types::ErrorType;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub error_type: ErrorType,
    pub message: String,
}

/// First table entry whose substring occurs in `stderr`.
pub fn first_match(stderr: &str, table: ClassificationTable) -> Option<(&'static str, ErrorType)> {
    table
        .iter()
        .find(|(pattern, _)| stderr.contains(pattern))
        .copied()
}

/// Classify a non-zero exit. The message is the stderr line that triggered
/// the match (preferring one that begins with the pattern), or the whole stderr (or exit description) for `RUNTIME_ERROR`.
pub fn classify_failure(outcome: &RawExecutionOutcome, table: ClassificationTable) -> Classification {
    let stderr = outcome.stderr.trim();

    if let Some((pattern, error_type)) = first_match(stderr, table) {
        // Tracebacks echo the offending source line before the exception
        // itself, so a line that starts with the pattern wins.
        let lines = || stderr.lines().map(str::trim);
        let line = lines()
            .find(|line| line.starts_with(pattern))
            .or_else(|| lines().find(|line| line.contains(pattern)))
            .unwrap_or(stderr);
        return Classification {
            error_type,
            message: line.to_string(),
        };
    }

    let message = if stderr.is_empty() {
        outcome.exit_description()
    } else {
        stderr.to_string()
    };

    Classification {
        error_type: ErrorType::RuntimeError,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::languages::{JavaScript, Python};
    use crate::strategy::LanguageStrategy;

    const TABLE: ClassificationTable = &[
        ("RangeError", ErrorType::RangeError),
        ("TypeError", ErrorType::TypeError),
        ("ReferenceError", ErrorType::ReferenceError),
        ("SyntaxError", ErrorType::SyntaxError),
    ];

    fn failed(stderr: &str, exit_code: Option<i32>) -> RawExecutionOutcome {
        RawExecutionOutcome {
            stdout: String::new(),
            stderr: stderr.to_string(),
            exit_code,
            signal: None,
            elapsed_ms: 12,
            timed_out: false,
        }
    }

    #[test]
    fn test_first_match_wins() {
        // Both signals present: the earlier table entry decides
        let stderr = "TypeError: x is not a function\nRangeError: Maximum call stack size exceeded";
        assert_eq!(first_match(stderr, TABLE), Some(("RangeError", ErrorType::RangeError)));
    }

    #[test]
    fn test_each_category() {
        let kind = |stderr: &str| first_match(stderr, TABLE).map(|(_, error_type)| error_type);
        assert_eq!(kind("ReferenceError: foo is not defined"), Some(ErrorType::ReferenceError));
        assert_eq!(kind("SyntaxError: Unexpected token"), Some(ErrorType::SyntaxError));
        assert_eq!(kind("Error: boom"), None);
    }

    #[test]
    fn test_message_is_matching_line() {
        let outcome = failed(
            "/tmp/judge-x/solution.js:3\n    foo();\n    ^\n\nReferenceError: foo is not defined\n    at Object.<anonymous>",
            Some(1),
        );
        let classification = classify_failure(&outcome, TABLE);
        assert_eq!(classification.error_type, ErrorType::ReferenceError);
        assert_eq!(classification.message, "ReferenceError: foo is not defined");
    }

    #[test]
    fn test_python_traceback_reports_exception_line() {
        let outcome = failed(
            "Traceback (most recent call last):\n  File \"/tmp/judge-x/solution.py\", line 3, in <module>\n    raise TypeError(\"bad\")\nTypeError: bad\n",
            Some(1),
        );
        let classification = classify_failure(&outcome, Python.classification_table());
        assert_eq!(classification.error_type, ErrorType::TypeError);
        assert_eq!(classification.message, "TypeError: bad");
    }

    #[test]
    fn test_node_uncaught_error_reports_exception_line() {
        let outcome = failed(
            "/tmp/judge-x/solution.js:2\nthrow new RangeError(\"x\");\n^\n\nRangeError: x\n    at Object.<anonymous> (/tmp/judge-x/solution.js:2:7)\n\nNode.js v20.11.0\n",
            Some(1),
        );
        let classification = classify_failure(&outcome, JavaScript.classification_table());
        assert_eq!(classification.error_type, ErrorType::RangeError);
        assert_eq!(classification.message, "RangeError: x");
    }

    #[test]
    fn test_pattern_inside_line_still_reported() {
        let outcome = failed("[Process killed by signal 11: segmentation fault]", None);
        let table: ClassificationTable = &[("segmentation fault", ErrorType::RuntimeError)];
        let classification = classify_failure(&outcome, table);
        assert_eq!(classification.message, "[Process killed by signal 11: segmentation fault]");
    }

    #[test]
    fn test_unmatched_uses_raw_stderr() {
        let outcome = failed("  Error: custom failure\n", Some(1));
        let classification = classify_failure(&outcome, TABLE);
        assert_eq!(classification.error_type, ErrorType::RuntimeError);
        assert_eq!(classification.message, "Error: custom failure");
    }

    #[test]
    fn test_empty_stderr_uses_exit_code() {
        let classification = classify_failure(&failed("", Some(3)), TABLE);
        assert_eq!(classification.error_type, ErrorType::RuntimeError);
        assert_eq!(classification.message, "Process exited with code 3");
    }
}
