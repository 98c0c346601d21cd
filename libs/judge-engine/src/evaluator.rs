/// Test Evaluator - Language-Agnostic Judgement
///
/// **Core Responsibility:**
/// Turn one raw execution outcome into a `TestResult`.
///
/// **Critical Properties:**
/// - Knows nothing about processes or toolchains
/// - Pure function: (outcome, test case, classification table) -> result
///
/// **Decision order:**
/// 1. Harness failure -> `error` / `EXECUTION_EXCEPTION`
/// 2. Timeout -> `timeout` / `EXECUTION_TIMEOUT`, time pinned to the limit
/// 3. Non-zero exit -> `runtime_error`, category from the stderr table
/// 4. Exit zero -> `passed` or `failed` by trimmed exact comparison
///
/// **Normalization Rules:**
/// - Trim leading and trailing whitespace: YES
/// - Internal whitespace and case: preserved, exact match required
use crate::classifier::classify_failure;
use crate::engine::RawExecutionOutcome;
use crate::strategy::ClassificationTable;
use judge_common::types::{ErrorType, TestCase, TestResult, TestStatus};

/// Normalize output string for comparison
fn normalize_output(output: &str) -> &str {
    output.trim()
}

/// Diff-style message for a wrong answer.
pub fn mismatch_message(expected: &str, actual: &str) -> String {
    format!("Expected \"{}\" but got \"{}\"", expected, actual)
}

/// Evaluate a single test case execution.
///
/// `outcome` is `Err` when the harness itself could not spawn or manage
/// the child process; `harness_elapsed_ms` is the time spent before that
/// failure surfaced.
pub fn evaluate_test(
    test_case: &TestCase,
    input_tokens: Vec<String>,
    outcome: Result<RawExecutionOutcome, anyhow::Error>,
    harness_elapsed_ms: u64,
    table: ClassificationTable,
    timeout_ms: u64,
) -> TestResult {
    let expected = normalize_output(&test_case.expected_output).to_string();

    let mut result = TestResult {
        id: test_case.id.clone(),
        input_tokens,
        expected_output: expected.clone(),
        actual_output: None,
        status: TestStatus::Error,
        error_type: None,
        error_message: None,
        execution_time_ms: Some(harness_elapsed_ms),
        is_public: test_case.is_public,
    };

    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(e) => {
            result.error_type = Some(ErrorType::ExecutionException);
            result.error_message = Some(format!("{:#}", e));
            return result;
        }
    };

    if outcome.timed_out {
        result.status = TestStatus::Timeout;
        result.error_type = Some(ErrorType::ExecutionTimeout);
        result.error_message = Some(format!("Execution timed out after {} ms", timeout_ms));
        result.execution_time_ms = Some(timeout_ms);
        return result;
    }

    let actual = normalize_output(&outcome.stdout).to_string();
    result.execution_time_ms = Some(outcome.elapsed_ms);

    if !outcome.succeeded() {
        let classification = classify_failure(&outcome, table);
        result.status = TestStatus::RuntimeError;
        result.error_type = Some(classification.error_type);
        result.error_message = Some(classification.message);
        result.actual_output = Some(actual);
        return result;
    }

    if actual == expected {
        result.status = TestStatus::Passed;
    } else {
        result.status = TestStatus::Failed;
        result.error_message = Some(mismatch_message(&expected, &actual));
    }
    result.actual_output = Some(actual);

    result
}
