/// Judge Executor - High-Level Orchestration
///
/// **Responsibility:**
/// Drive one invocation through Workspace -> Build -> (Run -> Evaluate)*
/// and aggregate everything into a single `Verdict`.
///
/// This module is the glue layer - it knows nothing about:
/// - How processes are spawned and timed (engine's job)
/// - How outputs are compared and classified (evaluator's job)
/// - How a particular toolchain is invoked (the language strategy's job)
///
/// Per-test failures stay local to their `TestResult`; only build failures
/// and system-level failures end the invocation early.
use crate::engine::{self, BuildOutcome};
use crate::evaluator::evaluate_test;
use crate::input::tokenize_input;
use crate::languages::LanguageRegistry;
use crate::strategy::{Artifact, LanguageStrategy};
use crate::workspace::Workspace;
use futures_util::stream::{self, StreamExt};
use judge_common::config::JudgeConfig;
use judge_common::types::{ExecutionRequest, Language, TestCase, TestResult, TestStatus, Verdict};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Safety limits to prevent pathological inputs from reaching a toolchain
pub const MAX_SOURCE_CODE_BYTES: usize = 1024 * 1024; // 1MB
pub const MAX_TEST_INPUT_BYTES: usize = 10 * 1024 * 1024; // 10MB

pub struct Judge {
    config: JudgeConfig,
    registry: LanguageRegistry,
    pinned_language: Option<Language>,
}

impl Judge {
    pub fn new(config: JudgeConfig, registry: LanguageRegistry) -> Self {
        Self {
            config,
            registry,
            pinned_language: None,
        }
    }

    /// Serve only `language`; requests for anything else are rejected.
    pub fn pinned_to(mut self, language: Language) -> Self {
        self.pinned_language = Some(language);
        self
    }

    /// Parse a raw request document and judge it.
    pub async fn judge_json(&self, input: &str) -> Verdict {
        match serde_json::from_str::<ExecutionRequest>(input) {
            Ok(request) => self.judge(&request).await,
            Err(e) => {
                warn!(error = %e, "Rejected malformed request");
                Verdict::system_error_with_detail("Invalid JSON input", e.to_string())
            }
        }
    }

    pub async fn judge(&self, request: &ExecutionRequest) -> Verdict {
        let invocation_id = Uuid::new_v4();
        let span = info_span!(
            "judge",
            invocation_id = %invocation_id,
            language = %request.language,
            test_cases = request.test_cases.len()
        );

        async {
            let start = Instant::now();
            let verdict = self.judge_inner(request).await;

            info!(
                status = verdict.status(),
                total_ms = start.elapsed().as_millis() as u64,
                "Invocation finished"
            );
            verdict
        }
        .instrument(span)
        .await
    }

    async fn judge_inner(&self, request: &ExecutionRequest) -> Verdict {
        if let Some(rejection) = check_limits(request) {
            warn!(reason = %rejection, "Request rejected before execution");
            return Verdict::system_error(rejection);
        }

        let strategy = match self.registry.resolve(&request.language) {
            Ok(strategy) => strategy,
            Err(e) => {
                warn!("{}", e);
                return Verdict::system_error(e.to_string());
            }
        };

        if let Some(pinned) = self.pinned_language {
            if pinned != strategy.language() {
                warn!(pinned = %pinned, requested = %strategy.language(), "Language mismatch");
                return Verdict::system_error(format!(
                    "Language mismatch: this judge runs {} but the request is {}",
                    pinned,
                    strategy.language()
                ));
            }
        }

        let mut workspace = match Workspace::create(self.config.workspace_root.as_deref()) {
            Ok(workspace) => workspace,
            Err(e) => {
                error!(error = %format!("{:#}", e), "Workspace creation failed");
                return Verdict::system_error_with_detail("Failed to prepare workspace", format!("{:#}", e));
            }
        };

        let verdict = self.run_in_workspace(strategy, request, &workspace).await;

        if self.config.keep_workspace {
            workspace.retain();
        }

        verdict
    }

    async fn run_in_workspace(
        &self,
        strategy: &dyn LanguageStrategy,
        request: &ExecutionRequest,
        workspace: &Workspace,
    ) -> Verdict {
        let source = match workspace.write_source(strategy.source_file_name(), &request.code) {
            Ok(source) => source,
            Err(e) => {
                error!(error = %format!("{:#}", e), "Failed to materialize source");
                return Verdict::system_error_with_detail("Failed to prepare workspace", format!("{:#}", e));
            }
        };

        let artifact = match engine::build(strategy, workspace, &source, &self.config).await {
            Ok(BuildOutcome::Built(artifact)) => artifact,
            Ok(BuildOutcome::Failed(failure)) => {
                info!("Compilation failed, skipping all test cases");
                return Verdict::compile_error(failure.message, failure.full_error);
            }
            Err(e) => {
                error!(error = %format!("{:#}", e), "Build stage could not run");
                return Verdict::system_error_with_detail("Build toolchain failed to run", format!("{:#}", e));
            }
        };

        let test_results = self
            .run_test_cases(strategy, &artifact, workspace.path(), &request.test_cases)
            .await;

        log_summary(&test_results);

        Verdict::Completed { test_results }
    }

    /// Execute every test case, at most `max_parallel_tests` at a time.
    /// Results come back in input order regardless of completion order.
    async fn run_test_cases(
        &self,
        strategy: &dyn LanguageStrategy,
        artifact: &Artifact,
        workspace: &Path,
        test_cases: &[TestCase],
    ) -> Vec<TestResult> {
        info!(
            count = test_cases.len(),
            timeout_ms = self.config.timeout_ms,
            parallelism = self.config.max_parallel_tests,
            "Executing test cases"
        );

        stream::iter(0..test_cases.len())
            .map(|index| self.run_test_case(strategy, artifact, workspace, index, &test_cases[index]))
            .buffered(self.config.max_parallel_tests)
            .collect()
            .await
    }

    async fn run_test_case(
        &self,
        strategy: &dyn LanguageStrategy,
        artifact: &Artifact,
        workspace: &Path,
        index: usize,
        test_case: &TestCase,
    ) -> TestResult {
        let tokens = tokenize_input(test_case.input.as_deref());
        let start = Instant::now();

        let outcome = engine::run_artifact(strategy, artifact, &tokens, workspace, &self.config).await;
        if let Err(e) = &outcome {
            error!(test_index = index, error = %format!("{:#}", e), "Harness failed to run test case");
        }

        let result = evaluate_test(
            test_case,
            tokens,
            outcome,
            start.elapsed().as_millis() as u64,
            strategy.classification_table(),
            self.config.timeout_ms,
        );

        debug!(
            test_index = index,
            status = ?result.status,
            execution_time_ms = ?result.execution_time_ms,
            "Test result"
        );

        result
    }
}

fn check_limits(request: &ExecutionRequest) -> Option<String> {
    if request.code.len() > MAX_SOURCE_CODE_BYTES {
        return Some(format!(
            "Source code exceeds maximum size of {} bytes",
            MAX_SOURCE_CODE_BYTES
        ));
    }

    request
        .test_cases
        .iter()
        .position(|tc| tc.input.as_ref().map_or(0, String::len) > MAX_TEST_INPUT_BYTES)
        .map(|index| {
            format!(
                "Test case {} input exceeds maximum size of {} bytes",
                index, MAX_TEST_INPUT_BYTES
            )
        })
}

fn log_summary(results: &[TestResult]) {
    let count = |status: TestStatus| results.iter().filter(|r| r.status == status).count();
    info!(
        total = results.len(),
        passed = count(TestStatus::Passed),
        failed = count(TestStatus::Failed),
        runtime_errors = count(TestStatus::RuntimeError),
        timeouts = count(TestStatus::Timeout),
        errors = count(TestStatus::Error),
        "Evaluation complete"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use judge_common::types::ErrorType;

    fn judge() -> Judge {
        Judge::new(JudgeConfig::default(), LanguageRegistry::with_defaults())
    }

    fn request(language: &str, code: String) -> ExecutionRequest {
        ExecutionRequest {
            code,
            language: language.to_string(),
            test_cases: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_invalid_json() {
        let verdict = judge().judge_json("{not json").await;

        assert_eq!(verdict.status(), "error");
        assert!(verdict.test_results().is_none());
        let error = verdict.error().unwrap();
        assert_eq!(error.error_type, ErrorType::SystemError);
        assert_eq!(error.error_message, "Invalid JSON input");
    }

    #[tokio::test]
    async fn test_missing_required_field_is_invalid_json() {
        let verdict = judge().judge_json(r#"{"language": "python", "testCases": []}"#).await;
        assert_eq!(verdict.error().unwrap().error_message, "Invalid JSON input");
    }

    #[tokio::test]
    async fn test_unsupported_language() {
        let verdict = judge().judge(&request("cobol", String::new())).await;
        let error = verdict.error().unwrap();
        assert_eq!(error.error_type, ErrorType::SystemError);
        assert_eq!(error.error_message, "Unsupported language: cobol");
    }

    #[tokio::test]
    async fn test_pinned_language_mismatch() {
        let judge = judge().pinned_to(Language::TypeScript);
        let verdict = judge.judge(&request("python", "print(1)".into())).await;
        assert_eq!(verdict.status(), "error");
        assert!(verdict.error().unwrap().error_message.starts_with("Language mismatch"));
    }

    #[tokio::test]
    async fn test_oversized_source_rejected() {
        let code = "x".repeat(MAX_SOURCE_CODE_BYTES + 1);
        let verdict = judge().judge(&request("python", code)).await;
        assert_eq!(verdict.status(), "error");
        assert!(verdict.error().unwrap().error_message.contains("maximum size"));
    }

    #[test]
    fn test_check_limits_flags_input() {
        let mut req = request("python", String::new());
        req.test_cases.push(TestCase {
            id: serde_json::Value::Null,
            input: Some("1".repeat(MAX_TEST_INPUT_BYTES + 1)),
            expected_output: String::new(),
            is_public: false,
        });
        assert!(check_limits(&req).unwrap().starts_with("Test case 0 input"));
        assert!(check_limits(&request("python", "print(1)".into())).is_none());
    }
}
