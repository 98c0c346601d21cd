use crate::strategy::{Artifact, ClassificationTable, CommandSpec, LanguageStrategy};
use judge_common::types::{ErrorType, Language};
use std::path::Path;

const GO_ERRORS: ClassificationTable = &[
    ("index out of range", ErrorType::RangeError),
    ("slice bounds out of range", ErrorType::RangeError),
    ("stack overflow", ErrorType::RangeError),
    ("integer divide by zero", ErrorType::RangeError),
    ("interface conversion", ErrorType::TypeError),
    ("nil pointer dereference", ErrorType::ReferenceError),
    ("nil map", ErrorType::ReferenceError),
    ("invalid syntax", ErrorType::SyntaxError),
    ("strconv.", ErrorType::SyntaxError),
];

const GO_DIAGNOSTIC: &str = r"\.go:\d+:\d+: ";

pub struct Go;

impl LanguageStrategy for Go {
    fn language(&self) -> Language {
        Language::Go
    }

    fn source_file_name(&self) -> &'static str {
        "main.go"
    }

    /// Single-file build; caches stay inside the workspace so concurrent
    /// judges never share a writable directory.
    fn build_command(&self, workspace: &Path, source: &Path) -> Option<CommandSpec> {
        Some(
            CommandSpec::new("go")
                .args(["build", "-o"])
                .path_arg(&workspace.join("main"))
                .path_arg(source)
                .env("GOCACHE", workspace.join(".gocache").to_string_lossy())
                .env("GOPATH", workspace.join(".gopath").to_string_lossy())
                .env("GO111MODULE", "off"),
        )
    }

    fn artifact(&self, workspace: &Path, _source: &Path) -> Artifact {
        Artifact::Executable(workspace.join("main"))
    }

    fn run_command(&self, artifact: &Artifact, args: &[String]) -> CommandSpec {
        CommandSpec::new(artifact.path().to_string_lossy())
            .args(args.iter().cloned())
    }

    fn diagnostic_pattern(&self) -> Option<&'static str> {
        Some(GO_DIAGNOSTIC)
    }

    fn classification_table(&self) -> ClassificationTable {
        GO_ERRORS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::first_match;
    use crate::engine::filter_diagnostics;

    #[test]
    fn test_build_uses_workspace_caches() {
        let ws = Path::new("/ws");
        let build = Go.build_command(ws, &ws.join("main.go")).unwrap();
        assert!(build.env.contains(&("GOCACHE".to_string(), "/ws/.gocache".to_string())));
        assert_eq!(build.args, vec!["build", "-o", "/ws/main", "/ws/main.go"]);
    }

    #[test]
    fn test_go_diagnostics() {
        let output = "# command-line-arguments\n/ws/main.go:5:2: undefined: fmt.Printn\n";
        assert_eq!(
            filter_diagnostics(output, GO_DIAGNOSTIC).unwrap(),
            "/ws/main.go:5:2: undefined: fmt.Printn"
        );
    }

    #[test]
    fn test_panic_classification() {
        let panic = "panic: runtime error: invalid memory address or nil pointer dereference";
        assert_eq!(first_match(panic, GO_ERRORS).map(|m| m.1), Some(ErrorType::ReferenceError));

        let range = "panic: runtime error: index out of range [5] with length 3";
        assert_eq!(first_match(range, GO_ERRORS).map(|m| m.1), Some(ErrorType::RangeError));
    }
}
