use crate::strategy::{Artifact, ClassificationTable, CommandSpec, LanguageStrategy};
use judge_common::types::{ErrorType, Language};
use std::path::Path;

/// Node's built-in error constructors, in classification priority order.
const NODE_ERRORS: ClassificationTable = &[
    ("RangeError", ErrorType::RangeError),
    ("TypeError", ErrorType::TypeError),
    ("ReferenceError", ErrorType::ReferenceError),
    ("SyntaxError", ErrorType::SyntaxError),
];

const TSC_DIAGNOSTIC: &str = r"\b(error|warning) TS\d+:";

fn node_command(script: &Path, args: &[String]) -> CommandSpec {
    CommandSpec::new("node")
        .path_arg(script)
        .args(args.iter().cloned())
}

pub struct JavaScript;

impl LanguageStrategy for JavaScript {
    fn language(&self) -> Language {
        Language::JavaScript
    }

    fn source_file_name(&self) -> &'static str {
        "solution.js"
    }

    fn build_command(&self, _workspace: &Path, _source: &Path) -> Option<CommandSpec> {
        None
    }

    fn artifact(&self, _workspace: &Path, source: &Path) -> Artifact {
        Artifact::Source(source.to_path_buf())
    }

    fn run_command(&self, artifact: &Artifact, args: &[String]) -> CommandSpec {
        node_command(artifact.path(), args)
    }

    fn classification_table(&self) -> ClassificationTable {
        NODE_ERRORS
    }
}

/// TypeScript is type-checked and transpiled by `tsc`, then run on node.
pub struct TypeScript;

impl LanguageStrategy for TypeScript {
    fn language(&self) -> Language {
        Language::TypeScript
    }

    fn source_file_name(&self) -> &'static str {
        "solution.ts"
    }

    fn build_command(&self, workspace: &Path, source: &Path) -> Option<CommandSpec> {
        Some(
            CommandSpec::new("tsc")
                .args(["--pretty", "false"])
                .args(["--target", "ES2020"])
                .args(["--module", "commonjs"])
                .arg("--skipLibCheck")
                .arg("--outDir")
                .path_arg(&workspace.join("out"))
                .path_arg(source),
        )
    }

    fn artifact(&self, workspace: &Path, _source: &Path) -> Artifact {
        Artifact::Script(workspace.join("out").join("solution.js"))
    }

    fn run_command(&self, artifact: &Artifact, args: &[String]) -> CommandSpec {
        node_command(artifact.path(), args)
    }

    fn diagnostic_pattern(&self) -> Option<&'static str> {
        Some(TSC_DIAGNOSTIC)
    }

    fn classification_table(&self) -> ClassificationTable {
        NODE_ERRORS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::filter_diagnostics;

    #[test]
    fn test_javascript_runs_source_directly() {
        let ws = Path::new("/ws");
        let source = ws.join("solution.js");
        assert!(JavaScript.build_command(ws, &source).is_none());

        let artifact = JavaScript.artifact(ws, &source);
        let spec = JavaScript.run_command(&artifact, &["1".to_string(), "2".to_string()]);
        assert_eq!(spec.program, "node");
        assert_eq!(spec.args, vec!["/ws/solution.js", "1", "2"]);
    }

    #[test]
    fn test_typescript_build_and_run() {
        let ws = Path::new("/ws");
        let source = ws.join("solution.ts");

        let build = TypeScript.build_command(ws, &source).unwrap();
        assert_eq!(build.program, "tsc");
        assert!(build.args.contains(&"/ws/out".to_string()));
        assert_eq!(build.args.last().map(String::as_str), Some("/ws/solution.ts"));

        let artifact = TypeScript.artifact(ws, &source);
        assert_eq!(artifact, Artifact::Script(ws.join("out/solution.js")));
        let spec = TypeScript.run_command(&artifact, &[]);
        assert_eq!(spec.args, vec!["/ws/out/solution.js"]);
    }

    #[test]
    fn test_tsc_diagnostics_filtered() {
        let output = "solution.ts(2,7): error TS2322: Type 'string' is not assignable to type 'number'.\n\
                      Found 1 error in solution.ts:2\n";
        let message = filter_diagnostics(output, TSC_DIAGNOSTIC).unwrap();
        assert_eq!(
            message,
            "solution.ts(2,7): error TS2322: Type 'string' is not assignable to type 'number'."
        );
    }
}
