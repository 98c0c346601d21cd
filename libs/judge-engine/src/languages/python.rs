use crate::strategy::{Artifact, ClassificationTable, CommandSpec, LanguageStrategy};
use judge_common::types::{ErrorType, Language};
use std::path::Path;

/// CPython exception names; `ValueError: invalid literal` is what a failed
/// `int()`/`float()` parse of an argument looks like.
const PYTHON_ERRORS: ClassificationTable = &[
    ("IndexError", ErrorType::RangeError),
    ("OverflowError", ErrorType::RangeError),
    ("RecursionError", ErrorType::RangeError),
    ("TypeError", ErrorType::TypeError),
    ("NameError", ErrorType::ReferenceError),
    ("UnboundLocalError", ErrorType::ReferenceError),
    ("AttributeError", ErrorType::ReferenceError),
    ("SyntaxError", ErrorType::SyntaxError),
    ("IndentationError", ErrorType::SyntaxError),
    ("ValueError: invalid literal", ErrorType::SyntaxError),
];

pub struct Python;

impl LanguageStrategy for Python {
    fn language(&self) -> Language {
        Language::Python
    }

    fn source_file_name(&self) -> &'static str {
        "solution.py"
    }

    fn build_command(&self, _workspace: &Path, _source: &Path) -> Option<CommandSpec> {
        None
    }

    fn artifact(&self, _workspace: &Path, source: &Path) -> Artifact {
        Artifact::Source(source.to_path_buf())
    }

    fn run_command(&self, artifact: &Artifact, args: &[String]) -> CommandSpec {
        CommandSpec::new("python3")
            .arg("-u")
            .path_arg(artifact.path())
            .args(args.iter().cloned())
            .env("PYTHONDONTWRITEBYTECODE", "1")
    }

    fn classification_table(&self) -> ClassificationTable {
        PYTHON_ERRORS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::first_match;

    #[test]
    fn test_run_command() {
        let artifact = Python.artifact(Path::new("/ws"), Path::new("/ws/solution.py"));
        let spec = Python.run_command(&artifact, &["7".to_string()]);
        assert_eq!(spec.program, "python3");
        assert_eq!(spec.args, vec!["-u", "/ws/solution.py", "7"]);
    }

    #[test]
    fn test_traceback_classification() {
        let traceback = "Traceback (most recent call last):\n  File \"/ws/solution.py\", line 3, in <module>\n    print(xs[10])\nIndexError: list index out of range";
        assert_eq!(first_match(traceback, PYTHON_ERRORS).map(|m| m.1), Some(ErrorType::RangeError));

        let parse = "ValueError: invalid literal for int() with base 10: 'abc'";
        assert_eq!(first_match(parse, PYTHON_ERRORS).map(|m| m.1), Some(ErrorType::SyntaxError));

        let name = "NameError: name 'undefined_var' is not defined";
        assert_eq!(first_match(name, PYTHON_ERRORS).map(|m| m.1), Some(ErrorType::ReferenceError));
    }
}
