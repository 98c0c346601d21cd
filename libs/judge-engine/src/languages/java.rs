use crate::strategy::{Artifact, ClassificationTable, CommandSpec, LanguageStrategy};
use judge_common::types::{ErrorType, Language};
use std::path::Path;

const JAVA_ERRORS: ClassificationTable = &[
    ("IndexOutOfBoundsException", ErrorType::RangeError),
    ("NegativeArraySizeException", ErrorType::RangeError),
    ("StackOverflowError", ErrorType::RangeError),
    ("ClassCastException", ErrorType::TypeError),
    ("ArrayStoreException", ErrorType::TypeError),
    ("NullPointerException", ErrorType::ReferenceError),
    ("NumberFormatException", ErrorType::SyntaxError),
    ("InputMismatchException", ErrorType::SyntaxError),
];

const JAVAC_DIAGNOSTIC: &str = r"\.java:\d+: (error|warning):";

/// The JVM prints "Picked up JAVA_TOOL_OPTIONS" to stderr when it is set.
const NOISY_ENV: &str = "JAVA_TOOL_OPTIONS";

pub struct Java;

impl LanguageStrategy for Java {
    fn language(&self) -> Language {
        Language::Java
    }

    /// The public class must be `Main`.
    fn source_file_name(&self) -> &'static str {
        "Main.java"
    }

    fn build_command(&self, workspace: &Path, source: &Path) -> Option<CommandSpec> {
        Some(
            CommandSpec::new("javac")
                .args(["-encoding", "UTF-8"])
                .arg("-d")
                .path_arg(&workspace.join("classes"))
                .path_arg(source)
                .env_remove(NOISY_ENV),
        )
    }

    fn artifact(&self, workspace: &Path, _source: &Path) -> Artifact {
        Artifact::ClassPath {
            dir: workspace.join("classes"),
            main_class: "Main".to_string(),
        }
    }

    fn run_command(&self, artifact: &Artifact, args: &[String]) -> CommandSpec {
        let main_class = match artifact {
            Artifact::ClassPath { main_class, .. } => main_class.as_str(),
            _ => "Main",
        };
        CommandSpec::new("java")
            .arg("-cp")
            .path_arg(artifact.path())
            .arg(main_class)
            .args(args.iter().cloned())
            .env_remove(NOISY_ENV)
    }

    fn diagnostic_pattern(&self) -> Option<&'static str> {
        Some(JAVAC_DIAGNOSTIC)
    }

    fn classification_table(&self) -> ClassificationTable {
        JAVA_ERRORS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::first_match;
    use crate::engine::filter_diagnostics;

    #[test]
    fn test_build_and_run_commands() {
        let ws = Path::new("/ws");
        let source = ws.join("Main.java");

        let build = Java.build_command(ws, &source).unwrap();
        assert_eq!(build.program, "javac");
        assert_eq!(build.env_remove, vec![NOISY_ENV]);

        let artifact = Java.artifact(ws, &source);
        let run = Java.run_command(&artifact, &["3".to_string()]);
        assert_eq!(run.args, vec!["-cp", "/ws/classes", "Main", "3"]);
    }

    #[test]
    fn test_javac_diagnostics() {
        let output = "/ws/Main.java:3: error: ';' expected\n        System.out.println(\"x\")\n                                ^\n1 error\n";
        assert_eq!(
            filter_diagnostics(output, JAVAC_DIAGNOSTIC).unwrap(),
            "/ws/Main.java:3: error: ';' expected"
        );
    }

    #[test]
    fn test_exception_classification() {
        let npe = "Exception in thread \"main\" java.lang.NullPointerException\n\tat Main.main(Main.java:4)";
        assert_eq!(first_match(npe, JAVA_ERRORS).map(|m| m.1), Some(ErrorType::ReferenceError));

        let oob = "Exception in thread \"main\" java.lang.ArrayIndexOutOfBoundsException: Index 5 out of bounds for length 3";
        assert_eq!(first_match(oob, JAVA_ERRORS).map(|m| m.1), Some(ErrorType::RangeError));

        let parse = "Exception in thread \"main\" java.lang.NumberFormatException: For input string: \"x\"";
        assert_eq!(first_match(parse, JAVA_ERRORS).map(|m| m.1), Some(ErrorType::SyntaxError));
    }
}
