use crate::strategy::{Artifact, ClassificationTable, CommandSpec, LanguageStrategy};
use judge_common::types::{ErrorType, Language};
use std::path::Path;

/// gcc/g++ diagnostic lines: `file:line:col: error: ...`
const GCC_DIAGNOSTIC: &str = r":\d+:\d+: (fatal )?(error|warning):";

/// rustc headline lines: `error[E0308]: mismatched types`
const RUSTC_DIAGNOSTIC: &str = r"^(error|warning)(\[E\d+\])?:";

// The bracketed signal notes come from the engine, see `run_process`.
const C_ERRORS: ClassificationTable = &[
    ("stack smashing detected", ErrorType::RangeError),
    ("buffer overflow detected", ErrorType::RangeError),
    ("floating point exception", ErrorType::RangeError),
    ("segmentation fault", ErrorType::ReferenceError),
    ("bus error", ErrorType::ReferenceError),
    ("double free", ErrorType::ReferenceError),
    ("free(): invalid", ErrorType::ReferenceError),
];

const CPP_ERRORS: ClassificationTable = &[
    ("std::out_of_range", ErrorType::RangeError),
    ("std::length_error", ErrorType::RangeError),
    ("std::overflow_error", ErrorType::RangeError),
    ("std::range_error", ErrorType::RangeError),
    ("stack smashing detected", ErrorType::RangeError),
    ("floating point exception", ErrorType::RangeError),
    ("std::bad_cast", ErrorType::TypeError),
    ("std::bad_any_cast", ErrorType::TypeError),
    ("std::bad_variant_access", ErrorType::TypeError),
    ("segmentation fault", ErrorType::ReferenceError),
    ("bus error", ErrorType::ReferenceError),
    ("double free", ErrorType::ReferenceError),
    ("free(): invalid", ErrorType::ReferenceError),
    ("std::invalid_argument", ErrorType::SyntaxError),
];

const RUST_ERRORS: ClassificationTable = &[
    ("index out of bounds", ErrorType::RangeError),
    ("overflow", ErrorType::RangeError),
    ("out of range", ErrorType::RangeError),
    ("on a `None` value", ErrorType::ReferenceError),
    ("segmentation fault", ErrorType::ReferenceError),
    ("ParseIntError", ErrorType::SyntaxError),
    ("ParseFloatError", ErrorType::SyntaxError),
    ("invalid digit", ErrorType::SyntaxError),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeLanguage {
    C,
    Cpp,
    Rust,
}

/// Languages compiled ahead of time into a single `main` executable.
pub struct Native {
    kind: NativeLanguage,
}

impl Native {
    pub fn new(kind: NativeLanguage) -> Self {
        Self { kind }
    }
}

impl LanguageStrategy for Native {
    fn language(&self) -> Language {
        match self.kind {
            NativeLanguage::C => Language::C,
            NativeLanguage::Cpp => Language::Cpp,
            NativeLanguage::Rust => Language::Rust,
        }
    }

    fn source_file_name(&self) -> &'static str {
        match self.kind {
            NativeLanguage::C => "main.c",
            NativeLanguage::Cpp => "main.cpp",
            NativeLanguage::Rust => "main.rs",
        }
    }

    fn build_command(&self, workspace: &Path, source: &Path) -> Option<CommandSpec> {
        let output = workspace.join("main");
        let command = match self.kind {
            NativeLanguage::C => CommandSpec::new("gcc")
                .args(["-O2", "-std=c17", "-o"])
                .path_arg(&output)
                .path_arg(source)
                .arg("-lm"),
            NativeLanguage::Cpp => CommandSpec::new("g++")
                .args(["-O2", "-std=c++17", "-o"])
                .path_arg(&output)
                .path_arg(source),
            NativeLanguage::Rust => CommandSpec::new("rustc")
                .args(["-O", "--edition", "2021", "-o"])
                .path_arg(&output)
                .path_arg(source),
        };
        Some(command)
    }

    fn artifact(&self, workspace: &Path, _source: &Path) -> Artifact {
        Artifact::Executable(workspace.join("main"))
    }

    fn run_command(&self, artifact: &Artifact, args: &[String]) -> CommandSpec {
        CommandSpec::new(artifact.path().to_string_lossy())
            .args(args.iter().cloned())
    }

    fn diagnostic_pattern(&self) -> Option<&'static str> {
        match self.kind {
            NativeLanguage::C | NativeLanguage::Cpp => Some(GCC_DIAGNOSTIC),
            NativeLanguage::Rust => Some(RUSTC_DIAGNOSTIC),
        }
    }

    fn classification_table(&self) -> ClassificationTable {
        match self.kind {
            NativeLanguage::C => C_ERRORS,
            NativeLanguage::Cpp => CPP_ERRORS,
            NativeLanguage::Rust => RUST_ERRORS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::first_match;
    use crate::engine::filter_diagnostics;

    #[test]
    fn test_languages_and_sources() {
        assert_eq!(Native::new(NativeLanguage::C).language(), Language::C);
        assert_eq!(Native::new(NativeLanguage::Cpp).source_file_name(), "main.cpp");
        assert_eq!(Native::new(NativeLanguage::Rust).source_file_name(), "main.rs");
    }

    #[test]
    fn test_c_links_libm() {
        let ws = Path::new("/ws");
        let build = Native::new(NativeLanguage::C)
            .build_command(ws, &ws.join("main.c"))
            .unwrap();
        assert_eq!(build.program, "gcc");
        assert_eq!(build.args.last().map(String::as_str), Some("-lm"));
    }

    #[test]
    fn test_executable_runs_directly() {
        let strategy = Native::new(NativeLanguage::Cpp);
        let artifact = strategy.artifact(Path::new("/ws"), Path::new("/ws/main.cpp"));
        let spec = strategy.run_command(&artifact, &["1".to_string(), "2".to_string()]);
        assert_eq!(spec.program, "/ws/main");
        assert_eq!(spec.args, vec!["1", "2"]);
    }

    #[test]
    fn test_gcc_diagnostics() {
        let output = "/ws/main.cpp: In function 'int main()':\n\
                      /ws/main.cpp:4:5: error: 'cout' was not declared in this scope\n\
                      \x20   4 |     cout << 1\n";
        assert_eq!(
            filter_diagnostics(output, GCC_DIAGNOSTIC).unwrap(),
            "/ws/main.cpp:4:5: error: 'cout' was not declared in this scope"
        );
    }

    #[test]
    fn test_rustc_diagnostics() {
        let output = "error[E0308]: mismatched types\n --> /ws/main.rs:2:18\n\nerror: aborting due to 1 previous error\n";
        let message = filter_diagnostics(output, RUSTC_DIAGNOSTIC).unwrap();
        assert_eq!(
            message,
            "error[E0308]: mismatched types\nerror: aborting due to 1 previous error"
        );
    }

    #[test]
    fn test_signal_notes_classify() {
        let segv = "\n[Process killed by signal 11: segmentation fault]";
        assert_eq!(first_match(segv, C_ERRORS).map(|m| m.1), Some(ErrorType::ReferenceError));

        let what = "terminate called after throwing an instance of 'std::out_of_range'\n  what():  vector::_M_range_check";
        assert_eq!(first_match(what, CPP_ERRORS).map(|m| m.1), Some(ErrorType::RangeError));

        let panic = "thread 'main' panicked at main.rs:3:5:\nindex out of bounds: the len is 3 but the index is 5";
        assert_eq!(first_match(panic, RUST_ERRORS).map(|m| m.1), Some(ErrorType::RangeError));
    }
}
