/// Language Strategy - the per-language capability set
///
/// A strategy only describes a toolchain: where the source goes, how to
/// build it, how to launch the artifact and how that runtime spells its
/// failures. Spawning, timing and comparison are done once, in `engine`
/// and `evaluator`, for every language.
use judge_common::types::{ErrorType, Language};
use std::path::{Path, PathBuf};

/// Ordered `(stderr substring, category)` pairs; the first match wins.
pub type ClassificationTable = &'static [(&'static str, ErrorType)];

/// A fully resolved process invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub env_remove: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            env_remove: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn path_arg(self, path: &Path) -> Self {
        let arg = path.to_string_lossy().into_owned();
        self.arg(arg)
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn env_remove(mut self, key: impl Into<String>) -> Self {
        self.env_remove.push(key.into());
        self
    }
}

/// The runnable output of the build stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Artifact {
    /// Interpreted languages run the submitted source as-is.
    Source(PathBuf),
    /// Transpiled output that still needs an interpreter.
    Script(PathBuf),
    /// Directory of class files plus the entry class.
    ClassPath { dir: PathBuf, main_class: String },
    Executable(PathBuf),
}

impl Artifact {
    pub fn path(&self) -> &Path {
        match self {
            Artifact::Source(path) | Artifact::Script(path) | Artifact::Executable(path) => path,
            Artifact::ClassPath { dir, .. } => dir,
        }
    }
}

pub trait LanguageStrategy: Send + Sync {
    fn language(&self) -> Language;

    /// File name the source is written to inside the workspace.
    fn source_file_name(&self) -> &'static str;

    /// Toolchain invocation for the build stage, `None` for interpreted
    /// languages.
    fn build_command(&self, workspace: &Path, source: &Path) -> Option<CommandSpec>;

    /// Where the build leaves its runnable output.
    fn artifact(&self, workspace: &Path, source: &Path) -> Artifact;

    /// Launch `artifact` with the tokenized test input as arguments.
    fn run_command(&self, artifact: &Artifact, args: &[String]) -> CommandSpec;

    /// Regex matching the toolchain's structured diagnostic lines.
    fn diagnostic_pattern(&self) -> Option<&'static str> {
        None
    }

    fn classification_table(&self) -> ClassificationTable;
}
