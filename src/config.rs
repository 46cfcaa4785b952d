use std::path::PathBuf;

/// Where CFR is looked for when nothing else is configured
pub const DEFAULT_DECOMPILER: &str = "cfr-0.152.jar";

/// Program used to run the decompiler jar
pub const DEFAULT_JAVA: &str = "java";

/// How the external decompiler is launched.
///
/// Built once at startup and handed to [`Decompiler::new`](crate::Decompiler::new).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Path to the CFR jar
    pub decompiler_jar: PathBuf,
    /// Java launcher, either a path or a name looked up on `PATH`
    pub java: PathBuf,
    /// Pass `--silent true` so CFR keeps its progress output to itself
    pub silent: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            decompiler_jar: PathBuf::from(DEFAULT_DECOMPILER),
            java: PathBuf::from(DEFAULT_JAVA),
            silent: true,
        }
    }
}

impl Config {
    pub fn new(decompiler_jar: impl Into<PathBuf>) -> Self {
        Self {
            decompiler_jar: decompiler_jar.into(),
            ..Self::default()
        }
    }

    pub fn with_java(mut self, java: impl Into<PathBuf>) -> Self {
        self.java = java.into();
        self
    }

    pub fn with_silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }
}
