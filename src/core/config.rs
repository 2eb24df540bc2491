//! Simulation configuration loaded from commented JSON

use serde_json::Value;
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf, MAIN_SEPARATOR, MAIN_SEPARATOR_STR};
use thiserror::Error;

/// JSON pointer to the point-source discriminator
pub const POINT_SOURCE_TYPE: &str = "/point_source/type";

/// Errors raised while loading or reading the simulation configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read configuration {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unterminated block comment starting on line {line} of {}", .path.display())]
    UnterminatedComment { path: PathBuf, line: usize },

    #[error("cannot parse configuration {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("configuration {} must contain a JSON object at its root", .path.display())]
    NotAnObject { path: PathBuf },

    #[error("configuration {} has no field '{pointer}'", .path.display())]
    MissingField { path: PathBuf, pointer: String },

    #[error("field '{pointer}' in {} must be {expected}", .path.display())]
    InvalidField {
        path: PathBuf,
        pointer: String,
        expected: &'static str,
    },
}

/// Position of a block comment that never closes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnterminatedComment {
    /// 1-based line of the opening `/*`
    pub line: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lexer {
    Code,
    Str,
    Escape,
    LineComment,
    BlockComment,
}

/// Remove `/* block */` and `// line` comments from JSON text.
///
/// String scalars are copied verbatim, so markers such as `"http://host"`
/// survive. Newlines inside comments are kept, so parse errors report the
/// line numbers of the input. A block comment becomes a single space.
pub fn strip_comments(source: &str) -> Result<String, UnterminatedComment> {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    let mut state = Lexer::Code;
    let mut line = 1;
    let mut block_start = 0;

    while let Some(c) = chars.next() {
        if c == '\n' {
            line += 1;
        }

        match state {
            Lexer::Code => match (c, chars.peek()) {
                ('"', _) => {
                    out.push(c);
                    state = Lexer::Str;
                }
                ('/', Some('/')) => {
                    chars.next();
                    state = Lexer::LineComment;
                }
                ('/', Some('*')) => {
                    chars.next();
                    out.push(' ');
                    block_start = line;
                    state = Lexer::BlockComment;
                }
                _ => out.push(c),
            },
            Lexer::Str => {
                out.push(c);
                state = match c {
                    '\\' => Lexer::Escape,
                    '"' => Lexer::Code,
                    _ => Lexer::Str,
                };
            }
            Lexer::Escape => {
                out.push(c);
                state = Lexer::Str;
            }
            Lexer::LineComment => {
                if c == '\n' {
                    out.push(c);
                    state = Lexer::Code;
                }
            }
            Lexer::BlockComment => {
                if c == '\n' {
                    out.push(c);
                } else if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    state = Lexer::Code;
                }
            }
        }
    }

    if state == Lexer::BlockComment {
        return Err(UnterminatedComment { line: block_start });
    }

    Ok(out)
}

/// Fold `.` and `..` out of an absolute path without touching the filesystem
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

/// A loaded simulation configuration and the directory it lives in
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Absolute path of the input document
    path: PathBuf,

    /// Absolute directory containing the input document
    base_dir: PathBuf,

    /// Parsed document, never mutated after loading
    document: Value,
}

impl SimulationConfig {
    /// Load a configuration document from disk
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let path = if path.is_absolute() {
            normalize(path)
        } else {
            let cwd = std::env::current_dir().map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            normalize(&cwd.join(path))
        };

        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;

        Self::from_json_str(&text, path)
    }

    /// Parse configuration text that was read from `path`
    pub fn from_json_str(text: &str, path: PathBuf) -> Result<Self, ConfigError> {
        let stripped = strip_comments(text).map_err(|e| ConfigError::UnterminatedComment {
            path: path.clone(),
            line: e.line,
        })?;

        let document: Value = serde_json::from_str(&stripped).map_err(|source| {
            ConfigError::Parse {
                path: path.clone(),
                source,
            }
        })?;

        if !document.is_object() {
            return Err(ConfigError::NotAnObject { path });
        }

        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(MAIN_SEPARATOR_STR));

        Ok(Self {
            path,
            base_dir,
            document,
        })
    }

    /// Absolute path of the input document
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Working directory shared by every stage
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Working directory as passed to stages, with a trailing separator
    pub fn working_dir_arg(&self) -> OsString {
        let mut arg = self.base_dir.as_os_str().to_os_string();
        if !arg.to_string_lossy().ends_with(MAIN_SEPARATOR) {
            arg.push(MAIN_SEPARATOR_STR);
        }
        arg
    }

    /// Location of a named artifact inside the working directory
    pub fn artifact_path(&self, file_name: &str) -> PathBuf {
        self.base_dir.join(file_name)
    }

    /// Read a string field addressed by a JSON pointer
    pub fn str_field(&self, pointer: &str) -> Result<&str, ConfigError> {
        let value = self
            .document
            .pointer(pointer)
            .ok_or_else(|| ConfigError::MissingField {
                path: self.path.clone(),
                pointer: pointer.to_string(),
            })?;

        value.as_str().ok_or_else(|| ConfigError::InvalidField {
            path: self.path.clone(),
            pointer: pointer.to_string(),
            expected: "a string",
        })
    }

    /// The point-source discriminator, `"none"` when the stage is disabled
    pub fn point_source_type(&self) -> Result<&str, ConfigError> {
        self.str_field(POINT_SOURCE_TYPE)
    }
}
