/*
 * The MIT License
 * Copyright (c) 2022 Guillem Castro
 *
 * Permission is hereby granted, free of charge, to any person obtaining a copy
 * of this software and associated documentation files (the "Software"), to deal
 * in the Software without restriction, including without limitation the rights
 * to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
 * copies of the Software, and to permit persons to whom the Software is
 * furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in
 * all copies or substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
 * FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
 * AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
 * LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN
 * THE SOFTWARE.
 */

use std::path::PathBuf;

/// The opaque error tags callers are expected to match on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArg,
    InvalidPath,
    InvalidState,
    Fs,
    Mount,
    Cgroup,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::InvalidArg => "invalid argument",
            ErrorKind::InvalidPath => "invalid path",
            ErrorKind::InvalidState => "invalid state",
            ErrorKind::Fs => "filesystem error",
            ErrorKind::Mount => "mount error",
            ErrorKind::Cgroup => "cgroup error",
        };
        f.write_str(s)
    }
}

/// An engine error: a kind, the path it happened on (if any), and the cause.
#[derive(Debug, thiserror::Error)]
#[error("{kind}: {path}{source_display}", path = .path.as_ref().map(|p| p.display().to_string()).unwrap_or_default(), source_display = .source.as_ref().map(|e| format!(": {e}")).unwrap_or_default())]
pub struct Error {
    pub kind: ErrorKind,
    pub path: Option<PathBuf>,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Error { kind, path: None, source: None }
    }

    pub fn with_path(kind: ErrorKind, path: impl Into<PathBuf>) -> Self {
        Error { kind, path: Some(path.into()), source: None }
    }

    pub fn with_cause(
        kind: ErrorKind,
        path: impl Into<PathBuf>,
        cause: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Error {
            kind,
            path: Some(path.into()),
            source: Some(Box::new(cause)),
        }
    }

    pub fn from_nix(kind: ErrorKind, path: impl Into<PathBuf>, cause: nix::Error) -> Self {
        Error::with_cause(kind, path, cause)
    }

    pub fn from_io(kind: ErrorKind, path: impl Into<PathBuf>, cause: std::io::Error) -> Self {
        Error::with_cause(kind, path, cause)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
