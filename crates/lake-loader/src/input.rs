// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Line input over a sequence of sources.
//!
//! Sources are read one after another in the order given. With no file
//! arguments the input is standard input; the argument `-` stands for
//! standard input as well.

use std::collections::VecDeque;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Lines};
use tracing::debug;

type Reader = Box<dyn AsyncRead + Send + Unpin>;

pub enum Source {
    Stdin,
    File(PathBuf),
    Reader(Reader),
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Stdin => write!(f, "Stdin"),
            Source::File(path) => write!(f, "File({})", path.display()),
            Source::Reader(_) => write!(f, "Reader"),
        }
    }
}

#[derive(Debug, Default)]
pub struct Input {
    pending: VecDeque<Source>,
    current: Option<CurrentReader>,
}

struct CurrentReader(Lines<BufReader<Reader>>);

impl fmt::Debug for CurrentReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CurrentReader")
    }
}

impl Input {
    #[must_use]
    pub fn stdin() -> Self {
        Input::from_sources([Source::Stdin])
    }

    /// Input over file arguments. No arguments means standard input.
    #[must_use]
    pub fn from_paths<P: AsRef<Path>>(paths: &[P]) -> Self {
        if paths.is_empty() {
            return Input::stdin();
        }
        Input::from_sources(paths.iter().map(|path| {
            let path = path.as_ref();
            if path == Path::new("-") {
                Source::Stdin
            } else {
                Source::File(path.to_path_buf())
            }
        }))
    }

    pub fn from_reader<R>(reader: R) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        Input::from_sources([Source::Reader(Box::new(reader))])
    }

    pub fn from_sources<I: IntoIterator<Item = Source>>(sources: I) -> Self {
        Input {
            pending: sources.into_iter().collect(),
            current: None,
        }
    }

    /// Sources not yet opened.
    #[must_use]
    pub fn pending(&self) -> &VecDeque<Source> {
        &self.pending
    }

    /// Returns the next line without its terminator, or `None` once every
    /// source is exhausted.
    ///
    /// Cancel safe: dropping the future before it completes loses no input.
    pub async fn next_line(&mut self) -> io::Result<Option<String>> {
        loop {
            if let Some(CurrentReader(lines)) = self.current.as_mut() {
                if let Some(line) = lines.next_line().await? {
                    return Ok(Some(line));
                }
                self.current = None;
            }

            match self.open_next().await? {
                Some(reader) => {
                    self.current = Some(CurrentReader(BufReader::new(reader).lines()));
                }
                None => return Ok(None),
            }
        }
    }

    async fn open_next(&mut self) -> io::Result<Option<Reader>> {
        let path = match self.pending.front() {
            None => return Ok(None),
            Some(Source::File(path)) => Some(path.clone()),
            Some(_) => None,
        };

        // a file stays queued until it is open
        let opened = match path {
            Some(path) => {
                debug!("Reading lines from {}", path.display());
                let file = File::open(&path).await.map_err(|e| {
                    io::Error::new(e.kind(), format!("{}: {e}", path.display()))
                })?;
                Some(Box::new(file) as Reader)
            }
            None => None,
        };

        Ok(match self.pending.pop_front() {
            Some(Source::File(_)) => opened,
            Some(Source::Stdin) => {
                debug!("Reading lines from stdin");
                Some(Box::new(tokio::io::stdin()) as Reader)
            }
            Some(Source::Reader(reader)) => Some(reader),
            None => None,
        })
    }
}
