//! Pull-based token provision.
//!
//! Stages compose by nested pulls: the normalizer pulls from a filter, which
//! pulls from a raw provider over per-file token lists. Nothing buffers the
//! whole stream; the only buffering is the bounded lookahead window the
//! normalizer needs for its context-sensitive rules.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::errors::DupscanResult;
use crate::models::Token;

/// A pull-based source of tokens; `Ok(None)` is the terminal condition.
pub trait TokenProvider {
    fn next_token(&mut self) -> DupscanResult<Option<Token>>;
}

/// Raw provider over the token lists of a sequence of files.
///
/// Empty files are skipped with an explicit loop — never recursion — so a
/// pathological run of empty files cannot grow the stack.
pub struct FileTokenProvider {
    files: Vec<Arc<Vec<Token>>>,
    file_index: usize,
    token_index: usize,
}

impl FileTokenProvider {
    pub fn new(files: Vec<Arc<Vec<Token>>>) -> Self {
        Self {
            files,
            file_index: 0,
            token_index: 0,
        }
    }
}

impl TokenProvider for FileTokenProvider {
    fn next_token(&mut self) -> DupscanResult<Option<Token>> {
        while self.file_index < self.files.len() {
            let file = &self.files[self.file_index];
            if self.token_index < file.len() {
                let token = file[self.token_index].clone();
                self.token_index += 1;
                return Ok(Some(token));
            }
            self.file_index += 1;
            self.token_index = 0;
        }
        Ok(None)
    }
}

/// Adds `peek(n)` over any provider via an internal buffer.
pub struct Lookahead<P: TokenProvider> {
    inner: P,
    buffer: VecDeque<Token>,
}

impl<P: TokenProvider> Lookahead<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            buffer: VecDeque::new(),
        }
    }

    /// Token `n` positions ahead of the next pull, without consuming it.
    pub fn peek(&mut self, n: usize) -> DupscanResult<Option<&Token>> {
        while self.buffer.len() <= n {
            match self.inner.next_token()? {
                Some(token) => self.buffer.push_back(token),
                None => return Ok(None),
            }
        }
        Ok(self.buffer.get(n))
    }
}

impl<P: TokenProvider> TokenProvider for Lookahead<P> {
    fn next_token(&mut self) -> DupscanResult<Option<Token>> {
        if let Some(token) = self.buffer.pop_front() {
            return Ok(Some(token));
        }
        self.inner.next_token()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
