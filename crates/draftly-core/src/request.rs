/// Identifies one in-flight request. Completions carrying a token other than
/// the current one are stale and get dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestToken(u64);

#[derive(Debug, Default)]
pub struct RequestSequence {
    next: u64,
    current: Option<RequestToken>,
}

impl RequestSequence {
    /// Starts a new request, superseding any pending one.
    pub fn issue(&mut self) -> RequestToken {
        self.next += 1;
        let token = RequestToken(self.next);
        self.current = Some(token);
        token
    }

    pub fn invalidate(&mut self) {
        self.current = None;
    }

    pub fn is_pending(&self) -> bool {
        self.current.is_some()
    }

    /// Accepts `token` if it is the pending request, clearing it.
    pub fn settle(&mut self, token: RequestToken) -> bool {
        if self.current == Some(token) {
            self.current = None;
            true
        } else {
            tracing::debug!(?token, "dropping stale response");
            false
        }
    }
}
