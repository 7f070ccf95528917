//! A local fake model for testing purpose.

mod preset;

use std::collections::VecDeque;
use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use intake_model::{
    ErrorKind, ModelProvider, ModelProviderError, ModelRequest, ModelResponse,
};
use tokio::time::sleep;

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    message: &'static str,
    kind: ErrorKind,
    status: Option<u16>,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.message)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[inline]
    fn status(&self) -> Option<u16> {
        self.status
    }
}

#[derive(Default)]
struct Script {
    responses: VecDeque<PresetResponse>,
    requests: Vec<ModelRequest>,
    delay: Option<Duration>,
}

/// A local fake model for testing purpose.
///
/// Before sending requests, you need to setup the script, which is how the
/// model should respond to each request in order. If there are no enough
/// responses in the script, an error will be returned.
///
/// Every request is recorded. Clones share the script and the record, so
/// a test can keep one clone for inspection after handing another to the
/// code under test.
///
/// # Note
///
/// This type is not optimized for production use, there are heavy memory
/// copies involved. You should only use it for testing.
#[derive(Clone, Default)]
pub struct TestModelProvider {
    script: Arc<Mutex<Script>>,
}

impl TestModelProvider {
    /// Appends a response to the script.
    #[inline]
    pub fn add_response_step(&self, preset: PresetResponse) {
        self.lock().responses.push_back(preset);
    }

    /// Appends a plain successful response to the script.
    #[inline]
    pub fn add_text_step(&self, content: impl Into<String>) {
        self.add_response_step(PresetResponse::with_content(content));
    }

    /// Delays every response by `duration`.
    #[inline]
    pub fn set_delay(&self, duration: Duration) {
        self.lock().delay = Some(duration);
    }

    /// Returns a copy of every request received so far.
    #[inline]
    pub fn requests(&self) -> Vec<ModelRequest> {
        self.lock().requests.clone()
    }

    /// Returns the number of requests received so far.
    #[inline]
    pub fn request_count(&self) -> usize {
        self.lock().requests.len()
    }

    /// Returns the number of scripted responses not consumed yet.
    #[inline]
    pub fn remaining_steps(&self) -> usize {
        self.lock().responses.len()
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_result(script: &mut Script) -> Result<ModelResponse, Error> {
        let Some(step) = script.responses.front_mut() else {
            return Err(Error {
                message: "no enough steps",
                kind: ErrorKind::Other,
                status: None,
            });
        };

        let failed = match step.failures {
            Some(0) => true,
            Some(ref mut remaining) => {
                *remaining -= 1;
                if *remaining == 0 {
                    step.failures = None;
                }
                true
            }
            None => false,
        };
        if failed {
            let status = step.status;
            let kind = match status {
                Some(429) => ErrorKind::RateLimitExceeded,
                Some(_) => ErrorKind::Status,
                None => ErrorKind::Transport,
            };
            return Err(Error {
                message: "scripted failure",
                kind,
                status,
            });
        }

        let Some(step) = script.responses.pop_front() else {
            return Ok(ModelResponse::with_content(""));
        };
        let mut response = ModelResponse::with_content(step.content);
        if let Some(reason) = step.finish_reason {
            response.finish_reason = Some(reason);
        }
        Ok(response)
    }
}

impl Debug for TestModelProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let script = self.lock();
        f.debug_struct("TestModelProvider")
            .field("remaining_steps", &script.responses.len())
            .field("requests", &script.requests.len())
            .finish()
    }
}

impl ModelProvider for TestModelProvider {
    type Error = crate::Error;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<ModelResponse, Self::Error>> + Send + 'static
    {
        let (result, delay) = {
            let mut script = self.lock();
            script.requests.push(req.clone());
            (Self::next_result(&mut script), script.delay)
        };
        async move {
            sleep(delay.unwrap_or(Duration::from_millis(1))).await;
            result
        }
    }
}
