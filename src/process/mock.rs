use super::{Invocation, ProcessError, ProcessRunner};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

type Hook = Arc<dyn Fn(&Invocation) + Send + Sync>;

/// Scripted [`ProcessRunner`] for tests.
///
/// Captured runs pop queued responses in order and fall back to empty output once
/// the queue is drained. Every call is recorded, including visible launches.
pub struct MockProcessRunner {
    responses: Mutex<VecDeque<MockResponse>>,
    calls: Mutex<Vec<RecordedCall>>,
    fail_visible: Mutex<bool>,
    hook: Option<Hook>,
}

#[derive(Debug, Clone)]
pub enum MockResponse {
    Output(String),
    SpawnFailure,
}

impl MockResponse {
    pub fn output(text: impl Into<String>) -> Self {
        MockResponse::Output(text.into())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    Captured(Invocation),
    Visible(Invocation),
}

impl RecordedCall {
    pub fn invocation(&self) -> &Invocation {
        match self {
            RecordedCall::Captured(invocation) | RecordedCall::Visible(invocation) => invocation,
        }
    }

    pub fn is_visible(&self) -> bool {
        matches!(self, RecordedCall::Visible(_))
    }
}

impl MockProcessRunner {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            fail_visible: Mutex::new(false),
            hook: None,
        }
    }

    /// Runs `hook` on every invocation before answering, e.g. to drop build
    /// artifacts into the workspace the way a real toolchain would.
    pub fn with_hook(hook: impl Fn(&Invocation) + Send + Sync + 'static) -> Self {
        Self {
            hook: Some(Arc::new(hook)),
            ..Self::new()
        }
    }

    pub fn add_response(&self, response: MockResponse) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn add_responses(&self, responses: impl IntoIterator<Item = MockResponse>) {
        let mut queue = self.responses.lock().unwrap();
        for response in responses {
            queue.push_back(response);
        }
    }

    pub fn fail_visible_launches(&self) {
        *self.fail_visible.lock().unwrap() = true;
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn visible_calls(&self) -> Vec<Invocation> {
        self.calls()
            .into_iter()
            .filter(RecordedCall::is_visible)
            .map(|call| call.invocation().clone())
            .collect()
    }

    pub fn remaining_responses(&self) -> usize {
        self.responses.lock().unwrap().len()
    }

    fn spawn_failure(invocation: &Invocation) -> ProcessError {
        ProcessError::Spawn {
            program: invocation.program.clone(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "program not found"),
        }
    }
}

impl Default for MockProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProcessRunner for MockProcessRunner {
    async fn run_captured(&self, invocation: &Invocation) -> Result<String, ProcessError> {
        self.calls
            .lock()
            .unwrap()
            .push(RecordedCall::Captured(invocation.clone()));

        if let Some(hook) = &self.hook {
            hook(invocation);
        }

        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(MockResponse::Output(text)) => Ok(text),
            Some(MockResponse::SpawnFailure) => Err(Self::spawn_failure(invocation)),
            None => Ok(String::new()),
        }
    }

    async fn run_visible(&self, invocation: &Invocation) -> Result<(), ProcessError> {
        if invocation.redirect_output {
            return Err(ProcessError::RedirectedVisibleLaunch {
                program: invocation.program.clone(),
            });
        }

        self.calls
            .lock()
            .unwrap()
            .push(RecordedCall::Visible(invocation.clone()));

        if let Some(hook) = &self.hook {
            hook(invocation);
        }

        if *self.fail_visible.lock().unwrap() {
            return Err(Self::spawn_failure(invocation));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_responses_replayed_in_order() {
        let runner = MockProcessRunner::new();
        runner.add_responses([MockResponse::output("first"), MockResponse::output("second")]);

        let invocation = Invocation::new("tool");
        assert_eq!(runner.run_captured(&invocation).await.unwrap(), "first");
        assert_eq!(runner.run_captured(&invocation).await.unwrap(), "second");
        assert_eq!(runner.run_captured(&invocation).await.unwrap(), "");
        assert_eq!(runner.remaining_responses(), 0);
    }

    #[tokio::test]
    async fn test_spawn_failure_response() {
        let runner = MockProcessRunner::new();
        runner.add_response(MockResponse::SpawnFailure);

        let result = runner.run_captured(&Invocation::new("dotnet")).await;
        assert!(matches!(result, Err(ProcessError::Spawn { .. })));
    }

    #[tokio::test]
    async fn test_calls_recorded_with_mode() {
        let runner = MockProcessRunner::new();
        runner.run_captured(&Invocation::new("a")).await.unwrap();
        runner.run_visible(&Invocation::new("b")).await.unwrap();

        let calls = runner.calls();
        assert_eq!(calls.len(), 2);
        assert!(!calls[0].is_visible());
        assert!(calls[1].is_visible());
        assert_eq!(runner.visible_calls()[0].program, "b");
    }

    #[tokio::test]
    async fn test_hook_sees_every_invocation() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        let runner = MockProcessRunner::with_hook(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        runner.run_captured(&Invocation::new("a")).await.unwrap();
        runner.run_visible(&Invocation::new("b")).await.unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failing_visible_launch() {
        let runner = MockProcessRunner::new();
        runner.fail_visible_launches();

        let result = runner.run_visible(&Invocation::new("cmd.exe")).await;
        assert!(result.is_err());
        assert_eq!(runner.visible_calls().len(), 1);
    }
}
