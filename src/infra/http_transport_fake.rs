use crate::domain_port::*;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct FakeResponse {
    status: u16,
    body: String,
    delay: Option<Duration>,
}

impl FakeResponse {
    pub fn json(status: u16, body: Value) -> Self {
        Self::text(status, &body.to_string())
    }

    pub fn status(status: u16) -> Self {
        Self::text(status, "")
    }

    pub fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_owned(),
            delay: None,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// Scripted transport. Responses are queued per path suffix and served in
/// order; a request with nothing scripted fails as a network error.
#[derive(Default)]
pub struct FakeTransport {
    scripts: Mutex<Vec<(String, VecDeque<FakeResponse>)>>,
    requests: Mutex<Vec<HttpRequest>>,
}

fn path_of(url: &str) -> &str {
    url.split(['?', '#']).next().unwrap_or(url)
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, path_suffix: &str, response: FakeResponse) {
        let mut scripts = self.scripts.lock().unwrap_or_else(PoisonError::into_inner);
        match scripts.iter_mut().find(|(suffix, _)| suffix == path_suffix) {
            Some((_, queue)) => queue.push_back(response),
            None => scripts.push((path_suffix.to_owned(), VecDeque::from([response]))),
        }
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn count(&self, path_suffix: &str) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|r| path_of(&r.url).ends_with(path_suffix))
            .count()
    }

    fn next_response(&self, url: &str) -> Option<FakeResponse> {
        let path = path_of(url);
        self.scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter_mut()
            .find(|(suffix, queue)| path.ends_with(suffix.as_str()) && !queue.is_empty())
            .and_then(|(_, queue)| queue.pop_front())
    }
}

#[async_trait::async_trait]
impl HttpTransport for FakeTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = request.url.clone();
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);

        let Some(response) = self.next_response(&url) else {
            return Err(TransportError::Network(format!("no response scripted for {url}")));
        };
        if let Some(delay) = response.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(HttpResponse {
            status: response.status,
            body: response.body,
        })
    }
}
