//! Scripted in-memory transport for client tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use super::*;

pub const APP_ID: &str = "112455";
pub const APP_KEY: &str = "a086d2f5c3c1e6b7f0d9e8a1b2c3d4e5";
pub const BASE_URL: &str = "https://example.invalid";

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub url: String,
    pub params: Vec<(String, String)>,
}

impl RecordedRequest {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug)]
enum Scripted {
    Respond { status: u16, body: String },
    Fail(String),
}

/// Called with the number of requests served so far, before the response is returned.
type ServeHook = Arc<dyn Fn(usize) + Send + Sync>;

#[derive(Default)]
struct FakeTransportState {
    requests: Vec<RecordedRequest>,
    script: VecDeque<Scripted>,
    on_serve: Option<ServeHook>,
}

impl std::fmt::Debug for FakeTransportState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeTransportState")
            .field("requests", &self.requests)
            .field("script", &self.script)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeTransport {
    state: Arc<Mutex<FakeTransportState>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an HTTP response.
    pub fn respond(&self, status: u16, body: impl Into<String>) {
        self.state.lock().unwrap().script.push_back(Scripted::Respond {
            status,
            body: body.into(),
        });
    }

    /// Queue a transport-level failure.
    pub fn fail(&self, message: impl Into<String>) {
        self.state
            .lock()
            .unwrap()
            .script
            .push_back(Scripted::Fail(message.into()));
    }

    /// Run `hook` while each request is in flight, after it has been recorded.
    pub fn on_serve(&self, hook: impl Fn(usize) + Send + Sync + 'static) {
        self.state.lock().unwrap().on_serve = Some(Arc::new(hook));
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }
}

impl HttpTransport for FakeTransport {
    fn request<'a>(
        &'a self,
        method: Method,
        url: &'a str,
        params: Vec<(String, String)>,
    ) -> BoxFuture<'a, Result<HttpResponse, Box<dyn StdError + Send + Sync>>> {
        Box::pin(async move {
            let (next, served, hook) = {
                let mut state = self.state.lock().unwrap();
                state.requests.push(RecordedRequest {
                    method,
                    url: url.to_owned(),
                    params,
                });
                (state.script.pop_front(), state.requests.len(), state.on_serve.clone())
            };
            if let Some(hook) = hook {
                hook(served);
            }
            match next {
                Some(Scripted::Respond { status, body }) => Ok(HttpResponse { status, body }),
                Some(Scripted::Fail(message)) => Err(message.into()),
                None => Err(format!("no scripted response for {url}").into()),
            }
        })
    }
}

pub fn fixed_clock() -> UnixTimestamp {
    UnixTimestamp::new(1_700_000_000)
}

pub fn test_client(transport: &FakeTransport, mode: AuthMode) -> SubmailClient {
    SubmailClient {
        credential: Arc::new(Credential::new(APP_ID, APP_KEY).unwrap()),
        base_url: BASE_URL.to_owned(),
        auth_mode: Arc::new(RwLock::new(mode)),
        clock: fixed_clock,
        http: Arc::new(transport.clone()),
    }
}

pub fn assert_param(params: &[(String, String)], key: &str, value: &str) {
    assert!(
        params.iter().any(|(k, v)| k == key && v == value),
        "missing param {key}={value}; got: {params:?}"
    );
}
