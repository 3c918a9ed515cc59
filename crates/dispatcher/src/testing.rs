//! Test doubles: a scripted remote client, a recording pool and log capture.

use std::collections::VecDeque;
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use account_pool::{Credential, CredentialPool, MemoryPool, RouteOutcome};
use protocol::{Fault, Post, PostDraft, ProfileUpdate, RemoteClient, RequoteAck, Session, User};
use tracing_subscriber::fmt::MakeWriter;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A remote call as the client saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreatePost(PostDraft),
    Requote(String),
    FetchPost(String),
    Follow(String),
    UpdateProfile(ProfileUpdate),
}

/// What a session looked like when a remote call was made on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeenSession {
    pub route: Option<String>,
    pub locale: String,
    pub auth_token: Option<String>,
}

/// Remote client answering from per-operation scripts.
///
/// Each operation pops the next scripted result; an empty script succeeds
/// with an echo of the request, except `fetch_post` which fails.
#[derive(Default)]
pub struct ScriptedClient {
    calls: Mutex<Vec<Call>>,
    sessions: Mutex<Vec<SeenSession>>,
    create_post: Mutex<VecDeque<Result<Post, Fault>>>,
    requote: Mutex<VecDeque<Result<RequoteAck, Fault>>>,
    fetch_post: Mutex<VecDeque<Result<Post, Fault>>>,
    follow: Mutex<VecDeque<Result<User, Fault>>>,
    update_profile: Mutex<VecDeque<Result<User, Fault>>>,
    next_id: AtomicUsize,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script_create_post(&self, result: Result<Post, Fault>) -> &Self {
        self.create_post.lock().unwrap().push_back(result);
        self
    }

    pub fn script_requote(&self, result: Result<RequoteAck, Fault>) -> &Self {
        self.requote.lock().unwrap().push_back(result);
        self
    }

    pub fn script_fetch_post(&self, result: Result<Post, Fault>) -> &Self {
        self.fetch_post.lock().unwrap().push_back(result);
        self
    }

    pub fn script_follow(&self, result: Result<User, Fault>) -> &Self {
        self.follow.lock().unwrap().push_back(result);
        self
    }

    pub fn script_update_profile(&self, result: Result<User, Fault>) -> &Self {
        self.update_profile.lock().unwrap().push_back(result);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn sessions(&self) -> Vec<SeenSession> {
        self.sessions.lock().unwrap().clone()
    }

    fn observe(&self, session: &Session, call: Call) {
        self.sessions.lock().unwrap().push(SeenSession {
            route: session.route().map(str::to_string),
            locale: session.locale().to_string(),
            auth_token: session.token("auth_token").map(str::to_string),
        });
        self.calls.lock().unwrap().push(call);
    }

    fn echo_post(&self, draft: &PostDraft) -> Post {
        let n = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        Post {
            id: format!("post-{n}"),
            text: draft.text.clone(),
            author: User::unknown(),
            in_reply_to: draft.reply_to.clone(),
            quoted_url: draft.attachment_url.clone(),
            media_ids: draft.media_ids.clone(),
            is_repost: false,
            degraded: false,
        }
    }
}

pub fn user(id: &str) -> User {
    User {
        id: id.to_string(),
        screen_name: format!("user{id}"),
        name: format!("User {id}"),
    }
}

pub fn post(id: &str, text: &str) -> Post {
    Post {
        id: id.to_string(),
        text: text.to_string(),
        author: user("1"),
        in_reply_to: None,
        quoted_url: None,
        media_ids: Vec::new(),
        is_repost: false,
        degraded: false,
    }
}

impl RemoteClient for ScriptedClient {
    fn create_post<'a>(
        &'a self,
        session: &'a Session,
        draft: &'a PostDraft,
    ) -> BoxFuture<'a, protocol::Result<Post>> {
        self.observe(session, Call::CreatePost(draft.clone()));
        let scripted = self.create_post.lock().unwrap().pop_front();
        let result = scripted.unwrap_or_else(|| Ok(self.echo_post(draft)));
        Box::pin(async move { result })
    }

    fn requote<'a>(
        &'a self,
        session: &'a Session,
        target_id: &'a str,
    ) -> BoxFuture<'a, protocol::Result<RequoteAck>> {
        self.observe(session, Call::Requote(target_id.to_string()));
        let scripted = self.requote.lock().unwrap().pop_front();
        let result = scripted.unwrap_or_else(|| {
            Ok(RequoteAck {
                target_id: target_id.to_string(),
                post: None,
            })
        });
        Box::pin(async move { result })
    }

    fn fetch_post<'a>(
        &'a self,
        session: &'a Session,
        post_id: &'a str,
    ) -> BoxFuture<'a, protocol::Result<Post>> {
        self.observe(session, Call::FetchPost(post_id.to_string()));
        let scripted = self.fetch_post.lock().unwrap().pop_front();
        let result = scripted.unwrap_or_else(|| {
            Err(Fault::new(
                protocol::FaultKind::Unclassified,
                format!("post {post_id} not scripted"),
            ))
        });
        Box::pin(async move { result })
    }

    fn follow<'a>(
        &'a self,
        session: &'a Session,
        user_id: &'a str,
    ) -> BoxFuture<'a, protocol::Result<User>> {
        self.observe(session, Call::Follow(user_id.to_string()));
        let scripted = self.follow.lock().unwrap().pop_front();
        let result = scripted.unwrap_or_else(|| Ok(user(user_id)));
        Box::pin(async move { result })
    }

    fn update_profile<'a>(
        &'a self,
        session: &'a Session,
        update: &'a ProfileUpdate,
    ) -> BoxFuture<'a, protocol::Result<User>> {
        self.observe(session, Call::UpdateProfile(update.clone()));
        let scripted = self.update_profile.lock().unwrap().pop_front();
        let result = scripted.unwrap_or_else(|| {
            let mut me = user("me");
            if let Some(name) = &update.name {
                me.name = name.clone();
            }
            Ok(me)
        });
        Box::pin(async move { result })
    }
}

/// A pool call as the pool saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolCall {
    Get(String),
    Lease { queue: String, role: String },
    LockQueue { handle: String, queue: String, minutes: u64 },
    Disable { handle: String, reason: String },
    ReportRoute(String),
}

impl PoolCall {
    pub fn is_mutation(&self) -> bool {
        !matches!(self, PoolCall::Get(_) | PoolCall::Lease { .. })
    }
}

/// `MemoryPool` wrapper that records every call and can be told to fail
/// mutations.
pub struct RecordingPool {
    inner: MemoryPool,
    calls: Mutex<Vec<PoolCall>>,
    fail_mutations: AtomicBool,
}

impl RecordingPool {
    pub fn new(credentials: Vec<Credential>) -> Self {
        Self::wrap(MemoryPool::new(credentials))
    }

    pub fn wrap(inner: MemoryPool) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
            fail_mutations: AtomicBool::new(false),
        }
    }

    pub fn fail_mutations(&self) {
        self.fail_mutations.store(true, Ordering::SeqCst);
    }

    pub fn inner(&self) -> &MemoryPool {
        &self.inner
    }

    pub fn calls(&self) -> Vec<PoolCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn mutations(&self) -> Vec<PoolCall> {
        self.calls().into_iter().filter(PoolCall::is_mutation).collect()
    }

    fn record(&self, call: PoolCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn refuse(&self) -> Option<account_pool::Error> {
        self.fail_mutations
            .load(Ordering::SeqCst)
            .then(|| account_pool::Error::Unavailable("pool offline".into()))
    }
}

impl CredentialPool for RecordingPool {
    fn get<'a>(
        &'a self,
        handle: &'a str,
    ) -> BoxFuture<'a, account_pool::Result<Option<Credential>>> {
        self.record(PoolCall::Get(handle.to_string()));
        self.inner.get(handle)
    }

    fn get_for_queue<'a>(
        &'a self,
        queue: &'a str,
        role: &'a str,
    ) -> BoxFuture<'a, account_pool::Result<Option<Credential>>> {
        self.record(PoolCall::Lease {
            queue: queue.to_string(),
            role: role.to_string(),
        });
        self.inner.get_for_queue(queue, role)
    }

    fn get_all(&self) -> BoxFuture<'_, account_pool::Result<Vec<Credential>>> {
        self.inner.get_all()
    }

    fn lock_queue<'a>(
        &'a self,
        handle: &'a str,
        queue: &'a str,
        minutes: u64,
    ) -> BoxFuture<'a, account_pool::Result<()>> {
        self.record(PoolCall::LockQueue {
            handle: handle.to_string(),
            queue: queue.to_string(),
            minutes,
        });
        match self.refuse() {
            Some(err) => Box::pin(async move { Err(err) }),
            None => self.inner.lock_queue(handle, queue, minutes),
        }
    }

    fn disable_permanently<'a>(
        &'a self,
        handle: &'a str,
        reason: &'a str,
    ) -> BoxFuture<'a, account_pool::Result<()>> {
        self.record(PoolCall::Disable {
            handle: handle.to_string(),
            reason: reason.to_string(),
        });
        match self.refuse() {
            Some(err) => Box::pin(async move { Err(err) }),
            None => self.inner.disable_permanently(handle, reason),
        }
    }

    fn report_route_failure<'a>(
        &'a self,
        handle: &'a str,
    ) -> BoxFuture<'a, account_pool::Result<RouteOutcome>> {
        self.record(PoolCall::ReportRoute(handle.to_string()));
        match self.refuse() {
            Some(err) => Box::pin(async move { Err(err) }),
            None => self.inner.report_route_failure(handle),
        }
    }
}

/// Credential with an auth token, leasable under the default role.
pub fn account(handle: &str) -> Credential {
    Credential::new(handle)
        .with_token("auth_token", format!("token-{handle}"))
        .with_token("ct0", format!("csrf-{handle}"))
}

/// In-memory log sink for asserting on emitted log lines.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    pub fn count(&self, needle: &str) -> usize {
        self.contents().matches(needle).count()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Route this thread's logs into a buffer until the guard drops.
pub fn capture_logs() -> (LogCapture, tracing::subscriber::DefaultGuard) {
    let capture = LogCapture::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(capture.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (capture, guard)
}
