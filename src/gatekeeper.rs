// ============================================================================
// Request Gatekeeper
// ============================================================================
//
// An ordered list of before-actions run against a per-request RequestContext
// ahead of every handler. Each step either lets the request continue or halts
// it with a response of its own.
//
// Standard pipeline:
// 1. Authorize           - session must reference an existing user,
//                          otherwise redirect to the login page
// 2. SetLocaleFromParams - `?locale=xx` switches the request locale when xx is
//                          available, otherwise flashes a notice
//
// Nothing here touches global state: the session is loaded into the context,
// changed there, and written back once by `RequestContext::commit`.
//
// ============================================================================

use anyhow::Result;
use axum::response::{IntoResponse, Redirect, Response};
use std::collections::HashMap;
use std::sync::Arc;

use crate::context::AppContext;
use crate::db::User;
use crate::error::{AppError, AppResult};
use crate::flash::{Flash, FlashKind};
use crate::i18n::{self, Locale, LocaleSwitch};
use crate::metrics;
use crate::session::{SessionData, SessionId, SessionStore};
use crate::utils::log_safe_id;

/// Notice shown on the login page after an unauthorized request
pub const PLEASE_LOG_IN: &str = "Please log in";

/// Query parameter carrying the requested locale
pub const LOCALE_PARAM: &str = "locale";

/// Result of a single before-action
pub enum Flow {
    Continue,
    Halt(Response),
}

impl std::fmt::Debug for Flow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Flow::Continue => f.write_str("Continue"),
            Flow::Halt(resp) => write!(f, "Halt({})", resp.status()),
        }
    }
}

/// Request-scoped state the before-actions read and modify
#[derive(Debug)]
pub struct RequestContext {
    pub path: String,
    pub params: HashMap<String, String>,
    /// Id of a session that exists in the store
    pub session_id: Option<SessionId>,
    pub session: SessionData,
    pub current_user: Option<User>,
    pub locale: Locale,
    /// Messages visible to this request
    pub flash: Flash,
    session_changed: bool,
}

impl RequestContext {
    /// `session` is what the store returned for `session_id`. Flash messages
    /// left by the previous request become visible now and are removed from
    /// the session.
    pub fn new(
        path: impl Into<String>,
        params: HashMap<String, String>,
        session_id: Option<SessionId>,
        session: Option<SessionData>,
        default_locale: Locale,
    ) -> Self {
        let session_id = session.as_ref().and(session_id);
        let mut session = session.unwrap_or_default();
        let flash = session.flash.take();
        let session_changed = !flash.is_empty();

        Self {
            path: path.into(),
            params,
            session_id,
            session,
            current_user: None,
            locale: default_locale,
            flash,
            session_changed,
        }
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Message for the current request only
    pub fn flash_now(&mut self, kind: FlashKind, message: impl Into<String>) {
        self.flash.set(kind, message);
    }

    /// Message delivered with the next request of this session
    pub fn flash_next(&mut self, kind: FlashKind, message: impl Into<String>) {
        self.session.flash.set(kind, message);
        self.session_changed = true;
    }

    pub fn session_changed(&self) -> bool {
        self.session_changed
    }

    /// Writes the session back if anything changed. Returns the id of a
    /// session created by this call, which still needs a cookie.
    pub async fn commit(&mut self, store: &dyn SessionStore) -> Result<Option<SessionId>> {
        if !self.session_changed {
            return Ok(None);
        }
        self.session_changed = false;

        match self.session_id {
            Some(id) => {
                store.save(&id, &self.session).await?;
                Ok(None)
            }
            None => {
                let id = crate::session::start_session(store, &self.session).await?;
                self.session_id = Some(id);
                Ok(Some(id))
            }
        }
    }

    /// The part of the context handlers get to see
    pub fn into_request_state(self) -> RequestState {
        RequestState {
            session_id: self.session_id,
            current_user: self.current_user,
            locale: self.locale,
            flash: self.flash,
        }
    }
}

/// Published to handlers as a request extension once the pipeline passed
#[derive(Debug, Clone)]
pub struct RequestState {
    pub session_id: Option<SessionId>,
    pub current_user: Option<User>,
    pub locale: Locale,
    pub flash: Flash,
}

/// A step run before the request handler
#[async_trait::async_trait]
pub trait BeforeAction: Send + Sync {
    fn name(&self) -> &'static str;

    async fn call(&self, app: &AppContext, ctx: &mut RequestContext) -> AppResult<Flow>;
}

/// Ordered before-action pipeline
#[derive(Default)]
pub struct BeforeActions {
    steps: Vec<Arc<dyn BeforeAction>>,
}

impl BeforeActions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Authorize, then SetLocaleFromParams
    pub fn standard() -> Self {
        Self::new().push(Authorize).push(SetLocaleFromParams)
    }

    pub fn push(mut self, step: impl BeforeAction + 'static) -> Self {
        self.steps.push(Arc::new(step));
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Runs the steps in order, stopping at the first halt
    pub async fn run(&self, app: &AppContext, ctx: &mut RequestContext) -> AppResult<Flow> {
        for step in &self.steps {
            if let Flow::Halt(response) = step.call(app, ctx).await? {
                tracing::debug!(step = step.name(), path = %ctx.path, "Before-action halted request");
                return Ok(Flow::Halt(response));
            }
        }
        Ok(Flow::Continue)
    }
}

/// Requires the session to reference an existing user
pub struct Authorize;

#[async_trait::async_trait]
impl BeforeAction for Authorize {
    fn name(&self) -> &'static str {
        "authorize"
    }

    async fn call(&self, app: &AppContext, ctx: &mut RequestContext) -> AppResult<Flow> {
        if app.config.is_public_path(&ctx.path) {
            return Ok(Flow::Continue);
        }

        let user = match ctx.session.user_id {
            Some(user_id) => app
                .users
                .find_by_id(&user_id)
                .await
                .map_err(AppError::user_store)?,
            None => None,
        };

        if let Some(user) = user {
            if app.config.logging.enable_user_identifiers {
                tracing::debug!(user_id = %user.id, path = %ctx.path, "Authorized request");
            } else {
                tracing::debug!(
                    user_hash = %log_safe_id(&user.id.to_string(), &app.config.logging.hash_salt),
                    path = %ctx.path,
                    "Authorized request"
                );
            }
            ctx.current_user = Some(user);
            return Ok(Flow::Continue);
        }

        tracing::info!(
            path = %ctx.path,
            stale_session = ctx.session.user_id.is_some(),
            "No logged-in user, redirecting to login"
        );
        metrics::UNAUTHORIZED_REDIRECTS_TOTAL.inc();

        ctx.flash_next(FlashKind::Notice, PLEASE_LOG_IN);
        Ok(Flow::Halt(
            Redirect::to(&app.config.login_url).into_response(),
        ))
    }
}

/// Switches the request locale from the `locale` parameter
pub struct SetLocaleFromParams;

#[async_trait::async_trait]
impl BeforeAction for SetLocaleFromParams {
    fn name(&self) -> &'static str {
        "set_locale_from_params"
    }

    async fn call(&self, app: &AppContext, ctx: &mut RequestContext) -> AppResult<Flow> {
        let switch = i18n::negotiate(&app.config.i18n.available_locales, ctx.param(LOCALE_PARAM));

        match switch {
            LocaleSwitch::Unchanged => {}
            LocaleSwitch::Switched(locale) => {
                tracing::debug!(locale = %locale, "Locale switched from params");
                ctx.locale = locale;
            }
            LocaleSwitch::Unsupported(code) => {
                let notice = i18n::unsupported_locale_notice(&code);
                tracing::error!(locale = %code, "{}", notice);
                metrics::UNSUPPORTED_LOCALE_TOTAL.inc();
                ctx.flash_now(FlashKind::Notice, notice);
            }
        }

        Ok(Flow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db::MemoryUserStore;
    use crate::session::MemorySessionStore;
    use axum::http::{StatusCode, header::LOCATION};
    use std::io::Write;
    use std::sync::Mutex;
    use tracing_subscriber::fmt::MakeWriter;

    const TEST_COST: u32 = 4;

    /// Collects formatted log output
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CapturedLogs {
        type Writer = CapturedLogs;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    struct Fixture {
        app: AppContext,
        users: Arc<MemoryUserStore>,
        sessions: Arc<MemorySessionStore>,
    }

    fn fixture() -> Fixture {
        let users = Arc::new(MemoryUserStore::new());
        let sessions = Arc::new(MemorySessionStore::new());
        let app = AppContext::new(users.clone(), sessions.clone(), Arc::new(Config::default()));
        Fixture {
            app,
            users,
            sessions,
        }
    }

    fn request(path: &str, params: &[(&str, &str)], session: Option<SessionData>) -> RequestContext {
        let params = params
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let session_id = session.as_ref().map(|_| SessionId::generate());
        RequestContext::new(path, params, session_id, session, Locale::new("en").unwrap())
    }

    fn logged_in(user: &User) -> Option<SessionData> {
        Some(SessionData {
            user_id: Some(user.id),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_missing_session_redirects_to_login() {
        let f = fixture();
        let mut ctx = request("/", &[], None);

        let flow = Authorize.call(&f.app, &mut ctx).await.unwrap();

        let Flow::Halt(response) = flow else {
            panic!("expected redirect");
        };
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], "/login");
        assert_eq!(ctx.session.flash.notice(), Some(PLEASE_LOG_IN));
        assert!(ctx.session_changed());
    }

    #[tokio::test]
    async fn test_stale_user_id_redirects() {
        let f = fixture();
        let user = User::new("ghost", "secret", TEST_COST).unwrap();
        let mut ctx = request("/", &[], logged_in(&user));

        let flow = Authorize.call(&f.app, &mut ctx).await.unwrap();
        assert!(matches!(flow, Flow::Halt(_)));
        assert!(ctx.current_user.is_none());
    }

    #[tokio::test]
    async fn test_existing_user_continues() {
        let f = fixture();
        let user = User::new("dave", "secret", TEST_COST).unwrap();
        f.users.insert(user.clone()).await;
        let mut ctx = request("/", &[], logged_in(&user));

        let flow = Authorize.call(&f.app, &mut ctx).await.unwrap();
        assert!(matches!(flow, Flow::Continue));
        assert_eq!(ctx.current_user.as_ref().map(|u| u.id), Some(user.id));
        assert!(!ctx.session_changed());
    }

    #[tokio::test]
    async fn test_public_path_skips_authorization() {
        let f = fixture();
        let mut ctx = request("/login", &[], None);
        let flow = Authorize.call(&f.app, &mut ctx).await.unwrap();
        assert!(matches!(flow, Flow::Continue));
    }

    #[tokio::test]
    async fn test_known_locale_is_applied() {
        let f = fixture();
        let mut ctx = request("/", &[("locale", "es")], None);
        SetLocaleFromParams.call(&f.app, &mut ctx).await.unwrap();
        assert_eq!(ctx.locale.as_str(), "es");
        assert!(ctx.flash.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_locale_keeps_locale_and_flashes_now() {
        let f = fixture();
        let mut ctx = request("/", &[("locale", "fr")], None);
        SetLocaleFromParams.call(&f.app, &mut ctx).await.unwrap();
        assert_eq!(ctx.locale.as_str(), "en");
        assert_eq!(ctx.flash.notice(), Some("fr translation not available"));
        // flash.now is not persisted
        assert!(!ctx.session_changed());
    }

    #[tokio::test]
    async fn test_unknown_locale_is_logged_as_error() {
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        // Current-thread test runtime, so the thread-local default covers the call
        let _guard = tracing::subscriber::set_default(subscriber);

        let f = fixture();
        let mut ctx = request("/", &[("locale", "fr")], None);
        SetLocaleFromParams.call(&f.app, &mut ctx).await.unwrap();

        let output = logs.contents();
        let line = output
            .lines()
            .find(|l| l.contains("fr translation not available"))
            .unwrap_or_else(|| panic!("no unsupported locale event in {:?}", output));
        assert!(line.contains("ERROR"));
        assert!(line.contains("locale=fr"));
    }

    #[tokio::test]
    async fn test_pipeline_stops_at_first_halt() {
        let f = fixture();
        let mut ctx = request("/", &[("locale", "es")], None);

        let flow = f.app.before_actions.run(&f.app, &mut ctx).await.unwrap();
        assert!(matches!(flow, Flow::Halt(_)));
        // SetLocaleFromParams never ran
        assert_eq!(ctx.locale.as_str(), "en");
        assert_eq!(
            f.app.before_actions.names(),
            vec!["authorize", "set_locale_from_params"]
        );
    }

    #[tokio::test]
    async fn test_commit_issues_session_for_redirect_notice() {
        let f = fixture();
        let mut ctx = request("/", &[], None);
        f.app.before_actions.run(&f.app, &mut ctx).await.unwrap();

        let issued = ctx.commit(f.sessions.as_ref()).await.unwrap().unwrap();
        let stored = f.sessions.load(&issued).await.unwrap().unwrap();
        assert_eq!(stored.flash.notice(), Some(PLEASE_LOG_IN));

        // Nothing left to write
        assert_eq!(ctx.commit(f.sessions.as_ref()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_carried_flash_is_consumed_once() {
        let mut data = SessionData::default();
        data.flash.set(FlashKind::Notice, PLEASE_LOG_IN);
        let ctx = request("/login", &[], Some(data));

        assert_eq!(ctx.flash.notice(), Some(PLEASE_LOG_IN));
        assert!(ctx.session.flash.is_empty());
        assert!(ctx.session_changed());
    }

    #[test]
    fn test_unknown_session_id_is_dropped() {
        let ctx = RequestContext::new(
            "/",
            HashMap::new(),
            Some(SessionId::generate()),
            None,
            Locale::new("en").unwrap(),
        );
        assert!(ctx.session_id.is_none());
    }
}
