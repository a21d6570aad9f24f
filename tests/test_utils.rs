#![allow(dead_code)]

use depot_server::{
    config::Config,
    context::AppContext,
    db::{MemoryUserStore, User, UserStore},
    session::{MemorySessionStore, SessionTtl},
};
use std::sync::Arc;
use tokio::net::TcpListener;

// Lowest cost bcrypt accepts
pub const TEST_HASH_COST: u32 = 4;

pub struct TestApp {
    pub address: String,
    pub users: Arc<MemoryUserStore>,
    pub sessions: Arc<MemorySessionStore>,
    pub config: Arc<Config>,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.address, path)
    }

    pub async fn create_user(&self, name: &str, password: &str) -> User {
        let user = User::new(name, password, TEST_HASH_COST).unwrap();
        self.users.create(&user).await.unwrap();
        user
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(Config::default()).await
}

pub async fn spawn_app_with(mut config: Config) -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let address = format!("127.0.0.1:{}", port);

    config.password_hash_cost = TEST_HASH_COST;
    let config = Arc::new(config);

    let users = Arc::new(MemoryUserStore::new());
    let sessions = Arc::new(MemorySessionStore::with_ttl(SessionTtl::from_config(
        &config.session,
    )));
    let app_context = AppContext::new(users.clone(), sessions.clone(), config.clone());

    tokio::spawn(depot_server::serve(app_context, listener));

    TestApp {
        address,
        users,
        sessions,
        config,
    }
}

/// Browser-like client: keeps cookies, does not follow redirects
pub fn browser() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

pub fn location(response: &reqwest::Response) -> &str {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

pub async fn log_in(client: &reqwest::Client, app: &TestApp, name: &str, password: &str) {
    let response = client
        .post(app.url("/login"))
        .json(&serde_json::json!({ "name": name, "password": password }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
}
