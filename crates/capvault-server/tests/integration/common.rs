use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::Router;
use axum::extract::{Query, State};
use axum::response::Html;
use axum::routing::get;
use testcontainers::core::{ContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage, ImageExt};
use tokio::net::TcpListener;

use capvault_core::ScraperConfig;
use capvault_db::{Database, DatabaseConfig};
use capvault_server::routes;
use capvault_server::state::AppState;

/// Router under test plus the handles a test may need to poke at.
pub struct TestApp {
    pub router: Router,
    pub db: Database,
    pub scraper: ScraperConfig,
    /// Number of catalog pages served so far.
    pub catalog_hits: Arc<AtomicUsize>,
    _container: ContainerAsync<GenericImage>,
}

impl TestApp {
    pub fn hits(&self) -> usize {
        self.catalog_hits.load(Ordering::SeqCst)
    }
}

/// Spin up PostgreSQL and a local catalog, and return the app wired to both.
pub async fn setup_test_app() -> TestApp {
    let container = GenericImage::new("postgres", "16")
        .with_exposed_port(ContainerPort::Tcp(5432))
        .with_wait_for(WaitFor::message_on_stderr(
            "database system is ready to accept connections",
        ))
        .with_env_var("POSTGRES_PASSWORD", "postgres")
        .with_env_var("POSTGRES_DB", "capvault_test")
        .start()
        .await
        .expect("Failed to start PostgreSQL container");

    let host = container.get_host().await.expect("Failed to get host");
    let port = container
        .get_host_port_ipv4(5432)
        .await
        .expect("Failed to get port");

    let config = DatabaseConfig::new(format!(
        "postgresql://postgres:postgres@{host}:{port}/capvault_test"
    ));
    let db = retry_connect(&config).await;
    db.migrate().await.expect("Failed to run migrations");

    let (base_url, catalog_hits) = spawn_catalog().await;
    let scraper = ScraperConfig {
        base_url,
        ..ScraperConfig::default()
    };

    let state = Arc::new(
        AppState::new(db.clone(), scraper.clone()).expect("Failed to build app state"),
    );

    TestApp {
        router: routes::router(state),
        db,
        scraper,
        catalog_hits,
        _container: container,
    }
}

async fn retry_connect(config: &DatabaseConfig) -> Database {
    for _ in 0..30 {
        if let Ok(db) = Database::connect(config).await {
            return db;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    panic!("Failed to connect to test database");
}

/// Serve a fake group-buy catalog: every page holds a single card named
/// after its section id, so multi-page sections repeat the same product.
async fn spawn_catalog() -> (String, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = Router::new()
        .route("/shop", get(catalog_page))
        .with_state(hits.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}/shop"), hits)
}

async fn catalog_page(
    State(hits): State<Arc<AtomicUsize>>,
    Query(params): Query<HashMap<String, String>>,
) -> Html<String> {
    hits.fetch_add(1, Ordering::SeqCst);
    let section = params.get("batch_id").cloned().unwrap_or_default();
    Html(format!(
        r#"<html><body><main>
            <div class="product-item">
                <h3>Cap {section}</h3>
                <span class="price">$10.00</span>
            </div>
        </main></body></html>"#
    ))
}
