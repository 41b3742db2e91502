use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use radiopad_proto::catalog::{Catalog, CatalogError};
use tokio::net::TcpListener;

async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn fetches_station_array() {
    let app = Router::new().route(
        "/",
        get(|| async {
            r#"[{"name":"A","url":"urlA"},{"name":"B","url":"urlB"},{"name":"C","url":"urlC"}]"#
        }),
    );
    let base = serve(app).await;

    let catalog = Catalog::load(&base).await.unwrap();
    assert_eq!(catalog.len(), 3);
    assert_eq!(catalog.get(2).name, "C");
    assert_eq!(catalog.get(2).url, "urlC");
}

#[tokio::test]
async fn empty_array_is_fatal() {
    let app = Router::new().route("/", get(|| async { "[]" }));
    let base = serve(app).await;

    let err = Catalog::load(&base).await.unwrap_err();
    assert!(matches!(err, CatalogError::Empty));
}

#[tokio::test]
async fn unparseable_body_is_parse_error() {
    let app = Router::new().route("/", get(|| async { "<html>maintenance</html>" }));
    let base = serve(app).await;

    let err = Catalog::load(&base).await.unwrap_err();
    assert!(matches!(err, CatalogError::Parse(_)));
}

#[tokio::test]
async fn server_error_is_fetch_error() {
    let app = Router::new().route("/", get(|| async { StatusCode::BAD_GATEWAY }));
    let base = serve(app).await;

    let err = Catalog::load(&base).await.unwrap_err();
    assert!(matches!(err, CatalogError::Fetch { .. }));
}

#[tokio::test]
async fn unreachable_host_is_fetch_error() {
    // Bind then drop to get a port nothing listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = Catalog::load(&format!("http://{}", addr)).await.unwrap_err();
    assert!(matches!(err, CatalogError::Fetch { .. }));
}
