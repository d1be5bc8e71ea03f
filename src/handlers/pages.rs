use axum::response::Html;

static INDEX_HTML: &str = include_str!("../../assets/index.html");

/// The single-page UI: drag & drop upload, preview, download, error area.
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}
