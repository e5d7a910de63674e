use axum::response::Html;

const INDEX_HTML: &str = include_str!("../../assets/index.html");

/// GET / -- the generation form.
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}
