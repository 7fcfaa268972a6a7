use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, ApiError, Echo, Widget};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn get(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

// --- list ---

#[tokio::test]
async fn list_widgets_empty() {
    let resp = app().oneshot(get("/widgets")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let widgets: Vec<Widget> = body_json(resp).await;
    assert!(widgets.is_empty());
}

// --- create ---

#[tokio::test]
async fn create_widget_returns_201() {
    let resp = app()
        .oneshot(json_request("POST", "/widgets", r#"{"name":"Sprocket","tags":["blue"]}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let widget: Widget = body_json(resp).await;
    assert_eq!(widget.name, "Sprocket");
    assert_eq!(widget.tags, ["blue"]);
}

#[tokio::test]
async fn create_widget_from_form() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/widgets/form")
                .header(http::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body("name=Gear+Box&tag=red".to_string())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let widget: Widget = body_json(resp).await;
    assert_eq!(widget.name, "Gear Box");
    assert_eq!(widget.tags, ["red"]);
}

#[tokio::test]
async fn create_widget_malformed_json_returns_422() {
    let resp = app()
        .oneshot(json_request("POST", "/widgets", r#"{"not_name":1}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// --- get ---

#[tokio::test]
async fn get_widget_not_found_has_error_body() {
    let resp = app()
        .oneshot(get("/widgets/00000000-0000-0000-0000-000000000000"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let err: ApiError = body_json(resp).await;
    assert!(err.err.contains("not found"));
}

#[tokio::test]
async fn get_widget_bad_uuid_returns_400() {
    let resp = app().oneshot(get("/widgets/not-a-uuid")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- delete ---

#[tokio::test]
async fn delete_widget_not_found() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/widgets/00000000-0000-0000-0000-000000000000")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- echo ---

#[tokio::test]
async fn echo_reflects_request() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri("/echo/a/b?x=1&y=2")
                .header("x-tag", "one")
                .header("x-tag", "two")
                .body("payload".to_string())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.method, "PATCH");
    assert_eq!(echo.path, "/echo/a/b");
    assert_eq!(echo.query.as_deref(), Some("x=1&y=2"));
    assert_eq!(echo.headers["x-tag"], ["one", "two"]);
    assert_eq!(echo.body, "payload");
}

#[tokio::test]
async fn empty_returns_no_body() {
    let resp = app().oneshot(get("/empty")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_bytes(resp).await.is_empty());
}

// --- full CRUD lifecycle ---

#[tokio::test]
async fn crud_lifecycle() {
    use tower::Service;

    let mut app = app().into_service();

    // create two widgets
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request("POST", "/widgets", r#"{"name":"Sprocket","tags":["blue"]}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Widget = body_json(resp).await;
    let id = created.id;

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request("POST", "/widgets", r#"{"name":"Cog","tags":["red"]}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    // list filtered by tag
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get("/widgets?tag=blue"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let widgets: Vec<Widget> = body_json(resp).await;
    assert_eq!(widgets.len(), 1);
    assert_eq!(widgets[0].id, id);

    // list with limit
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get("/widgets?limit=1"))
        .await
        .unwrap();
    let widgets: Vec<Widget> = body_json(resp).await;
    assert_eq!(widgets.len(), 1);

    // update: partial: only name
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request("PUT", &format!("/widgets/{id}"), r#"{"name":"Sprocket II"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Widget = body_json(resp).await;
    assert_eq!(updated.name, "Sprocket II");
    assert_eq!(updated.tags, ["blue"]); // unchanged

    // delete
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(
            Request::builder()
                .method("DELETE")
                .uri(&format!("/widgets/{id}"))
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());

    // get after delete: 404
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get(&format!("/widgets/{id}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
