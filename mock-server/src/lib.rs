use std::{collections::BTreeMap, sync::Arc};

use axum::{
    body::Bytes,
    extract::{Form, Path, Query, State},
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{any, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Widget {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Deserialize)]
pub struct CreateWidget {
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Deserialize)]
pub struct CreateWidgetForm {
    pub name: String,
    pub tag: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateWidget {
    pub name: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Deserialize)]
pub struct ListParams {
    pub tag: Option<String>,
    pub limit: Option<usize>,
}

/// Error body returned for every non-2xx widget response.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub err: String,
}

/// Everything the server saw of a request sent to `/echo`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Echo {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub headers: BTreeMap<String, Vec<String>>,
    pub body: String,
}

pub type Db = Arc<RwLock<BTreeMap<Uuid, Widget>>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(BTreeMap::new()));
    Router::new()
        .route("/widgets", get(list_widgets).post(create_widget))
        .route("/widgets/form", post(create_widget_form))
        .route("/widgets/{id}", get(get_widget).put(update_widget).delete(delete_widget))
        .route("/echo", any(echo))
        .route("/echo/{*rest}", any(echo))
        .route("/empty", get(empty))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    tracing::info!(addr = ?listener.local_addr().ok(), "mock server listening");
    axum::serve(listener, app()).await
}

fn not_found(id: Uuid) -> Response {
    let body = ApiError {
        err: format!("widget {id} not found"),
    };
    (StatusCode::NOT_FOUND, Json(body)).into_response()
}

async fn list_widgets(State(db): State<Db>, Query(params): Query<ListParams>) -> Json<Vec<Widget>> {
    let widgets = db.read().await;
    let matching = widgets
        .values()
        .filter(|w| params.tag.as_ref().is_none_or(|tag| w.tags.contains(tag)))
        .take(params.limit.unwrap_or(usize::MAX))
        .cloned()
        .collect();
    Json(matching)
}

async fn create_widget(State(db): State<Db>, Json(input): Json<CreateWidget>) -> (StatusCode, Json<Widget>) {
    let widget = Widget {
        id: Uuid::new_v4(),
        name: input.name,
        tags: input.tags,
    };
    db.write().await.insert(widget.id, widget.clone());
    tracing::debug!(id = %widget.id, "created widget");
    (StatusCode::CREATED, Json(widget))
}

async fn create_widget_form(State(db): State<Db>, Form(input): Form<CreateWidgetForm>) -> (StatusCode, Json<Widget>) {
    let widget = Widget {
        id: Uuid::new_v4(),
        name: input.name,
        tags: input.tag.into_iter().collect(),
    };
    db.write().await.insert(widget.id, widget.clone());
    (StatusCode::CREATED, Json(widget))
}

async fn get_widget(State(db): State<Db>, Path(id): Path<Uuid>) -> Response {
    let widgets = db.read().await;
    match widgets.get(&id) {
        Some(widget) => Json(widget.clone()).into_response(),
        None => not_found(id),
    }
}

async fn update_widget(State(db): State<Db>, Path(id): Path<Uuid>, Json(input): Json<UpdateWidget>) -> Response {
    let mut widgets = db.write().await;
    let Some(widget) = widgets.get_mut(&id) else {
        return not_found(id);
    };
    if let Some(name) = input.name {
        widget.name = name;
    }
    if let Some(tags) = input.tags {
        widget.tags = tags;
    }
    Json(widget.clone()).into_response()
}

async fn delete_widget(State(db): State<Db>, Path(id): Path<Uuid>) -> Response {
    let mut widgets = db.write().await;
    match widgets.remove(&id) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => not_found(id),
    }
}

async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Json<Echo> {
    let mut echoed: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in &headers {
        echoed
            .entry(name.as_str().to_owned())
            .or_default()
            .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
    }
    Json(Echo {
        method: method.to_string(),
        path: uri.path().to_owned(),
        query: uri.query().map(str::to_owned),
        headers: echoed,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

async fn empty() -> StatusCode {
    StatusCode::OK
}
