// Copyright 2023 Remi Bernotavicius

//! HTTP surface. Every collection answers `PUT /c` (create), `GET /c` (list), and
//! `GET`/`PUT`/`DELETE /c/{id}`. Each request runs as one transaction against the shared
//! connection.

use crate::database;
use crate::error::{Error, Result};
use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use diesel::Connection as _;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::{Arc, Mutex};

mod handlers;

#[derive(Clone)]
pub struct AppState {
    conn: Arc<Mutex<database::Connection>>,
}

impl AppState {
    pub fn new(conn: database::Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Runs `op` on the blocking pool inside a transaction while holding the only handle to
    /// the database, so every read observes a consistent snapshot and a failed write leaves
    /// nothing behind.
    async fn run<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&mut database::Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().map_err(|_| Error::LockPoisoned)?;
            conn.transaction(op)
        })
        .await?
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::ReferentialConflict(_) => StatusCode::CONFLICT,
            Error::Storage(_) | Error::LockPoisoned | Error::Task(_) => {
                log::error!("{self}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        if status != StatusCode::INTERNAL_SERVER_ERROR {
            log::debug!("rejected request: {self}");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// A JSON request body. Clients don't always send a `Content-Type`, so unlike [`Json`] this
/// only looks at the bytes.
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> std::result::Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| Error::validation(e.body_text()))?;
        let value = serde_json::from_slice(&bytes)
            .map_err(|e| Error::validation(format!("malformed body: {e}")))?;
        Ok(Self(value))
    }
}

pub fn router(state: AppState) -> Router {
    use handlers::*;

    Router::new()
        .route("/ingredients", put(add_ingredient).get(list_ingredients))
        .route(
            "/ingredients/{id}",
            get(get_ingredient)
                .put(update_ingredient)
                .delete(delete_ingredient),
        )
        .route(
            "/ingredient_categories",
            put(add_ingredient_category).get(list_ingredient_categories),
        )
        .route(
            "/ingredient_categories/{id}",
            get(get_ingredient_category)
                .put(update_ingredient_category)
                .delete(delete_ingredient_category),
        )
        .route(
            "/ingredient_category_mappings",
            put(add_ingredient_category_mapping).get(list_ingredient_category_mappings),
        )
        .route(
            "/ingredient_category_mappings/{id}",
            get(get_ingredient_category_mapping)
                .put(update_ingredient_category_mapping)
                .delete(delete_ingredient_category_mapping),
        )
        .route("/properties", put(add_property).get(list_properties))
        .route(
            "/properties/{id}",
            get(get_property)
                .put(update_property)
                .delete(delete_property),
        )
        .route(
            "/ingredient_properties",
            put(add_ingredient_property).get(list_ingredient_properties),
        )
        .route(
            "/ingredient_properties/{id}",
            get(get_ingredient_property)
                .put(update_ingredient_property)
                .delete(delete_ingredient_property),
        )
        .route("/dishes", put(add_dish).get(list_dishes))
        .route(
            "/dishes/{id}",
            get(get_dish).put(update_dish).delete(delete_dish),
        )
        .route("/meals", put(add_meal).get(list_meals))
        .route(
            "/meals/{id}",
            get(get_meal).put(update_meal).delete(delete_meal),
        )
        .route("/meal_dishes", put(add_meal_dish).get(list_meal_dishes))
        .route(
            "/meal_dishes/{id}",
            get(get_meal_dish)
                .put(update_meal_dish)
                .delete(delete_meal_dish),
        )
        .route(
            "/meal_dish_ingredients",
            put(add_meal_dish_ingredient).get(list_meal_dish_ingredients),
        )
        .route(
            "/meal_dish_ingredients/{id}",
            get(get_meal_dish_ingredient)
                .put(update_meal_dish_ingredient)
                .delete(delete_meal_dish_ingredient),
        )
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    log::info!("shutting down");
}

pub async fn serve(conn: database::Connection, port: u16) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    log::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, router(AppState::new(conn)))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

#[cfg(test)]
use axum::http::Method;
#[cfg(test)]
use serde_json::Value;

#[cfg(test)]
async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    use axum::body::Body;
    use http_body_util::BodyExt as _;
    use tower::ServiceExt as _;

    let body = body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty);
    let request = axum::http::Request::builder()
        .method(method)
        .uri(uri)
        .body(body)
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[cfg(test)]
async fn ok(app: &Router, method: Method, uri: &str, body: Option<Value>) -> Value {
    let (status, value) = send(app, method.clone(), uri, body).await;
    assert_eq!(status, StatusCode::OK, "{method} {uri}: {value}");
    value
}

#[cfg(test)]
fn test_app() -> Router {
    router(AppState::new(database::in_memory()))
}

#[cfg(test)]
fn assert_summary(meal: &Value, expected: &[(&Value, f64)]) {
    let summary = meal["summary"].as_array().unwrap();
    assert_eq!(summary.len(), expected.len(), "{meal}");
    for (entry, (property_id, value)) in summary.iter().zip(expected) {
        assert_eq!(&entry["property_id"], *property_id);
        let actual = entry["value"].as_f64().unwrap();
        assert!((actual - value).abs() < 1e-3, "{actual} != {value}");
    }
}

#[tokio::test]
async fn tracks_meals_end_to_end() {
    let app = test_app();

    let mut ids = std::collections::HashMap::new();
    for (name, g, pieces) in [
        ("egg", 50, 1),
        ("bread", 51, 2),
        ("cream cheese", 28, 0),
        ("bagel", 0, 0),
    ] {
        let ingredient = ok(&app, Method::PUT, "/ingredients", Some(json!({ "name": name }))).await;
        assert_eq!(ingredient["category_mappings"], json!([]));
        let id = ingredient["id"].clone();
        if g > 0 {
            ok(
                &app,
                Method::PUT,
                &format!("/ingredients/{id}"),
                Some(json!({
                    "serving_size_g": g,
                    "serving_size_ml": 0,
                    "serving_size_pieces": pieces,
                })),
            )
            .await;
        }
        ids.insert(name, id);
    }

    let bread_category = ok(
        &app,
        Method::PUT,
        "/ingredient_categories",
        Some(json!({ "ingredient_id": ids["bread"] })),
    )
    .await;
    assert_eq!(bread_category["name"], "bread");
    let bread_category_id = bread_category["id"].clone();
    let other = ok(
        &app,
        Method::PUT,
        "/ingredient_categories",
        Some(json!({ "name": "test category w/ typo" })),
    )
    .await;
    ok(
        &app,
        Method::PUT,
        &format!("/ingredient_categories/{}", other["id"]),
        Some(json!({ "name": "test category" })),
    )
    .await;
    ok(
        &app,
        Method::PUT,
        "/ingredient_category_mappings",
        Some(json!({ "ingredient_id": ids["bagel"], "category_id": bread_category_id })),
    )
    .await;

    let calories = ok(&app, Method::PUT, "/properties", Some(json!({ "name": "calories", "parent_id": null }))).await["id"].clone();
    let fat = ok(&app, Method::PUT, "/properties", Some(json!({ "name": "fat" }))).await["id"].clone();
    let saturated = ok(
        &app,
        Method::PUT,
        "/properties",
        Some(json!({ "name": "saturated fat", "parent_id": fat })),
    )
    .await["id"]
        .clone();
    let protein = ok(&app, Method::PUT, "/properties", Some(json!({ "name": "protein_with_typo" }))).await["id"].clone();
    ok(
        &app,
        Method::PUT,
        &format!("/properties/{protein}"),
        Some(json!({ "name": "protein" })),
    )
    .await;

    for (ingredient, property, value) in [
        ("egg", &calories, 70.0),
        ("egg", &protein, 6.1),
        ("egg", &fat, 5.0),
        ("bread", &calories, 120.0),
        ("bread", &protein, 5.0),
        ("bread", &fat, 1.0),
        ("cream cheese", &calories, 70.0),
        ("cream cheese", &protein, 2.0),
        ("cream cheese", &fat, 5.0),
        ("cream cheese", &saturated, 1.0),
    ] {
        let row = ok(
            &app,
            Method::PUT,
            "/ingredient_properties",
            Some(json!({ "ingredient_id": ids[ingredient], "property_id": property })),
        )
        .await;
        assert_eq!(row["value"], 0.0);
        ok(
            &app,
            Method::PUT,
            &format!("/ingredient_properties/{}", row["id"]),
            Some(json!({ "value": value })),
        )
        .await;
    }
    for name in ["egg", "bread"] {
        ok(
            &app,
            Method::PUT,
            &format!("/ingredients/{}", ids[name]),
            Some(json!({ "fully_entered": true })),
        )
        .await;
    }

    let egg_on_bread = ok(&app, Method::PUT, "/dishes", Some(json!({ "name": "egg on bread" }))).await["id"].clone();
    let bread_and_cheese = ok(&app, Method::PUT, "/dishes", Some(json!({ "name": "bread and cheese" }))).await["id"].clone();

    let mut meals = vec![];
    for dishes in [vec![&egg_on_bread], vec![&egg_on_bread, &bread_and_cheese]] {
        let meal = ok(
            &app,
            Method::PUT,
            "/meals",
            Some(json!({ "timestamp_utc": 1749585958, "tz_offs_min": -420 })),
        )
        .await;
        for dish in dishes {
            let meal_dish = ok(
                &app,
                Method::PUT,
                "/meal_dishes",
                Some(json!({ "meal_id": meal["id"], "dish_id": dish })),
            )
            .await;
            let usages = if dish == &egg_on_bread {
                [("egg", 2, "pieces"), ("bread", 2, "pieces")]
            } else {
                [("bread", 2, "pieces"), ("cream cheese", 50, "mass")]
            };
            for (ingredient, quantity, unit) in usages {
                let usage = ok(
                    &app,
                    Method::PUT,
                    "/meal_dish_ingredients",
                    Some(json!({ "meal_dish_id": meal_dish["id"], "ingredient_id": ids[ingredient] })),
                )
                .await;
                ok(
                    &app,
                    Method::PUT,
                    &format!("/meal_dish_ingredients/{}", usage["id"]),
                    Some(json!({ "quantity": quantity, "unit": unit })),
                )
                .await;
            }
        }
        meals.push(meal["id"].clone());
    }

    let category = ok(&app, Method::GET, &format!("/ingredient_categories/{bread_category_id}"), None).await;
    let mappings = category["mappings"].as_array().unwrap().clone();
    assert_eq!(mappings.len(), 2);
    assert_eq!(mappings[0]["ingredient_id"], ids["bread"]);
    assert_eq!(mappings[1]["ingredient_id"], ids["bagel"]);
    assert_eq!(category["fully_entered"], false);
    let categories = ok(&app, Method::GET, "/ingredient_categories", None).await;
    assert_eq!(
        categories,
        json!([
            { "id": bread_category_id, "name": "bread", "fully_entered": false },
            { "id": other["id"], "name": "test category", "fully_entered": true },
        ])
    );

    let egg = ok(&app, Method::GET, &format!("/ingredients/{}", ids["egg"]), None).await;
    assert_eq!(egg["serving_size_g"], 50.0);
    assert_eq!(egg["properties"].as_array().unwrap().len(), 3);
    let listed = ok(&app, Method::GET, "/ingredients", None).await;
    assert!(listed[0].get("properties").is_none());

    let listed = ok(&app, Method::GET, "/meals", None).await;
    assert_summary(&listed[0], &[(&calories, 260.0), (&fat, 11.0), (&protein, 17.2)]);
    assert_eq!(listed[0]["summary_complete"], true);
    assert_eq!(listed[0]["dishes"][0]["ingredients"], json!([]));
    assert_summary(
        &listed[1],
        &[
            (&calories, 505.0),
            (&fat, 20.929),
            (&saturated, 1.786),
            (&protein, 25.771),
        ],
    );
    assert_eq!(listed[1]["summary_complete"], false);

    let second = ok(&app, Method::GET, &format!("/meals/{}", meals[1]), None).await;
    assert_eq!(second["timestamp_utc"], 1749585958);
    assert_eq!(second["tz_offs_min"], -420);
    let cheese_usage = &second["dishes"][1]["ingredients"][1];
    assert_eq!(cheese_usage["ingredient_id"], ids["cream cheese"]);
    assert_eq!(cheese_usage["quantity"], 50.0);
    assert_eq!(cheese_usage["unit"], "mass");

    ok(
        &app,
        Method::DELETE,
        &format!("/meal_dishes/{}", second["dishes"][1]["id"]),
        None,
    )
    .await;
    let second = ok(&app, Method::GET, &format!("/meals/{}", meals[1]), None).await;
    assert_eq!(second["dishes"].as_array().unwrap().len(), 1);
    assert_eq!(second["dishes"][0]["dish_id"], egg_on_bread);
    assert_eq!(second["summary_complete"], true);

    ok(&app, Method::DELETE, &format!("/meals/{}", meals[1]), None).await;
    let listed = ok(&app, Method::GET, "/meals", None).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["id"], meals[0]);

    ok(
        &app,
        Method::DELETE,
        &format!("/ingredient_category_mappings/{}", mappings[1]["id"]),
        None,
    )
    .await;
    let category = ok(&app, Method::GET, &format!("/ingredient_categories/{bread_category_id}"), None).await;
    assert_eq!(category["mappings"].as_array().unwrap().len(), 1);
    assert_eq!(category["fully_entered"], true);
}

#[tokio::test]
async fn failures_map_to_statuses() {
    let app = test_app();

    let (status, body) = send(&app, Method::GET, "/meals/42", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "meal 42 not found");

    let (status, _) = send(&app, Method::PUT, "/dishes/42", Some(json!({ "name": "x" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::PUT, "/dishes", Some(json!({ "name": "" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::PUT, "/ingredient_categories", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let request = axum::http::Request::builder()
        .method(Method::PUT)
        .uri("/dishes")
        .body(axum::body::Body::from("{not json"))
        .unwrap();
    let response = {
        use tower::ServiceExt as _;
        app.clone().oneshot(request).await.unwrap()
    };
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let egg = ok(&app, Method::PUT, "/ingredients", Some(json!({ "name": "egg" }))).await;
    let dish = ok(&app, Method::PUT, "/dishes", Some(json!({ "name": "eggs" }))).await;
    let meal = ok(&app, Method::PUT, "/meals", Some(json!({ "timestamp_utc": 0, "tz_offs_min": 0 }))).await;
    let meal_dish = ok(
        &app,
        Method::PUT,
        "/meal_dishes",
        Some(json!({ "meal_id": meal["id"], "dish_id": dish["id"] })),
    )
    .await;
    ok(
        &app,
        Method::PUT,
        "/meal_dish_ingredients",
        Some(json!({ "meal_dish_id": meal_dish["id"], "ingredient_id": egg["id"], "quantity": 1, "unit": "pieces" })),
    )
    .await;

    let (status, _) = send(&app, Method::DELETE, &format!("/ingredients/{}", egg["id"]), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = send(&app, Method::DELETE, &format!("/dishes/{}", dish["id"]), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        Method::PUT,
        "/meal_dish_ingredients",
        Some(json!({ "meal_dish_id": meal_dish["id"], "ingredient_id": egg["id"], "quantity": -1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let usages = ok(&app, Method::GET, "/meal_dish_ingredients", None).await;
    assert_eq!(usages.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn volume_usage_scales_summary() {
    let app = test_app();

    let milk = ok(
        &app,
        Method::PUT,
        "/ingredients",
        Some(json!({ "name": "milk", "serving_size_ml": 125 })),
    )
    .await;
    let calories = ok(&app, Method::PUT, "/properties", Some(json!({ "name": "calories" }))).await["id"].clone();
    ok(
        &app,
        Method::PUT,
        "/ingredient_properties",
        Some(json!({ "ingredient_id": milk["id"], "property_id": calories, "value": 60 })),
    )
    .await;
    let dish = ok(&app, Method::PUT, "/dishes", Some(json!({ "name": "cereal" }))).await;
    let meal = ok(&app, Method::PUT, "/meals", Some(json!({ "timestamp_utc": 0, "tz_offs_min": 0 }))).await;
    let meal_dish = ok(
        &app,
        Method::PUT,
        "/meal_dishes",
        Some(json!({ "meal_id": meal["id"], "dish_id": dish["id"] })),
    )
    .await;
    let usage = ok(
        &app,
        Method::PUT,
        "/meal_dish_ingredients",
        Some(json!({ "meal_dish_id": meal_dish["id"], "ingredient_id": milk["id"] })),
    )
    .await;

    let uri = format!("/meals/{}", meal["id"]);
    assert_eq!(ok(&app, Method::GET, &uri, None).await["summary"], json!([]));

    ok(
        &app,
        Method::PUT,
        &format!("/meal_dish_ingredients/{}", usage["id"]),
        Some(json!({ "quantity": 250, "unit": "ml" })),
    )
    .await;
    let meal = ok(&app, Method::GET, &uri, None).await;
    assert_summary(&meal, &[(&calories, 120.0)]);
    assert_eq!(meal["dishes"][0]["ingredients"][0]["unit"], "volume");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_requests_all_land() {
    let app = test_app();

    let mut requests = tokio::task::JoinSet::new();
    for n in 0..32 {
        let app = app.clone();
        requests.spawn(async move {
            ok(&app, Method::PUT, "/dishes", Some(json!({ "name": format!("dish {n}") }))).await
        });
    }
    while let Some(created) = requests.join_next().await {
        assert!(created.unwrap()["id"].is_number());
    }

    let dishes = ok(&app, Method::GET, "/dishes", None).await;
    assert_eq!(dishes.as_array().unwrap().len(), 32);
}
