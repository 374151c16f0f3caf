//! # API crate — HTTP surface of the shopping service
//!
//! Every route the frontends call is declared here, one handler module per
//! resource, over a shared [`AppState`] (database pool + identity context).
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`auth`] | OpenID Connect identity context (Keycloak), PKCE login flow, role checks |
//! | [`error`] | The `{statusCode, message}` error envelope every route answers with |
//! | [`handlers`] | Request handlers: boutiques, magasins, items, shared lists, sessions |
//! | [`state`] | [`AppState`] shared by every handler |
//!
//! ## Routes
//!
//! | Route | Methods | Description |
//! |-------|---------|-------------|
//! | `/boutique/create` | POST | Create a boutique with a six-digit code |
//! | `/boutique/:code` | GET | Boutique with magasins, items and counts |
//! | `/boutique/:code/magasins/add` | POST | Append a magasin |
//! | `/boutique/:code/magasins/:id` | DELETE | Remove a magasin and its items |
//! | `/boutique/:code/magasins/:id/items` | GET | Items of one magasin |
//! | `/boutique/:code/magasins/:id/items/add` | POST | Add an item |
//! | `/boutique/:code/magasins/:id/items/:item_id` | PUT, DELETE | Update or remove an item |
//! | `/boutique/:code/magasins/:id/items/:item_id/consume` | POST | Decrease stock (clamped at 0) |
//! | `/boutique/:code/magasins/:id/items/:item_id/restock` | POST | Set stock, or refill to ideal |
//! | `/items` | GET | Shared-catalog search (`?search=`) |
//! | `/lists` | GET, POST | Shared shopping lists |
//! | `/lists/:id/add-item` | POST | Add (or merge) an entry |
//! | `/lists/:id/toggle-item` | POST | Check/uncheck an entry |
//! | `/lists/:id/remove-item` | POST | Delete an entry |
//! | `/lists/:id/clear-checked` | POST | Drop checked entries |
//! | `/auth/me` | GET | Session snapshot |
//! | `/auth/login` | GET | Redirect to the provider (PKCE) |
//! | `/auth/callback` | GET | Finish the login |
//! | `/auth/logout` | POST | End the session, redirect to the portal |
//! | `/auth/portal` | GET | Redirect to the shared portal |

use axum::routing::{delete, get, post, put};
use axum::Router;

pub mod auth;
pub mod error;
pub mod handlers;
pub mod state;

pub use error::Error;
pub use state::AppState;

/// Build the application router over a shared [`AppState`].
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/boutique/create", post(handlers::boutiques::create))
        .route("/boutique/:code", get(handlers::boutiques::show))
        .route("/boutique/:code/magasins/add", post(handlers::magasins::add))
        .route(
            "/boutique/:code/magasins/:id",
            delete(handlers::magasins::remove),
        )
        .route(
            "/boutique/:code/magasins/:id/items",
            get(handlers::items::index),
        )
        .route(
            "/boutique/:code/magasins/:id/items/add",
            post(handlers::items::add),
        )
        .route(
            "/boutique/:code/magasins/:id/items/:item_id",
            put(handlers::items::update).delete(handlers::items::remove),
        )
        .route(
            "/boutique/:code/magasins/:id/items/:item_id/consume",
            post(handlers::items::consume),
        )
        .route(
            "/boutique/:code/magasins/:id/items/:item_id/restock",
            post(handlers::items::restock),
        )
        .route("/items", get(handlers::items::search))
        .route(
            "/lists",
            get(handlers::lists::index).post(handlers::lists::create),
        )
        .route("/lists/:id/add-item", post(handlers::lists::add_item))
        .route("/lists/:id/toggle-item", post(handlers::lists::toggle_item))
        .route("/lists/:id/remove-item", post(handlers::lists::remove_item))
        .route(
            "/lists/:id/clear-checked",
            post(handlers::lists::clear_checked),
        )
        .route("/auth/me", get(handlers::auth::me))
        .route("/auth/login", get(handlers::auth::login))
        .route("/auth/callback", get(handlers::auth::callback))
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/auth/portal", get(handlers::auth::portal))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::header::{CONTENT_TYPE, LOCATION};
    use axum::http::{Method, Request, StatusCode};
    use axum::Router;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::auth::{Identity, IdentityConfig};
    use crate::state::AppState;

    async fn test_app() -> Router {
        let pool = store::connect("sqlite::memory:").await.unwrap();
        store::migrate(&pool).await.unwrap();
        let identity = Arc::new(Identity::new(
            IdentityConfig {
                issuer_url: None,
                client_id: "shopping".into(),
                redirect_uri: "http://localhost:3000/auth/callback".into(),
                access_role: "shopping.access".into(),
                portal_url: "https://cyriongames.fr".into(),
                refresh_token: None,
            },
            pool.clone(),
        ));
        crate::router(AppState::new(pool, identity))
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let request = match body {
            Some(body) => Request::builder()
                .method(method)
                .uri(uri)
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn boutique_creation_validates_name_and_code() {
        let app = test_app().await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/boutique/create",
            Some(json!({"code": "123456"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["statusCode"], 400);
        assert_eq!(body["message"], "Le nom de la boutique est requis");

        for code in ["123", "1234567", "12345a", ""] {
            let (status, body) = send(
                &app,
                Method::POST,
                "/boutique/create",
                Some(json!({"name": "Maison", "code": code})),
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["message"], "Le code PIN doit contenir exactement 6 chiffres");
        }

        let (status, body) = send(
            &app,
            Method::POST,
            "/boutique/create",
            Some(json!({"name": "  Maison  ", "code": "123456"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Maison");
        assert_eq!(body["code"], "123456");
    }

    #[tokio::test]
    async fn duplicate_code_answers_a_french_conflict() {
        let app = test_app().await;
        let create = json!({"name": "Maison", "code": "111111"});

        let (status, _) = send(&app, Method::POST, "/boutique/create", Some(create.clone())).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, Method::POST, "/boutique/create", Some(create)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["statusCode"], 409);
        assert_eq!(
            body["message"],
            "Ce code PIN est déjà utilisé. Choisissez un autre code."
        );
    }

    #[tokio::test]
    async fn missing_boutique_is_a_404_envelope() {
        let app = test_app().await;
        let (status, body) = send(&app, Method::GET, "/boutique/999999", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["statusCode"], 404);
        assert_eq!(body["message"], "Boutique non trouvée");
    }

    #[tokio::test]
    async fn stocking_flow_updates_shopping_counts() {
        let app = test_app().await;
        send(
            &app,
            Method::POST,
            "/boutique/create",
            Some(json!({"name": "Maison", "code": "123456"})),
        )
        .await;

        let (status, magasin) = send(
            &app,
            Method::POST,
            "/boutique/123456/magasins/add",
            Some(json!({"name": "Frigo", "emoji": "🧊"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(magasin["position"], 0);
        assert_eq!(magasin["itemsCount"], 0);
        assert_eq!(magasin["shoppingCount"], 0);
        assert_eq!(magasin["items"], json!([]));
        let magasin_id = magasin["id"].as_i64().unwrap();

        let (status, item) = send(
            &app,
            Method::POST,
            &format!("/boutique/123456/magasins/{magasin_id}/items/add"),
            Some(json!({"name": "Lait", "idealQuantity": 2})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(item["currentQuantity"], 0);
        let item_id = item["id"].as_i64().unwrap();

        let (_, detail) = send(&app, Method::GET, "/boutique/123456", None).await;
        assert_eq!(detail["magasins"][0]["itemsCount"], 1);
        assert_eq!(detail["magasins"][0]["shoppingCount"], 1);

        // Restock without a body refills to the ideal level.
        let (status, item) = send(
            &app,
            Method::POST,
            &format!("/boutique/123456/magasins/{magasin_id}/items/{item_id}/restock"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(item["currentQuantity"], 2);

        let (_, detail) = send(&app, Method::GET, "/boutique/123456", None).await;
        assert_eq!(detail["magasins"][0]["shoppingCount"], 0);

        let (_, item) = send(
            &app,
            Method::POST,
            &format!("/boutique/123456/magasins/{magasin_id}/items/{item_id}/consume"),
            Some(json!({"quantity": 1})),
        )
        .await;
        assert_eq!(item["currentQuantity"], 1);

        let (_, detail) = send(&app, Method::GET, "/boutique/123456", None).await;
        assert_eq!(detail["magasins"][0]["shoppingCount"], 1);
    }

    #[tokio::test]
    async fn item_routes_validate_their_ancestors() {
        let app = test_app().await;
        send(
            &app,
            Method::POST,
            "/boutique/create",
            Some(json!({"name": "Maison", "code": "123456"})),
        )
        .await;
        send(
            &app,
            Method::POST,
            "/boutique/create",
            Some(json!({"name": "Autre", "code": "654321"})),
        )
        .await;
        let (_, magasin) = send(
            &app,
            Method::POST,
            "/boutique/123456/magasins/add",
            Some(json!({"name": "Frigo"})),
        )
        .await;
        let magasin_id = magasin["id"].as_i64().unwrap();
        // Emoji fell back to the default.
        assert_eq!(magasin["emoji"], "🛒");

        // The magasin exists, but under another boutique.
        let (status, body) = send(
            &app,
            Method::GET,
            &format!("/boutique/654321/magasins/{magasin_id}/items"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Magasin non trouvé");

        // Ids that do not parse count as missing.
        let (status, body) = send(
            &app,
            Method::GET,
            "/boutique/123456/magasins/abc/items",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Code boutique et ID magasin requis");

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/boutique/123456/magasins/{magasin_id}/items/zero/consume"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Code boutique, ID magasin et ID item requis");

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/boutique/123456/magasins/{magasin_id}/items/add"),
            Some(json!({"name": "   "})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Le nom de l'article est requis");

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/boutique/123456/magasins/{magasin_id}/items/787878/consume"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Article non trouvé");
    }

    #[tokio::test]
    async fn updating_and_deleting_items() {
        let app = test_app().await;
        send(
            &app,
            Method::POST,
            "/boutique/create",
            Some(json!({"name": "Maison", "code": "222222"})),
        )
        .await;
        let (_, magasin) = send(
            &app,
            Method::POST,
            "/boutique/222222/magasins/add",
            Some(json!({"name": "Placard"})),
        )
        .await;
        let magasin_id = magasin["id"].as_i64().unwrap();
        let (_, item) = send(
            &app,
            Method::POST,
            &format!("/boutique/222222/magasins/{magasin_id}/items/add"),
            Some(json!({"name": "Riz"})),
        )
        .await;
        assert_eq!(item["idealQuantity"], 1);
        let item_id = item["id"].as_i64().unwrap();

        let (status, updated) = send(
            &app,
            Method::PUT,
            &format!("/boutique/222222/magasins/{magasin_id}/items/{item_id}"),
            Some(json!({"name": "  Riz complet ", "idealQuantity": 3})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["name"], "Riz complet");
        assert_eq!(updated["idealQuantity"], 3);
        assert_eq!(updated["currentQuantity"], 0);

        let (status, body) = send(
            &app,
            Method::DELETE,
            &format!("/boutique/222222/magasins/{magasin_id}/items/{item_id}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        let (status, body) = send(
            &app,
            Method::DELETE,
            &format!("/boutique/222222/magasins/{magasin_id}/items/{item_id}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Article non trouvé");
    }

    #[tokio::test]
    async fn deleting_a_magasin_takes_its_items_along() {
        let app = test_app().await;
        send(
            &app,
            Method::POST,
            "/boutique/create",
            Some(json!({"name": "Maison", "code": "333333"})),
        )
        .await;
        let (_, magasin) = send(
            &app,
            Method::POST,
            "/boutique/333333/magasins/add",
            Some(json!({"name": "Cave", "emoji": "🍷"})),
        )
        .await;
        let magasin_id = magasin["id"].as_i64().unwrap();
        send(
            &app,
            Method::POST,
            &format!("/boutique/333333/magasins/{magasin_id}/items/add"),
            Some(json!({"name": "Rouge", "idealQuantity": 6})),
        )
        .await;

        let (status, body) = send(
            &app,
            Method::DELETE,
            &format!("/boutique/333333/magasins/{magasin_id}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        let (status, body) = send(
            &app,
            Method::GET,
            &format!("/boutique/333333/magasins/{magasin_id}/items"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Magasin non trouvé");
    }

    #[tokio::test]
    async fn shared_lists_deduplicate_and_toggle() {
        let app = test_app().await;

        // No body at all: the list still gets its default name.
        let (status, list) = send(&app, Method::POST, "/lists", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list["name"], "Ma liste");
        assert_eq!(list["items"], json!([]));
        let list_id = list["id"].as_i64().unwrap();

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/lists/{list_id}/add-item"),
            Some(json!({"itemName": "   "})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Nom de l'item requis");

        let (_, entry) = send(
            &app,
            Method::POST,
            &format!("/lists/{list_id}/add-item"),
            Some(json!({"itemName": "  Pommes "})),
        )
        .await;
        assert_eq!(entry["item"]["name"], "pommes");
        assert_eq!(entry["quantity"], 1);
        assert_eq!(entry["checked"], false);
        let entry_id = entry["id"].as_i64().unwrap();

        // Different casing merges into the same entry.
        let (_, merged) = send(
            &app,
            Method::POST,
            &format!("/lists/{list_id}/add-item"),
            Some(json!({"itemName": "POMMES", "quantity": 2})),
        )
        .await;
        assert_eq!(merged["id"].as_i64().unwrap(), entry_id);
        assert_eq!(merged["quantity"], 3);

        let (_, toggled) = send(
            &app,
            Method::POST,
            &format!("/lists/{list_id}/toggle-item"),
            Some(json!({"itemId": entry_id})),
        )
        .await;
        assert_eq!(toggled["checked"], true);

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/lists/{list_id}/toggle-item"),
            Some(json!({"itemId": 404404})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Item non trouve");

        let (_, body) = send(
            &app,
            Method::POST,
            &format!("/lists/{list_id}/clear-checked"),
            None,
        )
        .await;
        assert_eq!(body["success"], true);

        let (_, lists) = send(&app, Method::GET, "/lists", None).await;
        assert_eq!(lists[0]["items"], json!([]));

        // Removing an entry that is already gone still succeeds.
        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/lists/{list_id}/remove-item"),
            Some(json!({"itemId": entry_id})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
    }

    #[tokio::test]
    async fn catalog_search_is_case_insensitive() {
        let app = test_app().await;
        let (_, list) = send(&app, Method::POST, "/lists", Some(json!({"name": "Courses"}))).await;
        let list_id = list["id"].as_i64().unwrap();
        for name in ["Pommes", "poires", "pain"] {
            send(
                &app,
                Method::POST,
                &format!("/lists/{list_id}/add-item"),
                Some(json!({"itemName": name})),
            )
            .await;
        }

        let (status, hits) = send(&app, Method::GET, "/items?search=POM", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(hits, json!([{"id": 1, "name": "pommes"}]));

        let (_, all) = send(&app, Method::GET, "/items", None).await;
        assert_eq!(all.as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn auth_me_settles_unauthenticated_without_provider() {
        let app = test_app().await;
        let (status, body) = send(&app, Method::GET, "/auth/me", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "isLoading": false,
                "isAuthenticated": false,
                "hasAccess": false,
                "user": null
            })
        );
    }

    #[tokio::test]
    async fn auth_login_is_unavailable_without_provider() {
        let app = test_app().await;
        let (status, body) = send(&app, Method::GET, "/auth/login", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["statusCode"], 503);
        assert_eq!(body["message"], "Authentification indisponible");
    }

    #[tokio::test]
    async fn auth_redirects_point_at_the_portal() {
        let app = test_app().await;

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::GET)
                    .uri("/auth/portal")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(
            response.headers().get(LOCATION).unwrap(),
            "https://cyriongames.fr"
        );

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/auth/logout")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(
            response.headers().get(LOCATION).unwrap(),
            "https://cyriongames.fr"
        );
    }

    #[tokio::test]
    async fn auth_callback_requires_its_parameters() {
        let app = test_app().await;
        let (status, body) = send(&app, Method::GET, "/auth/callback?code=abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Paramètres de connexion requis");
    }

    #[tokio::test]
    async fn malformed_bodies_still_answer_the_envelope() {
        let app = test_app().await;

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/boutique/create")
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from("{pas du json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            body,
            json!({"statusCode": 400, "message": "Corps de requête invalide"})
        );

        // A body without a JSON content type gets the same envelope.
        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/lists/1/add-item")
                    .body(Body::from(r#"{"itemName": "pommes"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], "Corps de requête invalide");
    }
}
