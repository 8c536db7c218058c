use marquee_config::Config;
use marquee_core::Services;
use marquee_server::{build_router, AppState};
use marquee_store::{EmbeddedStore, LogMailer};
use reqwest::header::{COOKIE, LOCATION, SET_COOKIE};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;

const ADMIN: &str = "admin@example.com";

struct TestServer {
    base: String,
    client: Client,
    mailer: Arc<LogMailer>,
}

impl TestServer {
    async fn start() -> Self {
        let mut config = Config::default();
        config.auth.admin_emails = vec![ADMIN.to_string()];
        config.server.secure_cookies = false;

        let mailer = Arc::new(LogMailer::new());
        let services = Services::new(
            &config,
            Arc::new(EmbeddedStore::in_memory()),
            mailer.clone(),
            "integration-secret",
        )
        .expect("services");
        let app = build_router(AppState::new(services, &config), &[]);

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });

        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("client");
        Self {
            base: format!("http://{}", addr),
            client,
            mailer,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn post(&self, path: &str, body: Value, cookie: Option<&str>) -> reqwest::Response {
        let mut request = self.client.post(self.url(path)).json(&body);
        if let Some(cookie) = cookie {
            request = request.header(COOKIE, cookie);
        }
        request.send().await.expect("request")
    }

    /// Full OTP round trip, returning the `Cookie` header to send back
    async fn login(&self) -> String {
        let res = self.post("/api/send-otp", json!({ "email": ADMIN }), None).await;
        assert_eq!(res.status(), StatusCode::OK);

        let message = self.mailer.last_message_to(ADMIN).await.expect("otp email");
        let code = message
            .text
            .strip_prefix("Your OTP is: ")
            .and_then(|rest| rest.get(..6))
            .expect("code in email")
            .to_string();

        let res = self
            .post("/api/verify-otp", json!({ "email": ADMIN, "otp": code }), None)
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        let set_cookie = res
            .headers()
            .get(SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .expect("session cookie")
            .to_string();
        assert!(set_cookie.starts_with("admin-session=admin@example.com."));
        assert!(set_cookie.contains("HttpOnly"));
        assert!(set_cookie.contains("SameSite=Lax"));
        assert!(set_cookie.contains("Max-Age=1800"));

        set_cookie.split(';').next().expect("pair").to_string()
    }

    async fn create_movie(&self, cookie: &str) -> String {
        let res = self
            .post("/api/admin/movies", json!({ "title": "Dune", "embedLink": "https://youtu.be/abc" }), Some(cookie))
            .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let movie: Value = res.json().await.expect("movie json");
        assert_eq!(movie["embedLink"], "https://www.youtube.com/embed/abc");
        movie["id"].as_str().expect("id").to_string()
    }
}

#[tokio::test]
async fn admin_pages_redirect_and_api_rejects_without_session() {
    let server = TestServer::start().await;

    let res = server.client.get(server.url("/admin")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(res.headers().get(LOCATION).unwrap(), "/admin/login");
    assert!(res.headers().contains_key("x-request-id"));

    for path in ["/admin/", "/admin/movies", "/admin/premieres/p1/tickets"] {
        let res = server.client.get(server.url(path)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::SEE_OTHER, "{}", path);
        assert_eq!(res.headers().get(LOCATION).unwrap(), "/admin/login");
    }

    let res = server.client.get(server.url("/admin/login")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = server.client.get(server.url("/api/admin/dashboard")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], false);

    let res = server
        .client
        .get(server.url("/api/admin/dashboard"))
        .header(COOKIE, "admin-session=admin@example.com.badsig")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn otp_request_errors_map_to_status_codes() {
    let server = TestServer::start().await;

    let res = server.post("/api/send-otp", json!({ "email": "" }), None).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = server.post("/api/send-otp", json!({ "email": "viewer@example.com" }), None).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = server.post("/api/send-otp", json!({ "email": ADMIN }), None).await;
    assert_eq!(res.status(), StatusCode::OK);
    let res = server.post("/api/send-otp", json!({ "email": ADMIN }), None).await;
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Wait before requesting new OTP.");

    let res = server
        .post("/api/verify-otp", json!({ "email": ADMIN, "otp": "000000x" }), None)
        .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Invalid or expired OTP");
}

#[tokio::test]
async fn login_grants_admin_access_until_logout() {
    let server = TestServer::start().await;
    let cookie = server.login().await;

    let res = server
        .client
        .get(server.url("/admin"))
        .header(COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = server
        .client
        .get(server.url("/admin/movies"))
        .header(COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = server
        .client
        .get(server.url("/api/admin/session"))
        .header(COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["email"], ADMIN);

    let res = server.post("/api/logout", json!({}), Some(&cookie)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let cleared = res.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cleared.starts_with("admin-session=;"));
    assert!(cleared.contains("Max-Age=0"));
}

#[tokio::test]
async fn ratings_and_views_are_per_device() {
    let server = TestServer::start().await;
    let cookie = server.login().await;
    let movie_id = server.create_movie(&cookie).await;

    for _ in 0..2 {
        let res = server
            .post(&format!("/api/movies/{}/views", movie_id), json!({ "deviceId": "dev-1" }), None)
            .await;
        assert_eq!(res.status(), StatusCode::OK);
    }
    let res = server
        .post(&format!("/api/movies/{}/views", movie_id), json!({ "deviceId": "dev-2" }), None)
        .await;
    let outcome: Value = res.json().await.unwrap();
    assert_eq!(outcome["counted"], true);
    assert_eq!(outcome["views"], 2);

    for rating in [2, 5] {
        let res = server
            .client
            .put(server.url(&format!("/api/movies/{}/ratings", movie_id)))
            .json(&json!({ "deviceId": "dev-1", "rating": rating }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }
    let res = server
        .client
        .get(server.url(&format!("/api/movies/{}/ratings?deviceId=dev-1", movie_id)))
        .send()
        .await
        .unwrap();
    let summary: Value = res.json().await.unwrap();
    assert_eq!(summary["realCount"], 1);
    assert_eq!(summary["deviceRating"], 5);

    let res = server
        .client
        .put(server.url(&format!("/api/movies/{}/ratings", movie_id)))
        .json(&json!({ "deviceId": "dev-1", "rating": 6 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = server.client.get(server.url("/api/movies/missing")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn tickets_redeem_once() {
    let server = TestServer::start().await;
    let cookie = server.login().await;
    let movie_id = server.create_movie(&cookie).await;

    let res = server
        .post(
            "/api/admin/premieres",
            json!({
                "title": "Opening night",
                "movieId": movie_id,
                "startsAt": "2099-01-01T20:00:00Z",
                "endsAt": "2099-01-01T22:00:00Z",
                "policy": "limited",
                "maxSeats": 2
            }),
            Some(&cookie),
        )
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let premiere: Value = res.json().await.unwrap();
    let premiere_id = premiere["id"].as_str().unwrap().to_string();

    let tickets_path = format!("/api/admin/premieres/{}/tickets", premiere_id);
    let res = server.post(&tickets_path, json!({ "count": 3 }), Some(&cookie)).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = server.post(&tickets_path, json!({ "count": 2 }), Some(&cookie)).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let tickets: Value = res.json().await.unwrap();
    let code = tickets[0]["code"].as_str().unwrap().to_string();

    let redeem_path = format!("/api/premieres/{}/redeem", premiere_id);
    let res = server
        .post(&redeem_path, json!({ "code": code.to_lowercase(), "userId": "u1" }), None)
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let ticket: Value = res.json().await.unwrap();
    assert_eq!(ticket["used"], true);
    assert_eq!(ticket["usedBy"], "u1");

    let res = server
        .post(&redeem_path, json!({ "code": code, "userId": "u2" }), None)
        .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Ticket already used");

    let res = server
        .client
        .get(server.url(&format!("{}/export", tickets_path)))
        .header(COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let csv = res.text().await.unwrap();
    assert!(csv.starts_with("premiere_id,code,used,used_by,used_at,created_at"));
    assert_eq!(csv.lines().count(), 3);
}

#[tokio::test]
async fn wishlist_toggle_flips_membership() {
    let server = TestServer::start().await;
    let cookie = server.login().await;
    let movie_id = server.create_movie(&cookie).await;
    let toggle_path = format!("/api/users/u1/wishlist/{}/toggle", movie_id);

    let res = server.post(&toggle_path, json!({}), None).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["inWishlist"], true);

    let res = server
        .client
        .get(server.url(&format!("/api/users/u1/wishlist/{}", movie_id)))
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["inWishlist"], true);

    let res = server.post(&toggle_path, json!({}), None).await;
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["inWishlist"], false);

    let res = server.client.get(server.url("/api/users/u1/wishlist")).send().await.unwrap();
    let items: Value = res.json().await.unwrap();
    assert_eq!(items.as_array().map(Vec::len), Some(0));

    let res = server
        .post("/api/users/u1/wishlist/missing/toggle", json!({}), None)
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
