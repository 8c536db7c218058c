use axum::routing::{get, post, put};
use axum::Router;
use crate::state::AppState;

mod admin;
mod auth;
mod catalog;
mod pages;
mod premieres;
mod wishlist;

fn public_api() -> Router<AppState> {
    Router::new()
        .route("/api/send-otp", post(auth::send_otp))
        .route("/api/verify-otp", post(auth::verify_otp))
        .route("/api/logout", post(auth::logout))
        .route("/api/home", get(catalog::home))
        .route("/api/movies", get(catalog::list_movies))
        .route("/api/movies/:id", get(catalog::get_movie))
        .route("/api/movies/:id/views", post(catalog::record_view))
        .route(
            "/api/movies/:id/ratings",
            get(catalog::rating_summary).put(catalog::rate),
        )
        .route("/api/movies/:id/ratings/stream", get(catalog::rating_stream))
        .route(
            "/api/movies/:id/comments",
            get(catalog::comment_threads).post(catalog::post_comment),
        )
        .route("/api/premieres", get(premieres::list_premieres))
        .route("/api/premieres/:id", get(premieres::get_premiere))
        .route("/api/premieres/:id/redeem", post(premieres::redeem_ticket))
        .route(
            "/api/users/:uid/wishlist",
            get(wishlist::list).post(wishlist::add),
        )
        .route(
            "/api/users/:uid/wishlist/:movie_id",
            get(wishlist::contains).delete(wishlist::remove),
        )
        .route(
            "/api/users/:uid/wishlist/:movie_id/toggle",
            post(wishlist::toggle),
        )
}

fn admin_api() -> Router<AppState> {
    Router::new()
        .route("/api/admin/session", get(auth::session))
        .route("/api/admin/dashboard", get(admin::dashboard))
        .route(
            "/api/admin/movies",
            get(admin::list_movies).post(admin::create_movie),
        )
        .route(
            "/api/admin/movies/:id",
            get(admin::get_movie)
                .put(admin::update_movie)
                .delete(admin::delete_movie),
        )
        .route("/api/admin/movies/:id/flags/:flag", put(admin::set_flag))
        .route(
            "/api/admin/movies/:id/boosts",
            put(admin::set_boosts).delete(admin::reset_boosts),
        )
        .route("/api/admin/movies/:id/analytics", get(admin::movie_analytics))
        .route("/api/admin/boosts/reset", post(admin::reset_all_boosts))
        .route("/api/admin/analytics", get(admin::analytics))
        .route("/api/admin/comments", get(admin::list_comments))
        .route("/api/admin/comments/delete", post(admin::delete_comments))
        .route(
            "/api/admin/comments/:id",
            put(admin::edit_comment).delete(admin::delete_comment),
        )
        .route("/api/admin/comments/:id/replies", post(admin::reply_to_comment))
        .route(
            "/api/admin/premieres",
            get(admin::list_premieres).post(admin::create_premiere),
        )
        .route(
            "/api/admin/premieres/:id/tickets",
            get(admin::list_tickets).post(admin::generate_tickets),
        )
        .route("/api/admin/premieres/:id/tickets/export", get(admin::export_tickets))
        .route("/api/admin/premieres/:id/tickets/:code", put(admin::override_ticket))
}

fn admin_pages() -> Router<AppState> {
    Router::new()
        .route("/admin", get(pages::admin_home))
        .route("/admin/login", get(pages::login))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(public_api())
        .merge(admin_api())
        .merge(admin_pages())
}
