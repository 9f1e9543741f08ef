pub mod contact;

use axum::Router;
use axum::routing::get;

use crate::state::SharedState;

pub fn page_routes() -> Router<SharedState> {
    Router::new().route("/contact", get(contact::show).post(contact::submit))
}
