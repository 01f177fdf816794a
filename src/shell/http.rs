use async_graphql::http::GraphiQLSource;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{
    Extension, Router,
    response::Html,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::adapters::inbound::http as tally_http;
use crate::shell::graphql::{AppSchema, build_schema};
use crate::shell::state::AppState;

pub fn router(state: AppState) -> Router {
    let schema = build_schema(state.clone());
    Router::new()
        .route("/dispatch", post(tally_http::dispatch))
        .route("/tags", get(tally_http::tags))
        .route("/tags/{tag}/entries", get(tally_http::entries))
        .route("/tags/{tag}/summary", get(tally_http::summary))
        .route("/tags/{tag}/status", get(tally_http::status))
        .route("/session", get(tally_http::session))
        .route("/session/login", post(tally_http::login))
        .route("/session/logout", post(tally_http::logout))
        .route("/alerts", get(tally_http::alerts))
        .route("/gql", get(graphiql).post(graphql))
        .layer(Extension(schema))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn graphql(Extension(schema): Extension<AppSchema>, req: GraphQLRequest) -> GraphQLResponse {
    schema.execute(req.into_inner()).await.into()
}

async fn graphiql() -> Html<String> {
    Html(GraphiQLSource::build().endpoint("/gql").finish())
}
