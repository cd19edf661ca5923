use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = sdlweave_graphql::handler::REQUEST_ID_HEADER;

/// Ensures every request carries an `x-request-id` and echoes it on the response.
///
/// A missing id is generated here so the access log span and the GraphQL
/// handlers see the same value.
pub async fn request_id(mut req: Request<Body>, next: Next) -> Response {
    let header_name = HeaderName::from_static(REQUEST_ID_HEADER);

    // If the incoming request already has a request-id, preserve it; otherwise generate one
    let req_id_value = match req.headers().get(&header_name) {
        Some(value) => Some(value.clone()),
        None => HeaderValue::from_str(&Uuid::new_v4().to_string()).ok(),
    };

    let Some(req_id_value) = req_id_value else {
        return next.run(req).await;
    };

    req.headers_mut().insert(header_name.clone(), req_id_value.clone());
    req.extensions_mut().insert(req_id_value.clone());

    let mut res = next.run(req).await;
    res.headers_mut().insert(header_name, req_id_value);
    res
}
