//! The HTTP surface of the relay. `GET /events` opens a stream, `POST /events`
//! dispatches a message into one, and two static routes sit alongside.

use std::{convert::Infallible, sync::Arc};

use bytes::Bytes;
use relay_proto::{
    error::Error,
    identity::{persistence_cookie, resolve, Resolved, IDENTITY_COOKIE},
    mnemonic,
    sink::ChannelSink,
};
use tokio::spawn;
use tokio_stream::StreamExt;
use tracing::{debug, warn};
use warp::{
    http::{header, HeaderValue, StatusCode},
    hyper::Body,
    reply::Response,
    Filter, Rejection, Reply,
};

use crate::{dispatch::dispatch, pages, session::Session, Inner};

/// Build the full route table for a relay
pub(crate) fn routes(
    inner: Arc<Inner>,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    let with_inner = warp::any().map(move || inner.clone());
    let events = warp::path("events").and(warp::path::end());

    let open = events
        .and(warp::get())
        .and(with_inner.clone())
        .and(warp::cookie::optional::<String>(IDENTITY_COOKIE))
        .then(open_stream);

    let send = events
        .and(warp::post())
        .and(with_inner)
        .and(warp::body::bytes())
        .then(dispatch_message);

    // Anything else aimed at the event stream
    let not_allowed = events.map(|| StatusCode::METHOD_NOT_ALLOWED.into_response());

    let health = warp::path("health")
        .and(warp::path::end())
        .map(|| pages::HEALTH_BODY.into_response());

    let render = warp::path("render")
        .and(warp::path::end())
        .map(|| warp::reply::html(pages::RENDER_PAGE).into_response());

    open.or(send)
        .unify()
        .or(not_allowed)
        .unify()
        .or(health)
        .unify()
        .or(render)
        .unify()
}

/// Open a stream for the requester and keep it attached until the transport closes
async fn open_stream(inner: Arc<Inner>, presented: Option<String>) -> Response {
    let Resolved { identity, minted } = resolve(presented);
    if minted {
        debug!(id = mnemonic(&identity), "minted new identity");
    }

    // The receiving half becomes our response body
    let (sink, chunks) = ChannelSink::new();
    let mut session = Session::new(identity.clone(), Arc::new(sink), inner.registry.clone());
    if let Err(err) = session.attach().await {
        return error_response(&err);
    }

    // The session lives on in its own task until the body is dropped
    spawn(session.run_until_closed(inner.shutdown.clone()));

    let mut response = Response::new(Body::wrap_stream(chunks.map(Ok::<_, Infallible>)));
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/event-stream"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));

    // Always (re-)issue the identity so the client keeps it
    match HeaderValue::from_str(&persistence_cookie(&identity)) {
        Ok(cookie) => {
            headers.insert(header::SET_COOKIE, cookie);
        }
        Err(err) => warn!(id = mnemonic(&identity), "failed to set identity cookie: {err}"),
    }

    response
}

/// Route a message from the request body into its target's stream
async fn dispatch_message(inner: Arc<Inner>, body: Bytes) -> Response {
    match dispatch(&inner.registry, &body).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(err) => error_response(&err),
    }
}

/// Turn an error into a short plain-text response with the matching status
fn error_response(err: &Error) -> Response {
    warp::reply::with_status(err.to_string(), err.status_code()).into_response()
}
