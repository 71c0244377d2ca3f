//! Loopback redirect server for the installed-app consent flow
//!
//! An actix-web server on an ephemeral `127.0.0.1` port. Each expected
//! `state` is registered up front with a oneshot sender; the redirect that
//! carries it completes the matching [`PendingCode`].

use std::collections::HashMap;
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use actix_web::dev::ServerHandle;
use actix_web::{App, HttpResponse, HttpServer, web};
use tokio::sync::oneshot;
use tracing::{debug, warn};

use super::error::AuthError;

type CallbackResult = Result<String, AuthError>;
type PendingCallbacks = Arc<Mutex<HashMap<String, oneshot::Sender<CallbackResult>>>>;

const SUCCESS_HTML: &str = r#"<!DOCTYPE html>
<html>
<head><title>Authorization complete</title></head>
<body style="font-family: sans-serif; text-align: center; padding: 50px;">
    <h1>Authorization complete</h1>
    <p>You can close this window and return to the terminal.</p>
</body>
</html>"#;

pub struct CallbackServer {
    port: u16,
    pending: PendingCallbacks,
    handle: ServerHandle,
}

impl CallbackServer {
    /// Bind an ephemeral loopback port and start serving redirects
    pub fn start() -> Result<Self, AuthError> {
        let bind_error = |e: std::io::Error| AuthError::Callback(format!("Failed to bind loopback listener: {}", e));

        let listener = TcpListener::bind("127.0.0.1:0").map_err(bind_error)?;
        listener.set_nonblocking(true).map_err(bind_error)?;
        let port = listener.local_addr().map_err(bind_error)?.port();

        let pending: PendingCallbacks = Arc::new(Mutex::new(HashMap::new()));
        let data = pending.clone();

        let server = HttpServer::new(move || {
            App::new()
                .app_data(web::Data::new(data.clone()))
                .route("/", web::get().to(handle_callback))
        })
        .workers(1)
        .disable_signals()
        .shutdown_timeout(1)
        .listen(listener)
        .map_err(bind_error)?
        .run();

        let handle = server.handle();
        tokio::spawn(async move {
            if let Err(e) = server.await {
                warn!("Callback server error: {}", e);
            }
        });

        debug!(port, "CallbackServer::start: listening");
        Ok(Self { port, pending, handle })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn redirect_uri(&self) -> String {
        format!("http://127.0.0.1:{}/", self.port)
    }

    /// Register the `state` of an authorization request before sending the user off
    pub fn expect(&self, state: &str) -> PendingCode {
        let (tx, rx) = oneshot::channel();
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(state.to_string(), tx);
        PendingCode { rx }
    }

    pub async fn stop(self) {
        debug!(port = self.port, "CallbackServer::stop: called");
        self.handle.stop(true).await;
    }
}

/// Authorization code not yet delivered by the browser
pub struct PendingCode {
    rx: oneshot::Receiver<CallbackResult>,
}

impl PendingCode {
    pub async fn wait(self, timeout: Duration) -> Result<String, AuthError> {
        match tokio::time::timeout(timeout, self.rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(AuthError::Callback("callback server stopped".to_string())),
            Err(_) => Err(AuthError::Callback(format!(
                "no authorization response within {}s",
                timeout.as_secs()
            ))),
        }
    }
}

async fn handle_callback(
    query: web::Query<HashMap<String, String>>,
    pending: web::Data<PendingCallbacks>,
) -> HttpResponse {
    let result = match (query.get("error"), query.get("code")) {
        (Some(error), _) => Err(AuthError::AuthorizationFailed(error.clone())),
        (None, Some(code)) => Ok(code.clone()),
        // favicon requests and the like
        (None, None) => return HttpResponse::NotFound().finish(),
    };

    let state = query.get("state").map(String::as_str).unwrap_or_default();
    let sender = pending.lock().unwrap_or_else(|e| e.into_inner()).remove(state);
    let Some(sender) = sender else {
        warn!("Ignoring authorization response with unknown state");
        return HttpResponse::BadRequest().body("Unknown or expired authorization request.");
    };

    let response = match result {
        Ok(_) => HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(SUCCESS_HTML),
        Err(_) => HttpResponse::BadRequest().body("Authorization was not granted. You can close this window."),
    };

    // The waiter may already have timed out
    let _ = sender.send(result);
    response
}
