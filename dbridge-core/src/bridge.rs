//! Session bridging
//!
//! Turns a session descriptor into a single URL a browser can open. Pure URL
//! rewriting; actually opening anything is the caller's business.

use url::Url;

use crate::discovery::SessionDescriptor;
use crate::error::Result;

/// The hosted DevTools frontend was retired; sessions that still point at it
/// are rewritten to the scheme Chrome serves locally. Newer session formats
/// pass through untouched.
const RETIRED_FRONTEND: &str = "https://chrome-devtools-frontend.appspot.com";
const LOCAL_FRONTEND: &str = "chrome-devtools://devtools/remote";

/// Derive the browser-openable debugging URL for a session.
///
/// The descriptor's websocket URL is re-pointed at `host:port` so the client
/// connects through the same network path used for discovery, regardless of
/// the bind address the child announced. The scheme-stripped result lands in
/// the frontend URL's `ws` query parameter.
pub fn bridge(descriptor: &SessionDescriptor, host: &str, port: u16) -> Result<String> {
    let frontend = normalize_frontend(&descriptor.devtools_frontend_url);
    let mut url = Url::parse(&frontend)?;

    let mut ws_url = Url::parse(&descriptor.web_socket_debugger_url)?;
    // IPv6 literals must be bracketed before they can replace a URL host.
    if host.contains(':') {
        ws_url.set_host(Some(&format!("[{host}]")))?;
    } else {
        ws_url.set_host(Some(host))?;
    }
    let _ = ws_url.set_port(Some(port));

    let ws = ws_url.as_str().trim_start_matches("ws://").to_string();
    url.query_pairs_mut().append_pair("ws", &ws);

    Ok(url.to_string())
}

fn normalize_frontend(frontend: &str) -> String {
    if frontend.to_ascii_lowercase().starts_with(RETIRED_FRONTEND) {
        format!("{LOCAL_FRONTEND}{}", &frontend[RETIRED_FRONTEND.len()..])
    } else {
        frontend.to_string()
    }
}
