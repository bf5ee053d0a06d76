//! dbridge-core — launch a Node.js-style target under the inspector, discover
//! its debug session over HTTP, and derive a DevTools URL for it.

pub mod announce;
pub mod bridge;
pub mod discovery;
pub mod error;
pub mod orchestrator;
pub mod port;
pub mod supervisor;

pub use announce::DebugAddress;
pub use discovery::{Discoverer, SelectionStrategy, SessionDescriptor};
pub use error::{LaunchError, Result};
pub use orchestrator::{Orchestrator, OrchestratorConfig};
pub use supervisor::{ChildHandle, LaunchRequest, OutputSink, StdoutSink, Supervisor};

#[cfg(test)]
pub(crate) mod test_util {
    use std::future::Future;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::time::{Duration, Instant};

    use crate::announce::DebugAddress;

    /// Poll `f` until it returns true or the timeout elapses.
    pub async fn wait_for<F, Fut>(timeout: Duration, mut f: F) -> bool
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = bool>,
    {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if f().await {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        false
    }

    /// Serve a canned HTTP response on an ephemeral port and return it as a
    /// debug address. The server thread lives until the test process exits.
    pub fn json_fixture(status: u16, body: &str) -> DebugAddress {
        let listener = TcpListener::bind("127.0.0.1:0").expect("failed to bind fixture port");
        let port = listener.local_addr().expect("fixture local addr").port();
        let body = body.to_string();

        std::thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { break };
                let mut request = [0u8; 1024];
                let _ = stream.read(&mut request);
                let response = format!(
                    "HTTP/1.1 {status} Fixture\r\nContent-Type: application/json\r\n\
                     Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });

        DebugAddress {
            host: "127.0.0.1".to_string(),
            port,
        }
    }
}
