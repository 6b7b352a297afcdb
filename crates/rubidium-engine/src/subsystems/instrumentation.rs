//! Instrumentation listener.
//!
//! An optional TCP listener for debug tooling, started only when the
//! embedder configures a nonzero port. A bind failure is reported by
//! the context and the context proceeds without instrumentation.

use std::io::{self, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use parking_lot::Mutex;

/// Background instrumentation listener.
pub struct InstrumentationServer {
    port: u16,
    stop: Arc<AtomicBool>,
    accept_thread: Mutex<Option<JoinHandle<()>>>,
}

impl InstrumentationServer {
    /// Bind `127.0.0.1:port` and start the accept loop.
    pub fn start(port: u16) -> io::Result<Self> {
        let listener = TcpListener::bind(("127.0.0.1", port))?;
        listener.set_nonblocking(true)?;

        let stop = Arc::new(AtomicBool::new(false));
        let accept_stop = stop.clone();

        let accept_thread = std::thread::Builder::new()
            .name("rubidium-instrumentation".to_string())
            .spawn(move || {
                while !accept_stop.load(Ordering::SeqCst) {
                    match listener.accept() {
                        Ok((mut stream, _)) => {
                            let _ = stream.write_all(b"rubidium instrumentation\n");
                        }
                        Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                            std::thread::sleep(Duration::from_millis(50));
                        }
                        Err(_) => break,
                    }
                }
            })?;

        Ok(Self {
            port,
            stop,
            accept_thread: Mutex::new(Some(accept_thread)),
        })
    }

    /// Port the listener is bound to.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Stop the accept loop and join the listener thread.
    pub fn shutdown(&self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.accept_thread.lock().take() {
            let _ = handle.join();
        }
    }
}
