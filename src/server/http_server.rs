use super::service::ContainerService;
use may::coroutine::{self, JoinHandle};
use may::net::{TcpListener, TcpStream as CoTcpStream};
use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Listener running one coroutine per accepted connection.
///
/// Each connection coroutine frames, locates and services exactly one
/// request, then closes the socket. A read timeout on the socket bounds how
/// long a stalled client can hold a coroutine.
pub struct HttpServer {
    service: ContainerService,
    read_timeout: Option<Duration>,
    stack_size: usize,
}

/// Handle to a running HTTP server
///
/// Provides methods for waiting until the server is ready, stopping it gracefully,
/// or joining the server thread.
pub struct ServerHandle {
    addr: SocketAddr,
    handle: JoinHandle<()>,
    service: ContainerService,
}

impl ServerHandle {
    /// Address the listener is bound to (useful with port 0).
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    #[must_use]
    pub fn service(&self) -> &ContainerService {
        &self.service
    }

    /// Wait for the server to be ready to accept connections
    ///
    /// Polls the server address by attempting TCP connections until successful.
    ///
    /// # Errors
    ///
    /// Returns `TimedOut` error if the server doesn't become ready within ~250ms (50 attempts × 5ms).
    pub fn wait_ready(&self) -> io::Result<()> {
        for _ in 0..50 {
            if TcpStream::connect(self.addr).is_ok() {
                return Ok(());
            }
            thread::sleep(Duration::from_millis(5));
        }
        Err(io::Error::new(io::ErrorKind::TimedOut, "server not ready"))
    }

    /// Stop accepting connections.
    ///
    /// Connections already accepted finish on their own coroutines.
    pub fn stop(self) {
        // SAFETY: may::CoroutineHandle::coroutine().cancel() is marked unsafe by the may runtime.
        // The handle is owned here and the accept loop holds no state that
        // must be released before unwinding.
        unsafe {
            self.handle.coroutine().cancel();
        }
        if self.handle.join().is_err() {
            debug!(addr = %self.addr, "Accept loop ended by cancellation");
        }
        info!(addr = %self.addr, "Server stopped");
    }

    /// Stop accepting connections, then undeploy every application.
    pub fn shutdown(self) {
        let service = self.service.clone();
        self.stop();
        service.shutdown();
        info!("Applications undeployed");
    }

    /// Block until the accept loop ends.
    ///
    /// # Errors
    ///
    /// Returns an error if the accept coroutine panicked.
    pub fn join(self) -> std::thread::Result<()> {
        self.handle.join()
    }
}

impl HttpServer {
    pub fn new(service: ContainerService, read_timeout: Option<Duration>, stack_size: usize) -> Self {
        Self {
            service,
            read_timeout,
            stack_size,
        }
    }

    /// Bind `addr` and start the accept loop.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid or cannot be bound.
    pub fn start<A: ToSocketAddrs>(self, addr: A) -> io::Result<ServerHandle> {
        let listener = TcpListener::bind(addr)?;
        let addr = listener.local_addr()?;
        let HttpServer {
            service,
            read_timeout,
            stack_size,
        } = self;

        let accept_service = service.clone();
        // SAFETY: may::coroutine::Builder::spawn() is marked unsafe by the may runtime.
        // The closure is 'static and owns the listener and a clone of the service.
        let handle = unsafe {
            coroutine::Builder::new()
                .name("servlet-accept".to_string())
                .stack_size(stack_size)
                .spawn(move || {
                    for stream in listener.incoming() {
                        match stream {
                            Ok(stream) => {
                                spawn_connection(accept_service.clone(), stream, read_timeout, stack_size)
                            }
                            Err(e) => warn!(error = %e, "Failed to accept connection"),
                        }
                    }
                })?
        };
        info!(addr = %addr, stack_size, "Servlet container listening");
        Ok(ServerHandle {
            addr,
            handle,
            service,
        })
    }
}

fn spawn_connection(
    service: ContainerService,
    mut stream: CoTcpStream,
    read_timeout: Option<Duration>,
    stack_size: usize,
) {
    let peer = stream.peer_addr().ok();
    // SAFETY: may::coroutine::Builder::spawn() is marked unsafe by the may runtime.
    // The closure owns the stream and the service clone; nothing is borrowed.
    let spawned = unsafe {
        coroutine::Builder::new()
            .stack_size(stack_size)
            .spawn(move || {
                if let Err(e) = stream.set_read_timeout(read_timeout) {
                    warn!(error = %e, "Failed to set read timeout");
                }
                if let Err(e) = service.handle_connection(&mut stream) {
                    debug!(peer = ?peer, error = %e, "Failed to write response");
                }
            })
    };
    if let Err(e) = spawned {
        error!(peer = ?peer, error = %e, "Failed to spawn connection coroutine");
    }
}
