#![allow(dead_code)]

pub mod runtime {
    use std::sync::Once;

    static INIT: Once = Once::new();

    /// Configure the may runtime and tracing once per test binary.
    pub fn init() {
        INIT.call_once(|| {
            may::config().set_stack_size(0x8000);
            let _ = tracing_subscriber::fmt()
                .with_env_filter("warn")
                .with_test_writer()
                .try_init();
        });
    }
}

pub mod http {
    use std::io::{Read, Write};
    use std::net::{SocketAddr, TcpStream};
    use std::time::Duration;

    /// Send a raw HTTP request and collect the response bytes.
    ///
    /// The server keeps connections alive, so reads stop on timeout rather
    /// than EOF. The timeout is generous enough to cover a request that
    /// suspends on async work before responding.
    pub fn send_request(addr: &SocketAddr, req: &str) -> String {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream.write_all(req.as_bytes()).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_millis(500)))
            .unwrap();
        let mut buf = Vec::new();
        loop {
            let mut tmp = [0u8; 1024];
            match stream.read(&mut tmp) {
                Ok(0) => break,
                Ok(n) => buf.extend_from_slice(&tmp[..n]),
                Err(ref e)
                    if e.kind() == std::io::ErrorKind::WouldBlock
                        || e.kind() == std::io::ErrorKind::TimedOut =>
                {
                    break
                }
                Err(e) => panic!("read error: {e:?}"),
            }
        }
        String::from_utf8_lossy(&buf).to_string()
    }

    /// Convenience GET returning `(status, body)`.
    pub fn get(addr: &SocketAddr, path: &str) -> (u16, serde_json::Value) {
        let resp = send_request(
            addr,
            &format!("GET {path} HTTP/1.1\r\nHost: localhost\r\n\r\n"),
        );
        parse_response(&resp)
    }

    /// Split a raw HTTP response into status code and JSON body.
    pub fn parse_response(resp: &str) -> (u16, serde_json::Value) {
        let mut parts = resp.split("\r\n\r\n");
        let headers = parts.next().unwrap_or("");
        let body = parts.next().unwrap_or("");
        let status = headers
            .lines()
            .next()
            .and_then(|line| line.split_whitespace().nth(1))
            .and_then(|code| code.parse().ok())
            .unwrap_or(0);
        let body = serde_json::from_str(body).unwrap_or(serde_json::Value::Null);
        (status, body)
    }
}
