//! Local HTTP server serving canned responses to tests.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener};
use std::thread::{self, JoinHandle};

/// One request as seen by the server
#[derive(Debug, Clone)]
pub struct SeenRequest {
    /// e.g. `GET /repos/o/n/traffic/views HTTP/1.1`
    pub request_line: String,
    headers: Vec<(String, String)>,
}

impl SeenRequest {
    pub fn path(&self) -> &str {
        self.request_line.split(' ').nth(1).unwrap_or("")
    }

    /// Header value by case-insensitive name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Answers exactly one connection per scripted response, in order.
///
/// A status of `0` closes the connection without writing a response.
pub struct CannedServer {
    addr: SocketAddr,
    handle: JoinHandle<Vec<SeenRequest>>,
}

impl CannedServer {
    pub fn spawn(script: Vec<(u16, String)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = thread::spawn(move || {
            let mut seen = Vec::new();
            for (status, body) in script {
                let (mut stream, _) = listener.accept().unwrap();
                seen.push(read_request(&mut stream));
                if status == 0 {
                    continue;
                }

                let response = format!(
                    "HTTP/1.1 {status} Canned\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                stream.write_all(response.as_bytes()).unwrap();
                stream.flush().unwrap();
            }
            seen
        });

        CannedServer { addr, handle }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Wait for the script to be served and return what was requested
    pub fn finish(self) -> Vec<SeenRequest> {
        self.handle.join().unwrap()
    }
}

fn read_request(stream: &mut impl Read) -> SeenRequest {
    let mut raw = Vec::new();
    let mut buf = [0u8; 1024];
    while !raw.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut buf).unwrap();
        if n == 0 {
            break;
        }
        raw.extend_from_slice(&buf[..n]);
    }

    let head = String::from_utf8_lossy(&raw);
    let mut lines = head.split("\r\n");
    let request_line = lines.next().unwrap_or("").to_string();
    let headers = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(n, v)| (n.trim().to_string(), v.trim().to_string()))
        .collect();

    SeenRequest {
        request_line,
        headers,
    }
}
