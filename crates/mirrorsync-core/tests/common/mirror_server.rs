//! Minimal HTTP/1.1 server that looks like a checksum-publishing mirror.
//!
//! `GET /data/` returns an HTML index linking every file and its `.md5`;
//! `GET /data/<name>` returns the body; `GET /data/<name>.md5` returns
//! `MD5(<name>)= <hex>`. Files can be made to answer 503 a few times first,
//! or be listed without being served (404).

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;

#[derive(Debug, Default)]
pub struct Mirror {
    files: BTreeMap<String, Vec<u8>>,
    listed_only: BTreeSet<String>,
    failures: HashMap<String, usize>,
}

/// Running server: base URL of the mirrored directory and a log of request paths.
pub struct MirrorHandle {
    pub base_url: String,
    hits: Arc<Mutex<Vec<String>>>,
}

impl MirrorHandle {
    pub fn hits(&self) -> Vec<String> {
        self.hits.lock().unwrap().clone()
    }

    pub fn clear_hits(&self) {
        self.hits.lock().unwrap().clear();
    }

    /// Requests for file bodies (not the index or checksum resources).
    pub fn file_downloads(&self) -> Vec<String> {
        self.hits()
            .into_iter()
            .filter(|p| p != "/data/" && !p.ends_with(".md5"))
            .collect()
    }
}

struct State {
    files: BTreeMap<String, Vec<u8>>,
    listed: BTreeSet<String>,
    failures: Mutex<HashMap<String, usize>>,
    hits: Arc<Mutex<Vec<String>>>,
}

impl Mirror {
    pub fn file(mut self, name: &str, body: &[u8]) -> Self {
        self.files.insert(name.to_string(), body.to_vec());
        self
    }

    /// Listed in the index but answers 404.
    pub fn missing(mut self, name: &str) -> Self {
        self.listed_only.insert(name.to_string());
        self
    }

    /// Answer 503 for the first `n` downloads of `name`.
    pub fn fail_first(mut self, name: &str, n: usize) -> Self {
        self.failures.insert(name.to_string(), n);
        self
    }

    /// Starts the server in a background thread. It runs until the process exits.
    pub fn start(self) -> MirrorHandle {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().unwrap().port();
        let hits = Arc::new(Mutex::new(Vec::new()));
        let mut listed: BTreeSet<String> = self.files.keys().cloned().collect();
        listed.extend(self.listed_only);
        let state = Arc::new(State {
            files: self.files,
            listed,
            failures: Mutex::new(self.failures),
            hits: Arc::clone(&hits),
        });
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let state = Arc::clone(&state);
                thread::spawn(move || handle(stream, &state));
            }
        });
        MirrorHandle {
            base_url: format!("http://127.0.0.1:{}/data/", port),
            hits,
        }
    }
}

fn handle(mut stream: std::net::TcpStream, state: &State) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) => return,
        Ok(n) => n,
        Err(_) => return,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let path = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();
    state.hits.lock().unwrap().push(path.clone());

    let (status, body) = route(&path, state);
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        body.len()
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.write_all(&body);
}

fn route(path: &str, state: &State) -> (&'static str, Vec<u8>) {
    let Some(name) = path.strip_prefix("/data/") else {
        return ("404 Not Found", b"not found".to_vec());
    };
    if name.is_empty() {
        return ("200 OK", index_html(&state.listed).into_bytes());
    }
    if let Some(file) = name.strip_suffix(".md5") {
        return match state.files.get(file) {
            Some(body) => (
                "200 OK",
                format!("MD5({})= {:x}\n", file, md5::compute(body)).into_bytes(),
            ),
            None => ("404 Not Found", b"not found".to_vec()),
        };
    }
    let Some(body) = state.files.get(name) else {
        return ("404 Not Found", b"not found".to_vec());
    };
    let mut failures = state.failures.lock().unwrap();
    if let Some(left) = failures.get_mut(name) {
        if *left > 0 {
            *left -= 1;
            return ("503 Service Unavailable", b"busy".to_vec());
        }
    }
    ("200 OK", body.clone())
}

fn index_html(names: &BTreeSet<String>) -> String {
    let mut out = String::from("<html><body><pre>\n");
    for name in names {
        out.push_str(&format!("<a href=\"{0}\">{0}</a>\n", name));
        out.push_str(&format!("<a href=\"{0}.md5\">{0}.md5</a>\n", name));
    }
    out.push_str("</pre></body></html>\n");
    out
}
