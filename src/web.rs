use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use colored::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use uuid::Uuid;

use crate::host::MemoryHost;
use crate::language::Language;
use crate::preview::escape_html;
use crate::preview::templates::fill;
use crate::slot::{SlotSnapshot, SlotViewController, Transition, ViewMode};

/// Controller shared between connections.
pub type SharedController = Arc<Mutex<SlotViewController<MemoryHost>>>;

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

/// Largest request head (request line plus headers) read before giving up.
pub const MAX_HEADER_BYTES: usize = 16 * 1024;

const MAX_HEADERS: usize = 32;

/// Comparison page. `{{slots}}` receives one panel per slot.
pub const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{{title}}</title>
<style>
*{margin:0;padding:0;box-sizing:border-box}
body{background:#0d1117;color:#c9d1d9;font-family:'Cascadia Code','Fira Code',monospace;min-height:100vh;display:flex;flex-direction:column}
header{padding:16px 24px;border-bottom:1px solid #21262d;display:flex;align-items:center;justify-content:space-between}
header h1{font-size:1.2rem;color:#58a6ff}
header .meta{font-size:.75rem;color:#8b949e}
#slots{flex:1;display:grid;grid-template-columns:repeat(auto-fit,minmax(380px,1fr));gap:1px;background:#21262d}
.slot{background:#0d1117;display:flex;flex-direction:column;min-height:480px}
.slot-head{display:flex;align-items:center;gap:8px;padding:8px 14px;background:#161b22;border-bottom:1px solid #21262d}
.slot-label{font-weight:bold;color:#f0883e}
.slot-lang{font-size:.7rem;color:#8b949e;text-transform:uppercase;letter-spacing:.5px}
.modes{margin-left:auto;display:flex;gap:4px}
.mode{padding:4px 10px;border-radius:6px;background:#30363d;color:#fff;text-decoration:none;font-size:.8rem}
.mode.active{background:#1f6feb}
.mode.disabled{background:#21262d;color:#484f58;cursor:not-allowed}
.explanation{padding:8px 14px;font-size:.8rem;color:#8b949e;white-space:pre-wrap;border-bottom:1px solid #21262d}
.error{padding:6px 14px;font-size:.8rem;color:#f85149;background:#1c1214}
form{flex:1;display:flex;flex-direction:column}
textarea{flex:1;background:#0d1117;color:#c9d1d9;border:none;padding:12px 14px;font-family:inherit;font-size:.85rem;resize:none}
textarea:focus{outline:none}
.btn{align-self:flex-end;margin:8px 14px;border:none;padding:6px 14px;border-radius:6px;background:#238636;color:#fff;font-family:inherit;cursor:pointer}
iframe{flex:1;border:none;background:#fff;width:100%}
</style>
</head>
<body>
<header><h1>{{title}}</h1><span class="meta">{{count}} slots</span></header>
<main id="slots">
{{slots}}
</main>
</body>
</html>"##;

// ---------------------------------------------------------------------------
// Request / response
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("malformed request: {0}")]
    Malformed(#[from] httparse::Error),

    #[error("invalid Content-Length header")]
    BadLength,

    #[error("request body exceeds {MAX_BODY_BYTES} bytes")]
    TooLarge,

    #[error("request headers exceed {MAX_HEADER_BYTES} bytes")]
    HeadersTooLarge,
}

/// A parsed HTTP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub path: String,
    pub query: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl Request {
    pub fn get(target: &str) -> Self {
        Self::new("GET", target, Vec::new())
    }

    pub fn post(target: &str, body: impl Into<Vec<u8>>) -> Self {
        Self::new("POST", target, body.into())
    }

    fn new(method: &str, target: &str, body: Vec<u8>) -> Self {
        let (path, query) = split_target(target);
        Self {
            method: method.to_string(),
            path: path.to_string(),
            query: parse_query(query),
            body,
        }
    }
}

/// Parse a complete request out of `buf`. `Ok(None)` means more bytes are
/// needed.
pub fn parse_request(buf: &[u8]) -> Result<Option<Request>, RequestError> {
    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut req = httparse::Request::new(&mut headers);
    let header_len = match req.parse(buf)? {
        httparse::Status::Partial if buf.len() > MAX_HEADER_BYTES => {
            return Err(RequestError::HeadersTooLarge)
        }
        httparse::Status::Partial => return Ok(None),
        httparse::Status::Complete(n) if n > MAX_HEADER_BYTES => {
            return Err(RequestError::HeadersTooLarge)
        }
        httparse::Status::Complete(n) => n,
    };

    let mut content_length = 0usize;
    for header in req.headers.iter() {
        if header.name.eq_ignore_ascii_case("content-length") {
            content_length = std::str::from_utf8(header.value)
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .ok_or(RequestError::BadLength)?;
        }
    }
    if content_length > MAX_BODY_BYTES {
        return Err(RequestError::TooLarge);
    }
    if buf.len() < header_len + content_length {
        return Ok(None);
    }

    let body = buf[header_len..header_len + content_length].to_vec();
    Ok(Some(Request::new(
        req.method.unwrap_or("GET"),
        req.path.unwrap_or("/"),
        body,
    )))
}

fn split_target(target: &str) -> (&str, &str) {
    match target.find('?') {
        Some(idx) => (&target[..idx], &target[idx + 1..]),
        None => (target, ""),
    }
}

/// Percent-decoding for query strings and form bodies.
pub fn url_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' if i + 2 < bytes.len() => {
                let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).unwrap_or("");
                match u8::from_str_radix(hex, 16) {
                    Ok(byte) => {
                        out.push(byte);
                        i += 2;
                    }
                    Err(_) => out.push(b'%'),
                }
            }
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Parse `a=1&b=2` into key-value pairs.
pub fn parse_query(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, val) = pair.split_once('=').unwrap_or((pair, ""));
            (url_decode(key), url_decode(val))
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub content_type: &'static str,
    pub headers: Vec<(&'static str, String)>,
    pub body: Vec<u8>,
}

impl Response {
    fn new(status: u16, content_type: &'static str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            content_type,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn html(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self::new(status, "text/html; charset=utf-8", body)
    }

    pub fn text(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self::new(status, "text/plain; charset=utf-8", body)
    }

    pub fn json<T: Serialize>(status: u16, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self::new(status, "application/json", body),
            Err(e) => Self::text(500, format!("serialization failed: {e}")),
        }
    }

    pub fn redirect(location: &str) -> Self {
        Self::text(303, "").with_header("Location", location)
    }

    pub fn with_header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut head = format!(
            "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n",
            self.status,
            reason(self.status),
            self.content_type,
            self.body.len(),
        );
        for (name, value) in &self.headers {
            head.push_str(&format!("{name}: {value}\r\n"));
        }
        head.push_str("\r\n");
        let mut bytes = head.into_bytes();
        bytes.extend_from_slice(&self.body);
        bytes
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        303 => "See Other",
        400 => "Bad Request",
        404 => "Not Found",
        410 => "Gone",
        413 => "Payload Too Large",
        431 => "Request Header Fields Too Large",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

/// Body of `POST /api/slot/<i>`.
#[derive(Debug, Deserialize)]
struct OutputPayload {
    output: Option<String>,
    #[serde(default)]
    language: Option<String>,
}

#[derive(Debug, Serialize)]
struct TransitionReply {
    transition: &'static str,
    error: Option<String>,
    slot: Option<SlotSnapshot>,
}

pub fn transition_name(t: &Transition) -> &'static str {
    match t {
        Transition::EnteredPreview => "entered_preview",
        Transition::Refreshed => "refreshed",
        Transition::LeftPreview => "left_preview",
        Transition::Stored => "stored",
        Transition::Unchanged => "unchanged",
        Transition::Aborted(_) => "aborted",
    }
}

fn reply(controller: &SlotViewController<MemoryHost>, index: usize, t: Transition) -> Response {
    let error = match &t {
        Transition::Aborted(e) => Some(e.to_string()),
        _ => None,
    };
    Response::json(
        200,
        &TransitionReply {
            transition: transition_name(&t),
            error,
            slot: controller.snapshot().into_iter().nth(index),
        },
    )
}

fn slot_index(controller: &SlotViewController<MemoryHost>, raw: &str) -> Option<usize> {
    raw.parse::<usize>().ok().filter(|i| *i < controller.len())
}

/// Handle one request against the controller. Serving the page completes a
/// render cycle.
pub fn route(
    controller: &mut SlotViewController<MemoryHost>,
    req: &Request,
    title: &str,
) -> Response {
    let segments: Vec<&str> = req.path.split('/').filter(|s| !s.is_empty()).collect();

    match (req.method.as_str(), segments.as_slice()) {
        ("GET", []) => {
            let page = render_page(controller, title);
            controller.finish_render_cycle();
            Response::html(200, page)
        }
        ("GET", ["resource", id]) => serve_resource(controller, id),
        ("GET", ["slot", i, "view"]) => {
            let Some(index) = slot_index(controller, i) else {
                return Response::text(404, "no such slot");
            };
            let mode = req.query.get("mode").map(String::as_str).unwrap_or("code");
            match mode.parse::<ViewMode>() {
                Ok(mode) => {
                    controller.request_view(index, mode);
                    Response::redirect("/")
                }
                Err(e) => Response::text(400, e),
            }
        }
        ("POST", ["slot", i, "code"]) => {
            let Some(index) = slot_index(controller, i) else {
                return Response::text(404, "no such slot");
            };
            let form = parse_query(&String::from_utf8_lossy(&req.body));
            let code = form.get("code").map(String::as_str).unwrap_or_default();
            controller.edit_code(index, code);
            Response::redirect("/")
        }
        ("GET", ["api", "slots"]) => Response::json(200, &controller.snapshot()),
        ("POST", ["api", "slots"]) => {
            let Some(count) = req.query.get("count").and_then(|c| c.parse::<usize>().ok()) else {
                return Response::text(400, "missing or invalid count");
            };
            controller.resize(count);
            Response::json(200, &controller.snapshot())
        }
        ("POST", ["api", "slot", i]) => {
            let Some(index) = slot_index(controller, i) else {
                return Response::text(404, "no such slot");
            };
            let payload: OutputPayload = match serde_json::from_slice(&req.body) {
                Ok(p) => p,
                Err(e) => return Response::text(400, format!("invalid JSON: {e}")),
            };
            let language = match payload.language.as_deref() {
                Some(id) => Language::from_identifier(id),
                None => controller
                    .slot(index)
                    .map(|s| s.language().clone())
                    .unwrap_or_default(),
            };
            let t = controller.receive_output(index, payload.output.as_deref(), &language);
            reply(controller, index, t)
        }
        ("POST", ["api", "slot", i, "code"]) => {
            let Some(index) = slot_index(controller, i) else {
                return Response::text(404, "no such slot");
            };
            let code = String::from_utf8_lossy(&req.body);
            let t = controller.edit_code(index, &code);
            reply(controller, index, t)
        }
        _ => Response::text(404, "not found"),
    }
}

fn serve_resource(controller: &SlotViewController<MemoryHost>, id: &str) -> Response {
    let Ok(id) = Uuid::parse_str(id) else {
        return Response::text(404, "not found");
    };
    match controller.registry().host().resolve_id(id) {
        Some(doc) => Response::html(200, doc.as_str())
            .with_header("Content-Security-Policy", "sandbox allow-scripts")
            .with_header("Cache-Control", "no-store"),
        None => Response::text(410, "preview resource has been revoked"),
    }
}

/// Render the comparison page.
pub fn render_page(controller: &SlotViewController<MemoryHost>, title: &str) -> String {
    let panels: Vec<String> = controller
        .snapshot()
        .iter()
        .zip(controller.slots())
        .map(|(snap, slot)| render_slot(snap, slot.code(), slot.handle().map(|h| h.id)))
        .collect();

    let title = escape_html(title);
    let count = controller.len().to_string();
    fill(
        INDEX_HTML,
        &[
            ("title", title.as_str()),
            ("count", count.as_str()),
            ("slots", panels.join("\n").as_str()),
        ],
    )
}

fn render_slot(snap: &SlotSnapshot, code: &str, resource: Option<Uuid>) -> String {
    let i = snap.index;
    let mode_link = |mode: ViewMode, label: &str| {
        if snap.mode == mode {
            format!(r#"<span class="mode active">{label}</span>"#)
        } else if mode == ViewMode::Preview && !snap.preview_available {
            format!(r#"<span class="mode disabled" title="preview not available">{label}</span>"#)
        } else {
            format!(r#"<a class="mode" href="/slot/{i}/view?mode={mode}">{label}</a>"#)
        }
    };

    let mut html = format!(
        r#"<section class="slot" id="slot-{i}"><div class="slot-head"><span class="slot-label">{}</span><span class="slot-lang">{}</span><div class="modes">{}{}</div></div>"#,
        escape_html(&snap.label),
        escape_html(snap.language.identifier()),
        mode_link(ViewMode::Code, "Code"),
        mode_link(ViewMode::Preview, "Preview"),
    );

    if !snap.explanation.is_empty() {
        html.push_str(&format!(
            r#"<div class="explanation">{}</div>"#,
            escape_html(&snap.explanation)
        ));
    }
    if let Some(err) = &snap.error {
        html.push_str(&format!(r#"<div class="error">{}</div>"#, escape_html(err)));
    }

    match (snap.mode, resource) {
        (ViewMode::Preview, Some(id)) => html.push_str(&format!(
            r#"<iframe sandbox="allow-scripts" src="/resource/{id}" title="slot {i} preview"></iframe>"#
        )),
        _ => html.push_str(&format!(
            r#"<form method="post" action="/slot/{i}/code"><textarea name="code" spellcheck="false">{}</textarea><button class="btn" type="submit">Update</button></form>"#,
            escape_html(code)
        )),
    }

    html.push_str("</section>");
    html
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

/// Start the web UI server and open the browser.
pub async fn serve(
    bind: &str,
    port: u16,
    title: String,
    controller: SlotViewController<MemoryHost>,
) -> Result<(), Box<dyn std::error::Error>> {
    let listener = TcpListener::bind(format!("{bind}:{port}")).await?;
    let url = format!("http://localhost:{port}");

    eprintln!("{}", format!("  Comparison UI running at {url}").bright_green());
    eprintln!("{}", "  Press Ctrl+C to stop.".bright_blue());
    tracing::info!(%bind, port, "web server listening");

    #[cfg(target_os = "windows")]
    {
        let _ = std::process::Command::new("cmd")
            .args(["/C", &format!("start {url}")])
            .spawn();
    }
    #[cfg(target_os = "macos")]
    {
        let _ = std::process::Command::new("open").arg(&url).spawn();
    }
    #[cfg(target_os = "linux")]
    {
        let _ = std::process::Command::new("xdg-open").arg(&url).spawn();
    }

    run(listener, Arc::new(Mutex::new(controller)), title).await?;
    Ok(())
}

/// Accept connections on `listener` until it fails.
pub async fn run(
    listener: TcpListener,
    shared: SharedController,
    title: String,
) -> std::io::Result<()> {
    let title: Arc<str> = title.into();

    loop {
        let (stream, addr) = listener.accept().await?;
        let shared = Arc::clone(&shared);
        let title = Arc::clone(&title);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, shared, &title).await {
                tracing::warn!(%addr, error = %e, "connection error");
            }
        });
    }
}

async fn handle_connection(
    mut stream: TcpStream,
    shared: SharedController,
    title: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut buf = Vec::with_capacity(8192);
    let mut chunk = [0u8; 8192];

    let request = loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
        match parse_request(&buf) {
            Ok(Some(req)) => break req,
            Ok(None) => continue,
            Err(RequestError::TooLarge) => {
                stream
                    .write_all(&Response::text(413, "request too large").to_bytes())
                    .await?;
                return Ok(());
            }
            Err(e @ RequestError::HeadersTooLarge) => {
                stream
                    .write_all(&Response::text(431, e.to_string()).to_bytes())
                    .await?;
                return Ok(());
            }
            Err(e) => {
                stream
                    .write_all(&Response::text(400, e.to_string()).to_bytes())
                    .await?;
                return Ok(());
            }
        }
    };

    let response = {
        let mut controller = shared.lock().unwrap_or_else(|p| p.into_inner());
        route(&mut controller, &request, title)
    };
    tracing::debug!(method = %request.method, path = %request.path, status = response.status, "served request");
    stream.write_all(&response.to_bytes()).await?;
    Ok(())
}
