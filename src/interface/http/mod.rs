//! JSON API for the chatbot, served over a minimal HTTP/1.1 loop.
//!
//! One request per connection (`Connection: close`). Every handled route
//! answers 200 with `{"success": bool, ...}`; transport-level problems use
//! 400/404/405/413.

use std::borrow::Cow;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use crate::service::chatbot::{ChatFailure, ConversationOrchestrator};
use crate::shared::utils::mask_phone;

const MAX_REQUEST_BYTES: usize = 64 * 1024;
const API_PREFIX: &str = "/api/chatbot/";
const LINGER: Duration = Duration::from_millis(500);

#[derive(Clone)]
struct ApiState {
    bot: Arc<ConversationOrchestrator>,
    allowed_origins: Arc<Vec<String>>,
}

pub async fn spawn_api_server(
    bind: SocketAddr,
    bot: Arc<ConversationOrchestrator>,
    allowed_origins: Vec<String>,
) -> std::io::Result<JoinHandle<()>> {
    let listener = TcpListener::bind(bind).await?;
    log::info!("[http] chatbot api listening on {}", listener.local_addr()?);
    Ok(spawn_api_server_with_listener(listener, bot, allowed_origins))
}

pub fn spawn_api_server_with_listener(
    listener: TcpListener,
    bot: Arc<ConversationOrchestrator>,
    allowed_origins: Vec<String>,
) -> JoinHandle<()> {
    let state = ApiState {
        bot,
        allowed_origins: Arc::new(allowed_origins),
    };
    tokio::spawn(async move {
        if let Err(e) = run_with_listener(listener, state).await {
            log::error!("[http] chatbot api error: {:?}", e);
        }
    })
}

async fn run_with_listener(listener: TcpListener, state: ApiState) -> std::io::Result<()> {
    loop {
        let (mut socket, peer) = listener.accept().await?;
        let state = state.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_conn(&mut socket, &state).await {
                log::debug!("[http] connection {} ended with error: {}", peer, e);
            }
        });
    }
}

#[derive(Debug)]
struct Request {
    method: String,
    target: String,
    headers: HashMap<String, String>,
    body: Vec<u8>,
}

#[derive(Debug)]
struct ApiResponse {
    status: u16,
    reason: &'static str,
    body: Value,
}

impl ApiResponse {
    fn ok(body: Value) -> Self {
        Self {
            status: 200,
            reason: "OK",
            body,
        }
    }

    fn error(status: u16, reason: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            reason,
            body: json!({ "success": false, "message": message.into() }),
        }
    }
}

enum ReadOutcome {
    Request(Request),
    TooLarge,
    Malformed,
    Closed,
}

async fn handle_conn(socket: &mut TcpStream, state: &ApiState) -> std::io::Result<()> {
    let request = match read_request(socket).await? {
        ReadOutcome::Request(request) => request,
        ReadOutcome::Closed => return Ok(()),
        ReadOutcome::TooLarge => {
            let resp = ApiResponse::error(413, "Payload Too Large", "Request too large");
            write_response(socket, &resp, None).await?;
            linger(socket).await;
            return Ok(());
        }
        ReadOutcome::Malformed => {
            let resp = ApiResponse::error(400, "Bad Request", "Malformed request");
            write_response(socket, &resp, None).await?;
            linger(socket).await;
            return Ok(());
        }
    };

    let origin = request
        .headers
        .get("origin")
        .filter(|origin| origin_allowed(&state.allowed_origins, origin))
        .cloned();

    if request.method == "OPTIONS" {
        return write_preflight(socket, origin.as_deref()).await;
    }

    let path = request.target.split('?').next().unwrap_or("");
    let resp = route(&state.bot, &request.method, path, &request.body).await;
    log::info!(
        "[http] {} {} status={}",
        request.method,
        redact_path(path),
        resp.status
    );
    write_response(socket, &resp, origin.as_deref()).await
}

async fn read_request(socket: &mut TcpStream) -> std::io::Result<ReadOutcome> {
    let mut buf = vec![0u8; 4096];
    let mut read_len = 0usize;
    let header_end = loop {
        let n = socket.read(&mut buf[read_len..]).await?;
        if n == 0 {
            return Ok(ReadOutcome::Closed);
        }
        read_len += n;
        if let Some(pos) = find_header_end(&buf[..read_len]) {
            break pos;
        }
        if read_len > MAX_REQUEST_BYTES {
            return Ok(ReadOutcome::TooLarge);
        }
        if read_len == buf.len() {
            buf.resize(buf.len() + 4096, 0);
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).into_owned();
    let mut lines = head.lines();
    let Some(first_line) = lines.next() else {
        return Ok(ReadOutcome::Malformed);
    };
    let mut parts = first_line.split_whitespace();
    let (Some(method), Some(target)) = (parts.next(), parts.next()) else {
        return Ok(ReadOutcome::Malformed);
    };
    let mut headers = HashMap::new();
    for line in lines {
        if line.trim().is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
        }
    }

    let content_length = match headers.get("content-length") {
        Some(value) => match value.parse::<usize>() {
            Ok(len) => len,
            Err(_) => return Ok(ReadOutcome::Malformed),
        },
        None => 0,
    };
    let body_start = header_end + 4;
    if body_start
        .checked_add(content_length)
        .map_or(true, |end| end > MAX_REQUEST_BYTES)
    {
        return Ok(ReadOutcome::TooLarge);
    }

    let mut body = buf[body_start.min(read_len)..read_len].to_vec();
    while body.len() < content_length {
        let mut chunk = vec![0u8; content_length - body.len()];
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            return Ok(ReadOutcome::Malformed);
        }
        body.extend_from_slice(&chunk[..n]);
    }
    body.truncate(content_length);

    Ok(ReadOutcome::Request(Request {
        method: method.to_string(),
        target: target.to_string(),
        headers,
        body,
    }))
}

/// Discards whatever the peer is still sending so the close is not a reset.
async fn linger(socket: &mut TcpStream) {
    let _ = socket.shutdown().await;
    let mut sink = [0u8; 4096];
    let _ = tokio::time::timeout(LINGER, async {
        while let Ok(n) = socket.read(&mut sink).await {
            if n == 0 {
                break;
            }
        }
    })
    .await;
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartChatBody {
    phone_number: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendMessageBody {
    phone_number: String,
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScheduleCallbackBody {
    phone_number: String,
    preferred_time: String,
    #[serde(default)]
    notes: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendEmailBody {
    phone_number: String,
}

async fn route(bot: &ConversationOrchestrator, method: &str, path: &str, body: &[u8]) -> ApiResponse {
    let Some(rest) = path.strip_prefix(API_PREFIX) else {
        return ApiResponse::error(404, "Not Found", "Not found");
    };

    match rest {
        "start" | "message" | "schedule-callback" | "send-email" if method != "POST" => {
            ApiResponse::error(405, "Method Not Allowed", "Method not allowed")
        }
        "pharmacies" if method != "GET" => {
            ApiResponse::error(405, "Method Not Allowed", "Method not allowed")
        }
        "start" => {
            let req: StartChatBody = match parse_body(body) {
                Ok(req) => req,
                Err(resp) => return resp,
            };
            if let Err(resp) = require(&[("phoneNumber", &req.phone_number)]) {
                return resp;
            }
            respond(bot, bot.start(&req.phone_number).await)
        }
        "message" => {
            let req: SendMessageBody = match parse_body(body) {
                Ok(req) => req,
                Err(resp) => return resp,
            };
            if let Err(resp) = require(&[
                ("phoneNumber", &req.phone_number),
                ("message", &req.message),
            ]) {
                return resp;
            }
            respond(bot, bot.message(&req.phone_number, &req.message).await)
        }
        "schedule-callback" => {
            let req: ScheduleCallbackBody = match parse_body(body) {
                Ok(req) => req,
                Err(resp) => return resp,
            };
            if let Err(resp) = require(&[
                ("phoneNumber", &req.phone_number),
                ("preferredTime", &req.preferred_time),
            ]) {
                return resp;
            }
            let result = bot
                .schedule_callback(&req.phone_number, &req.preferred_time, req.notes)
                .await
                .map(|message| json!({ "message": message }));
            respond(bot, result)
        }
        "send-email" => {
            let req: SendEmailBody = match parse_body(body) {
                Ok(req) => req,
                Err(resp) => return resp,
            };
            if let Err(resp) = require(&[("phoneNumber", &req.phone_number)]) {
                return resp;
            }
            let result = bot
                .send_follow_up_email(&req.phone_number)
                .await
                .map(|message| json!({ "message": message }));
            respond(bot, result)
        }
        "pharmacies" => {
            let result = bot
                .list_pharmacies()
                .await
                .map(|pharmacies| json!({ "pharmacies": pharmacies }));
            respond(bot, result)
        }
        other => match other.strip_prefix("conversation/") {
            Some(_) if method != "GET" => {
                ApiResponse::error(405, "Method Not Allowed", "Method not allowed")
            }
            Some(raw_phone) if !raw_phone.is_empty() && !raw_phone.contains('/') => {
                let Some(phone) = decode_phone(raw_phone) else {
                    return ApiResponse::error(400, "Bad Request", "Invalid phone number");
                };
                let result = bot
                    .get_conversation(&phone)
                    .map(|context| json!({ "context": context }));
                respond(bot, result)
            }
            _ => ApiResponse::error(404, "Not Found", "Not found"),
        },
    }
}

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiResponse> {
    serde_json::from_slice(body).map_err(|e| {
        log::debug!("[http] rejected body: {}", e);
        ApiResponse::error(400, "Bad Request", format!("Invalid request body: {}", e))
    })
}

fn require(fields: &[(&str, &String)]) -> Result<(), ApiResponse> {
    match fields.iter().find(|(_, value)| value.trim().is_empty()) {
        Some((name, _)) => Err(ApiResponse::error(
            400,
            "Bad Request",
            format!("{} should not be empty", name),
        )),
        None => Ok(()),
    }
}

/// Folds an orchestrator result into the uniform `{success, ...}` envelope.
fn respond<T: Serialize>(bot: &ConversationOrchestrator, result: Result<T, ChatFailure>) -> ApiResponse {
    match result {
        Ok(payload) => {
            let mut body = match serde_json::to_value(payload) {
                Ok(Value::Object(map)) => map,
                Ok(other) => {
                    let mut map = serde_json::Map::new();
                    map.insert("data".to_string(), other);
                    map
                }
                Err(e) => {
                    log::error!("[http] failed to encode payload: {}", e);
                    return ApiResponse::error(500, "Internal Server Error", "Internal error");
                }
            };
            body.insert("success".to_string(), Value::Bool(true));
            ApiResponse::ok(Value::Object(body))
        }
        Err(failure) => {
            log::warn!("[http] operation failed: {}", failure);
            ApiResponse::ok(json!({
                "success": false,
                "message": failure.user_message(bot.script()),
            }))
        }
    }
}

fn origin_allowed(allowed: &[String], origin: &str) -> bool {
    allowed.iter().any(|a| a == "*" || a == origin)
}

fn decode_phone(raw: &str) -> Option<String> {
    urlencoding::decode(raw).ok().map(Cow::into_owned)
}

fn redact_path(path: &str) -> String {
    match path.strip_prefix("/api/chatbot/conversation/") {
        Some(phone) => format!(
            "/api/chatbot/conversation/{}",
            mask_phone(&decode_phone(phone).unwrap_or_default())
        ),
        None => path.to_string(),
    }
}

async fn write_preflight(socket: &mut TcpStream, origin: Option<&str>) -> std::io::Result<()> {
    let mut resp = Vec::new();
    resp.extend_from_slice(b"HTTP/1.1 204 No Content\r\n");
    push_cors_headers(&mut resp, origin);
    resp.extend_from_slice(b"Access-Control-Allow-Methods: GET, POST, OPTIONS\r\n");
    resp.extend_from_slice(b"Access-Control-Allow-Headers: Content-Type\r\n");
    resp.extend_from_slice(b"Content-Length: 0\r\n");
    resp.extend_from_slice(b"Connection: close\r\n\r\n");
    socket.write_all(&resp).await
}

async fn write_response(
    socket: &mut TcpStream,
    response: &ApiResponse,
    origin: Option<&str>,
) -> std::io::Result<()> {
    let body = serde_json::to_vec(&response.body).unwrap_or_default();
    let mut resp = Vec::new();
    resp.extend_from_slice(
        format!("HTTP/1.1 {} {}\r\n", response.status, response.reason).as_bytes(),
    );
    resp.extend_from_slice(b"Content-Type: application/json\r\n");
    push_cors_headers(&mut resp, origin);
    resp.extend_from_slice(format!("Content-Length: {}\r\n", body.len()).as_bytes());
    resp.extend_from_slice(b"Connection: close\r\n\r\n");
    resp.extend_from_slice(&body);
    socket.write_all(&resp).await
}

fn push_cors_headers(resp: &mut Vec<u8>, origin: Option<&str>) {
    if let Some(origin) = origin {
        resp.extend_from_slice(format!("Access-Control-Allow-Origin: {}\r\n", origin).as_bytes());
        resp.extend_from_slice(b"Access-Control-Allow-Credentials: true\r\n");
        resp.extend_from_slice(b"Vary: Origin\r\n");
    }
}
