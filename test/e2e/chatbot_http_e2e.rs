use std::env;
use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use serde_json::{json, Value};
use tempfile::tempdir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use pharmacy_sales_bot::interface::directory::InMemoryDirectory;
use pharmacy_sales_bot::interface::followup::LoggingFollowUp;
use pharmacy_sales_bot::interface::http;
use pharmacy_sales_bot::interface::store::InMemoryConversationStore;
use pharmacy_sales_bot::service::ai::{LeadExtractor, OpenAiClient};
use pharmacy_sales_bot::service::chatbot::ConversationOrchestrator;
use pharmacy_sales_bot::service::directory::PharmacyDirectory;
use pharmacy_sales_bot::service::script::SalesScript;
use pharmacy_sales_bot::shared::config::AiConfig;
use pharmacy_sales_bot::shared::logging;

const SEED: &str = r#"[
  {"id": 1, "name": "HealthFirst Pharmacy", "phone": "+1-555-123-4567",
   "city": "New York", "state": "NY", "email": "orders@healthfirst.example",
   "prescriptions": [{"drug": "Lisinopril", "count": 150}, {"drug": "Metformin", "count": 130}]}
]"#;

const ORIGIN: &str = "http://localhost:5173";

struct ServerGuard(tokio::task::JoinHandle<()>);

impl Drop for ServerGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Minimal chat-completions endpoint: extraction prompts get a fenced JSON
/// answer, everything else gets a fixed sales reply.
async fn spawn_fake_llm() -> std::io::Result<(String, ServerGuard)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let handle = tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let mut chunk = [0u8; 4096];
                let body = loop {
                    let Ok(n) = socket.read(&mut chunk).await else {
                        return;
                    };
                    if n == 0 {
                        return;
                    }
                    buf.extend_from_slice(&chunk[..n]);
                    let text = String::from_utf8_lossy(&buf).to_string();
                    if let Some(pos) = text.find("\r\n\r\n") {
                        let len = text[..pos]
                            .lines()
                            .find_map(|l| {
                                let (name, value) = l.split_once(':')?;
                                name.eq_ignore_ascii_case("content-length")
                                    .then(|| value.trim().parse::<usize>().ok())
                                    .flatten()
                            })
                            .unwrap_or(0);
                        if buf.len() >= pos + 4 + len {
                            break String::from_utf8_lossy(&buf[pos + 4..pos + 4 + len]).to_string();
                        }
                    }
                };
                let request: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
                let prompt = request["messages"][0]["content"].as_str().unwrap_or("");
                let content = if prompt.contains("Extract pharmacy information") {
                    if prompt.contains("ABC Pharmacy") {
                        "```json\n{\"name\": \"ABC Pharmacy\", \"address\": null, \"contactPerson\": \"Jane\", \"email\": \"jane@abc.example\", \"rxVolume\": 3000}\n```".to_string()
                    } else {
                        "{}".to_string()
                    }
                } else {
                    "Pharmesol can help with that. Would you like a callback?".to_string()
                };
                let payload = json!({
                    "choices": [{"message": {"role": "assistant", "content": content}}]
                })
                .to_string();
                let resp = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    payload.len(),
                    payload
                );
                let _ = socket.write_all(resp.as_bytes()).await;
            });
        }
    });
    Ok((format!("http://{}", addr), ServerGuard(handle)))
}

async fn post(client: &reqwest::Client, url: &str, body: Value) -> Result<Value, reqwest::Error> {
    client.post(url).json(&body).send().await?.json::<Value>().await
}

#[tokio::test]
async fn chatbot_http_e2e() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    let log_dir = match env::var("E2E_LOG_DIR") {
        Ok(dir) => std::path::PathBuf::from(dir),
        Err(_) => temp.path().join("logs"),
    };
    env::set_var("LOG_MODE", "file");
    env::set_var("LOG_DIR", log_dir.to_string_lossy().as_ref());
    env::set_var("LOG_FORMAT", "json");
    env::set_var("RUST_LOG", "info");
    logging::init();

    let (llm_url, _llm_guard) = spawn_fake_llm().await?;
    let ai = Arc::new(OpenAiClient::new(
        AiConfig {
            openai_api_key: Some("test-key".to_string()),
            openai_base_url: llm_url,
            chat_model: "gpt-4".to_string(),
            extraction_model: "gpt-3.5-turbo".to_string(),
        },
        Duration::from_secs(5),
    ));
    let bot = Arc::new(ConversationOrchestrator::new(
        Arc::new(InMemoryConversationStore::new()),
        PharmacyDirectory::new(Arc::new(InMemoryDirectory::from_json(SEED)?)),
        LeadExtractor::new(ai.clone()),
        ai,
        Arc::new(LoggingFollowUp::new()),
        SalesScript::default(),
    ));

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let handle = http::spawn_api_server_with_listener(listener, bot, vec![ORIGIN.to_string()]);
    let _guard = ServerGuard(handle);

    let base = format!("http://{}/api/chatbot", addr);
    let client = reqwest::Client::new();

    // Known pharmacy: normalized phone match, greeting with the volume tier.
    let start = post(&client, &format!("{base}/start"), json!({"phoneNumber": "15551234567"})).await?;
    assert_eq!(start["success"], true);
    assert_eq!(start["isNewLead"], false);
    assert_eq!(start["pharmacy"]["rxVolume"], 8400);
    assert_eq!(start["pharmacy"]["address"], "New York, NY");
    let greeting = start["message"].as_str().unwrap_or_default();
    assert!(greeting.contains("HealthFirst Pharmacy"));
    assert!(greeting.contains("With 8,400 Rx per month"));

    let email = post(&client, &format!("{base}/send-email"), json!({"phoneNumber": "15551234567"})).await?;
    assert_eq!(email["success"], true);
    assert!(email["message"]
        .as_str()
        .unwrap_or_default()
        .contains("orders@healthfirst.example"));

    // New lead: collect, create, then follow up.
    let phone = "+1-555-9";
    let start = post(&client, &format!("{base}/start"), json!({"phoneNumber": phone})).await?;
    assert_eq!(start["isNewLead"], true);
    assert!(start["pharmacy"].is_null());

    let no_email = post(&client, &format!("{base}/send-email"), json!({"phoneNumber": phone})).await?;
    assert_eq!(no_email["success"], false);
    assert_eq!(
        no_email["message"],
        "Email address not available. Please provide an email address first."
    );

    let reply = post(
        &client,
        &format!("{base}/message"),
        json!({"phoneNumber": phone, "message": "We are ABC Pharmacy, contact Jane, 3000 Rx/month"}),
    )
    .await?;
    assert_eq!(reply["success"], true);
    assert_eq!(reply["collectingInfo"], false);
    assert_eq!(reply["pharmacy"]["name"], "ABC Pharmacy");
    assert_eq!(
        reply["message"],
        "Pharmesol can help with that. Would you like a callback?"
    );

    let resp = client
        .get(format!("{base}/conversation/%2B1-555-9"))
        .header("Origin", ORIGIN)
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some(ORIGIN)
    );
    let conversation: Value = resp.json().await?;
    assert_eq!(conversation["success"], true);
    let context = &conversation["context"];
    assert_eq!(context["isNewLead"], false);
    assert_eq!(context["profile"]["name"], "ABC Pharmacy");
    let roles: Vec<&str> = context["transcript"]
        .as_array()
        .map(|items| items.iter().filter_map(|m| m["role"].as_str()).collect())
        .unwrap_or_default();
    assert_eq!(roles, vec!["assistant", "user", "assistant"]);

    let callback = post(
        &client,
        &format!("{base}/schedule-callback"),
        json!({"phoneNumber": phone, "preferredTime": "tomorrow at 10am", "notes": "ask for Jane"}),
    )
    .await?;
    assert_eq!(callback["success"], true);
    assert!(callback["message"]
        .as_str()
        .unwrap_or_default()
        .contains("tomorrow at 10am"));

    let email = post(&client, &format!("{base}/send-email"), json!({"phoneNumber": phone})).await?;
    assert_eq!(email["success"], true);
    assert!(email["message"].as_str().unwrap_or_default().contains("jane@abc.example"));

    let pharmacies: Value = client.get(format!("{base}/pharmacies")).send().await?.json().await?;
    assert_eq!(pharmacies["success"], true);
    assert_eq!(pharmacies["pharmacies"].as_array().map(Vec::len), Some(2));

    // Unknown session and transport-level errors.
    let unknown = post(
        &client,
        &format!("{base}/message"),
        json!({"phoneNumber": "+1-555-0", "message": "hi"}),
    )
    .await?;
    assert_eq!(unknown["success"], false);
    assert_eq!(unknown["message"], "Please start a new conversation first.");

    let missing: Value = client
        .get(format!("{base}/conversation/%2B1-555-0"))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(missing["message"], "Conversation not found.");

    let bad = client
        .post(format!("{base}/start"))
        .header("Content-Type", "application/json")
        .body("{\"phoneNumber\": ")
        .send()
        .await?;
    assert_eq!(bad.status(), StatusCode::BAD_REQUEST);

    let wrong_method = client.get(format!("{base}/start")).send().await?;
    assert_eq!(wrong_method.status(), StatusCode::METHOD_NOT_ALLOWED);

    let not_found = client.get(format!("http://{}/nope", addr)).send().await?;
    assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

    let preflight = client
        .request(reqwest::Method::OPTIONS, format!("{base}/start"))
        .header("Origin", ORIGIN)
        .header("Access-Control-Request-Method", "POST")
        .send()
        .await?;
    assert_eq!(preflight.status(), StatusCode::NO_CONTENT);

    let too_large = client
        .post(format!("{base}/message"))
        .header("Content-Type", "application/json")
        .body(vec![b' '; 70 * 1024])
        .send()
        .await?;
    assert_eq!(too_large.status(), StatusCode::PAYLOAD_TOO_LARGE);

    Ok(())
}
