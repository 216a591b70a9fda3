use linkzup_backend::AppError;
use linkzup_backend::config::LinkedInConfig;
use linkzup_backend::external::{LinkedInClient, LinkedInCredential, PostingAdapter, post_url};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

const ASSET: &str = "urn:li:digitalmediaAsset:C5";
const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a];

#[derive(Debug, Clone)]
struct Recorded {
    method: String,
    path: String,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Recorded {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

struct Reply {
    status: u16,
    headers: Vec<(&'static str, String)>,
    body: Vec<u8>,
}

impl Reply {
    fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    fn header(mut self, name: &'static str, value: &str) -> Self {
        self.headers.push((name, value.to_string()));
        self
    }

    fn encode(&self) -> Vec<u8> {
        let mut head = format!(
            "HTTP/1.1 {} Stub\r\ncontent-length: {}\r\nconnection: close\r\n",
            self.status,
            self.body.len()
        );
        for (name, value) in &self.headers {
            head.push_str(&format!("{name}: {value}\r\n"));
        }
        head.push_str("\r\n");
        let mut out = head.into_bytes();
        out.extend_from_slice(&self.body);
        out
    }
}

type Seen = Arc<Mutex<Vec<Recorded>>>;

/// Serves one request per connection; `route` gets the stub's base URL.
async fn start_stub<F>(route: F) -> (String, Seen)
where
    F: Fn(&str, &str, &str) -> Reply + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));

    let (task_base, task_seen) = (base.clone(), seen.clone());
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            let Some(req) = read_request(&mut stream).await else {
                continue;
            };
            let reply = route(&task_base, &req.method, &req.path);
            task_seen.lock().unwrap().push(req);
            let _ = stream.write_all(&reply.encode()).await;
            let _ = stream.shutdown().await;
        }
    });
    (base, seen)
}

async fn read_request(stream: &mut TcpStream) -> Option<Recorded> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let head_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).into_owned();
    let mut lines = head.lines();
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|l| l.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();
    let content_length = headers
        .iter()
        .find(|(k, _)| k == "content-length")
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);

    let mut body = buf[head_end..].to_vec();
    while body.len() < content_length {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }
    body.truncate(content_length);

    Some(Recorded {
        method,
        path,
        headers,
        body,
    })
}

fn register_ok(base: &str) -> Reply {
    let body = json!({
        "value": {
            "uploadMechanism": {
                "com.linkedin.digitalmedia.uploading.MediaUploadHttpRequest": {
                    "headers": {},
                    "uploadUrl": format!("{base}/upload/C5")
                }
            },
            "asset": ASSET
        }
    });
    Reply::new(200, body.to_string()).header("content-type", "application/json")
}

fn published(id: &str) -> Reply {
    Reply::new(201, "{}").header("x-restli-id", id)
}

fn client(base: &str) -> LinkedInClient {
    LinkedInClient::new(&LinkedInConfig {
        api_base_url: format!("{base}/"),
        request_timeout_secs: 5,
    })
    .unwrap()
}

fn credential() -> LinkedInCredential {
    LinkedInCredential {
        access_token: "tok".to_string(),
        profile_id: "abc".to_string(),
    }
}

fn paths(seen: &Seen) -> Vec<String> {
    seen.lock()
        .unwrap()
        .iter()
        .map(|r| format!("{} {}", r.method, r.path))
        .collect()
}

fn share_request(seen: &Seen) -> Recorded {
    seen.lock()
        .unwrap()
        .iter()
        .find(|r| r.path == "/v2/ugcPosts")
        .cloned()
        .unwrap()
}

#[tokio::test]
async fn register_failure_publishes_text_only() {
    let (base, seen) = start_stub(|_, method, path| match (method, path) {
        ("POST", "/v2/assets?action=registerUpload") => Reply::new(500, "upstream down"),
        ("POST", "/v2/ugcPosts") => published("urn:li:share:42"),
        _ => Reply::new(404, ""),
    })
    .await;
    let image = format!("{base}/img.png");

    let post = client(&base)
        .post("Hello LinkedIn", Some(&image), &credential())
        .await
        .unwrap();

    assert_eq!(post.post_id, "urn:li:share:42");
    assert_eq!(post.url, post_url("urn:li:share:42"));
    assert_eq!(
        paths(&seen),
        vec![
            "POST /v2/assets?action=registerUpload".to_string(),
            "POST /v2/ugcPosts".to_string(),
        ]
    );

    let publish = share_request(&seen);
    assert_eq!(publish.header("authorization"), Some("Bearer tok"));
    assert_eq!(publish.header("x-restli-protocol-version"), Some("2.0.0"));
    let body = publish.json();
    let share = &body["specificContent"]["com.linkedin.ugc.ShareContent"];
    assert_eq!(body["author"], "urn:li:person:abc");
    assert_eq!(share["shareCommentary"]["text"], "Hello LinkedIn");
    assert_eq!(share["shareMediaCategory"], "NONE");
    assert_eq!(share["media"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn unreachable_image_publishes_text_only() {
    let (base, seen) = start_stub(|base, method, path| match (method, path) {
        ("POST", "/v2/assets?action=registerUpload") => register_ok(base),
        ("GET", "/missing.png") => Reply::new(404, "not found"),
        ("POST", "/v2/ugcPosts") => Reply::new(201, r#"{"id":"urn:li:share:7"}"#),
        _ => Reply::new(404, ""),
    })
    .await;
    let image = format!("{base}/missing.png");

    let post = client(&base)
        .post("No picture after all", Some(&image), &credential())
        .await
        .unwrap();

    assert_eq!(post.post_id, "urn:li:share:7");
    assert!(paths(&seen).iter().all(|p| !p.starts_with("PUT")));
    let body = share_request(&seen).json();
    assert_eq!(
        body["specificContent"]["com.linkedin.ugc.ShareContent"]["shareMediaCategory"],
        "NONE"
    );
}

#[tokio::test]
async fn image_is_uploaded_and_attached() {
    let (base, seen) = start_stub(|base, method, path| match (method, path) {
        ("POST", "/v2/assets?action=registerUpload") => register_ok(base),
        ("GET", "/img.png") => Reply::new(200, PNG).header("content-type", "image/png"),
        ("PUT", "/upload/C5") => Reply::new(201, ""),
        ("POST", "/v2/ugcPosts") => published("urn:li:share:99"),
        _ => Reply::new(404, ""),
    })
    .await;
    let image = format!("{base}/img.png");

    let post = client(&base)
        .post("With a picture", Some(&image), &credential())
        .await
        .unwrap();
    assert_eq!(post.post_id, "urn:li:share:99");

    assert_eq!(
        paths(&seen),
        vec![
            "POST /v2/assets?action=registerUpload".to_string(),
            "GET /img.png".to_string(),
            "PUT /upload/C5".to_string(),
            "POST /v2/ugcPosts".to_string(),
        ]
    );
    let upload = seen.lock().unwrap()[2].clone();
    assert_eq!(upload.body, PNG);
    assert_eq!(upload.header("content-type"), Some("image/png"));

    let body = share_request(&seen).json();
    let share = &body["specificContent"]["com.linkedin.ugc.ShareContent"];
    assert_eq!(share["shareMediaCategory"], "IMAGE");
    assert_eq!(share["media"][0]["media"], ASSET);
}

#[tokio::test]
async fn publish_failure_is_an_error() {
    let (base, _seen) = start_stub(|_, _, _| Reply::new(500, "nope")).await;

    let err = client(&base)
        .post("Text only", None, &credential())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::ExternalApiError(ref m) if m.contains("HTTP 500")));
}
