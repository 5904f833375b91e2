use {
    teloxide::{
        prelude::*,
        types::{MediaKind, MessageKind},
    },
    tracing::{debug, info, warn},
};

use mediarelay_pipeline::{MediaFetcher, MediaReference, RelayPipeline};

use crate::outbound;

/// Greeting for /start and /help.
pub(crate) const WELCOME_MSG: &str = "Hey, I'm your Media to Telegraph Bot! \u{1F60E} Send me an image, video, or document, and I'll give you a Telegraph link to share it. Supported formats: JPG, PNG, GIF, MP4.";

/// Nudge for messages without a relayable attachment.
pub(crate) const HINT_MSG: &str =
    "Please send an image, video, or document to get a Telegraph link.";

/// Handle a single inbound Telegram message (called from the polling loop).
///
/// Commands get the welcome text, media goes through the relay pipeline, and
/// everything else common gets a usage hint. Service messages are ignored.
pub async fn handle_message(
    msg: Message,
    bot: &Bot,
    fetcher: &dyn MediaFetcher,
    pipeline: &RelayPipeline,
) -> anyhow::Result<()> {
    if let Some(text) = extract_text(&msg)
        && let Some(command) = parse_command(&text)
    {
        match command {
            "start" | "help" => outbound::reply_plain(bot, &msg, WELCOME_MSG).await?,
            other => {
                debug!(command = other, "unknown command");
                outbound::reply_plain(bot, &msg, HINT_MSG).await?;
            },
        }
        return Ok(());
    }

    let Some(reference) = extract_media(&msg) else {
        // Text, stickers, voice notes and the like cannot be relayed.
        if matches!(&msg.kind, MessageKind::Common(_)) {
            outbound::reply_plain(bot, &msg, HINT_MSG).await?;
        } else {
            debug!(chat_id = msg.chat.id.0, "ignoring non-common message");
        }
        return Ok(());
    };

    info!(
        chat_id = msg.chat.id.0,
        kind = reference.kind.as_str(),
        file_id = %reference.file_id,
        "relaying inbound media"
    );

    match pipeline.run(fetcher, &reference).await {
        Ok(relayed) => {
            outbound::reply_html(bot, &msg, &link_reply(&relayed.url)).await?;
        },
        Err(err) => {
            warn!(chat_id = msg.chat.id.0, error = %err, "relay failed");
            outbound::reply_plain(bot, &msg, &err.user_message()).await?;
        },
    }

    Ok(())
}

/// Success reply: an HTML anchor around the public link.
fn link_reply(url: &str) -> String {
    format!("Here's your Telegraph link: <a href='{url}'>View Media</a>")
}

/// Extract text content from a message. Captions are not commands, so only
/// plain text messages count.
fn extract_text(msg: &Message) -> Option<String> {
    match &msg.kind {
        MessageKind::Common(common) => match &common.media_kind {
            MediaKind::Text(t) => Some(t.text.clone()),
            _ => None,
        },
        _ => None,
    }
}

/// Parse a leading slash command, tolerating the `/cmd@botname` group form.
fn parse_command(text: &str) -> Option<&str> {
    let rest = text.strip_prefix('/')?;
    let command = rest.split_whitespace().next().unwrap_or("");
    Some(command.split('@').next().unwrap_or(command))
}

/// Extract a relayable media reference from a message.
///
/// Photos pick the largest size; videos and documents carry the declared
/// filename so the extension pre-check can see it.
fn extract_media(msg: &Message) -> Option<MediaReference> {
    match &msg.kind {
        MessageKind::Common(common) => match &common.media_kind {
            MediaKind::Photo(p) => p
                .photo
                .last()
                .map(|size| MediaReference::photo(size.file.id.clone())),
            MediaKind::Video(v) => Some(MediaReference::video(
                v.video.file.id.clone(),
                v.video.file_name.clone(),
            )),
            MediaKind::Document(d) => Some(MediaReference::document(
                d.document.file.id.clone(),
                d.document.file_name.clone(),
            )),
            _ => None,
        },
        _ => None,
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use {
        axum::{Json, Router, body::Bytes, extract::State, http::Uri, routing::post},
        mediarelay_pipeline::{AttachmentKind, RelayPipeline},
        mediarelay_telegraph::{TelegraphUploader, upload::PUBLIC_BASE},
        rstest::rstest,
        secrecy::Secret,
        serde::{Deserialize, Serialize},
        serde_json::json,
        tokio::sync::oneshot,
    };

    use {super::*, crate::fetch::TelegramFetcher};

    const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46];

    // ── Mock Telegram API ───────────────────────────────────────────────────

    #[derive(Debug, Clone, Deserialize)]
    struct SendMessageRequest {
        chat_id: i64,
        text: String,
        #[serde(default)]
        parse_mode: Option<String>,
    }

    #[derive(Debug, Serialize)]
    struct TelegramApiResponse {
        ok: bool,
        result: TelegramApiResult,
    }

    #[derive(Debug, Serialize)]
    #[serde(untagged)]
    enum TelegramApiResult {
        File(TelegramFileResult),
        Message(TelegramMessageResult),
        Bool(bool),
    }

    #[derive(Debug, Serialize)]
    struct TelegramFileResult {
        file_id: String,
        file_unique_id: String,
        file_size: u32,
        file_path: String,
    }

    #[derive(Debug, Serialize)]
    struct TelegramChat {
        id: i64,
        #[serde(rename = "type")]
        chat_type: String,
    }

    #[derive(Debug, Serialize)]
    struct TelegramMessageResult {
        message_id: i64,
        date: i64,
        chat: TelegramChat,
        text: String,
    }

    #[derive(Clone)]
    struct MockTelegramApi {
        sent: Arc<Mutex<Vec<SendMessageRequest>>>,
    }

    async fn telegram_api_handler(
        State(state): State<MockTelegramApi>,
        uri: Uri,
        body: Bytes,
    ) -> Json<TelegramApiResponse> {
        let method = uri.path().rsplit('/').next().unwrap_or_default();
        let result = match method {
            "GetFile" => TelegramApiResult::File(TelegramFileResult {
                file_id: "remote-file-id".into(),
                file_unique_id: "remote-unique-id".into(),
                file_size: 16,
                file_path: "photos/file_1.jpg".into(),
            }),
            "SendMessage" => {
                let request: SendMessageRequest =
                    serde_json::from_slice(&body).expect("deserialize sendMessage body");
                state.sent.lock().expect("lock sent").push(request);
                TelegramApiResult::Message(TelegramMessageResult {
                    message_id: 1,
                    date: 0,
                    chat: TelegramChat {
                        id: 42,
                        chat_type: "private".into(),
                    },
                    text: "ok".into(),
                })
            },
            _ => TelegramApiResult::Bool(true),
        };
        Json(TelegramApiResponse { ok: true, result })
    }

    async fn file_download_handler() -> Bytes {
        Bytes::from_static(JPEG_MAGIC)
    }

    /// Spin up the mock Telegram API; returns the bot, the captured
    /// sendMessage requests, and a shutdown handle.
    async fn start_mock_api() -> (
        Bot,
        TelegramFetcher,
        Arc<Mutex<Vec<SendMessageRequest>>>,
        oneshot::Sender<()>,
        tokio::task::JoinHandle<()>,
    ) {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new()
            .route(
                "/{*path}",
                post(telegram_api_handler).get(file_download_handler),
            )
            .with_state(MockTelegramApi {
                sent: Arc::clone(&sent),
            });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let server = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("serve mock telegram api");
        });
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        let api_url = reqwest::Url::parse(&format!("http://{addr}/")).expect("parse api url");
        let bot = Bot::new("test-token").set_api_url(api_url);
        let fetcher = TelegramFetcher::with_file_base(bot.clone(), format!("http://{addr}"));

        (bot, fetcher, sent, shutdown_tx, server)
    }

    fn photo_message() -> Message {
        serde_json::from_value(json!({
            "message_id": 1,
            "date": 1,
            "chat": { "id": 42, "type": "private", "first_name": "Alice" },
            "from": {
                "id": 1001,
                "is_bot": false,
                "first_name": "Alice",
                "username": "alice"
            },
            "photo": [
                { "file_id": "photo-small", "file_unique_id": "u1", "width": 90, "height": 90, "file_size": 1200 },
                { "file_id": "photo-large", "file_unique_id": "u2", "width": 800, "height": 800, "file_size": 48000 }
            ]
        }))
        .expect("deserialize photo message")
    }

    fn text_message(text: &str) -> Message {
        serde_json::from_value(json!({
            "message_id": 2,
            "date": 1,
            "chat": { "id": 42, "type": "private", "first_name": "Alice" },
            "from": {
                "id": 1001,
                "is_bot": false,
                "first_name": "Alice"
            },
            "text": text
        }))
        .expect("deserialize text message")
    }

    fn document_message(file_name: &str) -> Message {
        serde_json::from_value(json!({
            "message_id": 3,
            "date": 1,
            "chat": { "id": 42, "type": "private", "first_name": "Alice" },
            "from": {
                "id": 1001,
                "is_bot": false,
                "first_name": "Alice"
            },
            "document": {
                "file_id": "doc-1",
                "file_unique_id": "u4",
                "file_name": file_name,
                "mime_type": "application/octet-stream",
                "file_size": 4321
            }
        }))
        .expect("deserialize document message")
    }

    // ── Extraction ──────────────────────────────────────────────────────────

    #[test]
    fn photos_pick_the_largest_size() {
        let reference = extract_media(&photo_message()).expect("photo reference");
        assert_eq!(reference.kind, AttachmentKind::Photo);
        assert_eq!(reference.file_id, "photo-large");
        assert_eq!(reference.extension(), ".jpg");
    }

    #[test]
    fn videos_carry_the_declared_filename() {
        let msg: Message = serde_json::from_value(json!({
            "message_id": 4,
            "date": 1,
            "chat": { "id": 42, "type": "private", "first_name": "Alice" },
            "from": { "id": 1001, "is_bot": false, "first_name": "Alice" },
            "video": {
                "file_id": "vid-1",
                "file_unique_id": "u3",
                "width": 640,
                "height": 480,
                "duration": 5,
                "file_name": "clip.mp4",
                "mime_type": "video/mp4",
                "file_size": 90000
            }
        }))
        .expect("deserialize video message");

        let reference = extract_media(&msg).expect("video reference");
        assert_eq!(reference.kind, AttachmentKind::Video);
        assert_eq!(reference.file_id, "vid-1");
        assert_eq!(reference.file_name.as_deref(), Some("clip.mp4"));
    }

    #[test]
    fn documents_carry_the_declared_filename() {
        let reference = extract_media(&document_message("scan.png")).expect("document reference");
        assert_eq!(reference.kind, AttachmentKind::Document);
        assert_eq!(reference.extension(), ".png");
    }

    #[test]
    fn text_messages_have_no_media() {
        assert!(extract_media(&text_message("hello")).is_none());
    }

    #[rstest]
    #[case("/start", Some("start"))]
    #[case("/start@media_relay_bot", Some("start"))]
    #[case("/help now", Some("help"))]
    #[case("hello", None)]
    #[case("not /a command", None)]
    fn commands_parse(#[case] text: &str, #[case] expected: Option<&str>) {
        assert_eq!(parse_command(text), expected);
    }

    // ── End to end against the mock APIs ────────────────────────────────────

    #[tokio::test]
    async fn photo_is_relayed_and_the_link_comes_back() {
        let mut telegraph = mockito::Server::new_async().await;
        let _upload = telegraph
            .mock("POST", "/upload")
            .with_status(200)
            .with_body(r#"[{"src": "/file/test.jpg"}]"#)
            .create_async()
            .await;

        let (bot, fetcher, sent, shutdown_tx, server) = start_mock_api().await;
        let pipeline = RelayPipeline::new(TelegraphUploader::with_endpoints(
            Some(Secret::new("tg-token".into())),
            format!("{}/upload", telegraph.url()),
            PUBLIC_BASE,
        ));

        handle_message(photo_message(), &bot, &fetcher, &pipeline)
            .await
            .expect("handle photo message");

        {
            let sent = sent.lock().expect("sent lock");
            assert_eq!(sent.len(), 1, "expected exactly one reply, got {sent:?}");
            assert_eq!(sent[0].chat_id, 42);
            assert_eq!(sent[0].parse_mode.as_deref(), Some("HTML"));
            assert!(
                sent[0].text.contains("https://telegra.ph/file/test.jpg"),
                "reply should carry the public link: {}",
                sent[0].text
            );
        }

        let _ = shutdown_tx.send(());
        server.await.expect("server join");
    }

    #[tokio::test]
    async fn disallowed_extension_is_refused_without_downloading() {
        let (bot, fetcher, sent, shutdown_tx, server) = start_mock_api().await;
        let pipeline = RelayPipeline::new(TelegraphUploader::new(None));

        handle_message(document_message("setup.exe"), &bot, &fetcher, &pipeline)
            .await
            .expect("handle document message");

        {
            let sent = sent.lock().expect("sent lock");
            assert_eq!(sent.len(), 1);
            assert_eq!(
                sent[0].text,
                "Sorry, .exe is not supported. Please use JPG, PNG, GIF, or MP4."
            );
            assert_eq!(sent[0].parse_mode, None);
        }

        let _ = shutdown_tx.send(());
        server.await.expect("server join");
    }

    #[tokio::test]
    async fn start_command_gets_the_welcome_text() {
        let (bot, fetcher, sent, shutdown_tx, server) = start_mock_api().await;
        let pipeline = RelayPipeline::new(TelegraphUploader::new(None));

        handle_message(text_message("/start"), &bot, &fetcher, &pipeline)
            .await
            .expect("handle /start");

        {
            let sent = sent.lock().expect("sent lock");
            assert_eq!(sent.len(), 1);
            assert_eq!(sent[0].text, WELCOME_MSG);
        }

        let _ = shutdown_tx.send(());
        server.await.expect("server join");
    }

    #[tokio::test]
    async fn plain_text_gets_the_usage_hint() {
        let (bot, fetcher, sent, shutdown_tx, server) = start_mock_api().await;
        let pipeline = RelayPipeline::new(TelegraphUploader::new(None));

        handle_message(text_message("what does this bot do?"), &bot, &fetcher, &pipeline)
            .await
            .expect("handle text");

        {
            let sent = sent.lock().expect("sent lock");
            assert_eq!(sent.len(), 1);
            assert_eq!(sent[0].text, HINT_MSG);
        }

        let _ = shutdown_tx.send(());
        server.await.expect("server join");
    }
}
