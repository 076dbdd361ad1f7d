use {
    anyhow::Result,
    clap::Subcommand,
    courier_bot::MediaSender,
    courier_config::{CourierConfig, Severity, validate},
    courier_media::{MediaReference, ResolverOptions, SourceResolver},
    courier_transport::{EventId, MatrixTransport},
    serde_json::{Map, Value},
    tracing::info,
};

#[derive(Subcommand)]
pub enum SendAction {
    /// Send a plain text message.
    Text { message: String },
    /// Upload any file.
    File {
        /// URL or local path.
        reference: String,
        /// Message body; defaults to the file name.
        #[arg(long)]
        body: Option<String>,
        /// JSON object merged over the message content.
        #[arg(long, value_parser = parse_extra)]
        extra: Option<Map<String, Value>>,
    },
    /// Upload an image (must be image/*).
    Image {
        reference: String,
        #[arg(long)]
        body: Option<String>,
    },
    /// Upload audio (must be audio/*).
    Audio {
        reference: String,
        #[arg(long)]
        body: Option<String>,
    },
    /// Upload a video (must be video/*).
    Video {
        reference: String,
        #[arg(long)]
        body: Option<String>,
    },
}

fn parse_extra(raw: &str) -> std::result::Result<Map<String, Value>, String> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err("--extra must be a JSON object".to_string()),
        Err(e) => Err(format!("invalid JSON: {e}")),
    }
}

fn sender(config: CourierConfig) -> Result<MediaSender<MatrixTransport>> {
    let errors: Vec<String> = validate(&config)
        .into_iter()
        .filter(|d| d.severity == Severity::Error)
        .map(|d| format!("{}: {}", d.path, d.message))
        .collect();
    if !errors.is_empty() {
        anyhow::bail!("invalid configuration:\n  {}", errors.join("\n  "));
    }

    let CourierConfig { matrix, media } = config;
    let client = reqwest::Client::new();
    let transport =
        MatrixTransport::with_client(client.clone(), &matrix.homeserver, matrix.access_token)?;
    let resolver = SourceResolver::new(client, ResolverOptions {
        measure_missing_content_length: media.measure_missing_content_length,
    });

    let sender = MediaSender::new(transport).with_resolver(resolver);
    Ok(match matrix.room_id {
        Some(room_id) => sender.with_default_room(room_id),
        None => sender,
    })
}

/// The room is settled before the reference touches the filesystem.
async fn dispatch(
    sender: &MediaSender<MatrixTransport>,
    room: Option<&str>,
    action: SendAction,
) -> courier_bot::Result<EventId> {
    let room = Some(sender.room(room)?);
    match action {
        SendAction::Text { message } => sender.send_text(room, &message).await,
        SendAction::File {
            reference,
            body,
            extra,
        } => {
            let reference = MediaReference::parse(&reference)?;
            sender.send_file(room, reference, body.as_deref(), extra).await
        },
        SendAction::Image { reference, body } => {
            let reference = MediaReference::parse(&reference)?;
            sender.send_image(room, reference, body.as_deref()).await
        },
        SendAction::Audio { reference, body } => {
            let reference = MediaReference::parse(&reference)?;
            sender.send_audio(room, reference, body.as_deref()).await
        },
        SendAction::Video { reference, body } => {
            let reference = MediaReference::parse(&reference)?;
            sender.send_video(room, reference, body.as_deref()).await
        },
    }
}

pub async fn handle_send(
    config: CourierConfig,
    room: Option<String>,
    action: SendAction,
) -> Result<()> {
    let sender = sender(config)?;
    let result = dispatch(&sender, room.as_deref(), action).await;

    let event_id = match result {
        Ok(event_id) => event_id,
        Err(e) => {
            let stage = e.stage();
            return Err(anyhow::Error::new(e).context(format!("{stage} stage failed")));
        },
    };
    info!(%event_id, "message delivered");
    println!("{event_id}");
    Ok(())
}
