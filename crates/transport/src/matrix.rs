//! Matrix client-server API transport.

use {
    async_trait::async_trait,
    reqwest::{Response, header::CONTENT_TYPE},
    secrecy::{ExposeSecret, Secret},
    serde::Deserialize,
    serde_json::Value,
    tracing::debug,
    url::Url,
};

use crate::{Error, EventId, MediaUpload, Result, RoomTransport, UploadResponse};

const UPLOAD_PATH: &str = "_matrix/media/v3/upload";
const ROOMS_PATH: &str = "_matrix/client/v3/rooms";

/// Transport for a logged-in Matrix account.
pub struct MatrixTransport {
    client: reqwest::Client,
    homeserver: Url,
    access_token: Secret<String>,
}

impl std::fmt::Debug for MatrixTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatrixTransport")
            .field("homeserver", &self.homeserver.as_str())
            .field("access_token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize)]
struct UploadReply {
    content_uri: Option<Value>,
}

#[derive(Deserialize)]
struct SendReply {
    event_id: Option<Value>,
}

#[derive(Deserialize)]
struct ErrorReply {
    errcode: Option<String>,
    error: Option<String>,
}

impl MatrixTransport {
    pub fn new(homeserver: &str, access_token: Secret<String>) -> Result<Self> {
        Self::with_client(reqwest::Client::new(), homeserver, access_token)
    }

    pub fn with_client(
        client: reqwest::Client,
        homeserver: &str,
        access_token: Secret<String>,
    ) -> Result<Self> {
        // A trailing slash keeps any path prefix when joining endpoints.
        let mut homeserver = Url::parse(homeserver)?;
        if !homeserver.path().ends_with('/') {
            let path = format!("{}/", homeserver.path());
            homeserver.set_path(&path);
        }
        Ok(Self {
            client,
            homeserver,
            access_token,
        })
    }

    #[must_use]
    pub fn homeserver(&self) -> &Url {
        &self.homeserver
    }

    fn upload_url(&self, filename: &str) -> Result<Url> {
        let mut url = self.homeserver.join(UPLOAD_PATH)?;
        url.query_pairs_mut().append_pair("filename", filename);
        Ok(url)
    }

    fn send_url(&self, room_id: &str, event_type: &str, txn_id: &str) -> Result<Url> {
        let path = format!(
            "{ROOMS_PATH}/{}/send/{}/{}",
            urlencoding::encode(room_id),
            urlencoding::encode(event_type),
            urlencoding::encode(txn_id),
        );
        Ok(self.homeserver.join(&path)?)
    }
}

/// Turn a non-success reply into [`Error::Api`], reading the Matrix error body
/// when there is one.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    let reply = serde_json::from_str::<ErrorReply>(&text).ok();
    let errcode = reply
        .as_ref()
        .and_then(|r| r.errcode.clone())
        .unwrap_or_else(|| "M_UNKNOWN".to_string());
    let message = reply
        .and_then(|r| r.error)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("").to_string());
    Err(Error::Api {
        status: status.as_u16(),
        errcode,
        message,
    })
}

#[async_trait]
impl RoomTransport for MatrixTransport {
    async fn upload(&self, upload: MediaUpload) -> Result<UploadResponse> {
        let url = self.upload_url(&upload.filename)?;
        debug!(
            filename = %upload.filename,
            content_type = %upload.content_type,
            declared_size = upload.size,
            body_len = upload.content.len(),
            "matrix media upload"
        );

        let response = self
            .client
            .post(url)
            .bearer_auth(self.access_token.expose_secret())
            .header(CONTENT_TYPE, &upload.content_type)
            .body(upload.content)
            .send()
            .await?;
        let text = check_status(response).await?.text().await?;

        let reply: UploadReply = serde_json::from_str(&text)
            .map_err(|e| Error::unexpected_response("upload", e.to_string()))?;
        match reply.content_uri {
            Some(Value::String(content_uri)) => Ok(UploadResponse { content_uri }),
            _ => Err(Error::unexpected_response(
                "upload",
                format!("missing content_uri in {text}"),
            )),
        }
    }

    async fn send_message(
        &self,
        room_id: &str,
        event_type: &str,
        content: Value,
    ) -> Result<EventId> {
        let txn_id = uuid::Uuid::new_v4().to_string();
        let url = self.send_url(room_id, event_type, &txn_id)?;
        debug!(room_id, event_type, txn_id = %txn_id, "matrix room send");

        let response = self
            .client
            .put(url)
            .bearer_auth(self.access_token.expose_secret())
            .json(&content)
            .send()
            .await?;
        let text = check_status(response).await?.text().await?;

        let reply: SendReply = serde_json::from_str(&text)
            .map_err(|e| Error::unexpected_response("send", e.to_string()))?;
        match reply.event_id {
            Some(Value::String(event_id)) => Ok(event_id),
            _ => Err(Error::unexpected_response(
                "send",
                format!("missing event_id in {text}"),
            )),
        }
    }
}
