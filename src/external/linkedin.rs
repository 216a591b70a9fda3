//! LinkedIn posting adapter.
//!
//! The dispatcher only knows the [`PostingAdapter`] trait. [`LinkedInClient`]
//! implements it against the v2 UGC API: an optional image goes through
//! register-upload, fetch and push before the share is published. If any image
//! step fails the post is published as text only.

use crate::config::LinkedInConfig;
use crate::entities::linkedin_account_entity;
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;

const RESTLI_PROTOCOL_VERSION: &str = "2.0.0";
const FEED_IMAGE_RECIPE: &str = "urn:li:digitalmediaRecipe:feedshare-image";
const UPLOAD_MECHANISM_KEY: &str = "com.linkedin.digitalmedia.uploading.MediaUploadHttpRequest";

#[derive(Debug, Clone)]
pub struct LinkedInCredential {
    pub access_token: String,
    pub profile_id: String,
}

impl From<&linkedin_account_entity::Model> for LinkedInCredential {
    fn from(m: &linkedin_account_entity::Model) -> Self {
        Self {
            access_token: m.access_token.clone(),
            profile_id: m.profile_id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedPost {
    pub post_id: String,
    pub url: String,
}

#[async_trait]
pub trait PostingAdapter: Send + Sync {
    async fn post(
        &self,
        content: &str,
        image_url: Option<&str>,
        credential: &LinkedInCredential,
    ) -> AppResult<PublishedPost>;
}

#[derive(Clone)]
pub struct LinkedInClient {
    http: Client,
    base_url: String,
}

impl LinkedInClient {
    pub fn new(cfg: &LinkedInConfig) -> AppResult<Self> {
        let http = Client::builder()
            .user_agent("linkzup-backend/linkedin")
            .timeout(Duration::from_secs(cfg.request_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: cfg.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn upload_image(&self, image_url: &str, cred: &LinkedInCredential) -> AppResult<String> {
        let (upload_url, asset) = self.register_upload(cred).await?;
        let (bytes, content_type) = self.fetch_image(image_url).await?;
        self.push_bytes(&upload_url, bytes, &content_type, cred)
            .await?;
        Ok(asset)
    }

    async fn register_upload(&self, cred: &LinkedInCredential) -> AppResult<(String, String)> {
        let body = json!({
            "registerUploadRequest": {
                "recipes": [FEED_IMAGE_RECIPE],
                "owner": author_urn(&cred.profile_id),
                "serviceRelationships": [{
                    "relationshipType": "OWNER",
                    "identifier": "urn:li:userGeneratedContent"
                }]
            }
        });

        let resp = self
            .http
            .post(format!("{}/v2/assets?action=registerUpload", self.base_url))
            .bearer_auth(&cred.access_token)
            .header("X-Restli-Protocol-Version", RESTLI_PROTOCOL_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(AppError::ExternalApiError(format!(
                "LinkedIn registerUpload failed: HTTP {}: {}",
                status.as_u16(),
                text
            )));
        }

        let value: Value = resp.json().await?;
        parse_register_upload(&value)
    }

    async fn fetch_image(&self, image_url: &str) -> AppResult<(Vec<u8>, String)> {
        let resp = self.http.get(image_url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(AppError::ExternalApiError(format!(
                "Image download failed: HTTP {}",
                status.as_u16()
            )));
        }
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = resp.bytes().await?;
        if bytes.is_empty() {
            return Err(AppError::ExternalApiError("Image download was empty".into()));
        }
        Ok((bytes.to_vec(), content_type))
    }

    async fn push_bytes(
        &self,
        upload_url: &str,
        bytes: Vec<u8>,
        content_type: &str,
        cred: &LinkedInCredential,
    ) -> AppResult<()> {
        let resp = self
            .http
            .put(upload_url)
            .bearer_auth(&cred.access_token)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(AppError::ExternalApiError(format!(
                "LinkedIn image upload failed: HTTP {}",
                status.as_u16()
            )));
        }
        Ok(())
    }

    async fn publish(
        &self,
        content: &str,
        asset: Option<&str>,
        cred: &LinkedInCredential,
    ) -> AppResult<PublishedPost> {
        let body = build_share_body(&author_urn(&cred.profile_id), content, asset);

        let resp = self
            .http
            .post(format!("{}/v2/ugcPosts", self.base_url))
            .bearer_auth(&cred.access_token)
            .header("X-Restli-Protocol-Version", RESTLI_PROTOCOL_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let header_id = resp
            .headers()
            .get("x-restli-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let text = resp.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(AppError::ExternalApiError(format!(
                "LinkedIn publish failed: HTTP {}: {}",
                status.as_u16(),
                text
            )));
        }

        let body_id = serde_json::from_str::<Value>(&text)
            .ok()
            .and_then(|v| v.get("id").and_then(Value::as_str).map(str::to_string));
        let post_id = header_id.or(body_id).ok_or_else(|| {
            AppError::ExternalApiError("LinkedIn publish response had no post id".into())
        })?;

        Ok(PublishedPost {
            url: post_url(&post_id),
            post_id,
        })
    }
}

#[async_trait]
impl PostingAdapter for LinkedInClient {
    async fn post(
        &self,
        content: &str,
        image_url: Option<&str>,
        credential: &LinkedInCredential,
    ) -> AppResult<PublishedPost> {
        let asset = match image_url {
            Some(url) => match self.upload_image(url, credential).await {
                Ok(asset) => Some(asset),
                Err(e) => {
                    log::warn!("Image upload failed, publishing text only: {e}");
                    None
                }
            },
            None => None,
        };
        self.publish(content, asset.as_deref(), credential).await
    }
}

pub fn author_urn(profile_id: &str) -> String {
    if profile_id.starts_with("urn:li:") {
        profile_id.to_string()
    } else {
        format!("urn:li:person:{profile_id}")
    }
}

pub fn post_url(post_id: &str) -> String {
    format!("https://www.linkedin.com/feed/update/{post_id}/")
}

pub fn build_share_body(author: &str, content: &str, asset: Option<&str>) -> Value {
    let (category, media) = match asset {
        Some(asset) => (
            "IMAGE",
            json!([{
                "status": "READY",
                "media": asset
            }]),
        ),
        None => ("NONE", json!([])),
    };

    json!({
        "author": author,
        "lifecycleState": "PUBLISHED",
        "specificContent": {
            "com.linkedin.ugc.ShareContent": {
                "shareCommentary": { "text": content },
                "shareMediaCategory": category,
                "media": media
            }
        },
        "visibility": {
            "com.linkedin.ugc.MemberNetworkVisibility": "PUBLIC"
        }
    })
}

fn parse_register_upload(value: &Value) -> AppResult<(String, String)> {
    let inner = &value["value"];
    let missing = |field: &str| {
        AppError::ExternalApiError(format!("registerUpload response missing {field}"))
    };
    let upload_url = inner["uploadMechanism"][UPLOAD_MECHANISM_KEY]["uploadUrl"]
        .as_str()
        .ok_or_else(|| missing("uploadUrl"))?;
    let asset = inner["asset"].as_str().ok_or_else(|| missing("asset"))?;
    Ok((upload_url.to_string(), asset.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn author_urn_wraps_bare_ids() {
        assert_eq!(author_urn("abc123"), "urn:li:person:abc123");
        assert_eq!(author_urn("urn:li:person:abc123"), "urn:li:person:abc123");
    }

    #[test]
    fn text_only_share() {
        let body = build_share_body("urn:li:person:1", "Hello LinkedIn", None);
        let share = &body["specificContent"]["com.linkedin.ugc.ShareContent"];
        assert_eq!(share["shareCommentary"]["text"], "Hello LinkedIn");
        assert_eq!(share["shareMediaCategory"], "NONE");
        assert_eq!(share["media"].as_array().unwrap().len(), 0);
        assert_eq!(body["lifecycleState"], "PUBLISHED");
    }

    #[test]
    fn image_share_references_asset() {
        let body = build_share_body(
            "urn:li:person:1",
            "With image",
            Some("urn:li:digitalmediaAsset:C5"),
        );
        let share = &body["specificContent"]["com.linkedin.ugc.ShareContent"];
        assert_eq!(share["shareMediaCategory"], "IMAGE");
        assert_eq!(share["media"][0]["media"], "urn:li:digitalmediaAsset:C5");
    }

    #[test]
    fn parses_register_upload_response() {
        let raw = json!({
            "value": {
                "uploadMechanism": {
                    UPLOAD_MECHANISM_KEY: {
                        "headers": {},
                        "uploadUrl": "https://api.linkedin.com/mediaUpload/C5/feedshare"
                    }
                },
                "mediaArtifact": "urn:li:digitalmediaMediaArtifact:(urn:li:digitalmediaAsset:C5,urn:li:digitalmediaMediaArtifactClass:feedshare-uploadedImage)",
                "asset": "urn:li:digitalmediaAsset:C5"
            }
        });
        let (url, asset) = parse_register_upload(&raw).unwrap();
        assert_eq!(url, "https://api.linkedin.com/mediaUpload/C5/feedshare");
        assert_eq!(asset, "urn:li:digitalmediaAsset:C5");
        assert!(parse_register_upload(&json!({"value": {}})).is_err());
    }

    #[test]
    fn post_url_format() {
        assert_eq!(
            post_url("urn:li:share:7100"),
            "https://www.linkedin.com/feed/update/urn:li:share:7100/"
        );
    }
}
