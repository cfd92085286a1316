//! Google Sheets sender: appends one row per lead.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use url::Url;

use super::google_auth::{ServiceAccount, TokenSource};
use super::{post, Channel, Post, GOOGLE_SHEETS};
use crate::config::model::SheetsSettings;
use crate::error::DeliveryError;
use crate::server::HttpClient;
use crate::submission::format::FormattedLead;

/// `RAW` stores cells verbatim: a `+7...` phone keeps its plus and a
/// name starting with `=` is never evaluated as a formula.
const APPEND_QUERY: &str = "valueInputOption=RAW&insertDataOption=INSERT_ROWS";

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

pub struct SheetsChannel {
    client: HttpClient,
    settings: SheetsSettings,
    tokens: Option<Arc<dyn TokenSource>>,
}

impl SheetsChannel {
    /// Build the sender; credentials are only wired when the channel is configured.
    #[must_use]
    pub fn new(client: HttpClient, settings: SheetsSettings) -> Self {
        let tokens = match (&settings.service_account_email, &settings.private_key) {
            (Some(email), Some(key)) => Some(Arc::new(ServiceAccount::new(
                client.clone(),
                email.clone(),
                key.clone(),
                settings.token_uri.clone(),
            )) as Arc<dyn TokenSource>),
            _ => None,
        };
        Self {
            client,
            settings,
            tokens,
        }
    }

    #[must_use]
    pub fn with_token_source(
        client: HttpClient,
        settings: SheetsSettings,
        tokens: Arc<dyn TokenSource>,
    ) -> Self {
        Self {
            client,
            settings,
            tokens: Some(tokens),
        }
    }

    /// `{base}/v4/spreadsheets/{id}/values/{range}:append?...`, with the
    /// id and range percent-encoded as path segments.
    pub fn append_url(&self, sheet_id: &str) -> Result<Url, DeliveryError> {
        let range = format!("{}:append", self.settings.range);
        let mut url = Url::parse(&self.settings.api_base)
            .map_err(|e| DeliveryError::Transport(format!("invalid Sheets API base: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| DeliveryError::Transport("Sheets API base cannot hold a path".into()))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", sheet_id, "values", range.as_str()]);
        url.set_query(Some(APPEND_QUERY));
        Ok(url)
    }
}

#[async_trait]
impl Channel for SheetsChannel {
    fn service(&self) -> &'static str {
        GOOGLE_SHEETS
    }

    fn is_configured(&self) -> bool {
        self.tokens.is_some() && self.settings.sheet_id.is_some()
    }

    async fn deliver(&self, lead: &FormattedLead) -> Result<(), DeliveryError> {
        let (Some(tokens), Some(sheet_id)) = (&self.tokens, &self.settings.sheet_id) else {
            return Err(DeliveryError::Credentials(
                "service account and GOOGLE_SHEET_ID are required".into(),
            ));
        };

        let token = tokens.access_token().await?;
        let url = self.append_url(sheet_id)?;
        let body = serde_json::to_vec(&serde_json::json!({ "values": [lead.row] }))
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        let (status, bytes) = post(
            &self.client,
            Post {
                uri: url.as_str(),
                content_type: "application/json",
                bearer: Some(&token),
                body: Bytes::from(body),
            },
        )
        .await?;

        if status.is_success() {
            return Ok(());
        }

        let description = serde_json::from_slice::<ApiErrorBody>(&bytes).map_or_else(
            |_| String::from_utf8_lossy(&bytes).into_owned(),
            |b| match b.error.status {
                Some(s) => format!("{s}: {}", b.error.message),
                None => b.error.message,
            },
        );

        Err(DeliveryError::Rejected {
            status: status.as_u16(),
            description,
        })
    }

    fn user_message(&self, error: &DeliveryError) -> String {
        let hint = match error {
            DeliveryError::Timeout(_) => "Сервер Google Sheets не отвечает, попробуйте позже.",
            DeliveryError::Credentials(_) => {
                "Проверьте GOOGLE_SERVICE_ACCOUNT_EMAIL и GOOGLE_PRIVATE_KEY."
            }
            DeliveryError::Rejected {
                status,
                description,
            } if *status == 403 || description.contains("PERMISSION_DENIED") => {
                "Откройте доступ к таблице для сервисного аккаунта (роль «Редактор»)."
            }
            DeliveryError::Rejected { description, .. }
                if description.contains("Unable to parse range") =>
            {
                "Проверьте имя листа в GOOGLE_SHEET_RANGE."
            }
            DeliveryError::Rejected { status: 404, .. } => "Проверьте GOOGLE_SHEET_ID.",
            _ => "Ошибка записи в Google Таблицу.",
        };
        format!(
            "Не удалось сохранить заявку в Google Таблицу. {hint} Ошибка: {}",
            error.detail()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::google_auth::StaticToken;
    use crate::server::build_http_client;

    fn settings(range: &str) -> SheetsSettings {
        SheetsSettings {
            service_account_email: Some("relay@project.iam.gserviceaccount.com".into()),
            private_key: None,
            sheet_id: Some("sheet-123".into()),
            range: range.into(),
            api_base: "https://sheets.googleapis.com".into(),
            token_uri: "https://oauth2.googleapis.com/token".into(),
        }
    }

    fn channel(range: &str) -> SheetsChannel {
        SheetsChannel::with_token_source(
            build_http_client(),
            settings(range),
            Arc::new(StaticToken("token".into())),
        )
    }

    #[test]
    fn append_url_encodes_range() {
        let url = channel("Лист1!A1").append_url("sheet-123").unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/sheet-123/values/\
             %D0%9B%D0%B8%D1%81%D1%821!A1:append\
             ?valueInputOption=RAW&insertDataOption=INSERT_ROWS"
        );
    }

    #[test]
    fn unconfigured_without_key() {
        let c = SheetsChannel::new(build_http_client(), settings("Sheet1!A1"));
        assert!(!c.is_configured());
    }

    #[test]
    fn permission_denied_hint() {
        let msg = channel("Sheet1!A1").user_message(&DeliveryError::Rejected {
            status: 403,
            description: "PERMISSION_DENIED: The caller does not have permission".into(),
        });
        assert!(msg.contains("сервисного аккаунта"));
        assert!(msg.ends_with("PERMISSION_DENIED: The caller does not have permission"));
    }

    #[test]
    fn bad_range_hint() {
        let msg = channel("Nope!A1").user_message(&DeliveryError::Rejected {
            status: 400,
            description: "INVALID_ARGUMENT: Unable to parse range: Nope!A1".into(),
        });
        assert!(msg.contains("GOOGLE_SHEET_RANGE"));
    }

    #[test]
    fn credential_errors_keep_raw_detail() {
        let msg = channel("Sheet1!A1")
            .user_message(&DeliveryError::Credentials("private key rejected".into()));
        assert!(msg.contains("GOOGLE_PRIVATE_KEY"));
        assert!(msg.contains("private key rejected"));
    }
}
