//! Push notification handlers.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::Serialize;

use snail_core::{CoreError, PushPayload, PushSubscription, Session, SubscriptionKeys};

use crate::cli::{GlobalOpts, NotifyArgs, NotifyCommand};
use crate::commands::util;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct PublicKey {
    key: String,
    length: usize,
}

#[derive(Debug, Serialize)]
struct RenderedNotification {
    title: String,
    body: &'static str,
    timestamp: i64,
    time: Option<DateTime<Utc>>,
}

impl RenderedNotification {
    fn new(payload: &PushPayload) -> Self {
        let timestamp = payload.timestamp_ms();
        Self {
            title: payload.name.clone(),
            body: PushPayload::BODY,
            timestamp,
            time: DateTime::from_timestamp_millis(timestamp),
        }
    }
}

fn subscription_from_flags(
    endpoint: Option<String>,
    p256dh: Option<String>,
    auth: Option<String>,
) -> Result<PushSubscription, CliError> {
    let missing = |field: &str| CliError::Validation {
        field: field.into(),
        reason: "required without --from-file".into(),
    };
    Ok(PushSubscription {
        endpoint: endpoint.ok_or_else(|| missing("endpoint"))?,
        expiration_time: None,
        keys: SubscriptionKeys {
            p256dh: p256dh.ok_or_else(|| missing("p256dh"))?,
            auth: auth.ok_or_else(|| missing("auth"))?,
        },
    })
}

pub async fn handle(session: &Session, args: NotifyArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        NotifyCommand::Key => {
            let raw = session.notification_key().await?;
            let key = PublicKey {
                key: URL_SAFE_NO_PAD.encode(&raw),
                length: raw.len(),
            };
            let out = output::render_single(
                &global.output,
                &key,
                |k| format!("{} ({} bytes)", k.key, k.length),
                |k| k.key.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        NotifyCommand::Subscribe {
            endpoint,
            p256dh,
            auth,
            from_file,
        } => {
            let subscription = match from_file {
                Some(path) => util::read_json_file::<PushSubscription>(&path)?,
                None => subscription_from_flags(endpoint, p256dh, auth)?,
            };
            session.subscribe_notifications(&subscription).await?;
            if !global.quiet {
                eprintln!("Subscribed {}", subscription.endpoint);
            }
            Ok(())
        }

        NotifyCommand::Render { payload } => {
            let payload = PushPayload::from_json(&payload).map_err(CoreError::from)?;
            let rendered = RenderedNotification::new(&payload);
            let out = output::render_single(
                &global.output,
                &rendered,
                |r| {
                    let when = r.time.map_or_else(|| r.timestamp.to_string(), |t| t.to_rfc3339());
                    format!("{}\n{}\n{when}", r.title, r.body)
                },
                |r| r.title.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
