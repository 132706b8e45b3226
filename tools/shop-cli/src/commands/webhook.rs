//! Webhook payload verification.

use std::fs;

use anyhow::{Context as _, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use shop_commerce::webhook::{self, WebhookAck, WebhookVerifier};

use super::{WebhookArgs, WebhookCommand};
use crate::config::ENV_WEBHOOK_SECRET;
use crate::context::Context;

/// Run the webhook command.
pub async fn run(args: WebhookArgs, ctx: &Context) -> Result<()> {
    match args.command {
        WebhookCommand::Verify {
            payload,
            signature,
            secret,
        } => verify(&payload, &signature, secret, ctx),
        WebhookCommand::Sign {
            payload,
            secret,
            timestamp,
        } => sign(&payload, secret, timestamp, ctx),
    }
}

#[derive(Serialize)]
struct VerifyReport {
    #[serde(flatten)]
    ack: WebhookAck,
    event_type: String,
    object_id: Option<String>,
    created: Option<String>,
}

fn verify(payload_path: &str, signature: &str, secret: Option<String>, ctx: &Context) -> Result<()> {
    let verifier = WebhookVerifier::new(endpoint_secret(secret, ctx)?)
        .with_tolerance(ctx.config.webhook.tolerance());
    let payload = read_payload(payload_path, ctx)?;

    let event = verifier
        .verify(&payload, signature)
        .context("Webhook rejected")?;
    let ack = webhook::handle(&event);

    let report = VerifyReport {
        event_type: event.event_type.clone(),
        object_id: event.object_id().map(str::to_string),
        created: event.created.and_then(format_created),
        ack,
    };

    if ctx.output.is_json() {
        ctx.output.json(&report);
        return Ok(());
    }

    ctx.output.success(&format!("Signature valid for event {}", report.ack.event_id));
    ctx.output.kv("type", &report.event_type);
    if let Some(object_id) = &report.object_id {
        ctx.output.kv("object", object_id);
    }
    if let Some(created) = &report.created {
        ctx.output.kv("created", created);
    }

    Ok(())
}

fn sign(
    payload_path: &str,
    secret: Option<String>,
    timestamp: Option<i64>,
    ctx: &Context,
) -> Result<()> {
    let verifier = WebhookVerifier::new(endpoint_secret(secret, ctx)?);
    let payload = read_payload(payload_path, ctx)?;
    let timestamp = timestamp.unwrap_or_else(|| Utc::now().timestamp());

    let header = verifier.signature_header(timestamp, &payload)?;
    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({ "header": header }));
    } else {
        println!("{}", header);
    }
    Ok(())
}

fn endpoint_secret(explicit: Option<String>, ctx: &Context) -> Result<String> {
    explicit
        .or_else(|| ctx.config.webhook.secret.clone())
        .filter(|s| !s.is_empty())
        .with_context(|| format!("No webhook secret. Pass --secret or set {}", ENV_WEBHOOK_SECRET))
}

/// Raw body exactly as delivered; no trimming.
fn read_payload(path: &str, ctx: &Context) -> Result<String> {
    let path = ctx.resolve_path(path);
    fs::read_to_string(&path).with_context(|| format!("Failed to read payload: {}", path.display()))
}

fn format_created(timestamp: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp(timestamp, 0).map(|t| t.to_rfc3339())
}
