use std::{sync::Arc, time::Duration};

use appendix_core::{
    config::Config,
    editor::{BulkEditor, EditPlan, StopReason},
    filter::IgnoreList,
    messaging::{port::MessagingPort, throttled::ThrottledMessenger},
    Error,
};
use appendix_telegram::{auth, TelegramMessenger};
use tracing::error;

#[tokio::main]
async fn main() -> Result<(), Error> {
    appendix_core::logging::init("appendix")?;

    let cfg = Arc::new(Config::load()?);
    println!("Ignore list: {:?}", cfg.ignore_list);

    let client = auth::connect(&cfg).await?;
    auth::ensure_authorized(&client, &cfg.session_file).await?;
    println!("Login successful");

    // Operator input; empty or zero answers fall back to the configured defaults.
    let channel = auth::prompt("Channel username (e.g. @mychannel): ")?;
    if channel.is_empty() {
        return Err(Error::Config("a channel username is required".to_string()));
    }
    let append_markup = auth::prompt("Text to append: ")?;
    if append_markup.is_empty() {
        return Err(Error::Config("the text to append is required".to_string()));
    }
    let limit: u32 = parse_or(
        &auth::prompt("How many messages to edit? ")?,
        cfg.default_edit_limit,
    );
    let delay_ms: u64 = parse_or(
        &auth::prompt("Delay between edits (ms): ")?,
        cfg.default_edit_delay.as_millis() as u64,
    );

    let messenger: Arc<dyn MessagingPort> = Arc::new(ThrottledMessenger::new(
        Arc::new(TelegramMessenger::new(client)),
        cfg.throttle,
    ));

    let editor = BulkEditor::new(
        messenger,
        IgnoreList::new(&cfg.ignore_list),
        EditPlan {
            channel,
            append_markup,
            limit,
            delay: Duration::from_millis(delay_ms),
            page_size: cfg.history_page_size,
            message_limit: cfg.message_limit,
        },
    );

    let report = editor.run().await?;
    println!(
        "Done. Edited {} messages ({} skipped, {} failed, {} pages; {}).",
        report.edited, report.skipped, report.failed, report.pages, report.stop
    );

    if let StopReason::FloodLimited { retry_after } = report.stop {
        error!("run stopped by flood limit");
        return Err(Error::Flood { retry_after });
    }
    Ok(())
}

/// Parse an operator answer; empty, invalid, out-of-range, or zero falls
/// back to `default`.
fn parse_or<T>(answer: &str, default: T) -> T
where
    T: std::str::FromStr + Default + PartialEq,
{
    match answer.trim().parse::<T>() {
        Ok(v) if v != T::default() => v,
        _ => default,
    }
}
