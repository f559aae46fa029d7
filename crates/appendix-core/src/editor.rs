//! The pagination-and-edit loop.
//!
//! Walks channel history backward in fixed-size pages using a descending
//! message-id cursor, appending the operator's text to every editable message
//! until the edit limit is reached or history runs out.

use std::{collections::HashSet, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::{
    domain::MessageId,
    filter::{skip_reason, IgnoreList, SkipReason},
    messaging::port::MessagingPort,
    text::{merge_append, strip_markup, utf16_len},
    Fault, Result,
};

/// Default history page size; the provider caps a single history request at 100.
pub const HISTORY_PAGE_SIZE: usize = 100;

/// Parameters for a run: the operator's answers plus the configured limits.
#[derive(Clone, Debug)]
pub struct EditPlan {
    /// Channel handle, e.g. `@mychannel`.
    pub channel: String,
    /// Markup to append to each message.
    pub append_markup: String,
    /// Maximum number of messages to edit.
    pub limit: u32,
    /// Pause after each successful edit.
    pub delay: Duration,
    /// Messages fetched per history page.
    pub page_size: usize,
    /// Maximum combined text length, in UTF-16 units. The effective cap is
    /// the smaller of this and the port's own limit.
    pub message_limit: usize,
}

/// Why the run stopped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StopReason {
    LimitReached,
    EndOfHistory,
    FloodLimited { retry_after: Option<Duration> },
    CursorStalled,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::LimitReached => write!(f, "edit limit reached"),
            StopReason::EndOfHistory => write!(f, "end of history"),
            StopReason::FloodLimited { retry_after: Some(d) } => {
                write!(f, "flood limited (retry after {}s)", d.as_secs())
            }
            StopReason::FloodLimited { retry_after: None } => write!(f, "flood limited"),
            StopReason::CursorStalled => write!(f, "pagination cursor stalled"),
        }
    }
}

/// Counters for a finished run.
#[derive(Clone, Debug)]
pub struct RunReport {
    pub edited: u32,
    pub skipped: u32,
    pub failed: u32,
    pub pages: u32,
    pub stop: StopReason,
}

pub struct BulkEditor {
    port: Arc<dyn MessagingPort>,
    ignore: IgnoreList,
    plan: EditPlan,
}

impl BulkEditor {
    pub fn new(port: Arc<dyn MessagingPort>, ignore: IgnoreList, plan: EditPlan) -> Self {
        Self { port, ignore, plan }
    }

    pub async fn run(&self) -> Result<RunReport> {
        let channel = self.port.resolve_channel(&self.plan.channel).await?;
        info!(channel = %channel.title, "resolved target channel");

        // Parse the append markup once; the original text of each message is
        // already plain, entities ride alongside.
        let append = self.port.parse_markup(&self.plan.append_markup)?;
        let plain_append = strip_markup(&append.text);
        let max_len = self
            .port
            .capabilities()
            .max_message_len
            .min(self.plan.message_limit);

        // Ids classified non-editable this run; never retried.
        let mut failed: HashSet<i32> = HashSet::new();
        let mut edited = 0u32;
        let mut skipped = 0u32;
        let mut pages = 0u32;
        // 0 is the "start from latest" sentinel; afterwards strictly decreasing.
        let mut cursor = MessageId(0);

        loop {
            if edited >= self.plan.limit {
                return Ok(self.report(edited, skipped, &failed, pages, StopReason::LimitReached));
            }

            let page = self
                .port
                .fetch_history(&channel, cursor, self.plan.page_size)
                .await?;
            if page.is_empty() {
                return Ok(self.report(edited, skipped, &failed, pages, StopReason::EndOfHistory));
            }
            pages += 1;

            for msg in &page {
                if edited >= self.plan.limit {
                    break;
                }
                if failed.contains(&msg.id.0) {
                    continue;
                }

                let Some(text) = msg.text.as_deref().filter(|t| !t.is_empty()) else {
                    debug!(id = msg.id.0, "no textual content, marking failed");
                    failed.insert(msg.id.0);
                    continue;
                };

                if let Some(reason) = skip_reason(&strip_markup(text), &plain_append, &self.ignore)
                {
                    match reason {
                        SkipReason::AlreadyAppended => {
                            debug!(id = msg.id.0, "append text already present, skipping")
                        }
                        SkipReason::IgnoreFragment(f) => {
                            debug!(id = msg.id.0, fragment = %f, "ignore fragment matched, skipping")
                        }
                    }
                    skipped += 1;
                    continue;
                }

                let (new_text, new_entities) = merge_append(text, &msg.entities, &append);
                if utf16_len(&new_text) as usize > max_len {
                    warn!(id = msg.id.0, "combined text exceeds message limit, marking failed");
                    failed.insert(msg.id.0);
                    continue;
                }

                match self
                    .port
                    .edit_message(&channel, msg.id, &new_text, &new_entities)
                    .await
                {
                    Ok(()) => {
                        edited += 1;
                        info!(id = msg.id.0, edited, "edited message");
                        if !self.plan.delay.is_zero() {
                            sleep(self.plan.delay).await;
                        }
                    }
                    Err(e) => match e.fault() {
                        Fault::Fatal => {
                            let retry_after = match e {
                                crate::Error::Flood { retry_after } => retry_after,
                                _ => None,
                            };
                            error!(id = msg.id.0, "flood limit hit, stopping run");
                            return Ok(self.report(
                                edited,
                                skipped,
                                &failed,
                                pages,
                                StopReason::FloodLimited { retry_after },
                            ));
                        }
                        Fault::Skip => {
                            warn!(id = msg.id.0, error = %e, "edit failed, marking failed");
                            failed.insert(msg.id.0);
                        }
                    },
                }
            }

            // Next page starts strictly below the oldest id seen on this one.
            let min_id = page.iter().map(|m| m.id.0).min().unwrap_or(0);
            let next = MessageId(min_id - 1);
            if next.0 <= 0 {
                // Paged past the first message; 0 would wrap back to "latest".
                return Ok(self.report(edited, skipped, &failed, pages, StopReason::EndOfHistory));
            }
            if cursor.0 != 0 && next.0 >= cursor.0 {
                error!(cursor = cursor.0, next = next.0, "cursor did not decrease, aborting");
                return Ok(self.report(edited, skipped, &failed, pages, StopReason::CursorStalled));
            }
            cursor = next;
        }
    }

    fn report(
        &self,
        edited: u32,
        skipped: u32,
        failed: &HashSet<i32>,
        pages: u32,
        stop: StopReason,
    ) -> RunReport {
        RunReport {
            edited,
            skipped,
            failed: failed.len() as u32,
            pages,
            stop,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, VecDeque};

    use async_trait::async_trait;
    use tokio::sync::Mutex;

    use super::*;
    use crate::{
        domain::{ChannelId, ChannelMessage, ChannelRef, EntityKind, FormattingEntity},
        messaging::types::{MessagingCapabilities, ParsedMarkup},
        Error,
    };

    #[derive(Clone, Copy)]
    enum MockFailure {
        Flood,
        NotModified,
    }

    #[derive(Default)]
    struct MockPort {
        pages: Mutex<VecDeque<Vec<ChannelMessage>>>,
        cursors: Mutex<Vec<i32>>,
        fetch_limits: Mutex<Vec<usize>>,
        edits: Mutex<Vec<(i32, String, Vec<FormattingEntity>)>>,
        fail: HashMap<i32, MockFailure>,
        append_entities: Vec<FormattingEntity>,
    }

    impl MockPort {
        fn with_pages(pages: Vec<Vec<ChannelMessage>>) -> Self {
            Self {
                pages: Mutex::new(pages.into()),
                ..Default::default()
            }
        }

        async fn edit_calls(&self) -> Vec<(i32, String, Vec<FormattingEntity>)> {
            self.edits.lock().await.clone()
        }

        async fn cursors_seen(&self) -> Vec<i32> {
            self.cursors.lock().await.clone()
        }
    }

    #[async_trait]
    impl MessagingPort for MockPort {
        fn capabilities(&self) -> MessagingCapabilities {
            MessagingCapabilities {
                supports_edit: true,
                supports_formatting_entities: true,
                max_message_len: 4096,
            }
        }

        async fn resolve_channel(&self, handle: &str) -> crate::Result<ChannelRef> {
            Ok(ChannelRef {
                id: ChannelId(1),
                title: handle.to_string(),
            })
        }

        async fn fetch_history(
            &self,
            _channel: &ChannelRef,
            offset_id: MessageId,
            limit: usize,
        ) -> crate::Result<Vec<ChannelMessage>> {
            self.cursors.lock().await.push(offset_id.0);
            self.fetch_limits.lock().await.push(limit);
            Ok(self.pages.lock().await.pop_front().unwrap_or_default())
        }

        async fn edit_message(
            &self,
            _channel: &ChannelRef,
            id: MessageId,
            text: &str,
            entities: &[FormattingEntity],
        ) -> crate::Result<()> {
            self.edits
                .lock()
                .await
                .push((id.0, text.to_string(), entities.to_vec()));
            match self.fail.get(&id.0) {
                Some(MockFailure::Flood) => Err(Error::Flood {
                    retry_after: Some(Duration::from_secs(30)),
                }),
                Some(MockFailure::NotModified) => Err(Error::NotModified),
                None => Ok(()),
            }
        }

        fn parse_markup(&self, text: &str) -> crate::Result<ParsedMarkup> {
            Ok(ParsedMarkup {
                text: text.to_string(),
                entities: self.append_entities.clone(),
            })
        }
    }

    fn msg(id: i32, text: &str) -> ChannelMessage {
        ChannelMessage {
            id: MessageId(id),
            text: if text.is_empty() {
                None
            } else {
                Some(text.to_string())
            },
            entities: Vec::new(),
        }
    }

    fn plan(append: &str, limit: u32) -> EditPlan {
        EditPlan {
            channel: "@test".to_string(),
            append_markup: append.to_string(),
            limit,
            delay: Duration::ZERO,
            page_size: HISTORY_PAGE_SIZE,
            message_limit: 4096,
        }
    }

    fn editor(port: Arc<MockPort>, ignore: IgnoreList, plan: EditPlan) -> BulkEditor {
        BulkEditor::new(port, ignore, plan)
    }

    #[tokio::test]
    async fn edits_until_limit_and_never_beyond() {
        let port = Arc::new(MockPort::with_pages(vec![vec![
            msg(10, "one"),
            msg(9, "two"),
            msg(8, "three"),
        ]]));
        let ed = editor(port.clone(), IgnoreList::default(), plan("World", 2));

        let report = ed.run().await.unwrap();
        assert_eq!(report.edited, 2);
        assert_eq!(report.stop, StopReason::LimitReached);

        let calls = port.edit_calls().await;
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].0, 10);
        assert_eq!(calls[1].0, 9);
    }

    #[tokio::test]
    async fn appends_text_and_shifts_entities() {
        let mut port = MockPort::with_pages(vec![vec![msg(5, "Hello")]]);
        port.append_entities = vec![FormattingEntity {
            offset: 0,
            length: 5,
            kind: EntityKind::Bold,
        }];
        let port = Arc::new(port);
        let ed = editor(port.clone(), IgnoreList::default(), plan("World", 1));

        let report = ed.run().await.unwrap();
        assert_eq!(report.edited, 1);

        let calls = port.edit_calls().await;
        assert_eq!(calls[0].1, "Hello\n\nWorld");
        assert_eq!(
            calls[0].2,
            vec![FormattingEntity {
                offset: 7,
                length: 5,
                kind: EntityKind::Bold,
            }]
        );
    }

    #[tokio::test]
    async fn preserves_original_entities_before_appended_ones() {
        let mut port = MockPort::with_pages(vec![vec![ChannelMessage {
            id: MessageId(3),
            text: Some("Hi".to_string()),
            entities: vec![FormattingEntity {
                offset: 0,
                length: 2,
                kind: EntityKind::Italic,
            }],
        }]]);
        port.append_entities = vec![FormattingEntity {
            offset: 0,
            length: 4,
            kind: EntityKind::Bold,
        }];
        let port = Arc::new(port);
        let ed = editor(port.clone(), IgnoreList::default(), plan("tail", 1));

        ed.run().await.unwrap();
        let calls = port.edit_calls().await;
        assert_eq!(calls[0].2[0].kind, EntityKind::Italic);
        assert_eq!(calls[0].2[0].offset, 0);
        assert_eq!(calls[0].2[1].kind, EntityKind::Bold);
        assert_eq!(calls[0].2[1].offset, 4);
    }

    #[tokio::test]
    async fn never_submits_already_appended_or_ignored_messages() {
        let port = Arc::new(MockPort::with_pages(vec![vec![
            msg(10, "already has World inside"),
            msg(9, "starts at 00:00"),
        ]]));
        let ed = editor(port.clone(), IgnoreList::new(["00:00"]), plan("World", 5));

        let report = ed.run().await.unwrap();
        assert_eq!(report.edited, 0);
        assert_eq!(report.skipped, 2);
        assert_eq!(report.stop, StopReason::EndOfHistory);
        assert!(port.edit_calls().await.is_empty());
    }

    #[tokio::test]
    async fn records_textless_messages_as_failed_without_editing() {
        let port = Arc::new(MockPort::with_pages(vec![vec![msg(7, ""), msg(6, "ok")]]));
        let ed = editor(port.clone(), IgnoreList::default(), plan("World", 5));

        let report = ed.run().await.unwrap();
        assert_eq!(report.edited, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(port.edit_calls().await.len(), 1);
    }

    #[tokio::test]
    async fn never_submits_combined_text_over_message_limit() {
        let long = "a".repeat(4090);
        let port = Arc::new(MockPort::with_pages(vec![vec![msg(4, &long)]]));
        // 4090 + 2 + 5 = 4097 > 4096
        let ed = editor(port.clone(), IgnoreList::default(), plan("World", 1));

        let report = ed.run().await.unwrap();
        assert_eq!(report.edited, 0);
        assert_eq!(report.failed, 1);
        assert!(port.edit_calls().await.is_empty());
    }

    #[tokio::test]
    async fn flood_error_stops_the_whole_run() {
        let mut port = MockPort::with_pages(vec![vec![msg(10, "one"), msg(9, "two")]]);
        port.fail.insert(10, MockFailure::Flood);
        let port = Arc::new(port);
        let ed = editor(port.clone(), IgnoreList::default(), plan("World", 5));

        let report = ed.run().await.unwrap();
        assert_eq!(report.edited, 0);
        assert_eq!(
            report.stop,
            StopReason::FloodLimited {
                retry_after: Some(Duration::from_secs(30)),
            }
        );
        // The second message was never attempted.
        assert_eq!(port.edit_calls().await.len(), 1);
    }

    #[tokio::test]
    async fn invalid_edit_is_recorded_and_loop_continues() {
        let mut port = MockPort::with_pages(vec![vec![msg(10, "one"), msg(9, "two")]]);
        port.fail.insert(10, MockFailure::NotModified);
        let port = Arc::new(port);
        let ed = editor(port.clone(), IgnoreList::default(), plan("World", 5));

        let report = ed.run().await.unwrap();
        assert_eq!(report.edited, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.stop, StopReason::EndOfHistory);
    }

    #[tokio::test]
    async fn cursor_strictly_decreases_across_pages() {
        let port = Arc::new(MockPort::with_pages(vec![
            vec![msg(10, "skip World"), msg(9, "skip World")],
            vec![msg(5, "skip World"), msg(4, "skip World")],
        ]));
        let ed = editor(port.clone(), IgnoreList::default(), plan("World", 5));

        let report = ed.run().await.unwrap();
        assert_eq!(report.stop, StopReason::EndOfHistory);
        assert_eq!(report.pages, 2);
        assert_eq!(port.cursors_seen().await, vec![0, 8, 3]);
    }

    #[tokio::test]
    async fn aborts_when_cursor_stops_decreasing() {
        let port = Arc::new(MockPort::with_pages(vec![
            vec![msg(10, "skip World")],
            vec![msg(20, "skip World")],
        ]));
        let ed = editor(port.clone(), IgnoreList::default(), plan("World", 5));

        let report = ed.run().await.unwrap();
        assert_eq!(report.stop, StopReason::CursorStalled);
    }

    #[tokio::test]
    async fn ends_instead_of_wrapping_past_the_first_message() {
        let port = Arc::new(MockPort::with_pages(vec![
            vec![msg(2, "skip World"), msg(1, "skip World")],
            // Would be served for cursor 0 again if the guard were missing.
            vec![msg(2, "skip World")],
        ]));
        let ed = editor(port.clone(), IgnoreList::default(), plan("World", 5));

        let report = ed.run().await.unwrap();
        assert_eq!(report.stop, StopReason::EndOfHistory);
        assert_eq!(port.cursors_seen().await, vec![0]);
    }

    #[tokio::test]
    async fn fetches_pages_of_the_configured_size() {
        let port = Arc::new(MockPort::with_pages(vec![vec![
            msg(10, "skip World"),
            msg(9, "skip World"),
        ]]));
        let mut plan = plan("World", 5);
        plan.page_size = 5;
        let ed = editor(port.clone(), IgnoreList::default(), plan);

        let report = ed.run().await.unwrap();
        assert_eq!(report.stop, StopReason::EndOfHistory);
        assert_eq!(port.fetch_limits.lock().await.clone(), vec![5, 5]);
    }

    #[tokio::test]
    async fn honors_a_configured_message_limit_below_the_provider_cap() {
        let port = Arc::new(MockPort::with_pages(vec![vec![msg(4, "123456789")]]));
        let mut plan = plan("World", 1);
        // 9 + 2 + 5 = 16 > 10, well under the provider's 4096.
        plan.message_limit = 10;
        let ed = editor(port.clone(), IgnoreList::default(), plan);

        let report = ed.run().await.unwrap();
        assert_eq!(report.edited, 0);
        assert_eq!(report.failed, 1);
        assert!(port.edit_calls().await.is_empty());
    }

    #[tokio::test]
    async fn zero_limit_edits_nothing() {
        let port = Arc::new(MockPort::with_pages(vec![vec![msg(10, "one")]]));
        let ed = editor(port.clone(), IgnoreList::default(), plan("World", 0));

        let report = ed.run().await.unwrap();
        assert_eq!(report.edited, 0);
        assert_eq!(report.stop, StopReason::LimitReached);
        assert!(port.cursors_seen().await.is_empty());
    }
}
