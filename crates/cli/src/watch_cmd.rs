use anyhow::{Context, Result, bail};
use pipeline_ui_api_client::{ApiClient, ConnectionStatus, LiveHandle, LiveOptions, LiveUpdate};
use pipeline_ui_core::{PipelineEvent, PipelineStatus, PipelineUiConfig};
use tokio::sync::broadcast::error::RecvError;

use crate::output::event_line;

/// Why a watch ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEnd {
    Finished(PipelineStatus),
    Closed,
    Interrupted,
}

fn is_terminal(status: &PipelineStatus) -> bool {
    matches!(status, PipelineStatus::Completed | PipelineStatus::Failed)
}

/// Terminal status implied by a lifecycle event, if any.
fn finish_from_event(event: &PipelineEvent) -> Option<PipelineStatus> {
    match event.event_type.as_str() {
        "completed" => Some(PipelineStatus::Completed),
        "failed" => Some(PipelineStatus::Failed),
        _ => None,
    }
}

struct Printer<'a> {
    config: &'a PipelineUiConfig,
    json: bool,
}

impl Printer<'_> {
    fn event(&self, event: &PipelineEvent) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string(event).context("serialize event")?);
        } else {
            println!("{}", event_line(event, self.config));
        }
        Ok(())
    }

    fn note(&self, message: impl AsRef<str>) {
        if !self.json {
            eprintln!("{}", message.as_ref());
        }
    }
}

/// Follow a pipeline's live stream until it finishes, the connection is
/// lost for good, or Ctrl-C.
pub async fn run(
    client: ApiClient,
    pipeline_id: &str,
    config: &PipelineUiConfig,
    options: LiveOptions,
    json: bool,
) -> Result<WatchEnd> {
    let auto_reconnect = options.auto_reconnect;
    let live = LiveHandle::for_client(client, None, options);
    let mut updates = live.updates();
    live.set_target(Some(pipeline_id.to_string()));

    let printer = Printer { config, json };
    let mut seen_connection = false;

    let end = loop {
        let update = tokio::select! {
            update = updates.recv() => update,
            _ = tokio::signal::ctrl_c() => break WatchEnd::Interrupted,
        };
        let update = match update {
            Ok(update) => update,
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "watch fell behind the live stream");
                continue;
            }
            Err(RecvError::Closed) => break WatchEnd::Closed,
        };

        match update {
            LiveUpdate::Status(status) => {
                printer.note(format!("[{}] {pipeline_id}", status.as_str()));
                match status {
                    ConnectionStatus::Connected => seen_connection = true,
                    ConnectionStatus::Disconnected if !auto_reconnect => {
                        if !seen_connection {
                            bail!("could not connect to live stream for {pipeline_id}");
                        }
                        break WatchEnd::Closed;
                    }
                    _ => {}
                }
            }
            LiveUpdate::Backlog(events) => {
                for event in &events {
                    printer.event(event)?;
                }
                if let Some(status) = events.last().and_then(finish_from_event) {
                    break WatchEnd::Finished(status);
                }
            }
            LiveUpdate::Event(event) => {
                printer.event(&event)?;
                if let Some(status) = finish_from_event(&event) {
                    break WatchEnd::Finished(status);
                }
            }
            LiveUpdate::PipelineStatus(raw) => {
                let status = PipelineStatus::from(raw);
                printer.note(format!("status: {}", config.labels.status(&status)));
                if is_terminal(&status) {
                    break WatchEnd::Finished(status);
                }
            }
        }
    };

    live.disconnect();
    match &end {
        WatchEnd::Finished(status) => {
            printer.note(format!("{pipeline_id} {}", config.labels.status(status)))
        }
        WatchEnd::Closed => printer.note("live stream closed"),
        WatchEnd::Interrupted => printer.note("stopped watching"),
    }
    Ok(end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline_ui_core::testing::event;
    use serde_json::json;

    #[test]
    fn lifecycle_events_end_the_watch() {
        assert_eq!(
            finish_from_event(&event("completed", json!({}))),
            Some(PipelineStatus::Completed)
        );
        assert_eq!(
            finish_from_event(&event("failed", json!({ "error": "boom" }))),
            Some(PipelineStatus::Failed)
        );
        assert_eq!(finish_from_event(&event("waiting_approval", json!({}))), None);
    }

    #[test]
    fn only_completed_and_failed_are_terminal() {
        assert!(is_terminal(&PipelineStatus::Completed));
        assert!(is_terminal(&PipelineStatus::Failed));
        assert!(!is_terminal(&PipelineStatus::WaitingApproval));
        assert!(!is_terminal(&PipelineStatus::from("queued".to_string())));
    }
}
