use pipeline_ui_api_client::ApiClient;
use pipeline_ui_core::{StartPipelineRequest, StartPipelineResponse};
use tracing::{info, warn};

/// Commands that require async I/O (network calls).
#[derive(Debug, Clone, PartialEq)]
pub enum AsyncCommand {
    StartPipeline(StartPipelineRequest),
    /// Approve or reject a session parked at the approval gate.
    Resume {
        pipeline_id: String,
        approved: bool,
    },
    DeleteSession {
        pipeline_id: String,
    },
}

/// Results returned by async commands. Errors are already user-facing strings.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandResult {
    Started(Result<StartPipelineResponse, String>),
    Resumed {
        pipeline_id: String,
        approved: bool,
        result: Result<String, String>,
    },
    Deleted {
        pipeline_id: String,
        result: Result<(), String>,
    },
}

pub async fn execute(cmd: AsyncCommand, client: &ApiClient) -> CommandResult {
    match cmd {
        AsyncCommand::StartPipeline(request) => {
            let result = client.start_pipeline(&request).await;
            match &result {
                Ok(resp) => info!(pipeline_id = %resp.pipeline_id, "pipeline started"),
                Err(e) => warn!("failed to start pipeline: {e}"),
            }
            CommandResult::Started(result.map_err(|e| e.to_string()))
        }
        AsyncCommand::Resume {
            pipeline_id,
            approved,
        } => {
            let result = client
                .resume_session(&pipeline_id, approved, None)
                .await
                .map(|resp| resp.message)
                .map_err(|e| {
                    warn!(%pipeline_id, "failed to resume session: {e}");
                    e.to_string()
                });
            CommandResult::Resumed {
                pipeline_id,
                approved,
                result,
            }
        }
        AsyncCommand::DeleteSession { pipeline_id } => {
            let result = client
                .delete_session(&pipeline_id)
                .await
                .map(|_| ())
                .map_err(|e| {
                    warn!(%pipeline_id, "failed to delete session: {e}");
                    e.to_string()
                });
            CommandResult::Deleted {
                pipeline_id,
                result,
            }
        }
    }
}
