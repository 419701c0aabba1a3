//! Background pollers for the session list and a single session's detail.
//!
//! Each poller is a tokio task owned by its handle. State is published on a
//! `watch` channel and commands arrive over an unbounded `mpsc` queue. Fetches
//! run one at a time, so a response can never land after a newer one.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use pipeline_ui_core::{
    ListSessionsParams, ListSessionsResponse, PipelineStatus, Session, SessionDetail,
    SessionSource, sort_newest_first,
};

use crate::client::ApiClient;
use crate::error::ApiError;

pub const DEFAULT_LIST_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_DETAIL_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Read side of the sessions API used by the pollers.
pub trait SessionFetcher: Send + Sync + 'static {
    fn list_sessions(
        &self,
        params: &ListSessionsParams,
    ) -> impl Future<Output = Result<ListSessionsResponse, ApiError>> + Send;

    /// Session detail including its full event log.
    fn get_session(
        &self,
        pipeline_id: &str,
    ) -> impl Future<Output = Result<SessionDetail, ApiError>> + Send;
}

impl SessionFetcher for ApiClient {
    fn list_sessions(
        &self,
        params: &ListSessionsParams,
    ) -> impl Future<Output = Result<ListSessionsResponse, ApiError>> + Send {
        ApiClient::list_sessions(self, params)
    }

    fn get_session(
        &self,
        pipeline_id: &str,
    ) -> impl Future<Output = Result<SessionDetail, ApiError>> + Send {
        ApiClient::get_session(self, pipeline_id, true)
    }
}

impl<T: SessionFetcher> SessionFetcher for Arc<T> {
    fn list_sessions(
        &self,
        params: &ListSessionsParams,
    ) -> impl Future<Output = Result<ListSessionsResponse, ApiError>> + Send {
        (**self).list_sessions(params)
    }

    fn get_session(
        &self,
        pipeline_id: &str,
    ) -> impl Future<Output = Result<SessionDetail, ApiError>> + Send {
        (**self).get_session(pipeline_id)
    }
}

// ─── Session list ────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ListPollOptions {
    /// Zero disables the timer; fetches then happen only on commands.
    pub interval: Duration,
    pub page_size: u32,
    pub source: Option<SessionSource>,
    pub status: Option<PipelineStatus>,
}

impl Default for ListPollOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_LIST_INTERVAL,
            page_size: DEFAULT_PAGE_SIZE,
            source: Some(SessionSource::Merged),
            status: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionListState {
    /// Newest first.
    pub sessions: Vec<Session>,
    pub total: u64,
    pub loading: bool,
    pub error: Option<String>,
    /// Zero-based page index.
    pub page: u32,
    pub status_filter: Option<PipelineStatus>,
    pub page_size: u32,
}

impl Default for SessionListState {
    fn default() -> Self {
        Self::initial(&ListPollOptions::default())
    }
}

impl SessionListState {
    fn initial(options: &ListPollOptions) -> Self {
        Self {
            sessions: Vec::new(),
            total: 0,
            loading: true,
            error: None,
            page: 0,
            status_filter: options.status.clone(),
            page_size: options.page_size.max(1),
        }
    }

    pub fn total_pages(&self) -> u32 {
        let size = u64::from(self.page_size.max(1));
        let pages = self.total.div_ceil(size).max(1);
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    pub fn has_next_page(&self) -> bool {
        self.page + 1 < self.total_pages()
    }

    fn params(&self, source: Option<SessionSource>) -> ListSessionsParams {
        ListSessionsParams {
            status: self.status_filter.clone(),
            source,
            limit: self.page_size,
            offset: self.page.saturating_mul(self.page_size),
        }
    }
}

#[derive(Debug)]
enum ListCommand {
    SetPage(u32),
    SetStatus(Option<PipelineStatus>),
    Refresh,
}

/// Owns the list polling task; dropping it stops polling.
pub struct SessionListHandle {
    state: watch::Receiver<SessionListState>,
    commands: mpsc::UnboundedSender<ListCommand>,
    task: JoinHandle<()>,
}

impl SessionListHandle {
    pub fn spawn<F: SessionFetcher>(fetcher: F, options: ListPollOptions) -> Self {
        let (state_tx, state) = watch::channel(SessionListState::initial(&options));
        let (commands, command_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_list(fetcher, options, state_tx, command_rx));
        Self {
            state,
            commands,
            task,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionListState> {
        self.state.clone()
    }

    pub fn snapshot(&self) -> SessionListState {
        self.state.borrow().clone()
    }

    pub fn set_page(&self, page: u32) {
        let _ = self.commands.send(ListCommand::SetPage(page));
    }

    /// Change the status filter. Pagination goes back to the first page.
    pub fn set_status(&self, status: Option<PipelineStatus>) {
        let _ = self.commands.send(ListCommand::SetStatus(status));
    }

    pub fn refresh(&self) {
        let _ = self.commands.send(ListCommand::Refresh);
    }
}

impl Drop for SessionListHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run_list<F: SessionFetcher>(
    fetcher: F,
    options: ListPollOptions,
    state: watch::Sender<SessionListState>,
    mut commands: mpsc::UnboundedReceiver<ListCommand>,
) {
    loop {
        let params = state.borrow().params(options.source);
        debug!(offset = params.offset, limit = params.limit, "fetching sessions");
        let result = fetcher.list_sessions(&params).await;
        state.send_modify(|s| {
            s.loading = false;
            match result {
                Ok(resp) => {
                    let mut sessions = resp.sessions;
                    sort_newest_first(&mut sessions);
                    s.sessions = sessions;
                    s.total = resp.total;
                    s.error = None;
                }
                Err(e) => {
                    warn!("failed to fetch sessions: {e}");
                    s.error = Some(e.to_string());
                }
            }
        });

        tokio::select! {
            cmd = commands.recv() => match cmd {
                None => break,
                Some(ListCommand::SetPage(page)) => {
                    state.send_modify(|s| {
                        s.page = page;
                        s.loading = true;
                    });
                }
                Some(ListCommand::SetStatus(status)) => {
                    state.send_modify(|s| {
                        s.status_filter = status;
                        s.page = 0;
                        s.loading = true;
                    });
                }
                Some(ListCommand::Refresh) => {}
            },
            () = tokio::time::sleep(options.interval), if !options.interval.is_zero() => {}
        }
    }
}

// ─── Session detail ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionDetailState {
    pub target: Option<String>,
    pub session: Option<SessionDetail>,
    pub loading: bool,
    pub error: Option<String>,
}

impl SessionDetailState {
    fn for_target(target: Option<String>) -> Self {
        Self {
            loading: target.is_some(),
            target,
            session: None,
            error: None,
        }
    }

    fn is_active(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|d| d.session.status.is_active())
    }
}

#[derive(Debug)]
enum DetailCommand {
    SetTarget(Option<String>),
    Refresh,
}

/// Owns the detail polling task; dropping it stops polling.
///
/// Re-polls only while the fetched session is running or waiting for approval.
pub struct SessionDetailHandle {
    state: watch::Receiver<SessionDetailState>,
    commands: mpsc::UnboundedSender<DetailCommand>,
    task: JoinHandle<()>,
}

impl SessionDetailHandle {
    pub fn spawn<F: SessionFetcher>(
        fetcher: F,
        target: Option<String>,
        interval: Duration,
    ) -> Self {
        let (state_tx, state) = watch::channel(SessionDetailState::for_target(target));
        let (commands, command_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_detail(fetcher, interval, state_tx, command_rx));
        Self {
            state,
            commands,
            task,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionDetailState> {
        self.state.clone()
    }

    pub fn snapshot(&self) -> SessionDetailState {
        self.state.borrow().clone()
    }

    pub fn target(&self) -> Option<String> {
        self.state.borrow().target.clone()
    }

    pub fn set_target(&self, target: Option<String>) {
        let _ = self.commands.send(DetailCommand::SetTarget(target));
    }

    pub fn refresh(&self) {
        let _ = self.commands.send(DetailCommand::Refresh);
    }
}

impl Drop for SessionDetailHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run_detail<F: SessionFetcher>(
    fetcher: F,
    interval: Duration,
    state: watch::Sender<SessionDetailState>,
    mut commands: mpsc::UnboundedReceiver<DetailCommand>,
) {
    loop {
        let target = state.borrow().target.clone();
        let keep_polling = match target {
            None => false,
            Some(id) => {
                let result = fetcher.get_session(&id).await;
                state.send_modify(|s| {
                    s.loading = false;
                    match result {
                        Ok(detail) => {
                            s.session = Some(detail);
                            s.error = None;
                        }
                        Err(e) => {
                            warn!(pipeline_id = %id, "failed to fetch session: {e}");
                            s.error = Some(e.to_string());
                        }
                    }
                });
                state.borrow().is_active()
            }
        };

        tokio::select! {
            cmd = commands.recv() => match cmd {
                None => break,
                Some(DetailCommand::SetTarget(target)) => {
                    state.send_replace(SessionDetailState::for_target(target));
                }
                Some(DetailCommand::Refresh) => {}
            },
            () = tokio::time::sleep(interval), if keep_polling && !interval.is_zero() => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use pipeline_ui_core::testing::{session, session_detail};

    const FETCH_LATENCY: Duration = Duration::from_millis(100);

    /// Replays scripted responses; the last one repeats forever.
    #[derive(Default)]
    struct ScriptedFetcher {
        lists: Mutex<VecDeque<Result<ListSessionsResponse, String>>>,
        details: Mutex<VecDeque<Result<SessionDetail, String>>>,
        list_calls: AtomicUsize,
        detail_calls: AtomicUsize,
        last_params: Mutex<Option<ListSessionsParams>>,
        last_id: Mutex<Option<String>>,
    }

    fn next<T: Clone>(queue: &Mutex<VecDeque<Result<T, String>>>) -> Result<T, ApiError> {
        let mut queue = queue.lock().unwrap();
        let item = if queue.len() > 1 {
            queue.pop_front().unwrap()
        } else {
            queue.front().cloned().expect("scripted response")
        };
        item.map_err(|message| ApiError::Http {
            status: 500,
            message,
        })
    }

    impl SessionFetcher for ScriptedFetcher {
        async fn list_sessions(
            &self,
            params: &ListSessionsParams,
        ) -> Result<ListSessionsResponse, ApiError> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            *self.last_params.lock().unwrap() = Some(params.clone());
            tokio::time::sleep(FETCH_LATENCY).await;
            next(&self.lists)
        }

        async fn get_session(&self, pipeline_id: &str) -> Result<SessionDetail, ApiError> {
            self.detail_calls.fetch_add(1, Ordering::SeqCst);
            *self.last_id.lock().unwrap() = Some(pipeline_id.to_string());
            tokio::time::sleep(FETCH_LATENCY).await;
            next(&self.details)
        }
    }

    fn page(sessions: Vec<Session>, total: u64) -> Result<ListSessionsResponse, String> {
        Ok(ListSessionsResponse {
            sessions,
            total,
            limit: 20,
            offset: 0,
        })
    }

    fn lists(script: Vec<Result<ListSessionsResponse, String>>) -> Arc<ScriptedFetcher> {
        Arc::new(ScriptedFetcher {
            lists: Mutex::new(script.into()),
            ..Default::default()
        })
    }

    fn details(script: Vec<Result<SessionDetail, String>>) -> Arc<ScriptedFetcher> {
        Arc::new(ScriptedFetcher {
            details: Mutex::new(script.into()),
            ..Default::default()
        })
    }

    #[tokio::test(start_paused = true)]
    async fn list_is_sorted_newest_first() {
        let fetcher = lists(vec![page(
            vec![
                session("old", PipelineStatus::Completed, "2026-01-01T00:00:00Z"),
                session("new", PipelineStatus::Running, "2026-01-03T00:00:00Z"),
                session("mid", PipelineStatus::Failed, "2026-01-02T00:00:00Z"),
            ],
            3,
        )]);
        let handle = SessionListHandle::spawn(fetcher.clone(), ListPollOptions::default());
        assert!(handle.snapshot().loading);

        let mut rx = handle.subscribe();
        let state = rx.wait_for(|s| !s.loading).await.unwrap().clone();
        let ids: Vec<_> = state.sessions.iter().map(|s| s.pipeline_id.as_str()).collect();
        assert_eq!(ids, ["new", "mid", "old"]);
        assert_eq!(state.total, 3);
        assert_eq!(state.error, None);

        let params = fetcher.last_params.lock().unwrap().clone().unwrap();
        assert_eq!(params.source, Some(SessionSource::Merged));
        assert_eq!(params.limit, 20);
        assert_eq!(params.offset, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn list_error_keeps_previous_sessions() {
        let fetcher = lists(vec![
            page(vec![session("a", PipelineStatus::Running, "2026-01-01T00:00:00Z")], 1),
            Err("Service Unavailable".into()),
        ]);
        let handle = SessionListHandle::spawn(fetcher.clone(), ListPollOptions::default());
        let mut rx = handle.subscribe();
        rx.wait_for(|s| !s.sessions.is_empty()).await.unwrap();

        let state = rx.wait_for(|s| s.error.is_some()).await.unwrap().clone();
        assert_eq!(state.error.as_deref(), Some("Service Unavailable"));
        assert_eq!(state.sessions.len(), 1);
        assert!(!state.loading);
    }

    #[tokio::test(start_paused = true)]
    async fn list_polls_on_interval() {
        let fetcher = lists(vec![page(Vec::new(), 0)]);
        let _handle = SessionListHandle::spawn(fetcher.clone(), ListPollOptions::default());

        tokio::time::sleep(Duration::from_secs(25)).await;
        assert_eq!(fetcher.list_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_interval_fetches_once() {
        let fetcher = lists(vec![page(Vec::new(), 0)]);
        let options = ListPollOptions {
            interval: Duration::ZERO,
            ..Default::default()
        };
        let handle = SessionListHandle::spawn(fetcher.clone(), options);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(fetcher.list_calls.load(Ordering::SeqCst), 1);

        handle.refresh();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(fetcher.list_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn status_filter_resets_page() {
        let fetcher = lists(vec![page(Vec::new(), 95)]);
        let handle = SessionListHandle::spawn(fetcher.clone(), ListPollOptions::default());
        let mut rx = handle.subscribe();
        rx.wait_for(|s| !s.loading).await.unwrap();

        handle.set_page(3);
        rx.wait_for(|s| s.page == 3 && !s.loading).await.unwrap();
        assert_eq!(
            fetcher.last_params.lock().unwrap().as_ref().unwrap().offset,
            60
        );

        handle.set_status(Some(PipelineStatus::Failed));
        let state = rx
            .wait_for(|s| s.status_filter.is_some() && !s.loading)
            .await
            .unwrap()
            .clone();
        assert_eq!(state.page, 0);
        assert_eq!(state.total_pages(), 5);
        let params = fetcher.last_params.lock().unwrap().clone().unwrap();
        assert_eq!(params.status, Some(PipelineStatus::Failed));
        assert_eq!(params.offset, 0);
    }

    #[test]
    fn total_pages_is_at_least_one() {
        let mut state = SessionListState::initial(&ListPollOptions::default());
        assert_eq!(state.total_pages(), 1);
        assert!(!state.has_next_page());
        state.total = 40;
        assert_eq!(state.total_pages(), 2);
        state.total = 41;
        assert_eq!(state.total_pages(), 3);
        assert!(state.has_next_page());
    }

    #[tokio::test(start_paused = true)]
    async fn detail_stops_polling_when_finished() {
        let fetcher = details(vec![
            Ok(session_detail("p-1", PipelineStatus::Running, Vec::new())),
            Ok(session_detail("p-1", PipelineStatus::WaitingApproval, Vec::new())),
            Ok(session_detail("p-1", PipelineStatus::Completed, Vec::new())),
        ]);
        let handle =
            SessionDetailHandle::spawn(fetcher.clone(), Some("p-1".into()), DEFAULT_DETAIL_INTERVAL);
        let mut rx = handle.subscribe();
        rx.wait_for(|s| {
            s.session
                .as_ref()
                .is_some_and(|d| d.session.status == PipelineStatus::Completed)
        })
        .await
        .unwrap();
        assert_eq!(fetcher.detail_calls.load(Ordering::SeqCst), 3);

        tokio::time::sleep(DEFAULT_DETAIL_INTERVAL * 4).await;
        assert_eq!(fetcher.detail_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn detail_without_target_is_idle() {
        let fetcher = details(vec![Ok(session_detail(
            "p-1",
            PipelineStatus::Running,
            Vec::new(),
        ))]);
        let handle = SessionDetailHandle::spawn(fetcher.clone(), None, DEFAULT_DETAIL_INTERVAL);
        let state = handle.snapshot();
        assert!(!state.loading);
        assert!(state.session.is_none());

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(fetcher.detail_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn switching_target_restarts_from_loading() {
        let fetcher = details(vec![Ok(session_detail(
            "p-1",
            PipelineStatus::Failed,
            Vec::new(),
        ))]);
        let handle =
            SessionDetailHandle::spawn(fetcher.clone(), Some("p-1".into()), DEFAULT_DETAIL_INTERVAL);
        let mut rx = handle.subscribe();
        rx.wait_for(|s| s.session.is_some()).await.unwrap();

        handle.set_target(Some("p-2".into()));
        let state = rx.wait_for(|s| s.target.as_deref() == Some("p-2")).await.unwrap().clone();
        assert!(state.loading);
        assert!(state.session.is_none());

        rx.wait_for(|s| !s.loading).await.unwrap();
        assert_eq!(fetcher.last_id.lock().unwrap().as_deref(), Some("p-2"));

        handle.set_target(None);
        let state = rx.wait_for(|s| s.target.is_none()).await.unwrap().clone();
        assert!(!state.loading);
        assert!(state.session.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn detail_error_is_reported() {
        let fetcher = details(vec![Err("Session not found".into())]);
        let handle =
            SessionDetailHandle::spawn(fetcher.clone(), Some("gone".into()), DEFAULT_DETAIL_INTERVAL);
        let mut rx = handle.subscribe();
        let state = rx.wait_for(|s| !s.loading).await.unwrap().clone();
        assert_eq!(state.error.as_deref(), Some("Session not found"));

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(fetcher.detail_calls.load(Ordering::SeqCst), 1);
    }
}
