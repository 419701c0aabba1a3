use std::collections::BTreeSet;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use pipeline_ui_api_client::{LiveState, SessionDetailState, SessionListState};
use pipeline_ui_core::category::{CategoryFilter, StatusFilter, filter_events};
use pipeline_ui_core::detail::has_details;
use pipeline_ui_core::links::extract_links;
use pipeline_ui_core::selection::{EventSelection, SelectMode, selected_events_json};
use pipeline_ui_core::start_form::{AGENTS, ExecutionMode, StartForm};
use pipeline_ui_core::{
    ModelType, PipelineEvent, PipelineStatus, PipelineUiConfig, Session, VerbosityLevel,
    WorkflowType, should_hide_event,
};
use ratatui::widgets::ListState;

use crate::async_ops::{AsyncCommand, CommandResult};

/// Ticks a flash message stays on screen (the loop ticks every 100ms).
const FLASH_TICKS: u64 = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    History,
    Live,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Sessions,
    Events,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Overlay {
    Help,
    ConfirmDelete { pipeline_id: String },
    StartPipeline,
}

/// Fields of the start-pipeline form, in tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartField {
    Task,
    Workflow,
    Mode,
    AutoCreatePr,
    AutoReview,
    Budget,
    Verbosity,
    Advanced,
    Agent(usize),
    Submit,
}

impl StartField {
    /// Agent rows only appear while the advanced section is open.
    pub fn visible(form: &StartForm) -> Vec<StartField> {
        let mut fields = vec![
            Self::Task,
            Self::Workflow,
            Self::Mode,
            Self::AutoCreatePr,
            Self::AutoReview,
            Self::Budget,
            Self::Verbosity,
            Self::Advanced,
        ];
        if form.show_advanced {
            fields.extend((0..AGENTS.len()).map(Self::Agent));
        }
        fields.push(Self::Submit);
        fields
    }
}

/// Side effects the event loop performs on behalf of the app.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    SetPage(u32),
    SetStatus(Option<PipelineStatus>),
    RefreshList,
    SelectSession(Option<String>),
    RefreshDetail,
    Watch(Option<String>),
    LiveConnect,
    LiveDisconnect,
    LiveClear,
    Api(AsyncCommand),
    Copy { text: String, what: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashLevel {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub message: String,
    pub level: FlashLevel,
    expires_at: u64,
}

pub struct App {
    pub config: PipelineUiConfig,
    pub view: View,
    pub focus: Focus,
    pub overlay: Option<Overlay>,

    // ── Published state from the background tasks ─────────────────────
    pub list: SessionListState,
    pub detail: SessionDetailState,
    pub live: LiveState,

    // ── History view ──────────────────────────────────────────────────
    pub status_filter: StatusFilter,
    pub category_filter: CategoryFilter,
    pub sidebar_collapsed: bool,
    pub session_list: ListState,
    pub event_list: ListState,
    /// Expanded rows, as indices into the filtered events.
    pub expanded: BTreeSet<usize>,
    pub selection: EventSelection,
    pub busy: bool,

    // ── Live view ─────────────────────────────────────────────────────
    pub live_list: ListState,
    pub live_follow: bool,

    // ── Start modal ───────────────────────────────────────────────────
    pub start_form: StartForm,
    pub start_field: usize,
    pub start_error: Option<String>,
    pub submitting: bool,

    pub flash: Option<Flash>,
    pub tick: u64,
    pub should_quit: bool,
    effects: Vec<Effect>,
}

impl App {
    pub fn new(config: PipelineUiConfig) -> Self {
        Self {
            config,
            view: View::History,
            focus: Focus::Sessions,
            overlay: None,
            list: SessionListState::default(),
            detail: SessionDetailState::default(),
            live: LiveState::default(),
            status_filter: StatusFilter::All,
            category_filter: CategoryFilter::All,
            sidebar_collapsed: false,
            session_list: ListState::default(),
            event_list: ListState::default(),
            expanded: BTreeSet::new(),
            selection: EventSelection::new(),
            busy: false,
            live_list: ListState::default(),
            live_follow: true,
            start_form: StartForm::new(),
            start_field: 0,
            start_error: None,
            submitting: false,
            flash: None,
            tick: 0,
            should_quit: false,
            effects: Vec::new(),
        }
    }

    pub fn drain_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    pub fn on_tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
        if self.flash.as_ref().is_some_and(|f| f.expires_at <= self.tick) {
            self.flash = None;
        }
    }

    pub fn set_flash(&mut self, message: impl Into<String>, level: FlashLevel) {
        self.flash = Some(Flash {
            message: message.into(),
            level,
            expires_at: self.tick + FLASH_TICKS,
        });
    }

    // ── State sync ────────────────────────────────────────────────────

    pub fn sync_list(&mut self, state: SessionListState) {
        self.list = state;
        clamp(&mut self.session_list, self.list.sessions.len());
    }

    pub fn sync_detail(&mut self, state: SessionDetailState) {
        if state.target != self.detail.target {
            self.reset_event_view();
        }
        self.detail = state;
        let len = self.visible_events().len();
        clamp(&mut self.event_list, len);
    }

    pub fn sync_live(&mut self, state: LiveState) {
        self.live = state;
        let len = self.live_events().len();
        if self.live_follow && len > 0 {
            self.live_list.select(Some(len - 1));
        } else {
            clamp(&mut self.live_list, len);
        }
    }

    fn reset_event_view(&mut self) {
        self.expanded.clear();
        self.selection.clear();
        self.event_list.select(None);
    }

    // ── Queries ───────────────────────────────────────────────────────

    pub fn highlighted_session(&self) -> Option<&Session> {
        self.session_list
            .selected()
            .and_then(|i| self.list.sessions.get(i))
    }

    /// Session shown in the right pane.
    pub fn open_session(&self) -> Option<&Session> {
        self.detail.session.as_ref().map(|d| &d.session)
    }

    pub fn visible_events(&self) -> Vec<&PipelineEvent> {
        match &self.detail.session {
            Some(detail) => filter_events(&detail.events, self.category_filter),
            None => Vec::new(),
        }
    }

    pub fn live_events(&self) -> Vec<&PipelineEvent> {
        self.live
            .events
            .iter()
            .filter(|e| !should_hide_event(e))
            .collect()
    }

    /// `a-b of total` for the current page.
    pub fn page_label(&self) -> String {
        let shown = self.list.sessions.len() as u64;
        if self.list.total == 0 || shown == 0 {
            return format!("0 of {}", self.list.total);
        }
        let start = u64::from(self.list.page) * u64::from(self.list.page_size) + 1;
        let end = (start + shown - 1).min(self.list.total);
        format!("{start}-{end} of {}", self.list.total)
    }

    // ── Keys ──────────────────────────────────────────────────────────

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        match self.overlay.clone() {
            Some(Overlay::Help) => {
                self.overlay = None;
                return;
            }
            Some(Overlay::ConfirmDelete { pipeline_id }) => {
                self.handle_confirm_delete(key, pipeline_id);
                return;
            }
            Some(Overlay::StartPipeline) => {
                self.handle_start_key(key);
                return;
            }
            None => {}
        }

        match key.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
                return;
            }
            KeyCode::Char('?') => {
                self.overlay = Some(Overlay::Help);
                return;
            }
            KeyCode::Char('n') => {
                self.open_start_modal();
                return;
            }
            _ => {}
        }

        match self.view {
            View::History => self.handle_history_key(key),
            View::Live => self.handle_live_key(key),
        }
    }

    fn handle_history_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Tab | KeyCode::BackTab => {
                self.focus = match self.focus {
                    Focus::Sessions => Focus::Events,
                    Focus::Events => Focus::Sessions,
                };
            }
            KeyCode::Char('b') => {
                self.sidebar_collapsed = !self.sidebar_collapsed;
                if self.sidebar_collapsed {
                    self.focus = Focus::Events;
                }
            }
            KeyCode::Char('f') => {
                self.status_filter = self.status_filter.cycle();
                self.session_list.select(None);
                self.effects
                    .push(Effect::SetStatus(self.status_filter.status().cloned()));
            }
            KeyCode::Char(']') => {
                if self.list.has_next_page() {
                    self.session_list.select(None);
                    self.effects.push(Effect::SetPage(self.list.page + 1));
                }
            }
            KeyCode::Char('[') => {
                if self.list.page > 0 {
                    self.session_list.select(None);
                    self.effects.push(Effect::SetPage(self.list.page - 1));
                }
            }
            KeyCode::Char('r') => {
                self.effects.push(Effect::RefreshList);
                self.effects.push(Effect::RefreshDetail);
            }
            KeyCode::Char('a') => self.resume(true),
            KeyCode::Char('x') => self.resume(false),
            KeyCode::Char('d') => self.confirm_delete(),
            KeyCode::Char('s') => self.share(),
            KeyCode::Char('w') => self.watch_open_session(),
            KeyCode::Char('L') => {
                if self.live.target.is_some() {
                    self.view = View::Live;
                }
            }
            _ => match self.focus {
                Focus::Sessions if !self.sidebar_collapsed => self.handle_sessions_key(key),
                _ => self.handle_events_key(key),
            },
        }
    }

    fn handle_sessions_key(&mut self, key: KeyEvent) {
        let len = self.list.sessions.len();
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => move_cursor(&mut self.session_list, len, 1),
            KeyCode::Char('k') | KeyCode::Up => move_cursor(&mut self.session_list, len, -1),
            KeyCode::Char('g') | KeyCode::Home => jump(&mut self.session_list, len, false),
            KeyCode::Char('G') | KeyCode::End => jump(&mut self.session_list, len, true),
            KeyCode::Enter => {
                if let Some(id) = self.highlighted_session().map(|s| s.pipeline_id.clone()) {
                    self.effects.push(Effect::SelectSession(Some(id)));
                    self.focus = Focus::Events;
                }
            }
            _ => {}
        }
    }

    fn handle_events_key(&mut self, key: KeyEvent) {
        let len = self.visible_events().len();
        let cursor = self.event_list.selected();
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => move_cursor(&mut self.event_list, len, 1),
            KeyCode::Char('k') | KeyCode::Up => move_cursor(&mut self.event_list, len, -1),
            KeyCode::Char('g') | KeyCode::Home => jump(&mut self.event_list, len, false),
            KeyCode::Char('G') | KeyCode::End => jump(&mut self.event_list, len, true),
            KeyCode::Char('c') => {
                self.category_filter = self.category_filter.cycle();
                self.reset_event_view();
            }
            KeyCode::Enter => {
                let Some(idx) = cursor else { return };
                let expandable = self.visible_events().get(idx).is_some_and(|e| has_details(e));
                if expandable && !self.expanded.remove(&idx) {
                    self.expanded.insert(idx);
                }
            }
            KeyCode::Char(' ') => {
                if let Some(idx) = cursor {
                    self.selection.select(idx, SelectMode::Toggle);
                }
            }
            KeyCode::Char('v') => {
                if let Some(idx) = cursor {
                    self.selection.select(idx, SelectMode::Range);
                }
            }
            KeyCode::Char('A') => self.selection.select_all(len),
            KeyCode::Esc => self.selection.clear(),
            KeyCode::Char('y') => self.copy_selected(),
            KeyCode::Char('l') => self.copy_event_link(cursor),
            _ => {}
        }
    }

    fn handle_live_key(&mut self, key: KeyEvent) {
        let len = self.live_events().len();
        match key.code {
            KeyCode::Esc | KeyCode::Char('h') => self.view = View::History,
            KeyCode::Char('c') => self.effects.push(Effect::LiveConnect),
            KeyCode::Char('D') => self.effects.push(Effect::LiveDisconnect),
            KeyCode::Char('x') => self.effects.push(Effect::LiveClear),
            KeyCode::Char('j') | KeyCode::Down => {
                move_cursor(&mut self.live_list, len, 1);
                self.live_follow = self.live_list.selected() == len.checked_sub(1);
            }
            KeyCode::Char('k') | KeyCode::Up => {
                move_cursor(&mut self.live_list, len, -1);
                self.live_follow = false;
            }
            KeyCode::Char('G') | KeyCode::End => {
                jump(&mut self.live_list, len, true);
                self.live_follow = true;
            }
            _ => {}
        }
    }

    // ── Session actions ───────────────────────────────────────────────

    fn resume(&mut self, approved: bool) {
        if !self.config.features.allow_approval || self.busy {
            return;
        }
        let Some(session) = self.open_session() else {
            return;
        };
        if session.status != PipelineStatus::WaitingApproval {
            self.set_flash("Session is not waiting for approval", FlashLevel::Info);
            return;
        }
        let pipeline_id = session.pipeline_id.clone();
        self.busy = true;
        self.effects.push(Effect::Api(AsyncCommand::Resume {
            pipeline_id,
            approved,
        }));
    }

    fn confirm_delete(&mut self) {
        if !self.config.features.allow_delete {
            return;
        }
        if let Some(id) = self.open_session().map(|s| s.pipeline_id.clone()) {
            self.overlay = Some(Overlay::ConfirmDelete { pipeline_id: id });
        }
    }

    fn handle_confirm_delete(&mut self, key: KeyEvent, pipeline_id: String) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Enter => {
                self.overlay = None;
                self.busy = true;
                self.effects
                    .push(Effect::Api(AsyncCommand::DeleteSession { pipeline_id }));
            }
            KeyCode::Char('n') | KeyCode::Esc => self.overlay = None,
            _ => {}
        }
    }

    fn share(&mut self) {
        if !self.config.features.allow_share_links {
            return;
        }
        if let Some(id) = self.open_session().map(|s| s.pipeline_id.clone()) {
            let text = self.config.share_url(&id);
            self.effects.push(Effect::Copy { text, what: "link" });
        }
    }

    fn watch_open_session(&mut self) {
        if !self.config.features.enable_live_view {
            return;
        }
        let Some(session) = self.open_session() else {
            return;
        };
        if session.status != PipelineStatus::Running {
            self.set_flash("Only running pipelines can be watched", FlashLevel::Info);
            return;
        }
        let id = session.pipeline_id.clone();
        self.watch(id);
    }

    fn watch(&mut self, pipeline_id: String) {
        self.view = View::Live;
        self.live_follow = true;
        self.live_list.select(None);
        self.effects.push(Effect::Watch(Some(pipeline_id)));
    }

    fn copy_selected(&mut self) {
        let events: Vec<PipelineEvent> = self.visible_events().into_iter().cloned().collect();
        if let Some(text) = selected_events_json(&self.selection, &events) {
            self.effects.push(Effect::Copy {
                text,
                what: "events",
            });
        }
    }

    fn copy_event_link(&mut self, cursor: Option<usize>) {
        let Some(event) = cursor.and_then(|i| self.visible_events().get(i).copied().cloned()) else {
            return;
        };
        let links = extract_links(&event, self.config.links.task_url.as_deref());
        if let Some(link) = links.first() {
            let text = match link.kind {
                pipeline_ui_core::links::LinkKind::VcsPr => self.config.pr_url(&link.url),
                _ => link.url.clone(),
            };
            self.effects.push(Effect::Copy { text, what: "link" });
        }
    }

    /// Clipboard outcome reported by the event loop.
    pub fn copy_finished(&mut self, what: &str, result: Result<(), String>) {
        match result {
            Ok(()) => self.set_flash(format!("Copied {what} to clipboard"), FlashLevel::Success),
            Err(e) => self.set_flash(format!("Copy failed: {e}"), FlashLevel::Error),
        }
    }

    // ── Start modal ───────────────────────────────────────────────────

    fn open_start_modal(&mut self) {
        self.overlay = Some(Overlay::StartPipeline);
        self.start_field = 0;
        self.start_error = None;
    }

    pub fn current_start_field(&self) -> StartField {
        let fields = StartField::visible(&self.start_form);
        fields[self.start_field.min(fields.len() - 1)]
    }

    fn handle_start_key(&mut self, key: KeyEvent) {
        let field_count = StartField::visible(&self.start_form).len();
        let field = self.current_start_field();
        match key.code {
            KeyCode::Esc => {
                self.overlay = None;
                return;
            }
            KeyCode::Tab | KeyCode::Down => {
                self.start_field = (self.start_field + 1) % field_count;
                return;
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.start_field = (self.start_field + field_count - 1) % field_count;
                return;
            }
            _ => {}
        }

        let form = &mut self.start_form;
        match (field, key.code) {
            (StartField::Task, KeyCode::Char(c)) => form.task_input.push(c),
            (StartField::Task, KeyCode::Backspace) => {
                form.task_input.pop();
            }
            (StartField::Budget, KeyCode::Char(c)) if c.is_ascii_digit() || c == '.' => {
                form.max_budget.push(c)
            }
            (StartField::Budget, KeyCode::Backspace) => {
                form.max_budget.pop();
            }
            (StartField::Workflow, KeyCode::Left | KeyCode::Right | KeyCode::Char(' ')) => {
                form.workflow_type = cycle(&WorkflowType::ALL, &form.workflow_type, key.code);
            }
            (StartField::Mode, KeyCode::Left | KeyCode::Right | KeyCode::Char(' ')) => {
                form.execution_mode = cycle(&ExecutionMode::ALL, &form.execution_mode, key.code);
            }
            (StartField::Verbosity, KeyCode::Left | KeyCode::Right | KeyCode::Char(' ')) => {
                form.verbosity = cycle(&VerbosityLevel::ALL, &form.verbosity, key.code);
            }
            (StartField::AutoCreatePr, KeyCode::Char(' ') | KeyCode::Left | KeyCode::Right) => {
                form.auto_create_pr = !form.auto_create_pr;
            }
            (StartField::AutoReview, KeyCode::Char(' ') | KeyCode::Left | KeyCode::Right) => {
                form.auto_review = !form.auto_review;
            }
            (StartField::Advanced, KeyCode::Char(' ') | KeyCode::Enter) => {
                form.show_advanced = !form.show_advanced;
            }
            (StartField::Agent(i), KeyCode::Char(' ') | KeyCode::Enter | KeyCode::Right) => {
                form.cycle_agent_model(&AGENTS[i]);
            }
            (StartField::Agent(i), KeyCode::Left) => {
                let current = form.agent_model(AGENTS[i].id);
                let prev = match current {
                    None => Some(ModelType::Opus),
                    Some(ModelType::Haiku) => None,
                    Some(model) => {
                        let idx = ModelType::ALL.iter().position(|m| *m == model).unwrap_or(0);
                        Some(ModelType::ALL[idx - 1])
                    }
                };
                form.set_agent_model(&AGENTS[i], prev);
            }
            (_, KeyCode::Enter) => self.submit_start(),
            _ => {}
        }
    }

    fn submit_start(&mut self) {
        if self.submitting {
            return;
        }
        match self.start_form.build_request() {
            Ok(request) => {
                self.start_error = None;
                self.submitting = true;
                self.effects
                    .push(Effect::Api(AsyncCommand::StartPipeline(request)));
            }
            Err(e) => self.start_error = Some(e.to_string()),
        }
    }

    // ── Command results ───────────────────────────────────────────────

    pub fn apply_command_result(&mut self, result: CommandResult) {
        match result {
            CommandResult::Started(Ok(resp)) => {
                self.submitting = false;
                self.overlay = None;
                self.start_form.reset_after_start();
                self.set_flash(
                    format!("Started pipeline {}", resp.pipeline_id),
                    FlashLevel::Success,
                );
                self.effects.push(Effect::RefreshList);
                if self.config.features.enable_live_view {
                    self.watch(resp.pipeline_id);
                }
            }
            CommandResult::Started(Err(e)) => {
                self.submitting = false;
                self.start_error = Some(e);
            }
            CommandResult::Resumed {
                pipeline_id,
                approved,
                result,
            } => {
                self.busy = false;
                match result {
                    Ok(_) => {
                        let verb = if approved { "Approved" } else { "Rejected" };
                        self.set_flash(format!("{verb} {pipeline_id}"), FlashLevel::Success);
                        self.effects.push(Effect::RefreshList);
                        self.effects.push(Effect::RefreshDetail);
                        if approved && self.config.features.enable_live_view {
                            self.watch(pipeline_id);
                        }
                    }
                    Err(e) => self.set_flash(e, FlashLevel::Error),
                }
            }
            CommandResult::Deleted {
                pipeline_id,
                result,
            } => {
                self.busy = false;
                match result {
                    Ok(()) => {
                        self.set_flash(format!("Deleted {pipeline_id}"), FlashLevel::Success);
                        if self.detail.target.as_deref() == Some(pipeline_id.as_str()) {
                            self.effects.push(Effect::SelectSession(None));
                            self.focus = Focus::Sessions;
                        }
                        self.effects.push(Effect::RefreshList);
                    }
                    Err(e) => self.set_flash(e, FlashLevel::Error),
                }
            }
        }
    }
}

fn clamp(state: &mut ListState, len: usize) {
    match state.selected() {
        _ if len == 0 => state.select(None),
        None => state.select(Some(0)),
        Some(i) if i >= len => state.select(Some(len - 1)),
        Some(_) => {}
    }
}

fn move_cursor(state: &mut ListState, len: usize, delta: isize) {
    if len == 0 {
        return;
    }
    let current = state.selected().unwrap_or(0);
    let next = current.saturating_add_signed(delta).min(len - 1);
    state.select(Some(next));
}

fn jump(state: &mut ListState, len: usize, to_end: bool) {
    if len > 0 {
        state.select(Some(if to_end { len - 1 } else { 0 }));
    }
}

/// Next or previous value of a fixed choice list, wrapping.
fn cycle<T: Clone + PartialEq>(all: &[T], current: &T, key: KeyCode) -> T {
    let idx = all.iter().position(|v| v == current).unwrap_or(0);
    let next = if key == KeyCode::Left {
        (idx + all.len() - 1) % all.len()
    } else {
        (idx + 1) % all.len()
    };
    all[next].clone()
}
