//! Main application state and logic

use std::collections::VecDeque;

use alien_core::character::{TRAIT_MAX, TRAIT_MIN};
use alien_core::{
    resolve, CompletionProvider, Credential, EngineConfig, NarrativeEngine, Session,
    SessionError, SessionSnapshot, StoryId, ThemeConfig, Trait, TraitSet,
};
use tokio::sync::{mpsc, watch};

use crate::ui::theme::ConsoleTheme;
use crate::worker::{spawn_worker, WorkerRequest, WorkerResponse};

const HISTORY_LIMIT: usize = 100;
const DEFAULT_TRAIT: u8 = 5;

/// Which screen is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    #[default]
    StorySelect,
    CharacterCreate,
    Credential,
    Playing,
}

/// Focused row on the character screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CreateField {
    #[default]
    Name,
    Slider(Trait),
}

impl CreateField {
    const ORDER: [CreateField; 4] = [
        CreateField::Name,
        CreateField::Slider(Trait::Strength),
        CreateField::Slider(Trait::Intelligence),
        CreateField::Slider(Trait::Agility),
    ];

    fn index(self) -> usize {
        Self::ORDER.iter().position(|f| *f == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ORDER[(self.index() + 1).min(Self::ORDER.len() - 1)]
    }

    pub fn prev(self) -> Self {
        Self::ORDER[self.index().saturating_sub(1)]
    }

    pub fn is_last(self) -> bool {
        self.index() == Self::ORDER.len() - 1
    }
}

/// A single-line text buffer with a character-indexed cursor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineEditor {
    buffer: String,
    cursor: usize,
}

impl LineEditor {
    pub fn with_text(text: impl Into<String>) -> Self {
        let buffer = text.into();
        let cursor = buffer.chars().count();
        Self { buffer, cursor }
    }

    pub fn text(&self) -> &str {
        &self.buffer
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Replace the contents, cursor at the end.
    pub fn set(&mut self, text: impl Into<String>) {
        *self = Self::with_text(text);
    }

    /// Take the contents, leaving the editor empty.
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.buffer)
    }

    /// Insert a character at the cursor (unicode-safe)
    pub fn type_char(&mut self, c: char) {
        let byte_pos = self.byte_index(self.cursor);
        self.buffer.insert(byte_pos, c);
        self.cursor += 1;
    }

    /// Handle backspace (unicode-safe)
    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            self.remove_at_cursor();
        }
    }

    /// Handle delete (unicode-safe)
    pub fn delete(&mut self) {
        if self.cursor < self.buffer.chars().count() {
            self.remove_at_cursor();
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.buffer.chars().count());
    }

    pub fn cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor = self.buffer.chars().count();
    }

    fn byte_index(&self, chars: usize) -> usize {
        self.buffer
            .char_indices()
            .nth(chars)
            .map(|(i, _)| i)
            .unwrap_or(self.buffer.len())
    }

    fn remove_at_cursor(&mut self) {
        if let Some((byte_pos, ch)) = self.buffer.char_indices().nth(self.cursor) {
            self.buffer
                .replace_range(byte_pos..byte_pos + ch.len_utf8(), "");
        }
    }
}

/// Main application state
pub struct App {
    pub screen: Screen,
    pub theme: ConsoleTheme,

    // Story selection
    pub story_index: usize,

    // Character creation
    pub name: LineEditor,
    pub create_field: CreateField,
    traits: [u8; 3],

    // Credential entry
    pub credential: LineEditor,

    // Play
    pub input: LineEditor,
    pub input_history: VecDeque<String>,
    pub history_index: Option<usize>,
    pub saved_input: Option<String>,
    snapshot: Option<SessionSnapshot>,
    updates: Option<watch::Receiver<SessionSnapshot>>,
    request_tx: Option<mpsc::Sender<WorkerRequest>>,
    response_rx: Option<mpsc::Receiver<WorkerResponse>>,
    /// A request has been sent and no response has come back yet.
    pending: bool,

    // Narrative display
    pub narrative_scroll: usize,
    pub scroll_locked_to_bottom: bool,

    // Status
    status_message: Option<String>,
    pub should_quit: bool,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    /// Start at story selection. The credential field is pre-filled from
    /// `GROQ_API_KEY` when it is set.
    pub fn new() -> Self {
        let credential = std::env::var("GROQ_API_KEY").unwrap_or_default();
        Self::with_credential(credential)
    }

    pub fn with_credential(credential: impl Into<String>) -> Self {
        Self {
            screen: Screen::StorySelect,
            theme: ConsoleTheme::default(),
            story_index: 0,
            name: LineEditor::default(),
            create_field: CreateField::Name,
            traits: [DEFAULT_TRAIT; 3],
            credential: LineEditor::with_text(credential),
            input: LineEditor::default(),
            input_history: VecDeque::with_capacity(HISTORY_LIMIT),
            history_index: None,
            saved_input: None,
            snapshot: None,
            updates: None,
            request_tx: None,
            response_rx: None,
            pending: false,
            narrative_scroll: 0,
            scroll_locked_to_bottom: true,
            status_message: None,
            should_quit: false,
        }
    }

    // ---- Story selection ----

    pub fn selected_story(&self) -> StoryId {
        StoryId::ALL[self.story_index.min(StoryId::ALL.len() - 1)]
    }

    pub fn selected_theme(&self) -> ThemeConfig {
        resolve(self.selected_story())
    }

    pub fn select_next_story(&mut self) {
        self.story_index = (self.story_index + 1) % StoryId::ALL.len();
    }

    pub fn select_prev_story(&mut self) {
        self.story_index = (self.story_index + StoryId::ALL.len() - 1) % StoryId::ALL.len();
    }

    /// Lock in the highlighted story and move to character creation.
    pub fn confirm_story(&mut self) {
        self.theme = ConsoleTheme::from_palette(&self.selected_theme().palette);
        self.screen = Screen::CharacterCreate;
        self.clear_status();
    }

    // ---- Character creation ----

    pub fn trait_value(&self, t: Trait) -> u8 {
        self.traits[trait_slot(t)]
    }

    pub fn adjust_trait(&mut self, t: Trait, delta: i8) {
        let slot = &mut self.traits[trait_slot(t)];
        *slot = slot.saturating_add_signed(delta).clamp(TRAIT_MIN, TRAIT_MAX);
    }

    pub fn trait_set(&self) -> TraitSet {
        let [s, i, a] = self.traits;
        TraitSet::new(s, i, a).unwrap_or_default()
    }

    /// Advance past the focused field; the last field confirms the character.
    pub fn confirm_field(&mut self) {
        if !self.create_field.is_last() {
            self.create_field = self.create_field.next();
            return;
        }
        if self.name.text().trim().is_empty() {
            self.set_status("Enter a name before continuing");
            self.create_field = CreateField::Name;
            return;
        }
        self.screen = Screen::Credential;
        self.clear_status();
    }

    // ---- Credential ----

    /// Validate the typed key. On success the caller starts the session.
    pub fn confirm_credential(&mut self) -> bool {
        match Credential::new(self.credential.text()) {
            Ok(_) => true,
            Err(e) => {
                self.set_status(e.to_string());
                false
            }
        }
    }

    /// Build the session and engine from the collected settings and start playing.
    pub fn start_session(&mut self, config: &EngineConfig) -> Result<(), SessionError> {
        let session = self.build_session(config)?;
        self.attach(NarrativeEngine::from_config(session, config));
        Ok(())
    }

    fn build_session(&self, config: &EngineConfig) -> Result<Session, SessionError> {
        let session_config =
            config.session_config(self.selected_story(), self.name.text(), self.trait_set());
        let mut session = Session::new(session_config)?;
        session.supply_credential(self.credential.text())?;
        Ok(session)
    }

    /// Hand a ready engine to the UI and switch to the play screen.
    pub fn attach<P: CompletionProvider + 'static>(&mut self, engine: NarrativeEngine<P>) {
        let updates = engine.subscribe();
        let (request_tx, response_rx) = spawn_worker(engine);

        self.snapshot = Some(updates.borrow().clone());
        self.theme = ConsoleTheme::from_palette(&updates.borrow().palette);
        self.updates = Some(updates);
        self.request_tx = Some(request_tx);
        self.response_rx = Some(response_rx);
        self.pending = false;
        self.screen = Screen::Playing;
        self.scroll_to_bottom();
        self.set_status("Type an action and press Enter. Esc cancels a turn, Ctrl+C quits.");
    }

    // ---- Play ----

    pub fn snapshot(&self) -> Option<&SessionSnapshot> {
        self.snapshot.as_ref()
    }

    /// A turn is running, as far as the UI can tell.
    pub fn is_processing(&self) -> bool {
        self.pending || self.snapshot.as_ref().is_some_and(|s| s.is_processing())
    }

    /// Send the typed action to the worker.
    ///
    /// Refused while a turn is running; the typed text stays in place.
    pub fn submit_input(&mut self) -> Option<String> {
        if self.is_processing() {
            self.set_status("The console is processing...");
            return None;
        }

        let input = self.input.text().trim().to_string();
        if input.is_empty() {
            return None;
        }
        self.input.take();
        self.history_index = None;
        self.saved_input = None;

        if input == ":q" || input == ":quit" {
            self.should_quit = true;
            return None;
        }

        self.input_history.push_front(input.clone());
        if self.input_history.len() > HISTORY_LIMIT {
            self.input_history.pop_back();
        }

        let Some(tx) = &self.request_tx else {
            self.set_status("No session is running");
            return None;
        };
        match tx.try_send(WorkerRequest::PlayerAction(input.clone())) {
            Ok(()) => {
                self.pending = true;
                self.scroll_to_bottom();
                self.clear_status();
                Some(input)
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to queue player action");
                self.set_status("The console is not responding");
                None
            }
        }
    }

    /// Ask the worker to cancel the running turn.
    pub fn cancel_turn(&mut self) -> bool {
        if !self.is_processing() {
            return false;
        }
        match &self.request_tx {
            Some(tx) => tx.try_send(WorkerRequest::Cancel).is_ok(),
            None => false,
        }
    }

    /// Pull new snapshots and worker responses. Returns true if anything changed.
    pub fn poll_updates(&mut self) -> bool {
        let mut changed = false;

        if let Some(updates) = &mut self.updates {
            if updates.has_changed().unwrap_or(false) {
                self.snapshot = Some(updates.borrow_and_update().clone());
                changed = true;
            }
        }
        if changed && self.scroll_locked_to_bottom {
            self.scroll_to_bottom();
        }

        let mut responses = Vec::new();
        if let Some(rx) = &mut self.response_rx {
            while let Ok(response) = rx.try_recv() {
                responses.push(response);
            }
        }
        for response in responses {
            self.handle_response(response);
            changed = true;
        }

        changed
    }

    fn handle_response(&mut self, response: WorkerResponse) {
        self.pending = false;
        match response {
            WorkerResponse::TurnComplete { turn, degraded } => {
                tracing::debug!(turn, degraded, "turn complete");
                if degraded {
                    self.set_status("The narrator could not be reached");
                } else {
                    self.clear_status();
                }
            }
            WorkerResponse::TurnRejected(e) => self.set_status(e.to_string()),
            WorkerResponse::Cancelled => self.set_status("Turn cancelled"),
        }
    }

    /// Navigate to previous input in history
    pub fn history_prev(&mut self) {
        if self.input_history.is_empty() {
            return;
        }

        if self.history_index.is_none() && !self.input.is_empty() {
            self.saved_input = Some(self.input.text().to_string());
        }

        let idx = match self.history_index {
            None => 0,
            Some(i) if i + 1 < self.input_history.len() => i + 1,
            Some(i) => i,
        };

        if let Some(entry) = self.input_history.get(idx) {
            self.input.set(entry.clone());
            self.history_index = Some(idx);
        }
    }

    /// Navigate to next input in history
    pub fn history_next(&mut self) {
        match self.history_index {
            None => {}
            Some(0) => {
                self.input.set(self.saved_input.take().unwrap_or_default());
                self.history_index = None;
            }
            Some(i) => {
                if let Some(entry) = self.input_history.get(i - 1) {
                    self.input.set(entry.clone());
                    self.history_index = Some(i - 1);
                }
            }
        }
    }

    /// Scroll narrative to bottom and lock to bottom
    pub fn scroll_to_bottom(&mut self) {
        // The widget caps this to the real maximum
        self.narrative_scroll = usize::MAX / 2;
        self.scroll_locked_to_bottom = true;
    }

    /// Rough line count of the log, assuming ~60 columns.
    fn estimate_max_scroll(&self) -> usize {
        const ESTIMATED_WIDTH: usize = 60;
        const ESTIMATED_VISIBLE_HEIGHT: usize = 20;

        let estimated_lines: usize = self
            .snapshot
            .iter()
            .flat_map(|s| s.messages.iter())
            .map(|m| {
                m.content
                    .lines()
                    .map(|line| (line.len() / ESTIMATED_WIDTH).max(1))
                    .sum::<usize>()
                    + 1
            })
            .sum();

        estimated_lines.saturating_sub(ESTIMATED_VISIBLE_HEIGHT)
    }

    /// Scroll narrative up (unlocks from bottom)
    pub fn scroll_up(&mut self, lines: usize) {
        let max_scroll = self.estimate_max_scroll();
        if self.narrative_scroll > max_scroll {
            self.narrative_scroll = max_scroll;
        }
        self.narrative_scroll = self.narrative_scroll.saturating_sub(lines);
        self.scroll_locked_to_bottom = false;
    }

    /// Scroll narrative down, relocking at the bottom
    pub fn scroll_down(&mut self, lines: usize) {
        let max_scroll = self.estimate_max_scroll();
        self.narrative_scroll = self.narrative_scroll.saturating_add(lines);
        if self.narrative_scroll >= max_scroll {
            self.scroll_to_bottom();
        }
    }

    // ---- Status ----

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    pub fn clear_status(&mut self) {
        self.status_message = None;
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }
}

fn trait_slot(t: Trait) -> usize {
    match t {
        Trait::Strength => 0,
        Trait::Intelligence => 1,
        Trait::Agility => 2,
    }
}
