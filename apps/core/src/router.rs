use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::command_parser::CommandParser;
use crate::config::Settings;
use crate::env::WorkspaceEnvList;
use crate::fuzzy::FuzzyMatcher;
use crate::handlers::{
    CommandHandler, EditorHandler, Gather, HandlerDeps, HeadingsHandler, RelatedItemsHandler,
    RenderedRow, StarredHandler, SuggestionFuture, SuggestionHandler, SymbolHandler,
    WorkspaceHandler,
};
use crate::host::{HostApp, HostError, Modifiers};
use crate::input::{InputInfo, Source};
use crate::mode::Mode;
use crate::suggestion::Suggestion;

#[derive(Debug, Error)]
pub enum RouterError {
    #[error("no handler registered for {0:?}")]
    NoHandler(Mode),
    #[error("host action failed: {0}")]
    Host(#[from] HostError),
}

/// Outcome of routing one version of the input.
pub enum Dispatch {
    /// Standard mode; the caller's own file list applies.
    NotHandled,
    Ready(Vec<Suggestion>),
    Deferred(PendingSuggestions),
}

impl Dispatch {
    pub fn is_handled(&self) -> bool {
        !matches!(self, Self::NotHandled)
    }
}

/// An in-flight gather. Superseded by the next keystroke or by closing the
/// switcher.
pub struct PendingSuggestions {
    mode: Mode,
    cancel: CancellationToken,
    future: SuggestionFuture,
}

impl PendingSuggestions {
    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// `None` when the gather was cancelled before it finished.
    pub async fn resolve(self) -> Option<Vec<Suggestion>> {
        let Self { mode, cancel, future } = self;
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(mode = mode.as_str(), "gather superseded");
                None
            }
            suggestions = future => Some(suggestions),
        }
    }
}

pub struct ModeRouter {
    deps: HandlerDeps,
    parser: CommandParser,
    handlers: BTreeMap<Mode, Box<dyn SuggestionHandler>>,
    in_flight: Option<CancellationToken>,
    session_open_mode: Option<String>,
    last_input: Option<InputInfo>,
}

impl ModeRouter {
    pub fn new(
        host: Arc<dyn HostApp>,
        settings: Arc<Settings>,
        matcher: Arc<dyn FuzzyMatcher>,
    ) -> Self {
        let parser = CommandParser::new(&settings);
        let deps = HandlerDeps {
            host,
            settings,
            matcher,
        };

        let handlers: Vec<Box<dyn SuggestionHandler>> = vec![
            Box::new(EditorHandler::new(deps.clone())),
            Box::new(SymbolHandler::new(deps.clone())),
            Box::new(WorkspaceHandler::new(deps.clone())),
            Box::new(HeadingsHandler::new(deps.clone())),
            Box::new(StarredHandler::new(deps.clone())),
            Box::new(CommandHandler::new(deps.clone())),
            Box::new(RelatedItemsHandler::new(deps.clone())),
        ];

        Self {
            deps,
            parser,
            handlers: handlers
                .into_iter()
                .map(|handler| (handler.mode(), handler))
                .collect(),
            in_flight: None,
            session_open_mode: None,
            last_input: None,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.deps.settings
    }

    /// Parses `query` into a mode and filter. Prefix triggers are tried
    /// first; a sourced trigger may then take over in a context that allows
    /// it. Sourced handlers forget their anchor unless their mode won.
    pub fn determine_run_mode(&mut self, query: &str, active: Option<&Suggestion>) -> InputInfo {
        if query.is_empty() {
            self.reset();
        }

        let env = WorkspaceEnvList::capture(self.deps.host.as_ref());
        let mut info = InputInfo::new(query, env);

        if let Some(found) = self.parser.match_prefix(query) {
            if let Some(handler) = self.handlers.get_mut(&found.mode) {
                handler.validate_command(&mut info, &found, active);
            }
        }

        if let Some(found) = self.parser.match_embedded(query, info.mode) {
            if let Some(handler) = self.handlers.get_mut(&found.mode) {
                handler.validate_command(&mut info, &found, active);
            }
        }

        for mode in Mode::SOURCED {
            if let Some(handler) = self.handlers.get_mut(&mode) {
                handler.remember(&info);
            }
        }

        debug!(mode = info.mode.as_str(), input = query, "determined run mode");
        info
    }

    /// Routes one keystroke. Any gather still pending from the previous
    /// keystroke is cancelled first.
    pub fn update_suggestions(&mut self, query: &str, active: Option<&Suggestion>) -> Dispatch {
        self.cancel_in_flight();

        let info = self.determine_run_mode(query, active);
        let mode = info.mode;
        let info = self.last_input.insert(info);
        if mode == Mode::Standard {
            return Dispatch::NotHandled;
        }
        let Some(handler) = self.handlers.get_mut(&mode) else {
            return Dispatch::NotHandled;
        };

        match handler.gather(info) {
            Gather::Ready(suggestions) => Dispatch::Ready(suggestions),
            Gather::Deferred(future) => {
                let cancel = CancellationToken::new();
                self.in_flight = Some(cancel.clone());
                Dispatch::Deferred(PendingSuggestions {
                    mode,
                    cancel,
                    future,
                })
            }
        }
    }

    pub fn render_suggestion(&self, suggestion: &Suggestion, row: &mut RenderedRow) -> bool {
        match self.handlers.get(&suggestion.owning_mode()) {
            Some(handler) => {
                handler.render(suggestion, row);
                true
            }
            None => false,
        }
    }

    pub fn choose_suggestion(
        &mut self,
        suggestion: &Suggestion,
        modifiers: Modifiers,
    ) -> Result<bool, RouterError> {
        let mode = suggestion.owning_mode();
        let handler = self
            .handlers
            .get_mut(&mode)
            .ok_or(RouterError::NoHandler(mode))?;
        handler.choose(suggestion, modifiers)?;
        Ok(true)
    }

    /// The parse behind the most recent `update_suggestions` call.
    pub fn last_input(&self) -> Option<&InputInfo> {
        self.last_input.as_ref()
    }

    /// Anchor currently held by a sourced mode.
    pub fn source_for(&self, mode: Mode) -> Option<&Source> {
        self.handlers.get(&mode)?.active_source()
    }

    /// Starts a fresh session in `mode`; the returned trigger pre-fills the
    /// input once.
    pub fn open_in_mode(&mut self, mode: Mode) -> Option<String> {
        self.reset();
        let trigger = self.deps.settings.trigger_for(mode)?.to_string();
        self.session_open_mode = Some(trigger.clone());
        Some(trigger)
    }

    /// Consumes the pending pre-fill set by `open_in_mode`.
    pub fn take_session_open_mode(&mut self) -> Option<String> {
        self.session_open_mode.take()
    }

    /// Enabled ribbon entries with the trigger each one opens with.
    pub fn ribbon_commands(&self) -> Vec<(Mode, String)> {
        self.deps
            .settings
            .enabled_ribbon_commands
            .iter()
            .filter_map(|mode| {
                let trigger = self.deps.settings.trigger_for(*mode)?;
                Some((*mode, trigger.to_string()))
            })
            .collect()
    }

    pub fn on_close(&mut self) {
        self.cancel_in_flight();
        self.reset();
    }

    pub fn reset(&mut self) {
        self.session_open_mode = None;
        self.last_input = None;
        for handler in self.handlers.values_mut() {
            handler.reset();
        }
    }

    fn cancel_in_flight(&mut self) {
        if let Some(token) = self.in_flight.take() {
            token.cancel();
        }
    }
}
