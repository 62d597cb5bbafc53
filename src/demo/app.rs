//! Demo application state.
//!
//! Four scopes mirror the screen layout:
//!
//! ```text
//! app (window, always focused)
//! └── workspace (boundary)
//!     ├── list (boundary)
//!     └── editor (element ref, can be closed and reopened)
//! ```
//!
//! Handlers never touch the app directly. They queue a [`Fired`] record
//! that [`App::drain`] applies once the dispatcher has returned.

use crossterm::event::KeyEvent;
use keyscope::config::KeyMapSet;
use keyscope::error::Result;
use keyscope_core::{
    ElementRef, Handlers, HostElement, HotKeyEntry, Scope, ScopeConfig, SequenceHandler,
};
use keyscope_term::{KeyCombo, KeyDispatcher, RegionId};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

const MAX_LOG_LINES: usize = 200;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Quit,
    NextPane,
    PrevPane,
    ToggleEditor,
    ToggleHelp,
    Cancel,
    Refresh,
    Up,
    Down,
    Top,
    Bottom,
    Open,
    Save,
    CloseEditor,
}

const APP_ACTIONS: &[(&str, Command)] = &[
    ("quit", Command::Quit),
    ("next_pane", Command::NextPane),
    ("prev_pane", Command::PrevPane),
    ("toggle_editor", Command::ToggleEditor),
    ("help", Command::ToggleHelp),
    ("cancel", Command::Cancel),
];

const WORKSPACE_ACTIONS: &[(&str, Command)] = &[("refresh", Command::Refresh), ("cancel", Command::Cancel)];

const LIST_ACTIONS: &[(&str, Command)] = &[
    ("up", Command::Up),
    ("down", Command::Down),
    ("top", Command::Top),
    ("bottom", Command::Bottom),
    ("open", Command::Open),
];

// `refresh` is not in the editor's own map; it resolves through the
// workspace map it inherits.
const EDITOR_ACTIONS: &[(&str, Command)] = &[
    ("save", Command::Save),
    ("close", Command::CloseEditor),
    ("refresh", Command::Refresh),
];

/// One handler invocation, as queued by the scope that ran it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fired {
    pub scope: String,
    pub action: String,
    pub sequence: String,
    pub command: Command,
}

type CommandQueue = Rc<RefCell<VecDeque<Fired>>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pane {
    List,
    Editor,
}

/// What the scope panel shows for each scope.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScopeStatus {
    pub name: String,
    pub focused: bool,
    pub last_handled: Option<String>,
}

pub struct App {
    dispatcher: Rc<KeyDispatcher>,
    key_maps: KeyMapSet,
    queue: CommandQueue,
    app_scope: Scope<KeyDispatcher>,
    workspace: Scope<KeyDispatcher>,
    list: Scope<KeyDispatcher>,
    editor: Option<Scope<KeyDispatcher>>,
    workspace_region: RegionId,
    list_region: RegionId,
    editor_region: Option<RegionId>,
    pub items: Vec<String>,
    pub selected: usize,
    pub opened: Option<usize>,
    pub saves: usize,
    pub log: VecDeque<String>,
    pub status: String,
    pub show_help: bool,
    pub quit: bool,
}

fn config(name: &str) -> ScopeConfig<KeyDispatcher> {
    ScopeConfig::new().name(name)
}

fn emitter(queue: &CommandQueue, scope: &str, action: &str, command: Command) -> SequenceHandler<KeyEvent> {
    let queue = queue.clone();
    let scope = scope.to_string();
    let action = action.to_string();
    Rc::new(move |_: Option<&KeyEvent>, sequence: &str| {
        queue.borrow_mut().push_back(Fired {
            scope: scope.clone(),
            action: action.clone(),
            sequence: sequence.to_string(),
            command,
        });
    })
}

fn handlers(queue: &CommandQueue, scope: &str, actions: &[(&str, Command)]) -> Handlers<KeyEvent> {
    let mut handlers = Handlers::new();
    for (action, command) in actions {
        handlers.insert(*action, emitter(queue, scope, action, *command));
    }
    handlers
}

fn describe(entry: &HotKeyEntry) -> String {
    match entry {
        HotKeyEntry::One(hotkey) => hotkey.to_string(),
        HotKeyEntry::Many(hotkeys) => hotkeys.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "),
    }
}

impl App {
    pub fn new(key_maps: KeyMapSet) -> Result<Self> {
        let dispatcher = Rc::new(KeyDispatcher::new());
        let queue = CommandQueue::default();
        let workspace_region = dispatcher.add_region(RegionId::WINDOW)?;
        let list_region = dispatcher.add_region(workspace_region)?;

        let app_scope = Scope::mount(
            dispatcher.clone(),
            None,
            config("app")
                .key_map(key_maps.scope("app"))
                .handlers(handlers(&queue, "app", APP_ACTIONS))
                .focused(true)
                .attach(RegionId::WINDOW),
        )?;
        let workspace = Scope::mount(
            dispatcher.clone(),
            Some(&app_scope.context()),
            config("workspace")
                .key_map(key_maps.scope("workspace"))
                .handlers(handlers(&queue, "workspace", WORKSPACE_ACTIONS))
                .host(HostElement::Named("workspace".to_string()))
                .bind_to_boundary(),
        )?;
        dispatcher.place_boundary(workspace_region, workspace.boundary())?;
        let list = Scope::mount(
            dispatcher.clone(),
            Some(&workspace.context()),
            config("list")
                .key_map(key_maps.scope("list"))
                .handlers(handlers(&queue, "list", LIST_ACTIONS))
                .bind_to_boundary(),
        )?;
        dispatcher.place_boundary(list_region, list.boundary())?;

        let mut app = Self {
            dispatcher,
            key_maps,
            queue,
            app_scope,
            workspace,
            list,
            editor: None,
            workspace_region,
            list_region,
            editor_region: None,
            items: (1..=12).map(|i| format!("note-{:02}.txt", i)).collect(),
            selected: 0,
            opened: None,
            saves: 0,
            log: VecDeque::new(),
            status: "Tab switches panes, ? shows bindings, C-q quits".to_string(),
            show_help: false,
            quit: false,
        };
        app.open_editor()?;
        app.focus_pane(Pane::List);
        Ok(app)
    }

    /// Feed one key event through the scope tree and apply what fired.
    pub fn handle_key(&mut self, key: &KeyEvent) -> Result<()> {
        let fired = self.dispatcher.dispatch(key);
        if fired == 0 {
            tracing::trace!(key = %KeyCombo::from(key), "no binding matched");
        }
        self.drain()
    }

    /// Apply queued handler invocations in the order they ran.
    pub fn drain(&mut self) -> Result<()> {
        loop {
            let next = self.queue.borrow_mut().pop_front();
            let Some(fired) = next else {
                break;
            };
            tracing::info!(scope = %fired.scope, action = %fired.action, sequence = %fired.sequence, "action fired");
            self.push_log(format!("{:<10} {:<14} {}", fired.scope, fired.action, fired.sequence));
            self.apply(&fired)?;
        }
        Ok(())
    }

    fn apply(&mut self, fired: &Fired) -> Result<()> {
        match fired.command {
            Command::Quit => self.quit = true,
            Command::NextPane => self.cycle_pane(true),
            Command::PrevPane => self.cycle_pane(false),
            Command::ToggleEditor => {
                if self.editor.is_some() {
                    self.close_editor();
                } else {
                    self.open_editor()?;
                    self.focus_pane(Pane::Editor);
                }
            }
            Command::ToggleHelp => self.show_help = !self.show_help,
            Command::Cancel => {
                self.show_help = false;
                self.status = format!("cancelled by {}", fired.scope);
            }
            Command::Refresh => self.status = format!("refreshed by {}", fired.scope),
            Command::Up => self.selected = self.selected.saturating_sub(1),
            Command::Down => self.selected = (self.selected + 1).min(self.items.len().saturating_sub(1)),
            Command::Top => self.selected = 0,
            Command::Bottom => self.selected = self.items.len().saturating_sub(1),
            Command::Open => {
                self.opened = Some(self.selected);
                if self.editor.is_none() {
                    self.open_editor()?;
                }
                self.focus_pane(Pane::Editor);
            }
            Command::Save => {
                self.saves += 1;
                self.status = match self.opened.and_then(|i| self.items.get(i)) {
                    Some(item) => format!("saved {}", item),
                    None => "nothing to save".to_string(),
                };
            }
            Command::CloseEditor => self.close_editor(),
        }
        Ok(())
    }

    fn open_editor(&mut self) -> Result<()> {
        let region = self.dispatcher.add_region(self.workspace_region)?;
        let element = ElementRef::new();
        element.set(region);
        let editor = Scope::mount(
            self.dispatcher.clone(),
            Some(&self.workspace.context()),
            config("editor")
                .key_map(self.key_maps.scope("editor"))
                .handlers(handlers(&self.queue, "editor", EDITOR_ACTIONS))
                .host(HostElement::Named("editor".to_string()))
                .attach_ref(element),
        )?;
        self.dispatcher.place_boundary(region, editor.boundary())?;
        self.editor = Some(editor);
        self.editor_region = Some(region);
        tracing::debug!(%region, "editor opened");
        Ok(())
    }

    fn close_editor(&mut self) {
        if let Some(region) = self.editor_region.take() {
            self.dispatcher.remove_region(region);
        }
        if let Some(editor) = self.editor.take() {
            editor.unmount();
        }
        self.focus_pane(Pane::List);
        tracing::debug!("editor closed");
    }

    pub fn focus_pane(&self, pane: Pane) {
        let region = match pane {
            Pane::List => Some(self.list_region),
            Pane::Editor => self.editor_region,
        };
        if let Some(region) = region {
            self.dispatcher.set_focus(region);
        }
    }

    fn cycle_pane(&self, forward: bool) {
        let next = match (self.focused_pane(), self.editor_open()) {
            (Some(Pane::List), true) => Pane::Editor,
            (Some(Pane::Editor), _) => Pane::List,
            _ if forward || !self.editor_open() => Pane::List,
            _ => Pane::Editor,
        };
        self.focus_pane(next);
    }

    pub fn focused_pane(&self) -> Option<Pane> {
        let focused = self.dispatcher.focused();
        if focused == self.list_region {
            Some(Pane::List)
        } else if Some(focused) == self.editor_region {
            Some(Pane::Editor)
        } else {
            None
        }
    }

    pub fn editor_open(&self) -> bool {
        self.editor.is_some()
    }

    /// Merged bindings of the innermost focused scope, for the help popup.
    pub fn focused_bindings(&self) -> Vec<(String, String)> {
        let scope = match self.focused_pane() {
            Some(Pane::Editor) => self.editor.as_ref().unwrap_or(&self.list),
            Some(Pane::List) => &self.list,
            None => &self.workspace,
        };
        scope
            .merged_map()
            .iter()
            .map(|(action, entry)| (action.clone(), describe(entry)))
            .collect()
    }

    pub fn scope_statuses(&self) -> Vec<ScopeStatus> {
        let mut scopes = vec![&self.app_scope, &self.workspace, &self.list];
        if let Some(editor) = self.editor.as_ref() {
            scopes.push(editor);
        }
        scopes
            .into_iter()
            .map(|scope| ScopeStatus {
                name: scope.name().to_string(),
                focused: scope.is_focused(),
                last_handled: scope.last_handled(),
            })
            .collect()
    }

    fn push_log(&mut self, line: String) {
        if self.log.len() == MAX_LOG_LINES {
            self.log.pop_front();
        }
        self.log.push_back(line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers};

    fn press(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
        app.handle_key(&KeyEvent::new(code, modifiers)).expect("handle key");
    }

    fn app() -> App {
        App::new(KeyMapSet::default()).expect("app")
    }

    fn last_log(app: &App) -> &str {
        app.log.back().map(String::as_str).unwrap_or_default()
    }

    #[test]
    fn starts_with_list_focused_and_editor_open() {
        let app = app();
        assert_eq!(app.focused_pane(), Some(Pane::List));
        assert!(app.editor_open());
        let statuses = app.scope_statuses();
        let focused: Vec<bool> = statuses.iter().map(|s| s.focused).collect();
        assert_eq!(focused, vec![true, true, true, false]);
    }

    #[test]
    fn list_keys_move_the_selection() {
        let mut app = app();
        press(&mut app, KeyCode::Char('j'), KeyModifiers::NONE);
        press(&mut app, KeyCode::Down, KeyModifiers::NONE);
        assert_eq!(app.selected, 2);
        press(&mut app, KeyCode::Char('g'), KeyModifiers::NONE);
        press(&mut app, KeyCode::Char('g'), KeyModifiers::NONE);
        assert_eq!(app.selected, 0);
        press(&mut app, KeyCode::Char('G'), KeyModifiers::SHIFT);
        assert_eq!(app.selected, app.items.len() - 1);
    }

    #[test]
    fn escape_is_handled_by_the_innermost_scope_only() {
        let mut app = app();
        press(&mut app, KeyCode::Esc, KeyModifiers::NONE);
        assert_eq!(app.log.len(), 1);
        assert!(last_log(&app).starts_with("workspace"));
        assert_eq!(app.status, "cancelled by workspace");
    }

    #[test]
    fn editor_handles_inherited_refresh() {
        let mut app = app();
        press(&mut app, KeyCode::Tab, KeyModifiers::NONE);
        assert_eq!(app.focused_pane(), Some(Pane::Editor));
        press(&mut app, KeyCode::Char('r'), KeyModifiers::CONTROL);
        assert_eq!(app.status, "refreshed by editor");
    }

    #[test]
    fn closing_the_editor_clears_delegation_state() {
        let mut app = app();
        press(&mut app, KeyCode::Enter, KeyModifiers::NONE);
        assert_eq!(app.focused_pane(), Some(Pane::Editor));

        press(&mut app, KeyCode::Esc, KeyModifiers::NONE);
        assert!(last_log(&app).starts_with("editor"));
        assert!(!app.editor_open());
        assert_eq!(app.focused_pane(), Some(Pane::List));
        assert!(app.scope_statuses().iter().all(|s| s.last_handled.is_none()));

        press(&mut app, KeyCode::Char('e'), KeyModifiers::CONTROL);
        assert!(app.editor_open());
        assert_eq!(app.focused_pane(), Some(Pane::Editor));
    }

    #[test]
    fn save_reports_the_opened_item() {
        let mut app = app();
        press(&mut app, KeyCode::Char('j'), KeyModifiers::NONE);
        press(&mut app, KeyCode::Enter, KeyModifiers::NONE);
        press(&mut app, KeyCode::Char('s'), KeyModifiers::CONTROL);
        assert_eq!(app.saves, 1);
        assert_eq!(app.status, "saved note-02.txt");
    }

    #[test]
    fn shift_tab_cycles_back_as_terminals_report_it() {
        let mut app = app();
        press(&mut app, KeyCode::Tab, KeyModifiers::NONE);
        assert_eq!(app.focused_pane(), Some(Pane::Editor));
        press(&mut app, KeyCode::BackTab, KeyModifiers::SHIFT);
        assert_eq!(app.focused_pane(), Some(Pane::List));
    }

    #[test]
    fn quit_from_any_pane() {
        let mut app = app();
        press(&mut app, KeyCode::Tab, KeyModifiers::NONE);
        press(&mut app, KeyCode::Char('q'), KeyModifiers::CONTROL);
        assert!(app.quit);
    }

    #[test]
    fn help_lists_merged_bindings() {
        let app = app();
        let bindings = app.focused_bindings();
        assert!(bindings.iter().any(|(action, _)| action == "quit"));
        assert!(bindings.iter().any(|(action, keys)| action == "up" && keys == "k, Up"));
    }
}
