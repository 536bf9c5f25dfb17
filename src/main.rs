pub mod ui;

use anzan::{
    answer::{AnswerBuffer, InputMode},
    app_dirs::AppDirs,
    config::{
        ConfigStore, FileConfigStore, Settings, MAX_DIGITS, MAX_TERMS, MIN_DIGITS, MIN_TERMS,
    },
    problem::Operator,
    runtime::{AnzanEvent, CrosstermEventSource, FixedTicker, RevealSchedule, Runner},
    ConfigurationError, Phase, SessionController,
};
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin},
    path::PathBuf,
    sync::Mutex,
    time::{Duration, Instant},
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const TICK_RATE_MS: u64 = 50;

/// flash anzan: mental arithmetic on numbers flashed one at a time
///
/// Numbers are flashed one after another; keep a running total in your head,
/// then type the answer. Flags override the stored settings.
#[derive(Parser, Debug, Clone)]
#[clap(version, about)]
pub struct Cli {
    /// number of operands to flash (2-10)
    #[clap(short = 't', long)]
    terms: Option<usize>,

    /// fewest digits per operand (1-3)
    #[clap(long)]
    min_digits: Option<u32>,

    /// most digits per operand (1-3)
    #[clap(long)]
    max_digits: Option<u32>,

    /// operator applied left to right across the operands
    #[clap(short = 'o', long, value_enum)]
    operator: Option<Operator>,

    /// seconds each operand stays on screen
    #[clap(short = 'd', long)]
    delay: Option<f64>,

    /// how answers are typed
    #[clap(short = 'i', long, value_enum)]
    input_mode: Option<InputMode>,

    /// settings file to read (and write with --save)
    #[clap(long)]
    config: Option<PathBuf>,

    /// store the resulting settings as the new defaults
    #[clap(long)]
    save: bool,

    /// write diagnostics to this file (filter with ANZAN_LOG)
    #[clap(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    /// Overlay the flags that were given on top of the stored settings
    fn apply(&self, base: Settings) -> Settings {
        Settings {
            term_count: self.terms.unwrap_or(base.term_count),
            min_digits: self.min_digits.unwrap_or(base.min_digits),
            max_digits: self.max_digits.unwrap_or(base.max_digits),
            operator: self.operator.unwrap_or(base.operator),
            reveal_delay_secs: self.delay.unwrap_or(base.reveal_delay_secs),
            input_mode: self.input_mode.unwrap_or(base.input_mode),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppState {
    Play,
    Settings,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SettingsField {
    Terms,
    MinDigits,
    MaxDigits,
    Operator,
    Delay,
    InputMode,
}

impl SettingsField {
    pub const ALL: [SettingsField; 6] = [
        SettingsField::Terms,
        SettingsField::MinDigits,
        SettingsField::MaxDigits,
        SettingsField::Operator,
        SettingsField::Delay,
        SettingsField::InputMode,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SettingsField::Terms => "Terms",
            SettingsField::MinDigits => "Min digits",
            SettingsField::MaxDigits => "Max digits",
            SettingsField::Operator => "Operator",
            SettingsField::Delay => "Delay (s)",
            SettingsField::InputMode => "Input",
        }
    }

    pub fn value(self, settings: &Settings) -> String {
        match self {
            SettingsField::Terms => settings.term_count.to_string(),
            SettingsField::MinDigits => settings.min_digits.to_string(),
            SettingsField::MaxDigits => settings.max_digits.to_string(),
            SettingsField::Operator => settings.operator.to_string(),
            SettingsField::Delay => format!("{:.1}", settings.reveal_delay_secs),
            SettingsField::InputMode => settings.input_mode.to_string(),
        }
    }

    /// Nudge the field by one step. Digit bounds move independently, so the
    /// draft may hold an inverted range until it is validated.
    pub fn adjust(self, settings: &mut Settings, delta: i32) {
        let step = |value: u32, min: u32, max: u32| -> u32 {
            value.saturating_add_signed(delta).clamp(min, max)
        };

        match self {
            SettingsField::Terms => {
                settings.term_count = (settings.term_count as i64 + i64::from(delta))
                    .clamp(MIN_TERMS as i64, MAX_TERMS as i64)
                    as usize;
            }
            SettingsField::MinDigits => {
                settings.min_digits = step(settings.min_digits, MIN_DIGITS, MAX_DIGITS)
            }
            SettingsField::MaxDigits => {
                settings.max_digits = step(settings.max_digits, MIN_DIGITS, MAX_DIGITS)
            }
            SettingsField::Operator => {
                settings.operator = if delta >= 0 {
                    settings.operator.next()
                } else {
                    settings.operator.prev()
                };
            }
            SettingsField::Delay => settings.step_delay(delta),
            SettingsField::InputMode => settings.input_mode = settings.input_mode.toggle(),
        }
    }
}

#[derive(Debug)]
pub struct SettingsState {
    pub selected: usize,
    pub draft: Settings,
}

impl SettingsState {
    fn new(draft: Settings) -> Self {
        Self { selected: 0, draft }
    }

    pub fn field(&self) -> SettingsField {
        SettingsField::ALL[self.selected % SettingsField::ALL.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KeyOutcome {
    Continue,
    Quit,
}

#[derive(Debug)]
pub struct App {
    pub controller: SessionController,
    pub state: AppState,
    pub answer: AnswerBuffer,
    /// Operand currently on screen during the reveal
    pub flash: Option<u128>,
    pub schedule: RevealSchedule,
    pub message: Option<String>,
    pub settings_state: SettingsState,
    config_store: Option<FileConfigStore>,
}

impl App {
    pub fn new(
        settings: Settings,
        config_store: Option<FileConfigStore>,
    ) -> Result<Self, ConfigurationError> {
        let controller = SessionController::new(settings.clone())?;

        Ok(Self {
            controller,
            state: AppState::Play,
            answer: AnswerBuffer::new(settings.input_mode),
            flash: None,
            schedule: RevealSchedule::from_secs(settings.reveal_delay_secs),
            message: None,
            settings_state: SettingsState::new(settings),
            config_store,
        })
    }

    pub fn start(&mut self, now: Instant) {
        if let Err(err) = self.controller.start() {
            self.message = Some(err.to_string());
            return;
        }
        self.answer.clear();
        self.message = None;
        self.flash = None;
        self.schedule = RevealSchedule::from_secs(self.controller.settings().reveal_delay_secs);
        self.schedule.start(now);
    }

    pub fn abort(&mut self) {
        self.controller.abort();
        self.schedule.stop();
        self.flash = None;
        self.answer.clear();
        self.message = None;
    }

    /// True once the last operand has left the screen and typing is allowed
    pub fn is_answering(&self) -> bool {
        self.controller.phase() == Phase::AwaitingAnswer && self.flash.is_none()
    }

    /// Advance the reveal if it is due. Returns whether anything changed.
    pub fn on_tick(&mut self, now: Instant) -> bool {
        if !self.schedule.is_due(now) {
            return false;
        }

        match self.controller.phase() {
            Phase::Revealing => {
                let step = self.controller.reveal_next();
                self.flash = step.value;
                self.schedule.mark(now);
            }
            Phase::AwaitingAnswer => {
                // the final operand has had its full time on screen
                self.flash = None;
                self.schedule.stop();
                self.controller.reset_answer_timer();
            }
            Phase::Idle => self.schedule.stop(),
        }
        true
    }

    pub fn submit(&mut self) {
        match self.controller.submit_answer(self.answer.as_str()) {
            Ok(Some(_)) => {
                self.answer.clear();
                self.message = None;
            }
            Ok(None) => {}
            Err(err) => {
                self.message = Some(format!("{err}; enter a number"));
            }
        }
    }

    pub fn open_settings(&mut self) {
        self.settings_state = SettingsState::new(self.controller.settings().clone());
        self.message = None;
        self.state = AppState::Settings;
    }

    /// Apply the draft settings. Invalid drafts keep the settings screen
    /// open with the reason shown.
    pub fn close_settings(&mut self) {
        let draft = self.settings_state.draft.clone();
        if let Err(err) = self.controller.configure(draft.clone()) {
            self.message = Some(err.to_string());
            return;
        }

        if let Some(store) = &self.config_store {
            if let Err(err) = store.save(&draft) {
                error!(path = %store.path().display(), %err, "failed to save settings");
            }
        }

        self.answer.set_mode(draft.input_mode);
        self.message = None;
        self.state = AppState::Play;
    }

    pub fn on_key(&mut self, key: KeyEvent, now: Instant) -> KeyOutcome {
        if key.kind != KeyEventKind::Press {
            return KeyOutcome::Continue;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return KeyOutcome::Quit;
        }

        match self.state {
            AppState::Settings => self.on_settings_key(key),
            AppState::Play => match self.controller.phase() {
                Phase::Idle => match key.code {
                    KeyCode::Enter | KeyCode::Char(' ') => self.start(now),
                    KeyCode::Char('s') => self.open_settings(),
                    KeyCode::Esc | KeyCode::Char('q') => return KeyOutcome::Quit,
                    _ => {}
                },
                Phase::Revealing => {
                    if key.code == KeyCode::Esc {
                        self.abort();
                    }
                }
                Phase::AwaitingAnswer => self.on_answer_key(key),
            },
        }

        KeyOutcome::Continue
    }

    fn on_answer_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Esc {
            self.abort();
            return;
        }
        if !self.is_answering() {
            return;
        }

        match key.code {
            KeyCode::Enter => self.submit(),
            KeyCode::Backspace => self.answer.backspace(),
            KeyCode::Delete => self.answer.clear(),
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.answer.clear()
            }
            KeyCode::Char(c) => {
                if self.answer.push(c) {
                    self.message = None;
                }
            }
            _ => {}
        }
    }

    fn on_settings_key(&mut self, key: KeyEvent) {
        let count = SettingsField::ALL.len();
        match key.code {
            KeyCode::Up => {
                self.settings_state.selected = (self.settings_state.selected + count - 1) % count;
            }
            KeyCode::Down => {
                self.settings_state.selected = (self.settings_state.selected + 1) % count;
            }
            KeyCode::Left => {
                let field = self.settings_state.field();
                field.adjust(&mut self.settings_state.draft, -1);
            }
            KeyCode::Right => {
                let field = self.settings_state.field();
                field.adjust(&mut self.settings_state.draft, 1);
            }
            KeyCode::Enter | KeyCode::Esc | KeyCode::Char('b') => self.close_settings(),
            _ => {}
        }
    }
}

fn init_logging(log_file: Option<PathBuf>) -> Result<(), Box<dyn Error>> {
    let path = match log_file {
        Some(path) => path,
        None if std::env::var_os("ANZAN_LOG").is_some() => match AppDirs::log_path() {
            Some(path) => path,
            None => return Ok(()),
        },
        None => return Ok(()),
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    let filter = EnvFilter::try_from_env("ANZAN_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(cli.log_file.clone())?;

    let store = cli
        .config
        .as_ref()
        .map(FileConfigStore::with_path)
        .unwrap_or_default();
    let settings = cli.apply(store.load());

    if let Err(err) = settings.validate() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::ValueValidation, err).exit();
    }

    if cli.save {
        store.save(&settings)?;
        info!(path = %store.path().display(), "settings saved");
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let mut app = App::new(settings, Some(store))?;
    info!(settings = ?app.controller.settings(), "starting");

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    let stats = app.controller.statistics();
    info!(correct = stats.correct, total = stats.total, "exiting");
    res
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    terminal.draw(|f| ui(app, f))?;

    loop {
        let redraw = match runner.step() {
            AnzanEvent::Tick => app.on_tick(Instant::now()),
            AnzanEvent::Resize => true,
            AnzanEvent::Key(key) => match app.on_key(key, Instant::now()) {
                KeyOutcome::Quit => break,
                KeyOutcome::Continue => true,
            },
        };

        if redraw {
            terminal.draw(|f| ui(app, f))?;
        }
    }

    Ok(())
}

fn ui(app: &mut App, f: &mut Frame) {
    let screen = ui::screen::current_screen(&app.state);
    screen.render(app, f);
}
