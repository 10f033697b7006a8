//! termdock - a dockable interactive terminal panel
//!
//! termdock docks a command panel at the bottom of the terminal. Typed
//! commands go to an interpreter; its output and progress stream back into
//! the panel without clobbering a command that is still being typed.
//!
//! # Features
//!
//! - **Resizable Panel**: default, maximized, closed or any dragged height
//! - **Shortcuts**: work regardless of focus
//! - **Mouse Support**: drag the topbar, click controls, select text
//! - **Color Schemes**: 5 built-in themes
//!
//! # Keybindings (Cmd on macOS)
//!
//! | Key | Action |
//! |-----|--------|
//! | Ctrl+L | Clear the panel |
//! | Ctrl+` | Focus the panel, or close it when focused |
//! | Ctrl+J | Toggle close |
//! | Ctrl+M | Toggle maximize |
//! | Ctrl+C / Ctrl+V | Copy selection / paste |
//! | Ctrl+Q | Quit |

mod config;
mod controller;
mod core;
mod interpreter;
mod ui;

use std::env;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::config::Config;
use crate::controller::{SessionController, SessionOptions};
use crate::core::term::{Emulator, TermEmulator};
use crate::interpreter::BuiltinInterpreter;
use crate::ui::{
    primary_modifier, ClipboardBridge, Control, Frame, HitTarget, PanelGeometry, PanelRenderer,
    TerminalGuard,
};

type Controller = SessionController<TermEmulator, BuiltinInterpreter>;

/// Version string from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Event loop poll interval
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Lines moved per wheel notch
const WHEEL_LINES: usize = 3;

/// Command line options
#[derive(Debug, Default, PartialEq)]
struct CliOptions {
    config_path: Option<PathBuf>,
    prompt: Option<String>,
    no_keybinds: bool,
    print_config: bool,
}

fn print_version() {
    eprintln!("termdock {}", VERSION);
}

fn print_help() {
    eprintln!("termdock {} - A dockable interactive terminal panel", VERSION);
    eprintln!();
    eprintln!("Usage: termdock [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -c, --config <PATH>   Read configuration from PATH");
    eprintln!("  -p, --prompt <STR>    Prompt marker (default: \"$ \")");
    eprintln!("  --no-keybinds         Disable panel shortcuts");
    eprintln!("  --print-config        Print the effective configuration and exit");
    eprintln!("  -v, --version         Show version");
    eprintln!("  -h, --help            Show this help");
    eprintln!();
    eprintln!("Keybindings (Cmd instead of Ctrl on macOS):");
    eprintln!("  Ctrl+L                Clear the panel");
    eprintln!("  Ctrl+`                Focus the panel, or close it when focused");
    eprintln!("  Ctrl+J                Toggle close");
    eprintln!("  Ctrl+M                Toggle maximize");
    eprintln!("  Ctrl+C / Ctrl+V       Copy selection / paste");
    eprintln!("  Shift+PgUp/PgDn       Scroll the panel");
    eprintln!("  Ctrl+Q                Quit");
    eprintln!();
    eprintln!("Mouse: drag the panel's top bar to resize, click its controls,");
    eprintln!("       drag in the panel to select text, wheel to scroll.");
    eprintln!();
    eprintln!("Configuration: ~/.termdock/config.toml");
    eprintln!("Log file:      ~/.termdock/termdock.log (level from TERMDOCK_LOG)");
    eprintln!();
    eprintln!("Color schemes: {}", config::ColorScheme::list().join(", "));
}

fn parse_args(args: &[String]) -> Result<CliOptions, String> {
    let mut options = CliOptions::default();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-v" | "--version" => {
                print_version();
                std::process::exit(0);
            }
            "-c" | "--config" => {
                i += 1;
                let path = args.get(i).ok_or("Missing config path")?;
                options.config_path = Some(PathBuf::from(path));
            }
            "-p" | "--prompt" => {
                i += 1;
                let prompt = args.get(i).ok_or("Missing prompt argument")?;
                options.prompt = Some(prompt.clone());
            }
            "--no-keybinds" => {
                options.no_keybinds = true;
            }
            "--print-config" => {
                options.print_config = true;
            }
            arg => {
                return Err(format!("Unknown argument: {}. Use -h for help.", arg));
            }
        }
        i += 1;
    }

    Ok(options)
}

/// Log to ~/.termdock/termdock.log; stdout belongs to the panel
fn init_logging() {
    let log_path = Config::config_dir()
        .map(|dir| dir.join("termdock.log"))
        .unwrap_or_else(|| PathBuf::from("termdock.log"));

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .ok();

    if let Some(file) = log_file {
        let filter =
            EnvFilter::try_from_env("TERMDOCK_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }
}

/// Config file plus command line overrides
fn load_config(cli: &CliOptions) -> anyhow::Result<Config> {
    let mut config = match &cli.config_path {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => Config::load(),
    };
    apply_overrides(&mut config, cli);
    Ok(config)
}

fn apply_overrides(config: &mut Config, cli: &CliOptions) {
    if let Some(prompt) = cli.prompt.as_ref().filter(|p| !p.is_empty()) {
        config.prompt = prompt.clone();
    }
    if cli.no_keybinds {
        config.keybinds.enabled = false;
    }
}

fn banner_text(keybinds: bool) -> String {
    let modifier = if cfg!(target_os = "macos") { "Cmd" } else { "Ctrl" };
    if keybinds {
        format!(
            "termdock {}  |  {m}+` focus  {m}+M maximize  {m}+J close  {m}+L clear  Ctrl+Q quit",
            VERSION,
            m = modifier
        )
    } else {
        format!("termdock {}  |  Ctrl+Q quit", VERSION)
    }
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    let cli = match parse_args(&args) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Use --help for usage information");
            std::process::exit(1);
        }
    };

    init_logging();
    info!("termdock {} starting...", VERSION);

    let config = load_config(&cli)?;
    if cli.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    run(config)
}

/// Run the panel until Ctrl+Q
fn run(config: Config) -> anyhow::Result<()> {
    let options = SessionOptions::from_config(&config)?;
    let (tx, rx) = interpreter::channel();
    let interpreter = BuiltinInterpreter::new(tx, config.prompt.clone());
    let mut controller: Controller =
        SessionController::new(interpreter, rx, ClipboardBridge::system(), options);
    let mut renderer = PanelRenderer::new(
        config.get_color_scheme(),
        banner_text(config.keybinds.enabled),
    );
    let cell_height = config.panel.cell_height as i32;

    let _guard = TerminalGuard::acquire().context("initializing terminal")?;
    let (cols, _) = PanelRenderer::size()?;
    controller.mount(
        TermEmulator::new(config.panel.cell_height, config.emulator.scrollback),
        cols,
        Instant::now(),
    );

    let mut drag: Option<MouseDrag> = None;

    loop {
        controller.tick(Instant::now());
        if controller.take_dirty() {
            renderer.render(&Frame {
                layout: controller.layout(),
                progress: controller.progress(),
                emulator: controller.emulator(),
            })?;
        }

        if !event::poll(POLL_INTERVAL)? {
            continue;
        }

        match event::read()? {
            Event::Key(key) => {
                if key.kind == KeyEventKind::Release {
                    continue;
                }
                if is_quit(&key) {
                    info!("Quit requested");
                    break;
                }
                if !scroll_key(&mut controller, &key) {
                    controller.handle_key_event(&key);
                }
            }
            Event::Paste(text) => controller.handle_paste(&text),
            Event::Resize(cols, rows) => {
                info!("Resize: {}x{}", cols, rows);
                controller.handle_host_resize(cols);
            }
            Event::Mouse(mouse) => {
                handle_mouse(&mut controller, renderer.geometry(), &mut drag, mouse, cell_height)
            }
            _ => {}
        }
    }

    controller.unmount();
    info!("termdock exiting");
    Ok(())
}

fn is_quit(key: &KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key.code, KeyCode::Char('q') | KeyCode::Char('Q'))
}

/// Shift+PageUp/PageDown page the panel view
fn scroll_key(controller: &mut Controller, key: &KeyEvent) -> bool {
    if !key.modifiers.contains(KeyModifiers::SHIFT) {
        return false;
    }
    let Some(emulator) = controller.emulator_mut() else {
        return false;
    };
    let page = emulator.rows().max(1) as usize;
    match key.code {
        KeyCode::PageUp => emulator.state.scroll_view_up(page),
        KeyCode::PageDown => emulator.state.scroll_view_down(page),
        _ => return false,
    }
    true
}

/// Mouse gesture in progress
#[derive(Clone, Copy, Debug)]
enum MouseDrag {
    /// Dragging the topbar; row of the last applied position
    Resize { last_row: u16 },
    Select,
}

fn handle_mouse(
    controller: &mut Controller,
    geo: PanelGeometry,
    drag: &mut Option<MouseDrag>,
    mouse: MouseEvent,
    cell_height: i32,
) {
    let (col, row) = (mouse.column, mouse.row);
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => match geo.hit_test(col, row) {
            Some(HitTarget::Control(control)) => {
                *drag = None;
                match control {
                    Control::Clear => controller.clear(),
                    Control::Maximize => controller.toggle_maximize(),
                    Control::Close => controller.toggle_close(),
                }
            }
            Some(HitTarget::Topbar) => {
                *drag = Some(MouseDrag::Resize { last_row: row });
            }
            Some(HitTarget::Body { col, row }) => {
                if let Some(emulator) = controller.emulator_mut() {
                    emulator.focus();
                    emulator.state.start_selection(col, row);
                }
                *drag = Some(MouseDrag::Select);
            }
            None => *drag = None,
        },
        MouseEventKind::Drag(MouseButton::Left) => match *drag {
            Some(MouseDrag::Resize { last_row }) => {
                // Dragging up grows the panel
                let delta_rows = last_row as i32 - row as i32;
                if delta_rows != 0 {
                    controller.drag_resize(delta_rows * cell_height);
                    *drag = Some(MouseDrag::Resize { last_row: row });
                }
            }
            Some(MouseDrag::Select) => {
                let body_row = row
                    .saturating_sub(geo.body_top())
                    .min(geo.body_rows.saturating_sub(1));
                let body_col = col.min(geo.width.saturating_sub(1));
                if let Some(emulator) = controller.emulator_mut() {
                    emulator.state.update_selection(body_col, body_row);
                }
            }
            None => {}
        },
        MouseEventKind::Up(MouseButton::Left) => {
            if let Some(MouseDrag::Select) = drag.take() {
                if let Some(emulator) = controller.emulator_mut() {
                    emulator.state.end_selection();
                    let single_point = emulator
                        .state
                        .selection
                        .as_ref()
                        .is_some_and(|sel| sel.start == sel.end);
                    if single_point {
                        emulator.state.clear_selection();
                    }
                }
                // Copy on select while holding the primary modifier
                if mouse.modifiers.contains(primary_modifier()) {
                    controller.copy_selection();
                }
            }
        }
        MouseEventKind::Down(MouseButton::Right) => {
            if let Some(emulator) = controller.emulator_mut() {
                emulator.state.clear_selection();
            }
        }
        MouseEventKind::ScrollUp => {
            if let Some(emulator) = controller.emulator_mut() {
                emulator.state.scroll_view_up(WHEEL_LINES);
            }
        }
        MouseEventKind::ScrollDown => {
            if let Some(emulator) = controller.emulator_mut() {
                emulator.state.scroll_view_down(WHEEL_LINES);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::clipboard::tests::MemoryClipboard;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("termdock")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_parse_args() {
        let cli = parse_args(&args(&["-p", "> ", "--no-keybinds", "--config", "a.toml"])).unwrap();
        assert_eq!(cli.prompt.as_deref(), Some("> "));
        assert!(cli.no_keybinds);
        assert_eq!(cli.config_path, Some(PathBuf::from("a.toml")));
        assert!(!cli.print_config);

        assert_eq!(parse_args(&args(&[])).unwrap(), CliOptions::default());
    }

    #[test]
    fn test_parse_args_errors() {
        assert!(parse_args(&args(&["--bogus"])).is_err());
        assert!(parse_args(&args(&["--prompt"])).is_err());
    }

    #[test]
    fn test_cli_overrides_config() {
        let mut config = Config::default();
        let cli = CliOptions {
            prompt: Some("% ".to_string()),
            no_keybinds: true,
            ..Default::default()
        };
        apply_overrides(&mut config, &cli);
        assert_eq!(config.prompt, "% ");
        assert!(!config.keybinds.enabled);

        // An empty prompt is ignored
        let cli = CliOptions {
            prompt: Some(String::new()),
            ..Default::default()
        };
        apply_overrides(&mut config, &cli);
        assert_eq!(config.prompt, "% ");
    }

    #[test]
    fn test_load_config_from_explicit_path() {
        let path = env::temp_dir().join(format!("termdock-test-{}.toml", std::process::id()));
        std::fs::write(&path, "prompt = \"> \"\n[panel]\nmax_height = 640\n").unwrap();
        let cli = CliOptions {
            config_path: Some(path.clone()),
            ..Default::default()
        };
        let config = load_config(&cli).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(config.prompt, "> ");
        assert_eq!(config.panel.max_height, 640);

        let missing = CliOptions {
            config_path: Some(env::temp_dir().join("termdock-missing.toml")),
            ..Default::default()
        };
        assert!(load_config(&missing).is_err());
    }

    struct MouseHarness {
        controller: Controller,
        clipboard: MemoryClipboard,
        geo: PanelGeometry,
        drag: Option<MouseDrag>,
    }

    impl MouseHarness {
        fn new() -> Self {
            let (tx, rx) = interpreter::channel();
            let clipboard = MemoryClipboard::default();
            let config = Config {
                greeting: None,
                ..Config::default()
            };
            let options = SessionOptions::from_config(&config).unwrap();
            let mut controller: Controller = SessionController::new(
                BuiltinInterpreter::new(tx, "$ "),
                rx,
                ClipboardBridge::new(Box::new(clipboard.clone())),
                options,
            );
            controller.mount(TermEmulator::new(16, 1000), 80, Instant::now());
            // 10 body rows: topbar on row 13, body from row 14
            let geo = PanelGeometry::compute(80, 24, 10);
            Self {
                controller,
                clipboard,
                geo,
                drag: None,
            }
        }

        fn send(&mut self, kind: MouseEventKind, column: u16, row: u16, modifiers: KeyModifiers) {
            let mouse = MouseEvent {
                kind,
                column,
                row,
                modifiers,
            };
            handle_mouse(&mut self.controller, self.geo, &mut self.drag, mouse, 16);
        }

        fn select(&mut self, from: u16, to: u16, modifiers: KeyModifiers) {
            self.send(MouseEventKind::Down(MouseButton::Left), from, 14, KeyModifiers::NONE);
            self.send(MouseEventKind::Drag(MouseButton::Left), to, 14, KeyModifiers::NONE);
            self.send(MouseEventKind::Up(MouseButton::Left), to, 14, modifiers);
        }
    }

    #[test]
    fn test_topbar_drag_resizes_by_cell_height() {
        let mut h = MouseHarness::new();
        h.send(MouseEventKind::Down(MouseButton::Left), 0, 13, KeyModifiers::NONE);
        h.send(MouseEventKind::Drag(MouseButton::Left), 0, 12, KeyModifiers::NONE);
        assert_eq!(h.controller.layout().height(), 216);

        // Same row again is not a second step
        h.send(MouseEventKind::Drag(MouseButton::Left), 0, 12, KeyModifiers::NONE);
        assert_eq!(h.controller.layout().height(), 216);

        h.send(MouseEventKind::Drag(MouseButton::Left), 0, 14, KeyModifiers::NONE);
        assert_eq!(h.controller.layout().height(), 184);

        h.send(MouseEventKind::Up(MouseButton::Left), 0, 14, KeyModifiers::NONE);
        assert!(h.drag.is_none());
    }

    #[test]
    fn test_select_copies_with_primary_modifier() {
        let mut h = MouseHarness::new();
        h.controller.handle_paste("ls -la");

        h.select(2, 3, KeyModifiers::NONE);
        assert_eq!(*h.clipboard.text.borrow(), None);

        h.select(2, 3, primary_modifier());
        assert_eq!(h.clipboard.text.borrow().as_deref(), Some("ls"));
    }

    #[test]
    fn test_single_click_clears_selection() {
        let mut h = MouseHarness::new();
        h.controller.handle_paste("ls -la");
        h.select(2, 2, primary_modifier());

        let emulator = h.controller.emulator().unwrap();
        assert!(emulator.state.selection.is_none());
        assert!(emulator.has_focus());
        assert_eq!(*h.clipboard.text.borrow(), None);
    }

    #[test]
    fn test_control_clicks() {
        let mut h = MouseHarness::new();
        let spans = h.geo.control_spans();
        let start_of = |control| {
            spans
                .iter()
                .find(|(c, _, _)| *c == control)
                .map(|(_, start, _)| *start)
                .unwrap()
        };

        h.send(MouseEventKind::Down(MouseButton::Left), start_of(Control::Maximize), 13, KeyModifiers::NONE);
        assert!(h.controller.layout().is_maximized());
        assert!(h.drag.is_none());

        h.send(MouseEventKind::Down(MouseButton::Left), start_of(Control::Close), 13, KeyModifiers::NONE);
        assert!(h.controller.layout().is_closed());

        h.send(MouseEventKind::Down(MouseButton::Left), start_of(Control::Close), 13, KeyModifiers::NONE);
        assert_eq!(h.controller.layout().height(), 200);
    }

    #[test]
    fn test_banner_mentions_quit() {
        assert!(banner_text(true).contains("+M maximize"));
        assert!(banner_text(false).ends_with("Ctrl+Q quit"));
    }
}
