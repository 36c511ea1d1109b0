pub mod config;
mod events;
pub mod storage;
mod surface;

use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

use config::Config;
use events::{EventQueue, OpenFileRequested, SaveLoadRequested};
use storage::{load_json, save_json};
use surface::TextureSurfaces;

use crate::{
    panels::{ControlsScene, GraphsScene, PanelKind},
    playback::PlaybackState,
    shell::{Command, DashboardShell, Outcome},
};

/// Share of the window width taken by graphs and controls.
const LEFT_COLUMN: f32 = 0.5;
/// Share of the left column taken by the graphs.
const GRAPHS_HEIGHT: f32 = 0.55;
const TITLE_HEIGHT: f32 = 18.0;
/// How often to poll open file dialogs.
const DIALOG_POLL: Duration = Duration::from_millis(100);

pub struct EguiApp {
    config: Config,
    shell: DashboardShell<TextureSurfaces>,
    shortcuts_modal_open: bool,
    preferences_open: bool,
    event_queue: EventQueue<Self>,
    request_redraw: Option<()>,
    last_tick: Option<Instant>,
}

/// Keyboard input, collected first and acted on outside of the input lock.
enum Shortcut {
    Help,
    Preferences,
    OpenDialog,
    QuickSave,
    QuickLoad,
    Dashboard(Command),
}

impl EguiApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        config: Config,
        initial_file: Option<PathBuf>,
    ) -> Self {
        let mut app = Self::with_context(cc.egui_ctx.clone(), config);
        if let Some(path) = initial_file {
            app.apply(Command::Open(path));
        }
        app
    }

    fn with_context(ctx: egui::Context, config: Config) -> Self {
        let shell = DashboardShell::new(config.shell_options(), TextureSurfaces::new(ctx));
        Self {
            config,
            shell,
            shortcuts_modal_open: false,
            preferences_open: false,
            event_queue: EventQueue::<Self>::new(),
            request_redraw: None,
            last_tick: None,
        }
    }

    pub fn request_redraw(&mut self) {
        self.request_redraw = Some(());
    }

    fn apply(&mut self, command: Command) -> Outcome {
        let outcome = self.shell.apply(command);
        if outcome == Outcome::Applied {
            self.last_tick = None;
            self.request_redraw();
        }
        outcome
    }

    fn open_file_dialog(&mut self) {
        log::debug!("open dialog to select flight log");
        let handle = std::thread::spawn(|| {
            rfd::FileDialog::new()
                .add_filter("Airdata CSV", &["csv", "CSV"])
                .pick_file()
        });
        self.event_queue
            .queue_event(Box::new(OpenFileRequested::new(Some(handle))));
    }

    fn save_load_dialog(&mut self, should_save: bool) {
        log::debug!(
            "open dialog to select session {} path",
            if should_save { "save" } else { "load" }
        );
        let handle = std::thread::spawn(move || {
            let dialog = rfd::FileDialog::new().add_filter("session", &["json"]);
            if should_save {
                dialog.set_file_name("session.json").save_file()
            } else {
                dialog.pick_file()
            }
        });
        let event = SaveLoadRequested::new(should_save, Some(handle));
        self.event_queue.queue_event(Box::new(event));
    }

    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        let typing = ctx.wants_keyboard_input();
        let shortcuts = ctx.input(|i| {
            let mut shortcuts = Vec::new();
            if i.key_pressed(egui::Key::F1) {
                shortcuts.push(Shortcut::Help);
            }
            if i.key_pressed(egui::Key::F5) {
                shortcuts.push(Shortcut::QuickLoad);
            }
            if i.key_pressed(egui::Key::F6) {
                shortcuts.push(Shortcut::QuickSave);
            }
            if i.key_pressed(egui::Key::F10) {
                shortcuts.push(Shortcut::Dashboard(Command::Quit));
            }
            if i.key_pressed(egui::Key::F12) {
                shortcuts.push(Shortcut::Preferences);
            }
            if i.key_pressed(egui::Key::O) && i.modifiers.ctrl {
                shortcuts.push(Shortcut::OpenDialog);
            }
            if !typing && i.key_pressed(egui::Key::Space) {
                shortcuts.push(Shortcut::Dashboard(Command::Pause));
            }
            if !typing && i.key_pressed(egui::Key::S) && i.modifiers.is_none() {
                shortcuts.push(Shortcut::Dashboard(Command::FlyThrough));
            }
            shortcuts
        });

        for shortcut in shortcuts {
            match shortcut {
                Shortcut::Help => self.shortcuts_modal_open = !self.shortcuts_modal_open,
                Shortcut::Preferences => self.preferences_open = !self.preferences_open,
                Shortcut::OpenDialog => self.open_file_dialog(),
                Shortcut::QuickSave => {
                    if let Err(error) = save_json(self, None) {
                        log::error!("{}", error)
                    };
                }
                Shortcut::QuickLoad => {
                    if let Err(error) = load_json(self, None) {
                        log::error!("{}", error)
                    };
                }
                Shortcut::Dashboard(command) => {
                    self.apply(command);
                }
            }
        }
    }

    /// Advance playback at most once per frame and keep frames coming while
    /// it is live.
    fn tick(&mut self, ctx: &egui::Context) {
        if !self.shell.is_live() {
            self.last_tick = None;
            return;
        }
        let interval = Duration::from_millis(self.config.tick_interval_ms);
        if self.last_tick.map_or(true, |tic| tic.elapsed() >= interval) {
            self.shell.tick();
            self.last_tick = Some(Instant::now());
        }
        ctx.request_repaint_after(interval);
    }
}

impl eframe::App for EguiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.request_redraw.take().is_some() {
            ctx.request_repaint();
        }

        self.run_events();
        if !self.event_queue.is_empty() {
            ctx.request_repaint_after(DIALOG_POLL);
        }
        self.handle_shortcuts(ctx);

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            self.render_shortcut_modal(ctx);
            self.menu(ui);
        });

        egui::TopBottomPanel::bottom("playback_panel").show(ctx, |ui| {
            self.playback_bar(ui);
        });

        self.render_preferences(ctx);
        self.tick(ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            self.central_panel(ui);
        });

        if self.shell.should_quit() {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        log::info!("shutting down");
    }
}

impl EguiApp {
    fn central_panel(&mut self, ui: &mut egui::Ui) {
        let area = ui.available_rect_before_wrap();
        ui.allocate_rect(area, egui::Sense::hover());

        if self.shell.loaded_path().is_none() {
            ui.painter().text(
                area.center(),
                egui::Align2::CENTER_CENTER,
                "Open a flight log (Ctrl+O)",
                egui::TextStyle::Heading.resolve(ui.style()),
                ui.visuals().weak_text_color(),
            );
            return;
        }

        let split = area.left() + area.width() * LEFT_COLUMN;
        let left = egui::Rect::from_min_max(area.min, egui::pos2(split, area.bottom()));
        let map = egui::Rect::from_min_max(egui::pos2(split, area.top()), area.max);
        let graphs_bottom = left.top() + left.height() * GRAPHS_HEIGHT;
        let graphs = egui::Rect::from_min_max(left.min, egui::pos2(left.right(), graphs_bottom));
        let controls = egui::Rect::from_min_max(
            egui::pos2(left.left(), graphs_bottom + TITLE_HEIGHT),
            left.max,
        );

        for (kind, rect) in [
            (PanelKind::Graphs, graphs),
            (PanelKind::Controls, controls),
            (PanelKind::Map, map),
        ] {
            self.show_panel(ui, kind, rect);
        }

        let painter = ui.painter();
        let font = egui::TextStyle::Body.resolve(ui.style());
        let color = ui.visuals().text_color();
        for (slot, title) in ControlsScene::TITLES.iter().enumerate() {
            let x = controls.left() + controls.width() * (0.25 + 0.5 * slot as f32);
            painter.text(
                egui::pos2(x, graphs_bottom + TITLE_HEIGHT * 0.5),
                egui::Align2::CENTER_CENTER,
                *title,
                font.clone(),
                color,
            );
        }
        let row = graphs.height() / 3.0;
        for (slot, label) in GraphsScene::LABELS.iter().enumerate() {
            painter.text(
                egui::pos2(graphs.left() + 12.0, graphs.top() + row * slot as f32 + 8.0),
                egui::Align2::LEFT_TOP,
                *label,
                font.clone(),
                egui::Color32::DARK_GRAY,
            );
        }
    }

    /// Keep the panel's pixel size in line with `rect` and draw its texture.
    fn show_panel(&mut self, ui: &egui::Ui, kind: PanelKind, rect: egui::Rect) {
        let ppp = ui.ctx().pixels_per_point();
        let size = [
            (rect.width() * ppp).round().max(1.0) as usize,
            (rect.height() * ppp).round().max(1.0) as usize,
        ];
        if self.shell.panel_size(kind) != size {
            self.apply(Command::Resize(kind, size));
        }
        if let Some(texture) = self.shell.factory().texture(kind) {
            egui::Image::new(egui::load::SizedTexture::new(texture.id(), rect.size()))
                .paint_at(ui, rect);
        }
    }

    fn playback_bar(&mut self, ui: &mut egui::Ui) {
        let loaded = self.shell.loaded_path().is_some();
        let live = self.shell.is_live();
        let paused = self.shell.playback_state() == Some(PlaybackState::Paused);
        ui.horizontal(|ui| {
            if ui.button("File").clicked() {
                self.open_file_dialog();
            }
            if ui
                .add_enabled(loaded && !live, egui::Button::new("Run"))
                .clicked()
            {
                self.apply(Command::Run);
            }
            let pause_label = if paused { "Resume" } else { "Pause" };
            if ui
                .add_enabled(live, egui::Button::new(pause_label))
                .on_hover_text("Space")
                .clicked()
            {
                self.apply(Command::Pause);
            }
            if ui.add_enabled(live, egui::Button::new("Stop")).clicked() {
                self.apply(Command::Stop);
            }
            if ui
                .add_enabled(loaded && !live, egui::Button::new("Fly-through"))
                .on_hover_text("S")
                .clicked()
            {
                self.apply(Command::FlyThrough);
            }
            if ui.button("Quit").clicked() {
                self.apply(Command::Quit);
            }
            ui.separator();
            match self.shell.status() {
                Some(status) => ui.label(status.to_string()),
                None => ui.weak("no flight log loaded"),
            };
        });
    }

    fn render_preferences(&mut self, ctx: &egui::Context) {
        let mut open = self.preferences_open;
        let mut changed = false;
        egui::Window::new("Preferences")
            .open(&mut open)
            .resizable(false)
            .show(ctx, |ui| {
                changed = self.config.render(ui);
            });
        self.preferences_open = open;
        if changed {
            log::debug!("preferences changed: {:?}", self.config);
            *self.shell.options_mut() = self.config.shell_options();
        }
    }

    fn menu(&mut self, ui: &mut egui::Ui) {
        egui::menu::bar(ui, |ui| {
            ui.menu_button("File", |ui| {
                if ui.button("Open Flight Log").clicked() {
                    self.open_file_dialog();
                    ui.close_menu();
                }
                if ui.button("Save Session").clicked() {
                    self.save_load_dialog(true);
                    ui.close_menu();
                }
                if ui.button("Load Session").clicked() {
                    self.save_load_dialog(false);
                    ui.close_menu();
                }
                if ui.button("Quick Save").clicked() {
                    if let Err(error) = save_json(self, None) {
                        log::error!("{}", error)
                    };
                }
                if ui.button("Quick Load").clicked() {
                    if let Err(error) = load_json(self, None) {
                        log::error!("{}", error)
                    };
                }
                if ui.button("Preferences").clicked() {
                    self.preferences_open = true;
                    ui.close_menu();
                }
                if ui.button("Quit").clicked() {
                    self.apply(Command::Quit);
                }
            });

            ui.toggle_value(&mut self.shortcuts_modal_open, "Help (F1)");

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                egui::widgets::global_theme_preference_buttons(ui);
            });
        });
    }

    fn render_shortcut_modal(&mut self, ctx: &egui::Context) {
        if self.shortcuts_modal_open
            && egui::Modal::new("shortcut_modal".into())
                .show(ctx, |ui| {
                    ui.heading("Keyboard Shortcuts");
                    ui.separator();
                    ui.label("CTRL + O = Open Flight Log");
                    ui.separator();
                    ui.label("Space = Pause / Resume");
                    ui.separator();
                    ui.label("S = Fly Through (map only)");
                    ui.separator();
                    ui.label("F1 = Show Keyboard Shortcuts");
                    ui.separator();
                    ui.label("F6 = Save Session");
                    ui.separator();
                    ui.label("F5 = Load Session");
                    ui.separator();
                    ui.label("F10 = Quit App");
                    ui.separator();
                    ui.label("F12 = Open Preferences");
                    ui.separator();
                })
                .should_close()
        {
            self.shortcuts_modal_open = false;
        };
    }
}
