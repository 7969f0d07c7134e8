use crate::logic::{HostListController, lock};
use crate::model::status::{LatencyBand, LossBand, latency_band, loss_band};
use crate::model::{AppState, BannerKind, HostField, Reachability, SortColumn, StatusEntry, StatusTracker};
use eframe::egui;
use eframe::egui::{Color32, RichText};
use egui_extras::{Column, TableBuilder};
use std::time::Duration;
use tr::tr;
use tracing::debug;

pub struct WolHostsApp {
    pub(crate) controller: HostListController,
    filter_input: String,
}

/// Helper for status colors adapted for light/dark themes.
struct StatusVisuals {
    is_dark: bool,
}

impl StatusVisuals {
    fn from_ctx(ctx: &egui::Context) -> Self {
        Self {
            is_dark: ctx.style().visuals.dark_mode,
        }
    }

    fn good_color(&self) -> Color32 {
        if self.is_dark {
            Color32::from_rgb(86, 180, 233) // Sky Blue
        } else {
            Color32::from_rgb(0, 114, 178) // Blue
        }
    }

    fn warn_color(&self) -> Color32 {
        if self.is_dark {
            Color32::from_rgb(240, 228, 66) // Yellow
        } else {
            Color32::from_rgb(230, 159, 0) // Orange
        }
    }

    fn bad_color(&self) -> Color32 {
        Color32::from_rgb(213, 94, 0) // Vermilion
    }

    fn unknown_color(&self) -> Color32 {
        if self.is_dark {
            Color32::from_gray(140)
        } else {
            Color32::from_gray(110)
        }
    }

    fn latency_color(&self, ms: f64) -> Color32 {
        match latency_band(ms) {
            LatencyBand::Response(0 | 25) => self.good_color(),
            LatencyBand::Response(50 | 75) => self.warn_color(),
            LatencyBand::Response(_) => Color32::from_rgb(204, 121, 167), // Reddish purple
            LatencyBand::Failure => self.bad_color(),
        }
    }

    fn loss_color(&self, percent: f64) -> Option<Color32> {
        match loss_band(percent) {
            LossBand::Success => None,
            LossBand::Warning => Some(self.warn_color()),
            LossBand::Failure => Some(self.bad_color()),
        }
    }

    fn status_color(&self, entry: Option<&StatusEntry>) -> Color32 {
        match entry {
            Some(e) if e.online == Reachability::Online => {
                e.latency.map_or(self.good_color(), |ms| self.latency_color(ms))
            }
            Some(e) if e.online == Reachability::Offline => self.bad_color(),
            _ => self.unknown_color(),
        }
    }

    fn banner_color(&self, kind: BannerKind) -> Color32 {
        match kind {
            BannerKind::Success => self.good_color(),
            BannerKind::Failure => self.bad_color(),
        }
    }
}

/// Clicks collected while the table is drawn, handled once it is done.
enum RowAction {
    Wake(String),
    Edit(String),
    Remove(String),
}

fn status_text(entry: Option<&StatusEntry>) -> String {
    match entry {
        Some(e) if e.online == Reachability::Online => match e.latency {
            Some(ms) => format!("{} ({:.0} {})", tr!("Online"), ms, tr!("ms")),
            None => tr!("Online"),
        },
        Some(e) if e.online == Reachability::Offline => tr!("Offline"),
        _ => tr!("Unknown"),
    }
}

fn field_label(field: HostField) -> String {
    match field {
        HostField::Name => tr!("Name"),
        HostField::IpAddress => tr!("IP Address"),
        HostField::MacAddress => tr!("MAC Address"),
        HostField::Port => tr!("Port"),
    }
}

fn field_hint(field: HostField) -> String {
    match field {
        HostField::Name => tr!("e.g. media-server"),
        HostField::IpAddress => tr!("e.g. 192.168.1.20 (optional)"),
        HostField::MacAddress => "00:11:22:33:44:55".to_string(),
        HostField::Port => tr!("e.g. 9 (optional)"),
    }
}

impl WolHostsApp {
    /// Restores the table view saved by the previous session and starts the
    /// host list.
    pub fn new(cc: &eframe::CreationContext<'_>, mut controller: HostListController) -> Self {
        if let Some(storage) = cc.storage
            && let Some(serialized) = storage.get_string(eframe::APP_KEY)
        {
            let restored: AppState = serde_json::from_str(&serialized).unwrap_or_default();
            lock(controller.state()).table = restored.table;
        }
        controller.activate();
        Self::from_controller(controller)
    }

    pub fn from_controller(controller: HostListController) -> Self {
        let filter_input = {
            let mut state = lock(controller.state());
            state.table.page_size = controller.config().page_size.max(1);
            state.table.filter_text().to_string()
        };
        Self {
            controller,
            filter_input,
        }
    }

    pub fn controller(&self) -> &HostListController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut HostListController {
        &mut self.controller
    }

    pub fn ui_layout(&mut self, ctx: &egui::Context) {
        let visuals = StatusVisuals::from_ctx(ctx);
        let affordances = self.controller.affordances();

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                let filter = ui.add(
                    egui::TextEdit::singleline(&mut self.filter_input)
                        .hint_text(tr!("Filter by name or IP address"))
                        .desired_width(8.0 * 30.0),
                );
                if filter.changed() {
                    self.controller.apply_filter(self.filter_input.trim());
                }

                if affordances.manage_hosts && ui.button(tr!("Create host")).clicked() {
                    self.controller.open_create_form();
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let mut theme = ui.ctx().options(|o| o.theme_preference);
                    let old_theme = theme;
                    theme.radio_buttons(ui);
                    if theme != old_theme {
                        ui.ctx().options_mut(|o| o.theme_preference = theme);
                    }
                });
            });

            let banner = lock(self.controller.state()).banner.clone();
            if let Some(banner) = banner {
                ui.colored_label(
                    visuals.banner_color(banner.kind),
                    RichText::new(banner.message).strong(),
                );
            }

            ui.separator();

            let page = self.controller.page();
            let (sort_column, ascending) = {
                let state = lock(self.controller.state());
                (state.table.sort_column, state.table.ascending)
            };
            let tracker: StatusTracker = lock(self.controller.tracker()).clone();

            if page.total == 0 {
                if self.controller.store().is_available() {
                    ui.label(tr!("No hosts have been added yet"));
                } else {
                    ui.label(tr!("The host collection is not available"));
                }
            }

            let mut sort = None;
            let mut actions = Vec::new();

            TableBuilder::new(ui)
                .striped(true)
                .resizable(true)
                .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
                .column(Column::auto().at_least(140.0))
                .column(Column::auto().at_least(110.0))
                .column(Column::auto().at_least(140.0))
                .column(Column::auto().at_least(130.0))
                .column(Column::remainder())
                .header(24.0, |mut header| {
                    for (column, title) in [
                        (SortColumn::Name, tr!("Name")),
                        (SortColumn::IpAddress, tr!("IP Address")),
                        (SortColumn::MacAddress, tr!("MAC Address")),
                        (SortColumn::Status, tr!("Status")),
                    ] {
                        header.col(|ui| {
                            let text = if column == sort_column {
                                format!("{} {}", title, if ascending { "⏶" } else { "⏷" })
                            } else {
                                title
                            };
                            if ui.button(RichText::new(text).strong()).clicked() {
                                sort = Some(column);
                            }
                        });
                    }
                    header.col(|ui| {
                        ui.strong(tr!("Actions"));
                    });
                })
                .body(|mut body| {
                    for host in &page.rows {
                        let entry = tracker.get(host.ip_address());
                        let key = host.key().unwrap_or_default().to_string();
                        body.row(26.0, |mut row| {
                            row.col(|ui| {
                                ui.label(host.name());
                            });
                            row.col(|ui| {
                                ui.label(RichText::new(host.ip_address()).monospace());
                            });
                            row.col(|ui| {
                                ui.label(RichText::new(host.mac_address()).monospace());
                            });
                            row.col(|ui| {
                                let label = ui.colored_label(
                                    visuals.status_color(entry),
                                    RichText::new(status_text(entry)).strong(),
                                );
                                if let Some(e) = entry {
                                    label.on_hover_ui(|ui| {
                                        ui.label(format!(
                                            "{}: {}",
                                            tr!("Last checked"),
                                            e.last_checked.format("%Y-%m-%d %H:%M:%S UTC")
                                        ));
                                        if let Some(loss) = e.packet_loss {
                                            let text = format!("{}: {:.0}%", tr!("Packet loss"), loss);
                                            match visuals.loss_color(loss) {
                                                Some(c) => ui.colored_label(c, text),
                                                None => ui.label(text),
                                            };
                                        }
                                    });
                                }
                            });
                            row.col(|ui| {
                                if key.is_empty() {
                                    return;
                                }
                                if affordances.wake && ui.button(tr!("Wake")).clicked() {
                                    actions.push(RowAction::Wake(key.clone()));
                                }
                                if affordances.manage_hosts {
                                    if ui.button(tr!("Edit")).clicked() {
                                        actions.push(RowAction::Edit(key.clone()));
                                    }
                                    if ui.button(tr!("Remove")).clicked() {
                                        actions.push(RowAction::Remove(key.clone()));
                                    }
                                }
                            });
                        });
                    }
                });

            ui.separator();
            ui.horizontal(|ui| {
                if ui
                    .add_enabled(page.page > 0, egui::Button::new(tr!("Previous")))
                    .clicked()
                {
                    self.controller.previous_page();
                }
                ui.label(format!("{} {} / {}", tr!("Page"), page.page + 1, page.pages));
                if ui
                    .add_enabled(page.page + 1 < page.pages, egui::Button::new(tr!("Next")))
                    .clicked()
                {
                    self.controller.next_page();
                }
                ui.label(format!("{}: {} / {}", tr!("Hosts"), page.matching, page.total));
            });

            if let Some(column) = sort {
                self.controller.sort_by(column);
            }
            for action in actions {
                let result = match action {
                    RowAction::Wake(key) => self.controller.wake(&key),
                    RowAction::Edit(key) => {
                        self.controller.open_edit_form(&key);
                        Ok(())
                    }
                    RowAction::Remove(key) => {
                        self.controller.request_delete(&key);
                        Ok(())
                    }
                };
                if let Err(e) = result {
                    debug!("host action rejected: {}", e);
                }
            }
        });

        self.delete_dialog(ctx);
        self.form_dialog(ctx, &visuals);
    }

    fn delete_dialog(&mut self, ctx: &egui::Context) {
        let Some(key) = lock(self.controller.state()).pending_delete.clone() else {
            return;
        };
        let (name, address) = self
            .controller
            .store()
            .get(&key)
            .map(|h| (h.name().to_string(), h.ip_address().to_string()))
            .unwrap_or_else(|| (key.clone(), String::new()));

        let mut confirm = false;
        let mut cancel = false;
        egui::Window::new(tr!("Confirm Deletion"))
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                ui.label(format!(
                    "{}: {} ({})?",
                    tr!("Are you sure you want to remove this host"),
                    name,
                    address
                ));
                ui.add_space(12.0);
                ui.horizontal(|ui| {
                    confirm = ui.button(tr!("Delete")).clicked();
                    cancel = ui.button(tr!("Cancel")).clicked();
                });
            });

        if confirm {
            if let Err(e) = self.controller.confirm_delete() {
                debug!("delete rejected: {}", e);
            }
        } else if cancel {
            self.controller.cancel_delete();
        }
    }

    fn form_dialog(&mut self, ctx: &egui::Context, visuals: &StatusVisuals) {
        let Some(form) = lock(self.controller.state()).form.clone() else {
            return;
        };
        let title = if form.is_new() {
            tr!("Create host")
        } else {
            tr!("Edit host")
        };

        let mut is_open = true;
        let mut save = false;
        let mut cancel = false;
        let controller = &self.controller;
        egui::Window::new(title)
            .open(&mut is_open)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                egui::Grid::new("host_form")
                    .num_columns(2)
                    .spacing([8.0, 6.0])
                    .show(ui, |ui| {
                        for field in HostField::ALL {
                            ui.label(format!("{}:", field_label(field)));
                            let mut value = form.fields.get(field).to_string();
                            let response = ui.add(
                                egui::TextEdit::singleline(&mut value)
                                    .id_salt(("host_form", field_label(field)))
                                    .hint_text(field_hint(field))
                                    .desired_width(8.0 * 25.0),
                            );
                            if response.changed() {
                                controller.set_field(field, &value);
                            }
                            // Validate as soon as the user leaves the field
                            if response.lost_focus() {
                                controller.blur_field(field);
                            }
                            ui.end_row();

                            if let Some(error) = form.errors.get(field) {
                                ui.label("");
                                ui.colored_label(visuals.bad_color(), error);
                                ui.end_row();
                            }
                        }
                    });

                ui.add_space(12.0);
                ui.horizontal(|ui| {
                    save = ui
                        .add_enabled(!form.submitting, egui::Button::new(tr!("Save")))
                        .clicked();
                    cancel = ui.button(tr!("Cancel")).clicked();
                });
            });

        if save {
            if let Err(e) = self.controller.submit_form() {
                debug!("host not saved: {}", e);
            }
        } else if cancel || !is_open {
            self.controller.close_form();
        }
    }
}

impl eframe::App for WolHostsApp {
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        let serialized =
            serde_json::to_string_pretty(&*lock(self.controller.state())).unwrap_or_default();
        storage.set_string(eframe::APP_KEY, serialized);
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui_layout(ctx);
        // Request completions and probe results arrive off the UI thread
        ctx.request_repaint_after(Duration::from_millis(250));
    }
}
