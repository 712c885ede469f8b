//! Desktop front end of the training log.

use chrono::Local;
use eframe::{App, Frame, NativeOptions, egui};
use egui_extras::DatePickerButton;
use egui_plot::{Legend, Plot};
use rfd::FileDialog;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

mod body_parts;
use body_parts::{ALL_BODY_PARTS, BodyPart};
mod export;
mod forms;
use forms::{BodyMetricForm, RecordedAtInput, WorkoutForm};
mod history;
use history::{ExerciseGroup, StaleBodyPart, compute_stale_body_parts, group_entries};
mod models;
use models::{BodyMetric, WorkoutEntry};
mod plotting;
use plotting::{MetricSeries, date_axis_label, metric_line};
mod settings;
use settings::{Settings, Tab};
mod store;
use store::{Store, StoreError};

const TOAST_DURATION: Duration = Duration::from_millis(1500);

const CJK_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/google-noto-cjk/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/truetype/fonts-japanese-gothic.ttf",
    "/System/Library/Fonts/ヒラギノ角ゴシック W3.ttc",
    "/System/Library/Fonts/Hiragino Sans GB.ttc",
    "C:\\Windows\\Fonts\\meiryo.ttc",
    "C:\\Windows\\Fonts\\msgothic.ttc",
];

/// Register the first readable Japanese-capable font as a fallback for both
/// font families. egui's bundled fonts have no CJK glyphs.
fn install_cjk_font(ctx: &egui::Context, configured: Option<&str>) {
    let candidates = configured
        .into_iter()
        .chain(CJK_FONT_CANDIDATES.iter().copied());
    for path in candidates {
        if let Ok(bytes) = std::fs::read(path) {
            let mut fonts = egui::FontDefinitions::default();
            fonts
                .font_data
                .insert("cjk".to_owned(), egui::FontData::from_owned(bytes));
            for family in [egui::FontFamily::Proportional, egui::FontFamily::Monospace] {
                fonts
                    .families
                    .entry(family)
                    .or_default()
                    .push("cjk".to_owned());
            }
            ctx.set_fonts(fonts);
            log::info!("Loaded CJK font from {path}");
            return;
        }
    }
    log::warn!("No CJK font found; Japanese labels may not render");
}

fn recorded_at_input(ui: &mut egui::Ui, id: &str, input: &mut RecordedAtInput) {
    ui.horizontal(|ui| {
        ui.add(DatePickerButton::new(&mut input.date).id_source(id));
        ui.add(
            egui::TextEdit::singleline(&mut input.time)
                .desired_width(60.0)
                .hint_text("HH:MM"),
        );
    });
}

fn stale_label(stale: &StaleBodyPart) -> String {
    match stale.days_since {
        Some(days) => format!("{}: {}日", stale.body_part, days),
        None => format!("{}: 未記録", stale.body_part),
    }
}

struct IronLogApp {
    store: Store,
    db_path: PathBuf,
    settings: Settings,
    settings_dirty: bool,
    metrics: Vec<BodyMetric>,
    workouts: Vec<WorkoutEntry>,
    exercise_options: Vec<String>,
    metric_form: BodyMetricForm,
    workout_form: WorkoutForm,
    /// Open body-part tags in the history, keyed by `date|body part`.
    expanded: HashSet<String>,
    toast: Option<(String, Instant)>,
    error: Option<String>,
}

impl IronLogApp {
    fn new(cc: &eframe::CreationContext<'_>, store: Store, settings: Settings, db_path: PathBuf) -> Self {
        install_cjk_font(&cc.egui_ctx, settings.cjk_font_path.as_deref());
        Self::with_store(store, settings, db_path)
    }

    fn with_store(store: Store, settings: Settings, db_path: PathBuf) -> Self {
        let body_part = settings.last_body_part;
        let mut app = Self {
            store,
            db_path,
            settings,
            settings_dirty: false,
            metrics: Vec::new(),
            workouts: Vec::new(),
            exercise_options: Vec::new(),
            metric_form: BodyMetricForm::default(),
            workout_form: WorkoutForm::default(),
            expanded: HashSet::new(),
            toast: None,
            error: None,
        };
        app.refresh();
        app.load_exercises(body_part);
        app
    }

    fn show_toast(&mut self, msg: impl Into<String>) {
        self.toast = Some((msg.into(), Instant::now()));
    }

    fn report_error(&mut self, msg: &str, err: StoreError) {
        log::error!("{msg}: {err}");
        self.error = Some(format!("{msg}: {err}"));
    }

    /// Re-read both histories from the store.
    fn refresh(&mut self) {
        match self.store.list_body_metrics() {
            Ok(metrics) => self.metrics = metrics,
            Err(e) => self.report_error("体組成の読み込みに失敗しました", e),
        }
        match self.store.list_workouts() {
            Ok(workouts) => self.workouts = workouts,
            Err(e) => self.report_error("筋トレ記録の読み込みに失敗しました", e),
        }
    }

    fn load_exercises(&mut self, body_part: BodyPart) {
        match self.store.list_exercises(body_part) {
            Ok(list) => {
                self.workout_form.select_body_part(body_part, &list);
                self.exercise_options = list;
            }
            Err(e) => self.report_error("種目の読み込みに失敗しました", e),
        }
    }

    fn select_body_part(&mut self, body_part: BodyPart) {
        self.load_exercises(body_part);
        self.settings.last_body_part = body_part;
        self.settings_dirty = true;
    }

    fn add_custom_exercise(&mut self) {
        let name = self.workout_form.new_exercise_name.trim().to_string();
        if name.is_empty() {
            return;
        }
        match self.store.add_exercise(self.workout_form.body_part, &name) {
            Ok(list) => {
                self.exercise_options = list;
                self.workout_form.exercise = name;
                self.workout_form.new_exercise_name.clear();
                self.workout_form.adding_exercise = false;
            }
            Err(e) => self.report_error("種目の追加に失敗しました", e),
        }
    }

    fn save_body_metric(&mut self) {
        let Some(metric) = self.metric_form.build() else {
            return;
        };
        match self.store.add_body_metric(&metric) {
            Ok(()) => {
                self.metric_form.reset_after_save();
                self.show_toast("記録を保存しました");
            }
            Err(e) => self.report_error("保存に失敗しました", e),
        }
        self.refresh();
    }

    fn save_workout(&mut self) {
        let entries = self.workout_form.build_entries();
        if entries.is_empty() {
            return;
        }
        match self.store.add_workout_sets(&entries) {
            Ok(_) => {
                self.workout_form.reset_after_save();
                self.show_toast("記録を保存しました");
            }
            Err(e) => self.report_error("保存に失敗しました", e),
        }
        // sets written before a failure stay in the store, so always re-read
        self.refresh();
    }

    fn delete_body_metric(&mut self, id: &str) {
        match self.store.delete_body_metric(id) {
            Ok(()) => self.show_toast("削除しました"),
            Err(e) => self.report_error("削除に失敗しました", e),
        }
        self.refresh();
    }

    fn delete_exercise_group(&mut self, group: &ExerciseGroup) {
        match self.store.delete_exercise_group(group) {
            Ok(_) => self.show_toast("削除しました"),
            Err(e) => self.report_error("削除に失敗しました", e),
        }
        self.refresh();
    }

    fn remember_backup_dir(&mut self, path: &Path) {
        if let Some(dir) = path.parent() {
            self.settings.last_backup_dir = Some(dir.display().to_string());
            self.settings_dirty = true;
        }
    }

    fn file_dialog(&self) -> FileDialog {
        let dialog = FileDialog::new();
        match self.settings.last_backup_dir.as_deref() {
            Some(dir) => dialog.set_directory(dir),
            None => dialog,
        }
    }

    fn export_backup(&mut self) {
        let name = export::backup_file_name(Local::now().date_naive());
        let Some(path) = self
            .file_dialog()
            .add_filter("JSON", &["json"])
            .set_file_name(name)
            .save_file()
        else {
            return;
        };
        match export::export_to_file(&self.store, &path) {
            Ok(()) => {
                self.remember_backup_dir(&path);
                self.show_toast("エクスポートしました");
            }
            Err(e) => self.report_error("エクスポートに失敗しました", e),
        }
    }

    fn import_backup(&mut self) {
        let Some(path) = self.file_dialog().add_filter("JSON", &["json"]).pick_file() else {
            return;
        };
        match export::import_from_file(&self.store, &path) {
            Ok(summary) => {
                self.remember_backup_dir(&path);
                self.show_toast(format!("{}件インポートしました", summary.total()));
            }
            Err(e) => self.report_error(
                "インポートに失敗しました。ファイル形式が正しいか確認してください",
                e,
            ),
        }
        self.refresh();
        self.load_exercises(self.workout_form.body_part);
    }

    fn export_csv(&mut self) {
        let Some(path) = self
            .file_dialog()
            .add_filter("CSV", &["csv"])
            .set_file_name("iron-log-workouts.csv")
            .save_file()
        else {
            return;
        };
        match export::save_workouts_csv(&path, &self.workouts) {
            Ok(()) => self.show_toast("CSVを保存しました"),
            Err(e) => self.report_error("CSVの保存に失敗しました", e),
        }
    }

    fn body_tab(&mut self, ui: &mut egui::Ui) {
        ui.heading("体組成を記録");
        egui::Grid::new("body_form").num_columns(2).show(ui, |ui| {
            ui.label("体重 (kg)");
            ui.add(egui::TextEdit::singleline(&mut self.metric_form.weight).hint_text("70.0"));
            ui.end_row();
            ui.label("体脂肪率 (%)");
            ui.add(egui::TextEdit::singleline(&mut self.metric_form.body_fat).hint_text("15.0"));
            ui.end_row();
            ui.label("記録日時");
            recorded_at_input(ui, "body_recorded_at", &mut self.metric_form.recorded_at);
            ui.end_row();
        });
        if ui
            .add_enabled(self.metric_form.can_save(), egui::Button::new("記録する"))
            .clicked()
        {
            self.save_body_metric();
        }

        if self.metrics.len() > 1 {
            ui.separator();
            for (id, series) in [
                ("weight_plot", MetricSeries::Weight),
                ("body_fat_plot", MetricSeries::BodyFat),
            ] {
                let line = metric_line(&self.metrics, series);
                Plot::new(id)
                    .height(140.0)
                    .legend(Legend::default())
                    .x_axis_formatter(|mark, _chars, _| date_axis_label(mark.value))
                    .show(ui, |plot_ui| plot_ui.line(line));
            }
        }

        ui.separator();
        ui.heading("履歴");
        if self.metrics.is_empty() {
            ui.label("記録なし");
        }
        let mut delete: Option<String> = None;
        for m in &self.metrics {
            ui.horizontal(|ui| {
                ui.label(m.recorded_at.as_str());
                ui.label(format!("{} kg", m.weight));
                ui.label(format!("{} %", m.body_fat_pct));
                if ui.small_button("削除").clicked() {
                    delete = Some(m.id.clone());
                }
            });
        }
        if let Some(id) = delete {
            self.delete_body_metric(&id);
        }
    }

    fn workout_tab(&mut self, ui: &mut egui::Ui) {
        let stale = compute_stale_body_parts(
            &self.workouts,
            &ALL_BODY_PARTS,
            Local::now().naive_local(),
        );
        if !stale.is_empty() {
            ui.colored_label(egui::Color32::from_rgb(255, 170, 0), "しばらく鍛えていない部位");
            ui.horizontal_wrapped(|ui| {
                for s in &stale {
                    ui.label(stale_label(s));
                }
            });
            ui.separator();
        }

        ui.heading("筋トレを記録");
        let mut new_body_part: Option<BodyPart> = None;
        let mut add_exercise = false;
        let mut remove_set: Option<usize> = None;
        egui::Grid::new("workout_form").num_columns(2).show(ui, |ui| {
            ui.label("部位");
            let mut selected = self.workout_form.body_part;
            egui::ComboBox::from_id_source("body_part_combo")
                .selected_text(selected.label())
                .show_ui(ui, |ui| {
                    for bp in ALL_BODY_PARTS {
                        ui.selectable_value(&mut selected, bp, bp.label());
                    }
                });
            if selected != self.workout_form.body_part {
                new_body_part = Some(selected);
            }
            ui.end_row();

            ui.label("種目");
            ui.vertical(|ui| {
                egui::ComboBox::from_id_source("exercise_combo")
                    .selected_text(self.workout_form.exercise.clone())
                    .show_ui(ui, |ui| {
                        for ex in &self.exercise_options {
                            ui.selectable_value(
                                &mut self.workout_form.exercise,
                                ex.clone(),
                                ex.as_str(),
                            );
                        }
                    });
                if !self.workout_form.adding_exercise {
                    if ui.small_button("＋ 種目を追加").clicked() {
                        self.workout_form.adding_exercise = true;
                    }
                } else {
                    ui.horizontal(|ui| {
                        let resp = ui.add(
                            egui::TextEdit::singleline(&mut self.workout_form.new_exercise_name)
                                .hint_text("新しい種目名"),
                        );
                        let entered =
                            resp.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                        if ui.button("追加").clicked() || entered {
                            add_exercise = true;
                        }
                        if ui.button("✕").clicked() {
                            self.workout_form.adding_exercise = false;
                            self.workout_form.new_exercise_name.clear();
                        }
                    });
                }
            });
            ui.end_row();

            ui.label("重量 (kg)");
            ui.add(egui::TextEdit::singleline(&mut self.workout_form.weight_kg).hint_text("60"));
            ui.end_row();

            ui.label("セット");
            ui.vertical(|ui| {
                ui.horizontal_wrapped(|ui| {
                    for (i, reps) in self.workout_form.sets.iter().enumerate() {
                        if ui
                            .button(format!("{reps} ×"))
                            .on_hover_text("このセットを削除")
                            .clicked()
                        {
                            remove_set = Some(i);
                        }
                    }
                });
                ui.horizontal(|ui| {
                    ui.add(
                        egui::TextEdit::singleline(&mut self.workout_form.reps)
                            .desired_width(60.0)
                            .hint_text("回数"),
                    );
                    if ui.button("＋セット").clicked() {
                        self.workout_form.add_set();
                    }
                    if ui.button("n").clicked() {
                        self.workout_form.add_unspecified_set();
                    }
                });
            });
            ui.end_row();

            ui.label("備考");
            ui.add(
                egui::TextEdit::multiline(&mut self.workout_form.note)
                    .hint_text("メモ（任意）")
                    .desired_rows(2),
            );
            ui.end_row();

            ui.label("記録日時");
            recorded_at_input(ui, "workout_recorded_at", &mut self.workout_form.recorded_at);
            ui.end_row();
        });

        if let Some(i) = remove_set {
            self.workout_form.remove_set(i);
        }
        if add_exercise {
            self.add_custom_exercise();
        }
        if let Some(bp) = new_body_part {
            self.select_body_part(bp);
        }

        let label = format!("記録する（{}セット）", self.workout_form.sets.len());
        if ui
            .add_enabled(self.workout_form.can_save(), egui::Button::new(label))
            .clicked()
        {
            self.save_workout();
        }

        ui.separator();
        self.workout_history(ui);
    }

    fn workout_history(&mut self, ui: &mut egui::Ui) {
        ui.heading("履歴");
        let grouped = group_entries(&self.workouts);
        if grouped.is_empty() {
            ui.label("記録なし");
            return;
        }

        let mut toggle: Option<String> = None;
        let mut delete_group: Option<ExerciseGroup> = None;
        for day in &grouped {
            ui.strong(day.label.as_str());
            ui.horizontal_wrapped(|ui| {
                for pg in &day.body_part_groups {
                    let key = format!("{}|{}", day.date, pg.body_part);
                    let open = self.expanded.contains(&key);
                    let text = format!(
                        "{} {} {}",
                        pg.body_part,
                        pg.entries.len(),
                        if open { "▲" } else { "▼" }
                    );
                    if ui.selectable_label(open, text).clicked() {
                        toggle = Some(key);
                    }
                }
            });
            for pg in &day.body_part_groups {
                let key = format!("{}|{}", day.date, pg.body_part);
                if !self.expanded.contains(&key) {
                    continue;
                }
                ui.indent(key, |ui| {
                    for eg in &pg.exercise_groups {
                        ui.horizontal(|ui| {
                            ui.strong(eg.exercise.as_str());
                            ui.label(format!("{} kg × {}", eg.weight_kg, eg.reps_label()));
                            if ui.small_button("削除").clicked() {
                                delete_group = Some(eg.clone());
                            }
                        });
                        if !eg.note.is_empty() {
                            ui.weak(eg.note.as_str());
                        }
                    }
                });
            }
            ui.add_space(6.0);
        }

        if let Some(key) = toggle {
            if !self.expanded.remove(&key) {
                self.expanded.insert(key);
            }
        }
        if let Some(group) = delete_group {
            self.delete_exercise_group(&group);
        }
    }

    fn data_tab(&mut self, ui: &mut egui::Ui) {
        ui.heading("データ同期・共有");
        ui.label("別の端末にデータを引き継ぐために、データのエクスポートとインポートができます。");
        ui.add_space(8.0);
        if ui.button("バックアップ(エクスポート)を保存する").clicked() {
            self.export_backup();
        }
        if ui.button("データをインポートする").clicked() {
            self.import_backup();
        }
        if ui.button("セット履歴をCSVで保存する").clicked() {
            self.export_csv();
        }
        ui.separator();
        ui.weak(format!("データベース: {}", self.db_path.display()));
    }
}

impl App for IronLogApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("IRON LOG");
                ui.weak("Record. Repeat. Overcome.");
            });
            ui.horizontal(|ui| {
                let prev = self.settings.active_tab;
                ui.selectable_value(&mut self.settings.active_tab, Tab::Body, "体組成");
                ui.selectable_value(&mut self.settings.active_tab, Tab::Workout, "筋トレ");
                ui.selectable_value(&mut self.settings.active_tab, Tab::Data, "データ");
                if prev != self.settings.active_tab {
                    self.settings_dirty = true;
                }
            });
            let mut dismiss = false;
            if let Some(err) = &self.error {
                ui.horizontal(|ui| {
                    ui.colored_label(egui::Color32::RED, err.as_str());
                    dismiss = ui.small_button("閉じる").clicked();
                });
            }
            if dismiss {
                self.error = None;
            }
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| match self.settings.active_tab {
                Tab::Body => self.body_tab(ui),
                Tab::Workout => self.workout_tab(ui),
                Tab::Data => self.data_tab(ui),
            });
        });

        if self
            .toast
            .as_ref()
            .is_some_and(|(_, start)| start.elapsed() >= TOAST_DURATION)
        {
            self.toast = None;
        }
        if let Some((msg, start)) = &self.toast {
            egui::Area::new(egui::Id::new("toast"))
                .anchor(egui::Align2::CENTER_BOTTOM, [0.0, -20.0])
                .show(ctx, |ui| {
                    ui.label(msg.as_str());
                });
            ctx.request_repaint_after(TOAST_DURATION.saturating_sub(start.elapsed()));
        }

        if self.settings_dirty {
            self.settings.save();
            self.settings_dirty = false;
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.settings.save();
    }
}

fn main() -> eframe::Result<()> {
    env_logger::init();
    let settings = Settings::load();
    let db_path = settings.resolve_db_path();
    let store = match Store::open(&db_path) {
        Ok(store) => store,
        Err(e) => {
            log::error!("Failed to open record store at {}: {e}", db_path.display());
            std::process::exit(1);
        }
    };
    let options = NativeOptions::default();
    eframe::run_native(
        "IRON LOG",
        options,
        Box::new(move |cc| Box::new(IronLogApp::new(cc, store, settings, db_path))),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use models::Reps;

    fn test_app() -> IronLogApp {
        IronLogApp::with_store(
            Store::open_in_memory().unwrap(),
            Settings::default(),
            PathBuf::from(":memory:"),
        )
    }

    fn fill_bench(app: &mut IronLogApp, sets: &[u32]) {
        app.workout_form.weight_kg = "60".into();
        app.workout_form.recorded_at = RecordedAtInput {
            date: NaiveDate::from_ymd_opt(2026, 2, 23).unwrap(),
            time: "10:00".into(),
        };
        for &r in sets {
            app.workout_form.reps = r.to_string();
            app.workout_form.add_set();
        }
    }

    #[test]
    fn starts_with_default_exercises_for_last_body_part() {
        let app = test_app();
        assert_eq!(app.workout_form.body_part, BodyPart::Chest);
        assert_eq!(app.workout_form.exercise, "ベンチプレス");
        assert_eq!(app.exercise_options.len(), 5);
    }

    #[test]
    fn saving_sets_refreshes_history() {
        let mut app = test_app();
        fill_bench(&mut app, &[10, 8, 0]);
        app.save_workout();

        assert_eq!(app.workouts.len(), 3);
        assert!(app.workout_form.sets.is_empty());
        assert_eq!(app.toast.as_ref().map(|(m, _)| m.as_str()), Some("記録を保存しました"));

        let days = group_entries(&app.workouts);
        let group = &days[0].body_part_groups[0].exercise_groups[0];
        assert_eq!(group.reps, vec![Reps::Count(10), Reps::Count(8), Reps::Unspecified]);
    }

    #[test]
    fn deleting_a_group_empties_the_history() {
        let mut app = test_app();
        fill_bench(&mut app, &[5, 5]);
        app.save_workout();
        let group = group_entries(&app.workouts)[0].body_part_groups[0].exercise_groups[0].clone();
        app.delete_exercise_group(&group);
        assert!(app.workouts.is_empty());
    }

    #[test]
    fn switching_body_part_loads_its_exercises() {
        let mut app = test_app();
        app.select_body_part(BodyPart::Back);
        assert_eq!(app.workout_form.exercise, "デッドリフト");
        assert_eq!(app.settings.last_body_part, BodyPart::Back);
        assert!(app.settings_dirty);
    }

    #[test]
    fn custom_exercise_becomes_selected() {
        let mut app = test_app();
        app.workout_form.new_exercise_name = "ケーブルクロスオーバー".into();
        app.workout_form.adding_exercise = true;
        app.add_custom_exercise();
        assert_eq!(app.workout_form.exercise, "ケーブルクロスオーバー");
        assert_eq!(app.exercise_options.len(), 6);
        assert!(!app.workout_form.adding_exercise);
    }

    #[test]
    fn body_metric_save_and_delete() {
        let mut app = test_app();
        app.metric_form.weight = "70.04".into();
        app.metric_form.body_fat = "15".into();
        app.save_body_metric();
        assert_eq!(app.metrics.len(), 1);
        assert_eq!(app.metrics[0].weight, 70.0);
        let id = app.metrics[0].id.clone();
        app.delete_body_metric(&id);
        assert!(app.metrics.is_empty());
    }

    #[test]
    fn stale_labels() {
        let never = StaleBodyPart {
            body_part: BodyPart::Legs,
            days_since: None,
        };
        let old = StaleBodyPart {
            body_part: BodyPart::Arms,
            days_since: Some(6),
        };
        assert_eq!(stale_label(&never), "脚: 未記録");
        assert_eq!(stale_label(&old), "腕: 6日");
    }

    #[test]
    fn tabs_render_without_panicking() {
        let mut app = test_app();
        fill_bench(&mut app, &[10]);
        app.save_workout();
        app.expanded.insert(format!("2026-02-23|{}", BodyPart::Chest));

        let ctx = egui::Context::default();
        let _ = ctx.run(Default::default(), |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| {
                app.body_tab(ui);
                app.workout_tab(ui);
                app.data_tab(ui);
            });
        });
        assert_eq!(app.workouts.len(), 1);
    }
}
