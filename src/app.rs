//! Main application UI and state management.
//! Handles sign-in, onboarding, the flashcard list and editor, study sessions
//! and the profile screen.

use crate::auth::{AuthEvent, IdentityProvider, LocalIdentityProvider, open_session};
use crate::config::AppConfig;
use crate::database::{SharedConnection, db, lock, users};
use crate::error::Result;
use crate::export::json::{export_owner, import_into, import_json};
use crate::i18n::{I18n, supported_languages};
use crate::models::review_state::MAX_KNOWLEDGE_LEVEL;
use crate::models::sm2::preview_intervals;
use crate::models::user::MAX_DAILY_GOAL;
use crate::models::{
    Flashcard, KnowledgeFilter, Language, NewFlashcard, Onboarding, OnboardingStep, Proficiency,
    Quality, Session, Stats, StudySession, UserProfile,
};
use crate::services::{ImageClient, ImageHit, SpeechSynthesizer, TranslationClient};
use chrono::{DateTime, Local, Utc};
use crossbeam_channel::Receiver;
use eframe::egui;

/// Application screen states
#[derive(Default, PartialEq)]
enum AppScreen {
    #[default]
    Login,
    Register,
    Onboarding,
    Main,
    Study,
    Profile,
}

/// Form state of the card editor.
#[derive(Default)]
struct CardEditor {
    editing_id: Option<i64>,
    original_word: String,
    translation: String,
    notes: String,
    image_url: String,
    image_hits: Vec<ImageHit>,
}

impl CardEditor {
    fn load(card: &Flashcard) -> Self {
        Self {
            editing_id: Some(card.id),
            original_word: card.original_word.clone(),
            translation: card.translation.clone(),
            notes: card.notes.clone().unwrap_or_default(),
            image_url: card.image_url.clone().unwrap_or_default(),
            image_hits: Vec::new(),
        }
    }

    fn to_new_flashcard(&self, profile: &UserProfile) -> NewFlashcard {
        NewFlashcard {
            image_url: Some(self.image_url.clone()),
            notes: Some(self.notes.clone()),
            ..NewFlashcard::new(
                self.original_word.clone(),
                self.translation.clone(),
                profile.learning_language,
                profile.native_language,
            )
        }
    }
}

/// Main application state
pub struct MyApp {
    show_confirmation_dialog: bool,
    allowed_to_close: bool,
    conn: SharedConnection,
    auth: LocalIdentityProvider,
    auth_events: Receiver<AuthEvent>,
    session: Option<Session>,
    i18n: I18n,
    translator: Option<TranslationClient>,
    images: Option<ImageClient>,
    speech: Box<dyn SpeechSynthesizer>,

    current_screen: AppScreen,
    email: String,
    password: String,
    display_name: String,
    onboarding: Onboarding,
    profile_draft: UserProfile,

    cards: Vec<Flashcard>,
    filter: KnowledgeFilter,
    editor: CardEditor,
    study_session: Option<StudySession>,

    status_message: Option<String>,
}

/// Formats a review date in local time as YYYY-MM-DD
fn format_date(time: DateTime<Utc>) -> String {
    let local: DateTime<Local> = time.into();
    local.format("%Y-%m-%d").to_string()
}

fn stars(level: u8) -> String {
    let filled = level.min(MAX_KNOWLEDGE_LEVEL) as usize;
    format!(
        "{}{}",
        "★".repeat(filled),
        "☆".repeat(MAX_KNOWLEDGE_LEVEL as usize - filled)
    )
}

fn language_combo(ui: &mut egui::Ui, id: &str, value: &mut Language, options: &[Language]) {
    egui::ComboBox::from_id_salt(id)
        .selected_text(value.native_name())
        .show_ui(ui, |ui| {
            for lang in options {
                ui.selectable_value(value, *lang, lang.native_name());
            }
        });
}

impl eframe::App for MyApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_auth_events();

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            let mut dismiss = false;
            if let Some(message) = &self.status_message {
                ui.horizontal(|ui| {
                    ui.label(message);
                    if ui.small_button("✖").clicked() {
                        dismiss = true;
                    }
                });
            }
            if dismiss {
                self.status_message = None;
            }
        });

        match self.current_screen {
            AppScreen::Login | AppScreen::Register => self.render_auth_screen(ctx),
            AppScreen::Onboarding => self.render_onboarding_screen(ctx),
            AppScreen::Main => self.render_main_screen(ctx),
            AppScreen::Study => self.render_study_screen(ctx),
            AppScreen::Profile => self.render_profile_screen(ctx),
        }

        // Handle window close requests with confirmation dialog
        if ctx.input(|i| i.viewport().close_requested()) && !self.allowed_to_close {
            ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
            self.show_confirmation_dialog = true;
        }

        if self.show_confirmation_dialog {
            egui::Window::new(self.i18n.t("app.quit_question"))
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.horizontal(|ui| {
                        if ui.button(self.i18n.t("common.no")).clicked() {
                            self.show_confirmation_dialog = false;
                            self.allowed_to_close = false;
                        }

                        if ui.button(self.i18n.t("common.yes")).clicked() {
                            self.show_confirmation_dialog = false;
                            self.allowed_to_close = true;
                            self.speech.cancel();
                            ui.ctx().send_viewport_cmd(egui::ViewportCommand::Close);
                        }
                    });
                });
        }
    }
}

impl MyApp {
    /// Creates the application around an open database connection.
    pub fn new(conn: SharedConnection, config: &AppConfig) -> Result<Self> {
        let mut auth = LocalIdentityProvider::new(conn.clone());
        let auth_events = auth.subscribe();

        let i18n = I18n::new(config.ui.language)?;

        let translator = TranslationClient::new(&config.translation)
            .inspect_err(|e| log::warn!("Translation disabled: {e}"))
            .ok();
        let images = ImageClient::new(&config.images)
            .inspect_err(|e| log::warn!("Image lookup disabled: {e}"))
            .ok()
            .filter(ImageClient::is_enabled);

        Ok(Self {
            show_confirmation_dialog: false,
            allowed_to_close: false,
            conn,
            auth,
            auth_events,
            session: None,
            i18n,
            translator,
            images,
            speech: crate::services::speech_from_config(&config.speech),
            current_screen: AppScreen::Login,
            email: String::new(),
            password: String::new(),
            display_name: String::new(),
            onboarding: Onboarding::default(),
            profile_draft: UserProfile::default(),
            cards: Vec::new(),
            filter: KnowledgeFilter::default(),
            editor: CardEditor::default(),
            study_session: None,
            status_message: None,
        })
    }

    /// Shows a non-fatal error; `key` names the failed action in the catalog.
    fn report(&mut self, key: &str, err: impl std::fmt::Display) {
        let context = self.i18n.t(key).to_string();
        log::warn!("{context}: {err}");
        self.status_message = Some(format!("{context}: {err}"));
    }

    /// Builds or drops the session in response to sign-in changes.
    fn handle_auth_events(&mut self) {
        while let Ok(event) = self.auth_events.try_recv() {
            match event {
                AuthEvent::SignedIn(user) => match open_session(user, &self.conn) {
                    Ok(session) => {
                        self.i18n.set_language(session.profile.interface_language);
                        self.current_screen = if session.needs_onboarding() {
                            self.onboarding = Onboarding {
                                draft: session.profile.clone(),
                                ..Default::default()
                            };
                            AppScreen::Onboarding
                        } else {
                            AppScreen::Main
                        };
                        self.session = Some(session);
                        self.reload_cards();
                    }
                    Err(e) => {
                        self.report("error.session", e);
                        self.auth.logout();
                    }
                },
                AuthEvent::SignedOut => {
                    self.speech.cancel();
                    self.session = None;
                    self.study_session = None;
                    self.cards.clear();
                    self.editor = CardEditor::default();
                    self.current_screen = AppScreen::Login;
                }
            }
        }
    }

    fn reload_cards(&mut self) {
        let Some(session) = &self.session else {
            return;
        };
        let result = lock(&self.conn).and_then(|conn| db::list_flashcards(session.user_id(), &conn));
        match result {
            Ok(cards) => self.cards = cards,
            Err(e) => self.report("error.load_cards", e),
        }
    }

    /// Renders the sign-in and registration forms
    fn render_auth_screen(&mut self, ctx: &egui::Context) {
        let registering = self.current_screen == AppScreen::Register;
        let mut action_submit = false;
        let mut action_switch = false;

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(40.0);
                ui.heading(self.i18n.t("app.title"));
                ui.add_space(20.0);
            });

            egui::Grid::new("auth_form").num_columns(2).show(ui, |ui| {
                ui.label(self.i18n.t("auth.email"));
                ui.text_edit_singleline(&mut self.email);
                ui.end_row();

                ui.label(self.i18n.t("auth.password"));
                let response = ui.add(egui::TextEdit::singleline(&mut self.password).password(true));
                if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                    action_submit = true;
                }
                ui.end_row();

                if registering {
                    ui.label(self.i18n.t("auth.display_name"));
                    ui.text_edit_singleline(&mut self.display_name);
                    ui.end_row();
                }
            });

            ui.add_space(10.0);
            ui.horizontal(|ui| {
                let submit = if registering { "auth.register" } else { "auth.login" };
                if ui.button(self.i18n.t(submit)).clicked() {
                    action_submit = true;
                }
                let switch = if registering { "auth.have_account" } else { "auth.no_account" };
                if ui.link(self.i18n.t(switch)).clicked() {
                    action_switch = true;
                }
            });
        });

        if action_switch {
            self.current_screen = if registering { AppScreen::Login } else { AppScreen::Register };
            self.status_message = None;
        }
        if action_submit {
            let result = if registering {
                self.auth.register(&self.email, &self.password, &self.display_name)
            } else {
                self.auth.login(&self.email, &self.password)
            };
            self.password.clear();
            match result {
                Ok(_) => {
                    self.status_message = None;
                    self.display_name.clear();
                }
                Err(e) => self.report("error.auth", e),
            }
        }
    }

    /// Renders the step-by-step onboarding flow
    fn render_onboarding_screen(&mut self, ctx: &egui::Context) {
        let mut action_next = false;
        let mut action_back = false;

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading(self.i18n.t("onboarding.title"));
            ui.separator();
            let draft = &mut self.onboarding.draft;

            match self.onboarding.step {
                OnboardingStep::Languages => {
                    ui.label(self.i18n.t("onboarding.native_language"));
                    language_combo(ui, "native_language", &mut draft.native_language, &Language::ALL);
                    ui.label(self.i18n.t("onboarding.learning_language"));
                    language_combo(ui, "learning_language", &mut draft.learning_language, &Language::ALL);
                    ui.label(self.i18n.t("onboarding.interface_language"));
                    language_combo(
                        ui,
                        "interface_language",
                        &mut draft.interface_language,
                        &supported_languages(),
                    );
                }
                OnboardingStep::Level => {
                    ui.label(self.i18n.t("onboarding.level"));
                    for level in Proficiency::ALL {
                        let text = format!("{} ({})", self.i18n.t(level.label_key()), level.cefr());
                        ui.radio_value(&mut draft.proficiency, level, text);
                    }
                }
                OnboardingStep::DailyGoal => {
                    ui.label(self.i18n.t("onboarding.daily_goal"));
                    ui.add(egui::DragValue::new(&mut draft.daily_goal).range(1..=MAX_DAILY_GOAL));
                }
                OnboardingStep::Done => {}
            }

            ui.add_space(20.0);
            ui.horizontal(|ui| {
                if self.onboarding.step != OnboardingStep::Languages
                    && ui.button(self.i18n.t("common.back")).clicked()
                {
                    action_back = true;
                }
                if ui.button(self.i18n.t("common.next")).clicked() {
                    action_next = true;
                }
            });
        });

        if action_back {
            self.onboarding.back();
        }
        if action_next {
            if let Err(e) = self.onboarding.advance() {
                self.report("error.onboarding", e);
                return;
            }
            if let Some(profile) = self.onboarding.finish() {
                self.save_profile(profile);
            }
        }
    }

    fn save_profile(&mut self, profile: UserProfile) {
        let Some(session) = &mut self.session else {
            return;
        };
        let result =
            lock(&self.conn).and_then(|conn| users::save_profile(session.user_id(), &profile, &conn));
        match result {
            Ok(()) => {
                self.i18n.set_language(profile.interface_language);
                session.profile = profile;
                self.current_screen = AppScreen::Main;
                self.status_message = Some(self.i18n.t("profile.saved").to_string());
            }
            Err(e) => self.report("error.profile", e),
        }
    }

    /// Renders the main screen with the card editor and card list
    fn render_main_screen(&mut self, ctx: &egui::Context) {
        let Some(session) = self.session.clone() else {
            self.current_screen = AppScreen::Login;
            return;
        };
        let now = Utc::now();
        let stats = Stats::collect(&self.cards, now);

        let mut action_study = false;
        let mut action_profile = false;
        let mut action_logout = false;
        let mut action_export = false;
        let mut action_import = false;
        let mut action_translate = false;
        let mut action_images = false;
        let mut action_save = false;
        let mut action_cancel_edit = false;
        let mut action_edit: Option<usize> = None;
        let mut action_delete: Option<i64> = None;
        let mut action_speak: Option<usize> = None;

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(self.i18n.tf("main.greeting", &[("name", &session.user.display_name)]));
                ui.label(format!(
                    "{} → {}",
                    session.profile.learning_language, session.profile.native_language
                ));
                if ui.button(self.i18n.t("main.profile")).clicked() {
                    action_profile = true;
                }
                if ui.button(self.i18n.t("auth.logout")).clicked() {
                    action_logout = true;
                }
            });
            ui.separator();

            ui.horizontal(|ui| {
                ui.label(self.i18n.tf(
                    "main.stats",
                    &[("total", &stats.total), ("due", &stats.due), ("new", &stats.new)],
                ));
                if ui
                    .add_enabled(stats.due > 0, egui::Button::new(self.i18n.t("main.study")))
                    .clicked()
                {
                    action_study = true;
                }
                if ui.button(self.i18n.t("main.export")).clicked() {
                    action_export = true;
                }
                if ui.button(self.i18n.t("main.import")).clicked() {
                    action_import = true;
                }
            });
            ui.horizontal(|ui| {
                for level in 1..=MAX_KNOWLEDGE_LEVEL {
                    ui.label(format!("{} {}", stars(level), stats.count_for_level(level)));
                }
            });

            ui.separator();

            // Card editor
            let heading = if self.editor.editing_id.is_some() { "editor.edit" } else { "editor.new" };
            ui.heading(self.i18n.t(heading));
            egui::Grid::new("card_editor").num_columns(2).show(ui, |ui| {
                ui.label(format!(
                    "{} ({})",
                    self.i18n.t("editor.original"),
                    session.profile.learning_language
                ));
                ui.horizontal(|ui| {
                    ui.text_edit_singleline(&mut self.editor.original_word);
                    if ui
                        .add_enabled(
                            self.translator.is_some(),
                            egui::Button::new(self.i18n.t("editor.translate")),
                        )
                        .clicked()
                    {
                        action_translate = true;
                    }
                });
                ui.end_row();

                ui.label(format!(
                    "{} ({})",
                    self.i18n.t("editor.translation"),
                    session.profile.native_language
                ));
                ui.text_edit_singleline(&mut self.editor.translation);
                ui.end_row();

                ui.label(self.i18n.t("editor.notes"));
                ui.text_edit_singleline(&mut self.editor.notes);
                ui.end_row();

                ui.label(self.i18n.t("editor.image"));
                ui.horizontal(|ui| {
                    ui.text_edit_singleline(&mut self.editor.image_url);
                    if self.images.is_some() && ui.button(self.i18n.t("editor.find_image")).clicked()
                    {
                        action_images = true;
                    }
                });
                ui.end_row();
            });

            if !self.editor.image_hits.is_empty() {
                let mut picked: Option<String> = None;
                ui.horizontal_wrapped(|ui| {
                    for hit in &self.editor.image_hits {
                        let label = if hit.tags.is_empty() { hit.preview_url.as_str() } else { hit.tags.as_str() };
                        if ui.button(label).on_hover_text(hit.webformat_url.as_str()).clicked() {
                            picked = Some(hit.webformat_url.clone());
                        }
                    }
                });
                if let Some(url) = picked {
                    self.editor.image_url = url;
                    self.editor.image_hits.clear();
                }
            }

            ui.horizontal(|ui| {
                if ui.button(self.i18n.t("editor.save")).clicked() {
                    action_save = true;
                }
                if self.editor.editing_id.is_some() && ui.button(self.i18n.t("common.cancel")).clicked() {
                    action_cancel_edit = true;
                }
            });

            ui.separator();

            ui.horizontal(|ui| {
                for filter in KnowledgeFilter::ALL {
                    ui.selectable_value(&mut self.filter, filter, self.i18n.t(filter.label_key()));
                }
            });

            egui::ScrollArea::vertical()
                .id_salt("flashcards_list")
                .show(ui, |ui| {
                    for (i, card) in self.cards.iter().enumerate() {
                        if !self.filter.matches(card, now) {
                            continue;
                        }
                        ui.group(|ui| {
                            ui.horizontal(|ui| {
                                ui.strong(card.original_word.as_str());
                                ui.label("→");
                                ui.label(&card.translation);
                                ui.label(stars(card.review.knowledge_level));
                            });
                            ui.horizontal(|ui| {
                                ui.small(self.i18n.tf(
                                    "main.next_review",
                                    &[("date", &format_date(card.review.next_review))],
                                ));
                                if let Some(url) = &card.image_url {
                                    ui.hyperlink_to("🖼", url);
                                }
                                if ui.small_button("🔊").clicked() {
                                    action_speak = Some(i);
                                }
                                if ui.small_button(self.i18n.t("main.edit")).clicked() {
                                    action_edit = Some(i);
                                }
                                if ui.small_button(self.i18n.t("main.delete")).clicked() {
                                    action_delete = Some(card.id);
                                }
                            });
                        });
                    }
                });
        });

        // Execute deferred actions
        if let Some(i) = action_speak {
            if let Some(card) = self.cards.get(i) {
                self.speech.speak(&card.original_word, card.source_language);
            }
        }
        if let Some(i) = action_edit {
            if let Some(card) = self.cards.get(i) {
                self.editor = CardEditor::load(card);
            }
        }
        if action_cancel_edit {
            self.editor = CardEditor::default();
        }
        if action_translate {
            self.handle_translate(&session.profile);
        }
        if action_images {
            self.handle_image_lookup();
        }
        if action_save {
            self.handle_save_card(&session);
        }
        if let Some(id) = action_delete {
            self.handle_delete(&session, id);
        }
        if action_study {
            self.start_study_session(&session);
        }
        if action_export {
            self.handle_export(&session);
        }
        if action_import {
            self.handle_import(&session);
        }
        if action_profile {
            self.profile_draft = session.profile.clone();
            self.current_screen = AppScreen::Profile;
        }
        if action_logout {
            self.auth.logout();
        }
    }

    fn handle_translate(&mut self, profile: &UserProfile) {
        let Some(translator) = &self.translator else {
            return;
        };
        match translator.suggest(
            &self.editor.original_word,
            profile.learning_language,
            profile.native_language,
        ) {
            Some(translation) => self.editor.translation = translation,
            None => self.status_message = Some(self.i18n.t("editor.translate_failed").to_string()),
        }
    }

    fn handle_image_lookup(&mut self) {
        let Some(images) = &self.images else {
            return;
        };
        let query = if self.editor.translation.trim().is_empty() {
            &self.editor.original_word
        } else {
            &self.editor.translation
        };
        self.editor.image_hits = images.suggest(query);
        if self.editor.image_hits.is_empty() {
            self.status_message = Some(self.i18n.t("editor.no_images").to_string());
        }
    }

    fn handle_save_card(&mut self, session: &Session) {
        let input = self.editor.to_new_flashcard(&session.profile);
        let result = lock(&self.conn).and_then(|conn| match self.editor.editing_id {
            Some(id) => db::update_flashcard_content(session.user_id(), id, &input, &conn),
            None => db::add_flashcard(session.user_id(), &input, Utc::now(), &conn),
        });
        match result {
            Ok(card) => {
                self.status_message = Some(self.i18n.tf("editor.saved", &[("word", &card.original_word)]));
                self.editor = CardEditor::default();
                self.reload_cards();
            }
            Err(e) => self.report("error.save_card", e),
        }
    }

    fn handle_delete(&mut self, session: &Session, id: i64) {
        let result = lock(&self.conn).and_then(|conn| db::delete_flashcard(session.user_id(), id, &conn));
        match result {
            Ok(()) => {
                if self.editor.editing_id == Some(id) {
                    self.editor = CardEditor::default();
                }
                self.reload_cards();
            }
            Err(e) => self.report("error.delete_card", e),
        }
    }

    /// Starts a study session with cards due for review
    fn start_study_session(&mut self, session: &Session) {
        match StudySession::start(
            session.user_id().clone(),
            session.profile.daily_goal as usize,
            Utc::now(),
            self.conn.clone(),
        ) {
            Ok(Some(study)) => {
                self.study_session = Some(study);
                self.current_screen = AppScreen::Study;
            }
            Ok(None) => self.status_message = Some(self.i18n.t("study.nothing_due").to_string()),
            Err(e) => self.report("error.study", e),
        }
    }

    /// Renders the study screen with the card review interface
    fn render_study_screen(&mut self, ctx: &egui::Context) {
        let mut action_back = false;
        let mut action_grade_error: Option<String> = None;

        egui::CentralPanel::default().show(ctx, |ui| {
            let Some(study) = &mut self.study_session else {
                action_back = true;
                return;
            };
            let i18n = &self.i18n;

            let round_key = if study.is_retry_round() { "study.retry_round" } else { "study.round" };
            ui.heading(i18n.tf(
                round_key,
                &[("round", &study.round_number), ("count", &study.total_count())],
            ));
            ui.label(i18n.tf(
                "study.progress",
                &[
                    ("learned", &study.learned_count()),
                    ("total", &study.total_count()),
                    ("remaining", &study.remaining_count()),
                ],
            ));
            ui.add_space(20.0);

            if study.is_completed() {
                ui.heading(i18n.t("study.done_title"));
                ui.label(i18n.tf("study.done", &[("count", &study.graded_count)]));
                ui.add_space(20.0);
                if ui.button(i18n.t("study.back")).clicked() {
                    action_back = true;
                }
                return;
            }

            let Some(card) = study.current_card() else {
                return;
            };
            // Clone values to avoid borrowing issues
            let show_translation = study.show_translation;
            let is_learned = card.is_learned;
            let flashcard = card.flashcard.clone();

            ui.group(|ui| {
                ui.set_min_height(200.0);
                ui.vertical_centered(|ui| {
                    ui.add_space(20.0);
                    ui.heading(flashcard.original_word.as_str());
                    ui.label(stars(flashcard.review.knowledge_level));
                    ui.add_space(20.0);
                    if show_translation {
                        ui.heading(flashcard.translation.as_str());
                        if let Some(notes) = &flashcard.notes {
                            ui.label(notes);
                        }
                        if let Some(url) = &flashcard.image_url {
                            ui.hyperlink_to(i18n.t("study.image"), url);
                        }
                    } else {
                        ui.label(i18n.t("study.reveal_hint"));
                    }
                    ui.add_space(20.0);
                });
            });

            ui.add_space(20.0);

            // Store actions to execute after UI rendering
            let mut action_toggle = false;
            let mut action_grade: Option<u8> = None;
            let mut action_speak = false;

            ui.horizontal(|ui| {
                if !show_translation && ui.button(i18n.t("study.reveal")).clicked() {
                    action_toggle = true;
                }
                if ui.button("🔊").clicked() {
                    action_speak = true;
                }
            });

            // Quality rating buttons (0-5), only after revealing the translation
            if show_translation && !is_learned {
                let preview = preview_intervals(&flashcard.review, Utc::now());
                ui.label(i18n.t("study.rate"));
                for row in [[0u8, 1, 2], [3, 4, 5]] {
                    ui.horizontal(|ui| {
                        for grade in row {
                            let text = format!(
                                "{grade} - {} ({})",
                                i18n.t(&format!("quality.{grade}")),
                                i18n.tf("study.days", &[("days", &preview[grade as usize])]),
                            );
                            if ui.button(text).clicked() {
                                action_grade = Some(grade);
                            }
                        }
                    });
                }
            }

            ui.add_space(20.0);
            if ui.button(i18n.t("study.back")).clicked() {
                action_back = true;
            }

            // Execute deferred actions
            if action_toggle {
                study.toggle_translation();
            }
            if action_speak {
                self.speech.speak(&flashcard.original_word, flashcard.source_language);
            }
            if let Some(grade) = action_grade {
                let graded = Quality::try_from(grade)
                    .and_then(|quality| study.grade_current_card(quality, Utc::now()));
                match graded {
                    Ok(()) => study.next_card(),
                    Err(e) => action_grade_error = Some(e.to_string()),
                }
            }
        });

        if let Some(e) = action_grade_error {
            self.report("error.grade", e);
        }
        if action_back {
            self.speech.cancel();
            self.study_session = None;
            self.current_screen = AppScreen::Main;
            self.reload_cards();
        }
    }

    /// Renders profile editing
    fn render_profile_screen(&mut self, ctx: &egui::Context) {
        let mut action_save = false;
        let mut action_back = false;

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading(self.i18n.t("profile.title"));
            if let Some(session) = &self.session {
                ui.label(&session.user.email);
            }
            ui.separator();

            let draft = &mut self.profile_draft;
            egui::Grid::new("profile_form").num_columns(2).show(ui, |ui| {
                ui.label(self.i18n.t("onboarding.native_language"));
                language_combo(ui, "profile_native", &mut draft.native_language, &Language::ALL);
                ui.end_row();

                ui.label(self.i18n.t("onboarding.learning_language"));
                language_combo(ui, "profile_learning", &mut draft.learning_language, &Language::ALL);
                ui.end_row();

                ui.label(self.i18n.t("onboarding.interface_language"));
                language_combo(
                    ui,
                    "profile_interface",
                    &mut draft.interface_language,
                    &supported_languages(),
                );
                ui.end_row();

                ui.label(self.i18n.t("onboarding.level"));
                egui::ComboBox::from_id_salt("profile_level")
                    .selected_text(self.i18n.t(draft.proficiency.label_key()))
                    .show_ui(ui, |ui| {
                        for level in Proficiency::ALL {
                            ui.selectable_value(&mut draft.proficiency, level, self.i18n.t(level.label_key()));
                        }
                    });
                ui.end_row();

                ui.label(self.i18n.t("onboarding.daily_goal"));
                ui.add(egui::DragValue::new(&mut draft.daily_goal).range(1..=MAX_DAILY_GOAL));
                ui.end_row();
            });

            ui.add_space(20.0);
            ui.horizontal(|ui| {
                if ui.button(self.i18n.t("editor.save")).clicked() {
                    action_save = true;
                }
                if ui.button(self.i18n.t("common.back")).clicked() {
                    action_back = true;
                }
            });
        });

        if action_save {
            let profile = UserProfile {
                onboarding_completed: true,
                ..self.profile_draft.clone()
            };
            self.save_profile(profile);
        }
        if action_back {
            self.current_screen = AppScreen::Main;
        }
    }

    /// Handles export of the user's cards to a JSON file
    fn handle_export(&mut self, session: &Session) {
        let Some(path) = rfd::FileDialog::new()
            .set_file_name("flashcards.json")
            .add_filter("JSON files", &["json"])
            .save_file()
        else {
            return;
        };
        let result = lock(&self.conn).and_then(|conn| export_owner(session.user_id(), &path, &conn));
        match result {
            Ok(count) => self.status_message = Some(self.i18n.tf("main.exported", &[("count", &count)])),
            Err(e) => self.report("error.export", e),
        }
    }

    /// Handles import of cards from a JSON file
    fn handle_import(&mut self, session: &Session) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("JSON files", &["json"])
            .pick_file()
        else {
            return;
        };
        let result = import_json(&path).and_then(|file| {
            let conn = lock(&self.conn)?;
            import_into(session.user_id(), file, Utc::now(), &conn)
        });
        match result {
            Ok(summary) => {
                self.status_message = Some(self.i18n.tf(
                    "main.imported",
                    &[("imported", &summary.imported), ("skipped", &summary.skipped)],
                ));
                self.reload_cards();
            }
            Err(e) => self.report("error.import", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stars() {
        assert_eq!(stars(1), "★☆☆☆☆");
        assert_eq!(stars(3), "★★★☆☆");
        assert_eq!(stars(9), "★★★★★");
    }

    #[test]
    fn test_editor_builds_card_for_profile_languages() {
        let profile = UserProfile {
            native_language: Language::Polish,
            learning_language: Language::Spanish,
            ..UserProfile::default()
        };
        let editor = CardEditor {
            original_word: "perro".to_string(),
            translation: "pies".to_string(),
            ..Default::default()
        };
        let card = editor.to_new_flashcard(&profile).validated().unwrap();
        assert_eq!(card.source_language, Language::Spanish);
        assert_eq!(card.target_language, Language::Polish);
        assert_eq!(card.notes, None);
    }
}
