//! The menu, edit and authentication state machine.
//!
//! One task owns the whole interaction: it polls the keypad once per tick,
//! feeds keys through the state machine, and renders every screen. All
//! mutable state lives in the [`Menu`] struct passed by exclusive reference
//! through the loop; the only cross-task flag is [`MENU_ACTIVE`], which the
//! idle display task observes.

use core::fmt::Write as _;
use core::sync::atomic::{AtomicBool, Ordering};

use defmt::{info, warn};
use embassy_executor::task;
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::mutex::MutexGuard;
use embassy_time::{Duration, Instant, Ticker, Timer};

use panel_core::auth::{Attempt, AuthSession};
use panel_core::edit::EditBuffer;
use panel_core::format::{cursor_offset, format_for_display};
use panel_core::params::{PARAMETERS, PASSWORD_INDEX, Rules, TIME_INDEX, next_index, prev_index};
use panel_core::validate::validate;

use crate::DISPLAY;
use crate::config::{
    ERROR_NOTICE_MS, INACTIVITY_TIMEOUT_MS, LCD_COLS, MENU_TICK_MS, RETRY_NOTICE_MS, RTC_SETTLE_MS,
    SAVED_NOTICE_MS, TIMEOUT_NOTICE_MS,
};
use crate::devices::eeprom::Eeprom24c32;
use crate::devices::keypad::{Key, Keypad};
use crate::devices::lcd::Lcd;
use crate::devices::rtc::Ds1307;
use crate::storage::ParamStore;

/// Set while the menu owns the display; the idle display task stays away.
pub static MENU_ACTIVE: AtomicBool = AtomicBool::new(false);

/// Column where the value starts on the second row ("Val: " prefix).
const VALUE_COL: usize = 5;

type Line = heapless::String<{ LCD_COLS as usize }>;

#[derive(Clone, Copy, PartialEq, Eq, Debug, defmt::Format)]
enum MenuState {
    Idle,
    PasswordEntry,
    LockedOut,
    Browsing,
    Editing,
}

struct Menu {
    state: MenuState,
    param_index: usize,
    /// Keystrokes for the parameter being edited.
    edit: EditBuffer,
    /// Keystrokes for the password prompt.
    entry: EditBuffer,
    auth: AuthSession,
    last_activity: Instant,
    /// Last countdown second drawn, to avoid rewriting an unchanged line.
    shown_countdown: Option<u32>,
    store: ParamStore,
}

#[task]
pub async fn menu_task(mut keypad: Keypad, rtc: Ds1307, eeprom: Eeprom24c32) {
    info!("Starting menu task");

    let mut store = ParamStore::new(rtc, eeprom);
    store.init().await;

    let mut menu = Menu {
        state: MenuState::Idle,
        param_index: 0,
        edit: EditBuffer::new(),
        entry: EditBuffer::new(),
        auth: AuthSession::new(),
        last_activity: Instant::now(),
        shown_countdown: None,
        store,
    };

    let mut ticker = Ticker::every(Duration::from_millis(MENU_TICK_MS));

    info!("Menu task initialized");

    loop {
        ticker.next().await;
        let now = Instant::now();

        if menu.state != MenuState::Idle
            && now - menu.last_activity >= Duration::from_millis(INACTIVITY_TIMEOUT_MS)
        {
            menu.timeout().await;
            continue;
        }

        if menu.state == MenuState::LockedOut {
            menu.tick_lockout(now).await;
        }

        let Some(key) = keypad.scan().await else {
            continue;
        };
        menu.last_activity = now;
        menu.handle_key(key, now).await;
    }
}

async fn lcd() -> MutexGuard<'static, NoopRawMutex, Lcd> {
    DISPLAY.get().await.lock().await
}

impl Menu {
    fn password_rules() -> &'static Rules {
        &PARAMETERS[PASSWORD_INDEX].rules
    }

    async fn handle_key(&mut self, key: Key, now: Instant) {
        match self.state {
            MenuState::Idle => {
                if key == Key::A {
                    self.enter_menu().await;
                }
            }
            MenuState::PasswordEntry => self.handle_password_key(key, now).await,
            // Input is ignored during lockout; only the countdown runs.
            MenuState::LockedOut => {}
            MenuState::Browsing | MenuState::Editing => self.handle_browse_edit(key).await,
        }
    }

    async fn enter_menu(&mut self) {
        MENU_ACTIVE.store(true, Ordering::Relaxed);
        self.param_index = 0;

        if self.store.password_enabled() {
            info!("menu entry, password required");
            self.state = MenuState::PasswordEntry;
            self.entry.clear();
            self.auth.reset();
            let mut lcd = lcd().await;
            render_password_prompt(&mut lcd, "").await;
        } else {
            info!("menu entry");
            self.auth.grant();
            self.state = MenuState::Browsing;
            self.show_current_param().await;
        }
    }

    async fn exit_menu(&mut self) {
        info!("menu exit");
        self.reset_session();
        let mut lcd = lcd().await;
        lcd.show_cursor(false).await;
        lcd.clear().await;
        MENU_ACTIVE.store(false, Ordering::Relaxed);
    }

    /// Inactivity fired: abandon everything and fall back to the idle
    /// screen.
    async fn timeout(&mut self) {
        info!("menu inactivity timeout");
        self.reset_session();
        let mut lcd = lcd().await;
        lcd.show_cursor(false).await;
        lcd.clear().await;
        lcd.set_cursor(0, 0).await;
        lcd.print("Timeout").await;
        lcd.set_cursor(1, 0).await;
        lcd.print("Back to idle").await;
        Timer::after_millis(TIMEOUT_NOTICE_MS).await;
        lcd.clear().await;
        MENU_ACTIVE.store(false, Ordering::Relaxed);
    }

    fn reset_session(&mut self) {
        self.state = MenuState::Idle;
        self.auth.reset();
        self.edit.clear();
        self.entry.clear();
        self.shown_countdown = None;
        self.last_activity = Instant::now();
    }

    /// Lockout housekeeping, run every tick while locked.
    async fn tick_lockout(&mut self, now: Instant) {
        let rules = Self::password_rules();

        if self.auth.poll_lockout(rules, now.as_millis()) {
            info!("lockout expired");
            self.state = MenuState::PasswordEntry;
            self.shown_countdown = None;
            self.entry.clear();
            self.last_activity = now;
            let mut lcd = lcd().await;
            lcd.clear().await;
            lcd.set_cursor(0, 0).await;
            lcd.print("Lockout ended").await;
            Timer::after_millis(SAVED_NOTICE_MS).await;
            render_password_prompt(&mut lcd, "").await;
            return;
        }

        if let Some(remaining) = self.auth.lockout_remaining_secs(rules, now.as_millis()) {
            if self.shown_countdown != Some(remaining) {
                self.shown_countdown = Some(remaining);
                let mut line = Line::new();
                let _ = write!(line, "Locked: {}s", remaining);
                pad_line(&mut line);
                let mut lcd = lcd().await;
                lcd.set_cursor(0, 0).await;
                lcd.print(line.as_str()).await;
            }
        }
    }

    async fn handle_password_key(&mut self, key: Key, now: Instant) {
        let rules = Self::password_rules();
        match key {
            Key::Digit(digit) => {
                if self.entry.push_digit(digit, rules) {
                    let mut lcd = lcd().await;
                    render_password_entry(&mut lcd, self.entry.as_str()).await;
                }
            }
            Key::D => {
                if self.entry.backspace() {
                    let mut lcd = lcd().await;
                    render_password_entry(&mut lcd, self.entry.as_str()).await;
                }
            }
            Key::Hash => self.submit_password(now).await,
            Key::A => self.exit_menu().await,
            _ => {}
        }
    }

    async fn submit_password(&mut self, now: Instant) {
        let rules = Self::password_rules();
        let outcome = self
            .auth
            .submit(self.entry.as_str(), self.store.password(), rules, now.as_millis());
        self.entry.clear();

        match outcome {
            Attempt::Granted => {
                info!("password accepted");
                {
                    let mut lcd = lcd().await;
                    lcd.show_cursor(false).await;
                    lcd.clear().await;
                    lcd.set_cursor(0, 0).await;
                    lcd.print("Access Granted").await;
                    Timer::after_millis(SAVED_NOTICE_MS).await;
                }
                self.state = MenuState::Browsing;
                self.param_index = 0;
                self.show_current_param().await;
            }
            Attempt::Rejected { attempt, max } => {
                warn!("wrong password, attempt {}/{}", attempt, max);
                let mut line = Line::new();
                let _ = write!(line, "Retry {}/{}", attempt, max);
                let mut lcd = lcd().await;
                lcd.show_cursor(false).await;
                lcd.clear().await;
                lcd.set_cursor(0, 0).await;
                lcd.print("Wrong Password!").await;
                lcd.set_cursor(1, 0).await;
                lcd.print(line.as_str()).await;
                Timer::after_millis(RETRY_NOTICE_MS).await;
                render_password_prompt(&mut lcd, "").await;
            }
            Attempt::LockedOut { remaining_secs } => {
                warn!("max retries reached, locked for {}s", remaining_secs);
                self.state = MenuState::LockedOut;
                self.shown_countdown = None;
                let mut line = Line::new();
                let _ = write!(line, "Locked for {}s", remaining_secs);
                let mut lcd = lcd().await;
                lcd.show_cursor(false).await;
                lcd.clear().await;
                lcd.set_cursor(0, 0).await;
                lcd.print("Max retries").await;
                lcd.set_cursor(1, 0).await;
                lcd.print(line.as_str()).await;
            }
        }
    }

    async fn handle_browse_edit(&mut self, key: Key) {
        let spec = ParamStore::spec(self.param_index);
        match key {
            Key::A => self.exit_menu().await,
            Key::B => {
                self.param_index = prev_index(self.param_index);
                self.state = MenuState::Browsing;
                self.show_current_param().await;
            }
            Key::C => {
                self.param_index = next_index(self.param_index);
                self.state = MenuState::Browsing;
                self.show_current_param().await;
            }
            Key::Digit(digit) => {
                if self.edit.push_digit(digit, &spec.rules) {
                    self.state = MenuState::Editing;
                    self.render_edit().await;
                }
            }
            Key::Star => {
                // Decimal point for decimal parameters, sign toggle where
                // negatives are allowed; dead key everywhere else.
                if self.edit.push_decimal_point(spec.kind, &spec.rules)
                    || self.edit.toggle_sign(&spec.rules)
                {
                    self.state = MenuState::Editing;
                    self.render_edit().await;
                }
            }
            Key::D => {
                if self.state == MenuState::Editing {
                    if self.edit.backspace() && self.edit.is_empty() {
                        // Deleted to empty: the edit is abandoned.
                        self.state = MenuState::Browsing;
                        self.show_current_param().await;
                    } else if !self.edit.is_empty() {
                        self.render_edit().await;
                    }
                } else {
                    // First delete keystroke opens an empty edit line.
                    self.state = MenuState::Editing;
                    self.render_edit().await;
                }
            }
            Key::Hash => {
                if self.state == MenuState::Editing && !self.edit.is_empty() {
                    self.submit_edit().await;
                }
            }
        }
    }

    async fn submit_edit(&mut self) {
        let index = self.param_index;
        let spec = ParamStore::spec(index);
        let was_time = index == TIME_INDEX;
        let result = validate(spec, self.edit.as_str());
        self.edit.clear();

        match result {
            Ok(canonical) => {
                info!("{} = {}", spec.label, canonical.as_str());
                self.store.set_value(index, canonical);
                self.store.store(index).await;
                if was_time {
                    // Give the clock a moment before reading the value back.
                    Timer::after_millis(RTC_SETTLE_MS).await;
                    self.store.refresh_time().await;
                }
                let shown = format_for_display(spec.kind, self.store.value(index).as_str());
                let mut lcd = lcd().await;
                lcd.show_cursor(false).await;
                lcd.clear().await;
                lcd.set_cursor(0, 0).await;
                lcd.print("Value saved!").await;
                lcd.set_cursor(1, 0).await;
                lcd.print(shown.as_str()).await;
                Timer::after_millis(SAVED_NOTICE_MS).await;
                render_param(&mut lcd, index, &self.store).await;
            }
            Err(invalid) => {
                warn!("{}: input rejected", spec.label);
                self.store.set_value(index, invalid.fallback);
                let message = invalid.reason.message();
                let mut lcd = lcd().await;
                lcd.show_cursor(false).await;
                lcd.clear().await;
                lcd.set_cursor(0, 0).await;
                lcd.print("Invalid input!").await;
                lcd.set_cursor(1, 0).await;
                lcd.print(message.as_str()).await;
                Timer::after_millis(ERROR_NOTICE_MS).await;
                render_param(&mut lcd, index, &self.store).await;
            }
        }
        self.state = MenuState::Browsing;
    }

    async fn show_current_param(&mut self) {
        if self.param_index == TIME_INDEX {
            self.store.refresh_time().await;
        }
        self.edit.clear();
        let mut lcd = lcd().await;
        render_param(&mut lcd, self.param_index, &self.store).await;
    }

    async fn render_edit(&mut self) {
        let spec = ParamStore::spec(self.param_index);
        let shown = format_for_display(spec.kind, self.edit.as_str());
        let offset = cursor_offset(spec.kind, self.edit.len());

        let mut line = Line::new();
        let _ = write!(line, "Val: {}", shown.as_str());
        pad_line(&mut line);

        let mut lcd = lcd().await;
        lcd.set_cursor(1, 0).await;
        lcd.print(line.as_str()).await;
        lcd.set_cursor(1, (VALUE_COL + offset) as u8).await;
        lcd.show_cursor(true).await;
        lcd.blink_cursor(true).await;
    }
}

fn pad_line(line: &mut Line) {
    while line.len() < LCD_COLS as usize {
        let _ = line.push(' ');
    }
}

async fn render_param(lcd: &mut Lcd, index: usize, store: &ParamStore) {
    let spec = ParamStore::spec(index);
    lcd.clear().await;
    lcd.set_cursor(0, 0).await;
    lcd.print(spec.label).await;
    lcd.set_cursor(1, 0).await;

    let value = store.value(index);
    if value.is_empty() {
        lcd.print("Val: <none>").await;
    } else {
        let shown = format_for_display(spec.kind, value.as_str());
        let mut line = Line::new();
        let _ = write!(line, "Val: {}", shown.as_str());
        lcd.print(line.as_str()).await;
    }
    lcd.show_cursor(false).await;
}

async fn render_password_prompt(lcd: &mut Lcd, entry: &str) {
    lcd.clear().await;
    lcd.set_cursor(0, 0).await;
    lcd.print("Enter Password:").await;
    render_password_entry(lcd, entry).await;
}

async fn render_password_entry(lcd: &mut Lcd, entry: &str) {
    let mut line = Line::new();
    let _ = write!(line, ">{}", entry);
    // One column past the longest entry, so deletes leave no stale digit.
    while line.len() < 10 {
        let _ = line.push(' ');
    }
    lcd.set_cursor(1, 0).await;
    lcd.print(line.as_str()).await;
    lcd.set_cursor(1, (entry.len() + 1) as u8).await;
    lcd.show_cursor(true).await;
    lcd.blink_cursor(true).await;
}
