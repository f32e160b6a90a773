use std::{cmp, io, thread, time::Duration};

use anyhow::{Context, Result};
use armory_core::{AdminEvent, Cart, CatalogStore, Item, Receipt, TransactionCoordinator};
use chrono::Local;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

const TICK_RATE: Duration = Duration::from_millis(250);
const MAX_QUANTITY_DIGITS: usize = 6;
const GREETING: &str = "Welcome! We sell items to prepare you for your arena fight.";

#[derive(Debug, Clone)]
struct Theme {
    primary_fg: Color,
    accent: Color,
    muted: Color,
    selection_bg: Color,
    selection_fg: Color,
    success: Color,
    warning: Color,
    danger: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_fg: Color::White,
            accent: Color::Cyan,
            muted: Color::DarkGray,
            selection_bg: Color::DarkGray,
            selection_fg: Color::White,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum SortOrder {
    #[default]
    NameAsc,
    NameDesc,
    PriceAsc,
    PriceDesc,
}

impl SortOrder {
    fn next(self) -> Self {
        match self {
            SortOrder::NameAsc => SortOrder::NameDesc,
            SortOrder::NameDesc => SortOrder::PriceAsc,
            SortOrder::PriceAsc => SortOrder::PriceDesc,
            SortOrder::PriceDesc => SortOrder::NameAsc,
        }
    }

    fn label(self) -> &'static str {
        match self {
            SortOrder::NameAsc => "name A-Z",
            SortOrder::NameDesc => "name Z-A",
            SortOrder::PriceAsc => "price low-high",
            SortOrder::PriceDesc => "price high-low",
        }
    }

    fn apply(self, items: &mut [Item]) {
        match self {
            SortOrder::NameAsc => items.sort_by(|a, b| a.name().cmp(b.name())),
            SortOrder::NameDesc => items.sort_by(|a, b| b.name().cmp(a.name())),
            SortOrder::PriceAsc => {
                items.sort_by(|a, b| a.price().cmp(&b.price()).then(a.name().cmp(b.name())))
            }
            SortOrder::PriceDesc => {
                items.sort_by(|a, b| b.price().cmp(&a.price()).then(a.name().cmp(b.name())))
            }
        }
    }
}

/// Quantity entry for the item being added to the cart.
#[derive(Debug, Clone)]
struct QuantityPrompt {
    item: String,
    available: u64,
    input: String,
    cursor: usize,
}

impl QuantityPrompt {
    fn new(item: &Item) -> Self {
        Self {
            item: item.name().to_string(),
            available: item.quantity(),
            input: "1".to_string(),
            cursor: 1,
        }
    }

    fn move_cursor(&mut self, delta: isize) {
        let len = self.input.len() as isize;
        self.cursor = (self.cursor as isize + delta).clamp(0, len) as usize;
    }

    fn move_home(&mut self) {
        self.cursor = 0;
    }

    fn move_end(&mut self) {
        self.cursor = self.input.len();
    }

    fn insert(&mut self, ch: char) {
        if self.input.len() >= MAX_QUANTITY_DIGITS || !ch.is_ascii_digit() {
            return;
        }
        self.input.insert(self.cursor, ch);
        self.cursor += 1;
    }

    fn backspace(&mut self) {
        if self.cursor > 0 && self.cursor <= self.input.len() {
            self.cursor -= 1;
            self.input.remove(self.cursor);
        }
    }

    fn delete(&mut self) {
        if self.cursor < self.input.len() {
            self.input.remove(self.cursor);
        }
    }

    /// Parsed quantity; `None` for empty input or zero.
    fn value(&self) -> Option<u64> {
        self.input.parse::<u64>().ok().filter(|qty| *qty > 0)
    }
}

#[derive(Debug, Clone)]
enum Modal {
    Quantity(QuantityPrompt),
    ConfirmSale { units: u64, total: u64 },
    ConfirmReturn { units: u64, total: u64 },
}

enum AppEvent {
    Input(Event),
    Tick,
}

#[derive(Debug, Default)]
struct UiState {
    items: Vec<Item>,
    cursor: usize,
    sort: SortOrder,
    status: String,
    admin_online: bool,
    should_quit: bool,
}

impl UiState {
    /// Replace the visible items, keeping the cursor on the same name when it survives.
    fn set_items(&mut self, mut items: Vec<Item>) {
        let selected = self.current_item().map(|item| item.name().to_string());
        self.sort.apply(&mut items);
        self.items = items;
        if let Some(name) = selected {
            if let Some(pos) = self.items.iter().position(|item| item.name() == name) {
                self.cursor = pos;
            }
        }
        self.clamp_cursor();
    }

    fn cycle_sort(&mut self) {
        self.sort = self.sort.next();
        let items = std::mem::take(&mut self.items);
        self.set_items(items);
    }

    fn move_cursor(&mut self, delta: isize) {
        if self.items.is_empty() {
            return;
        }
        let last = self.items.len() as isize - 1;
        self.cursor = (self.cursor as isize + delta).clamp(0, last) as usize;
    }

    fn move_to_end(&mut self) {
        self.cursor = self.items.len().saturating_sub(1);
    }

    fn current_item(&self) -> Option<&Item> {
        self.items.get(self.cursor)
    }

    fn price_of(&self, name: &str) -> Option<u64> {
        self.items
            .iter()
            .find(|item| item.name() == name)
            .map(Item::price)
    }

    fn set_status(&mut self, message: impl Into<String>) {
        self.status = message.into();
    }

    fn clamp_cursor(&mut self) {
        if self.items.is_empty() {
            self.cursor = 0;
        } else if self.cursor >= self.items.len() {
            self.cursor = self.items.len() - 1;
        }
    }
}

/// Interactive storefront over the shared catalog.
pub struct StoreApp {
    coordinator: TransactionCoordinator,
    cart: Cart,
    last_receipt: Option<Receipt>,
    state: UiState,
    modal: Option<Modal>,
    admin_rx: Option<mpsc::Receiver<AdminEvent>>,
    theme: Theme,
}

impl StoreApp {
    pub fn new(store: CatalogStore) -> Self {
        let mut app = Self {
            coordinator: TransactionCoordinator::new(store),
            cart: Cart::new(),
            last_receipt: None,
            state: UiState::default(),
            modal: None,
            admin_rx: None,
            theme: Theme::default(),
        };
        app.refresh_items();
        app
    }

    /// Receive catalog notifications from the admin listener.
    pub fn attach_admin(&mut self, receiver: mpsc::Receiver<AdminEvent>) {
        self.admin_rx = Some(receiver);
        self.state.admin_online = true;
    }

    pub async fn run(&mut self) -> Result<()> {
        self.state.set_status(format!(
            "{GREETING} {} item(s) in stock",
            self.state.items.len()
        ));

        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx);

        let mut admin_rx = self.admin_rx.take();

        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.state.should_quit {
                break;
            }

            if let Some(rx) = admin_rx.as_mut() {
                let mut admin_closed = false;
                tokio::select! {
                    maybe_event = event_rx.recv() => {
                        if !self.process_app_event(maybe_event) {
                            break;
                        }
                    }
                    maybe_admin = rx.recv() => {
                        match maybe_admin {
                            Some(event) => self.handle_admin_event(event),
                            None => admin_closed = true,
                        }
                    }
                }
                if admin_closed {
                    admin_rx = None;
                    self.state.admin_online = false;
                }
            } else {
                let maybe_event = event_rx.recv().await;
                if !self.process_app_event(maybe_event) {
                    break;
                }
            }

            if self.state.should_quit {
                break;
            }
        }

        restore_terminal(&mut terminal)?;
        info!(
            reserved = self.cart.total_units(),
            "Storefront closed; unsold reservations discarded"
        );
        Ok(())
    }

    fn refresh_items(&mut self) {
        let items = self.coordinator.store().snapshot().to_vec();
        self.state.set_items(items);
    }

    fn handle_tick(&mut self) {
        self.refresh_items();
    }

    fn handle_admin_event(&mut self, event: AdminEvent) {
        match event {
            AdminEvent::CatalogMerged { merged } => {
                info!(merged, "Catalog updated by admin");
                self.refresh_items();
                self.state
                    .set_status(format!("Inventory restocked: {merged} item(s) merged"));
            }
            AdminEvent::Stopped => {
                warn!("Admin service stopped");
                self.state.admin_online = false;
                self.state.set_status("Admin service stopped");
            }
        }
    }

    fn process_app_event(&mut self, maybe_event: Option<AppEvent>) -> bool {
        match maybe_event {
            Some(AppEvent::Input(Event::Key(key))) => {
                if key.kind != KeyEventKind::Release {
                    self.handle_key(key);
                }
                true
            }
            Some(AppEvent::Input(_)) => true,
            Some(AppEvent::Tick) => {
                self.handle_tick();
                true
            }
            None => false,
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        match self.modal.take() {
            Some(Modal::Quantity(prompt)) => self.handle_quantity_key(prompt, key),
            Some(modal @ Modal::ConfirmSale { .. }) => {
                self.handle_confirm_key(modal, key, Self::complete_sale)
            }
            Some(modal @ Modal::ConfirmReturn { .. }) => {
                self.handle_confirm_key(modal, key, Self::return_last_purchase)
            }
            None => self.handle_browse_key(key),
        }
    }

    fn handle_browse_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.state.should_quit = true;
            return;
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.state.should_quit = true,
            KeyCode::Down | KeyCode::Char('j') => self.state.move_cursor(1),
            KeyCode::Up | KeyCode::Char('k') => self.state.move_cursor(-1),
            KeyCode::Home | KeyCode::Char('g') => self.state.cursor = 0,
            KeyCode::End | KeyCode::Char('G') => self.state.move_to_end(),
            KeyCode::Char('s') => {
                self.state.cycle_sort();
                let label = self.state.sort.label();
                self.state.set_status(format!("Sorted by {label}"));
            }
            KeyCode::Enter | KeyCode::Char('a') => self.open_quantity_prompt(),
            KeyCode::Char('x') | KeyCode::Delete => self.release_selected(),
            KeyCode::Char('c') => self.clear_cart(),
            KeyCode::Char('p') => self.begin_checkout(),
            KeyCode::Char('r') => self.begin_return(),
            _ => {}
        }
    }

    fn handle_quantity_key(&mut self, mut prompt: QuantityPrompt, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.state.set_status("Cancelled");
                return;
            }
            KeyCode::Enter => {
                match prompt.value() {
                    Some(qty) => self.stage(&prompt.item, qty),
                    None => self.state.set_status("Enter a quantity of at least 1"),
                }
                return;
            }
            KeyCode::Left => prompt.move_cursor(-1),
            KeyCode::Right => prompt.move_cursor(1),
            KeyCode::Home => prompt.move_home(),
            KeyCode::End => prompt.move_end(),
            KeyCode::Backspace => prompt.backspace(),
            KeyCode::Delete => prompt.delete(),
            KeyCode::Char(ch) => {
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT {
                    prompt.insert(ch);
                }
            }
            _ => {}
        }
        self.modal = Some(Modal::Quantity(prompt));
    }

    fn handle_confirm_key(&mut self, modal: Modal, key: KeyEvent, accept: fn(&mut Self)) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => accept(self),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.state.set_status("Cancelled");
            }
            _ => self.modal = Some(modal),
        }
    }

    fn open_quantity_prompt(&mut self) {
        match self.state.current_item() {
            Some(item) => self.modal = Some(Modal::Quantity(QuantityPrompt::new(item))),
            None => self.state.set_status("Nothing in stock"),
        }
    }

    fn stage(&mut self, name: &str, qty: u64) {
        match self.coordinator.stage(&mut self.cart, name, qty) {
            Ok(reserved) => {
                debug!(item = %name, qty, reserved, "Staged item");
                self.state
                    .set_status(format!("Added {qty} x {name} to your cart ({reserved} total)"));
            }
            Err(err) => {
                debug!(item = %name, qty, %err, "Stage rejected");
                self.state.set_status(format!("Cannot add {name}: {err}"));
            }
        }
    }

    fn release_selected(&mut self) {
        let Some(name) = self.state.current_item().map(|item| item.name().to_string()) else {
            return;
        };
        if self.cart.reserved(&name) == 0 {
            self.state.set_status(format!("{name} is not in your cart"));
            return;
        }
        match self.cart.release(&name, 1) {
            Ok(left) => self
                .state
                .set_status(format!("Removed one {name} from your cart ({left} left)")),
            Err(err) => self.state.set_status(format!("Cannot remove {name}: {err}")),
        }
    }

    fn clear_cart(&mut self) {
        if self.cart.is_empty() {
            self.state.set_status("Your shopping cart is already empty");
            return;
        }
        self.cart.clear();
        self.state.set_status("Your shopping cart has been cleared");
    }

    fn cart_total(&self) -> u64 {
        self.cart
            .contents()
            .iter()
            .fold(0u64, |acc, (name, qty)| {
                let price = self.state.price_of(name).unwrap_or(0);
                acc.saturating_add(price.saturating_mul(*qty))
            })
    }

    fn begin_checkout(&mut self) {
        if self.cart.is_empty() {
            self.state.set_status("Your shopping cart is empty");
            return;
        }
        self.refresh_items();
        if let Err(err) = self.coordinator.check_availability(&self.cart) {
            self.state.set_status(format!("Cannot check out: {err}"));
            return;
        }
        self.modal = Some(Modal::ConfirmSale {
            units: self.cart.total_units(),
            total: self.cart_total(),
        });
    }

    fn complete_sale(&mut self) {
        // Stock may have moved while the confirmation was open.
        if let Err(err) = self.coordinator.check_availability(&self.cart) {
            self.state.set_status(format!("Cannot check out: {err}"));
            return;
        }
        let receipt = self.coordinator.sale(&self.cart);
        self.cart.clear();
        self.refresh_items();
        self.state.set_status(format!(
            "Thank you for your purchase! Paid ${}",
            receipt.total()
        ));
        self.last_receipt = Some(receipt);
    }

    fn begin_return(&mut self) {
        match self.last_receipt.as_ref() {
            Some(receipt) => {
                let units = receipt.to_cart().total_units();
                self.modal = Some(Modal::ConfirmReturn {
                    units,
                    total: receipt.total(),
                });
            }
            None => self.state.set_status("No purchase to return"),
        }
    }

    fn return_last_purchase(&mut self) {
        let Some(receipt) = self.last_receipt.take() else {
            return;
        };
        let units = self.coordinator.cancel(&receipt.to_cart());
        self.refresh_items();
        self.state.set_status(format!(
            "Returned {units} unit(s); refunded ${}",
            receipt.total()
        ));
    }

    fn draw(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(3),
            ])
            .split(frame.size());

        self.render_header(frame, chunks[0]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(chunks[1]);
        self.render_inventory(frame, body[0]);

        let side = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(7), Constraint::Min(5)])
            .split(body[1]);
        self.render_details(frame, side[0]);
        self.render_cart(frame, side[1]);

        self.render_status(frame, chunks[2]);

        match &self.modal {
            Some(Modal::Quantity(prompt)) => self.render_quantity_prompt(frame, prompt),
            Some(Modal::ConfirmSale { units, total }) => self.render_confirm(
                frame,
                "Checkout",
                format!("Buy {units} unit(s) for ${total}?"),
            ),
            Some(Modal::ConfirmReturn { units, total }) => self.render_confirm(
                frame,
                "Return",
                format!("Return {units} unit(s) for a ${total} refund?"),
            ),
            None => {}
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let (admin_label, admin_color) = if self.state.admin_online {
            ("admin online", self.theme.success)
        } else {
            ("admin offline", self.theme.muted)
        };
        let line = Line::from(vec![
            Span::styled(
                "Armory",
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::raw(GREETING),
            Span::raw("  "),
            Span::styled(admin_label, Style::default().fg(admin_color)),
        ]);
        let paragraph = Paragraph::new(line)
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Left);
        frame.render_widget(paragraph, area);
    }

    fn render_inventory(&self, frame: &mut Frame, area: Rect) {
        let title = format!(
            "Inventory ({}) - sorted by {}",
            self.state.items.len(),
            self.state.sort.label()
        );
        if self.state.items.is_empty() {
            let paragraph = Paragraph::new("The shelves are empty.")
                .style(Style::default().fg(self.theme.muted))
                .block(Block::default().borders(Borders::ALL).title(title));
            frame.render_widget(paragraph, area);
            return;
        }

        let name_width = self
            .state
            .items
            .iter()
            .map(|item| item.name().len())
            .max()
            .unwrap_or(0);
        let rows = self
            .state
            .items
            .iter()
            .map(|item| {
                let reserved = self.cart.reserved(item.name());
                let mut spans = vec![
                    Span::raw(format!("{:<name_width$}", item.name())),
                    Span::styled(
                        format!("  ${:>6}", item.price()),
                        Style::default().fg(self.theme.warning),
                    ),
                    Span::raw(format!("  x{:<4}", item.quantity())),
                ];
                if reserved > 0 {
                    spans.push(Span::styled(
                        format!(" ({reserved} in cart)"),
                        Style::default().fg(self.theme.accent),
                    ));
                }
                ListItem::new(Line::from(spans))
            })
            .collect::<Vec<_>>();

        let list = List::new(rows)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(
                Style::default()
                    .bg(self.theme.selection_bg)
                    .fg(self.theme.selection_fg)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");
        let mut list_state = ListState::default();
        list_state.select(Some(self.state.cursor));
        frame.render_stateful_widget(list, area, &mut list_state);
    }

    fn render_details(&self, frame: &mut Frame, area: Rect) {
        let lines = match self.state.current_item() {
            Some(item) => {
                let mut lines = vec![Line::from(vec![
                    Span::styled(
                        item.name().to_string(),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(
                        format!("  [{}]", item.kind().tag()),
                        Style::default().fg(self.theme.muted),
                    ),
                ])];
                if !item.description().is_empty() {
                    lines.push(Line::from(item.description().to_string()));
                }
                if let Some(detail) = item.kind().detail() {
                    lines.push(Line::styled(detail, Style::default().fg(self.theme.accent)));
                }
                lines.push(Line::from(format!(
                    "Price: ${}  In stock: {}",
                    item.price(),
                    item.quantity()
                )));
                lines
            }
            None => vec![Line::styled(
                "No item selected",
                Style::default().fg(self.theme.muted),
            )],
        };
        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Details"))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_cart(&self, frame: &mut Frame, area: Rect) {
        let mut lines = Vec::new();
        if self.cart.is_empty() {
            lines.push(Line::styled(
                "Your cart is empty",
                Style::default().fg(self.theme.muted),
            ));
        } else {
            for (name, qty) in self.cart.contents() {
                let line = match self.state.price_of(&name) {
                    Some(price) => Line::from(format!(
                        "{qty} x {name} @ ${price} = ${}",
                        price.saturating_mul(qty)
                    )),
                    None => Line::styled(
                        format!("{qty} x {name} (no longer stocked)"),
                        Style::default().fg(self.theme.danger),
                    ),
                };
                lines.push(line);
            }
            lines.push(Line::from(""));
            lines.push(Line::styled(
                format!("Total: ${}", self.cart_total()),
                Style::default()
                    .fg(self.theme.primary_fg)
                    .add_modifier(Modifier::BOLD),
            ));
        }

        if let Some(receipt) = self.last_receipt.as_ref() {
            let when = receipt.completed_at.with_timezone(&Local).format("%H:%M:%S");
            lines.push(Line::from(""));
            lines.push(Line::styled(
                format!("Last purchase at {when}: ${}", receipt.total()),
                Style::default().fg(self.theme.muted),
            ));
        }

        let title = format!("Cart ({} unit(s))", self.cart.total_units());
        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(title))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let key = |label: &'static str| {
            Span::styled(label, Style::default().add_modifier(Modifier::BOLD))
        };
        let line = Line::from(vec![
            Span::raw(self.state.status.clone()),
            Span::raw("   "),
            key("a"),
            Span::raw(" add  "),
            key("x"),
            Span::raw(" remove  "),
            key("c"),
            Span::raw(" clear  "),
            key("p"),
            Span::raw(" checkout  "),
            key("r"),
            Span::raw(" return  "),
            key("s"),
            Span::raw(" sort  "),
            key("q"),
            Span::raw(" quit"),
        ]);
        let paragraph = Paragraph::new(line)
            .block(Block::default().borders(Borders::ALL))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_quantity_prompt(&self, frame: &mut Frame, prompt: &QuantityPrompt) {
        let frame_area = frame.size();
        let width = cmp::max(cmp::min(48_u16, frame_area.width.saturating_sub(4)), 24_u16);
        let area = centered_rect(width, 7, frame_area);
        frame.render_widget(Clear, area);

        let input_line = Line::from(vec![
            Span::styled("> ", Style::default().fg(self.theme.accent)),
            Span::raw(prompt.input.clone()),
        ]);
        let helper = Line::from(vec![
            Span::styled("Enter", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" add  "),
            Span::styled("Esc", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" cancel"),
        ]);
        let paragraph = Paragraph::new(vec![
            Line::from(format!("How many? ({} in stock)", prompt.available)),
            input_line,
            Line::from(""),
            helper,
        ])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Add {}", prompt.item)),
        )
        .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);

        let cursor_x =
            (area.x + 3 + prompt.cursor as u16).min(area.x + area.width.saturating_sub(2));
        frame.set_cursor(cursor_x, area.y + 2);
    }

    fn render_confirm(&self, frame: &mut Frame, title: &str, question: String) {
        let area = centered_rect(48, 5, frame.size());
        frame.render_widget(Clear, area);
        let paragraph = Paragraph::new(vec![
            Line::from(question),
            Line::from(vec![
                Span::styled("y", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(" confirm  "),
                Span::styled("n", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(" cancel"),
            ]),
        ])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title.to_string())
                .border_style(Style::default().fg(self.theme.warning)),
        )
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}
