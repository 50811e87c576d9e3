use crate::terminal::{KeyOutcome, Screen};
use coursework_syllabus::{
    ItemIcon, ScheduleItemViewState, SyllabusContent, SyllabusEvent, SyllabusViewState,
};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, Borders, HighlightSpacing, List, ListItem, ListState, Paragraph, Wrap,
};
use ratatui::Frame;
use scraper::{ElementRef, Html};
use unicode_width::UnicodeWidthStr;

const HELP: &str = "r refresh · j/k move · enter open · q quit";
const HIGHLIGHT_SYMBOL: &str = "▸ ";
const SYLLABUS_UNAVAILABLE: &str = "Syllabus unavailable. Press r to retry.";

/// Terminal rendering of the syllabus: the course header, the syllabus body
/// as plain text and the schedule as a navigable list.
///
/// Keys: `r` refresh (retry on the error screen), `j`/`k` or arrows move,
/// `Enter` opens the highlighted item, `q`/`Esc`/`Ctrl+C` quit.
#[derive(Debug, Default)]
pub struct SyllabusScreen {
    selected: Option<usize>,
}

impl SyllabusScreen {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the highlighted schedule row, if any.
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    fn move_by(&mut self, len: usize, forward: bool) {
        if len == 0 {
            self.selected = None;
            return;
        }
        let last = len - 1;
        self.selected = Some(match (self.selected, forward) {
            (None, _) => 0,
            (Some(i), true) => (i + 1).min(last),
            (Some(i), false) => i.saturating_sub(1).min(last),
        });
    }

    fn render_loaded(&mut self, content: &SyllabusContent, frame: &mut Frame, area: Rect) {
        let body = match (&content.body, content.syllabus_unavailable) {
            (Some(html), _) => Some(html_to_text(html)),
            (None, true) => Some(SYLLABUS_UNAVAILABLE.to_string()),
            (None, false) => None,
        };
        let body_height = match &body {
            Some(text) => (text.lines().count() as u16 + 2).min(area.height / 2),
            None => 0,
        };
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(body_height),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(area);

        frame.render_widget(Paragraph::new(header(content)), chunks[0]);

        if let Some(text) = body {
            let style = if content.body.is_none() {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default()
            };
            let paragraph = Paragraph::new(text)
                .style(style)
                .wrap(Wrap { trim: true })
                .block(Block::default().borders(Borders::ALL).title("Syllabus"));
            frame.render_widget(paragraph, chunks[1]);
        }

        self.render_items(content, frame, chunks[2]);
        frame.render_widget(
            Paragraph::new(Line::styled(HELP, Style::default().fg(Color::DarkGray))),
            chunks[3],
        );
    }

    fn render_items(&mut self, content: &SyllabusContent, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP).title("Schedule");
        if content.summary_unavailable {
            let notice = Paragraph::new(Line::styled(
                "Schedule unavailable",
                Style::default().fg(Color::DarkGray),
            ))
            .block(block);
            frame.render_widget(notice, area);
            return;
        }

        if let Some(i) = self.selected {
            self.selected = content.items.len().checked_sub(1).map(|last| i.min(last));
        }

        let width = area.width.saturating_sub(HIGHLIGHT_SYMBOL.width() as u16) as usize;
        let items: Vec<ListItem> = content
            .items
            .iter()
            .map(|item| ListItem::new(item_line(item, width)))
            .collect();
        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol(HIGHLIGHT_SYMBOL)
            .highlight_spacing(HighlightSpacing::Always);

        let mut state = ListState::default().with_selected(self.selected);
        frame.render_stateful_widget(list, area, &mut state);
    }
}

impl Screen for SyllabusScreen {
    type Event = SyllabusEvent;
    type ViewState = SyllabusViewState;

    fn render(&mut self, state: &SyllabusViewState, frame: &mut Frame) {
        let area = frame.area();
        match state {
            SyllabusViewState::Loading => {
                frame.render_widget(centered("Loading syllabus…"), area);
            }
            SyllabusViewState::Empty { refreshing } => {
                let text = if *refreshing {
                    "This course has no syllabus yet. Refreshing…"
                } else {
                    "This course has no syllabus yet."
                };
                frame.render_widget(centered(text), area);
            }
            SyllabusViewState::Error {
                message,
                retry_label,
            } => {
                let lines = vec![
                    Line::styled(message.as_str(), Style::default().fg(Color::Red)),
                    Line::raw(""),
                    Line::raw(format!("Press r to {}", retry_label.to_lowercase())),
                ];
                frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), area);
            }
            SyllabusViewState::Loaded(content) => self.render_loaded(content, frame, area),
        }
    }

    fn on_key(&mut self, state: &SyllabusViewState, key: KeyEvent) -> KeyOutcome<SyllabusEvent> {
        let items: &[ScheduleItemViewState] = match state {
            SyllabusViewState::Loaded(content) => &content.items,
            _ => &[],
        };

        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                KeyOutcome::Quit
            }
            KeyCode::Char('q') | KeyCode::Esc => KeyOutcome::Quit,
            KeyCode::Char('r') => match state {
                SyllabusViewState::Error { .. } => KeyOutcome::Send(SyllabusEvent::Retry),
                _ => KeyOutcome::Send(SyllabusEvent::Refresh),
            },
            KeyCode::Char('j') | KeyCode::Down => {
                self.move_by(items.len(), true);
                KeyOutcome::Ignore
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.move_by(items.len(), false);
                KeyOutcome::Ignore
            }
            KeyCode::Enter => match self.selected.and_then(|i| items.get(i)) {
                Some(item) => KeyOutcome::Send(SyllabusEvent::ItemClicked(item.id.clone())),
                None => KeyOutcome::Ignore,
            },
            _ => KeyOutcome::Ignore,
        }
    }
}

fn centered(text: &str) -> Paragraph<'_> {
    Paragraph::new(text)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
}

fn header(content: &SyllabusContent) -> Line<'static> {
    let color = parse_hex(&content.course_color).unwrap_or(Color::Cyan);
    let name = content.course_name.clone().unwrap_or_else(|| "Syllabus".into());
    let mut spans = vec![Span::styled(
        name,
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    )];
    if content.refreshing {
        spans.push(Span::styled(
            "  ⟳ refreshing",
            Style::default().fg(Color::Yellow),
        ));
    }
    Line::from(spans)
}

fn item_line(item: &ScheduleItemViewState, width: usize) -> Line<'static> {
    let label = format!("{} {}", glyph(item.icon), item.title);
    let used = label.width() + item.date_text.width();
    let pad = width.saturating_sub(used).max(1);
    let date_style = if item.overdue {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    Line::from(vec![
        Span::raw(label),
        Span::raw(" ".repeat(pad)),
        Span::styled(item.date_text.clone(), date_style),
    ])
}

fn glyph(icon: ItemIcon) -> &'static str {
    match icon {
        ItemIcon::Assignment => "✎",
        ItemIcon::Quiz => "?",
        ItemIcon::Discussion => "✉",
        ItemIcon::Calendar => "◷",
    }
}

/// `#RRGGBB` to an RGB color.
fn parse_hex(hex: &str) -> Option<Color> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(digits.get(i..i + 2)?, 16).ok();
    Some(Color::Rgb(channel(0)?, channel(2)?, channel(4)?))
}

/// Elements whose content is never shown.
const HIDDEN: &[&str] = &["head", "noscript", "script", "style", "template"];

/// Elements that start and end a line.
const BLOCKS: &[&str] = &[
    "br", "div", "h1", "h2", "h3", "h4", "h5", "h6", "li", "ol", "p", "table", "tr", "ul",
];

/// Reduce syllabus HTML to readable text: one line per block element,
/// whitespace collapsed, entities decoded by the parser.
fn html_to_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut text = String::with_capacity(html.len());
    flatten(fragment.root_element(), &mut text);
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn flatten(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child) = ElementRef::wrap(child) {
            let name = child.value().name();
            if HIDDEN.contains(&name) {
                continue;
            }
            let block = BLOCKS.contains(&name);
            if block {
                out.push('\n');
            }
            flatten(child, out);
            if block {
                out.push('\n');
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coursework_syllabus::ScheduleItemId;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn render_string(screen: &mut SyllabusScreen, state: &SyllabusViewState) -> String {
        let (width, height) = (60, 20);
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|frame| screen.render(state, frame)).unwrap();
        let buf = terminal.backend().buffer().clone();
        let mut output = String::new();
        for y in 0..height {
            for x in 0..width {
                output.push_str(buf[(x, y)].symbol());
            }
            output.push('\n');
        }
        output
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn item(id: &str, title: &str, date_text: &str, overdue: bool) -> ScheduleItemViewState {
        ScheduleItemViewState {
            id: ScheduleItemId::new(id),
            title: title.into(),
            icon: ItemIcon::Assignment,
            date_text: date_text.into(),
            overdue,
        }
    }

    fn loaded() -> SyllabusViewState {
        SyllabusViewState::Loaded(SyllabusContent {
            course_name: Some("Intro to Biology".into()),
            course_color: "#394B58".into(),
            body: Some("<p>Welcome to <b>Biology</b> &amp; friends</p><p>Labs weekly</p>".into()),
            items: vec![
                item("a", "Essay", "Due Oct 1, 2026 at 9:00 AM", true),
                item("b", "Midterm", "Due Nov 2, 2026 at 10:30 AM", false),
            ],
            refreshing: false,
            summary_unavailable: false,
            syllabus_unavailable: false,
        })
    }

    #[test]
    fn loading_renders_placeholder() {
        let out = render_string(&mut SyllabusScreen::new(), &SyllabusViewState::Loading);
        assert!(out.contains("Loading syllabus"));
    }

    #[test]
    fn error_renders_message_and_retry_hint() {
        let state = SyllabusViewState::Error {
            message: "There was an error loading the syllabus.".into(),
            retry_label: "Retry".into(),
        };
        let out = render_string(&mut SyllabusScreen::new(), &state);
        assert!(out.contains("There was an error loading the syllabus."));
        assert!(out.contains("Press r to retry"));
    }

    #[test]
    fn loaded_renders_header_body_and_items() {
        let out = render_string(&mut SyllabusScreen::new(), &loaded());
        assert!(out.contains("Intro to Biology"));
        assert!(out.contains("Welcome to Biology & friends"));
        assert!(out.contains("Labs weekly"));
        assert!(out.contains("Essay"));
        assert!(out.contains("Due Nov 2, 2026 at 10:30 AM"));
        assert!(!out.contains("refreshing"));
    }

    #[test]
    fn refreshing_content_stays_on_screen() {
        let SyllabusViewState::Loaded(mut content) = loaded() else {
            unreachable!()
        };
        content.refreshing = true;
        let out = render_string(&mut SyllabusScreen::new(), &SyllabusViewState::Loaded(content));
        assert!(out.contains("refreshing"));
        assert!(out.contains("Midterm"));
    }

    #[test]
    fn unavailable_summary_is_called_out() {
        let SyllabusViewState::Loaded(mut content) = loaded() else {
            unreachable!()
        };
        content.items.clear();
        content.summary_unavailable = true;
        let out = render_string(&mut SyllabusScreen::new(), &SyllabusViewState::Loaded(content));
        assert!(out.contains("Schedule unavailable"));
        assert!(out.contains("Labs weekly"));
    }

    #[test]
    fn unavailable_syllabus_offers_retry() {
        let SyllabusViewState::Loaded(mut content) = loaded() else {
            unreachable!()
        };
        content.course_name = None;
        content.body = None;
        content.items.clear();
        content.syllabus_unavailable = true;
        let state = SyllabusViewState::Loaded(content);

        let mut screen = SyllabusScreen::new();
        let out = render_string(&mut screen, &state);
        assert!(out.contains("Syllabus unavailable. Press r to retry."));
        assert_eq!(
            screen.on_key(&state, key(KeyCode::Char('r'))),
            KeyOutcome::Send(SyllabusEvent::Refresh)
        );
    }

    #[test]
    fn navigation_then_enter_opens_item() {
        let mut screen = SyllabusScreen::new();
        let state = loaded();

        assert_eq!(screen.on_key(&state, key(KeyCode::Enter)), KeyOutcome::Ignore);
        assert_eq!(screen.on_key(&state, key(KeyCode::Char('j'))), KeyOutcome::Ignore);
        assert_eq!(screen.on_key(&state, key(KeyCode::Char('j'))), KeyOutcome::Ignore);
        assert_eq!(screen.on_key(&state, key(KeyCode::Char('j'))), KeyOutcome::Ignore);
        assert_eq!(screen.selected(), Some(1));
        assert_eq!(
            screen.on_key(&state, key(KeyCode::Enter)),
            KeyOutcome::Send(SyllabusEvent::ItemClicked(ScheduleItemId::new("b")))
        );

        screen.on_key(&state, key(KeyCode::Char('k')));
        screen.on_key(&state, key(KeyCode::Up));
        assert_eq!(screen.selected(), Some(0));
    }

    #[test]
    fn selection_is_clamped_when_items_shrink() {
        let mut screen = SyllabusScreen::new();
        screen.on_key(&loaded(), key(KeyCode::Down));
        screen.on_key(&loaded(), key(KeyCode::Down));

        let SyllabusViewState::Loaded(mut content) = loaded() else {
            unreachable!()
        };
        content.items.truncate(1);
        render_string(&mut screen, &SyllabusViewState::Loaded(content));
        assert_eq!(screen.selected(), Some(0));
    }

    #[test]
    fn refresh_key_depends_on_state() {
        let mut screen = SyllabusScreen::new();
        assert_eq!(
            screen.on_key(&loaded(), key(KeyCode::Char('r'))),
            KeyOutcome::Send(SyllabusEvent::Refresh)
        );
        let error = SyllabusViewState::Error {
            message: String::new(),
            retry_label: "Retry".into(),
        };
        assert_eq!(
            screen.on_key(&error, key(KeyCode::Char('r'))),
            KeyOutcome::Send(SyllabusEvent::Retry)
        );
    }

    #[test]
    fn quit_keys() {
        let mut screen = SyllabusScreen::new();
        let state = SyllabusViewState::Loading;
        assert_eq!(screen.on_key(&state, key(KeyCode::Char('q'))), KeyOutcome::Quit);
        assert_eq!(screen.on_key(&state, key(KeyCode::Esc)), KeyOutcome::Quit);
        assert_eq!(
            screen.on_key(
                &state,
                KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)
            ),
            KeyOutcome::Quit
        );
    }

    #[test]
    fn html_is_flattened() {
        assert_eq!(
            html_to_text("<div><h1>Week 1</h1><ul><li>Read ch. 1</li><li>Quiz&nbsp;1</li></ul></div>"),
            "Week 1\nRead ch. 1\nQuiz 1"
        );
        assert_eq!(html_to_text("plain"), "plain");
        assert_eq!(html_to_text("a<br>b<br/>c"), "a\nb\nc");
    }

    #[test]
    fn stray_angle_brackets_survive() {
        assert_eq!(
            html_to_text("<p>Grades: A &lt; B if score < 90 and <b>late</b></p>"),
            "Grades: A < B if score < 90 and late"
        );
    }

    #[test]
    fn hidden_elements_are_dropped() {
        assert_eq!(html_to_text("<style>p{color:red}</style><p>Hi</p>"), "Hi");
        assert_eq!(
            html_to_text("<p>Office hours</p><script>track()</script><noscript>x</noscript>"),
            "Office hours"
        );
    }

    #[test]
    fn named_and_numeric_entities_are_decoded() {
        assert_eq!(
            html_to_text("<p>Instructor&rsquo;s &#8220;office hours&#8221; &amp; labs</p>"),
            "Instructor\u{2019}s \u{201C}office hours\u{201D} & labs"
        );
    }

    #[test]
    fn course_color_parses() {
        assert_eq!(parse_hex("#394B58"), Some(Color::Rgb(0x39, 0x4B, 0x58)));
        assert_eq!(parse_hex("394B58"), None);
        assert_eq!(parse_hex("#12"), None);
    }
}
