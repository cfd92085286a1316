//! Rendering a validated submission into channel payloads.
//!
//! [`format_lead`] is pure: the receive time is passed in, so the same
//! submission and timestamp always produce byte-identical output.

use chrono::{DateTime, FixedOffset, Offset, Utc};

use super::model::FormSubmission;

/// Placeholder for optional wishes the client left blank.
pub const NOT_SPECIFIED: &str = "Не указано";

pub const SOURCE_CALCULATOR: &str = "Calculator";
pub const SOURCE_SIMPLE_FORM: &str = "Simple form";

/// Europe/Moscow has been UTC+3 year-round since 2014.
const MOSCOW_OFFSET_SECS: i32 = 3 * 3600;

const NBSP: char = '\u{a0}';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedLead {
    pub chat_text: String,
    pub row: Vec<String>,
}

#[must_use]
pub fn moscow() -> FixedOffset {
    FixedOffset::east_opt(MOSCOW_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

#[must_use]
pub fn format_lead(submission: &FormSubmission, received_at: DateTime<Utc>) -> FormattedLead {
    FormattedLead {
        chat_text: chat_text(submission),
        row: sheet_row(submission, received_at),
    }
}

fn chat_text(submission: &FormSubmission) -> String {
    let mut text = format!(
        "*Новая заявка с сайта!*\n\n*Имя:* {}\n*Телефон:* `{}`",
        escape_markdown(submission.name()),
        submission.phone().replace('`', "")
    );

    // Extended block needs the calculator figures; without them it is skipped
    if let (true, Some(calc)) = (submission.show_extended(), submission.calculator_data()) {
        text.push_str("\n\n*--- Заявка с калькулятора ---*\n");
        text.push_str(&format!(
            "Стоимость: *{}*\n",
            format_rubles(calc.property_price)
        ));
        text.push_str(&format!(
            "Первый взнос: *{}*\n",
            format_rubles(calc.down_payment)
        ));
        text.push_str(&format!(
            "Ежемесячный платеж: *{}*\n",
            format_rubles(calc.monthly_payment)
        ));
        text.push_str(&format!("Ставка: *{}%*\n", calc.interest_rate));
        if calc.quick_deal_discount {
            text.push_str("*🔥 Активирована скидка за быструю сделку! (-100 000 руб)*\n");
        }
        text.push_str("\n*--- Пожелания клиента ---*\n");
        text.push_str(&format!(
            "Кол-во комнат: *{}*\n",
            strip_entities(submission.rooms().unwrap_or(NOT_SPECIFIED))
        ));
        text.push_str(&format!(
            "Приоритет: *{}*\n",
            strip_entities(submission.priority().unwrap_or(NOT_SPECIFIED))
        ));
    }

    text
}

fn sheet_row(submission: &FormSubmission, received_at: DateTime<Utc>) -> Vec<String> {
    let timestamp = received_at
        .with_timezone(&moscow())
        .format("%d.%m.%Y, %H:%M:%S")
        .to_string();

    let source = if submission.show_extended() {
        SOURCE_CALCULATOR
    } else {
        SOURCE_SIMPLE_FORM
    };

    let calculator = submission
        .calculator_data()
        .map(|calc| {
            let mut detail = format!(
                "Стоимость: {}; Первый взнос: {}; Платеж: {}; Ставка: {}%",
                format_rubles(calc.property_price),
                format_rubles(calc.down_payment),
                format_rubles(calc.monthly_payment),
                calc.interest_rate
            );
            if calc.quick_deal_discount {
                detail.push_str("; Скидка за быструю сделку");
            }
            detail
        })
        .unwrap_or_default();

    vec![
        timestamp,
        submission.name().to_string(),
        submission.phone().to_string(),
        submission.rooms().unwrap_or(NOT_SPECIFIED).to_string(),
        submission.priority().unwrap_or(NOT_SPECIFIED).to_string(),
        source.to_string(),
        calculator,
    ]
}

/// Render an amount in whole roubles the way `ru-RU` locales do:
/// no-break-space digit groups (only from five digits up) and a
/// trailing `₽`.
#[must_use]
pub fn format_rubles(value: f64) -> String {
    let rounded = value.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let digits = (rounded.abs() as u64).to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 * 2);
    for (i, ch) in digits.chars().enumerate() {
        if digits.len() > 4 && i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(NBSP);
        }
        grouped.push(ch);
    }

    format!("{sign}{grouped}{NBSP}₽")
}

/// Escape characters that open an entity in Telegram's legacy Markdown.
#[must_use]
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '_' | '*' | '`' | '[') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Drop entity markers from text placed inside a `*bold*` span, where
/// legacy Markdown ignores backslash escapes.
#[must_use]
pub fn strip_entities(text: &str) -> String {
    text.chars()
        .filter(|ch| !matches!(ch, '_' | '*' | '`' | '['))
        .collect()
}
