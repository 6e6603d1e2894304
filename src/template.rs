//! Receipt HTML template.
//!
//! Produces the complete off-screen fragment for one receipt. Inline styles
//! keep the fragment printable by any HTML renderer; the class names are what
//! the built-in layout in [`crate::rendering::layout`] keys on.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use scraper::Html;

use crate::i18n::{Locale, Translate};
use crate::model::DonationRecord;

pub const ACCENT: &str = "#ea580c";
pub const MUTED: &str = "#6b7280";
pub const INK: &str = "#111827";
pub const PANEL_FILL: &str = "#fff7ed";
pub const PANEL_BORDER: &str = "#ffedd5";
pub const TABLE_BORDER: &str = "#e5e7eb";
pub const TABLE_HEADER_FILL: &str = "#f9fafb";
pub const ROW_RULE: &str = "#f3f4f6";

/// Everything the template needs besides the record itself
pub struct TemplateContext<'a> {
    pub locale: Locale,
    pub text: &'a dyn Translate,
    /// `data:` URI of the banner image
    pub banner_src: &'a str,
    pub currency_symbol: &'a str,
    /// Render time; source of the default receipt number and date
    pub issued_at: DateTime<Utc>,
    /// Time zone dates are displayed in
    pub display_offset: FixedOffset,
}

/// Escape text for HTML element content and attribute values
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Caller-supplied receipt number, or the last 6 digits of `issued_at` in epoch millis.
///
/// The time-derived number is not unique across receipts rendered in the
/// same millisecond window modulo 10^6; callers needing uniqueness supply one.
pub fn resolve_receipt_no(record: &DonationRecord, issued_at: DateTime<Utc>) -> String {
    match record.receipt_no() {
        Some(no) => no.to_string(),
        None => format!("{:06}", issued_at.timestamp_millis().rem_euclid(1_000_000)),
    }
}

/// Parse a `createdAt` timestamp. Naive timestamps are taken as UTC.
pub fn parse_created_at(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Display date: `createdAt` when present and parseable, else the render date.
pub fn resolve_date(
    record: &DonationRecord,
    locale: Locale,
    issued_at: DateTime<Utc>,
    offset: FixedOffset,
) -> String {
    let fmt = locale.date_format();
    let Some(raw) = record.created_at() else {
        return issued_at.with_timezone(&offset).format(fmt).to_string();
    };
    // Date-only inputs carry no time zone, keep the calendar day as written
    if let Ok(day) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return day.format(fmt).to_string();
    }
    let when = parse_created_at(raw).unwrap_or_else(|| {
        log::warn!("unparseable createdAt '{}', using render date", raw);
        issued_at
    });
    when.with_timezone(&offset).format(fmt).to_string()
}

fn detail_row(label: &str, value: &str, value_style: &str) -> String {
    format!(
        r#"<tr><td class="label" style="color: {muted}; font-size: 14px; width: 40%;">{label}</td><td class="value" style="color: {ink}; {value_style}">{value}</td></tr>"#,
        muted = MUTED,
        ink = INK,
        label = escape_html(label),
        value = escape_html(value),
        value_style = value_style,
    )
}

const VALUE: &str = "font-size: 15px; font-weight: 500;";
const VALUE_STRONG: &str = "font-size: 16px; font-weight: 600;";

fn items_table(record: &DonationRecord, t: &dyn Translate) -> String {
    if !record.shows_items() {
        return String::new();
    }
    let rows: String = record
        .grocery_list
        .iter()
        .enumerate()
        .map(|(i, item)| {
            format!(
                r#"<tr style="border-bottom: 1px solid {rule};"><td class="serial" style="padding: 10px; color: #4b5563; font-size: 14px; text-align: center;">{n}</td><td class="item-name" style="padding: 10px; color: {ink}; font-size: 14px; font-weight: 500;">{name}</td><td class="item-qty" style="padding: 10px; color: #4b5563; font-size: 14px; text-align: right;">{qty}</td></tr>"#,
                rule = ROW_RULE,
                ink = INK,
                n = i + 1,
                name = escape_html(&item.name),
                qty = escape_html(&item.quantity_label()),
            )
        })
        .collect();

    let th = format!("padding: 10px; color: {}; font-size: 12px; font-weight: 600; text-transform: uppercase;", MUTED);
    format!(
        r#"<div class="items" style="margin-top: 20px; background-color: #fff; border: 1px solid {border}; border-radius: 8px; overflow: hidden;"><div class="items-header" style="background-color: {head_fill}; padding: 10px 15px; border-bottom: 1px solid {border};"><h3 class="items-title" style="margin: 0; font-size: 15px; font-weight: 600; color: #374151;">{title}</h3></div><table class="items-table" style="width: 100%; border-collapse: collapse;"><thead><tr><th style="{th} text-align: center; width: 50px;">{sno}</th><th style="{th} text-align: left;">{name}</th><th style="{th} text-align: right; width: 100px;">{qty}</th></tr></thead><tbody>{rows}</tbody></table></div>"#,
        border = TABLE_BORDER,
        head_fill = TABLE_HEADER_FILL,
        title = escape_html(&t.text_or("grocery_items", "Grocery Items List")),
        th = th,
        sno = escape_html(&t.text_or("serial_no", "S.NO")),
        name = escape_html(&t.text_or("item_name", "ITEM NAME")),
        qty = escape_html(&t.text_or("quantity", "QUANTITY")),
        rows = rows,
    )
}

fn amount_block(record: &DonationRecord, t: &dyn Translate, currency: &str) -> String {
    if !record.shows_amount() {
        return r#"<div class="amount-spacer" style="padding-top: 10px;"></div>"#.to_string();
    }
    format!(
        r#"<div class="amount" style="display: flex; justify-content: flex-end; align-items: center; padding-top: 20px; border-top: 2px solid {border};"><div style="text-align: right;"><p class="amount-label" style="margin: 0 0 5px; font-size: 14px; color: {muted}; text-align: right;">{label}</p><p class="amount-value" style="margin: 0; font-size: 36px; font-weight: 800; color: {accent}; text-align: right;">{currency}{amount}</p></div></div>"#,
        border = TABLE_BORDER,
        muted = MUTED,
        accent = ACCENT,
        label = escape_html(&t.text("amount")),
        currency = escape_html(currency),
        amount = escape_html(record.amount.trim()),
    )
}

/// Build the complete receipt fragment.
pub fn build_receipt_html(record: &DonationRecord, ctx: &TemplateContext<'_>) -> String {
    let t = ctx.text;
    let receipt_no = resolve_receipt_no(record, ctx.issued_at);
    let date = resolve_date(record, ctx.locale, ctx.issued_at, ctx.display_offset);
    let mode_label = t.text_or(record.payment_mode.label_key(), record.payment_mode.as_str());

    let mut rows = String::new();
    rows.push_str(&detail_row(&t.text("date"), &date, VALUE));
    rows.push_str(&detail_row(&t.text("donor_name"), record.donor_name.trim(), VALUE_STRONG));
    rows.push_str(&detail_row(&t.text("mobile_number"), record.mobile_number.trim(), VALUE));
    if let Some(address) = record.address() {
        rows.push_str(&detail_row(&t.text_or("address", "Address"), address, VALUE));
    }
    rows.push_str(&detail_row(&t.text("donation_type"), &mode_label, VALUE));
    if let Some(utr) = record.shown_utr() {
        rows.push_str(&detail_row(&t.text_or("utr_number", "UTR Number"), utr, VALUE));
    }
    rows.push_str(&detail_row(&t.text("notes"), record.notes().unwrap_or("-"), VALUE));

    let panel_gap = if record.shows_amount() { 30 } else { 20 };

    format!(
        r#"<div class="receipt-page" lang="{lang}" style="width: 794px; min-height: 1123px; padding: 40px; box-sizing: border-box; background: #fff; position: relative;">
<div class="receipt-frame" style="font-family: 'Helvetica Neue', Helvetica, Arial, sans-serif; color: #333; height: 100%; border: 4px solid {accent}; background: #fff; padding: 40px; display: flex; flex-direction: column; box-sizing: border-box; justify-content: space-between; position: relative;">
<div class="copy-mark" style="position: absolute; top: 12px; right: 15px; font-size: 11px; color: {muted}; font-weight: 600; text-transform: uppercase; background: #fff; padding: 0 8px;">{copy}</div>
<div class="receipt-body" style="flex: 0 0 auto;">
<div class="banner" style="text-align: center; margin-bottom: 30px; padding-bottom: 20px; border-bottom: 2px solid {accent};"><img src="{banner}" alt="Trust Banner" style="width: 100%; height: auto; max-height: 120px; object-fit: contain;" /></div>
<div class="receipt-header" style="display: flex; justify-content: space-between; align-items: center; margin-bottom: 30px;">
<h2 class="receipt-title" style="{title_style}">{title}</h2>
<div style="text-align: right;"><p class="receipt-no-label" style="margin: 0; font-size: 14px; color: {muted}; text-align: right;">{no_label}</p><p class="receipt-no" style="margin: 2px 0 0; font-size: 16px; font-weight: 600; color: {ink}; text-align: right;">#{receipt_no}</p></div>
</div>
<div class="details" style="background-color: {panel}; border: 1px solid {panel_border}; padding: 25px; border-radius: 8px; margin-bottom: {panel_gap}px;">
<table class="details-table" style="width: 100%; border-collapse: separate; border-spacing: 0 12px;">{rows}</table>
</div>
{items}
{amount}
</div>
<div class="footer" style="margin-top: auto; text-align: center;"><p class="thank-you" style="font-size: 16px; font-weight: 600; color: {ink}; margin-bottom: 5px; text-align: center;">{thank_you}</p><p class="trust-name" style="font-size: 13px; color: {muted}; text-align: center;">{trust_name}</p></div>
</div>
</div>"#,
        lang = ctx.locale.code(),
        accent = ACCENT,
        muted = MUTED,
        ink = INK,
        panel = PANEL_FILL,
        panel_border = PANEL_BORDER,
        copy = escape_html(&t.text_or("original_copy", "Original Copy")),
        banner = escape_html(ctx.banner_src),
        title_style = ctx.locale.title_style().css(),
        title = escape_html(&t.text("app_title")),
        no_label = escape_html(&t.text("receipt_no")),
        receipt_no = escape_html(&receipt_no),
        panel_gap = panel_gap,
        rows = rows,
        items = items_table(record, t),
        amount = amount_block(record, t, ctx.currency_symbol),
        thank_you = escape_html(&t.text("thank_you")),
        trust_name = escape_html(&t.text("trust_name")),
    )
}

/// Text nodes of a fragment in document order, trimmed, blanks dropped.
pub fn visible_text(html: &str) -> Vec<String> {
    let fragment = Html::parse_fragment(html);
    fragment
        .root_element()
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::Catalog;
    use crate::model::{GroceryItem, PaymentMode};
    use scraper::Selector;

    fn ctx<'a>(t: &'a dyn Translate, locale: Locale) -> TemplateContext<'a> {
        TemplateContext {
            locale,
            text: t,
            banner_src: "data:image/png;base64,AAAA",
            currency_symbol: "₹",
            issued_at: Utc.with_ymd_and_hms(2026, 10, 19, 6, 30, 0).unwrap(),
            display_offset: FixedOffset::east_opt(330 * 60).unwrap(),
        }
    }

    #[test]
    fn escape_html_covers_markup() {
        assert_eq!(escape_html("<b>\"A&B\"</b>"), "&lt;b&gt;&quot;A&amp;B&quot;&lt;/b&gt;");
    }

    #[test]
    fn receipt_no_defaults_to_last_six_millis_digits() {
        let rec = DonationRecord::new("A", "1", PaymentMode::Cash, "1");
        let at = Utc.timestamp_millis_opt(1_760_000_012_345).unwrap();
        assert_eq!(resolve_receipt_no(&rec, at), "012345");
        let rec = rec.with_receipt_no("R-77");
        assert_eq!(resolve_receipt_no(&rec, at), "R-77");
    }

    #[test]
    fn created_at_formats() {
        assert!(parse_created_at("2024-03-05T10:00:00.123456+00:00").is_some());
        assert!(parse_created_at("2024-03-05T10:00:00").is_some());
        assert!(parse_created_at("2024-03-05 10:00:00.5").is_some());
        assert!(parse_created_at("2024-03-05").is_some());
        assert!(parse_created_at("yesterday").is_none());
    }

    #[test]
    fn date_uses_display_offset() {
        let offset = FixedOffset::east_opt(330 * 60).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        // 20:00 UTC is already the next day in IST
        let rec = DonationRecord::new("A", "1", PaymentMode::Cash, "1")
            .with_created_at("2024-03-05T20:00:00Z");
        assert_eq!(resolve_date(&rec, Locale::En, now, offset), "06/03/2024");
        let rec = rec.with_created_at("2024-03-05");
        assert_eq!(resolve_date(&rec, Locale::En, now, offset), "05/03/2024");
        let rec = rec.with_created_at("garbage");
        assert_eq!(resolve_date(&rec, Locale::Kn, now, offset), "01/01/2026");
    }

    #[test]
    fn record_text_is_escaped() {
        let catalog = Catalog::builtin();
        let t = catalog.translator(Locale::En);
        let rec = DonationRecord::new("<script>x</script>", "1", PaymentMode::Cash, "1");
        let html = build_receipt_html(&rec, &ctx(&t, Locale::En));
        assert!(!html.contains("<script>"));
        assert!(visible_text(&html).iter().any(|s| s == "<script>x</script>"));
    }

    #[test]
    fn grocery_rows_are_numbered_in_order() {
        let catalog = Catalog::builtin();
        let t = catalog.translator(Locale::En);
        let rec = DonationRecord::new("A", "", PaymentMode::Groceries, "1")
            .with_item(GroceryItem::new("Rice", "10", "kg"))
            .with_item(GroceryItem::new("Oil", "2", "L"));
        let html = build_receipt_html(&rec, &ctx(&t, Locale::En));
        let doc = Html::parse_fragment(&html);
        let rows = Selector::parse("table.items-table tbody tr").unwrap();
        let serial = Selector::parse("td.serial").unwrap();
        let numbers: Vec<String> = doc
            .select(&rows)
            .map(|r| r.select(&serial).next().unwrap().text().collect())
            .collect();
        assert_eq!(numbers, vec!["1", "2"]);
        assert!(html.contains("2 L"));
        assert!(!html.contains("class=\"amount\""));
        assert!(html.contains("amount-spacer"));
    }

    #[test]
    fn title_style_follows_locale() {
        let catalog = Catalog::builtin();
        let en = catalog.translator(Locale::En);
        let kn = catalog.translator(Locale::Kn);
        let rec = DonationRecord::new("A", "1", PaymentMode::Cash, "1");
        let en_html = build_receipt_html(&rec, &ctx(&en, Locale::En));
        let kn_html = build_receipt_html(&rec, &ctx(&kn, Locale::Kn));
        assert!(en_html.contains("font-size: 28px; font-weight: 800; text-transform: uppercase;"));
        assert!(kn_html.contains("font-size: 26px; font-weight: 800; line-height: 1.5;"));
        assert!(kn_html.contains("ನಗದು"));
    }
}
