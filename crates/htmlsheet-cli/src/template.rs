//! Template rendering for the `render` command
//!
//! Templates are MiniJinja files; helper filters cover the formatting the
//! report templates need (dashes for missing values, zero padding, dates).
//! Other templates next to the main one can be pulled in with `{% include %}`.
//!
//! Output is always HTML-escaped, whatever the template's file extension, so
//! data values can never open or close markup. Helpers that produce rows
//! return safe strings.

use std::path::Path;

use anyhow::{bail, Context, Result};
use minijinja::{AutoEscape, Environment, Error, Value};

/// Inspection outcome that counts as passed
const ADMITTED: &str = "Допущен";

/// Build an environment with every helper registered
pub fn environment() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_auto_escape_callback(|_| AutoEscape::Html);
    env.add_filter("ifnull", ifnull);
    env.add_filter("dash", dash);
    env.add_filter("dash_or", dash_or);
    env.add_filter("zero_pad", zero_pad);
    env.add_filter("percent", percent);
    env.add_filter("math", math);
    env.add_filter("key", key);
    env.add_filter("time_pair", time_pair);
    env.add_filter("pressure", pressure);
    env.add_filter("format_date", format_date);
    env.add_filter("format_datetime", format_datetime);
    env.add_filter("format_date_of_birth", format_date);
    env.add_filter("allow", allow);
    env.add_filter("format_gender", format_gender);
    env.add_filter("format_type", format_type);
    env.add_filter("format_result", format_result);
    env.add_filter("format_complains", format_complains);
    env.add_filter("format_pressure", format_pressure);
    env.add_filter("sleep", sleep);
    env.add_function("is_after_before_sheet", is_after_before_sheet);
    env.add_function("face_id_not_found_name", face_id_not_found_name);
    env.add_function("summarize", summarize);
    env.add_function("line_sum_rows", line_sum_rows);
    env
}

/// Read the JSON data file; the top level must be an object
pub fn read_data(path: &Path) -> Result<serde_json::Value> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read data file '{}'", path.display()))?;
    let data: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse JSON in '{}'", path.display()))?;
    if !data.is_object() {
        bail!(
            "data file '{}' must contain a JSON object at the top level",
            path.display()
        );
    }
    Ok(data)
}

/// Render `template` with `data` as the context
pub fn render_file(template: &Path, data: &serde_json::Value) -> Result<String> {
    let name = template
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("Invalid template path '{}'", template.display()))?;
    let dir = template
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut env = environment();
    env.set_loader(minijinja::path_loader(dir));
    let tmpl = env
        .get_template(name)
        .with_context(|| format!("Failed to load template '{}'", template.display()))?;
    tmpl.render(data)
        .with_context(|| format!("Failed to render template '{}'", template.display()))
}

fn is_missing(value: &Value) -> bool {
    value.is_undefined() || value.is_none()
}

/// Text form of a value; missing values are empty
fn text(value: &Value) -> String {
    if is_missing(value) {
        String::new()
    } else if let Some(s) = value.as_str() {
        s.to_string()
    } else {
        value.to_string()
    }
}

fn int(value: &Value) -> i64 {
    i64::try_from(value.clone())
        .ok()
        .or_else(|| text(value).trim().parse().ok())
        .unwrap_or(0)
}

fn ifnull(value: Value, fallback: Value) -> Value {
    if is_missing(&value) {
        fallback
    } else {
        value
    }
}

/// `-` for missing, empty and zero values
fn dash(value: Value) -> String {
    let t = text(&value);
    if t.is_empty() || t == "0" {
        "-".to_string()
    } else {
        t
    }
}

/// `-` for missing values only
fn dash_or(value: Value) -> Value {
    if is_missing(&value) {
        Value::from("-")
    } else {
        value
    }
}

/// Two-digit form of a single-digit number; empty becomes `00`
fn zero_pad(value: Value) -> String {
    let t = text(&value);
    let trimmed = t.trim();
    if trimmed.is_empty() {
        return "00".to_string();
    }
    match trimmed.parse::<i64>() {
        Ok(n) if (0..10).contains(&n) => format!("0{}", n),
        _ => t,
    }
}

/// Fraction as a percentage with two decimals; unparsable input is empty
fn percent(value: Value) -> String {
    let parsed = f64::try_from(value.clone())
        .ok()
        .or_else(|| text(&value).trim().parse::<f64>().ok());
    match parsed {
        Some(x) => format!("{:.2}%", x * 100.0),
        None => String::new(),
    }
}

/// Integer arithmetic: `{{ a | math("+", b) }}`
fn math(x: Value, op: String, y: Value) -> String {
    let (x, y) = (int(&x), int(&y));
    let result = match op.trim() {
        "+" => x.checked_add(y),
        "-" => x.checked_sub(y),
        "*" => x.checked_mul(y),
        "/" => x.checked_div(y),
        other => {
            log::warn!("math: unknown operator '{}'", other);
            None
        }
    };
    format!("{:.6}", result.unwrap_or(0) as f64)
}

fn key(map: Value, key: Value) -> Result<Value, Error> {
    map.get_item(&key)
}

/// `min:sec`, each side defaulting to `00`
fn time_pair(min: Value, sec: Value) -> String {
    let or_zero = |v: &Value| {
        let t = text(v);
        if t.is_empty() {
            "00".to_string()
        } else {
            t
        }
    };
    format!("{}:{}", or_zero(&min), or_zero(&sec))
}

/// The reading when the paired upper value is present and non-zero, else `-`
fn pressure(reading: Value, upper: Value) -> String {
    let reading = text(&reading);
    let upper = text(&upper);
    if !reading.is_empty() && !upper.is_empty() && upper != "0" {
        reading
    } else {
        "-".to_string()
    }
}

/// `YYYY-MM-DD` to `DD-MM-YYYY`
fn format_date(value: Value) -> String {
    let t = text(&value);
    if t.is_empty() {
        return t;
    }
    match chrono::NaiveDate::parse_from_str(t.trim(), "%Y-%m-%d") {
        Ok(date) => date.format("%d-%m-%Y").to_string(),
        Err(err) => {
            log::warn!("format_date: cannot parse '{}': {}", t, err);
            t
        }
    }
}

/// `YYYY-MM-DD HH:MM` to `DD-MM-YYYY` and `HH:MM` on two lines
fn format_datetime(value: Value) -> String {
    let t = text(&value);
    if t.is_empty() {
        return t;
    }
    match chrono::NaiveDateTime::parse_from_str(t.trim(), "%Y-%m-%d %H:%M") {
        Ok(dt) => dt.format("%d-%m-%Y\n%H:%M").to_string(),
        Err(err) => {
            log::warn!("format_datetime: cannot parse '{}': {}", t, err);
            t
        }
    }
}

fn allow(value: Value) -> &'static str {
    if text(&value) == ADMITTED {
        "Прошел"
    } else {
        "Не прошел"
    }
}

fn format_gender(value: Value) -> &'static str {
    if text(&value) == "MALE" {
        "М"
    } else {
        "Ж"
    }
}

/// Inspection type code to its display name
fn format_type(value: Value) -> &'static str {
    match text(&value).as_str() {
        "BEFORE" => "Предрейсовый",
        "BEFORE_SHIFT" => "Предсменный",
        "LINE" => "Линейный",
        "AFTER" => "Послерейсовый",
        "AFTER_SHIFT" => "Послесменный",
        "ALCO" => "Алкотестирование",
        "PIRO" => "Контроль температуры",
        "PREVENTION" => "Профилактический",
        _ => "Неизвестный",
    }
}

fn format_result(value: Value) -> &'static str {
    if value.is_true() {
        "Допуск"
    } else {
        "Не допуск"
    }
}

fn format_complains(value: Value) -> &'static str {
    match text(&value).as_str() {
        "" => "-",
        "true" => "Есть",
        _ => "Нет",
    }
}

fn sleep(value: Value) -> &'static str {
    match text(&value).as_str() {
        "" => "-",
        "true" => "более 8 часов",
        _ => "менее 8 часов",
    }
}

/// `systolic / diastolic` from a pressure record, `-` for missing parts
fn format_pressure(record: Value) -> String {
    if is_missing(&record) {
        return "- / -".to_string();
    }
    let part = |name: &str| {
        let t = record.get_attr(name).map(|v| text(&v)).unwrap_or_default();
        if t.is_empty() {
            "-".to_string()
        } else {
            t
        }
    };
    format!("{} / {}", part("systolicPressure"), part("diastolicPressure"))
}

/// Whether a sheet lists pre-trip, post-trip or line inspections
fn is_after_before_sheet(sheet_name: Value) -> bool {
    let name = text(&sheet_name);
    ["Предрейсовый", "Послерейсовый", "Линейный"]
        .iter()
        .any(|kind| name.contains(kind))
}

/// Full name as `surname name patronymic`, or a placeholder without a name
fn face_id_not_found_name(name: Value, surname: Value, patronymic: Value) -> String {
    let name = text(&name);
    if name.is_empty() {
        return "нет соответствия".to_string();
    }
    format!("{} {} {}", text(&surname), name, text(&patronymic))
}

/// `(type, allow)` of every entry in `report.inspections`
fn inspections(report: &Value) -> Result<Vec<(String, String)>, Error> {
    let list = report.get_attr("inspections")?;
    if is_missing(&list) {
        return Ok(Vec::new());
    }
    list.try_iter()?
        .map(|item| {
            Ok::<_, Error>((
                text(&item.get_attr("type")?),
                text(&item.get_attr("allow")?),
            ))
        })
        .collect()
}

/// One bordered row per `(label, count)`; the label spans four columns
fn total_rows(totals: &[(&str, usize)]) -> Value {
    let rows: String = totals
        .iter()
        .map(|(label, count)| {
            format!(
                "<tr style=\"height: 300px; border-style: solid\"><td colspan=\"4\" style=\"text-align: left\">{}</td><td></td><td></td><td></td><td>{}</td></tr>",
                label, count
            )
        })
        .collect();
    Value::from_safe_string(rows)
}

fn count(items: &[(String, String)], pick: impl Fn(&str, bool) -> bool) -> usize {
    items
        .iter()
        .filter(|(kind, allow)| pick(kind, allow == ADMITTED))
        .count()
}

/// Totals rows for pre-trip and post-trip sheets; other sheets get nothing
fn summarize(report: Value) -> Result<Value, Error> {
    let sheet_name = text(&report.get_attr("sheetName")?);
    let items = inspections(&report)?;

    if sheet_name.contains("Предрейсовый") {
        let before = |kind: &str| kind == "Предрейсовый" || kind == "Предсменный";
        Ok(total_rows(&[
            ("Итого осмотрено: ", items.len()),
            (
                "Итого допущено к исполнению трудовых обязанностей: ",
                count(&items, |kind, ok| before(kind) && ok),
            ),
            (
                "Итого не допущено к исполнению трудовых обязанностей: ",
                count(&items, |kind, ok| before(kind) && !ok),
            ),
        ]))
    } else if sheet_name.contains("Послерейсовый") {
        let after = |kind: &str| kind == "Послерейсовый";
        Ok(total_rows(&[
            ("Итого осмотрено: ", items.len()),
            ("Итого прошло послерейсовый: ", count(&items, |kind, ok| after(kind) && ok)),
            ("Итого прошло послесменный: ", count(&items, |kind, ok| !after(kind) && ok)),
            ("Итого не прошло послерейсовый: ", count(&items, |kind, ok| after(kind) && !ok)),
            ("Итого не прошло послесменный: ", count(&items, |kind, ok| !after(kind) && !ok)),
        ]))
    } else {
        Ok(Value::from(""))
    }
}

/// Totals rows for a line inspection sheet
fn line_sum_rows(report: Value) -> Result<Value, Error> {
    let items = inspections(&report)?;
    let passed = count(&items, |_, ok| ok);
    Ok(total_rows(&[
        ("Итого осмотрено: ", items.len()),
        ("Итого прошло линейный контроль: ", passed),
        ("Итого отстраненных от трудовых обязанностей: ", items.len() - passed),
    ]))
}
