use crate::core::time::format_offset;
use crate::schemas::result::Submission;

const BOM: &str = "\u{feff}";
const FIXED_HEADERS: [&str; 6] = ["Alumne", "Grup", "Puntuació", "Max", "Percent", "Data"];

/// Renders one row per submission. Answer columns are padded to the widest
/// submission so every row has the same number of cells.
pub(crate) fn render_results(items: &[Submission]) -> String {
    let answer_columns = items.iter().map(|item| item.responses.len()).max().unwrap_or(0);

    let mut out = String::from(BOM);
    let header = FIXED_HEADERS
        .iter()
        .map(|header| header.to_string())
        .chain((1..=answer_columns).map(|index| format!("Q{index}")));
    push_row(&mut out, header);

    for item in items {
        let percent =
            item.totals.percentage().map(|value| format!("{value:.1}")).unwrap_or_default();
        let fixed = [
            item.student.name.clone(),
            item.student.group.clone(),
            format_number(item.totals.score),
            format_number(item.totals.max),
            percent,
            format_offset(item.submitted_at),
        ];
        let answers = (0..answer_columns).map(|index| match item.responses.get(index) {
            Some(response) => answer_cell(response.correct).to_string(),
            None => String::new(),
        });
        push_row(&mut out, fixed.into_iter().chain(answers));
    }

    out
}

pub(crate) fn attachment_filename(exam_id: &str) -> String {
    format!("results_{exam_id}.csv")
}

fn answer_cell(correct: Option<bool>) -> &'static str {
    match correct {
        Some(true) => "1",
        Some(false) => "0",
        None => "-",
    }
}

/// Integral scores print without a trailing `.0`.
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

fn push_row(out: &mut String, cells: impl Iterator<Item = String>) {
    let row = cells.map(|cell| escape_field(&cell)).collect::<Vec<_>>().join(",");
    out.push_str(&row);
    out.push_str("\r\n");
}

/// Quote a field when it contains a separator, quote or line break.
fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
