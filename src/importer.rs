use std::sync::OnceLock;

use regex::Regex;
use uuid::Uuid;

use crate::models::ExpenseRecord;

/// How many leading lines are scanned for a header row before giving up
/// and assuming the legacy layout (header on line index 1).
const HEADER_SCAN_LINES: usize = 5;

/// Column stride of one bank block in the 總表 export: the amount column
/// followed by four companion columns we do not use.
const BANK_BLOCK_WIDTH: usize = 5;

/// Roster used when the header gives us nothing to work with. Matches the
/// legacy fixed four-bank export layout.
const DEFAULT_BANK_NAMES: [&str; 4] = ["中信", "國泰", "台新", "兆豐"];

// ---------------------------------------------------------------------------
// Cell-level helpers
// ---------------------------------------------------------------------------

/// Split one CSV line on commas, treating a comma as a separator only when
/// it is outside a double-quoted span. Quotes are left in the cells; strip
/// them with `strip_cell`.
pub fn split_line(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    for c in line.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            ',' if !in_quotes => {
                cells.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    cells.push(current);
    cells
}

/// Remove every double quote and surrounding whitespace (including a
/// trailing carriage return) from a cell.
pub fn strip_cell(cell: &str) -> String {
    cell.replace('"', "").trim().to_string()
}

/// Parse a money cell: currency symbol, thousands separators, quotes and
/// whitespace are stripped; anything that still fails to parse is 0.
/// A malformed cell is a zero amount, never an error.
pub fn parse_money(cell: &str) -> f64 {
    let cleaned: String = cell
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | '"') && !c.is_whitespace())
        .collect();
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// A period label is valid iff it is exactly "1-4 digits, /, 1-2 digits".
/// Gates manual entry and edits only; imported dates are kept as-is.
pub fn is_valid_date(date: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"^\d{1,4}/\d{1,2}$").unwrap());
    re.is_match(date)
}

/// Sortable integer for a period label: `year * 100 + month`, with 2-digit
/// years normalized to 2000+. Unparseable input sorts first (0).
pub fn date_sort_key(date: &str) -> i64 {
    let parts: Vec<&str> = date.split('/').collect();
    if parts.len() != 2 {
        return 0;
    }
    let (Ok(year), Ok(month)) = (parts[0].trim().parse::<i64>(), parts[1].trim().parse::<i64>())
    else {
        return 0;
    };
    let year = if year < 100 { year + 2000 } else { year };
    year * 100 + month
}

// ---------------------------------------------------------------------------
// Schema inference
// ---------------------------------------------------------------------------

/// Recovered positional schema for one import: where the total column sits,
/// where each bank's amount column sits, and the fixed category offsets.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMap {
    pub bank_cols: Vec<usize>,
    pub total: usize,
    pub family: usize,
    pub rent: usize,
    pub periodic: usize,
    pub extra: usize,
}

impl ColumnMap {
    fn from_total_index(total: usize, bank_cols: Vec<usize>) -> Self {
        ColumnMap {
            bank_cols,
            total,
            family: total + 4,
            rent: total + 5,
            periodic: total + 6,
            extra: total + 7,
        }
    }
}

/// Strategy for turning header cells into a column map plus bank roster.
/// The 5-column-stride heuristic below is one implementation; alternate
/// export layouts can plug in here without touching row normalization.
pub trait HeaderLayout {
    fn column_map(&self, header_cells: &[String]) -> Option<(ColumnMap, Vec<String>)>;
}

/// The 總表 layout: column 0 is the date, then repeating 5-column bank
/// blocks up to the total column, then four category columns at fixed
/// offsets past the total. Falls back to the legacy fixed four-bank layout
/// when no total column can be found in the header.
pub struct FixedStrideLayout;

impl HeaderLayout for FixedStrideLayout {
    fn column_map(&self, header_cells: &[String]) -> Option<(ColumnMap, Vec<String>)> {
        let total_index = header_cells.iter().position(|c| is_total_marker(c));

        match total_index {
            Some(total) if total > 1 => {
                let mut names = Vec::new();
                let mut cols = Vec::new();
                let mut i = 1;
                while i < total {
                    cols.push(i);
                    let raw = header_cells.get(i).map(String::as_str).unwrap_or("");
                    let name = strip_amount_marker(raw);
                    if name.is_empty() {
                        names.push(format!("Bank {}", names.len() + 1));
                    } else {
                        names.push(name);
                    }
                    i += BANK_BLOCK_WIDTH;
                }
                Some((ColumnMap::from_total_index(total, cols), names))
            }
            _ => {
                // Header exists but the total column is missing or degenerate:
                // assume the legacy fixed layout with the default roster.
                let names: Vec<String> =
                    DEFAULT_BANK_NAMES.iter().map(|s| s.to_string()).collect();
                let cols: Vec<usize> =
                    (0..names.len()).map(|i| 1 + i * BANK_BLOCK_WIDTH).collect();
                let total = 1 + names.len() * BANK_BLOCK_WIDTH;
                Some((ColumnMap::from_total_index(total, cols), names))
            }
        }
    }
}

/// Matches the header token that marks the grand-total column: 總消費 (or
/// any cell containing 總), the literal token "total" case-insensitively,
/// or the compound 每月消費.
fn is_total_marker(cell: &str) -> bool {
    let cell = cell.trim();
    cell.contains('總') || cell.contains("每月消費") || cell.to_lowercase().contains("total")
}

/// Header cells for bank columns read like "中信金額" or "CTBC Amount";
/// strip the trailing amount tokens to recover the bank name.
fn strip_amount_marker(cell: &str) -> String {
    let mut name = strip_cell(cell);
    loop {
        let trimmed = name.trim_end();
        let lower = trimmed.to_lowercase();
        let next = if let Some(s) = trimmed.strip_suffix("金額") {
            s.to_string()
        } else if lower.ends_with("amount") {
            trimmed[..trimmed.len() - "amount".len()].to_string()
        } else {
            break;
        };
        name = next;
    }
    name.trim().to_string()
}

/// Locate the header row within the first few lines and infer the column
/// layout from it. Returns the header's line index along with the map and
/// roster, or None when the input is too short to contain a header at all.
fn infer_schema(lines: &[&str]) -> Option<(usize, ColumnMap, Vec<String>)> {
    let header_idx = lines
        .iter()
        .take(HEADER_SCAN_LINES)
        .position(|line| is_total_marker(line))
        .or_else(|| if lines.len() >= 2 { Some(1) } else { None })?;

    let cells: Vec<String> = split_line(lines[header_idx])
        .iter()
        .map(|c| strip_cell(c))
        .collect();

    let (map, names) = FixedStrideLayout.column_map(&cells)?;
    Some((header_idx, map, names))
}

// ---------------------------------------------------------------------------
// Import pipeline
// ---------------------------------------------------------------------------

/// Result of one CSV import: the recovered bank roster and the normalized
/// records, in file order. Zero records is the failure signal: callers
/// must not commit an empty import over existing data.
#[derive(Debug, Default)]
pub struct ParsedImport {
    pub bank_names: Vec<String>,
    pub records: Vec<ExpenseRecord>,
}

impl ParsedImport {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Parse raw 總表 CSV text into normalized expense records. Total: always
/// returns, repairing or skipping malformed rows silently.
pub fn import_csv(text: &str) -> ParsedImport {
    let lines: Vec<&str> = text.split('\n').collect();

    let Some((header_idx, map, bank_names)) = infer_schema(&lines) else {
        return ParsedImport::default();
    };

    let mut records = Vec::new();
    for line in lines.iter().skip(header_idx + 1) {
        if line.trim().is_empty() {
            continue;
        }
        let cells = split_line(line);
        if cells.len() < map.total {
            continue;
        }
        let date = strip_cell(&cells[0]);
        if date.is_empty() {
            continue;
        }

        let cell_at = |i: usize| cells.get(i).map(String::as_str).unwrap_or("");
        let banks = bank_names
            .iter()
            .zip(&map.bank_cols)
            .map(|(name, &col)| (name.clone(), parse_money(cell_at(col))))
            .collect();

        records.push(ExpenseRecord {
            id: Uuid::new_v4(),
            date,
            banks,
            total: parse_money(cell_at(map.total)),
            family: parse_money(cell_at(map.family)),
            rent: parse_money(cell_at(map.rent)),
            periodic: parse_money(cell_at(map.periodic)),
            extra: parse_money(cell_at(map.extra)),
            note: strip_cell(cells.last().map(String::as_str).unwrap_or("")),
        });
    }

    ParsedImport {
        bank_names,
        records,
    }
}
