use std::io::Write;

use colored::Colorize;

use crate::error::Result;
use crate::store::Dataset;

use super::ExportFormat;

pub fn run(file: &str, format: ExportFormat, output: Option<String>) -> Result<()> {
    let data = super::load_dataset(file)?;

    let rendered = match format {
        ExportFormat::Csv => to_csv(&data)?,
        ExportFormat::Json => serde_json::to_string_pretty(&data)
            .map_err(|e| crate::error::CardbookError::Other(e.to_string()))?,
    };

    match output {
        Some(path) => {
            std::fs::write(&path, rendered)?;
            println!("{} {} records to {path}", "Exported".green().bold(), data.len());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(rendered.as_bytes())?;
        }
    }
    Ok(())
}

/// Flat one-row-per-record CSV, one column per roster bank. This is a clean
/// tabular layout, not a reconstruction of the block-structured source file.
fn to_csv(data: &Dataset) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);

    let mut header = vec!["date".to_string()];
    header.extend(data.bank_names.iter().cloned());
    header.extend(
        ["total", "family", "rent", "periodic", "extra", "note"].map(String::from),
    );
    writer.write_record(&header)?;

    for rec in &data.records {
        let mut row = vec![rec.date.clone()];
        for bank in &data.bank_names {
            row.push(format_amount(rec.bank_amount(bank)));
        }
        row.push(format_amount(rec.total));
        row.push(format_amount(rec.family));
        row.push(format_amount(rec.rent));
        row.push(format_amount(rec.periodic));
        row.push(format_amount(rec.extra));
        row.push(rec.note.clone());
        writer.write_record(&row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| crate::error::CardbookError::Other(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| crate::error::CardbookError::Other(e.to_string()))
}

fn format_amount(v: f64) -> String {
    if v == v.floor() {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "日期,中信金額,-,-,-,-,國泰金額,-,-,-,-,總消費,-,-,-,家用,房租,定期,額外,備註\n\
                       22/01,100,x,x,x,x,200,x,x,x,x,300,a,b,c,10,0,0,0,\"lunch, dinner\"\n";

    #[test]
    fn test_csv_export_layout() {
        let data = Dataset::from_csv(CSV).unwrap();
        let out = to_csv(&data).unwrap();
        let mut lines = out.lines();
        assert_eq!(
            lines.next().unwrap(),
            "date,中信,國泰,total,family,rent,periodic,extra,note"
        );
        // The note contains a comma, so the csv writer must quote it.
        assert_eq!(
            lines.next().unwrap(),
            "22/01,100,200,300,10,0,0,0,\"lunch, dinner\""
        );
    }

    #[test]
    fn test_json_export_is_valid() {
        let data = Dataset::from_csv(CSV).unwrap();
        let json = serde_json::to_string_pretty(&data).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["bank_names"][0], "中信");
        assert_eq!(value["records"][0]["total"], 300.0);
    }
}
