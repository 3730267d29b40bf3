use crate::browser::RecordBrowser;
use crate::error::Result;

/// Full-screen record browser over a CSV export. Edits live in memory for
/// the duration of the session; the source file is never rewritten.
pub fn run(file: &str) -> Result<()> {
    let mut data = super::load_dataset(file)?;
    let mut browser = RecordBrowser::new();
    browser.run(&mut data)?;
    Ok(())
}
