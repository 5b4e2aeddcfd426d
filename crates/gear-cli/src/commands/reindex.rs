//! Reindex command

use colored::Colorize;

use crate::context::Session;
use crate::error::Result;

/// Rewrite every stored position of the list to a contiguous sequence
pub async fn run_reindex(session: &Session) -> Result<()> {
    let reports = session.coordinator.reindex_all().await?;
    let writes: usize = reports.iter().map(|r| r.writes_issued).sum();

    if writes == 0 {
        println!("{} Positions already contiguous", "OK".green().bold());
    } else {
        println!(
            "{} Repaired positions with {} writes",
            "OK".green().bold(),
            writes
        );
    }
    Ok(())
}
