use anyhow::Context;
use std::collections::BTreeSet;
use std::path::Path;

pub const DEFAULT_WATCHLIST_PATH: &str = "data/watchlist.txt";

/// Ordered ticker list, read once per batch run. One symbol per line; blank
/// lines and `#` comments are ignored; duplicates keep the first occurrence.
pub fn load_watchlist(path: &Path) -> anyhow::Result<Vec<String>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read watchlist at {}", path.display()))?;

    let tickers = parse_watchlist(&raw);
    anyhow::ensure!(
        !tickers.is_empty(),
        "watchlist at {} contains no tickers",
        path.display()
    );

    Ok(tickers)
}

fn parse_watchlist(raw: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut out = Vec::new();

    for line in raw.lines() {
        let ticker = line.split('#').next().unwrap_or("").trim();
        if ticker.is_empty() {
            continue;
        }
        if seen.insert(ticker.to_string()) {
            out.push(ticker.to_string());
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_in_order_skipping_comments_and_blanks() {
        let raw = "XEQT.TO\n\n# big tech\nAAPL\nMSFT # end-of-line note\n";
        assert_eq!(parse_watchlist(raw), vec!["XEQT.TO", "AAPL", "MSFT"]);
    }

    #[test]
    fn duplicates_keep_first_occurrence() {
        let raw = "AAPL\nMSFT\nAAPL\n";
        assert_eq!(parse_watchlist(raw), vec!["AAPL", "MSFT"]);
    }

    #[test]
    fn whitespace_only_input_yields_empty_list() {
        assert!(parse_watchlist("  \n\t\n# comment only\n").is_empty());
    }
}
