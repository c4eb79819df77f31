use std::path::Path;

use tracing::warn;

use super::record::ProfileTarget;

/// One target per non-blank line, trimmed, order preserved. Lines that do
/// not parse as absolute URLs are kept (the scrape records the failure) but
/// flagged in the log so typos surface before a long run.
pub fn parse_target_lines(input: &str) -> Vec<ProfileTarget> {
    input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            if url::Url::parse(line).is_err() {
                warn!(line, "target line does not look like an absolute url");
            }
            ProfileTarget::from(line)
        })
        .collect()
}

pub async fn load_targets_file<P: AsRef<Path>>(path: P) -> std::io::Result<Vec<ProfileTarget>> {
    let content = tokio::fs::read_to_string(path).await?;
    Ok(parse_target_lines(&content))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_lines_and_whitespace_are_skipped() {
        let targets = parse_target_lines(
            "https://www.linkedin.com/in/a/\n\n  \n  https://www.linkedin.com/in/b/  \n",
        );
        assert_eq!(
            targets,
            vec![
                ProfileTarget::from("https://www.linkedin.com/in/a/"),
                ProfileTarget::from("https://www.linkedin.com/in/b/"),
            ]
        );
    }

    #[test]
    fn duplicates_are_preserved_in_order() {
        let targets = parse_target_lines("https://x.test/in/a\nhttps://x.test/in/a\n");
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0], targets[1]);
    }

    #[tokio::test]
    async fn loads_targets_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("urls.txt");
        tokio::fs::write(&path, "https://x.test/in/a\n\nhttps://x.test/in/b\n")
            .await
            .unwrap();
        let targets = load_targets_file(&path).await.unwrap();
        assert_eq!(targets.len(), 2);
    }
}
