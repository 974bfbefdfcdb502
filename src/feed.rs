use std::{
    path::{Path, PathBuf},
    sync::{Arc, atomic::Ordering},
};

use log::{debug, info};

use crate::{
    error::FeedError,
    handoff::HandoffSender,
    metrics::RunMetrics,
    schema::Recipient,
};

/// Source of recipients for a run.
///
/// Implementations only read and validate their source. Pushing
/// recipients into the work channel is done by [`run_feed`], so
/// every source gets the same backpressure and close semantics.
///
/// CONTRACT:
/// - Recipients are returned in source order
/// - Any error means no recipient of this source is sent
#[async_trait::async_trait]
pub trait RecipientFeed: Send + Sync {
    /// Short description used in log lines (e.g. the file path)
    fn describe(&self) -> String;

    async fn recipients(&self) -> Result<Vec<Recipient>, FeedError>;
}

// ------------------------------------------------------------
// CSV feed
// ------------------------------------------------------------
//
// Header-led CSV file, one `name,email` row per recipient.
//
// - The first row is always treated as the header and skipped
// - Columns beyond the second are ignored
// - A row with fewer than two columns fails the whole feed
//
pub struct CsvFeed {
    path: PathBuf,
}

impl CsvFeed {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait::async_trait]
impl RecipientFeed for CsvFeed {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn recipients(&self) -> Result<Vec<Recipient>, FeedError> {
        let data = tokio::fs::read(&self.path)
            .await
            .map_err(|source| FeedError::Open {
                path: self.path.clone(),
                source,
            })?;

        parse_csv(&data)
    }
}

fn parse_csv(data: &[u8]) -> Result<Vec<Recipient>, FeedError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(data);

    let mut out = Vec::new();
    for record in reader.records() {
        let record = record?;

        let (Some(name), Some(email)) = (record.get(0), record.get(1)) else {
            return Err(FeedError::MalformedRow {
                line: record.position().map_or(0, |p| p.line()),
                columns: record.len(),
            });
        };

        out.push(Recipient::new(name, email));
    }

    Ok(out)
}

/// Feed task body: loads the source and hands every recipient to
/// the worker pool, one at a time.
///
/// Each handoff waits until a worker takes the recipient, so the
/// feed never runs ahead of the pool.
///
/// The sender is consumed and dropped on every return path; this
/// is what closes the work channel and lets workers exit.
///
/// RETURNS:
/// - number of recipients handed off
pub async fn run_feed(
    feed: Arc<dyn RecipientFeed>,
    tx: HandoffSender<Recipient>,
    metrics: Arc<RunMetrics>,
) -> Result<usize, FeedError> {
    let recipients = feed.recipients().await?;
    info!("loaded {} recipient(s) from {}", recipients.len(), feed.describe());

    let mut sent = 0;
    for recipient in recipients {
        debug!("feed: handing off {}", recipient.email);
        tx.send(recipient).await?;

        metrics.produced.fetch_add(1, Ordering::Relaxed);
        sent += 1;
    }

    Ok(sent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handoff;
    use std::io::Write;

    fn csv_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn header_is_skipped() {
        let file = csv_file("name,email\nAlice,alice@x.com\nBob,bob@x.com\n");

        let got = CsvFeed::new(file.path()).recipients().await.unwrap();
        assert_eq!(
            got,
            vec![
                Recipient::new("Alice", "alice@x.com"),
                Recipient::new("Bob", "bob@x.com"),
            ]
        );
    }

    #[tokio::test]
    async fn quoted_fields_and_extra_columns() {
        let file = csv_file("name,email,team\n\"Doe, Jane\", jane@x.com ,ops\n");

        let got = CsvFeed::new(file.path()).recipients().await.unwrap();
        assert_eq!(got, vec![Recipient::new("Doe, Jane", "jane@x.com")]);
    }

    #[tokio::test]
    async fn short_row_is_malformed() {
        let file = csv_file("name,email\nAlice,alice@x.com\nBob\n");

        let err = CsvFeed::new(file.path()).recipients().await.unwrap_err();
        assert!(matches!(err, FeedError::MalformedRow { line: 3, columns: 1 }), "{err:?}");
    }

    #[tokio::test]
    async fn empty_file_has_no_recipients() {
        let file = csv_file("");
        assert!(CsvFeed::new(file.path()).recipients().await.unwrap().is_empty());

        let file = csv_file("name,email\n");
        assert!(CsvFeed::new(file.path()).recipients().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_file_is_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = CsvFeed::new(dir.path().join("nope.csv")).recipients().await.unwrap_err();

        assert!(matches!(err, FeedError::Open { .. }));
        assert!(err.to_string().contains("nope.csv"));
    }

    #[tokio::test]
    async fn run_feed_closes_channel_on_error() {
        let dir = tempfile::tempdir().unwrap();
        let feed: Arc<dyn RecipientFeed> = Arc::new(CsvFeed::new(dir.path().join("nope.csv")));
        let metrics = Arc::new(RunMetrics::default());
        let (tx, rx) = handoff::channel();

        let result = run_feed(feed, tx, metrics.clone()).await;

        assert!(result.is_err());
        assert!(rx.recv().await.is_none());
        assert_eq!(metrics.snapshot().produced, 0);
    }

    #[tokio::test]
    async fn run_feed_counts_handoffs() {
        let file = csv_file("name,email\nA,a@x.com\nB,b@x.com\nC,c@x.com\n");
        let feed: Arc<dyn RecipientFeed> = Arc::new(CsvFeed::new(file.path()));
        let metrics = Arc::new(RunMetrics::default());
        let (tx, rx) = handoff::channel();

        let task = tokio::spawn(run_feed(feed, tx, metrics.clone()));

        let mut emails = Vec::new();
        while let Some(r) = rx.recv().await {
            emails.push(r.email);
        }

        assert_eq!(task.await.unwrap().unwrap(), 3);
        assert_eq!(emails, ["a@x.com", "b@x.com", "c@x.com"]);
        assert_eq!(metrics.snapshot().produced, 3);
    }
}
