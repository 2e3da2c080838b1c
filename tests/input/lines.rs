use std::time::Duration;

use slow_relay::input::{LineReader, MAX_LINE_LENGTH};
use tokio::io::{AsyncRead, AsyncWriteExt};

async fn collect<R: AsyncRead + Unpin>(reader: &mut LineReader<R>) -> Vec<String> {
    let mut lines = Vec::new();
    while let Some(line) = reader
        .next_line()
        .await
        .expect("Reading from memory should not fail")
    {
        lines.push(line);
    }
    lines
}

#[tokio::test]
async fn test_splits_on_cr_and_lf() {
    let mut reader = LineReader::new(
        b"!HELP\r!SEND\r\n\nhello".as_slice(),
        Duration::from_secs(1),
    );
    assert_eq!(
        collect(&mut reader).await,
        vec!["!HELP", "!SEND", "", "", "hello"]
    );
}

#[tokio::test]
async fn test_lossy_utf8() {
    let mut reader = LineReader::new(b"caf\xe9\n".as_slice(), Duration::from_secs(1));
    assert_eq!(collect(&mut reader).await, vec!["caf\u{fffd}"]);
}

#[tokio::test]
async fn test_overlong_line_is_split() {
    let mut input = vec![b'a'; MAX_LINE_LENGTH + 10];
    input.push(b'\n');
    let mut reader = LineReader::new(input.as_slice(), Duration::from_secs(1));

    let lines = collect(&mut reader).await;
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].len(), MAX_LINE_LENGTH);
    assert_eq!(lines[1], "a".repeat(10));
}

#[tokio::test(start_paused = true)]
async fn test_partial_line_taken_after_timeout() {
    let (client, mut server) = tokio::io::duplex(1024);
    let mut reader = LineReader::new(client, Duration::from_millis(100));

    server
        .write_all(b"!SEN")
        .await
        .expect("Writing to duplex should not fail");
    assert_eq!(
        reader
            .next_line()
            .await
            .expect("Reading should not fail")
            .as_deref(),
        Some("!SEN")
    );

    server
        .write_all(b"D\n")
        .await
        .expect("Writing to duplex should not fail");
    drop(server);
    assert_eq!(collect(&mut reader).await, vec!["D"]);
}

#[tokio::test(start_paused = true)]
async fn test_idle_channel_keeps_waiting() {
    let (client, mut server) = tokio::io::duplex(1024);
    let mut reader = LineReader::new(client, Duration::from_millis(100));

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(5)).await;
        server
            .write_all(b"late\n")
            .await
            .expect("Writing to duplex should not fail");
    });

    assert_eq!(
        reader
            .next_line()
            .await
            .expect("Reading should not fail")
            .as_deref(),
        Some("late")
    );
}
