use chrono::Local;

/// Edit distance between two strings, counted in chars.
pub(crate) fn levenshtein(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != *cb);
            curr[j + 1] = substitution.min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Timezone of the running process: `TZ` when set, the local UTC offset otherwise.
pub(crate) fn local_timezone() -> String {
    match std::env::var("TZ") {
        Ok(tz) if !tz.trim().is_empty() => tz.trim().to_string(),
        _ => Local::now().offset().to_string(),
    }
}

/// Answers a single HTTP request with `status` and `body`. Returns the base
/// url and a handle resolving to the raw request.
#[cfg(test)]
pub(crate) async fn serve_once(
    status: &str,
    body: &str,
) -> (String, tokio::task::JoinHandle<String>) {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Bind failed");
    let url = format!("http://{}", listener.local_addr().expect("No local address"));
    let response = format!(
        "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );

    let handle = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.expect("Accept failed");
        let mut request = vec![];
        let mut chunk = [0u8; 1024];
        loop {
            let n = stream.read(&mut chunk).await.expect("Read failed");
            if n == 0 {
                break;
            }
            request.extend_from_slice(&chunk[..n]);
            if let Some(end) = request.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&request[..end]).to_lowercase();
                let length = head
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if request.len() >= end + 4 + length {
                    break;
                }
            }
        }
        stream
            .write_all(response.as_bytes())
            .await
            .expect("Write failed");
        stream.shutdown().await.ok();
        String::from_utf8_lossy(&request).to_string()
    });

    (url, handle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein("", ""), 0);
        assert_eq!(levenshtein("abc", ""), 3);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("div.a > span.x", "div.a > span.y"), 1);
    }
}
