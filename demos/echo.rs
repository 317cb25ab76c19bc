//! Echo app behind `UserHeader`, driven in-process.
//!
//! Run with:
//!   cargo run --example echo
//!
//! Each sample `User` value is sent through the middleware; the echo handler
//! answers with the identity it was handed. Rejections show up as `DEBUG`
//! events, acceptances as `TRACE` events.

use bytes::Bytes;
use http_body_util::BodyExt;
use usher::{Request, Response, UserHeader};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .init();

    let app = UserHeader::builder()
        .allow_empty(false)
        .wrap(echo);

    let samples: [Option<&[u8]>; 7] = [
        None,
        Some(b"john"),
        Some(b""),
        Some(b"j%c3%b8hn@example.org"),
        Some(b"j%c%3b8hn"),
        Some(b"john:secret"),
        Some(b"@example"),
    ];

    for user in samples {
        let mut req = http::Request::get("/");
        if let Some(user) = user {
            req = req.header("user", user);
        }
        let req = req.body(Bytes::new()).expect("valid request");

        let res = app.call(req.into()).await;
        let vary: Vec<String> = res.header_values("vary").map(str::to_owned).collect();
        let body = match res.into_body().collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(never) => match never {},
        };

        println!(
            "User: {:<24} Vary: {:<8} -> {}",
            user.map(String::from_utf8_lossy).unwrap_or("(absent)".into()),
            vary.join(", "),
            String::from_utf8_lossy(&body),
        );
    }
}

async fn echo(req: Request) -> Response {
    match req.local_user() {
        Some(user) => Response::text(format!("local user {user:?}")),
        None => Response::text("no local user"),
    }
}
