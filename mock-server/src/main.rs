use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    println!(
        "listening on http://{addr}/mysite/check_mk/webapi.py (user {}, secret {})",
        mock_server::DEFAULT_USERNAME,
        mock_server::DEFAULT_SECRET
    );
    mock_server::run(listener).await
}
