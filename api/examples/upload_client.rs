use reqwest::multipart;
use reqwest::Client;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "contract.pdf".to_string());
    let base_url =
        std::env::var("SERVER_URL").unwrap_or_else(|_| "http://127.0.0.1:8888".to_string());
    let client = Client::new();

    println!("Health check:");
    let health = client.get(format!("{}/health", base_url)).send().await?;
    println!("Status: {}", health.status());

    println!("\nUploading {}:", path);
    let bytes = std::fs::read(&path)?;
    let filename = std::path::Path::new(&path)
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "contract.pdf".to_string());
    let form = multipart::Form::new().part(
        "file",
        multipart::Part::bytes(bytes).file_name(filename),
    );

    let response = client
        .post(format!("{}/upload-pdf", base_url))
        .multipart(form)
        .send()
        .await?;

    println!("Status: {}", response.status());
    let json: serde_json::Value = response.json().await?;
    println!("Response: {}", serde_json::to_string_pretty(&json)?);

    Ok(())
}
