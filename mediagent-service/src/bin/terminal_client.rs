//! Interactive terminal front end for the MediAgent service.
//!
//! Usage:
//!   terminal_client --symptoms "I have a severe headache and nausea" --doctor-type Neurologist
//!
//! After the precautions are printed, type follow-up questions; `exit` or EOF ends the chat.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, anyhow};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use clap::Parser;
use reqwest::{Client, Response};
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

#[derive(Parser)]
#[command(name = "terminal_client")]
#[command(about = "Get pre-consultation precautions and ask follow-up questions")]
struct Cli {
    /// Base URL of a running mediagent-service
    #[arg(long, env = "MEDIAGENT_SERVER", default_value = "http://localhost:3000")]
    server: String,

    /// Describe your symptoms
    #[arg(long)]
    symptoms: String,

    /// Doctor type you plan to consult
    #[arg(long)]
    doctor_type: String,

    /// Previous medical report (PDF or image) to take into account
    #[arg(long)]
    report: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let client = Client::new();
    let server = cli.server.trim_end_matches('/');

    let report_url = match &cli.report {
        Some(path) => Some(report_data_uri(path).await?),
        None => None,
    };

    let session = expect_ok(client.post(format!("{server}/consultations")).send().await?).await?;
    let session_id = session["sessionId"]
        .as_str()
        .ok_or_else(|| anyhow!("service did not return a session id"))?
        .to_string();

    if let Some(types) = session["doctorTypes"].as_array() {
        let names: Vec<&str> = types.iter().filter_map(|t| t["name"].as_str()).collect();
        println!("Available doctor types: {}", names.join(", "));
    }

    println!("Generating precautions...");
    let response = client
        .post(format!("{server}/consultations/{session_id}/precautions"))
        .json(&json!({
            "symptoms": cli.symptoms,
            "doctorType": cli.doctor_type,
            "reportUrl": report_url,
        }))
        .send()
        .await?;
    let body = expect_ok(response).await?;

    println!("\nYour Personalized Precautions");
    let precautions = &body["precautions"];
    for (label, key) in [
        ("Dietary Precautions", "dietPrecautions"),
        ("Sleep Precautions", "sleepPrecautions"),
        ("Physical Precautions", "physicalPrecautions"),
        ("Mental Precautions", "mentalPrecautions"),
        ("Things to Avoid", "thingsToAvoid"),
    ] {
        println!("\n{label}:\n{}", precautions[key].as_str().unwrap_or_default());
    }

    println!("\nAsk MediAgent a follow-up question (type 'exit' to quit).");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if question.eq_ignore_ascii_case("exit") {
            break;
        }

        let response = client
            .post(format!("{server}/consultations/{session_id}/chat"))
            .json(&json!({ "question": question }))
            .send()
            .await?;
        match expect_ok(response).await {
            Ok(body) => println!("MediAgent: {}", body["answer"].as_str().unwrap_or_default()),
            Err(e) => eprintln!("Error: {e}"),
        }
    }

    client
        .delete(format!("{server}/consultations/{session_id}"))
        .send()
        .await?;

    Ok(())
}

/// Return the JSON body, or turn the service's error body into an error.
async fn expect_ok(response: Response) -> anyhow::Result<Value> {
    let status = response.status();
    let body: Value = response.json().await.unwrap_or(Value::Null);
    if status.is_success() {
        return Ok(body);
    }

    if let Some(field_errors) = body["fieldErrors"].as_array() {
        let messages: Vec<&str> = field_errors
            .iter()
            .filter_map(|e| e["message"].as_str())
            .collect();
        return Err(anyhow!(messages.join(" ")));
    }

    let message = body["error"].as_str().unwrap_or("request failed");
    Err(anyhow!("{message} ({status})"))
}

async fn report_data_uri(path: &Path) -> anyhow::Result<String> {
    let media_type = media_type_for(path)?;
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read report {}", path.display()))?;
    Ok(format!(
        "data:{};base64,{}",
        media_type,
        STANDARD.encode(bytes)
    ))
}

/// Reports go to the model as a PDF file part or an image part; nothing else is accepted.
fn media_type_for(path: &Path) -> anyhow::Result<&'static str> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("pdf") => Ok("application/pdf"),
        Some("png") => Ok("image/png"),
        Some("jpg") | Some("jpeg") => Ok("image/jpeg"),
        Some("webp") => Ok("image/webp"),
        _ => Err(anyhow!(
            "unsupported report type {}: use a PDF, PNG, JPEG or WebP file",
            path.display()
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_types_follow_extension() {
        assert_eq!(media_type_for(Path::new("labs/blood.PDF")).unwrap(), "application/pdf");
        assert_eq!(media_type_for(Path::new("xray.jpeg")).unwrap(), "image/jpeg");
    }

    #[test]
    fn unsupported_report_types_are_refused() {
        assert!(media_type_for(Path::new("notes")).is_err());
        assert!(media_type_for(Path::new("scan.docx")).is_err());
    }

    #[tokio::test]
    async fn unsupported_report_is_refused_before_reading() {
        let err = report_data_uri(Path::new("does-not-exist.txt")).await.unwrap_err();
        assert!(err.to_string().contains("unsupported report type"));
    }
}
