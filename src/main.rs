// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! unihttp CLI
//!
//! Manual testing front-end over the browser adapter.

use std::env;
use std::process::ExitCode;

use unihttp::{
    AdapterContext, DownloadConfig, HttpClient, PlatformType, RequestData, ResponseData,
    UploadConfig,
};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("unihttp=info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        return ExitCode::from(1);
    }

    let context = AdapterContext::new().with_platform(PlatformType::H5);
    let client = HttpClient::from_context(&context);

    match args[1].as_str() {
        "get" => {
            if args.len() < 3 {
                eprintln!("Usage: unihttp get <url>");
                return ExitCode::from(1);
            }
            report(client.get(args[2].as_str()).await)
        }
        "post" => {
            if args.len() < 4 {
                eprintln!("Usage: unihttp post <url> <body>");
                return ExitCode::from(1);
            }
            report(client.post(args[2].as_str(), parse_body(&args[3])).await)
        }
        "download" => {
            if args.len() < 4 {
                eprintln!("Usage: unihttp download <url> <file>");
                return ExitCode::from(1);
            }
            let config = DownloadConfig::new(args[2].as_str()).file_path(&args[3]);
            report(client.download(config).await)
        }
        "upload" => {
            if args.len() < 4 {
                eprintln!("Usage: unihttp upload <url> <file> [field]");
                return ExitCode::from(1);
            }
            let mut config = UploadConfig::new(args[2].as_str(), &args[3]);
            if let Some(field) = args.get(4) {
                config = config.name(field.as_str());
            }
            report(client.upload(config).await)
        }
        "--help" | "-h" | "help" => {
            print_usage();
            ExitCode::SUCCESS
        }
        "--version" | "-v" | "version" => {
            println!("unihttp {}", unihttp::VERSION);
            ExitCode::SUCCESS
        }
        cmd => {
            eprintln!("Unknown command: {}", cmd);
            print_usage();
            ExitCode::from(1)
        }
    }
}

fn print_usage() {
    println!(
        r#"unihttp - Unified Cross-Platform HTTP Client

USAGE:
    unihttp <COMMAND> [OPTIONS]

COMMANDS:
    get <url>                       Send a GET request and print the body
    post <url> <body>               POST a JSON (or plain text) body
    download <url> <file>           Download a resource to a file
    upload <url> <file> [field]     Upload a file as multipart form data
    help                            Show this help message
    version                         Show version information

ENVIRONMENT:
    RUST_LOG                        Log filter (default: unihttp=info)

EXAMPLES:
    unihttp get https://httpbin.org/get
    unihttp post https://httpbin.org/post '{{"name":"demo"}}'
    unihttp download https://httpbin.org/image/png image.png
"#
    );
}

fn parse_body(raw: &str) -> RequestData {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(value) => RequestData::Json(value),
        Err(_) => RequestData::Text(raw.to_string()),
    }
}

fn report(result: unihttp::Result<ResponseData>) -> ExitCode {
    match result {
        Ok(data) => {
            match data {
                ResponseData::Json(value) => match serde_json::to_string_pretty(&value) {
                    Ok(pretty) => println!("{}", pretty),
                    Err(_) => println!("{}", value),
                },
                ResponseData::Text(text) => println!("{}", text),
                ResponseData::Binary(bytes) => println!("<{} bytes of binary data>", bytes.len()),
                ResponseData::File(path) => println!("Saved to {}", path.display()),
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("[{}] {}", e.code, e.message);
            if let Some(status) = e.status {
                eprintln!("Status: {}", status);
            }
            ExitCode::from(1)
        }
    }
}
